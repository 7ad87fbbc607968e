pub mod forecast;
pub mod post;
pub mod rotation;

pub use forecast::{Condition, Forecast, ForecastEntry};
pub use post::{MediaAttachment, OutgoingPost, WebhookImage, WebhookPayload};
pub use rotation::{City, CityList, CityListError, Coordinates, RotationState};
