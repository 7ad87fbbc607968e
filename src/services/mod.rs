pub mod compose;
pub mod cycle;
pub mod media;
pub mod posting;
pub mod rotation;
pub mod weather;

pub use compose::{compose, PostContent};
pub use cycle::{CycleError, CycleReport, CycleRunner, CycleSettings};
pub use posting::{create_poster, select_poster, PostResult, Poster};
pub use rotation::{select_next, ResetCause, RotationPolicy, Selection, UnknownCityPolicy};
pub use weather::{OpenWeatherMapClient, WeatherError, WeatherSource};
