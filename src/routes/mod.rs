pub mod health;
pub mod status;
pub mod tasks;

use actix_web::web;

/// Registers every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    health::configure(cfg);
    tasks::configure(cfg);
    status::configure(cfg);
}
