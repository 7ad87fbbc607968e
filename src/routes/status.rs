use actix_web::{web, HttpResponse};

use crate::services::CycleRunner;

/// GET / - Plain-text status line
pub async fn home(runner: web::Data<CycleRunner>) -> HttpResponse {
    let state = runner.current_state().await.into_state();

    let last_city = state.last_posted_city.as_deref().unwrap_or("N/A");
    let last_clear = state
        .last_clear_time
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "N/A".to_string());

    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(format!(
            "Weather Bot is alive! Current mode: {}. Last posted city: {}. Last log clear (UTC): {}",
            runner.mode(),
            last_city,
            last_clear
        ))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home));
}
