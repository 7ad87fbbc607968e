use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::services::CycleRunner;

/// Outcome of a triggered cycle
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub status: &'static str,
    pub message: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_persisted: Option<bool>,
}

/// GET|POST /run-tweet-task - Run one rotation cycle
pub async fn run_tweet_task(runner: web::Data<CycleRunner>) -> HttpResponse {
    log::info!("'/run-tweet-task' endpoint triggered by a request.");

    match runner.run().await {
        Ok(report) => HttpResponse::Ok().json(TaskResponse {
            status: "success",
            message: format!("Post task executed successfully for {}.", report.city),
            city: report.city,
            post_id: report.post_id,
            state_persisted: Some(report.persisted),
        }),
        Err(e) => HttpResponse::InternalServerError().json(TaskResponse {
            status: "error",
            message: e.to_string(),
            city: e.city().to_string(),
            post_id: None,
            state_persisted: None,
        }),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/run-tweet-task")
            .route(web::get().to(run_tweet_task))
            .route(web::post().to(run_tweet_task)),
    );
}
