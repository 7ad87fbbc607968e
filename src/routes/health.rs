use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Serialize;

use crate::services::CycleRunner;

#[derive(Serialize)]
pub struct LivenessResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    status: &'static str,
    checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    state_store: &'static str,
}

/// Liveness check - is the process running?
/// Returns 200 if the server is alive.
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(LivenessResponse { status: "ok" })
}

/// Readiness check - can the rotation state be read and written?
/// Returns 200 if the state store is usable, 503 otherwise.
pub async fn readiness(runner: web::Data<CycleRunner>) -> HttpResponse {
    let store_healthy = runner.store().health_check().await;

    let (status, store_status, http_status) = if store_healthy {
        ("ready", "ok", StatusCode::OK)
    } else {
        ("not_ready", "error", StatusCode::SERVICE_UNAVAILABLE)
    };

    let response = ReadinessResponse {
        status,
        checks: ReadinessChecks {
            state_store: store_status,
        },
    };

    HttpResponse::build(http_status).json(response)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(liveness))
            .route("/ready", web::get().to(readiness)),
    );
}
