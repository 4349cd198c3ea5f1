use aura_pipeline::SchedulerStatus;
use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the model is missing or the last cycle failed.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Name of the active failure model, if one is usable.
    pub model: Option<String>,
    pub machines: usize,
    pub alerts: usize,
    pub scheduler: SchedulerStatus,
}

/// GET /health -- returns service, model and scheduler health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = state.monitor.model_name().ok();
    let scheduler = state.monitor.scheduler_status().await;

    let status = if model.is_some() && !scheduler.is_degraded() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        model,
        machines: state.monitor.registry().len(),
        alerts: state.monitor.alerts().len().await,
        scheduler,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
