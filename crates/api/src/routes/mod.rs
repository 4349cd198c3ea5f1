pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /status                         fleet status (GET)
/// /machines/{id}                  machine detail (GET)
/// /alerts                         list alerts (GET, ?severity=&limit=)
/// /alerts/{id}/acknowledge        acknowledge (POST)
/// /maintenance                    record maintenance (POST)
/// /predict                        ad-hoc prediction (POST)
/// /model/reload                   reload persisted model (POST)
/// /events                         server-sent event stream (GET, ?machine_id=)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(handlers::machines::get_status))
        .route("/machines/{id}", get(handlers::machines::get_machine))
        .route("/alerts", get(handlers::alerts::list_alerts))
        .route(
            "/alerts/{id}/acknowledge",
            post(handlers::alerts::acknowledge_alert),
        )
        .route("/maintenance", post(handlers::maintenance::record_maintenance))
        .route("/predict", post(handlers::predict::predict))
        .route("/model/reload", post(handlers::predict::reload_model))
        .route("/events", get(handlers::events::event_stream))
}
