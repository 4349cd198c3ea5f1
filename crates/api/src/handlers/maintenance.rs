use aura_core::maintenance::{MaintenanceLog, NewMaintenanceLog};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /maintenance
///
/// Logs the activity; repairs and replacements also restore health points.
pub async fn record_maintenance(
    State(state): State<AppState>,
    Json(body): Json<NewMaintenanceLog>,
) -> AppResult<(StatusCode, Json<DataResponse<MaintenanceLog>>)> {
    let log = state.monitor.record_maintenance(body).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: log })))
}
