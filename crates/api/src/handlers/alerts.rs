//! Alert listing and acknowledgement.

use aura_core::alert::{Alert, AlertSeverity};
use aura_core::error::CoreError;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

pub const DEFAULT_ALERT_LIMIT: usize = 50;
pub const MAX_ALERT_LIMIT: usize = 1000;

/// Query parameters for `GET /alerts`.
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    pub severity: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AlertList {
    pub alerts: Vec<Alert>,
    pub total_count: usize,
}

/// GET /alerts
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertQuery>,
) -> AppResult<Json<DataResponse<AlertList>>> {
    let severity = params
        .severity
        .as_deref()
        .map(str::parse::<AlertSeverity>)
        .transpose()?;

    let limit = params.limit.unwrap_or(DEFAULT_ALERT_LIMIT);
    if !(1..=MAX_ALERT_LIMIT).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {MAX_ALERT_LIMIT}"
        )));
    }

    let alerts = state.monitor.list_alerts(severity, limit).await;
    Ok(Json(DataResponse {
        data: AlertList {
            total_count: alerts.len(),
            alerts,
        },
    }))
}

/// POST /alerts/{id}/acknowledge
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<String>,
) -> AppResult<Json<DataResponse<Alert>>> {
    let id = Uuid::parse_str(&alert_id).map_err(|_| CoreError::not_found("Alert", &alert_id))?;
    let alert = state.monitor.acknowledge_alert(id).await?;
    Ok(Json(DataResponse { data: alert }))
}
