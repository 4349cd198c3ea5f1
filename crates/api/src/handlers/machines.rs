//! Fleet status and machine detail endpoints.

use std::collections::BTreeMap;

use aura_core::alert::Alert;
use aura_core::error::CoreError;
use aura_core::machine::Machine;
use aura_core::maintenance::MaintenanceLog;
use aura_core::telemetry::TelemetrySample;
use aura_core::types::{MachineId, Timestamp};
use axum::extract::{Path, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// How far back the machine detail view looks for alerts.
const RECENT_ALERT_DAYS: i64 = 7;

#[derive(Debug, Serialize)]
pub struct FleetStatus {
    pub timestamp: Timestamp,
    pub machines: BTreeMap<MachineId, Machine>,
    /// Mean health score across the fleet.
    pub system_health: f64,
    pub active_alerts: usize,
    pub total_machines: usize,
}

#[derive(Debug, Serialize)]
pub struct MachineDetail {
    pub machine: Machine,
    pub recent_alerts: Vec<Alert>,
    pub maintenance_history: Vec<MaintenanceLog>,
    pub historical_readings: Vec<TelemetrySample>,
}

/// GET /status
pub async fn get_status(State(state): State<AppState>) -> Json<DataResponse<FleetStatus>> {
    let machines = state.monitor.get_all_machines().await;
    let status = FleetStatus {
        timestamp: Utc::now(),
        total_machines: machines.len(),
        machines,
        system_health: state.monitor.system_health().await,
        active_alerts: state.monitor.active_alert_count().await,
    };
    Json(DataResponse { data: status })
}

/// GET /machines/{id}
pub async fn get_machine(
    State(state): State<AppState>,
    Path(machine_id): Path<String>,
) -> AppResult<Json<DataResponse<MachineDetail>>> {
    let machine = state
        .monitor
        .get_machine(&machine_id)
        .await
        .ok_or_else(|| CoreError::not_found("Machine", &machine_id))?;

    let since = Utc::now() - Duration::days(RECENT_ALERT_DAYS);
    let detail = MachineDetail {
        recent_alerts: state.monitor.alerts_for_machine(&machine_id, since).await,
        maintenance_history: state.monitor.maintenance_history(&machine_id).await,
        historical_readings: state
            .monitor
            .machine_history(&machine_id)
            .await
            .unwrap_or_default(),
        machine,
    };
    Ok(Json(DataResponse { data: detail }))
}
