//! Ad-hoc prediction and model reload.

use std::sync::Arc;

use aura_core::health::ScoreResult;
use aura_core::telemetry::SensorReadings;
use aura_core::types::Timestamp;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::model_store;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub sensor_data: SensorReadings,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: ScoreResult,
    pub timestamp: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub model: String,
    pub path: String,
}

/// POST /predict
///
/// Scores the submitted readings; nothing is stored and no alert is raised.
pub async fn predict(
    State(state): State<AppState>,
    Json(body): Json<PredictRequest>,
) -> AppResult<Json<DataResponse<PredictResponse>>> {
    let prediction = state.monitor.predict(body.sensor_data).await?;
    Ok(Json(DataResponse {
        data: PredictResponse {
            prediction,
            timestamp: Utc::now(),
        },
    }))
}

/// POST /model/reload
///
/// Re-reads the model file. The running model stays in place on failure.
pub async fn reload_model(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ReloadResponse>>> {
    let path = state.config.model_path.clone();
    let model = tokio::task::spawn_blocking({
        let path = path.clone();
        move || model_store::reload(&path)
    })
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))??;

    state.monitor.reload_model(Arc::new(model))?;
    tracing::info!(path = %path.display(), "Failure model reloaded");

    Ok(Json(DataResponse {
        data: ReloadResponse {
            model: state.monitor.model_name()?,
            path: path.display().to_string(),
        },
    }))
}
