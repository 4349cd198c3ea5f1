use aura_core::error::CoreError;
use aura_pipeline::PipelineError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`PipelineError`] and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

fn internal(msg: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %msg, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::ModelUnavailable(msg) => {
            // The detail can name files on the server; it stays in the log.
            tracing::warn!(error = %msg, "Model unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "MODEL_UNAVAILABLE",
                "The failure model is unavailable".to_string(),
            )
        }
        CoreError::Internal(msg) => internal(msg),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core(core),
            AppError::Pipeline(err) => match err {
                PipelineError::Core(core) => classify_core(core),
                PipelineError::ScoringTimeout { .. } => {
                    tracing::warn!(error = %err, "Scoring timed out");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "SCORING_TIMEOUT",
                        err.to_string(),
                    )
                }
                PipelineError::ScoringBusy { .. } => {
                    tracing::warn!(error = %err, "Scoring still busy");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "SCORING_BUSY",
                        err.to_string(),
                    )
                }
                PipelineError::TaskFailed(msg) => internal(msg),
                PipelineError::CycleFailed { .. } => internal(&err.to_string()),
            },
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
