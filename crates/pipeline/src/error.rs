use aura_core::error::CoreError;
use aura_core::types::MachineId;

/// Errors raised while running a monitoring cycle.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Scoring for {machine_id} exceeded {timeout_ms} ms")]
    ScoringTimeout {
        machine_id: MachineId,
        timeout_ms: u64,
    },

    /// An earlier call for the same machine has not returned yet.
    #[error("Scoring for {machine_id} is still running a previous call")]
    ScoringBusy { machine_id: MachineId },

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    /// Every machine in the cycle failed.
    #[error("Monitoring cycle failed for all {failed} machines")]
    CycleFailed { failed: usize },
}
