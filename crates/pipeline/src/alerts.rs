//! Shared alert storage.
//!
//! One mutex guards the whole [`AlertLog`]: the cooldown scan, append and
//! eviction happen as a single step, and so does acknowledge's lookup and
//! flag flip.

use aura_core::alert::{Alert, AlertSeverity};
use aura_core::alerting::{AlertLog, AlertPolicy};
use aura_core::error::CoreError;
use aura_core::health::ScoreResult;
use aura_core::machine::Machine;
use aura_core::types::Timestamp;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug)]
pub struct AlertStore {
    log: Mutex<AlertLog>,
}

impl AlertStore {
    pub fn new(policy: AlertPolicy) -> Self {
        Self {
            log: Mutex::new(AlertLog::new(policy)),
        }
    }

    pub async fn maybe_alert(
        &self,
        machine: &Machine,
        score: &ScoreResult,
        now: Timestamp,
    ) -> Option<Alert> {
        self.log.lock().await.maybe_alert(machine, score, now)
    }

    pub async fn acknowledge(&self, alert_id: Uuid) -> Result<Alert, CoreError> {
        self.log.lock().await.acknowledge(alert_id)
    }

    pub async fn list(&self, severity: Option<AlertSeverity>, limit: usize) -> Vec<Alert> {
        self.log.lock().await.list(severity, limit)
    }

    pub async fn for_machine(&self, machine_id: &str, since: Timestamp) -> Vec<Alert> {
        self.log.lock().await.for_machine(machine_id, since)
    }

    pub async fn active_count(&self) -> usize {
        self.log.lock().await.active_count()
    }

    pub async fn len(&self) -> usize {
        self.log.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.log.lock().await.is_empty()
    }
}
