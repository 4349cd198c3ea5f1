//! [`MonitorService`]: the shared state of the monitor and every operation
//! the outside world can perform on it.
//!
//! Held as `Arc<MonitorService>`. The scheduler is the only writer of scores
//! and alerts; request handlers read, acknowledge alerts and record
//! maintenance through the same locks.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use aura_core::alert::{Alert, AlertSeverity};
use aura_core::alerting::AlertPolicy;
use aura_core::config::{HealthThresholds, MonitorConfig};
use aura_core::error::CoreError;
use aura_core::health::{FailureModel, HealthScorer, ScoreResult};
use aura_core::machine::Machine;
use aura_core::maintenance::{MaintenanceLog, NewMaintenanceLog};
use aura_core::telemetry::{SensorReadings, TelemetrySample};
use aura_core::types::{MachineId, Timestamp};
use aura_events::{event_types, EventBus, MonitorEvent};
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::alerts::AlertStore;
use crate::error::PipelineError;
use crate::maintenance::MaintenanceBook;
use crate::registry::MachineRegistry;
use crate::scheduler::SchedulerStatus;
use crate::slots::ScoringSlots;

/// Machine id reported when an ad-hoc prediction times out.
const AD_HOC_SCORING: &str = "ad-hoc";

pub struct MonitorService {
    registry: MachineRegistry,
    alerts: AlertStore,
    maintenance: MaintenanceBook,
    scorer: HealthScorer,
    events: Arc<EventBus>,
    scoring_timeout: Duration,
    scoring_slots: ScoringSlots,
    status: RwLock<SchedulerStatus>,
}

impl MonitorService {
    /// Build the service for the configured fleet around an already loaded
    /// model.
    pub fn new(
        config: &MonitorConfig,
        model: Arc<dyn FailureModel>,
        events: Arc<EventBus>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let policy = AlertPolicy::new(config.alert_cooldown, config.max_alerts)?;
        Ok(Self {
            registry: MachineRegistry::new(&config.machines, Utc::now()),
            alerts: AlertStore::new(policy),
            maintenance: MaintenanceBook::new(),
            scorer: HealthScorer::new(model, config.thresholds),
            events,
            scoring_timeout: config.scoring_timeout,
            scoring_slots: ScoringSlots::default(),
            status: RwLock::new(SchedulerStatus::default()),
        })
    }

    pub fn registry(&self) -> &MachineRegistry {
        &self.registry
    }

    pub fn alerts(&self) -> &AlertStore {
        &self.alerts
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn thresholds(&self) -> &HealthThresholds {
        self.scorer.thresholds()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get_all_machines(&self) -> BTreeMap<MachineId, Machine> {
        self.registry.all().await
    }

    pub async fn get_machine(&self, machine_id: &str) -> Option<Machine> {
        self.registry.get(machine_id).await
    }

    pub async fn machine_history(&self, machine_id: &str) -> Option<Vec<TelemetrySample>> {
        self.registry.history(machine_id).await
    }

    /// Newest first.
    pub async fn list_alerts(&self, severity: Option<AlertSeverity>, limit: usize) -> Vec<Alert> {
        self.alerts.list(severity, limit).await
    }

    pub async fn alerts_for_machine(&self, machine_id: &str, since: Timestamp) -> Vec<Alert> {
        self.alerts.for_machine(machine_id, since).await
    }

    pub async fn maintenance_history(&self, machine_id: &str) -> Vec<MaintenanceLog> {
        self.maintenance.for_machine(machine_id).await
    }

    pub async fn system_health(&self) -> f64 {
        self.registry.system_health().await
    }

    pub async fn active_alert_count(&self) -> usize {
        self.alerts.active_count().await
    }

    pub async fn scheduler_status(&self) -> SchedulerStatus {
        self.status.read().await.clone()
    }

    /// Inference calls still running on the blocking pool, including ones
    /// whose caller already gave up on them.
    pub fn scoring_in_flight(&self) -> usize {
        self.scoring_slots.in_flight()
    }

    pub fn model_name(&self) -> Result<String, CoreError> {
        Ok(self.scorer.model()?.name().to_string())
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    pub async fn acknowledge_alert(&self, alert_id: Uuid) -> Result<Alert, CoreError> {
        let alert = self.alerts.acknowledge(alert_id).await?;
        tracing::info!(alert_id = %alert_id, machine_id = %alert.machine_id, "Alert acknowledged");
        self.events.publish(
            MonitorEvent::new(event_types::ALERT_ACKNOWLEDGED)
                .for_machine(alert.machine_id.clone())
                .with_payload(serde_json::json!({ "alert_id": alert_id })),
        );
        Ok(alert)
    }

    /// Log a maintenance activity and apply its effect on the machine.
    ///
    /// Unknown machines are rejected before anything is written.
    pub async fn record_maintenance(
        &self,
        request: NewMaintenanceLog,
    ) -> Result<MaintenanceLog, CoreError> {
        request.validate()?;
        let now = Utc::now();
        let machine = self
            .registry
            .apply_maintenance(
                &request.machine_id,
                request.activity_type,
                self.scorer.thresholds(),
                now,
            )
            .await?;

        let log = request.into_log(now);
        self.maintenance.append(log.clone()).await;

        tracing::info!(
            machine_id = %log.machine_id,
            activity_type = ?log.activity_type,
            health_score = machine.health_score,
            "Maintenance recorded"
        );
        self.events.publish(
            MonitorEvent::new(event_types::MAINTENANCE_RECORDED)
                .for_machine(log.machine_id.clone())
                .with_payload(serde_json::json!({
                    "log_id": log.log_id,
                    "activity_type": log.activity_type,
                    "health_score": machine.health_score,
                })),
        );
        Ok(log)
    }

    /// Score arbitrary readings without touching the registry or alerts.
    pub async fn predict(&self, readings: SensorReadings) -> Result<ScoreResult, PipelineError> {
        self.score_with_timeout(AD_HOC_SCORING, readings).await
    }

    /// Swap the failure model used by every later scoring call.
    pub fn reload_model(&self, model: Arc<dyn FailureModel>) -> Result<(), CoreError> {
        let name = model.name().to_string();
        self.scorer.replace_model(model)?;
        self.events.publish(
            MonitorEvent::new(event_types::MODEL_RELOADED)
                .with_payload(serde_json::json!({ "model": name })),
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Scheduler hooks
    // -----------------------------------------------------------------------

    /// Run inference on the blocking pool, bounded by the scoring timeout.
    ///
    /// At most one call per `machine_id` runs at a time. While an earlier
    /// call that timed out is still running, new calls fail with
    /// [`PipelineError::ScoringBusy`] without spawning anything.
    pub(crate) async fn score_with_timeout(
        &self,
        machine_id: &str,
        readings: SensorReadings,
    ) -> Result<ScoreResult, PipelineError> {
        let slot = self
            .scoring_slots
            .try_acquire(machine_id)
            .ok_or_else(|| PipelineError::ScoringBusy {
                machine_id: machine_id.to_string(),
            })?;
        let scorer = self.scorer.clone();
        let task = tokio::task::spawn_blocking(move || {
            let _slot = slot;
            scorer.score(&readings)
        });

        match tokio::time::timeout(self.scoring_timeout, task).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(e)) => Err(PipelineError::TaskFailed(e.to_string())),
            Err(_) => Err(PipelineError::ScoringTimeout {
                machine_id: machine_id.to_string(),
                timeout_ms: self.scoring_timeout.as_millis() as u64,
            }),
        }
    }

    pub(crate) async fn update_status(&self, f: impl FnOnce(&mut SchedulerStatus)) {
        f(&mut *self.status.write().await);
    }
}
