//! The monitoring scheduler.
//!
//! [`MonitorScheduler`] runs as a single background task. Each tick walks
//! the fleet in configuration order: generate a sample, score it on the
//! blocking pool, install the result in the registry, then let the alert
//! rules look at it. A failure for one machine is logged and recorded in
//! the [`CycleReport`]; that machine keeps its previous record. A cycle in
//! which every machine failed counts as a failed cycle and is followed by a
//! recovery pause before the next attempt.

use std::sync::Arc;
use std::time::{Duration, Instant};

use aura_core::alert::Alert;
use aura_core::config::MonitorConfig;
use aura_core::telemetry::TelemetryGenerator;
use aura_core::types::{MachineId, Timestamp};
use aura_events::{event_types, MonitorEvent};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;
use crate::service::MonitorService;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    #[default]
    Idle,
    Running,
    Failed,
}

/// Observable progress of the scheduler, reported by the health endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub cycles_completed: u64,
    pub consecutive_failures: u32,
    pub last_cycle_at: Option<Timestamp>,
    pub last_error: Option<String>,
}

impl SchedulerStatus {
    /// The last cycle failed outright.
    pub fn is_degraded(&self) -> bool {
        self.state == SchedulerState::Failed
    }
}

/// A machine that could not be updated in a cycle.
#[derive(Debug, Clone, Serialize)]
pub struct MachineFailure {
    pub machine_id: MachineId,
    pub error: String,
}

/// Outcome of one completed cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: Timestamp,
    pub updated: usize,
    pub alerts_raised: usize,
    pub failures: Vec<MachineFailure>,
    pub duration_ms: u64,
}

// ---------------------------------------------------------------------------
// MonitorScheduler
// ---------------------------------------------------------------------------

pub struct MonitorScheduler<R = StdRng> {
    service: Arc<MonitorService>,
    generator: TelemetryGenerator<R>,
    tick_interval: Duration,
    recovery_interval: Duration,
}

impl MonitorScheduler<StdRng> {
    /// Scheduler for the configured fleet, seeded from `SIMULATION_SEED`
    /// when set.
    pub fn from_config(service: Arc<MonitorService>, config: &MonitorConfig) -> Self {
        let mut generator = match config.simulation_seed {
            Some(seed) => TelemetryGenerator::seeded(seed, config.degradation_chance),
            None => TelemetryGenerator::from_entropy(config.degradation_chance),
        };
        for spec in &config.machines {
            generator.register(spec.machine_id.clone(), spec.failure_pattern);
        }
        Self::new(
            service,
            generator,
            config.tick_interval,
            config.recovery_interval,
        )
    }
}

impl<R: Rng + Send> MonitorScheduler<R> {
    pub fn new(
        service: Arc<MonitorService>,
        generator: TelemetryGenerator<R>,
        tick_interval: Duration,
        recovery_interval: Duration,
    ) -> Self {
        Self {
            service,
            generator,
            tick_interval,
            recovery_interval,
        }
    }

    /// Direct access to the simulator, e.g. to force a degradation state.
    pub fn generator_mut(&mut self) -> &mut TelemetryGenerator<R> {
        &mut self.generator
    }

    /// Run cycles until `cancel` fires.
    ///
    /// Cancellation is only observed between cycles; a running cycle always
    /// completes.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            machines = self.service.registry().len(),
            tick_ms = self.tick_interval.as_millis() as u64,
            "Monitoring scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            if let Err(e) = self.run_cycle().await {
                tracing::error!(
                    error = %e,
                    retry_in_ms = self.recovery_interval.as_millis() as u64,
                    "Monitoring cycle failed"
                );
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.recovery_interval) => {}
                }
                interval.reset();
            }
        }

        self.service
            .update_status(|s| {
                if s.state == SchedulerState::Running {
                    s.state = SchedulerState::Idle;
                }
            })
            .await;
        tracing::info!("Monitoring scheduler stopped");
    }

    /// Run one fleet-wide update.
    ///
    /// Returns [`PipelineError::CycleFailed`] only when every machine failed.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, PipelineError> {
        let started = Instant::now();
        let started_at = Utc::now();
        self.service
            .update_status(|s| s.state = SchedulerState::Running)
            .await;

        let service = Arc::clone(&self.service);
        let ids = service.registry().ids();
        let mut report = CycleReport {
            started_at,
            updated: 0,
            alerts_raised: 0,
            failures: Vec::new(),
            duration_ms: 0,
        };

        for machine_id in ids {
            match self.update_machine(machine_id).await {
                Ok(alert) => {
                    report.updated += 1;
                    if alert.is_some() {
                        report.alerts_raised += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(machine_id = %machine_id, error = %e, "Machine update failed");
                    report.failures.push(MachineFailure {
                        machine_id: machine_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report.duration_ms = started.elapsed().as_millis() as u64;

        if !ids.is_empty() && report.failures.len() == ids.len() {
            let err = PipelineError::CycleFailed {
                failed: report.failures.len(),
            };
            let message = err.to_string();
            service
                .update_status(|s| {
                    s.state = SchedulerState::Failed;
                    s.consecutive_failures += 1;
                    s.last_cycle_at = Some(started_at);
                    s.last_error = Some(message.clone());
                })
                .await;
            service.events().publish(
                MonitorEvent::new(event_types::CYCLE_FAILED).with_payload(serde_json::json!({
                    "error": message,
                    "failures": report.failures,
                })),
            );
            return Err(err);
        }

        service
            .update_status(|s| {
                s.state = SchedulerState::Idle;
                s.cycles_completed += 1;
                s.consecutive_failures = 0;
                s.last_cycle_at = Some(started_at);
                s.last_error = report.failures.first().map(|f| f.error.clone());
            })
            .await;
        service.events().publish(
            MonitorEvent::new(event_types::CYCLE_COMPLETED).with_payload(serde_json::json!({
                "updated": report.updated,
                "alerts_raised": report.alerts_raised,
                "failed": report.failures.len(),
                "duration_ms": report.duration_ms,
            })),
        );
        tracing::debug!(
            updated = report.updated,
            failed = report.failures.len(),
            alerts = report.alerts_raised,
            duration_ms = report.duration_ms,
            "Monitoring cycle completed"
        );

        Ok(report)
    }

    /// Generate, score, store and alert for one machine.
    async fn update_machine(&mut self, machine_id: &str) -> Result<Option<Alert>, PipelineError> {
        let now = Utc::now();
        let sample = self.generator.sample(machine_id, now)?;
        let score = self
            .service
            .score_with_timeout(machine_id, sample.readings)
            .await?;
        let machine = self
            .service
            .registry()
            .apply_score(machine_id, sample, &score)
            .await?;

        let alert = self.service.alerts().maybe_alert(&machine, &score, now).await;
        if let Some(alert) = &alert {
            self.service.events().publish(
                MonitorEvent::new(event_types::ALERT_RAISED)
                    .for_machine(machine_id)
                    .with_payload(serde_json::json!({
                        "alert_id": alert.alert_id,
                        "severity": alert.severity,
                        "alert_type": alert.alert_type,
                        "message": alert.message,
                    })),
            );
        }
        Ok(alert)
    }
}
