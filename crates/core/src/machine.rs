//! The authoritative per-machine record.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::alert::AlertLevel;
use crate::config::{HealthThresholds, MachineSpec};
use crate::health::scorer::{alert_level, recommendation, ScoreResult};
use crate::maintenance::{ActivityType, MAINTENANCE_HEALTH_BONUS, MAINTENANCE_INTERVAL_DAYS};
use crate::telemetry::{FailurePattern, TelemetrySample};
use crate::types::{MachineId, Timestamp};

/// Days before startup that machines are assumed to have last been serviced.
pub const INITIAL_MAINTENANCE_AGE_DAYS: i64 = 30;

/// Live state of one monitored machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub machine_id: MachineId,
    pub name: String,
    #[serde(rename = "type")]
    pub machine_type: String,
    pub location: String,
    pub install_date: Option<NaiveDate>,
    pub failure_pattern: FailurePattern,
    /// `None` until the first completed cycle.
    pub current_readings: Option<TelemetrySample>,
    pub health_score: f64,
    pub failure_probability: f64,
    pub alert_level: AlertLevel,
    pub potential_issues: Vec<String>,
    pub recommendation: String,
    pub last_updated: Option<Timestamp>,
    pub last_maintenance: Timestamp,
    pub next_maintenance: Timestamp,
}

impl Machine {
    /// Fresh record: fully healthy, no readings yet.
    pub fn from_spec(spec: &MachineSpec, now: Timestamp) -> Self {
        Self {
            machine_id: spec.machine_id.clone(),
            name: spec.name.clone(),
            machine_type: spec.machine_type.clone(),
            location: spec.location.clone(),
            install_date: spec.install_date,
            failure_pattern: spec.failure_pattern,
            current_readings: None,
            health_score: 100.0,
            failure_probability: 0.0,
            alert_level: AlertLevel::Healthy,
            potential_issues: Vec::new(),
            recommendation: recommendation(AlertLevel::Healthy).to_string(),
            last_updated: None,
            last_maintenance: now - Duration::days(INITIAL_MAINTENANCE_AGE_DAYS),
            next_maintenance: now + Duration::days(MAINTENANCE_INTERVAL_DAYS),
        }
    }

    /// Copy of this record with a new sample and its score applied.
    pub fn with_score(&self, sample: TelemetrySample, score: &ScoreResult) -> Self {
        Self {
            current_readings: Some(sample),
            health_score: score.health_score,
            failure_probability: score.failure_probability,
            alert_level: score.alert_level,
            potential_issues: score.potential_issues.clone(),
            recommendation: score.recommendation.clone(),
            last_updated: Some(sample.timestamp),
            ..self.clone()
        }
    }

    /// Apply a maintenance activity performed at `now`.
    ///
    /// Repairs and replacements add health points (capped at 100); every
    /// activity resets the maintenance schedule.
    pub fn apply_maintenance(
        &mut self,
        activity: ActivityType,
        thresholds: &HealthThresholds,
        now: Timestamp,
    ) {
        if activity.restores_health() {
            self.health_score = (self.health_score + MAINTENANCE_HEALTH_BONUS).min(100.0);
            self.alert_level = alert_level(self.health_score, thresholds);
            self.recommendation = recommendation(self.alert_level).to_string();
        }
        self.last_maintenance = now;
        self.next_maintenance = now + Duration::days(MAINTENANCE_INTERVAL_DAYS);
    }
}
