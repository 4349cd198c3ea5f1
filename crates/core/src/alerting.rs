//! Alert rules and the bounded alert log.
//!
//! Pure logic, no locking. The caller owns the [`AlertLog`] (in the pipeline
//! it sits behind a single mutex) and passes in the freshly scored machine.

use std::collections::VecDeque;

use chrono::TimeDelta;
use uuid::Uuid;

use crate::alert::{Alert, AlertDetails, AlertLevel, AlertSeverity, AlertType};
use crate::error::CoreError;
use crate::health::scorer::ScoreResult;
use crate::machine::Machine;
use crate::telemetry::SensorReadings;
use crate::types::Timestamp;

/// Temperature that raises a dedicated critical alert.
pub const ALERT_TEMPERATURE: f64 = 95.0;
/// Vibration that raises a dedicated critical alert.
pub const ALERT_VIBRATION: f64 = 1.2;
/// Warning-level machines only alert once their score falls below this.
pub const WARNING_ALERT_SCORE: f64 = 70.0;

// ---------------------------------------------------------------------------
// Trigger rules
// ---------------------------------------------------------------------------

/// What an alert would say if the cooldown allows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
}

/// Pick the single highest-priority trigger for a scored machine.
///
/// Sensor-specific triggers outrank level-based ones.
pub fn evaluate_trigger(
    machine_name: &str,
    readings: &SensorReadings,
    score: &ScoreResult,
) -> Option<Trigger> {
    let trigger = |alert_type, severity, message: String| Trigger {
        alert_type,
        severity,
        message,
    };

    if readings.temperature > ALERT_TEMPERATURE {
        return Some(trigger(
            AlertType::HighTemperature,
            AlertSeverity::Critical,
            format!(
                "HIGH TEMPERATURE: {machine_name} - {:.1}°C",
                readings.temperature
            ),
        ));
    }
    if readings.vibration > ALERT_VIBRATION {
        return Some(trigger(
            AlertType::ExcessiveVibration,
            AlertSeverity::Critical,
            format!("EXCESSIVE VIBRATION: {machine_name} - {:.2}", readings.vibration),
        ));
    }

    match score.alert_level {
        AlertLevel::Danger => Some(trigger(
            AlertType::HealthDegradation,
            AlertSeverity::Danger,
            format!("CRITICAL: {machine_name} requires immediate attention"),
        )),
        AlertLevel::Critical => Some(trigger(
            AlertType::HealthDegradation,
            AlertSeverity::Critical,
            format!("WARNING: {machine_name} showing signs of deterioration"),
        )),
        AlertLevel::Warning if score.health_score < WARNING_ALERT_SCORE => Some(trigger(
            AlertType::HealthDegradation,
            AlertSeverity::Warning,
            format!("NOTICE: {machine_name} health score declining"),
        )),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// AlertLog
// ---------------------------------------------------------------------------

/// Cooldown and retention settings.
#[derive(Debug, Clone, Copy)]
pub struct AlertPolicy {
    pub cooldown: TimeDelta,
    pub max_alerts: usize,
}

impl AlertPolicy {
    pub fn new(cooldown: std::time::Duration, max_alerts: usize) -> Result<Self, CoreError> {
        if max_alerts == 0 {
            return Err(CoreError::Validation(
                "max_alerts must be at least 1".to_string(),
            ));
        }
        let cooldown = TimeDelta::from_std(cooldown)
            .map_err(|e| CoreError::Validation(format!("Alert cooldown out of range: {e}")))?;
        Ok(Self {
            cooldown,
            max_alerts,
        })
    }
}

/// Bounded, insertion-ordered alert history (oldest at the front).
#[derive(Debug)]
pub struct AlertLog {
    alerts: VecDeque<Alert>,
    policy: AlertPolicy,
}

impl AlertLog {
    pub fn new(policy: AlertPolicy) -> Self {
        Self {
            alerts: VecDeque::with_capacity(policy.max_alerts.min(1024)),
            policy,
        }
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    /// Whether any alert for `machine_id` is younger than the cooldown.
    pub fn in_cooldown(&self, machine_id: &str, now: Timestamp) -> bool {
        self.alerts
            .iter()
            .rev()
            .any(|a| a.machine_id == machine_id && now - a.timestamp < self.policy.cooldown)
    }

    /// Evaluate a freshly scored machine and record an alert if one fires.
    ///
    /// Returns the new alert, or `None` when nothing triggered or the
    /// machine is still cooling down. Severity does not bypass the cooldown.
    pub fn maybe_alert(
        &mut self,
        machine: &Machine,
        score: &ScoreResult,
        now: Timestamp,
    ) -> Option<Alert> {
        let readings = machine.current_readings?.readings;
        let trigger = evaluate_trigger(&machine.name, &readings, score)?;

        if self.in_cooldown(&machine.machine_id, now) {
            tracing::debug!(
                machine_id = %machine.machine_id,
                severity = ?trigger.severity,
                "Alert suppressed by cooldown"
            );
            return None;
        }

        let alert = Alert {
            alert_id: Uuid::now_v7(),
            machine_id: machine.machine_id.clone(),
            alert_type: trigger.alert_type,
            severity: trigger.severity,
            message: trigger.message,
            details: AlertDetails {
                health_score: score.health_score,
                failure_probability: score.failure_probability,
                sensor_readings: readings,
                potential_issues: score.potential_issues.clone(),
                recommendation: score.recommendation.clone(),
            },
            timestamp: now,
            acknowledged: false,
            resolved: false,
        };

        tracing::info!(
            machine_id = %alert.machine_id,
            alert_id = %alert.alert_id,
            severity = ?alert.severity,
            message = %alert.message,
            "Alert raised"
        );
        self.push(alert.clone());
        Some(alert)
    }

    /// Append an alert and evict from the front while over capacity.
    ///
    /// Returns the number of evicted alerts.
    pub fn push(&mut self, alert: Alert) -> usize {
        self.alerts.push_back(alert);
        let mut evicted = 0;
        while self.alerts.len() > self.policy.max_alerts {
            self.alerts.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Mark an alert acknowledged. Idempotent.
    pub fn acknowledge(&mut self, alert_id: Uuid) -> Result<Alert, CoreError> {
        let alert = self
            .alerts
            .iter_mut()
            .find(|a| a.alert_id == alert_id)
            .ok_or_else(|| CoreError::not_found("Alert", alert_id))?;
        alert.acknowledged = true;
        Ok(alert.clone())
    }

    /// Newest first, optionally filtered by severity.
    pub fn list(&self, severity: Option<AlertSeverity>, limit: usize) -> Vec<Alert> {
        self.alerts
            .iter()
            .rev()
            .filter(|a| severity.map_or(true, |s| a.severity == s))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Alerts for one machine created at or after `since`, newest first.
    pub fn for_machine(&self, machine_id: &str, since: Timestamp) -> Vec<Alert> {
        self.alerts
            .iter()
            .rev()
            .filter(|a| a.machine_id == machine_id && a.timestamp >= since)
            .cloned()
            .collect()
    }

    /// Number of alerts not yet resolved.
    pub fn active_count(&self) -> usize {
        self.alerts.iter().filter(|a| !a.resolved).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
