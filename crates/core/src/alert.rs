//! Alert and alert-level types shared by the scorer, the alert rules and the
//! HTTP layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::telemetry::SensorReadings;
use crate::types::{MachineId, Timestamp};

/// Health bucket derived from a machine's health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Healthy,
    Warning,
    Critical,
    Danger,
}

impl AlertLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Danger => "danger",
        }
    }
}

/// Severity attached to an emitted alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
    Danger,
}

impl std::str::FromStr for AlertSeverity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "critical" => Ok(Self::Critical),
            "danger" => Ok(Self::Danger),
            other => Err(CoreError::Validation(format!(
                "Unknown severity '{other}'. Must be one of: info, warning, critical, danger"
            ))),
        }
    }
}

/// What condition raised the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    HighTemperature,
    ExcessiveVibration,
    HealthDegradation,
}

/// Snapshot of the machine's condition at the moment the alert fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDetails {
    pub health_score: f64,
    pub failure_probability: f64,
    pub sensor_readings: SensorReadings,
    pub potential_issues: Vec<String>,
    pub recommendation: String,
}

/// A deduplicated alert raised for one machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: Uuid,
    pub machine_id: MachineId,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub details: AlertDetails,
    pub timestamp: Timestamp,
    pub acknowledged: bool,
    pub resolved: bool,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn severity_parses_lowercase_names() {
        assert_eq!("danger".parse::<AlertSeverity>().unwrap(), AlertSeverity::Danger);
        assert_eq!("info".parse::<AlertSeverity>().unwrap(), AlertSeverity::Info);
    }

    #[test]
    fn unknown_severity_is_a_validation_error() {
        assert_matches!(
            "meltdown".parse::<AlertSeverity>(),
            Err(CoreError::Validation(msg)) if msg.contains("meltdown")
        );
    }
}
