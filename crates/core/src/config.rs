//! Monitor configuration: fleet definition, scheduler timing, alert policy
//! and health-score thresholds.
//!
//! Everything is read once at startup. [`MonitorConfig::from_env`] reads
//! process environment variables; [`MonitorConfig::from_lookup`] takes any
//! key lookup so tests do not have to touch the real environment.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::telemetry::{FailurePattern, DEFAULT_TRANSITION_CHANCE};
use crate::types::MachineId;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_RECOVERY_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_SCORING_TIMEOUT_MS: u64 = 1_000;
pub const DEFAULT_ALERT_COOLDOWN_SECS: u64 = 300;
pub const DEFAULT_MAX_ALERTS: usize = 100;

// ---------------------------------------------------------------------------
// HealthThresholds
// ---------------------------------------------------------------------------

/// Lower bounds (inclusive) of each alert level on the 0-100 health scale.
///
/// Scores at or above `healthy` are healthy, at or above `warning` are a
/// warning, at or above `critical` are critical, anything lower is danger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthThresholds {
    pub healthy: f64,
    pub warning: f64,
    pub critical: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            healthy: 80.0,
            warning: 60.0,
            critical: 40.0,
        }
    }
}

impl HealthThresholds {
    /// Thresholds must lie in `0..=100` and be strictly descending.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("healthy", self.healthy),
            ("warning", self.warning),
            ("critical", self.critical),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(CoreError::Validation(format!(
                    "{name} threshold must be between 0 and 100, got {value}"
                )));
            }
        }
        if !(self.healthy > self.warning && self.warning > self.critical) {
            return Err(CoreError::Validation(
                "Health thresholds must satisfy healthy > warning > critical".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MachineSpec
// ---------------------------------------------------------------------------

/// Static description of one monitored machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSpec {
    pub machine_id: MachineId,
    pub name: String,
    #[serde(rename = "type")]
    pub machine_type: String,
    pub location: String,
    #[serde(default)]
    pub install_date: Option<NaiveDate>,
    pub failure_pattern: FailurePattern,
}

impl MachineSpec {
    fn new(
        machine_id: &str,
        name: &str,
        machine_type: &str,
        location: &str,
        install_date: (i32, u32, u32),
        failure_pattern: FailurePattern,
    ) -> Self {
        Self {
            machine_id: machine_id.to_string(),
            name: name.to_string(),
            machine_type: machine_type.to_string(),
            location: location.to_string(),
            install_date: NaiveDate::from_ymd_opt(install_date.0, install_date.1, install_date.2),
            failure_pattern,
        }
    }
}

/// The built-in five-machine plant used when no machines file is configured.
pub fn default_fleet() -> Vec<MachineSpec> {
    vec![
        MachineSpec::new(
            "Machine_001",
            "Conveyor Belt A",
            "Conveyor",
            "Production Line 1",
            (2022, 1, 15),
            FailurePattern::VibrationHigh,
        ),
        MachineSpec::new(
            "Machine_002",
            "Hydraulic Press B",
            "Press",
            "Assembly Bay 2",
            (2021, 8, 20),
            FailurePattern::TemperatureHigh,
        ),
        MachineSpec::new(
            "Machine_003",
            "Motor Drive C",
            "Motor",
            "Power Station",
            (2020, 11, 10),
            FailurePattern::RotationAnomaly,
        ),
        MachineSpec::new(
            "Machine_004",
            "Compressor D",
            "Compressor",
            "Utility Room",
            (2023, 3, 5),
            FailurePattern::LoadHigh,
        ),
        MachineSpec::new(
            "Machine_005",
            "Pump System E",
            "Pump",
            "Cooling Circuit",
            (2022, 9, 12),
            FailurePattern::TemperatureVibration,
        ),
    ]
}

// ---------------------------------------------------------------------------
// MonitorConfig
// ---------------------------------------------------------------------------

/// Configuration for the monitoring pipeline.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between scheduler ticks.
    pub tick_interval: Duration,
    /// Back-off after a failed cycle.
    pub recovery_interval: Duration,
    /// Upper bound on a single scoring call.
    pub scoring_timeout: Duration,
    /// Minimum gap between two alerts for the same machine.
    pub alert_cooldown: Duration,
    /// Maximum number of alerts retained in memory.
    pub max_alerts: usize,
    pub thresholds: HealthThresholds,
    /// Per-tick chance that a degradation state transition is attempted.
    pub degradation_chance: f64,
    /// Fixed seed for the telemetry simulator; `None` seeds from the OS.
    pub simulation_seed: Option<u64>,
    pub machines: Vec<MachineSpec>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS),
            recovery_interval: Duration::from_secs(DEFAULT_RECOVERY_INTERVAL_SECS),
            scoring_timeout: Duration::from_millis(DEFAULT_SCORING_TIMEOUT_MS),
            alert_cooldown: Duration::from_secs(DEFAULT_ALERT_COOLDOWN_SECS),
            max_alerts: DEFAULT_MAX_ALERTS,
            thresholds: HealthThresholds::default(),
            degradation_chance: DEFAULT_TRANSITION_CHANCE,
            simulation_seed: None,
            machines: default_fleet(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default            |
    /// |-----------------------------|--------------------|
    /// | `TICK_INTERVAL_SECS`        | `3`                |
    /// | `RECOVERY_INTERVAL_SECS`    | `5`                |
    /// | `SCORING_TIMEOUT_MS`        | `1000`             |
    /// | `ALERT_COOLDOWN_SECS`       | `300`              |
    /// | `MAX_ALERTS`                | `100`              |
    /// | `HEALTH_THRESHOLD_HEALTHY`  | `80`               |
    /// | `HEALTH_THRESHOLD_WARNING`  | `60`               |
    /// | `HEALTH_THRESHOLD_CRITICAL` | `40`               |
    /// | `DEGRADATION_CHANCE`        | `0.02`             |
    /// | `SIMULATION_SEED`           | unset (OS entropy) |
    /// | `MACHINES_FILE`             | built-in fleet     |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();

        let thresholds = HealthThresholds {
            healthy: parse_or(&lookup, "HEALTH_THRESHOLD_HEALTHY", defaults.thresholds.healthy)?,
            warning: parse_or(&lookup, "HEALTH_THRESHOLD_WARNING", defaults.thresholds.warning)?,
            critical: parse_or(
                &lookup,
                "HEALTH_THRESHOLD_CRITICAL",
                defaults.thresholds.critical,
            )?,
        };

        let machines = match lookup("MACHINES_FILE") {
            Some(path) => load_machines_file(&path)?,
            None => defaults.machines,
        };

        let seed = match lookup("SIMULATION_SEED") {
            Some(raw) => Some(parse_value::<u64>("SIMULATION_SEED", &raw)?),
            None => None,
        };

        let config = Self {
            tick_interval: Duration::from_secs(parse_or(
                &lookup,
                "TICK_INTERVAL_SECS",
                DEFAULT_TICK_INTERVAL_SECS,
            )?),
            recovery_interval: Duration::from_secs(parse_or(
                &lookup,
                "RECOVERY_INTERVAL_SECS",
                DEFAULT_RECOVERY_INTERVAL_SECS,
            )?),
            scoring_timeout: Duration::from_millis(parse_or(
                &lookup,
                "SCORING_TIMEOUT_MS",
                DEFAULT_SCORING_TIMEOUT_MS,
            )?),
            alert_cooldown: Duration::from_secs(parse_or(
                &lookup,
                "ALERT_COOLDOWN_SECS",
                DEFAULT_ALERT_COOLDOWN_SECS,
            )?),
            max_alerts: parse_or(&lookup, "MAX_ALERTS", DEFAULT_MAX_ALERTS)?,
            thresholds,
            degradation_chance: parse_or(
                &lookup,
                "DEGRADATION_CHANCE",
                DEFAULT_TRANSITION_CHANCE,
            )?,
            simulation_seed: seed,
            machines,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.tick_interval.is_zero() {
            return Err(CoreError::Validation(
                "Tick interval must be greater than zero".to_string(),
            ));
        }
        if self.scoring_timeout.is_zero() {
            return Err(CoreError::Validation(
                "Scoring timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_alerts == 0 {
            return Err(CoreError::Validation(
                "MAX_ALERTS must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.degradation_chance) {
            return Err(CoreError::Validation(format!(
                "Degradation chance must be between 0 and 1, got {}",
                self.degradation_chance
            )));
        }
        self.thresholds.validate()?;

        if self.machines.is_empty() {
            return Err(CoreError::Validation(
                "At least one machine must be configured".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(self.machines.len());
        for spec in &self.machines {
            if spec.machine_id.trim().is_empty() {
                return Err(CoreError::Validation(
                    "Machine id must not be empty".to_string(),
                ));
            }
            if !seen.insert(spec.machine_id.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate machine id: \"{}\"",
                    spec.machine_id
                )));
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::Validation(format!("{key} has an invalid value: \"{raw}\"")))
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CoreError> {
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

/// Read a JSON array of [`MachineSpec`]s.
pub fn load_machines_file(path: &str) -> Result<Vec<MachineSpec>, CoreError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CoreError::Validation(format!("Cannot read machines file {path}: {e}")))?;
    serde_json::from_str(&raw)
        .map_err(|e| CoreError::Validation(format!("Invalid machines file {path}: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use assert_matches::assert_matches;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = MonitorConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.tick_interval, Duration::from_secs(3));
        assert_eq!(config.alert_cooldown, Duration::from_secs(300));
        assert_eq!(config.max_alerts, 100);
        assert_eq!(config.thresholds, HealthThresholds::default());
        assert_eq!(config.machines.len(), 5);
        assert_eq!(
            config.machines[1].failure_pattern,
            FailurePattern::TemperatureHigh
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let config = MonitorConfig::from_lookup(lookup_from(&[
            ("TICK_INTERVAL_SECS", "10"),
            ("MAX_ALERTS", "5"),
            ("HEALTH_THRESHOLD_WARNING", "55.5"),
            ("SIMULATION_SEED", "42"),
        ]))
        .unwrap();
        assert_eq!(config.tick_interval, Duration::from_secs(10));
        assert_eq!(config.max_alerts, 5);
        assert_eq!(config.thresholds.warning, 55.5);
        assert_eq!(config.simulation_seed, Some(42));
    }

    #[test]
    fn malformed_value_is_rejected() {
        let result = MonitorConfig::from_lookup(lookup_from(&[("MAX_ALERTS", "lots")]));
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg.contains("MAX_ALERTS"));
    }

    #[test]
    fn zero_max_alerts_is_rejected() {
        let result = MonitorConfig::from_lookup(lookup_from(&[("MAX_ALERTS", "0")]));
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn thresholds_must_descend() {
        let thresholds = HealthThresholds {
            healthy: 60.0,
            warning: 80.0,
            critical: 40.0,
        };
        assert_matches!(thresholds.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn duplicate_machine_ids_are_rejected() {
        let mut config = MonitorConfig::default();
        config.machines.push(config.machines[0].clone());
        assert_matches!(config.validate(), Err(CoreError::Validation(msg)) if msg.contains("Duplicate"));
    }

    #[test]
    fn machines_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"machine_id":"M1","name":"Kiln","type":"Oven","location":"Bay 9","failure_pattern":"temperature_high"}}]"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config =
            MonitorConfig::from_lookup(lookup_from(&[("MACHINES_FILE", path.as_str())])).unwrap();
        assert_eq!(config.machines.len(), 1);
        assert_eq!(config.machines[0].machine_type, "Oven");
        assert_eq!(config.machines[0].install_date, None);
        assert_eq!(
            config.machines[0].failure_pattern,
            FailurePattern::TemperatureHigh
        );
    }
}
