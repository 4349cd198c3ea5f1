//! Feature extraction: raw sensor readings -> the fixed-order vector the
//! failure model consumes.

use serde::{Deserialize, Serialize};

use crate::telemetry::SensorReadings;

/// Number of features produced by [`FeatureVector::from_readings`].
pub const FEATURE_COUNT: usize = 9;

/// Feature names in model input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "temperature",
    "vibration",
    "rotation_speed",
    "load",
    "temp_deviation",
    "vibration_high",
    "speed_anomaly",
    "load_stress",
    "risk_score",
];

/// Nominal operating temperature used for the deviation feature.
pub const NOMINAL_TEMPERATURE: f64 = 75.0;

const RISK_TEMPERATURE: f64 = 85.0;
const HIGH_VIBRATION: f64 = 0.8;
const SPEED_LOW: f64 = 1400.0;
const SPEED_HIGH: f64 = 1600.0;
const LOAD_STRESS: f64 = 90.0;

fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

/// Model input derived from one set of readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn from_readings(r: &SensorReadings) -> Self {
        let vibration_high = flag(r.vibration > HIGH_VIBRATION);
        let risk_score = 2.0 * flag(r.temperature > RISK_TEMPERATURE)
            + 2.0 * vibration_high
            + flag(r.rotation_speed > SPEED_HIGH)
            + flag(r.load > LOAD_STRESS);

        Self([
            r.temperature,
            r.vibration,
            r.rotation_speed,
            r.load,
            (r.temperature - NOMINAL_TEMPERATURE).abs(),
            vibration_high,
            flag(r.rotation_speed < SPEED_LOW || r.rotation_speed > SPEED_HIGH),
            flag(r.load > LOAD_STRESS),
            risk_score,
        ])
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }
}
