//! Health scoring: telemetry -> health score, failure probability, alert
//! level, issue list and recommendation.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::alert::AlertLevel;
use crate::config::HealthThresholds;
use crate::error::CoreError;
use crate::health::features::FeatureVector;
use crate::health::model::FailureModel;
use crate::telemetry::SensorReadings;

// ---------------------------------------------------------------------------
// Penalty thresholds
// ---------------------------------------------------------------------------

const TEMP_SEVERE: f64 = 95.0;
const TEMP_ELEVATED: f64 = 90.0;
const VIBRATION_SEVERE: f64 = 1.2;
const VIBRATION_ELEVATED: f64 = 1.0;
const LOAD_SEVERE: f64 = 95.0;

const ROTATION_HIGH: f64 = 1600.0;
const ROTATION_LOW: f64 = 1400.0;
const LOAD_HIGH: f64 = 90.0;

/// Result of scoring one set of readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// 0-100, one decimal place.
    pub health_score: f64,
    /// Raw model output in `[0, 1]`.
    pub failure_probability: f64,
    pub alert_level: AlertLevel,
    pub potential_issues: Vec<String>,
    pub recommendation: String,
}

// ---------------------------------------------------------------------------
// Pure scoring rules
// ---------------------------------------------------------------------------

/// Fail closed on anything that is not a finite probability.
pub fn check_probability(p: f64) -> Result<f64, CoreError> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(CoreError::ModelUnavailable(format!(
            "Model returned an invalid probability: {p}"
        )))
    }
}

/// Map a failure probability and readings to a health score.
///
/// Penalties are independent and multiplicative.
pub fn health_score(failure_probability: f64, r: &SensorReadings) -> f64 {
    let mut score = (100.0 * (1.0 - failure_probability)).clamp(0.0, 100.0);

    if r.temperature > TEMP_SEVERE {
        score *= 0.8;
    } else if r.temperature > TEMP_ELEVATED {
        score *= 0.9;
    }

    if r.vibration > VIBRATION_SEVERE {
        score *= 0.7;
    } else if r.vibration > VIBRATION_ELEVATED {
        score *= 0.85;
    }

    if r.load > LOAD_SEVERE {
        score *= 0.8;
    }

    round1(score.clamp(0.0, 100.0))
}

/// Bucket a health score.
///
/// Callers pass the score already rounded to one decimal, so a raw 79.96
/// lands on 80.0 and is `Healthy`.
pub fn alert_level(score: f64, thresholds: &HealthThresholds) -> AlertLevel {
    if score >= thresholds.healthy {
        AlertLevel::Healthy
    } else if score >= thresholds.warning {
        AlertLevel::Warning
    } else if score >= thresholds.critical {
        AlertLevel::Critical
    } else {
        AlertLevel::Danger
    }
}

/// Human-readable issues raised by individual channels.
pub fn potential_issues(r: &SensorReadings) -> Vec<String> {
    let mut issues = Vec::new();
    if r.temperature > TEMP_ELEVATED {
        issues.push("High temperature detected".to_string());
    }
    if r.vibration > VIBRATION_ELEVATED {
        issues.push("Excessive vibration".to_string());
    }
    if r.rotation_speed > ROTATION_HIGH {
        issues.push("High rotation speed".to_string());
    } else if r.rotation_speed < ROTATION_LOW {
        issues.push("Low rotation speed".to_string());
    }
    if r.load > LOAD_HIGH {
        issues.push("High load stress".to_string());
    }
    issues
}

pub fn recommendation(level: AlertLevel) -> &'static str {
    match level {
        AlertLevel::Healthy => "Continue normal operation",
        AlertLevel::Warning => "Schedule preventive maintenance within 1 week",
        AlertLevel::Critical => "Schedule maintenance within 24 hours",
        AlertLevel::Danger => "Stop operation and inspect immediately",
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// HealthScorer
// ---------------------------------------------------------------------------

/// Wraps an injected [`FailureModel`] with the deterministic scoring rules.
///
/// Cheap to clone; clones share the model slot, so [`replace_model`]
/// is visible to every holder.
///
/// [`replace_model`]: HealthScorer::replace_model
#[derive(Clone)]
pub struct HealthScorer {
    model: Arc<RwLock<Arc<dyn FailureModel>>>,
    thresholds: HealthThresholds,
}

impl HealthScorer {
    pub fn new(model: Arc<dyn FailureModel>, thresholds: HealthThresholds) -> Self {
        Self {
            model: Arc::new(RwLock::new(model)),
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &HealthThresholds {
        &self.thresholds
    }

    /// Snapshot of the current model.
    pub fn model(&self) -> Result<Arc<dyn FailureModel>, CoreError> {
        self.model
            .read()
            .map(|m| Arc::clone(&*m))
            .map_err(|_| CoreError::Internal("Model lock poisoned".to_string()))
    }

    /// Swap in a new model; in-flight scoring keeps the old one.
    pub fn replace_model(&self, model: Arc<dyn FailureModel>) -> Result<(), CoreError> {
        let mut slot = self
            .model
            .write()
            .map_err(|_| CoreError::Internal("Model lock poisoned".to_string()))?;
        tracing::info!(from = slot.name(), to = model.name(), "Failure model replaced");
        *slot = model;
        Ok(())
    }

    /// Score one set of readings. Blocking: runs model inference inline.
    ///
    /// The alert level is taken from the rounded health score.
    pub fn score(&self, readings: &SensorReadings) -> Result<ScoreResult, CoreError> {
        readings.validate()?;
        let features = FeatureVector::from_readings(readings);
        let model = self.model()?;
        let failure_probability = check_probability(model.predict_probability(&features)?)?;

        let health_score = health_score(failure_probability, readings);
        let alert_level = alert_level(health_score, &self.thresholds);

        Ok(ScoreResult {
            health_score,
            failure_probability,
            alert_level,
            potential_issues: potential_issues(readings),
            recommendation: recommendation(alert_level).to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    struct Fixed(f64);

    impl FailureModel for Fixed {
        fn predict_probability(&self, _: &FeatureVector) -> Result<f64, CoreError> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl FailureModel for Broken {
        fn predict_probability(&self, _: &FeatureVector) -> Result<f64, CoreError> {
            Err(CoreError::ModelUnavailable("weights missing".to_string()))
        }
    }

    fn nominal() -> SensorReadings {
        SensorReadings {
            temperature: 75.0,
            vibration: 0.4,
            rotation_speed: 1500.0,
            load: 80.0,
        }
    }

    fn scorer(p: f64) -> HealthScorer {
        HealthScorer::new(Arc::new(Fixed(p)), HealthThresholds::default())
    }

    #[test]
    fn nominal_machine_is_healthy() {
        let result = scorer(0.05).score(&nominal()).unwrap();
        assert_eq!(result.health_score, 95.0);
        assert_eq!(result.alert_level, AlertLevel::Healthy);
        assert!(result.potential_issues.is_empty());
        assert_eq!(result.recommendation, "Continue normal operation");
    }

    #[test]
    fn score_never_rises_across_penalty_crossings() {
        const P: f64 = 0.2;
        let steps = |from: f64, to: f64, n: usize| {
            (0..=n).map(move |i| from + (to - from) * i as f64 / n as f64)
        };
        let assert_non_increasing = |channel: &str, scores: Vec<f64>| {
            for pair in scores.windows(2) {
                assert!(pair[1] <= pair[0], "{channel}: {} then {}", pair[0], pair[1]);
            }
        };

        // 85..100 spans both the 90 and 95 temperature bands.
        let temperature: Vec<f64> = steps(85.0, 100.0, 300)
            .map(|t| health_score(P, &SensorReadings { temperature: t, ..nominal() }))
            .collect();
        assert_eq!(temperature.first(), Some(&80.0));
        assert_eq!(temperature.last(), Some(&64.0));
        assert_non_increasing("temperature", temperature);

        // 0.8..1.5 spans the 1.0 and 1.2 vibration bands.
        let vibration: Vec<f64> = steps(0.8, 1.5, 280)
            .map(|v| health_score(P, &SensorReadings { vibration: v, ..nominal() }))
            .collect();
        assert_eq!(vibration.last(), Some(&56.0));
        assert_non_increasing("vibration", vibration);

        let load: Vec<f64> = steps(90.0, 100.0, 200)
            .map(|l| health_score(P, &SensorReadings { load: l, ..nominal() }))
            .collect();
        assert_eq!(load.last(), Some(&64.0));
        assert_non_increasing("load", load);
    }

    #[test]
    fn level_uses_the_rounded_score() {
        assert_eq!(round1(79.96), 80.0);
        assert_eq!(alert_level(round1(79.96), &HealthThresholds::default()), AlertLevel::Healthy);
        assert_eq!(alert_level(79.9, &HealthThresholds::default()), AlertLevel::Warning);
    }

    #[test]
    fn penalties_multiply() {
        let r = SensorReadings {
            temperature: 96.0,
            vibration: 1.3,
            rotation_speed: 1500.0,
            load: 97.0,
        };
        // 100 * 0.8 * 0.7 * 0.8 = 44.8
        assert_eq!(health_score(0.0, &r), 44.8);
    }

    #[test]
    fn elevated_bands_use_the_milder_penalty() {
        let r = SensorReadings {
            temperature: 92.0,
            vibration: 1.1,
            ..nominal()
        };
        // 100 * 0.9 * 0.85 = 76.5
        assert_eq!(health_score(0.0, &r), 76.5);
    }

    #[test]
    fn score_is_monotone_in_probability() {
        let r = nominal();
        let mut prev = f64::INFINITY;
        for i in 0..=100 {
            let s = health_score(i as f64 / 100.0, &r);
            assert!(s <= prev);
            prev = s;
        }
    }

    #[test]
    fn level_boundaries_are_inclusive_below() {
        let t = HealthThresholds::default();
        assert_eq!(alert_level(80.0, &t), AlertLevel::Healthy);
        assert_eq!(alert_level(79.99, &t), AlertLevel::Warning);
        assert_eq!(alert_level(60.0, &t), AlertLevel::Warning);
        assert_eq!(alert_level(59.99, &t), AlertLevel::Critical);
        assert_eq!(alert_level(40.0, &t), AlertLevel::Critical);
        assert_eq!(alert_level(39.99, &t), AlertLevel::Danger);
    }

    #[test]
    fn issues_cover_each_channel() {
        let r = SensorReadings {
            temperature: 91.0,
            vibration: 1.05,
            rotation_speed: 1350.0,
            load: 92.0,
        };
        assert_eq!(
            potential_issues(&r),
            vec![
                "High temperature detected",
                "Excessive vibration",
                "Low rotation speed",
                "High load stress",
            ]
        );
    }

    #[test]
    fn recommendation_follows_level() {
        let result = scorer(0.5).score(&nominal()).unwrap();
        assert_eq!(result.alert_level, AlertLevel::Critical);
        assert_eq!(result.recommendation, "Schedule maintenance within 24 hours");
    }

    #[test]
    fn model_errors_propagate() {
        let scorer = HealthScorer::new(Arc::new(Broken), HealthThresholds::default());
        assert_matches!(scorer.score(&nominal()), Err(CoreError::ModelUnavailable(_)));
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        assert_matches!(scorer(1.5).score(&nominal()), Err(CoreError::ModelUnavailable(_)));
        assert_matches!(
            scorer(f64::NAN).score(&nominal()),
            Err(CoreError::ModelUnavailable(_))
        );
    }

    #[test]
    fn non_finite_readings_are_rejected() {
        let r = SensorReadings {
            load: f64::INFINITY,
            ..nominal()
        };
        assert_matches!(scorer(0.1).score(&r), Err(CoreError::Validation(_)));
    }

    #[test]
    fn replaced_model_is_seen_by_clones() {
        let original = scorer(0.05);
        let clone = original.clone();
        original.replace_model(Arc::new(Fixed(0.9))).unwrap();
        let result = clone.score(&nominal()).unwrap();
        assert_eq!(result.health_score, 10.0);
        assert_eq!(result.alert_level, AlertLevel::Danger);
    }
}
