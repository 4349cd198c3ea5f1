//! The failure-model seam and its production backend.
//!
//! [`FailureModel`] is the only thing the scorer knows about inference. The
//! shipped implementation, [`LogisticModel`], is a standardized logistic
//! regression persisted as a small JSON document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::health::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::types::Timestamp;

/// Current on-disk format version for [`LogisticModel`].
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Binary classifier estimating the probability that a machine is in a
/// failure-precursor state.
///
/// Implementations must be callable from any thread; the scheduler runs
/// inference on the blocking pool.
pub trait FailureModel: Send + Sync {
    /// Probability in `[0, 1]`. Errors are propagated to the caller as-is.
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, CoreError>;

    /// Short label used in logs and health reports.
    fn name(&self) -> &str {
        "model"
    }
}

// ---------------------------------------------------------------------------
// LogisticModel
// ---------------------------------------------------------------------------

/// Standardized logistic regression over the nine health features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub version: u32,
    pub feature_names: Vec<String>,
    /// Per-feature mean subtracted before weighting.
    pub means: Vec<f64>,
    /// Per-feature standard deviation divided out before weighting.
    pub scales: Vec<f64>,
    pub weights: Vec<f64>,
    pub bias: f64,
    #[serde(default)]
    pub trained_at: Option<Timestamp>,
}

impl LogisticModel {
    /// Build a model from fitted parameters, checking shapes.
    pub fn new(
        means: Vec<f64>,
        scales: Vec<f64>,
        weights: Vec<f64>,
        bias: f64,
        trained_at: Option<Timestamp>,
    ) -> Result<Self, CoreError> {
        let model = Self {
            version: MODEL_FORMAT_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            means,
            scales,
            weights,
            bias,
            trained_at,
        };
        model.validate()?;
        Ok(model)
    }

    /// Parameters must match the feature layout and be finite.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.version != MODEL_FORMAT_VERSION {
            return Err(CoreError::ModelUnavailable(format!(
                "Unsupported model format version {} (expected {MODEL_FORMAT_VERSION})",
                self.version
            )));
        }
        for (name, len) in [
            ("feature_names", self.feature_names.len()),
            ("means", self.means.len()),
            ("scales", self.scales.len()),
            ("weights", self.weights.len()),
        ] {
            if len != FEATURE_COUNT {
                return Err(CoreError::ModelUnavailable(format!(
                    "Model {name} has {len} entries, expected {FEATURE_COUNT}"
                )));
            }
        }
        if self
            .feature_names
            .iter()
            .zip(FEATURE_NAMES)
            .any(|(have, want)| have != want)
        {
            return Err(CoreError::ModelUnavailable(
                "Model feature names do not match the expected feature order".to_string(),
            ));
        }
        let finite = self
            .means
            .iter()
            .chain(&self.weights)
            .chain(std::iter::once(&self.bias))
            .all(|v| v.is_finite());
        if !finite {
            return Err(CoreError::ModelUnavailable(
                "Model parameters must be finite".to_string(),
            ));
        }
        if self.scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(CoreError::ModelUnavailable(
                "Model scales must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Read and validate a model file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::ModelUnavailable(format!("Cannot read model {}: {e}", path.display()))
        })?;
        let model: Self = serde_json::from_str(&raw).map_err(|e| {
            CoreError::ModelUnavailable(format!("Malformed model {}: {e}", path.display()))
        })?;
        model.validate()?;
        Ok(model)
    }

    /// Write the model as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CoreError::Internal(format!("Cannot create {}: {e}", parent.display()))
            })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Internal(format!("Cannot serialize model: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| CoreError::Internal(format!("Cannot write {}: {e}", path.display())))
    }

    /// Linear score before the sigmoid.
    pub fn logit(&self, features: &FeatureVector) -> f64 {
        features
            .values()
            .iter()
            .zip(&self.means)
            .zip(&self.scales)
            .zip(&self.weights)
            .map(|(((x, mean), scale), weight)| weight * (x - mean) / scale)
            .sum::<f64>()
            + self.bias
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl FailureModel for LogisticModel {
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, CoreError> {
        Ok(sigmoid(self.logit(features)))
    }

    fn name(&self) -> &str {
        "logistic"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn identity_model(weights: [f64; FEATURE_COUNT], bias: f64) -> LogisticModel {
        LogisticModel::new(
            vec![0.0; FEATURE_COUNT],
            vec![1.0; FEATURE_COUNT],
            weights.to_vec(),
            bias,
            None,
        )
        .unwrap()
    }

    #[test]
    fn sigmoid_is_symmetric_and_bounded() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(3.0) + sigmoid(-3.0) - 1.0).abs() < 1e-12);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert_eq!(sigmoid(1000.0), 1.0);
    }

    #[test]
    fn prediction_uses_standardized_inputs() {
        let mut weights = [0.0; FEATURE_COUNT];
        weights[8] = 1.0;
        let mut model = identity_model(weights, -3.0);
        model.means[8] = 1.0;
        model.scales[8] = 2.0;

        // risk_score 7 -> (7 - 1) / 2 - 3 = 0 -> p = 0.5
        let mut x = [0.0; FEATURE_COUNT];
        x[8] = 7.0;
        let p = model.predict_probability(&FeatureVector(x)).unwrap();
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn save_then_load_preserves_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let model = identity_model([0.5; FEATURE_COUNT], 0.25);

        model.save(&path).unwrap();
        assert_eq!(LogisticModel::load(&path).unwrap(), model);
    }

    #[test]
    fn missing_file_is_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = LogisticModel::load(&dir.path().join("absent.json"));
        assert_matches!(result, Err(CoreError::ModelUnavailable(_)));
    }

    #[test]
    fn malformed_file_is_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_matches!(
            LogisticModel::load(&path),
            Err(CoreError::ModelUnavailable(msg)) if msg.contains("Malformed")
        );
    }

    #[test]
    fn feature_count_mismatch_is_rejected() {
        let result = LogisticModel::new(vec![0.0; 4], vec![1.0; 4], vec![0.0; 4], 0.0, None);
        assert_matches!(result, Err(CoreError::ModelUnavailable(msg)) if msg.contains("expected 9"));
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let mut scales = vec![1.0; FEATURE_COUNT];
        scales[2] = 0.0;
        let result = LogisticModel::new(
            vec![0.0; FEATURE_COUNT],
            scales,
            vec![0.0; FEATURE_COUNT],
            0.0,
            None,
        );
        assert_matches!(result, Err(CoreError::ModelUnavailable(_)));
    }
}
