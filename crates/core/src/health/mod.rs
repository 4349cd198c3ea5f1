//! Health scoring: feature extraction, the failure-model seam, the scoring
//! rules and the bootstrap trainer for the shipped model.

pub mod features;
pub mod model;
pub mod scorer;
pub mod training;

pub use features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use model::{FailureModel, LogisticModel};
pub use scorer::{HealthScorer, ScoreResult};
