//! Shared helpers for pipeline integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aura_core::config::{MachineSpec, MonitorConfig};
use aura_core::error::CoreError;
use aura_core::health::{FailureModel, FeatureVector};
use aura_core::telemetry::FailurePattern;
use aura_events::EventBus;
use aura_pipeline::{MonitorScheduler, MonitorService};

/// Index of `speed_anomaly` in the feature vector.
const SPEED_ANOMALY: usize = 6;

/// Always returns the same probability.
pub struct FixedModel(pub f64);

impl FailureModel for FixedModel {
    fn predict_probability(&self, _: &FeatureVector) -> Result<f64, CoreError> {
        Ok(self.0)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Refuses every call.
pub struct UnavailableModel;

impl FailureModel for UnavailableModel {
    fn predict_probability(&self, _: &FeatureVector) -> Result<f64, CoreError> {
        Err(CoreError::ModelUnavailable("no weights loaded".to_string()))
    }
}

/// Fails for readings with a rotation-speed anomaly, otherwise fixed.
pub struct FailsOnSpeedAnomaly(pub f64);

impl FailureModel for FailsOnSpeedAnomaly {
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, CoreError> {
        if features.0[SPEED_ANOMALY] > 0.0 {
            Err(CoreError::Internal("inference crashed".to_string()))
        } else {
            Ok(self.0)
        }
    }
}

/// Sleeps before answering.
pub struct SlowModel(pub Duration);

impl FailureModel for SlowModel {
    fn predict_probability(&self, _: &FeatureVector) -> Result<f64, CoreError> {
        std::thread::sleep(self.0);
        Ok(0.1)
    }
}

/// Call counters shared between a [`HangsOnce`] model and the test.
#[derive(Default)]
pub struct CallStats {
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl CallStats {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most calls ever running at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Blocks for `hang` on its first call, answers later calls at once.
pub struct HangsOnce {
    hang: Duration,
    stats: Arc<CallStats>,
}

impl HangsOnce {
    pub fn new(hang: Duration) -> Self {
        Self {
            hang,
            stats: Arc::new(CallStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<CallStats> {
        Arc::clone(&self.stats)
    }
}

impl FailureModel for HangsOnce {
    fn predict_probability(&self, _: &FeatureVector) -> Result<f64, CoreError> {
        let first = self.stats.calls.fetch_add(1, Ordering::SeqCst) == 0;
        let active = self.stats.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak.fetch_max(active, Ordering::SeqCst);
        if first {
            std::thread::sleep(self.hang);
        }
        self.stats.active.fetch_sub(1, Ordering::SeqCst);
        Ok(0.1)
    }
}

/// Deterministic configuration: fixed seed, no spontaneous state changes.
pub fn test_config() -> MonitorConfig {
    MonitorConfig {
        tick_interval: Duration::from_millis(20),
        recovery_interval: Duration::from_millis(20),
        degradation_chance: 0.0,
        simulation_seed: Some(42),
        ..MonitorConfig::default()
    }
}

/// Single-machine configuration.
pub fn single_machine_config(machine_id: &str, pattern: FailurePattern) -> MonitorConfig {
    MonitorConfig {
        machines: vec![MachineSpec {
            machine_id: machine_id.to_string(),
            name: format!("Test {machine_id}"),
            machine_type: "Press".to_string(),
            location: "Lab".to_string(),
            install_date: None,
            failure_pattern: pattern,
        }],
        ..test_config()
    }
}

pub fn build(
    config: &MonitorConfig,
    model: impl FailureModel + 'static,
) -> (Arc<MonitorService>, MonitorScheduler) {
    let service = Arc::new(
        MonitorService::new(config, Arc::new(model), Arc::new(EventBus::default()))
            .expect("valid config"),
    );
    let scheduler = MonitorScheduler::from_config(Arc::clone(&service), config);
    (service, scheduler)
}
