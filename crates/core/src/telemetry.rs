//! Synthetic telemetry generation.
//!
//! Each simulated machine carries a [`DegradationState`] that drifts slowly
//! between healthy, degrading and critical. The state selects which sensor
//! distribution is sampled; the machine's [`FailurePattern`] decides which
//! channels dominate once it is failing.
//!
//! The random source is injected so tests can use a seeded [`StdRng`] and get
//! reproducible transition sequences.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{MachineId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default per-advance chance that a state transition is attempted.
pub const DEFAULT_TRANSITION_CHANCE: f64 = 0.02;

/// Healthy -> Degrading, conditioned on a transition attempt.
pub const P_HEALTHY_TO_DEGRADING: f64 = 0.30;
/// Degrading -> Critical, conditioned on a transition attempt.
pub const P_DEGRADING_TO_CRITICAL: f64 = 0.10;
/// Critical -> Healthy (recovery), conditioned on a transition attempt.
pub const P_CRITICAL_TO_HEALTHY: f64 = 0.05;

/// Chance that a degrading machine draws from its normal range (plus drift)
/// instead of its failure range.
const DEGRADING_NORMAL_SHARE: f64 = 0.7;

/// Physically plausible clamp bounds, applied after every draw.
pub const TEMPERATURE_BOUNDS: (f64, f64) = (20.0, 120.0);
pub const VIBRATION_BOUNDS: (f64, f64) = (0.0, 2.0);
pub const ROTATION_SPEED_BOUNDS: (f64, f64) = (0.0, 2000.0);
pub const LOAD_BOUNDS: (f64, f64) = (0.0, 100.0);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The four raw sensor channels of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    /// Degrees Celsius.
    pub temperature: f64,
    pub vibration: f64,
    /// Revolutions per minute.
    pub rotation_speed: f64,
    /// Percent of rated load.
    pub load: f64,
}

impl SensorReadings {
    /// Clamp every channel into its physically plausible range.
    pub fn clamped(self) -> Self {
        Self {
            temperature: self.temperature.clamp(TEMPERATURE_BOUNDS.0, TEMPERATURE_BOUNDS.1),
            vibration: self.vibration.clamp(VIBRATION_BOUNDS.0, VIBRATION_BOUNDS.1),
            rotation_speed: self
                .rotation_speed
                .clamp(ROTATION_SPEED_BOUNDS.0, ROTATION_SPEED_BOUNDS.1),
            load: self.load.clamp(LOAD_BOUNDS.0, LOAD_BOUNDS.1),
        }
    }

    /// Reject non-finite channel values.
    pub fn validate(&self) -> Result<(), CoreError> {
        let channels = [
            ("temperature", self.temperature),
            ("vibration", self.vibration),
            ("rotation_speed", self.rotation_speed),
            ("load", self.load),
        ];
        for (name, value) in channels {
            if !value.is_finite() {
                return Err(CoreError::Validation(format!(
                    "{name} must be a finite number"
                )));
            }
        }
        Ok(())
    }
}

/// A point-in-time reading produced by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    #[serde(flatten)]
    pub readings: SensorReadings,
    pub timestamp: Timestamp,
}

/// Simulation state driving which distribution a machine is sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationState {
    Healthy,
    Degrading,
    Critical,
}

/// Which sensor channel(s) dominate a machine's simulated failure mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePattern {
    VibrationHigh,
    TemperatureHigh,
    RotationAnomaly,
    LoadHigh,
    TemperatureVibration,
}

impl FailurePattern {
    pub const ALL: [FailurePattern; 5] = [
        FailurePattern::VibrationHigh,
        FailurePattern::TemperatureHigh,
        FailurePattern::RotationAnomaly,
        FailurePattern::LoadHigh,
        FailurePattern::TemperatureVibration,
    ];
}

// ---------------------------------------------------------------------------
// Distributions
// ---------------------------------------------------------------------------

/// Zero-mean Gaussian jitter.
fn gaussian<R: Rng + ?Sized>(rng: &mut R, std_dev: f64) -> f64 {
    let z: f64 = StandardNormal.sample(rng);
    std_dev * z
}

/// Normal operating range plus small independent jitter. Not clamped.
pub fn draw_normal<R: Rng + ?Sized>(rng: &mut R) -> SensorReadings {
    SensorReadings {
        temperature: rng.random_range(65.0..85.0) + gaussian(rng, 2.0),
        vibration: rng.random_range(0.1..0.8) + gaussian(rng, 0.05),
        rotation_speed: rng.random_range(1450.0..1550.0) + gaussian(rng, 10.0),
        load: rng.random_range(70.0..90.0) + gaussian(rng, 3.0),
    }
}

/// Pattern-specific failure range. Not clamped.
pub fn draw_failure<R: Rng + ?Sized>(rng: &mut R, pattern: FailurePattern) -> SensorReadings {
    match pattern {
        FailurePattern::VibrationHigh => SensorReadings {
            temperature: rng.random_range(80.0..95.0),
            vibration: rng.random_range(1.0..1.5),
            rotation_speed: rng.random_range(1400.0..1600.0),
            load: rng.random_range(85.0..95.0),
        },
        FailurePattern::TemperatureHigh => SensorReadings {
            temperature: rng.random_range(90.0..105.0),
            vibration: rng.random_range(0.5..1.0),
            rotation_speed: rng.random_range(1500.0..1580.0),
            load: rng.random_range(80.0..95.0),
        },
        FailurePattern::RotationAnomaly => {
            let temperature = rng.random_range(75.0..90.0);
            let vibration = rng.random_range(0.6..1.1);
            let rotation_speed = if rng.random_bool(0.5) {
                rng.random_range(1300.0..1400.0)
            } else {
                rng.random_range(1600.0..1700.0)
            };
            SensorReadings {
                temperature,
                vibration,
                rotation_speed,
                load: rng.random_range(75.0..90.0),
            }
        }
        FailurePattern::LoadHigh => SensorReadings {
            temperature: rng.random_range(85.0..100.0),
            vibration: rng.random_range(0.7..1.2),
            rotation_speed: rng.random_range(1420.0..1580.0),
            load: rng.random_range(92.0..100.0),
        },
        FailurePattern::TemperatureVibration => SensorReadings {
            temperature: rng.random_range(88.0..102.0),
            vibration: rng.random_range(0.9..1.4),
            rotation_speed: rng.random_range(1460.0..1590.0),
            load: rng.random_range(85.0..98.0),
        },
    }
}

// ---------------------------------------------------------------------------
// TelemetryGenerator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct SimulatedMachine {
    pattern: FailurePattern,
    state: DegradationState,
}

/// Per-machine degradation simulator.
///
/// Owns every machine's [`DegradationState`]; nothing else mutates it.
pub struct TelemetryGenerator<R = StdRng> {
    rng: R,
    transition_chance: f64,
    machines: HashMap<MachineId, SimulatedMachine>,
}

impl TelemetryGenerator<StdRng> {
    /// Generator seeded from the operating system.
    pub fn from_entropy(transition_chance: f64) -> Self {
        Self::new(StdRng::from_os_rng(), transition_chance)
    }

    /// Generator with a fixed seed; identical seeds replay identical runs.
    pub fn seeded(seed: u64, transition_chance: f64) -> Self {
        Self::new(StdRng::seed_from_u64(seed), transition_chance)
    }
}

impl<R: Rng> TelemetryGenerator<R> {
    pub fn new(rng: R, transition_chance: f64) -> Self {
        Self {
            rng,
            transition_chance: transition_chance.clamp(0.0, 1.0),
            machines: HashMap::new(),
        }
    }

    /// Start simulating a machine. New machines begin healthy.
    pub fn register(&mut self, machine_id: impl Into<MachineId>, pattern: FailurePattern) {
        self.machines.insert(
            machine_id.into(),
            SimulatedMachine {
                pattern,
                state: DegradationState::Healthy,
            },
        );
    }

    pub fn state(&self, machine_id: &str) -> Option<DegradationState> {
        self.machines.get(machine_id).map(|m| m.state)
    }

    /// Override a machine's state (used by tests and demos).
    pub fn force_state(
        &mut self,
        machine_id: &str,
        state: DegradationState,
    ) -> Result<(), CoreError> {
        let machine = self
            .machines
            .get_mut(machine_id)
            .ok_or_else(|| CoreError::not_found("Machine", machine_id))?;
        machine.state = state;
        Ok(())
    }

    /// Run one step of the degradation state machine.
    pub fn advance(&mut self, machine_id: &str) -> Result<DegradationState, CoreError> {
        let machine = self
            .machines
            .get_mut(machine_id)
            .ok_or_else(|| CoreError::not_found("Machine", machine_id))?;

        if self.rng.random::<f64>() < self.transition_chance {
            let roll: f64 = self.rng.random();
            let next = match machine.state {
                DegradationState::Healthy if roll < P_HEALTHY_TO_DEGRADING => {
                    Some(DegradationState::Degrading)
                }
                DegradationState::Degrading if roll < P_DEGRADING_TO_CRITICAL => {
                    Some(DegradationState::Critical)
                }
                DegradationState::Critical if roll < P_CRITICAL_TO_HEALTHY => {
                    Some(DegradationState::Healthy)
                }
                _ => None,
            };
            if let Some(next) = next {
                tracing::info!(
                    machine_id,
                    from = ?machine.state,
                    to = ?next,
                    "Degradation state changed"
                );
                machine.state = next;
            }
        }

        Ok(machine.state)
    }

    /// Advance the machine's state, then draw a clamped sample for it.
    pub fn sample(
        &mut self,
        machine_id: &str,
        now: Timestamp,
    ) -> Result<TelemetrySample, CoreError> {
        let state = self.advance(machine_id)?;
        let pattern = self.machines[machine_id].pattern;
        let rng = &mut self.rng;

        let raw = match state {
            DegradationState::Healthy => draw_normal(rng),
            DegradationState::Critical => draw_failure(rng, pattern),
            DegradationState::Degrading => {
                if rng.random_bool(DEGRADING_NORMAL_SHARE) {
                    let mut readings = draw_normal(rng);
                    readings.temperature += rng.random_range(0.0..8.0);
                    readings.vibration += rng.random_range(0.0..0.2);
                    readings
                } else {
                    draw_failure(rng, pattern)
                }
            }
        };

        Ok(TelemetrySample {
            readings: raw.clamped(),
            timestamp: now,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
