//! Bootstrap trainer for [`LogisticModel`].
//!
//! Generates labelled history from the same distributions the telemetry
//! generator uses, holds out a stratified test split, and fits an L2
//! regularised logistic regression with `smartcore` on standardized
//! features. The minority class is oversampled to balance the classes.

use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use smartcore::linalg::basic::arrays::{Array, ArrayView2};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{
    LogisticRegression, LogisticRegressionParameters,
};

use crate::config::MachineSpec;
use crate::error::CoreError;
use crate::health::features::{FeatureVector, FEATURE_COUNT};
use crate::health::model::{FailureModel, LogisticModel};
use crate::telemetry::{draw_failure, draw_normal, SensorReadings};
use crate::types::MachineId;

/// Failure share outside the final week of simulated history.
const BASE_FAILURE_RATE: f64 = 0.05;
/// Failure share inside the final week.
const RECENT_FAILURE_RATE: f64 = 0.15;
const RECENT_DAYS: u32 = 7;

pub const DEFAULT_HISTORY_DAYS: u32 = 90;
pub const DEFAULT_SAMPLES_PER_DAY: u32 = 24;

/// One simulated reading with its ground-truth label.
#[derive(Debug, Clone)]
pub struct LabeledSample {
    pub machine_id: MachineId,
    pub readings: SensorReadings,
    pub failure: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct TrainingOptions {
    /// L2 penalty passed to the solver.
    pub alpha: f64,
    /// Share of each class held out for evaluation.
    pub test_fraction: f64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            test_fraction: 0.2,
        }
    }
}

/// Fit quality at a 0.5 decision threshold.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub failures: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

/// Simulate `days * samples_per_day` readings for every machine.
pub fn simulate_history<R: Rng + ?Sized>(
    fleet: &[MachineSpec],
    days: u32,
    samples_per_day: u32,
    rng: &mut R,
) -> Vec<LabeledSample> {
    let mut samples =
        Vec::with_capacity(fleet.len() * days as usize * samples_per_day as usize);

    for day in 0..days {
        let failure_rate = if day + RECENT_DAYS < days {
            BASE_FAILURE_RATE
        } else {
            RECENT_FAILURE_RATE
        };
        for _ in 0..samples_per_day {
            for spec in fleet {
                let failure = rng.random_bool(failure_rate);
                let readings = if failure {
                    draw_failure(rng, spec.failure_pattern)
                } else {
                    draw_normal(rng)
                };
                samples.push(LabeledSample {
                    machine_id: spec.machine_id.clone(),
                    readings,
                    failure,
                });
            }
        }
    }

    samples
}

fn check_both_classes(samples: &[LabeledSample]) -> Result<(usize, usize), CoreError> {
    let positives = samples.iter().filter(|s| s.failure).count();
    let negatives = samples.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(CoreError::Validation(format!(
            "Training data needs both classes (failures: {positives}, normal: {negatives})"
        )));
    }
    Ok((positives, negatives))
}

/// Split into `(train, test)`, holding out `test_fraction` of each class.
///
/// Each class keeps at least one sample on both sides when it has two or
/// more.
pub fn stratified_split<R: Rng + ?Sized>(
    samples: &[LabeledSample],
    test_fraction: f64,
    rng: &mut R,
) -> Result<(Vec<LabeledSample>, Vec<LabeledSample>), CoreError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(CoreError::Validation(format!(
            "test_fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let mut train = Vec::with_capacity(samples.len());
    let mut test = Vec::new();
    for class in [true, false] {
        let mut members: Vec<&LabeledSample> =
            samples.iter().filter(|s| s.failure == class).collect();
        members.shuffle(rng);

        let held_out = ((members.len() as f64 * test_fraction).round() as usize)
            .clamp(usize::from(members.len() > 1), members.len().saturating_sub(1));
        test.extend(members[..held_out].iter().map(|s| (*s).clone()));
        train.extend(members[held_out..].iter().map(|s| (*s).clone()));
    }
    Ok((train, test))
}

fn solver_error(e: impl std::fmt::Display) -> CoreError {
    CoreError::Internal(format!("Model training failed: {e}"))
}

/// Fit a [`LogisticModel`] to labelled samples.
pub fn fit(
    samples: &[LabeledSample],
    options: &TrainingOptions,
) -> Result<LogisticModel, CoreError> {
    let (positives, negatives) = check_both_classes(samples)?;

    // Repeat minority rows so both classes carry roughly equal weight.
    let minority_is_failure = positives < negatives;
    let repeats = (positives.max(negatives) / positives.min(negatives)).max(1);

    let mut rows = Vec::with_capacity(samples.len() + positives.min(negatives) * repeats);
    let mut labels = Vec::with_capacity(rows.capacity());
    for sample in samples {
        let copies = if sample.failure == minority_is_failure { repeats } else { 1 };
        let features = FeatureVector::from_readings(&sample.readings).0.to_vec();
        for _ in 0..copies {
            rows.push(features.clone());
            labels.push(i32::from(sample.failure));
        }
    }

    let raw = DenseMatrix::from_2d_vec(&rows).map_err(solver_error)?;
    let means = raw.mean_by(0);
    let scales: Vec<f64> = raw
        .std_dev(0)
        .into_iter()
        .map(|s| if s > f64::EPSILON { s } else { 1.0 })
        .collect();

    let standardized: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&means)
                .zip(&scales)
                .map(|((x, m), s)| (x - m) / s)
                .collect()
        })
        .collect();
    let x = DenseMatrix::from_2d_vec(&standardized).map_err(solver_error)?;

    let params = LogisticRegressionParameters::default().with_alpha(options.alpha);
    let fitted: LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>> =
        LogisticRegression::fit(&x, &labels, params).map_err(solver_error)?;

    let coefficients = fitted.coefficients();
    let weights: Vec<f64> = (0..FEATURE_COUNT)
        .map(|j| *coefficients.get((0, j)))
        .collect();
    let bias = *fitted.intercept().get((0, 0));

    LogisticModel::new(means, scales, weights, bias, Some(Utc::now()))
}

/// Stratified hold-out, fit on the training part, report on the test part.
pub fn train_and_evaluate<R: Rng + ?Sized>(
    samples: &[LabeledSample],
    options: &TrainingOptions,
    rng: &mut R,
) -> Result<(LogisticModel, TrainingReport), CoreError> {
    check_both_classes(samples)?;
    let (train, test) = stratified_split(samples, options.test_fraction, rng)?;
    let model = fit(&train, options)?;
    let report = evaluate(&model, &test)?;
    Ok((model, report))
}

/// Confusion-matrix summary of `model` over `samples`.
pub fn evaluate(
    model: &dyn FailureModel,
    samples: &[LabeledSample],
) -> Result<TrainingReport, CoreError> {
    let (mut tp, mut fp, mut tn, mut fn_) = (0usize, 0usize, 0usize, 0usize);
    for sample in samples {
        let p = model.predict_probability(&FeatureVector::from_readings(&sample.readings))?;
        match (p >= 0.5, sample.failure) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, false) => tn += 1,
            (false, true) => fn_ += 1,
        }
    }
    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    Ok(TrainingReport {
        samples: samples.len(),
        failures: tp + fn_,
        accuracy: ratio(tp + tn, samples.len()),
        precision: ratio(tp, tp + fp),
        recall: ratio(tp, tp + fn_),
    })
}

/// Simulate the default history for `fleet` and fit a model to it.
///
/// The report covers the held-out split only.
pub fn bootstrap<R: Rng + ?Sized>(
    fleet: &[MachineSpec],
    rng: &mut R,
) -> Result<(LogisticModel, TrainingReport), CoreError> {
    let started = Utc::now();
    let history = simulate_history(fleet, DEFAULT_HISTORY_DAYS, DEFAULT_SAMPLES_PER_DAY, rng);
    let (model, report) = train_and_evaluate(&history, &TrainingOptions::default(), rng)?;
    let elapsed: Duration = Utc::now() - started;
    tracing::info!(
        test_samples = report.samples,
        test_failures = report.failures,
        accuracy = report.accuracy,
        precision = report.precision,
        recall = report.recall,
        elapsed_ms = elapsed.num_milliseconds(),
        "Bootstrap model trained"
    );
    Ok((model, report))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::config::default_fleet;
    use crate::telemetry::FailurePattern;

    #[test]
    fn history_has_expected_shape_and_both_labels() {
        let fleet = default_fleet();
        let mut rng = StdRng::seed_from_u64(1);
        let history = simulate_history(&fleet, 30, 24, &mut rng);
        assert_eq!(history.len(), 5 * 30 * 24);

        let failures = history.iter().filter(|s| s.failure).count();
        assert!(failures > 0 && failures < history.len() / 4, "failures {failures}");
    }

    #[test]
    fn single_class_data_is_rejected() {
        let sample = LabeledSample {
            machine_id: "m".to_string(),
            readings: SensorReadings {
                temperature: 75.0,
                vibration: 0.4,
                rotation_speed: 1500.0,
                load: 80.0,
            },
            failure: false,
        };
        let result = fit(&[sample.clone(), sample], &TrainingOptions::default());
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn split_holds_out_a_fifth_of_each_class() {
        let fleet = default_fleet();
        let mut rng = StdRng::seed_from_u64(3);
        let history = simulate_history(&fleet, 30, 24, &mut rng);
        let failures = history.iter().filter(|s| s.failure).count();
        let normal = history.len() - failures;

        let (train, test) = stratified_split(&history, 0.2, &mut rng).unwrap();
        assert_eq!(train.len() + test.len(), history.len());

        let test_failures = test.iter().filter(|s| s.failure).count();
        assert_eq!(test_failures, (failures as f64 * 0.2).round() as usize);
        assert_eq!(test.len() - test_failures, (normal as f64 * 0.2).round() as usize);
    }

    #[test]
    fn split_rejects_degenerate_fractions() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_matches!(stratified_split(&[], 0.0, &mut rng), Err(CoreError::Validation(_)));
        assert_matches!(stratified_split(&[], 1.0, &mut rng), Err(CoreError::Validation(_)));
    }

    #[test]
    fn fitted_model_separates_normal_from_failure_readings() {
        let fleet = default_fleet();
        let mut rng = StdRng::seed_from_u64(7);
        let history = simulate_history(&fleet, 60, 24, &mut rng);
        let (model, report) =
            train_and_evaluate(&history, &TrainingOptions::default(), &mut rng).unwrap();

        // Scored on the held-out fifth only.
        assert!(report.samples < history.len() / 4, "{report:?}");
        assert!(report.accuracy > 0.9, "{report:?}");
        assert!(report.recall > 0.85, "{report:?}");

        let mut rng = StdRng::seed_from_u64(99);
        let normal = (0..200)
            .map(|_| FeatureVector::from_readings(&draw_normal(&mut rng)))
            .map(|f| model.predict_probability(&f).unwrap())
            .sum::<f64>()
            / 200.0;
        let failing = (0..200)
            .map(|_| {
                FeatureVector::from_readings(&draw_failure(&mut rng, FailurePattern::TemperatureHigh))
            })
            .map(|f| model.predict_probability(&f).unwrap())
            .sum::<f64>()
            / 200.0;
        assert!(normal < 0.35, "mean normal p {normal}");
        assert!(failing > 0.65, "mean failing p {failing}");
    }
}
