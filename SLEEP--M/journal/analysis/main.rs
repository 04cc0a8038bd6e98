//! Quality regression: which recorded factors move sleep quality the most.

/// Feature selection and design-matrix construction.
pub mod matrix;
/// Least-squares solver.
pub mod ols;
/// Result type and rendering.
pub mod report;
/// Per-call column standardization.
pub mod scaler;

use serde_json::json;
use shared_logging::LogLevel;
use thiserror::Error;

use crate::{
    observation::Observation,
    telemetry::{emit, JournalTelemetry},
};
use matrix::FeatureMatrix;
use report::RegressionResult;

/// Smallest number of observations a fit is attempted on.
pub const MIN_OBSERVATIONS: usize = 3;

/// Reasons an analysis call produces no result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// Too few observations; add more and call again.
    #[error("need at least {required} observations for analysis, have {observed}")]
    InsufficientData {
        /// Observations available.
        observed: usize,
        /// Observations required.
        required: usize,
    },
    /// The solver could not produce finite coefficients.
    #[error("numerical failure: {0}")]
    Numerical(String),
}

/// Fits a linear model of quality on standardized features.
///
/// Every call recomputes the scaling statistics from the snapshot it is given,
/// so results always reflect the data present at call time.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegressionEngine;

impl RegressionEngine {
    /// Creates the engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Analyzes a log snapshot.
    pub fn analyze(&self, snapshot: &[Observation]) -> Result<RegressionResult, AnalysisError> {
        self.analyze_with_telemetry(snapshot, None)
    }

    /// Analyzes a log snapshot with optional telemetry instrumentation.
    pub fn analyze_with_telemetry(
        &self,
        snapshot: &[Observation],
        telemetry: Option<&JournalTelemetry>,
    ) -> Result<RegressionResult, AnalysisError> {
        if snapshot.len() < MIN_OBSERVATIONS {
            emit(
                telemetry,
                LogLevel::Info,
                "journal.analyze.insufficient_data",
                json!({ "observed": snapshot.len(), "required": MIN_OBSERVATIONS }),
            );
            return Err(AnalysisError::InsufficientData {
                observed: snapshot.len(),
                required: MIN_OBSERVATIONS,
            });
        }

        let matrix = FeatureMatrix::from_observations(snapshot);
        let (standardized, stats) = scaler::standardize(&matrix.features);
        emit(
            telemetry,
            LogLevel::Debug,
            "journal.analyze.standardized",
            json!({
                "samples": matrix.samples(),
                "means": stats.means.to_vec(),
                "scales": stats.scales.to_vec(),
                "constant_columns": stats.constant,
            }),
        );

        let fit = ols::fit_least_squares(&standardized, &matrix.target).map_err(|err| {
            emit(
                telemetry,
                LogLevel::Error,
                "journal.analyze.failed",
                json!({ "error": err.to_string() }),
            );
            err
        })?;
        let mut values = [0.0; 5];
        for (slot, value) in values.iter_mut().zip(fit.coefficients.iter()) {
            *slot = *value;
        }
        let result = RegressionResult::from_coefficients(values, matrix.samples());
        emit(
            telemetry,
            LogLevel::Info,
            "journal.analyze.complete",
            json!({
                "samples": result.samples(),
                "coefficients": result.coefficients(),
                "intercept": fit.intercept,
                "dominant": result.dominant().feature,
            }),
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{Quality, SleepStages};
    use chrono::NaiveDate;
    use super::matrix::Feature;

    fn obs(
        day: u32,
        quality: i64,
        exercised: bool,
        caffeinated: bool,
        light: f64,
        deep: f64,
        rem: f64,
    ) -> Observation {
        Observation::new(
            NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            light + deep + rem,
            Quality::try_from(quality).unwrap(),
            exercised,
            caffeinated,
            SleepStages::new(light, deep, rem),
            0.0,
        )
        .unwrap()
    }

    fn worked_example() -> Vec<Observation> {
        vec![
            obs(1, 2, false, true, 1.0, 2.0, 1.0),
            obs(2, 4, true, false, 2.0, 3.0, 1.0),
            obs(3, 5, true, true, 2.0, 4.0, 2.0),
        ]
    }

    #[test]
    fn fewer_than_three_is_insufficient() {
        let engine = RegressionEngine::new();
        let all = worked_example();
        for count in 0..MIN_OBSERVATIONS {
            assert_eq!(
                engine.analyze(&all[..count]),
                Err(AnalysisError::InsufficientData {
                    observed: count,
                    required: MIN_OBSERVATIONS
                })
            );
        }
    }

    #[test]
    fn worked_example_yields_five_coefficients() {
        let result = RegressionEngine::new().analyze(&worked_example()).unwrap();
        let names: Vec<_> = result.coefficients().keys().map(|f| f.name()).collect();
        assert_eq!(
            names,
            ["exercised", "caffeinated", "light_hours", "deep_hours", "rem_hours"]
        );
        assert!(result.coefficients().values().all(|c| c.is_finite()));
        let max = result
            .coefficients()
            .values()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(result.dominant().coefficient, max);
        assert_eq!(result.samples(), 3);
    }

    #[test]
    fn repeated_analysis_is_bit_identical() {
        let snapshot = worked_example();
        let engine = RegressionEngine::new();
        let first = engine.analyze(&snapshot).unwrap();
        let second = engine.analyze(&snapshot).unwrap();
        for feature in Feature::ALL {
            assert_eq!(
                first.coefficient(feature).to_bits(),
                second.coefficient(feature).to_bits()
            );
        }
        assert_eq!(first.dominant().feature, second.dominant().feature);
    }

    #[test]
    fn deep_sleep_dominates_when_it_drives_quality() {
        let snapshot = vec![
            obs(1, 1, true, false, 2.0, 1.0, 1.0),
            obs(2, 2, false, false, 3.0, 2.0, 1.0),
            obs(3, 3, true, true, 2.0, 3.0, 2.0),
            obs(4, 4, false, true, 4.0, 4.0, 2.0),
            obs(5, 5, false, false, 3.0, 5.0, 1.0),
            obs(6, 1, true, true, 3.0, 1.0, 2.0),
            obs(7, 2, true, false, 2.0, 2.0, 2.0),
            obs(8, 3, false, true, 4.0, 3.0, 1.0),
        ];
        let result = RegressionEngine::new().analyze(&snapshot).unwrap();
        assert_eq!(result.dominant().feature, Feature::DeepHours);
        for feature in Feature::ALL {
            if feature != Feature::DeepHours {
                assert!(result.coefficient(feature).abs() < 1e-9, "{feature}");
            }
        }
    }

    #[test]
    fn constant_quality_falls_back_to_first_feature() {
        let snapshot = vec![
            obs(1, 3, true, false, 2.0, 1.0, 1.0),
            obs(2, 3, false, true, 3.0, 2.0, 1.0),
            obs(3, 3, true, true, 2.0, 3.0, 2.0),
            obs(4, 3, false, false, 4.0, 2.0, 2.0),
        ];
        let result = RegressionEngine::new().analyze(&snapshot).unwrap();
        assert!(result.coefficients().values().all(|c| *c == 0.0));
        assert_eq!(result.dominant().feature, Feature::Exercised);
    }

    #[test]
    fn constant_feature_gets_zero_influence() {
        let snapshot = vec![
            obs(1, 2, false, true, 1.0, 2.0, 1.0),
            obs(2, 4, false, false, 2.0, 3.0, 1.0),
            obs(3, 5, false, true, 2.0, 4.0, 2.0),
            obs(4, 3, false, false, 3.0, 2.0, 2.0),
        ];
        let result = RegressionEngine::new().analyze(&snapshot).unwrap();
        assert!(result.coefficient(Feature::Exercised).abs() < 1e-12);
    }
}
