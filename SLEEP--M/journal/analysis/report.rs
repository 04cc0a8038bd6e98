use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::matrix::Feature;

/// Coefficient attached to one feature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeatureInfluence {
    /// Feature.
    pub feature: Feature,
    /// Standardized regression coefficient.
    pub coefficient: f64,
}

/// Outcome of one regression run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionResult {
    coefficients: IndexMap<Feature, f64>,
    dominant: FeatureInfluence,
    samples: usize,
}

impl RegressionResult {
    /// Builds the result from coefficients in [`Feature::ALL`] order. The
    /// dominant feature is the largest coefficient; on ties the earlier column wins.
    #[must_use]
    pub fn from_coefficients(values: [f64; 5], samples: usize) -> Self {
        let mut dominant = FeatureInfluence {
            feature: Feature::ALL[0],
            coefficient: values[0],
        };
        for (feature, coefficient) in Feature::ALL.into_iter().zip(values).skip(1) {
            if coefficient > dominant.coefficient {
                dominant = FeatureInfluence {
                    feature,
                    coefficient,
                };
            }
        }
        Self {
            coefficients: Feature::ALL.into_iter().zip(values).collect(),
            dominant,
            samples,
        }
    }

    /// Coefficients keyed by feature, in column order.
    #[must_use]
    pub const fn coefficients(&self) -> &IndexMap<Feature, f64> {
        &self.coefficients
    }

    /// Coefficient of one feature.
    #[must_use]
    pub fn coefficient(&self, feature: Feature) -> f64 {
        self.coefficients.get(&feature).copied().unwrap_or_default()
    }

    /// Feature with the most positive influence on quality.
    #[must_use]
    pub const fn dominant(&self) -> FeatureInfluence {
        self.dominant
    }

    /// Number of observations the model was fitted on.
    #[must_use]
    pub const fn samples(&self) -> usize {
        self.samples
    }

    /// Renders a concise summary string.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Most positive influence on sleep quality: {} ({:+.4}) over {} nights",
            self.dominant.feature.label(),
            self.dominant.coefficient,
            self.samples
        )
    }

    /// Renders the coefficient table, one feature per line.
    #[must_use]
    pub fn table(&self) -> String {
        let mut out = String::from("Feature        Coefficient\n");
        for (feature, coefficient) in &self.coefficients {
            let _ = writeln!(out, "{:<14} {coefficient:>+11.4}", feature.label());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_is_largest_coefficient() {
        let result = RegressionResult::from_coefficients([0.1, -0.4, 0.2, 0.9, 0.3], 10);
        assert_eq!(result.dominant().feature, Feature::DeepHours);
        assert_eq!(result.dominant().coefficient, 0.9);
        let order: Vec<_> = result.coefficients().keys().copied().collect();
        assert_eq!(order, Feature::ALL.to_vec());
    }

    #[test]
    fn ties_go_to_earlier_column() {
        let result = RegressionResult::from_coefficients([0.0, 0.5, 0.5, 0.5, 0.1], 4);
        assert_eq!(result.dominant().feature, Feature::Caffeinated);

        let flat = RegressionResult::from_coefficients([0.0; 5], 3);
        assert_eq!(flat.dominant().feature, Feature::Exercised);
    }

    #[test]
    fn table_lists_every_feature() {
        let result = RegressionResult::from_coefficients([0.1, -0.2, 0.3, 0.4, -0.5], 6);
        let table = result.table();
        assert_eq!(table.lines().count(), 6);
        assert!(table.contains("REM Sleep"));
        assert!(table.contains("-0.5000"));
        assert!(result.summary().contains("Deep Sleep"));
    }
}
