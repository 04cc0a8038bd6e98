use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::observation::Observation;

/// Predictors used by the quality model, in column order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Exercised that day (0/1).
    Exercised,
    /// Caffeine consumed that day (0/1).
    Caffeinated,
    /// Light sleep hours.
    LightHours,
    /// Deep sleep hours.
    DeepHours,
    /// REM sleep hours.
    RemHours,
}

impl Feature {
    /// Column order of the feature matrix. Also the tie-break order.
    pub const ALL: [Self; 5] = [
        Self::Exercised,
        Self::Caffeinated,
        Self::LightHours,
        Self::DeepHours,
        Self::RemHours,
    ];

    /// Stable identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Exercised => "exercised",
            Self::Caffeinated => "caffeinated",
            Self::LightHours => "light_hours",
            Self::DeepHours => "deep_hours",
            Self::RemHours => "rem_hours",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Exercised => "Exercise",
            Self::Caffeinated => "Caffeine",
            Self::LightHours => "Light Sleep",
            Self::DeepHours => "Deep Sleep",
            Self::RemHours => "REM Sleep",
        }
    }

    /// Raw (unscaled) value of this feature for one observation.
    #[must_use]
    pub fn value(self, observation: &Observation) -> f64 {
        let stages = observation.stages();
        match self {
            Self::Exercised => indicator(observation.exercised()),
            Self::Caffeinated => indicator(observation.caffeinated()),
            Self::LightHours => stages.light,
            Self::DeepHours => stages.deep,
            Self::RemHours => stages.rem,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps a flag to the 0/1 column value.
#[must_use]
pub fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// Unscaled design matrix and quality target.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    /// One row per observation, one column per [`Feature::ALL`] entry.
    pub features: Array2<f64>,
    /// Quality ratings.
    pub target: Array1<f64>,
}

impl FeatureMatrix {
    /// Builds the matrix from observations, preserving their order.
    #[must_use]
    pub fn from_observations(observations: &[Observation]) -> Self {
        let features = Array2::from_shape_fn(
            (observations.len(), Feature::ALL.len()),
            |(row, column)| Feature::ALL[column].value(&observations[row]),
        );
        let target = observations
            .iter()
            .map(|observation| f64::from(observation.quality().get()))
            .collect();
        Self { features, target }
    }

    /// Number of rows.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.features.nrows()
    }
}
