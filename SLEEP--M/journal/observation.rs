use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::validator::fields::{check_stage_sum, Field, ValidationError, DATE_FORMAT};

/// Subjective sleep quality on a 1 to 5 scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    /// Lowest accepted rating.
    pub const MIN: u8 = 1;
    /// Highest accepted rating.
    pub const MAX: u8 = 5;

    /// Returns the rating as an integer.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Quality {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(rating) if (Self::MIN..=Self::MAX).contains(&rating) => Ok(Self(rating)),
            _ => Err(ValidationError::Range {
                field: Field::Quality,
                detail: format!("{value} is outside {}..={}", Self::MIN, Self::MAX),
            }),
        }
    }
}

impl From<Quality> for u8 {
    fn from(value: Quality) -> Self {
        value.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hours spent in each sleep stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct SleepStages {
    /// Light sleep hours.
    pub light: f64,
    /// Deep sleep hours.
    pub deep: f64,
    /// REM sleep hours.
    pub rem: f64,
}

impl SleepStages {
    /// Creates a stage breakdown.
    #[must_use]
    pub const fn new(light: f64, deep: f64, rem: f64) -> Self {
        Self { light, deep, rem }
    }

    /// Sum of all stage hours, added in light, deep, rem order.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.light + self.deep + self.rem
    }
}

/// One validated daily sleep record. Fields are fixed after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    date: NaiveDate,
    total_hours: f64,
    quality: Quality,
    exercised: bool,
    caffeinated: bool,
    stages: SleepStages,
}

impl Observation {
    /// Builds an observation, rejecting negative hours and stage sums that
    /// differ from `total_hours` by more than `stage_tolerance`.
    pub fn new(
        date: NaiveDate,
        total_hours: f64,
        quality: Quality,
        exercised: bool,
        caffeinated: bool,
        stages: SleepStages,
        stage_tolerance: f64,
    ) -> Result<Self, ValidationError> {
        for (field, value) in [
            (Field::TotalHours, total_hours),
            (Field::LightHours, stages.light),
            (Field::DeepHours, stages.deep),
            (Field::RemHours, stages.rem),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ValidationError::Range {
                    field,
                    detail: format!("{value} is not a non-negative number of hours"),
                });
            }
        }
        check_stage_sum(&stages, total_hours, stage_tolerance)?;
        Ok(Self {
            date,
            total_hours,
            quality,
            exercised,
            caffeinated,
            stages,
        })
    }

    /// Calendar date of the night.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Total hours slept.
    #[must_use]
    pub const fn total_hours(&self) -> f64 {
        self.total_hours
    }

    /// Subjective quality rating.
    #[must_use]
    pub const fn quality(&self) -> Quality {
        self.quality
    }

    /// Whether the person exercised that day.
    #[must_use]
    pub const fn exercised(&self) -> bool {
        self.exercised
    }

    /// Whether caffeine was consumed that day.
    #[must_use]
    pub const fn caffeinated(&self) -> bool {
        self.caffeinated
    }

    /// Stage breakdown.
    #[must_use]
    pub const fn stages(&self) -> SleepStages {
        self.stages
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Date: {}, Hours: {:?}, Quality: {}",
            self.date.format(DATE_FORMAT),
            self.total_hours,
            self.quality
        )?;
        writeln!(
            f,
            "Exercise: {}, Caffeine: {}",
            capitalized(self.exercised),
            capitalized(self.caffeinated)
        )?;
        write!(
            f,
            "Sleep Stages - Light: {:?}, Deep: {:?}, REM: {:?}",
            self.stages.light, self.stages.deep, self.stages.rem
        )
    }
}

/// Flags read `True`/`False` in listings.
const fn capitalized(flag: bool) -> &'static str {
    if flag {
        "True"
    } else {
        "False"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn quality_bounds() {
        assert!(Quality::try_from(0).is_err());
        assert!(Quality::try_from(6).is_err());
        assert_eq!(Quality::try_from(5).unwrap().get(), 5);
    }

    #[test]
    fn construction_checks_stage_sum() {
        let quality = Quality::try_from(4).unwrap();
        let short = Observation::new(
            date(),
            8.0,
            quality,
            true,
            false,
            SleepStages::new(3.0, 3.0, 1.0),
            0.0,
        );
        assert!(matches!(short, Err(ValidationError::Consistency { .. })));

        let ok = Observation::new(
            date(),
            8.0,
            quality,
            true,
            false,
            SleepStages::new(3.0, 3.0, 2.0),
            0.0,
        )
        .unwrap();
        assert_eq!(ok.stages().total(), ok.total_hours());
    }

    #[test]
    fn construction_rejects_negative_stage() {
        let err = Observation::new(
            date(),
            1.0,
            Quality::try_from(3).unwrap(),
            false,
            false,
            SleepStages::new(2.0, -1.0, 0.0),
            0.0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Range {
                field: Field::DeepHours,
                ..
            }
        ));
    }

    #[test]
    fn display_matches_listing_layout() {
        let observation = Observation::new(
            date(),
            8.0,
            Quality::try_from(4).unwrap(),
            true,
            false,
            SleepStages::new(3.0, 3.0, 2.0),
            0.0,
        )
        .unwrap();
        let rendered = observation.to_string();
        assert!(rendered.starts_with("Date: 01-03-2024, Hours: 8.0, Quality: 4\n"));
        assert!(rendered.contains("\nExercise: True, Caffeine: False\n"));
        assert!(rendered.ends_with("Sleep Stages - Light: 3.0, Deep: 3.0, REM: 2.0"));
    }
}
