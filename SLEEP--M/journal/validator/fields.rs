use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observation::{Quality, SleepStages};

/// `chrono` format of the `DD-MM-YYYY` dates used for input, listing, and tables.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Fields requested from the answer source, in prompt order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Night date (`DD-MM-YYYY`).
    Date,
    /// Total hours slept.
    TotalHours,
    /// Quality rating 1 to 5.
    Quality,
    /// Exercise flag.
    Exercised,
    /// Caffeine flag.
    Caffeinated,
    /// Light sleep hours.
    LightHours,
    /// Deep sleep hours.
    DeepHours,
    /// REM sleep hours.
    RemHours,
}

impl Field {
    /// All fields in prompt order.
    pub const ALL: [Self; 8] = [
        Self::Date,
        Self::TotalHours,
        Self::Quality,
        Self::Exercised,
        Self::Caffeinated,
        Self::LightHours,
        Self::DeepHours,
        Self::RemHours,
    ];

    /// Identifier used in logs and error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::TotalHours => "total_hours",
            Self::Quality => "quality",
            Self::Exercised => "exercised",
            Self::Caffeinated => "caffeinated",
            Self::LightHours => "light_hours",
            Self::DeepHours => "deep_hours",
            Self::RemHours => "rem_hours",
        }
    }

    /// Console prompt for the field.
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::Date => "Enter the date (DD-MM-YYYY): ",
            Self::TotalHours => "Enter total hours slept: ",
            Self::Quality => "Rate Sleep Quality (1-5): ",
            Self::Exercised => "Exercised Today? (Y/N): ",
            Self::Caffeinated => "Caffeine Consumed Today? (Y/N): ",
            Self::LightHours => "Light sleep hours: ",
            Self::DeepHours => "Deep sleep hours: ",
            Self::RemHours => "REM sleep hours: ",
        }
    }

    /// Whether the field belongs to the light/deep/REM group.
    #[must_use]
    pub const fn is_stage(self) -> bool {
        matches!(self, Self::LightHours | Self::DeepHours | Self::RemHours)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reasons a raw answer or a combination of answers is rejected.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// The text could not be read as the field's type.
    #[error("could not read {field} from {raw:?}: {reason}")]
    Parse {
        /// Offending field.
        field: Field,
        /// Raw answer as received.
        raw: String,
        /// Parser message.
        reason: String,
    },
    /// The value parsed but violates a bound.
    #[error("{field} out of range: {detail}")]
    Range {
        /// Offending field.
        field: Field,
        /// Description of the violated bound.
        detail: String,
    },
    /// Stage hours do not add up to the total.
    #[error("stage hours sum to {stage_sum} but total hours is {total_hours}")]
    Consistency {
        /// Light + deep + REM.
        stage_sum: f64,
        /// Total hours answered earlier.
        total_hours: f64,
    },
}

impl ValidationError {
    /// Field to request again, or `None` when the whole stage group must be repeated.
    #[must_use]
    pub const fn field(&self) -> Option<Field> {
        match self {
            Self::Parse { field, .. } | Self::Range { field, .. } => Some(*field),
            Self::Consistency { .. } => None,
        }
    }

    /// Short kind label used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::Range { .. } => "range",
            Self::Consistency { .. } => "consistency",
        }
    }
}

/// Parses a `DD-MM-YYYY` date. The year must be exactly four digits; day and
/// month may drop their leading zero.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let text = raw.trim();
    let parse_error = |reason: String| ValidationError::Parse {
        field: Field::Date,
        raw: raw.to_owned(),
        reason,
    };
    let year = text.rsplit('-').next().unwrap_or_default();
    if !text.contains('-') || year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(parse_error("year must have four digits".to_owned()));
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|err| parse_error(err.to_string()))
}

/// Parses a non-negative, finite number of hours for `field`.
pub fn parse_hours(field: Field, raw: &str) -> Result<f64, ValidationError> {
    let value: f64 = raw.trim().parse().map_err(|err: std::num::ParseFloatError| {
        ValidationError::Parse {
            field,
            raw: raw.to_owned(),
            reason: err.to_string(),
        }
    })?;
    if !value.is_finite() {
        return Err(ValidationError::Parse {
            field,
            raw: raw.to_owned(),
            reason: "not a finite number".into(),
        });
    }
    if value < 0.0 {
        return Err(ValidationError::Range {
            field,
            detail: format!("{value} is negative"),
        });
    }
    Ok(value)
}

/// Parses an integer quality rating in `1..=5`.
pub fn parse_quality(raw: &str) -> Result<Quality, ValidationError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|err: std::num::ParseIntError| ValidationError::Parse {
            field: Field::Quality,
            raw: raw.to_owned(),
            reason: err.to_string(),
        })?;
    Quality::try_from(value)
}

/// Reads a yes/no answer. Only `y` (trimmed, any case) is true; every other
/// answer, including `yes` and empty input, is false. Never fails, so boolean
/// fields are never asked twice.
#[must_use]
pub fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("y")
}

/// Checks that the stage hours add up to `total_hours` within `tolerance`.
/// A tolerance of `0.0` demands exact floating-point equality.
pub fn check_stage_sum(
    stages: &SleepStages,
    total_hours: f64,
    tolerance: f64,
) -> Result<(), ValidationError> {
    let stage_sum = stages.total();
    if (stage_sum - total_hours).abs() <= tolerance {
        Ok(())
    } else {
        Err(ValidationError::Consistency {
            stage_sum,
            total_hours,
        })
    }
}
