//! Tabular import/export of the whole log.
//!
//! The column order is fixed on both paths so a saved table loads back into an
//! identical log. Flag columns accept `1`/`0` as well as textual booleans.

use std::{
    fs::{self, File},
    io::{Read, Write},
    path::Path,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    observation::{Observation, SleepStages},
    validator::fields::{parse_date, parse_hours, parse_quality, Field, ValidationError, DATE_FORMAT},
};

/// Header of every table, in order.
pub const COLUMNS: [&str; 8] = [
    "Date",
    "Hours",
    "Quality",
    "Exercise",
    "Caffeine",
    "Light_Sleep",
    "Deep_Sleep",
    "REM_Sleep",
];

/// Errors raised while reading or writing a table.
#[derive(Debug, Error)]
pub enum TableError {
    /// Malformed CSV.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Header differs from [`COLUMNS`].
    #[error("unexpected header {found:?}, expected {}", COLUMNS.join(","))]
    Header {
        /// Header as read.
        found: Vec<String>,
    },
    /// A data row failed validation.
    #[error("line {line}: {source}")]
    Row {
        /// 1-based line number, counting the header as line 1.
        line: usize,
        /// Validation failure.
        source: ValidationError,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct TableRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Hours")]
    hours: String,
    #[serde(rename = "Quality")]
    quality: String,
    #[serde(rename = "Exercise")]
    exercise: String,
    #[serde(rename = "Caffeine")]
    caffeine: String,
    #[serde(rename = "Light_Sleep")]
    light: String,
    #[serde(rename = "Deep_Sleep")]
    deep: String,
    #[serde(rename = "REM_Sleep")]
    rem: String,
}

impl TableRow {
    fn from_observation(observation: &Observation) -> Self {
        let stages = observation.stages();
        Self {
            date: observation.date().format(DATE_FORMAT).to_string(),
            hours: observation.total_hours().to_string(),
            quality: observation.quality().to_string(),
            exercise: render_flag(observation.exercised()).into(),
            caffeine: render_flag(observation.caffeinated()).into(),
            light: stages.light.to_string(),
            deep: stages.deep.to_string(),
            rem: stages.rem.to_string(),
        }
    }

    fn into_observation(self, stage_tolerance: f64) -> Result<Observation, ValidationError> {
        Observation::new(
            parse_date(&self.date)?,
            parse_hours(Field::TotalHours, &self.hours)?,
            parse_quality(&self.quality)?,
            coerce_flag(Field::Exercised, &self.exercise)?,
            coerce_flag(Field::Caffeinated, &self.caffeine)?,
            SleepStages::new(
                parse_hours(Field::LightHours, &self.light)?,
                parse_hours(Field::DeepHours, &self.deep)?,
                parse_hours(Field::RemHours, &self.rem)?,
            ),
            stage_tolerance,
        )
    }
}

/// Reads a boolean table cell. Accepts `1`/`0` (also `1.0`/`0.0`) and the
/// words `true`/`false`, `y`/`n`, `yes`/`no` in any case. Coercing the
/// rendered form of a result yields the same result.
pub fn coerce_flag(field: Field, raw: &str) -> Result<bool, ValidationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "y" | "yes" => Ok(true),
        "0" | "0.0" | "false" | "n" | "no" => Ok(false),
        _ => Err(ValidationError::Parse {
            field,
            raw: raw.to_owned(),
            reason: "expected 0/1 or a yes/no value".into(),
        }),
    }
}

/// Cell text written for a flag.
#[must_use]
pub const fn render_flag(flag: bool) -> &'static str {
    if flag {
        "1"
    } else {
        "0"
    }
}

/// Reads a whole table. Every row is validated with the same rules as
/// interactive capture; the first bad row aborts the read.
pub fn read_observations<R: Read>(
    reader: R,
    stage_tolerance: f64,
) -> Result<Vec<Observation>, TableError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?;
    if !headers.iter().eq(COLUMNS) {
        return Err(TableError::Header {
            found: headers.iter().map(str::to_owned).collect(),
        });
    }
    let mut observations = Vec::new();
    for (index, row) in csv_reader.deserialize::<TableRow>().enumerate() {
        let line = index + 2;
        let observation = row?
            .into_observation(stage_tolerance)
            .map_err(|source| TableError::Row { line, source })?;
        observations.push(observation);
    }
    Ok(observations)
}

/// Writes the header followed by one row per observation.
pub fn write_observations<W: Write>(
    writer: W,
    observations: &[Observation],
) -> Result<(), TableError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(COLUMNS)?;
    for observation in observations {
        csv_writer.serialize(TableRow::from_observation(observation))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Loads a table file.
pub fn load_table(path: impl AsRef<Path>, stage_tolerance: f64) -> anyhow::Result<Vec<Observation>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_observations(file, stage_tolerance).with_context(|| format!("reading {}", path.display()))
}

/// Saves a table file, creating parent directories as needed.
pub fn save_table(path: impl AsRef<Path>, observations: &[Observation]) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_observations(file, observations).with_context(|| format!("writing {}", path.display()))
}
