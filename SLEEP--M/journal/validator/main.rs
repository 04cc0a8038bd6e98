//! Field-by-field capture of one observation.
//!
//! Numeric and date fields are requested again until they parse and satisfy
//! their bounds, with no attempt limit. The two yes/no fields are read once and
//! never rejected: anything other than `y` counts as "no". The three stage
//! fields form a group; any problem inside the group, including a stage sum
//! that differs from the total, restarts the group at light sleep.

/// Per-field parsing rules and the validation error taxonomy.
pub mod fields;
/// Answer sources (console and scripted).
pub mod source;

use chrono::NaiveDate;
use serde_json::json;
use shared_logging::LogLevel;
use thiserror::Error;

use crate::{
    log::ObservationLog,
    observation::{Observation, Quality, SleepStages},
    telemetry::{emit, JournalTelemetry},
};
use fields::{
    check_stage_sum, parse_date, parse_flag, parse_hours, parse_quality, Field, ValidationError,
};
use source::AnswerSource;

/// Default absolute tolerance, in hours, between the stage sum and the total.
pub const DEFAULT_STAGE_TOLERANCE: f64 = 1e-6;

/// Heading shown before the stage-hours group.
pub const STAGE_NOTICE: &str = "Enter hours spent in each sleep stage:";

/// Failures that end a capture without producing an observation.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The answer source ran out while a field was outstanding.
    #[error("input closed while waiting for {field}")]
    SourceClosed {
        /// Field being requested.
        field: Field,
    },
    /// Reading or prompting failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Final assembly rejected the record.
    #[error("record rejected: {0}")]
    Rejected(#[from] ValidationError),
}

/// Answers accepted before the stage group.
#[derive(Debug, Clone, Copy)]
struct Header {
    date: NaiveDate,
    total_hours: f64,
    quality: Quality,
    exercised: bool,
    caffeinated: bool,
}

/// Capture progress. Each state carries the answers accepted so far.
#[derive(Debug, Clone, Copy)]
enum CaptureState {
    Date,
    TotalHours {
        date: NaiveDate,
    },
    Quality {
        date: NaiveDate,
        total_hours: f64,
    },
    Exercised {
        date: NaiveDate,
        total_hours: f64,
        quality: Quality,
    },
    Caffeinated {
        date: NaiveDate,
        total_hours: f64,
        quality: Quality,
        exercised: bool,
    },
    StageHours(Header),
}

enum Step {
    Next(CaptureState),
    Done(Header, SleepStages),
}

/// Turns raw answers into a validated [`Observation`] and appends it to a log.
#[derive(Debug, Clone, Copy)]
pub struct InputValidator {
    stage_tolerance: f64,
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(DEFAULT_STAGE_TOLERANCE)
    }
}

impl InputValidator {
    /// Creates a validator. A tolerance of `0.0` requires exact stage sums.
    #[must_use]
    pub fn new(stage_tolerance: f64) -> Self {
        Self {
            stage_tolerance: stage_tolerance.max(0.0),
        }
    }

    /// Tolerance applied to the stage-sum check.
    #[must_use]
    pub const fn stage_tolerance(&self) -> f64 {
        self.stage_tolerance
    }

    /// Captures one observation and appends it to `log`.
    pub fn capture(
        &self,
        source: &mut dyn AnswerSource,
        log: &mut ObservationLog,
    ) -> Result<Observation, CaptureError> {
        self.capture_with_telemetry(source, log, None)
    }

    /// Captures one observation with optional telemetry. The log is only
    /// touched once every field and the stage sum have been accepted.
    pub fn capture_with_telemetry(
        &self,
        source: &mut dyn AnswerSource,
        log: &mut ObservationLog,
        telemetry: Option<&JournalTelemetry>,
    ) -> Result<Observation, CaptureError> {
        let mut state = CaptureState::Date;
        let (header, stages) = loop {
            match self.step(state, source, telemetry) {
                Ok(Step::Next(next)) => state = next,
                Ok(Step::Done(header, stages)) => break (header, stages),
                Err(err) => {
                    emit(
                        telemetry,
                        LogLevel::Warn,
                        "journal.capture.aborted",
                        json!({ "error": err.to_string() }),
                    );
                    return Err(err);
                }
            }
        };
        let observation = Observation::new(
            header.date,
            header.total_hours,
            header.quality,
            header.exercised,
            header.caffeinated,
            stages,
            self.stage_tolerance,
        )?;
        let count = log.append(observation.clone());
        emit(
            telemetry,
            LogLevel::Info,
            "journal.capture.appended",
            json!({ "date": observation.date(), "count": count }),
        );
        Ok(observation)
    }

    fn step(
        &self,
        state: CaptureState,
        source: &mut dyn AnswerSource,
        telemetry: Option<&JournalTelemetry>,
    ) -> Result<Step, CaptureError> {
        let next = match state {
            CaptureState::Date => CaptureState::TotalHours {
                date: Self::ask_until_valid(source, Field::Date, parse_date, telemetry)?,
            },
            CaptureState::TotalHours { date } => CaptureState::Quality {
                date,
                total_hours: Self::ask_until_valid(
                    source,
                    Field::TotalHours,
                    |raw| parse_hours(Field::TotalHours, raw),
                    telemetry,
                )?,
            },
            CaptureState::Quality { date, total_hours } => CaptureState::Exercised {
                date,
                total_hours,
                quality: Self::ask_until_valid(source, Field::Quality, parse_quality, telemetry)?,
            },
            CaptureState::Exercised {
                date,
                total_hours,
                quality,
            } => CaptureState::Caffeinated {
                date,
                total_hours,
                quality,
                exercised: parse_flag(&source.answer(Field::Exercised)?),
            },
            CaptureState::Caffeinated {
                date,
                total_hours,
                quality,
                exercised,
            } => CaptureState::StageHours(Header {
                date,
                total_hours,
                quality,
                exercised,
                caffeinated: parse_flag(&source.answer(Field::Caffeinated)?),
            }),
            CaptureState::StageHours(header) => {
                let stages = self.ask_stage_group(source, header.total_hours, telemetry)?;
                return Ok(Step::Done(header, stages));
            }
        };
        Ok(Step::Next(next))
    }

    fn ask_until_valid<T>(
        source: &mut dyn AnswerSource,
        field: Field,
        parse: impl Fn(&str) -> Result<T, ValidationError>,
        telemetry: Option<&JournalTelemetry>,
    ) -> Result<T, CaptureError> {
        let mut attempt = 0_usize;
        loop {
            attempt += 1;
            let raw = source.answer(field)?;
            match parse(&raw) {
                Ok(value) => return Ok(value),
                Err(err) => reject(source, &err, attempt, telemetry),
            }
        }
    }

    fn ask_stage_group(
        &self,
        source: &mut dyn AnswerSource,
        total_hours: f64,
        telemetry: Option<&JournalTelemetry>,
    ) -> Result<SleepStages, CaptureError> {
        let mut attempt = 0_usize;
        loop {
            attempt += 1;
            source.notice(STAGE_NOTICE);
            match self.read_stage_group(source, total_hours)? {
                Ok(stages) => return Ok(stages),
                Err(err) => reject(source, &err, attempt, telemetry),
            }
        }
    }

    /// One pass over the group. The outer error ends the capture, the inner
    /// one restarts the group.
    fn read_stage_group(
        &self,
        source: &mut dyn AnswerSource,
        total_hours: f64,
    ) -> Result<Result<SleepStages, ValidationError>, CaptureError> {
        let mut values = [0.0; 3];
        for (slot, field) in values
            .iter_mut()
            .zip([Field::LightHours, Field::DeepHours, Field::RemHours])
        {
            match parse_hours(field, &source.answer(field)?) {
                Ok(value) => *slot = value,
                Err(err) => return Ok(Err(err)),
            }
        }
        let [light, deep, rem] = values;
        let stages = SleepStages::new(light, deep, rem);
        Ok(check_stage_sum(&stages, total_hours, self.stage_tolerance).map(|()| stages))
    }
}

fn reject(
    source: &mut dyn AnswerSource,
    error: &ValidationError,
    attempt: usize,
    telemetry: Option<&JournalTelemetry>,
) {
    emit(
        telemetry,
        LogLevel::Warn,
        "journal.capture.rejected",
        json!({
            "kind": error.kind(),
            "field": error.field().map_or("stage_hours", Field::name),
            "attempt": attempt,
            "error": error.to_string(),
        }),
    );
    source.rejected(error);
}
