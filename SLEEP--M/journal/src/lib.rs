#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Sleep journal: validated capture of nightly observations and a regression
//! of sleep quality on lifestyle and sleep-stage features.

/// Validated sleep observation types.
#[path = "../observation.rs"]
pub mod observation;

/// Append-only observation log.
#[path = "../log.rs"]
pub mod log;

/// Field-by-field input validation state machine.
#[path = "../validator/main.rs"]
pub mod validator;

/// Standardized least-squares analysis of sleep quality.
#[path = "../analysis/main.rs"]
pub mod analysis;

/// Tabular import/export boundary.
#[path = "../table.rs"]
pub mod table;

/// TOML configuration.
#[path = "../config.rs"]
pub mod config;

/// Telemetry helpers for structured logging.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Runtime entry point used by the CLI.
#[path = "../main.rs"]
pub mod runtime;

pub use analysis::{
    matrix::Feature,
    report::{FeatureInfluence, RegressionResult},
    AnalysisError, RegressionEngine, MIN_OBSERVATIONS,
};
pub use config::JournalConfig;
pub use log::ObservationLog;
pub use observation::{Observation, Quality, SleepStages};
pub use runtime::JournalRuntime;
pub use table::TableError;
pub use telemetry::{JournalTelemetry, JournalTelemetryBuilder};
pub use validator::{
    fields::{Field, ValidationError},
    source::{AnswerSource, ConsoleSource, ScriptedAnswers},
    CaptureError, InputValidator,
};
