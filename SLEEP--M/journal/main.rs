//! Journal runtime owning the log and wiring capture, listing, analysis, and tables.

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Result;
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    analysis::{report::RegressionResult, AnalysisError, RegressionEngine},
    config::JournalConfig,
    log::ObservationLog,
    observation::Observation,
    table,
    telemetry::{emit, JournalTelemetry},
    validator::{source::AnswerSource, InputValidator},
};

/// Message shown when listing an empty log.
pub const EMPTY_LOG_MESSAGE: &str = "There is no sleep data to view.";

/// Owns the observation log and hands it to the validator and the engine.
#[derive(Debug)]
pub struct JournalRuntime {
    config: JournalConfig,
    log: ObservationLog,
    validator: InputValidator,
    engine: RegressionEngine,
    telemetry: Option<JournalTelemetry>,
}

impl JournalRuntime {
    /// Creates a runtime with an empty log and no telemetry.
    #[must_use]
    pub fn new(config: JournalConfig) -> Self {
        Self {
            validator: InputValidator::new(config.stage_tolerance),
            engine: RegressionEngine::new(),
            log: ObservationLog::new(),
            telemetry: None,
            config,
        }
    }

    /// Creates a runtime and attaches telemetry when the config names a log path.
    pub fn from_config(config: JournalConfig) -> Result<Self> {
        let telemetry = match &config.log_path {
            Some(path) => Some(
                JournalTelemetry::builder("journal")
                    .log_path(path)
                    .min_level(config.log_level)
                    .build()?,
            ),
            None => None,
        };
        let mut runtime = Self::new(config);
        runtime.telemetry = telemetry;
        Ok(runtime)
    }

    /// Attaches telemetry sinks.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: JournalTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &JournalConfig {
        &self.config
    }

    /// The observation log.
    #[must_use]
    pub const fn log(&self) -> &ObservationLog {
        &self.log
    }

    /// Captures one observation from `source` and appends it, saving the
    /// table afterwards when autosave is on.
    pub fn log_sleep(&mut self, source: &mut dyn AnswerSource) -> Result<Observation> {
        let observation =
            self.validator
                .capture_with_telemetry(source, &mut self.log, self.telemetry.as_ref())?;
        if self.config.autosave {
            self.save(None)?;
        }
        Ok(observation)
    }

    /// Renders the numbered listing of the log.
    #[must_use]
    pub fn view(&self) -> String {
        render_listing(self.log.snapshot())
    }

    /// Runs the regression on the current log.
    pub fn analyze(&self) -> Result<RegressionResult, AnalysisError> {
        self.engine
            .analyze_with_telemetry(self.log.snapshot(), self.telemetry.as_ref())
    }

    /// Replaces the log with the table at `path` (or the configured data path).
    /// On failure the current log is kept.
    pub fn load(&mut self, path: Option<&Path>) -> Result<usize> {
        let path = path.map_or_else(|| self.config.data_path.clone(), Path::to_path_buf);
        let observations = table::load_table(&path, self.config.stage_tolerance)?;
        let count = observations.len();
        self.log.replace_all(observations);
        emit(
            self.telemetry.as_ref(),
            LogLevel::Info,
            "journal.table.loaded",
            json!({ "path": path, "count": count }),
        );
        Ok(count)
    }

    /// Writes the log to `path` (or the configured data path) and returns the path used.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = path.map_or_else(|| self.config.data_path.clone(), Path::to_path_buf);
        table::save_table(&path, self.log.snapshot())?;
        emit(
            self.telemetry.as_ref(),
            LogLevel::Info,
            "journal.table.saved",
            json!({ "path": path, "count": self.log.len() }),
        );
        Ok(path)
    }
}

/// Numbered listing, one three-line block per observation.
#[must_use]
pub fn render_listing(observations: &[Observation]) -> String {
    if observations.is_empty() {
        return EMPTY_LOG_MESSAGE.to_owned();
    }
    let mut out = String::from("Your Sleep Data:\n");
    for (index, observation) in observations.iter().enumerate() {
        let _ = write!(out, "\n{}. {observation}", index + 1);
    }
    out
}
