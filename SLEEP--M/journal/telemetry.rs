use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_logging::{JsonLogger, LogLevel, LogRecord};

/// Builder for journal telemetry sinks.
#[derive(Debug)]
pub struct JournalTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    min_level: LogLevel,
}

impl JournalTelemetryBuilder {
    /// Creates the builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            min_level: LogLevel::Info,
        }
    }

    /// Sets the JSON-lines log path. Without one, telemetry is a no-op.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Sets the lowest level written to the log.
    #[must_use]
    pub const fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Builds the telemetry handle, creating the log file if needed.
    pub fn build(self) -> Result<JournalTelemetry> {
        let logger = self
            .log_path
            .map(|path| JsonLogger::with_min_level(path, self.min_level))
            .transpose()?;
        Ok(JournalTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                logger,
            }),
        })
    }
}

/// Telemetry handle shared across journal components.
#[derive(Clone)]
pub struct JournalTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for JournalTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JournalTelemetry")
            .field("module", &self.inner.module)
            .field(
                "log_path",
                &self.inner.logger.as_ref().map(JsonLogger::path),
            )
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    logger: Option<JsonLogger>,
}

impl JournalTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> JournalTelemetryBuilder {
        JournalTelemetryBuilder::new(module)
    }

    /// Logs structured metadata.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            let record = LogRecord::new(&self.inner.module, level, message).with_metadata(metadata);
            logger.log(&record)?;
        }
        Ok(())
    }
}

/// Logs through `telemetry` when present. Logging failures never interrupt
/// the journal itself.
pub(crate) fn emit(
    telemetry: Option<&JournalTelemetry>,
    level: LogLevel,
    message: &str,
    metadata: Value,
) {
    if let Some(tel) = telemetry {
        if let Err(err) = tel.log(level, message, metadata) {
            eprintln!("telemetry log failed: {err:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn telemetry_writes_log() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("journal.log");
        let telemetry = JournalTelemetry::builder("journal")
            .log_path(&path)
            .min_level(LogLevel::Debug)
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Info, "journal.start", json!({ "entries": 3 }))
            .unwrap();
        emit(
            Some(&telemetry),
            LogLevel::Debug,
            "journal.debug",
            json!({}),
        );
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("journal.start"));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn telemetry_without_path_is_silent() {
        let telemetry = JournalTelemetry::builder("journal").build().unwrap();
        telemetry
            .log(LogLevel::Error, "journal.noop", json!({}))
            .unwrap();
    }
}
