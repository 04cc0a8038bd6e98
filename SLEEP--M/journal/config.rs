use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use shared_logging::LogLevel;

use crate::validator::DEFAULT_STAGE_TOLERANCE;

/// Journal settings, usually read from `journal.toml`.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalConfig {
    /// Table loaded and saved by the menu's load/save commands.
    pub data_path: PathBuf,
    /// JSON-lines telemetry log; `None` disables logging.
    pub log_path: Option<PathBuf>,
    /// Lowest level written to the telemetry log.
    pub log_level: LogLevel,
    /// Allowed difference between the stage sum and total hours.
    pub stage_tolerance: f64,
    /// Save the table after every captured observation.
    pub autosave: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            log_path: None,
            log_level: LogLevel::Info,
            stage_tolerance: DEFAULT_STAGE_TOLERANCE,
            autosave: false,
        }
    }
}

impl JournalConfig {
    /// Loads configuration from a TOML file. Relative paths are resolved
    /// against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading journal config {}", path.display()))?;
        let base = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self::from_toml(&raw, &base).with_context(|| format!("parsing {}", path.display()))
    }

    /// Loads `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parses TOML text, resolving relative paths against `base`.
    pub fn from_toml(raw: &str, base: &Path) -> Result<Self> {
        let document: JournalConfigSerde = toml::from_str(raw)?;
        if !(document.stage_tolerance.is_finite() && document.stage_tolerance >= 0.0) {
            bail!(
                "stage_tolerance must be a non-negative number, got {}",
                document.stage_tolerance
            );
        }
        let log_level: LogLevel = document.log_level.parse()?;
        let resolve = |candidate: PathBuf| {
            if candidate.is_absolute() {
                candidate
            } else {
                base.join(candidate)
            }
        };
        Ok(Self {
            data_path: resolve(document.data_path),
            log_path: document.log_path.map(resolve),
            log_level,
            stage_tolerance: document.stage_tolerance,
            autosave: document.autosave,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct JournalConfigSerde {
    #[serde(default = "default_data_path")]
    data_path: PathBuf,
    #[serde(default)]
    log_path: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_stage_tolerance")]
    stage_tolerance: f64,
    #[serde(default)]
    autosave: bool,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("sleep_data.csv")
}

fn default_log_level() -> String {
    "info".into()
}

const fn default_stage_tolerance() -> f64 {
    DEFAULT_STAGE_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_and_resolves_paths() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("journal.toml");
        fs::write(
            &config_path,
            r#"
data_path = "data/sleep.csv"
log_path = "logs/journal.log"
log_level = "debug"
stage_tolerance = 0.0
autosave = true
"#,
        )
        .unwrap();
        let config = JournalConfig::load(&config_path).unwrap();
        assert_eq!(config.data_path, dir.path().join("data/sleep.csv"));
        assert_eq!(config.log_path, Some(dir.path().join("logs/journal.log")));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.stage_tolerance, 0.0);
        assert!(config.autosave);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = JournalConfig::from_toml("", Path::new("/srv")).unwrap();
        assert_eq!(config.data_path, PathBuf::from("/srv/sleep_data.csv"));
        assert_eq!(config.stage_tolerance, DEFAULT_STAGE_TOLERANCE);
        assert_eq!(config.log_path, None);
    }

    #[test]
    fn rejects_negative_tolerance_and_unknown_keys() {
        assert!(JournalConfig::from_toml("stage_tolerance = -1.0", Path::new(".")).is_err());
        assert!(JournalConfig::from_toml("colour = \"blue\"", Path::new(".")).is_err());
        assert!(JournalConfig::from_toml("log_level = \"loud\"", Path::new(".")).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = JournalConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, JournalConfig::default());
    }
}
