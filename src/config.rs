//! Orchestration settings.
//!
//! Settings are read from TOML. Every field has a default, so an empty file
//! (or no file at all) yields a working configuration.

use crate::consensus::domain::{ConsensusDomainError, ScoringCriteria};
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default per-worker deadline.
pub const DEFAULT_WORKER_TIMEOUT_SECS: u64 = 600;

/// Default deadline for each statement applied to the shared resource.
pub const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 600_000;

/// Default identifier of the shared resource.
pub const DEFAULT_MAIN_TARGET: &str = "main";

/// Errors returned while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The TOML was malformed.
    #[error("failed to parse config: {0}")]
    Parse(Box<toml::de::Error>),
    /// Scoring weights are invalid.
    #[error("invalid scoring weights: {0}")]
    Scoring(#[from] ConsensusDomainError),
    /// A timeout was zero.
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    /// Applying the winner needs a target.
    #[error("main_target must be set when apply_winner is enabled")]
    MissingMainTarget,
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(Box::new(err))
    }
}

/// Which workers take part in a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerSelection {
    /// Every canonical role.
    #[default]
    All,
    /// Roles chosen per task by the agent selector.
    Routed,
}

/// Settings for task processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    /// Shared resource that copies are made from and winners applied to.
    pub main_target: String,
    /// Per-worker deadline in seconds.
    pub worker_timeout_secs: u64,
    /// Deadline for each applied statement in milliseconds.
    pub statement_timeout_ms: u64,
    /// Scoring weights.
    pub scoring: ScoringCriteria,
    /// Whether the winning proposal is applied to `main_target`.
    pub apply_winner: bool,
    /// How workers are chosen.
    pub worker_selection: WorkerSelection,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            main_target: DEFAULT_MAIN_TARGET.to_owned(),
            worker_timeout_secs: DEFAULT_WORKER_TIMEOUT_SECS,
            statement_timeout_ms: DEFAULT_STATEMENT_TIMEOUT_MS,
            scoring: ScoringCriteria::default(),
            apply_winner: false,
            worker_selection: WorkerSelection::default(),
        }
    }
}

impl OrchestrationConfig {
    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and validation
    /// errors as described on [`Self::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, plus the
    /// errors of [`Self::from_toml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        match read_config(path)? {
            Some(text) => Self::from_toml_str(&text),
            None => Err(ConfigError::Io {
                path: path.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }

    /// Reads a TOML file, falling back to defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::load`] other than a missing file.
    pub fn load_or_default(path: &Utf8Path) -> Result<Self, ConfigError> {
        match read_config(path)? {
            Some(text) => Self::from_toml_str(&text),
            None => Ok(Self::default()),
        }
    }

    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Scoring`] for invalid weights,
    /// [`ConfigError::ZeroTimeout`] for a zero timeout, and
    /// [`ConfigError::MissingMainTarget`] when `apply_winner` is set without
    /// a target.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        if self.worker_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("worker_timeout_secs"));
        }
        if self.statement_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("statement_timeout_ms"));
        }
        if self.apply_winner && self.main_target.trim().is_empty() {
            return Err(ConfigError::MissingMainTarget);
        }
        Ok(())
    }

    /// Returns the per-worker deadline.
    #[must_use]
    pub const fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_secs)
    }
}

fn read_config(path: &Utf8Path) -> Result<Option<String>, ConfigError> {
    let io_error = |source: std::io::Error| ConfigError::Io {
        path: path.to_string(),
        source,
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io_error(std::io::Error::other("path must include a file name")))?;
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let dir = match Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_error(err)),
    };
    match dir.read_to_string(file_name) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_error(err)),
    }
}
