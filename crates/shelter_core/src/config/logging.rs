//! Logging section.

use crate::logging::{init_logging, LoggingError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_level() -> String {
    crate::logging::default_log_level().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Absolute directory for rolling log files; unset leaves logging to the host.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
        }
    }
}

impl LoggingConfig {
    /// Starts file logging when a directory is configured.
    ///
    /// Returns `Ok(false)` when no directory is set.
    pub fn init(&self) -> Result<bool, LoggingError> {
        match &self.dir {
            Some(dir) => init_logging(&self.level, dir).map(|()| true),
            None => Ok(false),
        }
    }
}
