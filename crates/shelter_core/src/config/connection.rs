//! Connection section.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 27017;

const fn default_port() -> u16 {
    DEFAULT_PORT
}

const fn default_timeout_ms() -> u64 {
    5_000
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database files live under this directory; unset means in-memory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_timeout_ms")]
    pub server_selection_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            host: default_host(),
            port: DEFAULT_PORT,
            data_dir: None,
            server_selection_timeout_ms: default_timeout_ms(),
        }
    }
}

impl ConnectionConfig {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_millis(self.server_selection_timeout_ms)
    }
}
