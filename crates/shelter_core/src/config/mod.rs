//! Layered configuration loading.
//!
//! Sources, highest priority first:
//! 1. Environment variables prefixed `SHELTER_`, `__` separating sections
//!    (`SHELTER_CONNECTION__HOST` -> `connection.host`).
//! 2. `shelter.toml` in the working directory.
//! 3. Built-in defaults.

mod connection;
mod error;
mod logging;

pub use connection::ConnectionConfig;
pub use error::ConfigError;
pub use logging::LoggingConfig;

use crate::auth::password::PasswordPolicy;
use crate::docdb::ClientOptions;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "shelter.toml";
pub const ENV_PREFIX: &str = "SHELTER_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelterConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Argon2 work factors for application users and principals.
    #[serde(default)]
    pub auth: PasswordPolicy,
}

impl ShelterConfig {
    /// Loads configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Provider chain used by [`ShelterConfig::load`].
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let local_path = Path::new(CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Driver options derived from the connection and auth sections.
    pub fn client_options(&self) -> ClientOptions {
        let mut options = ClientOptions::default()
            .with_server_selection_timeout(self.connection.server_selection_timeout())
            .with_password_policy(self.auth);
        if let Some(data_dir) = &self.connection.data_dir {
            options = options.with_data_dir(data_dir);
        }
        options
    }
}
