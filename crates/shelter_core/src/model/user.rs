//! Application-level user accounts.
//!
//! # Invariants
//! - `username` is unique within the `users` collection.
//! - Records are created once and never updated by this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role assigned when the caller does not provide any.
pub const DEFAULT_ROLE: &str = "user";

/// Persisted application user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppUser {
    pub username: String,
    /// Argon2 PHC string, or a legacy hex SHA-256 digest.
    pub password_hash: String,
    /// Hex-encoded random salt.
    pub salt: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl AppUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|candidate| candidate == role)
    }
}

/// Returns the role list used when `create_app_user` receives none.
pub fn default_roles() -> Vec<String> {
    vec![DEFAULT_ROLE.to_string()]
}
