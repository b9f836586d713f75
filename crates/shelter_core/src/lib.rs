//! Data-access layer for the animal shelter dashboard.
//! Audited CRUD over `animals`, application users, and dashboard statistics.

pub mod auth;
pub mod config;
pub mod db;
pub mod docdb;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::password::{PasswordError, PasswordPolicy};
pub use config::{ConfigError, ShelterConfig};
pub use docdb::{Client, ClientOptions, DocDbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::audit::{AuditAction, AuditLogEntry};
pub use model::document::{Document, ValidationError};
pub use model::stats::GroupCount;
pub use model::user::AppUser;
pub use repo::audit_repo::AuditFilter;
pub use repo::{RepoError, RepoResult};
pub use service::shelter_store::{ShelterStore, StoreError, StoreResult, DEFAULT_BREED_LIMIT};
