//! Document driver over the embedded SQLite engine.
//!
//! # Responsibility
//! - Parse connection strings and open authenticated client handles.
//! - Expose collection-level insert/find/update/delete/aggregate calls that
//!   take JSON documents and JSON filters.
//!
//! # Invariants
//! - Collection names and filter paths are validated before they reach SQL;
//!   filter values are always bound as parameters.
//! - Every document carries a scalar `_id` that is unique per collection.

use crate::auth::password::PasswordError;
use crate::db::DbError;
use thiserror::Error;

mod client;
mod collection;
pub mod filter;
pub mod pipeline;
pub mod uri;

pub use client::{Client, ClientOptions};
pub use collection::{Collection, DeleteResult, FindOptions, InsertOneResult, UpdateResult};
pub use pipeline::{Pipeline, Stage};
pub use uri::ConnectionString;

pub type DocResult<T> = Result<T, DocDbError>;

/// Driver-level failures.
#[derive(Debug, Error)]
pub enum DocDbError {
    #[error("invalid connection string: {0}")]
    InvalidUri(String),

    #[error("storage error: {0}")]
    Storage(#[from] DbError),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("authentication failed for principal `{username}`")]
    AuthenticationFailed { username: String },

    #[error("invalid collection name `{0}`")]
    InvalidCollectionName(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("unsupported query operator `{0}`")]
    UnsupportedOperator(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("performing an update on the path `{0}` would modify an immutable field")]
    ImmutableField(String),

    #[error("unsupported aggregation pipeline: {0}")]
    UnsupportedPipeline(String),

    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),
}
