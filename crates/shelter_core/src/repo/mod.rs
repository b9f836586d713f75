//! Repository layer over the document driver.
//!
//! # Responsibility
//! - Map typed records (`AppUser`, `AuditLogEntry`) to and from documents.
//! - Keep filter construction for these collections out of the facade.
//!
//! # Invariants
//! - Persisted records that do not decode are reported as `InvalidData`,
//!   never silently skipped.

use crate::docdb::DocDbError;
use thiserror::Error;

pub mod audit_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DocDbError),
    #[error("invalid persisted record: {0}")]
    InvalidData(String),
}

pub(crate) fn to_document<T: serde::Serialize>(
    record: &T,
) -> RepoResult<crate::model::document::Document> {
    match serde_json::to_value(record).map_err(DocDbError::from)? {
        serde_json::Value::Object(document) => Ok(document),
        other => Err(RepoError::InvalidData(format!(
            "record serialized to a non-document value: {other}"
        ))),
    }
}

pub(crate) fn from_document<T: serde::de::DeserializeOwned>(
    document: crate::model::document::Document,
) -> RepoResult<T> {
    serde_json::from_value(serde_json::Value::Object(document))
        .map_err(|err| RepoError::InvalidData(err.to_string()))
}
