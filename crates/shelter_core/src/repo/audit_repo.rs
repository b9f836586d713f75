//! Audit trail persistence and queries.

use super::{from_document, to_document, RepoResult};
use crate::docdb::{Collection, FindOptions};
use crate::model::audit::{AuditAction, AuditLogEntry};
use serde_json::{Map, Value};

/// Entries returned when the caller sets no limit.
pub const DEFAULT_AUDIT_LIMIT: u32 = 100;

/// Filter criteria for audit queries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub action: Option<AuditAction>,
    pub user: Option<String>,
    pub success: Option<bool>,
    pub limit: Option<u32>,
}

impl AuditFilter {
    fn to_query(&self) -> Value {
        let mut query = Map::new();
        if let Some(action) = self.action {
            query.insert("action".into(), Value::from(action.as_str()));
        }
        if let Some(user) = &self.user {
            query.insert("user".into(), Value::from(user.as_str()));
        }
        if let Some(success) = self.success {
            query.insert("success".into(), Value::from(success));
        }
        Value::Object(query)
    }
}

pub trait AuditRepository {
    fn append(&self, entry: &AuditLogEntry) -> RepoResult<()>;
    /// Matching entries, newest first.
    fn query(&self, filter: &AuditFilter) -> RepoResult<Vec<AuditLogEntry>>;
}

/// `audit_log` collection backed repository.
pub struct DocAuditRepository<'conn> {
    collection: Collection<'conn>,
}

impl<'conn> DocAuditRepository<'conn> {
    pub fn new(collection: Collection<'conn>) -> Self {
        Self { collection }
    }
}

impl AuditRepository for DocAuditRepository<'_> {
    fn append(&self, entry: &AuditLogEntry) -> RepoResult<()> {
        self.collection.insert_one(&to_document(entry)?)?;
        Ok(())
    }

    fn query(&self, filter: &AuditFilter) -> RepoResult<Vec<AuditLogEntry>> {
        let options = FindOptions {
            limit: Some(filter.limit.unwrap_or(DEFAULT_AUDIT_LIMIT)),
            newest_first: true,
        };
        self.collection
            .find(&filter.to_query(), &options)?
            .into_iter()
            .map(from_document)
            .collect()
    }
}
