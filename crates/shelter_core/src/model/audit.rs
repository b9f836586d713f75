//! Audit trail entries.
//!
//! # Responsibility
//! - Describe one operation attempt: who, what, with which filter/payload,
//!   how many documents and whether it succeeded.
//!
//! # Invariants
//! - One entry per operation attempt, success or failure.
//! - `user` is `anonymous` when no session is active.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Actor recorded when no application user is authenticated.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Operation recorded by an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Read,
    Update,
    Delete,
    AggregateOutcomeStats,
    AggregateBreedStats,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::AggregateOutcomeStats => "aggregate_outcome_stats",
            Self::AggregateBreedStats => "aggregate_breed_stats",
        }
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub user: String,
    pub query: Option<Value>,
    pub data: Option<Value>,
    pub result_count: Option<u64>,
    pub success: bool,
    pub error: Option<String>,
}

/// Outcome half of an audit entry, filled in by the operation being recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditOutcome {
    pub query: Option<Value>,
    pub data: Option<Value>,
    pub result_count: u64,
    pub success: bool,
    pub error: Option<String>,
}

impl AuditOutcome {
    /// Outcome of a call that reached the store; `success` mirrors its answer.
    pub fn completed(result_count: u64, success: bool) -> Self {
        Self {
            query: None,
            data: None,
            result_count,
            success,
            error: None,
        }
    }

    /// Outcome of a call that failed; nothing was affected.
    pub fn failed(error: impl ToString) -> Self {
        Self {
            query: None,
            data: None,
            result_count: 0,
            success: false,
            error: Some(error.to_string()),
        }
    }

    pub fn with_query(mut self, query: Option<&Value>) -> Self {
        self.query = query.cloned();
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}
