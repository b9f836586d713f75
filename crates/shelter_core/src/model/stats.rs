//! Dashboard statistics rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One group of an aggregation: the grouped value and how many documents
/// carried it. Serialized as `{"_id": ..., "count": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCount {
    #[serde(rename = "_id")]
    pub key: Value,
    pub count: u64,
}
