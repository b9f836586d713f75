//! Schema-less documents and field-name validation.
//!
//! # Responsibility
//! - Name the document container shared by every collection.
//! - Reject field names that could be interpreted as operators or paths.
//!
//! # Invariants
//! - Validation inspects keys only; values pass through untouched.
//! - Validation runs before any database call.

use serde_json::{Map, Value};
use thiserror::Error;

/// One stored record: field name to JSON value.
pub type Document = Map<String, Value>;

/// Field holding the database-assigned identity of every document.
pub const ID_FIELD: &str = "_id";

/// Precondition failures raised before the store is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("document must be a mapping of field names to values")]
    NotAMapping,
    #[error("field name `{0}` may not start with '$'")]
    OperatorPrefix(String),
    #[error("field name `{0}` may not contain '.'")]
    PathSeparator(String),
    #[error("nothing to save: `{0}` is empty")]
    EmptyPayload(&'static str),
    #[error("username and password are required")]
    MissingCredentials,
}

/// Validates a document intended for insert or field update and returns it as
/// a mapping.
///
/// # Errors
/// - `NotAMapping` when `value` is not a JSON object.
/// - `OperatorPrefix` when any key starts with `$`.
/// - `PathSeparator` when any key contains `.`.
pub fn validate_document(value: &Value) -> Result<&Document, ValidationError> {
    let document = value.as_object().ok_or(ValidationError::NotAMapping)?;

    for key in document.keys() {
        if key.starts_with('$') {
            return Err(ValidationError::OperatorPrefix(key.clone()));
        }
        if key.contains('.') {
            return Err(ValidationError::PathSeparator(key.clone()));
        }
    }

    Ok(document)
}

/// Returns whether a payload counts as "nothing to save": null, `false`,
/// zero, or an empty string, array or object.
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
