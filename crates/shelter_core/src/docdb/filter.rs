//! Filter compiler: JSON filter documents to parameterised SQL predicates.
//!
//! # Invariants
//! - Produced clauses never evaluate to SQL `NULL`, so `NOT (...)` is exact.
//! - Field paths are quoted JSON paths bound as parameters, never spliced.
//! - Comparisons are type-bracketed: numbers only match numbers, strings only
//!   match strings.

use super::{DocDbError, DocResult};
use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};

/// SQL predicate over a table's `body` column plus its bound parameters, in
/// placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    pub clause: String,
    pub params: Vec<SqlValue>,
}

/// Compiles a filter document.
///
/// # Errors
/// - `InvalidFilter` when `filter` is not an object or an operand is malformed.
/// - `UnsupportedOperator` for `$`-operators outside the supported set.
pub fn compile_filter(filter: &Value) -> DocResult<CompiledFilter> {
    let document = filter
        .as_object()
        .ok_or_else(|| DocDbError::InvalidFilter("filter must be a document".into()))?;
    let mut compiler = Compiler::default();
    let clause = compiler.document(document)?;
    Ok(CompiledFilter {
        clause,
        params: compiler.params,
    })
}

/// Converts a dotted field name into a quoted SQLite JSON path.
///
/// # Errors
/// Returns `InvalidFilter` for empty path segments or segments containing `"`.
pub fn json_path(field: &str) -> DocResult<String> {
    let mut path = String::from("$");
    for segment in field.split('.') {
        if segment.is_empty() || segment.contains('"') {
            return Err(DocDbError::InvalidFilter(format!(
                "invalid field path `{field}`"
            )));
        }
        path.push_str(".\"");
        path.push_str(segment);
        path.push('"');
    }
    Ok(path)
}

#[derive(Default)]
struct Compiler {
    params: Vec<SqlValue>,
}

impl Compiler {
    fn document(&mut self, document: &Map<String, Value>) -> DocResult<String> {
        if document.is_empty() {
            return Ok("1 = 1".to_string());
        }

        let mut clauses = Vec::with_capacity(document.len());
        for (key, value) in document {
            let clause = match key.as_str() {
                "$and" => self.logical(key, value, " AND ")?,
                "$or" => self.logical(key, value, " OR ")?,
                "$nor" => format!("NOT {}", self.logical(key, value, " OR ")?),
                other if other.starts_with('$') => {
                    return Err(DocDbError::UnsupportedOperator(other.to_string()));
                }
                field => self.field(field, value)?,
            };
            clauses.push(clause);
        }
        Ok(join(&clauses, " AND "))
    }

    fn logical(&mut self, operator: &str, value: &Value, joiner: &str) -> DocResult<String> {
        let branches = value
            .as_array()
            .filter(|branches| !branches.is_empty())
            .ok_or_else(|| {
                DocDbError::InvalidFilter(format!("`{operator}` expects a non-empty array"))
            })?;

        let mut clauses = Vec::with_capacity(branches.len());
        for branch in branches {
            let branch = branch.as_object().ok_or_else(|| {
                DocDbError::InvalidFilter(format!("`{operator}` entries must be documents"))
            })?;
            clauses.push(self.document(branch)?);
        }
        Ok(join(&clauses, joiner))
    }

    fn field(&mut self, field: &str, condition: &Value) -> DocResult<String> {
        let path = json_path(field)?;

        let operators = match condition {
            Value::Object(map) if !map.is_empty() && map.keys().all(|key| key.starts_with('$')) => {
                map
            }
            _ => return Ok(self.equals(&path, condition)),
        };

        let mut clauses = Vec::with_capacity(operators.len());
        for (operator, operand) in operators {
            let clause = match operator.as_str() {
                "$eq" => self.equals(&path, operand),
                "$ne" => format!("NOT {}", self.equals(&path, operand)),
                "$gt" => self.compare(&path, operator, ">", operand)?,
                "$gte" => self.compare(&path, operator, ">=", operand)?,
                "$lt" => self.compare(&path, operator, "<", operand)?,
                "$lte" => self.compare(&path, operator, "<=", operand)?,
                "$in" => self.one_of(&path, operator, operand)?,
                "$nin" => format!("NOT {}", self.one_of(&path, operator, operand)?),
                "$exists" => {
                    let wanted = operand.as_bool().ok_or_else(|| {
                        DocDbError::InvalidFilter("`$exists` expects a boolean".into())
                    })?;
                    self.params.push(SqlValue::Text(path.clone()));
                    if wanted {
                        "(json_type(body, ?) IS NOT NULL)".to_string()
                    } else {
                        "(json_type(body, ?) IS NULL)".to_string()
                    }
                }
                other => return Err(DocDbError::UnsupportedOperator(other.to_string())),
            };
            clauses.push(clause);
        }
        Ok(join(&clauses, " AND "))
    }

    fn equals(&mut self, path: &str, value: &Value) -> String {
        match value {
            Value::Null => {
                self.push_path(path);
                "(IFNULL(json_type(body, ?), 'null') = 'null')".to_string()
            }
            Value::Bool(flag) => {
                self.push_path(path);
                let wanted = if *flag { "true" } else { "false" };
                format!("(IFNULL(json_type(body, ?), 'missing') = '{wanted}')")
            }
            Value::Number(number) => {
                self.push_path(path);
                self.push_path(path);
                self.params.push(number_param(number));
                "(IFNULL(json_type(body, ?), 'missing') IN ('integer', 'real') AND json_extract(body, ?) = ?)"
                    .to_string()
            }
            Value::String(text) => {
                self.push_path(path);
                self.push_path(path);
                self.params.push(SqlValue::Text(text.clone()));
                "(IFNULL(json_type(body, ?), 'missing') = 'text' AND json_extract(body, ?) = ?)"
                    .to_string()
            }
            Value::Array(_) | Value::Object(_) => {
                self.push_path(path);
                self.params.push(SqlValue::Text(value.to_string()));
                "(IFNULL(body -> ?, '') = json(?))".to_string()
            }
        }
    }

    fn compare(
        &mut self,
        path: &str,
        operator: &str,
        sql_operator: &str,
        operand: &Value,
    ) -> DocResult<String> {
        let (types, param) = match operand {
            Value::Number(number) => ("'integer', 'real'", number_param(number)),
            Value::String(text) => ("'text'", SqlValue::Text(text.clone())),
            _ => {
                return Err(DocDbError::InvalidFilter(format!(
                    "`{operator}` expects a number or string operand"
                )));
            }
        };
        self.push_path(path);
        self.push_path(path);
        self.params.push(param);
        Ok(format!(
            "(IFNULL(json_type(body, ?), 'missing') IN ({types}) AND json_extract(body, ?) {sql_operator} ?)"
        ))
    }

    fn one_of(&mut self, path: &str, operator: &str, operand: &Value) -> DocResult<String> {
        let candidates = operand.as_array().ok_or_else(|| {
            DocDbError::InvalidFilter(format!("`{operator}` expects an array"))
        })?;
        if candidates.is_empty() {
            return Ok("(0 = 1)".to_string());
        }

        let clauses = candidates
            .iter()
            .map(|candidate| self.equals(path, candidate))
            .collect::<Vec<_>>();
        Ok(join(&clauses, " OR "))
    }

    fn push_path(&mut self, path: &str) {
        self.params.push(SqlValue::Text(path.to_string()));
    }
}

fn number_param(number: &serde_json::Number) -> SqlValue {
    match number.as_i64() {
        Some(integer) => SqlValue::Integer(integer),
        None => SqlValue::Real(number.as_f64().unwrap_or(f64::NAN)),
    }
}

fn join(clauses: &[String], joiner: &str) -> String {
    if clauses.len() == 1 {
        return clauses[0].clone();
    }
    format!("({})", clauses.join(joiner))
}
