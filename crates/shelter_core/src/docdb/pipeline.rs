//! Group-count aggregation pipelines.
//!
//! Supported shape: `[Match] Group [SortByCount] [Limit]`. The output of a
//! pipeline is one `{"_id": <value>, "count": <n>}` document per group.

use super::filter::{compile_filter, json_path};
use super::{DocDbError, DocResult};
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keep only documents matching the filter.
    Match(Value),
    /// One output row per distinct value of `by`; missing values group as null.
    Group { by: String },
    /// Order groups by their count.
    SortByCount { descending: bool },
    Limit(u32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

/// SQL text and bound parameters for one pipeline run against `table`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompiledPipeline {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage; shape is checked when the pipeline runs.
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Adds a match stage only when a filter is present.
    pub fn match_optional(self, filter: Option<&Value>) -> Self {
        match filter {
            Some(filter) => self.stage(Stage::Match(filter.clone())),
            None => self,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub(crate) fn compile(&self, table: &str) -> DocResult<CompiledPipeline> {
        let mut stages = self.stages.iter().peekable();

        let filter = match stages.peek() {
            Some(Stage::Match(filter)) => {
                let compiled = compile_filter(filter)?;
                stages.next();
                Some(compiled)
            }
            _ => None,
        };

        let group_by = match stages.next() {
            Some(Stage::Group { by }) => json_path(by)?,
            Some(other) => {
                return Err(DocDbError::UnsupportedPipeline(format!(
                    "expected a group stage, found {other:?}"
                )));
            }
            None => {
                return Err(DocDbError::UnsupportedPipeline(
                    "pipeline has no group stage".into(),
                ));
            }
        };

        let order = match stages.peek() {
            Some(Stage::SortByCount { descending }) => {
                let order = if *descending { "DESC" } else { "ASC" };
                stages.next();
                format!("ORDER BY group_count {order}, group_key ASC")
            }
            _ => "ORDER BY group_key ASC".to_string(),
        };

        let limit = match stages.next() {
            Some(Stage::Limit(0)) => {
                return Err(DocDbError::UnsupportedPipeline(
                    "limit must be positive".into(),
                ));
            }
            Some(Stage::Limit(limit)) => Some(*limit),
            Some(other) => {
                return Err(DocDbError::UnsupportedPipeline(format!(
                    "unexpected stage {other:?}"
                )));
            }
            None => None,
        };

        if let Some(extra) = stages.next() {
            return Err(DocDbError::UnsupportedPipeline(format!(
                "unexpected stage {extra:?} after limit"
            )));
        }

        let mut params = vec![SqlValue::Text(group_by)];
        let where_clause = match filter {
            Some(filter) => {
                params.extend(filter.params);
                filter.clause
            }
            None => "1 = 1".to_string(),
        };

        let mut sql = format!(
            "SELECT COALESCE(body -> ?, 'null') AS group_key, COUNT(*) AS group_count
             FROM {table}
             WHERE {where_clause}
             GROUP BY group_key
             {order}"
        );
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            params.push(SqlValue::Integer(i64::from(limit)));
        }

        Ok(CompiledPipeline { sql, params })
    }
}

#[cfg(test)]
mod tests {
    use super::{Pipeline, Stage};
    use serde_json::json;

    #[test]
    fn full_shape_compiles_with_ordered_params() {
        let compiled = Pipeline::new()
            .stage(Stage::Match(json!({"animal_type": "Dog"})))
            .stage(Stage::Group { by: "breed".into() })
            .stage(Stage::SortByCount { descending: true })
            .stage(Stage::Limit(10))
            .compile("animals")
            .unwrap();
        assert!(compiled.sql.contains("ORDER BY group_count DESC"));
        assert!(compiled.sql.ends_with("LIMIT ?"));
        assert_eq!(compiled.sql.matches('?').count(), compiled.params.len());
    }

    #[test]
    fn group_is_required() {
        let err = Pipeline::new()
            .stage(Stage::Match(json!({})))
            .compile("animals")
            .unwrap_err();
        assert!(err.to_string().contains("no group stage"));
    }

    #[test]
    fn stages_out_of_order_are_rejected() {
        assert!(Pipeline::new()
            .stage(Stage::Group { by: "breed".into() })
            .stage(Stage::Limit(3))
            .stage(Stage::SortByCount { descending: true })
            .compile("animals")
            .is_err());
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = Pipeline::new()
            .stage(Stage::Group { by: "breed".into() })
            .stage(Stage::Limit(0))
            .compile("animals")
            .unwrap_err();
        assert!(err.to_string().contains("limit must be positive"));
    }

    #[test]
    fn match_optional_skips_absent_filter() {
        let pipeline = Pipeline::new().match_optional(None);
        assert!(pipeline.stages().is_empty());
    }
}
