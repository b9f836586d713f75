//! Collection handles: document CRUD and aggregation over one table.
//!
//! # Invariants
//! - `body` always holds the whole document, `_id` included.
//! - `id` holds the JSON text of `_id`, so `"1"` and `1` are distinct ids.
//! - `update_many` applies all changes in one transaction or none.

use super::filter::compile_filter;
use super::pipeline::Pipeline;
use super::{DocDbError, DocResult};
use crate::model::document::{Document, ID_FIELD};
use log::debug;
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;
use uuid::Uuid;

/// Outcome of `insert_one`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneResult {
    pub inserted_id: Value,
    pub acknowledged: bool,
}

/// Outcome of `update_many`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateResult {
    pub matched_count: u64,
    /// Documents whose content actually changed.
    pub modified_count: u64,
}

/// Outcome of `delete_many`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// Read options for `find`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub limit: Option<u32>,
    /// Return documents in reverse insertion order.
    pub newest_first: bool,
}

/// Handle to one named collection, borrowed from a `Client`.
#[derive(Debug, Clone)]
pub struct Collection<'conn> {
    conn: &'conn Connection,
    name: String,
}

impl<'conn> Collection<'conn> {
    /// `name` must already be validated as a plain identifier.
    pub(crate) fn new(conn: &'conn Connection, name: impl Into<String>) -> Self {
        Self {
            conn,
            name: name.into(),
        }
    }

    /// Inserts one document, assigning a UUID `_id` when it has none.
    ///
    /// # Errors
    /// - `InvalidDocument` when `_id` is null, an array or an object.
    /// - `Sqlite` on constraint violations such as a duplicate `_id`.
    pub fn insert_one(&self, document: &Document) -> DocResult<InsertOneResult> {
        let mut stored = document.clone();
        let inserted_id = stored
            .entry(ID_FIELD)
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()))
            .clone();
        let key = id_key(&inserted_id)?;
        let body = serde_json::to_string(&stored)?;

        let changed = self.conn.execute(
            &format!("INSERT INTO {} (id, body) VALUES (?1, ?2);", self.name),
            params![key, body],
        )?;
        debug!(
            "event=doc_insert module=docdb status=ok collection={} changed={}",
            self.name, changed
        );

        Ok(InsertOneResult {
            inserted_id,
            acknowledged: changed == 1,
        })
    }

    /// Returns every document matching `filter`.
    pub fn find(&self, filter: &Value, options: &FindOptions) -> DocResult<Vec<Document>> {
        let compiled = compile_filter(filter)?;
        let direction = if options.newest_first { "DESC" } else { "ASC" };
        let mut sql = format!(
            "SELECT body FROM {} WHERE {} ORDER BY seq {direction}",
            self.name, compiled.clause
        );
        let mut bind_values = compiled.params;
        if let Some(limit) = options.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(rusqlite::types::Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            let body: String = row.get(0)?;
            documents.push(parse_body(&body)?);
        }

        debug!(
            "event=doc_find module=docdb status=ok collection={} count={}",
            self.name,
            documents.len()
        );
        Ok(documents)
    }

    /// Returns the first matching document in insertion order.
    pub fn find_one(&self, filter: &Value) -> DocResult<Option<Document>> {
        let options = FindOptions {
            limit: Some(1),
            newest_first: false,
        };
        Ok(self.find(filter, &options)?.into_iter().next())
    }

    /// Replaces the fields in `set` on every document matching `filter`.
    ///
    /// # Errors
    /// - `ImmutableField` when `set` would change a document's `_id`; nothing
    ///   is written in that case.
    pub fn update_many(&self, filter: &Value, set: &Document) -> DocResult<UpdateResult> {
        let compiled = compile_filter(filter)?;
        let tx = self.conn.unchecked_transaction()?;

        let matches = {
            let mut stmt = tx.prepare(&format!(
                "SELECT seq, body FROM {} WHERE {} ORDER BY seq",
                self.name, compiled.clause
            ))?;
            let rows = stmt.query_map(params_from_iter(compiled.params), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let mut modified_count = 0;
        for (seq, body) in &matches {
            let mut document = parse_body(body)?;
            if let Some(new_id) = set.get(ID_FIELD) {
                if document.get(ID_FIELD) != Some(new_id) {
                    return Err(DocDbError::ImmutableField(ID_FIELD.to_string()));
                }
            }

            let mut changed = false;
            for (key, value) in set {
                if document.get(key) != Some(value) {
                    document.insert(key.clone(), value.clone());
                    changed = true;
                }
            }

            if changed {
                tx.execute(
                    &format!("UPDATE {} SET body = ?1 WHERE seq = ?2;", self.name),
                    params![serde_json::to_string(&document)?, seq],
                )?;
                modified_count += 1;
            }
        }
        tx.commit()?;

        debug!(
            "event=doc_update module=docdb status=ok collection={} matched={} modified={}",
            self.name,
            matches.len(),
            modified_count
        );
        Ok(UpdateResult {
            matched_count: matches.len() as u64,
            modified_count,
        })
    }

    /// Removes every document matching `filter`.
    pub fn delete_many(&self, filter: &Value) -> DocResult<DeleteResult> {
        let compiled = compile_filter(filter)?;
        let deleted = self.conn.execute(
            &format!("DELETE FROM {} WHERE {};", self.name, compiled.clause),
            params_from_iter(compiled.params),
        )?;

        debug!(
            "event=doc_delete module=docdb status=ok collection={} deleted={}",
            self.name, deleted
        );
        Ok(DeleteResult {
            deleted_count: deleted as u64,
        })
    }

    /// Runs a group-count pipeline, yielding `{"_id", "count"}` documents.
    pub fn aggregate(&self, pipeline: &Pipeline) -> DocResult<Vec<Document>> {
        let compiled = pipeline.compile(&self.name)?;
        let mut stmt = self.conn.prepare(&compiled.sql)?;
        let rows = stmt.query_map(params_from_iter(compiled.params), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut groups = Vec::new();
        for row in rows {
            let (key, count) = row?;
            let mut group = Document::new();
            group.insert(ID_FIELD.to_string(), serde_json::from_str(&key)?);
            group.insert("count".to_string(), Value::from(count));
            groups.push(group);
        }
        Ok(groups)
    }
}

fn id_key(id: &Value) -> DocResult<String> {
    match id {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(id.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(DocDbError::InvalidDocument(
            "`_id` must be a string, number or boolean".into(),
        )),
    }
}

fn parse_body(body: &str) -> DocResult<Document> {
    Ok(serde_json::from_str(body)?)
}
