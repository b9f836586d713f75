//! Audited CRUD, authentication and statistics facade over the `AAC` database.
//!
//! # Responsibility
//! - Connect and ping the document database, failing fast on error.
//! - Validate, execute and audit CRUD calls on the `animals` collection.
//! - Manage application users and the per-instance session.
//! - Run the outcome and breed group-count pipelines.
//!
//! # Invariants
//! - Every CRUD or statistics call appends exactly one audit entry, unless it
//!   is rejected by a precondition (`Err` return) before touching the store.
//! - Audit writes are best-effort: a failed write is reported and never
//!   changes the primary result.
//! - Database failures surface as neutral values (`false`, `0`, empty list).
//! - Field-name validation failures inside `create`/`update` are downgraded
//!   to `false`/`0`, while empty payloads are returned as `Err`.

use crate::auth::password::{hash_password, verify_password, PasswordError, PasswordPolicy};
use crate::config::ShelterConfig;
use crate::logging::LoggingError;
use crate::docdb::{
    Client, ClientOptions, Collection, ConnectionString, DocDbError, FindOptions,
    InsertOneResult, Pipeline, Stage, UpdateResult,
};
use crate::model::audit::{AuditAction, AuditLogEntry, AuditOutcome, ANONYMOUS_USER};
use crate::model::document::{
    is_empty_payload, validate_document, Document, ValidationError, ID_FIELD,
};
use crate::model::stats::GroupCount;
use crate::model::user::{default_roles, AppUser};
use crate::repo::audit_repo::{AuditFilter, AuditRepository, DocAuditRepository};
use crate::repo::user_repo::{DocUserRepository, UserRepository};
use crate::repo::{from_document, RepoError};
use chrono::Utc;
use log::{error, info, warn};
use serde_json::{json, Value};
use std::borrow::Cow;
use thiserror::Error;

pub const DATABASE_NAME: &str = "AAC";
pub const ANIMALS_COLLECTION: &str = "animals";
pub const USERS_COLLECTION: &str = "users";
pub const AUDIT_COLLECTION: &str = "audit_log";
pub const DEFAULT_BREED_LIMIT: u32 = 10;

const OUTCOME_FIELD: &str = "outcome_type";
const BREED_FIELD: &str = "breed";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to document database: {0}")]
    Connection(#[source] DocDbError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] DocDbError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
}

/// Store handle bound to the `animals`, `users` and `audit_log` collections.
///
/// The active session is per instance: `authenticate_user` needs `&mut self`,
/// so sharing one store between threads requires the caller's own lock.
pub struct ShelterStore {
    client: Client,
    password_policy: PasswordPolicy,
    current_user: Option<String>,
}

impl ShelterStore {
    /// Connects with default driver options (in-memory storage, 5 s timeout).
    pub fn connect(username: &str, password: &str, host: &str, port: u16) -> StoreResult<Self> {
        Self::connect_with_options(username, password, host, port, &ClientOptions::default())
    }

    /// Builds the `AAC` connection string, opens it and pings the server.
    ///
    /// # Errors
    /// Returns `StoreError::Connection` wrapping the driver cause when the
    /// connection string is invalid, storage cannot be opened, or the ping's
    /// credential check fails.
    pub fn connect_with_options(
        username: &str,
        password: &str,
        host: &str,
        port: u16,
        options: &ClientOptions,
    ) -> StoreResult<Self> {
        let uri = ConnectionString::new(username, password, host, port, DATABASE_NAME);
        let client = Client::connect(&uri.to_string(), options).map_err(|err| {
            error!(
                "event=store_connect module=store status=error uri={} error={}",
                uri.redacted(),
                err
            );
            StoreError::Connection(err)
        })?;

        Ok(Self {
            client,
            password_policy: options.password_policy,
            current_user: None,
        })
    }

    /// Starts the configured file logger, then connects with the
    /// connection and auth sections of `config`.
    ///
    /// # Errors
    /// `Logging` when the logging section cannot be applied, otherwise as
    /// [`ShelterStore::connect_with_options`].
    pub fn from_config(config: &ShelterConfig) -> StoreResult<Self> {
        config.logging.init()?;
        let connection = &config.connection;
        Self::connect_with_options(
            &connection.username,
            &connection.password,
            &connection.host,
            connection.port,
            &config.client_options(),
        )
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Username of the last successful `authenticate_user`, if any.
    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    // ---------------------------------------------------------------------
    // Application users
    // ---------------------------------------------------------------------

    /// Creates an application user; `roles` defaults to `["user"]`.
    ///
    /// Returns `Ok(false)` without writing when the username is taken, and
    /// `Ok(false)` when the insert itself fails.
    ///
    /// # Errors
    /// - `Validation(MissingCredentials)` for an empty username or password.
    /// - `Repo`/`Database` when the existence lookup fails.
    /// - `Password` when hashing fails.
    pub fn create_app_user(
        &self,
        username: &str,
        password: &str,
        roles: Option<Vec<String>>,
    ) -> StoreResult<bool> {
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingCredentials.into());
        }

        let users = DocUserRepository::new(self.client.collection(USERS_COLLECTION)?);
        if users.find_by_username(username)?.is_some() {
            info!("event=user_create module=store status=skipped reason=already_exists");
            return Ok(false);
        }

        let hashed = hash_password(password, None, &self.password_policy)?;
        let user = AppUser {
            username: username.to_string(),
            password_hash: hashed.hash,
            salt: hashed.salt,
            roles: roles.unwrap_or_else(default_roles),
            created_at: Utc::now(),
        };

        match users.insert_user(&user) {
            Ok(acknowledged) => {
                info!(
                    "event=user_create module=store status=ok acknowledged={}",
                    acknowledged
                );
                Ok(acknowledged)
            }
            Err(err) => {
                warn!("event=user_create module=store status=error error={}", err);
                Ok(false)
            }
        }
    }

    /// Verifies credentials and, on success, makes `username` the session user.
    ///
    /// Unknown users and wrong passwords are indistinguishable to the caller.
    pub fn authenticate_user(&mut self, username: &str, password: &str) -> bool {
        let lookup = self
            .client
            .collection(USERS_COLLECTION)
            .map_err(RepoError::from)
            .and_then(|users| DocUserRepository::new(users).find_by_username(username));

        match lookup {
            Ok(Some(user)) if verify_password(password, &user.salt, &user.password_hash) => {
                self.current_user = Some(username.to_string());
                info!("event=user_auth module=store status=ok");
                true
            }
            Ok(_) => {
                warn!("event=user_auth module=store status=error error_code=invalid_credentials");
                false
            }
            Err(err) => {
                error!("event=user_auth module=store status=error error={}", err);
                false
            }
        }
    }

    // ---------------------------------------------------------------------
    // Animals CRUD
    // ---------------------------------------------------------------------

    /// Inserts one animal record.
    ///
    /// Returns whether the insert was acknowledged; invalid field names and
    /// database failures yield `Ok(false)` and a failed audit entry.
    ///
    /// # Errors
    /// `Validation(EmptyPayload)` when `data` is empty or null.
    pub fn create(&self, data: &Value) -> StoreResult<bool> {
        Ok(self.create_with_id(data)?.is_some())
    }

    /// Same as [`ShelterStore::create`], returning the stored `_id` instead of
    /// a flag.
    pub fn create_with_id(&self, data: &Value) -> StoreResult<Option<Value>> {
        if is_empty_payload(data) {
            return Err(ValidationError::EmptyPayload("data").into());
        }

        match self.insert_animal(data) {
            Ok(result) => {
                let mut logged = data.clone();
                if let Value::Object(fields) = &mut logged {
                    fields
                        .entry(ID_FIELD)
                        .or_insert_with(|| result.inserted_id.clone());
                }
                self.log_action(
                    AuditAction::Create,
                    AuditOutcome::completed(u64::from(result.acknowledged), result.acknowledged)
                        .with_data(logged),
                );
                Ok(result.acknowledged.then_some(result.inserted_id))
            }
            Err(err) => {
                warn!("event=animal_create module=store status=error error={}", err);
                self.log_action(
                    AuditAction::Create,
                    AuditOutcome::failed(&err).with_data(data.clone()),
                );
                Ok(None)
            }
        }
    }

    /// Returns every animal matching `query`, or an empty list on failure.
    ///
    /// The filter is handed to the driver as-is; no field-name validation is
    /// applied to read queries. A null query reads everything.
    pub fn read(&self, query: &Value) -> Vec<Document> {
        let filter = match_all_if_null(query);
        let found = self
            .animals()
            .and_then(|animals| Ok(animals.find(&filter, &FindOptions::default())?));

        match found {
            Ok(documents) => {
                self.log_action(
                    AuditAction::Read,
                    AuditOutcome::completed(documents.len() as u64, true).with_query(Some(query)),
                );
                documents
            }
            Err(err) => {
                warn!("event=animal_read module=store status=error error={}", err);
                self.log_action(
                    AuditAction::Read,
                    AuditOutcome::failed(&err).with_query(Some(query)),
                );
                Vec::new()
            }
        }
    }

    /// Sets the fields of `new_values` on every animal matching `query`.
    ///
    /// Returns how many documents actually changed; `0` on invalid field
    /// names or database failure.
    ///
    /// # Errors
    /// `Validation(EmptyPayload)` when `new_values` is empty or null.
    pub fn update(&self, query: &Value, new_values: &Value) -> StoreResult<u64> {
        if is_empty_payload(new_values) {
            return Err(ValidationError::EmptyPayload("new_values").into());
        }

        match self.update_animals(query, new_values) {
            Ok(result) => {
                self.log_action(
                    AuditAction::Update,
                    AuditOutcome::completed(result.modified_count, true)
                        .with_query(Some(query))
                        .with_data(new_values.clone()),
                );
                Ok(result.modified_count)
            }
            Err(err) => {
                warn!("event=animal_update module=store status=error error={}", err);
                self.log_action(
                    AuditAction::Update,
                    AuditOutcome::failed(&err)
                        .with_query(Some(query))
                        .with_data(new_values.clone()),
                );
                Ok(0)
            }
        }
    }

    /// Removes every animal matching `query` (null matches all); returns the
    /// deleted count, `0` on failure.
    pub fn delete(&self, query: &Value) -> u64 {
        let filter = match_all_if_null(query);
        let deleted = self
            .animals()
            .and_then(|animals| Ok(animals.delete_many(&filter)?));

        match deleted {
            Ok(result) => {
                self.log_action(
                    AuditAction::Delete,
                    AuditOutcome::completed(result.deleted_count, true).with_query(Some(query)),
                );
                result.deleted_count
            }
            Err(err) => {
                warn!("event=animal_delete module=store status=error error={}", err);
                self.log_action(
                    AuditAction::Delete,
                    AuditOutcome::failed(&err).with_query(Some(query)),
                );
                0
            }
        }
    }

    // ---------------------------------------------------------------------
    // Dashboard statistics
    // ---------------------------------------------------------------------

    /// Animal counts per `outcome_type`, most frequent first.
    pub fn get_adoption_stats_by_outcome(&self, match_filter: Option<&Value>) -> Vec<GroupCount> {
        let pipeline = Pipeline::new()
            .match_optional(non_empty(match_filter))
            .stage(Stage::Group {
                by: OUTCOME_FIELD.to_string(),
            })
            .stage(Stage::SortByCount { descending: true });

        self.run_stats(AuditAction::AggregateOutcomeStats, match_filter, None, &pipeline)
    }

    /// The `limit` most frequent breeds with their counts.
    pub fn get_adoption_stats_by_breed(
        &self,
        match_filter: Option<&Value>,
        limit: u32,
    ) -> Vec<GroupCount> {
        let pipeline = Pipeline::new()
            .match_optional(non_empty(match_filter))
            .stage(Stage::Group {
                by: BREED_FIELD.to_string(),
            })
            .stage(Stage::SortByCount { descending: true })
            .stage(Stage::Limit(limit));

        self.run_stats(
            AuditAction::AggregateBreedStats,
            match_filter,
            Some(json!({ "limit": limit })),
            &pipeline,
        )
    }

    // ---------------------------------------------------------------------
    // Audit trail
    // ---------------------------------------------------------------------

    /// Audit entries matching `filter`, newest first. Not itself audited.
    pub fn audit_trail(&self, filter: &AuditFilter) -> StoreResult<Vec<AuditLogEntry>> {
        let audit = DocAuditRepository::new(self.client.collection(AUDIT_COLLECTION)?);
        Ok(audit.query(filter)?)
    }

    fn log_action(&self, action: AuditAction, outcome: AuditOutcome) {
        let entry = AuditLogEntry {
            timestamp: Utc::now(),
            action,
            user: self
                .current_user
                .clone()
                .unwrap_or_else(|| ANONYMOUS_USER.to_string()),
            query: outcome.query,
            data: outcome.data,
            result_count: Some(outcome.result_count),
            success: outcome.success,
            error: outcome.error,
        };

        let written = self
            .client
            .collection(AUDIT_COLLECTION)
            .map_err(RepoError::from)
            .and_then(|audit| DocAuditRepository::new(audit).append(&entry));

        if let Err(err) = written {
            warn!(
                "event=audit_write module=store status=error action={} error={}",
                action.as_str(),
                err
            );
        }
    }

    fn animals(&self) -> StoreResult<Collection<'_>> {
        Ok(self.client.collection(ANIMALS_COLLECTION)?)
    }

    fn insert_animal(&self, data: &Value) -> StoreResult<InsertOneResult> {
        let document = validate_document(data)?;
        Ok(self.animals()?.insert_one(document)?)
    }

    fn update_animals(&self, query: &Value, new_values: &Value) -> StoreResult<UpdateResult> {
        let set = validate_document(new_values)?;
        Ok(self.animals()?.update_many(query, set)?)
    }

    fn run_stats(
        &self,
        action: AuditAction,
        match_filter: Option<&Value>,
        data: Option<Value>,
        pipeline: &Pipeline,
    ) -> Vec<GroupCount> {
        let groups = self
            .animals()
            .and_then(|animals| Ok(animals.aggregate(pipeline)?))
            .and_then(|groups| {
                groups
                    .into_iter()
                    .map(|group| from_document::<GroupCount>(group).map_err(StoreError::from))
                    .collect::<StoreResult<Vec<_>>>()
            });

        let (groups, outcome) = match groups {
            Ok(groups) => {
                let outcome = AuditOutcome::completed(groups.len() as u64, true);
                (groups, outcome)
            }
            Err(err) => {
                warn!(
                    "event=animal_stats module=store status=error action={} error={}",
                    action.as_str(),
                    err
                );
                (Vec::new(), AuditOutcome::failed(&err))
            }
        };

        let outcome = outcome.with_query(match_filter);
        let outcome = match data {
            Some(data) => outcome.with_data(data),
            None => outcome,
        };
        self.log_action(action, outcome);
        groups
    }
}

/// A null query selects every document, like `{}`.
fn match_all_if_null(query: &Value) -> Cow<'_, Value> {
    match query {
        Value::Null => Cow::Owned(Value::Object(Document::new())),
        other => Cow::Borrowed(other),
    }
}

fn non_empty(filter: Option<&Value>) -> Option<&Value> {
    filter.filter(|filter| !is_empty_payload(filter))
}
