//! Client handle: storage resolution, liveness and credential ping.
//!
//! # Invariants
//! - A `Client` is only handed out after a successful ping.
//! - The first principal to connect to an empty database is registered;
//!   every later connection must present matching credentials.

use super::collection::Collection;
use super::uri::ConnectionString;
use super::{DocDbError, DocResult};
use crate::auth::password::{hash_password, verify_password, PasswordPolicy};
use crate::db::{open_db, open_db_in_memory, DEFAULT_BUSY_TIMEOUT};
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

static COLLECTION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").expect("valid collection name regex"));

/// Tables owned by the engine itself rather than by callers.
const RESERVED_TABLES: &[&str] = &["principals"];

/// Driver settings that are not part of the connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Root directory for database files; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    /// Used unless the connection string carries `serverSelectionTimeoutMS`.
    pub server_selection_timeout: Duration,
    /// Work factors for hashing newly registered principals.
    pub password_policy: PasswordPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            data_dir: None,
            server_selection_timeout: DEFAULT_BUSY_TIMEOUT,
            password_policy: PasswordPolicy::default(),
        }
    }
}

impl ClientOptions {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    pub fn with_password_policy(mut self, policy: PasswordPolicy) -> Self {
        self.password_policy = policy;
        self
    }

    pub fn with_server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = timeout;
        self
    }
}

/// Open, authenticated connection to one database.
pub struct Client {
    conn: Connection,
    uri: ConnectionString,
    password_policy: PasswordPolicy,
}

impl Client {
    /// Parses `uri`, opens the database it names and pings it.
    pub fn connect(uri: &str, options: &ClientOptions) -> DocResult<Self> {
        Self::connect_with(ConnectionString::parse(uri)?, options)
    }

    /// Opens the database named by an already parsed connection string and
    /// pings it.
    ///
    /// # Errors
    /// - `Storage` when the database cannot be opened or migrated.
    /// - `AuthenticationFailed` when the credentials do not match.
    pub fn connect_with(uri: ConnectionString, options: &ClientOptions) -> DocResult<Self> {
        let started_at = Instant::now();
        info!(
            "event=client_connect module=docdb status=start uri={}",
            uri.redacted()
        );

        let timeout = uri
            .server_selection_timeout
            .unwrap_or(options.server_selection_timeout);
        let opened = match &options.data_dir {
            Some(data_dir) => open_db(storage_path(data_dir, &uri), timeout),
            None => open_db_in_memory(timeout),
        };
        let conn = opened.inspect_err(|err| {
            error!(
                "event=client_connect module=docdb status=error duration_ms={} error_code=open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
        })?;

        let client = Self {
            conn,
            uri,
            password_policy: options.password_policy,
        };
        client.ping()?;

        info!(
            "event=client_connect module=docdb status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(client)
    }

    /// Liveness check followed by a credential check.
    pub fn ping(&self) -> DocResult<()> {
        self.conn
            .query_row("SELECT 1;", [], |row| row.get::<_, i64>(0))?;
        self.authenticate_principal()
    }

    pub fn connection_string(&self) -> &ConnectionString {
        &self.uri
    }

    pub fn database_name(&self) -> &str {
        &self.uri.database
    }

    /// Returns a handle for the named collection.
    ///
    /// # Errors
    /// Returns `InvalidCollectionName` for names that are not plain
    /// identifiers or that belong to the engine.
    pub fn collection(&self, name: &str) -> DocResult<Collection<'_>> {
        if !COLLECTION_NAME_RE.is_match(name)
            || name.starts_with("sqlite_")
            || RESERVED_TABLES.contains(&name)
        {
            return Err(DocDbError::InvalidCollectionName(name.to_string()));
        }
        Ok(Collection::new(&self.conn, name))
    }

    /// Raw connection access for maintenance and tests.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn authenticate_principal(&self) -> DocResult<()> {
        let username = self.uri.username.as_str();
        let stored = self
            .conn
            .query_row(
                "SELECT password_hash, salt FROM principals WHERE username = ?1;",
                [username],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        match stored {
            Some((password_hash, salt)) => {
                if verify_password(&self.uri.password, &salt, &password_hash) {
                    Ok(())
                } else {
                    warn!("event=client_auth module=docdb status=error error_code=bad_credentials");
                    Err(DocDbError::AuthenticationFailed {
                        username: username.to_string(),
                    })
                }
            }
            None => {
                let registered: i64 =
                    self.conn
                        .query_row("SELECT COUNT(*) FROM principals;", [], |row| row.get(0))?;
                if registered > 0 {
                    warn!("event=client_auth module=docdb status=error error_code=unknown_principal");
                    return Err(DocDbError::AuthenticationFailed {
                        username: username.to_string(),
                    });
                }

                let hashed = hash_password(&self.uri.password, None, &self.password_policy)?;
                self.conn.execute(
                    "INSERT INTO principals (username, password_hash, salt) VALUES (?1, ?2, ?3);",
                    params![username, hashed.hash, hashed.salt],
                )?;
                info!("event=principal_bootstrap module=docdb status=ok");
                Ok(())
            }
        }
    }
}

fn storage_path(data_dir: &Path, uri: &ConnectionString) -> PathBuf {
    data_dir
        .join(format!("{}_{}", uri.host, uri.port))
        .join(format!("{}.sqlite3", uri.database))
}

#[cfg(test)]
mod tests {
    use super::{storage_path, Client, ClientOptions};
    use crate::auth::password::PasswordPolicy;
    use crate::docdb::{ConnectionString, DocDbError};
    use std::path::Path;

    fn options() -> ClientOptions {
        ClientOptions::in_memory().with_password_policy(PasswordPolicy {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
    }

    #[test]
    fn storage_path_is_keyed_by_host_port_and_database() {
        let uri = ConnectionString::new("u", "p", "db.local", 4000, "AAC");
        assert_eq!(
            storage_path(Path::new("/data"), &uri),
            Path::new("/data/db.local_4000/AAC.sqlite3")
        );
    }

    #[test]
    fn in_memory_connect_pings() {
        let client = Client::connect("docdb://aac:pw@localhost:27017/AAC", &options()).unwrap();
        client.ping().unwrap();
        assert_eq!(client.database_name(), "AAC");
    }

    #[test]
    fn collection_names_are_checked() {
        let client = Client::connect("docdb://aac:pw@localhost:27017/AAC", &options()).unwrap();
        assert!(client.collection("animals").is_ok());
        for bad in ["principals", "sqlite_master", "animals; DROP TABLE users", ""] {
            assert!(matches!(
                client.collection(bad),
                Err(DocDbError::InvalidCollectionName(_))
            ));
        }
    }
}
