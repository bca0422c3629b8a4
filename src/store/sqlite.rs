//! Durable single-file store backed by SQLite.
//!
//! # Responsibilities
//! - Create the `proxies` table on first open
//! - Hold an exclusive lock on the file until [`SqliteStore::close`]
//! - Run every operation in its own transaction
//!
//! A second process (or a second open in this one) waits up to the
//! configured open timeout for the lock and then fails.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

use crate::store::{ProxyStore, ProxyUrl, StoreError};

pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(3);

const CREATE_TABLE: &str = "BEGIN EXCLUSIVE;
     CREATE TABLE IF NOT EXISTS proxies (
         host TEXT PRIMARY KEY NOT NULL,
         url  TEXT NOT NULL
     );
     COMMIT;";

const GET_OP: &str = "get proxy details";
const LIST_OP: &str = "list proxies";
const SET_OP: &str = "set proxy";
const INSERT_OP: &str = "register proxy";
const CLOSE_OP: &str = "close proxy database";

/// SQLite-backed [`ProxyStore`].
pub struct SqliteStore {
    path: PathBuf,
    // `Connection` is `Send` but not `Sync`; `None` once closed.
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    ///
    /// Fails if the file cannot be created, the table cannot be created, or
    /// another handle keeps the file locked for longer than `open_timeout`.
    pub fn open(path: impl AsRef<Path>, open_timeout: Duration) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        tracing::info!(path = %path.display(), "Opening proxy database");

        let open_err = |source| StoreError::Open {
            path: path.clone(),
            source,
        };

        let conn = Connection::open(&path).map_err(open_err)?;
        conn.busy_timeout(open_timeout).map_err(open_err)?;
        conn.pragma_update_and_check(None, "locking_mode", "EXCLUSIVE", |row| {
            row.get::<_, String>(0)
        })
        .map_err(open_err)?;
        conn.execute_batch(CREATE_TABLE).map_err(open_err)?;

        Ok(Self {
            path,
            conn: Mutex::new(Some(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` inside a transaction, committing on success.
    fn with_transaction<T>(
        &self,
        op: &'static str,
        behavior: TransactionBehavior,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.lock();
        let conn = guard.as_mut().ok_or(StoreError::Closed)?;

        let tx = conn
            .transaction_with_behavior(behavior)
            .map_err(db_err(op))?;
        let value = f(&tx)?;
        tx.commit().map_err(db_err(op))?;
        Ok(value)
    }
}

fn db_err(op: &'static str) -> impl Fn(rusqlite::Error) -> StoreError {
    move |source| StoreError::Database { op, source }
}

fn decode(host: &str, stored: &str) -> Result<ProxyUrl, StoreError> {
    ProxyUrl::parse(stored).map_err(|source| StoreError::Corrupt {
        host: host.to_owned(),
        source,
    })
}

impl ProxyStore for SqliteStore {
    fn get(&self, hostname: &str) -> Result<Option<ProxyUrl>, StoreError> {
        self.with_transaction(GET_OP, TransactionBehavior::Deferred, |tx| {
            let stored: Option<String> = tx
                .query_row(
                    "SELECT url FROM proxies WHERE host = ?1",
                    [hostname],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_err(GET_OP))?;

            stored.map(|url| decode(hostname, &url)).transpose()
        })
    }

    fn get_all(&self) -> Result<Vec<ProxyUrl>, StoreError> {
        self.with_transaction(LIST_OP, TransactionBehavior::Deferred, |tx| {
            let mut stmt = tx
                .prepare("SELECT host, url FROM proxies")
                .map_err(db_err(LIST_OP))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(db_err(LIST_OP))?;

            let mut proxies = Vec::new();
            for row in rows {
                let (host, url) = row.map_err(db_err(LIST_OP))?;
                proxies.push(decode(&host, &url)?);
            }
            Ok(proxies)
        })
    }

    fn set(&self, hostname: &str, proxy: ProxyUrl) -> Result<(), StoreError> {
        self.with_transaction(SET_OP, TransactionBehavior::Immediate, |tx| {
            tx.execute(
                "INSERT OR REPLACE INTO proxies (host, url) VALUES (?1, ?2)",
                params![hostname, proxy.to_string()],
            )
            .map_err(db_err(SET_OP))?;
            Ok(())
        })
    }

    fn insert_new(&self, hostname: &str, proxy: ProxyUrl) -> Result<bool, StoreError> {
        self.with_transaction(INSERT_OP, TransactionBehavior::Immediate, |tx| {
            let inserted = tx
                .execute(
                    "INSERT OR IGNORE INTO proxies (host, url) VALUES (?1, ?2)",
                    params![hostname, proxy.to_string()],
                )
                .map_err(db_err(INSERT_OP))?;
            Ok(inserted == 1)
        })
    }

    fn close(&self) -> Result<(), StoreError> {
        let Some(conn) = self.lock().take() else {
            return Ok(());
        };

        tracing::info!(path = %self.path.display(), "Closing proxy database");
        conn.close().map_err(|(_, source)| StoreError::Database {
            op: CLOSE_OP,
            source,
        })
    }

    fn kind(&self) -> &'static str {
        "sqlite"
    }
}
