//! Proxy record storage.
//!
//! # Data Flow
//! ```text
//! handler (on the blocking pool)
//!     → ProxyStore trait (get / get_all / set / insert_new)
//!     → memory.rs (HashMap behind a single Mutex)
//!       or sqlite.rs (single-file database, one `proxies` table)
//! ```
//!
//! # Design Decisions
//! - Stores are plain key-value primitives: `set` always overwrites
//! - Duplicate-registration policy lives in the handlers; stores only offer
//!   the atomic `insert_new` primitive it needs
//! - "Not found" is `Ok(None)`, never an error

pub mod memory;
pub mod record;
pub mod sqlite;

use std::path::PathBuf;

use thiserror::Error;

pub use memory::InMemoryStore;
pub use record::{normalize_hostname, ProxyUrl, ProxyUrlError};
pub use sqlite::SqliteStore;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open proxy database at {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to {op}: {source}")]
    Database {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("stored proxy for {host} is not a valid URL: {source}")]
    Corrupt {
        host: String,
        #[source]
        source: ProxyUrlError,
    },

    #[error("proxy store is closed")]
    Closed,

    #[error("proxy store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Key-value storage of proxy URLs keyed by hostname.
///
/// Implementations must be safe to share between request tasks.
pub trait ProxyStore: Send + Sync {
    /// Look up the proxy registered under `hostname`.
    fn get(&self, hostname: &str) -> Result<Option<ProxyUrl>, StoreError>;

    /// Every stored proxy, in no particular order.
    fn get_all(&self) -> Result<Vec<ProxyUrl>, StoreError>;

    /// Store `proxy` under `hostname`, replacing any existing record.
    fn set(&self, hostname: &str, proxy: ProxyUrl) -> Result<(), StoreError>;

    /// Store `proxy` under `hostname` only if nothing is registered there yet.
    ///
    /// Returns `false`, leaving the existing record untouched, when the
    /// hostname is already taken. The check and the write are atomic.
    fn insert_new(&self, hostname: &str, proxy: ProxyUrl) -> Result<bool, StoreError>;

    /// Release backing resources. Later calls may fail with [`StoreError::Closed`].
    fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Short backend name for logs.
    fn kind(&self) -> &'static str;
}
