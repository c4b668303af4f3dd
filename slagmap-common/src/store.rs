//! Key-value storage port for the slag catalog
//!
//! The catalog only needs string values under string keys. Two backends:
//! - [`MemoryStore`]: in-process map, shared between clones of the handle
//! - [`SqliteStore`]: the `settings` table of an SQLite database

use crate::{Error, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Load/save contract used by [`SlagCatalog`](crate::SlagCatalog)
///
/// Each `save` is all-or-nothing: either the whole value is stored under the
/// key or the call fails and the previous value is left in place.
pub trait SlagStore {
    /// Read the value stored under `key`; `Ok(None)` if the key is missing
    fn load(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Replace the value stored under `key`
    fn save(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;
}

/// In-memory store
///
/// Clones share the same underlying map, so a test can hand one clone to a
/// catalog and inspect the stored values through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value under `key`, bypassing the async contract
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    /// Number of successful `save` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))
    }
}

impl SlagStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Store backed by the `settings` key/value table
///
/// The table is created by [`init_database`](crate::db::init_database).
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl SlagStore for SqliteStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT value FROM settings WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        // NULL value reads the same as a missing row
        Ok(row.and_then(|(value,)| value))
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        debug!("Saved setting '{}' ({} bytes)", key, value.len());
        Ok(())
    }
}
