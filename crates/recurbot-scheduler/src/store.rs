//! Key-value store backends.
//!
//! `MemoryStore` keeps everything in a map and is what tests run on.
//! `SqliteStore` persists one JSON document per key and survives restarts.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use recurbot_core::config::StoreConfig;
use recurbot_core::error::{RecurbotError, Result};
use recurbot_core::traits::KvStore;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde_json::Value;
use tokio::sync::RwLock;

/// In-process store.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

}

#[async_trait]
impl KvStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.data.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.data.write().await.remove(key);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&Value>,
        new: Value,
    ) -> Result<bool> {
        let mut data = self.data.write().await;
        if data.get(key) != expected {
            return Ok(false);
        }
        data.insert(key.to_string(), new);
        Ok(true)
    }
}

/// SQLite-backed store: `kv(key TEXT PRIMARY KEY, value TEXT)`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the store database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| RecurbotError::Store(format!("DB open error: {e}")))?;
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RecurbotError::Store(format!("DB open error: {e}")))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        // WAL is unavailable for :memory:, ignore the failure there
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .map_err(|e| RecurbotError::Store(format!("Migration: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RecurbotError::Store(format!("Lock: {e}")))
    }

    fn read(conn: &Connection, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .map_err(|e| RecurbotError::Store(format!("Get '{key}': {e}")))?;
        raw.map(|s| {
            serde_json::from_str(&s)
                .map_err(|e| RecurbotError::Store(format!("Corrupt value at '{key}': {e}")))
        })
        .transpose()
    }

    fn write(conn: &Connection, key: &str, value: &Value) -> Result<()> {
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value.to_string()],
        )
        .map_err(|e| RecurbotError::Store(format!("Put '{key}': {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.lock()?;
        Self::read(&conn, key)
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let conn = self.lock()?;
        Self::write(&conn, key, &value)?;
        tracing::debug!("💾 Stored '{key}'");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", [key])
            .map_err(|e| RecurbotError::Store(format!("Delete '{key}': {e}")))?;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&Value>,
        new: Value,
    ) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RecurbotError::Store(format!("Begin: {e}")))?;
        let current = Self::read(&tx, key)?;
        if current.as_ref() != expected {
            return Ok(false);
        }
        Self::write(&tx, key, &new)?;
        tx.commit()
            .map_err(|e| RecurbotError::Store(format!("Commit: {e}")))?;
        Ok(true)
    }
}

/// Build the store selected by configuration.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn KvStore>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "sqlite" => {
            let path = config.resolved_path();
            let store = SqliteStore::open(&path)?;
            tracing::info!("💾 Template store: {}", path.display());
            Ok(Arc::new(store))
        }
        other => Err(RecurbotError::Config(format!(
            "Unknown store backend '{other}' (expected 'sqlite' or 'memory')"
        ))),
    }
}
