//! Durable key/value storage, one JSON document per key.
//!
//! Both stores persist through the `KeyValueStore` trait so that tests
//! can run against `MemoryStorage` while the application uses the
//! SQLite-backed `SqliteStorage`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;

/// Local key/value storage. Values are JSON text.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError>;
    fn remove(&self, key: &str) -> Result<(), DatabaseError>;

    /// Write several keys atomically: either every entry lands or none does.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), DatabaseError>;
}

/// Read and deserialize the value at `key`. `None` when the key is absent.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, DatabaseError> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| DatabaseError::Serialization {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Serialize `value` for storage under `key`.
pub fn to_json<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|source| DatabaseError::Serialization {
        key: key.to_string(),
        source,
    })
}

/// Serialize and write `value` under `key`.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), DatabaseError> {
    let raw = to_json(key, value)?;
    store.set(key, &raw)
}

// ═══════════════════════════════════════════════════════════
// SQLite-backed storage
// ═══════════════════════════════════════════════════════════

/// Key/value storage in a single SQLite table (`kv_store`).
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the storage file at `path`.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_database(path)?))
    }

    /// In-memory SQLite storage (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    /// Wrap an already-migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<R>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<R, DatabaseError>,
    ) -> Result<R, DatabaseError> {
        let mut guard = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&mut guard)
    }
}

const UPSERT_SQL: &str = "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";

impl KeyValueStore for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        self.with_conn(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM kv_store WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.with_conn(|conn| {
            conn.execute(UPSERT_SQL, params![key, value, Utc::now().to_rfc3339()])?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<(), DatabaseError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
            Ok(())
        })
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), DatabaseError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let stamp = Utc::now().to_rfc3339();
            for (key, value) in entries {
                tx.execute(UPSERT_SQL, params![key, value, stamp])?;
            }
            tx.commit()?;
            Ok(())
        })
    }
}

// ═══════════════════════════════════════════════════════════
// In-memory storage
// ═══════════════════════════════════════════════════════════

/// Volatile storage for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let map = self.entries.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let mut map = self.entries.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DatabaseError> {
        let mut map = self.entries.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        map.remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), DatabaseError> {
        let mut map = self.entries.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}
