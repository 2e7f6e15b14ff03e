//! Versioned key-value store holding one JSON document per fixed key.
//!
//! Every write is a compare-and-set against the version the writer last
//! read, so two overlapping read-modify-write cycles on the same key cannot
//! silently clobber each other: the loser gets [`StoreError::Conflict`] and
//! [`update_collection`] re-reads and retries.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::AsyncDbConnection;

pub const ALLIANCES: &str = "aniquem-alliances";
pub const EMAILS: &str = "aniquem-emails";
pub const EVENTS: &str = "aniquem-events";
pub const VOLUNTEERS: &str = "aniquem-volunteers";
pub const USERS: &str = "aniquem-users";
pub const SESSION_USER: &str = "aniquem-user";
pub const EMAIL_RELAY: &str = "aniquem-email-relay";
pub const OUTBOX: &str = "aniquem-outbox";

const MAX_WRITE_ATTEMPTS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Version conflict on {key}: expected {expected}, found {actual}")]
    Conflict {
        key: String,
        expected: u64,
        actual: u64,
    },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(e: anyhow::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    /// Starts at 1 on first write; 0 means the key is absent
    pub version: u64,
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Versioned<String>>, StoreError>;

    /// Writes `value` if the stored version still equals `expected_version`
    /// (0 for a key that must not exist yet) and returns the new version.
    async fn put(&self, key: &str, value: String, expected_version: u64)
        -> Result<u64, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

pub struct SqliteStore {
    db: AsyncDbConnection,
}

impl SqliteStore {
    pub fn new(db: AsyncDbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned<String>>, StoreError> {
        let conn = self.db.lock().await?;

        let row = conn
            .query_row(
                "SELECT value, version FROM kv_store WHERE key = ?1",
                params![key],
                |row| {
                    Ok(Versioned {
                        value: row.get::<_, String>(0)?,
                        version: row.get::<_, i64>(1)? as u64,
                    })
                },
            )
            .optional()?;

        Ok(row)
    }

    async fn put(
        &self,
        key: &str,
        value: String,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut conn = self.db.lock().await?;
        // IMMEDIATE takes the write lock before the version read
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: u64 = tx
            .query_row(
                "SELECT version FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(|version| version as u64)
            .unwrap_or(0);

        if current != expected_version {
            return Err(StoreError::Conflict {
                key: key.to_string(),
                expected: expected_version,
                actual: current,
            });
        }

        let next = current + 1;
        let now = chrono::Utc::now().timestamp_millis();

        tx.execute(
            "INSERT INTO kv_store (key, value, version, updated_at) VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    version = excluded.version,
                    updated_at = excluded.updated_at",
            params![key, value, next as i64, now],
        )?;
        tx.commit()?;

        Ok(next)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.db.lock().await?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Process-local store, used in tests and when no database is wanted
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Versioned<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned<String>>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(
        &self,
        key: &str,
        value: String,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut entries = self.entries.lock().await;
        let current = entries.get(key).map(|entry| entry.version).unwrap_or(0);

        if current != expected_version {
            return Err(StoreError::Conflict {
                key: key.to_string(),
                expected: expected_version,
                actual: current,
            });
        }

        let next = current + 1;
        entries.insert(
            key.to_string(),
            Versioned {
                value,
                version: next,
            },
        );
        Ok(next)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// A record type persisted as one JSON array under a fixed key
pub trait StoredCollection: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KEY: &'static str;

    /// Contents used when the key is missing or holds malformed JSON
    fn seed() -> Vec<Self> {
        Vec::new()
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub version: u64,
}

pub async fn load_collection<T: StoredCollection>(
    store: &dyn KeyValueStore,
) -> Result<Snapshot<T>, StoreError> {
    match store.get(T::KEY).await? {
        None => Ok(Snapshot {
            items: T::seed(),
            version: 0,
        }),
        Some(stored) => match serde_json::from_str::<Vec<T>>(&stored.value) {
            Ok(items) => Ok(Snapshot {
                items,
                version: stored.version,
            }),
            Err(e) => {
                tracing::warn!("Malformed data under {}, falling back to seed: {}", T::KEY, e);
                // Keep the stored version so the next write replaces the bad document
                Ok(Snapshot {
                    items: T::seed(),
                    version: stored.version,
                })
            }
        },
    }
}

/// Read-modify-write of a whole collection, retried on version conflicts.
///
/// `mutate` may run more than once and must only depend on the items it is
/// handed.
pub async fn update_collection<T, R, F>(
    store: &dyn KeyValueStore,
    mut mutate: F,
) -> Result<R, StoreError>
where
    T: StoredCollection,
    F: FnMut(&mut Vec<T>) -> R + Send,
    R: Send,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut snapshot = load_collection::<T>(store).await?;
        let result = mutate(&mut snapshot.items);
        let json = serde_json::to_string(&snapshot.items)?;

        match store.put(T::KEY, json, snapshot.version).await {
            Ok(_) => return Ok(result),
            Err(StoreError::Conflict { .. }) if attempt < MAX_WRITE_ATTEMPTS => {
                tracing::debug!("Write conflict on {}, retrying (attempt {})", T::KEY, attempt);
            }
            Err(e) => return Err(e),
        }
    }
}

pub async fn load_object<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(stored) = store.get(key).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&stored.value) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("Malformed data under {}, ignoring it: {}", key, e);
            Ok(None)
        }
    }
}

/// Unconditional write of a single-object key
pub async fn save_object<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(value)?;
    let mut attempt = 0;
    loop {
        attempt += 1;
        let version = store.get(key).await?.map(|v| v.version).unwrap_or(0);
        match store.put(key, json.clone(), version).await {
            Ok(_) => return Ok(()),
            Err(StoreError::Conflict { .. }) if attempt < MAX_WRITE_ATTEMPTS => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Millisecond timestamp id, bumped past the largest existing id on collision
pub fn next_id(existing: impl IntoIterator<Item = i64>, now_ms: i64) -> i64 {
    match existing.into_iter().max() {
        Some(max) if max >= now_ms => max + 1,
        _ => now_ms,
    }
}
