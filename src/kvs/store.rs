//! High-level `Kvs` handle over backend implementations.
//!
//! Adds typed reads and writes on top of the JSON-only [`KvsBackend`]
//! surface. Values are validated before any backend is touched, so a
//! rejected write never changes the store.

use super::backend::{KeyPage, KvsBackend};
use super::bulk::json_type;
use super::error::{Error, Result};
use super::memory::{MemoryBackend, MemoryTable};
use super::redis_store::{RedisBackend, RedisPool};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Key-value store handle.
///
/// Wraps a `KvsBackend` implementation and provides a consistent API
/// regardless of the underlying storage mechanism.
///
/// # Thread Safety
///
/// `Kvs` is `Clone` and can be shared across tasks. Clones share the same
/// backend instance.
///
/// # Example
///
/// ```ignore
/// use learning_observer::kvs::{Kvs, MemoryTable};
///
/// let kvs = Kvs::memory(MemoryTable::new());
/// kvs.set("student:42", &serde_json::json!({"words": 310})).await?;
///
/// if let Some(doc) = kvs.get("student:42").await? {
///     println!("{doc}");
/// }
/// ```
#[derive(Clone)]
pub struct Kvs {
    backend: Arc<dyn KvsBackend>,
}

impl Kvs {
    /// Creates a handle backed by the given in-memory table.
    pub fn memory(table: MemoryTable) -> Self {
        Self::custom(MemoryBackend::new(table))
    }

    /// Creates a handle backed by Redis with a TTL on every write.
    pub fn redis_ephemeral(pool: RedisPool, expiry: Duration) -> Self {
        Self::custom(RedisBackend::ephemeral(pool, expiry))
    }

    /// Creates a handle backed by Redis without expiry.
    pub fn redis(pool: RedisPool) -> Self {
        Self::custom(RedisBackend::persistent(pool))
    }

    /// Creates a handle over a custom backend.
    pub fn custom<B: KvsBackend>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Returns the backend name (`stub`, `redis_ephemeral`, `redis`, ...).
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Retrieves a value by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.backend.get(key).await
    }

    /// Retrieves a value and deserializes it into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Deserialization`] if the stored value does not fit
    /// `T`, or any error from [`get`](Self::get).
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .await?
            .map(|value| {
                serde_json::from_value(value).map_err(|source| Error::Deserialization {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Serializes `value` to JSON and stores it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if `value` is not JSON-serializable
    /// (the store is left untouched), or any backend error.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|source| Error::InvalidValue {
            key: key.to_string(),
            source,
        })?;
        self.backend.set(key, value).await
    }

    /// Stores an already-built JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn set_value(&self, key: &str, value: Value) -> Result<()> {
        self.backend.set(key, value).await
    }

    /// Stores a value whose key arrived as an arbitrary JSON value.
    ///
    /// Only string keys are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] for non-string keys (the store is left
    /// untouched), or any backend error.
    pub async fn set_untyped(&self, key: &Value, value: Value) -> Result<()> {
        let Value::String(key) = key else {
            return Err(Error::InvalidKey {
                found: json_type(key).to_string(),
            });
        };
        self.backend.set(key, value).await
    }

    /// Lists every key, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn keys(&self) -> Result<Vec<String>> {
        self.backend.keys().await
    }

    /// Returns one page of keys after the `after` cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn keys_page(&self, after: Option<&str>, limit: usize) -> Result<KeyPage> {
        self.backend.keys_page(after, limit).await
    }

    /// Dumps the whole store, optionally writing it to `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error if any read fails or the file cannot be written.
    pub async fn dump(&self, destination: Option<&Path>) -> Result<Map<String, Value>> {
        self.backend.dump(destination).await
    }

    /// Loads a dump file into the store, returning the entry count.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or malformed, or a write
    /// fails. Entries written before the failure are kept.
    pub async fn load(&self, source: &Path) -> Result<usize> {
        self.backend.load(source).await
    }

    /// Clears the store (in-memory backend only).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] on backends without clear.
    pub async fn clear(&self) -> Result<()> {
        self.backend.clear().await
    }
}

impl std::fmt::Debug for Kvs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kvs")
            .field("backend", &self.backend.name())
            .finish()
    }
}
