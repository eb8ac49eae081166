//! Backend trait for the KVS.
//!
//! Defines the capability surface every storage backend offers. Callers
//! only ever talk to a store through this trait (usually via
//! [`Kvs`](super::Kvs)), never through backend-specific APIs.

use super::bulk;
use super::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;

/// Backend trait for JSON key-value storage.
///
/// All backends must be thread-safe (`Send + Sync`) for use with tokio.
/// Single-key `get`/`set` are atomic; nothing spanning several keys is.
#[async_trait]
pub trait KvsBackend: Send + Sync + 'static {
    /// Short backend name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Retrieves a value by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist (or has expired). The
    /// returned value is an independent copy of what is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails or the
    /// stored value is not valid JSON.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores a value, overwriting any existing value for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Lists every key currently present, sorted in byte order.
    ///
    /// Intended for development and debugging. Remote backends walk the
    /// whole keyspace to answer this.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Removes every entry from the store.
    ///
    /// Only the in-memory backend offers this; everything else returns
    /// [`Error::Unsupported`].
    ///
    /// # Errors
    ///
    /// Returns an error if the backend does not support clearing.
    async fn clear(&self) -> Result<()> {
        Err(Error::unsupported("clear", self.name()))
    }

    /// Returns up to `limit` keys that sort strictly after `after`.
    ///
    /// Pages follow the same order as [`keys`](Self::keys). `next` is set
    /// when more keys remain and should be passed back as `after`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn keys_page(&self, after: Option<&str>, limit: usize) -> Result<KeyPage> {
        let keys = self.keys().await?;
        Ok(KeyPage::paginate(keys, after, limit))
    }

    /// Reads the whole store into a single JSON object.
    ///
    /// When `destination` is given the object is also written there. This
    /// performs one read per key and is not meant for production stores.
    ///
    /// # Errors
    ///
    /// Returns an error if any read fails or the file cannot be written.
    async fn dump(&self, destination: Option<&Path>) -> Result<Map<String, Value>> {
        bulk::dump(self, destination).await
    }

    /// Writes every entry of a dump file into the store.
    ///
    /// Returns the number of entries written. A failure partway through
    /// leaves the entries written so far in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a write
    /// fails.
    async fn load(&self, source: &Path) -> Result<usize> {
        bulk::load(self, source).await
    }
}

/// One page of keys from [`KvsBackend::keys_page`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPage {
    /// Keys in this page, in store order.
    pub keys: Vec<String>,
    /// Cursor for the following page, `None` on the last page.
    pub next: Option<String>,
}

impl KeyPage {
    /// Cuts a page out of an already sorted key list.
    ///
    /// A `limit` of zero is treated as one so a paging loop always
    /// makes progress.
    pub(crate) fn paginate(sorted: Vec<String>, after: Option<&str>, limit: usize) -> Self {
        let limit = limit.max(1);
        let start = after.map_or(0, |after| sorted.partition_point(|k| k.as_str() <= after));

        let mut rest = sorted.into_iter().skip(start);
        let keys: Vec<String> = rest.by_ref().take(limit).collect();
        let next = if rest.next().is_some() {
            keys.last().cloned()
        } else {
            None
        };

        Self { keys, next }
    }

    /// Returns true if this is the final page.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}
