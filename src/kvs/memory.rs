//! In-memory KVS backend.
//!
//! Entries live in a [`MemoryTable`] that is injected at construction.
//! Every backend built from clones of the same table sees the same data,
//! while a fresh table gives a fully isolated store.

use super::backend::KvsBackend;
use super::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

/// Shared storage for in-memory backends.
///
/// Cloning is cheap and aliases the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryTable {
    data: Arc<DashMap<String, Value>>,
}

impl MemoryTable {
    /// Creates a new, empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if both handles point at the same table.
    pub fn same_table(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl std::fmt::Debug for MemoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTable")
            .field("entries", &self.data.len())
            .finish()
    }
}

/// In-memory key-value backend.
///
/// Data is lost when the process exits and entries never expire. Reads
/// hand out copies, so mutating a returned value never changes what is
/// stored.
///
/// # Example
///
/// ```ignore
/// use learning_observer::kvs::{MemoryBackend, MemoryTable};
///
/// let table = MemoryTable::new();
/// let a = MemoryBackend::new(table.clone());
/// let b = MemoryBackend::new(table);
/// a.set("hi", 5.into()).await?;
/// assert_eq!(b.get("hi").await?, Some(5.into()));
/// ```
#[derive(Clone, Debug)]
pub struct MemoryBackend {
    table: MemoryTable,
}

impl MemoryBackend {
    /// Creates a backend over the given shared table.
    pub fn new(table: MemoryTable) -> Self {
        Self { table }
    }

    /// Returns the table this backend reads and writes.
    pub fn table(&self) -> &MemoryTable {
        &self.table
    }
}

#[async_trait]
impl KvsBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.table.data.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.table.data.insert(key.to_string(), value);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .table
            .data
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }

    async fn clear(&self) -> Result<()> {
        self.table.data.clear();
        Ok(())
    }
}
