//! Redis-backed KVS backend.
//!
//! Values are stored as JSON strings. Two configurations exist: ephemeral
//! (every write carries a fixed TTL) and persistent (no TTL).
//!
//! Connections are made lazily through a shared [`RedisPool`]: building a
//! pool or a backend never touches the network, the first operation does.

use super::backend::KvsBackend;
use super::error::{Error, Result};
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::constants::MAX_EXPIRY_SECS;

const GET: &str = "GET";
const SET: &str = "SET";
const SCAN: &str = "SCAN";

/// Keys requested per SCAN round trip.
const SCAN_COUNT: usize = 500;

const MAX_EXPIRY_MILLIS: u64 = MAX_EXPIRY_SECS * 1000;

/// Lazily-connecting handle to a Redis server, shared by every backend
/// cloned from it.
///
/// Cloning is cheap; all clones share one connection.
#[derive(Clone)]
pub struct RedisPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    client: redis::Client,
    connection: Mutex<Option<ConnectionManager>>,
}

impl RedisPool {
    /// Creates a pool for the given URL without connecting.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn open(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            inner: Arc::new(PoolInner {
                client,
                connection: Mutex::new(None),
            }),
        })
    }

    /// Returns a connection, establishing it on first use.
    ///
    /// Concurrent callers are serialized on the pool lock, so at most one
    /// connection is ever made. The connection manager reconnects on its
    /// own after that; failures to connect are returned, not retried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the server cannot be reached.
    pub async fn ensure_connected(&self) -> Result<ConnectionManager> {
        let mut slot = self.inner.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let info = self.inner.client.get_connection_info();
        debug!(addr = %info.addr, "Connecting to redis");

        let config = ConnectionManagerConfig::new().set_number_of_retries(0);
        let conn = self
            .inner
            .client
            .get_connection_manager_with_config(config)
            .await?;

        *slot = Some(conn.clone());
        Ok(conn)
    }

    /// Returns true once a connection has been established.
    pub async fn is_connected(&self) -> bool {
        self.inner.connection.lock().await.is_some()
    }

    /// Returns true if both handles share the same connection slot.
    pub fn same_pool(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool")
            .field("addr", &self.inner.client.get_connection_info().addr)
            .finish_non_exhaustive()
    }
}

/// Redis key-value backend.
///
/// # Example
///
/// ```ignore
/// use learning_observer::kvs::{RedisBackend, RedisPool};
/// use std::time::Duration;
///
/// let pool = RedisPool::open("redis://127.0.0.1/")?;
/// let cache = RedisBackend::ephemeral(pool.clone(), Duration::from_secs(60));
/// let store = RedisBackend::persistent(pool);
/// ```
#[derive(Clone, Debug)]
pub struct RedisBackend {
    pool: RedisPool,
    expiry: Option<Duration>,
}

impl RedisBackend {
    /// Backend whose entries expire `expiry` after each write.
    pub fn ephemeral(pool: RedisPool, expiry: Duration) -> Self {
        Self {
            pool,
            expiry: Some(expiry),
        }
    }

    /// Backend whose entries live until overwritten.
    pub fn persistent(pool: RedisPool) -> Self {
        Self { pool, expiry: None }
    }

    /// Returns the TTL applied to writes, if any.
    pub fn expiry(&self) -> Option<Duration> {
        self.expiry
    }

    /// Returns the pool this backend connects through.
    pub fn pool(&self) -> &RedisPool {
        &self.pool
    }
}

/// Converts a TTL to whole milliseconds for `SET ... PX`, clamped to
/// `1..=MAX_EXPIRY_SECS * 1000`.
fn expiry_millis(expiry: Duration) -> u64 {
    u64::try_from(expiry.as_millis())
        .unwrap_or(u64::MAX)
        .clamp(1, MAX_EXPIRY_MILLIS)
}

/// `GET key`
fn get_cmd(key: &str) -> redis::Cmd {
    let mut cmd = redis::cmd(GET);
    cmd.arg(key);
    cmd
}

/// `SET key payload [PX millis]`
fn set_cmd(key: &str, payload: &str, expiry: Option<Duration>) -> redis::Cmd {
    let mut cmd = redis::cmd(SET);
    cmd.arg(key).arg(payload);
    if let Some(expiry) = expiry {
        cmd.arg("PX").arg(expiry_millis(expiry));
    }
    cmd
}

/// `SCAN cursor MATCH * COUNT 500`
fn scan_cmd(cursor: u64) -> redis::Cmd {
    let mut cmd = redis::cmd(SCAN);
    cmd.arg(cursor)
        .arg("MATCH")
        .arg("*")
        .arg("COUNT")
        .arg(SCAN_COUNT);
    cmd
}

#[async_trait]
impl KvsBackend for RedisBackend {
    fn name(&self) -> &'static str {
        if self.expiry.is_some() {
            "redis_ephemeral"
        } else {
            "redis"
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut conn = self.pool.ensure_connected().await?;
        let raw: Option<Vec<u8>> = get_cmd(key).query_async(&mut conn).await?;

        raw.map(|raw| {
            serde_json::from_slice(&raw).map_err(|source| Error::Deserialization {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let payload = serde_json::to_string(&value).map_err(|source| Error::InvalidValue {
            key: key.to_string(),
            source,
        })?;

        let mut conn = self.pool.ensure_connected().await?;
        set_cmd(key, &payload, self.expiry)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut conn = self.pool.ensure_connected().await?;
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<Vec<u8>>) =
                scan_cmd(cursor).query_async(&mut conn).await?;
            for raw in batch {
                match String::from_utf8(raw) {
                    Ok(key) => keys.push(key),
                    Err(err) => warn!(
                        key = %String::from_utf8_lossy(err.as_bytes()),
                        "Skipping redis key that is not valid UTF-8"
                    ),
                }
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }
}
