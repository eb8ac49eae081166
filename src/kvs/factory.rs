//! Backend selection.
//!
//! [`BackendKind`] names the configured backend; [`KvsFactory`] is the
//! binding produced at startup and hands out [`Kvs`] instances that share
//! one memory table or one Redis pool.

use super::memory::MemoryTable;
use super::redis_store::RedisPool;
use super::store::Kvs;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Backend kinds accepted in `kvs.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Process-local in-memory store.
    Stub,
    /// Redis with a TTL on every entry.
    RedisEphemeral,
    /// Redis without expiry.
    Redis,
}

impl BackendKind {
    /// Every kind, in the order they are listed to operators.
    pub const ALL: [BackendKind; 3] = [Self::Stub, Self::RedisEphemeral, Self::Redis];

    /// The configuration name of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stub => "stub",
            Self::RedisEphemeral => "redis_ephemeral",
            Self::Redis => "redis",
        }
    }

    /// Returns true if this kind talks to Redis.
    pub const fn uses_redis(self) -> bool {
        matches!(self, Self::RedisEphemeral | Self::Redis)
    }

    /// Comma-separated list of valid names for error messages.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown backend name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown KVS type '{0}'")]
pub struct UnknownBackendKind(pub String);

impl FromStr for BackendKind {
    type Err = UnknownBackendKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownBackendKind(s.to_string()))
    }
}

/// Resources a selected backend is built from.
#[derive(Clone, Debug)]
enum Binding {
    Memory(MemoryTable),
    RedisEphemeral { pool: RedisPool, expiry: Duration },
    Redis(RedisPool),
}

/// The backend chosen at startup.
///
/// Every [`Kvs`] created from the same factory (or its clones) shares the
/// same memory table or Redis pool.
#[derive(Clone, Debug)]
pub struct KvsFactory {
    binding: Binding,
}

impl KvsFactory {
    /// Factory for in-memory stores over `table`.
    pub fn memory(table: MemoryTable) -> Self {
        Self {
            binding: Binding::Memory(table),
        }
    }

    /// Factory for Redis stores whose entries expire after `expiry`.
    pub fn redis_ephemeral(pool: RedisPool, expiry: Duration) -> Self {
        Self {
            binding: Binding::RedisEphemeral { pool, expiry },
        }
    }

    /// Factory for Redis stores without expiry.
    pub fn redis(pool: RedisPool) -> Self {
        Self {
            binding: Binding::Redis(pool),
        }
    }

    /// The kind of backend this factory builds.
    pub fn kind(&self) -> BackendKind {
        match self.binding {
            Binding::Memory(_) => BackendKind::Stub,
            Binding::RedisEphemeral { .. } => BackendKind::RedisEphemeral,
            Binding::Redis(_) => BackendKind::Redis,
        }
    }

    /// TTL applied to writes, if any.
    pub fn expiry(&self) -> Option<Duration> {
        match self.binding {
            Binding::RedisEphemeral { expiry, .. } => Some(expiry),
            Binding::Memory(_) | Binding::Redis(_) => None,
        }
    }

    /// Builds a new store instance. Never performs network I/O.
    pub fn create(&self) -> Kvs {
        match &self.binding {
            Binding::Memory(table) => Kvs::memory(table.clone()),
            Binding::RedisEphemeral { pool, expiry } => Kvs::redis_ephemeral(pool.clone(), *expiry),
            Binding::Redis(pool) => Kvs::redis(pool.clone()),
        }
    }
}
