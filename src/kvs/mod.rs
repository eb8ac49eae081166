//! JSON key-value store with pluggable backends.
//!
//! Keys are strings and values are JSON documents. Backends:
//!
//! - **MemoryBackend** (`stub`): process-local, shared through an injected
//!   [`MemoryTable`]. Used in development and tests.
//! - **RedisBackend** (`redis_ephemeral`, `redis`): Redis, with or without a
//!   TTL on every write. Connects lazily through a shared [`RedisPool`].
//!
//! Every backend also gets whole-store [`dump`](Kvs::dump) and
//! [`load`](Kvs::load) for debugging.
//!
//! # Example
//!
//! ```ignore
//! use learning_observer::kvs::{KvsFactory, MemoryTable};
//!
//! let factory = KvsFactory::memory(MemoryTable::new());
//! let kvs = factory.create();
//! kvs.set("hi", &5).await?;
//! assert_eq!(factory.create().get_as::<i64>("hi").await?, Some(5));
//! ```
//!
//! # Custom Backends
//!
//! Implement [`KvsBackend`] and wrap it with [`Kvs::custom`].

mod backend;
mod bulk;
mod error;
mod factory;
mod memory;
mod redis_store;
mod store;

#[cfg(test)]
mod fake_redis;

pub use backend::{KeyPage, KvsBackend};
pub use error::{Error, Result};
pub use factory::{BackendKind, KvsFactory, UnknownBackendKind};
pub use memory::{MemoryBackend, MemoryTable};
pub use redis_store::{RedisBackend, RedisPool};
pub use store::Kvs;
