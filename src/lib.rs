//! learning-observer key-value store layer.
//!
//! A small JSON key-value store with interchangeable backends, selected at
//! startup from the settings file:
//!
//! - `stub` - process-local, in memory, shared by every instance
//! - `redis_ephemeral` - Redis, every write expires after `kvs.expiry`
//! - `redis` - Redis, no expiry
//!
//! See [`startup`] for backend selection and [`kvs`] for the store API.

pub mod config;
pub mod constants;
pub mod kvs;
pub mod startup;
pub mod ui;
