//! Error types for the key-value store.
//!
//! Every store operation returns [`Result`]. Errors propagate to the
//! immediate caller; nothing in this module retries or recovers.

use std::path::PathBuf;

/// Result type for KVS operations.
pub type Result<T> = std::result::Result<T, Error>;

/// KVS errors with structured context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A key supplied through an untyped surface was not a JSON string.
    #[error("KVS keys must be strings (got {found})")]
    InvalidKey { found: String },

    /// A value could not be serialized to JSON.
    #[error("value for key '{key}' is not JSON-serializable: {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored value could not be parsed back as JSON.
    #[error("stored value for key '{key}' is not valid JSON: {source}")]
    Deserialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The remote store could not be reached.
    #[error("redis connection failed: {0}")]
    Connection(#[source] redis::RedisError),

    /// The remote store rejected a command.
    #[error("redis error: {0}")]
    Redis(#[source] redis::RedisError),

    /// IO error with context (dump/load files).
    #[error("IO error in {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A dump file was not a JSON object of key/value pairs.
    #[error("invalid dump file {path:?}: {reason}")]
    InvalidDump { path: PathBuf, reason: String },

    /// The operation is not offered by this backend.
    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        operation: &'static str,
        backend: &'static str,
    },
}

impl Error {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid dump error.
    pub fn invalid_dump(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidDump {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(operation: &'static str, backend: &'static str) -> Self {
        Self::Unsupported { operation, backend }
    }

    /// Returns true for caller-side validation failures (bad key or value).
    ///
    /// A validation failure guarantees the store was not modified.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidKey { .. } | Self::InvalidValue { .. })
    }

    /// Returns true if the remote store was unreachable.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_timeout() {
            Self::Connection(err)
        } else {
            Self::Redis(err)
        }
    }
}
