//! Settings file for the learning-observer backend.
//!
//! Settings are loaded from a TOML file. Only the sections the KVS layer
//! needs are modelled here:
//!
//! - [`KvsSettings`] - which backend to use and its expiry
//! - [`RedisSettings`] - where the Redis server lives
//!
//! Loading never decides whether the KVS configuration is usable; that is
//! the job of the startup checks, so unknown backend names survive parsing.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constants;
use crate::kvs::BackendKind;

/// Result of settings validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Root settings structure.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub kvs: Option<KvsSettings>,
    #[serde(default)]
    pub redis: Option<RedisSettings>,
}

/// `[kvs]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct KvsSettings {
    /// Backend name, kept raw so the startup check can report bad values.
    #[serde(rename = "type")]
    pub kind: String,
    /// Entry lifetime in seconds (`redis_ephemeral` only).
    #[serde(default)]
    pub expiry: Option<u64>,
}

impl KvsSettings {
    /// Expiry as a duration, if configured.
    pub fn expiry_duration(&self) -> Option<Duration> {
        self.expiry.map(Duration::from_secs)
    }
}

/// `[redis]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

fn default_redis_url() -> String {
    constants::DEFAULT_REDIS_URL.to_string()
}

impl Settings {
    /// Load settings from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - Fields have invalid types
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fields have the
    /// wrong types.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Redis settings, falling back to defaults when the section is absent.
    pub fn redis_or_default(&self) -> RedisSettings {
        self.redis.clone().unwrap_or_default()
    }

    /// Collect non-fatal warnings about the settings.
    ///
    /// Fatal problems with the `[kvs]` section are reported by the startup
    /// checks instead.
    pub fn validate(&self) -> ValidationResult {
        let mut warnings = Vec::new();

        let Some(kvs) = &self.kvs else {
            return ValidationResult { warnings };
        };
        let kind = kvs.kind.parse::<BackendKind>().ok();

        if kvs.expiry.is_some() && kind.is_some_and(|k| k != BackendKind::RedisEphemeral) {
            warnings.push(format!(
                "kvs.expiry is ignored for kvs.type = \"{}\"\n  \
                 Expiry only applies to redis_ephemeral",
                kvs.kind
            ));
        }

        if self.redis.is_some() && kind == Some(BackendKind::Stub) {
            warnings.push(
                "[redis] section is configured but kvs.type = \"stub\" keeps data in memory"
                    .to_string(),
            );
        }

        if let Some(expiry) = kvs.expiry
            && kind == Some(BackendKind::RedisEphemeral)
            && expiry > 7 * 24 * 3600
        {
            warnings.push(format!(
                "kvs.expiry of {expiry}s is longer than a week\n  \
                 Consider kvs.type = \"redis\" for long-lived data"
            ));
        }

        ValidationResult { warnings }
    }
}
