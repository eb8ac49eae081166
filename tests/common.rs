//! Shared helpers for integration tests.

#![allow(dead_code)]

use learning_observer::config::Settings;
use learning_observer::kvs::KvsFactory;
use learning_observer::startup::{self, StartupFailure};
use std::io::Write;
use tempfile::NamedTempFile;

/// Write `content` to a temporary settings file.
pub fn settings_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create settings file");
    file.write_all(content.as_bytes())
        .expect("Failed to write settings file");
    file
}

/// Load settings through a real file and run the default startup checks.
pub fn start(content: &str) -> Result<KvsFactory, StartupFailure> {
    let file = settings_file(content);
    let settings = Settings::load_from(file.path()).expect("Failed to load settings");
    startup::init(&settings)
}

/// Redis server for live tests, from `REDIS_URL`.
pub fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/".to_string())
}

/// Key prefix unique to one test run, so live tests don't collide.
pub fn unique_prefix(test: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("lo-test:{test}:{}:{nanos}:", std::process::id())
}
