//! CLI command implementations.
//!
//! Every command starts with [`bootstrap`], which loads the settings file and
//! runs the startup checks. The remaining functions operate on the store
//! the checks selected.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::info;

use learning_observer::config::Settings;
use learning_observer::kvs::{Kvs, KvsFactory};
use learning_observer::startup;

/// Load settings from `config` and run the startup checks.
///
/// A failed check is returned as a [`startup::StartupFailure`] inside the
/// `anyhow` error so the caller can render it.
pub fn bootstrap(config: &Path) -> Result<KvsFactory> {
    let settings = Settings::load_from(config)?;
    Ok(startup::init(&settings)?)
}

/// Report the selected backend.
pub fn check(factory: &KvsFactory) -> Result<()> {
    match factory.expiry() {
        Some(expiry) => println!(
            "KVS OK: {} (entries expire after {}s)",
            factory.kind(),
            expiry.as_secs()
        ),
        None => println!("KVS OK: {}", factory.kind()),
    }
    Ok(())
}

/// Print the value under `key`.
pub async fn get(kvs: &Kvs, key: &str) -> Result<()> {
    let value = kvs
        .get(key)
        .await
        .with_context(|| format!("Failed to read key '{key}'"))?
        .with_context(|| format!("Key '{key}' not found"))?;
    println!("{}", to_pretty(&value)?);
    Ok(())
}

/// Parse `raw` as JSON and store it under `key`.
pub async fn set(kvs: &Kvs, key: &str, raw: &str) -> Result<()> {
    let value = parse_value(raw)?;
    kvs.set_value(key, value)
        .await
        .with_context(|| format!("Failed to write key '{key}'"))?;
    info!(key, backend = kvs.backend_name(), "Stored value");
    Ok(())
}

/// Print one page of keys, one per line.
pub async fn keys(kvs: &Kvs, after: Option<&str>, limit: usize) -> Result<()> {
    let page = kvs
        .keys_page(after, limit)
        .await
        .context("Failed to list keys")?;

    for key in &page.keys {
        println!("{key}");
    }
    if let Some(next) = &page.next {
        eprintln!("More keys available: --after {next}");
    }
    Ok(())
}

/// Dump the store to `output`, or to stdout.
pub async fn dump(kvs: &Kvs, output: Option<&Path>) -> Result<()> {
    let entries = kvs.dump(output).await.context("Failed to dump store")?;

    match output {
        Some(path) => info!(
            entries = entries.len(),
            path = %path.display(),
            "Dump written"
        ),
        None => println!("{}", to_pretty(&Value::Object(entries))?),
    }
    Ok(())
}

/// Load a dump file into the store.
pub async fn load(kvs: &Kvs, path: &Path) -> Result<()> {
    let count = kvs
        .load(path)
        .await
        .with_context(|| format!("Failed to load {}", path.display()))?;
    println!("Loaded {count} entries from {}", path.display());
    Ok(())
}

/// Remove every entry.
pub async fn clear(kvs: &Kvs) -> Result<()> {
    kvs.clear().await.context("Failed to clear store")?;
    println!("Cleared {} store", kvs.backend_name());
    Ok(())
}

fn parse_value(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("Value is not valid JSON: {raw}"))
}

fn to_pretty(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to format value")
}
