//! Whole-store dump and load.
//!
//! The file format is a single JSON object mapping each key to its value,
//! with no envelope. These helpers back the default
//! [`KvsBackend::dump`] and [`KvsBackend::load`] methods and make one
//! request per key, so they are for development and small stores only.

use super::backend::KvsBackend;
use super::error::{Error, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Reads every entry of `backend` into a map, optionally writing it to
/// `destination`.
pub(crate) async fn dump<B>(backend: &B, destination: Option<&Path>) -> Result<Map<String, Value>>
where
    B: KvsBackend + ?Sized,
{
    let mut data = Map::new();
    for key in backend.keys().await? {
        // Entries can expire between listing and reading
        if let Some(value) = backend.get(&key).await? {
            data.insert(key, value);
        }
    }

    debug!(backend = backend.name(), entries = data.len(), "Dumped KVS");

    if let Some(path) = destination {
        let bytes = to_pretty_json(&data)?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| Error::io(format!("writing dump to {}", path.display()), e))?;
    }

    Ok(data)
}

/// Writes every entry of the dump file at `source` into `backend`.
pub(crate) async fn load<B>(backend: &B, source: &Path) -> Result<usize>
where
    B: KvsBackend + ?Sized,
{
    let content = tokio::fs::read_to_string(source)
        .await
        .map_err(|e| Error::io(format!("reading dump from {}", source.display()), e))?;

    let entries = parse_dump(source, &content)?;
    let count = entries.len();
    for (key, value) in entries {
        backend.set(&key, value).await?;
    }

    debug!(backend = backend.name(), entries = count, "Loaded KVS");
    Ok(count)
}

/// Parses dump file content, requiring a top-level JSON object.
fn parse_dump(source: &Path, content: &str) -> Result<Map<String, Value>> {
    let document: Value = serde_json::from_str(content)
        .map_err(|e| Error::invalid_dump(source, format!("not valid JSON: {e}")))?;

    match document {
        Value::Object(entries) => Ok(entries),
        other => Err(Error::invalid_dump(
            source,
            format!("top level must be an object, found {}", json_type(&other)),
        )),
    }
}

/// Serializes with four-space indentation.
fn to_pretty_json(data: &Map<String, Value>) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut bytes, PrettyFormatter::with_indent(b"    "));
    data.serialize(&mut serializer)
        .map_err(|e| Error::io("encoding dump", std::io::Error::other(e)))?;
    Ok(bytes)
}

/// Human-readable JSON type name for error messages.
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
