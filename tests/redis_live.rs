//! Tests against a live Redis server.
//!
//! Ignored by default. Run with a server available:
//! ```bash
//! REDIS_URL=redis://127.0.0.1:6379/ cargo test --test redis_live -- --ignored
//! ```

#[path = "common.rs"]
mod common;

use common::{redis_url, start, unique_prefix};
use learning_observer::kvs::BackendKind;
use serde_json::json;
use std::time::Duration;

fn settings(kind: &str, expiry: Option<u64>) -> String {
    let expiry = expiry.map(|e| format!("expiry = {e}\n")).unwrap_or_default();
    format!(
        "[kvs]\ntype = \"{kind}\"\n{expiry}[redis]\nurl = \"{}\"\n",
        redis_url()
    )
}

#[tokio::test]
#[ignore = "requires a Redis server (REDIS_URL)"]
async fn test_redis_round_trip() {
    let kvs = start(&settings("redis", None)).unwrap().create();
    let key = format!("{}doc", unique_prefix("round_trip"));

    assert_eq!(kvs.get(&key).await.unwrap(), None);
    kvs.set(&key, &json!({"a": [1, 2], "b": null})).await.unwrap();
    assert_eq!(kvs.get(&key).await.unwrap(), Some(json!({"a": [1, 2], "b": null})));
}

#[tokio::test]
#[ignore = "requires a Redis server (REDIS_URL)"]
async fn test_redis_instances_share_pool() {
    let factory = start(&settings("redis", None)).unwrap();
    assert_eq!(factory.kind(), BackendKind::Redis);
    let key = format!("{}shared", unique_prefix("shared"));

    factory.create().set(&key, &5).await.unwrap();
    factory.create().set(&key, &7).await.unwrap();
    assert_eq!(factory.create().get(&key).await.unwrap(), Some(json!(7)));
}

#[tokio::test]
#[ignore = "requires a Redis server (REDIS_URL)"]
async fn test_redis_keys_include_written_keys() {
    let kvs = start(&settings("redis", None)).unwrap().create();
    let prefix = unique_prefix("keys");
    for name in ["b", "a", "c"] {
        kvs.set(&format!("{prefix}{name}"), &true).await.unwrap();
    }

    let ours: Vec<String> = kvs
        .keys()
        .await
        .unwrap()
        .into_iter()
        .filter(|key| key.starts_with(&prefix))
        .collect();
    assert_eq!(
        ours,
        vec![format!("{prefix}a"), format!("{prefix}b"), format!("{prefix}c")]
    );
}

#[tokio::test]
#[ignore = "requires a Redis server (REDIS_URL)"]
async fn test_ephemeral_entries_expire() {
    let kvs = start(&settings("redis_ephemeral", Some(1))).unwrap().create();
    let key = format!("{}short", unique_prefix("expiry"));

    kvs.set(&key, &"soon gone").await.unwrap();
    assert_eq!(kvs.get(&key).await.unwrap(), Some(json!("soon gone")));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(kvs.get(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires a Redis server (REDIS_URL)"]
async fn test_redis_clear_is_unsupported() {
    let kvs = start(&settings("redis", None)).unwrap().create();
    assert!(kvs.clear().await.is_err());
}

#[tokio::test]
#[ignore = "requires a Redis server (REDIS_URL)"]
async fn test_memory_and_ephemeral_instances_share_state() {
    let memory = start("[kvs]\ntype = \"stub\"\n").unwrap();
    let ephemeral = start(&settings("redis_ephemeral", Some(60))).unwrap();
    let key = format!("{}hi", unique_prefix("smoke"));

    let (mk1, mk2) = (memory.create(), memory.create());
    let (ek1, ek2) = (ephemeral.create(), ephemeral.create());
    assert_eq!(mk1.get(&key).await.unwrap(), None);
    assert_eq!(ek1.get(&key).await.unwrap(), None);

    mk1.set(&key, &5).await.unwrap();
    mk2.set(&key, &7).await.unwrap();
    ek1.set(&key, &8).await.unwrap();
    ek2.set(&key, &9).await.unwrap();

    assert_eq!(mk1.get(&key).await.unwrap(), Some(json!(7)));
    assert_eq!(ek1.get(&key).await.unwrap(), Some(json!(9)));
}
