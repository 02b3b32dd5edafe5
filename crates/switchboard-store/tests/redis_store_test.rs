//! Integration tests for RedisStore.
//!
//! These tests run against a real Redis server using testcontainers.
//! Requires Docker; run with `cargo test -- --ignored`.

mod common;

use common::TestRedis;
use std::time::Duration;
use switchboard_store::{KeyTtl, StoreAdapter};

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_string_commands() {
    let redis = TestRedis::new().await;
    let store = redis.store();

    assert_eq!(store.get("greeting").await.unwrap(), None);
    store.set("greeting", "hello").await.unwrap();
    assert_eq!(store.get("greeting").await.unwrap().as_deref(), Some("hello"));
    assert!(store.exists("greeting").await.unwrap());
    assert_eq!(store.ttl("greeting").await.unwrap(), KeyTtl::Persistent);

    assert!(store.delete("greeting").await.unwrap());
    assert!(!store.delete("greeting").await.unwrap());
    assert_eq!(store.ttl("greeting").await.unwrap(), KeyTtl::Missing);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_ttl_commands() {
    let redis = TestRedis::new().await;
    let store = redis.store();

    store.set_with_ttl("short", "v", 1).await.unwrap();
    assert!(matches!(store.ttl("short").await.unwrap(), KeyTtl::Expires(1)));

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(store.get("short").await.unwrap(), None);

    assert!(!store.expire("missing", 10).await.unwrap());
    store.set("long", "v").await.unwrap();
    assert!(store.expire("long", 100).await.unwrap());
    assert!(matches!(
        store.ttl("long").await.unwrap(),
        KeyTtl::Expires(99..=100)
    ));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_increment() {
    let redis = TestRedis::new().await;
    let store = redis.store();

    assert_eq!(store.increment("counter").await.unwrap(), 1);
    assert_eq!(store.increment("counter").await.unwrap(), 2);
    assert_eq!(store.ttl("counter").await.unwrap(), KeyTtl::Persistent);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_keys_by_prefix_uses_scan() {
    let redis = TestRedis::new().await;
    let store = redis.store();

    for i in 0..450 {
        store.set(&format!("session:{i}"), "x").await.unwrap();
    }
    store.set("sessionless", "x").await.unwrap();
    store.set("other:1", "x").await.unwrap();

    let keys = store.keys_by_prefix("session:").await.unwrap();
    assert_eq!(keys.len(), 450);
    assert!(keys.iter().all(|k| k.starts_with("session:")));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_keys_by_prefix_deadline_applies_per_round_trip() {
    let redis = TestRedis::new().await;
    let loader = redis.store();
    for i in 0..5_000 {
        loader.set(&format!("cache:{i}"), "x").await.unwrap();
    }
    for i in 0..3 {
        loader.set(&format!("session:{i}"), "x").await.unwrap();
    }

    // Each SCAN page finishes well inside 100ms even though the full walk
    // over the keyspace may not.
    let store = redis.store_with(|config| config.command_timeout_ms = 100);
    let mut keys = store.keys_by_prefix("session:").await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["session:0", "session:1", "session:2"]);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_sorted_set_commands() {
    let redis = TestRedis::new().await;
    let store = redis.store();

    store.sorted_set_add("queue", "a", 1.0).await.unwrap();
    store.sorted_set_add("queue", "c", 5.0).await.unwrap();
    store.sorted_set_add("queue", "b", 5.0).await.unwrap();
    assert_eq!(store.sorted_set_cardinality("queue").await.unwrap(), 3);

    // Equal scores: ZPOPMAX takes the lexicographically greatest member.
    assert_eq!(
        store.sorted_set_pop_max("queue").await.unwrap(),
        Some(("c".to_string(), 5.0))
    );
    assert_eq!(
        store.sorted_set_pop_max("queue").await.unwrap(),
        Some(("b".to_string(), 5.0))
    );
    assert_eq!(
        store.sorted_set_pop_max("queue").await.unwrap(),
        Some(("a".to_string(), 1.0))
    );
    assert_eq!(store.sorted_set_pop_max("queue").await.unwrap(), None);
    assert_eq!(store.sorted_set_cardinality("queue").await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_ping_and_memory_info() {
    let redis = TestRedis::new().await;
    let store = redis.store();

    store.ping().await.unwrap();
    let info = store.memory_info().await.unwrap();
    assert!(info.used_memory > 0);
    assert!(!info.used_memory_human.is_empty());
    assert!(info.fragmentation_ratio > 0.0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_wrong_type_is_command_error() {
    let redis = TestRedis::new().await;
    let store = redis.store();

    store.set("plain", "v").await.unwrap();
    let err = store.sorted_set_add("plain", "m", 1.0).await.unwrap_err();
    assert!(matches!(err, switchboard_core::StoreError::Command(_)));
}
