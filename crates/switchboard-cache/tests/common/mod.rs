//! Shared fixtures for state layer integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use serde_json::{Map, Value};
use std::sync::Arc;
use switchboard_cache::StateService;
use switchboard_config::CacheConfig;
use switchboard_core::StoreResult;
use switchboard_store::{KeyTtl, MemoryInfo, MemoryStore, StoreAdapter};

mock! {
    pub Store {}

    #[async_trait]
    impl StoreAdapter for Store {
        async fn get(&self, key: &str) -> StoreResult<Option<String>>;
        async fn set(&self, key: &str, value: &str) -> StoreResult<()>;
        async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()>;
        async fn delete(&self, key: &str) -> StoreResult<bool>;
        async fn exists(&self, key: &str) -> StoreResult<bool>;
        async fn expire(&self, key: &str, ttl_secs: u64) -> StoreResult<bool>;
        async fn ttl(&self, key: &str) -> StoreResult<KeyTtl>;
        async fn increment(&self, key: &str) -> StoreResult<i64>;
        async fn keys_by_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;
        async fn sorted_set_add(&self, key: &str, member: &str, score: f64) -> StoreResult<()>;
        async fn sorted_set_pop_max(&self, key: &str) -> StoreResult<Option<(String, f64)>>;
        async fn sorted_set_cardinality(&self, key: &str) -> StoreResult<u64>;
        async fn ping(&self) -> StoreResult<()>;
        async fn memory_info(&self) -> StoreResult<MemoryInfo>;
        fn backend(&self) -> &'static str;
    }
}

/// A state service over a fresh in-memory store, plus the store itself.
pub fn memory_service() -> (Arc<MemoryStore>, StateService) {
    let store = Arc::new(MemoryStore::new());
    let service = StateService::new(store.clone(), &CacheConfig::default());
    (store, service)
}

/// A state service over a mock store.
pub fn mock_service(store: MockStore) -> StateService {
    StateService::new(Arc::new(store), &CacheConfig::default())
}

/// Builds a context map from a JSON object literal.
pub fn context(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
