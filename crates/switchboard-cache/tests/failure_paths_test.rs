//! Failure policies of the state components, driven by a mock store.

mod common;

use common::{mock_service, MockStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use switchboard_cache::{CacheKeys, DeviceInfo, RateLimitPolicy, RateLimiter};
use switchboard_config::{ReconnectConfig, StoreConfig};
use switchboard_core::StoreError;
use switchboard_store::{KeyTtl, RedisStore};

fn unavailable() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

fn timeout() -> StoreError {
    StoreError::Timeout("TTL exceeded 2000ms".to_string())
}

#[tokio::test]
async fn test_rate_limit_reset_time_absent_when_ttl_lookup_fails() {
    let mut store = MockStore::new();
    store.expect_increment().times(1).returning(|_| Ok(2));
    store.expect_ttl().times(1).returning(|_| Err(timeout()));
    store.expect_expire().never();

    let result = mock_service(store)
        .rate_limiter()
        .check_limit("client", 3, 60)
        .await;

    assert!(result.allowed);
    assert_eq!(result.count, 2);
    assert_eq!(result.remaining, 1);
    assert_eq!(result.reset_time, None);
}

#[tokio::test]
async fn test_rate_limit_fails_open_within_command_timeout() {
    let config = StoreConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        command_timeout_ms: 250,
        reconnect: ReconnectConfig {
            max_elapsed_ms: 10_000,
            ..Default::default()
        },
        ..Default::default()
    };
    let store = Arc::new(RedisStore::new(&config).unwrap());
    let limiter = RateLimiter::new(store, CacheKeys::default(), RateLimitPolicy::new(5, 60));

    let started = Instant::now();
    let result = limiter.check("client").await;

    assert!(result.allowed);
    assert_eq!(result.count, 0);
    assert_eq!(result.remaining, 5);
    assert!(started.elapsed() < Duration::from_millis(750));
}

#[tokio::test]
async fn test_rate_limit_arms_window_only_on_first_increment() {
    let mut store = MockStore::new();
    store.expect_increment().times(1).returning(|_| Ok(1));
    store
        .expect_expire()
        .times(1)
        .withf(|key, ttl| key == "rate_limit:client" && *ttl == 60)
        .returning(|_, _| Ok(true));
    store
        .expect_ttl()
        .times(1)
        .returning(|_| Ok(KeyTtl::Expires(60)));

    let result = mock_service(store)
        .rate_limiter()
        .check_limit("client", 3, 60)
        .await;
    assert!(result.allowed);
    assert!(result.reset_time.is_some());
}

#[tokio::test]
async fn test_rate_limit_arm_failure_still_answers() {
    let mut store = MockStore::new();
    store.expect_increment().times(1).returning(|_| Ok(1));
    store.expect_expire().returning(|_, _| Err(unavailable()));
    store.expect_ttl().times(1).returning(|_| Ok(KeyTtl::Persistent));

    let result = mock_service(store)
        .rate_limiter()
        .check_limit("client", 3, 60)
        .await;
    assert!(result.allowed);
    assert_eq!(result.count, 1);
    assert_eq!(result.reset_time, None);
}

#[tokio::test]
async fn test_rate_limit_fails_open_on_increment_error() {
    let mut store = MockStore::new();
    store.expect_increment().times(1).returning(|_| Err(timeout()));
    store.expect_expire().never();
    store.expect_ttl().never();

    let result = mock_service(store)
        .rate_limiter()
        .check_limit("client", 3, 60)
        .await;
    assert!(result.allowed);
    assert_eq!(result.remaining, 3);
}

#[tokio::test]
async fn test_authenticate_fails_closed_on_store_error() {
    let mut store = MockStore::new();
    store.expect_get().returning(|_| Err(unavailable()));

    let state = mock_service(store);
    assert!(state.sessions().authenticate("any").await.is_none());
    assert!(state.sessions().get_session("any").await.is_none());
}

#[tokio::test]
async fn test_create_session_reports_write_failure() {
    let mut store = MockStore::new();
    store
        .expect_set_with_ttl()
        .times(1)
        .withf(|key, _, ttl| key.starts_with("session:") && *ttl == 86_400)
        .returning(|_, _, _| Err(unavailable()));

    let state = mock_service(store);
    assert!(state
        .sessions()
        .create_session("user-1", DeviceInfo::new(None, None))
        .await
        .is_none());
}

#[tokio::test]
async fn test_user_sessions_skip_unreadable_records() {
    let good = serde_json::json!({
        "sessionId": "s-good",
        "userId": "user-1",
        "deviceInfo": {"createdAt": "2024-01-01T00:00:00Z"},
        "expiresAt": "2099-01-01T00:00:00Z",
    })
    .to_string();

    let mut store = MockStore::new();
    store
        .expect_keys_by_prefix()
        .withf(|prefix| prefix == "session:")
        .returning(|_| {
            Ok(vec![
                "session:s-good".to_string(),
                "session:s-broken".to_string(),
                "session:s-gone".to_string(),
            ])
        });
    store.expect_get().returning(move |key| match key {
        "session:s-good" => Ok(Some(good.clone())),
        "session:s-broken" => Err(unavailable()),
        _ => Ok(None),
    });

    let sessions = mock_service(store).sessions().get_user_sessions("user-1").await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, "s-good");
    assert_eq!(sessions[0].device_info.user_agent, None);
}

#[tokio::test]
async fn test_delete_user_sessions_reports_enumeration_failure() {
    let mut store = MockStore::new();
    store
        .expect_keys_by_prefix()
        .times(2)
        .returning(|_| Err(timeout()));
    store.expect_delete().never();

    let state = mock_service(store);
    assert_eq!(state.sessions().delete_user_sessions("user-1").await, None);
    assert!(state
        .sessions()
        .try_delete_user_sessions("user-1")
        .await
        .is_err());
}

#[tokio::test]
async fn test_delete_user_sessions_counts_only_removed_keys() {
    let record = |id: &str| {
        serde_json::json!({
            "sessionId": id,
            "userId": "user-1",
            "deviceInfo": {"createdAt": "2024-01-01T00:00:00Z"},
            "expiresAt": "2099-01-01T00:00:00Z",
        })
        .to_string()
    };
    let first = record("s-1");
    let second = record("s-2");

    let mut store = MockStore::new();
    store.expect_keys_by_prefix().returning(|_| {
        Ok(vec!["session:s-1".to_string(), "session:s-2".to_string()])
    });
    store.expect_get().returning(move |key| match key {
        "session:s-1" => Ok(Some(first.clone())),
        _ => Ok(Some(second.clone())),
    });
    store.expect_delete().times(2).returning(|key| match key {
        "session:s-1" => Ok(true),
        _ => Err(unavailable()),
    });

    let removed = mock_service(store)
        .sessions()
        .delete_user_sessions("user-1")
        .await;
    assert_eq!(removed, Some(1));
}

#[tokio::test]
async fn test_extend_session_stops_when_key_is_gone() {
    let mut store = MockStore::new();
    store.expect_expire().times(1).returning(|_, _| Ok(false));
    store.expect_get().never();
    store.expect_set_with_ttl().never();

    assert!(!mock_service(store).sessions().extend_session("s-1", 600).await);
}

#[tokio::test]
async fn test_update_step_does_not_write_after_failed_read() {
    let mut store = MockStore::new();
    store.expect_get().times(1).returning(|_| Err(timeout()));
    store.expect_set_with_ttl().never();

    let state = mock_service(store);
    assert!(state
        .conversations()
        .update_step("p1", "next", serde_json::Map::new())
        .await
        .is_none());
}

#[tokio::test]
async fn test_queue_failures_yield_none() {
    let mut store = MockStore::new();
    store
        .expect_sorted_set_add()
        .returning(|_, _, _| Err(unavailable()));
    store
        .expect_sorted_set_pop_max()
        .returning(|_| Err(timeout()));
    store
        .expect_sorted_set_cardinality()
        .returning(|_| Err(unavailable()));

    let state = mock_service(store);
    assert!(state.queue().add_job("jobs", &1, 1.0).await.is_none());
    assert!(state.queue().get_next_job::<i32>("jobs").await.is_none());
    assert!(state.queue().get_queue_length("jobs").await.is_none());
}

#[tokio::test]
async fn test_health_surfaces_memory_info_error() {
    let mut store = MockStore::new();
    store.expect_ping().times(1).returning(|| Ok(()));
    store
        .expect_memory_info()
        .times(1)
        .returning(|| Err(StoreError::Command("ERR unknown section".to_string())));
    store.expect_backend().return_const("redis");

    let report = mock_service(store).health().check_health().await;
    assert!(!report.is_healthy());
    assert_eq!(report.backend, "redis");
    assert!(report.error.unwrap().contains("ERR unknown section"));
}

#[tokio::test]
async fn test_cache_try_api_keeps_failure_visible() {
    let mut store = MockStore::new();
    store.expect_get().returning(|_| Err(unavailable()));

    let state = mock_service(store);
    assert_eq!(state.cache().get::<i32>("k").await, None);
    let err = state.cache().try_get::<i32>("k").await.unwrap_err();
    assert!(err.is_store_failure());
    assert_eq!(err.kind(), "unavailable");
}
