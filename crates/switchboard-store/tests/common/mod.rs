//! Common test infrastructure for Redis integration tests.

use std::time::Duration;
use switchboard_config::{ReconnectConfig, StoreConfig};
use switchboard_store::RedisStore;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::redis::Redis;

/// Redis testcontainer plus a store adapter pointed at it.
pub struct TestRedis {
    _container: ContainerAsync<Redis>,
    config: StoreConfig,
}

impl TestRedis {
    /// Starts a fresh Redis container.
    pub async fn new() -> Self {
        let container = Redis::default()
            .start()
            .await
            .expect("Failed to start Redis container");

        let port = container
            .get_host_port_ipv4(6379)
            .await
            .expect("Failed to get Redis port");

        let config = StoreConfig {
            host: "127.0.0.1".to_string(),
            port,
            pool_size: 4,
            connect_timeout_ms: 2_000,
            command_timeout_ms: 2_000,
            reconnect: ReconnectConfig {
                max_elapsed_ms: 10_000,
                ..Default::default()
            },
            ..Default::default()
        };

        let redis = Self {
            _container: container,
            config,
        };
        redis.wait_until_ready(30).await;
        redis
    }

    /// Returns a new adapter sharing nothing with previous ones.
    pub fn store(&self) -> RedisStore {
        RedisStore::new(&self.config).expect("Failed to build Redis store")
    }

    /// Returns an adapter whose configuration has been adjusted by `tweak`.
    pub fn store_with(&self, tweak: impl FnOnce(&mut StoreConfig)) -> RedisStore {
        let mut config = self.config.clone();
        tweak(&mut config);
        RedisStore::new(&config).expect("Failed to build Redis store")
    }

    async fn wait_until_ready(&self, max_attempts: u32) {
        use switchboard_store::StoreAdapter;

        let store = self.store();
        for attempt in 1..=max_attempts {
            if store.ping().await.is_ok() {
                return;
            }
            assert!(attempt < max_attempts, "Redis never became ready");
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }
}
