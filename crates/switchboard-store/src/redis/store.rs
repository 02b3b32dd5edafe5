//! Redis store adapter implementation.

use super::{
    classify_pool_error, classify_redis_error, create_pool, escape_glob, parse_memory_info,
    reconnect_backoff, SCAN_BATCH,
};
use crate::adapter::{KeyTtl, MemoryInfo, StoreAdapter};
use crate::metrics;
use async_trait::async_trait;
use deadpool_redis::{Connection, Pool};
use redis::{AsyncCommands, RedisResult};
use std::collections::HashSet;
use std::future::Future;
use std::time::{Duration, Instant};
use switchboard_config::{ReconnectConfig, StoreConfig};
use switchboard_core::{StoreError, StoreResult};
use tracing::{debug, warn};

/// Redis store adapter over a lazily-connecting connection pool.
///
/// Cloning is cheap; clones share the pool.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
    command_timeout: Duration,
    reconnect: ReconnectConfig,
}

impl RedisStore {
    /// Creates an adapter from configuration. Does not connect.
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let pool = create_pool(config)?;
        Ok(Self::from_pool(
            pool,
            config.command_timeout(),
            config.reconnect.clone(),
        ))
    }

    /// Creates an adapter over an existing pool.
    #[must_use]
    pub fn from_pool(pool: Pool, command_timeout: Duration, reconnect: ReconnectConfig) -> Self {
        Self {
            pool,
            command_timeout,
            reconnect,
        }
    }

    /// Acquires a pooled connection, retrying with exponential backoff and
    /// jitter while the store is unreachable.
    ///
    /// The retry budget never exceeds the command timeout; later calls start
    /// a fresh attempt instead of one caller absorbing the whole backoff.
    async fn conn(&self) -> StoreResult<Connection> {
        let policy = reconnect_backoff(&self.reconnect, self.command_timeout);
        backoff::future::retry(policy, || async {
            self.pool.get().await.map_err(|e| {
                let err = classify_pool_error(e);
                if err.is_retryable() {
                    metrics::record_reconnect_attempt();
                    debug!(error = %err, "Redis connection unavailable, retrying");
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            })
        })
        .await
    }

    /// Bounds one round trip by the command timeout.
    async fn within_deadline<T, Fut>(&self, command: &'static str, fut: Fut) -> StoreResult<T>
    where
        Fut: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout(self.command_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::deadline_exceeded(command, self.command_timeout)),
        }
    }

    /// Runs one command. Connection acquisition and the command share a
    /// single command-timeout deadline.
    async fn run<T, F, Fut>(&self, command: &'static str, f: F) -> StoreResult<T>
    where
        F: FnOnce(Connection) -> Fut + Send,
        Fut: Future<Output = RedisResult<T>> + Send,
    {
        let started = Instant::now();
        let result = self
            .within_deadline(command, async {
                let conn = self.conn().await?;
                f(conn).await.map_err(|e| classify_redis_error(&e))
            })
            .await;
        record(command, started, result)
    }

    /// Walks the keyspace with `SCAN`, one deadline per cursor round trip.
    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.within_deadline("SCAN", self.conn()).await?;
        let mut cursor: u64 = 0;
        let mut seen = HashSet::new();
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = self
                .within_deadline("SCAN", async {
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut conn)
                        .await
                        .map_err(|e| classify_redis_error(&e))
                })
                .await?;

            // SCAN may return a key more than once across iterations.
            for key in batch {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }

            if next == 0 {
                return Ok(keys);
            }
            cursor = next;
        }
    }
}

fn record<T>(command: &'static str, started: Instant, result: StoreResult<T>) -> StoreResult<T> {
    metrics::record_command(command, started.elapsed(), result.is_ok());
    if let Err(e) = &result {
        metrics::record_error(command, e.kind());
        warn!(command, error = %e, "Redis command failed");
    }
    result
}

#[async_trait]
impl StoreAdapter for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.run("GET", |mut conn| async move {
            let value: Option<String> = conn.get(key).await?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.run("SET", |mut conn| async move {
            let _: () = conn.set(key, value).await?;
            Ok(())
        })
        .await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        self.run("SETEX", |mut conn| async move {
            let _: () = conn.set_ex(key, value, ttl_secs).await?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.run("DEL", |mut conn| async move {
            let deleted: i64 = conn.del(key).await?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.run("EXISTS", |mut conn| async move {
            let exists: bool = conn.exists(key).await?;
            Ok(exists)
        })
        .await
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> StoreResult<bool> {
        let seconds = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        self.run("EXPIRE", |mut conn| async move {
            let applied: bool = conn.expire(key, seconds).await?;
            Ok(applied)
        })
        .await
    }

    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl> {
        self.run("TTL", |mut conn| async move {
            let reply: i64 = conn.ttl(key).await?;
            Ok(KeyTtl::from_reply(reply))
        })
        .await
    }

    async fn increment(&self, key: &str) -> StoreResult<i64> {
        self.run("INCR", |mut conn| async move {
            let count: i64 = conn.incr(key, 1i64).await?;
            Ok(count)
        })
        .await
    }

    async fn keys_by_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let pattern = format!("{}*", escape_glob(prefix));
        let started = Instant::now();
        let result = self.scan(&pattern).await;
        record("SCAN", started, result)
    }

    async fn sorted_set_add(&self, key: &str, member: &str, score: f64) -> StoreResult<()> {
        self.run("ZADD", |mut conn| async move {
            let _: () = conn.zadd(key, member, score).await?;
            Ok(())
        })
        .await
    }

    async fn sorted_set_pop_max(&self, key: &str) -> StoreResult<Option<(String, f64)>> {
        self.run("ZPOPMAX", |mut conn| async move {
            let popped: Vec<(String, f64)> = conn.zpopmax(key, 1).await?;
            Ok(popped.into_iter().next())
        })
        .await
    }

    async fn sorted_set_cardinality(&self, key: &str) -> StoreResult<u64> {
        self.run("ZCARD", |mut conn| async move {
            let count: u64 = conn.zcard(key).await?;
            Ok(count)
        })
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.run("PING", |mut conn| async move {
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    async fn memory_info(&self) -> StoreResult<MemoryInfo> {
        self.run("INFO", |mut conn| async move {
            let info: String = redis::cmd("INFO").arg("memory").query_async(&mut conn).await?;
            Ok(parse_memory_info(&info))
        })
        .await
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
