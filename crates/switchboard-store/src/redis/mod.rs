//! Redis-backed store adapter.

mod store;

pub use store::RedisStore;

use crate::adapter::MemoryInfo;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use deadpool_redis::{Config, Pool, PoolError, Runtime};
use redis::RedisError;
use std::time::Duration;
use switchboard_config::{ReconnectConfig, StoreConfig};
use switchboard_core::{StoreError, StoreResult};
use tracing::info;

/// Keys fetched per `SCAN` round trip.
const SCAN_BATCH: usize = 200;

/// Creates a Redis connection pool.
///
/// The pool is lazy: no connection is opened until the first command.
pub fn create_pool(config: &StoreConfig) -> StoreResult<Pool> {
    let url = config
        .connection_url()
        .map_err(|e| StoreError::Configuration(e.to_string()))?;

    let pool = Config::from_url(url)
        .builder()
        .map_err(|e| StoreError::Configuration(format!("Invalid Redis config: {e}")))?
        .max_size(config.pool_size)
        .wait_timeout(Some(config.connect_timeout()))
        .create_timeout(Some(config.connect_timeout()))
        .recycle_timeout(Some(config.command_timeout()))
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| StoreError::Configuration(format!("Failed to create pool: {e}")))?;

    info!(
        host = %config.host,
        port = config.port,
        pool_size = config.pool_size,
        "Redis connection pool created"
    );

    Ok(pool)
}

/// Backoff policy used while acquiring a connection, with its total budget
/// capped at `deadline`.
pub(crate) fn reconnect_backoff(
    config: &ReconnectConfig,
    deadline: Duration,
) -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(config.initial_delay())
        .with_max_interval(config.max_delay())
        .with_multiplier(config.multiplier)
        .with_randomization_factor(config.jitter)
        .with_max_elapsed_time(Some(config.max_elapsed().min(deadline)))
        .build()
}

/// Maps a Redis client error onto the store error taxonomy.
pub(crate) fn classify_redis_error(err: &RedisError) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout(err.to_string())
    } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Command(err.to_string())
    }
}

/// Maps a pool error onto the store error taxonomy.
pub(crate) fn classify_pool_error(err: PoolError) -> StoreError {
    match err {
        PoolError::Backend(e) => classify_redis_error(&e),
        PoolError::NoRuntimeSpecified => {
            StoreError::Configuration("Redis pool has no runtime".to_string())
        }
        other => StoreError::Unavailable(format!("Redis pool: {other}")),
    }
}

/// Escapes glob metacharacters so a key prefix can be used in `SCAN MATCH`.
pub(crate) fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Parses the reply of `INFO memory`.
pub(crate) fn parse_memory_info(info: &str) -> MemoryInfo {
    let mut memory = MemoryInfo::default();

    for line in info.lines() {
        let Some((field, value)) = line.trim().split_once(':') else {
            continue;
        };
        match field {
            "used_memory" => memory.used_memory = value.parse().unwrap_or_default(),
            "used_memory_human" => memory.used_memory_human = value.to_string(),
            "used_memory_peak" => memory.used_memory_peak = value.parse().unwrap_or_default(),
            "used_memory_peak_human" => memory.used_memory_peak_human = value.to_string(),
            "mem_fragmentation_ratio" => {
                memory.fragmentation_ratio = value.parse().unwrap_or_default();
            }
            _ => {}
        }
    }

    memory
}
