//! # Switchboard Store
//!
//! Backing store adapters for the Switchboard state layer.
//!
//! - [`StoreAdapter`]: the only interface higher layers depend on
//! - [`RedisStore`]: pooled Redis adapter with lazy connections, reconnect
//!   backoff, and per-command timeouts
//! - [`MemoryStore`]: in-process adapter with Redis ordering and expiry
//!   semantics, for tests and local development

pub mod adapter;
pub mod memory;
pub mod metrics;
pub mod redis;

pub use self::adapter::{KeyTtl, MemoryInfo, StoreAdapter};
pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use std::sync::Arc;
use switchboard_config::StoreConfig;
use switchboard_core::StoreResult;
use tracing::{info, warn};

/// Builds the process-wide store handle described by `config`.
///
/// No connection is opened here; the Redis pool connects on first use.
pub fn connect(config: &StoreConfig) -> StoreResult<Arc<dyn StoreAdapter>> {
    if config.enabled {
        let store = RedisStore::new(config)?;
        info!(backend = store.backend(), "Store adapter configured");
        Ok(Arc::new(store))
    } else {
        warn!("Store disabled; using in-process memory store");
        Ok(Arc::new(MemoryStore::new()))
    }
}
