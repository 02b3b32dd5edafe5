//! The store adapter interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use switchboard_core::StoreResult;

/// Remaining lifetime of a key, as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key does not exist.
    Missing,
    /// The key exists and never expires.
    Persistent,
    /// The key expires in this many seconds.
    Expires(u64),
}

impl KeyTtl {
    /// Maps the integer reply of the `TTL` command (`-2`, `-1`, or seconds).
    #[must_use]
    pub fn from_reply(reply: i64) -> Self {
        match reply {
            -2 => Self::Missing,
            r if r < 0 => Self::Persistent,
            r => Self::Expires(r.unsigned_abs()),
        }
    }

    /// Seconds until expiry, if the key expires.
    #[must_use]
    pub const fn seconds(self) -> Option<u64> {
        match self {
            Self::Expires(secs) => Some(secs),
            Self::Missing | Self::Persistent => None,
        }
    }
}

/// Store-level memory snapshot used by health checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryInfo {
    /// Bytes allocated by the store.
    pub used_memory: u64,
    /// Human-readable form of `used_memory`.
    pub used_memory_human: String,
    /// Peak bytes allocated.
    pub used_memory_peak: u64,
    /// Human-readable form of `used_memory_peak`.
    pub used_memory_peak_human: String,
    /// Ratio of resident memory to allocated memory.
    pub fragmentation_ratio: f64,
}

/// Thin interface over the backing key-value store.
///
/// Every method is a network round trip for remote implementations and
/// reports failures as [`switchboard_core::StoreError`]; nothing here swallows
/// errors. Implementations must be safe to share between tasks.
#[async_trait]
pub trait StoreAdapter: Send + Sync {
    /// Reads a string value.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes a string value without expiry.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Writes a string value that expires after `ttl_secs` seconds.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()>;

    /// Deletes a key. Returns `true` if it existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Returns `true` if the key exists.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Sets a key's expiry. Returns `false` if the key does not exist.
    async fn expire(&self, key: &str, ttl_secs: u64) -> StoreResult<bool>;

    /// Returns a key's remaining lifetime.
    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl>;

    /// Atomically increments an integer counter, creating it at 0 first.
    async fn increment(&self, key: &str) -> StoreResult<i64>;

    /// Lists keys that start with `prefix`, in store enumeration order.
    async fn keys_by_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Adds `member` to a sorted set with `score`, replacing its score if present.
    async fn sorted_set_add(&self, key: &str, member: &str, score: f64) -> StoreResult<()>;

    /// Atomically removes and returns the member with the highest score.
    ///
    /// Equal scores are ordered lexicographically by member; the greatest wins.
    async fn sorted_set_pop_max(&self, key: &str) -> StoreResult<Option<(String, f64)>>;

    /// Returns the number of members of a sorted set (0 if absent).
    async fn sorted_set_cardinality(&self, key: &str) -> StoreResult<u64>;

    /// Round-trip liveness probe.
    async fn ping(&self) -> StoreResult<()>;

    /// Store memory usage snapshot.
    async fn memory_info(&self) -> StoreResult<MemoryInfo>;

    /// Name of the backend, for logs and health reports.
    fn backend(&self) -> &'static str;
}
