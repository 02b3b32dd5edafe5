//! In-process store adapter.
//!
//! Mirrors the Redis semantics the cache components rely on: lazy expiry,
//! `TTL` rounding, integer counters stored as strings, sorted sets ordered by
//! `(score, member)`, and `WRONGTYPE` errors on type mismatches. Expiry runs on
//! the tokio clock, so tests can pause and advance time.

use crate::adapter::{KeyTtl, MemoryInfo, StoreAdapter};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;
use switchboard_core::{StoreError, StoreResult};
use tokio::time::Instant;

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

#[derive(Debug)]
enum Value {
    Str(String),
    SortedSet(Vec<(f64, String)>),
}

impl Value {
    fn approximate_size(&self) -> usize {
        match self {
            Self::Str(s) => s.len(),
            Self::SortedSet(members) => members.iter().map(|(_, m)| m.len() + 8).sum(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

fn compare_members(a: &(f64, String), b: &(f64, String)) -> Ordering {
    a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1))
}

fn wrong_type() -> StoreError {
    StoreError::Command(WRONGTYPE.to_string())
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "K", "M", "G"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes}B")
    } else {
        format!("{value:.2}{}", UNITS[unit])
    }
}

/// In-process store with Redis-compatible semantics.
///
/// State is private to the process, so it is only suitable for tests and
/// single-instance development. [`MemoryStore::set_available`] simulates an
/// outage: every operation then fails with `StoreError::Unavailable`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    offline: AtomicBool,
    peak_bytes: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the store reachable or unreachable.
    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, AtomicOrdering::SeqCst);
    }

    /// Returns true unless an outage is being simulated.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.offline.load(AtomicOrdering::SeqCst)
    }

    /// Removes every key.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn check(&self) -> StoreResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::Unavailable(
                "memory store is marked unavailable".to_string(),
            ))
        }
    }

    /// Runs `f` against the live map after dropping `key` if it has expired.
    fn with_key<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut HashMap<String, Entry>, Instant) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.check()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        let result = f(&mut entries, now);

        let used: usize = entries
            .iter()
            .map(|(k, e)| k.len() + e.value.approximate_size())
            .sum();
        self.peak_bytes.fetch_max(used as u64, AtomicOrdering::Relaxed);

        result
    }
}

#[async_trait]
impl StoreAdapter for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.with_key(key, |entries, _| match entries.get(key) {
            None => Ok(None),
            Some(Entry {
                value: Value::Str(s),
                ..
            }) => Ok(Some(s.clone())),
            Some(_) => Err(wrong_type()),
        })
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.with_key(key, |entries, _| {
            entries.insert(key.to_string(), Entry::new(Value::Str(value.to_string())));
            Ok(())
        })
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        if ttl_secs == 0 {
            return Err(StoreError::Command(
                "ERR invalid expire time in 'setex' command".to_string(),
            ));
        }
        self.with_key(key, |entries, now| {
            entries.insert(
                key.to_string(),
                Entry {
                    value: Value::Str(value.to_string()),
                    expires_at: Some(now + Duration::from_secs(ttl_secs)),
                },
            );
            Ok(())
        })
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.with_key(key, |entries, _| Ok(entries.remove(key).is_some()))
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.with_key(key, |entries, _| Ok(entries.contains_key(key)))
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> StoreResult<bool> {
        self.with_key(key, |entries, now| {
            if ttl_secs == 0 {
                return Ok(entries.remove(key).is_some());
            }
            match entries.get_mut(key) {
                Some(entry) => {
                    entry.expires_at = Some(now + Duration::from_secs(ttl_secs));
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl> {
        self.with_key(key, |entries, now| {
            Ok(match entries.get(key) {
                None => KeyTtl::Missing,
                Some(Entry {
                    expires_at: None, ..
                }) => KeyTtl::Persistent,
                Some(Entry {
                    expires_at: Some(at),
                    ..
                }) => {
                    // Same rounding as Redis: (ms + 500) / 1000.
                    let millis = at.saturating_duration_since(now).as_millis();
                    KeyTtl::Expires(u64::try_from((millis + 500) / 1000).unwrap_or(u64::MAX))
                }
            })
        })
    }

    async fn increment(&self, key: &str) -> StoreResult<i64> {
        self.with_key(key, |entries, _| {
            let entry = entries
                .entry(key.to_string())
                .or_insert_with(|| Entry::new(Value::Str("0".to_string())));
            let Value::Str(current) = &mut entry.value else {
                return Err(wrong_type());
            };
            let next = current
                .parse::<i64>()
                .ok()
                .and_then(|n| n.checked_add(1))
                .ok_or_else(|| {
                    StoreError::Command("ERR value is not an integer or out of range".to_string())
                })?;
            *current = next.to_string();
            Ok(next)
        })
    }

    async fn keys_by_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.check()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, e| !e.is_expired(now));
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn sorted_set_add(&self, key: &str, member: &str, score: f64) -> StoreResult<()> {
        if score.is_nan() {
            return Err(StoreError::Command("ERR value is not a valid float".to_string()));
        }
        self.with_key(key, |entries, _| {
            let entry = entries
                .entry(key.to_string())
                .or_insert_with(|| Entry::new(Value::SortedSet(Vec::new())));
            let Value::SortedSet(members) = &mut entry.value else {
                return Err(wrong_type());
            };
            members.retain(|(_, m)| m != member);
            let item = (score, member.to_string());
            let position = members
                .binary_search_by(|probe| compare_members(probe, &item))
                .unwrap_or_else(|p| p);
            members.insert(position, item);
            Ok(())
        })
    }

    async fn sorted_set_pop_max(&self, key: &str) -> StoreResult<Option<(String, f64)>> {
        self.with_key(key, |entries, _| {
            let Some(entry) = entries.get_mut(key) else {
                return Ok(None);
            };
            let Value::SortedSet(members) = &mut entry.value else {
                return Err(wrong_type());
            };
            let popped = members.pop().map(|(score, member)| (member, score));
            if members.is_empty() {
                entries.remove(key);
            }
            Ok(popped)
        })
    }

    async fn sorted_set_cardinality(&self, key: &str) -> StoreResult<u64> {
        self.with_key(key, |entries, _| match entries.get(key) {
            None => Ok(0),
            Some(Entry {
                value: Value::SortedSet(members),
                ..
            }) => Ok(members.len() as u64),
            Some(_) => Err(wrong_type()),
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }

    async fn memory_info(&self) -> StoreResult<MemoryInfo> {
        self.check()?;
        let used = self
            .entries
            .lock()
            .iter()
            .map(|(k, e)| k.len() + e.value.approximate_size())
            .sum::<usize>() as u64;
        let peak = self.peak_bytes.load(AtomicOrdering::Relaxed).max(used);

        Ok(MemoryInfo {
            used_memory: used,
            used_memory_human: human_bytes(used),
            used_memory_peak: peak,
            used_memory_peak_human: human_bytes(peak),
            fragmentation_ratio: 1.0,
        })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
