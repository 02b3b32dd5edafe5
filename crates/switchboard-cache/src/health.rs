//! Backing store health probe.

use crate::metrics::CacheMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use switchboard_core::StoreResult;
use switchboard_store::{MemoryInfo, StoreAdapter};
use tracing::warn;

/// Overall store health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of one health probe.
///
/// A healthy report carries the round-trip time and a memory snapshot; an
/// unhealthy one carries the raw store error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Probes the backing store.
#[derive(Clone)]
pub struct HealthMonitor {
    store: Arc<dyn StoreAdapter>,
}

impl HealthMonitor {
    #[must_use]
    pub fn new(store: Arc<dyn StoreAdapter>) -> Self {
        Self { store }
    }

    /// Pings the store, timing the round trip, and fetches a memory snapshot.
    ///
    /// Never fails; a store error is reported in the unhealthy report.
    pub async fn check_health(&self) -> HealthReport {
        let started = Instant::now();
        let result = self.probe(started).await;
        let elapsed = started.elapsed();
        let backend = self.store.backend().to_string();
        let checked_at = Utc::now();

        match result {
            Ok((response_time_ms, memory)) => {
                CacheMetrics::health_probe(elapsed, true);
                HealthReport {
                    status: HealthStatus::Healthy,
                    backend,
                    response_time_ms: Some(response_time_ms),
                    memory: Some(memory),
                    error: None,
                    checked_at,
                }
            }
            Err(e) => {
                CacheMetrics::health_probe(elapsed, false);
                warn!(backend = %backend, error = %e, "Store health check failed");
                HealthReport {
                    status: HealthStatus::Unhealthy,
                    backend,
                    response_time_ms: None,
                    memory: None,
                    error: Some(e.to_string()),
                    checked_at,
                }
            }
        }
    }

    async fn probe(&self, started: Instant) -> StoreResult<(u64, MemoryInfo)> {
        self.store.ping().await?;
        let response_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let memory = self.store.memory_info().await?;
        Ok((response_time_ms, memory))
    }
}
