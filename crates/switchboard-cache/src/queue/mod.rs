//! Priority job queues on store sorted sets.
//!
//! Each queue is one sorted set, `queue:<name>`. The job priority is the
//! score, and a pop takes the highest score. Redis orders equal scores by
//! member bytes and pops the greatest, so members are written as
//! `<rank>|<json>` where `rank` is a fixed-width, descending encoding of the
//! creation time. Within a priority the oldest job therefore pops first.

mod named;

pub use named::{AutomationQueue, AutomationTrigger, MessageQueue, NamedQueue, OutboundMessage};

use crate::keys::CacheKeys;
use crate::manager::collapse;
use crate::metrics::CacheMetrics;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use switchboard_core::{CacheError, CacheResult, JobId};
use switchboard_store::StoreAdapter;
use tracing::{debug, warn};

/// Width of the rank prefix; `i64::MAX` has 19 digits.
const RANK_WIDTH: usize = 19;
const RANK_SEPARATOR: char = '|';

/// Lifecycle state of a queued job.
///
/// Jobs only exist in the queue while pending; once popped the caller owns
/// them and nothing is written back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
}

/// A job as stored in a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueJob<T> {
    pub id: JobId,
    pub payload: T,
    pub priority: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: JobStatus,
}

fn encode_member(created_at: DateTime<Utc>, json: &str) -> String {
    let rank = i64::MAX.saturating_sub(created_at.timestamp_micros().max(0));
    format!("{rank:0width$}{RANK_SEPARATOR}{json}", width = RANK_WIDTH)
}

fn decode_member(member: &str) -> &str {
    match member.split_once(RANK_SEPARATOR) {
        Some((rank, json))
            if rank.len() == RANK_WIDTH && rank.bytes().all(|b| b.is_ascii_digit()) =>
        {
            json
        }
        // Members written without a rank are plain JSON.
        _ => member,
    }
}

/// Priority queue over store sorted sets.
///
/// Delivery is at-most-once: a popped job has left the store, and a job that
/// fails to decode after the pop is dropped.
#[derive(Clone)]
pub struct PriorityQueue {
    store: Arc<dyn StoreAdapter>,
    keys: CacheKeys,
}

impl PriorityQueue {
    #[must_use]
    pub fn new(store: Arc<dyn StoreAdapter>, keys: CacheKeys) -> Self {
        Self { store, keys }
    }

    /// Enqueues `payload`. Higher priorities are popped first.
    pub async fn try_add_job<T>(&self, queue: &str, payload: &T, priority: f64) -> CacheResult<JobId>
    where
        T: Serialize + ?Sized + Sync,
    {
        if !priority.is_finite() {
            return Err(CacheError::InvalidPriority(priority));
        }

        let job = QueueJob {
            id: JobId::new(),
            payload,
            priority,
            created_at: Utc::now(),
            status: JobStatus::Pending,
        };
        let member = encode_member(job.created_at, &serde_json::to_string(&job)?);

        self.store
            .sorted_set_add(&self.keys.queue(queue), &member, priority)
            .await?;

        CacheMetrics::enqueued(queue);
        debug!(queue, job_id = %job.id, priority, "Job enqueued");
        Ok(job.id)
    }

    /// Pops the highest-priority job, or `None` if the queue is empty.
    pub async fn try_get_next_job<T: DeserializeOwned>(
        &self,
        queue: &str,
    ) -> CacheResult<Option<QueueJob<T>>> {
        let Some((member, _score)) = self.store.sorted_set_pop_max(&self.keys.queue(queue)).await?
        else {
            return Ok(None);
        };
        CacheMetrics::dequeued(queue);

        let job: QueueJob<T> = serde_json::from_str(decode_member(&member)).map_err(|e| {
            warn!(queue, error = %e, "Dropped undecodable job");
            e
        })?;

        debug!(queue, job_id = %job.id, "Job dequeued");
        Ok(Some(job))
    }

    /// Number of jobs waiting in `queue`.
    pub async fn try_get_queue_length(&self, queue: &str) -> CacheResult<u64> {
        Ok(self
            .store
            .sorted_set_cardinality(&self.keys.queue(queue))
            .await?)
    }

    /// Enqueues `payload`; `None` on failure.
    pub async fn add_job<T>(&self, queue: &str, payload: &T, priority: f64) -> Option<JobId>
    where
        T: Serialize + ?Sized + Sync,
    {
        let result = self.try_add_job(queue, payload, priority).await;
        collapse("add_job", queue, result)
    }

    /// Pops the highest-priority job; `None` if empty or on failure.
    pub async fn get_next_job<T: DeserializeOwned>(&self, queue: &str) -> Option<QueueJob<T>> {
        let result = self.try_get_next_job(queue).await;
        collapse("get_next_job", queue, result).flatten()
    }

    /// Number of waiting jobs; `None` on failure.
    pub async fn get_queue_length(&self, queue: &str) -> Option<u64> {
        let result = self.try_get_queue_length(queue).await;
        collapse("get_queue_length", queue, result)
    }
}
