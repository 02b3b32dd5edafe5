//! Metrics for the cache components.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Metric names for the state layer.
pub mod names {
    /// Cache reads that found a value.
    pub const CACHE_HITS_TOTAL: &str = "switchboard_cache_hits_total";
    /// Cache reads that found nothing.
    pub const CACHE_MISSES_TOTAL: &str = "switchboard_cache_misses_total";
    /// Cache operations that failed and were reported as a miss or `false`.
    pub const CACHE_ERRORS_TOTAL: &str = "switchboard_cache_errors_total";

    /// Rate limit decisions, labelled by outcome.
    pub const RATE_LIMIT_DECISIONS_TOTAL: &str = "switchboard_rate_limit_decisions_total";

    /// Jobs added to a queue.
    pub const QUEUE_ENQUEUED_TOTAL: &str = "switchboard_queue_enqueued_total";
    /// Jobs popped from a queue.
    pub const QUEUE_DEQUEUED_TOTAL: &str = "switchboard_queue_dequeued_total";

    /// Health probe round trip in seconds.
    pub const HEALTH_PROBE_SECONDS: &str = "switchboard_health_probe_seconds";
}

/// Register all metric descriptions, including the store adapter's.
pub fn register_metrics() {
    describe_counter!(names::CACHE_HITS_TOTAL, "Total number of cache hits");
    describe_counter!(names::CACHE_MISSES_TOTAL, "Total number of cache misses");
    describe_counter!(
        names::CACHE_ERRORS_TOTAL,
        "Total number of cache operations that failed"
    );
    describe_counter!(
        names::RATE_LIMIT_DECISIONS_TOTAL,
        "Rate limit decisions (allowed, rejected, fail_open)"
    );
    describe_counter!(
        names::QUEUE_ENQUEUED_TOTAL,
        "Total number of jobs added to a queue"
    );
    describe_counter!(
        names::QUEUE_DEQUEUED_TOTAL,
        "Total number of jobs popped from a queue"
    );
    describe_histogram!(
        names::HEALTH_PROBE_SECONDS,
        "Backing store health probe round trip in seconds"
    );

    switchboard_store::metrics::register_metrics();
}

/// Cache metrics recorder.
pub struct CacheMetrics;

impl CacheMetrics {
    /// Record a read that found a value.
    pub fn hit(component: &'static str) {
        counter!(names::CACHE_HITS_TOTAL, "component" => component).increment(1);
    }

    /// Record a read that found nothing.
    pub fn miss(component: &'static str) {
        counter!(names::CACHE_MISSES_TOTAL, "component" => component).increment(1);
    }

    /// Record a failure collapsed into a miss or `false`.
    pub fn error(component: &'static str, operation: &'static str, kind: &'static str) {
        counter!(
            names::CACHE_ERRORS_TOTAL,
            "component" => component,
            "operation" => operation,
            "kind" => kind
        )
        .increment(1);
    }

    /// Record a rate limit decision.
    pub fn rate_limit(outcome: &'static str) {
        counter!(names::RATE_LIMIT_DECISIONS_TOTAL, "outcome" => outcome).increment(1);
    }

    /// Record a job added to a queue.
    pub fn enqueued(queue: &str) {
        counter!(names::QUEUE_ENQUEUED_TOTAL, "queue" => queue.to_string()).increment(1);
    }

    /// Record a job popped from a queue.
    pub fn dequeued(queue: &str) {
        counter!(names::QUEUE_DEQUEUED_TOTAL, "queue" => queue.to_string()).increment(1);
    }

    /// Record a health probe round trip.
    pub fn health_probe(duration: Duration, healthy: bool) {
        let status = if healthy { "healthy" } else { "unhealthy" };
        histogram!(names::HEALTH_PROBE_SECONDS, "status" => status)
            .record(duration.as_secs_f64());
    }
}
