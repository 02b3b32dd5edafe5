//! Store command metrics.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Store command duration in seconds, labelled by command and outcome.
pub const COMMAND_DURATION_SECONDS: &str = "switchboard_store_command_duration_seconds";
/// Store command failures, labelled by command and error kind.
pub const COMMAND_ERRORS_TOTAL: &str = "switchboard_store_command_errors_total";
/// Connection acquisition retries.
pub const RECONNECT_ATTEMPTS_TOTAL: &str = "switchboard_store_reconnect_attempts_total";

/// Register metric descriptions.
pub fn register_metrics() {
    describe_histogram!(
        COMMAND_DURATION_SECONDS,
        "Backing store command duration in seconds"
    );
    describe_counter!(COMMAND_ERRORS_TOTAL, "Backing store command failures");
    describe_counter!(
        RECONNECT_ATTEMPTS_TOTAL,
        "Retries while acquiring a backing store connection"
    );
}

pub(crate) fn record_command(command: &'static str, duration: Duration, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    histogram!(COMMAND_DURATION_SECONDS, "command" => command, "outcome" => outcome)
        .record(duration.as_secs_f64());
}

pub(crate) fn record_error(command: &'static str, kind: &'static str) {
    counter!(COMMAND_ERRORS_TOTAL, "command" => command, "kind" => kind).increment(1);
}

pub(crate) fn record_reconnect_attempt() {
    counter!(RECONNECT_ATTEMPTS_TOTAL).increment(1);
}
