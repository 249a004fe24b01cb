//! Orchestration metrics.
//!
//! Only records through the `metrics` facade; the binary decides which
//! recorder (if any) is installed.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const CACHE_LOOKUPS_TOTAL: &str = "vyral_cache_lookups_total";
    pub const CACHE_WRITES_TOTAL: &str = "vyral_cache_writes_total";
    pub const PROVIDER_ATTEMPTS_TOTAL: &str = "vyral_provider_attempts_total";
    pub const POLL_TICKS_TOTAL: &str = "vyral_poll_ticks_total";
    pub const WEBHOOK_DELIVERIES_TOTAL: &str = "vyral_webhook_deliveries_total";
    pub const JOBS_TOTAL: &str = "vyral_jobs_total";
    pub const JOB_DURATION_SECONDS: &str = "vyral_job_duration_seconds";
}

/// Record a cache lookup (`hit`, `miss` or `error`).
pub fn record_cache_lookup(operation: &str, result: &'static str) {
    let labels = [
        ("operation", operation.to_string()),
        ("result", result.to_string()),
    ];
    counter!(names::CACHE_LOOKUPS_TOTAL, &labels).increment(1);
}

/// Record a cache write (`ok` or `error`).
pub fn record_cache_write(operation: &str, result: &'static str) {
    let labels = [
        ("operation", operation.to_string()),
        ("result", result.to_string()),
    ];
    counter!(names::CACHE_WRITES_TOTAL, &labels).increment(1);
}

/// Record one candidate attempt.
pub fn record_provider_attempt(operation: &str, candidate: &str, outcome: &'static str) {
    let labels = [
        ("operation", operation.to_string()),
        ("candidate", candidate.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::PROVIDER_ATTEMPTS_TOTAL, &labels).increment(1);
}

/// Record a status check of a long-running provider job.
pub fn record_poll_tick(operation: &str, status: &'static str) {
    let labels = [
        ("operation", operation.to_string()),
        ("status", status.to_string()),
    ];
    counter!(names::POLL_TICKS_TOTAL, &labels).increment(1);
}

/// Record a webhook delivery attempt (`delivered` or `failed`).
pub fn record_webhook_delivery(outcome: &'static str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::WEBHOOK_DELIVERIES_TOTAL, &labels).increment(1);
}

/// Record a finished job.
pub fn record_job(operation: &str, status: &str, cached: bool, duration_secs: f64) {
    let labels = [
        ("operation", operation.to_string()),
        ("status", status.to_string()),
        ("cached", cached.to_string()),
    ];
    counter!(names::JOBS_TOTAL, &labels).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, &labels).record(duration_secs);
}
