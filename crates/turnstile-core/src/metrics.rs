// Metrics for lock operations
// Counters are process-wide and labels come from a fixed set, so the number
// of series does not grow with the number of lock names in use

use metrics::{counter, describe_counter};

use turnstile_common::{Result, TurnstileError};

/// Initialize all metric descriptions
/// Should be called once at application startup
pub fn init_metrics() {
    describe_counter!(
        "turnstile_acquire_total",
        "Total number of acquire calls that obtained the lock"
    );
    describe_counter!(
        "turnstile_acquire_failed_total",
        "Total number of acquire calls that returned without the lock"
    );
    describe_counter!("turnstile_release_total", "Total number of lock releases");
    describe_counter!(
        "turnstile_reinitialize_total",
        "Total number of reinitialize drains completed"
    );
    describe_counter!("turnstile_close_total", "Total number of locks closed");
}

/// Outcome label for an acquire call; the set of values is fixed
fn acquire_outcome(outcome: &Result<Option<u64>>) -> &'static str {
    match outcome {
        Ok(Some(_)) => "acquired",
        Ok(None) => "busy",
        Err(TurnstileError::LockClosed { .. }) => "closed",
        Err(TurnstileError::LockExpired { .. }) => "expired",
        Err(_) => "error",
    }
}

pub fn record_acquire(outcome: &Result<Option<u64>>) {
    let label = acquire_outcome(outcome);
    if label == "acquired" {
        counter!("turnstile_acquire_total").increment(1);
    } else {
        counter!("turnstile_acquire_failed_total", "outcome" => label).increment(1);
    }
}

pub fn record_release() {
    counter!("turnstile_release_total").increment(1);
}

pub fn record_reinitialize() {
    counter!("turnstile_reinitialize_total").increment(1);
}

pub fn record_close() {
    counter!("turnstile_close_total").increment(1);
}
