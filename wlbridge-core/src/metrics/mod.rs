//! Metrics for command dispatch and the audit trail
//!
//! Counters go through the `metrics` facade, so they cost nothing until a
//! recorder is installed. [`MetricsCollector`] keeps an in-process copy of
//! the same numbers for the local status command.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

mod collector;

pub use collector::{MetricsCollector, MetricsSnapshot};

pub const COMMANDS_RECEIVED: &str = "commands.received";
pub const COMMANDS_DENIED: &str = "commands.denied";
pub const COMMANDS_FAILED: &str = "commands.failed";
pub const WHITELIST_MUTATIONS: &str = "whitelist.mutations";
pub const AUDIT_WRITE_FAILURES: &str = "audit.write_failures";
pub const DISPATCH_DURATION_MS: &str = "dispatch.duration_ms";

/// Register metric descriptions with the installed recorder
pub fn init_metrics() {
    describe_counter!(COMMANDS_RECEIVED, "Messages that resolved to a registered command");
    describe_counter!(COMMANDS_DENIED, "Recognized commands refused by the authorization policy");
    describe_counter!(COMMANDS_FAILED, "Handler invocations that errored or panicked");
    describe_counter!(WHITELIST_MUTATIONS, "Add/remove calls that changed the whitelist");
    describe_counter!(AUDIT_WRITE_FAILURES, "Audit records that could not be written");
    describe_histogram!(DISPATCH_DURATION_MS, "Handler run time in milliseconds");
}

pub fn record_counter(name: &'static str, value: u64) {
    counter!(name).increment(value);
}

/// Records elapsed milliseconds into a histogram when stopped
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    pub fn stop(self) {
        let duration = self.start.elapsed();
        histogram!(self.name).record(duration.as_secs_f64() * 1000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_without_recorder() {
        init_metrics();
        record_counter(COMMANDS_RECEIVED, 1);
        Timer::new(DISPATCH_DURATION_MS).stop();
    }
}
