//! In-process dispatch counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// Point-in-time copy of the collector
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub timestamp: SystemTime,
    pub commands_received: u64,
    pub commands_denied: u64,
    pub commands_failed: u64,
    pub whitelist_mutations: u64,
}

#[derive(Debug, Default)]
pub struct MetricsCollector {
    commands_received: AtomicU64,
    commands_denied: AtomicU64,
    commands_failed: AtomicU64,
    whitelist_mutations: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_received(&self) {
        self.commands_received.fetch_add(1, Ordering::Relaxed);
        super::record_counter(super::COMMANDS_RECEIVED, 1);
    }

    pub fn inc_denied(&self) {
        self.commands_denied.fetch_add(1, Ordering::Relaxed);
        super::record_counter(super::COMMANDS_DENIED, 1);
    }

    pub fn inc_failed(&self) {
        self.commands_failed.fetch_add(1, Ordering::Relaxed);
        super::record_counter(super::COMMANDS_FAILED, 1);
    }

    pub fn inc_mutations(&self) {
        self.whitelist_mutations.fetch_add(1, Ordering::Relaxed);
        super::record_counter(super::WHITELIST_MUTATIONS, 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: SystemTime::now(),
            commands_received: self.commands_received.load(Ordering::Relaxed),
            commands_denied: self.commands_denied.load(Ordering::Relaxed),
            commands_failed: self.commands_failed.load(Ordering::Relaxed),
            whitelist_mutations: self.whitelist_mutations.load(Ordering::Relaxed),
        }
    }
}
