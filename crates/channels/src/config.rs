//! Feed drop policy and per-channel counters

use std::sync::atomic::{AtomicU64, Ordering};

/// What to drop when the feed is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropPolicy {
    /// Discard the sentence being pushed
    #[default]
    DropNewest,
    /// Evict the oldest queued sentence to make room
    DropOldest,
}

/// Channel counters
#[derive(Debug, Default)]
pub struct ChannelMetrics {
    pub sentences_received: AtomicU64,
    pub sentences_dropped: AtomicU64,
    pub sentences_filtered: AtomicU64,
    pub bytes_received: AtomicU64,
}

impl ChannelMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self, bytes: usize) {
        self.sentences_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.sentences_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_filtered(&self) {
        self.sentences_filtered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sentences_received: self.sentences_received.load(Ordering::Relaxed),
            sentences_dropped: self.sentences_dropped.load(Ordering::Relaxed),
            sentences_filtered: self.sentences_filtered.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `ChannelMetrics`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub sentences_received: u64,
    pub sentences_dropped: u64,
    pub sentences_filtered: u64,
    pub bytes_received: u64,
}
