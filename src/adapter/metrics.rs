//! Metrics Implementations
//!
//! - NoopMetrics: drops everything
//! - InMemoryMetrics: atomic counters and a queue depth gauge, readable as a snapshot

use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering}
};

use serde::Serialize;

use crate::port::metrics::Metrics;

/// Sink for hosts that do not collect metrics
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn work_accepted(&self) {}

    fn work_rejected(&self) {}

    fn work_completed(&self) {}

    fn asked_for_work_while_idle(&self) {}

    fn prod_for_work(&self) {}

    fn observe_queue_depth(&self, _depth: usize) {}
}

/// Monotonic counters plus the last observed queue depth
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    work_accepted:             AtomicU64,
    work_rejected:             AtomicU64,
    work_completed:            AtomicU64,
    asked_for_work_while_idle: AtomicU64,
    prod_for_work:             AtomicU64,
    queue_depth:               AtomicUsize
}

/// Point-in-time copy of [`InMemoryMetrics`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub work_accepted:             u64,
    pub work_rejected:             u64,
    pub work_completed:            u64,
    pub asked_for_work_while_idle: u64,
    pub prod_for_work:             u64,
    pub queue_depth:               usize
}

impl InMemoryMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            work_accepted:             self.work_accepted.load(Ordering::Relaxed),
            work_rejected:             self.work_rejected.load(Ordering::Relaxed),
            work_completed:            self.work_completed.load(Ordering::Relaxed),
            asked_for_work_while_idle: self.asked_for_work_while_idle.load(Ordering::Relaxed),
            prod_for_work:             self.prod_for_work.load(Ordering::Relaxed),
            queue_depth:               self.queue_depth.load(Ordering::Relaxed)
        }
    }
}

impl Metrics for InMemoryMetrics {
    fn work_accepted(&self) {
        self.work_accepted.fetch_add(1, Ordering::Relaxed);
    }

    fn work_rejected(&self) {
        self.work_rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn work_completed(&self) {
        self.work_completed.fetch_add(1, Ordering::Relaxed);
    }

    fn asked_for_work_while_idle(&self) {
        self.asked_for_work_while_idle.fetch_add(1, Ordering::Relaxed);
    }

    fn prod_for_work(&self) {
        self.prod_for_work.fetch_add(1, Ordering::Relaxed);
    }

    fn observe_queue_depth(&self, depth: usize) {
        self.queue_depth.store(depth, Ordering::Relaxed);
    }
}
