//! Lock-free operation counters.
//!
//! All counters are relaxed atomics — they order nothing and cost one
//! fetch-add per operation; the maxima use a compare-and-swap reduction.
//! Recording happens outside the engine lock.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of the engine's operation counters. Averages are
/// `total / count`, zero when no operations have run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stats {
    pub get_count: u64,
    pub put_count: u64,
    pub avg_get_us: f64,
    pub avg_put_us: f64,
    pub max_get_us: u64,
    pub max_put_us: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    get_count: AtomicU64,
    put_count: AtomicU64,
    total_get_us: AtomicU64,
    total_put_us: AtomicU64,
    max_get_us: AtomicU64,
    max_put_us: AtomicU64,
}

impl StatsRecorder {
    pub(crate) fn record_get(&self, micros: u64) {
        self.total_get_us.fetch_add(micros, Ordering::Relaxed);
        self.get_count.fetch_add(1, Ordering::Relaxed);
        update_max(&self.max_get_us, micros);
    }

    pub(crate) fn record_put(&self, micros: u64) {
        self.total_put_us.fetch_add(micros, Ordering::Relaxed);
        self.put_count.fetch_add(1, Ordering::Relaxed);
        update_max(&self.max_put_us, micros);
    }

    pub(crate) fn snapshot(&self) -> Stats {
        let get_count = self.get_count.load(Ordering::Relaxed);
        let put_count = self.put_count.load(Ordering::Relaxed);
        let total_get_us = self.total_get_us.load(Ordering::Relaxed);
        let total_put_us = self.total_put_us.load(Ordering::Relaxed);

        Stats {
            get_count,
            put_count,
            avg_get_us: average(total_get_us, get_count),
            avg_put_us: average(total_put_us, put_count),
            max_get_us: self.max_get_us.load(Ordering::Relaxed),
            max_put_us: self.max_put_us.load(Ordering::Relaxed),
        }
    }
}

fn average(total: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Raises `slot` to at least `value` without a lock.
fn update_max(slot: &AtomicU64, value: u64) {
    let mut current = slot.load(Ordering::Relaxed);
    while value > current {
        match slot.compare_exchange_weak(current, value, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(observed) => current = observed,
        }
    }
}
