// Cache statistics: hit counts, upstream fetches, initialization and fallback activity.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub primary_hits: u64,
    pub upstream_fetches: u64,
    pub initializations: u64,
    pub init_failures: u64,
    pub fallback_hits: u64,
    pub fallback_fetches: u64,
    pub hit_rate: f64,
}

pub struct StatsCollector {
    primary_hits: AtomicU64,
    upstream_fetches: AtomicU64,
    initializations: AtomicU64,
    init_failures: AtomicU64,
    fallback_hits: AtomicU64,
    fallback_fetches: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            primary_hits: AtomicU64::new(0),
            upstream_fetches: AtomicU64::new(0),
            initializations: AtomicU64::new(0),
            init_failures: AtomicU64::new(0),
            fallback_hits: AtomicU64::new(0),
            fallback_fetches: AtomicU64::new(0),
        }
    }

    /// A read answered from the ready primary cache.
    pub fn record_primary_hit(&self) {
        self.primary_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// One outbound request issued on behalf of the cache.
    pub fn record_upstream_fetch(&self) {
        self.upstream_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_initialization(&self) {
        self.initializations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_init_failure(&self) {
        self.init_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A read answered from the fallback tier without a fetch.
    pub fn record_fallback_hit(&self) {
        self.fallback_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback_fetch(&self) {
        self.fallback_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn upstream_fetches(&self) -> u64 {
        self.upstream_fetches.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let primary_hits = self.primary_hits.load(Ordering::Relaxed);
        let fallback_hits = self.fallback_hits.load(Ordering::Relaxed);
        let initializations = self.initializations.load(Ordering::Relaxed);
        let fallback_fetches = self.fallback_fetches.load(Ordering::Relaxed);

        let hits = primary_hits + fallback_hits;
        let total = hits + initializations + fallback_fetches;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        StatsSnapshot {
            primary_hits,
            upstream_fetches: self.upstream_fetches.load(Ordering::Relaxed),
            initializations,
            init_failures: self.init_failures.load(Ordering::Relaxed),
            fallback_hits,
            fallback_fetches,
            hit_rate,
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
