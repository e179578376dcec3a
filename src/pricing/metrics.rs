// Pricing Metrics
//
// Counts rate cache effectiveness and bulk listing throughput so that
// slow listings and frequently failing products show up in /health.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

/// Listings slower than this are counted and logged (100ms)
const SLOW_LISTING_THRESHOLD_MS: u64 = 100;

/// Shared counters for the pricing engine
#[derive(Debug, Clone, Default)]
pub struct PricingMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,

    listings: AtomicU64,
    items_priced: AtomicU64,
    item_failures: AtomicU64,

    // microseconds
    total_listing_time_us: AtomicU64,
    slow_listings: AtomicU64,
}

impl PricingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.inner.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.inner.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one bulk pricing pass
    pub fn record_items(&self, priced: u64, failed: u64) {
        self.inner.items_priced.fetch_add(priced, Ordering::Relaxed);
        self.inner.item_failures.fetch_add(failed, Ordering::Relaxed);
    }

    /// Cache hit rate (0.0 to 1.0)
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.inner.cache_hits.load(Ordering::Relaxed);
        let misses = self.inner.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Start timing a bulk listing; the duration is recorded when the timer drops
    pub fn start_listing(&self) -> ListingTimer {
        ListingTimer {
            start: Instant::now(),
            metrics: self.clone(),
        }
    }

    fn record_listing(&self, duration: Duration) {
        self.inner.listings.fetch_add(1, Ordering::Relaxed);
        self.inner
            .total_listing_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if duration.as_millis() as u64 > SLOW_LISTING_THRESHOLD_MS {
            self.inner.slow_listings.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Slow product listing: {}ms", duration.as_millis());
        }
    }

    /// Average listing time in milliseconds
    pub fn avg_listing_time_ms(&self) -> f64 {
        let count = self.inner.listings.load(Ordering::Relaxed);
        let total_us = self.inner.total_listing_time_us.load(Ordering::Relaxed);

        if count == 0 {
            0.0
        } else {
            (total_us as f64 / count as f64) / 1000.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            cache_hit_rate: self.cache_hit_rate(),
            cache_hits: self.inner.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.inner.cache_misses.load(Ordering::Relaxed),
            listings: self.inner.listings.load(Ordering::Relaxed),
            avg_listing_time_ms: self.avg_listing_time_ms(),
            slow_listings: self.inner.slow_listings.load(Ordering::Relaxed),
            items_priced: self.inner.items_priced.load(Ordering::Relaxed),
            item_failures: self.inner.item_failures.load(Ordering::Relaxed),
        }
    }
}

/// Records one listing duration on drop
pub struct ListingTimer {
    start: Instant,
    metrics: PricingMetrics,
}

impl Drop for ListingTimer {
    fn drop(&mut self) {
        self.metrics.record_listing(self.start.elapsed());
    }
}

/// Snapshot of the pricing counters
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub cache_hit_rate: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub listings: u64,
    pub avg_listing_time_ms: f64,
    pub slow_listings: u64,
    pub items_priced: u64,
    pub item_failures: u64,
}
