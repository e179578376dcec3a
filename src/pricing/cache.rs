// Rate Cache
//
// Keeps recently read agent, client and consultant level records in memory
// with a time-to-live. Entries may be up to one TTL stale; writers that
// change a rate call `invalidate` so the next read goes to the store.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::models::{Agent, Client, ConsultantLevelRecord, EntityId};
use crate::pricing::{metrics::PricingMetrics, types::ConsultantLevel};

/// Default time-to-live for cached rate records (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// What a cache entry is keyed on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Agent(EntityId),
    Client(EntityId),
    ConsultantLevel(ConsultantLevel),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Agent(id) => write!(f, "agent:{}", id),
            CacheKey::Client(id) => write!(f, "client:{}", id),
            CacheKey::ConsultantLevel(level) => write!(f, "consultantLevel:{}", level),
        }
    }
}

/// A cached record; only records that were found are ever stored
#[derive(Debug, Clone, PartialEq)]
pub enum CachedRecord {
    Agent(Agent),
    Client(Client),
    ConsultantLevel(ConsultantLevelRecord),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    record: CachedRecord,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

/// TTL cache shared by every request
pub struct RateCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    metrics: Option<PricingMetrics>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            metrics: None,
        }
    }

    /// Attach metrics so hits and misses are counted
    pub fn with_metrics(mut self, metrics: PricingMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh record for a key, if any
    pub async fn get(&self, key: &CacheKey) -> Option<CachedRecord> {
        let hit = {
            let entries = self.entries.read().await;
            entries
                .get(key)
                .filter(|entry| !entry.is_expired(self.ttl))
                .map(|entry| entry.record.clone())
        };

        if let Some(ref metrics) = self.metrics {
            match hit {
                Some(_) => metrics.record_cache_hit(),
                None => metrics.record_cache_miss(),
            }
        }
        hit
    }

    pub async fn set(&self, key: CacheKey, record: CachedRecord) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                record,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop a key so the next read reloads it
    pub async fn invalidate(&self, key: &CacheKey) {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            tracing::debug!(%key, "Rate cache entry invalidated");
        }
    }

    /// Remove expired entries, returning how many were dropped
    pub async fn sweep(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.ttl));
        before - entries.len()
    }

    /// Number of stored entries, expired or not
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn get_agent(&self, id: &EntityId) -> Option<Agent> {
        match self.get(&CacheKey::Agent(id.clone())).await {
            Some(CachedRecord::Agent(agent)) => Some(agent),
            _ => None,
        }
    }

    pub async fn get_client(&self, id: &EntityId) -> Option<Client> {
        match self.get(&CacheKey::Client(id.clone())).await {
            Some(CachedRecord::Client(client)) => Some(client),
            _ => None,
        }
    }

    pub async fn get_level(&self, level: ConsultantLevel) -> Option<ConsultantLevelRecord> {
        match self.get(&CacheKey::ConsultantLevel(level)).await {
            Some(CachedRecord::ConsultantLevel(record)) => Some(record),
            _ => None,
        }
    }

    /// Periodically sweep expired entries until the runtime shuts down
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.sweep().await;
                if removed > 0 {
                    tracing::debug!(removed, "Swept expired rate cache entries");
                }
            }
        })
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn agent(id: &str, rate: rust_decimal::Decimal) -> Agent {
        Agent {
            id: EntityId::parse(id).unwrap(),
            name: "Test Agent".to_string(),
            commission_rate: rate,
            category_commissions: HashMap::new(),
        }
    }

    #[test]
    fn test_cache_key_display() {
        let id = EntityId::parse("a1").unwrap();
        assert_eq!(CacheKey::Agent(id.clone()).to_string(), "agent:a1");
        assert_eq!(CacheKey::Client(id).to_string(), "client:a1");
        assert_eq!(
            CacheKey::ConsultantLevel(ConsultantLevel::Red).to_string(),
            "consultantLevel:red"
        );
    }

    #[tokio::test]
    async fn test_set_then_get_returns_record() {
        let cache = RateCache::new();
        let record = agent("a1", dec!(8));
        cache
            .set(CacheKey::Agent(record.id.clone()), CachedRecord::Agent(record.clone()))
            .await;

        assert_eq!(cache.get_agent(&record.id).await, Some(record));
    }

    #[tokio::test]
    async fn test_zero_ttl_is_always_expired() {
        let cache = RateCache::with_ttl(Duration::ZERO);
        let record = agent("a1", dec!(8));
        cache
            .set(CacheKey::Agent(record.id.clone()), CachedRecord::Agent(record.clone()))
            .await;

        assert_eq!(cache.get_agent(&record.id).await, None);
        assert_eq!(cache.sweep().await, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidate_forces_miss() {
        let metrics = PricingMetrics::new();
        let cache = RateCache::new().with_metrics(metrics.clone());
        let record = agent("a1", dec!(8));
        let key = CacheKey::Agent(record.id.clone());
        cache.set(key.clone(), CachedRecord::Agent(record)).await;

        assert!(cache.get(&key).await.is_some());
        cache.invalidate(&key).await;
        assert!(cache.get(&key).await.is_none());

        let summary = metrics.summary();
        assert_eq!(summary.cache_hits, 1);
        assert_eq!(summary.cache_misses, 1);
    }

    #[tokio::test]
    async fn test_typed_getter_ignores_mismatched_record() {
        let cache = RateCache::new();
        let id = EntityId::parse("x1").unwrap();
        cache
            .set(CacheKey::Agent(id.clone()), CachedRecord::Agent(agent("x1", dec!(1))))
            .await;

        assert_eq!(cache.get_client(&id).await, None);
        assert_eq!(cache.get_level(ConsultantLevel::Red).await, None);
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_entries() {
        let cache = RateCache::new();
        cache
            .set(CacheKey::Agent(EntityId::parse("a1").unwrap()), CachedRecord::Agent(agent("a1", dec!(2))))
            .await;

        assert_eq!(cache.sweep().await, 0);
        assert_eq!(cache.len().await, 1);
    }
}
