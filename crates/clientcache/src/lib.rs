//! Instance-Scoped Client Cache (C6, §4.6).
//!
//! One REST client per distinct `(api_url, api_key, instance_id)` tuple,
//! keyed by [`InstanceContext::cache_key`]. Bounded by `max_entries` (LRU,
//! `updateAgeOnGet`) and `ttl_minutes`. Concurrent first-requests for the
//! same uncached key single-flight through a per-key `tokio::sync::Mutex`
//! so only one client gets constructed; everyone else waits for it and
//! reuses it (§4.6, §5, §8 Testable Property 5).
//!
//! Grounded on the teacher's `gateway::runtime::session_lock::SessionLockMap`
//! (a `parking_lot::Mutex<HashMap<String, Arc<Semaphore>>>` guarding
//! per-key async locks) — adapted here to guard client *construction*
//! rather than session admission, and paired with TTL+LRU eviction the
//! teacher's session locks don't need.

mod metrics;

pub use metrics::CacheMetricsSnapshot;
use metrics::CacheMetrics;

use n8n_mcp_domain::config::CacheConfig;
use n8n_mcp_domain::instance::InstanceContext;
use n8n_mcp_domain::Error;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;

struct CacheEntry<T> {
    client: T,
    created_at: Instant,
    last_access: Instant,
}

/// Per-instance client cache. `T` is typically an Arc-wrapped REST client;
/// it must be cheap to clone since `get_or_create` hands back an owned copy.
pub struct ClientCache<T: Clone> {
    config: CacheConfig,
    entries: SyncMutex<HashMap<String, CacheEntry<T>>>,
    key_locks: SyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    metrics: SyncMutex<CacheMetrics>,
}

impl<T: Clone> ClientCache<T> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: SyncMutex::new(HashMap::new()),
            key_locks: SyncMutex::new(HashMap::new()),
            metrics: SyncMutex::new(CacheMetrics::default()),
        }
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl_minutes * 60)
    }

    /// Returns a cached client for `ctx` if present and unexpired, bumping
    /// its LRU age. `None` on miss (expired entries are dropped on read).
    fn try_get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock();
        let ttl = self.ttl();
        let expired = entries
            .get(key)
            .map(|e| e.created_at.elapsed() > ttl)
            .unwrap_or(false);
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get_mut(key).map(|e| {
            e.last_access = Instant::now();
            e.client.clone()
        })
    }

    fn key_lock(&self, key: &str) -> Arc<AsyncMutex<()>> {
        self.key_locks
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Fast path: return a cached, unexpired client. On miss, acquire the
    /// per-key lock, re-check (another request may have just populated it),
    /// and otherwise call `factory` to build one, evicting the LRU entry
    /// first if at `max_entries`.
    pub async fn get_or_create<F, Fut>(&self, ctx: &InstanceContext, factory: F) -> Result<T, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let key = ctx.cache_key();

        if let Some(client) = self.try_get(&key) {
            self.metrics.lock().hits += 1;
            return Ok(client);
        }

        let lock = self.key_lock(&key);
        let _guard = lock.lock().await;

        // Someone else may have created it while we waited for the lock.
        if let Some(client) = self.try_get(&key) {
            self.metrics.lock().hits += 1;
            return Ok(client);
        }

        self.metrics.lock().misses += 1;
        let client = factory().await?;

        {
            let mut entries = self.entries.lock();
            if entries.len() >= self.config.max_entries && !entries.contains_key(&key) {
                if let Some(lru_key) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.last_access)
                    .map(|(k, _)| k.clone())
                {
                    entries.remove(&lru_key);
                    self.metrics.lock().evictions += 1;
                    tracing::info!(
                        evicted_key_prefix = %lru_key.chars().take(8).collect::<String>(),
                        "evicted client cache entry at capacity"
                    );
                }
            }
            let now = Instant::now();
            entries.insert(
                key.clone(),
                CacheEntry {
                    client: client.clone(),
                    created_at: now,
                    last_access: now,
                },
            );
        }
        self.metrics.lock().sets += 1;
        self.metrics.lock().record_size(self.entries.lock().len());
        tracing::debug!(
            key_prefix = %ctx.cache_key_prefix(),
            "created client cache entry"
        );

        Ok(client)
    }

    /// Drops every cached client and per-key lock.
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.clear();
        self.key_locks.lock().clear();
        let mut metrics = self.metrics.lock();
        metrics.clears += 1;
    }

    /// Sweeps entries whose TTL has elapsed. Returns the number evicted.
    pub fn sweep_expired(&self) -> usize {
        let ttl = self.ttl();
        let mut entries = self.entries.lock();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.created_at.elapsed() > ttl)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            entries.remove(key);
        }
        if !expired.is_empty() {
            self.metrics.lock().evictions += expired.len() as u64;
        }
        expired.len()
    }

    pub fn metrics(&self) -> CacheMetricsSnapshot {
        let size = self.entries.lock().len();
        self.metrics.lock().snapshot(size)
    }

    pub fn reset_metrics(&self) {
        self.metrics.lock().reset();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx(id: &str) -> InstanceContext {
        InstanceContext {
            api_url: Some("https://example.com".into()),
            api_key: Some("k".into()),
            instance_id: Some(id.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn single_flight_creates_exactly_once() {
        let cache = ClientCache::<Arc<AtomicUsize>>::new(CacheConfig {
            max_entries: 10,
            ttl_minutes: 30,
        });
        let build_count = Arc::new(AtomicUsize::new(0));
        let c = ctx("a");

        let (a, b) = tokio::join!(
            cache.get_or_create(&c, || {
                let bc = build_count.clone();
                async move {
                    bc.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok::<_, Error>(Arc::new(AtomicUsize::new(1)))
                }
            }),
            cache.get_or_create(&c, || {
                let bc = build_count.clone();
                async move {
                    bc.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Error>(Arc::new(AtomicUsize::new(2)))
                }
            })
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(build_count.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn ttl_expiry_forces_rebuild() {
        let cache = ClientCache::<u32>::new(CacheConfig {
            max_entries: 10,
            ttl_minutes: 0,
        });
        let c = ctx("b");
        cache.get_or_create(&c, || async { Ok::<_, Error>(1) }).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let v = cache.get_or_create(&c, || async { Ok::<_, Error>(2) }).await.unwrap();
        assert_eq!(v, 2);
    }

    #[tokio::test]
    async fn lru_eviction_at_capacity() {
        let cache = ClientCache::<u32>::new(CacheConfig {
            max_entries: 2,
            ttl_minutes: 30,
        });
        cache.get_or_create(&ctx("1"), || async { Ok::<_, Error>(1) }).await.unwrap();
        cache.get_or_create(&ctx("2"), || async { Ok::<_, Error>(2) }).await.unwrap();
        cache.get_or_create(&ctx("3"), || async { Ok::<_, Error>(3) }).await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.metrics().evictions, 1);
    }

    #[tokio::test]
    async fn metrics_count_hits_and_misses() {
        let cache = ClientCache::<u32>::new(CacheConfig::default());
        let c = ctx("m");
        cache.get_or_create(&c, || async { Ok::<_, Error>(1) }).await.unwrap();
        cache.get_or_create(&c, || async { Ok::<_, Error>(1) }).await.unwrap();
        let m = cache.metrics();
        assert_eq!(m.misses, 1);
        assert_eq!(m.hits, 1);
        assert_eq!(m.sets, 1);
    }

    #[tokio::test]
    async fn clear_resets_entries_and_bumps_clears_counter() {
        let cache = ClientCache::<u32>::new(CacheConfig::default());
        cache.get_or_create(&ctx("x"), || async { Ok::<_, Error>(1) }).await.unwrap();
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.metrics().clears, 1);
    }
}
