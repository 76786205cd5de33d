//! In-memory snapshot cache keyed by symbol.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::{StockSnapshot, Symbol};

/// How a snapshot request interacts with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Serve a fresh entry when present, otherwise fetch and store. (Default)
    #[default]
    Use,
    /// Always fetch, then store the result.
    Refresh,
    /// Always fetch and leave the cache untouched.
    Bypass,
}

impl CacheMode {
    pub const fn reads(self) -> bool {
        matches!(self, Self::Use)
    }

    pub const fn writes(self) -> bool {
        !matches!(self, Self::Bypass)
    }
}

/// Outcome of [`SnapshotCache::store`].
#[derive(Debug, Clone, PartialEq)]
pub enum CacheWrite {
    Stored,
    /// A snapshot from a later-issued request is already cached.
    Superseded(Arc<StockSnapshot>),
    /// The cache is disabled.
    Skipped,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: Arc<StockSnapshot>,
    stored_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<Symbol, CacheEntry>,
    ttl: Duration,
}

impl CacheInner {
    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.duration_since(entry.stored_at) < self.ttl
    }
}

/// Shared snapshot cache.
///
/// Writes are ordered by the snapshot's generation token: a write only lands
/// if no entry from a later-issued request is present.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                ttl,
            })),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Fresh entry for `symbol`, if any.
    pub async fn get(&self, symbol: &Symbol) -> Option<Arc<StockSnapshot>> {
        let store = self.inner.read().await;
        let entry = store.map.get(symbol)?;
        store
            .is_fresh(entry, Instant::now())
            .then(|| Arc::clone(&entry.snapshot))
    }

    pub async fn store(&self, snapshot: Arc<StockSnapshot>) -> CacheWrite {
        let mut store = self.inner.write().await;
        if store.ttl.is_zero() {
            return CacheWrite::Skipped;
        }

        if let Some(existing) = store.map.get(&snapshot.symbol) {
            if existing.snapshot.generation > snapshot.generation {
                debug!(
                    symbol = %snapshot.symbol,
                    stale = snapshot.generation,
                    current = existing.snapshot.generation,
                    "discarding superseded snapshot"
                );
                return CacheWrite::Superseded(Arc::clone(&existing.snapshot));
            }
        }

        store.map.insert(
            snapshot.symbol.clone(),
            CacheEntry {
                snapshot,
                stored_at: Instant::now(),
            },
        );
        CacheWrite::Stored
    }

    pub async fn remove(&self, symbol: &Symbol) -> bool {
        self.inner.write().await.map.remove(symbol).is_some()
    }

    pub async fn clear_expired(&self) {
        let mut store = self.inner.write().await;
        let now = Instant::now();
        let ttl = store.ttl;
        store
            .map
            .retain(|_, entry| now.duration_since(entry.stored_at) < ttl);
    }

    pub async fn clear(&self) {
        self.inner.write().await.map.clear();
    }

    /// Entry count, expired entries included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UtcDateTime;

    fn snapshot(symbol: &str, generation: u64) -> Arc<StockSnapshot> {
        Arc::new(StockSnapshot {
            symbol: Symbol::parse(symbol).expect("valid symbol"),
            profile: None,
            quote: None,
            news: Vec::new(),
            fetched_at: UtcDateTime::now(),
            failures: Vec::new(),
            generation,
            headline_limit: crate::NEWS_DISPLAY_LIMIT,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let aapl = Symbol::parse("AAPL").expect("valid symbol");

        assert_eq!(cache.store(snapshot("AAPL", 1)).await, CacheWrite::Stored);
        assert!(cache.get(&aapl).await.is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get(&aapl).await.is_none());

        cache.clear_expired().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn older_generation_does_not_overwrite_newer() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let newer = snapshot("AAPL", 7);
        cache.store(Arc::clone(&newer)).await;

        let outcome = cache.store(snapshot("AAPL", 3)).await;
        match outcome {
            CacheWrite::Superseded(current) => assert!(Arc::ptr_eq(&current, &newer)),
            other => panic!("expected superseded write, got {other:?}"),
        }

        let aapl = Symbol::parse("AAPL").expect("valid symbol");
        let cached = cache.get(&aapl).await.expect("entry present");
        assert_eq!(cached.generation, 7);
    }

    #[tokio::test]
    async fn disabled_cache_skips_writes() {
        let cache = SnapshotCache::disabled();
        assert_eq!(cache.store(snapshot("AAPL", 1)).await, CacheWrite::Skipped);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn remove_evicts_symbol() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        cache.store(snapshot("AAPL", 1)).await;
        cache.store(snapshot("TSLA", 2)).await;

        let aapl = Symbol::parse("AAPL").expect("valid symbol");
        assert!(cache.remove(&aapl).await);
        assert!(!cache.remove(&aapl).await);
        assert_eq!(cache.len().await, 1);
    }

    #[test]
    fn cache_mode_flags() {
        assert!(CacheMode::Use.reads());
        assert!(!CacheMode::Refresh.reads());
        assert!(CacheMode::Refresh.writes());
        assert!(!CacheMode::Bypass.writes());
    }
}
