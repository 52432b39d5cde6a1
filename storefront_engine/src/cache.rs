//! Time-bounded caches for expensive order queries.
//!
//! [`TtlCache`] is a small thread-safe map whose entries stop being returned once they are older than the cache's
//! time-to-live. [`OrderCache`] bundles the two caches the order API uses, and is cheap to clone: every clone shares
//! the same underlying storage, so a write through one API instance invalidates the cache seen by all the others.
use std::{
    borrow::Borrow,
    hash::Hash,
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use log::*;

use crate::sf_api::order_objects::{OrderPage, OrderStats};

pub const ORDER_LIST_TTL: Duration = Duration::from_secs(120);
pub const ORDER_STATS_TTL: Duration = Duration::from_secs(300);

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: DashMap<K, CacheEntry<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: DashMap::new() }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a copy of the cached value, if there is one and it has not expired.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).filter(|e| e.inserted_at.elapsed() < self.ttl).map(|e| e.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(key, CacheEntry { value, inserted_at: Instant::now() });
    }

    pub fn invalidate<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.inserted_at.elapsed() < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The listing (keyed by the serialized query) and statistics caches used by [`crate::OrderApi`].
#[derive(Clone)]
pub struct OrderCache {
    listings: Arc<TtlCache<String, OrderPage>>,
    stats: Arc<TtlCache<(), OrderStats>>,
}

impl Default for OrderCache {
    fn default() -> Self {
        Self::new(ORDER_LIST_TTL, ORDER_STATS_TTL)
    }
}

impl OrderCache {
    pub fn new(list_ttl: Duration, stats_ttl: Duration) -> Self {
        Self { listings: Arc::new(TtlCache::new(list_ttl)), stats: Arc::new(TtlCache::new(stats_ttl)) }
    }

    pub fn listing(&self, key: &str) -> Option<OrderPage> {
        let hit = self.listings.get(key);
        trace!("📦️ Order listing cache {}", if hit.is_some() { "hit" } else { "miss" });
        hit
    }

    pub fn store_listing(&self, key: String, page: OrderPage) {
        self.listings.insert(key, page);
    }

    pub fn stats(&self) -> Option<OrderStats> {
        self.stats.get(&())
    }

    pub fn store_stats(&self, stats: OrderStats) {
        self.stats.insert((), stats);
    }

    pub fn clear(&self) {
        self.listings.clear();
        self.stats.clear();
        trace!("📦️ Order caches cleared");
    }

    pub fn purge_expired(&self) -> usize {
        self.listings.purge_expired() + self.stats.purge_expired()
    }
}
