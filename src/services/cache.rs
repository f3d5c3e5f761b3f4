//! Short-lived candle caching.
//!
//! The engine never reaches for a global cache: whoever builds the
//! [`CandleFetcher`](super::candles::CandleFetcher) hands it a
//! [`CandleCache`] capability, which may be a real TTL cache or [`NoCache`].

use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::types::CandleSeries;

/// Thread-safe key/value store whose entries expire after a per-entry TTL.
///
/// Writes replace the whole entry for a key in one `DashMap::insert`, so
/// concurrent writers race to "last write wins" without tearing an entry.
pub struct Cache<V> {
    entries: DashMap<String, Expiring<V>>,
}

struct Expiring<V> {
    value: V,
    expires_at: Instant,
}

impl<V: Clone> Default for Cache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Cache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Live value for `key`. Expired entries are evicted on read.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if entry.expires_at > now {
                return Some(entry.value.clone());
            }
        }
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(
            key.into(),
            Expiring {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop every expired entry.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    /// Entry count, expired entries included until the next read or cleanup.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-through cache capability for candle series.
pub trait CandleCache: Send + Sync {
    fn get(&self, key: &str) -> Option<CandleSeries>;
    fn put(&self, key: &str, series: CandleSeries, ttl: Duration);
}

/// Candle cache backed by [`Cache`]. Expiry comes from the caller of
/// [`CandleCache::put`].
#[derive(Default)]
pub struct TtlCandleCache {
    inner: Cache<CandleSeries>,
}

impl TtlCandleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cleanup(&self) {
        self.inner.cleanup();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl CandleCache for TtlCandleCache {
    fn get(&self, key: &str) -> Option<CandleSeries> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, series: CandleSeries, ttl: Duration) {
        self.inner.insert(key, series, ttl);
    }
}

/// Cache that never holds anything. Every fetch goes to the source.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl CandleCache for NoCache {
    fn get(&self, _key: &str) -> Option<CandleSeries> {
        None
    }

    fn put(&self, _key: &str, _series: CandleSeries, _ttl: Duration) {}
}
