//! Time-bounded memoization for on-demand price lookups.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::client::RemoteClient;
use crate::config;
use crate::error::Result;

/// Injected time source, so tests can drive expiry deterministically.
pub type Clock = Box<dyn Fn() -> Instant + Send + Sync>;

/// One cached observation.
#[derive(Debug, Clone, Copy)]
pub struct CachedPrice {
    pub price: f64,
    pub fetched_at: Instant,
}

/// TTL cache keyed by item id, sitting in front of the remote by-id lookup.
///
/// An entry is valid strictly less than the TTL after it was written; once
/// expired it is treated as absent and refetched. Lookups that yield no price
/// are not cached, so a later re-check is not prevented. Reads and writes are
/// last-write-wins; two callers racing on the same expired id may both
/// refetch, which is harmless because the remote lookup is idempotent.
pub struct PriceCache {
    entries: Mutex<HashMap<String, CachedPrice>>,
    ttl: Duration,
    clock: Clock,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Box::new(Instant::now))
    }

    pub fn with_default_ttl() -> Self {
        Self::new(config::PRICE_CACHE_TTL)
    }

    /// Construct with an injected clock, for deterministic expiry in tests.
    pub fn with_clock(ttl: Duration, clock: Clock) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Cached normal-USD price for `id`, refetching through `client` when
    /// the entry is absent or expired.
    pub fn price(&self, client: &RemoteClient, id: &str) -> Result<Option<f64>> {
        self.price_with(id, || {
            Ok(client
                .card_by_id(id)?
                .and_then(|card| card.prices.usd_normal()))
        })
    }

    /// Core lookup: serve a fresh cached value, otherwise run `fetch` and
    /// cache its result if it produced a price.
    pub fn price_with<F>(&self, id: &str, fetch: F) -> Result<Option<f64>>
    where
        F: FnOnce() -> Result<Option<f64>>,
    {
        let now = (self.clock)();
        {
            let entries = self.entries.lock().expect("price cache lock poisoned");
            if let Some(hit) = entries.get(id) {
                if now.duration_since(hit.fetched_at) < self.ttl {
                    return Ok(Some(hit.price));
                }
            }
        }

        let price = fetch()?;
        if let Some(price) = price {
            let mut entries = self.entries.lock().expect("price cache lock poisoned");
            entries.insert(
                id.to_string(),
                CachedPrice {
                    price,
                    fetched_at: (self.clock)(),
                },
            );
        }
        Ok(price)
    }

    /// Drop all cached entries.
    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("price cache lock poisoned")
            .clear();
    }
}
