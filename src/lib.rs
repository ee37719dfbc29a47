//! Price synchronization engine for trading-card data.
//!
//! Keeps a locally persisted price table fresh from two disjoint channels:
//! a rate-limited on-demand lookup API (single-card, search, autocomplete),
//! and a once-daily compressed bulk price dump that is downloaded, streamed,
//! reconciled across vendors and imported in batches.
//!
//! # Quick start
//!
//! ```no_run
//! use cardprices::PriceEngine;
//!
//! let mut engine = PriceEngine::builder().build().unwrap();
//!
//! // On-demand, cache-fronted price lookup
//! let price = engine.price("f295b713-1d6a-43fd-910d-fb35414bf58a").unwrap();
//!
//! // Daily bulk sync with download progress
//! let summary = engine.sync(false, |pct| eprintln!("{pct:.0}%")).unwrap();
//! assert!(summary.is_clean());
//! ```

pub mod client;
pub mod config;
pub mod dump;
pub mod error;
pub mod import;
pub mod models;
pub mod price_cache;
pub mod reader;
pub mod reconcile;
pub mod store;

pub use client::{RemoteClient, Throttle};
pub use dump::DumpSync;
pub use error::{PriceError, Result};
pub use import::ImportSummary;
pub use models::card::CardRecord;
pub use models::price::PriceEntry;
pub use price_cache::PriceCache;
pub use store::{DuckDbStore, PriceStore};

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// PriceEngineBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`PriceEngine`].
pub struct PriceEngineBuilder {
    data_dir: Option<PathBuf>,
    timeout: Duration,
    throttle_interval: Duration,
    cache_ttl: Duration,
    batch_size: usize,
    store: Option<Box<dyn PriceStore>>,
}

impl Default for PriceEngineBuilder {
    fn default() -> Self {
        Self {
            data_dir: None,
            timeout: Duration::from_secs(120),
            throttle_interval: config::THROTTLE_INTERVAL,
            cache_ttl: config::PRICE_CACHE_TTL,
            batch_size: config::IMPORT_BATCH_SIZE,
            store: None,
        }
    }
}

impl PriceEngineBuilder {
    /// Set a custom data directory for the sentinel, dump artifacts and the
    /// default store. Defaults to the platform data dir.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// HTTP request timeout for lookups and the dump download.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Minimum spacing between outbound on-demand API calls.
    pub fn throttle_interval(mut self, interval: Duration) -> Self {
        self.throttle_interval = interval;
        self
    }

    /// Lifetime of an on-demand cached price.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Entries per store write during bulk import.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Use a custom persistent store instead of the default DuckDB file.
    pub fn store<S: PriceStore + 'static>(mut self, store: S) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Build the engine, initializing the store's schema.
    pub fn build(self) -> Result<PriceEngine> {
        let data_dir = self.data_dir.unwrap_or_else(config::default_data_dir);
        std::fs::create_dir_all(&data_dir)?;

        let mut store = match self.store {
            Some(store) => store,
            None => Box::new(DuckDbStore::open(data_dir.join("prices.duckdb"))?),
        };
        store.init_database()?;

        Ok(PriceEngine {
            client: RemoteClient::new(self.timeout, self.throttle_interval)?,
            cache: PriceCache::new(self.cache_ttl),
            dump: DumpSync::new(data_dir.clone(), self.timeout, self.batch_size)?,
            store,
            data_dir,
        })
    }
}

// ---------------------------------------------------------------------------
// PriceEngine
// ---------------------------------------------------------------------------

/// The engine's main entry point: owns the throttled remote client, the TTL
/// price cache, the bulk dump synchronizer and the persistent store handle.
pub struct PriceEngine {
    client: RemoteClient,
    cache: PriceCache,
    dump: DumpSync,
    store: Box<dyn PriceStore>,
    data_dir: PathBuf,
}

impl PriceEngine {
    /// Create a new builder for configuring the engine.
    pub fn builder() -> PriceEngineBuilder {
        PriceEngineBuilder::default()
    }

    /// The throttled on-demand client, for direct lookups and search.
    pub fn client(&self) -> &RemoteClient {
        &self.client
    }

    /// Cache-fronted normal-USD price for one item id.
    pub fn price(&self, id: &str) -> Result<Option<f64>> {
        self.cache.price(&self.client, id)
    }

    /// Run one bulk dump sync. `force` bypasses the same-day freshness
    /// check; `on_progress` receives download progress in percent.
    pub fn sync<F: FnMut(f64)>(&mut self, force: bool, on_progress: F) -> Result<ImportSummary> {
        self.dump.sync(self.store.as_mut(), force, on_progress)
    }

    /// Timestamp of the last fully successful bulk sync.
    pub fn last_sync(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.dump.last_sync()
    }

    /// Drop all cached on-demand prices.
    pub fn clear_price_cache(&self) {
        self.cache.clear()
    }
}

impl fmt::Display for PriceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PriceEngine(data_dir={}, last_sync={})",
            self.data_dir.display(),
            self.last_sync()
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_else(|| "never".into()),
        )
    }
}
