//! Shared fixtures for the price engine integration tests.
//!
//! Provides an in-memory [`PriceStore`] that records every batch it
//! receives (and can be told to fail specific batches), plus helpers for
//! laying out a dump payload and freshness sentinel in a temp data dir.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cardprices::models::price::PriceEntry;
use cardprices::{DumpSync, PriceError, PriceStore};
use chrono::{Duration as ChronoDuration, Utc};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Records every batch written through it. Batches whose call index is in
/// `fail_on` return an error instead, for exercising partial-failure paths.
#[derive(Default)]
pub struct MemoryStore {
    pub batches: Vec<HashMap<String, PriceEntry>>,
    pub init_calls: usize,
    pub fail_on: HashSet<usize>,
    calls: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(indices: &[usize]) -> Self {
        Self {
            fail_on: indices.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// All recorded entries flattened into one map.
    pub fn all_entries(&self) -> HashMap<String, PriceEntry> {
        self.batches.iter().flatten().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl PriceStore for MemoryStore {
    fn init_database(&mut self) -> cardprices::Result<()> {
        self.init_calls += 1;
        Ok(())
    }

    fn update_prices(&mut self, batch: &HashMap<String, PriceEntry>) -> cardprices::Result<()> {
        let index = self.calls;
        self.calls += 1;
        if self.fail_on.contains(&index) {
            return Err(PriceError::InvalidArgument(format!(
                "injected failure for batch {index}"
            )));
        }
        self.batches.push(batch.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dump fixtures
// ---------------------------------------------------------------------------

/// A small but realistic dump document: four paper vendors plus cardhoarder
/// on the mtgo channel, mixed string/number prices, and the `meta` sentinel.
pub fn sample_dump() -> serde_json::Value {
    serde_json::json!({
        "meta": { "date": "2024-06-01", "version": "5.2.2" },
        "data": {
            "aaa-001": {
                "paper": {
                    "tcgplayer": {
                        "currency": "USD",
                        "retail": {
                            "normal": { "2024-05-30": 2.0, "2024-06-01": "3.50" },
                            "foil": { "2024-06-01": 9.0 }
                        }
                    },
                    "cardmarket": {
                        "currency": "EUR",
                        "retail": { "normal": { "2024-06-01": 10.0 } }
                    }
                },
                "mtgo": {
                    "cardhoarder": {
                        "currency": "USD",
                        "retail": { "normal": { "2024-06-01": 0.02 } }
                    }
                }
            },
            "bbb-002": {
                "paper": {
                    "cardkingdom": {
                        "currency": "USD",
                        "retail": { "foil": { "2024-06-01": 1.25 } }
                    }
                }
            },
            "ccc-003": {
                "paper": {
                    "cardsphere": { "currency": "USD", "retail": { "normal": {}, "foil": {} } }
                }
            }
        }
    })
}

/// Write a dump payload into `data_dir` under the name the acquirer expects.
pub fn write_payload(data_dir: &Path, dump: &serde_json::Value) -> PathBuf {
    let path = data_dir.join("AllPricesToday.json");
    fs::write(&path, serde_json::to_string(dump).unwrap()).unwrap();
    path
}

/// Write a freshness sentinel `days_ago` calendar days in the past.
pub fn write_sentinel(data_dir: &Path, days_ago: i64) {
    let ts = Utc::now() - ChronoDuration::days(days_ago);
    fs::write(data_dir.join("last_sync.txt"), ts.to_rfc3339()).unwrap();
}

pub fn read_sentinel(data_dir: &Path) -> Option<String> {
    fs::read_to_string(data_dir.join("last_sync.txt")).ok()
}

/// A `DumpSync` whose dump URL points at a closed local port, so any
/// attempted download fails fast instead of touching the network.
pub fn offline_dump_sync(data_dir: &Path, batch_size: usize) -> DumpSync {
    DumpSync::new(data_dir.to_path_buf(), Duration::from_secs(5), batch_size)
        .unwrap()
        .with_dump_url("http://127.0.0.1:9/AllPricesToday.json.gz")
}
