//! Batched writes of reconciled entries into the persistent store.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::PriceError;
use crate::models::price::PriceEntry;
use crate::store::PriceStore;

// ---------------------------------------------------------------------------
// ImportSummary
// ---------------------------------------------------------------------------

/// Outcome of one import run. Per-batch store failures are collected here
/// rather than aborting the run, so the caller chooses its own tolerance.
#[derive(Debug, Default)]
pub struct ImportSummary {
    /// Entries written through the store.
    pub imported: usize,
    /// Entries dropped before import (no prices, failed reconciliation).
    pub dropped: usize,
    /// Batches attempted.
    pub batches: usize,
    /// Failed batches as `(batch index, error)`.
    pub failed_batches: Vec<(usize, PriceError)>,
}

impl ImportSummary {
    /// True when every attempted batch was written.
    pub fn is_clean(&self) -> bool {
        self.failed_batches.is_empty()
    }
}

// ---------------------------------------------------------------------------
// import
// ---------------------------------------------------------------------------

/// Write `entries` to the store in batches of `batch_size`, logging progress
/// at 5% steps. Empty batches are skipped without a store call.
pub fn import<S>(store: &mut S, entries: &[(String, PriceEntry)], batch_size: usize) -> ImportSummary
where
    S: PriceStore + ?Sized,
{
    let batch_size = batch_size.max(1);
    let total = entries.len();
    let mut summary = ImportSummary::default();
    let mut processed = 0usize;
    let mut last_step = 0u32;

    for (index, chunk) in entries.chunks(batch_size).enumerate() {
        processed += chunk.len();

        if chunk.is_empty() {
            continue;
        }
        summary.batches += 1;

        let batch: HashMap<String, PriceEntry> =
            chunk.iter().map(|(id, p)| (id.clone(), p.clone())).collect();
        match store.update_prices(&batch) {
            Ok(()) => summary.imported += chunk.len(),
            Err(err) => {
                warn!(batch = index, %err, "price batch failed; continuing");
                summary.failed_batches.push((index, err));
            }
        }

        let pct = (processed * 100 / total) as u32;
        if pct >= last_step + 5 || pct == 100 {
            last_step = pct - pct % 5;
            info!(
                "imported {processed}/{total} price entries ({}%)",
                last_step
            );
        }
    }

    summary
}
