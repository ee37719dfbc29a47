//! The persistent price store, consumed through a narrow write interface.
//!
//! The engine never queries the store; it only initializes it and hands it
//! reconciled batches. [`PriceStore`] is the seam, [`DuckDbStore`] the
//! production implementation.

use std::collections::HashMap;
use std::path::Path;

use duckdb::{params, Connection};
use tracing::debug;

use crate::error::Result;
use crate::models::price::PriceEntry;

/// Write interface the engine requires from the persistent store.
pub trait PriceStore {
    /// Create any tables the store needs. Idempotent.
    fn init_database(&mut self) -> Result<()>;

    /// Upsert one batch of reconciled entries keyed by item id.
    fn update_prices(&mut self, batch: &HashMap<String, PriceEntry>) -> Result<()>;
}

// ---------------------------------------------------------------------------
// DuckDbStore
// ---------------------------------------------------------------------------

/// DuckDB-backed store holding one row of reconciled prices per item.
pub struct DuckDbStore {
    conn: Connection,
}

impl DuckDbStore {
    /// Open (or create) a database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database, useful for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &Connection {
        &self.conn
    }
}

impl PriceStore for DuckDbStore {
    fn init_database(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prices (
                uuid VARCHAR PRIMARY KEY,
                normal DOUBLE,
                foil DOUBLE,
                tcg_normal DOUBLE,
                tcg_foil DOUBLE,
                cardmarket_normal DOUBLE,
                cardmarket_foil DOUBLE,
                cardkingdom_normal DOUBLE,
                cardkingdom_foil DOUBLE,
                cardsphere_normal DOUBLE,
                cardsphere_foil DOUBLE,
                cardhoarder_normal DOUBLE,
                cardhoarder_foil DOUBLE
            )",
        )?;
        Ok(())
    }

    fn update_prices(&mut self, batch: &HashMap<String, PriceEntry>) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO prices VALUES \
                 (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )?;
            for (uuid, p) in batch {
                stmt.execute(params![
                    uuid,
                    p.normal,
                    p.foil,
                    p.tcg_normal,
                    p.tcg_foil,
                    p.cardmarket_normal,
                    p.cardmarket_foil,
                    p.cardkingdom_normal,
                    p.cardkingdom_foil,
                    p.cardsphere_normal,
                    p.cardsphere_foil,
                    p.cardhoarder_normal,
                    p.cardhoarder_foil,
                ])?;
            }
        }
        tx.commit()?;
        debug!(rows = batch.len(), "wrote price batch");
        Ok(())
    }
}
