//! Bulk dump acquisition and the sync pipeline.
//!
//! Downloads the daily compressed price dump, tracks a calendar-day
//! freshness sentinel, extracts the payload, and drives the streaming reader,
//! reconciler and batch importer. The extracted payload is deliberately left
//! on disk after a failure so a retry can reuse it; only the compressed
//! artifact is cleaned up.

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::config;
use crate::error::{PriceError, Result};
use crate::import::{self, ImportSummary};
use crate::models::price::PriceEntry;
use crate::reader;
use crate::reconcile::reconcile;
use crate::store::PriceStore;

const DOWNLOAD_BUF_SIZE: usize = 64 * 1024;

/// Acquires and imports the daily bulk price dump.
pub struct DumpSync {
    data_dir: PathBuf,
    dump_url: String,
    timeout: Duration,
    batch_size: usize,
    client: Option<Client>,
}

impl DumpSync {
    pub fn new(data_dir: PathBuf, timeout: Duration, batch_size: usize) -> Result<Self> {
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            dump_url: config::DUMP_URL.to_string(),
            timeout,
            batch_size,
            client: None,
        })
    }

    /// Point the acquirer at a non-default dump URL (tests, mirrors).
    pub fn with_dump_url(mut self, url: &str) -> Self {
        self.dump_url = url.to_string();
        self
    }

    // -- Paths and sentinel ------------------------------------------------

    fn sentinel_path(&self) -> PathBuf {
        self.data_dir.join(config::SENTINEL_FILE)
    }

    fn archive_path(&self) -> PathBuf {
        self.data_dir.join(config::DUMP_ARCHIVE_FILE)
    }

    fn payload_path(&self) -> PathBuf {
        self.data_dir.join(config::DUMP_JSON_FILE)
    }

    /// Timestamp of the last fully successful sync, if any.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        let raw = fs::read_to_string(self.sentinel_path()).ok()?;
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn write_sentinel(&self) -> Result<()> {
        fs::write(self.sentinel_path(), Utc::now().to_rfc3339())?;
        Ok(())
    }

    /// Calendar-date freshness: a sync at 23:59 and one at 00:01 the next day
    /// both re-download even though minutes apart.
    fn synced_today(&self) -> bool {
        self.last_sync()
            .is_some_and(|ts| ts.date_naive() == Utc::now().date_naive())
    }

    // -- Sync pipeline -----------------------------------------------------

    /// Run one full sync: acquire the dump (or reuse today's extracted
    /// payload), parse and reconcile it, and import the result in batches.
    ///
    /// `on_progress` receives the download's fractional progress in percent.
    /// The freshness sentinel is written only after a fully clean import;
    /// a run with failed batches leaves the previous sentinel untouched so
    /// the next invocation retries from scratch.
    pub fn sync<S, F>(&mut self, store: &mut S, force: bool, mut on_progress: F) -> Result<ImportSummary>
    where
        S: PriceStore + ?Sized,
        F: FnMut(f64),
    {
        let reuse = !force && self.synced_today() && self.payload_path().exists();
        if reuse {
            info!("dump already synced today; reusing extracted payload");
        } else if let Err(err) = self.acquire(&mut on_progress) {
            self.cleanup_archive();
            return Err(err);
        }

        let summary = match self.import_payload(store) {
            Ok(summary) => summary,
            Err(err) => {
                self.cleanup_archive();
                return Err(err);
            }
        };

        if summary.is_clean() {
            self.write_sentinel()?;
            info!(
                imported = summary.imported,
                dropped = summary.dropped,
                batches = summary.batches,
                "price sync complete"
            );
        } else {
            warn!(
                failed = summary.failed_batches.len(),
                "price sync finished with failed batches; sentinel not updated"
            );
        }
        Ok(summary)
    }

    /// Download the compressed dump with progress reporting and extract it.
    fn acquire<F: FnMut(f64)>(&mut self, on_progress: &mut F) -> Result<()> {
        let archive = self.archive_path();
        if archive.exists() {
            // Stale partial download from an interrupted run.
            fs::remove_file(&archive)?;
        }

        let written = self.download(&archive, on_progress)?;
        if written == 0 {
            return Err(PriceError::Format("downloaded dump is empty".into()));
        }

        self.extract(&archive)?;
        fs::remove_file(&archive)?;

        let payload = self.payload_path();
        if !payload.exists() || fs::metadata(&payload)?.len() == 0 {
            return Err(PriceError::Format("extracted dump is empty".into()));
        }
        Ok(())
    }

    fn download<F: FnMut(f64)>(&mut self, dest: &Path, on_progress: &mut F) -> Result<u64> {
        let url = self.dump_url.clone();
        info!(url, "downloading price dump");

        let mut resp = self.client().get(&url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PriceError::Http {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }

        let total = resp.content_length().unwrap_or(0);
        let mut out = File::create(dest)?;
        let mut buf = [0u8; DOWNLOAD_BUF_SIZE];
        let mut written = 0u64;
        loop {
            let n = resp.read(&mut buf)?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
            written += n as u64;
            if total > 0 {
                on_progress(written as f64 / total as f64 * 100.0);
            }
        }
        out.flush()?;
        Ok(written)
    }

    fn extract(&self, archive: &Path) -> Result<()> {
        let gz = File::open(archive)?;
        let mut decoder = GzDecoder::new(BufReader::new(gz));
        let mut out = File::create(self.payload_path())?;
        io::copy(&mut decoder, &mut out)?;
        Ok(())
    }

    /// Stream the extracted payload through reconciliation and import the
    /// surviving entries.
    fn import_payload<S: PriceStore + ?Sized>(&self, store: &mut S) -> Result<ImportSummary> {
        let payload = self.payload_path();
        let mut entries: Vec<(String, PriceEntry)> = Vec::new();
        let mut dropped = 0usize;

        let outcome = reader::read_dump(&payload, |id, entry| match reconcile(&entry) {
            Some(prices) => entries.push((id.to_string(), prices)),
            None => dropped += 1,
        });
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err @ PriceError::Format(_)) => {
                // A corrupt payload would fail every retry; remove it so the
                // next run re-downloads.
                warn!(%err, "extracted payload is corrupt; removing");
                if let Err(rm_err) = fs::remove_file(&payload) {
                    warn!(%rm_err, "failed to remove corrupt payload");
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        info!(
            kept = outcome.kept,
            filtered = outcome.filtered,
            skipped = outcome.skipped,
            dropped,
            "reconciled dump entries"
        );

        let mut summary = import::import(store, &entries, self.batch_size);
        summary.dropped = dropped + outcome.filtered + outcome.skipped;
        Ok(summary)
    }

    /// Best-effort removal of the compressed artifact on failure paths.
    /// Its own failure is only logged so the original error is not masked.
    fn cleanup_archive(&self) {
        let archive = self.archive_path();
        if archive.exists() {
            if let Err(err) = fs::remove_file(&archive) {
                warn!(%err, "failed to clean up dump archive");
            }
        }
    }

    /// Lazy HTTP client, created on first download.
    fn client(&mut self) -> &Client {
        if self.client.is_none() {
            self.client = Some(
                Client::builder()
                    .timeout(self.timeout)
                    .user_agent(config::USER_AGENT)
                    .redirect(reqwest::redirect::Policy::limited(10))
                    .build()
                    .expect("failed to build HTTP client"),
            );
        }
        self.client.as_ref().unwrap()
    }
}
