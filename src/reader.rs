//! Streaming reader for the extracted price dump.
//!
//! The dump is a single multi-hundred-megabyte JSON object. `ChunkedReader`
//! pulls it off disk in fixed 1 MiB chunks, and a `DeserializeSeed` map
//! visitor hands each catalog entry to the caller as it is parsed, so peak
//! memory stays at one chunk plus one entry instead of the whole document.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, MapAccess, Visitor};
use tracing::{debug, warn};

use crate::config;
use crate::error::{PriceError, Result};
use crate::models::price::{DumpEntry, DumpMeta};

// ---------------------------------------------------------------------------
// ChunkedReader
// ---------------------------------------------------------------------------

/// A `Read` adapter that fills a fixed-size chunk from the underlying reader
/// and serves callers out of it, so the file is only ever touched in
/// whole-chunk sequential reads.
pub struct ChunkedReader<R: Read> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    filled: usize,
}

impl<R: Read> ChunkedReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, config::DUMP_CHUNK_SIZE)
    }

    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        Self {
            inner,
            buf: vec![0; chunk_size.max(1)],
            pos: 0,
            filled: 0,
        }
    }

    /// Read the next full chunk (shorter only at EOF).
    fn fill(&mut self) -> io::Result<usize> {
        self.pos = 0;
        self.filled = 0;
        while self.filled < self.buf.len() {
            let n = self.inner.read(&mut self.buf[self.filled..])?;
            if n == 0 {
                break;
            }
            self.filled += n;
        }
        Ok(self.filled)
    }
}

impl<R: Read> Read for ChunkedReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.pos == self.filled && self.fill()? == 0 {
            return Ok(0);
        }
        let n = out.len().min(self.filled - self.pos);
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

// ---------------------------------------------------------------------------
// Structural validation
// ---------------------------------------------------------------------------

/// Cheap well-formedness check before committing to a full parse: the first
/// and last non-whitespace bytes of the document must be `{` and `}`.
pub fn validate_braces(path: &Path) -> Result<()> {
    let mut file = File::open(path)?;

    let mut chunk = vec![0u8; config::DUMP_CHUNK_SIZE];
    let first = loop {
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break None;
        }
        if let Some(b) = chunk[..n].iter().find(|b| !b.is_ascii_whitespace()) {
            break Some(*b);
        }
    };

    let len = file.seek(SeekFrom::End(0))?;
    let tail_len = len.min(4096);
    file.seek(SeekFrom::End(-(tail_len as i64)))?;
    let mut tail = vec![0u8; tail_len as usize];
    file.read_exact(&mut tail)?;
    let last = tail.iter().rev().find(|b| !b.is_ascii_whitespace()).copied();

    match (first, last) {
        (Some(b'{'), Some(b'}')) => Ok(()),
        _ => Err(PriceError::Format(format!(
            "dump at {} is not a JSON object",
            path.display()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Streaming parse
// ---------------------------------------------------------------------------

/// Counters for one pass over the dump.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// Entries handed to the caller.
    pub kept: usize,
    /// Entries discarded for carrying no non-empty retail series.
    pub filtered: usize,
    /// Entries skipped because they failed to deserialize.
    pub skipped: usize,
    /// The dump's `meta` sentinel, when present.
    pub meta: Option<DumpMeta>,
}

/// Stream the dump at `path`, invoking `on_entry` once per usable catalog
/// entry. The reserved `meta` key is recorded, malformed entries are logged
/// and skipped, and a dump yielding zero usable entries is a format error.
pub fn read_dump<F>(path: &Path, mut on_entry: F) -> Result<ParseOutcome>
where
    F: FnMut(&str, DumpEntry),
{
    validate_braces(path)?;

    let file = File::open(path)?;
    let reader = ChunkedReader::new(file);
    let mut de = serde_json::Deserializer::from_reader(reader);

    let mut outcome = ParseOutcome::default();
    DocumentSeed {
        outcome: &mut outcome,
        on_entry: &mut on_entry,
    }
    .deserialize(&mut de)?;
    de.end()?;

    if let Some(meta) = &outcome.meta {
        debug!(
            date = meta.date.as_deref().unwrap_or("?"),
            version = meta.version.as_deref().unwrap_or("?"),
            "parsed dump metadata"
        );
    }
    if outcome.kept == 0 {
        return Err(PriceError::Format(
            "dump contains no usable price entries".into(),
        ));
    }
    Ok(outcome)
}

/// Deserialize one (id, raw value) pair into a [`DumpEntry`] and route it.
fn handle_entry<F>(outcome: &mut ParseOutcome, on_entry: &mut F, id: &str, raw: serde_json::Value)
where
    F: FnMut(&str, DumpEntry),
{
    match serde_json::from_value::<DumpEntry>(raw) {
        Ok(entry) if entry.has_prices() => {
            outcome.kept += 1;
            on_entry(id, entry);
        }
        Ok(_) => outcome.filtered += 1,
        Err(err) => {
            warn!(id, %err, "skipping malformed dump entry");
            outcome.skipped += 1;
        }
    }
}

/// Seed over the top-level dump object. Understands both the wrapped shape
/// `{"meta": ..., "data": {id: entry, ...}}` and a bare entry map with an
/// inline `meta` key.
struct DocumentSeed<'a, F> {
    outcome: &'a mut ParseOutcome,
    on_entry: &'a mut F,
}

impl<'de, F> DeserializeSeed<'de> for DocumentSeed<'_, F>
where
    F: FnMut(&str, DumpEntry),
{
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, F> Visitor<'de> for DocumentSeed<'_, F>
where
    F: FnMut(&str, DumpEntry),
{
    type Value = ();

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a price dump object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<(), A::Error> {
        let DocumentSeed { outcome, on_entry } = self;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "meta" => {
                    let raw = map.next_value::<serde_json::Value>()?;
                    outcome.meta = serde_json::from_value(raw).ok();
                }
                "data" => {
                    map.next_value_seed(EntriesSeed {
                        outcome: &mut *outcome,
                        on_entry: &mut *on_entry,
                    })?;
                }
                _ => {
                    let raw = map.next_value::<serde_json::Value>()?;
                    handle_entry(outcome, on_entry, &key, raw);
                }
            }
        }
        Ok(())
    }
}

/// Seed over the `data` entry map.
struct EntriesSeed<'a, F> {
    outcome: &'a mut ParseOutcome,
    on_entry: &'a mut F,
}

impl<'de, F> DeserializeSeed<'de> for EntriesSeed<'_, F>
where
    F: FnMut(&str, DumpEntry),
{
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, F> Visitor<'de> for EntriesSeed<'_, F>
where
    F: FnMut(&str, DumpEntry),
{
    type Value = ();

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a map of item id to price series")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<(), A::Error> {
        let EntriesSeed { outcome, on_entry } = self;
        while let Some(key) = map.next_key::<String>()? {
            if key == "meta" {
                map.next_value::<IgnoredAny>()?;
                continue;
            }
            let raw = map.next_value::<serde_json::Value>()?;
            handle_entry(outcome, on_entry, &key, raw);
        }
        Ok(())
    }
}
