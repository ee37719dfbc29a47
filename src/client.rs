//! Throttled blocking client for the on-demand card lookup API.
//!
//! Every outbound call goes through a single-slot [`Throttle`] that enforces
//! a minimum spacing between requests, regardless of how many callers share
//! the client. HTTP 404 on single-record lookups is a normal "not found"
//! outcome; any other non-success status is surfaced with its body preserved.

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config;
use crate::error::{PriceError, Result};
use crate::models::card::{CardRecord, Catalog, SearchPage};

// ---------------------------------------------------------------------------
// Throttle
// ---------------------------------------------------------------------------

/// Single-slot leaky bucket: remembers the instant of the previous call and
/// sleeps off the remainder of the interval before letting the next one out.
pub struct Throttle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Block until at least `interval` has passed since the previous call,
    /// then claim the slot.
    pub fn pause(&self) {
        let mut last = self.last.lock().expect("throttle lock poisoned");
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}

// ---------------------------------------------------------------------------
// RemoteClient
// ---------------------------------------------------------------------------

/// Blocking HTTP client for card-by-id, card-by-name, search and
/// autocomplete lookups.
pub struct RemoteClient {
    http: Client,
    base: String,
    throttle: Throttle,
}

impl RemoteClient {
    pub fn new(timeout: Duration, throttle_interval: Duration) -> Result<Self> {
        Self::with_base(config::API_BASE, timeout, throttle_interval)
    }

    /// Build a client against a non-default API base (tests, mirrors).
    pub fn with_base(base: &str, timeout: Duration, throttle_interval: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(config::USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            throttle: Throttle::new(throttle_interval),
        })
    }

    /// Fetch one record by its stable identifier. `Ok(None)` on 404.
    pub fn card_by_id(&self, id: &str) -> Result<Option<CardRecord>> {
        let url = format!("{}/cards/{}", self.base, id);
        self.get_optional(&url, &[])
    }

    /// Fetch one record by exact name. `Ok(None)` on 404.
    pub fn card_by_name(&self, name: &str) -> Result<Option<CardRecord>> {
        let url = format!("{}/cards/named", self.base);
        self.get_optional(&url, &[("exact", name)])
    }

    /// Run a paged search. Returns the page's records and whether more
    /// pages follow.
    pub fn search(&self, query: &str, page: u32) -> Result<(Vec<CardRecord>, bool)> {
        let url = format!("{}/cards/search", self.base);
        let page_str = page.to_string();
        let result: SearchPage = self.get(&url, &[("q", query), ("page", &page_str)])?;
        Ok((result.data, result.has_more))
    }

    /// Name autocompletion. Prefixes shorter than two characters return an
    /// empty list without touching the network.
    pub fn autocomplete(&self, prefix: &str) -> Result<Vec<String>> {
        if prefix.chars().count() < 2 {
            return Ok(Vec::new());
        }
        let url = format!("{}/cards/autocomplete", self.base);
        let result: Catalog = self.get(&url, &[("q", prefix)])?;
        Ok(result.data)
    }

    // -- Request plumbing --------------------------------------------------

    fn send(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::blocking::Response> {
        self.throttle.pause();
        debug!(url, "outbound API call");
        Ok(self.http.get(url).query(query).send()?)
    }

    /// GET expecting success; any non-success status is an error carrying
    /// the status code and response body.
    fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let resp = self.send(url, query)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PriceError::Http {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }
        Ok(resp.json()?)
    }

    /// GET for single-record lookups, where 404 means "no such record".
    fn get_optional<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let resp = self.send(url, query)?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(PriceError::Http {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }
        Ok(Some(resp.json()?))
    }
}
