use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CardRecord — one catalog item as returned by the on-demand API
// ---------------------------------------------------------------------------

/// A single card record from the on-demand lookup API.
///
/// Only the fields the engine consumes are modeled; unknown fields are
/// ignored during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "set")]
    pub set_code: String,
    pub set_name: Option<String>,
    pub collector_number: Option<String>,
    pub rarity: Option<String>,
    pub type_line: Option<String>,
    pub mana_cost: Option<String>,
    pub oracle_text: Option<String>,
    pub image_uris: Option<HashMap<String, String>>,
    #[serde(default)]
    pub prices: CardPrices,
    pub purchase_uris: Option<HashMap<String, String>>,
    pub legalities: Option<HashMap<String, String>>,
}

/// Per-currency, per-finish price map attached to a [`CardRecord`].
///
/// Prices are numeric strings or absent; the API never uses zero as a
/// "no price" sentinel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CardPrices {
    pub usd: Option<String>,
    pub usd_foil: Option<String>,
    pub usd_etched: Option<String>,
    pub eur: Option<String>,
    pub eur_foil: Option<String>,
    pub tix: Option<String>,
}

impl CardPrices {
    /// The normal-finish USD price, parsed, if the API reported one.
    pub fn usd_normal(&self) -> Option<f64> {
        self.usd.as_deref().and_then(|s| s.parse().ok())
    }
}

// ---------------------------------------------------------------------------
// API response envelopes
// ---------------------------------------------------------------------------

/// One page of search results.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub data: Vec<CardRecord>,
    #[serde(default)]
    pub has_more: bool,
}

/// Autocomplete response: a flat list of card names.
#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub data: Vec<String>,
}
