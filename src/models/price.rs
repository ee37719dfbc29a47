use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Price — a dump price value (JSON number or numeric string)
// ---------------------------------------------------------------------------

/// A single observed price. The dump encodes these inconsistently as either
/// JSON numbers or numeric strings, so deserialization accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Price(pub f64);

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PriceVisitor;

        impl Visitor<'_> for PriceVisitor {
            type Value = Price;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a number or numeric string")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
                Ok(Price(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
                Ok(Price(v as f64))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
                Ok(Price(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
                v.parse().map(Price).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(PriceVisitor)
    }
}

// ---------------------------------------------------------------------------
// Raw dump shapes — one catalog entry's per-vendor time series
// ---------------------------------------------------------------------------

/// Per-finish price time series for one vendor.
///
/// Keys are ISO-8601 dates, so the `BTreeMap`'s last key is the most recent
/// observation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinishSeries {
    #[serde(default)]
    pub normal: BTreeMap<String, Price>,
    #[serde(default)]
    pub foil: BTreeMap<String, Price>,
}

impl FinishSeries {
    pub fn is_empty(&self) -> bool {
        self.normal.is_empty() && self.foil.is_empty()
    }
}

/// One vendor's block inside a dump entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendorPrices {
    pub currency: Option<String>,
    pub retail: Option<FinishSeries>,
    pub buylist: Option<FinishSeries>,
}

/// One catalog entry from the bulk dump: vendor blocks grouped by channel.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DumpEntry {
    #[serde(default)]
    pub paper: HashMap<String, VendorPrices>,
    #[serde(default)]
    pub mtgo: HashMap<String, VendorPrices>,
}

impl DumpEntry {
    /// Whether any vendor in either channel carries a non-empty retail series.
    /// Entries without one are discarded before reconciliation.
    pub fn has_prices(&self) -> bool {
        self.paper
            .values()
            .chain(self.mtgo.values())
            .any(|v| v.retail.as_ref().is_some_and(|r| !r.is_empty()))
    }
}

/// The dump's reserved `meta` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DumpMeta {
    pub date: Option<String>,
    pub version: Option<String>,
}

// ---------------------------------------------------------------------------
// PriceEntry — the reconciled canonical record handed to the store
// ---------------------------------------------------------------------------

/// One catalog item's reconciled prices: the canonical normal/foil pair plus
/// the per-vendor values that produced it. All values are USD; absent vendor
/// data is 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub normal: f64,
    pub foil: f64,
    pub tcg_normal: f64,
    pub tcg_foil: f64,
    pub cardmarket_normal: f64,
    pub cardmarket_foil: f64,
    pub cardkingdom_normal: f64,
    pub cardkingdom_foil: f64,
    pub cardsphere_normal: f64,
    pub cardsphere_foil: f64,
    pub cardhoarder_normal: f64,
    pub cardhoarder_foil: f64,
}
