//! Multi-source price reconciliation.
//!
//! Collapses one dump entry's per-vendor time series into a single canonical
//! normal/foil pair. Each vendor contributes its most recent retail
//! observation; the canonical pair is first-nonzero-wins over a fixed vendor
//! precedence.

use crate::config;
use crate::models::price::{DumpEntry, FinishSeries, PriceEntry, VendorPrices};

/// Most recent observation in a series, or 0 when the series is absent/empty.
/// Date keys are ISO-8601, so the map's greatest key is the newest.
fn latest(series: Option<&FinishSeries>) -> (f64, f64) {
    match series {
        Some(s) => (
            s.normal.values().next_back().map_or(0.0, |p| p.0),
            s.foil.values().next_back().map_or(0.0, |p| p.0),
        ),
        None => (0.0, 0.0),
    }
}

/// Latest retail normal/foil pair for one vendor block.
fn vendor_retail(vendor: Option<&VendorPrices>) -> (f64, f64) {
    latest(vendor.and_then(|v| v.retail.as_ref()))
}

/// True when the vendor explicitly reports EUR pricing. All other vendors
/// (and an absent currency field) are taken as USD.
fn is_eur(vendor: Option<&VendorPrices>) -> bool {
    vendor
        .and_then(|v| v.currency.as_deref())
        .is_some_and(|c| c.eq_ignore_ascii_case("EUR"))
}

fn first_nonzero(candidates: &[f64]) -> f64 {
    candidates.iter().copied().find(|&v| v != 0.0).unwrap_or(0.0)
}

/// Reconcile one catalog entry's raw vendor series into a [`PriceEntry`].
///
/// Returns `None` when both the canonical normal and foil values resolve to
/// zero; such entries are dropped rather than persisted.
pub fn reconcile(entry: &DumpEntry) -> Option<PriceEntry> {
    let tcg = entry.paper.get("tcgplayer");
    let cardmarket = entry.paper.get("cardmarket");
    let cardkingdom = entry.paper.get("cardkingdom");
    let cardsphere = entry.paper.get("cardsphere");
    // Cardhoarder prices the online-play channel, never paper.
    let cardhoarder = entry.mtgo.get("cardhoarder");

    let (tcg_normal, tcg_foil) = vendor_retail(tcg);
    let (mut cardmarket_normal, mut cardmarket_foil) = vendor_retail(cardmarket);
    let (cardkingdom_normal, cardkingdom_foil) = vendor_retail(cardkingdom);
    let (cardsphere_normal, cardsphere_foil) = vendor_retail(cardsphere);
    let (cardhoarder_normal, cardhoarder_foil) = vendor_retail(cardhoarder);

    if is_eur(cardmarket) {
        cardmarket_normal *= config::EUR_TO_USD;
        cardmarket_foil *= config::EUR_TO_USD;
    }

    let normal = first_nonzero(&[
        tcg_normal,
        cardmarket_normal,
        cardkingdom_normal,
        cardsphere_normal,
        cardhoarder_normal,
    ]);
    let foil = first_nonzero(&[
        tcg_foil,
        cardmarket_foil,
        cardkingdom_foil,
        cardsphere_foil,
        cardhoarder_foil,
    ]);

    if normal == 0.0 && foil == 0.0 {
        return None;
    }

    Some(PriceEntry {
        normal,
        foil,
        tcg_normal,
        tcg_foil,
        cardmarket_normal,
        cardmarket_foil,
        cardkingdom_normal,
        cardkingdom_foil,
        cardsphere_normal,
        cardsphere_foil,
        cardhoarder_normal,
        cardhoarder_foil,
    })
}
