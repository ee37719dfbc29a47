//! Throttle and remote client tests (offline).

use std::time::{Duration, Instant};

use cardprices::models::card::CardRecord;
use cardprices::{RemoteClient, Throttle};

// ---------------------------------------------------------------------------
// Throttle
// ---------------------------------------------------------------------------

#[test]
fn back_to_back_calls_are_spaced_by_the_minimum_interval() {
    let interval = Duration::from_millis(40);
    let throttle = Throttle::new(interval);

    let start = Instant::now();
    for _ in 0..4 {
        throttle.pause();
    }
    // N calls take at least (N - 1) * interval end to end.
    assert!(start.elapsed() >= interval * 3);
}

#[test]
fn first_call_is_not_delayed() {
    let throttle = Throttle::new(Duration::from_secs(10));
    let start = Instant::now();
    throttle.pause();
    assert!(start.elapsed() < Duration::from_secs(1));
}

// ---------------------------------------------------------------------------
// RemoteClient
// ---------------------------------------------------------------------------

fn offline_client() -> RemoteClient {
    // Closed local port: any request that actually goes out fails fast.
    RemoteClient::with_base(
        "http://127.0.0.1:9",
        Duration::from_secs(5),
        Duration::from_millis(1),
    )
    .unwrap()
}

#[test]
fn short_autocomplete_prefix_short_circuits_without_a_request() {
    let client = offline_client();
    assert!(client.autocomplete("").unwrap().is_empty());
    assert!(client.autocomplete("a").unwrap().is_empty());
}

#[test]
fn two_character_prefix_attempts_a_request() {
    let client = offline_client();
    assert!(client.autocomplete("li").is_err());
}

// ---------------------------------------------------------------------------
// Record deserialization
// ---------------------------------------------------------------------------

#[test]
fn card_record_parses_the_api_shape() {
    let raw = serde_json::json!({
        "id": "f295b713-1d6a-43fd-910d-fb35414bf58a",
        "name": "Lightning Bolt",
        "set": "a25",
        "set_name": "Masters 25",
        "collector_number": "141",
        "rarity": "uncommon",
        "type_line": "Instant",
        "mana_cost": "{R}",
        "oracle_text": "Lightning Bolt deals 3 damage to any target.",
        "image_uris": { "normal": "https://img.example/bolt.jpg" },
        "prices": {
            "usd": "2.23",
            "usd_foil": "11.50",
            "eur": "1.80",
            "tix": "0.03"
        },
        "purchase_uris": { "tcgplayer": "https://shop.example/bolt" },
        "legalities": { "modern": "legal", "standard": "not_legal" },
        "highres_image": true
    });

    let card: CardRecord = serde_json::from_value(raw).unwrap();
    assert_eq!(card.name, "Lightning Bolt");
    assert_eq!(card.set_code, "a25");
    assert_eq!(card.prices.usd.as_deref(), Some("2.23"));
    assert_eq!(card.prices.usd_normal(), Some(2.23));
    assert_eq!(card.prices.usd_etched, None);
    assert_eq!(
        card.legalities.unwrap().get("modern").map(String::as_str),
        Some("legal")
    );
}

#[test]
fn absent_prices_stay_absent_rather_than_zero() {
    let raw = serde_json::json!({
        "id": "0000",
        "name": "Obscure Card",
        "set": "xxx"
    });

    let card: CardRecord = serde_json::from_value(raw).unwrap();
    assert_eq!(card.prices.usd, None);
    assert_eq!(card.prices.usd_normal(), None);
}
