//! TTL cache tests with an injected clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cardprices::PriceCache;

const TTL: Duration = Duration::from_secs(3600);

/// A cache whose clock is `base + offset`, where the offset is controlled by
/// the test through the returned handle (in milliseconds).
fn cache_with_manual_clock() -> (PriceCache, Arc<AtomicU64>) {
    let offset = Arc::new(AtomicU64::new(0));
    let handle = offset.clone();
    let base = Instant::now();
    let cache = PriceCache::with_clock(
        TTL,
        Box::new(move || base + Duration::from_millis(offset.load(Ordering::SeqCst))),
    );
    (cache, handle)
}

#[test]
fn hit_within_ttl_returns_cached_value_without_refetching() {
    let (cache, clock) = cache_with_manual_clock();

    let mut fetches = 0;
    let price = cache
        .price_with("id-1", || {
            fetches += 1;
            Ok(Some(4.2))
        })
        .unwrap();
    assert_eq!(price, Some(4.2));
    assert_eq!(fetches, 1);

    // One millisecond before expiry: still served from cache.
    clock.store(TTL.as_millis() as u64 - 1, Ordering::SeqCst);
    let price = cache
        .price_with("id-1", || {
            panic!("must not refetch before the TTL elapses");
        })
        .unwrap();
    assert_eq!(price, Some(4.2));
}

#[test]
fn expired_entry_is_treated_as_absent_and_refetched() {
    let (cache, clock) = cache_with_manual_clock();

    cache.price_with("id-1", || Ok(Some(4.2))).unwrap();

    clock.store(TTL.as_millis() as u64 + 1, Ordering::SeqCst);
    let price = cache.price_with("id-1", || Ok(Some(5.0))).unwrap();
    assert_eq!(price, Some(5.0));
}

#[test]
fn entry_expires_exactly_at_the_ttl() {
    let (cache, clock) = cache_with_manual_clock();

    cache.price_with("id-1", || Ok(Some(4.2))).unwrap();

    // Validity is strictly less than the TTL.
    clock.store(TTL.as_millis() as u64, Ordering::SeqCst);
    let price = cache.price_with("id-1", || Ok(Some(9.9))).unwrap();
    assert_eq!(price, Some(9.9));
}

#[test]
fn priceless_lookup_is_not_cached() {
    let (cache, _clock) = cache_with_manual_clock();

    let mut fetches = 0;
    for _ in 0..2 {
        let price = cache
            .price_with("no-price", || {
                fetches += 1;
                Ok(None)
            })
            .unwrap();
        assert_eq!(price, None);
    }
    // The miss was not memoized, so the second call re-checked.
    assert_eq!(fetches, 2);
}

#[test]
fn entries_are_keyed_by_id() {
    let (cache, _clock) = cache_with_manual_clock();

    cache.price_with("id-1", || Ok(Some(1.0))).unwrap();
    cache.price_with("id-2", || Ok(Some(2.0))).unwrap();

    let one = cache.price_with("id-1", || panic!("cached")).unwrap();
    let two = cache.price_with("id-2", || panic!("cached")).unwrap();
    assert_eq!(one, Some(1.0));
    assert_eq!(two, Some(2.0));
}

#[test]
fn clear_drops_all_entries() {
    let (cache, _clock) = cache_with_manual_clock();

    cache.price_with("id-1", || Ok(Some(1.0))).unwrap();
    cache.clear();

    let mut fetched = false;
    cache
        .price_with("id-1", || {
            fetched = true;
            Ok(Some(3.0))
        })
        .unwrap();
    assert!(fetched);
}
