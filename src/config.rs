use std::path::PathBuf;
use std::time::Duration;

pub const API_BASE: &str = "https://api.scryfall.com";
pub const DUMP_URL: &str = "https://mtgjson.com/api/v5/AllPricesToday.json.gz";

pub const USER_AGENT: &str = concat!("cardprices/", env!("CARGO_PKG_VERSION"));

/// Minimum spacing between successive outbound API calls.
pub const THROTTLE_INTERVAL: Duration = Duration::from_millis(100);

/// Lifetime of an on-demand cached price.
pub const PRICE_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Read size for streaming the extracted dump.
pub const DUMP_CHUNK_SIZE: usize = 1024 * 1024;

/// Entries per store write.
pub const IMPORT_BATCH_SIZE: usize = 100;

/// Fixed conversion applied to cardmarket series flagged as EUR.
pub const EUR_TO_USD: f64 = 1.1;

pub const SENTINEL_FILE: &str = "last_sync.txt";
pub const DUMP_ARCHIVE_FILE: &str = "AllPricesToday.json.gz";
pub const DUMP_JSON_FILE: &str = "AllPricesToday.json";

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("cardprices")
    } else {
        PathBuf::from(".cardprices")
    }
}
