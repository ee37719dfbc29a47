pub mod card;
pub mod price;

pub use card::{CardPrices, CardRecord, Catalog, SearchPage};
pub use price::{DumpEntry, DumpMeta, FinishSeries, PriceEntry, VendorPrices};
