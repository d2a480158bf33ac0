//! Product data extraction.
//!
//! Turns rendered page HTML into a [`ProductRecord`] through ordered
//! strategies per field, normalizes BRL prices, and tells anti-bot
//! interstitials apart from pages that merely lack data.

// Sub-modules
pub mod blocking;
pub mod extractors;
pub mod price;
pub mod product;
pub mod schema;
pub mod selectors;
pub mod strategies;

// Re-exports for public API
pub use blocking::{BlockSignal, detect_block};
pub use extractors::{page_html, settle_like_a_visitor, wait_for_page_load};
pub use price::{PriceError, normalize_price, normalize_price_parts};
pub use product::{ExtractionError, extract_product};
pub use schema::{ProductRecord, discount_percent};
