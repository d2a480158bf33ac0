//! Concrete resolution tiers, in fallback order.

pub mod browser;
pub mod marketplace_api;
pub mod relay_api;

pub use browser::BrowserTier;
pub use marketplace_api::{MarketplaceApiTier, extract_item_id};
pub use relay_api::RelayApiTier;
