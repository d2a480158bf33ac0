pub mod automation;
pub mod browser_setup;
pub mod config;
pub mod kromekover;
pub mod page_extractor;
pub mod resolver;
pub mod result_cache;
pub mod tiers;
pub mod utils;

pub use automation::{AutomationSession, SessionState};
pub use browser_setup::{BrowserHandle, download_managed_browser, find_browser_executable, launch_browser};
pub use config::{AutomationConfig, PrimaryApiConfig, RelayConfig, ResolverConfig, ResolverConfigBuilder};
pub use page_extractor::{ExtractionError, ProductRecord, detect_block, extract_product, normalize_price};
pub use resolver::{
    ResolveError, Resolver, ResolverHealth, RetryPolicy, Tier, TierError, TierKind,
    TierStatsSnapshot,
};
pub use result_cache::{CacheStats, ResultCache};
pub use utils::{CanonicalUrl, canonicalize};

/// Resolve a single listing with the default configuration and release the
/// browser afterwards.
pub async fn resolve_once(url: &str) -> anyhow::Result<ProductRecord> {
    let resolver = Resolver::from_config(ResolverConfig::default())?;
    let outcome = resolver.resolve(url).await;
    resolver.shutdown().await;
    Ok(outcome?)
}
