//! The resolution pipeline: canonicalize, consult the cache, then walk the
//! tiers in fixed order until one produces a complete record.

use anyhow::Result;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::errors::ResolveError;
use super::retry::{RetryPolicy, run_with_retry};
use super::stats::{TierStats, TierStatsSnapshot};
use super::tier::{Tier, TierKind};
use crate::automation::AutomationSession;
use crate::config::ResolverConfig;
use crate::page_extractor::ProductRecord;
use crate::result_cache::{CacheStats, ResultCache};
use crate::tiers::{BrowserTier, MarketplaceApiTier, RelayApiTier};
use crate::utils::{CanonicalUrl, canonicalize, host_allowed};

struct TierSlot {
    tier: Arc<dyn Tier>,
    policy: RetryPolicy,
    stats: Arc<TierStats>,
}

/// Whether one tier can currently take requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierHealth {
    pub tier: TierKind,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolverHealth {
    /// At least one tier is enabled
    pub healthy: bool,
    pub tiers: Vec<TierHealth>,
}

pub struct Resolver {
    config: ResolverConfig,
    cache: ResultCache,
    tiers: Vec<TierSlot>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl Resolver {
    /// A resolver with no tiers registered; see [`Resolver::with_tier`].
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        let cache = ResultCache::new(config.cache_ttl());
        Self {
            config,
            cache,
            tiers: Vec::new(),
            sweeper: Mutex::new(None),
        }
    }

    /// Build the production tier set from configuration.
    ///
    /// Tiers switched off in configuration are not registered at all; the
    /// relay also needs a credential.
    pub fn from_config(config: ResolverConfig) -> Result<Self> {
        let mut tiers: Vec<Arc<dyn Tier>> = Vec::new();

        if config.primary_api().enabled {
            tiers.push(Arc::new(MarketplaceApiTier::new(config.primary_api().clone())?));
        }
        if config.relay().is_usable() {
            tiers.push(Arc::new(RelayApiTier::new(config.relay().clone())?));
        } else if config.relay().enabled {
            warn!("Relay tier enabled without an API key, skipping it");
        }
        if config.automation().enabled {
            let session = Arc::new(AutomationSession::new(config.automation().clone()));
            tiers.push(Arc::new(BrowserTier::new(session)));
        }

        let resolver = tiers
            .into_iter()
            .fold(Self::new(config), |resolver, tier| resolver.with_tier(tier));
        info!(
            "Resolver ready with tiers: {:?}",
            resolver.tiers.iter().map(|s| s.tier.kind()).collect::<Vec<_>>()
        );
        Ok(resolver)
    }

    /// Register a tier, replacing any tier of the same kind. Its retry
    /// policy comes from configuration and its counters start at zero.
    #[must_use]
    pub fn with_tier(mut self, tier: Arc<dyn Tier>) -> Self {
        let kind = tier.kind();
        let slot = TierSlot {
            policy: self.config.retry_policy(kind).clone(),
            stats: Arc::new(TierStats::new(kind)),
            tier,
        };
        self.tiers.retain(|s| s.tier.kind() != kind);
        self.tiers.push(slot);
        self.tiers.sort_by_key(|s| s.tier.kind());
        self
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Eagerly prepare tiers that would otherwise start lazily.
    ///
    /// Only acts when the browser is configured to start with the process;
    /// a failure is logged and leaves that tier disabled.
    pub async fn start(&self) {
        if !self.config.automation().initialize_on_startup {
            debug!("Browser starts lazily on first use");
            return;
        }
        for slot in &self.tiers {
            if slot.tier.kind() != TierKind::BrowserAutomation {
                continue;
            }
            if slot.tier.prepare().await {
                info!("Browser tier initialized at startup");
            } else {
                warn!("Browser tier failed to initialize, it stays disabled");
            }
        }
    }

    /// Resolve a listing URL to its product record.
    pub async fn resolve(&self, raw_url: &str) -> Result<ProductRecord, ResolveError> {
        let canonical = self.canonical(raw_url)?;

        if self.config.cache_enabled()
            && let Some(record) = self.cache.get(&canonical.cache_key)
        {
            debug!("Cache hit for {}", canonical.cache_key);
            return Ok(record);
        }

        let request_url = canonical.request_url.as_str();
        let mut tiers_tried = Vec::new();

        for slot in &self.tiers {
            let tier: &dyn Tier = slot.tier.as_ref();
            let kind = tier.kind();

            if !tier.is_enabled() {
                debug!(%kind, "Tier disabled, skipping");
                continue;
            }
            if !tier.prepare().await {
                debug!(%kind, "Tier not ready, skipping");
                continue;
            }
            tiers_tried.push(kind);

            match run_with_retry(&slot.policy, &slot.stats, move |_| tier.fetch(request_url)).await {
                Ok(record) => {
                    if self.config.cache_enabled() {
                        self.cache.set(&canonical.cache_key, record.clone());
                    }
                    info!(%kind, url = request_url, "Listing resolved");
                    return Ok(record);
                }
                Err(err) => {
                    warn!(%kind, url = request_url, error = %err, "Tier gave up, falling through");
                }
            }
        }

        Err(ResolveError::PipelineExhausted {
            url: canonical.request_url,
            tiers_tried,
        })
    }

    fn canonical(&self, raw_url: &str) -> Result<CanonicalUrl, ResolveError> {
        let canonical = canonicalize(raw_url)?;
        if !host_allowed(&canonical, self.config.allowed_hosts()) {
            return Err(ResolveError::Validation(format!(
                "host not allowed: {}",
                canonical.host().unwrap_or_default()
            )));
        }
        Ok(canonical)
    }

    /// Cached record for `url`, if present and fresh
    #[must_use]
    pub fn cache_get(&self, url: &str) -> Option<ProductRecord> {
        let canonical = canonicalize(url).ok()?;
        self.cache.get(&canonical.cache_key)
    }

    /// Store a record under the canonical key of `url`
    pub fn cache_set(&self, url: &str, record: ProductRecord) -> Result<(), ResolveError> {
        let canonical = canonicalize(url)?;
        self.cache.set(&canonical.cache_key, record);
        Ok(())
    }

    /// Drop every cached record, returning how many were removed
    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Counters for every registered tier, in resolution order
    #[must_use]
    pub fn stats(&self) -> Vec<TierStatsSnapshot> {
        self.tiers.iter().map(|s| s.stats.snapshot()).collect()
    }

    #[must_use]
    pub fn tier_stats(&self, kind: TierKind) -> Option<TierStatsSnapshot> {
        self.tiers
            .iter()
            .find(|s| s.tier.kind() == kind)
            .map(|s| s.stats.snapshot())
    }

    #[must_use]
    pub fn health(&self) -> ResolverHealth {
        let tiers: Vec<TierHealth> = TierKind::ORDER
            .iter()
            .map(|&kind| TierHealth {
                tier: kind,
                enabled: self
                    .tiers
                    .iter()
                    .any(|s| s.tier.kind() == kind && s.tier.is_enabled()),
            })
            .collect();
        ResolverHealth {
            healthy: tiers.iter().any(|t| t.enabled),
            tiers,
        }
    }

    /// Periodically purge expired cache entries. Replaces a running sweeper.
    ///
    /// A zero interval starts nothing and returns `false`; expiry stays lazy.
    pub fn start_cache_sweeper(&self, interval: Duration) -> bool {
        if interval.is_zero() {
            warn!("Cache sweeper interval is zero; not starting the sweeper");
            return false;
        }
        let cache = self.cache.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = cache.purge_expired();
                if purged > 0 {
                    debug!("Cache sweeper purged {purged} expired entries");
                }
            }
        });
        if let Some(previous) = self.sweeper.lock().replace(handle) {
            previous.abort();
        }
        true
    }

    /// Stop background work and release every tier's resources.
    pub async fn shutdown(&self) {
        if let Some(sweeper) = self.sweeper.lock().take() {
            sweeper.abort();
        }
        for slot in &self.tiers {
            slot.tier.shutdown().await;
        }
        info!("Resolver shut down");
    }
}

impl Drop for Resolver {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.get_mut().take() {
            sweeper.abort();
        }
    }
}
