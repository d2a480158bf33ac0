//! Fluent builder for `ResolverConfig`
//!
//! Every field has a default, so `ResolverConfig::builder().build()` yields a
//! working configuration. `build` validates the combination.

use anyhow::{Result, anyhow, bail};
use std::path::PathBuf;
use std::time::Duration;

use super::types::{AutomationConfig, PrimaryApiConfig, RelayConfig, ResolverConfig};
use crate::resolver::{RetryPolicy, TierKind};
use crate::utils::constants::{DEFAULT_ALLOWED_HOSTS, DEFAULT_CACHE_TTL_SECS};
use crate::utils::is_valid_url;

pub struct ResolverConfigBuilder {
    pub(crate) cache_enabled: bool,
    pub(crate) cache_ttl: Duration,
    pub(crate) allowed_hosts: Vec<String>,
    pub(crate) primary_api: PrimaryApiConfig,
    pub(crate) relay: RelayConfig,
    pub(crate) automation: AutomationConfig,
}

impl Default for ResolverConfigBuilder {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| (*h).to_string()).collect(),
            primary_api: PrimaryApiConfig::default(),
            relay: RelayConfig::default(),
            automation: AutomationConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Create a builder for configuring a `ResolverConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ResolverConfigBuilder {
        ResolverConfigBuilder::default()
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        let b = ResolverConfigBuilder::default();
        Self {
            cache_enabled: b.cache_enabled,
            cache_ttl: b.cache_ttl,
            allowed_hosts: b.allowed_hosts,
            primary_api: b.primary_api,
            relay: b.relay,
            automation: b.automation,
        }
    }
}

impl ResolverConfigBuilder {
    #[must_use]
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Replace the host allow-list. An empty list accepts any host.
    #[must_use]
    pub fn allowed_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn primary_api_enabled(mut self, enabled: bool) -> Self {
        self.primary_api.enabled = enabled;
        self
    }

    #[must_use]
    pub fn primary_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.primary_api.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn primary_api_token(mut self, token: Option<String>) -> Self {
        self.primary_api.access_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    #[must_use]
    pub fn relay_enabled(mut self, enabled: bool) -> Self {
        self.relay.enabled = enabled;
        self
    }

    #[must_use]
    pub fn relay_api_key(mut self, api_key: Option<String>) -> Self {
        self.relay.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    #[must_use]
    pub fn relay_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.relay.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn relay_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.relay.country_code = country_code.into();
        self
    }

    #[must_use]
    pub fn browser_enabled(mut self, enabled: bool) -> Self {
        self.automation.enabled = enabled;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.automation.headless = headless;
        self
    }

    #[must_use]
    pub fn initialize_browser_on_startup(mut self, eager: bool) -> Self {
        self.automation.initialize_on_startup = eager;
        self
    }

    #[must_use]
    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.automation.navigation_timeout = timeout;
        self
    }

    #[must_use]
    pub fn settle_window(mut self, min: Duration, max: Duration) -> Self {
        self.automation.settle_min = min;
        self.automation.settle_max = max;
        self
    }

    #[must_use]
    pub fn max_concurrent_contexts(mut self, max: usize) -> Self {
        self.automation.max_concurrent_contexts = max;
        self
    }

    #[must_use]
    pub fn block_resources(mut self, block: bool) -> Self {
        self.automation.block_resources = block;
        self
    }

    #[must_use]
    pub fn cookie_file(mut self, path: Option<PathBuf>) -> Self {
        self.automation.cookie_file = path;
        self
    }

    #[must_use]
    pub fn user_data_dir(mut self, path: Option<PathBuf>) -> Self {
        self.automation.user_data_dir = path;
        self
    }

    /// Override the retry policy of one tier
    #[must_use]
    pub fn retry_policy(mut self, tier: TierKind, policy: RetryPolicy) -> Self {
        match tier {
            TierKind::PrimaryApi => self.primary_api.retry = policy,
            TierKind::RelayApi => self.relay.retry = policy,
            TierKind::BrowserAutomation => self.automation.retry = policy,
        }
        self
    }

    pub fn build(self) -> Result<ResolverConfig> {
        for (tier, policy) in [
            (TierKind::PrimaryApi, &self.primary_api.retry),
            (TierKind::RelayApi, &self.relay.retry),
            (TierKind::BrowserAutomation, &self.automation.retry),
        ] {
            if policy.max_attempts == 0 {
                bail!("{tier}: max_attempts must be at least 1");
            }
            if !(policy.backoff_multiplier.is_finite() && policy.backoff_multiplier >= 1.0) {
                bail!("{tier}: backoff_multiplier must be a finite value >= 1.0");
            }
            if policy.max_delay < policy.initial_delay {
                bail!("{tier}: max_delay must not be below initial_delay");
            }
        }

        if self.primary_api.enabled && !is_valid_url(&self.primary_api.base_url) {
            return Err(anyhow!(
                "Invalid primary API base URL '{}'",
                self.primary_api.base_url
            ));
        }
        if self.relay.enabled && !is_valid_url(&self.relay.endpoint) {
            return Err(anyhow!("Invalid relay endpoint '{}'", self.relay.endpoint));
        }
        if self.automation.max_concurrent_contexts == 0 {
            bail!("max_concurrent_contexts must be at least 1");
        }
        if self.automation.settle_min > self.automation.settle_max {
            bail!("settle window lower bound exceeds upper bound");
        }
        if self.automation.navigation_timeout.is_zero() {
            bail!("navigation_timeout must be non-zero");
        }

        let allowed_hosts = self
            .allowed_hosts
            .into_iter()
            .map(|h| h.trim().to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        Ok(ResolverConfig {
            cache_enabled: self.cache_enabled,
            cache_ttl: self.cache_ttl,
            allowed_hosts,
            primary_api: self.primary_api,
            relay: self.relay,
            automation: self.automation,
        })
    }
}
