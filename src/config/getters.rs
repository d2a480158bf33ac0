//! Getter methods for `ResolverConfig`

use std::time::Duration;

use super::types::{AutomationConfig, PrimaryApiConfig, RelayConfig, ResolverConfig};
use crate::resolver::{RetryPolicy, TierKind};

impl ResolverConfig {
    #[must_use]
    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    #[must_use]
    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }

    #[must_use]
    pub fn primary_api(&self) -> &PrimaryApiConfig {
        &self.primary_api
    }

    #[must_use]
    pub fn relay(&self) -> &RelayConfig {
        &self.relay
    }

    #[must_use]
    pub fn automation(&self) -> &AutomationConfig {
        &self.automation
    }

    #[must_use]
    pub fn retry_policy(&self, tier: TierKind) -> &RetryPolicy {
        match tier {
            TierKind::PrimaryApi => &self.primary_api.retry,
            TierKind::RelayApi => &self.relay.retry,
            TierKind::BrowserAutomation => &self.automation.retry,
        }
    }
}
