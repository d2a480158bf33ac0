//! Core configuration types for listing resolution
//!
//! `ResolverConfig` is the single typed value the resolver is built from.
//! Callers load it however they like (environment, file, code) and hand it in.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::resolver::RetryPolicy;
use crate::utils::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_MAX_ATTEMPTS, DEFAULT_API_TIMEOUT_SECS,
    DEFAULT_BROWSER_MAX_ATTEMPTS, DEFAULT_MAX_CONCURRENT_CONTEXTS,
    DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_RELAY_COUNTRY, DEFAULT_RELAY_ENDPOINT,
    DEFAULT_RELAY_MAX_ATTEMPTS, DEFAULT_RELAY_TIMEOUT_SECS, DEFAULT_SETTLE_MAX_MS,
    DEFAULT_SETTLE_MIN_MS,
};

/// Top-level resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub(crate) cache_enabled: bool,
    pub(crate) cache_ttl: Duration,
    /// Host fragments a listing URL must contain; empty accepts any host
    pub(crate) allowed_hosts: Vec<String>,
    pub(crate) primary_api: PrimaryApiConfig,
    pub(crate) relay: RelayConfig,
    pub(crate) automation: AutomationConfig,
}

/// Structured marketplace API tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryApiConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Optional OAuth bearer token; public item reads work without one
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for PrimaryApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            access_token: None,
            timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            retry: RetryPolicy::default().with_max_attempts(DEFAULT_API_MAX_ATTEMPTS),
        }
    }
}

/// Relay (rotating proxy) tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Feature flag; the tier also needs `api_key`
    pub enabled: bool,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub endpoint: String,
    pub country_code: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl RelayConfig {
    /// Enabled and holding a non-blank credential
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.enabled
            && self
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            endpoint: DEFAULT_RELAY_ENDPOINT.to_string(),
            country_code: DEFAULT_RELAY_COUNTRY.to_string(),
            timeout: Duration::from_secs(DEFAULT_RELAY_TIMEOUT_SECS),
            retry: RetryPolicy::default().with_max_attempts(DEFAULT_RELAY_MAX_ATTEMPTS),
        }
    }
}

/// Browser automation tier and its long-lived session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    pub enabled: bool,
    pub headless: bool,
    /// Launch the browser when the resolver starts instead of on first use
    pub initialize_on_startup: bool,
    pub navigation_timeout: Duration,
    /// Random post-navigation idle window, lower bound
    pub settle_min: Duration,
    /// Random post-navigation idle window, upper bound
    pub settle_max: Duration,
    pub max_concurrent_contexts: usize,
    /// Fail stylesheet, font, media and tracker requests inside contexts
    pub block_resources: bool,
    /// Cookie snapshot file; `None` keeps cookies in memory only
    pub cookie_file: Option<PathBuf>,
    /// Chrome profile directory; `None` uses a per-process temp directory
    pub user_data_dir: Option<PathBuf>,
    pub retry: RetryPolicy,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            headless: true,
            initialize_on_startup: false,
            navigation_timeout: Duration::from_secs(DEFAULT_NAVIGATION_TIMEOUT_SECS),
            settle_min: Duration::from_millis(DEFAULT_SETTLE_MIN_MS),
            settle_max: Duration::from_millis(DEFAULT_SETTLE_MAX_MS),
            max_concurrent_contexts: DEFAULT_MAX_CONCURRENT_CONTEXTS,
            block_resources: true,
            cookie_file: None,
            user_data_dir: None,
            retry: RetryPolicy::default().with_max_attempts(DEFAULT_BROWSER_MAX_ATTEMPTS),
        }
    }
}
