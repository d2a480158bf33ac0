use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::TierError;
use crate::page_extractor::ProductRecord;

/// Position of a tier in the fallback order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    /// Fast structured marketplace API
    PrimaryApi,
    /// Relay / rotating-proxy fetch of the listing HTML
    RelayApi,
    /// Stealth browser automation
    BrowserAutomation,
}

impl TierKind {
    /// Fixed resolution order
    pub const ORDER: [TierKind; 3] = [
        TierKind::PrimaryApi,
        TierKind::RelayApi,
        TierKind::BrowserAutomation,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrimaryApi => "primary_api",
            Self::RelayApi => "relay_api",
            Self::BrowserAutomation => "browser_automation",
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source of product records.
///
/// Implementations fail fast: a single `fetch` is a single attempt, and
/// retrying is the pipeline's job.
pub trait Tier: Send + Sync {
    fn kind(&self) -> TierKind;

    /// Whether configuration allows this tier at all
    fn is_enabled(&self) -> bool {
        true
    }

    /// Make the tier ready for use, initializing lazily if needed.
    ///
    /// Returns `false` when the tier cannot serve requests right now; the
    /// pipeline then skips it without touching its counters.
    fn prepare(&self) -> BoxFuture<'_, bool> {
        Box::pin(async { true })
    }

    /// One attempt at resolving `request_url`
    fn fetch<'a>(&'a self, request_url: &'a str) -> BoxFuture<'a, Result<ProductRecord, TierError>>;

    /// Release long-lived resources. Safe to call more than once.
    fn shutdown(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}
