//! Error types for resolution.
//!
//! `ResolveError` is what callers see. `TierError` stays inside the pipeline:
//! soft failures are retried, blocks abort the tier, and neither is fatal.

use thiserror::Error;

use super::tier::TierKind;
use crate::page_extractor::ExtractionError;
use crate::utils::InvalidUrl;

/// Caller-visible resolution failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The input URL was rejected before any tier ran
    #[error("invalid listing URL: {0}")]
    Validation(String),

    /// Every configured tier failed
    #[error("no tier could resolve {url} (tried: {tiers_tried:?})")]
    PipelineExhausted {
        url: String,
        tiers_tried: Vec<TierKind>,
    },
}

impl From<InvalidUrl> for ResolveError {
    fn from(err: InvalidUrl) -> Self {
        Self::Validation(err.to_string())
    }
}

impl ResolveError {
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Retryable failure of a single tier attempt
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SoftFailure {
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The tier answered but the record failed the completeness check
    #[error("incomplete record: {0}")]
    Incomplete(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("browser error: {0}")]
    Browser(String),
}

/// Outcome of a failed tier attempt
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TierError {
    /// Transient or data failure; retried within the tier's budget
    #[error(transparent)]
    Soft(#[from] SoftFailure),

    /// Anti-bot defense detected; aborts the tier immediately
    #[error("blocked: {reason}")]
    Blocked { reason: String },
}

impl TierError {
    #[must_use]
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self::Blocked {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

impl From<ExtractionError> for TierError {
    fn from(err: ExtractionError) -> Self {
        Self::Soft(SoftFailure::Extraction(err.to_string()))
    }
}

impl From<reqwest::Error> for SoftFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<reqwest::Error> for TierError {
    fn from(err: reqwest::Error) -> Self {
        Self::Soft(err.into())
    }
}
