//! Tiered listing resolution.
//!
//! A [`Resolver`] tries each registered [`Tier`] in [`TierKind::ORDER`],
//! wrapping every tier in [`run_with_retry`] and recording its outcome in a
//! per-tier [`TierStats`].

pub mod errors;
pub mod pipeline;
pub mod retry;
pub mod stats;
pub mod tier;

pub use errors::{ResolveError, SoftFailure, TierError};
pub use pipeline::{Resolver, ResolverHealth, TierHealth};
pub use retry::{RetryPolicy, run_with_retry};
pub use stats::{TierStats, TierStatsSnapshot};
pub use tier::{Tier, TierKind};
