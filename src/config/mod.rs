//! Configuration module for listing resolution
//!
//! This module provides the `ResolverConfig` struct and its builder for
//! configuring the cache, the tiers and the browser session with validation
//! and sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::ResolverConfigBuilder;
pub use types::{AutomationConfig, PrimaryApiConfig, RelayConfig, ResolverConfig};
