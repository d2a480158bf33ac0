//! Headless browser automation for listings the HTTP tiers cannot resolve.

mod context;
mod cookies;
mod identity;
mod interception;
mod session;

pub use context::{BrowsingContext, visit_budget};
pub use cookies::{CookieStore, StoredCookie};
pub use identity::{Identity, IdentityPool};
pub use interception::{enable_resource_blocking, should_block};
pub use session::{AutomationSession, SessionState};
