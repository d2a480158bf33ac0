pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{CanonicalUrl, InvalidUrl, canonicalize, host_allowed, is_valid_url};
