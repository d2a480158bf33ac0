//! Per-context browser identities.
//!
//! Each browsing context presents a fresh combination of user agent,
//! viewport and locale drawn from the pools in `utils::constants`. The
//! navigator platform and WebGL strings are derived from the agent so the
//! fingerprint stays self-consistent.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::utils::constants::{LOCALE_POOL, USER_AGENT_POOL, VIEWPORT_POOL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: String,
    /// `navigator.platform` matching the agent
    pub platform: String,
    /// BCP 47 locale, e.g. `pt-BR`
    pub locale: String,
    pub accept_language: String,
    pub viewport: (u32, u32),
    pub hardware_concurrency: u32,
    pub webgl_vendor: String,
    pub webgl_renderer: String,
}

impl Identity {
    /// Languages list as exposed through `navigator.languages`
    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        self.accept_language
            .split(',')
            .filter_map(|part| part.split(';').next())
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty())
            .collect()
    }
}

/// Draws identities from the configured pools
#[derive(Debug, Clone, Default)]
pub struct IdentityPool;

impl IdentityPool {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Pick a random identity
    #[must_use]
    pub fn pick(&self) -> Identity {
        let mut rng = rand::rng();

        let user_agent = USER_AGENT_POOL
            .choose(&mut rng)
            .copied()
            .unwrap_or(crate::utils::constants::CHROME_USER_AGENT);
        let viewport = VIEWPORT_POOL.choose(&mut rng).copied().unwrap_or((1920, 1080));
        let (locale, accept_language) = LOCALE_POOL
            .choose(&mut rng)
            .copied()
            .unwrap_or(("pt-BR", "pt-BR,pt;q=0.9"));
        let hardware_concurrency = [4, 8, 8, 12, 16][rng.random_range(0..5)];

        let (platform, webgl_vendor, webgl_renderer) = platform_for(user_agent);

        Identity {
            user_agent: user_agent.to_string(),
            platform: platform.to_string(),
            locale: locale.to_string(),
            accept_language: accept_language.to_string(),
            viewport,
            hardware_concurrency,
            webgl_vendor: webgl_vendor.to_string(),
            webgl_renderer: webgl_renderer.to_string(),
        }
    }
}

fn platform_for(user_agent: &str) -> (&'static str, &'static str, &'static str) {
    if user_agent.contains("Macintosh") {
        ("MacIntel", "Intel Inc.", "Intel Iris OpenGL Engine")
    } else if user_agent.contains("Linux") {
        ("Linux x86_64", "Intel", "Mesa Intel(R) UHD Graphics 620 (KBL GT2)")
    } else {
        (
            "Win32",
            "Google Inc. (Intel)",
            "ANGLE (Intel, Intel(R) UHD Graphics 630 Direct3D11 vs_5_0 ps_5_0, D3D11)",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_consistent_identity() {
        let pool = IdentityPool::new();
        for _ in 0..20 {
            let identity = pool.pick();
            assert!(USER_AGENT_POOL.contains(&identity.user_agent.as_str()));
            assert!(VIEWPORT_POOL.contains(&identity.viewport));
            if identity.user_agent.contains("Windows") {
                assert_eq!(identity.platform, "Win32");
            }
            if identity.user_agent.contains("Macintosh") {
                assert_eq!(identity.platform, "MacIntel");
            }
        }
    }

    #[test]
    fn languages_strip_quality_values() {
        let identity = Identity {
            user_agent: String::new(),
            platform: "Win32".into(),
            locale: "pt-BR".into(),
            accept_language: "pt-BR,pt;q=0.9,en-US;q=0.8".into(),
            viewport: (1920, 1080),
            hardware_concurrency: 8,
            webgl_vendor: String::new(),
            webgl_renderer: String::new(),
        };
        assert_eq!(identity.languages(), ["pt-BR", "pt", "en-US"]);
    }
}
