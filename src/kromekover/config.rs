use serde::Serialize;

use crate::automation::Identity;

/// Values exposed to the evasion scripts as `window.__stealthConfig`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StealthConfig {
    pub accept_language: String,
    pub platform: String,
    pub language: String,
    pub languages: Vec<String>,
    pub screen_width: u32,
    pub screen_height: u32,
    pub webgl_vendor: String,
    pub webgl_renderer: String,
    pub hardware_concurrency: u32,
    pub session_seed: String,
}

impl StealthConfig {
    #[must_use]
    pub fn from_identity(identity: &Identity, session_seed: String) -> Self {
        let languages = identity.languages();
        Self {
            accept_language: identity.accept_language.clone(),
            platform: identity.platform.clone(),
            language: languages
                .first()
                .cloned()
                .unwrap_or_else(|| identity.locale.clone()),
            languages,
            screen_width: identity.viewport.0,
            screen_height: identity.viewport.1,
            webgl_vendor: identity.webgl_vendor.clone(),
            webgl_renderer: identity.webgl_renderer.clone(),
            hardware_concurrency: identity.hardware_concurrency,
            session_seed,
        }
    }

    /// Script that installs this config before any page script runs
    pub fn bootstrap_script(&self) -> serde_json::Result<String> {
        Ok(format!(
            "Object.defineProperty(window, '__stealthConfig', {{ value: Object.freeze({}), enumerable: false }});",
            serde_json::to_string(self)?
        ))
    }
}
