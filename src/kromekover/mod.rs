use anyhow::{Context, Result};
use chromiumoxide::{Page, cdp};
use futures::future::join_all;
use tracing::{debug, warn};

mod config;
pub use config::StealthConfig;

use crate::automation::Identity;

// Order matters: the navigator patches read window.__stealthConfig
const EVASION_SCRIPTS: &[(&str, &str)] = &[
    ("navigator_webdriver", include_str!("evasions/navigator_webdriver.js")),
    ("navigator_language", include_str!("evasions/navigator_language.js")),
    ("navigator_platform", include_str!("evasions/navigator_platform.js")),
    ("navigator_plugins", include_str!("evasions/navigator_plugins.js")),
    ("screen_size", include_str!("evasions/screen_size.js")),
    ("webgl_vendor", include_str!("evasions/webgl_vendor.js")),
    ("chrome_runtime", include_str!("evasions/chrome_runtime.js")),
];

fn on_new_document(source: String) -> cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams {
    cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams::new(source)
}

/// Register the evasion scripts for every new document in `page` and apply
/// the identity's user agent, Accept-Language and platform.
///
/// Must run on a blank page before the first navigation.
pub async fn inject(page: &Page, identity: &Identity) -> Result<()> {
    let session_seed: Vec<u8> = (0..16).map(|_| rand::random::<u8>()).collect();
    let stealth = StealthConfig::from_identity(identity, hex::encode(&session_seed));

    debug!("Injecting window.__stealthConfig");
    let bootstrap = stealth
        .bootstrap_script()
        .context("Failed to serialize stealth config")?;
    page.execute(on_new_document(bootstrap))
        .await
        .context("Failed to register stealth config")?;

    let inject_futures: Vec<_> = EVASION_SCRIPTS
        .iter()
        .map(|(name, source)| {
            let page = page.clone();
            async move {
                let result = page.execute(on_new_document((*source).to_string())).await;
                (*name, result)
            }
        })
        .collect();

    let mut injected = 0;
    for (name, result) in join_all(inject_futures).await {
        match result {
            Ok(_) => {
                debug!("✓ Injected: {name}");
                injected += 1;
            }
            Err(e) => warn!("✗ Failed to inject {name}: {e}"),
        }
    }

    if injected == 0 {
        return Err(anyhow::anyhow!("Failed to inject any stealth scripts"));
    }

    let mut user_agent =
        cdp::browser_protocol::network::SetUserAgentOverrideParams::new(identity.user_agent.clone());
    user_agent.accept_language = Some(identity.accept_language.clone());
    user_agent.platform = Some(identity.platform.clone());
    page.execute(user_agent)
        .await
        .context("Failed to override user agent")?;

    debug!(
        "Stealth injection complete: {injected}/{} scripts active",
        EVASION_SCRIPTS.len()
    );
    Ok(())
}
