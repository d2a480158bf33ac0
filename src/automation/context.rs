//! One isolated browsing context per listing visit.

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetLocaleOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::{Browser, Page};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::cookies::{CookieStore, StoredCookie};
use super::identity::Identity;
use super::interception::enable_resource_blocking;
use crate::config::AutomationConfig;
use crate::kromekover;
use crate::page_extractor::{
    ProductRecord, detect_block, extract_product, page_html, settle_like_a_visitor,
    wait_for_page_load,
};
use crate::resolver::{SoftFailure, TierError};

/// An incognito-style browser context with a single page.
///
/// Cookies, storage and cache are private to the context. It must be
/// released with [`BrowsingContext::close`], which also writes the jar
/// back to the shared [`CookieStore`].
pub struct BrowsingContext<'a> {
    browser: &'a Browser,
    id: BrowserContextId,
    page: Page,
    identity: Identity,
    interception: Option<JoinHandle<()>>,
}

impl<'a> BrowsingContext<'a> {
    /// Create the context, apply the identity and seed it with the stored
    /// cookies. The page is left on `about:blank`.
    pub async fn open(
        browser: &'a Browser,
        identity: Identity,
        cookies: &CookieStore,
        config: &AutomationConfig,
    ) -> Result<Self> {
        let id = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .context("Failed to create browser context")?
            .result
            .browser_context_id;

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(id.clone())
            .build()
            .map_err(anyhow::Error::msg)?;

        let page = match browser.new_page(target).await {
            Ok(page) => page,
            Err(e) => {
                dispose_context(browser, id).await;
                return Err(e).context("Failed to open page in browser context");
            }
        };

        let mut context = Self {
            browser,
            id,
            page,
            identity,
            interception: None,
        };

        if let Err(e) = context.prepare(cookies, config).await {
            context.discard().await;
            return Err(e);
        }
        Ok(context)
    }

    async fn prepare(&mut self, cookies: &CookieStore, config: &AutomationConfig) -> Result<()> {
        kromekover::inject(&self.page, &self.identity).await?;

        let (width, height) = self.identity.viewport;
        self.page
            .execute(SetDeviceMetricsOverrideParams::new(
                i64::from(width),
                i64::from(height),
                1.0,
                false,
            ))
            .await
            .context("Failed to set viewport")?;

        self.page
            .execute(SetLocaleOverrideParams {
                locale: Some(self.identity.locale.clone()),
            })
            .await
            .context("Failed to set locale")?;

        if config.block_resources {
            self.interception = Some(enable_resource_blocking(&self.page).await?);
        }

        let seeded: Vec<_> = cookies
            .snapshot()
            .await
            .iter()
            .map(StoredCookie::to_param)
            .collect();
        if !seeded.is_empty() {
            let count = seeded.len();
            self.page
                .set_cookies(seeded)
                .await
                .context("Failed to seed cookies")?;
            debug!("Seeded context with {count} cookies");
        }

        Ok(())
    }

    /// Navigate to `url`, behave like a visitor for a moment, then classify
    /// and extract the rendered page.
    pub async fn visit(&self, url: &str, config: &AutomationConfig) -> Result<ProductRecord, TierError> {
        match tokio::time::timeout(config.navigation_timeout, self.page.goto(url)).await {
            Err(_) => {
                return Err(SoftFailure::Timeout(format!(
                    "navigation exceeded {:.0}s",
                    config.navigation_timeout.as_secs_f64()
                ))
                .into());
            }
            Ok(Err(e)) => return Err(SoftFailure::Browser(format!("navigation failed: {e}")).into()),
            Ok(Ok(_)) => {}
        }

        wait_for_page_load(&self.page, config.navigation_timeout)
            .await
            .map_err(browser_failure)?;
        settle_like_a_visitor(&self.page, config.settle_min, config.settle_max)
            .await
            .map_err(browser_failure)?;

        let final_url = self.page.url().await.ok().flatten();
        let html = page_html(&self.page).await.map_err(browser_failure)?;

        if let Some(signal) = detect_block(&html, final_url.as_deref()) {
            return Err(TierError::blocked(signal.reason));
        }

        Ok(extract_product(&html)?)
    }

    /// Persist the jar, then tear down the page and the context.
    pub async fn close(self, cookies: &CookieStore) {
        match self.page.get_cookies().await {
            Ok(jar) => {
                let jar: Vec<StoredCookie> = jar.iter().map(StoredCookie::from).collect();
                if let Err(e) = cookies.merge_and_save(jar).await {
                    warn!("Failed to persist cookies: {e:#}");
                }
            }
            Err(e) => warn!("Failed to read context cookies: {e}"),
        }
        self.discard().await;
    }

    async fn discard(self) {
        if let Some(task) = self.interception {
            task.abort();
        }
        if let Err(e) = self.page.close().await {
            debug!("Page close failed: {e}");
        }
        dispose_context(self.browser, self.id).await;
    }
}

async fn dispose_context(browser: &Browser, id: BrowserContextId) {
    if let Err(e) = browser.execute(DisposeBrowserContextParams::new(id)).await {
        warn!("Failed to dispose browser context: {e}");
    }
}

fn browser_failure(err: anyhow::Error) -> TierError {
    SoftFailure::Browser(format!("{err:#}")).into()
}

/// Upper bound for a whole visit: navigation, load wait and settle time
#[must_use]
pub fn visit_budget(config: &AutomationConfig) -> Duration {
    config.navigation_timeout * 2 + config.settle_max + Duration::from_secs(5)
}
