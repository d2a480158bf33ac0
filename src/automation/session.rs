//! Long-lived browser session backing the automation tier.
//!
//! The browser process is launched lazily on first use (or eagerly through
//! [`AutomationSession::initialize`]) and shared by every request. Each
//! request gets its own [`BrowsingContext`]; the number of live contexts is
//! bounded by a semaphore.

use anyhow::{Result, anyhow};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, error, info, warn};

use super::context::{BrowsingContext, visit_budget};
use super::cookies::CookieStore;
use super::identity::IdentityPool;
use crate::browser_setup::{BrowserHandle, launch_browser};
use crate::config::AutomationConfig;
use crate::page_extractor::ProductRecord;
use crate::resolver::{SoftFailure, TierError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Ready,
    /// Shut down; never relaunched
    Closed,
    /// Launch failed; the tier stays disabled until restart
    Failed,
}

pub struct AutomationSession {
    config: AutomationConfig,
    state: Mutex<SessionState>,
    browser: RwLock<Option<BrowserHandle>>,
    contexts: Arc<Semaphore>,
    cookies: CookieStore,
    identities: IdentityPool,
}

impl AutomationSession {
    #[must_use]
    pub fn new(config: AutomationConfig) -> Self {
        let contexts = Arc::new(Semaphore::new(config.max_concurrent_contexts.max(1)));
        let cookies = CookieStore::new(config.cookie_file.clone());
        Self {
            config,
            state: Mutex::new(SessionState::Uninitialized),
            browser: RwLock::new(None),
            contexts,
            cookies,
            identities: IdentityPool::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    #[must_use]
    pub fn config(&self) -> &AutomationConfig {
        &self.config
    }

    /// Launch the browser and load the cookie snapshot.
    ///
    /// Idempotent once ready. A launch failure moves the session to
    /// [`SessionState::Failed`] and is not retried.
    pub async fn initialize(&self) -> Result<()> {
        let mut guard = self.browser.write().await;

        match self.state() {
            SessionState::Ready if guard.is_some() => return Ok(()),
            SessionState::Closed => return Err(anyhow!("browser session is closed")),
            SessionState::Failed => return Err(anyhow!("browser session failed to start")),
            _ => {}
        }

        info!("Starting browser session (headless: {})", self.config.headless);
        match launch_browser(self.config.headless, self.config.user_data_dir.clone()).await {
            Ok(handle) => {
                *guard = Some(handle);
            }
            Err(e) => {
                error!("Browser launch failed, disabling automation tier: {e:#}");
                *self.state.lock() = SessionState::Failed;
                return Err(e);
            }
        }

        if let Err(e) = self.cookies.load().await {
            warn!("Ignoring unreadable cookie snapshot: {e:#}");
        }

        *self.state.lock() = SessionState::Ready;
        Ok(())
    }

    /// Make sure a healthy browser is running, launching or relaunching it
    /// as needed. Returns `false` when the session cannot serve requests.
    pub async fn ensure_ready(&self) -> bool {
        match self.state() {
            SessionState::Closed | SessionState::Failed => return false,
            SessionState::Uninitialized => return self.initialize().await.is_ok(),
            SessionState::Ready => {}
        }

        {
            let guard = self.browser.read().await;
            if let Some(handle) = guard.as_ref()
                && handle.is_alive().await
            {
                debug!("Browser health check passed");
                return true;
            }
        }

        warn!("Browser health check failed, relaunching");
        {
            let mut guard = self.browser.write().await;
            if let Some(mut crashed) = guard.take() {
                crashed.close().await;
            }
            // Re-check under the write lock: shutdown may have raced us
            if self.state() != SessionState::Ready {
                return false;
            }
            *self.state.lock() = SessionState::Uninitialized;
        }
        self.initialize().await.is_ok()
    }

    /// Visit one listing in a fresh browsing context.
    pub async fn fetch_listing(&self, url: &str) -> Result<ProductRecord, TierError> {
        let _permit = self
            .contexts
            .acquire()
            .await
            .map_err(|_| SoftFailure::Browser("browser session is shutting down".into()))?;

        let guard = self.browser.read().await;
        let Some(handle) = guard.as_ref() else {
            return Err(SoftFailure::Browser("browser is not running".into()).into());
        };

        let identity = self.identities.pick();
        debug!("Opening context as {} ({}x{})", identity.platform, identity.viewport.0, identity.viewport.1);

        let context = BrowsingContext::open(handle.browser(), identity, &self.cookies, &self.config)
            .await
            .map_err(|e| SoftFailure::Browser(format!("{e:#}")))?;

        let budget = visit_budget(&self.config);
        let outcome = match tokio::time::timeout(budget, context.visit(url, &self.config)).await {
            Ok(result) => result,
            Err(_) => Err(SoftFailure::Timeout(format!(
                "listing visit exceeded {:.0}s",
                budget.as_secs_f64()
            ))
            .into()),
        };

        context.close(&self.cookies).await;
        outcome
    }

    /// Close the browser. Safe to call repeatedly; later fetches fail.
    pub async fn shutdown(&self) {
        let mut guard = self.browser.write().await;
        *self.state.lock() = SessionState::Closed;
        self.contexts.close();
        if let Some(mut handle) = guard.take() {
            info!("Shutting down browser session");
            handle.close().await;
        }
    }
}
