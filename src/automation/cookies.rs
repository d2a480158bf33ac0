//! Cookie snapshot shared by all browsing contexts.
//!
//! Contexts are isolated jars. Each one is seeded from this snapshot when it
//! opens and writes its jar back when it closes, so marketplace session
//! cookies survive across requests and restarts without two live contexts
//! ever sharing a jar.

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::network::{
    Cookie, CookieParam, CookieSameSite, TimeSinceEpoch,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Serializable subset of a CDP cookie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Seconds since the Unix epoch; `None` for session cookies
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: Option<CookieSameSite>,
}

impl StoredCookie {
    fn same_slot(&self, other: &StoredCookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }

    #[must_use]
    pub fn is_expired_at(&self, now_secs: f64) -> bool {
        self.expires.is_some_and(|at| at <= now_secs)
    }

    #[must_use]
    pub fn to_param(&self) -> CookieParam {
        let mut param = CookieParam::new(self.name.clone(), self.value.clone());
        param.domain = Some(self.domain.clone());
        param.path = Some(self.path.clone());
        param.secure = Some(self.secure);
        param.http_only = Some(self.http_only);
        param.same_site = self.same_site.clone();
        param.expires = self.expires.map(TimeSinceEpoch::new);
        param
    }
}

impl From<&Cookie> for StoredCookie {
    fn from(cookie: &Cookie) -> Self {
        Self {
            name: cookie.name.clone(),
            value: cookie.value.clone(),
            domain: cookie.domain.clone(),
            path: cookie.path.clone(),
            expires: (!cookie.session && cookie.expires > 0.0).then_some(cookie.expires),
            http_only: cookie.http_only,
            secure: cookie.secure,
            same_site: cookie.same_site.clone(),
        }
    }
}

pub struct CookieStore {
    path: Option<PathBuf>,
    /// Held across the file write so snapshots never interleave
    cookies: Mutex<Vec<StoredCookie>>,
}

impl CookieStore {
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            cookies: Mutex::new(Vec::new()),
        }
    }

    /// Load the snapshot file, if configured and present.
    ///
    /// Returns the number of live cookies loaded.
    pub async fn load(&self) -> Result<usize> {
        let Some(path) = &self.path else {
            return Ok(0);
        };
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            debug!("No cookie snapshot at {}", path.display());
            return Ok(0);
        }

        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read cookie snapshot {}", path.display()))?;
        let loaded: Vec<StoredCookie> = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed cookie snapshot {}", path.display()))?;

        let now = now_secs();
        let live: Vec<StoredCookie> = loaded.into_iter().filter(|c| !c.is_expired_at(now)).collect();
        let count = live.len();
        *self.cookies.lock().await = live;

        info!("Loaded {count} cookies from {}", path.display());
        Ok(count)
    }

    /// Current live cookies, for seeding a new context
    pub async fn snapshot(&self) -> Vec<StoredCookie> {
        let now = now_secs();
        self.cookies
            .lock()
            .await
            .iter()
            .filter(|c| !c.is_expired_at(now))
            .cloned()
            .collect()
    }

    /// Merge a closing context's jar into the snapshot and persist it.
    ///
    /// Cookies are keyed by name, domain and path; the incoming jar wins.
    pub async fn merge_and_save(&self, jar: Vec<StoredCookie>) -> Result<()> {
        let now = now_secs();
        let mut cookies = self.cookies.lock().await;

        for incoming in jar {
            match cookies.iter_mut().find(|c| c.same_slot(&incoming)) {
                Some(existing) => *existing = incoming,
                None => cookies.push(incoming),
            }
        }
        cookies.retain(|c| !c.is_expired_at(now));

        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&*cookies).context("Failed to serialize cookies")?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            warn!("Failed to move cookie snapshot into place: {e}");
            return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
        }

        debug!("Saved {} cookies to {}", cookies.len(), path.display());
        Ok(())
    }
}

fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
