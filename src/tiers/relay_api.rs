//! Rotating-proxy relay: the relay fetches the listing HTML from a
//! residential address and hands it back for local extraction.

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::RelayConfig;
use crate::page_extractor::{ProductRecord, detect_block, extract_product};
use crate::resolver::{SoftFailure, Tier, TierError, TierKind};

pub struct RelayApiTier {
    client: Client,
    config: RelayConfig,
}

impl RelayApiTier {
    pub fn new(config: RelayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build relay client")?;
        Ok(Self { client, config })
    }

    async fn fetch_via_relay(&self, request_url: &str) -> Result<ProductRecord, TierError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| SoftFailure::Network("relay API key is not configured".into()))?;

        debug!("Fetching {request_url} through relay {}", self.config.endpoint);
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("api_key", api_key),
                ("url", request_url),
                ("country_code", self.config.country_code.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SoftFailure::NotFound(format!("relay could not find {request_url}")).into());
        }
        if !status.is_success() {
            // Relay-side 403/429 are quota or pool issues, not a page block
            return Err(SoftFailure::Network(format!("relay answered {status}")).into());
        }

        let html = response.text().await?;
        if let Some(signal) = detect_block(&html, None) {
            return Err(TierError::blocked(signal.reason));
        }
        Ok(extract_product(&html)?)
    }
}

impl Tier for RelayApiTier {
    fn kind(&self) -> TierKind {
        TierKind::RelayApi
    }

    fn is_enabled(&self) -> bool {
        self.config.is_usable()
    }

    fn fetch<'a>(&'a self, request_url: &'a str) -> BoxFuture<'a, Result<ProductRecord, TierError>> {
        Box::pin(self.fetch_via_relay(request_url))
    }
}
