//! Marketplace items API: structured data without rendering the page.

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::debug;

use crate::config::PrimaryApiConfig;
use crate::page_extractor::ProductRecord;
use crate::resolver::{SoftFailure, Tier, TierError, TierKind};

static CATALOG_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/p/(ML[A-Z]\d+)").ok());
static ITEM_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(ML[A-Z])-?(\d+)").ok());

/// Pull the marketplace id out of a listing URL.
///
/// Catalog URLs (`/p/MLB123`) win over the item id embedded in the slug
/// (`MLB-123-produto`).
#[must_use]
pub fn extract_item_id(url: &str) -> Option<String> {
    if let Some(re) = CATALOG_ID.as_ref()
        && let Some(caps) = re.captures(url)
    {
        return Some(caps[1].to_string());
    }
    let re = ITEM_ID.as_ref()?;
    let caps = re.captures(url)?;
    Some(format!("{}{}", &caps[1], &caps[2]))
}

#[derive(Debug, Deserialize)]
struct ApiItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    original_price: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    pictures: Vec<ApiPicture>,
}

#[derive(Debug, Deserialize)]
struct ApiPicture {
    #[serde(default)]
    secure_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl ApiItem {
    fn into_record(self) -> ProductRecord {
        let image = self
            .pictures
            .into_iter()
            .find_map(|p| p.secure_url.or(p.url))
            .or(self.thumbnail);

        ProductRecord::new(self.title.unwrap_or_default(), self.price.unwrap_or(0.0))
            .with_image(image)
            .with_original_price(self.original_price)
    }
}

pub struct MarketplaceApiTier {
    client: Client,
    config: PrimaryApiConfig,
}

impl MarketplaceApiTier {
    pub fn new(config: PrimaryApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build marketplace API client")?;
        Ok(Self { client, config })
    }

    async fn fetch_item(&self, request_url: &str) -> Result<ProductRecord, TierError> {
        let item_id = extract_item_id(request_url).ok_or_else(|| {
            SoftFailure::NotFound(format!("no marketplace item id in {request_url}"))
        })?;

        let endpoint = format!("{}/items/{item_id}", self.config.base_url.trim_end_matches('/'));
        debug!("Querying marketplace API: {endpoint}");

        let mut request = self.client.get(&endpoint);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN => {
                return Err(TierError::blocked(format!(
                    "marketplace API answered {}",
                    response.status()
                )));
            }
            StatusCode::NOT_FOUND => {
                return Err(SoftFailure::NotFound(format!("item {item_id} not found")).into());
            }
            status if !status.is_success() => {
                return Err(SoftFailure::Network(format!("marketplace API answered {status}")).into());
            }
            _ => {}
        }

        let item: ApiItem = response.json().await?;
        Ok(item.into_record())
    }
}

impl Tier for MarketplaceApiTier {
    fn kind(&self) -> TierKind {
        TierKind::PrimaryApi
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn fetch<'a>(&'a self, request_url: &'a str) -> BoxFuture<'a, Result<ProductRecord, TierError>> {
        Box::pin(self.fetch_item(request_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ids_from_listing_urls() {
        assert_eq!(
            extract_item_id("https://produto.mercadolivre.com.br/MLB-1234567890-fone-bluetooth-_JM"),
            Some("MLB1234567890".to_string())
        );
        assert_eq!(
            extract_item_id("https://www.mercadolivre.com.br/fone-bluetooth/p/MLB19876543"),
            Some("MLB19876543".to_string())
        );
        assert_eq!(
            extract_item_id("https://articulo.mercadolibre.com.ar/MLA987654-auriculares"),
            Some("MLA987654".to_string())
        );
        assert_eq!(extract_item_id("https://www.mercadolivre.com.br/ofertas"), None);
    }

    #[test]
    fn maps_item_payload() {
        let item: ApiItem = serde_json::from_str(
            r#"{
                "id": "MLB123",
                "title": "Fone Bluetooth ",
                "price": 89.9,
                "original_price": 129.9,
                "thumbnail": "http://thumb.jpg",
                "pictures": [{"url": "http://pic.jpg", "secure_url": "https://pic.jpg"}]
            }"#,
        )
        .expect("valid item json");

        let record = item.into_record();
        assert_eq!(record.title, "Fone Bluetooth");
        assert_eq!(record.price, 89.9);
        assert_eq!(record.image_url.as_deref(), Some("https://pic.jpg"));
        assert_eq!(record.original_price, Some(129.9));
        assert_eq!(record.discount_percent, Some(31));
    }

    #[test]
    fn falls_back_to_thumbnail_and_tolerates_nulls() {
        let item: ApiItem = serde_json::from_str(
            r#"{"title": "Cabo USB", "price": 19.0, "original_price": null,
                "thumbnail": "http://thumb.jpg", "pictures": []}"#,
        )
        .expect("valid item json");

        let record = item.into_record();
        assert_eq!(record.image_url.as_deref(), Some("http://thumb.jpg"));
        assert_eq!(record.original_price, None);
        assert!(record.is_valid());
    }
}
