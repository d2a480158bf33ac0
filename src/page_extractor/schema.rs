use serde::{Deserialize, Serialize};

/// Normalized product data for one listing.
///
/// Only complete records leave a tier: see [`ProductRecord::is_valid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub title: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<u8>,
}

impl ProductRecord {
    #[must_use]
    pub fn new(title: impl Into<String>, price: f64) -> Self {
        Self {
            title: title.into().trim().to_string(),
            price,
            image_url: None,
            original_price: None,
            discount_percent: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|u| !u.trim().is_empty());
        self
    }

    /// Attach the strike-through price and derive the discount from it.
    ///
    /// Ignored unless it is strictly above the current price.
    #[must_use]
    pub fn with_original_price(mut self, original_price: Option<f64>) -> Self {
        match original_price {
            Some(original) if original.is_finite() && original > self.price => {
                self.original_price = Some(original);
                self.discount_percent = Some(discount_percent(original, self.price));
            }
            _ => {
                self.original_price = None;
                self.discount_percent = None;
            }
        }
        self
    }

    /// A record is usable only with a non-blank title and a positive price.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && self.price.is_finite() && self.price > 0.0
    }
}

/// Rounded percentage saved relative to `original`, clamped to 0..=100.
#[must_use]
pub fn discount_percent(original: f64, price: f64) -> u8 {
    if original <= 0.0 || !original.is_finite() || !price.is_finite() {
        return 0;
    }
    let pct = ((original - price) / original * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}
