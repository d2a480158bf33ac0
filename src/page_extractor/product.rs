//! HTML to [`ProductRecord`] extraction.

use thiserror::Error;

use super::schema::ProductRecord;
use super::strategies::{
    IMAGE_STRATEGIES, ORIGINAL_PRICE_STRATEGIES, PRICE_STRATEGIES, ProductPage, TITLE_STRATEGIES,
    first_match,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no product title found on page")]
    MissingTitle,

    #[error("no parseable price found on page")]
    MissingPrice,
}

/// Extract a complete product record from page HTML.
///
/// Title and price are mandatory; image and original price are best-effort.
pub fn extract_product(raw_html: &str) -> Result<ProductRecord, ExtractionError> {
    let page = ProductPage::parse(raw_html);

    let (title_source, title) =
        first_match(&page, TITLE_STRATEGIES).ok_or(ExtractionError::MissingTitle)?;
    let (price_source, price) =
        first_match(&page, PRICE_STRATEGIES).ok_or(ExtractionError::MissingPrice)?;

    let image = first_match(&page, IMAGE_STRATEGIES).map(|(_, url)| url);
    let original = first_match(&page, ORIGINAL_PRICE_STRATEGIES).map(|(_, value)| value);

    log::debug!(
        "Extracted product (title via {title_source}, price via {price_source}): {title} @ {price:.2}"
    );

    let record = ProductRecord::new(title, price)
        .with_image(image)
        .with_original_price(original);

    if !record.is_valid() {
        return Err(if record.title.trim().is_empty() {
            ExtractionError::MissingTitle
        } else {
            ExtractionError::MissingPrice
        });
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_price_is_an_error() {
        let html = "<html><body><h1 class=\"ui-pdp-title\">Notebook Gamer</h1></body></html>";
        assert_eq!(extract_product(html), Err(ExtractionError::MissingPrice));
    }

    #[test]
    fn missing_title_is_an_error() {
        let html = r#"<html><body><span class="andes-money-amount">
            <span class="andes-money-amount__fraction">10</span></span></body></html>"#;
        assert_eq!(extract_product(html), Err(ExtractionError::MissingTitle));
    }
}
