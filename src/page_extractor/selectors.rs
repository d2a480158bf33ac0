//! CSS selector candidates for marketplace product pages.
//!
//! Each list is tried in order and the first usable match wins. Update the
//! lists when the marketplace changes its markup, and add a fixture to
//! `tests/extraction_test.rs` for the new shape.

use scraper::Selector;
use std::sync::LazyLock;

fn compile(candidates: &[&str]) -> Vec<Selector> {
    candidates
        .iter()
        .filter_map(|css| match Selector::parse(css) {
            Ok(selector) => Some(selector),
            Err(e) => {
                log::error!("Invalid selector '{css}': {e:?}");
                None
            }
        })
        .collect()
}

pub(crate) const TITLE_CSS: &[&str] = &[
    "h1.ui-pdp-title",
    ".ui-pdp-header__title-container h1",
    "h1[itemprop=\"name\"]",
    "h1",
];

pub(crate) const PRICE_CONTAINER_CSS: &[&str] = &[
    ".ui-pdp-price__second-line .andes-money-amount:not(.andes-money-amount--previous)",
    ".ui-pdp-price__main-container .andes-money-amount:not(.andes-money-amount--previous)",
    "[itemprop=\"offers\"] .andes-money-amount:not(.andes-money-amount--previous)",
    ".andes-money-amount:not(.andes-money-amount--previous)",
];

pub(crate) const ORIGINAL_PRICE_CONTAINER_CSS: &[&str] = &[
    "s.andes-money-amount--previous",
    ".ui-pdp-price__original-value .andes-money-amount",
    ".andes-money-amount--previous",
];

pub(crate) const IMAGE_CSS: &[&str] = &[
    "figure.ui-pdp-gallery__figure img",
    "img.ui-pdp-image",
    ".ui-pdp-gallery img",
];

pub(crate) const META_CSS: &[&str] = &[
    "meta[property=\"og:title\"]",
    "meta[property=\"product:price:amount\"], meta[property=\"og:price:amount\"], meta[itemprop=\"price\"]",
    "meta[property=\"og:image\"]",
];

/// Product title heading candidates
pub static TITLE: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(TITLE_CSS));

/// Current-price money amount containers (strike-through amounts excluded)
pub static PRICE_CONTAINER: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile(PRICE_CONTAINER_CSS));

/// Strike-through (pre-discount) money amount containers
pub static ORIGINAL_PRICE_CONTAINER: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile(ORIGINAL_PRICE_CONTAINER_CSS));

/// Gallery image candidates
pub static IMAGE: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(IMAGE_CSS));

/// Integer part inside a money amount container
pub static PRICE_FRACTION: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile(&[".andes-money-amount__fraction"]));

/// Cents part inside a money amount container
pub static PRICE_CENTS: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile(&[".andes-money-amount__cents"]));

pub static META_TITLE: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(&META_CSS[0..1]));
pub static META_PRICE: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(&META_CSS[1..2]));
pub static META_IMAGE: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(&META_CSS[2..3]));

pub static JSON_LD: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile(&["script[type=\"application/ld+json\"]"]));

pub static ARIA_LABELLED: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(&["[aria-label]"]));

pub static PAGE_TITLE: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(&["title"]));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_candidate_compiles() {
        assert_eq!(TITLE.len(), TITLE_CSS.len());
        assert_eq!(PRICE_CONTAINER.len(), PRICE_CONTAINER_CSS.len());
        assert_eq!(ORIGINAL_PRICE_CONTAINER.len(), ORIGINAL_PRICE_CONTAINER_CSS.len());
        assert_eq!(IMAGE.len(), IMAGE_CSS.len());
        assert_eq!(META_TITLE.len() + META_PRICE.len() + META_IMAGE.len(), META_CSS.len());
        for single in [&PRICE_FRACTION, &PRICE_CENTS, &JSON_LD, &ARIA_LABELLED, &PAGE_TITLE] {
            assert_eq!(single.len(), 1);
        }
    }
}
