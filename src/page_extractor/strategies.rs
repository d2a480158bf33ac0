//! Ordered extraction strategies per product field.
//!
//! Every strategy is a pure function over a parsed [`ProductPage`]. For each
//! field the strategies run in list order and the first `Some` wins:
//! structured data, then meta attributes, then DOM rules, then text heuristics.

use regex::Regex;
use scraper::{CaseSensitivity, ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;

use super::price::{normalize_price, normalize_price_parts};
use super::selectors;

const TITLE_MIN_CHARS: usize = 3;
const TITLE_MAX_CHARS: usize = 500;

static ARIA_AMOUNT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,3}(?:\.\d{3})*|\d+)\s*rea(?:l|is)\b(?:\s*(?:com|e)\s*(\d{1,2})\s*centavos?)?")
        .ok()
});

/// A parsed page plus its schema.org Product node, if any.
pub struct ProductPage {
    pub html: Html,
    pub product_ld: Option<Value>,
}

impl ProductPage {
    #[must_use]
    pub fn parse(raw_html: &str) -> Self {
        let html = Html::parse_document(raw_html);
        let product_ld = find_json_ld_product(&html);
        Self { html, product_ld }
    }
}

/// One named way of reading a field
pub struct Strategy<T> {
    pub name: &'static str,
    pub run: fn(&ProductPage) -> Option<T>,
}

pub static TITLE_STRATEGIES: &[Strategy<String>] = &[
    Strategy { name: "json-ld", run: title_from_json_ld },
    Strategy { name: "meta", run: title_from_meta },
    Strategy { name: "dom", run: title_from_dom },
];

pub static PRICE_STRATEGIES: &[Strategy<f64>] = &[
    Strategy { name: "json-ld", run: price_from_json_ld },
    Strategy { name: "meta", run: price_from_meta },
    Strategy { name: "dom", run: price_from_dom },
    Strategy { name: "aria-label", run: price_from_aria_label },
];

pub static IMAGE_STRATEGIES: &[Strategy<String>] = &[
    Strategy { name: "json-ld", run: image_from_json_ld },
    Strategy { name: "meta", run: image_from_meta },
    Strategy { name: "dom", run: image_from_dom },
];

pub static ORIGINAL_PRICE_STRATEGIES: &[Strategy<f64>] = &[
    Strategy { name: "dom", run: original_price_from_dom },
    Strategy { name: "aria-label", run: original_price_from_aria_label },
];

/// Run strategies in order and return the first hit with its strategy name.
pub fn first_match<T>(page: &ProductPage, strategies: &[Strategy<T>]) -> Option<(&'static str, T)> {
    strategies
        .iter()
        .find_map(|s| (s.run)(page).map(|value| (s.name, value)))
}

// ---------------------------------------------------------------------------
// Structured data
// ---------------------------------------------------------------------------

fn find_json_ld_product(html: &Html) -> Option<Value> {
    for selector in selectors::JSON_LD.iter() {
        for script in html.select(selector) {
            let text: String = script.text().collect();
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            let Ok(value) = serde_json::from_str::<Value>(text) else {
                log::debug!("Skipping malformed JSON-LD block");
                continue;
            };
            if let Some(product) = find_product_node(&value) {
                return Some(product.clone());
            }
        }
    }
    None
}

fn find_product_node(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_product_node),
        Value::Object(map) => {
            if map.get("@type").is_some_and(type_is_product) {
                return Some(value);
            }
            map.get("@graph").and_then(find_product_node)
        }
        _ => None,
    }
}

fn type_is_product(t: &Value) -> bool {
    match t {
        Value::String(s) => s.eq_ignore_ascii_case("product"),
        Value::Array(items) => items.iter().any(type_is_product),
        _ => false,
    }
}

fn json_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => normalize_price(s).ok(),
        _ => None,
    }
}

fn offer_price(offer: &Value) -> Option<f64> {
    offer
        .get("price")
        .and_then(json_price)
        .or_else(|| offer.get("lowPrice").and_then(json_price))
}

fn title_from_json_ld(page: &ProductPage) -> Option<String> {
    let name = page.product_ld.as_ref()?.get("name")?.as_str()?;
    plausible_title(name)
}

fn price_from_json_ld(page: &ProductPage) -> Option<f64> {
    let offers = page.product_ld.as_ref()?.get("offers")?;
    let price = match offers {
        Value::Array(list) => list.iter().find_map(offer_price),
        other => offer_price(other),
    }?;
    positive(price)
}

fn image_from_json_ld(page: &ProductPage) -> Option<String> {
    let image = page.product_ld.as_ref()?.get("image")?;
    image_url_from_value(image)
}

fn image_url_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_blank(s),
        Value::Array(items) => items.iter().find_map(image_url_from_value),
        Value::Object(map) => map.get("url").and_then(image_url_from_value),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Meta attributes
// ---------------------------------------------------------------------------

fn meta_content(page: &ProductPage, candidates: &[Selector]) -> Option<String> {
    candidates.iter().find_map(|selector| {
        page.html
            .select(selector)
            .find_map(|el| el.value().attr("content").and_then(non_blank))
    })
}

fn title_from_meta(page: &ProductPage) -> Option<String> {
    meta_content(page, &selectors::META_TITLE).and_then(|t| plausible_title(&t))
}

fn price_from_meta(page: &ProductPage) -> Option<f64> {
    meta_content(page, &selectors::META_PRICE)
        .and_then(|p| normalize_price(&p).ok())
        .and_then(positive)
}

fn image_from_meta(page: &ProductPage) -> Option<String> {
    meta_content(page, &selectors::META_IMAGE)
}

// ---------------------------------------------------------------------------
// DOM rules
// ---------------------------------------------------------------------------

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}

fn title_from_dom(page: &ProductPage) -> Option<String> {
    selectors::TITLE.iter().find_map(|selector| {
        page.html
            .select(selector)
            .find_map(|el| plausible_title(&element_text(el)))
    })
}

/// Read an `andes-money-amount` container as integer fraction plus cents.
fn money_amount(container: ElementRef<'_>) -> Option<f64> {
    let fraction = selectors::PRICE_FRACTION
        .iter()
        .find_map(|s| container.select(s).next())
        .map(element_text)?;
    let cents = selectors::PRICE_CENTS
        .iter()
        .find_map(|s| container.select(s).next())
        .map(element_text);

    normalize_price_parts(fraction.trim(), cents.as_deref().map(str::trim))
        .ok()
        .and_then(positive)
}

/// The element itself or any ancestor is a strikethrough or "previous" amount
fn is_struck_through(el: ElementRef<'_>) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .any(|a| {
            a.value().name() == "s"
                || a.value()
                    .has_class("andes-money-amount--previous", CaseSensitivity::AsciiCaseInsensitive)
        })
}

fn price_from_dom(page: &ProductPage) -> Option<f64> {
    selectors::PRICE_CONTAINER.iter().find_map(|selector| {
        page.html
            .select(selector)
            .filter(|el| !is_struck_through(*el))
            .find_map(money_amount)
    })
}

fn original_price_from_dom(page: &ProductPage) -> Option<f64> {
    selectors::ORIGINAL_PRICE_CONTAINER
        .iter()
        .find_map(|selector| page.html.select(selector).find_map(money_amount))
}

fn image_from_dom(page: &ProductPage) -> Option<String> {
    selectors::IMAGE.iter().find_map(|selector| {
        page.html.select(selector).find_map(|img| {
            let attrs = img.value();
            attrs
                .attr("data-zoom")
                .or_else(|| attrs.attr("src"))
                .filter(|src| !src.starts_with("data:"))
                .and_then(non_blank)
        })
    })
}

// ---------------------------------------------------------------------------
// Text heuristics
// ---------------------------------------------------------------------------

fn aria_amounts(page: &ProductPage, previous: bool) -> Option<f64> {
    let regex = ARIA_AMOUNT.as_ref()?;
    selectors::ARIA_LABELLED.iter().find_map(|selector| {
        page.html.select(selector).find_map(|el| {
            let label = el.value().attr("aria-label")?;
            let lowered = label.trim().to_lowercase();
            if lowered.starts_with("antes") != previous {
                return None;
            }
            let caps = regex.captures(label)?;
            let integer = caps.get(1)?.as_str();
            let cents = caps.get(2).map(|c| format!("{:0>2}", c.as_str()));
            normalize_price_parts(integer, cents.as_deref())
                .ok()
                .and_then(positive)
        })
    })
}

fn price_from_aria_label(page: &ProductPage) -> Option<f64> {
    aria_amounts(page, false)
}

fn original_price_from_aria_label(page: &ProductPage) -> Option<f64> {
    aria_amounts(page, true)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn plausible_title(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let len = collapsed.chars().count();
    (TITLE_MIN_CHARS..=TITLE_MAX_CHARS)
        .contains(&len)
        .then_some(collapsed)
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn positive(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}
