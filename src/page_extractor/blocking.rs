//! Anti-bot interstitial detection.
//!
//! A blocked page is a different outcome from a page that simply lacks the
//! product fields: retrying a block from the same identity only makes it
//! worse, so callers abort the tier instead of retrying.

use scraper::Html;

use super::selectors;
use crate::utils::constants::{BLOCK_PHRASES, BLOCK_URL_MARKERS};

/// Why a page was classified as an anti-bot block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSignal {
    pub reason: String,
}

/// Inspect a page for anti-bot markers.
///
/// `final_url` is the URL after redirects when known; verification flows
/// usually redirect to a recognizable path before any HTML is served.
#[must_use]
pub fn detect_block(raw_html: &str, final_url: Option<&str>) -> Option<BlockSignal> {
    if let Some(url) = final_url {
        let lowered = url.to_lowercase();
        if let Some(marker) = BLOCK_URL_MARKERS.iter().find(|m| lowered.contains(**m)) {
            return Some(BlockSignal {
                reason: format!("redirected to verification URL ({marker})"),
            });
        }
    }

    let doc = Html::parse_document(raw_html);

    let title: String = selectors::PAGE_TITLE
        .iter()
        .find_map(|s| doc.select(s).next())
        .map(|t| t.text().collect())
        .unwrap_or_default();
    if let Some(phrase) = matching_phrase(&title) {
        return Some(BlockSignal {
            reason: format!("page title mentions '{phrase}'"),
        });
    }

    let body = visible_text(&doc);
    matching_phrase(&body).map(|phrase| BlockSignal {
        reason: format!("page content mentions '{phrase}'"),
    })
}

fn matching_phrase(text: &str) -> Option<&'static str> {
    if text.trim().is_empty() {
        return None;
    }
    let lowered = text.to_lowercase();
    BLOCK_PHRASES
        .iter()
        .copied()
        .find(|phrase| lowered.contains(*phrase))
}

/// Text a visitor would see: every text node outside script-like elements.
fn visible_text(doc: &Html) -> String {
    let mut out = String::new();
    for node in doc.tree.nodes() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|el| el.name().to_string()))
            .is_some_and(|name| matches!(name.as_str(), "script" | "style" | "noscript" | "template"));
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_captcha_title() {
        let html = "<html><head><title>Verifique que você não é um robô</title></head><body></body></html>";
        let signal = detect_block(html, None).expect("should be blocked");
        assert!(signal.reason.contains("title"));
    }

    #[test]
    fn detects_phrase_in_body_case_insensitively() {
        let html = "<html><body><p>ACESSO NEGADO</p></body></html>";
        assert!(detect_block(html, None).is_some());
    }

    #[test]
    fn ignores_script_content() {
        let html = r#"<html><head><title>Fone Bluetooth</title></head>
            <body><script>window.captchaConfig = {};</script><h1>Fone Bluetooth</h1></body></html>"#;
        assert_eq!(detect_block(html, None), None);
    }

    #[test]
    fn detects_verification_redirect() {
        let html = "<html><body>Loading</body></html>";
        let signal = detect_block(
            html,
            Some("https://www.mercadolivre.com.br/gz/account-verification?go=x"),
        );
        assert!(signal.is_some());
    }
}
