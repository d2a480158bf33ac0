//! Listing URL canonicalization.
//!
//! Marketplace links arrive with tracking parameters, fragments and the
//! occasional pasted-twice scheme. Every such variant of one listing must map
//! to the same cache key and to one clean URL that the tiers can fetch.

use thiserror::Error;
use url::Url;
use url::form_urlencoded;

use super::constants::ALLOWED_QUERY_PARAMS;

const SCHEMES: &[&str] = &["https://", "http://"];

/// Input that cannot be turned into an http(s) listing URL
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidUrl {
    #[error("URL is empty")]
    Empty,

    #[error("URL could not be parsed: {0}")]
    Unparseable(String),

    #[error("unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("URL has no host")]
    MissingHost,
}

/// Derived request URL and cache key for one listing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalUrl {
    /// Cleaned URL handed to the tiers
    pub request_url: String,
    /// Lowercased form of `request_url`, used for cache lookups
    pub cache_key: String,
}

impl CanonicalUrl {
    /// Host of the request URL, if it still parses
    #[must_use]
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.request_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

/// Canonicalize a listing URL.
///
/// Collapses a duplicated scheme prefix, drops the fragment, keeps only the
/// allow-listed query parameters (first value, first-seen order) and rebuilds
/// `scheme://host[:port]/path[?params]`. The cache key is the lowercased,
/// trimmed result. Applying this to its own `request_url` is a no-op.
pub fn canonicalize(raw: &str) -> Result<CanonicalUrl, InvalidUrl> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvalidUrl::Empty);
    }

    let collapsed = collapse_duplicated_scheme(trimmed);
    let without_fragment = match collapsed.find('#') {
        Some(idx) => &collapsed[..idx],
        None => collapsed,
    };

    let parsed =
        Url::parse(without_fragment).map_err(|e| InvalidUrl::Unparseable(e.to_string()))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(InvalidUrl::UnsupportedScheme(scheme.to_string()));
    }

    let host = parsed.host_str().ok_or(InvalidUrl::MissingHost)?;

    let mut request_url = format!("{scheme}://{host}");
    if let Some(port) = parsed.port() {
        request_url.push(':');
        request_url.push_str(&port.to_string());
    }
    request_url.push_str(parsed.path());

    let kept = allowed_query_pairs(&parsed);
    if !kept.is_empty() {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in &kept {
            serializer.append_pair(name, value);
        }
        request_url.push('?');
        request_url.push_str(&serializer.finish());
    }

    let cache_key = request_url.trim().to_lowercase();

    Ok(CanonicalUrl {
        request_url,
        cache_key,
    })
}

/// Whether the URL's host contains one of the allowed fragments.
///
/// An empty allow-list accepts every host.
#[must_use]
pub fn host_allowed(canonical: &CanonicalUrl, allowed_hosts: &[String]) -> bool {
    if allowed_hosts.is_empty() {
        return true;
    }
    let Some(host) = canonical.host() else {
        return false;
    };
    let host = host.to_lowercase();
    allowed_hosts
        .iter()
        .any(|fragment| host.contains(&fragment.to_lowercase()))
}

/// Keep only the text between the first and second occurrence of a scheme
/// prefix, for links that were pasted twice into one field.
///
/// Schemes match case-insensitively. ASCII lowercasing keeps byte offsets, so
/// positions found in the lowered copy slice the original.
fn collapse_duplicated_scheme(url: &str) -> &str {
    let lowered = url.to_ascii_lowercase();
    for scheme in SCHEMES {
        if lowered.matches(scheme).count() > 1
            && let Some(first) = lowered.find(scheme)
        {
            let body_start = first + scheme.len();
            let body_end = lowered[body_start..]
                .find(scheme)
                .map_or(url.len(), |idx| body_start + idx);
            return &url[first..body_end];
        }
    }
    url
}

fn allowed_query_pairs(url: &Url) -> Vec<(String, String)> {
    let mut kept: Vec<(String, String)> = Vec::new();
    for (name, value) in url.query_pairs() {
        if !ALLOWED_QUERY_PARAMS.contains(&name.as_ref()) {
            continue;
        }
        if kept.iter().any(|(seen, _)| seen == name.as_ref()) {
            continue;
        }
        kept.push((name.into_owned(), value.into_owned()));
    }
    kept
}

/// Check if a URL is a fetchable http(s) URL
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "https://produto.mercadolivre.com.br/MLB-1234567890-fone-bluetooth-_JM";

    #[test]
    fn strips_fragment_and_tracking_params() {
        let canonical = canonicalize(&format!(
            "{LISTING}?matt_tool=123&searchVariation=987&tracking_id=abc#position=3&type=item"
        ))
        .expect("listing URL should canonicalize");

        assert_eq!(
            canonical.request_url,
            format!("{LISTING}?searchVariation=987")
        );
        assert_eq!(canonical.cache_key, canonical.request_url.to_lowercase());
    }

    #[test]
    fn collapses_pasted_twice_url() {
        let doubled = format!("{LISTING}{LISTING}");
        let canonical = canonicalize(&doubled).expect("doubled URL should canonicalize");
        assert_eq!(canonical.request_url, LISTING);
    }

    #[test]
    fn collapses_uppercase_pasted_twice_url() {
        let doubled = "HTTPS://WWW.MERCADOLIVRE.COM.BR/MLB-1HTTPS://WWW.MERCADOLIVRE.COM.BR/MLB-1";
        let canonical = canonicalize(doubled).expect("doubled URL should canonicalize");
        assert_eq!(canonical.request_url, "https://www.mercadolivre.com.br/MLB-1");
        assert_eq!(
            canonical.cache_key,
            canonicalize("https://www.mercadolivre.com.br/mlb-1")
                .expect("lowercase URL")
                .cache_key
        );
    }

    #[test]
    fn variants_share_cache_key() {
        let variants = [
            LISTING.to_string(),
            format!("{LISTING}#reviews"),
            format!("  {}  ", LISTING.to_uppercase().replace("HTTPS://", "https://")),
            format!("{LISTING}?utm_source=share"),
            format!("{LISTING}{LISTING}"),
            format!("{0}{0}", LISTING.to_uppercase()),
            format!("Https://{0}hTTps://{0}", &LISTING["https://".len()..]),
        ];

        let expected = canonicalize(LISTING).expect("base URL").cache_key;
        for variant in &variants {
            let key = canonicalize(variant).expect("variant should canonicalize").cache_key;
            assert_eq!(key, expected, "variant {variant} produced a different key");
        }
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let inputs = [
            format!("{LISTING}?pdp_filters=category:MLB1055&searchVariation=1#x"),
            format!("{LISTING}?searchVariation=a b&searchVariation=second"),
            "http://www.mercadolivre.com.br:8080/p/MLB19615318?foo=bar".to_string(),
        ];

        for input in &inputs {
            let once = canonicalize(input).expect("first pass");
            let twice = canonicalize(&once.request_url).expect("second pass");
            assert_eq!(once, twice, "not idempotent for {input}");
        }
    }

    #[test]
    fn keeps_first_value_in_first_seen_order() {
        let canonical = canonicalize(&format!(
            "{LISTING}?pdp_filters=deal&searchVariation=1&pdp_filters=other"
        ))
        .expect("should canonicalize");
        assert_eq!(
            canonical.request_url,
            format!("{LISTING}?pdp_filters=deal&searchVariation=1")
        );
    }

    #[test]
    fn rejects_unparseable_input() {
        assert_eq!(canonicalize("   "), Err(InvalidUrl::Empty));
        assert!(matches!(
            canonicalize("not a url"),
            Err(InvalidUrl::Unparseable(_))
        ));
        assert!(matches!(
            canonicalize("ftp://mercadolivre.com.br/item"),
            Err(InvalidUrl::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn host_allow_list_matches_fragments() {
        let canonical = canonicalize(LISTING).expect("listing");
        let allowed = vec!["mercadolivre".to_string(), "mercadolibre".to_string()];
        assert!(host_allowed(&canonical, &allowed));
        assert!(host_allowed(&canonical, &[]));

        let other = canonicalize("https://www.example.com/item").expect("other");
        assert!(!host_allowed(&other, &allowed));
    }

    #[test]
    fn validates_urls() {
        assert!(is_valid_url(LISTING));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("mailto:someone@example.com"));
    }
}
