//! Locale-aware price normalization for BRL amounts.
//!
//! Marketplace pages print `R$ 1.234,56`: `.` groups thousands and `,`
//! separates cents. Structured data tends to use `1234.56`. Both shapes are
//! accepted; anything ambiguous is rejected rather than guessed.

use thiserror::Error;

const CURRENCY_MARKERS: &[&str] = &["R$", "US$", "BRL", "$"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("price text is empty")]
    Empty,

    #[error("unparseable price text '{0}'")]
    Unparseable(String),
}

/// Normalize a price string such as `"R$ 1.234,56"` into `1234.56`.
pub fn normalize_price(text: &str) -> Result<f64, PriceError> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    let mut body = compact.as_str();
    for marker in CURRENCY_MARKERS {
        body = body.trim_start_matches(*marker).trim_end_matches(*marker);
    }

    if body.is_empty() {
        return Err(PriceError::Empty);
    }
    if !body.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return Err(unparseable(text));
    }

    let has_dot = body.contains('.');
    let has_comma = body.contains(',');

    let (integer, fraction) = match (has_dot, has_comma) {
        (false, false) => (body.to_string(), None),
        (true, true) => {
            let comma = body.rfind(',').ok_or_else(|| unparseable(text))?;
            let dot = body.rfind('.').ok_or_else(|| unparseable(text))?;
            if dot > comma {
                return Err(unparseable(text));
            }
            let (int_part, frac_part) = (&body[..comma], &body[comma + 1..]);
            if !is_grouped(int_part, '.') {
                return Err(unparseable(text));
            }
            (int_part.replace('.', ""), Some(frac_part))
        }
        (false, true) => {
            let (int_part, frac_part) = body.split_once(',').ok_or_else(|| unparseable(text))?;
            if frac_part.contains(',') {
                return Err(unparseable(text));
            }
            (int_part.to_string(), Some(frac_part))
        }
        (true, false) => {
            if is_grouped(body, '.') && body.contains('.') {
                (body.replace('.', ""), None)
            } else {
                let (int_part, frac_part) =
                    body.split_once('.').ok_or_else(|| unparseable(text))?;
                if frac_part.contains('.') {
                    return Err(unparseable(text));
                }
                (int_part.to_string(), Some(frac_part))
            }
        }
    };

    assemble(&integer, fraction, text)
}

/// Join a split integer/cents rendering, e.g. `("1.234", Some("56"))`.
///
/// The integer part may carry `.` thousand separators; cents must be exactly
/// two digits when present.
pub fn normalize_price_parts(integer: &str, cents: Option<&str>) -> Result<f64, PriceError> {
    let integer = integer.trim();
    if integer.is_empty() {
        return Err(PriceError::Empty);
    }

    let digits = if integer.contains('.') {
        if !is_grouped(integer, '.') {
            return Err(unparseable(integer));
        }
        integer.replace('.', "")
    } else {
        integer.to_string()
    };

    let cents = cents.map(str::trim).filter(|c| !c.is_empty());
    if let Some(c) = cents
        && (c.len() != 2 || !c.chars().all(|ch| ch.is_ascii_digit()))
    {
        return Err(unparseable(c));
    }

    assemble(&digits, cents, integer)
}

/// `1.234.567` style grouping: 1-3 leading digits then groups of exactly 3.
fn is_grouped(text: &str, separator: char) -> bool {
    let mut groups = text.split(separator);
    let Some(head) = groups.next() else {
        return false;
    };
    if head.is_empty() || head.len() > 3 || !head.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    groups.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

fn assemble(integer: &str, fraction: Option<&str>, original: &str) -> Result<f64, PriceError> {
    if integer.is_empty() || !integer.chars().all(|c| c.is_ascii_digit()) {
        return Err(unparseable(original));
    }
    let literal = match fraction {
        Some(frac) => {
            if frac.is_empty() || frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(unparseable(original));
            }
            format!("{integer}.{frac}")
        }
        None => integer.to_string(),
    };

    literal
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| unparseable(original))
}

fn unparseable(text: &str) -> PriceError {
    PriceError::Unparseable(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_price(text: &str, expected: f64) {
        let value = normalize_price(text).unwrap_or_else(|e| panic!("{text}: {e}"));
        assert!((value - expected).abs() < 1e-9, "{text} -> {value}, expected {expected}");
    }

    #[test]
    fn parses_brl_formats() {
        assert_price("R$ 1.234,56", 1234.56);
        assert_price("1.234,56", 1234.56);
        assert_price("R$\u{a0}89,90", 89.90);
        assert_price("R$ 1.299", 1299.0);
        assert_price("2.345.678,01", 2_345_678.01);
        assert_price("450", 450.0);
    }

    #[test]
    fn parses_structured_data_decimals() {
        assert_price("1234.56", 1234.56);
        assert_price("99.9", 99.9);
    }

    #[test]
    fn joins_integer_and_cents() {
        let value = normalize_price_parts("1234", Some("56")).expect("parts should join");
        assert!((value - 1234.56).abs() < 1e-9);

        let value = normalize_price_parts("1.234", Some("56")).expect("grouped parts");
        assert!((value - 1234.56).abs() < 1e-9);

        let value = normalize_price_parts("89", None).expect("integer only");
        assert!((value - 89.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_text() {
        for text in ["", "R$", "abc", "1,2,3", "12.34.5", "1,234.56", "1.23,4.5", "10,5a"] {
            assert!(normalize_price(text).is_err(), "{text:?} should be rejected");
        }
        assert!(normalize_price_parts("12a", Some("00")).is_err());
        assert!(normalize_price_parts("12", Some("5")).is_err());
    }
}
