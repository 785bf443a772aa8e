//! Text normalization for storage and fuzzy matching.
//!
//! Two strengths of cleaning live here:
//!
//! - [`strip_diacritics`] is the mild clean applied to extracted text before it
//!   is stored. It keeps case and punctuation.
//! - [`normalize`] is the aggressive form used for comparisons: lowercase,
//!   ASCII alphanumerics and single spaces only.

use deunicode::deunicode_with_tofu;
use regex::Regex;
use std::fmt::Display;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Transliterate to ASCII, so "ã" becomes "a" and "ß" becomes "ss".
///
/// Input is composed to NFC first so combining marks fold with their base
/// letter. Characters without a transliteration are dropped.
fn ascii_fold(text: &str) -> String {
    let composed: String = text.nfc().collect();
    deunicode_with_tofu(&composed, "")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip accents and collapse whitespace, preserving case and punctuation.
#[must_use]
pub fn strip_diacritics(text: &str) -> String {
    collapse_whitespace(&ascii_fold(text))
}

/// Normalize text for comparison.
///
/// Lowercases, strips accents, removes everything outside `[a-z0-9 ]`,
/// collapses repeated whitespace and trims. Never fails.
#[must_use]
pub fn normalize(text: &str) -> String {
    let folded: String = ascii_fold(text)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    collapse_whitespace(&folded).to_lowercase()
}

/// Normalize any displayable value by stringifying it first.
#[must_use]
pub fn normalize_value(value: impl Display) -> String {
    normalize(&value.to_string())
}

/// Bidirectional normalized substring test.
///
/// Returns `true` if either normalized input contains the other. An input
/// that normalizes to the empty string never matches.
#[must_use]
pub fn fuzzy_match(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);

    if a.is_empty() || b.is_empty() {
        return false;
    }

    a.contains(&b) || b.contains(&a)
}

/// First run of ASCII digits in `text` as an integer, or 0 when there is
/// none or it does not fit a `u32`.
#[must_use]
pub fn extract_number(text: &str) -> u32 {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let regex = DIGITS.get_or_init(|| Regex::new(r"(?-u:\d)+").expect("valid regex"));

    let Some(digits) = regex.find(text) else {
        return 0;
    };
    match digits.as_str().parse() {
        Ok(value) => value,
        Err(e) => {
            tracing::trace!(text, digits = digits.as_str(), "number out of range: {}", e);
            0
        }
    }
}

/// Parse a Brazilian-formatted price such as `"R$ 350.000,00"`.
///
/// Every character other than digits and commas is dropped, then the comma
/// is read as the decimal separator. Returns `None` when what remains is not
/// a number (e.g. "Preço sob consulta").
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    cleaned.parse().ok()
}
