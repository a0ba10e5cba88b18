use regex::Regex;
use std::sync::LazyLock;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,3}(?:,\d{3})+|\d+)?(?:\.\d+)?$").unwrap()
});

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹'];

/// Parses display numbers: signs, thousands separators, a currency symbol
/// and a trailing percent are accepted. Only finite values count.
pub fn parse_number(value: &str) -> Option<f64> {
    let mut text = value.trim();
    let mut negative = false;

    if let Some(rest) = text.strip_prefix('-') {
        negative = true;
        text = rest.trim_start();
    } else if let Some(rest) = text.strip_prefix('+') {
        text = rest.trim_start();
    }

    text = text.trim_start_matches(CURRENCY_SYMBOLS).trim_start();
    text = text.trim_end_matches('%').trim_end();
    text = text.trim_end_matches(CURRENCY_SYMBOLS).trim_end();

    if !text.chars().any(|c| c.is_ascii_digit()) || !NUMBER_RE.is_match(text) {
        return None;
    }

    let parsed: f64 = text.replace(',', "").parse().ok()?;
    let parsed = if negative { -parsed } else { parsed };
    parsed.is_finite().then_some(parsed)
}
