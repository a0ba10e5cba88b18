//! Calendar date recognition for cell text.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use pinpoint_common::protocol::DateFormat;
use regex::Regex;
use std::sync::LazyLock;

/// Date-shaped substrings inside free text. ISO first so `2023-01-05` is not
/// read as `23-01-05`.
static EMBEDDED_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\d{4}-\d{2}-\d{2}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{1,2}-[A-Za-z]{3}-\d{4}|[A-Za-z]+\.?\s\d{1,2},\s\d{4}",
    )
    .unwrap()
});

static DAY_MONTH_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}[/-]\d{1,2}[/-]\d{2,4}$").unwrap());
static ISO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static DAY_ABBREV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}-[A-Za-z]{3}-\d{4}$").unwrap());
static MONTH_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+\.?\s\d{1,2},\s\d{4}$").unwrap());

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%d/%m/%y",
    "%m/%d/%y",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%a, %d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M",
];

/// Parses a whole value as a calendar date. Bare numbers never count.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim().trim_end_matches('.');
    if value.is_empty() || !value.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    // Plain numbers like "3.14" or "1,200"; dotted dates carry two dots.
    if value.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
        && value.matches('.').count() <= 1
    {
        return None;
    }
    // "Jan. 5, 2023" reads the same as "Jan 5, 2023".
    let value = value.replacen(". ", " ", 1);

    if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
        return Some(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&value, format) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&value, format).ok())
}

/// Format label from the shape of a recognized date substring.
pub fn infer_date_format(value: &str) -> DateFormat {
    let value = value.trim();
    if DAY_MONTH_YEAR_RE.is_match(value) {
        DateFormat::DayMonthYear
    } else if ISO_RE.is_match(value) {
        DateFormat::IsoDate
    } else if DAY_ABBREV_RE.is_match(value) {
        DateFormat::DayAbbrevMonthYear
    } else if MONTH_NAME_RE.is_match(value) {
        DateFormat::MonthNameDayYear
    } else {
        DateFormat::Unknown
    }
}

/// Date substrings of `text` that also parse as real dates, in order.
pub fn embedded_dates(text: &str) -> Vec<&str> {
    EMBEDDED_DATE_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|m| parse_date(m).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 5);
        assert_eq!(parse_date("2023-01-05"), expected);
        assert_eq!(parse_date("05/01/2023"), expected);
        assert_eq!(parse_date("05-Jan-2023"), expected);
        assert_eq!(parse_date("Jan 5, 2023"), expected);
        assert_eq!(parse_date("January 5, 2023"), expected);
        assert_eq!(parse_date("Jan. 5, 2023"), expected);
        assert_eq!(parse_date("2023-01-05T10:30:00Z"), expected);
        assert_eq!(parse_date("12/31/2023"), NaiveDate::from_ymd_opt(2023, 12, 31));
        assert_eq!(parse_date("05.01.2023"), expected);
    }

    #[test]
    fn test_parse_date_rejects_non_dates() {
        assert_eq!(parse_date("42"), None);
        assert_eq!(parse_date("3.14"), None);
        assert_eq!(parse_date("1,234.56"), None);
        assert_eq!(parse_date("1.234.567"), None);
        assert_eq!(parse_date("hello"), None);
        assert_eq!(parse_date("2023-13-45"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_infer_date_format() {
        assert_eq!(infer_date_format("05/01/2023"), DateFormat::DayMonthYear);
        assert_eq!(infer_date_format("2023-01-05"), DateFormat::IsoDate);
        assert_eq!(infer_date_format("05-Jan-2023"), DateFormat::DayAbbrevMonthYear);
        assert_eq!(infer_date_format("Jan 5, 2023"), DateFormat::MonthNameDayYear);
        assert_eq!(infer_date_format("Q1 2023"), DateFormat::Unknown);
    }

    #[test]
    fn test_embedded_dates() {
        assert_eq!(embedded_dates("Visit on Jan 5, 2023"), vec!["Jan 5, 2023"]);
        assert_eq!(
            embedded_dates("from 2023-01-05 to 07/02/2023"),
            vec!["2023-01-05", "07/02/2023"]
        );
        assert!(embedded_dates("Room 12-34-5").is_empty());
    }
}
