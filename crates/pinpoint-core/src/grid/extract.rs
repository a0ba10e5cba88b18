//! Row extraction with column filters.

use crate::grid::dates::parse_date;
use crate::grid::inference::{cell_has_image, cell_value};
use crate::grid::locator;
use crate::grid::numbers::parse_number;
use pinpoint_common::protocol::{ColumnType, ElementHandle, GridDescriptor};
use pinpoint_common::tree::DomTree;
use regex::RegexBuilder;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum FilterOperator {
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "does not contain")]
    NotContains,
    #[serde(rename = "equals")]
    Equals,
    #[serde(rename = "does not equal")]
    NotEquals,
    #[serde(rename = "starts with")]
    StartsWith,
    #[serde(rename = "does not start with")]
    NotStartsWith,
    #[serde(rename = "ends with")]
    EndsWith,
    #[serde(rename = "does not end with")]
    NotEndsWith,
    #[serde(rename = "regex")]
    Regex,
    #[serde(rename = "is true")]
    IsTrue,
    #[serde(rename = "is false")]
    IsFalse,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

#[derive(Debug, Error)]
#[error("Unknown filter operator: {0}")]
pub struct UnknownOperator(String);

impl FromStr for FilterOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim().to_lowercase().as_str() {
            "contains" => FilterOperator::Contains,
            "does not contain" => FilterOperator::NotContains,
            "equals" => FilterOperator::Equals,
            "does not equal" => FilterOperator::NotEquals,
            "starts with" => FilterOperator::StartsWith,
            "does not start with" => FilterOperator::NotStartsWith,
            "ends with" => FilterOperator::EndsWith,
            "does not end with" => FilterOperator::NotEndsWith,
            "regex" => FilterOperator::Regex,
            "is true" => FilterOperator::IsTrue,
            "is false" => FilterOperator::IsFalse,
            ">" => FilterOperator::Greater,
            "<" => FilterOperator::Less,
            ">=" => FilterOperator::GreaterOrEqual,
            "<=" => FilterOperator::LessOrEqual,
            "=" | "==" => FilterOperator::Equal,
            "!=" => FilterOperator::NotEqual,
            _ => return Err(UnknownOperator(s.to_string())),
        };
        Ok(op)
    }
}

impl TryFrom<String> for FilterOperator {
    type Error = UnknownOperator;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilter {
    /// Column header the filter applies to.
    pub column: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: String,
}

/// A cell as extracted: text, image presence, or nothing for short rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Flag(bool),
    Missing,
}

impl CellValue {
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::Flag(flag) => flag.to_string(),
            CellValue::Missing => String::new(),
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            CellValue::Text(text) => !text.trim().is_empty(),
            CellValue::Flag(flag) => *flag,
            CellValue::Missing => false,
        }
    }
}

/// One extracted row keyed by column header, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRow(Vec<(String, CellValue)>);

impl ExtractedRow {
    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.0.iter().find(|(h, _)| h == header).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.0.iter().map(|(h, v)| (h.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ExtractedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (header, value) in &self.0 {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

/// Whether `value` passes `filter`. Values that cannot be compared fail the
/// filter instead of raising.
pub fn matches_filter(value: &CellValue, filter: &RowFilter, column_type: ColumnType) -> bool {
    use FilterOperator::*;

    match filter.operator {
        IsTrue => return value.is_truthy(),
        IsFalse => return !value.is_truthy(),
        _ => {}
    }

    let actual = value.as_text().trim().to_lowercase();
    let expected = filter.value.trim().to_lowercase();

    match filter.operator {
        Contains => actual.contains(&expected),
        NotContains => !actual.contains(&expected),
        Equals => actual == expected,
        NotEquals => actual != expected,
        StartsWith => actual.starts_with(&expected),
        NotStartsWith => !actual.starts_with(&expected),
        EndsWith => actual.ends_with(&expected),
        NotEndsWith => !actual.ends_with(&expected),
        Regex => match RegexBuilder::new(filter.value.trim())
            .case_insensitive(true)
            .build()
        {
            Ok(re) => re.is_match(&actual),
            Err(e) => {
                debug!(error = %e, "invalid filter regex");
                false
            }
        },
        Greater | Less | GreaterOrEqual | LessOrEqual | Equal | NotEqual => {
            match compare(&actual, &expected, column_type) {
                Some(ordering) => apply_ordering(filter.operator, ordering),
                None => false,
            }
        }
        IsTrue | IsFalse => false,
    }
}

fn compare(actual: &str, expected: &str, column_type: ColumnType) -> Option<Ordering> {
    match column_type {
        ColumnType::Number => parse_number(actual)?.partial_cmp(&parse_number(expected)?),
        ColumnType::Date => Some(parse_date(actual)?.cmp(&parse_date(expected)?)),
        _ => Some(actual.cmp(expected)),
    }
}

fn apply_ordering(op: FilterOperator, ordering: Ordering) -> bool {
    match op {
        FilterOperator::Greater => ordering == Ordering::Greater,
        FilterOperator::Less => ordering == Ordering::Less,
        FilterOperator::GreaterOrEqual => ordering != Ordering::Less,
        FilterOperator::LessOrEqual => ordering != Ordering::Greater,
        FilterOperator::Equal => ordering == Ordering::Equal,
        FilterOperator::NotEqual => ordering != Ordering::Equal,
        _ => false,
    }
}

/// Data rows of `container` that pass every filter, read through the column
/// layout of `descriptor`. Filters naming unknown columns match nothing.
pub fn extract_rows<T: DomTree + ?Sized>(
    tree: &T,
    container: ElementHandle,
    descriptor: &GridDescriptor,
    filters: &[RowFilter],
) -> Vec<ExtractedRow> {
    let rows = locator::locate_rows(tree, container);
    let addressing = locator::addressing(tree, container);

    let mut extracted = Vec::new();
    for row in rows.rows {
        let record = ExtractedRow(
            descriptor
                .columns
                .iter()
                .enumerate()
                .map(|(idx, column)| {
                    let value = match locator::cell_at(tree, row, idx, addressing) {
                        None => CellValue::Missing,
                        Some(cell) if column.column_type == ColumnType::Image => {
                            CellValue::Flag(cell_has_image(tree, cell))
                        }
                        Some(cell) => CellValue::Text(cell_value(tree, cell)),
                    };
                    (column.header.clone(), value)
                })
                .collect(),
        );

        let keep = filters.iter().all(|filter| {
            let column_type = descriptor
                .columns
                .iter()
                .find(|c| c.header == filter.column)
                .map(|c| c.column_type);
            match (record.get(&filter.column), column_type) {
                (Some(value), Some(column_type)) => matches_filter(value, filter, column_type),
                _ => false,
            }
        });
        if keep {
            extracted.push(record);
        }
    }

    debug!(rows = extracted.len(), filters = filters.len(), "extracted rows");
    extracted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(op: &str, value: &str) -> RowFilter {
        RowFilter {
            column: "c".into(),
            operator: op.parse().unwrap(),
            value: value.into(),
        }
    }

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.into())
    }

    #[test]
    fn test_string_operators() {
        assert!(matches_filter(&text(" Hello World "), &filter("contains", "WORLD"), ColumnType::Text));
        assert!(matches_filter(&text("abc"), &filter("Does Not Start With", "b"), ColumnType::Text));
        assert!(matches_filter(&text("Order 1234"), &filter("regex", r"order \d+"), ColumnType::Text));
        assert!(!matches_filter(&text("x"), &filter("regex", "("), ColumnType::Text));
    }

    #[test]
    fn test_typed_comparisons() {
        assert!(matches_filter(&text("1,500"), &filter(">", "999"), ColumnType::Number));
        assert!(!matches_filter(&text("n/a"), &filter(">", "1"), ColumnType::Number));
        assert!(matches_filter(&text("2023-02-01"), &filter("<", "Mar 1, 2023"), ColumnType::Date));
        assert!(matches_filter(&text("b"), &filter(">=", "a"), ColumnType::Text));
        assert!(matches_filter(&text("5"), &filter("==", "5.0"), ColumnType::Number));
    }

    #[test]
    fn test_truthiness() {
        assert!(matches_filter(&CellValue::Flag(true), &filter("is true", ""), ColumnType::Image));
        assert!(matches_filter(&CellValue::Missing, &filter("is false", ""), ColumnType::Text));
    }

    #[test]
    fn test_operator_parsing() {
        assert_eq!("==".parse::<FilterOperator>().unwrap(), FilterOperator::Equal);
        assert!("between".parse::<FilterOperator>().is_err());
    }
}
