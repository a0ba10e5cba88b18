//! Column type inference.

use crate::config::GridConfig;
use crate::context::{cell_text, split_classes};
use crate::grid::dates::{embedded_dates, infer_date_format, parse_date};
use crate::grid::locator::{self, CellAddressing};
use crate::grid::numbers::parse_number;
use pinpoint_common::protocol::{
    ColumnDescriptor, ColumnType, DateFormat, ElementHandle, VariableDescriptor, VariableType,
};
use pinpoint_common::tree::DomTree;
use tracing::debug;

const GRAPHIC_TAGS: &[&str] = &["img", "svg", "picture", "canvas"];
const GRAPHIC_QUERY: &str = "img, svg, picture, canvas, [role=img]";
const IMAGE_CLASS_HINTS: &[&str] = &["avatar", "image", "img", "photo", "thumbnail", "thumb", "picture"];
const FIELD_QUERY: &str = "input, select, textarea";

/// What was read from one column: bounded text sample plus a full-row image
/// count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSample {
    pub values: Vec<String>,
    pub image_rows: usize,
    pub total_rows: usize,
}

pub fn sample_column<T: DomTree + ?Sized>(
    tree: &T,
    rows: &[ElementHandle],
    column: usize,
    addressing: CellAddressing,
    sample_size: usize,
) -> ColumnSample {
    let mut sample = ColumnSample {
        total_rows: rows.len(),
        ..Default::default()
    };

    for row in rows {
        let Some(cell) = locator::cell_at(tree, *row, column, addressing) else {
            continue;
        };
        if cell_has_image(tree, cell) {
            sample.image_rows += 1;
        }
        if sample.values.len() < sample_size {
            let text = cell_value(tree, cell);
            if !text.is_empty() {
                sample.values.push(text);
            }
        }
    }
    sample
}

/// Visible text of a cell, or the state of a lone form control inside it.
pub fn cell_value<T: DomTree + ?Sized>(tree: &T, cell: ElementHandle) -> String {
    let text = cell_text(tree, cell);
    if !text.is_empty() {
        return text;
    }

    let field = tree
        .query_all(Some(cell), FIELD_QUERY)
        .ok()
        .and_then(|fields| fields.into_iter().next());
    let Some(field) = field else {
        return text;
    };

    let kind = tree.attribute(field, "type").unwrap_or_default();
    if kind.eq_ignore_ascii_case("checkbox") || kind.eq_ignore_ascii_case("radio") {
        let checked = tree.attribute(field, "checked").is_some();
        return checked.to_string();
    }
    tree.attribute(field, "value")
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Embedded graphics, a background image, image-ish class names or an ARIA
/// image role anywhere in the cell.
pub fn cell_has_image<T: DomTree + ?Sized>(tree: &T, cell: ElementHandle) -> bool {
    if tree
        .tag_name(cell)
        .is_some_and(|tag| GRAPHIC_TAGS.contains(&tag.as_str()))
        || tree.attribute(cell, "role").as_deref() == Some("img")
    {
        return true;
    }
    if tree
        .query_all(Some(cell), GRAPHIC_QUERY)
        .is_ok_and(|found| !found.is_empty())
    {
        return true;
    }

    let mut nodes = vec![cell];
    nodes.extend(tree.query_all(Some(cell), "*").unwrap_or_default());
    nodes
        .into_iter()
        .any(|node| has_background_image(tree, node) || has_image_class(tree, node))
}

fn has_background_image<T: DomTree + ?Sized>(tree: &T, el: ElementHandle) -> bool {
    ["background-image", "background"].iter().any(|prop| {
        tree.computed_style(el, prop)
            .is_some_and(|v| v.to_ascii_lowercase().contains("url("))
    })
}

fn has_image_class<T: DomTree + ?Sized>(tree: &T, el: ElementHandle) -> bool {
    tree.attribute(el, "class").is_some_and(|class| {
        split_classes(&class).iter().any(|c| {
            let c = c.to_ascii_lowercase();
            IMAGE_CLASS_HINTS.iter().any(|hint| c.contains(hint))
        })
    })
}

/// Classifies a sampled column. Images win over any text signal; an empty
/// sample is text.
pub fn classify(
    sample: &ColumnSample,
    config: &GridConfig,
) -> (ColumnType, Option<Vec<VariableDescriptor>>) {
    if sample.total_rows > 0 {
        let ratio = sample.image_rows as f64 / sample.total_rows as f64;
        if ratio >= config.image_ratio {
            debug!(ratio, "column classified as image");
            return (ColumnType::Image, None);
        }
    }

    let values = &sample.values;
    if values.is_empty() {
        return (ColumnType::Text, None);
    }

    let is_boolean = |v: &String| {
        config
            .boolean_values
            .iter()
            .any(|b| b.eq_ignore_ascii_case(v.trim()))
    };
    if values.iter().all(is_boolean) {
        return (ColumnType::Boolean, None);
    }
    if values.iter().all(|v| parse_date(v).is_some()) {
        return (ColumnType::Date, None);
    }
    if values.iter().all(|v| parse_number(v).is_some()) {
        return (ColumnType::Number, None);
    }

    let with_dates = values
        .iter()
        .filter(|v| !embedded_dates(v).is_empty())
        .count();
    let ratio = with_dates as f64 / values.len() as f64;
    if ratio >= config.date_text_ratio {
        return (ColumnType::TextWithDate, Some(date_variables(values)));
    }

    (ColumnType::Text, None)
}

/// One variable per distinct date format, named in order of first sighting.
pub fn date_variables(values: &[String]) -> Vec<VariableDescriptor> {
    let mut formats: Vec<DateFormat> = Vec::new();
    for value in values {
        for found in embedded_dates(value) {
            let format = infer_date_format(found);
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
    }

    formats
        .into_iter()
        .enumerate()
        .map(|(idx, format)| VariableDescriptor {
            name: format!("date{}", idx + 1),
            variable_type: VariableType::Date,
            format,
        })
        .collect()
}

/// Header, type and variables of one column of `container`.
pub fn infer_column_type<T: DomTree + ?Sized>(
    tree: &T,
    container: ElementHandle,
    column: usize,
    config: &GridConfig,
) -> ColumnDescriptor {
    let header = locator::column_headers(tree, container)
        .into_iter()
        .nth(column)
        .unwrap_or_else(|| locator::positional_header(column));
    let rows = locator::locate_rows(tree, container);
    let addressing = locator::addressing(tree, container);
    describe_column(tree, &rows.rows, column, addressing, header, config)
}

pub(crate) fn describe_column<T: DomTree + ?Sized>(
    tree: &T,
    rows: &[ElementHandle],
    column: usize,
    addressing: CellAddressing,
    header: String,
    config: &GridConfig,
) -> ColumnDescriptor {
    let sample = sample_column(tree, rows, column, addressing, config.sample_size);
    let (column_type, variables) = classify(&sample, config);
    ColumnDescriptor {
        header,
        column_type,
        variables,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(values: &[&str]) -> ColumnSample {
        ColumnSample {
            values: values.iter().map(|v| v.to_string()).collect(),
            image_rows: 0,
            total_rows: values.len(),
        }
    }

    #[test]
    fn test_classify_precedence() {
        let config = GridConfig::default();
        assert_eq!(classify(&sample(&[]), &config).0, ColumnType::Text);
        assert_eq!(classify(&sample(&["Yes", "no", "ON"]), &config).0, ColumnType::Boolean);
        assert_eq!(classify(&sample(&["2023-01-05", "05/02/2023"]), &config).0, ColumnType::Date);
        assert_eq!(classify(&sample(&["1", "2,000", "-3.5"]), &config).0, ColumnType::Number);
        assert_eq!(classify(&sample(&["1", "two"]), &config).0, ColumnType::Text);
    }

    #[test]
    fn test_image_threshold_is_inclusive() {
        let config = GridConfig::default();
        let mut s = sample(&["1", "2", "3", "4", "5"]);
        s.total_rows = 10;
        s.image_rows = 4;
        assert_eq!(classify(&s, &config).0, ColumnType::Image);
        s.image_rows = 3;
        assert_eq!(classify(&s, &config).0, ColumnType::Number);
    }

    #[test]
    fn test_date_variables_dedup_in_order() {
        let values: Vec<String> = [
            "Due 2023-01-05",
            "Seen Jan 5, 2023 and 2023-02-01",
            "05/01/2023",
        ]
        .iter()
        .map(|v| v.to_string())
        .collect();
        let vars = date_variables(&values);
        let formats: Vec<_> = vars.iter().map(|v| (v.name.as_str(), v.format)).collect();
        assert_eq!(
            formats,
            vec![
                ("date1", DateFormat::IsoDate),
                ("date2", DateFormat::MonthNameDayYear),
                ("date3", DateFormat::DayMonthYear),
            ]
        );
    }
}
