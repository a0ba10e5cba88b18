//! Rows, cells and headers of a grid container.
//!
//! Two addressing schemes coexist: virtualized grids stamp cells with an
//! explicit column index, everything else is addressed by position.

use crate::context::{cell_text, collapse_whitespace};
use crate::resolution::anchor::closest_ancestor;
use pinpoint_common::protocol::ElementHandle;
use pinpoint_common::tree::DomTree;
use tracing::debug;

pub const ROW_QUERY: &str = r#"[role="row"]"#;
pub const FALLBACK_ROW_QUERY: &str = "tr";
pub const CELL_QUERY: &str = r#"[role="cell"], [role="gridcell"], td"#;
pub const HEADER_QUERY: &str = r#"[role="columnheader"], th"#;
pub const INDEXED_CELL_QUERY: &str = "[data-colindex]";
const INDEXED_ROW_CELL_QUERY: &str = "[data-colindex], [aria-colindex]";

/// Longest climb from a cell looking for its row.
const ROW_SEARCH_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRows {
    /// Data rows in document order, header-only rows removed.
    pub rows: Vec<ElementHandle>,
    /// The row query that produced `rows`.
    pub query: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAddressing {
    Indexed,
    Positional,
}

pub fn locate_rows<T: DomTree + ?Sized>(tree: &T, container: ElementHandle) -> GridRows {
    let rows = data_rows(tree, container, ROW_QUERY);
    if !rows.is_empty() {
        return GridRows {
            rows,
            query: ROW_QUERY,
        };
    }

    debug!("no role rows, falling back to table rows");
    GridRows {
        rows: data_rows(tree, container, FALLBACK_ROW_QUERY),
        query: FALLBACK_ROW_QUERY,
    }
}

fn data_rows<T: DomTree + ?Sized>(
    tree: &T,
    container: ElementHandle,
    query: &str,
) -> Vec<ElementHandle> {
    tree.query_all(Some(container), query)
        .unwrap_or_default()
        .into_iter()
        .filter(|row| !is_header_row(tree, *row))
        .collect()
}

fn is_header_row<T: DomTree + ?Sized>(tree: &T, row: ElementHandle) -> bool {
    let has_headers = !tree
        .query_all(Some(row), HEADER_QUERY)
        .unwrap_or_default()
        .is_empty();
    has_headers && row_cells(tree, row).is_empty()
}

pub fn addressing<T: DomTree + ?Sized>(tree: &T, container: ElementHandle) -> CellAddressing {
    let indexed = tree
        .query_all(Some(container), INDEXED_CELL_QUERY)
        .is_ok_and(|cells| !cells.is_empty());
    if indexed {
        CellAddressing::Indexed
    } else {
        CellAddressing::Positional
    }
}

/// Positional cells that belong to `row` itself, not to a nested grid.
pub fn row_cells<T: DomTree + ?Sized>(tree: &T, row: ElementHandle) -> Vec<ElementHandle> {
    tree.query_all(Some(row), CELL_QUERY)
        .unwrap_or_default()
        .into_iter()
        .filter(|cell| owning_row(tree, *cell) == Some(row))
        .collect()
}

fn owning_row<T: DomTree + ?Sized>(tree: &T, cell: ElementHandle) -> Option<ElementHandle> {
    closest_ancestor(tree, cell, ROW_SEARCH_DEPTH, |node| {
        tree.attribute(node, "role").as_deref() == Some("row")
            || tree.tag_name(node).as_deref() == Some("tr")
    })
}

/// The cell of `column` (0-based) in `row`, or `None` for short rows.
pub fn cell_at<T: DomTree + ?Sized>(
    tree: &T,
    row: ElementHandle,
    column: usize,
    addressing: CellAddressing,
) -> Option<ElementHandle> {
    if addressing == CellAddressing::Indexed {
        let by_index = format!(
            r#"[data-colindex="{}"], [aria-colindex="{}"]"#,
            column,
            column + 1
        );
        if let Some(cell) = tree
            .query_all(Some(row), &by_index)
            .ok()
            .and_then(|cells| cells.into_iter().next())
        {
            return Some(cell);
        }
        // An indexed row without this index has the cell virtualized away.
        if row_is_indexed(tree, row) {
            return None;
        }
    }
    row_cells(tree, row).into_iter().nth(column)
}

fn row_is_indexed<T: DomTree + ?Sized>(tree: &T, row: ElementHandle) -> bool {
    tree.query_all(Some(row), INDEXED_ROW_CELL_QUERY)
        .is_ok_and(|cells| !cells.is_empty())
}

/// Header labels in document order, synthesized where a header is blank.
pub fn column_headers<T: DomTree + ?Sized>(tree: &T, container: ElementHandle) -> Vec<String> {
    tree.query_all(Some(container), HEADER_QUERY)
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(idx, header)| {
            let text = cell_text(tree, header);
            if !text.is_empty() {
                text
            } else {
                graphic_label(tree, header).unwrap_or_else(|| positional_header(idx))
            }
        })
        .collect()
}

pub fn positional_header(idx: usize) -> String {
    format!("Column {}", idx + 1)
}

/// Label of an icon-only header: its own aria-label/title, else the alt,
/// title or aria-label of an embedded graphic.
fn graphic_label<T: DomTree + ?Sized>(tree: &T, header: ElementHandle) -> Option<String> {
    let own = ["aria-label", "title"]
        .iter()
        .find_map(|attr| non_blank(tree.attribute(header, attr)));
    if own.is_some() {
        return own;
    }

    let graphics = tree
        .query_all(Some(header), "img, svg, [role=img], [aria-label], [title]")
        .unwrap_or_default();
    graphics.into_iter().find_map(|g| {
        ["alt", "title", "aria-label"]
            .iter()
            .find_map(|attr| non_blank(tree.attribute(g, attr)))
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| collapse_whitespace(&v))
        .filter(|v| !v.is_empty())
}
