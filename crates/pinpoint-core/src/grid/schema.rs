use crate::config::PinpointConfig;
use crate::grid::inference::{cell_value, describe_column};
use crate::grid::locator::{self, CellAddressing};
use crate::resolution::css;
use crate::resolution::path::build_structural_path;
use crate::resolution::validation::is_unique_match;
use pinpoint_common::protocol::{BoundingBox, ColumnMapping, ElementHandle, GridDescriptor};
use pinpoint_common::tree::DomTree;
use tracing::{debug, info};

/// Schema snapshot of a grid container: unique selector, geometry, typed
/// columns, a short preview and per-column cell mappings.
pub fn infer_grid_schema<T: DomTree + ?Sized>(
    tree: &T,
    container: ElementHandle,
    config: &PinpointConfig,
) -> GridDescriptor {
    if tree.tag_name(container).is_none() || !tree.is_attached(container) {
        debug!(handle = container.index(), "grid container is not attached");
        return GridDescriptor::default();
    }

    let selector = grid_selector(tree, container, config);
    let rows = locator::locate_rows(tree, container);
    let addressing = locator::addressing(tree, container);

    let mut headers = locator::column_headers(tree, container);
    if headers.is_empty() {
        let width = rows
            .rows
            .iter()
            .map(|row| locator::row_cells(tree, *row).len())
            .max()
            .unwrap_or(0);
        headers = (0..width).map(locator::positional_header).collect();
    }

    let columns = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            describe_column(tree, &rows.rows, idx, addressing, header.clone(), &config.grid)
        })
        .collect();

    let column_mappings = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| ColumnMapping {
            header: header.clone(),
            column_index: idx,
            selector: cell_selector(tree, &rows.rows, idx, addressing),
        })
        .collect();

    let row_samples = if rows.rows.is_empty() {
        None
    } else {
        Some(
            rows.rows
                .iter()
                .take(config.grid.preview_rows)
                .map(|row| preview_row(tree, *row, headers.len(), addressing))
                .collect(),
        )
    };

    info!(
        selector = %selector,
        rows = rows.rows.len(),
        columns = headers.len(),
        "inferred grid schema"
    );

    GridDescriptor {
        row_selector: format!("{} {}", selector, rows.query),
        selector,
        bounding_box: tree
            .bounding_rect(container)
            .map(BoundingBox::from)
            .unwrap_or_default(),
        columns,
        row_samples,
        column_mappings,
    }
}

/// `#id` when the container's id is unique, else a structural path.
pub fn grid_selector<T: DomTree + ?Sized>(
    tree: &T,
    container: ElementHandle,
    config: &PinpointConfig,
) -> String {
    if let Some(id) = tree.attribute(container, "id")
        && !id.is_empty()
    {
        let selector = css::id(&id);
        if is_unique_match(tree, &selector, container) {
            return selector;
        }
    }
    build_structural_path(tree, container, &config.selector).selector
}

/// Row-relative selector for a column's cell.
fn cell_selector<T: DomTree + ?Sized>(
    tree: &T,
    rows: &[ElementHandle],
    column: usize,
    addressing: CellAddressing,
) -> String {
    if addressing == CellAddressing::Indexed {
        return css::attribute("data-colindex", &column.to_string());
    }

    rows.iter()
        .find_map(|row| {
            let cell = locator::row_cells(tree, *row).into_iter().nth(column)?;
            let tag = tree.tag_name(cell)?;
            let parent = tree.parent(cell)?;
            let position = tree.children(parent).iter().position(|c| *c == cell)?;
            Some(format!("{}:nth-child({})", tag, position + 1))
        })
        .unwrap_or_default()
}

fn preview_row<T: DomTree + ?Sized>(
    tree: &T,
    row: ElementHandle,
    width: usize,
    addressing: CellAddressing,
) -> Vec<String> {
    (0..width)
        .map(|column| {
            locator::cell_at(tree, row, column, addressing)
                .map(|cell| cell_value(tree, cell))
                .unwrap_or_default()
        })
        .collect()
}
