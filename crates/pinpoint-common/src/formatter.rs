use crate::protocol::{ColumnDescriptor, GridDescriptor, SelectorResult};

/// Longest cell value shown in a preview before eliding.
const PREVIEW_CELL_WIDTH: usize = 24;

pub fn format_selector_result(result: &SelectorResult) -> String {
    if result.is_empty() {
        return "(no selector)\n".to_string();
    }

    let mut output = String::new();
    for (idx, candidate) in result.selectors.iter().enumerate() {
        // e.g. * [100] id  #submit-btn
        let marker = if idx == 0 { '*' } else { ' ' };
        output.push_str(&format!(
            "{} [{:>3}] {:<15} {}\n",
            marker,
            candidate.confidence,
            candidate.strategy.name(),
            candidate.selector
        ));
    }
    output
}

pub fn format_grid(grid: &GridDescriptor) -> String {
    let mut output = format!(
        "Grid {} @ ({:.0},{:.0}) {:.0}x{:.0}\n",
        grid.selector,
        grid.bounding_box.left,
        grid.bounding_box.top,
        grid.bounding_box.width,
        grid.bounding_box.height
    );

    if !grid.row_selector.is_empty() {
        output.push_str(&format!("Rows: {}\n", grid.row_selector));
    }

    output.push_str("Columns:\n");
    for (idx, column) in grid.columns.iter().enumerate() {
        output.push_str(&format!("  [{}] {}\n", idx, format_column(column)));
    }

    if let Some(samples) = &grid.row_samples
        && !samples.is_empty()
    {
        output.push_str("Preview:\n");
        for row in samples {
            let cells: Vec<String> = row.iter().map(|c| elide(c, PREVIEW_CELL_WIDTH)).collect();
            output.push_str(&format!("  | {} |\n", cells.join(" | ")));
        }
    }

    output
}

fn format_column(column: &ColumnDescriptor) -> String {
    let mut line = format!("{:?} : {}", column.header, column.column_type.name());
    if let Some(vars) = &column.variables {
        let rendered: Vec<String> = vars
            .iter()
            .map(|v| format!("{}={}", v.name, v.format.pattern()))
            .collect();
        line.push_str(&format!(" {{{}}}", rendered.join(", ")));
    }
    line
}

fn elide(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}
