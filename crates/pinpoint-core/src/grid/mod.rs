//! Grid and table schema inference.

pub mod dates;
pub mod discover;
pub mod extract;
pub mod inference;
pub mod locator;
pub mod numbers;
pub mod schema;
pub mod session;

pub use discover::{GRID_QUERY, discover_grids};
pub use extract::{CellValue, ExtractedRow, FilterOperator, RowFilter, extract_rows, matches_filter};
pub use inference::{ColumnSample, classify, infer_column_type};
pub use schema::{grid_selector, infer_grid_schema};
pub use session::{PickSession, PickState};
