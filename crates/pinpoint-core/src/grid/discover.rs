use pinpoint_common::protocol::ElementHandle;
use pinpoint_common::tree::DomTree;

/// Everything the picker offers as a grid.
pub const GRID_QUERY: &str = r#"[role="grid"], [role="table"], .MuiDataGrid-root, table"#;

/// Grid candidates in document order.
pub fn discover_grids<T: DomTree + ?Sized>(tree: &T) -> Vec<ElementHandle> {
    tree.query_all(None, GRID_QUERY).unwrap_or_default()
}
