use pinpoint_common::protocol::ElementHandle;
use pinpoint_common::tree::DomTree;
use tracing::debug;

/// All current matches; a selector the tree cannot evaluate matches nothing.
pub fn find_matches<T: DomTree + ?Sized>(tree: &T, selector: &str) -> Vec<ElementHandle> {
    match tree.query_all(None, selector) {
        Ok(found) => found,
        Err(e) => {
            debug!(error = %e, "selector rejected by tree");
            Vec::new()
        }
    }
}

pub fn count_matches<T: DomTree + ?Sized>(tree: &T, selector: &str) -> usize {
    find_matches(tree, selector).len()
}

/// True when `selector` matches exactly `el` and nothing else.
pub fn is_unique_match<T: DomTree + ?Sized>(tree: &T, selector: &str, el: ElementHandle) -> bool {
    find_matches(tree, selector) == [el]
}
