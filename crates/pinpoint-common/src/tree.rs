//! Read-only view of a live document tree.
//!
//! The engine never owns the tree. Anything that can answer these questions
//! (an in-memory document, a browser bridge, a recorded snapshot) can be
//! resolved against.

use crate::error::SelectorError;
use crate::protocol::{ElementHandle, Rect};

pub trait DomTree {
    /// The root element (`<html>` for full documents).
    fn document_element(&self) -> Option<ElementHandle>;

    /// Whether the element is still reachable from the document root.
    fn is_attached(&self, el: ElementHandle) -> bool;

    /// Lower-cased tag name, `None` for handles that do not name an element.
    fn tag_name(&self, el: ElementHandle) -> Option<String>;

    /// Attributes in source order.
    fn attributes(&self, el: ElementHandle) -> Vec<(String, String)>;

    fn attribute(&self, el: ElementHandle, name: &str) -> Option<String> {
        self.attributes(el)
            .into_iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    fn parent(&self, el: ElementHandle) -> Option<ElementHandle>;

    /// Element children in document order.
    fn children(&self, el: ElementHandle) -> Vec<ElementHandle>;

    /// Raw descendant text nodes in document order, excluding script and style.
    fn text_fragments(&self, el: ElementHandle) -> Vec<String>;

    fn text_content(&self, el: ElementHandle) -> String {
        self.text_fragments(el).concat()
    }

    /// Computed value of a visual property such as `background-image`.
    fn computed_style(&self, el: ElementHandle, property: &str) -> Option<String>;

    fn bounding_rect(&self, el: ElementHandle) -> Option<Rect>;

    /// All elements matching `selector`, in document order. With a scope only
    /// descendants of the scope are returned.
    fn query_all(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, SelectorError>;
}
