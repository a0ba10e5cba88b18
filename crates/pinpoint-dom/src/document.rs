//! Arena-backed element tree.
//!
//! Nodes are never freed; `detach` unlinks a subtree so handles into it stay
//! valid but report `is_attached == false`.

use crate::selector;
use pinpoint_common::error::SelectorError;
use pinpoint_common::protocol::{ElementHandle, Rect};
use pinpoint_common::tree::DomTree;
use tracing::trace;

/// Elements whose text never shows up in rendered output.
const NON_RENDERED: &[&str] = &["script", "style", "template", "noscript"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) rect: Option<Rect>,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub(crate) const ROOT: NodeId = NodeId(0);

    /// An empty document with no root element.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
        }
    }

    /// Appends an element under `parent`, or directly under the document when
    /// `parent` is `None`.
    pub fn append_element<I, K, V>(
        &mut self,
        parent: Option<ElementHandle>,
        tag: &str,
        attributes: I,
    ) -> ElementHandle
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let parent = parent.map(to_node).unwrap_or(Self::ROOT);
        let attributes = attributes
            .into_iter()
            .map(|(k, v)| (k.into().to_ascii_lowercase(), v.into()))
            .collect();
        let id = self.push_node(
            parent,
            NodeKind::Element(ElementData {
                tag: tag.to_ascii_lowercase(),
                attributes,
                rect: None,
            }),
        );
        to_handle(id)
    }

    pub fn append_text(&mut self, parent: ElementHandle, text: impl Into<String>) {
        self.push_node(to_node(parent), NodeKind::Text(text.into()));
    }

    pub(crate) fn push_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.push(id);
        }
        id
    }

    pub(crate) fn element_data(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    fn element_data_mut(&mut self, el: ElementHandle) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(el.index())?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Sets or replaces an attribute. Returns false for non-element handles.
    pub fn set_attribute(&mut self, el: ElementHandle, name: &str, value: &str) -> bool {
        let Some(data) = self.element_data_mut(el) else {
            return false;
        };
        let name = name.to_ascii_lowercase();
        match data.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => data.attributes.push((name, value.to_string())),
        }
        true
    }

    pub fn remove_attribute(&mut self, el: ElementHandle, name: &str) -> bool {
        let Some(data) = self.element_data_mut(el) else {
            return false;
        };
        let before = data.attributes.len();
        data.attributes.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        data.attributes.len() != before
    }

    pub fn set_rect(&mut self, el: ElementHandle, rect: Rect) -> bool {
        match self.element_data_mut(el) {
            Some(data) => {
                data.rect = Some(rect);
                true
            }
            None => false,
        }
    }

    /// Unlinks the element from its parent. The subtree keeps its internal
    /// structure.
    pub fn detach(&mut self, el: ElementHandle) {
        let id = to_node(el);
        let Some(parent) = self.nodes.get(id.0).and_then(|n| n.parent) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.retain(|c| *c != id);
        }
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.parent = None;
        }
    }

    /// First match of `selector` in the whole document.
    pub fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>, SelectorError> {
        Ok(self.query_all(None, selector)?.into_iter().next())
    }

    /// First element with the given tag, in document order.
    pub fn first_by_tag(&self, tag: &str) -> Option<ElementHandle> {
        self.descendant_elements(Self::ROOT)
            .into_iter()
            .find(|id| self.element_data(*id).is_some_and(|d| d.tag == tag))
            .map(to_handle)
    }

    pub fn body(&self) -> Option<ElementHandle> {
        self.first_by_tag("body")
    }

    /// Element descendants of `from` in document order, `from` excluded.
    pub(crate) fn descendant_elements(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.nodes.get(from.0) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };

        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id.0) else {
                continue;
            };
            if matches!(node.kind, NodeKind::Element(_)) {
                out.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    pub(crate) fn node_tag(&self, id: NodeId) -> Option<&str> {
        self.element_data(id).map(|d| d.tag.as_str())
    }

    pub(crate) fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

fn to_node(el: ElementHandle) -> NodeId {
    NodeId(el.index())
}

pub(crate) fn to_handle(id: NodeId) -> ElementHandle {
    ElementHandle::new(id.0 as u32)
}

impl DomTree for Document {
    fn document_element(&self) -> Option<ElementHandle> {
        self.nodes[Self::ROOT.0]
            .children
            .iter()
            .find(|id| self.element_data(**id).is_some())
            .map(|id| to_handle(*id))
    }

    fn is_attached(&self, el: ElementHandle) -> bool {
        let mut current = to_node(el);
        if self.element_data(current).is_none() {
            return false;
        }
        // Bounded walk so a corrupted parent chain cannot spin forever.
        for _ in 0..self.nodes.len() {
            match self.parent_of(current) {
                Some(parent) if parent == Self::ROOT => return true,
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    fn tag_name(&self, el: ElementHandle) -> Option<String> {
        self.node_tag(to_node(el)).map(str::to_string)
    }

    fn attributes(&self, el: ElementHandle) -> Vec<(String, String)> {
        self.element_data(to_node(el))
            .map(|d| d.attributes.clone())
            .unwrap_or_default()
    }

    fn attribute(&self, el: ElementHandle, name: &str) -> Option<String> {
        self.element_data(to_node(el))?
            .attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn parent(&self, el: ElementHandle) -> Option<ElementHandle> {
        let parent = self.parent_of(to_node(el))?;
        self.element_data(parent)?;
        Some(to_handle(parent))
    }

    fn children(&self, el: ElementHandle) -> Vec<ElementHandle> {
        match self.nodes.get(el.index()) {
            Some(node) if matches!(node.kind, NodeKind::Element(_)) => node
                .children
                .iter()
                .filter(|id| self.element_data(**id).is_some())
                .map(|id| to_handle(*id))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn text_fragments(&self, el: ElementHandle) -> Vec<String> {
        let mut out = Vec::new();
        let Some(node) = self.nodes.get(el.index()) else {
            return out;
        };
        let mut stack: Vec<NodeId> = node.children.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id.0) else {
                continue;
            };
            match &node.kind {
                NodeKind::Text(text) => out.push(text.clone()),
                NodeKind::Element(data) if NON_RENDERED.contains(&data.tag.as_str()) => {}
                NodeKind::Element(_) => stack.extend(node.children.iter().rev().copied()),
                NodeKind::Document => {}
            }
        }
        out
    }

    /// Only inline `style` declarations are known to an offline document.
    fn computed_style(&self, el: ElementHandle, property: &str) -> Option<String> {
        let style = self.attribute(el, "style")?;
        style.split(';').find_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            if name.trim().eq_ignore_ascii_case(property) {
                Some(value.trim().to_string())
            } else {
                None
            }
        })
    }

    fn bounding_rect(&self, el: ElementHandle) -> Option<Rect> {
        self.element_data(to_node(el))?.rect
    }

    fn query_all(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, SelectorError> {
        let list = selector::parse(selector)
            .map_err(|e| SelectorError::new(selector, e.to_string()))?;

        let from = match scope {
            Some(el) if self.element_data(to_node(el)).is_some() => to_node(el),
            Some(_) => return Ok(Vec::new()),
            None => Self::ROOT,
        };

        let found: Vec<ElementHandle> = self
            .descendant_elements(from)
            .into_iter()
            .map(to_handle)
            .filter(|el| selector::matches(self, *el, &list))
            .collect();
        trace!(selector, count = found.len(), "query_all");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, ElementHandle, ElementHandle) {
        let mut doc = Document::new();
        let html = doc.append_element(None, "html", Vec::<(String, String)>::new());
        let body = doc.append_element(Some(html), "BODY", Vec::<(String, String)>::new());
        let button = doc.append_element(Some(body), "button", [("ID", "go"), ("style", "color: red; Background-Image: url(a.png)")]);
        doc.append_text(button, "Go");
        (doc, body, button)
    }

    #[test]
    fn builds_and_reads_tree() {
        let (doc, body, button) = sample();
        assert_eq!(doc.tag_name(body).as_deref(), Some("body"));
        assert_eq!(doc.attribute(button, "id").as_deref(), Some("go"));
        assert_eq!(doc.parent(button), Some(body));
        assert_eq!(doc.children(body), vec![button]);
        assert_eq!(doc.text_content(button), "Go");
        assert_eq!(
            doc.computed_style(button, "background-image").as_deref(),
            Some("url(a.png)")
        );
        assert_eq!(doc.parent(doc.document_element().unwrap()), None);
    }

    #[test]
    fn detach_unlinks_subtree() {
        let (mut doc, body, button) = sample();
        assert!(doc.is_attached(button));
        doc.detach(button);
        assert!(!doc.is_attached(button));
        assert!(doc.children(body).is_empty());
        assert!(doc.query_all(None, "#go").unwrap().is_empty());
    }

    #[test]
    fn mutators_touch_only_elements() {
        let (mut doc, _, button) = sample();
        assert!(doc.set_attribute(button, "data-testid", "go-btn"));
        assert_eq!(doc.query_all(None, "[data-testid=go-btn]").unwrap(), vec![button]);
        assert!(doc.remove_attribute(button, "id"));
        assert!(doc.query_all(None, "#go").unwrap().is_empty());
        assert!(!doc.set_attribute(ElementHandle::new(0), "id", "x"));
    }

    #[test]
    fn query_reports_bad_selector() {
        let (doc, _, _) = sample();
        let err = doc.query_all(None, "div[").unwrap_err();
        assert_eq!(err.selector, "div[");
    }
}
