//! Building documents from recorded DOM snapshots.

use crate::document::{Document, ElementData, NodeKind, to_handle};
use pinpoint_common::protocol::{DomSnapshot, ElementHandle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Snapshot node has an empty tag")]
    EmptyTag,
}

impl Document {
    /// Builds a document whose root element is the snapshot root. Bounding
    /// boxes are carried over so geometry checks work offline.
    pub fn from_snapshot(snapshot: &DomSnapshot) -> Result<Document, SnapshotError> {
        let mut doc = Document::new();
        // Iterative so deeply nested recordings cannot exhaust the stack.
        let mut pending = vec![(snapshot, Document::ROOT)];

        while let Some((node, parent)) = pending.pop() {
            let tag = node.tag.trim().to_ascii_lowercase();
            if tag.is_empty() {
                return Err(SnapshotError::EmptyTag);
            }
            let id = doc.push_node(
                parent,
                NodeKind::Element(ElementData {
                    tag,
                    attributes: node
                        .attributes
                        .iter()
                        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                        .collect(),
                    rect: node.bounding_box,
                }),
            );
            if !node.text.is_empty() {
                doc.push_node(id, NodeKind::Text(node.text.clone()));
            }
            pending.extend(node.children.iter().rev().map(|child| (child, id)));
        }

        Ok(doc)
    }

    pub fn from_snapshot_json(json: &str) -> Result<Document, SnapshotError> {
        let snapshot: DomSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot)
    }

    /// Handle of the snapshot root once loaded.
    pub fn snapshot_root(&self) -> Option<ElementHandle> {
        self.descendant_elements(Document::ROOT)
            .first()
            .copied()
            .map(to_handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinpoint_common::tree::DomTree;

    #[test]
    fn test_loads_nested_snapshot() {
        let json = r#"{
            "tag": "BODY",
            "children": [
                {"tag": "button", "attributes": {"id": "save", "title": null},
                 "text": "Save", "boundingBox": {"x": 10, "y": 20, "width": 80, "height": 30}},
                {"tag": "div", "children": [{"tag": "span", "text": "inner"}]}
            ]
        }"#;
        let doc = Document::from_snapshot_json(json).unwrap();
        let body = doc.snapshot_root().unwrap();
        assert_eq!(doc.tag_name(body).as_deref(), Some("body"));

        let button = doc.query_selector("#save").unwrap().unwrap();
        assert_eq!(doc.text_content(button), "Save");
        assert_eq!(doc.attribute(button, "title"), None);
        assert_eq!(doc.bounding_rect(button).map(|r| r.width), Some(80.0));

        let tags: Vec<_> = doc
            .children(body)
            .into_iter()
            .filter_map(|c| doc.tag_name(c))
            .collect();
        assert_eq!(tags, vec!["button", "div"]);
    }

    #[test]
    fn test_rejects_empty_tag() {
        let err = Document::from_snapshot_json(r#"{"tag": " "}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::EmptyTag));
    }
}
