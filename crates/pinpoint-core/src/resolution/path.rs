//! Structural paths with sibling-index disambiguation.
//!
//! An ancestor contributes `#id` only when that id is unique in the document.

use crate::config::SelectorConfig;
use crate::context::split_classes;
use crate::resolution::css;
use crate::resolution::generator::looks_generated;
use crate::resolution::validation::is_unique_match;
use pinpoint_common::protocol::ElementHandle;
use pinpoint_common::tree::DomTree;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralPath {
    pub selector: String,
    /// False when the document root was reached without isolating the element.
    pub unique: bool,
}

/// Builds `a > b > c` upward from `el`, one ancestor at a time, stopping as
/// soon as the path matches only `el`. Falls back to the longest path built.
pub fn build_structural_path<T: DomTree + ?Sized>(
    tree: &T,
    el: ElementHandle,
    config: &SelectorConfig,
) -> StructuralPath {
    let mut parts: Vec<String> = Vec::new();
    let mut longest = String::new();
    let mut current = Some(el);
    let mut depth = 0;

    while let Some(node) = current {
        if depth > config.max_depth {
            break;
        }
        let Some(tag) = tree.tag_name(node) else {
            break;
        };
        if tag == "html" && node != el {
            break;
        }

        let stable_id = tree
            .attribute(node, "id")
            .filter(|id| node != el && !id.is_empty() && !looks_generated(id, config))
            .map(|id| css::id(&id))
            .filter(|selector| is_unique_match(tree, selector, node));
        let segment = match stable_id {
            Some(selector) => selector,
            None => segment_for(tree, node, &tag, config),
        };
        parts.insert(0, segment);

        let selector = parts.join(" > ");
        if is_unique_match(tree, &selector, el) {
            return StructuralPath {
                selector,
                unique: true,
            };
        }
        longest = selector;

        if tag == "body" {
            break;
        }
        current = tree.parent(node);
        depth += 1;
    }

    StructuralPath {
        selector: longest,
        unique: false,
    }
}

/// `tag.class1.class2:nth-of-type(k)`; the index only when same-tag siblings
/// exist, counted 1-based among those siblings.
fn segment_for<T: DomTree + ?Sized>(
    tree: &T,
    el: ElementHandle,
    tag: &str,
    config: &SelectorConfig,
) -> String {
    let mut segment = tag.to_string();

    if let Some(class) = tree.attribute(el, "class") {
        split_classes(&class)
            .iter()
            .filter(|c| css::is_css_identifier(c))
            .take(config.max_path_classes)
            .for_each(|c| {
                segment.push('.');
                segment.push_str(c);
            });
    }

    if let Some(parent) = tree.parent(el) {
        let same_tag: Vec<ElementHandle> = tree
            .children(parent)
            .into_iter()
            .filter(|sibling| tree.tag_name(*sibling).as_deref() == Some(tag))
            .collect();
        if same_tag.len() > 1
            && let Some(position) = same_tag.iter().position(|s| *s == el)
        {
            segment.push_str(&format!(":nth-of-type({})", position + 1));
        }
    }

    segment
}
