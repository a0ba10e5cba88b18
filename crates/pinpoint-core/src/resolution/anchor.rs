//! Climbing from a clicked node to the control it belongs to.

use crate::config::SelectorConfig;
use crate::resolution::css;
use pinpoint_common::protocol::ElementHandle;
use pinpoint_common::tree::DomTree;
use tracing::trace;

const INTERACTIVE_TAGS: &[&str] = &[
    "a", "button", "input", "select", "textarea", "option", "summary",
];

const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "checkbox", "radio", "switch", "tab", "menuitem", "menuitemcheckbox",
    "menuitemradio", "option", "textbox", "combobox", "searchbox",
];

const FORM_FIELDS: &str = "input, select, textarea";

pub fn is_interactive<T: DomTree + ?Sized>(tree: &T, el: ElementHandle) -> bool {
    let Some(tag) = tree.tag_name(el) else {
        return false;
    };
    if INTERACTIVE_TAGS.contains(&tag.as_str()) {
        return true;
    }
    if let Some(role) = tree.attribute(el, "role")
        && INTERACTIVE_ROLES.contains(&role.trim().to_ascii_lowercase().as_str())
    {
        return true;
    }
    tree.attribute(el, "tabindex")
        .and_then(|v| v.trim().parse::<i32>().ok())
        .is_some_and(|v| v >= 0)
}

/// The nearest actionable element at or above `el`: an interactive element,
/// or the field a label points at. Falls back to `el` itself.
pub fn find_anchor<T: DomTree + ?Sized>(
    tree: &T,
    el: ElementHandle,
    config: &SelectorConfig,
) -> ElementHandle {
    let mut current = Some(el);
    let mut depth = 0;

    while let Some(node) = current {
        if depth > config.max_depth {
            break;
        }
        if is_interactive(tree, node) {
            if node != el {
                trace!(from = el.index(), to = node.index(), "climbed to interactive ancestor");
            }
            return node;
        }
        if tree.tag_name(node).as_deref() == Some("label")
            && let Some(field) = label_target(tree, node)
        {
            return field;
        }
        current = tree.parent(node);
        depth += 1;
    }

    el
}

/// `label[for]` resolves by id; a wrapping label resolves to its first field.
fn label_target<T: DomTree + ?Sized>(tree: &T, label: ElementHandle) -> Option<ElementHandle> {
    if let Some(target) = tree.attribute(label, "for")
        && !target.is_empty()
    {
        let found = tree
            .query_all(None, &css::attribute("id", &target))
            .unwrap_or_default();
        if let Some(field) = found.into_iter().next() {
            return Some(field);
        }
    }
    tree.query_all(Some(label), FORM_FIELDS)
        .ok()
        .and_then(|fields| fields.into_iter().next())
}

/// Nearest ancestor (exclusive) satisfying `pred`, within the depth bound.
pub fn closest_ancestor<T, F>(
    tree: &T,
    el: ElementHandle,
    max_depth: usize,
    pred: F,
) -> Option<ElementHandle>
where
    T: DomTree + ?Sized,
    F: Fn(ElementHandle) -> bool,
{
    let mut current = tree.parent(el);
    let mut depth = 0;
    while let Some(node) = current {
        if depth >= max_depth {
            return None;
        }
        if pred(node) {
            return Some(node);
        }
        current = tree.parent(node);
        depth += 1;
    }
    None
}
