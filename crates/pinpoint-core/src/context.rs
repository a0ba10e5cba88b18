//! Attribute and context reader.

use crate::config::SelectorConfig;
use pinpoint_common::protocol::{AttributeMap, ElementContext, ElementHandle};
use pinpoint_common::tree::DomTree;

/// Text nodes at least this long are treated as content blobs, not labels.
const MAX_FRAGMENT_LEN: usize = 100;

/// Snapshot of everything selector generation needs from one element.
/// Missing pieces come back empty rather than failing.
pub fn read_context<T: DomTree + ?Sized>(
    tree: &T,
    el: ElementHandle,
    config: &SelectorConfig,
) -> ElementContext {
    let attributes = AttributeMap::from_pairs(tree.attributes(el));
    let classes = attributes.get("class").map(split_classes).unwrap_or_default();

    ElementContext {
        tag: tree.tag_name(el).unwrap_or_default(),
        classes,
        text: visible_text(tree, el, config.text_max_len),
        rect: tree.bounding_rect(el),
        attributes,
    }
}

/// Whitespace-separated class list, deduplicated in first-seen order.
pub fn split_classes(value: &str) -> Vec<String> {
    let mut classes: Vec<String> = Vec::new();
    for class in value.split_whitespace() {
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }
    classes
}

/// Deduplicated short text fragments joined by single spaces, quotes removed,
/// truncated to `max_len` characters.
pub fn visible_text<T: DomTree + ?Sized>(tree: &T, el: ElementHandle, max_len: usize) -> String {
    if is_hidden(tree, el) {
        return String::new();
    }

    let mut seen: Vec<String> = Vec::new();
    for fragment in tree.text_fragments(el) {
        let collapsed = collapse_whitespace(&fragment);
        if collapsed.is_empty() || collapsed.chars().count() >= MAX_FRAGMENT_LEN {
            continue;
        }
        if !seen.contains(&collapsed) {
            seen.push(collapsed);
        }
    }

    let joined: String = seen
        .join(" ")
        .chars()
        .filter(|c| !matches!(c, '"' | '\''))
        .collect();
    joined.trim().chars().take(max_len).collect::<String>().trim_end().to_string()
}

/// Cell-style text: every fragment, whitespace collapsed, nothing dropped.
pub fn cell_text<T: DomTree + ?Sized>(tree: &T, el: ElementHandle) -> String {
    collapse_whitespace(&tree.text_fragments(el).join(" "))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Inline hints only; layout-driven visibility is unknowable offline.
pub fn is_hidden<T: DomTree + ?Sized>(tree: &T, el: ElementHandle) -> bool {
    if tree.attribute(el, "hidden").is_some()
        || tree.attribute(el, "aria-hidden").is_some_and(|v| v == "true")
    {
        return true;
    }
    let display = tree.computed_style(el, "display");
    let visibility = tree.computed_style(el, "visibility");
    display.is_some_and(|v| v.eq_ignore_ascii_case("none"))
        || visibility.is_some_and(|v| v.eq_ignore_ascii_case("hidden"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_classes_dedups() {
        assert_eq!(split_classes(" btn  primary btn "), vec!["btn", "primary"]);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
    }
}
