use super::{Combinator, ComplexSelector, Compound, Condition, SelectorList, Step};
use pinpoint_common::protocol::ElementHandle;
use pinpoint_common::tree::DomTree;

/// True if `el` matches any selector in the list.
pub fn matches<T: DomTree + ?Sized>(tree: &T, el: ElementHandle, list: &SelectorList) -> bool {
    list.selectors
        .iter()
        .any(|selector| matches_complex(tree, el, selector))
}

fn matches_complex<T: DomTree + ?Sized>(
    tree: &T,
    el: ElementHandle,
    selector: &ComplexSelector,
) -> bool {
    match selector.steps.last() {
        Some(last) => {
            matches_compound(tree, el, &last.compound)
                && matches_ancestry(tree, el, &selector.steps, selector.steps.len() - 1)
        }
        None => false,
    }
}

/// `el` already matched `steps[idx]`; check the steps to its left.
fn matches_ancestry<T: DomTree + ?Sized>(
    tree: &T,
    el: ElementHandle,
    steps: &[Step],
    idx: usize,
) -> bool {
    if idx == 0 {
        return true;
    }
    let prev = &steps[idx - 1].compound;

    match steps[idx].combinator {
        Combinator::Child => tree.parent(el).is_some_and(|parent| {
            matches_compound(tree, parent, prev) && matches_ancestry(tree, parent, steps, idx - 1)
        }),
        Combinator::Descendant => {
            let mut current = tree.parent(el);
            while let Some(ancestor) = current {
                if matches_compound(tree, ancestor, prev)
                    && matches_ancestry(tree, ancestor, steps, idx - 1)
                {
                    return true;
                }
                current = tree.parent(ancestor);
            }
            false
        }
    }
}

fn matches_compound<T: DomTree + ?Sized>(tree: &T, el: ElementHandle, compound: &Compound) -> bool {
    let Some(tag) = tree.tag_name(el) else {
        return false;
    };
    if let Some(expected) = &compound.tag
        && !tag.eq_ignore_ascii_case(expected)
    {
        return false;
    }

    compound
        .conditions
        .iter()
        .all(|condition| matches_condition(tree, el, &tag, condition))
}

fn matches_condition<T: DomTree + ?Sized>(
    tree: &T,
    el: ElementHandle,
    tag: &str,
    condition: &Condition,
) -> bool {
    match condition {
        Condition::Id(id) => tree.attribute(el, "id").is_some_and(|v| v == *id),
        Condition::Class(class) => tree
            .attribute(el, "class")
            .is_some_and(|v| v.split_whitespace().any(|c| c == class)),
        Condition::Attribute { name, test } => match (tree.attribute(el, name), test) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some((op, expected))) => op.test(&actual, expected),
        },
        Condition::NthOfType(n) => {
            let (position, _) = sibling_position(tree, el, Some(tag));
            position == *n
        }
        Condition::NthChild(n) => {
            let (position, _) = sibling_position(tree, el, None);
            position == *n
        }
        Condition::FirstChild => sibling_position(tree, el, None).0 == 1,
        Condition::LastChild => {
            let (position, count) = sibling_position(tree, el, None);
            position == count
        }
        Condition::HasText(needle) => {
            let needle = normalize_text(needle);
            let haystack = normalize_text(&tree.text_fragments(el).join(" "));
            haystack.contains(&needle)
        }
    }
}

/// 1-based position of `el` among its element siblings and the sibling
/// count, optionally restricted to one tag. A root element is 1 of 1.
fn sibling_position<T: DomTree + ?Sized>(
    tree: &T,
    el: ElementHandle,
    tag: Option<&str>,
) -> (usize, usize) {
    let Some(parent) = tree.parent(el) else {
        return (1, 1);
    };

    let mut position = 0;
    let mut count = 0;
    for sibling in tree.children(parent) {
        if let Some(tag) = tag {
            let same = tree
                .tag_name(sibling)
                .is_some_and(|t| t.eq_ignore_ascii_case(tag));
            if !same {
                continue;
            }
        }
        count += 1;
        if sibling == el {
            position = count;
        }
    }
    (position, count)
}

/// Lowercases, strips quote characters and collapses whitespace runs.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '"' | '\'' | '\u{201c}' | '\u{201d}'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_text() {
        assert_eq!(normalize_text("  Say \"Hello\"\n  World "), "say hello world");
        assert_eq!(normalize_text("It's"), "its");
    }
}
