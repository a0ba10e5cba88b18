//! Attribute-driven selector candidates, in priority order.

use crate::config::SelectorConfig;
use crate::resolution::anchor::closest_ancestor;
use crate::resolution::css;
use pinpoint_common::protocol::{
    ElementContext, ElementHandle, SelectorCandidate, SelectorStrategy,
};
use pinpoint_common::tree::DomTree;

/// Visible text at or beyond this length never becomes a text shorthand.
const SHORTHAND_TEXT_LIMIT: usize = 100;

/// Heuristic for ids minted by frameworks at render time.
pub fn looks_generated(id: &str, config: &SelectorConfig) -> bool {
    let len = id.chars().count();
    if len > config.generated_id_max_len {
        return true;
    }
    let alphanumeric = id.chars().all(|c| c.is_ascii_alphanumeric());
    let has_letter = id.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = id.chars().any(|c| c.is_ascii_digit());
    len >= config.generated_id_mixed_min_len && alphanumeric && has_letter && has_digit
}

/// Every non-structural candidate that applies to the element. Confidence is
/// the strategy's base value; uniqueness is checked by the caller.
pub fn generate_candidates<T: DomTree + ?Sized>(
    tree: &T,
    el: ElementHandle,
    ctx: &ElementContext,
    config: &SelectorConfig,
) -> Vec<SelectorCandidate> {
    let mut candidates = Vec::new();
    let mut push = |strategy: SelectorStrategy, selector: String| {
        candidates.push(SelectorCandidate::new(
            strategy,
            selector,
            strategy.base_confidence(),
        ));
    };

    if let Some(id) = ctx.attr("id")
        && !looks_generated(id, config)
    {
        push(SelectorStrategy::Id, css::id(id));
    }

    if let Some((name, value)) = config
        .test_attributes
        .iter()
        .find_map(|attr| ctx.attr(attr).map(|v| (attr, v)))
    {
        push(SelectorStrategy::TestId, css::attribute(name, value));
    }

    if let Some(label) = ctx.attr("aria-label") {
        let selector = css::attribute("aria-label", label);
        let selector = match column_header_scope(tree, el, config) {
            Some(scope) => format!("{} {}", scope, selector),
            None => selector,
        };
        push(SelectorStrategy::AriaLabel, selector);
    }

    if let Some(name) = ctx.attr("name") {
        push(SelectorStrategy::Name, css::attribute("name", name));
    }

    if let Some(placeholder) = ctx.attr("placeholder") {
        push(SelectorStrategy::Placeholder, css::attribute("placeholder", placeholder));
    }

    if let Some(selector) = text_shorthand(ctx) {
        push(SelectorStrategy::TextShorthand, selector);
    }

    candidates
}

/// `[role="columnheader"][data-field="…"]` of an enclosing header cell, so
/// repeated labels (sort, menu) stay distinct per column.
fn column_header_scope<T: DomTree + ?Sized>(
    tree: &T,
    el: ElementHandle,
    config: &SelectorConfig,
) -> Option<String> {
    let header = closest_ancestor(tree, el, config.max_depth, |node| {
        tree.attribute(node, "role").as_deref() == Some("columnheader")
            && tree.attribute(node, "data-field").is_some_and(|f| !f.is_empty())
    })?;
    let field = tree.attribute(header, "data-field")?;
    Some(format!(
        "{}{}",
        css::attribute("role", "columnheader"),
        css::attribute("data-field", &field)
    ))
}

fn text_shorthand(ctx: &ElementContext) -> Option<String> {
    let tag = ctx.tag.as_str();
    let text = ctx.text.as_str();
    let usable_text = !text.is_empty() && text.chars().count() < SHORTHAND_TEXT_LIMIT;

    if tag == "input"
        && matches!(ctx.attr("type"), Some("button" | "submit" | "reset"))
        && let Some(value) = ctx.attr("value")
    {
        let kind = ctx.attr("type").unwrap_or("button");
        return Some(format!(
            "input{}{}",
            css::attribute("type", kind),
            css::attribute("value", value)
        ));
    }

    if !usable_text {
        return None;
    }

    match (tag, ctx.attr("role")) {
        ("button" | "a", _) => Some(css::has_text(tag, text)),
        (_, Some(role @ ("button" | "link"))) => {
            Some(css::has_text(&css::attribute("role", role), text))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_heuristic() {
        let config = SelectorConfig::default();
        assert!(!looks_generated("submit-btn", &config));
        assert!(!looks_generated("email", &config));
        assert!(!looks_generated("row-3", &config));
        assert!(looks_generated("a1b2c3d4e5", &config));
        assert!(looks_generated("mui-component-select", &config));
        assert!(looks_generated("ember1234567", &config));
        assert!(!looks_generated("navigation", &config));
        assert!(!looks_generated("step-2-next", &config));
        assert!(!looks_generated("main-content-2", &config));
    }

    #[test]
    fn test_input_button_shorthand() {
        let mut ctx = ElementContext {
            tag: "input".into(),
            ..Default::default()
        };
        ctx.attributes.insert("type", "submit");
        ctx.attributes.insert("value", "Go");
        assert_eq!(
            text_shorthand(&ctx).as_deref(),
            Some(r#"input[type="submit"][value="Go"]"#)
        );
    }

    #[test]
    fn test_role_link_shorthand() {
        let mut ctx = ElementContext {
            tag: "div".into(),
            text: "Open report".into(),
            ..Default::default()
        };
        ctx.attributes.insert("role", "link");
        assert_eq!(
            text_shorthand(&ctx).as_deref(),
            Some(r#"[role="link"]:has-text("Open report")"#)
        );
    }
}
