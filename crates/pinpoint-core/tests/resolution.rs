use pinpoint_common::protocol::{ElementHandle, SelectorStrategy};
use pinpoint_common::tree::DomTree;
use pinpoint_core::ResolutionEngine;
use pinpoint_core::resolution::engine::AMBIGUOUS_PATH_CONFIDENCE;
use pinpoint_core::config::SelectorConfig;
use pinpoint_dom::Document;

fn el(doc: &Document, selector: &str) -> ElementHandle {
    doc.query_selector(selector).unwrap().unwrap()
}

fn matches(doc: &Document, selector: &str) -> Vec<ElementHandle> {
    doc.query_all(None, selector).unwrap()
}

#[test]
fn test_stable_id_is_primary() {
    let doc = Document::parse_html(
        r#"<form><input name="q"><button id="submit-btn" type="submit">Submit</button></form>"#,
    );
    let button = el(&doc, "button");
    let result = ResolutionEngine::resolve_selector(&doc, button, &SelectorConfig::default());

    let primary = result.primary().unwrap();
    assert_eq!(primary.selector, "#submit-btn");
    assert_eq!(primary.strategy, SelectorStrategy::Id);
    assert_eq!(primary.confidence, 100);
    assert!(
        result
            .selectors
            .iter()
            .any(|c| c.selector == r#"button:has-text("Submit")"#)
    );
}

#[test]
fn test_third_list_item_gets_sibling_index() {
    let doc = Document::parse_html("<ul><li>a</li><li>b</li><li>c</li><li>d</li></ul>");
    let third = matches(&doc, "li")[2];
    let result = ResolutionEngine::resolve_selector(&doc, third, &SelectorConfig::default());

    let primary = result.primary_selector();
    assert!(primary.ends_with("li:nth-of-type(3)"), "got {primary}");
    assert_eq!(matches(&doc, primary), vec![third]);
}

#[test]
fn test_resolution_is_idempotent() {
    let doc = Document::parse_html(
        r#"<div class="card"><span>x</span><span>y</span></div><div class="card"><span>x</span></div>"#,
    );
    let config = SelectorConfig::default();
    for target in matches(&doc, "span") {
        let first = ResolutionEngine::resolve_selector(&doc, target, &config);
        let second = ResolutionEngine::resolve_selector(&doc, target, &config);
        assert_eq!(first, second);
    }
}

#[test]
fn test_primary_selector_is_unique_without_attributes() {
    let doc = Document::parse_html(
        r#"
        <body>
          <div><p><span>one</span><span>two</span></p><p><span>one</span></p></div>
          <div><p><span>one</span></p></div>
          <section><div><em>deep</em></div><div><em>deep</em></div></section>
        </body>
        "#,
    );
    let config = SelectorConfig::default();
    for target in matches(&doc, "body *") {
        let result = ResolutionEngine::resolve_selector(&doc, target, &config);
        let primary = result.primary_selector();
        assert_eq!(matches(&doc, primary), vec![target], "selector {primary}");
    }
}

#[test]
fn test_detached_and_non_element_handles_resolve_empty() {
    let mut doc = Document::parse_html(r#"<div><button id="gone">x</button></div>"#);
    let config = SelectorConfig::default();

    let button = el(&doc, "#gone");
    doc.detach(button);
    let result = ResolutionEngine::resolve_selector(&doc, button, &config);
    assert!(result.is_empty());
    assert_eq!(result.primary_selector(), "");

    // Index 0 is the document node itself.
    let result = ResolutionEngine::resolve_selector(&doc, ElementHandle::new(0), &config);
    assert!(result.is_empty());
    assert_eq!(
        ResolutionEngine::resolve_selector_string(&doc, ElementHandle::new(9999), &config),
        ""
    );
}

#[test]
fn test_click_on_decoration_resolves_to_control() {
    let doc = Document::parse_html(
        r#"<button id="save"><span class="icon"><i>*</i></span> Save</button>"#,
    );
    let icon = el(&doc, "i");
    let result = ResolutionEngine::resolve_selector(&doc, icon, &SelectorConfig::default());
    assert_eq!(result.primary_selector(), "#save");
}

#[test]
fn test_label_resolves_to_its_field() {
    let doc = Document::parse_html(
        r#"<label for="email">Email</label><input id="email">
           <label>Phone <input name="phone"></label>"#,
    );
    let config = SelectorConfig::default();

    let label = matches(&doc, "label")[0];
    assert_eq!(
        ResolutionEngine::resolve_selector_string(&doc, label, &config),
        "#email"
    );

    let wrapping = matches(&doc, "label")[1];
    assert_eq!(
        ResolutionEngine::resolve_selector_string(&doc, wrapping, &config),
        r#"[name="phone"]"#
    );
}

#[test]
fn test_generated_ids_are_skipped() {
    let doc = Document::parse_html(r#"<button id="ember1234567">Save</button>"#);
    let result =
        ResolutionEngine::resolve_selector(&doc, el(&doc, "button"), &SelectorConfig::default());
    assert!(result.selectors.iter().all(|c| c.strategy != SelectorStrategy::Id));
    assert_eq!(result.primary_selector(), r#"button:has-text("Save")"#);
}

#[test]
fn test_hyphenated_ids_with_digits_stay_primary() {
    let doc = Document::parse_html(
        r#"<button id="step-2-next">Next</button><main id="main-content-2"><button>Go</button></main>"#,
    );
    let config = SelectorConfig::default();
    let next = ResolutionEngine::resolve_selector(&doc, el(&doc, "#step-2-next"), &config);
    assert_eq!(next.primary_selector(), "#step-2-next");
    assert_eq!(next.primary().unwrap().strategy, SelectorStrategy::Id);

    let main = ResolutionEngine::resolve_selector(&doc, el(&doc, "main"), &config);
    assert_eq!(main.primary_selector(), "#main-content-2");
}

#[test]
fn test_duplicate_ancestor_id_falls_back_to_sibling_index() {
    let doc = Document::parse_html(
        r#"<html><body><div id="card"><span>a</span></div><div id="card"><span>a</span></div></body></html>"#,
    );
    let second = matches(&doc, "span")[1];
    let result = ResolutionEngine::resolve_selector(&doc, second, &SelectorConfig::default());

    let primary = result.primary().unwrap();
    assert_eq!(primary.selector, "div:nth-of-type(2) > span");
    assert_eq!(primary.confidence, 40);
    assert_eq!(matches(&doc, &primary.selector), vec![second]);
}

#[test]
fn test_unreachable_uniqueness_keeps_longest_path_at_lowest_confidence() {
    // Top-level siblings of a fragment have no parent to index against.
    let doc = Document::parse_html("<p>same</p><p>same</p>");
    let second = matches(&doc, "p")[1];
    let result = ResolutionEngine::resolve_selector(&doc, second, &SelectorConfig::default());

    let primary = result.primary().unwrap();
    assert_eq!(primary.strategy, SelectorStrategy::StructuralPath);
    assert_eq!(primary.selector, "p");
    assert_eq!(primary.confidence, AMBIGUOUS_PATH_CONFIDENCE);
    assert_eq!(matches(&doc, &primary.selector).len(), 2);
}

#[test]
fn test_max_depth_bounds_the_structural_path() {
    let nested = "<section><div><div><div><span>x</span></div></div></div></section>";
    let doc = Document::parse_html(&format!("<html><body>{nested}{nested}</body></html>"));
    let target = matches(&doc, "span")[1];

    let unbounded = ResolutionEngine::resolve_selector(&doc, target, &SelectorConfig::default());
    assert!(unbounded.primary_selector().starts_with("section:nth-of-type(2)"));
    assert_eq!(matches(&doc, unbounded.primary_selector()), vec![target]);

    let shallow = SelectorConfig {
        max_depth: 2,
        ..Default::default()
    };
    let bounded = ResolutionEngine::resolve_selector(&doc, target, &shallow);
    let primary = bounded.primary().unwrap();
    assert_eq!(primary.selector, "div > div > span");
    assert_eq!(primary.confidence, AMBIGUOUS_PATH_CONFIDENCE);
}

#[test]
fn test_ambiguous_candidates_are_demoted() {
    let doc = Document::parse_html(
        r#"<ul>
             <li><button data-testid="row-action">Edit</button></li>
             <li><button data-testid="row-action">Edit</button></li>
           </ul>"#,
    );
    let second = matches(&doc, "button")[1];
    let result = ResolutionEngine::resolve_selector(&doc, second, &SelectorConfig::default());

    let testid = result
        .selectors
        .iter()
        .find(|c| c.strategy == SelectorStrategy::TestId)
        .unwrap();
    assert_eq!(testid.confidence, 95 / 4);

    let primary = result.primary().unwrap();
    assert_eq!(primary.strategy, SelectorStrategy::StructuralPath);
    assert_eq!(matches(&doc, &primary.selector), vec![second]);
}

#[test]
fn test_aria_label_scoped_to_column_header() {
    let doc = Document::parse_html(
        r#"<div role="row">
             <div role="columnheader" data-field="name"><button aria-label="Sort">^</button></div>
             <div role="columnheader" data-field="age"><button aria-label="Sort">^</button></div>
           </div>"#,
    );
    let age_sort = matches(&doc, "button")[1];
    let result = ResolutionEngine::resolve_selector(&doc, age_sort, &SelectorConfig::default());

    let primary = result.primary().unwrap();
    assert_eq!(primary.strategy, SelectorStrategy::AriaLabel);
    assert_eq!(
        primary.selector,
        r#"[role="columnheader"][data-field="age"] [aria-label="Sort"]"#
    );
    assert_eq!(matches(&doc, &primary.selector), vec![age_sort]);
}

#[test]
fn test_all_applicable_strategies_are_emitted_in_order() {
    let doc = Document::parse_html(
        r#"<input data-testid="search" aria-label="Search" name="q" placeholder="Search...">"#,
    );
    let result =
        ResolutionEngine::resolve_selector(&doc, el(&doc, "input"), &SelectorConfig::default());
    let strategies: Vec<_> = result.selectors.iter().map(|c| c.strategy).collect();
    assert_eq!(
        strategies,
        vec![
            SelectorStrategy::TestId,
            SelectorStrategy::AriaLabel,
            SelectorStrategy::Name,
            SelectorStrategy::Placeholder,
            SelectorStrategy::StructuralPath,
        ]
    );
}

#[test]
fn test_result_serializes_flat() {
    let doc = Document::parse_html(r#"<a href="/x" id="home">Home</a>"#);
    let result =
        ResolutionEngine::resolve_selector(&doc, el(&doc, "a"), &SelectorConfig::default());
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["selectors"][0]["selector"], "#home");
    assert_eq!(json["selectors"][0]["strategy"], "id");
    assert_eq!(json["selectors"][1]["strategy"], "textShorthand");
}
