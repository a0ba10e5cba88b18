use pinpoint_common::tree::DomTree;
use pinpoint_dom::Document;

const PAGE: &str = r#"
<html>
<body>
  <nav class="menu main">
    <ul>
      <li><a href="/a">Alpha</a></li>
      <li><a href="/b">Beta</a></li>
      <li class="active"><a href="/c">Gamma   Ray</a></li>
    </ul>
  </nav>
  <form id="login">
    <input name="email" placeholder="Email address">
    <button type="submit" data-testid="login-submit">Sign "in"</button>
  </form>
  <div role="grid" class="MuiDataGrid-root"><div role="row"></div></div>
  <table id="plain"><tr><td>1</td></tr></table>
</body>
</html>
"#;

fn texts(doc: &Document, selector: &str) -> Vec<String> {
    doc.query_all(None, selector)
        .unwrap()
        .into_iter()
        .map(|el| doc.text_content(el).trim().to_string())
        .collect()
}

#[test]
fn test_nth_of_type_path() {
    let doc = Document::parse_html(PAGE);
    assert_eq!(
        texts(&doc, "body > nav.menu > ul > li:nth-of-type(3) > a"),
        vec!["Gamma   Ray"]
    );
    assert_eq!(texts(&doc, "li:first-child"), vec!["Alpha"]);
    assert_eq!(texts(&doc, "li:last-child"), vec!["Gamma   Ray"]);
    assert_eq!(texts(&doc, "ul li:nth-child(2) a"), vec!["Beta"]);
}

#[test]
fn test_has_text_is_loose() {
    let doc = Document::parse_html(PAGE);
    assert_eq!(doc.query_all(None, "a:has-text('gamma ray')").unwrap().len(), 1);
    assert_eq!(
        doc.query_all(None, r#"button:has-text("Sign in")"#).unwrap().len(),
        1
    );
    assert!(doc.query_all(None, "a:has-text('Delta')").unwrap().is_empty());
}

#[test]
fn test_attribute_selectors() {
    let doc = Document::parse_html(PAGE);
    assert_eq!(doc.query_all(None, r#"[data-testid="login-submit"]"#).unwrap().len(), 1);
    assert_eq!(doc.query_all(None, "input[placeholder^=Email]").unwrap().len(), 1);
    assert_eq!(doc.query_all(None, "a[href$='/b']").unwrap().len(), 1);
    assert_eq!(doc.query_all(None, "[class~=main]").unwrap().len(), 1);
}

#[test]
fn test_selector_groups_in_document_order() {
    let doc = Document::parse_html(PAGE);
    let found = doc
        .query_all(None, "table, [role=grid], .MuiDataGrid-root")
        .unwrap();
    let tags: Vec<_> = found.iter().filter_map(|el| doc.tag_name(*el)).collect();
    assert_eq!(tags, vec!["div", "table"]);
}

#[test]
fn test_scoped_query() {
    let doc = Document::parse_html(PAGE);
    let form = doc.query_selector("#login").unwrap().unwrap();
    assert_eq!(doc.query_all(Some(form), "input, button").unwrap().len(), 2);
    assert!(doc.query_all(Some(form), "form").unwrap().is_empty());
    assert!(doc.query_all(Some(form), "li").unwrap().is_empty());
}
