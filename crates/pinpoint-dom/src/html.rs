//! Forgiving HTML reader that builds a [`Document`].
//!
//! Not a conforming HTML5 tree builder. It handles what recorded pages and
//! hand-written fixtures contain: void and self-closing elements, comments,
//! raw-text elements, common entities, the usual implied end tags, and
//! unmatched end tags (ignored).

use crate::document::{Document, ElementData, NodeId, NodeKind};
use tracing::debug;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Which open elements a new start tag implicitly closes, and where the
/// search for them stops.
fn implied_close(tag: &str) -> Option<(&'static [&'static str], &'static [&'static str])> {
    let rule: (&'static [&'static str], &'static [&'static str]) = match tag {
        "li" => (&["li"], &["ul", "ol", "menu"]),
        "p" => (&["p"], &["div", "section", "article", "td", "th", "li", "body"]),
        "td" | "th" => (&["td", "th"], &["tr", "table"]),
        "tr" => (&["tr"], &["thead", "tbody", "tfoot", "table"]),
        "thead" | "tbody" | "tfoot" => (&["thead", "tbody", "tfoot"], &["table"]),
        "option" => (&["option"], &["select", "datalist", "optgroup"]),
        "dt" | "dd" => (&["dt", "dd"], &["dl"]),
        _ => return None,
    };
    Some(rule)
}

impl Document {
    /// Parses markup into a new document. Fragments are accepted; their top
    /// level elements become children of the document.
    pub fn parse_html(html: &str) -> Document {
        let mut doc = Document::new();
        let mut builder = TreeBuilder {
            doc: &mut doc,
            stack: vec![Document::ROOT],
        };
        builder.run(html);
        debug!(nodes = doc.len(), "parsed html");
        doc
    }
}

struct TreeBuilder<'a> {
    doc: &'a mut Document,
    stack: Vec<NodeId>,
}

impl TreeBuilder<'_> {
    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(Document::ROOT)
    }

    fn open_tag(&self, idx: usize) -> Option<&str> {
        self.doc.node_tag(self.stack[idx])
    }

    fn run(&mut self, html: &str) {
        let bytes = html.as_bytes();
        let mut pos = 0;

        while pos < html.len() {
            let rest = &html[pos..];

            if rest.starts_with("<!--") {
                pos += rest[4..].find("-->").map_or(rest.len(), |end| end + 7);
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                pos += rest.find('>').map_or(rest.len(), |end| end + 1);
            } else if rest.starts_with("</") {
                let end = rest.find('>').map_or(rest.len(), |end| end + 1);
                let name = tag_name(&rest[2..]);
                if !name.is_empty() {
                    self.close(&name);
                }
                pos += end;
            } else if bytes[pos] == b'<' && bytes.get(pos + 1).is_some_and(u8::is_ascii_alphabetic) {
                pos += self.start_tag(rest);
            } else {
                let first = rest.chars().next().map_or(1, char::len_utf8);
                let len = rest[first..].find('<').map_or(rest.len(), |n| n + first);
                self.text(&rest[..len]);
                pos += len;
            }
        }
    }

    /// Consumes one start tag (plus raw-text content) and returns the number
    /// of bytes read.
    fn start_tag(&mut self, rest: &str) -> usize {
        let name = tag_name(&rest[1..]);
        let mut pos = 1 + name.len();
        let mut attributes: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;

        loop {
            pos += leading_whitespace(&rest[pos..]);
            let tail = &rest[pos..];
            if tail.is_empty() {
                break;
            }
            if tail.starts_with('>') {
                pos += 1;
                break;
            }
            if tail.starts_with("/>") {
                self_closing = true;
                pos += 2;
                break;
            }
            if tail.starts_with('/') {
                pos += 1;
                continue;
            }

            let name_len = tail
                .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
                .unwrap_or(tail.len())
                .max(1);
            let attr_name = tail[..name_len].to_ascii_lowercase();
            pos += name_len;

            let after_ws = leading_whitespace(&rest[pos..]);
            let mut value = String::new();
            if rest[pos + after_ws..].starts_with('=') {
                pos += after_ws + 1;
                pos += leading_whitespace(&rest[pos..]);
                let tail = &rest[pos..];
                match tail.chars().next() {
                    Some(quote @ ('"' | '\'')) => {
                        let end = tail[1..].find(quote).map_or(tail.len() - 1, |n| n);
                        value = decode_entities(&tail[1..1 + end]);
                        pos += (2 + end).min(tail.len());
                    }
                    _ => {
                        let end = tail
                            .find(|c: char| c.is_whitespace() || c == '>')
                            .unwrap_or(tail.len());
                        value = decode_entities(&tail[..end]);
                        pos += end;
                    }
                }
            }

            if !attributes.iter().any(|(n, _)| *n == attr_name) {
                attributes.push((attr_name, value));
            }
        }

        self.apply_implied_close(&name);
        let id = self.doc.push_node(
            self.current(),
            NodeKind::Element(ElementData {
                tag: name.clone(),
                attributes,
                rect: None,
            }),
        );

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) && !self_closing {
            let body = &rest[pos..];
            let close = format!("</{}", name);
            let end = find_ascii_case_insensitive(body, &close).unwrap_or(body.len());
            let text = &body[..end];
            if !text.is_empty() {
                let text = if name == "script" || name == "style" {
                    text.to_string()
                } else {
                    decode_entities(text)
                };
                self.doc.push_node(id, NodeKind::Text(text));
            }
            pos += end;
            pos += rest[pos..].find('>').map_or(rest.len() - pos, |n| n + 1);
            return pos;
        }

        if !self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
            self.stack.push(id);
        }
        pos
    }

    fn apply_implied_close(&mut self, tag: &str) {
        let Some((closes, boundary)) = implied_close(tag) else {
            return;
        };
        for idx in (1..self.stack.len()).rev() {
            let Some(open) = self.open_tag(idx) else {
                continue;
            };
            if closes.contains(&open) {
                self.stack.truncate(idx);
                return;
            }
            if boundary.contains(&open) {
                return;
            }
        }
    }

    fn close(&mut self, name: &str) {
        let found = (1..self.stack.len())
            .rev()
            .find(|idx| self.open_tag(*idx) == Some(name));
        if let Some(idx) = found {
            self.stack.truncate(idx);
        }
    }

    fn text(&mut self, raw: &str) {
        if raw.trim().is_empty() {
            return;
        }
        let parent = self.current();
        self.doc.push_node(parent, NodeKind::Text(decode_entities(raw)));
    }
}

fn tag_name(input: &str) -> String {
    input
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_' || *c == ':')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn leading_whitespace(input: &str) -> usize {
    input.len() - input.trim_start().len()
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

/// Decodes the named entities that show up in practice plus numeric ones.
/// Unknown entities are left untouched.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').filter(|end| *end <= 10).and_then(|end| {
            let entity = &rest[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ if entity.starts_with('#') => {
                    entity[1..].parse::<u32>().ok().and_then(char::from_u32)
                }
                _ => None,
            };
            c.map(|c| (c, end))
        });

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinpoint_common::tree::DomTree;

    #[test]
    fn test_void_and_self_closing() {
        let doc = Document::parse_html(r#"<div><img src="a.png"><br/><span>x</span></div>"#);
        let div = doc.query_selector("div").unwrap().unwrap();
        let tags: Vec<_> = doc
            .children(div)
            .into_iter()
            .filter_map(|c| doc.tag_name(c))
            .collect();
        assert_eq!(tags, vec!["img", "br", "span"]);
    }

    #[test]
    fn test_implied_end_tags() {
        let doc = Document::parse_html(
            "<table><tr><td>a<td>b<tr><td>c</table><ul><li>one<li>two</ul>",
        );
        assert_eq!(doc.query_all(None, "tr").unwrap().len(), 2);
        assert_eq!(doc.query_all(None, "tr > td").unwrap().len(), 3);
        assert_eq!(doc.query_all(None, "ul > li").unwrap().len(), 2);
    }

    #[test]
    fn test_comments_doctype_and_stray_end_tags() {
        let doc = Document::parse_html(
            "<!DOCTYPE html><html><body><!-- <p>no</p> --></span><p>yes</p></body></html>",
        );
        let ps = doc.query_all(None, "p").unwrap();
        assert_eq!(ps.len(), 1);
        assert_eq!(doc.text_content(ps[0]), "yes");
    }

    #[test]
    fn test_raw_text_and_attributes() {
        let doc = Document::parse_html(
            "<div id=box data-x='1 &amp; 2' hidden><script>if (a<b) {}</script>ok</div>",
        );
        let div = doc.query_selector("#box").unwrap().unwrap();
        assert_eq!(doc.attribute(div, "data-x").as_deref(), Some("1 & 2"));
        assert_eq!(doc.attribute(div, "hidden").as_deref(), Some(""));
        assert_eq!(doc.text_fragments(div), vec!["ok".to_string()]);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &#65;&#x42; &bogus; &"), "a <b> AB &bogus; &");
    }
}
