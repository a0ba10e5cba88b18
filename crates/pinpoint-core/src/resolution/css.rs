//! Small builders for the selector strings the engine emits.

use regex::Regex;
use std::sync::LazyLock;

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[A-Za-z_][A-Za-z0-9_-]*$").unwrap());

/// Whether `value` can be written bare after `#` or `.`.
pub fn is_css_identifier(value: &str) -> bool {
    IDENT_RE.is_match(value)
}

/// Double-quoted selector string with backslash escapes.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

pub fn attribute(name: &str, value: &str) -> String {
    format!("[{}={}]", name, quote(value))
}

pub fn id(value: &str) -> String {
    if is_css_identifier(value) {
        format!("#{}", value)
    } else {
        attribute("id", value)
    }
}

pub fn has_text(prefix: &str, text: &str) -> String {
    format!("{}:has-text({})", prefix, quote(text))
}
