//! Parsed form of the selector subset the document can evaluate.

mod matcher;
mod parser;

pub use matcher::{matches, normalize_text};
pub use parser::{ParseError, Rule, SelectorParser, parse};

/// A comma-separated group; an element matches when any member matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

/// Compounds joined by combinators, stored left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Relation to the previous step. Ignored on the first step.
    pub combinator: Combinator,
    pub compound: Compound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// `None` tag means universal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Id(String),
    Class(String),
    Attribute {
        name: String,
        test: Option<(AttrOp, String)>,
    },
    NthOfType(usize),
    NthChild(usize),
    FirstChild,
    LastChild,
    HasText(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    Equals,
    Includes,
    Prefix,
    Suffix,
    Substring,
    DashMatch,
}

impl AttrOp {
    pub fn test(self, actual: &str, expected: &str) -> bool {
        match self {
            AttrOp::Equals => actual == expected,
            AttrOp::Includes => {
                !expected.is_empty() && actual.split_whitespace().any(|w| w == expected)
            }
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(expected),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(expected),
            AttrOp::Substring => !expected.is_empty() && actual.contains(expected),
            AttrOp::DashMatch => {
                actual == expected
                    || (actual.starts_with(expected)
                        && actual[expected.len()..].starts_with('-'))
            }
        }
    }
}
