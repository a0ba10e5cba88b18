use super::{AttrOp, Combinator, ComplexSelector, Compound, Condition, SelectorList, Step};
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "selector.pest"]
pub struct SelectorParser;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Pest error: {0}")]
    Pest(#[from] pest::error::Error<Rule>),
    #[error("Unknown rule: {0:?}")]
    UnknownRule(Rule),
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
}

pub fn parse(input: &str) -> Result<SelectorList, ParseError> {
    let pairs = SelectorParser::parse(Rule::selector_list, input)?;
    let mut list = SelectorList {
        selectors: Vec::new(),
    };

    for pair in pairs {
        if pair.as_rule() != Rule::selector_list {
            continue;
        }
        for inner in pair.into_inner() {
            if inner.as_rule() == Rule::complex {
                list.selectors.push(parse_complex(inner)?);
            }
        }
    }

    Ok(list)
}

fn parse_complex(pair: Pair<Rule>) -> Result<ComplexSelector, ParseError> {
    let mut steps = Vec::new();
    let mut pending = Combinator::Descendant;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::child => pending = Combinator::Child,
            Rule::descendant => pending = Combinator::Descendant,
            Rule::compound => {
                steps.push(Step {
                    combinator: pending,
                    compound: parse_compound(inner)?,
                });
                pending = Combinator::Descendant;
            }
            other => return Err(ParseError::UnknownRule(other)),
        }
    }

    Ok(ComplexSelector { steps })
}

fn parse_compound(pair: Pair<Rule>) -> Result<Compound, ParseError> {
    let mut compound = Compound::default();

    for inner in pair.into_inner() {
        let condition = match inner.as_rule() {
            Rule::universal => continue,
            Rule::type_sel => {
                compound.tag = Some(inner.as_str().to_ascii_lowercase());
                continue;
            }
            Rule::id_sel => Condition::Id(first_inner_str(inner)),
            Rule::class_sel => Condition::Class(first_inner_str(inner)),
            Rule::attr_sel => parse_attribute(inner)?,
            Rule::nth_of_type => Condition::NthOfType(parse_position(inner)?),
            Rule::nth_child => Condition::NthChild(parse_position(inner)?),
            Rule::first_child => Condition::FirstChild,
            Rule::last_child => Condition::LastChild,
            Rule::has_text => {
                let text = inner
                    .into_inner()
                    .next()
                    .map(|p| unescape(p.as_str()))
                    .unwrap_or_default();
                Condition::HasText(text)
            }
            other => return Err(ParseError::UnknownRule(other)),
        };
        compound.conditions.push(condition);
    }

    Ok(compound)
}

fn parse_attribute(pair: Pair<Rule>) -> Result<Condition, ParseError> {
    let mut name = String::new();
    let mut op = None;
    let mut value = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::attr_name => name = inner.as_str().to_ascii_lowercase(),
            Rule::attr_op => {
                op = Some(match inner.as_str() {
                    "~=" => AttrOp::Includes,
                    "^=" => AttrOp::Prefix,
                    "$=" => AttrOp::Suffix,
                    "*=" => AttrOp::Substring,
                    "|=" => AttrOp::DashMatch,
                    _ => AttrOp::Equals,
                })
            }
            Rule::dq_inner | Rule::sq_inner => value = Some(unescape(inner.as_str())),
            Rule::bare_value => value = Some(inner.as_str().to_string()),
            other => return Err(ParseError::UnknownRule(other)),
        }
    }

    let test = match (op, value) {
        (Some(op), Some(value)) => Some((op, value)),
        _ => None,
    };
    Ok(Condition::Attribute { name, test })
}

fn parse_position(pair: Pair<Rule>) -> Result<usize, ParseError> {
    let raw = pair
        .into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default();
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::InvalidPosition(raw)),
    }
}

fn first_inner_str(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

/// Drops backslash escapes inside a quoted selector string.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compound_path() {
        let list = parse("body > ul.menu li:nth-of-type(3)").unwrap();
        assert_eq!(list.selectors.len(), 1);
        let steps = &list.selectors[0].steps;
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[1].combinator, Combinator::Child);
        assert_eq!(steps[1].compound.tag.as_deref(), Some("ul"));
        assert_eq!(
            steps[1].compound.conditions,
            vec![Condition::Class("menu".into())]
        );
        assert_eq!(steps[2].combinator, Combinator::Descendant);
        assert_eq!(steps[2].compound.conditions, vec![Condition::NthOfType(3)]);
    }

    #[test]
    fn test_parse_attribute_forms() {
        let list = parse(r#"[data-testid="save \"draft\""], input[name=email], [disabled]"#)
            .unwrap();
        assert_eq!(list.selectors.len(), 3);
        assert_eq!(
            list.selectors[0].steps[0].compound.conditions[0],
            Condition::Attribute {
                name: "data-testid".into(),
                test: Some((AttrOp::Equals, "save \"draft\"".into())),
            }
        );
        assert_eq!(
            list.selectors[2].steps[0].compound.conditions[0],
            Condition::Attribute {
                name: "disabled".into(),
                test: None,
            }
        );
    }

    #[test]
    fn test_parse_has_text() {
        let list = parse("button:has-text('Save changes')").unwrap();
        let compound = &list.selectors[0].steps[0].compound;
        assert_eq!(compound.tag.as_deref(), Some("button"));
        assert_eq!(
            compound.conditions,
            vec![Condition::HasText("Save changes".into())]
        );
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(parse("").is_err());
        assert!(parse("div >").is_err());
        assert!(parse("[unclosed").is_err());
        assert!(matches!(
            parse("li:nth-of-type(0)"),
            Err(ParseError::InvalidPosition(_))
        ));
    }
}
