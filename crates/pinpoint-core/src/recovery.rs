//! Re-identifying a recorded element in a changed document.
//!
//! Candidates are rebuilt from what the recorder captured, each is checked
//! against the current tree, and the ranking favors selectors that land on a
//! single element (or a single element at the recorded position).

use crate::config::RecoveryConfig;
use crate::context::{collapse_whitespace, is_hidden};
use crate::resolution::css;
use pinpoint_common::protocol::{ElementHandle, RecordedElement, Rect};
use pinpoint_common::tree::DomTree;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::{debug, info};

static FRAMEWORK_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(cdk|ng|mat)-").unwrap());
static INLINE_CSS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\w+\{[^}]+\}").unwrap());
static NTH_OF_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":nth-of-type\(\d+\)").unwrap());
static HEADERISH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)columnheader|grid|header").unwrap());
static HAS_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#":has-text\(".*?"\)"#).unwrap());
static CLASS_QUALIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[A-Za-z0-9_-]+").unwrap());

/// Classes shorter than this are too generic to pair with text.
const PROMINENT_CLASS_MIN_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecoverySource {
    Id,
    Class,
    HasTextCombo,
    HasText,
    DomPath,
}

impl RecoverySource {
    pub fn base_score(&self) -> i32 {
        match self {
            RecoverySource::Id => 100,
            RecoverySource::HasTextCombo => 85,
            RecoverySource::Class => 80,
            RecoverySource::HasText => 60,
            RecoverySource::DomPath => 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum MatchStatus {
    NoMatch,
    /// Exactly one visible, enabled match.
    Unique,
    NotVisible,
    Disabled,
    /// An id candidate whose single match sits away from the recorded box.
    BoundingBoxMismatch,
    /// Several matches, one of which overlaps the recorded box.
    MultipleResolved { index: usize },
    Multiple,
    /// The tree could not evaluate the selector.
    Invalid,
}

impl MatchStatus {
    pub fn is_replayable(&self) -> bool {
        matches!(self, MatchStatus::Unique | MatchStatus::MultipleResolved { .. })
    }

    pub fn score_adjustment(&self) -> i32 {
        match self {
            MatchStatus::Unique => 20,
            MatchStatus::MultipleResolved { .. } => 10,
            MatchStatus::BoundingBoxMismatch => -15,
            MatchStatus::Multiple => -10,
            MatchStatus::NoMatch | MatchStatus::Invalid => -20,
            MatchStatus::NotVisible | MatchStatus::Disabled => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryCandidate {
    pub selector: String,
    pub source: RecoverySource,
    pub score: i32,
    #[serde(flatten)]
    pub status: MatchStatus,
    pub replayable: bool,
}

/// Candidate selectors for a recorded element, deduplicated, before any
/// validation.
pub fn recovery_selectors(recorded: &RecordedElement) -> Vec<(RecoverySource, String)> {
    let tag = recorded.tag_name.trim().to_ascii_lowercase();
    let mut out: Vec<(RecoverySource, String)> = Vec::new();
    let mut push = |source: RecoverySource, selector: String| {
        if !selector.is_empty() && !out.iter().any(|(_, s)| *s == selector) {
            out.push((source, selector));
        }
    };

    if let Some(id) = recorded.attributes.get("id")
        && css::is_css_identifier(id)
    {
        push(RecoverySource::Id, css::id(id));
    }

    let stable_classes: Vec<&str> = recorded
        .class_list
        .iter()
        .map(String::as_str)
        .filter(|c| !FRAMEWORK_CLASS_RE.is_match(c) && css::is_css_identifier(c))
        .collect();
    if !tag.is_empty() && !stable_classes.is_empty() {
        push(
            RecoverySource::Class,
            format!("{}.{}", tag, stable_classes.join(".")),
        );
    }

    let text = recorded
        .element_text
        .as_deref()
        .map(|t| collapse_whitespace(&INLINE_CSS_RE.replace_all(t, "")))
        .unwrap_or_default();
    if !text.is_empty() && !tag.is_empty() {
        if let Some(prominent) = stable_classes
            .iter()
            .find(|c| c.chars().count() >= PROMINENT_CLASS_MIN_LEN)
        {
            push(
                RecoverySource::HasTextCombo,
                css::has_text(&format!("{}.{}", tag, prominent), &text),
            );
        }
        push(RecoverySource::HasText, css::has_text(&tag, &text));
    }

    if let Some(path) = recorded.selector.as_deref().map(str::trim) {
        push(RecoverySource::DomPath, path.to_string());
    }

    out
}

/// How `selector` fares against the current tree.
pub fn analyze_match<T: DomTree + ?Sized>(
    tree: &T,
    selector: &str,
    source: RecoverySource,
    recorded_box: Option<&Rect>,
    config: &RecoveryConfig,
) -> MatchStatus {
    let found = match tree.query_all(None, selector) {
        Ok(found) => found,
        Err(e) => {
            debug!(error = %e, "recovery selector rejected");
            return MatchStatus::Invalid;
        }
    };

    match found.as_slice() {
        [] => MatchStatus::NoMatch,
        [single] => {
            if is_hidden(tree, *single) {
                return MatchStatus::NotVisible;
            }
            if tree.attribute(*single, "disabled").is_some() {
                return MatchStatus::Disabled;
            }
            if source == RecoverySource::Id
                && let (Some(expected), Some(actual)) = (recorded_box, tree.bounding_rect(*single))
                && actual.overlap_ratio(expected) < config.bbox_overlap_threshold
            {
                return MatchStatus::BoundingBoxMismatch;
            }
            MatchStatus::Unique
        }
        many => {
            let Some(expected) = recorded_box else {
                return MatchStatus::Multiple;
            };
            let mut best: Option<(usize, f32)> = None;
            for (idx, el) in many.iter().enumerate() {
                let Some(rect) = tree.bounding_rect(*el) else {
                    continue;
                };
                let overlap = rect.overlap_ratio(expected);
                if best.is_none_or(|(_, score)| overlap > score) {
                    best = Some((idx, overlap));
                }
            }
            match best {
                Some((index, score)) if score > config.bbox_overlap_threshold => {
                    MatchStatus::MultipleResolved { index }
                }
                _ => MatchStatus::Multiple,
            }
        }
    }
}

/// Validated candidates, replayable first, then by score.
pub fn recover<T: DomTree + ?Sized>(
    tree: &T,
    recorded: &RecordedElement,
    config: &RecoveryConfig,
) -> Vec<RecoveryCandidate> {
    let mut candidates: Vec<RecoveryCandidate> = recovery_selectors(recorded)
        .into_iter()
        .map(|(source, selector)| {
            let status = analyze_match(
                tree,
                &selector,
                source,
                recorded.bounding_box.as_ref(),
                config,
            );
            RecoveryCandidate {
                score: source.base_score() + status.score_adjustment(),
                replayable: status.is_replayable(),
                selector,
                source,
                status,
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.replayable
            .cmp(&a.replayable)
            .then_with(|| b.score.cmp(&a.score))
    });

    match candidates.first() {
        Some(top) if top.replayable => {
            info!(selector = %top.selector, score = top.score, "recovered selector")
        }
        _ => info!(candidates = candidates.len(), "no replayable selector"),
    }
    candidates
}

/// The element the first replayable candidate points at.
pub fn best_match<T: DomTree + ?Sized>(
    tree: &T,
    candidates: &[RecoveryCandidate],
) -> Option<ElementHandle> {
    let top = candidates.iter().find(|c| c.replayable)?;
    let found = tree.query_all(None, &top.selector).ok()?;
    let index = match top.status {
        MatchStatus::MultipleResolved { index } => index,
        _ => 0,
    };
    found.get(index).copied()
}

/// A looser variant of a selector that failed to match: position qualifiers
/// dropped, header text lookups widened to any column header, otherwise the
/// first two class qualifiers removed.
pub fn loosen_selector(selector: &str) -> String {
    let selector = NTH_OF_TYPE_RE.replace_all(selector, "");

    if selector.contains(":has-text")
        && HEADERISH_RE.is_match(&selector)
        && let Some(text) = HAS_TEXT_RE.find(&selector)
    {
        return format!(r#"[role="columnheader"]{}"#, text.as_str());
    }

    CLASS_QUALIFIER_RE
        .replacen(&selector, 2, "")
        .trim()
        .to_string()
}
