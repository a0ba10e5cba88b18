use crate::config::SelectorConfig;
use crate::context::read_context;
use crate::resolution::anchor::find_anchor;
use crate::resolution::generator::generate_candidates;
use crate::resolution::path::build_structural_path;
use crate::resolution::validation::is_unique_match;

use pinpoint_common::protocol::{
    ElementHandle, SelectorCandidate, SelectorResult, SelectorStrategy,
};
use pinpoint_common::tree::DomTree;
use tracing::debug;

/// Confidence of a structural path that never became unique.
pub const AMBIGUOUS_PATH_CONFIDENCE: i32 = 10;

pub struct ResolutionEngine;

impl ResolutionEngine {
    /// Ranked selectors for `target`, most stable first. Empty for handles
    /// that are detached or do not name an element.
    pub fn resolve_selector<T: DomTree + ?Sized>(
        tree: &T,
        target: ElementHandle,
        config: &SelectorConfig,
    ) -> SelectorResult {
        if tree.tag_name(target).is_none() || !tree.is_attached(target) {
            debug!(handle = target.index(), "target is not an attached element");
            return SelectorResult::empty();
        }

        let anchor = find_anchor(tree, target, config);
        let ctx = read_context(tree, anchor, config);

        let mut candidates: Vec<SelectorCandidate> = Vec::new();
        for mut candidate in generate_candidates(tree, anchor, &ctx, config) {
            if !is_unique_match(tree, &candidate.selector, anchor) {
                candidate.confidence /= 4;
                debug!(
                    selector = %candidate.selector,
                    confidence = candidate.confidence,
                    "demoted ambiguous candidate"
                );
            }
            Self::push_unique(&mut candidates, candidate);
        }

        let path = build_structural_path(tree, anchor, config);
        if !path.selector.is_empty() {
            let confidence = if path.unique {
                SelectorStrategy::StructuralPath.base_confidence()
            } else {
                debug!(selector = %path.selector, "no unique structural path");
                AMBIGUOUS_PATH_CONFIDENCE
            };
            Self::push_unique(
                &mut candidates,
                SelectorCandidate::new(SelectorStrategy::StructuralPath, path.selector, confidence),
            );
        }

        SelectorResult::from_candidates(candidates)
    }

    /// Primary selector string, or empty when nothing could be resolved.
    pub fn resolve_selector_string<T: DomTree + ?Sized>(
        tree: &T,
        target: ElementHandle,
        config: &SelectorConfig,
    ) -> String {
        Self::resolve_selector(tree, target, config)
            .primary_selector()
            .to_string()
    }

    fn push_unique(candidates: &mut Vec<SelectorCandidate>, candidate: SelectorCandidate) {
        if !candidates.iter().any(|c| c.selector == candidate.selector) {
            candidates.push(candidate);
        }
    }
}
