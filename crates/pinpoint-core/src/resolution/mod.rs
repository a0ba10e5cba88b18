//! Selector resolution: from an element handle to ranked, re-resolvable
//! selector strings.

pub mod anchor;
pub mod css;
pub mod engine;
pub mod generator;
pub mod path;
pub mod validation;

pub use engine::ResolutionEngine;
pub use generator::looks_generated;
pub use path::{StructuralPath, build_structural_path};
pub use validation::{count_matches, find_matches, is_unique_match};
