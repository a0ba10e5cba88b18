//! Selector resolution and grid schema inference over any [`DomTree`].
//!
//! [`DomTree`]: pinpoint_common::tree::DomTree

pub mod config;
pub mod context;
pub mod grid;
pub mod recovery;
pub mod resolution;

pub use config::{ConfigError, ConfigLoader, PinpointConfig};
pub use grid::{PickSession, discover_grids, extract_rows, infer_column_type, infer_grid_schema};
pub use recovery::{MatchStatus, RecoveryCandidate, best_match, loosen_selector, recover};
pub use resolution::ResolutionEngine;
