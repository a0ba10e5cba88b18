//! In-memory document tree for offline resolution: HTML and snapshot
//! loading plus a selector engine covering the forms the resolver emits.

mod document;
mod html;
pub mod selector;
mod snapshot;

pub use document::Document;
pub use html::decode_entities;
pub use snapshot::SnapshotError;
