pub mod error;
pub mod formatter;
pub mod protocol;
pub mod tree;

pub use error::SelectorError;
pub use tree::DomTree;
