use thiserror::Error;

/// A selector string that the tree collaborator could not parse or evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid selector '{selector}': {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

impl SelectorError {
    pub fn new(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            reason: reason.into(),
        }
    }
}
