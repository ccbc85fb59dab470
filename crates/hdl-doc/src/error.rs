//! Error types for the document crate.

/// Errors that can occur while parsing or editing a document.
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    /// The input was not valid JSON.
    #[error("json parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A path could not be applied to the document shape.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl DocError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for document results.
pub type DocResult<T> = Result<T, DocError>;
