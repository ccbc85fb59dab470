use hdl_doc::DocError;
use hdl_index::IndexError;

/// Errors produced by profile loading and reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// An ad hoc key names a type the profile manages.
    #[error("indices defined in the profile cannot be overwritten: {key}")]
    DuplicateKey { key: String },

    /// A profile file is malformed. Carries every problem found.
    #[error("invalid profile: {}", .0.join("; "))]
    InvalidProfile(Vec<String>),

    /// The record document failed validation or allocation.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// A profile file is not valid JSON.
    #[error(transparent)]
    Doc(#[from] DocError),
}

/// Convenience alias for profile results.
pub type ProfileResult<T> = Result<T, ProfileError>;
