use hdl_index::IndexError;
use hdl_profile::ProfileError;

/// Errors produced by the object-level handle client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The object already has a record.
    #[error("object with url already exists: {url}")]
    AlreadyExists { url: String },

    /// No record points at the object.
    #[error("could not find PID for url {url}")]
    NotFound { url: String },

    /// The server answered a call with a failure response code.
    #[error("{operation} of {handle} failed with code {code} ({description})")]
    Remote {
        operation: &'static str,
        handle: String,
        code: i64,
        description: &'static str,
    },

    /// The record was reconciled locally but the freed indices could not be
    /// deleted on the server, so local and remote state now differ.
    #[error("failed to remove unused indices {indices:?} from {handle}")]
    RemoteDeleteFailed { handle: String, indices: Vec<i64> },

    /// A lookup value could not be turned into a pattern.
    #[error("invalid lookup pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Reconciling the record against the profile failed.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// The record document is malformed.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;
