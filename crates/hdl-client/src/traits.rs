use hdl_doc::Node;

use crate::error::ClientResult;
use crate::result::HandleResult;

/// Remote handle server.
///
/// Implementations return `Err` only when the call could not be made at
/// all. A call the server rejected comes back as a [`HandleResult`] with
/// `success == false` and the server's response code.
pub trait HandleClient: Send + Sync {
    /// Register a new record under `prefix`. The server picks the suffix.
    fn create(&self, prefix: &str, doc: &Node) -> ClientResult<HandleResult>;

    /// Fetch a record. `data` holds the record document on success.
    fn get(&self, handle: &str) -> ClientResult<HandleResult>;

    /// Write the entries of `doc` into an existing record. Entries are
    /// matched by index; indices the record does not have yet are added.
    fn update(&self, handle: &str, doc: &Node) -> ClientResult<HandleResult>;

    /// Delete the entries with the given indices.
    fn remove_indices(&self, handle: &str, indices: &[i64]) -> ClientResult<HandleResult>;

    /// Delete a whole record.
    fn remove(&self, handle: &str) -> ClientResult<HandleResult>;
}

/// Reverse lookup from entry values to handles.
pub trait ReverseLookupClient: Send + Sync {
    /// Handles whose entries match every `(type, value)` pair. Values may
    /// contain `*` wildcards.
    fn lookup(&self, query: &[(String, String)]) -> ClientResult<Vec<String>>;
}
