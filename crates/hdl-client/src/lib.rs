//! Handle server collaborators and the object-level client built on them.
//!
//! The remote handle server and its reverse-lookup index are modelled as
//! the [`HandleClient`] and [`ReverseLookupClient`] traits. No transport is
//! implemented here; [`InMemoryHandleServer`] implements both for tests and
//! embedding. [`ObjectHandleClient`] keeps the record of a storage object in
//! line with a profile: it finds the record by the object's URL, reconciles
//! it locally and pushes the result back.
//!
//! # Key Types
//!
//! - [`HandleResult`] -- outcome of one remote call, with the handle response code
//! - [`HandleClient`] / [`ReverseLookupClient`] -- remote collaborator boundaries
//! - [`InMemoryHandleServer`] -- in-memory implementation of both
//! - [`ObjectHandleClient`] / [`ObjectConfig`] -- create, move, remove, get, set, unset

pub mod error;
pub mod memory;
pub mod object;
pub mod path;
pub mod result;
pub mod traits;

pub use error::{ClientError, ClientResult};
pub use memory::InMemoryHandleServer;
pub use object::{ObjectConfig, ObjectHandleClient};
pub use path::join_path;
pub use result::{response_code_description, HandleResult};
pub use traits::{HandleClient, ReverseLookupClient};
