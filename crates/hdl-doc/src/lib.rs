//! Document tree for handle records.
//!
//! Handle records travel as JSON documents. This crate provides the in-memory
//! representation every other crate works on: a tagged-union [`Node`] whose
//! objects keep insertion order, plus a small path-query language for
//! finding, updating and removing nodes.
//!
//! # Key Types
//!
//! - [`Node`] -- Null / Bool / Int / Float / String / Array / Object
//! - [`Object`] -- insertion-ordered map used for object nodes
//! - [`PathSegment`] -- one step of a concrete path handed to predicates
//!
//! # Paths
//!
//! Paths are `/`-separated. A literal segment selects an object key or an
//! array position, `*` selects every child and `#` (update only) appends to
//! an array. `"values/*/type"` therefore visits the `type` of every entry.

pub mod error;
pub mod node;
pub mod path;

pub use error::{DocError, DocResult};
pub use node::{Node, Object};
pub use path::PathSegment;
