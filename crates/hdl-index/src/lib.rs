//! Entry indices for handle records.
//!
//! A handle record is a document whose `values` array holds typed entries,
//! each addressed by a unique integer index. This crate owns everything that
//! touches that array directly: allocating free indices, reading and
//! upserting entries by type, and expanding the `{NAME}` / `{INDEX}`
//! placeholders left behind by templates.
//!
//! # Key Types
//!
//! - [`IndexAllocator`] / [`IndexRange`] -- first-fit allocation in `[min, max)`
//! - [`Entry`] / [`EntryUpdate`] / [`IndexTemplate`] -- typed view and upsert commands
//! - [`Substitutions`] -- ordered `{NAME}` to value replacement map
//! - [`Violations`] -- every structural problem found in an entry array
//!
//! All operations are synchronous and work on a single in-memory document.
//! An allocator is built for one mutation and dropped afterwards.

pub mod allocator;
pub mod entry;
pub mod error;
pub mod expand;
pub mod store;

pub use allocator::{IndexAllocator, IndexRange, ADMIN_INDEX};
pub use entry::{entry_node, Entry, EntryUpdate, IndexTemplate, STRING_FORMAT};
pub use error::{IndexError, IndexResult, Violation, ViolationKind, Violations};
pub use expand::{expand_placeholders, substitute, Substitutions, INDEX_PLACEHOLDER};
pub use store::{
    check_unique_types, entries, entry_array, extract_value_by_type, get_entry_by_type,
    get_indices, update_entry, used_indices, ARRAY_SENTINEL, OBJECT_SENTINEL, VALUES_KEY,
};
