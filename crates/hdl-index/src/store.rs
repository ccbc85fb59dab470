//! Reading and editing the `values` array of a handle record.

use std::collections::BTreeMap;

use hdl_doc::{Node, PathSegment};
use tracing::debug;

use crate::entry::{
    entry_node, Entry, EntryUpdate, IndexTemplate, DATA_KEY, INDEX_KEY, STRING_FORMAT, TYPE_KEY,
    VALUE_KEY,
};
use crate::error::{IndexError, IndexResult, ViolationKind, Violations};

/// Key of the entry array in a record document.
pub const VALUES_KEY: &str = "values";

/// Returned by [`extract_value_by_type`] for object values.
pub const OBJECT_SENTINEL: &str = "[OBJECT]";

/// Returned by [`extract_value_by_type`] for array values.
pub const ARRAY_SENTINEL: &str = "[ARRAY]";

/// Predicate accepting paths below `values/<i>` whose entry has the type.
fn entry_type_is(entry_type: &str) -> impl Fn(&Node, &[PathSegment]) -> bool + '_ {
    move |root, path| {
        path.len() >= 2
            && root
                .at(&path[..2])
                .and_then(|entry| entry.get(TYPE_KEY))
                .and_then(Node::as_str)
                == Some(entry_type)
    }
}

/// The entry array of a record document.
pub fn entry_array(doc: &Node) -> IndexResult<&Vec<Node>> {
    let Some(top) = doc.as_object() else {
        return Err(IndexError::single(
            ViolationKind::NotAnObject,
            format!("expected object, given {}", doc.type_name()),
        ));
    };
    let Some(values) = top.get(VALUES_KEY) else {
        return Err(IndexError::single(
            ViolationKind::MissingValues,
            "values not found in top level object",
        ));
    };
    values.as_array().ok_or_else(|| {
        IndexError::single(
            ViolationKind::ValuesNotArray,
            format!("invalid type {} expected Array", values.type_name()),
        )
    })
}

/// Every entry index in document order.
///
/// Fails with a validation error that lists every malformed entry and every
/// duplicate index, not just the first one found.
pub fn get_indices(doc: &Node) -> IndexResult<Vec<i64>> {
    let array = entry_array(doc)?;
    let mut violations = Violations::default();
    let mut first_seen: BTreeMap<i64, usize> = BTreeMap::new();
    let mut indices = Vec::with_capacity(array.len());

    for (position, entry) in array.iter().enumerate() {
        let Some(members) = entry.as_object() else {
            violations.push(
                position,
                ViolationKind::EntryNotObject,
                format!("expected a object, given {}", entry.type_name()),
            );
            continue;
        };
        match members.get(INDEX_KEY) {
            None => violations.push(
                position,
                ViolationKind::MissingIndex,
                format!("missing key '{INDEX_KEY}'"),
            ),
            Some(Node::Int(index)) => {
                if let Some(first) = first_seen.get(index) {
                    violations.push(
                        position,
                        ViolationKind::DuplicateIndex,
                        format!("duplicate index {index}: already used by entry {first}"),
                    );
                } else {
                    first_seen.insert(*index, position);
                    indices.push(*index);
                }
            }
            Some(_) => violations.push(
                position,
                ViolationKind::IndexNotInteger,
                format!("key '{INDEX_KEY}' must be an integer"),
            ),
        }
    }

    violations.into_result()?;
    Ok(indices)
}

/// Integer indices of a document, skipping anything that is not one.
///
/// Used to seed allocators after placeholder entries have been appended.
pub fn used_indices(doc: &Node) -> Vec<i64> {
    let mut indices = Vec::new();
    doc.for_each("values/*/index", |_, node| {
        if let Some(i) = node.as_i64() {
            indices.push(i);
        }
    });
    indices
}

/// Fail when two entries share a type. Lists every duplicate.
pub fn check_unique_types(doc: &Node) -> IndexResult<()> {
    let array = entry_array(doc)?;
    let mut violations = Violations::default();
    let mut first_seen: BTreeMap<&str, usize> = BTreeMap::new();
    for (position, entry) in array.iter().enumerate() {
        let Some(entry_type) = entry.get(TYPE_KEY).and_then(Node::as_str) else {
            continue;
        };
        if let Some(first) = first_seen.get(entry_type) {
            violations.push(
                position,
                ViolationKind::DuplicateType,
                format!("duplicate type {entry_type}: already used by entry {first}"),
            );
        } else {
            first_seen.insert(entry_type, position);
        }
    }
    violations.into_result()
}

/// Typed view of every entry, after validating the indices.
pub fn entries(doc: &Node) -> IndexResult<Vec<Entry>> {
    get_indices(doc)?;
    Ok(entry_array(doc)?.iter().filter_map(Entry::from_node).collect())
}

/// The entry of a type, or `None` if the document has no such entry.
///
/// When several entries share the type, the last one wins.
pub fn get_entry_by_type<'a>(doc: &'a Node, entry_type: &str) -> IndexResult<Option<&'a Node>> {
    Ok(entry_array(doc)?
        .iter()
        .rev()
        .find(|entry| entry.get(TYPE_KEY).and_then(Node::as_str) == Some(entry_type)))
}

fn entry_value(entry: &Node) -> Option<&Node> {
    match entry.get(DATA_KEY) {
        Some(data) => data.get(VALUE_KEY),
        None => entry.get(VALUE_KEY),
    }
}

/// Upsert or remove the entry of a type.
///
/// - `Remove` deletes every entry of the type and returns the freed index,
///   or `None` when nothing matched.
/// - `Set` / `SetWithFormat` overwrite the value of an existing entry,
///   keeping its index and type, or append a new entry with `index`.
///
/// Upserts always return `None`.
pub fn update_entry(
    doc: &mut Node,
    entry_type: &str,
    update: EntryUpdate,
    index: IndexTemplate,
) -> IndexResult<Option<i64>> {
    let existing = get_entry_by_type(doc, entry_type)?;
    let existing_index = existing.and_then(|e| e.get(INDEX_KEY)).and_then(Node::as_i64);
    let exists = existing.is_some();

    let (format, value) = match update {
        EntryUpdate::Remove => {
            if !exists {
                return Ok(None);
            }
            let removed = doc.remove("values/*", entry_type_is(entry_type));
            debug!(entry_type, index = ?existing_index, removed, "removed entry");
            return Ok(existing_index);
        }
        EntryUpdate::Set(value) => (STRING_FORMAT.to_string(), value),
        EntryUpdate::SetWithFormat { format, value } => (format, value),
    };

    if exists {
        overwrite_value(doc, entry_type, value)?;
    } else {
        let entry = entry_node(index.to_node(), entry_type, &format, value);
        doc.update("values/#", entry, |_, _| true)?;
    }
    Ok(None)
}

/// Write `value` into every entry of the type. Other entries are never
/// visited.
fn overwrite_value(doc: &mut Node, entry_type: &str, value: Node) -> IndexResult<()> {
    let is_type = entry_type_is(entry_type);
    let targets: Vec<Vec<PathSegment>> = {
        let root: &Node = doc;
        root.matches("values/*")
            .into_iter()
            .filter(|path| is_type(root, &path[..]))
            .collect()
    };

    let mut violations = Violations::default();
    for path in &targets {
        if let Some(data) = doc.at(path).and_then(|entry| entry.get(DATA_KEY)) {
            if data.as_object().is_none() {
                let position = match path.last() {
                    Some(PathSegment::Index(i)) => *i,
                    _ => 0,
                };
                violations.push(
                    position,
                    ViolationKind::DataNotObject,
                    format!("key '{DATA_KEY}' must be an object, given {}", data.type_name()),
                );
            }
        }
    }
    violations.into_result()?;

    for path in &targets {
        let Some(entry) = doc.at_mut(path).and_then(Node::as_object_mut) else {
            continue;
        };
        match entry.get_mut(DATA_KEY).and_then(Node::as_object_mut) {
            Some(data) => {
                data.insert(VALUE_KEY.to_string(), value.clone());
            }
            // Flat entries without a data wrapper.
            None => {
                entry.insert(VALUE_KEY.to_string(), value.clone());
            }
        }
    }
    Ok(())
}

/// Stringified value of the entry of a type.
///
/// Composite values yield [`OBJECT_SENTINEL`] or [`ARRAY_SENTINEL`]; a
/// missing entry yields an empty string.
pub fn extract_value_by_type(doc: &Node, entry_type: &str) -> IndexResult<String> {
    let value = get_entry_by_type(doc, entry_type)?.and_then(entry_value);
    Ok(match value {
        None => String::new(),
        Some(Node::Object(_)) => OBJECT_SENTINEL.to_string(),
        Some(Node::Array(_)) => ARRAY_SENTINEL.to_string(),
        Some(scalar) => scalar.scalar_string().unwrap_or_default(),
    })
}
