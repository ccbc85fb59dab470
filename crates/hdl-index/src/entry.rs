//! Typed view of a single record entry and the commands that change one.

use hdl_doc::Node;
use serde::{Deserialize, Serialize};

use crate::expand::INDEX_PLACEHOLDER;

pub(crate) const INDEX_KEY: &str = "index";
pub(crate) const TYPE_KEY: &str = "type";
pub(crate) const DATA_KEY: &str = "data";
pub(crate) const FORMAT_KEY: &str = "format";
pub(crate) const VALUE_KEY: &str = "value";

/// Format written for plain entries.
pub const STRING_FORMAT: &str = "string";

/// Index to give an entry when it is inserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexTemplate {
    /// A fixed index, e.g. the administrative entry's `100`.
    Literal(i64),
    /// Left as the `{INDEX}` placeholder and resolved later by an allocator.
    Allocate,
}

impl IndexTemplate {
    pub fn to_node(self) -> Node {
        match self {
            IndexTemplate::Literal(i) => Node::Int(i),
            IndexTemplate::Allocate => Node::from(INDEX_PLACEHOLDER),
        }
    }

    /// Read an `index` member. Only integers and the exact placeholder qualify.
    pub fn from_node(node: &Node) -> Option<Self> {
        match node {
            Node::Int(i) => Some(IndexTemplate::Literal(*i)),
            Node::String(s) if s == INDEX_PLACEHOLDER => Some(IndexTemplate::Allocate),
            _ => None,
        }
    }

    pub fn literal(self) -> Option<i64> {
        match self {
            IndexTemplate::Literal(i) => Some(i),
            IndexTemplate::Allocate => None,
        }
    }
}

/// What [`update_entry`](crate::update_entry) does with the entry of a type.
#[derive(Clone, Debug, PartialEq)]
pub enum EntryUpdate {
    /// Upsert a plain entry. New entries get the `string` format.
    Set(Node),
    /// Upsert with an explicit format. An existing entry keeps its own
    /// format; only the value is overwritten.
    SetWithFormat { format: String, value: Node },
    /// Delete every entry of the type.
    Remove,
}

impl EntryUpdate {
    pub fn set(value: impl Into<Node>) -> Self {
        EntryUpdate::Set(value.into())
    }
}

/// One `{index, type, data: {format, value}}` entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub index: i64,
    pub entry_type: String,
    pub format: String,
    pub value: Node,
}

impl Entry {
    pub fn new(index: i64, entry_type: impl Into<String>, value: impl Into<Node>) -> Self {
        Self {
            index,
            entry_type: entry_type.into(),
            format: STRING_FORMAT.to_string(),
            value: value.into(),
        }
    }

    /// Read an entry node. Accepts both the `data`-wrapped shape and the
    /// older flat `{index, type, value}` shape. Returns `None` when the index
    /// is not an integer or the type is not a string.
    pub fn from_node(node: &Node) -> Option<Self> {
        let index = node.get(INDEX_KEY)?.as_i64()?;
        let entry_type = node.get(TYPE_KEY)?.as_str()?.to_string();
        let (format, value) = match node.get(DATA_KEY) {
            Some(data) => (
                data.get(FORMAT_KEY)
                    .and_then(Node::as_str)
                    .unwrap_or(STRING_FORMAT)
                    .to_string(),
                data.get(VALUE_KEY).cloned().unwrap_or_default(),
            ),
            None => (
                STRING_FORMAT.to_string(),
                node.get(VALUE_KEY).cloned().unwrap_or_default(),
            ),
        };
        Some(Self {
            index,
            entry_type,
            format,
            value,
        })
    }

    pub fn to_node(&self) -> Node {
        entry_node(
            Node::Int(self.index),
            &self.entry_type,
            &self.format,
            self.value.clone(),
        )
    }
}

/// Build an entry node with members in the canonical order.
pub fn entry_node(index: Node, entry_type: &str, format: &str, value: Node) -> Node {
    Node::object([
        (INDEX_KEY, index),
        (TYPE_KEY, Node::from(entry_type)),
        (
            DATA_KEY,
            Node::object([(FORMAT_KEY, Node::from(format)), (VALUE_KEY, value)]),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_in_canonical_order() {
        let e = Entry::new(3, "URL", "http://x");
        assert_eq!(
            e.to_node().to_json(),
            r#"{"index":3,"type":"URL","data":{"format":"string","value":"http://x"}}"#
        );
    }

    #[test]
    fn entry_reads_flat_legacy_shape() {
        let node = Node::parse_json(r#"{"index":4,"type":"K","value":"v"}"#).unwrap();
        let e = Entry::from_node(&node).unwrap();
        assert_eq!(e.index, 4);
        assert_eq!(e.entry_type, "K");
        assert_eq!(e.format, "string");
        assert_eq!(e.value, Node::from("v"));
    }

    #[test]
    fn entry_keeps_admin_format() {
        let node = Node::parse_json(
            r#"{"index":100,"type":"HS_ADMIN","data":{"format":"admin","value":{"handle":"0.NA/21.T1","index":200}}}"#,
        )
        .unwrap();
        let e = Entry::from_node(&node).unwrap();
        assert_eq!(e.format, "admin");
        assert_eq!(e.to_node(), node);
    }

    #[test]
    fn entry_with_placeholder_index_is_not_typed() {
        let node = entry_node(IndexTemplate::Allocate.to_node(), "K", "string", Node::from("v"));
        assert!(Entry::from_node(&node).is_none());
    }

    #[test]
    fn index_template_from_node() {
        assert_eq!(IndexTemplate::from_node(&Node::from(7)), Some(IndexTemplate::Literal(7)));
        assert_eq!(IndexTemplate::from_node(&Node::from("{INDEX}")), Some(IndexTemplate::Allocate));
        assert_eq!(IndexTemplate::from_node(&Node::from("{INDEX} ")), None);
        assert_eq!(IndexTemplate::from_node(&Node::from(1.0)), None);
    }
}
