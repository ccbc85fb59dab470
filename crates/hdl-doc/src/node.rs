//! The tagged-union document node.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DocResult;

/// Insertion-ordered map backing object nodes.
pub type Object = IndexMap<String, Node>;

/// A JSON-shaped document node.
///
/// Integers and floats are kept apart so that entry indices never round-trip
/// through a floating point representation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Node>),
    Object(Object),
}

impl Node {
    /// Build an object node from key/value pairs, keeping their order.
    pub fn object<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node)>,
    {
        Node::Object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build an array node.
    pub fn array(items: impl IntoIterator<Item = Node>) -> Self {
        Node::Array(items.into_iter().collect())
    }

    /// Parse a JSON document.
    pub fn parse_json(text: &str) -> DocResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Compact JSON text.
    pub fn to_json(&self) -> String {
        // Serializing a tree of plain values into a String cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Indented JSON text.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Null => "Null",
            Node::Bool(_) => "Boolean",
            Node::Int(_) => "Integer",
            Node::Float(_) => "Float",
            Node::String(_) => "String",
            Node::Array(_) => "Array",
            Node::Object(_) => "Object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Node::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Node::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Member lookup on an object node. `None` for other variants.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_object().and_then(|o| o.get(key))
    }

    /// Stringify a scalar the way the JSON writer prints it, except that
    /// strings are returned without quotes. Composite nodes yield `None`.
    pub fn scalar_string(&self) -> Option<String> {
        match self {
            Node::String(s) => Some(s.clone()),
            Node::Array(_) | Node::Object(_) => None,
            other => Some(other.to_json()),
        }
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::String(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::String(value)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Int(value)
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Node::Int(i64::from(value))
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Float(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Bool(value)
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Node::Array(value)
    }
}

impl From<Object> for Node {
    fn from(value: Object) -> Self {
        Node::Object(value)
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: i64, ty: &str, value: Node) -> Node {
        Node::object([
            ("index", Node::from(index)),
            ("type", Node::from(ty)),
            (
                "data",
                Node::object([("format", Node::from("string")), ("value", value)]),
            ),
        ])
    }

    #[test]
    fn object_keeps_insertion_order() {
        let node = entry(1, "URL", Node::from("http://x"));
        assert_eq!(
            node.to_json(),
            r#"{"index":1,"type":"URL","data":{"format":"string","value":"http://x"}}"#
        );
    }

    #[test]
    fn parse_distinguishes_int_and_float() {
        let node = Node::parse_json(r#"{"a":1,"b":1.5,"c":null,"d":true}"#).unwrap();
        assert_eq!(node.get("a"), Some(&Node::Int(1)));
        assert_eq!(node.get("b"), Some(&Node::Float(1.5)));
        assert_eq!(node.get("c"), Some(&Node::Null));
        assert_eq!(node.get("d"), Some(&Node::Bool(true)));
    }

    #[test]
    fn parse_preserves_key_order() {
        let text = r#"{"z":1,"a":2,"m":3}"#;
        let node = Node::parse_json(text).unwrap();
        assert_eq!(node.to_json(), text);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Node::parse_json("{not json").is_err());
    }

    #[test]
    fn scalar_string_matches_json_numbers() {
        assert_eq!(Node::from(1247).scalar_string().unwrap(), "1247");
        assert_eq!(Node::from(2.5).scalar_string().unwrap(), "2.5");
        assert_eq!(Node::from(3.0).scalar_string().unwrap(), "3.0");
        assert_eq!(Node::from("abc").scalar_string().unwrap(), "abc");
        assert_eq!(Node::Null.scalar_string().unwrap(), "null");
        assert_eq!(Node::from(false).scalar_string().unwrap(), "false");
        assert!(Node::array([]).scalar_string().is_none());
        assert!(Node::object::<&str, _>([]).scalar_string().is_none());
    }

    #[test]
    fn type_names() {
        assert_eq!(Node::Null.type_name(), "Null");
        assert_eq!(Node::from(1).type_name(), "Integer");
        assert_eq!(Node::array([]).type_name(), "Array");
    }
}
