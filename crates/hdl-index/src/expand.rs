//! Placeholder expansion over a document tree.

use std::collections::BTreeMap;

use hdl_doc::Node;

use crate::allocator::IndexAllocator;
use crate::error::IndexResult;

/// A string leaf consisting of exactly this token is replaced by a freshly
/// allocated index.
pub const INDEX_PLACEHOLDER: &str = "{INDEX}";

/// Ordered map from `{NAME}` tokens to replacement text.
///
/// Tokens are applied in key order, each at most once per string: only the
/// first occurrence of a token is replaced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitutions {
    tokens: BTreeMap<String, String>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `{name}` to be replaced by `value`.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.tokens.insert(format!("{{{name}}}"), value.into());
    }

    /// Replacement text for a parameter name (without braces).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.tokens.get(&format!("{{{name}}}")).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `(token, replacement)` pairs in application order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tokens.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn apply(&self, text: &str) -> String {
        substitute(text, self)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Substitutions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut subs = Substitutions::new();
        for (k, v) in iter {
            subs.insert(k.as_ref(), v);
        }
        subs
    }
}

/// Replace the first occurrence of every token in `template`.
pub fn substitute(template: &str, subs: &Substitutions) -> String {
    let mut out = template.to_string();
    for (token, value) in subs.iter() {
        if out.contains(token) {
            out = out.replacen(token, value, 1);
        }
    }
    out
}

/// Expand placeholders in every string leaf below `node`.
///
/// Object keys are left alone. Returns the number of indices allocated.
pub fn expand_placeholders(
    node: &mut Node,
    subs: &Substitutions,
    allocator: &mut IndexAllocator,
) -> IndexResult<usize> {
    if node.as_str() == Some(INDEX_PLACEHOLDER) {
        *node = Node::Int(allocator.allocate()?);
        return Ok(1);
    }
    match node {
        Node::String(s) => {
            let expanded = substitute(s, subs);
            *s = expanded;
            Ok(0)
        }
        Node::Array(items) => {
            let mut allocated = 0;
            for item in items.iter_mut() {
                allocated += expand_placeholders(item, subs, allocator)?;
            }
            Ok(allocated)
        }
        Node::Object(members) => {
            let mut allocated = 0;
            for value in members.values_mut() {
                allocated += expand_placeholders(value, subs, allocator)?;
            }
            Ok(allocated)
        }
        _ => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::IndexRange;
    use crate::error::IndexError;

    fn subs() -> Substitutions {
        [("PREFIX", "http://x/"), ("OBJECT", "/a/b")].into_iter().collect()
    }

    // -----------------------------------------------------------------------
    // substitute
    // -----------------------------------------------------------------------

    #[test]
    fn substitutes_each_token() {
        assert_eq!(substitute("{PREFIX}{OBJECT}", &subs()), "http://x//a/b");
    }

    #[test]
    fn only_first_occurrence_is_replaced() {
        assert_eq!(
            substitute("{OBJECT}:{OBJECT}", &subs()),
            "/a/b:{OBJECT}"
        );
    }

    #[test]
    fn unknown_tokens_are_kept() {
        assert_eq!(substitute("{SERVER}:{PREFIX}", &subs()), "{SERVER}:http://x/");
    }

    #[test]
    fn lookup_by_bare_name() {
        let s = subs();
        assert_eq!(s.get("OBJECT"), Some("/a/b"));
        assert_eq!(s.get("{OBJECT}"), None);
        assert_eq!(s.len(), 2);
    }

    // -----------------------------------------------------------------------
    // expand_placeholders
    // -----------------------------------------------------------------------

    #[test]
    fn index_placeholder_allocates_once_per_leaf() {
        let mut doc = Node::parse_json(
            r#"{"values":[{"index":"{INDEX}","type":"A"},{"index":"{INDEX}","type":"B"},{"index":100,"type":"HS_ADMIN"}]}"#,
        )
        .unwrap();
        let mut alloc = IndexAllocator::new([100], IndexRange::default());
        let n = expand_placeholders(&mut doc, &subs(), &mut alloc).unwrap();
        assert_eq!(n, 2);
        assert_eq!(doc.find("values/0/index"), Some(&Node::Int(2)));
        assert_eq!(doc.find("values/1/index"), Some(&Node::Int(3)));
        assert_eq!(doc.find("values/2/index"), Some(&Node::Int(100)));
    }

    #[test]
    fn index_placeholder_as_substring_is_not_allocated() {
        let mut doc = Node::from("id-{INDEX}");
        let mut alloc = IndexAllocator::new([], IndexRange::default());
        assert_eq!(expand_placeholders(&mut doc, &subs(), &mut alloc).unwrap(), 0);
        assert_eq!(doc, Node::from("id-{INDEX}"));
    }

    #[test]
    fn object_keys_are_never_substituted() {
        let mut doc = Node::parse_json(r#"{"{OBJECT}":"{OBJECT}","n":[1,"{PREFIX}"]}"#).unwrap();
        let mut alloc = IndexAllocator::new([], IndexRange::default());
        expand_placeholders(&mut doc, &subs(), &mut alloc).unwrap();
        assert_eq!(doc.to_json(), r#"{"{OBJECT}":"/a/b","n":[1,"http://x/"]}"#);
    }

    #[test]
    fn exhausted_allocator_fails_expansion() {
        let mut doc = Node::array([Node::from("{INDEX}"), Node::from("{INDEX}")]);
        let mut alloc = IndexAllocator::new([], IndexRange::new(2, 3));
        assert!(matches!(
            expand_placeholders(&mut doc, &subs(), &mut alloc),
            Err(IndexError::Exhausted { min: 2, max: 3 })
        ));
    }
}
