//! Path queries over a [`Node`] tree.
//!
//! A query path such as `values/*/type` is split on `/` into selectors. The
//! visitor resolves a query into concrete paths (sequences of
//! [`PathSegment`]) in document order; predicates receive the root node and
//! the concrete path of every candidate so they can inspect siblings.

use std::fmt;

use crate::error::{DocError, DocResult};
use crate::node::Node;

/// One step of a concrete path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Selector {
    Literal(String),
    Wildcard,
    Append,
}

fn parse_query(path: &str) -> Vec<Selector> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s {
            "*" => Selector::Wildcard,
            "#" => Selector::Append,
            other => Selector::Literal(other.to_string()),
        })
        .collect()
}

/// Resolve the children of `node` selected by a single selector.
fn select(node: &Node, selector: &Selector) -> Vec<PathSegment> {
    match (node, selector) {
        (Node::Object(obj), Selector::Literal(key)) if obj.contains_key(key) => {
            vec![PathSegment::Key(key.clone())]
        }
        (Node::Array(arr), Selector::Literal(pos)) => match pos.parse::<usize>() {
            Ok(i) if i < arr.len() => vec![PathSegment::Index(i)],
            _ => Vec::new(),
        },
        (Node::Object(obj), Selector::Wildcard) => {
            obj.keys().map(|k| PathSegment::Key(k.clone())).collect()
        }
        (Node::Array(arr), Selector::Wildcard) => (0..arr.len()).map(PathSegment::Index).collect(),
        _ => Vec::new(),
    }
}

fn collect(node: &Node, selectors: &[Selector], prefix: &mut Vec<PathSegment>, out: &mut Vec<Vec<PathSegment>>) {
    let Some((first, rest)) = selectors.split_first() else {
        out.push(prefix.clone());
        return;
    };
    for segment in select(node, first) {
        if let Some(child) = step(node, &segment) {
            prefix.push(segment);
            collect(child, rest, prefix, out);
            prefix.pop();
        }
    }
}

fn step<'a>(node: &'a Node, segment: &PathSegment) -> Option<&'a Node> {
    match (node, segment) {
        (Node::Object(obj), PathSegment::Key(k)) => obj.get(k),
        (Node::Array(arr), PathSegment::Index(i)) => arr.get(*i),
        _ => None,
    }
}

fn step_mut<'a>(node: &'a mut Node, segment: &PathSegment) -> Option<&'a mut Node> {
    match (node, segment) {
        (Node::Object(obj), PathSegment::Key(k)) => obj.get_mut(k),
        (Node::Array(arr), PathSegment::Index(i)) => arr.get_mut(*i),
        _ => None,
    }
}

impl Node {
    /// Node at a concrete path.
    pub fn at(&self, path: &[PathSegment]) -> Option<&Node> {
        path.iter().try_fold(self, step)
    }

    /// Mutable node at a concrete path.
    pub fn at_mut(&mut self, path: &[PathSegment]) -> Option<&mut Node> {
        let mut current = self;
        for segment in path {
            current = step_mut(current, segment)?;
        }
        Some(current)
    }

    /// Concrete paths matched by a query, in document order.
    pub fn matches(&self, path: &str) -> Vec<Vec<PathSegment>> {
        let mut out = Vec::new();
        collect(self, &parse_query(path), &mut Vec::new(), &mut out);
        out
    }

    /// First node matched by a query.
    pub fn find(&self, path: &str) -> Option<&Node> {
        self.matches(path).first().and_then(|p| self.at(p))
    }

    /// Visit every node matched by a query, in document order.
    pub fn for_each<F>(&self, path: &str, mut f: F)
    where
        F: FnMut(&[PathSegment], &Node),
    {
        for concrete in self.matches(path) {
            if let Some(node) = self.at(&concrete) {
                f(&concrete, node);
            }
        }
    }

    /// Set `value` at every location matched by `path` that the predicate
    /// accepts. Returns the number of locations written.
    ///
    /// The last segment may name a missing object key (it is created) or be
    /// `#` to append to an array.
    pub fn update<P>(&mut self, path: &str, value: Node, predicate: P) -> DocResult<usize>
    where
        P: Fn(&Node, &[PathSegment]) -> bool,
    {
        let selectors = parse_query(path);
        let Some((last, parents)) = selectors.split_last() else {
            return Err(DocError::invalid_path(path, "empty path"));
        };
        if parents.contains(&Selector::Append) {
            return Err(DocError::invalid_path(path, "'#' is only allowed as the last segment"));
        }

        let mut parent_paths = Vec::new();
        collect(self, parents, &mut Vec::new(), &mut parent_paths);

        let mut targets: Vec<(Vec<PathSegment>, bool)> = Vec::new();
        for parent_path in parent_paths {
            let Some(parent) = self.at(&parent_path) else { continue };
            let candidates: Vec<(PathSegment, bool)> = match (parent, last) {
                (Node::Array(arr), Selector::Append) => vec![(PathSegment::Index(arr.len()), true)],
                (_, Selector::Append) => {
                    return Err(DocError::invalid_path(
                        path,
                        format!("cannot append to {}", parent.type_name()),
                    ))
                }
                (Node::Object(_), Selector::Literal(key)) => {
                    vec![(PathSegment::Key(key.clone()), false)]
                }
                (Node::Array(_), _) | (Node::Object(_), _) => {
                    select(parent, last).into_iter().map(|s| (s, false)).collect()
                }
                (scalar, _) => {
                    return Err(DocError::invalid_path(
                        path,
                        format!("cannot descend into {}", scalar.type_name()),
                    ))
                }
            };
            for (segment, append) in candidates {
                let mut full = parent_path.clone();
                full.push(segment);
                if predicate(&*self, &full[..]) {
                    targets.push((full, append));
                }
            }
        }

        let written = targets.len();
        for (full, append) in targets {
            let Some((segment, parent_path)) = full.split_last() else { continue };
            let Some(parent) = self.at_mut(parent_path) else { continue };
            match (parent, segment) {
                (Node::Array(arr), PathSegment::Index(_)) if append => arr.push(value.clone()),
                (Node::Array(arr), PathSegment::Index(i)) => arr[*i] = value.clone(),
                (Node::Object(obj), PathSegment::Key(k)) => {
                    obj.insert(k.clone(), value.clone());
                }
                _ => {}
            }
        }
        Ok(written)
    }

    /// Remove every array element or object member matched by `path` that
    /// the predicate accepts. Returns the number of removed nodes.
    pub fn remove<P>(&mut self, path: &str, predicate: P) -> usize
    where
        P: Fn(&Node, &[PathSegment]) -> bool,
    {
        let targets: Vec<Vec<PathSegment>> = self
            .matches(path)
            .into_iter()
            .filter(|p| !p.is_empty() && predicate(&*self, &p[..]))
            .collect();

        // Later siblings first so earlier array positions stay valid.
        let mut removed = 0;
        for full in targets.iter().rev() {
            let Some((segment, parent_path)) = full.split_last() else { continue };
            let Some(parent) = self.at_mut(parent_path) else { continue };
            match (parent, segment) {
                (Node::Array(arr), PathSegment::Index(i)) if *i < arr.len() => {
                    arr.remove(*i);
                    removed += 1;
                }
                (Node::Object(obj), PathSegment::Key(k)) => {
                    if obj.shift_remove(k).is_some() {
                        removed += 1;
                    }
                }
                _ => {}
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Node {
        Node::parse_json(
            r#"{"values":[
                {"index":1,"type":"A","data":{"format":"string","value":"a"}},
                {"index":2,"type":"B","data":{"format":"string","value":"b"}},
                {"index":3,"type":"C","data":{"format":"string","value":"c"}}
            ]}"#,
        )
        .unwrap()
    }

    fn type_is<'a>(ty: &'a str, depth_from_entry: usize) -> impl Fn(&Node, &[PathSegment]) -> bool + 'a {
        move |root, path| {
            let entry = &path[..path.len() - depth_from_entry];
            let mut type_path = entry.to_vec();
            type_path.push(PathSegment::Key("type".into()));
            root.at(&type_path) == Some(&Node::from(ty))
        }
    }

    #[test]
    fn find_literal_path() {
        let d = doc();
        assert_eq!(d.find("values/1/type"), Some(&Node::from("B")));
        assert_eq!(d.find("values/7/type"), None);
        assert_eq!(d.find("missing"), None);
    }

    #[test]
    fn for_each_wildcard_in_document_order() {
        let d = doc();
        let mut seen = Vec::new();
        d.for_each("values/*/type", |path, node| {
            seen.push((path.to_vec(), node.as_str().unwrap().to_string()));
        });
        let types: Vec<_> = seen.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(types, vec!["A", "B", "C"]);
        assert_eq!(
            seen[2].0,
            vec![
                PathSegment::Key("values".into()),
                PathSegment::Index(2),
                PathSegment::Key("type".into())
            ]
        );
    }

    #[test]
    fn update_with_predicate_touches_only_matches() {
        let mut d = doc();
        let n = d
            .update("values/*/data/value", Node::from("new"), type_is("B", 2))
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(d.find("values/1/data/value"), Some(&Node::from("new")));
        assert_eq!(d.find("values/0/data/value"), Some(&Node::from("a")));
    }

    #[test]
    fn update_append() {
        let mut d = doc();
        let n = d.update("values/#", Node::from(42), |_, _| true).unwrap();
        assert_eq!(n, 1);
        assert_eq!(d.find("values/3"), Some(&Node::from(42)));
    }

    #[test]
    fn update_creates_missing_key() {
        let mut d = doc();
        d.update("extra", Node::from(true), |_, _| true).unwrap();
        assert_eq!(d.get("extra"), Some(&Node::Bool(true)));
    }

    #[test]
    fn update_rejects_append_on_object() {
        let mut d = doc();
        assert!(d.update("#", Node::Null, |_, _| true).is_err());
        assert!(d.update("values/#/x", Node::Null, |_, _| true).is_err());
    }

    #[test]
    fn update_into_scalar_is_an_error() {
        let mut d = doc();
        assert!(d.update("values/0/index/x", Node::Null, |_, _| true).is_err());
    }

    #[test]
    fn remove_wildcard_elements_by_predicate() {
        let mut d = doc();
        let removed = d.remove("values/*", type_is("B", 0));
        assert_eq!(removed, 1);
        let types: Vec<_> = d
            .matches("values/*/type")
            .iter()
            .map(|p| d.at(p).unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(types, vec!["A", "C"]);
    }

    #[test]
    fn remove_multiple_keeps_positions_valid() {
        let mut d = doc();
        let removed = d.remove("values/*", |root, path| {
            let mut p = path.to_vec();
            p.push(PathSegment::Key("type".into()));
            root.at(&p) != Some(&Node::from("B"))
        });
        assert_eq!(removed, 2);
        assert_eq!(d.find("values/0/type"), Some(&Node::from("B")));
        assert_eq!(d.find("values/1"), None);
    }

    #[test]
    fn remove_object_member() {
        let mut d = doc();
        assert_eq!(d.remove("values/0/data", |_, _| true), 1);
        assert_eq!(d.find("values/0/data"), None);
    }
}
