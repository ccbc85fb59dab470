//! In-memory handle server for testing and embedding.
//!
//! [`InMemoryHandleServer`] keeps every record in a `BTreeMap` protected by
//! a `RwLock`. It implements both [`HandleClient`] and
//! [`ReverseLookupClient`], answering with the same response codes a remote
//! server would.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use hdl_doc::Node;
use hdl_index::{entry_array, extract_value_by_type, get_entry_by_type, get_indices, VALUES_KEY};
use regex::Regex;
use tracing::debug;
use uuid::Uuid;

use crate::error::ClientResult;
use crate::result::{HandleResult, HANDLE_NOT_FOUND, INVALID_VALUE};
use crate::traits::{HandleClient, ReverseLookupClient};

/// In-memory handle server with reverse lookup.
///
/// Intended for tests and embedding. Records are held behind a `RwLock` and
/// cloned on read and write. New handles are `<prefix>/<uuid v7>`.
pub struct InMemoryHandleServer {
    records: RwLock<BTreeMap<String, Node>>,
}

impl InMemoryHandleServer {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no record is stored.
    pub fn is_empty(&self) -> bool {
        self.records.read().expect("lock poisoned").is_empty()
    }

    /// Sorted list of every stored handle.
    pub fn handles(&self) -> Vec<String> {
        self.records.read().expect("lock poisoned").keys().cloned().collect()
    }

    /// Store a record under a fixed handle, replacing any previous one.
    pub fn insert(&self, handle: impl Into<String>, doc: Node) {
        self.records.write().expect("lock poisoned").insert(handle.into(), doc);
    }

    /// The stored document of a handle.
    pub fn document(&self, handle: &str) -> Option<Node> {
        self.records.read().expect("lock poisoned").get(handle).cloned()
    }
}

impl Default for InMemoryHandleServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Anchored regex for a `*` glob. Everything else matches literally.
fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let body: Vec<String> = pattern.split('*').map(regex::escape).collect();
    Regex::new(&format!("^{}$", body.join(".*")))
}

fn index_of(entry: &Node) -> Option<i64> {
    entry.get("index").and_then(Node::as_i64)
}

/// Overwrite entries with matching indices in place and append the rest.
fn merge_by_index(stored: &mut Vec<Node>, incoming: &[Node]) {
    for entry in incoming {
        let index = index_of(entry);
        match stored.iter().position(|e| index.is_some() && index_of(e) == index) {
            Some(position) => stored[position] = entry.clone(),
            None => stored.push(entry.clone()),
        }
    }
}

impl HandleClient for InMemoryHandleServer {
    fn create(&self, prefix: &str, doc: &Node) -> ClientResult<HandleResult> {
        let handle = format!("{prefix}/{}", Uuid::now_v7());
        if get_indices(doc).is_err() {
            return Ok(HandleResult::failed(handle, INVALID_VALUE));
        }
        self.records
            .write()
            .expect("lock poisoned")
            .insert(handle.clone(), doc.clone());
        debug!(handle = %handle, "created record");
        Ok(HandleResult::ok(handle, Node::Null))
    }

    fn get(&self, handle: &str) -> ClientResult<HandleResult> {
        Ok(match self.document(handle) {
            Some(doc) => HandleResult::ok(handle, doc),
            None => HandleResult::failed(handle, HANDLE_NOT_FOUND),
        })
    }

    fn update(&self, handle: &str, doc: &Node) -> ClientResult<HandleResult> {
        let Ok(incoming) = entry_array(doc) else {
            return Ok(HandleResult::failed(handle, INVALID_VALUE));
        };
        let mut records = self.records.write().expect("lock poisoned");
        let Some(stored) = records.get_mut(handle) else {
            return Ok(HandleResult::failed(handle, HANDLE_NOT_FOUND));
        };
        let Some(values) = stored
            .as_object_mut()
            .and_then(|o| o.get_mut(VALUES_KEY))
            .and_then(Node::as_array_mut)
        else {
            return Ok(HandleResult::failed(handle, INVALID_VALUE));
        };
        merge_by_index(values, incoming);
        debug!(handle, entries = incoming.len(), "updated record");
        Ok(HandleResult::ok(handle, Node::Null))
    }

    fn remove_indices(&self, handle: &str, indices: &[i64]) -> ClientResult<HandleResult> {
        let mut records = self.records.write().expect("lock poisoned");
        let Some(values) = records
            .get_mut(handle)
            .and_then(Node::as_object_mut)
            .and_then(|o| o.get_mut(VALUES_KEY))
            .and_then(Node::as_array_mut)
        else {
            return Ok(HandleResult::failed(handle, HANDLE_NOT_FOUND));
        };
        let removed: BTreeSet<i64> = indices.iter().copied().collect();
        values.retain(|e| index_of(e).map_or(true, |i| !removed.contains(&i)));
        debug!(handle, indices = ?indices, "removed indices");
        Ok(HandleResult::ok(handle, Node::Null))
    }

    fn remove(&self, handle: &str) -> ClientResult<HandleResult> {
        let removed = self.records.write().expect("lock poisoned").remove(handle);
        Ok(match removed {
            Some(_) => HandleResult::ok(handle, Node::Null),
            None => HandleResult::failed(handle, HANDLE_NOT_FOUND),
        })
    }
}

impl ReverseLookupClient for InMemoryHandleServer {
    fn lookup(&self, query: &[(String, String)]) -> ClientResult<Vec<String>> {
        let mut patterns = Vec::with_capacity(query.len());
        for (key, value) in query {
            patterns.push((key.as_str(), glob_to_regex(value)?));
        }

        let records = self.records.read().expect("lock poisoned");
        let found = records
            .iter()
            .filter(|(_, doc)| {
                patterns.iter().all(|(key, pattern)| {
                    matches!(get_entry_by_type(doc, key), Ok(Some(_)))
                        && extract_value_by_type(doc, key).is_ok_and(|v| pattern.is_match(&v))
                })
            })
            .map(|(handle, _)| handle.clone())
            .collect();
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entries: &[(i64, &str, &str)]) -> Node {
        let values = entries.iter().map(|(i, t, v)| {
            Node::object([
                ("index", Node::from(*i)),
                ("type", Node::from(*t)),
                (
                    "data",
                    Node::object([("format", Node::from("string")), ("value", Node::from(*v))]),
                ),
            ])
        });
        Node::object([("values", Node::array(values))])
    }

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    // -----------------------------------------------------------------------
    // HandleClient
    // -----------------------------------------------------------------------

    #[test]
    fn create_assigns_prefixed_handle() {
        let server = InMemoryHandleServer::new();
        let res = server.create("21.T1", &record(&[(1, "URL", "x")])).unwrap();
        assert!(res.success);
        assert!(res.handle.starts_with("21.T1/"));
        assert_eq!(server.len(), 1);

        let got = server.get(&res.handle).unwrap();
        assert_eq!(got.data, record(&[(1, "URL", "x")]));
    }

    #[test]
    fn create_rejects_invalid_record() {
        let server = InMemoryHandleServer::new();
        let res = server.create("21.T1", &Node::from("nope")).unwrap();
        assert!(!res.success);
        assert_eq!(res.handle_code, INVALID_VALUE);
        assert!(server.is_empty());
    }

    #[test]
    fn unknown_handle_is_reported_not_raised() {
        let server = InMemoryHandleServer::new();
        for res in [
            server.get("21.T1/none").unwrap(),
            server.update("21.T1/none", &record(&[])).unwrap(),
            server.remove_indices("21.T1/none", &[1]).unwrap(),
            server.remove("21.T1/none").unwrap(),
        ] {
            assert!(!res.success);
            assert_eq!(res.handle_code, HANDLE_NOT_FOUND);
        }
    }

    #[test]
    fn update_merges_by_index() {
        let server = InMemoryHandleServer::new();
        server.insert("h/1", record(&[(1, "A", "a"), (2, "B", "b")]));
        server
            .update("h/1", &record(&[(2, "B", "b2"), (5, "C", "c")]))
            .unwrap();
        assert_eq!(
            server.document("h/1").unwrap(),
            record(&[(1, "A", "a"), (2, "B", "b2"), (5, "C", "c")])
        );
    }

    #[test]
    fn remove_indices_filters_entries() {
        let server = InMemoryHandleServer::new();
        server.insert("h/1", record(&[(1, "A", "a"), (2, "B", "b"), (3, "C", "c")]));
        assert!(server.remove_indices("h/1", &[1, 3, 9]).unwrap().success);
        assert_eq!(server.document("h/1").unwrap(), record(&[(2, "B", "b")]));
    }

    // -----------------------------------------------------------------------
    // ReverseLookupClient
    // -----------------------------------------------------------------------

    #[test]
    fn lookup_matches_every_pair() {
        let server = InMemoryHandleServer::new();
        server.insert("h/2", record(&[(1, "URL", "irods://a/x"), (2, "SERVER", "a")]));
        server.insert("h/1", record(&[(1, "URL", "irods://a/y"), (2, "SERVER", "a")]));
        server.insert("h/3", record(&[(1, "URL", "irods://b/x"), (2, "SERVER", "b")]));

        assert_eq!(server.lookup(&query(&[("URL", "irods://a/x")])).unwrap(), vec!["h/2"]);
        assert_eq!(
            server.lookup(&query(&[("URL", "irods://a/*")])).unwrap(),
            vec!["h/1", "h/2"]
        );
        assert_eq!(
            server.lookup(&query(&[("URL", "*/x"), ("SERVER", "b")])).unwrap(),
            vec!["h/3"]
        );
        assert!(server.lookup(&query(&[("MISSING", "*")])).unwrap().is_empty());
    }

    #[test]
    fn lookup_treats_regex_characters_literally() {
        let server = InMemoryHandleServer::new();
        server.insert("h/1", record(&[(1, "URL", "irods://a/f.txt")]));
        server.insert("h/2", record(&[(1, "URL", "irods://a/fxtxt")]));
        assert_eq!(
            server.lookup(&query(&[("URL", "irods://a/f.txt")])).unwrap(),
            vec!["h/1"]
        );
    }
}
