//! The parameter environment templates are expanded against.

use std::collections::BTreeMap;

use hdl_index::Substitutions;
use serde::{Deserialize, Serialize};

/// Parameter holding the path of the managed object.
pub const OBJECT: &str = "OBJECT";
/// Direct access prefix, e.g. `irods://data.example.org:1247`.
pub const URL_PREFIX: &str = "URL_PREFIX";
/// Optional web access prefix. Selects the `URL` branch of the default profile.
pub const WEBDAV_PREFIX: &str = "WEBDAV_PREFIX";
pub const SERVER: &str = "SERVER";
pub const SERVER_PORT: &str = "SERVER_PORT";
/// Handle prefix that owns the administrative entry.
pub const HANDLE_PREFIX: &str = "HANDLE_PREFIX";

/// Named string parameters.
///
/// Conditions only test whether a name is present, so an unset parameter
/// must be absent rather than mapped to an empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, String>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Copy of these parameters with `OBJECT` set to `path`.
    pub fn with_object(&self, path: &str) -> Self {
        self.clone().with(OBJECT, path)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `{NAME}` tokens for every parameter.
    pub fn substitutions(&self) -> Substitutions {
        self.iter().collect()
    }

    /// Expand the `{NAME}` tokens of a single template string.
    pub fn expand(&self, template: &str) -> String {
        self.substitutions().apply(template)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_object_leaves_original_untouched() {
        let base = Parameters::new().with(URL_PREFIX, "irods://host");
        let env = base.with_object("/zone/home/a.txt");
        assert_eq!(env.get(OBJECT), Some("/zone/home/a.txt"));
        assert!(!base.is_set(OBJECT));
    }

    #[test]
    fn expand_uses_every_parameter() {
        let env: Parameters = [(URL_PREFIX, "irods://host:1247"), (OBJECT, "/z/f")]
            .into_iter()
            .collect();
        assert_eq!(env.expand("{URL_PREFIX}{OBJECT}"), "irods://host:1247/z/f");
        assert_eq!(env.expand("{SERVER}"), "{SERVER}");
    }

    #[test]
    fn similar_names_do_not_collide() {
        let env = Parameters::new().with(SERVER, "srv").with(SERVER_PORT, "1247");
        assert_eq!(env.expand("{SERVER}:{SERVER_PORT}"), "srv:1247");
    }

    #[test]
    fn iteration_is_sorted_by_name() {
        let env = Parameters::new().with("B", "2").with("A", "1");
        let pairs: Vec<_> = env.iter().collect();
        assert_eq!(pairs, vec![("A", "1"), ("B", "2")]);
    }
}
