//! Conditional entry templates.

use std::collections::BTreeSet;

use hdl_doc::Node;
use hdl_index::{IndexTemplate, ADMIN_INDEX, STRING_FORMAT};

use crate::error::{ProfileError, ProfileResult};
use crate::params::{self, Parameters};

/// Type of the administrative entry.
pub const ADMIN_TYPE: &str = "HS_ADMIN";

/// Namespace of the object-specific record types in the default profile.
pub const DEFAULT_NAMESPACE: &str = "IRODS";

const ADMIN_FORMAT: &str = "admin";
const ADMIN_PERMISSIONS: &str = "011111110011";
const ADMIN_HANDLE_INDEX: i64 = 200;

const IF_SET_KEY: &str = "if_set";
const IF_NOT_SET_KEY: &str = "if_not_set";
const ENTRY_KEY: &str = "entry";

/// Gate on a template entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    Always,
    IfSet(String),
    IfNotSet(String),
}

impl Condition {
    pub fn is_met(&self, params: &Parameters) -> bool {
        match self {
            Condition::Always => true,
            Condition::IfSet(name) => params.is_set(name),
            Condition::IfNotSet(name) => !params.is_set(name),
        }
    }

    /// Name of the parameter the condition tests, if any.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Condition::Always => None,
            Condition::IfSet(name) | Condition::IfNotSet(name) => Some(name),
        }
    }
}

/// One conditional entry of a profile.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateEntry {
    pub condition: Condition,
    pub entry_type: String,
    pub index: IndexTemplate,
    pub format: String,
    /// Value template. String leaves may contain `{NAME}` tokens.
    pub value: Node,
}

impl TemplateEntry {
    /// An unconditional `string` entry whose index is allocated.
    pub fn new(entry_type: impl Into<String>, value: impl Into<Node>) -> Self {
        Self {
            condition: Condition::Always,
            entry_type: entry_type.into(),
            index: IndexTemplate::Allocate,
            format: STRING_FORMAT.to_string(),
            value: value.into(),
        }
    }

    pub fn if_set(mut self, name: impl Into<String>) -> Self {
        self.condition = Condition::IfSet(name.into());
        self
    }

    pub fn if_not_set(mut self, name: impl Into<String>) -> Self {
        self.condition = Condition::IfNotSet(name.into());
        self
    }

    pub fn with_index(mut self, index: i64) -> Self {
        self.index = IndexTemplate::Literal(index);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn is_admin(&self) -> bool {
        self.entry_type == ADMIN_TYPE
    }

    /// The record entry this template produces, placeholders unresolved.
    pub fn entry_node(&self) -> Node {
        hdl_index::entry_node(
            self.index.to_node(),
            &self.entry_type,
            &self.format,
            self.value.clone(),
        )
    }

    /// The template in profile file form.
    pub fn to_node(&self) -> Node {
        let mut members = Vec::with_capacity(2);
        match &self.condition {
            Condition::Always => {}
            Condition::IfSet(name) => members.push((IF_SET_KEY, Node::from(name.as_str()))),
            Condition::IfNotSet(name) => {
                members.push((IF_NOT_SET_KEY, Node::from(name.as_str())))
            }
        }
        members.push((ENTRY_KEY, self.entry_node()));
        Node::object(members)
    }

    fn from_node(node: &Node, position: usize, problems: &mut Vec<String>) -> Option<Self> {
        let mut problem = |what: String| problems.push(format!("profile entry {position}: {what}"));

        let Some(obj) = node.as_object() else {
            problem(format!("expected object, given {}", node.type_name()));
            return None;
        };

        let condition = match (obj.get(IF_SET_KEY), obj.get(IF_NOT_SET_KEY)) {
            (None, None) => Condition::Always,
            (Some(Node::String(name)), None) => Condition::IfSet(name.clone()),
            (None, Some(Node::String(name))) => Condition::IfNotSet(name.clone()),
            (Some(_), Some(_)) => {
                problem(format!("'{IF_SET_KEY}' and '{IF_NOT_SET_KEY}' are exclusive"));
                return None;
            }
            (Some(other), None) | (None, Some(other)) => {
                problem(format!("condition must be a string, given {}", other.type_name()));
                return None;
            }
        };

        let Some(entry) = obj.get(ENTRY_KEY).and_then(Node::as_object) else {
            problem(format!("missing object '{ENTRY_KEY}'"));
            return None;
        };
        let Some(entry_type) = entry.get("type").and_then(Node::as_str) else {
            problem("entry type must be a string".to_string());
            return None;
        };
        let index = match entry.get("index") {
            None => IndexTemplate::Allocate,
            Some(raw) => match IndexTemplate::from_node(raw) {
                Some(index) => index,
                None => {
                    problem(format!("index of {entry_type} must be an integer or {{INDEX}}"));
                    return None;
                }
            },
        };
        let (format, value) = match entry.get("data") {
            Some(Node::Object(data)) => (
                data.get("format").and_then(Node::as_str).unwrap_or(STRING_FORMAT),
                data.get("value").cloned().unwrap_or_default(),
            ),
            Some(other) => {
                problem(format!("data of {entry_type} must be an object, given {}", other.type_name()));
                return None;
            }
            None => (STRING_FORMAT, entry.get("value").cloned().unwrap_or_default()),
        };

        Some(Self {
            condition,
            entry_type: entry_type.to_string(),
            index,
            format: format.to_string(),
            value,
        })
    }
}

/// Ordered list of conditional entry templates.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    entries: Vec<TemplateEntry>,
}

impl Profile {
    pub fn new(entries: Vec<TemplateEntry>) -> Self {
        Self { entries }
    }

    /// The built-in profile for exposing a storage object.
    ///
    /// `URL` points at the web prefix when one is configured and at the
    /// direct prefix otherwise. The `<namespace>/...` entries mirror the
    /// direct URL, the web URL (when configured), the server and the port.
    /// `HS_ADMIN` grants the handle prefix owner its permissions.
    pub fn bootstrap(namespace: &str) -> Self {
        let url = |prefix: &str| format!("{{{prefix}}}{{{}}}", params::OBJECT);
        let param = |name: &str| format!("{{{name}}}");
        let admin = Node::object([
            ("handle", Node::from(format!("0.NA/{}", param(params::HANDLE_PREFIX)))),
            ("index", Node::from(ADMIN_HANDLE_INDEX)),
            ("permissions", Node::from(ADMIN_PERMISSIONS)),
        ]);

        Self::new(vec![
            TemplateEntry::new("URL", url(params::WEBDAV_PREFIX))
                .with_index(1)
                .if_set(params::WEBDAV_PREFIX),
            TemplateEntry::new("URL", url(params::URL_PREFIX))
                .with_index(1)
                .if_not_set(params::WEBDAV_PREFIX),
            TemplateEntry::new(format!("{namespace}/URL"), url(params::URL_PREFIX)),
            TemplateEntry::new(format!("{namespace}/WEBDAV_URL"), url(params::WEBDAV_PREFIX))
                .if_set(params::WEBDAV_PREFIX),
            TemplateEntry::new(format!("{namespace}/SERVER"), param(params::SERVER)),
            TemplateEntry::new(format!("{namespace}/SERVER_PORT"), param(params::SERVER_PORT)),
            TemplateEntry::new(ADMIN_TYPE, admin)
                .with_index(ADMIN_INDEX)
                .with_format(ADMIN_FORMAT),
        ])
    }

    /// Load a profile from its file form: an array of
    /// `{"if_set"|"if_not_set": NAME, "entry": {...}}` objects.
    pub fn from_node(node: &Node) -> ProfileResult<Self> {
        let Some(items) = node.as_array() else {
            return Err(ProfileError::InvalidProfile(vec![format!(
                "expected array, given {}",
                node.type_name()
            )]));
        };
        let mut problems = Vec::new();
        let entries: Vec<TemplateEntry> = items
            .iter()
            .enumerate()
            .filter_map(|(position, item)| TemplateEntry::from_node(item, position, &mut problems))
            .collect();
        if problems.is_empty() {
            Ok(Self::new(entries))
        } else {
            Err(ProfileError::InvalidProfile(problems))
        }
    }

    pub fn from_json(text: &str) -> ProfileResult<Self> {
        Self::from_node(&Node::parse_json(text)?)
    }

    pub fn to_node(&self) -> Node {
        Node::array(self.entries.iter().map(TemplateEntry::to_node))
    }

    pub fn entries(&self) -> &[TemplateEntry] {
        &self.entries
    }

    /// Templates whose condition holds, in profile order.
    pub fn active<'a>(&'a self, params: &'a Parameters) -> impl Iterator<Item = &'a TemplateEntry> {
        self.entries.iter().filter(move |t| t.condition.is_met(params))
    }

    /// Entry nodes of every template whose condition holds, placeholders
    /// unresolved.
    pub fn expand(&self, params: &Parameters) -> Vec<Node> {
        self.active(params).map(TemplateEntry::entry_node).collect()
    }

    /// Every type declared anywhere in the profile.
    pub fn get_keys(&self) -> BTreeSet<String> {
        self.entries.iter().map(|t| t.entry_type.clone()).collect()
    }

    pub fn is_managed(&self, entry_type: &str) -> bool {
        self.entries.iter().any(|t| t.entry_type == entry_type)
    }

    /// Fixed indices declared by the profile.
    pub fn literal_indices(&self) -> Vec<i64> {
        self.entries.iter().filter_map(|t| t.index.literal()).collect()
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::bootstrap(DEFAULT_NAMESPACE)
    }
}
