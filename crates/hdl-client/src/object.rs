//! Handle records of storage objects.

use std::sync::Arc;

use hdl_doc::Node;
use hdl_index::IndexRange;
use hdl_profile::params::{HANDLE_PREFIX, OBJECT, SERVER, SERVER_PORT, URL_PREFIX, WEBDAV_PREFIX};
use hdl_profile::{Parameters, Profile, ProfileError, ProfileReconciler, DEFAULT_NAMESPACE};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ClientError, ClientResult};
use crate::path::join_path;
use crate::result::HandleResult;
use crate::traits::{HandleClient, ReverseLookupClient};

/// Where objects live and how their records are addressed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectConfig {
    /// Handle prefix new records are created under.
    pub handle_prefix: String,
    /// Namespace of the object-specific record types, e.g. `IRODS/URL`.
    pub namespace: String,
    pub server: String,
    pub port: u16,
    /// Direct access prefix. Derived from server and port when empty.
    pub url_prefix: String,
    pub webdav_prefix: Option<String>,
    pub index: IndexRange,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            handle_prefix: String::new(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            server: "localhost".to_string(),
            port: 1247,
            url_prefix: String::new(),
            webdav_prefix: None,
            index: IndexRange::default(),
        }
    }
}

impl ObjectConfig {
    pub fn effective_url_prefix(&self) -> String {
        if self.url_prefix.is_empty() {
            format!("irods://{}:{}", self.server, self.port)
        } else {
            self.url_prefix.clone()
        }
    }

    /// Record type holding the direct URL, used for reverse lookups.
    pub fn url_type(&self) -> String {
        format!("{}/URL", self.namespace)
    }

    /// Parameter environment for the profile. Empty values are left unset.
    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params
            .set(URL_PREFIX, self.effective_url_prefix())
            .set(SERVER_PORT, self.port.to_string());
        if !self.server.is_empty() {
            params.set(SERVER, self.server.as_str());
        }
        if !self.handle_prefix.is_empty() {
            params.set(HANDLE_PREFIX, self.handle_prefix.as_str());
        }
        if let Some(webdav) = self.webdav_prefix.as_deref().filter(|p| !p.is_empty()) {
            params.set(WEBDAV_PREFIX, webdav);
        }
        params
    }
}

/// Keeps the handle records of storage objects in line with a profile.
///
/// Records are located by reverse lookup of the object's direct URL.
pub struct ObjectHandleClient {
    handles: Arc<dyn HandleClient>,
    lookup: Arc<dyn ReverseLookupClient>,
    config: ObjectConfig,
    reconciler: ProfileReconciler,
}

impl ObjectHandleClient {
    pub fn new(
        handles: Arc<dyn HandleClient>,
        lookup: Arc<dyn ReverseLookupClient>,
        config: ObjectConfig,
        profile: Profile,
    ) -> Self {
        let reconciler = ProfileReconciler::new(profile, config.index);
        Self {
            handles,
            lookup,
            config,
            reconciler,
        }
    }

    pub fn config(&self) -> &ObjectConfig {
        &self.config
    }

    pub fn reconciler(&self) -> &ProfileReconciler {
        &self.reconciler
    }

    fn env(&self, path: &str) -> Parameters {
        self.config.parameters().with_object(&join_path("", path))
    }

    /// Direct URL of an object, as written into its `<namespace>/URL` entry.
    pub fn object_url(&self, path: &str) -> String {
        self.env(path).expand(&format!("{{{URL_PREFIX}}}{{{OBJECT}}}"))
    }

    /// Handle of the object's record, if one exists.
    pub fn find(&self, path: &str) -> ClientResult<Option<String>> {
        let query = [(self.config.url_type(), self.object_url(path))];
        let mut found = self.lookup.lookup(&query)?;
        if found.len() > 1 {
            warn!(path, count = found.len(), "several records for one object, using the first");
        }
        Ok(if found.is_empty() { None } else { Some(found.swap_remove(0)) })
    }

    fn require(&self, path: &str) -> ClientResult<String> {
        self.find(path)?.ok_or_else(|| ClientError::NotFound {
            url: self.object_url(path),
        })
    }

    fn fetch(&self, handle: &str) -> ClientResult<Node> {
        Ok(ensure("get", self.handles.get(handle)?)?.data)
    }

    fn delete_indices(&self, handle: &str, indices: &[i64]) -> ClientResult<()> {
        if indices.is_empty() {
            return Ok(());
        }
        let failed = match self.handles.remove_indices(handle, indices) {
            Ok(res) if res.success => return Ok(()),
            Ok(res) => res.to_string(),
            Err(e) => e.to_string(),
        };
        warn!(handle, indices = ?indices, reason = %failed, "remote index deletion failed");
        Err(ClientError::RemoteDeleteFailed {
            handle: handle.to_string(),
            indices: indices.to_vec(),
        })
    }

    /// Create the record of a new object. Fails if the object already has one.
    pub fn create(&self, path: &str, extra: &[(String, String)]) -> ClientResult<HandleResult> {
        if self.find(path)?.is_some() {
            return Err(ClientError::AlreadyExists {
                url: self.object_url(path),
            });
        }
        let doc = self.reconciler.create(&self.env(path), extra)?;
        let res = ensure("create", self.handles.create(&self.config.handle_prefix, &doc)?)?;
        info!(handle = %res.handle, path, "registered object");
        Ok(res)
    }

    /// Point the record of `old_path` at `new_path`.
    ///
    /// Entries the profile no longer wants are deleted on the server before
    /// the rest is written back.
    pub fn move_object(&self, old_path: &str, new_path: &str) -> ClientResult<HandleResult> {
        let handle = self.require(old_path)?;
        let mut doc = self.fetch(&handle)?;
        let freed = self.reconciler.update(&mut doc, &self.env(new_path))?;
        self.delete_indices(&handle, &freed)?;
        let res = ensure("update", self.handles.update(&handle, &doc)?)?;
        info!(handle = %handle, from = old_path, to = new_path, freed = ?freed, "moved object");
        Ok(res)
    }

    /// Delete the record of an object.
    pub fn remove(&self, path: &str) -> ClientResult<HandleResult> {
        let handle = self.require(path)?;
        ensure("remove", self.handles.remove(&handle)?)
    }

    /// Fetch the record of an object.
    pub fn get(&self, path: &str) -> ClientResult<HandleResult> {
        let handle = self.require(path)?;
        ensure("get", self.handles.get(&handle)?)
    }

    /// Add or overwrite ad hoc entries. Types managed by the profile are
    /// rejected.
    pub fn set(&self, path: &str, pairs: &[(String, String)]) -> ClientResult<HandleResult> {
        if let Some((key, _)) = pairs.iter().find(|(key, _)| self.reconciler.profile().is_managed(key)) {
            return Err(ProfileError::DuplicateKey { key: key.clone() }.into());
        }
        let handle = self.require(path)?;
        let mut doc = self.fetch(&handle)?;
        self.reconciler.set_indices(&mut doc, &self.env(path), pairs)?;
        ensure("update", self.handles.update(&handle, &doc)?)
    }

    /// Delete entries by type. Returns the freed indices.
    pub fn unset<S: AsRef<str>>(&self, path: &str, keys: &[S]) -> ClientResult<Vec<i64>> {
        let handle = self.require(path)?;
        let mut doc = self.fetch(&handle)?;
        let freed = self.reconciler.unset_indices(&mut doc, keys)?;
        self.delete_indices(&handle, &freed)?;
        Ok(freed)
    }
}

/// Turn a rejected call into an error.
fn ensure(operation: &'static str, res: HandleResult) -> ClientResult<HandleResult> {
    if res.success {
        Ok(res)
    } else {
        Err(ClientError::Remote {
            operation,
            handle: res.handle.clone(),
            code: res.handle_code,
            description: res.description(),
        })
    }
}
