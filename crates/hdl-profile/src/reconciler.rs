//! Applying a profile to handle record documents.

use std::collections::BTreeSet;

use hdl_doc::Node;
use hdl_index::{
    expand_placeholders, get_entry_by_type, get_indices, update_entry, used_indices, EntryUpdate,
    IndexAllocator, IndexRange, IndexTemplate, VALUES_KEY,
};
use tracing::{debug, info, warn};

use crate::error::{ProfileError, ProfileResult};
use crate::params::Parameters;
use crate::profile::Profile;

/// Builds and maintains handle records according to a [`Profile`].
///
/// Every operation works on one document and builds its own allocator, so a
/// reconciler can be shared freely between calls.
#[derive(Clone, Debug)]
pub struct ProfileReconciler {
    profile: Profile,
    range: IndexRange,
}

impl ProfileReconciler {
    pub fn new(profile: Profile, range: IndexRange) -> Self {
        Self { profile, range }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Build a new record from the profile plus caller supplied entries.
    ///
    /// Fails with [`ProfileError::DuplicateKey`] before building anything if
    /// an extra key is a type the profile manages.
    pub fn create(&self, env: &Parameters, extra: &[(String, String)]) -> ProfileResult<Node> {
        let keys = self.profile.get_keys();
        if let Some((key, _)) = extra.iter().find(|(key, _)| keys.contains(key)) {
            return Err(ProfileError::DuplicateKey { key: key.clone() });
        }

        let mut doc = Node::object([(VALUES_KEY, Node::array(self.profile.expand(env)))]);
        for (key, value) in extra {
            update_entry(
                &mut doc,
                key,
                EntryUpdate::set(value.as_str()),
                IndexTemplate::Allocate,
            )?;
        }

        let mut allocator = IndexAllocator::new(self.profile.literal_indices(), self.range);
        let allocated = expand_placeholders(&mut doc, &env.substitutions(), &mut allocator)?;
        info!(entries = get_indices(&doc)?.len(), allocated, "created handle record");
        Ok(doc)
    }

    /// Bring an existing record in line with the profile.
    ///
    /// Active templates are upserted by type: missing entries are inserted
    /// with their template index, existing ones only get a new value. The
    /// administrative entry is left alone. Entries whose every template is
    /// inactive are removed. Returns the freed indices in type order.
    ///
    /// On error `doc` is left exactly as it was passed in.
    pub fn update(&self, doc: &mut Node, env: &Parameters) -> ProfileResult<Vec<i64>> {
        get_indices(doc)?;
        let mut work = doc.clone();

        for template in self.profile.active(env) {
            if template.is_admin() {
                continue;
            }
            let mut index = template.index;
            if let IndexTemplate::Literal(literal) = index {
                let present = get_entry_by_type(&work, &template.entry_type)?.is_some();
                if !present && used_indices(&work).contains(&literal) {
                    warn!(
                        entry_type = %template.entry_type,
                        index = literal,
                        "template index already taken, allocating a new one"
                    );
                    index = IndexTemplate::Allocate;
                }
            }
            let upsert = EntryUpdate::SetWithFormat {
                format: template.format.clone(),
                value: template.value.clone(),
            };
            update_entry(&mut work, &template.entry_type, upsert, index)?;
        }

        let mut allocator = IndexAllocator::new(used_indices(&work), self.range);
        expand_placeholders(&mut work, &env.substitutions(), &mut allocator)?;

        let freed = self.remove_inactive(&mut work, env)?;
        *doc = work;
        info!(freed = ?freed, "updated handle record");
        Ok(freed)
    }

    /// Types declared only by inactive templates are removed. A type that
    /// any active template keeps is never removed.
    fn remove_inactive(&self, doc: &mut Node, env: &Parameters) -> ProfileResult<Vec<i64>> {
        let mut keep = BTreeSet::new();
        let mut remove = BTreeSet::new();
        for template in self.profile.entries() {
            if template.condition.is_met(env) {
                keep.insert(template.entry_type.as_str());
            } else {
                remove.insert(template.entry_type.as_str());
            }
        }

        let mut freed = Vec::new();
        for entry_type in remove.difference(&keep) {
            if let Some(index) = update_entry(doc, entry_type, EntryUpdate::Remove, IndexTemplate::Allocate)? {
                debug!(entry_type, index, "entry switched off");
                freed.push(index);
            }
        }
        Ok(freed)
    }

    /// Upsert ad hoc `string` entries, then resolve placeholders.
    ///
    /// On error `doc` is left exactly as it was passed in.
    pub fn set_indices(&self, doc: &mut Node, env: &Parameters, pairs: &[(String, String)]) -> ProfileResult<()> {
        get_indices(doc)?;
        let mut work = doc.clone();
        for (key, value) in pairs {
            update_entry(&mut work, key, EntryUpdate::set(value.as_str()), IndexTemplate::Allocate)?;
        }
        let mut allocator = IndexAllocator::new(used_indices(&work), self.range);
        let allocated = expand_placeholders(&mut work, &env.substitutions(), &mut allocator)?;
        *doc = work;
        debug!(pairs = pairs.len(), allocated, "set entries");
        Ok(())
    }

    /// Remove the entries of the given types. Unknown types are skipped.
    pub fn unset_indices<S: AsRef<str>>(&self, doc: &mut Node, keys: &[S]) -> ProfileResult<Vec<i64>> {
        get_indices(doc)?;
        let mut work = doc.clone();
        let mut freed = Vec::new();
        for key in keys {
            if let Some(index) = update_entry(&mut work, key.as_ref(), EntryUpdate::Remove, IndexTemplate::Allocate)? {
                freed.push(index);
            }
        }
        *doc = work;
        debug!(freed = ?freed, "unset entries");
        Ok(freed)
    }
}

impl Default for ProfileReconciler {
    fn default() -> Self {
        Self::new(Profile::default(), IndexRange::default())
    }
}
