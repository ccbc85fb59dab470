//! Handle record profiles.
//!
//! A [`Profile`] declares which entries the handle record of a managed
//! object should contain, each gated by a [`Condition`] over the
//! [`Parameters`] environment. The [`ProfileReconciler`] turns a profile into
//! a fresh record (`create`) or brings an existing record in line with it
//! (`update`), reporting the indices it freed so the caller can delete them
//! remotely.
//!
//! # Key Types
//!
//! - [`Parameters`] -- named string parameters plus the object path
//! - [`Condition`] / [`TemplateEntry`] / [`Profile`] -- the declarative template
//! - [`ProfileReconciler`] -- create / update / set / unset over one document

pub mod error;
pub mod params;
pub mod profile;
pub mod reconciler;

pub use error::{ProfileError, ProfileResult};
pub use hdl_index::IndexTemplate;
pub use params::Parameters;
pub use profile::{Condition, Profile, TemplateEntry, ADMIN_TYPE, DEFAULT_NAMESPACE};
pub use reconciler::ProfileReconciler;
