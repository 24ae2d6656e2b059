//! Locations inside a mount.
//!
//! A [`MountLocation`] pairs a canonical mount spec with a canonical path
//! inside that mount. Because the spec is canonical, two locations on the
//! same mount share one spec instance and can be compared by identity,
//! which keeps equality and hashing cheap.

use std::hash::{Hash, Hasher};

use crate::path_util::{canonicalize_path, match_prefix, SEPARATOR};
use crate::protocol::message::MessageWriter;
use crate::registry::SpecRef;
use crate::spec::MountSpec;

/// A canonical path on a canonical mount spec.
#[derive(Clone, Debug)]
pub struct MountLocation {
    spec: SpecRef,
    path: String,
}

impl MountLocation {
    /// Creates a location, interning `spec` in the process-wide registry.
    pub fn new(spec: MountSpec, path: &str) -> Self {
        Self { spec: spec.into_canonical(), path: canonicalize_path(path) }
    }

    /// Creates a location on an already shared spec.
    pub fn with_spec(spec: &SpecRef, path: &str) -> Self {
        Self { spec: spec.canonical(), path: canonicalize_path(path) }
    }

    pub fn spec(&self) -> &SpecRef {
        &self.spec
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment, or the whole path for the root.
    pub fn basename(&self) -> &str {
        match self.path.rfind(SEPARATOR) {
            Some(slash) if slash + 1 < self.path.len() => &self.path[slash + 1..],
            _ => &self.path,
        }
    }

    /// Location of the enclosing directory, `None` for the root.
    pub fn parent(&self) -> Option<MountLocation> {
        let slash = self.path.rfind(SEPARATOR)?;
        if slash + 1 == self.path.len() {
            return None;
        }
        let parent = self.path[..slash].trim_end_matches(SEPARATOR);
        let parent = if parent.is_empty() { "/" } else { parent };
        Some(self.at(parent))
    }

    /// Resolves `relative` against this location; absolute paths replace it.
    pub fn resolve_relative_path(&self, relative: &str) -> MountLocation {
        if relative.starts_with(SEPARATOR) {
            return self.at(relative);
        }
        self.at(&format!("{}{}{}", self.path, SEPARATOR, relative))
    }

    /// `true` if `descendant` lies strictly below this location on the same
    /// mount.
    pub fn prefix_matches(&self, descendant: &MountLocation) -> bool {
        self.remainder(descendant).is_some()
    }

    /// Path of `descendant` relative to this location.
    pub fn relative_path<'a>(&self, descendant: &'a MountLocation) -> Option<&'a str> {
        self.remainder(descendant).map(|rest| &rest[1..])
    }

    /// Copy of the spec scoped to this location, used to ask a daemon to
    /// mount the volume enclosing it.
    pub fn mount_request_spec(&self) -> MountSpec {
        let mut spec = self.spec.spec().clone();
        spec.set_mount_prefix(&self.path);
        spec
    }

    /// Appends the spec with this location's path in place of its prefix.
    pub fn to_wire(&self, dest: &mut MessageWriter) {
        self.spec.to_wire(dest, Some(&self.path));
    }

    fn at(&self, path: &str) -> MountLocation {
        MountLocation { spec: self.spec.clone(), path: canonicalize_path(path) }
    }

    /// Remainder of `descendant`'s path, starting with a separator.
    fn remainder<'a>(&self, descendant: &'a MountLocation) -> Option<&'a str> {
        if !SpecRef::ptr_eq(&self.spec, &descendant.spec) {
            return None;
        }
        match_prefix(&descendant.path, &self.path).filter(|rest| rest.starts_with(SEPARATOR))
    }
}

impl PartialEq for MountLocation {
    fn eq(&self, other: &Self) -> bool {
        SpecRef::ptr_eq(&self.spec, &other.spec) && self.path == other.path
    }
}

impl Eq for MountLocation {}

impl Hash for MountLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.spec.as_ptr().hash(state);
        self.path.hash(state);
    }
}
