//! Routing table of currently mounted specs.
//!
//! A daemon keeps one entry per active mount. Incoming requests name a spec
//! and a path; the table finds the mount whose parameters equal the request's
//! and whose prefix contains the path. Lookups are pure and never block, so
//! the table can live behind a plain `RwLock`.

use tracing::debug;

use crate::registry::SpecRef;
use crate::spec::MountSpec;

/// Set of mounted canonical specs.
#[derive(Debug, Default)]
pub struct MountTable {
    mounts: Vec<SpecRef>,
}

impl MountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mount, canonicalizing `spec` first.
    ///
    /// Returns the canonical spec now in the table. Mounting an equal spec
    /// twice keeps a single entry.
    pub fn mount(&mut self, spec: &SpecRef) -> SpecRef {
        let spec = spec.canonical();
        if !self.mounts.iter().any(|mounted| SpecRef::ptr_eq(mounted, &spec)) {
            debug!("mounted {}", spec.spec());
            self.mounts.push(spec.clone());
        }
        spec
    }

    /// Removes the mount equal to `spec`. Returns whether one was present.
    pub fn unmount(&mut self, spec: &MountSpec) -> bool {
        let before = self.mounts.len();
        self.mounts.retain(|mounted| mounted.spec() != spec);
        let removed = self.mounts.len() != before;
        if removed {
            debug!("unmounted {}", spec);
        }
        removed
    }

    /// Finds the mount serving `path` for the parameters of `query`.
    ///
    /// When mounts are nested the one with the longest prefix wins.
    pub fn lookup(&self, query: &MountSpec, path: &str) -> Option<&SpecRef> {
        self.mounts
            .iter()
            .filter(|mounted| mounted.matches_with_path(query, path))
            .max_by_key(|mounted| mounted.mount_prefix().len())
    }

    /// Finds the mount serving `query`'s own prefix.
    pub fn lookup_spec(&self, query: &MountSpec) -> Option<&SpecRef> {
        self.lookup(query, query.mount_prefix())
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpecRef> {
        self.mounts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dav(prefix: &str) -> SpecRef {
        let mut spec = MountSpec::new(Some("dav-table-test"));
        spec.set("host", "dav.example.com");
        spec.set_mount_prefix(prefix);
        SpecRef::new(spec)
    }

    #[test]
    fn mount_is_idempotent() {
        let mut table = MountTable::new();
        let first = table.mount(&dav("/"));
        let second = table.mount(&dav("/"));
        assert!(SpecRef::ptr_eq(&first, &second));
        assert!(first.is_canonical());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn lookup_prefers_longest_prefix() {
        let mut table = MountTable::new();
        table.mount(&dav("/"));
        table.mount(&dav("/projects"));

        let mut query = MountSpec::new(Some("dav-table-test"));
        query.set("host", "dav.example.com");

        let found = table.lookup(&query, "/projects/rust").expect("nested mount");
        assert_eq!(found.mount_prefix(), "/projects");
        let found = table.lookup(&query, "/projectsX").expect("root mount");
        assert_eq!(found.mount_prefix(), "/");
    }

    #[test]
    fn lookup_requires_same_parameters() {
        let mut table = MountTable::new();
        table.mount(&dav("/"));

        let mut query = MountSpec::new(Some("dav-table-test"));
        query.set("host", "other.example.com");
        assert!(table.lookup(&query, "/anything").is_none());
    }

    #[test]
    fn lookup_spec_uses_query_prefix() {
        let mut table = MountTable::new();
        table.mount(&dav("/projects"));

        let mut query = dav("/projects/rust").spec().clone();
        assert!(table.lookup_spec(&query).is_some());
        query.set_mount_prefix("/other");
        assert!(table.lookup_spec(&query).is_none());
    }

    #[test]
    fn unmount_removes_entry() {
        let mut table = MountTable::new();
        let mounted = table.mount(&dav("/projects"));
        assert!(table.unmount(&mounted));
        assert!(!table.unmount(&mounted));
        assert!(table.is_empty());
    }
}
