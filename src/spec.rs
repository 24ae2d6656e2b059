//! The mount specification value.
//!
//! A [`MountSpec`] identifies a mount by its type-tagged connection
//! parameters (`type=ftp,host=example.com,user=alice`) plus the path prefix
//! it claims. The parameters decide *which* backend connection serves a
//! request, the prefix decides *which part* of that connection's tree.
//!
//! A `MountSpec` is a plain owned value and can be mutated freely. Once it
//! is handed to a [`SpecRegistry`](crate::registry::SpecRegistry) it becomes
//! a shared, immutable [`SpecRef`](crate::registry::SpecRef).

use std::hash::{Hash, Hasher};

use tracing::debug;

use crate::error::SpecError;
use crate::path_util::path_has_prefix;
use crate::registry::{SpecRef, SpecRegistry};
use crate::store::{truncate_at_nul, until_nul, KeyValueItem, KeyValueStore};

/// Key holding the mount type.
pub const TYPE_KEY: &str = "type";
/// Prefix used when none is given.
pub const DEFAULT_MOUNT_PREFIX: &str = "/";

const ARGS_USAGE: &str = "key=value key=value ...";

/// Mount specification: sorted key/value parameters and a mount prefix.
///
/// Equality compares the items pairwise in key order and then the prefix.
/// Ordering follows the same fields. Hashing uses [`MountSpec::spec_hash`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MountSpec {
    items: KeyValueStore,
    mount_prefix: String,
}

impl MountSpec {
    /// Creates an empty spec rooted at `/`, with `type` set when given.
    pub fn new(mount_type: Option<&str>) -> Self {
        let mut spec = Self {
            items: KeyValueStore::new(),
            mount_prefix: DEFAULT_MOUNT_PREFIX.to_string(),
        };
        if let Some(mount_type) = mount_type {
            spec.set(TYPE_KEY, mount_type);
        }
        spec
    }

    /// Builds a spec from already collected items and an optional prefix.
    ///
    /// The prefix ends at its first NUL byte.
    pub fn from_data(items: KeyValueStore, mount_prefix: Option<String>) -> Self {
        let mut mount_prefix = mount_prefix.unwrap_or_else(|| DEFAULT_MOUNT_PREFIX.to_string());
        truncate_at_nul(&mut mount_prefix);
        Self { items, mount_prefix }
    }

    /// Builds a spec from daemon command-line arguments of the form `key=value`.
    ///
    /// The key must be non-empty and so must the value. A `type` is required,
    /// either as `default_type` or as one of the arguments.
    pub fn from_args<I, S>(args: I, default_type: Option<&str>) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut spec = Self::new(default_type);
        let mut found_type = default_type.is_some();

        for arg in args {
            let arg = arg.as_ref();
            let (key, value) = match arg.split_once('=') {
                Some((key, value)) if !key.is_empty() && !value.is_empty() => (key, value),
                _ => return Err(SpecError::Usage(ARGS_USAGE.to_string())),
            };
            if key == TYPE_KEY {
                found_type = true;
            }
            debug!("setting '{}' to '{}'", key, value);
            spec.set(key, value);
        }

        if !found_type {
            return Err(SpecError::MissingType);
        }
        Ok(spec)
    }

    /// Sets a parameter, replacing any previous value under `key`.
    pub fn set(&mut self, key: &str, value: &str) {
        self.items.set(key, value);
    }

    /// Sets a parameter to the first `len` bytes of `value`.
    pub fn set_with_len(&mut self, key: &str, value: &str, len: Option<usize>) {
        self.items.set_with_len(key, value, len);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.get(key)
    }

    /// Returns the `type` parameter.
    pub fn get_type(&self) -> Option<&str> {
        self.get(TYPE_KEY)
    }

    pub fn mount_prefix(&self) -> &str {
        &self.mount_prefix
    }

    /// Replaces the prefix, cut at its first NUL byte.
    pub fn set_mount_prefix(&mut self, mount_prefix: &str) {
        self.mount_prefix = until_nul(mount_prefix).to_string();
    }

    pub fn items(&self) -> &KeyValueStore {
        &self.items
    }

    /// Iterates over the parameters in key order.
    pub fn iter(&self) -> std::slice::Iter<'_, KeyValueItem> {
        self.items.iter()
    }

    /// Compatibility hash of the spec.
    ///
    /// Combines the GLib `g_str_hash` of the prefix with the hashes of every
    /// value using exclusive-or. Keys do not take part, so specs that differ
    /// only in their keys collide.
    pub fn spec_hash(&self) -> u32 {
        self.items
            .iter()
            .fold(str_hash(&self.mount_prefix), |hash, item| hash ^ str_hash(&item.value))
    }

    /// Checks whether this mounted spec serves `path` for the `query` spec.
    ///
    /// Parameters must be identical and `path` must lie under this spec's
    /// mount prefix.
    pub fn matches_with_path(&self, query: &MountSpec, path: &str) -> bool {
        self.items == query.items && path_has_prefix(path, Some(&self.mount_prefix))
    }

    /// Same as [`MountSpec::matches_with_path`] using the query's own prefix
    /// as the path.
    pub fn matches(&self, query: &MountSpec) -> bool {
        self.matches_with_path(query, &query.mount_prefix)
    }

    /// Publishes this spec in the process-wide registry.
    ///
    /// Returns the canonical instance for the spec's equality class; if one
    /// already exists `self` is dropped.
    pub fn into_canonical(self) -> SpecRef {
        SpecRegistry::global().canonical_for(self)
    }
}

impl Default for MountSpec {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Hash for MountSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.spec_hash());
    }
}

/// GLib `g_str_hash` (djb2 over signed chars).
pub(crate) fn str_hash(s: &str) -> u32 {
    s.bytes()
        .fold(5381u32, |hash, byte| hash.wrapping_mul(33).wrapping_add(byte as i8 as u32))
}
