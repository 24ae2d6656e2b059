//! Canonical mount spec registry.
//!
//! Every process that asks for the same mount should end up talking about
//! the same object, so identical specs are interned: the registry maps each
//! equality class of [`MountSpec`] to one shared [`SpecRef`]. Callers can
//! then compare canonical specs by identity with [`SpecRef::ptr_eq`].
//!
//! The registry only holds weak back references. The last [`SpecRef`] to a
//! canonical spec removes the entry from its registry when it is dropped, so
//! a spec lives exactly as long as somebody uses it.
//!
//! All lookups, inserts and removals happen under a single mutex. No user
//! code runs while it is held, and strong references obtained during a
//! lookup are released only after the lock is gone, since releasing the
//! last one re-enters the registry.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::spec::MountSpec;

/// Weak references to the canonical specs sharing one hash value.
type Bucket = SmallVec<[Weak<SpecNode>; 1]>;

static GLOBAL: OnceLock<SpecRegistry> = OnceLock::new();

struct RegistryTable {
    buckets: Mutex<HashMap<u32, Bucket>>,
}

impl RegistryTable {
    fn lock(&self) -> MutexGuard<'_, HashMap<u32, Bucket>> {
        // the table is never left half-updated, so a poisoned lock is still usable
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, node: &SpecNode) {
        let mut buckets = self.lock();
        if let Entry::Occupied(mut entry) = buckets.entry(node.spec.spec_hash()) {
            entry
                .get_mut()
                .retain(|weak| weak.strong_count() > 0 && !std::ptr::eq(weak.as_ptr(), node));
            if entry.get().is_empty() {
                entry.remove();
            }
            trace!("removed canonical mount spec {}", node.spec);
        }
    }
}

/// Shared allocation behind a [`SpecRef`].
struct SpecNode {
    spec: MountSpec,
    /// Set for canonical specs: the registry that must forget this node
    registry: Option<Weak<RegistryTable>>,
}

impl Drop for SpecNode {
    fn drop(&mut self) {
        if let Some(table) = self.registry.as_ref().and_then(Weak::upgrade) {
            table.remove(self);
        }
    }
}

/// Interning table mapping mount specs to their canonical instance.
///
/// Cloning a registry yields another handle to the same table.
#[derive(Clone)]
pub struct SpecRegistry {
    table: Arc<RegistryTable>,
}

impl SpecRegistry {
    /// Creates an empty registry, independent of the process-wide one.
    pub fn new() -> Self {
        Self {
            table: Arc::new(RegistryTable { buckets: Mutex::new(HashMap::new()) }),
        }
    }

    /// Returns the process-wide registry, creating it on first use.
    pub fn global() -> &'static SpecRegistry {
        GLOBAL.get_or_init(SpecRegistry::new)
    }

    /// Returns the canonical instance for `spec`'s equality class.
    ///
    /// If no canonical instance exists, `spec` itself becomes the canonical
    /// instance. Otherwise the existing one is returned and `spec` is
    /// dropped. Concurrent calls with equal specs always converge on one
    /// instance.
    pub fn canonical_for(&self, spec: MountSpec) -> SpecRef {
        let hash = spec.spec_hash();
        // declared before the guard so these drop after it is released
        let mut others: SmallVec<[Arc<SpecNode>; 2]> = SmallVec::new();
        let mut buckets = self.table.lock();

        let bucket = buckets.entry(hash).or_default();
        bucket.retain(|weak| weak.strong_count() > 0);
        for weak in bucket.iter() {
            let Some(node) = weak.upgrade() else {
                continue;
            };
            if node.spec == spec {
                debug!("reusing canonical mount spec {}", node.spec);
                return SpecRef(node);
            }
            others.push(node);
        }

        let node = Arc::new(SpecNode { spec, registry: Some(Arc::downgrade(&self.table)) });
        bucket.push(Arc::downgrade(&node));
        debug!("registered canonical mount spec {}", node.spec);
        SpecRef(node)
    }

    /// Returns the canonical instance for a shared spec.
    ///
    /// A spec that is already canonical is returned as another reference to
    /// itself; otherwise its contents are interned.
    pub fn canonicalize(&self, spec: &SpecRef) -> SpecRef {
        if spec.is_canonical() {
            return spec.clone();
        }
        self.canonical_for(spec.0.spec.clone())
    }

    /// Number of live canonical specs.
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .values()
            .flat_map(|bucket| bucket.iter())
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SpecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SpecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecRegistry").field("len", &self.len()).finish()
    }
}

/// Shared, immutable handle to a mount spec.
///
/// Cloning takes another reference; dropping releases it. When the last
/// reference to a canonical spec goes away the spec leaves its registry.
#[derive(Clone)]
pub struct SpecRef(Arc<SpecNode>);

impl SpecRef {
    /// Shares `spec` without publishing it in a registry.
    pub fn new(spec: MountSpec) -> Self {
        SpecRef(Arc::new(SpecNode { spec, registry: None }))
    }

    /// `true` once the instance is the registered representative of its
    /// equality class.
    pub fn is_canonical(&self) -> bool {
        self.0.registry.is_some()
    }

    /// Returns the canonical instance from the process-wide registry.
    pub fn canonical(&self) -> SpecRef {
        SpecRegistry::global().canonicalize(self)
    }

    /// Identity comparison.
    pub fn ptr_eq(a: &SpecRef, b: &SpecRef) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Address of the shared instance, usable as an identity hash.
    pub fn as_ptr(&self) -> *const () {
        Arc::as_ptr(&self.0).cast()
    }

    /// Number of live references to this instance.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    pub fn spec(&self) -> &MountSpec {
        &self.0.spec
    }
}

impl Deref for SpecRef {
    type Target = MountSpec;

    fn deref(&self) -> &MountSpec {
        &self.0.spec
    }
}

impl From<MountSpec> for SpecRef {
    fn from(spec: MountSpec) -> Self {
        SpecRef::new(spec)
    }
}

impl PartialEq for SpecRef {
    fn eq(&self, other: &Self) -> bool {
        SpecRef::ptr_eq(self, other) || self.0.spec == other.0.spec
    }
}

impl Eq for SpecRef {}

impl fmt::Debug for SpecRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecRef")
            .field("spec", &self.0.spec)
            .field("canonical", &self.is_canonical())
            .finish()
    }
}
