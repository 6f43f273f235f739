//! Global and mounted bundle management.
//!
//! # Caching Strategy
//!
//! ```text
//! BundleStore
//! ├── global: Mutex<GlobalBundles>
//! │   ├── bundles: Vec<(BundleId, Bundle)>        (front = highest priority)
//! │   └── resources: FxHashMap<name, GlobalEntry>
//! │       └── GlobalEntry { bundle: BundleId, resource: Weak<Resource> }
//! └── mounted: RwLock<FxHashMap<mount name, Mount>>
//!     └── Mount
//!         ├── bundle: Bundle
//!         └── resources: Mutex<FxHashMap<name, Weak<Resource>>>
//! ```
//!
//! Every invalidation disowns the cached resource before evicting it, so a
//! handle can never keep reading data that is no longer reachable under the
//! name it was requested by.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use super::def::Bundle;
use crate::error::{VfsError, VfsResult};
use crate::resource::Resource;

/// Identifies a global bundle for the lifetime of its registration.
///
/// Cache entries record the id of the bundle that served them, so removal
/// evicts exactly those entries even if another bundle shadows the name.
type BundleId = u64;

struct GlobalEntry {
    bundle: BundleId,
    resource: Weak<Resource>,
}

#[derive(Default)]
struct GlobalBundles {
    bundles: Vec<(BundleId, Bundle)>,
    resources: FxHashMap<String, GlobalEntry>,
    next_id: BundleId,
}

struct Mount {
    bundle: Bundle,
    resources: Mutex<FxHashMap<String, Weak<Resource>>>,
}

impl Mount {
    fn new(bundle: Bundle) -> Self {
        Self {
            bundle,
            resources: Mutex::new(FxHashMap::default()),
        }
    }

    /// Disown every resource served from this mount. Returns how many were live.
    fn disown_all(&self) -> usize {
        self.resources
            .lock()
            .drain()
            .filter(|(_, weak)| disown_weak(weak))
            .count()
    }
}

/// Disown the target of a weak reference if it is still alive.
fn disown_weak(weak: &Weak<Resource>) -> bool {
    match weak.upgrade() {
        Some(resource) => {
            resource.disown();
            true
        }
        None => false,
    }
}

/// Manages global (implicitly searched) and mounted (named) bundles.
///
/// Global bundles are searched newest-first. Mounted bundles are only
/// reachable through [`BundleStore::get_from_mounted`].
#[derive(Default)]
pub struct BundleStore {
    global: Mutex<GlobalBundles>,
    mounted: RwLock<FxHashMap<String, Mount>>,
}

impl BundleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Global bundles
    // =========================================================================

    /// Add a global bundle with the highest priority.
    ///
    /// Cached global resources whose name appears in the new bundle are
    /// disowned and evicted, as the name may now resolve elsewhere.
    pub fn add_global_bundle(&self, bundle: Bundle) {
        let mut global = self.global.lock();

        let mut shadowed = 0;
        for name in bundle.names() {
            if let Some(entry) = global.resources.remove(name)
                && disown_weak(&entry.resource)
            {
                shadowed += 1;
            }
        }

        let id = global.next_id;
        global.next_id += 1;
        global.bundles.insert(0, (id, bundle));
        tracing::debug!(id, shadowed, total = global.bundles.len(), "added global bundle");
    }

    /// Remove a global bundle, disowning every resource it served.
    ///
    /// Returns `false` if no matching bundle is registered.
    pub fn remove_global_bundle(&self, bundle: &Bundle) -> bool {
        let mut global = self.global.lock();

        let Some(pos) = global
            .bundles
            .iter()
            .position(|(_, b)| b.is_same_bundle(bundle))
        else {
            return false;
        };
        let (id, _) = global.bundles.remove(pos);

        let mut disowned = 0;
        global.resources.retain(|_, entry| {
            if entry.bundle != id {
                return true;
            }
            if disown_weak(&entry.resource) {
                disowned += 1;
            }
            false
        });
        tracing::debug!(id, disowned, "removed global bundle");
        true
    }

    /// Resolve a file through the global bundles.
    pub fn get_from_global(&self, name: &str) -> VfsResult<Arc<Resource>> {
        let mut global = self.global.lock();

        if let Some(resource) = global.resources.get(name).and_then(|e| e.resource.upgrade()) {
            tracing::trace!(name, "global cache hit");
            return Ok(resource);
        }

        let Some((id, data)) = global
            .bundles
            .iter()
            .find(|(_, bundle)| bundle.contains(name))
            .map(|(id, bundle)| bundle.slice(name).map(|data| (*id, data)))
            .transpose()?
        else {
            return Err(VfsError::not_found(name));
        };

        let resource = Arc::new(Resource::from_bytes(data));
        global.resources.retain(|_, e| e.resource.strong_count() > 0);
        global.resources.insert(
            name.to_owned(),
            GlobalEntry {
                bundle: id,
                resource: Arc::downgrade(&resource),
            },
        );
        tracing::debug!(name, bundle = id, "loaded global bundle resource");
        Ok(resource)
    }

    /// Number of registered global bundles.
    pub fn global_bundle_count(&self) -> usize {
        self.global.lock().bundles.len()
    }

    // =========================================================================
    // Mounted bundles
    // =========================================================================

    /// Mount a bundle under `name`, replacing (and invalidating) any previous one.
    pub fn add_bundle(&self, name: impl Into<String>, bundle: Bundle) {
        let name = name.into();
        let mut mounted = self.mounted.write();
        if let Some(old) = mounted.remove(&name) {
            let disowned = old.disown_all();
            tracing::debug!(mount = %name, disowned, "replaced mounted bundle");
        } else {
            tracing::debug!(mount = %name, "mounted bundle");
        }
        mounted.insert(name, Mount::new(bundle));
    }

    /// Unmount the bundle under `name`, disowning every resource it served.
    ///
    /// Returns `false` if nothing was mounted there.
    pub fn remove_bundle(&self, name: &str) -> bool {
        let Some(old) = self.mounted.write().remove(name) else {
            return false;
        };
        let disowned = old.disown_all();
        tracing::debug!(mount = name, disowned, "unmounted bundle");
        true
    }

    /// Resolve a file inside one mounted bundle.
    pub fn get_from_mounted(&self, bundle_name: &str, file_name: &str) -> VfsResult<Arc<Resource>> {
        let mounted = self.mounted.read();
        let mount = mounted
            .get(bundle_name)
            .ok_or_else(|| VfsError::bundle_not_found(bundle_name))?;

        let mut resources = mount.resources.lock();
        if let Some(resource) = resources.get(file_name).and_then(Weak::upgrade) {
            tracing::trace!(mount = bundle_name, name = file_name, "mount cache hit");
            return Ok(resource);
        }

        let resource = Arc::new(Resource::from_bytes(mount.bundle.slice(file_name)?));
        resources.retain(|_, weak| weak.strong_count() > 0);
        resources.insert(file_name.to_owned(), Arc::downgrade(&resource));
        tracing::debug!(mount = bundle_name, name = file_name, "loaded mounted bundle resource");
        Ok(resource)
    }

    /// Check if a bundle is mounted under `name`.
    pub fn is_mounted(&self, name: &str) -> bool {
        self.mounted.read().contains_key(name)
    }

    /// Names of all mounted bundles.
    pub fn mounted_names(&self) -> Vec<String> {
        self.mounted.read().keys().cloned().collect()
    }
}

impl Drop for BundleStore {
    fn drop(&mut self) {
        let global = self.global.get_mut();
        for entry in global.resources.values() {
            disown_weak(&entry.resource);
        }
        for mount in self.mounted.get_mut().values() {
            mount.disown_all();
        }
    }
}
