//! Disk-backed resource cache with live reload.
//!
//! ```text
//! DiskCache
//! ├── shared: Arc<DiskShared>
//! │   └── resources: Mutex<FxHashMap<PathBuf, Weak<Resource>>>
//! ├── mode: Mutex<ReloadMode>
//! └── worker: Option<ReloadWorker>  ── only while mode == Async
//!                                      scans every `check_interval`
//! ```
//!
//! Two update paths exist and behave differently:
//!
//! - [`DiskCache::get`] on a file that is newer than its cached resource
//!   builds a *new* resource. Handles to the old one keep the old bytes.
//! - A scan (background or [`DiskCache::poll_for_updated_files`]) reloads
//!   the cached resource *in place* and notifies its observers.

mod reload;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

pub use reload::ReloadMode;
use reload::ReloadWorker;

use crate::config::Config;
use crate::error::VfsResult;
use crate::resource::Resource;

/// State shared between the cache and its background worker.
#[derive(Default)]
pub(crate) struct DiskShared {
    resources: Mutex<FxHashMap<PathBuf, Weak<Resource>>>,
}

impl DiskShared {
    /// Reload every live resource whose file is strictly newer on disk.
    ///
    /// Candidates are collected under the cache lock; the reloads (and the
    /// observer callbacks they fire) run after it is released.
    fn check_for_updated_files(&self) -> usize {
        let stale: Vec<(PathBuf, Arc<Resource>)> = {
            let mut resources = self.resources.lock();
            resources.retain(|_, weak| weak.strong_count() > 0);
            resources
                .iter()
                .filter_map(|(path, weak)| weak.upgrade().map(|res| (path.clone(), res)))
                .filter(|(_, res)| res.is_stale())
                .collect()
        };

        let mut reloaded = 0;
        for (path, resource) in stale {
            match resource.reload() {
                Ok(()) => reloaded += 1,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "live reload failed")
                }
            }
        }
        reloaded
    }
}

/// Maps disk paths to cached resources and keeps them fresh.
pub struct DiskCache {
    shared: Arc<DiskShared>,
    mode: Mutex<ReloadMode>,
    worker: Mutex<Option<ReloadWorker>>,
    check_interval: Duration,
}

impl DiskCache {
    /// Create a cache with the global configuration.
    pub fn new() -> Self {
        Self::with_config(crate::config::get())
    }

    /// Create a cache with an explicit configuration.
    pub fn with_config(config: &Config) -> Self {
        let cache = Self {
            shared: Arc::default(),
            mode: Mutex::new(ReloadMode::None),
            worker: Mutex::new(None),
            check_interval: config.check_interval,
        };
        cache.set_reload_mode(config.reload_mode);
        cache
    }

    /// Get the resource for `path`, loading it on a miss.
    ///
    /// A live cached resource is returned unless the file on disk is
    /// strictly newer, in which case a fresh resource replaces the cache
    /// entry. Unknown timestamps count as unchanged. The file is read
    /// without holding the cache lock.
    pub fn get(&self, path: impl AsRef<Path>) -> VfsResult<Arc<Resource>> {
        let path = path.as_ref();
        if let Some(resource) = self.cached(path) {
            tracing::trace!(path = %path.display(), "disk cache hit");
            return Ok(resource);
        }

        let loaded = Arc::new(Resource::from_disk(path)?);

        let mut resources = self.shared.resources.lock();
        // A concurrent lookup may have loaded the same file meanwhile
        if let Some(existing) = resources.get(path).and_then(Weak::upgrade)
            && !existing.is_stale()
        {
            return Ok(existing);
        }
        resources.retain(|_, weak| weak.strong_count() > 0);
        resources.insert(path.to_path_buf(), Arc::downgrade(&loaded));
        tracing::debug!(path = %path.display(), "loaded disk resource");
        Ok(loaded)
    }

    fn cached(&self, path: &Path) -> Option<Arc<Resource>> {
        let resource = self.shared.resources.lock().get(path).and_then(Weak::upgrade)?;
        if resource.is_stale() {
            tracing::debug!(path = %path.display(), "cached resource outdated, loading fresh copy");
            return None;
        }
        Some(resource)
    }

    /// Current reload mode.
    pub fn reload_mode(&self) -> ReloadMode {
        *self.mode.lock()
    }

    /// Switch reload mode.
    ///
    /// Leaving [`ReloadMode::Async`] stops the worker and waits for it to
    /// exit before returning. The wait happens after the mode and worker
    /// locks are released, so observers running on the worker may still
    /// call back into the cache. Entering it starts the worker if not
    /// running.
    pub fn set_reload_mode(&self, new_mode: ReloadMode) {
        let retired = {
            let mut mode = self.mode.lock();
            let mut worker = self.worker.lock();

            let retired = if new_mode == ReloadMode::Async {
                if worker.is_none() {
                    match ReloadWorker::spawn(self.shared.clone(), self.check_interval) {
                        Ok(spawned) => *worker = Some(spawned),
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to start live reload worker");
                        }
                    }
                }
                None
            } else {
                worker.take()
            };

            if *mode != new_mode {
                tracing::debug!(from = ?*mode, to = ?new_mode, "reload mode changed");
            }
            *mode = new_mode;
            retired
        };

        // Joins the worker
        drop(retired);
    }

    /// Start background live reloading.
    pub fn enable_live_reload(&self) {
        self.set_reload_mode(ReloadMode::Async);
    }

    /// Stop automatic live reloading.
    pub fn disable_live_reload(&self) {
        self.set_reload_mode(ReloadMode::None);
    }

    /// Run one scan for changed files. Only effective in [`ReloadMode::Poll`].
    ///
    /// Returns the number of resources reloaded.
    pub fn poll_for_updated_files(&self) -> usize {
        if self.reload_mode() != ReloadMode::Poll {
            return 0;
        }
        self.shared.check_for_updated_files()
    }

    /// Number of cached resources still held by someone.
    pub fn live_count(&self) -> usize {
        self.shared
            .resources
            .lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

impl Default for DiskCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DiskCache {
    fn drop(&mut self) {
        drop(self.worker.get_mut().take());
        for weak in self.shared.resources.lock().values() {
            if let Some(resource) = weak.upgrade() {
                resource.disown();
            }
        }
    }
}
