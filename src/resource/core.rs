//! The cached unit of file content.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard};

use super::observer::{ObserverSet, ReloadObserver};
use super::read::{Timestamp, last_modified, read_disk};
use crate::error::{VfsError, VfsResult};

// =============================================================================
// Backing
// =============================================================================

/// Where a resource's bytes live.
enum Backing {
    /// View into bundle memory. Never changes.
    Reference(Bytes),
    /// Bytes loaded from disk, owned by the resource.
    Disk(Vec<u8>),
}

impl Backing {
    fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Reference(bytes) => &bytes[..],
            Self::Disk(bytes) => bytes,
        }
    }
}

// =============================================================================
// Resource
// =============================================================================

/// The content of one logical file plus its lifecycle state.
///
/// Two lock domains: the data lock guards the bytes, the observer lock
/// guards the listener list. Observers are only invoked after the data
/// lock is released. The source path never changes and the modification
/// time sits behind its own short-lived lock, so metadata queries do not
/// contend with an outstanding [`AccessGuard`].
///
/// Once [`disown`](Self::disown) has been called every `read` and
/// `reload` fails with [`VfsError::Disowned`].
pub struct Resource {
    data: Mutex<Backing>,
    path: Option<PathBuf>,
    modified: Mutex<Option<Timestamp>>,
    observers: ObserverSet,
    disowned: AtomicBool,
}

impl Resource {
    /// Create a read-only resource referencing bundle memory.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self::with_backing(Backing::Reference(bytes), None, None)
    }

    /// Create a resource by loading `path` from disk in full.
    ///
    /// The modification time is captured alongside the bytes.
    pub fn from_disk(path: impl Into<PathBuf>) -> VfsResult<Self> {
        let path = path.into();
        let modified = last_modified(&path);
        let bytes = read_disk(&path)?;
        Ok(Self::with_backing(Backing::Disk(bytes), Some(path), modified))
    }

    fn with_backing(backing: Backing, path: Option<PathBuf>, modified: Option<Timestamp>) -> Self {
        Self {
            data: Mutex::new(backing),
            path,
            modified: Mutex::new(modified),
            observers: ObserverSet::default(),
            disowned: AtomicBool::new(false),
        }
    }

    /// Lock the data and expose the current bytes.
    ///
    /// Reloads of this resource block until the guard is dropped.
    pub fn read(&self) -> VfsResult<AccessGuard<'_>> {
        let guard = self.data.lock();
        if self.is_disowned() {
            return Err(VfsError::Disowned);
        }
        Ok(AccessGuard { guard })
    }

    /// Writing is not supported for any backing.
    pub fn write(&self, _data: &[u8]) -> VfsResult<()> {
        if self.is_from_disk() {
            Err(VfsError::NotImplemented)
        } else {
            Err(VfsError::ReadOnly)
        }
    }

    /// Re-read the file from disk and notify observers.
    ///
    /// Reference-backed resources keep their bytes but still notify.
    /// If the re-read fails the previous bytes stay in place and no
    /// observer is called.
    pub fn reload(&self) -> VfsResult<()> {
        {
            let mut data = self.data.lock();
            if self.is_disowned() {
                return Err(VfsError::Disowned);
            }
            if let Some(path) = &self.path {
                let modified = last_modified(path);
                let bytes = read_disk(path)?;
                tracing::debug!(path = %path.display(), len = bytes.len(), "reloaded resource");
                *data = Backing::Disk(bytes);
                *self.modified.lock() = modified;
            }
        }

        self.observers.notify();
        Ok(())
    }

    /// Permanently invalidate the resource. Idempotent.
    pub fn disown(&self) {
        self.disowned.store(true, Ordering::Release);
    }

    /// Whether the resource has been disowned.
    #[inline]
    pub fn is_disowned(&self) -> bool {
        self.disowned.load(Ordering::Acquire)
    }

    /// Modification time recorded at the last (re)load. Disk only.
    pub fn last_modified(&self) -> Option<Timestamp> {
        *self.modified.lock()
    }

    /// Source path of a disk resource.
    pub fn source_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the bytes were loaded from disk.
    #[inline]
    pub fn is_from_disk(&self) -> bool {
        self.path.is_some()
    }

    /// Whether the bytes reference bundle memory.
    #[inline]
    pub fn is_data_reference(&self) -> bool {
        self.path.is_none()
    }

    /// Register a reload observer.
    pub fn add_observer(&self, observer: Arc<dyn ReloadObserver>) {
        self.observers.add(observer);
    }

    /// Deregister a reload observer. Returns `false` if it was not registered.
    pub fn remove_observer(&self, observer: &Arc<dyn ReloadObserver>) -> bool {
        self.observers.remove(observer)
    }

    /// Whether the file on disk is strictly newer than the loaded bytes.
    ///
    /// Unknown timestamps on either side count as "not newer".
    pub(crate) fn is_stale(&self) -> bool {
        let Some(path) = &self.path else {
            return false;
        };
        match (self.last_modified(), last_modified(path)) {
            (Some(loaded), Some(current)) => current > loaded,
            _ => false,
        }
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("from_disk", &self.is_from_disk())
            .field("disowned", &self.is_disowned())
            .field("observers", &self.observers.len())
            .finish()
    }
}

// =============================================================================
// AccessGuard
// =============================================================================

/// Scoped view of a resource's bytes.
///
/// Holds the resource's data lock; the bytes cannot change while the guard
/// is alive and the borrow checker keeps them from outliving it.
pub struct AccessGuard<'a> {
    guard: MutexGuard<'a, Backing>,
}

impl AccessGuard<'_> {
    /// The current bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        self.guard.as_bytes()
    }
}

impl std::fmt::Debug for AccessGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("len", &self.data().len())
            .finish()
    }
}

impl Deref for AccessGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data()
    }
}

impl AsRef<[u8]> for AccessGuard<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data()
    }
}
