//! Caller-facing file handles.

use std::sync::Arc;

use crate::error::VfsResult;
use crate::resource::{AccessGuard, ReloadObserver, Resource, Timestamp};

/// A handle to a shared [`Resource`].
///
/// Handles are strong references: the resource stays alive (and cached)
/// while any handle exists. Cloning yields another handle to the same
/// resource.
///
/// # Example
///
/// ```
/// use bundle_vfs::{Bundle, ReloadMode, VirtualFileSystem};
///
/// let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::None);
/// vfs.add_global_bundle(Bundle::builder().file("greeting", "hello").build());
///
/// let file = vfs.get_file("greeting").unwrap();
/// assert!(file.is_read_only());
/// assert_eq!(&*file.read().unwrap(), b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct FileHandle {
    resource: Arc<Resource>,
}

impl FileHandle {
    /// Wrap a shared resource.
    pub fn new(resource: Arc<Resource>) -> Self {
        Self { resource }
    }

    /// Lock the file's bytes for reading.
    ///
    /// The bytes are valid only while the guard lives.
    pub fn read(&self) -> VfsResult<AccessGuard<'_>> {
        self.resource.read()
    }

    /// Not supported: fails with `ReadOnly` or `NotImplemented`.
    pub fn write(&self, data: &[u8]) -> VfsResult<()> {
        self.resource.write(data)
    }

    /// Re-read the file and notify observers.
    pub fn reload(&self) -> VfsResult<()> {
        self.resource.reload()
    }

    /// Bundle files are read-only.
    pub fn is_read_only(&self) -> bool {
        self.resource.is_data_reference()
    }

    /// Whether the file system has invalidated this file.
    pub fn is_disowned(&self) -> bool {
        self.resource.is_disowned()
    }

    /// Modification time at the last (re)load, for disk files.
    pub fn last_modified(&self) -> Option<Timestamp> {
        self.resource.last_modified()
    }

    /// Register an observer for reload events.
    pub fn add_observer(&self, observer: Arc<dyn ReloadObserver>) {
        self.resource.add_observer(observer);
    }

    /// Deregister an observer.
    pub fn remove_observer(&self, observer: &Arc<dyn ReloadObserver>) -> bool {
        self.resource.remove_observer(observer)
    }

    /// Whether both handles refer to the same resource instance.
    pub fn same_resource(&self, other: &FileHandle) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }

    /// The underlying resource.
    pub fn resource(&self) -> &Arc<Resource> {
        &self.resource
    }
}

impl From<Arc<Resource>> for FileHandle {
    fn from(resource: Arc<Resource>) -> Self {
        Self::new(resource)
    }
}
