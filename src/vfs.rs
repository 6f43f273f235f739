//! The virtual file system façade.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    File Access Flow                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  get_file(name)                                             │
//! │      ├─► Global bundles (newest first)                      │
//! │      │   └─► BundleStore::get_from_global                   │
//! │      │                                                      │
//! │      └─► on NotFound: Disk                                  │
//! │          └─► DiskCache::get                                 │
//! │                                                             │
//! │  get_file_from_mounted_bundle(bundle, name)                 │
//! │      └─► BundleStore::get_from_mounted  (never falls back)  │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;

use crate::bundle::{Bundle, BundleStore};
use crate::config::{self, Config, ConfigBuilder};
use crate::disk::{DiskCache, ReloadMode};
use crate::error::VfsResult;
use crate::file::FileHandle;

/// Uniform access to files in bundles and on disk.
pub struct VirtualFileSystem {
    disk: DiskCache,
    bundles: BundleStore,
}

impl VirtualFileSystem {
    /// Create a file system with the global configuration.
    pub fn new() -> Self {
        Self::with_config(config::get())
    }

    /// Create a file system with an explicit configuration.
    pub fn with_config(config: &Config) -> Self {
        Self {
            disk: DiskCache::with_config(config),
            bundles: BundleStore::new(),
        }
    }

    /// Create a file system starting in the given reload mode.
    pub fn with_reload_mode(mode: ReloadMode) -> Self {
        Self::with_config(&ConfigBuilder::new().reload_mode(mode).build())
    }

    // =========================================================================
    // File access
    // =========================================================================

    /// Resolve a file through the global bundles, falling back to disk.
    ///
    /// Mounted bundles are never searched here; use
    /// [`get_file_from_mounted_bundle`](Self::get_file_from_mounted_bundle).
    pub fn get_file(&self, name: &str) -> VfsResult<FileHandle> {
        match self.get_file_from_global_bundle(name) {
            Err(err) if err.is_not_found() => self.get_file_from_disk(name),
            other => other,
        }
    }

    /// Load a file from disk.
    pub fn get_file_from_disk(&self, path: impl AsRef<Path>) -> VfsResult<FileHandle> {
        self.disk.get(path).map(FileHandle::new)
    }

    /// Resolve a file through the global bundles only.
    pub fn get_file_from_global_bundle(&self, name: &str) -> VfsResult<FileHandle> {
        self.bundles.get_from_global(name).map(FileHandle::new)
    }

    /// Resolve a file inside one mounted bundle.
    pub fn get_file_from_mounted_bundle(
        &self,
        bundle_name: &str,
        file_name: &str,
    ) -> VfsResult<FileHandle> {
        self.bundles
            .get_from_mounted(bundle_name, file_name)
            .map(FileHandle::new)
    }

    // =========================================================================
    // Bundles
    // =========================================================================

    /// Add a global bundle with the highest search priority.
    pub fn add_global_bundle(&self, bundle: Bundle) {
        self.bundles.add_global_bundle(bundle);
    }

    /// Remove a global bundle. Returns `false` if it was not registered.
    pub fn remove_global_bundle(&self, bundle: &Bundle) -> bool {
        self.bundles.remove_global_bundle(bundle)
    }

    /// Mount a bundle that is only reachable by name.
    pub fn add_bundle(&self, name: impl Into<String>, bundle: Bundle) {
        self.bundles.add_bundle(name, bundle);
    }

    /// Unmount a named bundle. Returns `false` if nothing was mounted.
    pub fn remove_bundle(&self, name: &str) -> bool {
        self.bundles.remove_bundle(name)
    }

    /// The bundle store.
    pub fn bundles(&self) -> &BundleStore {
        &self.bundles
    }

    // =========================================================================
    // Live reload
    // =========================================================================

    /// Start background live reloading.
    pub fn enable_live_reload(&self) {
        self.disk.enable_live_reload();
    }

    /// Stop automatic live reloading.
    pub fn disable_live_reload(&self) {
        self.disk.disable_live_reload();
    }

    /// Current reload mode.
    pub fn reload_mode(&self) -> ReloadMode {
        self.disk.reload_mode()
    }

    /// Switch reload mode.
    pub fn set_reload_mode(&self, mode: ReloadMode) {
        self.disk.set_reload_mode(mode);
    }

    /// Scan for changed disk files. Only effective in [`ReloadMode::Poll`].
    pub fn poll_for_updated_files(&self) -> usize {
        self.disk.poll_for_updated_files()
    }

    /// The disk cache.
    pub fn disk(&self) -> &DiskCache {
        &self.disk
    }
}

impl Default for VirtualFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VfsError;
    use crate::resource::ReloadObserver;
    use std::fs::{self, File};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn read(file: &FileHandle) -> Vec<u8> {
        file.read().unwrap().to_vec()
    }

    fn checksum(file: &FileHandle) -> u64 {
        file.read()
            .unwrap()
            .iter()
            .fold(0xcbf2_9ce4_8422_2325, |hash, &b| {
                (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
            })
    }

    fn rewrite(path: &Path, content: &str) {
        let before = fs::metadata(path).and_then(|m| m.modified()).unwrap_or(SystemTime::now());
        fs::write(path, content).unwrap();
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(before + Duration::from_secs(5)).unwrap();
    }

    fn counting_observer() -> (Arc<AtomicUsize>, Arc<dyn ReloadObserver>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let observer: Arc<dyn ReloadObserver> = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (hits, observer)
    }

    #[test]
    fn test_hello_world_bundle() {
        let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::None);
        let bundle =
            Bundle::from_json_table(&b"helloworld"[..], r#"{"a":[0,5],"b":[5,5]}"#).unwrap();
        vfs.add_global_bundle(bundle);

        assert_eq!(read(&vfs.get_file_from_global_bundle("a").unwrap()), b"hello");
        assert_eq!(read(&vfs.get_file_from_global_bundle("b").unwrap()), b"world");
        assert!(
            vfs.get_file_from_global_bundle("c")
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn test_bundles_take_priority_over_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.txt");
        fs::write(&path, "from disk").unwrap();
        let name = path.to_str().unwrap();

        let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::None);
        assert_eq!(read(&vfs.get_file(name).unwrap()), b"from disk");

        vfs.add_global_bundle(Bundle::builder().file(name, "from bundle").build());
        let file = vfs.get_file(name).unwrap();
        assert_eq!(read(&file), b"from bundle");
        assert!(file.is_read_only());
    }

    #[test]
    fn test_get_file_reports_disk_not_found() {
        let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::None);
        vfs.add_global_bundle(Bundle::builder().file("a", "x").build());
        let err = vfs.get_file("/definitely/not/here").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_get_file_propagates_other_bundle_errors() {
        let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::None);
        vfs.add_global_bundle(Bundle::from_static(b"abc", [("broken", 1, 9)]));
        assert!(matches!(
            vfs.get_file("broken"),
            Err(VfsError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_get_file_skips_mounted_bundles() {
        let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::None);
        vfs.add_bundle("assets", Bundle::builder().file("only-mounted", "m").build());

        assert!(vfs.get_file("only-mounted").unwrap_err().is_not_found());
        let file = vfs
            .get_file_from_mounted_bundle("assets", "only-mounted")
            .unwrap();
        assert_eq!(read(&file), b"m");
    }

    #[test]
    fn test_shadowed_handle_is_disowned_on_removal() {
        let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::None);
        let a = Bundle::builder().file("x", "A").build();
        let b = Bundle::builder().file("x", "B").build();
        vfs.add_global_bundle(a);
        vfs.add_global_bundle(b.clone());

        let from_b = vfs.get_file("x").unwrap();
        assert_eq!(read(&from_b), b"B");

        assert!(vfs.remove_global_bundle(&b));
        assert_eq!(read(&vfs.get_file("x").unwrap()), b"A");
        assert!(from_b.is_disowned());
        assert!(matches!(from_b.read(), Err(VfsError::Disowned)));
    }

    #[test]
    fn test_cache_identity_via_observers() {
        let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::None);
        vfs.add_global_bundle(Bundle::builder().file("x", "data").build());

        let first = vfs.get_file("x").unwrap();
        let second = vfs.get_file("x").unwrap();
        assert!(first.same_resource(&second));

        let (hits, observer) = counting_observer();
        first.add_observer(observer);
        second.reload().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disk_cache_identity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "v1").unwrap();

        let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::None);
        let first = vfs.get_file_from_disk(&path).unwrap();
        let second = vfs.get_file_from_disk(&path).unwrap();

        let (hits, observer) = counting_observer();
        second.add_observer(observer);
        first.reload().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!first.is_read_only());
        assert!(first.last_modified().is_some());
        assert!(matches!(first.write(b"x"), Err(VfsError::NotImplemented)));
    }

    #[test]
    fn test_remount_serves_fresh_resources() {
        let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::None);
        vfs.add_bundle("ui", Bundle::builder().file("f", "one").build());
        let old = vfs.get_file_from_mounted_bundle("ui", "f").unwrap();

        vfs.add_bundle("ui", Bundle::builder().file("f", "two").build());
        assert!(old.is_disowned());
        let new = vfs.get_file_from_mounted_bundle("ui", "f").unwrap();
        assert!(!new.same_resource(&old));
        assert_eq!(read(&new), b"two");
    }

    #[test]
    fn test_noop_poll_keeps_bytes_and_observers_quiet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.bin");
        fs::write(&path, [7u8; 64]).unwrap();

        let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::Poll);
        let file = vfs.get_file_from_disk(&path).unwrap();
        let (hits, observer) = counting_observer();
        file.add_observer(observer);

        let before = checksum(&file);
        assert_eq!(vfs.poll_for_updated_files(), 0);
        assert_eq!(checksum(&file), before);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_poll_live_reload_end_to_end() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "v1").unwrap();

        let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::None);
        let file = vfs.get_file_from_disk(&path).unwrap();
        assert_eq!(read(&file), b"v1");

        rewrite(&path, "v2");
        vfs.set_reload_mode(ReloadMode::Poll);
        assert_eq!(read(&file), b"v1");

        assert_eq!(vfs.poll_for_updated_files(), 1);
        assert_eq!(read(&file), b"v2");
    }

    #[test]
    fn test_live_reload_controls() {
        let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::Poll);
        vfs.enable_live_reload();
        assert_eq!(vfs.reload_mode(), ReloadMode::Async);
        vfs.disable_live_reload();
        assert_eq!(vfs.reload_mode(), ReloadMode::None);
    }

    #[test]
    fn test_drop_disowns_all_handles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "v1").unwrap();

        let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::Async);
        vfs.add_global_bundle(Bundle::builder().file("g", "1").build());
        vfs.add_bundle("m", Bundle::builder().file("f", "2").build());
        let handles = [
            vfs.get_file_from_disk(&path).unwrap(),
            vfs.get_file("g").unwrap(),
            vfs.get_file_from_mounted_bundle("m", "f").unwrap(),
        ];

        drop(vfs);
        for handle in &handles {
            assert!(handle.is_disowned());
            assert!(handle.read().is_err());
        }
    }

    #[test]
    fn test_concurrent_lookups_share_resource() {
        let vfs = Arc::new(VirtualFileSystem::with_reload_mode(ReloadMode::None));
        vfs.add_global_bundle(Bundle::builder().file("x", "shared").build());
        let anchor = vfs.get_file("x").unwrap();

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let vfs = vfs.clone();
                std::thread::spawn(move || vfs.get_file("x").unwrap())
            })
            .collect();

        for thread in threads {
            let handle = thread.join().unwrap();
            assert!(handle.same_resource(&anchor));
        }
    }
}
