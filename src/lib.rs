//! # bundle-vfs
//!
//! Virtual file access over two sources behind one handle type:
//!
//! - **Bundles**: files packed into an in-memory blob with an offset table,
//!   searched globally (newest bundle first) or mounted under a name
//! - **Disk**: files read from the operating system, with live reload
//!
//! Resources are cached with weak references: a lookup for a file that is
//! still held somewhere returns the same resource, and a resource nobody
//! holds is simply gone. Invalidated resources are *disowned* and fail
//! every later read instead of returning stale data.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bundle_vfs::{Bundle, ReloadMode, VirtualFileSystem};
//!
//! let vfs = VirtualFileSystem::with_reload_mode(ReloadMode::Poll);
//! vfs.add_global_bundle(Bundle::builder().file("motd.txt", "hello").build());
//!
//! // Bundled file
//! let motd = vfs.get_file("motd.txt")?;
//! assert_eq!(&*motd.read()?, b"hello");
//!
//! // Not in any bundle: falls back to disk
//! let config = vfs.get_file("settings.toml")?;
//! config.add_observer(std::sync::Arc::new(|| println!("settings changed")));
//!
//! // Pick up on-disk edits
//! vfs.poll_for_updated_files();
//! # Ok::<(), bundle_vfs::VfsError>(())
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Reload mode and scan interval defaults
//! - [`resource`]: The cached unit of file content and its access guard
//! - [`bundle`]: Bundle definition and the global/mounted bundle store
//! - [`disk`]: Disk cache and live reload
//! - [`mod@file`]: Caller-facing file handles
//! - [`vfs`]: The façade combining all of the above

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bundle;
pub mod config;
pub mod disk;
pub mod error;
pub mod file;
#[cfg(feature = "logging")]
pub mod logging;
pub mod resource;
pub mod vfs;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use bundle_vfs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Bundle, FileHandle, ReloadMode, ReloadObserver, VfsError, VfsResult, VirtualFileSystem,
    };
}

pub use bundle::{Bundle, BundleBuilder, BundleStore, FileTable, FileTableEntry};
pub use config::{Config, ConfigBuilder};
pub use disk::{DiskCache, ReloadMode};
pub use error::{VfsError, VfsResult};
pub use file::FileHandle;
pub use resource::{AccessGuard, ReloadObserver, Resource, Timestamp};
pub use vfs::VirtualFileSystem;
