//! Error type shared by every file-resolution path.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type VfsResult<T> = Result<T, VfsError>;

/// Error type for file lookups and resource access.
///
/// Lookup failures are structured so callers can branch on them, while
/// `Display` gives a readable message.
///
/// # Example
///
/// ```ignore
/// match vfs.get_file("shaders/main.wgsl") {
///     Ok(file) => { /* read it */ }
///     Err(VfsError::NotFound { name }) => eprintln!("missing: {name}"),
///     Err(VfsError::Disowned) => eprintln!("file system was torn down"),
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum VfsError {
    /// File absent from every searched bundle, or disk path unreadable.
    #[error("file \"{name}\" does not exist")]
    NotFound {
        /// Requested file name or path.
        name: String,
    },

    /// No bundle is mounted under the requested name.
    #[error("bundle \"{name}\" does not exist")]
    BundleNotFound {
        /// Requested mount name.
        name: String,
    },

    /// The size of a disk file could not be determined while loading it.
    #[error("size of \"{}\" could not be determined: {source}", path.display())]
    SizeUnavailable {
        /// Path of the file being loaded.
        path: PathBuf,
        /// Underlying metadata error.
        #[source]
        source: std::io::Error,
    },

    /// The resource was invalidated by its owning manager.
    #[error("resource has been disowned, its data is no longer valid")]
    Disowned,

    /// Write attempted on a resource that references bundle memory.
    #[error("cannot write to a bundle resource")]
    ReadOnly,

    /// Write attempted on a disk resource.
    #[error("writing disk resources is not implemented")]
    NotImplemented,

    /// A bundle table entry points outside its blob.
    #[error("entry \"{name}\" ({offset}+{length}) is outside the bundle blob of {blob_len} bytes")]
    OutOfBounds {
        /// File name of the entry.
        name: String,
        /// Recorded start offset.
        offset: usize,
        /// Recorded length.
        length: usize,
        /// Actual blob length.
        blob_len: usize,
    },

    /// Reading an opened disk file failed.
    #[error("failed to read \"{}\": {source}", path.display())]
    Io {
        /// Path of the file being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A serialized bundle table could not be parsed.
    #[error("invalid bundle table: {0}")]
    InvalidTable(#[from] serde_json::Error),
}

impl VfsError {
    /// Create a not-found error for a name or path.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a bundle-not-found error.
    pub fn bundle_not_found(name: impl Into<String>) -> Self {
        Self::BundleNotFound { name: name.into() }
    }

    /// Check if this is a [`VfsError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a [`VfsError::Disowned`].
    pub fn is_disowned(&self) -> bool {
        matches!(self, Self::Disowned)
    }
}
