//! Bundles: immutable blobs with a file table, and the store that serves them.

mod def;
mod store;

pub use def::{Bundle, BundleBuilder, FileTable, FileTableEntry};
pub use store::BundleStore;
