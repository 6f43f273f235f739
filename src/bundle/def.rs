//! Bundle definition: a blob plus a name → byte-range table.

use std::sync::Arc;

use bytes::Bytes;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{VfsError, VfsResult};

/// Location of a file within a bundle blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct FileTableEntry {
    /// Byte offset into the blob.
    pub offset: usize,
    /// Length in bytes.
    pub length: usize,
}

impl FileTableEntry {
    /// Create a new entry.
    pub const fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }
}

impl From<(usize, usize)> for FileTableEntry {
    fn from((offset, length): (usize, usize)) -> Self {
        Self::new(offset, length)
    }
}

impl From<FileTableEntry> for (usize, usize) {
    fn from(entry: FileTableEntry) -> Self {
        (entry.offset, entry.length)
    }
}

/// File table of a bundle.
pub type FileTable = FxHashMap<String, FileTableEntry>;

/// A read-only pairing of a byte blob and its file table.
///
/// Cloning is cheap: the blob and table are shared. The blob may live in
/// the binary's data segment ([`Bundle::from_static`]) or be loaded at
/// runtime and handed over as owned [`Bytes`].
///
/// Offsets and lengths are trusted; an entry outside the blob surfaces as
/// [`VfsError::OutOfBounds`] when that file is requested.
#[derive(Debug, Clone)]
pub struct Bundle {
    blob: Bytes,
    files: Arc<FileTable>,
}

impl Bundle {
    /// Create a bundle from a blob and a file table.
    pub fn new(blob: impl Into<Bytes>, files: FileTable) -> Self {
        Self {
            blob: blob.into(),
            files: Arc::new(files),
        }
    }

    /// Create a bundle over a blob linked into the binary.
    ///
    /// # Example
    ///
    /// ```
    /// use bundle_vfs::Bundle;
    ///
    /// static BLOB: &[u8] = b"helloworld";
    /// let bundle = Bundle::from_static(BLOB, [("a", 0, 5), ("b", 5, 5)]);
    /// assert!(bundle.contains("b"));
    /// ```
    pub fn from_static<'a>(
        blob: &'static [u8],
        entries: impl IntoIterator<Item = (&'a str, usize, usize)>,
    ) -> Self {
        let files = entries
            .into_iter()
            .map(|(name, offset, length)| (name.to_owned(), FileTableEntry::new(offset, length)))
            .collect();
        Self::new(Bytes::from_static(blob), files)
    }

    /// Create a bundle whose table is a JSON object of `name: [offset, length]`.
    ///
    /// ```
    /// use bundle_vfs::Bundle;
    ///
    /// let bundle = Bundle::from_json_table(
    ///     &b"helloworld"[..],
    ///     r#"{"a": [0, 5], "b": [5, 5]}"#,
    /// ).unwrap();
    /// assert_eq!(bundle.len(), 2);
    /// ```
    pub fn from_json_table(blob: impl Into<Bytes>, table: &str) -> VfsResult<Self> {
        let files: FileTable = serde_json::from_str(table)?;
        Ok(Self::new(blob, files))
    }

    /// Serialize the file table as JSON in the form read by [`Bundle::from_json_table`].
    pub fn table_json(&self) -> VfsResult<String> {
        Ok(serde_json::to_string(&*self.files)?)
    }

    /// Start building a bundle in memory.
    pub fn builder() -> BundleBuilder {
        BundleBuilder::new()
    }

    /// Check if the bundle contains a file.
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Table entry for a file.
    pub fn entry(&self, name: &str) -> Option<FileTableEntry> {
        self.files.get(name).copied()
    }

    /// Iterate over all file names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of files in the table.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The whole blob.
    pub fn blob(&self) -> &Bytes {
        &self.blob
    }

    /// Identity check: same blob memory and equal file tables.
    pub fn is_same_bundle(&self, other: &Bundle) -> bool {
        self.blob.as_ptr() == other.blob.as_ptr()
            && self.blob.len() == other.blob.len()
            && (Arc::ptr_eq(&self.files, &other.files) || self.files == other.files)
    }

    /// Zero-copy slice of one file's bytes.
    pub(crate) fn slice(&self, name: &str) -> VfsResult<Bytes> {
        let entry = self.entry(name).ok_or_else(|| VfsError::not_found(name))?;
        let end = entry.offset.checked_add(entry.length);
        match end {
            Some(end) if end <= self.blob.len() => Ok(self.blob.slice(entry.offset..end)),
            _ => Err(VfsError::OutOfBounds {
                name: name.to_owned(),
                offset: entry.offset,
                length: entry.length,
                blob_len: self.blob.len(),
            }),
        }
    }
}

// =============================================================================
// BundleBuilder
// =============================================================================

/// In-memory packer producing a single blob and its table.
///
/// ```
/// use bundle_vfs::Bundle;
///
/// let bundle = Bundle::builder()
///     .file("a", "hello")
///     .file("b", "world")
///     .build();
/// assert_eq!(&bundle.blob()[..], b"helloworld");
/// ```
#[derive(Debug, Default)]
pub struct BundleBuilder {
    blob: Vec<u8>,
    files: FileTable,
}

impl BundleBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file. Re-adding a name points it at the new bytes.
    pub fn file(mut self, name: impl Into<String>, content: impl AsRef<[u8]>) -> Self {
        self.insert(name, content);
        self
    }

    /// Append a file in place.
    pub fn insert(&mut self, name: impl Into<String>, content: impl AsRef<[u8]>) {
        let content = content.as_ref();
        let entry = FileTableEntry::new(self.blob.len(), content.len());
        self.blob.extend_from_slice(content);
        self.files.insert(name.into(), entry);
    }

    /// Finish the bundle.
    pub fn build(self) -> Bundle {
        Bundle::new(self.blob, self.files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello_world() -> Bundle {
        Bundle::from_static(b"helloworld", [("a", 0, 5), ("b", 5, 5)])
    }

    #[test]
    fn test_slice() {
        let bundle = hello_world();
        assert_eq!(&bundle.slice("a").unwrap()[..], b"hello");
        assert_eq!(&bundle.slice("b").unwrap()[..], b"world");
        assert!(bundle.slice("c").unwrap_err().is_not_found());
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let bundle = Bundle::from_static(b"short", [("x", 3, 10), ("y", usize::MAX, 2)]);
        assert!(matches!(bundle.slice("x"), Err(VfsError::OutOfBounds { blob_len: 5, .. })));
        assert!(matches!(bundle.slice("y"), Err(VfsError::OutOfBounds { .. })));
    }

    #[test]
    fn test_json_table() {
        let bundle =
            Bundle::from_json_table(&b"helloworld"[..], r#"{"a":[0,5],"b":[5,5]}"#).unwrap();
        assert_eq!(bundle.entry("b"), Some(FileTableEntry::new(5, 5)));

        let reparsed = Bundle::from_json_table(bundle.blob().clone(), &bundle.table_json().unwrap())
            .unwrap();
        assert!(reparsed.is_same_bundle(&bundle));
    }

    #[test]
    fn test_json_table_invalid() {
        let err = Bundle::from_json_table(&b""[..], r#"{"a": "zero"}"#).unwrap_err();
        assert!(matches!(err, VfsError::InvalidTable(_)));
    }

    #[test]
    fn test_identity() {
        let a = hello_world();
        assert!(a.is_same_bundle(&a.clone()));

        // Same table, different blob memory
        let b = Bundle::new(b"helloworld".to_vec(), (*a.files).clone());
        assert!(!a.is_same_bundle(&b));

        // Same blob, different table
        let c = Bundle::new(a.blob().clone(), FileTable::default());
        assert!(!a.is_same_bundle(&c));
    }

    #[test]
    fn test_builder_replaces_name() {
        let bundle = Bundle::builder().file("a", "one").file("a", "two").build();
        assert_eq!(bundle.len(), 1);
        assert_eq!(&bundle.slice("a").unwrap()[..], b"two");
    }
}
