//! # Backing Store
//!
//! The operation set the client needs from the remote cluster service.
//!
//! ## Semantics
//!
//! Every call is a single, atomic metadata or content transition: either it
//! is applied completely or it fails. Failures are one of
//! [`IgfsError::NotFound`], [`IgfsError::Conflict`] or
//! [`IgfsError::Unavailable`]. Calls never create missing ancestors;
//! [`NamespaceTree`](crate::NamespaceTree) does that explicitly.
//!
//! ## Thread Safety
//!
//! Implementations must be `Send + Sync`. Methods take `&self`; stores use
//! interior mutability.
//!
//! ## Object Safety
//!
//! The trait is object-safe and can be used as `dyn BackingStore`:
//!
//! ```rust
//! use igfs_client::{BackingStore, MemoryStore};
//!
//! let store: Box<dyn BackingStore> = Box::new(MemoryStore::new());
//! # let _ = store;
//! ```

mod memory;

pub use memory::MemoryStore;

use crate::{DirEntry, IgfsError, IgfsPath, Metadata, Result};

/// How [`BackingStore::write_bytes`] applies new content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// Replace the whole content.
    Overwrite,
    /// Append to the existing content.
    Append,
}

/// Primitive operations against the remote tree-structured store.
pub trait BackingStore: Send + Sync {
    /// Metadata of the node at `path`.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if no node exists at `path`
    fn get_meta(&self, path: &IgfsPath) -> Result<Metadata>;

    /// Create an empty file. The parent must be an existing directory.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the parent does not exist
    /// - [`IgfsError::Conflict`] if the name is taken or the parent is a file
    fn create_file(&self, path: &IgfsPath) -> Result<()>;

    /// Create an empty directory. The parent must be an existing directory.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the parent does not exist
    /// - [`IgfsError::Conflict`] if the name is taken or the parent is a file
    fn create_dir(&self, path: &IgfsPath) -> Result<()>;

    /// Delete a node. Non-recursive deletion of a non-empty directory fails;
    /// recursive deletion removes the whole subtree in one transition.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if no node exists at `path`
    /// - [`IgfsError::Conflict`] for the root, or a non-empty directory
    ///   when `recursive` is false
    fn delete_node(&self, path: &IgfsPath, recursive: bool) -> Result<()>;

    /// Move the node at `src` (with its subtree) to `dst`.
    ///
    /// With `replace`, an existing file at `dst` is replaced in the same
    /// transition; the old file is never observable as deleted on its own.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if `src` or the parent of `dst` is missing
    /// - [`IgfsError::Conflict`] if `dst` lies inside `src`, is a directory,
    ///   or is a file and `replace` is not set
    fn rename_node(&self, src: &IgfsPath, dst: &IgfsPath, replace: bool) -> Result<()>;

    /// Immediate children of a directory.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if no node exists at `path`
    /// - [`IgfsError::Conflict`] if `path` is a file
    fn list_children(&self, path: &IgfsPath) -> Result<Vec<DirEntry>>;

    /// Read up to `len` bytes starting at `offset`. Reading at or past the
    /// end returns an empty vector.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if no node exists at `path`
    /// - [`IgfsError::Conflict`] if `path` is a directory
    fn read_bytes(&self, path: &IgfsPath, offset: u64, len: usize) -> Result<Vec<u8>>;

    /// Replace or extend the content of an existing file, atomically.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if no node exists at `path`
    /// - [`IgfsError::Conflict`] if `path` is a directory
    fn write_bytes(&self, path: &IgfsPath, data: &[u8], mode: WriteMode) -> Result<()>;
}

impl<S: BackingStore + ?Sized> BackingStore for Box<S> {
    fn get_meta(&self, path: &IgfsPath) -> Result<Metadata> {
        (**self).get_meta(path)
    }

    fn create_file(&self, path: &IgfsPath) -> Result<()> {
        (**self).create_file(path)
    }

    fn create_dir(&self, path: &IgfsPath) -> Result<()> {
        (**self).create_dir(path)
    }

    fn delete_node(&self, path: &IgfsPath, recursive: bool) -> Result<()> {
        (**self).delete_node(path, recursive)
    }

    fn rename_node(&self, src: &IgfsPath, dst: &IgfsPath, replace: bool) -> Result<()> {
        (**self).rename_node(src, dst, replace)
    }

    fn list_children(&self, path: &IgfsPath) -> Result<Vec<DirEntry>> {
        (**self).list_children(path)
    }

    fn read_bytes(&self, path: &IgfsPath, offset: u64, len: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(path, offset, len)
    }

    fn write_bytes(&self, path: &IgfsPath, data: &[u8], mode: WriteMode) -> Result<()> {
        (**self).write_bytes(path, data, mode)
    }
}

/// Map a missing node to `Ok(None)`; other errors pass through.
pub(crate) fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(IgfsError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
