//! # Extension Traits
//!
//! Convenience methods for backing stores.
//!
//! ## Overview
//!
//! [`StoreExt`] provides commonly-needed queries composed from the primitive
//! [`BackingStore`] calls. They are default methods with a blanket
//! implementation, so every store gets them for free.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`exists`](StoreExt::exists) | Check if any node is at the path |
//! | [`is_file`](StoreExt::is_file) | Check if path is a file |
//! | [`is_dir`](StoreExt::is_dir) | Check if path is a directory |
//! | [`read_all`](StoreExt::read_all) | Fetch a whole file in fixed-size blocks |

use crate::store::optional;
use crate::{BackingStore, IgfsError, IgfsPath, Result};

/// Extension methods for any backing store.
///
/// # Example
///
/// ```rust
/// use igfs_client::{BackingStore, IgfsPath, MemoryStore, StoreExt};
///
/// let store = MemoryStore::new();
/// let root = IgfsPath::root("igfs");
/// assert!(store.is_dir(&root).unwrap());
/// assert!(!store.exists(&root.join("missing").unwrap()).unwrap());
/// ```
pub trait StoreExt: BackingStore {
    /// Check whether a node exists at `path`.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    fn exists(&self, path: &IgfsPath) -> Result<bool> {
        Ok(optional(self.get_meta(path))?.is_some())
    }

    /// Check if the path points to a file. `Ok(false)` when absent.
    fn is_file(&self, path: &IgfsPath) -> Result<bool> {
        Ok(optional(self.get_meta(path))?.is_some_and(|m| m.is_file()))
    }

    /// Check if the path points to a directory. `Ok(false)` when absent.
    fn is_dir(&self, path: &IgfsPath) -> Result<bool> {
        Ok(optional(self.get_meta(path))?.is_some_and(|m| m.is_dir()))
    }

    /// Read a whole file, `block_size` bytes per backing-store call.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the file does not exist
    /// - [`IgfsError::Conflict`] if `path` is a directory
    fn read_all(&self, path: &IgfsPath, block_size: usize) -> Result<Vec<u8>> {
        let meta = self.get_meta(path)?;
        if meta.is_dir() {
            return Err(IgfsError::conflict(path, "is a directory"));
        }

        let block_size = block_size.max(1);
        let mut content = Vec::with_capacity(usize::try_from(meta.size).unwrap_or(0));
        loop {
            let block = self.read_bytes(path, content.len() as u64, block_size)?;
            if block.is_empty() {
                break;
            }
            content.extend_from_slice(&block);
        }
        Ok(content)
    }
}

// Blanket implementation - every store gets StoreExt for free
impl<S: BackingStore + ?Sized> StoreExt for S {}
