//! In-process backing store.
//!
//! Holds the whole namespace as one owned [`Tree`] behind a `RwLock`, so every
//! call is a single critical section and therefore atomic.

use std::time::SystemTime;

use parking_lot::RwLock;

use super::{BackingStore, WriteMode};
use crate::tree::{Node, Tree};
use crate::{DirEntry, IgfsError, IgfsPath, Metadata, Result};

/// In-memory backing store. All data is lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tree: RwLock<Tree>,
}

impl MemoryStore {
    /// Create a store holding only the root directory.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BackingStore for MemoryStore {
    fn get_meta(&self, path: &IgfsPath) -> Result<Metadata> {
        self.tree
            .read()
            .get(path)
            .map(Node::metadata)
            .ok_or_else(|| IgfsError::not_found(path))
    }

    fn create_file(&self, path: &IgfsPath) -> Result<()> {
        self.tree.write().insert(path, Node::empty_file())
    }

    fn create_dir(&self, path: &IgfsPath) -> Result<()> {
        self.tree.write().insert(path, Node::empty_dir())
    }

    fn delete_node(&self, path: &IgfsPath, recursive: bool) -> Result<()> {
        let mut tree = self.tree.write();
        match tree.get(path) {
            None => return Err(IgfsError::not_found(path)),
            Some(Node::Directory { children, .. }) if !recursive && !children.is_empty() => {
                return Err(IgfsError::conflict(path, "directory not empty"));
            }
            Some(_) => {}
        }
        tree.detach(path).map(drop)
    }

    fn rename_node(&self, src: &IgfsPath, dst: &IgfsPath, replace: bool) -> Result<()> {
        if dst.starts_with(src) {
            return Err(IgfsError::conflict(dst, "destination inside source"));
        }
        let mut tree = self.tree.write();
        if tree.get(src).is_none() {
            return Err(IgfsError::not_found(src));
        }
        match tree.get(dst) {
            Some(Node::Directory { .. }) => {
                return Err(IgfsError::conflict(dst, "destination is a directory"));
            }
            Some(Node::File { .. }) if !replace => {
                return Err(IgfsError::conflict(dst, "already exists"));
            }
            Some(Node::File { .. }) | None => {}
        }
        match dst.parent().and_then(|parent| tree.get(&parent).map(Node::metadata)) {
            Some(meta) if meta.is_dir() => {}
            Some(_) => return Err(IgfsError::conflict(dst, "parent is a file")),
            None => return Err(IgfsError::not_found(dst)),
        }
        let node = tree.detach(src)?;
        tree.replace(dst, node).map(drop)
    }

    fn list_children(&self, path: &IgfsPath) -> Result<Vec<DirEntry>> {
        self.tree.read().list(path)
    }

    fn read_bytes(&self, path: &IgfsPath, offset: u64, len: usize) -> Result<Vec<u8>> {
        match self.tree.read().get(path) {
            Some(Node::File { content, .. }) => {
                let start = usize::try_from(offset)
                    .unwrap_or(usize::MAX)
                    .min(content.len());
                let end = start.saturating_add(len).min(content.len());
                Ok(content[start..end].to_vec())
            }
            Some(Node::Directory { .. }) => Err(IgfsError::conflict(path, "is a directory")),
            None => Err(IgfsError::not_found(path)),
        }
    }

    fn write_bytes(&self, path: &IgfsPath, data: &[u8], mode: WriteMode) -> Result<()> {
        match self.tree.write().get_mut(path) {
            Some(Node::File { content, modified }) => {
                match mode {
                    WriteMode::Overwrite => *content = data.to_vec(),
                    WriteMode::Append => content.extend_from_slice(data),
                }
                *modified = SystemTime::now();
                Ok(())
            }
            Some(Node::Directory { .. }) => Err(IgfsError::conflict(path, "is a directory")),
            None => Err(IgfsError::not_found(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileType, PathResolver};

    fn p(s: &str) -> IgfsPath {
        PathResolver::new("igfs").resolve(s).unwrap()
    }

    #[test]
    fn create_requires_parent() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.create_file(&p("igfs:///a/f")),
            Err(IgfsError::NotFound { .. })
        ));
        store.create_dir(&p("igfs:///a")).unwrap();
        store.create_file(&p("igfs:///a/f")).unwrap();
        assert_eq!(store.get_meta(&p("igfs:///a/f")).unwrap().file_type, FileType::File);
    }

    #[test]
    fn write_then_read_ranges() {
        let store = MemoryStore::new();
        let f = p("igfs:///f");
        store.create_file(&f).unwrap();
        store.write_bytes(&f, b"hello", WriteMode::Overwrite).unwrap();
        store.write_bytes(&f, b" world", WriteMode::Append).unwrap();

        assert_eq!(store.read_bytes(&f, 0, 100).unwrap(), b"hello world");
        assert_eq!(store.read_bytes(&f, 6, 3).unwrap(), b"wor");
        assert!(store.read_bytes(&f, 11, 4).unwrap().is_empty());
        assert!(store.read_bytes(&f, u64::MAX, 4).unwrap().is_empty());
        assert_eq!(store.get_meta(&f).unwrap().size, 11);
    }

    #[test]
    fn write_to_directory_conflicts() {
        let store = MemoryStore::new();
        store.create_dir(&p("igfs:///d")).unwrap();
        assert!(matches!(
            store.write_bytes(&p("igfs:///d"), b"x", WriteMode::Overwrite),
            Err(IgfsError::Conflict { .. })
        ));
        assert!(matches!(
            store.read_bytes(&p("igfs:///d"), 0, 1),
            Err(IgfsError::Conflict { .. })
        ));
    }

    #[test]
    fn non_recursive_delete_of_non_empty_dir_conflicts() {
        let store = MemoryStore::new();
        store.create_dir(&p("igfs:///d")).unwrap();
        store.create_file(&p("igfs:///d/f")).unwrap();
        assert!(matches!(
            store.delete_node(&p("igfs:///d"), false),
            Err(IgfsError::Conflict { .. })
        ));
        store.delete_node(&p("igfs:///d"), true).unwrap();
        assert!(store.get_meta(&p("igfs:///d/f")).is_err());
    }

    #[test]
    fn rename_moves_subtree() {
        let store = MemoryStore::new();
        store.create_dir(&p("igfs:///a")).unwrap();
        store.create_file(&p("igfs:///a/f")).unwrap();
        store
            .write_bytes(&p("igfs:///a/f"), b"data", WriteMode::Overwrite)
            .unwrap();

        store.rename_node(&p("igfs:///a"), &p("igfs:///b"), false).unwrap();
        assert!(store.get_meta(&p("igfs:///a")).is_err());
        assert_eq!(store.read_bytes(&p("igfs:///b/f"), 0, 10).unwrap(), b"data");
    }

    #[test]
    fn rename_failures_leave_source_in_place() {
        let store = MemoryStore::new();
        store.create_dir(&p("igfs:///a")).unwrap();
        store.create_file(&p("igfs:///taken")).unwrap();

        assert!(matches!(
            store.rename_node(&p("igfs:///a"), &p("igfs:///a/inner"), false),
            Err(IgfsError::Conflict { .. })
        ));
        assert!(matches!(
            store.rename_node(&p("igfs:///a"), &p("igfs:///taken"), false),
            Err(IgfsError::Conflict { .. })
        ));
        assert!(matches!(
            store.rename_node(&p("igfs:///a"), &p("igfs:///missing/a"), true),
            Err(IgfsError::NotFound { .. })
        ));
        assert!(store.get_meta(&p("igfs:///a")).unwrap().is_dir());
    }

    #[test]
    fn rename_with_replace_swaps_file_in_one_step() {
        let store = MemoryStore::new();
        let (src, dst) = (p("igfs:///src"), p("igfs:///dst"));
        store.create_file(&src).unwrap();
        store.create_file(&dst).unwrap();
        store.write_bytes(&src, b"new", WriteMode::Overwrite).unwrap();
        store.write_bytes(&dst, b"old", WriteMode::Overwrite).unwrap();

        assert!(matches!(
            store.rename_node(&src, &dst, false),
            Err(IgfsError::Conflict { .. })
        ));
        assert_eq!(store.read_bytes(&dst, 0, 10).unwrap(), b"old");

        store.rename_node(&src, &dst, true).unwrap();
        assert!(store.get_meta(&src).is_err());
        assert_eq!(store.read_bytes(&dst, 0, 10).unwrap(), b"new");
    }

    #[test]
    fn rename_never_replaces_directory() {
        let store = MemoryStore::new();
        store.create_file(&p("igfs:///f")).unwrap();
        store.create_dir(&p("igfs:///d")).unwrap();
        assert!(matches!(
            store.rename_node(&p("igfs:///f"), &p("igfs:///d"), true),
            Err(IgfsError::Conflict { .. })
        ));
        assert!(store.get_meta(&p("igfs:///f")).unwrap().is_file());
    }
}
