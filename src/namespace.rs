//! # Namespace
//!
//! [`NamespaceTree`] enforces the tree invariants on top of a
//! [`BackingStore`]: implicit ancestor creation, file/directory type checks,
//! root protection and the single-writer policy.
//!
//! ## Concurrency
//!
//! One namespace lock serializes every mutation (create, delete, rename,
//! copy, content commit). Queries share the lock with each other and wait for
//! in-flight mutations, so nobody observes a half-moved subtree.
//!
//! Write handles register their path in a writer set while open. A second
//! writer on the same file is refused, and so is any structural mutation
//! that would remove or replace a file being written.

use std::collections::HashSet;

use parking_lot::{Mutex, RwLock};

use crate::store::optional;
use crate::{
    BackingStore, DirEntry, FileType, IgfsError, IgfsPath, Metadata, OpenMode, PathPattern,
    Result, StoreExt, WriteMode,
};

/// Hierarchical namespace over a backing store.
#[derive(Debug)]
pub struct NamespaceTree<S> {
    store: S,
    lock: RwLock<()>,
    writers: Mutex<HashSet<IgfsPath>>,
    block_size: usize,
}

impl<S: BackingStore> NamespaceTree<S> {
    /// Wrap `store`, fetching content in `block_size` chunks.
    pub fn new(store: S, block_size: usize) -> Self {
        Self {
            store,
            lock: RwLock::new(()),
            writers: Mutex::new(HashSet::new()),
            block_size: block_size.max(1),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// `true` iff a node is reachable at `path`.
    pub fn exists(&self, path: &IgfsPath) -> Result<bool> {
        let _guard = self.lock.read();
        self.store.exists(path)
    }

    /// Metadata of the node at `path`.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the path does not exist
    pub fn metadata(&self, path: &IgfsPath) -> Result<Metadata> {
        let _guard = self.lock.read();
        self.store.get_meta(path)
    }

    /// Whether the node at `path` is a directory.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the path does not exist
    pub fn is_directory(&self, path: &IgfsPath) -> Result<bool> {
        Ok(self.metadata(path)?.is_dir())
    }

    /// Create `path` and any missing ancestors as directories. Idempotent.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::Conflict`] if a file occupies any position on the path
    pub fn mkdir(&self, path: &IgfsPath) -> Result<()> {
        let _guard = self.lock.write();
        if path.is_root() {
            return Ok(());
        }
        self.ensure_ancestors(path)?;
        self.ensure_dir(path)
    }

    /// Create an empty file at `path` unless one is already there, creating
    /// missing ancestors. Existing content is left untouched.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::Conflict`] if `path` is a directory or a file occupies
    ///   an ancestor position
    pub fn create_file(&self, path: &IgfsPath) -> Result<Metadata> {
        let _guard = self.lock.write();
        self.create_file_locked(path)?;
        self.store.get_meta(path)
    }

    /// Delete a file.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the path does not exist
    /// - [`IgfsError::Conflict`] if the path is a directory or open for writing
    pub fn remove(&self, path: &IgfsPath) -> Result<()> {
        let _guard = self.lock.write();
        if self.store.get_meta(path)?.is_dir() {
            return Err(IgfsError::conflict(path, "is a directory"));
        }
        self.check_no_writers(path)?;
        self.store.delete_node(path, false)
    }

    /// Delete an empty directory.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the path does not exist
    /// - [`IgfsError::Conflict`] for the root, a file, or a non-empty directory
    pub fn delete_dir(&self, path: &IgfsPath) -> Result<()> {
        let _guard = self.lock.write();
        if path.is_root() {
            return Err(IgfsError::conflict(path, "root directory"));
        }
        if !self.store.get_meta(path)?.is_dir() {
            return Err(IgfsError::conflict(path, "not a directory"));
        }
        self.store.delete_node(path, false)
    }

    /// Delete a directory with its whole subtree, or a single file.
    ///
    /// The subtree disappears in one backing-store transition: callers see
    /// it either fully present or fully absent.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the path does not exist
    /// - [`IgfsError::Conflict`] for the root, or when a file in the subtree
    ///   is open for writing
    pub fn delete_recursively(&self, path: &IgfsPath) -> Result<()> {
        let _guard = self.lock.write();
        if path.is_root() {
            return Err(IgfsError::conflict(path, "root directory"));
        }
        self.store.get_meta(path)?;
        self.check_no_writers(path)?;
        self.store.delete_node(path, true)
    }

    /// Immediate children of a directory.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the path does not exist
    /// - [`IgfsError::Conflict`] if the path is a file
    pub fn list_directory(&self, path: &IgfsPath) -> Result<Vec<DirEntry>> {
        let _guard = self.lock.read();
        self.store.list_children(path)
    }

    /// Every path matching `pattern`, files and directories alike, sorted.
    ///
    /// A literal pattern yields the path itself if it exists. Otherwise the
    /// walk starts at the pattern's static prefix and never descends deeper
    /// than a match could be. No match is not an error.
    pub fn matching_paths(&self, pattern: &PathPattern) -> Result<Vec<IgfsPath>> {
        let _guard = self.lock.read();
        let base = pattern.static_prefix();
        if pattern.is_literal() {
            return Ok(self.store.exists(&base)?.then_some(base).into_iter().collect());
        }
        if !self.store.is_dir(&base)? {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        let mut pending = vec![base];
        while let Some(dir) = pending.pop() {
            for entry in self.store.list_children(&dir)? {
                let descend = entry.file_type == FileType::Directory
                    && pattern
                        .max_depth()
                        .is_none_or(|depth| entry.path.segments().len() < depth);
                if pattern.is_match(&entry.path) {
                    matches.push(entry.path.clone());
                }
                if descend {
                    pending.push(entry.path);
                }
            }
        }
        matches.sort();
        Ok(matches)
    }

    /// Move a file or directory (with its subtree) from `src` to `dst`.
    ///
    /// An existing file at `dst` is replaced when `src` is a file. Missing
    /// ancestors of `dst` are created.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if `src` is missing
    /// - [`IgfsError::Conflict`] for the root, a move into its own subtree,
    ///   a directory at `dst`, a directory onto a file, a file occupying an
    ///   ancestor of `dst`, or files open for writing on either side
    pub fn rename(&self, src: &IgfsPath, dst: &IgfsPath) -> Result<()> {
        let _guard = self.lock.write();
        if src.is_root() {
            return Err(IgfsError::conflict(src, "root directory"));
        }
        let src_meta = self.store.get_meta(src)?;
        if src == dst {
            return Ok(());
        }
        if dst.starts_with(src) {
            return Err(IgfsError::conflict(dst, "destination inside source"));
        }
        self.check_no_writers(src)?;
        self.check_no_writers(dst)?;

        let replace = match optional(self.store.get_meta(dst))? {
            Some(meta) if meta.is_dir() => {
                return Err(IgfsError::conflict(dst, "destination is a directory"));
            }
            Some(_) if src_meta.is_dir() => {
                return Err(IgfsError::conflict(dst, "destination is a file"));
            }
            Some(_) => {
                tracing::debug!(%dst, "replacing existing file");
                true
            }
            None => false,
        };

        let missing = self.missing_ancestors(dst)?;
        let result = self
            .ensure_ancestors(dst)
            .and_then(|()| self.store.rename_node(src, dst, replace));
        if result.is_err() {
            self.discard_dirs(&missing);
        }
        result
    }

    /// Duplicate the content of file `src` into a file at `dst`, creating
    /// missing ancestors of `dst`. The copy is independent of the source.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if `src` is missing or is a directory
    /// - [`IgfsError::Conflict`] if `dst` is a directory or open for writing
    pub fn copy(&self, src: &IgfsPath, dst: &IgfsPath) -> Result<()> {
        let _guard = self.lock.write();
        if self.store.get_meta(src)?.is_dir() {
            return Err(IgfsError::not_found(src));
        }
        if src == dst {
            return Ok(());
        }
        self.check_no_writers(dst)?;

        let content = self.store.read_all(src, self.block_size)?;
        let created = !self.store.exists(dst)?;
        let missing = self.missing_ancestors(dst)?;
        let result = self
            .create_file_locked(dst)
            .and_then(|()| self.store.write_bytes(dst, &content, WriteMode::Overwrite));
        if result.is_err() {
            if created {
                if let Err(e) = optional(self.store.delete_node(dst, false)) {
                    tracing::warn!(%dst, error = %e, "failed to remove partial copy");
                }
            }
            self.discard_dirs(&missing);
        }
        result
    }

    /// Committed content of a file, fetched block by block under the
    /// namespace lock.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the path is missing or is a directory
    pub fn read_snapshot(&self, path: &IgfsPath) -> Result<Vec<u8>> {
        let _guard = self.lock.read();
        if self.store.get_meta(path)?.is_dir() {
            return Err(IgfsError::not_found(path));
        }
        self.store.read_all(path, self.block_size)
    }

    /// Create the file if needed and register a writer for it.
    pub(crate) fn open_writer(&self, path: &IgfsPath) -> Result<()> {
        let _guard = self.lock.write();
        if self.writers.lock().contains(path) {
            return Err(IgfsError::conflict(path, "already open for writing"));
        }
        self.create_file_locked(path)?;
        self.writers.lock().insert(path.clone());
        Ok(())
    }

    pub(crate) fn release_writer(&self, path: &IgfsPath) {
        self.writers.lock().remove(path);
    }

    /// Apply a write handle's buffer as one atomic content transition.
    pub(crate) fn commit(&self, path: &IgfsPath, data: &[u8], mode: OpenMode) -> Result<()> {
        let _guard = self.lock.write();
        self.create_file_locked(path)?;
        let write_mode = match mode {
            OpenMode::Append => WriteMode::Append,
            OpenMode::Write | OpenMode::Read => WriteMode::Overwrite,
        };
        self.store.write_bytes(path, data, write_mode)
    }

    fn create_file_locked(&self, path: &IgfsPath) -> Result<()> {
        if path.is_root() {
            return Err(IgfsError::conflict(path, "root directory"));
        }
        self.ensure_ancestors(path)?;
        match optional(self.store.get_meta(path))? {
            Some(meta) if meta.is_dir() => Err(IgfsError::conflict(path, "is a directory")),
            Some(_) => Ok(()),
            None => self.store.create_file(path),
        }
    }

    /// Create every missing proper ancestor of `path` as a directory.
    fn ensure_ancestors(&self, path: &IgfsPath) -> Result<()> {
        path.prefixes().try_for_each(|prefix| self.ensure_dir(&prefix))
    }

    fn ensure_dir(&self, path: &IgfsPath) -> Result<()> {
        match optional(self.store.get_meta(path))? {
            Some(meta) if meta.is_dir() => Ok(()),
            Some(_) => Err(IgfsError::conflict(path, "is a file")),
            None => {
                tracing::debug!(%path, "creating directory");
                self.store.create_dir(path)
            }
        }
    }

    /// Proper ancestors of `path` that do not exist yet, shortest first.
    fn missing_ancestors(&self, path: &IgfsPath) -> Result<Vec<IgfsPath>> {
        let mut missing = Vec::new();
        for prefix in path.prefixes() {
            if missing.is_empty() && optional(self.store.get_meta(&prefix))?.is_some() {
                continue;
            }
            missing.push(prefix);
        }
        Ok(missing)
    }

    /// Remove directories created by a mutation that then failed, deepest
    /// first.
    fn discard_dirs(&self, created: &[IgfsPath]) {
        for dir in created.iter().rev() {
            if let Err(e) = optional(self.store.delete_node(dir, false)) {
                tracing::warn!(path = %dir, error = %e, "failed to remove directory");
            }
        }
    }

    fn check_no_writers(&self, path: &IgfsPath) -> Result<()> {
        let writers = self.writers.lock();
        match writers.iter().find(|open| open.starts_with(path)) {
            Some(open) => Err(IgfsError::conflict(open, "open for writing")),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, PathResolver};

    fn p(s: &str) -> IgfsPath {
        PathResolver::new("igfs").resolve(s).unwrap()
    }

    fn tree() -> NamespaceTree<MemoryStore> {
        NamespaceTree::new(MemoryStore::new(), 4)
    }

    fn write(ns: &NamespaceTree<MemoryStore>, path: &str, data: &[u8]) {
        let path = p(path);
        ns.create_file(&path).unwrap();
        ns.commit(&path, data, OpenMode::Write).unwrap();
    }

    #[test]
    fn mkdir_creates_ancestors_and_is_idempotent() {
        let ns = tree();
        ns.mkdir(&p("igfs:///a/b/c")).unwrap();
        ns.mkdir(&p("igfs:///a/b/c")).unwrap();
        assert!(ns.is_directory(&p("igfs:///a")).unwrap());
        assert!(ns.is_directory(&p("igfs:///a/b/c")).unwrap());
        ns.mkdir(&p("igfs:///")).unwrap();
    }

    #[test]
    fn mkdir_through_file_conflicts() {
        let ns = tree();
        write(&ns, "igfs:///f", b"x");
        assert!(matches!(
            ns.mkdir(&p("igfs:///f/sub")),
            Err(IgfsError::Conflict { .. })
        ));
        assert!(matches!(ns.mkdir(&p("igfs:///f")), Err(IgfsError::Conflict { .. })));
    }

    #[test]
    fn create_file_keeps_existing_content() {
        let ns = tree();
        write(&ns, "igfs:///dir/f", b"keep");
        let meta = ns.create_file(&p("igfs:///dir/f")).unwrap();
        assert_eq!(meta.size, 4);
        assert!(ns.is_directory(&p("igfs:///dir")).unwrap());
    }

    #[test]
    fn create_file_on_directory_conflicts() {
        let ns = tree();
        ns.mkdir(&p("igfs:///d")).unwrap();
        assert!(matches!(ns.create_file(&p("igfs:///d")), Err(IgfsError::Conflict { .. })));
        assert!(matches!(ns.create_file(&p("igfs:///")), Err(IgfsError::Conflict { .. })));
    }

    #[test]
    fn is_directory_on_missing_path_fails() {
        let ns = tree();
        assert!(matches!(
            ns.is_directory(&p("igfs:///nope")),
            Err(IgfsError::NotFound { .. })
        ));
    }

    #[test]
    fn remove_only_files() {
        let ns = tree();
        ns.mkdir(&p("igfs:///d")).unwrap();
        write(&ns, "igfs:///d/f", b"");
        assert!(matches!(ns.remove(&p("igfs:///d")), Err(IgfsError::Conflict { .. })));
        assert!(matches!(ns.remove(&p("igfs:///x")), Err(IgfsError::NotFound { .. })));
        ns.remove(&p("igfs:///d/f")).unwrap();
        assert!(!ns.exists(&p("igfs:///d/f")).unwrap());
    }

    #[test]
    fn delete_dir_requires_empty_directory() {
        let ns = tree();
        write(&ns, "igfs:///d/f", b"");
        assert!(matches!(ns.delete_dir(&p("igfs:///d")), Err(IgfsError::Conflict { .. })));
        assert!(matches!(ns.delete_dir(&p("igfs:///d/f")), Err(IgfsError::Conflict { .. })));
        ns.remove(&p("igfs:///d/f")).unwrap();
        ns.delete_dir(&p("igfs:///d")).unwrap();
        assert!(!ns.exists(&p("igfs:///d")).unwrap());
    }

    #[test]
    fn delete_recursively_removes_subtree() {
        let ns = tree();
        write(&ns, "igfs:///d/sub/f", b"data");
        ns.delete_recursively(&p("igfs:///d")).unwrap();
        assert!(!ns.exists(&p("igfs:///d")).unwrap());
        assert!(!ns.exists(&p("igfs:///d/sub/f")).unwrap());
        assert!(matches!(
            ns.delete_recursively(&p("igfs:///d")),
            Err(IgfsError::NotFound { .. })
        ));
    }

    #[test]
    fn delete_recursively_accepts_file_and_refuses_root() {
        let ns = tree();
        write(&ns, "igfs:///f", b"x");
        ns.delete_recursively(&p("igfs:///f")).unwrap();
        assert!(!ns.exists(&p("igfs:///f")).unwrap());
        assert!(matches!(
            ns.delete_recursively(&p("igfs:///")),
            Err(IgfsError::Conflict { .. })
        ));
        assert!(ns.exists(&p("igfs:///")).unwrap());
    }

    #[test]
    fn list_directory_errors() {
        let ns = tree();
        write(&ns, "igfs:///f", b"x");
        assert!(matches!(ns.list_directory(&p("igfs:///f")), Err(IgfsError::Conflict { .. })));
        assert!(matches!(ns.list_directory(&p("igfs:///n")), Err(IgfsError::NotFound { .. })));
    }

    #[test]
    fn rename_file_replaces_existing_file() {
        let ns = tree();
        write(&ns, "igfs:///a", b"new");
        write(&ns, "igfs:///b", b"old");
        ns.rename(&p("igfs:///a"), &p("igfs:///b")).unwrap();
        assert!(!ns.exists(&p("igfs:///a")).unwrap());
        assert_eq!(ns.read_snapshot(&p("igfs:///b")).unwrap(), b"new");
    }

    #[test]
    fn rename_rejections() {
        let ns = tree();
        ns.mkdir(&p("igfs:///d/inner")).unwrap();
        write(&ns, "igfs:///f", b"x");

        assert!(matches!(
            ns.rename(&p("igfs:///d"), &p("igfs:///d/inner/x")),
            Err(IgfsError::Conflict { .. })
        ));
        assert!(matches!(
            ns.rename(&p("igfs:///d"), &p("igfs:///f")),
            Err(IgfsError::Conflict { .. })
        ));
        assert!(matches!(
            ns.rename(&p("igfs:///f"), &p("igfs:///d")),
            Err(IgfsError::Conflict { .. })
        ));
        assert!(matches!(
            ns.rename(&p("igfs:///"), &p("igfs:///x")),
            Err(IgfsError::Conflict { .. })
        ));
        assert!(matches!(
            ns.rename(&p("igfs:///missing"), &p("igfs:///x")),
            Err(IgfsError::NotFound { .. })
        ));
        ns.rename(&p("igfs:///f"), &p("igfs:///f")).unwrap();
        assert!(ns.exists(&p("igfs:///f")).unwrap());
    }

    fn matches(ns: &NamespaceTree<MemoryStore>, pattern: &str) -> Vec<String> {
        let pattern = PathPattern::new(&p(pattern)).unwrap();
        ns.matching_paths(&pattern)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn matching_paths_wildcard_in_one_directory() {
        let ns = tree();
        write(&ns, "igfs:///d/a.txt", b"");
        write(&ns, "igfs:///d/b.txt", b"");
        write(&ns, "igfs:///d/c.csv", b"");
        write(&ns, "igfs:///d/sub/d.txt", b"");
        assert_eq!(matches(&ns, "igfs:///d/*.txt"), ["igfs:///d/a.txt", "igfs:///d/b.txt"]);
    }

    #[test]
    fn matching_paths_through_nested_directories() {
        let ns = tree();
        write(&ns, "igfs:///x/1/data", b"");
        write(&ns, "igfs:///x/2/data", b"");
        write(&ns, "igfs:///x/2/deep/data", b"");
        assert_eq!(
            matches(&ns, "igfs:///x/*/data"),
            ["igfs:///x/1/data", "igfs:///x/2/data"]
        );
        assert_eq!(matches(&ns, "igfs:///x/**/data").len(), 3);
        assert_eq!(matches(&ns, "igfs:///x/*"), ["igfs:///x/1", "igfs:///x/2"]);
    }

    #[test]
    fn matching_paths_without_match_is_empty() {
        let ns = tree();
        write(&ns, "igfs:///d/a.txt", b"");
        assert!(matches(&ns, "igfs:///d/*.csv").is_empty());
        assert!(matches(&ns, "igfs:///missing/*").is_empty());
        assert!(matches(&ns, "igfs:///d/a.txt/*").is_empty());
        assert!(matches(&ns, "igfs:///d/b.txt").is_empty());
        assert_eq!(matches(&ns, "igfs:///d/a.txt"), ["igfs:///d/a.txt"]);
    }

    #[test]
    fn missing_ancestors_stop_at_existing_prefix() {
        let ns = tree();
        ns.mkdir(&p("igfs:///a")).unwrap();
        let missing = ns.missing_ancestors(&p("igfs:///a/b/c/f")).unwrap();
        let missing: Vec<String> = missing.iter().map(ToString::to_string).collect();
        assert_eq!(missing, ["igfs:///a/b", "igfs:///a/b/c"]);
    }

    #[test]
    fn rename_creates_missing_destination_parents() {
        let ns = tree();
        write(&ns, "igfs:///f", b"moved");
        ns.rename(&p("igfs:///f"), &p("igfs:///x/y/f")).unwrap();
        assert!(ns.is_directory(&p("igfs:///x/y")).unwrap());
        assert_eq!(ns.read_snapshot(&p("igfs:///x/y/f")).unwrap(), b"moved");
    }

    #[test]
    fn copy_is_independent() {
        let ns = tree();
        write(&ns, "igfs:///a", b"original content");
        ns.copy(&p("igfs:///a"), &p("igfs:///x/b")).unwrap();
        ns.commit(&p("igfs:///a"), b"changed", OpenMode::Write).unwrap();

        assert_eq!(ns.read_snapshot(&p("igfs:///x/b")).unwrap(), b"original content");
        assert_eq!(ns.read_snapshot(&p("igfs:///a")).unwrap(), b"changed");
    }

    #[test]
    fn copy_of_directory_is_not_found() {
        let ns = tree();
        ns.mkdir(&p("igfs:///d")).unwrap();
        assert!(matches!(
            ns.copy(&p("igfs:///d"), &p("igfs:///e")),
            Err(IgfsError::NotFound { .. })
        ));
        assert!(matches!(
            ns.copy(&p("igfs:///nope"), &p("igfs:///e")),
            Err(IgfsError::NotFound { .. })
        ));
    }

    #[test]
    fn second_writer_is_refused_until_release() {
        let ns = tree();
        let f = p("igfs:///f");
        ns.open_writer(&f).unwrap();
        assert!(matches!(ns.open_writer(&f), Err(IgfsError::Conflict { .. })));
        assert!(matches!(ns.remove(&f), Err(IgfsError::Conflict { .. })));
        assert!(matches!(
            ns.delete_recursively(&p("igfs:///f")),
            Err(IgfsError::Conflict { .. })
        ));
        ns.release_writer(&f);
        ns.open_writer(&f).unwrap();
    }

    #[test]
    fn commit_append_extends_content() {
        let ns = tree();
        write(&ns, "igfs:///log", b"one\n");
        ns.commit(&p("igfs:///log"), b"two\n", OpenMode::Append).unwrap();
        assert_eq!(ns.read_snapshot(&p("igfs:///log")).unwrap(), b"one\ntwo\n");
    }

    #[test]
    fn read_snapshot_of_directory_is_not_found() {
        let ns = tree();
        ns.mkdir(&p("igfs:///d")).unwrap();
        assert!(matches!(
            ns.read_snapshot(&p("igfs:///d")),
            Err(IgfsError::NotFound { .. })
        ));
    }
}
