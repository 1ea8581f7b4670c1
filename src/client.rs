//! # File System Client
//!
//! The public facade. Every operation resolves its path arguments first and
//! only then touches the namespace, so a malformed path never causes partial
//! work.
//!
//! ```rust
//! use igfs_client::{FileSystemClient, OpenMode};
//!
//! let client = FileSystemClient::in_memory();
//! if !client.exists("igfs:///path/")? {
//!     client.mkdir("igfs:///path/")?;
//! }
//! client.write_file("igfs:///path/file.txt", b"hi")?;
//! assert_eq!(client.read_to_string("igfs:///path/file.txt")?, "hi");
//! assert!(client.is_directory("igfs:///path")?);
//! # Ok::<(), igfs_client::IgfsError>(())
//! ```

use std::sync::Arc;

use crate::{
    BackingStore, ClientConfig, IgfsError, IgfsPath, MemoryStore, Metadata, NamespaceTree,
    OpenMode, PathPattern, PathResolver, Result, StreamHandle,
};

/// Path-addressed client over a backing store.
///
/// Cloning is cheap and clones share the same namespace, so a client can be
/// handed to several threads.
#[derive(Debug)]
pub struct FileSystemClient<S: BackingStore = MemoryStore> {
    resolver: PathResolver,
    namespace: Arc<NamespaceTree<S>>,
    config: ClientConfig,
}

impl<S: BackingStore> Clone for FileSystemClient<S> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            namespace: Arc::clone(&self.namespace),
            config: self.config.clone(),
        }
    }
}

impl FileSystemClient<MemoryStore> {
    /// A client over a fresh in-memory store with the default configuration.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), ClientConfig::default())
    }
}

impl<S: BackingStore> FileSystemClient<S> {
    /// Create a client over `store`.
    pub fn new(store: S, config: ClientConfig) -> Self {
        tracing::info!(
            fs_name = %config.fs_name,
            scheme = %config.scheme,
            "constructing IGFS client"
        );
        Self {
            resolver: PathResolver::new(&config.scheme),
            namespace: Arc::new(NamespaceTree::new(store, config.block_size)),
            config,
        }
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The namespace shared by all clones of this client.
    pub fn namespace(&self) -> &NamespaceTree<S> {
        &self.namespace
    }

    /// Resolve a caller-facing path string.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::InvalidPath`] for malformed input
    pub fn resolve(&self, path: &str) -> Result<IgfsPath> {
        self.resolver.resolve(path)
    }

    /// Whether anything exists at `path`. A missing path is not an error.
    pub fn exists(&self, path: &str) -> Result<bool> {
        let path = self.resolve(path)?;
        tracing::debug!(%path, "exists");
        self.namespace.exists(&path)
    }

    /// Create a directory and any missing ancestors. Idempotent.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::Conflict`] if a file occupies any position on the path
    pub fn mkdir(&self, path: &str) -> Result<()> {
        let path = self.resolve(path)?;
        tracing::debug!(%path, "mkdir");
        self.namespace.mkdir(&path)
    }

    /// Open a stream on a file.
    ///
    /// `Write` and `Append` create the file (and its ancestors) if missing.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] when reading a missing file or a directory
    /// - [`IgfsError::Conflict`] when writing to a directory or to a file
    ///   that already has an open writer
    pub fn open(&self, path: &str, mode: OpenMode) -> Result<StreamHandle<S>> {
        let path = self.resolve(path)?;
        tracing::debug!(%path, ?mode, "open");
        StreamHandle::open(Arc::clone(&self.namespace), path, mode)
    }

    /// Full paths of the immediate children of a directory, sorted by name.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the path does not exist
    /// - [`IgfsError::Conflict`] if the path is a file
    pub fn list_directory(&self, path: &str) -> Result<Vec<IgfsPath>> {
        let path = self.resolve(path)?;
        tracing::debug!(%path, "list_directory");
        let entries = self.namespace.list_directory(&path)?;
        Ok(entries.into_iter().map(|entry| entry.path).collect())
    }

    /// Names of the immediate children of a directory, relative to it.
    ///
    /// # Errors
    ///
    /// Same as [`list_directory`](Self::list_directory).
    pub fn children(&self, path: &str) -> Result<Vec<String>> {
        let path = self.resolve(path)?;
        tracing::debug!(%path, "children");
        let entries = self.namespace.list_directory(&path)?;
        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    /// Paths of every file and directory matching a glob pattern such as
    /// `igfs:///logs/*.txt`, sorted. An empty result is not an error.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::InvalidPath`] for a malformed path or glob
    pub fn get_matching_paths(&self, pattern: &str) -> Result<Vec<IgfsPath>> {
        let pattern = self.resolve(pattern)?;
        tracing::debug!(%pattern, "get_matching_paths");
        self.namespace.matching_paths(&PathPattern::new(&pattern)?)
    }

    /// Delete a file.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the path does not exist
    /// - [`IgfsError::Conflict`] if the path is a directory
    pub fn remove(&self, path: &str) -> Result<()> {
        let path = self.resolve(path)?;
        tracing::debug!(%path, "remove");
        self.namespace.remove(&path)
    }

    /// Delete an empty directory.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the path does not exist
    /// - [`IgfsError::Conflict`] for a file, the root, or a non-empty directory
    pub fn delete_dir(&self, path: &str) -> Result<()> {
        let path = self.resolve(path)?;
        tracing::debug!(%path, "delete_dir");
        self.namespace.delete_dir(&path)
    }

    /// Delete a directory and its whole subtree, or a single file.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the path does not exist
    /// - [`IgfsError::Conflict`] for the root
    pub fn delete_recursively(&self, path: &str) -> Result<()> {
        let path = self.resolve(path)?;
        tracing::debug!(%path, "delete_recursively");
        self.namespace.delete_recursively(&path)
    }

    /// Move a file or directory.
    ///
    /// # Errors
    ///
    /// See [`NamespaceTree::rename`].
    pub fn rename(&self, src: &str, dst: &str) -> Result<()> {
        let src = self.resolve(src)?;
        let dst = self.resolve(dst)?;
        tracing::debug!(%src, %dst, "rename");
        self.namespace.rename(&src, &dst)
    }

    /// Copy a file's content to a new, independent file.
    ///
    /// # Errors
    ///
    /// See [`NamespaceTree::copy`].
    pub fn copy(&self, src: &str, dst: &str) -> Result<()> {
        let src = self.resolve(src)?;
        let dst = self.resolve(dst)?;
        tracing::debug!(%src, %dst, "copy");
        self.namespace.copy(&src, &dst)
    }

    /// Whether `path` is a directory.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the path does not exist
    pub fn is_directory(&self, path: &str) -> Result<bool> {
        let path = self.resolve(path)?;
        tracing::debug!(%path, "is_directory");
        self.namespace.is_directory(&path)
    }

    /// Size, type and last-modified marker of a node.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the path does not exist
    pub fn stat(&self, path: &str) -> Result<Metadata> {
        let path = self.resolve(path)?;
        tracing::debug!(%path, "stat");
        self.namespace.metadata(&path)
    }

    /// Size of a file in bytes.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] if the path does not exist
    /// - [`IgfsError::Conflict`] if the path is a directory
    pub fn file_size(&self, path: &str) -> Result<u64> {
        let path = self.resolve(path)?;
        tracing::debug!(%path, "file_size");
        let meta = self.namespace.metadata(&path)?;
        if meta.is_dir() {
            return Err(IgfsError::conflict(&path, "is a directory"));
        }
        Ok(meta.size)
    }

    /// Read a whole file.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let mut handle = self.open(path, OpenMode::Read)?;
        let content = handle.read_all()?;
        handle.close()?;
        Ok(content)
    }

    /// Read a whole file as UTF-8 text.
    pub fn read_to_string(&self, path: &str) -> Result<String> {
        let mut handle = self.open(path, OpenMode::Read)?;
        let text = handle.read_to_string()?;
        handle.close()?;
        Ok(text)
    }

    /// Replace a file's content, creating it if needed.
    pub fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut handle = self.open(path, OpenMode::Write)?;
        handle.write(data)?;
        handle.close()
    }

    /// Append to a file, creating it if needed.
    pub fn append_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut handle = self.open(path, OpenMode::Append)?;
        handle.write(data)?;
        handle.close()
    }
}

// =============================================================================
// JSON Support (Feature-Gated)
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde::{Serialize, de::DeserializeOwned};

    impl<S: BackingStore> FileSystemClient<S> {
        /// Read a file and deserialize it as JSON.
        ///
        /// # Errors
        ///
        /// - `IgfsError::NotFound`: file doesn't exist
        /// - `IgfsError::InvalidData`: file isn't valid UTF-8
        /// - `IgfsError::Deserialization`: JSON parsing failed
        pub fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
            let data = self.read_to_string(path)?;
            serde_json::from_str(&data).map_err(|e| IgfsError::Deserialization(e.to_string()))
        }

        /// Serialize a value as pretty-printed JSON and write it.
        ///
        /// # Errors
        ///
        /// - `IgfsError::Serialization`: JSON serialization failed
        /// - Other `IgfsError` variants from the underlying write
        pub fn write_json<T: Serialize>(&self, path: &str, value: &T) -> Result<()> {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| IgfsError::Serialization(e.to_string()))?;
            self.write_file(path, json.as_bytes())
        }
    }
}
