//! # Layer Trait
//!
//! Tower-style middleware composition for backing stores.
//!
//! ## Overview
//!
//! A [`Layer`] wraps a [`BackingStore`] in another `BackingStore` that adds
//! behavior around each call: tracing, fault injection, caching.
//!
//! ```text
//! Store ──▶ Layer::layer() ──▶ Wrapped Store
//! ```
//!
//! ## Example
//!
//! ```rust
//! use igfs_client::{FileSystemClient, ClientConfig, LayerExt, MemoryStore, TracingLayer};
//!
//! let store = MemoryStore::new().layer(TracingLayer::new("memory"));
//! let client = FileSystemClient::new(store, ClientConfig::default());
//! assert!(client.exists("igfs:///").unwrap());
//! ```

use crate::{BackingStore, DirEntry, IgfsPath, Metadata, Result, WriteMode};

/// A layer that wraps a store to add functionality.
///
/// `layer(self, store)` consumes both the layer and the store. Layers are
/// compile-time composition and are not object-safe.
pub trait Layer<S> {
    /// The resulting store type after applying this layer.
    type Store;

    /// Wrap the given store with this layer's functionality.
    fn layer(self, store: S) -> Self::Store;
}

/// Extension trait for fluent layer composition.
pub trait LayerExt: BackingStore + Sized {
    /// Apply a layer to this store.
    fn layer<L: Layer<Self>>(self, layer: L) -> L::Store {
        layer.layer(self)
    }
}

// Blanket implementation - every store gets LayerExt for free
impl<S: BackingStore> LayerExt for S {}

/// Emits one `trace` event per backing-store call.
#[derive(Debug, Clone)]
pub struct TracingLayer {
    label: &'static str,
}

impl TracingLayer {
    /// Create a layer whose events carry `label` as the `store` field.
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl<S: BackingStore> Layer<S> for TracingLayer {
    type Store = Traced<S>;

    fn layer(self, store: S) -> Self::Store {
        Traced {
            inner: store,
            label: self.label,
        }
    }
}

/// Store produced by [`TracingLayer`].
#[derive(Debug)]
pub struct Traced<S> {
    inner: S,
    label: &'static str,
}

impl<S> Traced<S> {
    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn record<T>(&self, op: &'static str, path: &IgfsPath, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => tracing::trace!(store = self.label, op, %path, "ok"),
            Err(e) => tracing::trace!(store = self.label, op, %path, error = %e, "failed"),
        }
        result
    }
}

impl<S: BackingStore> BackingStore for Traced<S> {
    fn get_meta(&self, path: &IgfsPath) -> Result<Metadata> {
        self.record("get_meta", path, self.inner.get_meta(path))
    }

    fn create_file(&self, path: &IgfsPath) -> Result<()> {
        self.record("create_file", path, self.inner.create_file(path))
    }

    fn create_dir(&self, path: &IgfsPath) -> Result<()> {
        self.record("create_dir", path, self.inner.create_dir(path))
    }

    fn delete_node(&self, path: &IgfsPath, recursive: bool) -> Result<()> {
        self.record("delete_node", path, self.inner.delete_node(path, recursive))
    }

    fn rename_node(&self, src: &IgfsPath, dst: &IgfsPath, replace: bool) -> Result<()> {
        tracing::trace!(store = self.label, %dst, replace, "rename target");
        self.record("rename_node", src, self.inner.rename_node(src, dst, replace))
    }

    fn list_children(&self, path: &IgfsPath) -> Result<Vec<DirEntry>> {
        self.record("list_children", path, self.inner.list_children(path))
    }

    fn read_bytes(&self, path: &IgfsPath, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.record("read_bytes", path, self.inner.read_bytes(path, offset, len))
    }

    fn write_bytes(&self, path: &IgfsPath, data: &[u8], mode: WriteMode) -> Result<()> {
        self.record("write_bytes", path, self.inner.write_bytes(path, data, mode))
    }
}
