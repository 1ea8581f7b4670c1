//! # igfs-client
//!
//! A client for a hierarchical **in-memory file system** (IGFS) addressed by
//! URI-style paths such as `igfs:///dir/file.txt`.
//!
//! The client resolves caller paths, keeps a directory tree of files and
//! directories, and hands out stream handles for reading and writing file
//! content.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use igfs_client::{FileSystemClient, OpenMode};
//!
//! let client = FileSystemClient::in_memory();
//!
//! client.mkdir("igfs:///path/")?;
//!
//! let mut w = client.open("igfs:///path/file.txt", OpenMode::Write)?;
//! w.write(b"hi")?;
//! w.close()?;
//!
//! let mut r = client.open("igfs:///path/file.txt", OpenMode::Read)?;
//! assert_eq!(r.read_to_string()?, "hi");
//!
//! for child in client.list_directory("igfs:///path")? {
//!     println!("{child}");
//! }
//! # Ok::<(), igfs_client::IgfsError>(())
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`FileSystemClient`] | Public facade: resolve paths, run namespace operations |
//! | [`PathResolver`] | Turns `igfs:///a/b` strings into canonical [`IgfsPath`]s |
//! | [`PathPattern`] | Compiled glob over paths, for [`FileSystemClient::get_matching_paths`] |
//! | [`NamespaceTree`] | Directory tree policy and locking over a [`BackingStore`] |
//! | [`StreamHandle`] | Open file with read or buffered-write state |
//! | [`BackingStore`] | Storage seam; [`MemoryStore`] is the built-in store |
//! | [`IgfsError`] | Error type shared by every operation |
//!
//! ---
//!
//! ## Layering
//!
//! ```text
//! FileSystemClient ──▶ PathResolver
//!        │
//!        ▼
//!  NamespaceTree ──▶ BackingStore (MemoryStore, or any Layer over it)
//!        ▲
//!        │
//!  StreamHandle (commits on close)
//! ```
//!
//! Writes are buffered in the handle and become visible on
//! [`StreamHandle::close`]. Dropping an open write handle discards its buffer.
//! At most one write handle may be open per file.
//!
//! ---
//!
//! ## Error Handling
//!
//! All operations return `Result<T, IgfsError>`:
//!
//! ```rust
//! use igfs_client::{FileSystemClient, IgfsError};
//!
//! let client = FileSystemClient::in_memory();
//! let err = client.is_directory("igfs:///missing").unwrap_err();
//! assert!(matches!(err, IgfsError::NotFound { .. }));
//! assert_eq!(err.to_string(), "not found: igfs:///missing");
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! [`BackingStore`] requires `Send + Sync` and takes `&self`. The client is
//! cheap to clone, and clones share one namespace, so it can be moved to
//! worker threads directly.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`Metadata`], [`FileType`], [`OpenMode`] and [`ClientConfig`], plus JSON helpers on [`FileSystemClient`] |

// Private modules
mod client;
mod config;
mod error;
mod ext;
mod glob;
mod layer;
mod namespace;
mod path;
mod store;
mod stream;
mod tree;
mod types;

// Public re-exports - error types
pub use error::{IgfsError, Result};

// Public re-exports - core types
pub use glob::PathPattern;
pub use path::{IgfsPath, PathResolver};
pub use types::{DirEntry, FileType, Metadata, OpenMode};

// Public re-exports - storage
pub use store::{BackingStore, MemoryStore, WriteMode};

// Public re-exports - namespace and handles
pub use client::FileSystemClient;
pub use namespace::NamespaceTree;
pub use stream::StreamHandle;

// Public re-exports - configuration
pub use config::{ClientConfig, DEFAULT_BLOCK_SIZE, DEFAULT_FS_NAME, DEFAULT_SCHEME};

// Public re-exports - infrastructure
pub use ext::StoreExt;
pub use layer::{Layer, LayerExt, Traced, TracingLayer};
