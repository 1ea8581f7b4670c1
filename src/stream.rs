//! # Stream Handles
//!
//! An open read, write or append session on one file.
//!
//! ## Lifecycle
//!
//! `Open(mode)` → `Closed`, never back.
//!
//! - **Read** handles take a snapshot of the committed content at open time;
//!   later commits by other handles are not visible through them.
//! - **Write/Append** handles buffer locally without holding the namespace
//!   lock. [`close`](StreamHandle::close) commits the buffer as one atomic
//!   content replacement (write) or extension (append). Dropping an open
//!   write handle discards its buffer and leaves the committed content as it
//!   was.
//!
//! ```rust
//! use igfs_client::{FileSystemClient, OpenMode};
//!
//! let client = FileSystemClient::in_memory();
//! let mut w = client.open("igfs:///path/file.txt", OpenMode::Write)?;
//! w.write(b"hi")?;
//! w.close()?;
//!
//! let mut r = client.open("igfs:///path/file.txt", OpenMode::Read)?;
//! assert_eq!(r.read_to_string()?, "hi");
//! # Ok::<(), igfs_client::IgfsError>(())
//! ```

use std::io;
use std::sync::Arc;

use crate::{BackingStore, IgfsError, IgfsPath, NamespaceTree, OpenMode, Result};

#[derive(Debug)]
enum HandleState {
    Reading { content: Vec<u8>, position: usize },
    Writing { buffer: Vec<u8> },
    Closed,
}

/// Snapshot and cursor of a read handle.
fn reading<'a>(
    state: &'a mut HandleState,
    operation: &'static str,
) -> Result<(&'a [u8], &'a mut usize)> {
    match state {
        HandleState::Reading { content, position } => Ok((content.as_slice(), position)),
        HandleState::Writing { .. } => {
            Err(IgfsError::invalid_state(operation, "handle is open for writing"))
        }
        HandleState::Closed => Err(IgfsError::invalid_state(operation, "handle is closed")),
    }
}

fn invalid_utf8(path: &IgfsPath, e: std::str::Utf8Error) -> IgfsError {
    IgfsError::InvalidData {
        path: path.to_string(),
        details: e.to_string(),
    }
}

/// An open stream on a single file.
#[derive(Debug)]
pub struct StreamHandle<S: BackingStore> {
    namespace: Arc<NamespaceTree<S>>,
    path: IgfsPath,
    mode: OpenMode,
    state: HandleState,
}

impl<S: BackingStore> StreamHandle<S> {
    /// Open `path` in `mode`.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::NotFound`] when reading a missing file or a directory
    /// - [`IgfsError::Conflict`] when writing to a directory, under a file,
    ///   or to a file that already has an open writer
    pub(crate) fn open(
        namespace: Arc<NamespaceTree<S>>,
        path: IgfsPath,
        mode: OpenMode,
    ) -> Result<Self> {
        let state = if mode.is_writable() {
            namespace.open_writer(&path)?;
            HandleState::Writing { buffer: Vec::new() }
        } else {
            HandleState::Reading {
                content: namespace.read_snapshot(&path)?,
                position: 0,
            }
        };
        Ok(Self {
            namespace,
            path,
            mode,
            state,
        })
    }

    /// The file this handle is bound to.
    pub fn path(&self) -> &IgfsPath {
        &self.path
    }

    /// The mode the handle was opened in.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        matches!(self.state, HandleState::Closed)
    }

    /// Append `data` to the local buffer. Nothing is visible to other
    /// handles until [`close`](Self::close).
    ///
    /// # Errors
    ///
    /// - [`IgfsError::InvalidState`] on a read handle or after close
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        match &mut self.state {
            HandleState::Writing { buffer } => {
                buffer.extend_from_slice(data);
                Ok(data.len())
            }
            HandleState::Reading { .. } => {
                Err(IgfsError::invalid_state("write", "handle is open for reading"))
            }
            HandleState::Closed => Err(IgfsError::invalid_state("write", "handle is closed")),
        }
    }

    /// Append a UTF-8 string to the local buffer.
    pub fn write_str(&mut self, text: &str) -> Result<usize> {
        self.write(text.as_bytes())
    }

    /// Number of bytes buffered (write) or consumed (read).
    pub fn position(&self) -> usize {
        match &self.state {
            HandleState::Reading { position, .. } => *position,
            HandleState::Writing { buffer } => buffer.len(),
            HandleState::Closed => 0,
        }
    }

    /// Read up to `max` bytes from the cursor. Empty at end of file.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::InvalidState`] on a write handle or after close
    pub fn read_chunk(&mut self, max: usize) -> Result<Vec<u8>> {
        let (content, position) = reading(&mut self.state, "read")?;
        let end = position.saturating_add(max).min(content.len());
        let chunk = content[*position..end].to_vec();
        *position = end;
        Ok(chunk)
    }

    /// Read the next line, terminator included. `None` at end of file; the
    /// last line is returned without a terminator if the file lacks one.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::InvalidState`] on a write handle or after close
    /// - [`IgfsError::InvalidData`] if the line is not valid UTF-8
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let (content, position) = reading(&mut self.state, "read_line")?;
        let rest = &content[*position..];
        if rest.is_empty() {
            return Ok(None);
        }
        let len = rest
            .iter()
            .position(|&b| b == b'\n')
            .map_or(rest.len(), |i| i + 1);
        let line = std::str::from_utf8(&rest[..len])
            .map_err(|e| invalid_utf8(&self.path, e))?
            .to_owned();
        *position += len;
        Ok(Some(line))
    }

    /// Read everything from the cursor to the end of file.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::InvalidState`] on a write handle or after close
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        self.read_chunk(usize::MAX)
    }

    /// Read everything from the cursor as UTF-8 text.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::InvalidState`] on a write handle or after close
    /// - [`IgfsError::InvalidData`] if the content is not valid UTF-8; the
    ///   cursor does not move in that case
    pub fn read_to_string(&mut self) -> Result<String> {
        let (content, position) = reading(&mut self.state, "read")?;
        let text = std::str::from_utf8(&content[*position..])
            .map_err(|e| invalid_utf8(&self.path, e))?
            .to_owned();
        *position = content.len();
        Ok(text)
    }

    /// Read up to `len` bytes at `offset` without moving the cursor.
    /// Reading past the end yields fewer bytes, possibly none.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::InvalidState`] on a write handle or after close
    pub fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let (content, _) = reading(&mut self.state, "read_at")?;
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(content.len());
        let end = start.saturating_add(len).min(content.len());
        Ok(content[start..end].to_vec())
    }

    /// Close the handle. Write/append handles commit their buffer; read
    /// handles release their snapshot. Closing twice is a no-op.
    ///
    /// The handle is closed and the writer released even when the commit
    /// fails; the error is returned and the buffered bytes are dropped.
    ///
    /// # Errors
    ///
    /// - Any error of the commit, e.g. [`IgfsError::Unavailable`]
    pub fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, HandleState::Closed) {
            HandleState::Writing { buffer } => {
                let result = self.namespace.commit(&self.path, &buffer, self.mode);
                self.namespace.release_writer(&self.path);
                match &result {
                    Ok(()) => tracing::debug!(path = %self.path, bytes = buffer.len(), mode = ?self.mode, "committed"),
                    Err(e) => tracing::warn!(path = %self.path, error = %e, "commit failed"),
                }
                result
            }
            HandleState::Reading { .. } | HandleState::Closed => Ok(()),
        }
    }
}

impl<S: BackingStore> Drop for StreamHandle<S> {
    fn drop(&mut self) {
        if let HandleState::Writing { buffer } = &self.state {
            if !buffer.is_empty() {
                tracing::warn!(
                    path = %self.path,
                    bytes = buffer.len(),
                    "write handle dropped without close, discarding buffer"
                );
            }
            self.namespace.release_writer(&self.path);
        }
    }
}

impl<S: BackingStore> io::Read for StreamHandle<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let (content, position) = reading(&mut self.state, "read")?;
        let n = buf.len().min(content.len() - *position);
        buf[..n].copy_from_slice(&content[*position..*position + n]);
        *position += n;
        Ok(n)
    }
}

impl<S: BackingStore> io::Write for StreamHandle<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(StreamHandle::write(self, buf)?)
    }

    /// No-op: content is committed on close only.
    fn flush(&mut self) -> io::Result<()> {
        match self.state {
            HandleState::Writing { .. } => Ok(()),
            HandleState::Reading { .. } => {
                Err(IgfsError::invalid_state("flush", "handle is open for reading").into())
            }
            HandleState::Closed => Err(IgfsError::invalid_state("flush", "handle is closed").into()),
        }
    }
}
