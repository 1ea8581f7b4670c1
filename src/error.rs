//! Error types for the IGFS client.

use std::io;

/// IGFS client error type with contextual variants.
///
/// Every variant carries the path or operation that failed. Uses
/// `#[non_exhaustive]` for forward compatibility.
///
/// # Examples
///
/// ```rust
/// use igfs_client::IgfsError;
///
/// let err = IgfsError::NotFound { path: "igfs:///missing".into() };
/// assert_eq!(err.to_string(), "not found: igfs:///missing");
/// assert!(!err.is_retryable());
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum IgfsError {
    /// The path string is malformed. Caller bug, never retried.
    #[error("invalid path: {path:?} ({reason})")]
    InvalidPath {
        /// The offending input, as given.
        path: String,
        /// Why the input was rejected.
        reason: &'static str,
    },

    /// Target is absent where presence is required.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: String,
    },

    /// Type mismatch (file vs directory) or name collision.
    #[error("conflict: {path} ({reason})")]
    Conflict {
        /// The path where the conflict was detected.
        path: String,
        /// What collided.
        reason: &'static str,
    },

    /// Operation is not valid for the current state of a stream handle.
    #[error("{operation}: invalid handle state: {reason}")]
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The state that forbids it.
        reason: &'static str,
    },

    /// The backing store could not be reached.
    #[error("{operation}: backing store unavailable: {reason}")]
    Unavailable {
        /// The backing-store operation that failed.
        operation: &'static str,
        /// Transport-level description.
        reason: String,
    },

    /// File content could not be decoded as requested.
    #[error("invalid data: {path} ({details})")]
    InvalidData {
        /// The file whose content was rejected.
        path: String,
        /// Details about the decoding failure.
        details: String,
    },

    /// A configuration value could not be used.
    #[error("invalid configuration: {key}={value:?}")]
    InvalidConfig {
        /// The configuration key (environment variable name).
        key: &'static str,
        /// The rejected value.
        value: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl IgfsError {
    pub(crate) fn not_found(path: impl ToString) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    pub(crate) fn conflict(path: impl ToString, reason: &'static str) -> Self {
        Self::Conflict {
            path: path.to_string(),
            reason,
        }
    }

    pub(crate) fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    pub(crate) fn invalid_state(operation: &'static str, reason: &'static str) -> Self {
        Self::InvalidState { operation, reason }
    }

    /// Create an `Unavailable` error for a failed backing-store call.
    pub fn unavailable(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            operation,
            reason: reason.into(),
        }
    }

    /// Whether a caller-level retry policy may retry the failed call.
    ///
    /// Only transport failures qualify; the client itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Convert `IgfsError` to `std::io::Error` for the stream `Read`/`Write` impls.
impl From<IgfsError> for io::Error {
    fn from(e: IgfsError) -> Self {
        let kind = match &e {
            IgfsError::InvalidPath { .. } | IgfsError::InvalidConfig { .. } => {
                io::ErrorKind::InvalidInput
            }
            IgfsError::NotFound { .. } => io::ErrorKind::NotFound,
            IgfsError::Conflict { .. } => io::ErrorKind::AlreadyExists,
            IgfsError::InvalidState { .. } => io::ErrorKind::Unsupported,
            IgfsError::Unavailable { .. } => io::ErrorKind::NotConnected,
            IgfsError::InvalidData { .. }
            | IgfsError::Serialization(_)
            | IgfsError::Deserialization(_) => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, e)
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = IgfsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = IgfsError::not_found("igfs:///missing");
        assert_eq!(err.to_string(), "not found: igfs:///missing");
    }

    #[test]
    fn conflict_display_includes_reason() {
        let err = IgfsError::conflict("igfs:///a", "is a directory");
        assert_eq!(err.to_string(), "conflict: igfs:///a (is a directory)");
    }

    #[test]
    fn invalid_state_display() {
        let err = IgfsError::invalid_state("write", "handle is closed");
        assert_eq!(err.to_string(), "write: invalid handle state: handle is closed");
    }

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(IgfsError::unavailable("list_children", "connection reset").is_retryable());
        assert!(!IgfsError::not_found("igfs:///x").is_retryable());
        assert!(!IgfsError::invalid_path("", "empty path").is_retryable());
    }

    #[test]
    fn into_io_error_maps_kind() {
        let io_err: io::Error = IgfsError::not_found("igfs:///x").into();
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);

        let io_err: io::Error = IgfsError::invalid_state("read", "handle is closed").into();
        assert_eq!(io_err.kind(), io::ErrorKind::Unsupported);

        let io_err: io::Error = IgfsError::unavailable("read_bytes", "timeout").into();
        assert_eq!(io_err.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn into_io_error_keeps_source() {
        let io_err: io::Error = IgfsError::conflict("igfs:///d", "is a directory").into();
        let inner = io_err
            .get_ref()
            .and_then(|e| e.downcast_ref::<IgfsError>());
        assert!(matches!(inner, Some(IgfsError::Conflict { .. })));
    }
}
