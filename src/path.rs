//! # Path Resolution
//!
//! Parses `scheme://[authority]/a/b/c` strings into normalized [`IgfsPath`]
//! values.
//!
//! ## Rules
//!
//! - The scheme prefix is mandatory and must match the resolver's scheme.
//! - The authority (`host:port`) is accepted and ignored.
//! - Repeated separators collapse and a trailing separator is dropped.
//! - `.`/`..` segments, control characters and `\` are rejected.
//!
//! Resolution is a pure function: no backing-store access, no side effects.
//!
//! ```rust
//! use igfs_client::PathResolver;
//!
//! let resolver = PathResolver::new("igfs");
//! let path = resolver.resolve("igfs:///path//file.txt").unwrap();
//! assert_eq!(path.segments(), ["path", "file.txt"]);
//! assert_eq!(path.to_string(), "igfs:///path/file.txt");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::{IgfsError, Result};

const SEPARATOR: char = '/';

/// A normalized, absolute path in the IGFS namespace.
///
/// The root is the empty segment sequence. Equality, ordering and hashing
/// consider segments only; the scheme is kept for display.
#[derive(Debug, Clone)]
pub struct IgfsPath {
    scheme: Arc<str>,
    segments: Vec<String>,
}

impl IgfsPath {
    /// The root directory under `scheme`.
    pub fn root(scheme: &str) -> Self {
        Self {
            scheme: Arc::from(scheme),
            segments: Vec::new(),
        }
    }

    /// Path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The scheme this path was resolved under.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns `true` for the root directory.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent directory, `None` for the root.
    pub fn parent(&self) -> Option<IgfsPath> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            scheme: Arc::clone(&self.scheme),
            segments: parent.to_vec(),
        })
    }

    /// Append one segment.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::InvalidPath`] if `name` is not a valid single segment
    pub fn join(&self, name: &str) -> Result<IgfsPath> {
        validate_segment(name).map_err(|reason| IgfsError::invalid_path(name, reason))?;
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        Ok(Self {
            scheme: Arc::clone(&self.scheme),
            segments,
        })
    }

    /// Whether `base` is this path or one of its ancestors.
    pub fn starts_with(&self, base: &IgfsPath) -> bool {
        self.segments.starts_with(&base.segments)
    }

    /// Every proper, non-root prefix of this path, shortest first.
    ///
    /// For `/a/b/c` this yields `/a` and `/a/b`.
    pub fn prefixes(&self) -> impl Iterator<Item = IgfsPath> + '_ {
        (1..self.segments.len()).map(move |len| Self {
            scheme: Arc::clone(&self.scheme),
            segments: self.segments[..len].to_vec(),
        })
    }
}

impl PartialEq for IgfsPath {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for IgfsPath {}

impl Hash for IgfsPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments.hash(state);
    }
}

impl PartialOrd for IgfsPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IgfsPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments.cmp(&other.segments)
    }
}

impl fmt::Display for IgfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Resolves caller-facing path strings into [`IgfsPath`]s.
#[derive(Debug, Clone)]
pub struct PathResolver {
    scheme: Arc<str>,
}

impl PathResolver {
    /// Create a resolver accepting `scheme://` paths.
    pub fn new(scheme: &str) -> Self {
        Self {
            scheme: Arc::from(scheme),
        }
    }

    /// The accepted scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Parse and normalize `input`.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::InvalidPath`] if the input is empty, lacks the
    ///   `scheme://` prefix or an absolute path part, or has a bad segment
    pub fn resolve(&self, input: &str) -> Result<IgfsPath> {
        if input.is_empty() {
            return Err(IgfsError::invalid_path(input, "empty path"));
        }

        let rest = input
            .strip_prefix(&*self.scheme)
            .and_then(|r| r.strip_prefix("://"))
            .ok_or_else(|| IgfsError::invalid_path(input, "missing scheme prefix"))?;

        // Everything before the first separator is the authority.
        let start = rest
            .find(SEPARATOR)
            .ok_or_else(|| IgfsError::invalid_path(input, "missing absolute path"))?;

        let mut segments = Vec::new();
        for segment in rest[start..].split(SEPARATOR) {
            if segment.is_empty() {
                continue;
            }
            validate_segment(segment).map_err(|reason| IgfsError::invalid_path(input, reason))?;
            segments.push(segment.to_owned());
        }

        Ok(IgfsPath {
            scheme: Arc::clone(&self.scheme),
            segments,
        })
    }
}

fn validate_segment(segment: &str) -> std::result::Result<(), &'static str> {
    if segment.is_empty() {
        return Err("empty segment");
    }
    if segment == "." || segment == ".." {
        return Err("relative segment");
    }
    if segment
        .chars()
        .any(|c| c == SEPARATOR || c == '\\' || c.is_control())
    {
        return Err("disallowed character in segment");
    }
    Ok(())
}
