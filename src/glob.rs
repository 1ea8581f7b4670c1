//! # Glob Patterns
//!
//! [`PathPattern`] compiles a resolved path whose segments may contain
//! wildcards (`*`, `?`, `**`, `[abc]`, `{a,b}`) into a matcher used by
//! [`NamespaceTree::matching_paths`](crate::NamespaceTree::matching_paths).
//!
//! `*` and `?` never cross a `/`; only `**` spans directories.
//!
//! ```rust
//! use igfs_client::FileSystemClient;
//!
//! let client = FileSystemClient::in_memory();
//! client.write_file("igfs:///logs/a.txt", b"")?;
//! client.write_file("igfs:///logs/b.csv", b"")?;
//!
//! let found = client.get_matching_paths("igfs:///logs/*.txt")?;
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].to_string(), "igfs:///logs/a.txt");
//! # Ok::<(), igfs_client::IgfsError>(())
//! ```

use globset::{GlobBuilder, GlobMatcher};

use crate::{IgfsError, IgfsPath, Result};

const META_CHARS: [char; 4] = ['*', '?', '[', '{'];

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    pattern: IgfsPath,
    matcher: GlobMatcher,
    static_len: usize,
    max_depth: Option<usize>,
}

impl PathPattern {
    /// Compile a resolved pattern path.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::InvalidPath`] if a segment is not a valid glob
    pub fn new(pattern: &IgfsPath) -> Result<Self> {
        let segments = pattern.segments();
        let matcher = GlobBuilder::new(&match_key(segments))
            .literal_separator(true)
            .build()
            .map_err(|_| IgfsError::invalid_path(pattern.to_string(), "invalid glob pattern"))?
            .compile_matcher();

        let static_len = segments
            .iter()
            .take_while(|segment| !segment.contains(META_CHARS))
            .count();
        let max_depth = if segments.iter().any(|segment| segment.contains("**")) {
            None
        } else {
            Some(segments.len())
        };

        Ok(Self {
            pattern: pattern.clone(),
            matcher,
            static_len,
            max_depth,
        })
    }

    /// The longest leading run of wildcard-free segments, where a walk
    /// has to start.
    pub fn static_prefix(&self) -> IgfsPath {
        let mut prefix = IgfsPath::root(self.pattern.scheme());
        for segment in &self.pattern.segments()[..self.static_len] {
            // Segments of a resolved path are already valid.
            if let Ok(next) = prefix.join(segment) {
                prefix = next;
            }
        }
        prefix
    }

    /// Whether the pattern contains no wildcard at all.
    pub fn is_literal(&self) -> bool {
        self.static_len == self.pattern.segments().len()
    }

    /// Deepest segment count a match can have; `None` with `**`.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Whether `path` matches the pattern.
    pub fn is_match(&self, path: &IgfsPath) -> bool {
        self.matcher.is_match(match_key(path.segments()))
    }
}

fn match_key(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}
