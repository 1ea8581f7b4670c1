//! Client configuration.
//!
//! Values come from the environment, like the native plugin's `IGFS_*`
//! variables, with built-in defaults.

use crate::{IgfsError, Result};

/// Scheme accepted when none is configured.
pub const DEFAULT_SCHEME: &str = "igfs";

/// File system name used when none is configured.
pub const DEFAULT_FS_NAME: &str = "myFileSystem";

/// Bytes fetched per backing-store read when none is configured.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientConfig {
    /// Scheme accepted by the path resolver (`IGFS_SCHEME`).
    pub scheme: String,
    /// Name of the file system, reported in logs (`IGFS_FS_NAME`).
    pub fs_name: String,
    /// Chunk size for backing-store reads (`IGFS_BLOCK_SIZE`).
    pub block_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_owned(),
            fs_name: DEFAULT_FS_NAME.to_owned(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl ClientConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// - [`IgfsError::InvalidConfig`] for an empty scheme or a block size
    ///   that is not a positive integer
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(scheme) = lookup("IGFS_SCHEME") {
            if scheme.is_empty() || scheme.contains([':', '/']) {
                return Err(IgfsError::InvalidConfig {
                    key: "IGFS_SCHEME",
                    value: scheme,
                });
            }
            config.scheme = scheme;
        }
        if let Some(fs_name) = lookup("IGFS_FS_NAME") {
            config.fs_name = fs_name;
        }
        if let Some(raw) = lookup("IGFS_BLOCK_SIZE") {
            config.block_size = match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(IgfsError::InvalidConfig {
                        key: "IGFS_BLOCK_SIZE",
                        value: raw,
                    });
                }
            };
        }

        Ok(config)
    }
}
