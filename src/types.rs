//! Core types for the IGFS client.

use std::time::SystemTime;

use crate::IgfsPath;

/// Type of a namespace node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

/// Metadata for a namespace node.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    /// Type of the node.
    pub file_type: FileType,
    /// Content length in bytes (0 for directories).
    pub size: u64,
    /// Last-modified marker.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub modified: SystemTime,
}

impl Metadata {
    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

/// An immediate child returned from a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name of the child (last segment only).
    pub name: String,
    /// Full path to the child.
    pub path: IgfsPath,
    /// Type of the child.
    pub file_type: FileType,
    /// Size in bytes.
    pub size: u64,
}

/// Mode a stream handle is opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpenMode {
    /// Read the committed content.
    Read,
    /// Replace the content on close.
    Write,
    /// Append to the committed content on close.
    Append,
}

impl OpenMode {
    /// Returns `true` for `Write` and `Append`.
    #[inline]
    pub fn is_writable(self) -> bool {
        matches!(self, Self::Write | Self::Append)
    }
}

#[cfg(feature = "serde")]
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        (duration.as_secs(), duration.subsec_nanos()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SystemTime, D::Error> {
        let (secs, nanos) = <(u64, u32)>::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::new(secs, nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_type_predicates() {
        let meta = Metadata {
            file_type: FileType::Directory,
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
        };
        assert!(meta.is_dir());
        assert!(!meta.is_file());
    }

    #[test]
    fn open_mode_writability() {
        assert!(!OpenMode::Read.is_writable());
        assert!(OpenMode::Write.is_writable());
        assert!(OpenMode::Append.is_writable());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn metadata_serde_roundtrip_keeps_time() {
        let meta = Metadata {
            file_type: FileType::File,
            size: 42,
            modified: SystemTime::UNIX_EPOCH + std::time::Duration::new(7, 9),
        };
        let json = serde_json::to_string(&meta).unwrap();
        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back.modified, meta.modified);
        assert_eq!(back.size, 42);
    }
}
