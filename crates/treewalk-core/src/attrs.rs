//! File attribute types.

use std::fs::Metadata;

use serde::{Deserialize, Serialize};

/// Opaque platform identity of a file system object.
///
/// On unix this is the (device, inode) pair. Two paths with the same key
/// refer to the same object (hard links, or a directory reached twice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
    /// Device ID.
    pub device: u64,
    /// Inode number.
    pub inode: u64,
}

impl IdentityKey {
    /// Create a new identity key.
    pub fn new(device: u64, inode: u64) -> Self {
        Self { device, inode }
    }
}

/// Type of a file system entry, as reported without following links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Other file types (sockets, devices, fifos).
    Other,
}

/// Type metadata for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttributes {
    /// Entry type.
    pub kind: FileKind,
    /// Size in bytes as reported by the metadata provider.
    pub size: u64,
    /// Platform identity, if the provider has one.
    pub identity: Option<IdentityKey>,
}

impl FileAttributes {
    /// Create attributes without an identity key.
    pub fn new(kind: FileKind, size: u64) -> Self {
        Self {
            kind,
            size,
            identity: None,
        }
    }

    /// Attach an identity key.
    pub fn with_identity(mut self, identity: IdentityKey) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Check if this is a regular file.
    pub fn is_regular_file(&self) -> bool {
        self.kind == FileKind::File
    }

    /// Check if this is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }

    /// Check if this is a symbolic link.
    pub fn is_symbolic_link(&self) -> bool {
        self.kind == FileKind::Symlink
    }

    /// Check if this matched none of file, directory or symlink.
    pub fn is_other(&self) -> bool {
        self.kind == FileKind::Other
    }
}

impl From<&Metadata> for FileAttributes {
    fn from(metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        let kind = if file_type.is_symlink() {
            FileKind::Symlink
        } else if file_type.is_dir() {
            FileKind::Directory
        } else if file_type.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        };

        Self {
            kind,
            size: metadata.len(),
            identity: identity_of(metadata),
        }
    }
}

#[cfg(unix)]
fn identity_of(metadata: &Metadata) -> Option<IdentityKey> {
    use std::os::unix::fs::MetadataExt;
    Some(IdentityKey::new(metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
fn identity_of(_metadata: &Metadata) -> Option<IdentityKey> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_predicates() {
        let attrs = FileAttributes::new(FileKind::Symlink, 0);
        assert!(attrs.is_symbolic_link());
        assert!(!attrs.is_directory());
        assert!(!attrs.is_regular_file());
        assert!(!attrs.is_other());
    }

    #[test]
    fn test_from_metadata() {
        let dir = std::env::temp_dir();
        let metadata = std::fs::symlink_metadata(&dir).unwrap();
        let attrs = FileAttributes::from(&metadata);

        // temp_dir may itself be a symlink on some platforms
        assert!(attrs.is_directory() || attrs.is_symbolic_link());
        #[cfg(unix)]
        assert!(attrs.identity.is_some());
    }
}
