//! File system providers consumed by the walker.

use std::fs;
use std::path::{Path, PathBuf};

use treewalk_core::{FileAttributes, WalkError};

/// Metadata, link resolution and directory enumeration for the walker.
///
/// Providers report failures as [`WalkError::Attribute`] for ordinary I/O
/// problems and [`WalkError::AccessDenied`] when a policy refuses the
/// operation. Dropping a [`FsProvider::ReadDir`] releases the handle.
pub trait FsProvider {
    /// Live enumeration of a directory's children.
    type ReadDir: Iterator<Item = Result<PathBuf, WalkError>>;

    /// Attributes of `path` itself. Never follows a final symlink.
    fn stat(&self, path: &Path) -> Result<FileAttributes, WalkError>;

    /// Absolute canonical form of `path`, following links.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, WalkError>;

    /// Open an enumeration of the children of `path`.
    fn read_dir(&self, path: &Path) -> Result<Self::ReadDir, WalkError>;
}

impl<P: FsProvider + ?Sized> FsProvider for &P {
    type ReadDir = P::ReadDir;

    fn stat(&self, path: &Path) -> Result<FileAttributes, WalkError> {
        (**self).stat(path)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, WalkError> {
        (**self).canonicalize(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Self::ReadDir, WalkError> {
        (**self).read_dir(path)
    }
}

/// Provider backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFs;

impl StdFs {
    /// Create a new std-backed provider.
    pub fn new() -> Self {
        Self
    }
}

impl FsProvider for StdFs {
    type ReadDir = StdReadDir;

    fn stat(&self, path: &Path) -> Result<FileAttributes, WalkError> {
        fs::symlink_metadata(path)
            .map(|metadata| FileAttributes::from(&metadata))
            .map_err(|e| WalkError::attribute(path, e))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, WalkError> {
        fs::canonicalize(path).map_err(|e| WalkError::attribute(path, e))
    }

    fn read_dir(&self, path: &Path) -> Result<Self::ReadDir, WalkError> {
        let inner = fs::read_dir(path).map_err(|e| WalkError::attribute(path, e))?;
        Ok(StdReadDir {
            dir: path.to_path_buf(),
            inner,
        })
    }
}

/// Open `std::fs` directory enumeration yielding full child paths.
#[derive(Debug)]
pub struct StdReadDir {
    dir: PathBuf,
    inner: fs::ReadDir,
}

impl Iterator for StdReadDir {
    type Item = Result<PathBuf, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| {
            entry
                .map(|e| e.path())
                .map_err(|e| WalkError::attribute(&self.dir, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use treewalk_core::FileKind;

    #[test]
    fn test_stat_and_read_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("file.txt"), "hello").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();

        let provider = StdFs::new();
        let attrs = provider.stat(&temp.path().join("file.txt")).unwrap();
        assert_eq!(attrs.kind, FileKind::File);
        assert_eq!(attrs.size, 5);

        let mut children: Vec<_> = provider
            .read_dir(temp.path())
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        children.sort();
        assert_eq!(
            children,
            vec![temp.path().join("file.txt"), temp.path().join("sub")]
        );
    }

    #[test]
    fn test_missing_path_is_attribute_error() {
        let temp = TempDir::new().unwrap();
        let err = StdFs.stat(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, WalkError::Attribute { .. }));
        assert!(!err.is_access_denied());
    }

    #[cfg(unix)]
    #[test]
    fn test_stat_does_not_follow_links() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("target"), "x").unwrap();
        std::os::unix::fs::symlink(temp.path().join("target"), temp.path().join("link")).unwrap();

        let attrs = StdFs.stat(&temp.path().join("link")).unwrap();
        assert!(attrs.is_symbolic_link());
    }
}
