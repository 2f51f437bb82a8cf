//! Path depth relative to a walk root.

use std::path::{Path, PathBuf};

/// Number of components of `path` beyond the components of `root`.
///
/// Works on parsed path components, so trailing separators and the
/// platform's separator convention do not matter. Returns 0 when `path`
/// is not longer than `root`.
pub fn depth(root: &Path, path: &Path) -> usize {
    DepthCalculator::new(root).depth(path)
}

/// Depth calculator bound to one walk root.
#[derive(Debug, Clone)]
pub struct DepthCalculator {
    root: PathBuf,
    root_len: usize,
}

impl DepthCalculator {
    /// Capture `root` for later depth queries.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root_len = root.components().count();
        Self { root, root_len }
    }

    /// The captured root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Depth of `path` below the captured root.
    pub fn depth(&self, path: &Path) -> usize {
        path.components().skip(self.root_len).count()
    }
}
