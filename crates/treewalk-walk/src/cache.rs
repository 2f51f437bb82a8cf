//! Attribute caching.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use treewalk_core::FileAttributes;

/// Store of previously fetched attributes, keyed by path.
///
/// Entries hold the attributes of the path itself: for a symlink these are
/// the link's attributes, not its target's.
pub trait AttributeCache: Send + Sync {
    /// Cached attributes for `path`, if any.
    fn get(&self, path: &Path) -> Option<FileAttributes>;

    /// Store attributes for `path`.
    fn insert(&self, path: &Path, attrs: FileAttributes);

    /// Drop any cached attributes for `path`.
    fn invalidate(&self, path: &Path);

    /// Drop everything.
    fn clear(&self);
}

/// In-memory attribute cache backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryAttributeCache {
    entries: DashMap<PathBuf, FileAttributes>,
}

impl MemoryAttributeCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of cached paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AttributeCache for MemoryAttributeCache {
    fn get(&self, path: &Path) -> Option<FileAttributes> {
        self.entries.get(path).map(|entry| *entry.value())
    }

    fn insert(&self, path: &Path, attrs: FileAttributes) {
        self.entries.insert(path.to_path_buf(), attrs);
    }

    fn invalidate(&self, path: &Path) {
        self.entries.remove(path);
    }

    fn clear(&self) {
        self.entries.clear();
    }
}
