//! Attribute lookup with optional caching.

use std::path::Path;

use treewalk_core::{FileAttributes, WalkError};

use crate::cache::AttributeCache;
use crate::provider::FsProvider;

/// Fetches type metadata for a path, consulting a cache first when allowed.
pub struct AttributeResolver<'a, P: ?Sized> {
    provider: &'a P,
    cache: Option<&'a dyn AttributeCache>,
    follow_links: bool,
}

impl<'a, P: FsProvider + ?Sized> AttributeResolver<'a, P> {
    /// Create a resolver over `provider` with an optional cache.
    pub fn new(provider: &'a P, cache: Option<&'a dyn AttributeCache>, follow_links: bool) -> Self {
        Self {
            provider,
            cache,
            follow_links,
        }
    }

    /// Attributes of `path` itself.
    ///
    /// A cached value is used only when `allow_cache` is set and it could
    /// not change the outcome: while following links a cached symlink is
    /// re-read, since the caller is about to resolve it anyway.
    pub fn resolve(&self, path: &Path, allow_cache: bool) -> Result<FileAttributes, WalkError> {
        let cache = self.cache.filter(|_| allow_cache);

        if let Some(cached) = cache.and_then(|c| c.get(path)) {
            if !self.follow_links || !cached.is_symbolic_link() {
                return Ok(cached);
            }
        }

        match self.provider.stat(path) {
            Ok(attrs) => {
                if let Some(cache) = cache {
                    cache.insert(path, attrs);
                }
                Ok(attrs)
            }
            Err(err) => {
                if let Some(cache) = cache {
                    cache.invalidate(path);
                }
                Err(err)
            }
        }
    }
}
