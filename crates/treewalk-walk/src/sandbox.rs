//! Access policy enforcement for providers.
//!
//! Wrapping a provider in [`SandboxedFs`] turns reads outside the allowed
//! roots into [`WalkError::AccessDenied`], which the walker then treats as
//! fatal or skippable depending on `ignore_access_errors`.

use std::path::{Component, Path, PathBuf};

use treewalk_core::{FileAttributes, FsOperation, WalkError};

use crate::provider::FsProvider;

/// Paths a sandboxed provider may read.
#[derive(Debug, Clone, Default)]
pub struct SandboxPolicy {
    /// Allowed read roots. Empty means unrestricted.
    pub allowed_read_paths: Vec<PathBuf>,
}

impl SandboxPolicy {
    /// Create an unrestricted policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an allowed read root.
    pub fn allow_read(mut self, path: impl Into<PathBuf>) -> Self {
        self.allowed_read_paths.push(path.into());
        self
    }

    /// Check if reading a path is allowed.
    ///
    /// This compares components only. `..` and links must already be
    /// resolved, which [`SandboxedFs`] does before asking.
    pub fn can_read(&self, path: &Path) -> bool {
        if self.allowed_read_paths.is_empty() {
            return true;
        }
        self.allowed_read_paths
            .iter()
            .any(|allowed| path.starts_with(allowed))
    }
}

/// Provider that enforces a [`SandboxPolicy`] in front of another provider.
#[derive(Debug, Clone)]
pub struct SandboxedFs<P> {
    inner: P,
    policy: SandboxPolicy,
}

impl<P: FsProvider> SandboxedFs<P> {
    /// Wrap `inner` with `policy`. Allowed roots are canonicalized through
    /// `inner` when they exist.
    pub fn new(inner: P, policy: SandboxPolicy) -> Self {
        let allowed_read_paths = policy
            .allowed_read_paths
            .iter()
            .map(|root| inner.canonicalize(root).unwrap_or_else(|_| normalize(root)))
            .collect();
        Self {
            inner,
            policy: SandboxPolicy { allowed_read_paths },
        }
    }

    /// The enforced policy.
    pub fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }

    /// Where `path` itself lives: parent directories resolved, final
    /// component left unfollowed.
    fn locate(&self, path: &Path) -> PathBuf {
        let located = match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => {
                let parent = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
                self.inner
                    .canonicalize(parent)
                    .map(|parent| parent.join(name))
            }
            _ => self.inner.canonicalize(path),
        };
        located.unwrap_or_else(|_| normalize(path))
    }

    fn check(
        &self,
        path: &Path,
        resolved: &Path,
        operation: FsOperation,
    ) -> Result<(), WalkError> {
        if self.policy.can_read(resolved) {
            Ok(())
        } else {
            Err(WalkError::access_denied(path, operation))
        }
    }
}

impl<P: FsProvider> FsProvider for SandboxedFs<P> {
    type ReadDir = P::ReadDir;

    fn stat(&self, path: &Path) -> Result<FileAttributes, WalkError> {
        self.check(path, &self.locate(path), FsOperation::Stat)?;
        self.inner.stat(path)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, WalkError> {
        self.check(path, &self.locate(path), FsOperation::Resolve)?;
        let target = self.inner.canonicalize(path)?;
        // A link inside the sandbox may still point out of it.
        self.check(path, &target, FsOperation::Resolve)?;
        Ok(target)
    }

    fn read_dir(&self, path: &Path) -> Result<Self::ReadDir, WalkError> {
        // Enumeration follows links, so the directory actually listed counts.
        let listed = self
            .inner
            .canonicalize(path)
            .unwrap_or_else(|_| normalize(path));
        self.check(path, &listed, FsOperation::Enumerate)?;
        self.inner.read_dir(path)
    }
}

/// Drop `.` and fold `..` without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StdFs;
    use crate::walker::TreeWalker;
    use tempfile::TempDir;
    use treewalk_core::WalkConfig;

    #[test]
    fn test_unrestricted_policy() {
        let policy = SandboxPolicy::new();
        assert!(policy.can_read(Path::new("/anything")));
    }

    #[test]
    fn test_restricted_policy() {
        let policy = SandboxPolicy::new().allow_read("/allowed");
        assert!(policy.can_read(Path::new("/allowed")));
        assert!(policy.can_read(Path::new("/allowed/nested/file")));
        assert!(!policy.can_read(Path::new("/allowed-sibling")));
        assert!(!policy.can_read(Path::new("/other")));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    fn sandbox_tree() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let base = temp.path().canonicalize().unwrap();
        std::fs::create_dir(base.join("allowed")).unwrap();
        std::fs::write(base.join("allowed/ok.txt"), "ok").unwrap();
        std::fs::create_dir(base.join("secret")).unwrap();
        std::fs::write(base.join("secret/key.txt"), "key").unwrap();
        (temp, base)
    }

    #[test]
    fn test_parent_components_cannot_escape() {
        let (_temp, base) = sandbox_tree();
        let fs = SandboxedFs::new(StdFs, SandboxPolicy::new().allow_read(base.join("allowed")));
        let escaped = base.join("allowed/../secret");

        assert!(matches!(
            fs.read_dir(&escaped).unwrap_err(),
            WalkError::AccessDenied {
                operation: FsOperation::Enumerate,
                ..
            }
        ));
        assert!(fs.stat(&escaped.join("key.txt")).unwrap_err().is_access_denied());
        assert!(fs.stat(&base.join("allowed/./ok.txt")).is_ok());

        let err = TreeWalker::with_provider(WalkConfig::default(), &fs)
            .walk_all(&escaped)
            .unwrap_err();
        assert!(err.is_access_denied());

        let ignoring = WalkConfig::builder()
            .ignore_access_errors(true)
            .build()
            .unwrap();
        let events = TreeWalker::with_provider(ignoring, &fs)
            .walk_all(&escaped)
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_allowed_roots_are_resolved() {
        let (_temp, base) = sandbox_tree();
        let policy = SandboxPolicy::new().allow_read(base.join("secret/../allowed"));
        let fs = SandboxedFs::new(StdFs, policy);

        assert_eq!(fs.policy().allowed_read_paths, vec![base.join("allowed")]);
        assert!(fs.read_dir(&base.join("allowed")).is_ok());
        assert!(fs.read_dir(&base.join("secret")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_link_inside_sandbox_cannot_list_outside() {
        let (_temp, base) = sandbox_tree();
        let link = base.join("allowed/link");
        std::os::unix::fs::symlink(base.join("secret"), &link).unwrap();
        let fs = SandboxedFs::new(StdFs, SandboxPolicy::new().allow_read(base.join("allowed")));

        // The link itself may be inspected, its target may not be listed.
        assert!(fs.stat(&link).unwrap().is_symbolic_link());
        assert!(fs.read_dir(&link).unwrap_err().is_access_denied());

        let config = WalkConfig::builder().follow_links(true).build().unwrap();
        let err = TreeWalker::with_provider(config, &fs)
            .walk_all(&link)
            .unwrap_err();
        assert!(matches!(
            err,
            WalkError::AccessDenied {
                operation: FsOperation::Resolve,
                ..
            }
        ));
    }

    #[test]
    fn test_sandboxed_read_dir_denied() {
        let temp = TempDir::new().unwrap();
        let inside = temp.path().join("inside");
        let outside = temp.path().join("outside");
        std::fs::create_dir(&inside).unwrap();
        std::fs::create_dir(&outside).unwrap();

        let fs = SandboxedFs::new(StdFs, SandboxPolicy::new().allow_read(&inside));
        assert!(fs.read_dir(&inside).is_ok());

        let err = fs.read_dir(&outside).unwrap_err();
        assert!(matches!(
            err,
            WalkError::AccessDenied {
                operation: FsOperation::Enumerate,
                ..
            }
        ));
        assert!(fs.stat(&outside).unwrap_err().is_access_denied());
    }
}
