//! Error types for walk operations.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File system operation refused by an access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FsOperation {
    /// Metadata lookup.
    Stat,
    /// Directory enumeration.
    Enumerate,
    /// Symbolic link resolution.
    Resolve,
}

impl fmt::Display for FsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsOperation::Stat => write!(f, "stat"),
            FsOperation::Enumerate => write!(f, "enumerate"),
            FsOperation::Resolve => write!(f, "resolve"),
        }
    }
}

/// Errors that can occur while walking a tree.
///
/// Only [`WalkError::AccessDenied`] (when not ignored) and
/// [`WalkError::Cancelled`] end a walk. Every other variant is attached to
/// an [`Event`](crate::Event) or logged, and the walk continues.
#[derive(Debug, Error)]
pub enum WalkError {
    /// Metadata lookup or enumeration failed for an ordinary reason.
    #[error("Cannot read attributes of {path}: {source}")]
    Attribute {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An access policy refused the operation.
    #[error("Access denied ({operation}): {path}")]
    AccessDenied { path: PathBuf, operation: FsOperation },

    /// Attributes matched none of file, directory or symlink.
    #[error("Failed to resolve to a type: {path}")]
    Unclassifiable { path: PathBuf },

    /// A followed link's target could not be resolved or read.
    #[error("Unreadable symlink target for {link}: {source}")]
    SymlinkTargetUnreadable {
        link: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A followed link chain revisited a target or grew too long.
    #[error("Symlink loop at {link} after {hops} hop(s)")]
    SymlinkLoop { link: PathBuf, hops: usize },

    /// The walk was cancelled by its caller.
    #[error("Walk cancelled")]
    Cancelled,
}

impl WalkError {
    /// Create an attribute error with path context.
    pub fn attribute(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Attribute {
            path: path.into(),
            source,
        }
    }

    /// Create an access denied error.
    pub fn access_denied(path: impl Into<PathBuf>, operation: FsOperation) -> Self {
        Self::AccessDenied {
            path: path.into(),
            operation,
        }
    }

    /// Check if this error came from an access policy.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }

    /// Check if this error ends the walk under the given access policy.
    pub fn is_fatal(&self, ignore_access_errors: bool) -> bool {
        match self {
            Self::Cancelled => true,
            Self::AccessDenied { .. } => !ignore_access_errors,
            _ => false,
        }
    }

    /// Recast a failed target lookup as a failure of the link that led there.
    ///
    /// Access denials are returned unchanged so the caller's policy still
    /// applies to them.
    pub fn into_symlink_error(self, link: impl Into<PathBuf>) -> Self {
        match self {
            Self::Attribute { source, .. } => Self::SymlinkTargetUnreadable {
                link: link.into(),
                source,
            },
            other => other,
        }
    }

    /// Path the error refers to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Attribute { path, .. }
            | Self::AccessDenied { path, .. }
            | Self::Unclassifiable { path } => Some(path),
            Self::SymlinkTargetUnreadable { link, .. } | Self::SymlinkLoop { link, .. } => {
                Some(link)
            }
            Self::Cancelled => None,
        }
    }
}
