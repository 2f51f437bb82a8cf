//! Iterative depth-first traversal engine for treewalk.
//!
//! This crate walks a directory tree with an explicit stack of open
//! directory enumerations and reports every reachable entry exactly once
//! as a typed [`Event`].
//!
//! # Overview
//!
//! - **Attribute resolution** through a pluggable [`FsProvider`], with an
//!   optional [`AttributeCache`]
//! - **Classification** of entries into files, directories and links,
//!   with iterative, loop-guarded symlink following
//! - **Depth limits** computed on path components, not separators
//! - **Access policies** via [`SandboxedFs`], fatal or skippable
//! - **Progress updates** via broadcast channels and cooperative
//!   cancellation
//!
//! # Example
//!
//! ```rust,no_run
//! use treewalk_walk::{EventType, TreeWalker, WalkConfig};
//!
//! let config = WalkConfig::builder().max_depth(Some(3)).build().unwrap();
//! let walker = TreeWalker::new(config);
//!
//! for event in walker.walk("/path/to/walk") {
//!     let event = event.unwrap();
//!     if event.event_type() == EventType::Entry {
//!         println!("{}", event.path().display());
//!     }
//! }
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use treewalk_walk::{TreeWalker, WalkConfig};
//!
//! let walker = TreeWalker::new(WalkConfig::default());
//! let mut progress_rx = walker.subscribe();
//!
//! walker.walk_all("/path/to/walk").unwrap();
//! while let Ok(progress) = progress_rx.try_recv() {
//!     println!("{} directories expanded", progress.directories_expanded);
//! }
//! ```

mod cache;
mod classify;
mod depth;
mod progress;
mod provider;
mod resolver;
mod sandbox;
mod walker;

pub use cache::{AttributeCache, MemoryAttributeCache};
pub use classify::{Classification, EntryClassifier, MAX_LINK_HOPS};
pub use depth::{DepthCalculator, depth};
pub use progress::WalkProgress;
pub use provider::{FsProvider, StdFs, StdReadDir};
pub use resolver::AttributeResolver;
pub use sandbox::{SandboxPolicy, SandboxedFs};
pub use walker::{TreeWalker, Walk};

// Re-export core types for convenience
pub use tokio_util::sync::CancellationToken;
pub use treewalk_core::{
    Event, EventType, FileAttributes, FileKind, FsOperation, IdentityKey, WalkConfig, WalkError,
    WalkStats,
};
