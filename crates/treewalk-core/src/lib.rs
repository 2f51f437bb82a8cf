//! Core types for treewalk.
//!
//! This crate provides the value types shared by the traversal engine
//! and its callers: walk configuration, file attributes, the event model,
//! running statistics, and the error taxonomy.

mod attrs;
mod config;
mod error;
mod event;
mod stats;

pub use attrs::{FileAttributes, FileKind, IdentityKey};
pub use config::{WalkConfig, WalkConfigBuilder, WalkConfigBuilderError};
pub use error::{FsOperation, WalkError};
pub use event::{Event, EventType};
pub use stats::WalkStats;
