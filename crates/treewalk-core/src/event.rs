//! Walk events.

use std::path::{Path, PathBuf};

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::attrs::FileAttributes;
use crate::error::WalkError;

/// What an event reports about its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// The walk root, emitted once before anything else.
    StartDirectory,
    /// A directory, either discovered or about to be expanded.
    Directory,
    /// A regular file, or a followed link to a non-directory.
    Entry,
    /// A link that was not followed, or whose target was unreadable.
    Link,
}

impl EventType {
    /// Short label used in text output.
    pub fn label(&self) -> &'static str {
        match self {
            EventType::StartDirectory => "start",
            EventType::Directory => "dir",
            EventType::Entry => "entry",
            EventType::Link => "link",
        }
    }
}

/// A single step of a walk: a classified path or the failure to classify it.
#[derive(Debug)]
pub struct Event {
    event_type: EventType,
    path: PathBuf,
    target: Option<PathBuf>,
    result: Result<FileAttributes, WalkError>,
}

impl Event {
    /// Create a successful event.
    pub fn new(event_type: EventType, path: impl Into<PathBuf>, attrs: FileAttributes) -> Self {
        Self {
            event_type,
            path: path.into(),
            target: None,
            result: Ok(attrs),
        }
    }

    /// Create a failed event.
    pub fn failed(event_type: EventType, path: impl Into<PathBuf>, error: WalkError) -> Self {
        Self {
            event_type,
            path: path.into(),
            target: None,
            result: Err(error),
        }
    }

    /// Record the canonical target a followed link resolved to.
    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Re-label the event, keeping its path and outcome.
    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = event_type;
        self
    }

    /// Event type.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Path as discovered by the walk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Canonical target, when the path was a followed link.
    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    /// Attributes, present when the event reports success.
    pub fn attributes(&self) -> Option<&FileAttributes> {
        self.result.as_ref().ok()
    }

    /// Error, present when the event reports failure.
    pub fn error(&self) -> Option<&WalkError> {
        self.result.as_ref().err()
    }

    /// Check if the event reports success.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Consume the event, returning its outcome.
    pub fn into_result(self) -> Result<FileAttributes, WalkError> {
        self.result
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Event", 5)?;
        state.serialize_field("type", &self.event_type)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("target", &self.target)?;
        state.serialize_field("attributes", &self.attributes())?;
        state.serialize_field("error", &self.error().map(|e| e.to_string()))?;
        state.end()
    }
}
