//! Running walk statistics.

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventType};

/// Summary statistics for a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkStats {
    /// Root start events (0 or 1).
    pub start_directories: u64,
    /// Directory events, discovery and expansion start alike.
    pub directories: u64,
    /// Entry events.
    pub entries: u64,
    /// Link events.
    pub links: u64,
    /// Events carrying an error instead of attributes.
    pub failed: u64,
    /// Entries dropped because they matched no known type.
    pub unclassified: u64,
    /// Entries or subtrees skipped after an ignored access denial.
    pub denied: u64,
    /// Directories whose enumeration was fully drained.
    pub directories_expanded: u64,
    /// Total size of successful entry events, in bytes.
    pub total_size: u64,
}

impl WalkStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with an emitted event.
    pub fn record(&mut self, event: &Event) {
        match event.event_type() {
            EventType::StartDirectory => self.start_directories += 1,
            EventType::Directory => self.directories += 1,
            EventType::Entry => self.entries += 1,
            EventType::Link => self.links += 1,
        }

        match event.attributes() {
            Some(attrs) if event.event_type() == EventType::Entry => {
                self.total_size += attrs.size;
            }
            Some(_) => {}
            None => self.failed += 1,
        }
    }

    /// Record an entry that matched no known type.
    pub fn record_unclassified(&mut self) {
        self.unclassified += 1;
    }

    /// Record an entry or subtree skipped after an access denial.
    pub fn record_denied(&mut self) {
        self.denied += 1;
    }

    /// Record a fully drained directory.
    pub fn record_expanded(&mut self) {
        self.directories_expanded += 1;
    }

    /// Total number of events emitted.
    pub fn total_events(&self) -> u64 {
        self.start_directories + self.directories + self.entries + self.links
    }
}
