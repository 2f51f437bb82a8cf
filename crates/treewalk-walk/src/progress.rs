//! Walk progress reporting.

use std::path::PathBuf;
use std::time::Duration;

use treewalk_core::WalkStats;

/// Progress information during a walk, broadcast after each directory.
#[derive(Debug, Clone)]
pub struct WalkProgress {
    /// Entry events so far.
    pub entries: u64,
    /// Directory events so far.
    pub directories: u64,
    /// Link events so far.
    pub links: u64,
    /// Failed events so far.
    pub errors_count: u64,
    /// Directories fully drained so far.
    pub directories_expanded: u64,
    /// Directory that was just drained.
    pub current_path: PathBuf,
    /// Time elapsed since the walk started.
    pub elapsed: Duration,
}

impl WalkProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            entries: 0,
            directories: 0,
            links: 0,
            errors_count: 0,
            directories_expanded: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Snapshot running stats.
    pub fn from_stats(stats: &WalkStats, current_path: PathBuf, elapsed: Duration) -> Self {
        Self {
            entries: stats.entries,
            directories: stats.directories,
            links: stats.links,
            errors_count: stats.failed,
            directories_expanded: stats.directories_expanded,
            current_path,
            elapsed,
        }
    }

    /// Get total items seen (entries + directories + links).
    pub fn total_items(&self) -> u64 {
        self.entries + self.directories + self.links
    }

    /// Calculate walk rate in items per second.
    pub fn items_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.total_items() as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for WalkProgress {
    fn default() -> Self {
        Self::new()
    }
}
