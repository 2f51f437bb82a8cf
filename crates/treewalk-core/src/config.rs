//! Walk configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Policy flags for a single walk.
///
/// Set once at construction and never mutated while a walk is running.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct WalkConfig {
    /// Maximum depth of directories to expand (None = unlimited).
    ///
    /// A directory is expanded only if its depth below the root is
    /// strictly less than this value. The root itself is always expanded.
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Follow symbolic links to their targets.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_links: bool,

    /// Skip entries refused by an access policy instead of aborting.
    #[builder(default = "false")]
    #[serde(default)]
    pub ignore_access_errors: bool,

    /// Consult the attribute cache before asking the metadata provider.
    #[builder(default = "false")]
    #[serde(default)]
    pub use_attribute_cache: bool,
}

impl WalkConfig {
    /// Create a new walk config builder.
    pub fn builder() -> WalkConfigBuilder {
        WalkConfigBuilder::default()
    }

    /// Create a config with all defaults: unbounded depth, no flags.
    pub fn new() -> Self {
        Self {
            max_depth: None,
            follow_links: false,
            ignore_access_errors: false,
            use_attribute_cache: false,
        }
    }

    /// Effective depth limit, `usize::MAX` when unbounded.
    pub fn depth_limit(&self) -> usize {
        self.max_depth.unwrap_or(usize::MAX)
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = WalkConfig::builder()
            .max_depth(Some(3))
            .follow_links(true)
            .build()
            .unwrap();

        assert_eq!(config.max_depth, Some(3));
        assert_eq!(config.depth_limit(), 3);
        assert!(config.follow_links);
        assert!(!config.ignore_access_errors);
        assert!(!config.use_attribute_cache);
    }

    #[test]
    fn test_config_defaults() {
        let config = WalkConfig::default();
        assert_eq!(config.max_depth, None);
        assert_eq!(config.depth_limit(), usize::MAX);
        assert_eq!(config, WalkConfig::builder().build().unwrap());
    }
}
