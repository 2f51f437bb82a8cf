//! Entry classification, including symlink resolution.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;
use treewalk_core::{Event, EventType, FileKind, WalkConfig, WalkError};

use crate::cache::AttributeCache;
use crate::provider::FsProvider;
use crate::resolver::AttributeResolver;

/// Maximum number of links followed in one chain, matching the usual
/// kernel `ELOOP` limit.
pub const MAX_LINK_HOPS: usize = 40;

/// Outcome of classifying one path.
#[derive(Debug)]
pub enum Classification {
    /// The path produced an event.
    Event(Event),
    /// An access policy refused a lookup and the walk ignores such errors.
    Denied(WalkError),
    /// Attributes matched none of file, directory or symlink.
    Unclassifiable(WalkError),
}

/// Turns a path into a typed [`Event`].
pub struct EntryClassifier<'a, P: ?Sized> {
    provider: &'a P,
    resolver: AttributeResolver<'a, P>,
    config: &'a WalkConfig,
}

impl<'a, P: FsProvider + ?Sized> EntryClassifier<'a, P> {
    /// Create a classifier for one walk.
    pub fn new(
        provider: &'a P,
        cache: Option<&'a dyn AttributeCache>,
        config: &'a WalkConfig,
    ) -> Self {
        Self {
            provider,
            resolver: AttributeResolver::new(provider, cache, config.follow_links),
            config,
        }
    }

    /// Classify `path`.
    ///
    /// Returns `Err` only for an access denial the walk does not ignore.
    /// Followed links are resolved iteratively; each hop moves to the
    /// canonical target, and a target seen twice ends the chain as a loop.
    pub fn classify(&self, path: &Path) -> Result<Classification, WalkError> {
        let mut current = path.to_path_buf();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut hops = 0;

        loop {
            let attrs = match self.resolver.resolve(&current, self.config.use_attribute_cache) {
                Ok(attrs) => attrs,
                Err(err) if err.is_access_denied() => return self.denied(err),
                Err(err) if hops > 0 => {
                    return Ok(self.link_failure(path, err.into_symlink_error(path)));
                }
                Err(err) => {
                    return Ok(Classification::Event(Event::failed(
                        EventType::Entry,
                        path,
                        err,
                    )));
                }
            };

            let event_type = match attrs.kind {
                FileKind::Symlink if !self.config.follow_links => EventType::Link,
                FileKind::Symlink => {
                    if hops >= MAX_LINK_HOPS {
                        return Ok(self.link_failure(
                            path,
                            WalkError::SymlinkLoop {
                                link: path.to_path_buf(),
                                hops,
                            },
                        ));
                    }

                    let target = match self.provider.canonicalize(&current) {
                        Ok(target) => target,
                        Err(err) if err.is_access_denied() => return self.denied(err),
                        Err(err) => {
                            return Ok(self.link_failure(path, err.into_symlink_error(path)));
                        }
                    };

                    if !visited.insert(target.clone()) {
                        return Ok(self.link_failure(
                            path,
                            WalkError::SymlinkLoop {
                                link: path.to_path_buf(),
                                hops,
                            },
                        ));
                    }

                    debug!(link = %path.display(), target = %target.display(), "following link");
                    current = target;
                    hops += 1;
                    continue;
                }
                FileKind::File => EventType::Entry,
                FileKind::Directory => EventType::Directory,
                FileKind::Other => {
                    return Ok(Classification::Unclassifiable(WalkError::Unclassifiable {
                        path: path.to_path_buf(),
                    }));
                }
            };

            let event = Event::new(event_type, path, attrs);
            return Ok(Classification::Event(if hops > 0 {
                event.with_target(current)
            } else {
                event
            }));
        }
    }

    fn denied(&self, err: WalkError) -> Result<Classification, WalkError> {
        if self.config.ignore_access_errors {
            Ok(Classification::Denied(err))
        } else {
            Err(err)
        }
    }

    fn link_failure(&self, path: &Path, err: WalkError) -> Classification {
        Classification::Event(Event::failed(EventType::Link, path, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StdFs;
    use tempfile::TempDir;

    fn classify(config: &WalkConfig, path: &Path) -> Classification {
        EntryClassifier::new(&StdFs, None, config).classify(path).unwrap()
    }

    fn expect_event(classification: Classification) -> Event {
        match classification {
            Classification::Event(event) => event,
            other => panic!("Expected event, got {other:?}"),
        }
    }

    #[test]
    fn test_file_and_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("f"), "x").unwrap();
        std::fs::create_dir(temp.path().join("d")).unwrap();
        let config = WalkConfig::default();

        let file = expect_event(classify(&config, &temp.path().join("f")));
        assert_eq!(file.event_type(), EventType::Entry);
        assert!(file.is_ok());

        let dir = expect_event(classify(&config, &temp.path().join("d")));
        assert_eq!(dir.event_type(), EventType::Directory);
    }

    #[test]
    fn test_missing_entry_fails_as_entry() {
        let temp = TempDir::new().unwrap();
        let event = expect_event(classify(&WalkConfig::default(), &temp.path().join("nope")));
        assert_eq!(event.event_type(), EventType::Entry);
        assert!(matches!(event.error(), Some(WalkError::Attribute { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_link_not_followed() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("d")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("d"), temp.path().join("l")).unwrap();

        let event = expect_event(classify(&WalkConfig::default(), &temp.path().join("l")));
        assert_eq!(event.event_type(), EventType::Link);
        assert!(event.attributes().unwrap().is_symbolic_link());
        assert!(event.target().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_link_followed_to_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("f"), "hello").unwrap();
        std::os::unix::fs::symlink(temp.path().join("f"), temp.path().join("l")).unwrap();
        let config = WalkConfig::builder().follow_links(true).build().unwrap();

        let event = expect_event(classify(&config, &temp.path().join("l")));
        assert_eq!(event.event_type(), EventType::Entry);
        assert_eq!(event.attributes().unwrap().size, 5);
        assert_eq!(
            event.target().unwrap(),
            std::fs::canonicalize(temp.path().join("f")).unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_followed() {
        let temp = TempDir::new().unwrap();
        std::os::unix::fs::symlink(temp.path().join("missing"), temp.path().join("l")).unwrap();
        let config = WalkConfig::builder().follow_links(true).build().unwrap();

        let event = expect_event(classify(&config, &temp.path().join("l")));
        assert_eq!(event.event_type(), EventType::Link);
        assert!(matches!(
            event.error(),
            Some(WalkError::SymlinkTargetUnreadable { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_fifo_is_unclassifiable() {
        let temp = TempDir::new().unwrap();
        let fifo = temp.path().join("pipe");
        let status = std::process::Command::new("mkfifo").arg(&fifo).status();
        if !matches!(status, Ok(s) if s.success()) {
            return;
        }

        let result = classify(&WalkConfig::default(), &fifo);
        assert!(matches!(result, Classification::Unclassifiable(_)));
    }
}
