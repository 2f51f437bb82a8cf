//! Iterative depth-first directory walker.
//!
//! The walk keeps its own stack of open directory enumerations instead of
//! recursing. Subdirectories are pushed the moment they are discovered, so
//! among siblings the one discovered last is expanded first.

use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use treewalk_core::{Event, EventType, IdentityKey, WalkConfig, WalkError, WalkStats};

use crate::cache::{AttributeCache, MemoryAttributeCache};
use crate::classify::{Classification, EntryClassifier};
use crate::depth::DepthCalculator;
use crate::progress::WalkProgress;
use crate::provider::{FsProvider, StdFs};

/// Depth-first tree walker over a [`FsProvider`].
pub struct TreeWalker<P = StdFs> {
    config: WalkConfig,
    provider: P,
    cache: Option<Arc<dyn AttributeCache>>,
    cancel: Option<CancellationToken>,
    progress_tx: broadcast::Sender<WalkProgress>,
}

impl TreeWalker<StdFs> {
    /// Create a walker over the local file system.
    pub fn new(config: WalkConfig) -> Self {
        Self::with_provider(config, StdFs)
    }
}

impl<P: FsProvider> TreeWalker<P> {
    /// Create a walker over a custom provider.
    pub fn with_provider(config: WalkConfig, provider: P) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            config,
            provider,
            cache: None,
            cancel: None,
            progress_tx,
        }
    }

    /// Share an attribute cache across walks.
    ///
    /// Only consulted when `use_attribute_cache` is set. Without one, each
    /// walk gets a fresh in-memory cache.
    pub fn with_cache(mut self, cache: Arc<dyn AttributeCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Stop walks when `token` is cancelled, checked once per directory.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Subscribe to walk progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<WalkProgress> {
        self.progress_tx.subscribe()
    }

    /// The walk configuration.
    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// The underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Start a lazy walk from `root`.
    pub fn walk(&self, root: impl AsRef<Path>) -> Walk<'_, P> {
        let cache = if self.config.use_attribute_cache {
            let cache: Arc<dyn AttributeCache> = match &self.cache {
                Some(cache) => Arc::clone(cache),
                None => Arc::new(MemoryAttributeCache::new()),
            };
            Some(cache)
        } else {
            None
        };

        Walk {
            walker: self,
            depth: DepthCalculator::new(root.as_ref()),
            cache,
            stack: Vec::new(),
            current: None,
            pending: VecDeque::new(),
            failure: None,
            stats: WalkStats::new(),
            phase: Phase::Initial,
            started: Instant::now(),
        }
    }

    /// Walk `root` to completion, collecting every event.
    pub fn walk_all(&self, root: impl AsRef<Path>) -> Result<Vec<Event>, WalkError> {
        self.walk(root).collect()
    }
}

/// One open directory enumeration. Dropping it releases the handle.
struct DirectoryNode<R> {
    path: PathBuf,
    /// Identity of the directory, only reported in logs.
    key: Option<IdentityKey>,
    entries: R,
    skipped: bool,
}

impl<R: Iterator<Item = Result<PathBuf, WalkError>>> DirectoryNode<R> {
    fn new(path: PathBuf, key: Option<IdentityKey>, entries: R) -> Self {
        Self {
            path,
            key,
            entries,
            skipped: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn key(&self) -> Option<IdentityKey> {
        self.key
    }

    fn skip(&mut self) {
        self.skipped = true;
    }

    fn skipped(&self) -> bool {
        self.skipped
    }

    fn next_entry(&mut self) -> Option<Result<PathBuf, WalkError>> {
        if self.skipped {
            return None;
        }
        self.entries.next()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    Walking,
    Done,
}

/// A walk in progress, yielding events in traversal order.
///
/// All traversal state lives here and nowhere else. A fatal error is
/// yielded once, after any events already produced; by then every open
/// enumeration has been released and the iterator is exhausted.
pub struct Walk<'w, P: FsProvider> {
    walker: &'w TreeWalker<P>,
    depth: DepthCalculator,
    cache: Option<Arc<dyn AttributeCache>>,
    stack: Vec<DirectoryNode<P::ReadDir>>,
    current: Option<DirectoryNode<P::ReadDir>>,
    pending: VecDeque<Event>,
    failure: Option<WalkError>,
    stats: WalkStats,
    phase: Phase,
    started: Instant,
}

impl<'w, P: FsProvider> Walk<'w, P> {
    /// Root of this walk.
    pub fn root(&self) -> &Path {
        self.depth.root()
    }

    /// Running statistics.
    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    /// Number of enumeration handles currently held.
    pub fn open_directories(&self) -> usize {
        self.stack.len() + usize::from(self.current.is_some())
    }

    /// Check if the walk has produced its last event.
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Done && self.pending.is_empty() && self.failure.is_none()
    }

    fn classifier(&self) -> EntryClassifier<'_, P> {
        EntryClassifier::new(
            &self.walker.provider,
            self.cache.as_deref(),
            &self.walker.config,
        )
    }

    fn step(&mut self) -> Result<(), WalkError> {
        match self.phase {
            Phase::Initial => {
                self.phase = Phase::Walking;
                self.open_root()
            }
            Phase::Done => Ok(()),
            Phase::Walking => match self.current.as_mut().map(DirectoryNode::next_entry) {
                Some(Some(Ok(child))) => self.visit_child(child),
                Some(Some(Err(err))) => self.enumeration_failed(err),
                Some(None) => {
                    self.finish_current();
                    Ok(())
                }
                None => match self.stack.pop() {
                    Some(node) => self.expand(node),
                    None => {
                        debug!(root = %self.root().display(), "walk finished");
                        self.phase = Phase::Done;
                        Ok(())
                    }
                },
            },
        }
    }

    fn open_root(&mut self) -> Result<(), WalkError> {
        let root = self.root().to_path_buf();
        debug!(root = %root.display(), "starting walk");

        let Some(event) = self.directory_event(EventType::StartDirectory, &root)? else {
            self.phase = Phase::Done;
            return Ok(());
        };
        let event = if event.is_ok() {
            event
        } else {
            event.with_event_type(EventType::Directory)
        };
        // An unfollowed link root is reported as such and never listed.
        if event.attributes().is_some_and(|attrs| attrs.is_symbolic_link()) {
            self.emit(event.with_event_type(EventType::Link));
            self.phase = Phase::Done;
            return Ok(());
        }
        let key = event.attributes().and_then(|attrs| attrs.identity);

        match self.walker.provider.read_dir(&root) {
            Ok(entries) => {
                self.stack.push(DirectoryNode::new(root, key, entries));
                self.emit(event);
            }
            Err(err) if err.is_access_denied() => {
                self.deny(err)?;
                self.emit(event);
            }
            Err(err) => {
                warn!(path = %root.display(), error = %err, "root cannot be opened");
                if event.is_ok() {
                    self.emit(Event::failed(EventType::Directory, root, err));
                } else {
                    self.emit(event);
                }
            }
        }
        Ok(())
    }

    fn expand(&mut self, mut node: DirectoryNode<P::ReadDir>) -> Result<(), WalkError> {
        if self
            .walker
            .cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            return Err(WalkError::Cancelled);
        }

        debug!(
            path = %node.path().display(),
            key = ?node.key(),
            queued = self.stack.len(),
            "expanding directory"
        );

        let path = node.path().to_path_buf();
        match self.directory_event(EventType::Directory, &path)? {
            Some(event) => self.emit(event),
            None => node.skip(),
        }
        self.current = Some(node);
        Ok(())
    }

    fn visit_child(&mut self, child: PathBuf) -> Result<(), WalkError> {
        let classification = self.classifier().classify(&child)?;
        let event = match classification {
            Classification::Event(event) => event,
            Classification::Denied(err) => return self.deny(err),
            Classification::Unclassifiable(err) => {
                warn!(path = %child.display(), "{err}");
                self.stats.record_unclassified();
                return Ok(());
            }
        };

        let expand = event.event_type() == EventType::Directory
            && self.depth.depth(&child) < self.walker.config.depth_limit();
        let key = event.attributes().and_then(|attrs| attrs.identity);
        self.emit(event);

        if expand {
            self.open_child(child, key)?;
        }
        Ok(())
    }

    fn open_child(&mut self, path: PathBuf, key: Option<IdentityKey>) -> Result<(), WalkError> {
        match self.walker.provider.read_dir(&path) {
            Ok(entries) => {
                self.stack.push(DirectoryNode::new(path, key, entries));
                Ok(())
            }
            Err(err) if err.is_access_denied() => self.deny(err),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "directory cannot be opened");
                self.emit(Event::failed(EventType::Directory, path, err));
                Ok(())
            }
        }
    }

    /// A single child could not be read; the rest of the listing still is.
    fn enumeration_failed(&mut self, err: WalkError) -> Result<(), WalkError> {
        if err.is_access_denied() {
            return self.deny(err);
        }
        let path = match (err.path(), self.current.as_ref()) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(node)) => node.path().to_path_buf(),
            (None, None) => return Ok(()),
        };
        warn!(path = %path.display(), error = %err, "directory entry unreadable");
        self.emit(Event::failed(EventType::Entry, path, err));
        Ok(())
    }

    fn finish_current(&mut self) {
        let Some(node) = self.current.take() else {
            return;
        };
        let path = node.path().to_path_buf();
        if !node.skipped() {
            self.stats.record_expanded();
        }
        drop(node);

        let progress = WalkProgress::from_stats(&self.stats, path, self.started.elapsed());
        // No subscribers is not an error.
        let _ = self.walker.progress_tx.send(progress);
    }

    /// Classify a directory that is about to be announced, relabelled as
    /// `event_type`. `None` means an ignored access denial.
    fn directory_event(
        &mut self,
        event_type: EventType,
        path: &Path,
    ) -> Result<Option<Event>, WalkError> {
        let classification = self.classifier().classify(path)?;
        match classification {
            Classification::Event(event) => Ok(Some(event.with_event_type(event_type))),
            Classification::Denied(err) => {
                self.deny(err)?;
                Ok(None)
            }
            Classification::Unclassifiable(err) => Ok(Some(Event::failed(event_type, path, err))),
        }
    }

    fn deny(&mut self, err: WalkError) -> Result<(), WalkError> {
        if err.is_fatal(self.walker.config.ignore_access_errors) {
            return Err(err);
        }
        debug!(error = %err, "skipping denied path");
        self.stats.record_denied();
        Ok(())
    }

    fn emit(&mut self, event: Event) {
        self.stats.record(&event);
        self.pending.push_back(event);
    }

    fn abort(&mut self, err: WalkError) {
        debug!(error = %err, open = self.open_directories(), "walk aborted");
        self.current = None;
        self.stack.clear();
        self.phase = Phase::Done;
        self.failure = Some(err);
    }
}

impl<P: FsProvider> Iterator for Walk<'_, P> {
    type Item = Result<Event, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if let Some(err) = self.failure.take() {
                return Some(Err(err));
            }
            if self.phase == Phase::Done {
                return None;
            }
            if let Err(err) = self.step() {
                self.abort(err);
            }
        }
    }
}

impl<P: FsProvider> FusedIterator for Walk<'_, P> {}
