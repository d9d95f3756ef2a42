use crate::error::{ErrorKind, Result};
use crate::invalidate::{ChangeEvent, ChangeKind, Invalidator};
use exn::ResultExt;
use notify::event::{EventKind, ModifyKind};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Forwards filesystem changes under a content root to an [`Invalidator`].
///
/// Watching stops when this value is dropped.
pub struct FsWatcher {
    // Keep watcher alive
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FsWatcher {
    pub fn new(root: impl Into<PathBuf>, invalidator: Invalidator) -> Result<Self> {
        let root = root.into();
        let event_root = root.clone();
        let forwarder = Forwarder::new(invalidator);
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    forwarder.forward(change_events(&event_root, &event));
                },
                Err(err) => tracing::warn!(error = %err, "Filesystem watcher error"),
            },
            Config::default(),
        )
        .or_raise(|| ErrorKind::Watch(root.clone()))?;
        watcher.watch(&root, RecursiveMode::Recursive).or_raise(|| ErrorKind::Watch(root.clone()))?;
        tracing::info!(root = %root.display(), "Watching content for changes");
        Ok(Self { _watcher: watcher, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Hands change events to the listener, logging once when it has gone away.
struct Forwarder {
    invalidator: Invalidator,
    listener_gone: AtomicBool,
}

impl Forwarder {
    fn new(invalidator: Invalidator) -> Self {
        Self { invalidator, listener_gone: AtomicBool::new(false) }
    }

    /// Returns how many events the listener accepted.
    fn forward(&self, changes: Vec<ChangeEvent>) -> usize {
        let mut delivered = 0;
        for change in changes {
            if self.invalidator.notify(change) {
                delivered += 1;
            } else if !self.listener_gone.swap(true, Ordering::Relaxed) {
                tracing::debug!("Invalidation listener stopped; dropping change events");
            }
        }
        delivered
    }
}

/// Translate a filesystem event into content-store change events. Paths
/// outside `root` and access-only events produce nothing.
pub fn change_events(root: &Path, event: &Event) -> Vec<ChangeEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Added,
        EventKind::Remove(_) => ChangeKind::Removed,
        EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_) | EventKind::Other => return Vec::new(),
        EventKind::Modify(_) | EventKind::Any => ChangeKind::Changed,
    };
    event
        .paths
        .iter()
        .filter_map(|path| path.strip_prefix(root).ok())
        .filter_map(stitch_storage::content_path)
        .map(|path| ChangeEvent::new(path, kind))
        .collect()
}
