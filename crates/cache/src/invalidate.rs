//! Coarse cache invalidation driven by content change notifications.
//!
//! Any change under a watched subtree purges the *entire* cache store, at
//! most once per interval. Events arriving inside the interval are coalesced
//! into a single trailing purge so the last change is never lost.

use crate::store::CacheStore;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

/// Content subtrees holding library definitions.
pub const DEFAULT_WATCHED: [&str; 2] = ["/libs", "/apps"];
/// Minimum time between two purges.
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

/// A change to one path in the content store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Content-store path, e.g. `/libs/base/css/main.less`.
    pub path: String,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self { path: path.into(), kind }
    }
}

/// What handling one event did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Purge {
    /// The event is outside every watched subtree.
    Ignored,
    /// The cache was purged; carries the number of entries removed.
    Purged(usize),
    /// Too soon after the last purge; a purge is due at the given instant.
    Throttled(Instant),
    /// The purge was attempted and failed; the next event retries.
    Failed,
}

/// Purges a [`CacheStore`] in response to [`ChangeEvent`]s.
pub struct InvalidationListener {
    store: CacheStore,
    watched: Vec<String>,
    interval: Duration,
    last_purge: Mutex<Option<Instant>>,
}

impl InvalidationListener {
    pub fn new(store: CacheStore) -> Self {
        Self {
            store,
            watched: DEFAULT_WATCHED.iter().map(ToString::to_string).collect(),
            interval: DEFAULT_PURGE_INTERVAL,
            last_purge: Mutex::new(None),
        }
    }

    /// Replace the watched subtrees.
    #[must_use]
    pub fn with_watched(mut self, watched: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.watched = watched.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns `true` if `path` lies in (or is) a watched subtree.
    pub fn is_watched(&self, path: &str) -> bool {
        let path = Path::new(path);
        self.watched.iter().any(|subtree| path.starts_with(subtree))
    }

    /// React to a single event.
    pub async fn handle(&self, event: &ChangeEvent) -> Purge {
        if !self.is_watched(&event.path) {
            tracing::trace!(path = %event.path, "Change outside watched subtrees; ignoring");
            return Purge::Ignored;
        }
        tracing::debug!(path = %event.path, kind = ?event.kind, "Content changed");
        self.purge().await
    }

    /// Purge unless the last purge was less than one interval ago.
    ///
    /// The lock is held for the duration of the purge, so purges never
    /// overlap.
    pub async fn purge(&self) -> Purge {
        let mut last_purge = self.last_purge.lock().await;
        let now = Instant::now();
        if let Some(last) = *last_purge
            && now < last + self.interval
        {
            return Purge::Throttled(last + self.interval);
        }
        match self.store.purge().await {
            Ok(deleted) => {
                *last_purge = Some(now);
                Purge::Purged(deleted)
            },
            Err(err) => {
                tracing::error!(error = ?err, "Cache purge failed");
                Purge::Failed
            },
        }
    }

    /// Drain `events` until every [`Invalidator`] is dropped.
    ///
    /// Throttled events schedule one trailing purge; further throttled events
    /// before it fires are absorbed by it. A pending trailing purge still runs
    /// when the channel closes.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<ChangeEvent>) {
        let mut trailing: Option<Instant> = None;
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if let Purge::Throttled(due) = self.handle(&event).await {
                            trailing = trailing.or(Some(due));
                        }
                    },
                    None => break,
                },
                () = sleep_until(trailing.unwrap_or_else(Instant::now)), if trailing.is_some() => {
                    trailing = None;
                    if let Purge::Throttled(due) = self.purge().await {
                        trailing = Some(due);
                    }
                },
            }
        }
        if trailing.is_some() {
            self.purge_unthrottled().await;
        }
        tracing::debug!("Invalidation listener stopped");
    }

    async fn purge_unthrottled(&self) {
        let mut last_purge = self.last_purge.lock().await;
        match self.store.purge().await {
            Ok(_) => *last_purge = Some(Instant::now()),
            Err(err) => tracing::error!(error = ?err, "Cache purge failed"),
        }
    }

    /// Run the listener on its own task.
    pub fn spawn(self) -> (Invalidator, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.run(receiver));
        (Invalidator { sender }, handle)
    }
}

/// Cloneable handle feeding change events to a running listener.
#[derive(Clone, Debug)]
pub struct Invalidator {
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

impl Invalidator {
    /// Queue an event. Returns `false` once the listener has stopped.
    pub fn notify(&self, event: ChangeEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

impl From<mpsc::UnboundedSender<ChangeEvent>> for Invalidator {
    fn from(sender: mpsc::UnboundedSender<ChangeEvent>) -> Self {
        Self { sender }
    }
}
