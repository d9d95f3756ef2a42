//! Compiled artifact cache.
//!
//! [`CacheStore`] persists compiled output keyed by [`CacheKey`]. The
//! [`InvalidationListener`] purges the whole store whenever library sources
//! change, debounced; [`FsWatcher`] feeds it from the filesystem.

pub mod error;
mod invalidate;
mod key;
mod store;
mod watch;

pub use crate::invalidate::{
    ChangeEvent, ChangeKind, DEFAULT_PURGE_INTERVAL, DEFAULT_WATCHED, InvalidationListener, Invalidator, Purge,
};
pub use crate::key::CacheKey;
pub use crate::store::{CacheStore, DEFAULT_CACHE_ROOT};
pub use crate::watch::{FsWatcher, change_events};
