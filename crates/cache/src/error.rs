//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A cached artifact exists but could not be read. Treat as a miss.
    #[display("could not read cache entry: {}", _0.display())]
    Retrieval(#[error(not(source))] PathBuf),
    /// A compiled artifact could not be written.
    #[display("could not write cache entry: {}", _0.display())]
    Build(#[error(not(source))] PathBuf),
    #[display("could not purge cache")]
    Purge,
    /// The cache root is not a usable storage path.
    #[display("invalid cache root: {}", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
    /// The filesystem watcher could not be started.
    #[display("could not watch {}", _0.display())]
    Watch(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retrieval(_) | Self::Build(_) | Self::Purge)
    }
}
