//! Stitch Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Errors from the member crates are
//! raised into these kinds with `or_raise`, keeping the full error tree.

use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested library could not be resolved.
    #[display("library could not be resolved: {_0}")]
    Library(#[error(not(source))] String),
    /// No registered compiler covers the library's script types.
    #[display("no compiler registered for script types: {_0}")]
    NoMatchingCompiler(#[error(not(source))] String),
    /// A library depends on itself, directly or transitively.
    #[display("dependency cycle: {_0}")]
    DependencyCycle(#[error(not(source))] String),
    /// Assembling or compiling a library's sources failed.
    #[display("compilation failed: {_0}")]
    Compile(#[error(not(source))] String),
    #[display("cache store error")]
    Cache,
    /// The rebuild queue has shut down.
    #[display("rebuild queue unavailable")]
    Queue,
    #[display("invalid configuration")]
    Config,
    #[display("storage backend unavailable")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cache | Self::Storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::DependencyCycle("/a -> /b -> /a".to_string()).to_string(), "dependency cycle: /a -> /b -> /a");
        assert_eq!(ErrorKind::NoMatchingCompiler("js".to_string()).to_string(), "no compiler registered for script types: js");
    }
}
