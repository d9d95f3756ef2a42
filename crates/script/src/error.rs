//! Script Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A script error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for compile and minify operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The name, extension or MIME type does not identify a script type.
    #[display("unsupported script type: {_0}")]
    UnsupportedType(#[error(not(source))] String),
    /// No registered compiler covers the requested set of script types.
    #[display("no compiler registered for script types: {_0}")]
    NoMatchingCompiler(#[error(not(source))] String),
    /// The compiler rejected its input.
    #[display("compilation failed: {_0}")]
    Compile(#[error(not(source))] String),
    /// The external preprocessor could not be found or started.
    #[display("preprocessor not available: {_0}")]
    ProcessorNotFound(#[error(not(source))] String),
    /// A minifier could not compress its input.
    #[display("compression failed: {_0}")]
    Compression(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Compilation is deterministic given the same source; only a missing
        // preprocessor binary could be fixed out from under us.
        matches!(self, Self::ProcessorNotFound(_))
    }
}
