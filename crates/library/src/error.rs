//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No library descriptor exists at the identifier.
    #[display("library not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Something exists at the identifier, but it is not a library.
    #[display("not a valid library definition: {_0}")]
    InvalidDefinition(#[error(not(source))] String),
    /// The identifier is not a usable content path.
    #[display("invalid library identifier: {_0}")]
    InvalidId(#[error(not(source))] String),
    /// The content store could not be read.
    #[display("content store error")]
    Storage,
    /// A LESS fragment imports itself, directly or transitively.
    #[display("import cycle: {_0}")]
    ImportCycle(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage)
    }

    /// Returns `true` if the library itself could not be resolved (as opposed
    /// to an operational failure while reading it).
    pub fn is_unresolvable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidDefinition(_) | Self::InvalidId(_))
    }
}
