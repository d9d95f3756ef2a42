//! Blob storage for stitch.
//!
//! Both halves of the pipeline sit on top of a [`StorageBackend`]: the
//! content store reads library descriptors and source fragments from one,
//! and the cache store writes compiled artifacts into another. Paths are
//! always relative to the backend root and validated with [`validate_path`].

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::models::FileInfo;
pub use crate::path::{content_path, validate as validate_path};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
