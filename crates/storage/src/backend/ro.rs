//! Read-only storage backend decorator.
//!
//! The content store is never written to by the pipeline. Wrapping its
//! backend in [`ReadOnlyBackend`] makes that a property of the type rather
//! than a convention.

use async_trait::async_trait;
use std::path::Path;

use crate::{BackendHandle, FileInfo, StorageBackend, backend::FileInfoStream, error::Result};

/// Read-only storage backend.
///
/// Wraps another backend and silently drops all write operations, logging an
/// [`info event`](tracing::Event).
#[derive(Clone)]
pub struct ReadOnlyBackend {
    inner: BackendHandle,
}
impl ReadOnlyBackend {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StorageBackend for ReadOnlyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        self.inner.list_stream(prefix)
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        self.inner.exists(path).await
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        tracing::info!(backend = self.name(), path = %path.display(), bytes = data.len(), "Skipping write to read-only backend");
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        tracing::info!(backend = self.name(), path = %path.display(), "Skipping delete on read-only backend");
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &Path) -> Result<usize> {
        tracing::info!(backend = self.name(), prefix = %prefix.display(), "Skipping purge on read-only backend");
        Ok(0)
    }
}
