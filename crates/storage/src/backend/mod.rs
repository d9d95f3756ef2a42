//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, which provides a unified
//! interface for the blob operations the content and cache stores need.

mod local;
#[cfg(feature = "mock")]
mod mock;
mod ro;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
pub use self::ro::ReadOnlyBackend;
use crate::FileInfo;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub(crate) type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface for storage backends.
///
/// All operations are asynchronous so that reads from the content store and
/// writes to the cache store never block the runtime. It's a glorified CRUD
/// interface, but in ✨Rust✨
///
/// # Path Handling
/// All paths are relative to the storage root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations should
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use stitch_storage::{backend::StorageBackend, error::Result};
///
/// async fn descriptor_or_default(backend: &dyn StorageBackend) -> Result<String> {
///     let path = Path::new("libs/base/library.toml");
///     if backend.exists(path).await? {
///         backend.read_to_string(path).await
///     } else {
///         Ok(String::new())
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend. Used for logging only.
    fn name(&self) -> &str;

    /// List all files matching an optional prefix.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`list_stream()`](Self::list_stream) into a [`Vec`] before
    /// returning.
    async fn list(&self, prefix: Option<&Path>) -> Result<Vec<FileInfo>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Stream file metadata matching an optional prefix.
    ///
    /// Prefix matching is component-based: the prefix `libs/base` matches
    /// `libs/base/css/main.less` but not `libs/baseline/library.toml`. Asking
    /// for a prefix that does not exist yields an empty stream, not an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// use std::path::Path;
    /// # use stitch_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.list_stream(Some(Path::new("libs/base/css")));
    /// while let Some(info) = stream.try_next().await? {
    ///     println!("{}: {} bytes", info.path.display(), info.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a>;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Read file contents as UTF-8 text.
    ///
    /// Returns [`InvalidData`](crate::error::ErrorKind::InvalidData) if the
    /// file is not valid UTF-8.
    async fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path).await?;
        String::from_utf8(bytes).map_err(|_| exn::Exn::from(ErrorKind::InvalidData(path.to_path_buf())))
    }

    /// Write file contents.
    ///
    /// Creates a new file or overwrites an existing file with the provided
    /// data. Implementations should create parent directories as needed.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Delete every file under `prefix`, returning how many were removed.
    ///
    /// The default implementation lists then deletes one file at a time.
    /// Files that vanish between the listing and the delete (another purge
    /// got there first) are not counted and are not an error.
    async fn delete_prefix(&self, prefix: &Path) -> Result<usize> {
        let files = self.list(Some(prefix)).await?;
        let mut deleted = 0;
        for file in files {
            match self.delete(&file.path).await {
                Ok(()) => deleted += 1,
                Err(e) if matches!(&*e, ErrorKind::NotFound(_)) => {},
                Err(e) => return Err(e),
            }
        }
        Ok(deleted)
    }
}
