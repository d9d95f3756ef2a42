//! Local filesystem storage backend.
//!
//! Files are stored in a configured directory and accessed using standard
//! filesystem operations via `tokio::fs` for async I/O.

use crate::backend::FileInfoStream;
use crate::error::ErrorKind;
use crate::{FileInfo, StorageBackend, error::Result, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::fs::{Metadata, create_dir_all as sync_create_dir};
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};

enum WalkEntry {
    File(FileInfo),
    Descend(PathBuf),
    Skip,
}

/// Local filesystem storage backend.
///
/// Stores files in a directory on the local filesystem. All paths are relative
/// to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use stitch_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let content = LocalBackend::new("content", "/srv/content")?;
/// let cache = LocalBackend::new("cache", "/srv/cache")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend rooted at `root`.
    ///
    /// The root is created if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the path is not
    /// absolute or points at something other than a directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Non-async on purpose: this only happens once at startup and
            // it's not worth the hassle of making the constructor async.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    /// Root directory of this backend on the local filesystem.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the absolute path for a relative storage path.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    /// Convert an absolute path back to a relative storage path.
    pub fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        if !absolute.is_absolute() {
            exn::bail!(ErrorKind::BackendError(format!(
                "attempting to get relative path of non-absolute path `{:?}`",
                absolute
            )))
        }
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{:?}` is not within root `{:?}`", absolute, self.root))
        })?;
        Ok(validate_path(relative)?)
    }

    fn metadata(path: &Path, metadata: Metadata) -> Result<FileInfo> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?;
        Ok(FileInfo::new(path, metadata.len(), modified))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// I pulled this out of the stream loop because you can't `?` in there;
    /// every error has to be yielded by hand and I kept getting it wrong.
    /// Everything fallible about a single entry lives here instead.
    async fn process_entry(&self, entry: DirEntry, prefix: Option<&Path>) -> Result<WalkEntry> {
        let path = entry.path();
        let metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, &path))?;
        let relative = self.relative_path(&path)?;
        if let Some(pfx) = prefix
            && !relative.starts_with(pfx)
        {
            return Ok(WalkEntry::Skip);
        }
        if metadata.is_dir() {
            return Ok(WalkEntry::Descend(path));
        }
        if metadata.is_file() {
            return Ok(WalkEntry::File(Self::metadata(&relative, metadata)?));
        }
        // Note: silently drop what is most likely a broken symlink.
        Ok(WalkEntry::Skip)
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Result::Err(e) })),
        };

        // Walking from the parent of the prefix looks odd, but it's the only way
        // I found to make a prefix naming a single file (or a directory that
        // doesn't exist yet) behave.
        // "libs/base" starts in "libs" and matches:
        // - [MATCH] "libs/base/css/main.less"
        // - [MATCH] "libs/base" (could be a file)
        // - [NOT MATCH] "libs/baseline/library.toml" (component-based)
        let start_dir = validated_prefix
            .as_ref()
            .map(|prefix| self.root.join(prefix).parent().unwrap_or(&self.root).to_path_buf())
            .unwrap_or_else(|| self.root.clone());
        let mut stack = vec![start_dir];

        Box::pin(stream! {
            'dirs: while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    // A directory that doesn't exist is simply empty.
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        continue 'dirs;
                    }
                };

                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(e) => { yield Err(exn::Exn::from(Self::map_io_error(e, &current))); continue 'entries; },
                    };
                    match self.process_entry(entry, validated_prefix.as_deref()).await {
                        Ok(WalkEntry::File(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) => stack.push(d),
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    };
                }
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::try_exists(&abs_path).await.map_err(ErrorKind::Io)?)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        Ok(fs::write(&abs_path, data).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_file(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn delete_prefix(&self, prefix: &Path) -> Result<usize> {
        let abs_path = self.absolute_path(prefix)?;
        let metadata = match fs::metadata(&abs_path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => exn::bail!(Self::map_io_error(e, prefix)),
        };
        if metadata.is_file() {
            self.delete(prefix).await?;
            return Ok(1);
        }
        let count = self.list(Some(prefix)).await?.len();
        match fs::remove_dir_all(&abs_path).await {
            Ok(()) => Ok(count),
            // Somebody else purged it while we were counting.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => exn::bail!(Self::map_io_error(e, prefix)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("content", temp_dir.path()).unwrap();
        (temp_dir, backend)
    }

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("name", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("name", "relative/path").is_err());
        assert!(LocalBackend::new("name", "./relative").is_err());
    }

    #[test]
    fn test_new_creates_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("cache/store");
        LocalBackend::new("cache", &root).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn test_absolute_and_relative_paths() {
        let (temp_dir, backend) = backend();
        let expected = temp_dir.path().join("libs/base/library.toml");
        assert_eq!(backend.absolute_path("/libs/base/library.toml").unwrap(), expected);
        assert_eq!(backend.relative_path(&expected).unwrap(), Path::new("libs/base/library.toml"));
        assert!(backend.absolute_path("../etc/passwd").is_err());
        assert!(backend.relative_path("/other/file.css").is_err());
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let (_dir, backend) = backend();
        backend.write(Path::new("libs/base/css/main.css"), b"body{}").await.unwrap();
        assert_eq!(backend.read(Path::new("libs/base/css/main.css")).await.unwrap(), b"body{}");
        assert_eq!(backend.read_to_string(Path::new("libs/base/css/main.css")).await.unwrap(), "body{}");
    }

    #[tokio::test]
    async fn test_read_to_string_rejects_binary() {
        let (_dir, backend) = backend();
        backend.write(Path::new("blob.bin"), &[0xff, 0xfe, 0x00]).await.unwrap();
        let err = backend.read_to_string(Path::new("blob.bin")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let (_dir, backend) = backend();
        let err = backend.read(Path::new("libs/missing/library.toml")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_prefix_is_component_based() {
        let (_dir, backend) = backend();
        backend.write(Path::new("libs/base/css/main.css"), b"a").await.unwrap();
        backend.write(Path::new("libs/baseline/library.toml"), b"b").await.unwrap();
        backend.write(Path::new("libs/base.css"), b"c").await.unwrap();
        let mut files = backend.list(Some(Path::new("libs/base"))).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files.pop().unwrap().path, Path::new("libs/base/css/main.css"));
    }

    #[tokio::test]
    async fn test_list_nested_prefix() {
        let (_dir, backend) = backend();
        backend.write(Path::new("libs/base/css/a.css"), b"a").await.unwrap();
        backend.write(Path::new("libs/base/js/b.js"), b"b").await.unwrap();
        let files = backend.list(Some(Path::new("/libs/base/css"))).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name(), Some("a.css"));
    }

    #[tokio::test]
    async fn test_list_nonexistent_prefix() {
        let (_dir, backend) = backend();
        assert!(backend.list(Some(Path::new("nonexistent/"))).await.unwrap().is_empty());
        assert!(backend.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, backend) = backend();
        backend.write(Path::new("file.css"), b"data").await.unwrap();
        backend.delete(Path::new("file.css")).await.unwrap();
        assert!(!backend.exists(Path::new("file.css")).await.unwrap());
        let err = backend.delete(Path::new("file.css")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_prefix() {
        let (temp_dir, backend) = backend();
        backend.write(Path::new("var/stitch/libs/base.css"), b"a").await.unwrap();
        backend.write(Path::new("var/stitch/libs/base.min.css"), b"b").await.unwrap();
        backend.write(Path::new("var/stitch/apps/site.js"), b"c").await.unwrap();
        backend.write(Path::new("var/other.txt"), b"d").await.unwrap();
        assert_eq!(backend.delete_prefix(Path::new("var/stitch")).await.unwrap(), 3);
        assert!(!temp_dir.path().join("var/stitch").exists());
        assert!(backend.exists(Path::new("var/other.txt")).await.unwrap());
        // Purging twice is harmless
        assert_eq!(backend.delete_prefix(Path::new("var/stitch")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_path_security() {
        let (_dir, backend) = backend();
        assert!(backend.read(Path::new("../etc/passwd")).await.is_err());
        assert!(backend.read(Path::new("etc/../../passwd")).await.is_err());
        assert!(backend.write(Path::new("../etc/passwd"), b"data").await.is_err());
        assert!(backend.delete(Path::new("../../file")).await.is_err());
        assert!(backend.delete_prefix(Path::new("..")).await.is_err());
    }
}
