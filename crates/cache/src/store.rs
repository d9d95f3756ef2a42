use crate::error::{ErrorKind, Result};
use crate::key::CacheKey;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use stitch_storage::error::ErrorKind as StorageErrorKind;
use stitch_storage::{BackendHandle, StorageBackend, validate_path};
use tracing::instrument;

/// Default cache root inside the cache backend.
pub const DEFAULT_CACHE_ROOT: &str = "var/stitch";

/// Persistent store of compiled artifacts.
///
/// Entries are plain text blobs laid out as `<root>/<library><.min?><ext>`.
/// Writes are idempotent overwrites; entries are only ever removed together
/// by [`purge`](Self::purge).
#[derive(Clone)]
pub struct CacheStore {
    backend: BackendHandle,
    root: PathBuf,
}

impl CacheStore {
    pub fn new(backend: BackendHandle, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = validate_path(root).or_raise(|| ErrorKind::InvalidRoot(root.to_path_buf()))?;
        Ok(Self { backend, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    /// The cached artifact for `key`, or `None` on a miss.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        let path = key.path(&self.root);
        match self.backend.read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(err) if matches!(&*err, StorageErrorKind::NotFound(_)) => Ok(None),
            Err(err) => Err(err.raise(ErrorKind::Retrieval(path))),
        }
    }

    /// Write (or overwrite) the artifact for `key`.
    #[instrument(skip(self, text), fields(key = %key, size = text.len()))]
    pub async fn put(&self, key: &CacheKey, text: &str) -> Result<()> {
        let path = key.path(&self.root);
        self.backend.write(&path, text.as_bytes()).await.or_raise(|| ErrorKind::Build(path))
    }

    /// Delete every entry, returning how many were removed.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn purge(&self) -> Result<usize> {
        let deleted = self.backend.delete_prefix(&self.root).await.or_raise(|| ErrorKind::Purge)?;
        tracing::info!(deleted, "Purged cache");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stitch_library::LibraryId;
    use stitch_script::ScriptType;
    use stitch_storage::backend::{LocalBackend, MockBackend};

    fn key(library: &str, script_type: ScriptType, minified: bool) -> CacheKey {
        CacheKey::new(library.parse::<LibraryId>().unwrap(), script_type, minified)
    }

    #[tokio::test]
    async fn test_get_put() {
        let backend = Arc::new(MockBackend::default());
        let store = CacheStore::new(backend.clone(), DEFAULT_CACHE_ROOT).unwrap();
        let css = key("/libs/base", ScriptType::Css, false);
        let min = key("/libs/base", ScriptType::Css, true);

        assert_eq!(store.get(&css).await.unwrap(), None);
        store.put(&css, "body{ color:red;}\n").await.unwrap();
        store.put(&min, "body{color:red}").await.unwrap();
        assert_eq!(store.get(&css).await.unwrap().as_deref(), Some("body{ color:red;}\n"));
        assert_eq!(store.get(&min).await.unwrap().as_deref(), Some("body{color:red}"));
        assert!(backend.exists(Path::new("var/stitch/libs/base.min.css")).await.unwrap());

        store.put(&css, "body{}").await.unwrap();
        assert_eq!(store.get(&css).await.unwrap().as_deref(), Some("body{}"));
    }

    #[tokio::test]
    async fn test_purge_only_touches_root() {
        let backend = Arc::new(MockBackend::with_files([("libs/base/library.toml", "title = \"Base\"")]));
        let store = CacheStore::new(backend.clone(), "var/stitch").unwrap();
        store.put(&key("/libs/base", ScriptType::Css, false), "a").await.unwrap();
        store.put(&key("/libs/base", ScriptType::Js, true), "b").await.unwrap();

        assert_eq!(store.purge().await.unwrap(), 2);
        assert_eq!(store.get(&key("/libs/base", ScriptType::Css, false)).await.unwrap(), None);
        assert_eq!(backend.len().await, 1);
        assert_eq!(store.purge().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_retrieval_error() {
        let backend = Arc::new(MockBackend::default());
        let store = CacheStore::new(backend.clone(), "var/stitch").unwrap();
        let key = key("/lib", ScriptType::Js, false);
        backend.write(&key.path(store.root()), b"\xff").await.unwrap();
        let err = store.get(&key).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Retrieval(_)));
    }

    #[tokio::test]
    async fn test_local_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(LocalBackend::new("cache", dir.path()).unwrap());
        let store = CacheStore::new(backend, "var/stitch").unwrap();
        let key = key("/apps/site", ScriptType::Js, true);
        store.put(&key, "run()").await.unwrap();
        assert!(dir.path().join("var/stitch/apps/site.min.js").is_file());
        assert_eq!(store.purge().await.unwrap(), 1);
        assert!(!dir.path().join("var/stitch/apps/site.min.js").exists());
    }

    #[test]
    fn test_invalid_root() {
        let err = CacheStore::new(Arc::new(MockBackend::default()), "../outside").err().unwrap();
        assert!(matches!(&*err, ErrorKind::InvalidRoot(_)));
    }
}
