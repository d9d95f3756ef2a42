use crate::error::{ErrorKind, Result};
use crate::models::{DESCRIPTOR_FILE, Descriptor, Library, LibraryId, ScriptFolder, ScriptFragment};
use exn::ResultExt;
use std::path::Path;
use std::sync::Arc;
use stitch_script::ScriptType;
use stitch_storage::{BackendHandle, StorageBackend};
use stitch_storage::backend::ReadOnlyBackend;
use stitch_storage::error::ErrorKind as StorageErrorKind;
use tracing::instrument;

/// Read-only view of the content store holding library definitions.
///
/// A library `/libs/base` lives under `libs/base/`: its descriptor in
/// `library.toml`, style fragments in `css/` and script fragments in `js/`.
#[derive(Clone)]
pub struct ContentStore {
    backend: BackendHandle,
}

impl ContentStore {
    /// Wrap `backend`; writes through this store are impossible.
    pub fn new(backend: BackendHandle) -> Self {
        Self { backend: Arc::new(ReadOnlyBackend::new(backend)) }
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    /// Parse `id` and resolve the library.
    pub async fn resolve(&self, id: &str) -> Result<Library> {
        self.library(&LibraryId::new(id)?).await
    }

    /// Resolve a library's metadata and folders.
    ///
    /// Fails with [`ErrorKind::NotFound`] when no descriptor exists and with
    /// [`ErrorKind::InvalidDefinition`] when the descriptor is not a library
    /// definition.
    #[instrument(skip(self), fields(library = %id))]
    pub async fn library(&self, id: &LibraryId) -> Result<Library> {
        let root = id.storage_path();
        let text = match self.backend.read_to_string(&root.join(DESCRIPTOR_FILE)).await {
            Ok(text) => text,
            Err(err) => {
                let kind = match &*err {
                    StorageErrorKind::NotFound(_) => ErrorKind::NotFound(id.to_string()),
                    StorageErrorKind::InvalidData(_) => ErrorKind::InvalidDefinition(id.to_string()),
                    _ => ErrorKind::Storage,
                };
                return Err(err.raise(kind));
            },
        };
        let descriptor: Descriptor =
            toml::from_str(&text).or_raise(|| ErrorKind::InvalidDefinition(id.to_string()))?;

        let dependencies = descriptor
            .dependencies
            .iter()
            .filter_map(|raw| match LibraryId::new(raw) {
                Ok(dependency) => Some(dependency),
                Err(err) => {
                    tracing::warn!(dependency = raw, error = ?err, "Dropping invalid dependency identifier");
                    None
                },
            })
            .collect();
        let css = self.folder(&root, ScriptType::Css, descriptor.css.include).await?;
        let js = self.folder(&root, ScriptType::Js, descriptor.js.include).await?;

        Ok(Library {
            title: descriptor.title.filter(|t| !t.is_empty()).unwrap_or_else(|| id.name().to_string()),
            description: descriptor.description,
            id: id.clone(),
            dependencies,
            css,
            js,
        })
    }

    /// Resolve each declared dependency of `library`, in order.
    ///
    /// Dependencies that cannot be resolved are logged and left out.
    pub async fn dependencies(&self, library: &Library) -> Vec<Library> {
        let mut resolved = Vec::with_capacity(library.dependencies.len());
        for id in &library.dependencies {
            match self.library(id).await {
                Ok(dependency) => resolved.push(dependency),
                Err(err) => {
                    tracing::warn!(library = %library.id, dependency = %id, error = ?err, "Dropping unresolvable dependency");
                },
            }
        }
        resolved
    }

    async fn folder(&self, root: &Path, script_type: ScriptType, include: Vec<String>) -> Result<ScriptFolder> {
        let path = root.join(script_type.folder());
        let files = self.backend.list(Some(&path)).await.or_raise(|| ErrorKind::Storage)?;
        let fragments = files
            .into_iter()
            .filter(|file| file.path.parent() == Some(path.as_path()))
            .filter_map(|file| ScriptFragment::new(file.path, Arc::clone(&self.backend)));
        Ok(ScriptFolder::new(path.clone(), include, fragments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stitch_storage::backend::MockBackend;

    async fn store() -> ContentStore {
        let backend = MockBackend::with_files([
            (
                "libs/base/library.toml",
                "title = \"Base\"\ndependencies = [\"/libs/reset\", \"../../nope\", \"/libs/missing\"]\n[css]\ninclude = [\"main.less\", \"gone.less\"]\n[js]\ninclude = [\"app.js\"]\n",
            ),
            ("libs/base/css/main.less", "@import \"vars\";"),
            ("libs/base/css/vars.less", "@a: 1;"),
            ("libs/base/css/nested/deep.less", "deep{}"),
            ("libs/base/js/app.js", "run();"),
            ("libs/reset/library.toml", "[css]\ninclude = [\"reset.css\"]\n"),
            ("libs/reset/css/reset.css", "*{margin:0}"),
            ("libs/broken/library.toml", "dependencies = 42"),
        ]);
        backend.write(Path::new("libs/binary/library.toml"), b"\xff\xfe").await.unwrap();
        ContentStore::new(Arc::new(backend))
    }

    #[tokio::test]
    async fn test_resolve_library() {
        let library = store().await.resolve("libs/base/").await.unwrap();
        assert_eq!(library.id.as_str(), "/libs/base");
        assert_eq!(library.title, "Base");
        assert_eq!(library.description, None);
        let dependencies: Vec<_> = library.dependencies.iter().map(LibraryId::as_str).collect();
        assert_eq!(dependencies, ["/libs/reset", "/libs/missing"]);
        assert_eq!(library.css.include(), ["main.less"]);
        assert!(library.css.get("vars.less").is_some());
        assert!(library.css.get("deep.less").is_none());
        assert_eq!(library.js.include(), ["app.js"]);
        assert_eq!(library.script_types(), [ScriptType::Less, ScriptType::Js]);
    }

    #[tokio::test]
    async fn test_title_defaults_to_name() {
        let library = store().await.resolve("/libs/reset").await.unwrap();
        assert_eq!(library.title, "reset");
        assert!(library.js.is_empty());
        assert_eq!(library.classify(ScriptType::Less), ScriptType::Css);
    }

    #[tokio::test]
    async fn test_dependencies_drop_missing() {
        let store = store().await;
        let library = store.resolve("/libs/base").await.unwrap();
        let dependencies = store.dependencies(&library).await;
        let ids: Vec<_> = dependencies.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["/libs/reset"]);
    }

    #[tokio::test]
    async fn test_resolve_failures() {
        let store = store().await;
        let err = store.resolve("/libs/missing").await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound("/libs/missing".to_string()));
        let err = store.resolve("/libs/broken").await.unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidDefinition("/libs/broken".to_string()));
        let err = store.resolve("/libs/binary").await.unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidDefinition("/libs/binary".to_string()));
        let err = store.resolve("/..").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidId(_)));
    }

    #[tokio::test]
    async fn test_writes_are_ignored() {
        let store = store().await;
        store.backend().write(Path::new("libs/base/css/main.less"), b"overwritten").await.unwrap();
        let library = store.resolve("/libs/base").await.unwrap();
        let main = library.css.get("main.less").unwrap();
        assert_eq!(main.content().await.unwrap(), "@import \"vars\";");
    }
}
