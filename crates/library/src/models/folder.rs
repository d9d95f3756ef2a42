use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use stitch_script::ScriptType;
use stitch_storage::{BackendHandle, StorageBackend};
use stitch_storage::error::Result as StorageResult;

/// One source file contributing to a library's output.
///
/// Holds a handle to the content store; text is read on demand.
#[derive(Clone)]
pub struct ScriptFragment {
    name: String,
    extension: String,
    mime_type: String,
    path: PathBuf,
    backend: BackendHandle,
}

impl ScriptFragment {
    /// Describe the file at `path`, deriving the MIME type from its
    /// extension. Returns `None` for paths without a file name.
    pub fn new(path: impl Into<PathBuf>, backend: BackendHandle) -> Option<Self> {
        let path = path.into();
        let name = path.file_name()?.to_str()?.to_string();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_string();
        let mime_type = ScriptType::mime_type_for_extension(&extension).to_string();
        Some(Self { name, extension, mime_type, path, backend })
    }

    /// Override the declared MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if both the extension and the MIME type are accepted by
    /// `script_type`.
    pub fn matches(&self, script_type: ScriptType) -> bool {
        script_type.accepts(&self.extension, &self.mime_type)
    }

    /// The first script type this fragment matches.
    pub fn script_type(&self) -> Option<ScriptType> {
        ScriptType::ALL.into_iter().find(|t| self.matches(*t))
    }

    /// Read the fragment's text from the content store.
    pub async fn content(&self) -> StorageResult<String> {
        self.backend.read_to_string(&self.path).await
    }
}

impl Debug for ScriptFragment {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ScriptFragment")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("path", &self.path)
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// A library's style or script folder.
///
/// The include list is an explicit allow-list: only included fragments
/// contribute to output, in include order. Every file directly inside the
/// folder is available for lookup (LESS imports resolve against it).
#[derive(Clone, Debug, Default)]
pub struct ScriptFolder {
    path: PathBuf,
    include: Vec<String>,
    fragments: BTreeMap<String, ScriptFragment>,
}

impl ScriptFolder {
    /// Includes naming a file that is not in `fragments` are logged and
    /// dropped.
    pub fn new(
        path: impl Into<PathBuf>,
        include: impl IntoIterator<Item = impl Into<String>>,
        fragments: impl IntoIterator<Item = ScriptFragment>,
    ) -> Self {
        let path = path.into();
        let fragments: BTreeMap<String, ScriptFragment> =
            fragments.into_iter().map(|fragment| (fragment.name.clone(), fragment)).collect();
        let include = include
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| {
                let found = fragments.contains_key(name);
                if !found {
                    tracing::warn!(folder = %path.display(), fragment = %name, "Included fragment does not exist; skipping");
                }
                found
            })
            .collect();
        Self { path, include, fragments }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Included fragment names, in declared order.
    pub fn include(&self) -> &[String] {
        &self.include
    }

    /// Look up any fragment in the folder, included or not.
    pub fn get(&self, name: &str) -> Option<&ScriptFragment> {
        self.fragments.get(name)
    }

    /// Included fragments, in declared order.
    pub fn fragments(&self) -> impl Iterator<Item = &ScriptFragment> {
        self.include.iter().filter_map(|name| self.fragments.get(name))
    }

    /// Returns `true` if nothing is included.
    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stitch_storage::backend::MockBackend;

    fn fragment(backend: &BackendHandle, path: &str) -> ScriptFragment {
        ScriptFragment::new(path, Arc::clone(backend)).unwrap()
    }

    #[test]
    fn test_fragment_metadata() {
        let backend: BackendHandle = Arc::new(MockBackend::default());
        let less = fragment(&backend, "libs/base/css/main.less");
        assert_eq!(less.name(), "main.less");
        assert_eq!(less.extension(), "less");
        assert_eq!(less.mime_type(), "text/less");
        assert_eq!(less.script_type(), Some(ScriptType::Less));
        assert!(!less.matches(ScriptType::Css));

        let odd = fragment(&backend, "libs/base/css/notes.txt");
        assert_eq!(odd.mime_type(), stitch_script::UNKNOWN_MIME_TYPE);
        assert_eq!(odd.script_type(), None);

        let mislabelled = fragment(&backend, "libs/base/css/main.css").with_mime_type("text/plain");
        assert_eq!(mislabelled.script_type(), None);
    }

    #[test]
    fn test_folder_include_order() {
        let backend: BackendHandle = Arc::new(MockBackend::default());
        let folder = ScriptFolder::new(
            "libs/base/css",
            ["b.css", "missing.css", "a.css"],
            [fragment(&backend, "libs/base/css/a.css"), fragment(&backend, "libs/base/css/b.css")],
        );
        assert_eq!(folder.include(), ["b.css", "a.css"]);
        let names: Vec<_> = folder.fragments().map(ScriptFragment::name).collect();
        assert_eq!(names, ["b.css", "a.css"]);
        assert!(folder.get("a.css").is_some());
        assert!(!folder.is_empty());
        assert!(ScriptFolder::default().is_empty());
    }

    #[tokio::test]
    async fn test_fragment_content() {
        let backend: BackendHandle = Arc::new(MockBackend::with_files([("libs/base/js/app.js", "run();")]));
        let app = fragment(&backend, "libs/base/js/app.js");
        assert_eq!(app.content().await.unwrap(), "run();");
        let missing = fragment(&backend, "libs/base/js/gone.js");
        assert!(missing.content().await.is_err());
    }
}
