use serde::Deserialize;

/// File holding a library's metadata, relative to the library's path.
pub(crate) const DESCRIPTOR_FILE: &str = "library.toml";

/// On-disk library metadata (`library.toml`).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Descriptor {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Raw identifiers; invalid entries are dropped when the library resolves.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub css: FolderDescriptor,
    #[serde(default)]
    pub js: FolderDescriptor,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FolderDescriptor {
    #[serde(default)]
    pub include: Vec<String>,
}
