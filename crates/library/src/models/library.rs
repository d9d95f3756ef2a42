use crate::classify::classify_style;
use crate::models::{LibraryId, ScriptFolder};
use stitch_script::ScriptType;

/// A named bundle of style and script fragments plus the libraries it
/// depends on.
#[derive(Clone, Debug)]
pub struct Library {
    pub id: LibraryId,
    pub title: String,
    pub description: Option<String>,
    /// Declared dependencies, in order. Entries may not resolve.
    pub dependencies: Vec<LibraryId>,
    pub css: ScriptFolder,
    pub js: ScriptFolder,
}

impl Library {
    /// The folder holding fragments for `script_type`.
    pub fn folder(&self, script_type: ScriptType) -> &ScriptFolder {
        match script_type {
            ScriptType::Css | ScriptType::Less => &self.css,
            ScriptType::Js => &self.js,
        }
    }

    /// The authoritative variant for a requested script type: JavaScript is
    /// fixed, the stylesheet slot goes through the classifier.
    pub fn classify(&self, requested: ScriptType) -> ScriptType {
        if requested.is_css_family() { classify_style(&self.css) } else { requested }
    }

    /// The two artifact types this library produces: its stylesheet variant
    /// and JavaScript.
    pub fn script_types(&self) -> [ScriptType; 2] {
        [self.classify(ScriptType::Css), ScriptType::Js]
    }
}
