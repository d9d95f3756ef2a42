use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use stitch_library::LibraryId;
use stitch_script::ScriptType;

const MINIFIED_MARKER: &str = ".min";

/// Identifies one cached artifact.
///
/// Keys are built from the *output* type, so a LESS library and a CSS request
/// share the same `.css` entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub library: LibraryId,
    pub script_type: ScriptType,
    pub minified: bool,
}

impl CacheKey {
    pub fn new(library: LibraryId, script_type: ScriptType, minified: bool) -> Self {
        Self { library, script_type: script_type.output_type(), minified }
    }

    /// Blob path under `root`: `<root>/<library><.min?><extension>`.
    pub fn path(&self, root: &Path) -> PathBuf {
        root.join(self.to_string().trim_start_matches('/'))
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let marker = if self.minified { MINIFIED_MARKER } else { "" };
        write!(f, "{}{marker}{}", self.library, self.script_type.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/libs/base", ScriptType::Css, false, "var/stitch/libs/base.css")]
    #[case("/libs/base", ScriptType::Css, true, "var/stitch/libs/base.min.css")]
    #[case("/libs/base", ScriptType::Less, true, "var/stitch/libs/base.min.css")]
    #[case("/libs/base", ScriptType::Js, false, "var/stitch/libs/base.js")]
    #[case("/apps/site/main", ScriptType::Js, true, "var/stitch/apps/site/main.min.js")]
    fn test_path(#[case] library: &str, #[case] script_type: ScriptType, #[case] minified: bool, #[case] expected: &str) {
        let key = CacheKey::new(library.parse().unwrap(), script_type, minified);
        assert_eq!(key.path(Path::new("var/stitch")), Path::new(expected));
    }

    #[test]
    fn test_less_shares_css_entry() {
        let id: LibraryId = "/lib".parse().unwrap();
        assert_eq!(CacheKey::new(id.clone(), ScriptType::Less, false), CacheKey::new(id, ScriptType::Css, false));
    }
}
