//! Script type classification for a library's style folder.

use crate::models::ScriptFolder;
use stitch_script::ScriptType;

/// Pick the stylesheet variant that every included fragment agrees on.
///
/// Candidates are tried in [`ScriptType::CSS_FAMILY`] order. Exactly one
/// candidate accepting *all* fragments wins; no candidate (a mixed folder) or
/// several (an empty folder, where every candidate passes vacuously) falls
/// back to plain CSS.
pub fn classify_style(folder: &ScriptFolder) -> ScriptType {
    let passing: Vec<ScriptType> = ScriptType::CSS_FAMILY
        .into_iter()
        .filter(|candidate| folder.fragments().all(|fragment| fragment.matches(*candidate)))
        .collect();
    match passing.as_slice() {
        [only] => *only,
        _ => {
            if passing.is_empty() {
                tracing::debug!(folder = %folder.path().display(), "Mixed stylesheet folder; defaulting to CSS");
            }
            ScriptType::Css
        },
    }
}
