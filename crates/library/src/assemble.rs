//! Concatenate a folder's included fragments into one raw text blob.

use crate::error::{ErrorKind, Result};
use crate::imports::resolve_imports;
use crate::models::ScriptFolder;
use exn::ResultExt;
use stitch_script::{ScriptType, describe};
use tracing::instrument;

/// Assemble the raw (uncompiled) text of `folder` for the `requested` types.
///
/// Included fragments matching one of the requested types are appended in
/// include order, each followed by a newline. LESS fragments have their
/// imports inlined first. A fragment that cannot be read is logged and
/// skipped; only an import cycle aborts assembly.
#[instrument(skip_all, fields(folder = %folder.path().display(), types = %describe(requested)))]
pub async fn assemble(folder: &ScriptFolder, requested: &[ScriptType]) -> Result<String> {
    let mut output = String::new();
    for fragment in folder.fragments() {
        if !requested.iter().any(|t| fragment.matches(*t)) {
            tracing::debug!(fragment = fragment.name(), mime_type = fragment.mime_type(), "Fragment type not requested; skipping");
            continue;
        }
        let content = if fragment.matches(ScriptType::Less) {
            resolve_imports(folder, fragment).await
        } else {
            fragment.content().await.or_raise(|| ErrorKind::Storage)
        };
        match content {
            Ok(text) => {
                output.push_str(&text);
                output.push('\n');
            },
            Err(err) if matches!(&*err, ErrorKind::ImportCycle(_)) => return Err(err),
            Err(err) => {
                tracing::error!(fragment = fragment.name(), error = ?err, "Failed to read fragment; skipping");
            },
        }
    }
    Ok(output)
}
