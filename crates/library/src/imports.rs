//! Inline `@import "name";` directives in LESS fragments.
//!
//! Imports resolve against sibling fragments in the same folder, recursively.
//! An import that cannot be resolved stays in the output verbatim so the
//! result is still valid LESS for the external preprocessor to report on.

use crate::error::{ErrorKind, Result};
use crate::models::{ScriptFolder, ScriptFragment};
use exn::ResultExt;
use futures::future::BoxFuture;
use regex::Regex;
use std::sync::LazyLock;
use stitch_script::ScriptType;
use tracing::instrument;

static IMPORT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^@import\s*"([^"]+)"\s*;\s*$"#).unwrap());

const IMPORT_DIRECTIVE: &str = "@import";
const LINE_COMMENT: &str = "//";

/// Read `fragment` and inline its imports.
#[instrument(skip_all, fields(fragment = fragment.name()))]
pub async fn resolve_imports(folder: &ScriptFolder, fragment: &ScriptFragment) -> Result<String> {
    let text = fragment.content().await.or_raise(|| ErrorKind::Storage)?;
    let mut stack = vec![fragment.name().to_string()];
    resolve_text(folder, &text, &mut stack).await
}

/// Inline the imports in `text`, which belongs to the last fragment on
/// `stack`.
pub fn resolve_text<'a>(folder: &'a ScriptFolder, text: &'a str, stack: &'a mut Vec<String>) -> BoxFuture<'a, Result<String>> {
    Box::pin(async move {
        let mut output = String::with_capacity(text.len());
        for (index, line) in text.lines().enumerate() {
            if index > 0 {
                output.push('\n');
            }
            match import_target(line) {
                Some(name) => match import(folder, name, stack).await? {
                    Some(resolved) => output.push_str(&resolved),
                    None => output.push_str(line),
                },
                None => output.push_str(line),
            }
        }
        Ok(output)
    })
}

/// The file name of an import line, if `line` is one.
fn import_target(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.starts_with(LINE_COMMENT) || !trimmed.starts_with(IMPORT_DIRECTIVE) {
        return None;
    }
    match IMPORT_REGEX.captures(trimmed).and_then(|c| c.get(1)) {
        Some(name) => Some(name.as_str()),
        None => {
            tracing::trace!(line = trimmed, "Not a plain `@import \"name\";` line; leaving as-is");
            None
        },
    }
}

/// Resolve one import. `Ok(None)` means the import line should be kept.
async fn import(folder: &ScriptFolder, name: &str, stack: &mut Vec<String>) -> Result<Option<String>> {
    let Some(sibling) = sibling(folder, name) else {
        tracing::warn!(folder = %folder.path().display(), import = name, "Imported file not found; keeping import line");
        return Ok(None);
    };
    if stack.iter().any(|n| n == sibling.name()) {
        let chain = stack.iter().map(String::as_str).chain([sibling.name()]).collect::<Vec<_>>().join(" -> ");
        exn::bail!(ErrorKind::ImportCycle(chain));
    }
    let text = match sibling.content().await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(import = sibling.name(), error = ?err, "Imported file unreadable; keeping import line");
            return Ok(None);
        },
    };
    stack.push(sibling.name().to_string());
    // Pinned recursion; see `resolve_text`.
    let resolved = resolve_text(folder, &text, stack).await;
    stack.pop();
    resolved.map(Some)
}

/// Look up an import target by exact name, then with a `.less` suffix.
fn sibling<'a>(folder: &'a ScriptFolder, name: &str) -> Option<&'a ScriptFragment> {
    let with_extension = format!("{name}.less");
    [name, with_extension.as_str()]
        .into_iter()
        .filter_map(|candidate| folder.get(candidate))
        .find(|fragment| importable(fragment))
}

/// Stylesheets can be imported, and so can extensionless siblings, whose type
/// is never declared. Anything else is known not to be a stylesheet.
fn importable(fragment: &ScriptFragment) -> bool {
    fragment.extension().is_empty() || ScriptType::CSS_FAMILY.into_iter().any(|t| fragment.matches(t))
}
