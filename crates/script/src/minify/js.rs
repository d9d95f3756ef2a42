use crate::ScriptType;
use crate::error::{ErrorKind, Result};
use crate::minify::Minifier;
use minify_js::TopLevelMode;

/// JavaScript minifier backed by `minify-js`.
///
/// Library outputs are concatenated into one script, so top-level names are
/// shared between libraries and must never be renamed.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsMinifier;

impl Minifier for JsMinifier {
    fn name(&self) -> &str {
        "js"
    }

    fn supported_types(&self) -> &[ScriptType] {
        &[ScriptType::Js]
    }

    fn minify(&self, input: &str) -> Result<String> {
        let mut out = Vec::with_capacity(input.len());
        minify_js::minify(TopLevelMode::Global, input.as_bytes().to_vec(), &mut out)
            .map_err(|err| ErrorKind::Compression(format!("{err:?}")))?;
        let text = String::from_utf8(out).map_err(|_| ErrorKind::Compression("minified output is not UTF-8".to_string()))?;
        Ok(text)
    }
}
