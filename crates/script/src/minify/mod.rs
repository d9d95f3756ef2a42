//! Minifier plugins and best-effort dispatch.

mod css;
mod js;

pub use self::css::CssMinifier;
pub use self::js::JsMinifier;

use crate::ScriptType;
use crate::error::Result;
use std::sync::Arc;
use tracing::instrument;

/// Compresses compiled output for the script types it declares.
pub trait Minifier: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn supported_types(&self) -> &[ScriptType];

    /// Fails with [`Compression`](crate::error::ErrorKind::Compression) when
    /// the input cannot be minified safely.
    fn minify(&self, input: &str) -> Result<String>;
}

/// Ordered table of minifier plugins.
///
/// Minification is an optimisation, never a requirement: [`minify`](Self::minify)
/// always returns usable text.
#[derive(Clone, Default)]
pub struct MinifierDispatch {
    minifiers: Vec<Arc<dyn Minifier>>,
}

impl MinifierDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in CSS and JavaScript minifiers.
    pub fn with_defaults() -> Self {
        Self::new().with(CssMinifier).with(JsMinifier)
    }

    #[must_use]
    pub fn with(mut self, minifier: impl Minifier + 'static) -> Self {
        self.register(minifier);
        self
    }

    pub fn register(&mut self, minifier: impl Minifier + 'static) {
        self.minifiers.push(Arc::new(minifier));
    }

    /// The first registered minifier supporting the output type of
    /// `script_type`.
    pub fn lookup(&self, script_type: ScriptType) -> Option<&dyn Minifier> {
        let wanted = script_type.output_type();
        self.minifiers.iter().find(|m| m.supported_types().contains(&wanted)).map(|m| m.as_ref())
    }

    /// Minify `input`, falling back to the input unchanged when no minifier
    /// is registered for the type or the minifier fails.
    #[instrument(skip(self, input), fields(input_size = input.len()))]
    pub fn minify(&self, script_type: ScriptType, input: &str) -> String {
        let Some(minifier) = self.lookup(script_type) else {
            tracing::debug!("No minifier registered; serving unminified output");
            return input.to_string();
        };
        match minifier.minify(input) {
            Ok(output) => {
                tracing::trace!(minifier = minifier.name(), output_size = output.len(), "Minified output");
                output
            },
            Err(err) => {
                tracing::warn!(minifier = minifier.name(), error = ?err, "Minification failed; serving unminified output");
                input.to_string()
            },
        }
    }
}

impl std::fmt::Debug for MinifierDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.minifiers.iter().map(|m| m.name())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct Exploding;

    impl Minifier for Exploding {
        fn name(&self) -> &str {
            "exploding"
        }

        fn supported_types(&self) -> &[ScriptType] {
            &[ScriptType::Css]
        }

        fn minify(&self, input: &str) -> Result<String> {
            if input.is_empty() {
                exn::bail!(ErrorKind::Compression("empty input".to_string()));
            }
            Ok(String::from("minified"))
        }
    }

    #[test]
    fn test_failure_falls_back_to_input() {
        let dispatch = MinifierDispatch::new().with(Exploding);
        assert_eq!(dispatch.minify(ScriptType::Css, ""), "");
        assert_eq!(dispatch.minify(ScriptType::Css, "a { }"), "minified");
    }

    #[test]
    fn test_unregistered_type_passes_through() {
        let dispatch = MinifierDispatch::new().with(Exploding);
        assert!(dispatch.lookup(ScriptType::Js).is_none());
        assert_eq!(dispatch.minify(ScriptType::Js, "var a = 1;"), "var a = 1;");
    }

    #[test]
    fn test_less_uses_css_minifier() {
        let dispatch = MinifierDispatch::with_defaults();
        assert_eq!(dispatch.lookup(ScriptType::Less).map(|m| m.name()), Some("css"));
        assert_eq!(dispatch.minify(ScriptType::Less, "body{ color:red;}\n"), "body{color:red}");
    }

    #[test]
    fn test_first_registered_wins() {
        let dispatch = MinifierDispatch::new().with(Exploding).with(CssMinifier);
        assert_eq!(dispatch.lookup(ScriptType::Css).map(|m| m.name()), Some("exploding"));
    }
}
