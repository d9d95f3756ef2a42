use crate::ScriptType;
use crate::error::{ErrorKind, Result};
use crate::minify::Minifier;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

/// CSS minifier backed by `lightningcss`.
///
/// Parsing is strict: a stylesheet with an invalid rule is rejected rather
/// than silently losing the rule.
#[derive(Clone, Copy, Debug, Default)]
pub struct CssMinifier;

impl Minifier for CssMinifier {
    fn name(&self) -> &str {
        "css"
    }

    fn supported_types(&self) -> &[ScriptType] {
        &[ScriptType::Css]
    }

    fn minify(&self, input: &str) -> Result<String> {
        // lightningcss errors borrow the input, so they are flattened to text.
        let mut sheet = StyleSheet::parse(input, ParserOptions::default())
            .map_err(|err| ErrorKind::Compression(err.to_string()))?;
        sheet.minify(MinifyOptions::default()).map_err(|err| ErrorKind::Compression(err.to_string()))?;
        let printed = sheet
            .to_css(PrinterOptions { minify: true, ..PrinterOptions::default() })
            .map_err(|err| ErrorKind::Compression(err.to_string()))?;
        Ok(printed.code)
    }
}
