use crate::ScriptType;
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for ScriptType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for ScriptType {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl ScriptType {
    /// Every supported script type.
    pub const ALL: [ScriptType; 3] = [ScriptType::Css, ScriptType::Less, ScriptType::Js];

    /// The stylesheet variants, in classification preference order.
    pub const CSS_FAMILY: [ScriptType; 2] = [ScriptType::Less, ScriptType::Css];

    /// Canonical short name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptType::Css => "css",
            ScriptType::Less => "less",
            ScriptType::Js => "js",
        }
    }

    /// MIME type of the compiled artifact.
    #[inline]
    #[must_use]
    pub fn output_mime_type(&self) -> &'static str {
        match self {
            ScriptType::Css | ScriptType::Less => "text/css",
            ScriptType::Js => "application/javascript",
        }
    }

    /// Fragment file extensions (without the dot) accepted for this type.
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ScriptType::Css => &["css"],
            ScriptType::Less => &["less"],
            ScriptType::Js => &["js"],
        }
    }

    /// Fragment MIME types accepted for this type.
    #[must_use]
    pub fn mime_types(&self) -> &'static [&'static str] {
        match self {
            ScriptType::Css => &["text/css"],
            ScriptType::Less => &["text/less", "text/x-less"],
            ScriptType::Js => &["application/javascript", "text/javascript", "application/x-javascript"],
        }
    }

    /// Name of the library folder holding this type's fragments. Both
    /// stylesheet variants share the `css` folder.
    #[inline]
    #[must_use]
    pub fn folder(&self) -> &'static str {
        match self {
            ScriptType::Css | ScriptType::Less => "css",
            ScriptType::Js => "js",
        }
    }

    /// File extension of the compiled artifact, including the leading dot.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            ScriptType::Css | ScriptType::Less => ".css",
            ScriptType::Js => ".js",
        }
    }

    /// The type of the compiled artifact: LESS compiles to CSS.
    #[inline]
    #[must_use]
    pub fn output_type(&self) -> ScriptType {
        match self {
            ScriptType::Less => ScriptType::Css,
            other => *other,
        }
    }

    /// The script types a compiler must jointly cover to build a folder
    /// classified as this type. LESS folders may also hold plain CSS.
    #[must_use]
    pub fn compile_types(&self) -> &'static [ScriptType] {
        match self {
            ScriptType::Css => &[ScriptType::Css],
            ScriptType::Less => &[ScriptType::Css, ScriptType::Less],
            ScriptType::Js => &[ScriptType::Js],
        }
    }

    /// Returns `true` for the stylesheet variants.
    #[inline]
    #[must_use]
    pub fn is_css_family(&self) -> bool {
        Self::CSS_FAMILY.contains(self)
    }

    /// Returns `true` if a fragment with this extension *and* MIME type
    /// belongs to this script type. Both comparisons ignore ASCII case.
    #[must_use]
    pub fn accepts(&self, extension: &str, mime_type: &str) -> bool {
        self.extensions().iter().any(|e| e.eq_ignore_ascii_case(extension))
            && self.mime_types().iter().any(|m| m.eq_ignore_ascii_case(mime_type))
    }
}

/// Comma-separated names, for log fields and error messages.
pub fn describe(types: &[ScriptType]) -> String {
    types.iter().map(ScriptType::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ScriptType::Css, ".css", "css", ScriptType::Css)]
    #[case(ScriptType::Less, ".css", "css", ScriptType::Css)]
    #[case(ScriptType::Js, ".js", "js", ScriptType::Js)]
    fn test_output_layout(
        #[case] script_type: ScriptType,
        #[case] extension: &str,
        #[case] folder: &str,
        #[case] output: ScriptType,
    ) {
        assert_eq!(script_type.extension(), extension);
        assert_eq!(script_type.folder(), folder);
        assert_eq!(script_type.output_type(), output);
    }

    #[test]
    fn test_compile_types() {
        assert_eq!(ScriptType::Less.compile_types(), &[ScriptType::Css, ScriptType::Less]);
        assert_eq!(ScriptType::Css.compile_types(), &[ScriptType::Css]);
        assert_eq!(ScriptType::Js.compile_types(), &[ScriptType::Js]);
    }

    #[rstest]
    #[case(ScriptType::Less, "less", "text/less", true)]
    #[case(ScriptType::Less, "LESS", "text/x-less", true)]
    #[case(ScriptType::Less, "css", "text/css", false)]
    #[case(ScriptType::Less, "less", "text/css", false)]
    #[case(ScriptType::Css, "css", "text/css", true)]
    #[case(ScriptType::Css, "css", "application/octet-stream", false)]
    #[case(ScriptType::Js, "js", "text/javascript", true)]
    fn test_accepts(#[case] script_type: ScriptType, #[case] ext: &str, #[case] mime: &str, #[case] expected: bool) {
        assert_eq!(script_type.accepts(ext, mime), expected);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&[ScriptType::Css, ScriptType::Less]), "css, less");
        assert_eq!(describe(&[]), "");
    }
}
