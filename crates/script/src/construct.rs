use crate::ScriptType;
use crate::error::{Error, ErrorKind};
use std::{path::Path, str::FromStr};

/// MIME type reported for fragments whose extension no script type claims.
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

impl FromStr for ScriptType {
    type Err = Error;

    /// Parses a canonical name, a file extension (with or without the dot) or
    /// a MIME type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().trim_start_matches('.').to_lowercase();
        ScriptType::ALL
            .into_iter()
            .find(|t| t.as_str() == needle || t.extensions().contains(&needle.as_str()) || t.mime_types().contains(&needle.as_str()))
            .ok_or_else(|| Error::from(ErrorKind::UnsupportedType(s.to_string())))
    }
}

impl ScriptType {
    /// Detect the script type of a fragment from its extension (without the
    /// dot, any case).
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        ScriptType::ALL.into_iter().find(|t| t.extensions().iter().any(|e| e.eq_ignore_ascii_case(extension)))
    }

    /// Detect the script type of a fragment from its file name.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref().extension().and_then(|ext| ext.to_str()).and_then(Self::from_extension)
    }

    /// The MIME type a content store should report for a fragment with the
    /// given extension: the first accepted MIME type of the matching script
    /// type, or [`UNKNOWN_MIME_TYPE`].
    #[must_use]
    pub fn mime_type_for_extension(extension: &str) -> &'static str {
        Self::from_extension(extension).and_then(|t| t.mime_types().first().copied()).unwrap_or(UNKNOWN_MIME_TYPE)
    }
}
