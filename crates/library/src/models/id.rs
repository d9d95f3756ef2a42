use crate::error::{Error, ErrorKind, Result};
use derive_more::Display;
use exn::OptionExt;
use std::path::PathBuf;
use std::str::FromStr;

/// Normalised, path-like library identifier, e.g. `/libs/base`.
///
/// Always starts with a single `/`, never ends with one, and never escapes
/// the content root.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LibraryId(String);

impl LibraryId {
    pub fn new(id: impl AsRef<str>) -> Result<Self> {
        let raw = id.as_ref();
        stitch_storage::content_path(raw).map(Self).ok_or_raise(|| ErrorKind::InvalidId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier as a relative storage path (`libs/base`).
    pub fn storage_path(&self) -> PathBuf {
        PathBuf::from(self.0.trim_start_matches('/'))
    }

    /// The final path segment.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl FromStr for LibraryId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for LibraryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
