//! Path validation and content-store addressing.
//!
//! Content is addressed two ways: by *content path* (`/libs/base/css`, the
//! way libraries and watched subtrees are named) and by *storage path*
//! (`libs/base/css`, relative to a backend root). [`validate`] turns the
//! former into the latter and [`content_path`] goes back again.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path and normalizes it relative to the backend root.
///
/// A leading `/` is accepted and dropped, so content paths such as
/// `/libs/base` can be passed straight through. `..` is resolved, but may
/// never climb above the root.
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use stitch_storage::validate_path;
/// assert_eq!(validate_path("/libs/base/css").unwrap(), Path::new("libs/base/css"));
/// assert_eq!(validate_path("libs//base/./js/").unwrap(), Path::new("libs/base/js"));
/// assert!(validate_path("/libs/../../etc").is_err());
/// assert!(validate_path("/").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes survive Path::components() on Unix but truncate
                // paths in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(original.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
    }
    Ok(components.into_iter().collect())
}

/// Renders a storage path as an absolute content path (`libs/base` becomes
/// `/libs/base`).
///
/// Returns `None` for paths that are not valid UTF-8 or fail [`validate`].
pub fn content_path(path: impl AsRef<Path>) -> Option<String> {
    let validated = validate(path).ok()?;
    let segments = validated.components().map(|c| c.as_os_str().to_str()).collect::<Option<Vec<_>>>()?;
    Some(format!("/{}", segments.join("/")))
}
