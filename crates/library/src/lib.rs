//! Library definitions and raw output assembly.
//!
//! A [`Library`] is resolved from a [`ContentStore`] by identifier. Its style
//! folder is classified into a single stylesheet variant
//! ([`classify_style`]), and each folder's included fragments are
//! concatenated in order by [`assemble`], with LESS `@import` directives
//! inlined along the way ([`resolve_imports`]).

mod assemble;
mod classify;
pub mod error;
mod imports;
mod models;
mod store;

pub use crate::assemble::assemble;
pub use crate::classify::classify_style;
pub use crate::imports::{resolve_imports, resolve_text};
pub use crate::models::{Library, LibraryId, ScriptFolder, ScriptFragment};
pub use crate::store::ContentStore;
