//! Script types and the plugins that turn source text into artifacts.
//!
//! [`ScriptType`] is the static registry of supported languages. Around it
//! sit two strategy tables, both with deterministic first-match semantics in
//! registration order:
//!
//! - [`CompilerRegistry`] picks a [`Compiler`] able to produce output for a
//!   requested set of types (pass-through for CSS and JavaScript, a LESS-like
//!   compiler delegating to an external [`LessProcessor`]).
//! - [`MinifierDispatch`] picks a [`Minifier`] for a type and falls back to
//!   the unminified text when none is registered or minification fails.

pub mod compiler;
mod construct;
pub mod error;
pub mod minify;
mod util;

pub use crate::compiler::{Compiler, CompilerHandle, CompilerRegistry, LessCompiler, LessProcessor, Lessc, PassThroughCompiler};
pub use crate::construct::UNKNOWN_MIME_TYPE;
pub use crate::minify::{CssMinifier, JsMinifier, Minifier, MinifierDispatch};
pub use crate::util::describe;

/// A supported source/output language.
///
/// Ordering follows declaration order and is only used to keep type sets
/// sorted; it carries no preference. See [`ScriptType::CSS_FAMILY`] for the
/// classification preference order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScriptType {
    /// Plain CSS (`.css`)
    Css,
    /// LESS-like stylesheet source (`.less`), compiled to CSS
    Less,
    /// JavaScript (`.js`)
    Js,
}
