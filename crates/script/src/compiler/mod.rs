//! Compiler plugins and the registry that selects between them.

mod less;
mod passthrough;

pub use self::less::{LessCompiler, LessProcessor, Lessc};
pub use self::passthrough::PassThroughCompiler;

use crate::ScriptType;
use crate::error::{ErrorKind, Result};
use crate::util::describe;
use std::sync::Arc;

/// Turns assembled source text into final output text.
///
/// A compiler declares the set of script types it can jointly produce output
/// for. `compile` must be a pure function of its input.
pub trait Compiler: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Script types this compiler can jointly produce output for.
    fn supported_types(&self) -> &[ScriptType];

    fn compile(&self, input: &str) -> Result<String>;

    /// Returns `true` if the declared set is a superset of `requested`.
    fn covers(&self, requested: &[ScriptType]) -> bool {
        let supported = self.supported_types();
        supported.len() >= requested.len() && requested.iter().all(|t| supported.contains(t))
    }
}

/// Handle to a registered compiler; cheap to clone and send to blocking tasks.
pub type CompilerHandle = Arc<dyn Compiler>;

/// Ordered table of compiler plugins with first-match lookup.
#[derive(Clone, Default)]
pub struct CompilerRegistry {
    compilers: Vec<CompilerHandle>,
}

impl CompilerRegistry {
    /// An empty registry; every lookup fails until compilers are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in compilers in their default priority order: pass-through
    /// CSS, pass-through JavaScript, then LESS backed by `processor`.
    pub fn with_defaults(processor: impl LessProcessor + 'static) -> Self {
        Self::new()
            .with(PassThroughCompiler::new(ScriptType::Css))
            .with(PassThroughCompiler::new(ScriptType::Js))
            .with(LessCompiler::new(processor))
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, compiler: impl Compiler + 'static) -> Self {
        self.register(compiler);
        self
    }

    /// Append a compiler; it is consulted after every compiler registered
    /// before it.
    pub fn register(&mut self, compiler: impl Compiler + 'static) {
        tracing::debug!(compiler = compiler.name(), types = %describe(compiler.supported_types()), "Registered compiler");
        self.compilers.push(Arc::new(compiler));
    }

    pub fn len(&self) -> usize {
        self.compilers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compilers.is_empty()
    }

    /// The first registered compiler whose declared types cover `requested`.
    pub fn lookup(&self, requested: &[ScriptType]) -> Result<CompilerHandle> {
        match self.compilers.iter().find(|c| c.covers(requested)) {
            Some(compiler) => {
                tracing::trace!(compiler = compiler.name(), requested = %describe(requested), "Selected compiler");
                Ok(Arc::clone(compiler))
            },
            None => exn::bail!(ErrorKind::NoMatchingCompiler(describe(requested))),
        }
    }
}

impl std::fmt::Debug for CompilerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.compilers.iter().map(|c| c.name())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn registry() -> CompilerRegistry {
        CompilerRegistry::with_defaults(|source: &str| -> Result<String> { Ok(format!("/* less */{source}")) })
    }

    #[rstest]
    #[case(&[ScriptType::Css], "passthrough:css")]
    #[case(&[ScriptType::Js], "passthrough:js")]
    #[case(&[ScriptType::Css, ScriptType::Less], "less")]
    #[case(&[ScriptType::Less], "less")]
    #[case(&[], "passthrough:css")]
    fn test_lookup_first_match(#[case] requested: &[ScriptType], #[case] expected: &str) {
        assert_eq!(registry().lookup(requested).unwrap().name(), expected);
    }

    #[test]
    fn test_lookup_no_match() {
        let Err(err) = registry().lookup(&[ScriptType::Css, ScriptType::Js]) else {
            panic!("no compiler covers css and js together");
        };
        assert_eq!(*err, ErrorKind::NoMatchingCompiler("css, js".to_string()));

        let Err(err) = CompilerRegistry::new().lookup(&[ScriptType::Js]) else {
            panic!("an empty registry matches nothing");
        };
        assert_eq!(*err, ErrorKind::NoMatchingCompiler("js".to_string()));
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let registry = CompilerRegistry::new()
            .with(LessCompiler::new(|_: &str| -> Result<String> { Ok("less".to_string()) }))
            .with(PassThroughCompiler::new(ScriptType::Css));
        let compiler = registry.lookup(&[ScriptType::Css]).unwrap();
        assert_eq!(compiler.name(), "less");
        assert_eq!(compiler.compile("a{}").unwrap(), "less");
    }
}
