use crate::ScriptType;
use crate::compiler::Compiler;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::instrument;

const LESSC: &str = "lessc";

/// The external LESS preprocessor, treated as a black box.
///
/// Import directives have already been inlined by the time source text
/// reaches the processor.
pub trait LessProcessor: Send + Sync {
    fn process(&self, source: &str) -> Result<String>;
}

impl<F> LessProcessor for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn process(&self, source: &str) -> Result<String> {
        self(source)
    }
}

/// Runs the `lessc` executable, piping source through stdin.
#[derive(Clone, Debug, Default)]
pub struct Lessc {
    path: Option<PathBuf>,
}

impl Lessc {
    /// Use the executable at `path` instead of searching `PATH`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: Some(path.into()) }
    }

    /// The configured executable, or the first `lessc` found on `PATH`.
    ///
    /// Discovery happens per call so a missing binary only fails LESS
    /// libraries, and installing it later needs no restart.
    pub fn executable(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        which::which(LESSC).or_raise(|| ErrorKind::ProcessorNotFound(LESSC.to_string()))
    }
}

impl LessProcessor for Lessc {
    #[instrument(skip(self, source), fields(input_size = source.len()))]
    fn process(&self, source: &str) -> Result<String> {
        let executable = self.executable()?;
        tracing::trace!(lessc = %executable.display(), "Spawning LESS preprocessor");
        let mut child = Command::new(&executable)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .or_raise(|| ErrorKind::ProcessorNotFound(executable.display().to_string()))?;
        let mut stdin = child.stdin.take().ok_or_raise(|| ErrorKind::Compile("stdin unavailable".to_string()))?;
        // Feed stdin from a separate thread; a large stylesheet would otherwise
        // deadlock against a full stdout pipe.
        let output = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(source.as_bytes()));
            let output = child.wait_with_output();
            let written = writer.join().unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            output.and_then(|output| written.map(|()| output))
        })
        .or_raise(|| ErrorKind::Compile("could not communicate with lessc".to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            exn::bail!(ErrorKind::Compile(stderr));
        }
        String::from_utf8(output.stdout).or_raise(|| ErrorKind::Compile("lessc produced invalid UTF-8".to_string()))
    }
}

/// Compiles LESS-like stylesheets to CSS.
pub struct LessCompiler {
    processor: Box<dyn LessProcessor>,
}

impl LessCompiler {
    const TYPES: [ScriptType; 2] = [ScriptType::Css, ScriptType::Less];

    pub fn new(processor: impl LessProcessor + 'static) -> Self {
        Self { processor: Box::new(processor) }
    }
}

impl Compiler for LessCompiler {
    fn name(&self) -> &str {
        "less"
    }

    fn supported_types(&self) -> &[ScriptType] {
        &Self::TYPES
    }

    fn compile(&self, input: &str) -> Result<String> {
        if input.trim().is_empty() {
            return Ok(String::new());
        }
        self.processor.process(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_empty_input_skips_processor() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let compiler = LessCompiler::new(|source: &str| -> Result<String> {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(source.to_uppercase())
        });
        assert_eq!(compiler.compile(" \n\t").unwrap(), "");
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
        assert_eq!(compiler.compile("a{}").unwrap(), "A{}");
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_processor_error_propagates() {
        let compiler = LessCompiler::new(|_: &str| -> Result<String> {
            exn::bail!(ErrorKind::Compile("unexpected token".to_string()))
        });
        let err = compiler.compile("a{").unwrap_err();
        assert_eq!(*err, ErrorKind::Compile("unexpected token".to_string()));
    }

    #[test]
    fn test_missing_executable() {
        let lessc = Lessc::with_path("/nonexistent/bin/lessc");
        let err = lessc.process("a{}").unwrap_err();
        assert!(matches!(&*err, ErrorKind::ProcessorNotFound(_)));
    }
}
