//! Dependency-aware compilation.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use stitch_library::error::ErrorKind as LibraryErrorKind;
use stitch_library::{ContentStore, Library, LibraryId, assemble};
use stitch_script::{CompilerRegistry, MinifierDispatch, ScriptType, describe};
use tracing::instrument;

/// Turns libraries into compiled artifacts.
///
/// Output for a library is the non-minified output of each resolvable
/// dependency, in declared order, followed by the library's own compiled
/// content. Minification applies once, to the whole concatenation.
#[derive(Clone)]
pub struct CompilationService {
    content: ContentStore,
    compilers: Arc<CompilerRegistry>,
    minifiers: Arc<MinifierDispatch>,
}

impl CompilationService {
    pub fn new(content: ContentStore, compilers: CompilerRegistry, minifiers: MinifierDispatch) -> Self {
        Self { content, compilers: Arc::new(compilers), minifiers: Arc::new(minifiers) }
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Resolve a library, mapping resolution failures to [`ErrorKind::Library`].
    pub async fn library(&self, id: &LibraryId) -> Result<Library> {
        self.content.library(id).await.or_raise(|| ErrorKind::Library(id.to_string()))
    }

    /// Compiled output for `library`, including its dependencies.
    ///
    /// A dependency cycle is fatal; dependencies that do not resolve are
    /// skipped.
    #[instrument(skip(self, library), fields(library = %library.id, %script_type))]
    pub async fn get_output(&self, library: &Library, script_type: ScriptType, minify: bool) -> Result<String> {
        let mut stack = Vec::new();
        let output = self.output(library, script_type, &mut stack).await?;
        Ok(if minify { self.minify(script_type, &output) } else { output })
    }

    /// Minify with the first registered minifier for the output type of
    /// `script_type`; never fails.
    pub fn minify(&self, script_type: ScriptType, text: &str) -> String {
        self.minifiers.minify(script_type, text)
    }

    fn output<'a>(
        &'a self,
        library: &'a Library,
        script_type: ScriptType,
        stack: &'a mut Vec<LibraryId>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            if stack.contains(&library.id) {
                let chain = stack.iter().chain([&library.id]).map(LibraryId::as_str).collect::<Vec<_>>().join(" -> ");
                exn::bail!(ErrorKind::DependencyCycle(chain));
            }
            stack.push(library.id.clone());
            let mut output = String::new();
            for dependency in self.content.dependencies(library).await {
                output.push_str(&self.output(&dependency, script_type, stack).await?);
            }
            output.push_str(&self.compile(library, script_type).await?);
            stack.pop();
            Ok(output)
        })
    }

    /// Classify, assemble and compile the library's own content, without
    /// dependencies.
    #[instrument(skip(self, library), fields(library = %library.id, %script_type))]
    pub async fn compile(&self, library: &Library, script_type: ScriptType) -> Result<String> {
        let variant = library.classify(script_type);
        let types = variant.compile_types();
        let compiler = self.compilers.lookup(types).or_raise(|| ErrorKind::NoMatchingCompiler(describe(types)))?;
        let raw = match assemble(library.folder(variant), types).await {
            Ok(raw) => raw,
            Err(err) => {
                let reason = match &*err {
                    LibraryErrorKind::ImportCycle(chain) => format!("import cycle in {}: {chain}", library.id),
                    _ => format!("could not assemble {}", library.id),
                };
                return Err(err.raise(ErrorKind::Compile(reason)));
            },
        };
        tracing::trace!(compiler = compiler.name(), raw_size = raw.len(), "Compiling");
        let name = compiler.name().to_string();
        tokio::task::spawn_blocking(move || compiler.compile(&raw))
            .await
            .or_raise(|| ErrorKind::Compile(format!("{name} compiler panicked")))?
            .or_raise(|| ErrorKind::Compile(format!("{name} compiler rejected {}", library.id)))
    }
}
