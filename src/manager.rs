use crate::error::{ErrorKind, Result};
use crate::jobs::{JobHandle, JobQueue, RebuildJob};
use crate::service::CompilationService;
use exn::ResultExt;
use std::sync::Arc;
use stitch_cache::{CacheKey, CacheStore};
use stitch_config::Config;
use stitch_library::{ContentStore, LibraryId};
use stitch_script::{CompilerRegistry, Lessc, MinifierDispatch, ScriptType};
use stitch_storage::backend::LocalBackend;
use tokio::task::JoinHandle;
use tracing::instrument;

/// Request-facing entry point: compilation, cache lookups and rebuild
/// scheduling.
#[derive(Clone)]
pub struct ScriptManager {
    service: CompilationService,
    cache: CacheStore,
    queue: JobQueue,
}

/// A served artifact and, on a cache miss, the rebuild it triggered.
#[derive(Debug)]
pub struct Served {
    pub text: String,
    pub rebuild: Option<JobHandle>,
}

impl ScriptManager {
    /// Start the rebuild queue and return the manager along with the
    /// dispatcher task.
    pub fn start(service: CompilationService, cache: CacheStore, concurrency: usize) -> (Self, JoinHandle<()>) {
        let (queue, dispatcher) = JobQueue::start(service.clone(), cache.clone(), concurrency);
        (Self { service, cache, queue }, dispatcher)
    }

    /// Wire up local content and cache directories from configuration.
    pub fn from_config(config: &Config) -> Result<(Self, JoinHandle<()>)> {
        let content_root = std::path::absolute(&config.content).or_raise(|| ErrorKind::Config)?;
        let cache_dir = std::path::absolute(&config.cache.dir).or_raise(|| ErrorKind::Config)?;
        let content = LocalBackend::new("content", &content_root).or_raise(|| ErrorKind::Storage)?;
        let cache = LocalBackend::new("cache", &cache_dir).or_raise(|| ErrorKind::Storage)?;
        let cache = CacheStore::new(Arc::new(cache), &config.cache.root).or_raise(|| ErrorKind::Config)?;
        let lessc = match &config.less.lessc {
            Some(path) => Lessc::with_path(path),
            None => Lessc::default(),
        };
        let service = CompilationService::new(
            ContentStore::new(Arc::new(content)),
            CompilerRegistry::with_defaults(lessc),
            MinifierDispatch::with_defaults(),
        );
        Ok(Self::start(service, cache, config.jobs.concurrency))
    }

    pub fn service(&self) -> &CompilationService {
        &self.service
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Compile a library from source, bypassing the cache.
    pub async fn get_output(&self, id: &LibraryId, script_type: ScriptType, minify: bool) -> Result<String> {
        let library = self.service.library(id).await?;
        self.service.get_output(&library, script_type, minify).await
    }

    /// The cached artifact, or `None` on a miss. Cache read failures are
    /// logged and count as a miss.
    pub async fn get_cached_output(&self, id: &LibraryId, script_type: ScriptType, minified: bool) -> Option<String> {
        let key = CacheKey::new(id.clone(), script_type, minified);
        match self.cache.get(&key).await {
            Ok(cached) => cached,
            Err(err) => {
                tracing::warn!(%key, error = ?err, "Cache lookup failed; treating as miss");
                None
            },
        }
    }

    /// Queue a rebuild of every artifact of the library.
    pub fn cache_library_scripts(&self, id: &LibraryId, cache_minified: bool) -> Result<JobHandle> {
        self.queue.enqueue(RebuildJob { library: id.clone(), cache_minified })
    }

    /// Serve from cache, or compile synchronously and queue a rebuild so the
    /// next request hits.
    #[instrument(skip(self), fields(library = %id))]
    pub async fn serve(&self, id: &LibraryId, script_type: ScriptType, minified: bool) -> Result<Served> {
        if let Some(text) = self.get_cached_output(id, script_type, minified).await {
            tracing::debug!("Cache hit");
            return Ok(Served { text, rebuild: None });
        }
        tracing::debug!("Cache miss");
        let text = self.get_output(id, script_type, minified).await?;
        let rebuild = match self.cache_library_scripts(id, minified) {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::error!(error = ?err, "Could not queue cache rebuild");
                None
            },
        };
        Ok(Served { text, rebuild })
    }

    /// Drop every cached artifact.
    pub async fn purge(&self) -> Result<usize> {
        self.cache.purge().await.or_raise(|| ErrorKind::Cache)
    }
}
