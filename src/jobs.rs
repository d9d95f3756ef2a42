//! Background cache population.
//!
//! Rebuild jobs travel through a typed channel to a single dispatcher task,
//! which runs a bounded number of them concurrently. Failures are logged and
//! reported to whoever still holds the [`JobHandle`]; nothing is retried.

use crate::error::{ErrorKind, Result};
use crate::service::CompilationService;
use exn::ResultExt;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use stitch_cache::{CacheKey, CacheStore};
use stitch_library::LibraryId;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::instrument;

/// Default number of rebuild jobs running at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Recompile a library and write its artifacts to the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RebuildJob {
    pub library: LibraryId,
    /// Also write minified artifacts.
    pub cache_minified: bool,
}

/// Cache entries written by a successful job.
pub type Written = Vec<CacheKey>;

struct Envelope {
    job: RebuildJob,
    reply: oneshot::Sender<Result<Written>>,
}

/// Awaitable outcome of an enqueued job. Dropping it does not cancel the job.
#[derive(Debug)]
pub struct JobHandle {
    receiver: oneshot::Receiver<Result<Written>>,
}

impl JobHandle {
    /// Wait for the job to finish.
    pub async fn wait(self) -> Result<Written> {
        self.receiver.await.or_raise(|| ErrorKind::Queue)?
    }
}

/// Sending side of the rebuild queue.
#[derive(Clone, Debug)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<Envelope>,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope").field("job", &self.job).finish_non_exhaustive()
    }
}

impl JobQueue {
    /// Start the dispatcher. It stops once every clone of the returned queue
    /// is dropped and the remaining jobs have finished.
    pub fn start(service: CompilationService, cache: CacheStore, concurrency: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(dispatch(receiver, service, cache, concurrency.max(1)));
        (Self { sender }, handle)
    }

    pub fn enqueue(&self, job: RebuildJob) -> Result<JobHandle> {
        let (reply, receiver) = oneshot::channel();
        tracing::debug!(library = %job.library, cache_minified = job.cache_minified, "Queueing cache rebuild");
        self.sender.send(Envelope { job, reply }).map_err(|_| ErrorKind::Queue)?;
        Ok(JobHandle { receiver })
    }
}

async fn dispatch(
    mut receiver: mpsc::UnboundedReceiver<Envelope>,
    service: CompilationService,
    cache: CacheStore,
    concurrency: usize,
) {
    let mut running = FuturesUnordered::new();
    loop {
        tokio::select! {
            envelope = receiver.recv(), if running.len() < concurrency => match envelope {
                Some(Envelope { job, reply }) => {
                    let (service, cache) = (&service, &cache);
                    running.push(async move {
                        let result = rebuild(service, cache, &job).await;
                        if let Err(err) = &result {
                            tracing::error!(library = %job.library, error = ?err, "Cache rebuild failed");
                        }
                        // Nobody waiting is fine.
                        let _ = reply.send(result);
                    });
                },
                None => break,
            },
            Some(()) = running.next(), if !running.is_empty() => {},
        }
    }
    while running.next().await.is_some() {}
    tracing::debug!("Rebuild queue drained");
}

/// Compile every artifact type of a library and write the results through to
/// the cache: unminified always, minified when requested.
#[instrument(skip(service, cache), fields(library = %job.library, cache_minified = job.cache_minified))]
pub async fn rebuild(service: &CompilationService, cache: &CacheStore, job: &RebuildJob) -> Result<Written> {
    let library = service.library(&job.library).await?;
    let mut written = Vec::new();
    for script_type in library.script_types() {
        let output = service.get_output(&library, script_type, false).await?;
        let key = CacheKey::new(library.id.clone(), script_type, false);
        cache.put(&key, &output).await.or_raise(|| ErrorKind::Cache)?;
        written.push(key);
        if job.cache_minified {
            let key = CacheKey::new(library.id.clone(), script_type, true);
            cache.put(&key, &service.minify(script_type, &output)).await.or_raise(|| ErrorKind::Cache)?;
            written.push(key);
        }
    }
    tracing::info!(entries = written.len(), "Cache rebuilt");
    Ok(written)
}
