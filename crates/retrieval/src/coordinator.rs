use crate::collaborators::{NoopTelemetry, Telemetry};
use crate::observer::{unix_millis, NoopObserver, RetrievalObserver};
use crate::sources::SourceRegistry;
use crate::types::{
    RetrievalArguments, RetrievalResult, RetrievalSources, SourceConfig, SourceKind, SourceMetadata,
};
use context_chunk::Chunk;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Runs every enabled retrieval source concurrently and collects their
/// chunks with per-source timing and outcome.
///
/// A failing (or panicking) source contributes an empty list and a failed
/// metadata entry; it never affects the other sources or the overall result.
pub struct RetrievalCoordinator {
    registry: SourceRegistry,
    telemetry: Arc<dyn Telemetry>,
    observer: Arc<dyn RetrievalObserver>,
    default_sources: SourceConfig,
    sequence: AtomicU64,
}

impl RetrievalCoordinator {
    pub fn new(registry: SourceRegistry) -> Self {
        Self {
            registry,
            telemetry: Arc::new(NoopTelemetry),
            observer: Arc::new(NoopObserver),
            default_sources: SourceConfig::default(),
            sequence: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RetrievalObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Source selection used when the arguments carry none
    #[must_use]
    pub fn with_default_sources(mut self, sources: SourceConfig) -> Self {
        self.default_sources = sources;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn default_sources(&self) -> SourceConfig {
        self.default_sources
    }

    /// Query all enabled sources and wait for every one of them.
    ///
    /// `metadata` holds one entry per enabled source in completion order;
    /// `sources` holds a list for every kind (empty when disabled or failed).
    pub async fn retrieve_all(&self, args: &RetrievalArguments) -> RetrievalResult {
        let start = Instant::now();
        let enabled = args.source_config.unwrap_or(self.default_sources).enabled();
        let retrieval_id = self.next_retrieval_id();

        self.observer
            .retrieval_started(&retrieval_id, &args.query, args.n_retrieve, &enabled);

        let mut guard = CancelGuard {
            observer: &*self.observer,
            retrieval_id: &retrieval_id,
            finished: false,
        };

        let mut pending: FuturesUnordered<_> = enabled
            .iter()
            .map(|&kind| self.retrieve_from_source(&retrieval_id, kind, args))
            .collect();

        let mut sources = RetrievalSources::new();
        let mut metadata = Vec::with_capacity(enabled.len());
        while let Some((chunks, entry)) = pending.next().await {
            sources.insert(entry.source, chunks);
            metadata.push(entry);
        }
        drop(pending);

        let total_time_ms = elapsed_ms(start);
        let total_chunks = sources.total_chunks();
        guard.finished = true;
        self.observer.retrieval_completed(&retrieval_id, total_chunks);

        log::info!(
            "Retrieval {retrieval_id}: {total_chunks} chunks from {} sources in {total_time_ms}ms ({} failed)",
            metadata.len(),
            metadata.iter().filter(|entry| !entry.success).count()
        );

        RetrievalResult {
            sources,
            metadata,
            total_time_ms,
        }
    }

    async fn retrieve_from_source(
        &self,
        retrieval_id: &str,
        kind: SourceKind,
        args: &RetrievalArguments,
    ) -> (Vec<Chunk>, SourceMetadata) {
        let source = self.registry.get(kind);
        let start = Instant::now();
        self.observer.source_started(retrieval_id, kind);

        let outcome = AssertUnwindSafe(source.retrieve(args)).catch_unwind().await;
        let time_ms = elapsed_ms(start);

        let error = match outcome {
            Ok(Ok(chunks)) => {
                log::debug!("{kind} returned {} chunks in {time_ms}ms", chunks.len());
                self.observer
                    .source_completed(retrieval_id, kind, chunks.len(), time_ms);
                let entry = SourceMetadata {
                    source: kind,
                    count: chunks.len(),
                    time_ms,
                    success: true,
                    error: None,
                };
                return (chunks, entry);
            }
            Ok(Err(e)) => format!("{e:#}"),
            Err(panic) => format!("source panicked: {}", panic_message(panic.as_ref())),
        };

        log::warn!("{kind} retrieval failed after {time_ms}ms: {error}");
        self.observer.source_failed(retrieval_id, kind, &error, time_ms);
        self.telemetry.capture_error(&kind.telemetry_tag(), &error);

        let entry = SourceMetadata {
            source: kind,
            count: 0,
            time_ms,
            success: false,
            error: Some(error),
        };
        (Vec::new(), entry)
    }

    fn next_retrieval_id(&self) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("retrieval_{}_{sequence}", unix_millis())
    }
}

impl std::fmt::Debug for RetrievalCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalCoordinator")
            .field("registry", &self.registry)
            .field("default_sources", &self.default_sources)
            .finish_non_exhaustive()
    }
}

/// Reports a retrieval as cancelled when its future is dropped before completion
struct CancelGuard<'a> {
    observer: &'a dyn RetrievalObserver,
    retrieval_id: &'a str,
    finished: bool,
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            log::debug!("Retrieval {} dropped before completion", self.retrieval_id);
            self.observer.retrieval_cancelled(self.retrieval_id);
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
