use anyhow::Context;
use async_trait::async_trait;
use context_chunk::Chunk;
use context_retrieval::{
    FullTextSource, RetrievalArguments, RetrievalCoordinator, RetrievalLogger, RetrievalLoggerConfig,
    RetrievalSource, ScopeTag, SourceConfig, SourceKind, SourceRegistry, Telemetry, TextIndex,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Returns `count` chunks after an optional delay
struct Delayed {
    kind: SourceKind,
    count: usize,
    delay: Duration,
}

impl Delayed {
    fn new(kind: SourceKind, count: usize, delay_ms: u64) -> Self {
        Self {
            kind,
            count,
            delay: Duration::from_millis(delay_ms),
        }
    }
}

#[async_trait]
impl RetrievalSource for Delayed {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn retrieve(&self, args: &RetrievalArguments) -> anyhow::Result<Vec<Chunk>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok((0..self.count.min(args.n_retrieve))
            .map(|i| Chunk::new(format!("{}/{i}.rs", self.kind), i, i, format!("chunk {i}")))
            .collect())
    }
}

struct Failing(SourceKind);

#[async_trait]
impl RetrievalSource for Failing {
    fn kind(&self) -> SourceKind {
        self.0
    }

    async fn retrieve(&self, _args: &RetrievalArguments) -> anyhow::Result<Vec<Chunk>> {
        Err(anyhow::anyhow!("connection refused")).context("vector index unavailable")
    }
}

struct Panicking(SourceKind);

#[async_trait]
impl RetrievalSource for Panicking {
    fn kind(&self) -> SourceKind {
        self.0
    }

    async fn retrieve(&self, _args: &RetrievalArguments) -> anyhow::Result<Vec<Chunk>> {
        panic!("repo map provider exploded")
    }
}

/// Blocks until every participant has reached the barrier
struct Rendezvous(SourceKind, Arc<Barrier>);

#[async_trait]
impl RetrievalSource for Rendezvous {
    fn kind(&self) -> SourceKind {
        self.0
    }

    async fn retrieve(&self, _args: &RetrievalArguments) -> anyhow::Result<Vec<Chunk>> {
        self.1.wait().await;
        Ok(vec![Chunk::new(format!("{}.rs", self.0), 0, 0, "met")])
    }
}

#[derive(Default)]
struct RecordingTelemetry {
    errors: Mutex<Vec<(String, String)>>,
}

impl Telemetry for RecordingTelemetry {
    fn capture_error(&self, tag: &str, message: &str) {
        self.errors
            .lock()
            .unwrap()
            .push((tag.to_string(), message.to_string()));
    }
}

#[derive(Default)]
struct CountingIndex {
    calls: AtomicUsize,
}

#[async_trait]
impl TextIndex for CountingIndex {
    async fn retrieve(
        &self,
        _n: usize,
        _terms: &str,
        _tags: &[ScopeTag],
        _directory: Option<&str>,
    ) -> anyhow::Result<Vec<Chunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Chunk::new("hit.rs", 0, 0, "hit")])
    }
}

#[tokio::test]
async fn metadata_has_one_entry_per_enabled_source() {
    init_logging();
    let coordinator = RetrievalCoordinator::new(
        SourceRegistry::new()
            .with(Delayed::new(SourceKind::Fts, 4, 0))
            .with(Delayed::new(SourceKind::Embeddings, 2, 5))
            .with(Delayed::new(SourceKind::ImportAnalysis, 1, 0)),
    );

    for config in [
        SourceConfig::default(),
        SourceConfig::all(),
        SourceConfig::none(),
        SourceConfig::none().with(SourceKind::ImportAnalysis, true),
    ] {
        let result = coordinator
            .retrieve_all(&RetrievalArguments::new("auth").source_config(config))
            .await;

        assert_eq!(result.metadata.len(), config.enabled().len());
        for entry in &result.metadata {
            assert!(config.is_enabled(entry.source));
            assert_eq!(entry.count, result.sources[entry.source].len());
        }
        for kind in SourceKind::ALL {
            if !config.is_enabled(kind) {
                assert!(result.sources[kind].is_empty());
            }
        }
    }
}

#[tokio::test]
async fn total_time_covers_the_slowest_source() {
    let coordinator = RetrievalCoordinator::new(
        SourceRegistry::new()
            .with(Delayed::new(SourceKind::Fts, 1, 30))
            .with(Delayed::new(SourceKind::Embeddings, 1, 10)),
    );

    let result = coordinator.retrieve_all(&RetrievalArguments::new("auth")).await;

    let slowest = result.metadata.iter().map(|entry| entry.time_ms).max().unwrap();
    assert!(slowest >= 30);
    assert!(result.total_time_ms >= slowest);
}

#[tokio::test]
async fn sources_run_concurrently() {
    let barrier = Arc::new(Barrier::new(3));
    let coordinator = RetrievalCoordinator::new(
        SourceRegistry::new()
            .with(Rendezvous(SourceKind::Fts, Arc::clone(&barrier)))
            .with(Rendezvous(SourceKind::Embeddings, Arc::clone(&barrier)))
            .with(Rendezvous(SourceKind::RepoMap, Arc::clone(&barrier))),
    )
    .with_default_sources(
        SourceConfig::none()
            .with(SourceKind::Fts, true)
            .with(SourceKind::Embeddings, true)
            .with(SourceKind::RepoMap, true),
    );

    // Sequential execution would never get past the barrier
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        coordinator.retrieve_all(&RetrievalArguments::new("auth")),
    )
    .await
    .expect("sources were not run concurrently");

    assert_eq!(result.sources.total_chunks(), 3);
}

#[tokio::test]
async fn metadata_follows_completion_order() {
    let coordinator = RetrievalCoordinator::new(
        SourceRegistry::new()
            .with(Delayed::new(SourceKind::Fts, 1, 80))
            .with(Delayed::new(SourceKind::Embeddings, 1, 0)),
    )
    .with_default_sources(
        SourceConfig::none()
            .with(SourceKind::Fts, true)
            .with(SourceKind::Embeddings, true),
    );

    let result = coordinator.retrieve_all(&RetrievalArguments::new("auth")).await;

    let order: Vec<SourceKind> = result.metadata.iter().map(|entry| entry.source).collect();
    assert_eq!(order, vec![SourceKind::Embeddings, SourceKind::Fts]);
}

#[tokio::test]
async fn failing_source_is_isolated_and_reported() {
    init_logging();
    let telemetry = Arc::new(RecordingTelemetry::default());
    let coordinator = RetrievalCoordinator::new(
        SourceRegistry::new()
            .with(Delayed::new(SourceKind::Fts, 3, 0))
            .with(Failing(SourceKind::Embeddings)),
    )
    .with_telemetry(telemetry.clone());

    let result = coordinator.retrieve_all(&RetrievalArguments::new("auth")).await;

    assert_eq!(result.sources[SourceKind::Fts].len(), 3);
    assert!(result.sources[SourceKind::Embeddings].is_empty());
    assert_eq!(result.failed_sources(), vec![SourceKind::Embeddings]);

    let failed = result.metadata_for(SourceKind::Embeddings).unwrap();
    assert!(!failed.success);
    assert_eq!(failed.count, 0);
    assert_eq!(
        failed.error.as_deref(),
        Some("vector index unavailable: connection refused")
    );

    let errors = telemetry.errors.lock().unwrap();
    assert_eq!(
        *errors,
        vec![(
            "multi_source_embeddings_retrieval".to_string(),
            "vector index unavailable: connection refused".to_string()
        )]
    );
}

#[tokio::test]
async fn panicking_source_counts_as_failure() {
    init_logging();
    let telemetry = Arc::new(RecordingTelemetry::default());
    let coordinator = RetrievalCoordinator::new(
        SourceRegistry::new()
            .with(Delayed::new(SourceKind::Fts, 2, 0))
            .with(Panicking(SourceKind::RepoMap)),
    )
    .with_telemetry(telemetry.clone());

    let result = coordinator.retrieve_all(&RetrievalArguments::new("auth")).await;

    assert_eq!(result.sources[SourceKind::Fts].len(), 2);
    let failed = result.metadata_for(SourceKind::RepoMap).unwrap();
    assert!(!failed.success);
    assert!(failed
        .error
        .as_deref()
        .unwrap()
        .contains("repo map provider exploded"));
    assert_eq!(telemetry.errors.lock().unwrap()[0].0, "multi_source_repoMap_retrieval");
}

#[tokio::test]
async fn blank_query_succeeds_without_touching_the_index() {
    let index = Arc::new(CountingIndex::default());
    let coordinator = RetrievalCoordinator::new(SourceRegistry::new().with(FullTextSource::new(index.clone())))
        .with_default_sources(SourceConfig::none().with(SourceKind::Fts, true));

    let result = coordinator.retrieve_all(&RetrievalArguments::new("   ")).await;

    assert_eq!(index.calls.load(Ordering::SeqCst), 0);
    let entry = result.metadata_for(SourceKind::Fts).unwrap();
    assert!(entry.success);
    assert_eq!(entry.count, 0);
}

#[tokio::test]
async fn experimental_sources_succeed_empty_when_enabled() {
    let coordinator = RetrievalCoordinator::new(SourceRegistry::new()).with_default_sources(
        SourceConfig::none()
            .with(SourceKind::RecentlyVisitedRanges, true)
            .with(SourceKind::StaticContext, true)
            .with(SourceKind::ToolBasedSearch, true),
    );

    let result = coordinator.retrieve_all(&RetrievalArguments::new("auth")).await;

    assert_eq!(result.metadata.len(), 3);
    assert!(result.metadata.iter().all(|entry| entry.success && entry.count == 0));
    assert_eq!(result.sources.total_chunks(), 0);
}

#[tokio::test]
async fn retrieval_logger_records_performance_metrics() {
    init_logging();
    let logger = Arc::new(RetrievalLogger::new(RetrievalLoggerConfig::default()));
    let coordinator = RetrievalCoordinator::new(
        SourceRegistry::new()
            .with(Delayed::new(SourceKind::Fts, 2, 0))
            .with(Failing(SourceKind::Embeddings)),
    )
    .with_default_sources(
        SourceConfig::none()
            .with(SourceKind::Fts, true)
            .with(SourceKind::Embeddings, true),
    )
    .with_observer(logger.clone());

    coordinator.retrieve_all(&RetrievalArguments::new("token refresh")).await;

    let metrics = logger.recent_metrics();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].query, "token refresh");
    assert_eq!(metrics[0].total_chunks, 2);
    assert!(metrics[0].retrieval_id.starts_with("retrieval_"));

    let mut outcomes: Vec<(SourceKind, bool)> = metrics[0]
        .source_metrics
        .iter()
        .map(|metric| (metric.source, metric.success))
        .collect();
    outcomes.sort();
    assert_eq!(
        outcomes,
        vec![(SourceKind::Fts, true), (SourceKind::Embeddings, false)]
    );
    assert_eq!(logger.active_retrievals(), 0);
}

#[tokio::test]
async fn dropped_retrieval_is_reported_as_cancelled() {
    init_logging();
    let logger = Arc::new(RetrievalLogger::new(RetrievalLoggerConfig::default()));
    let coordinator = RetrievalCoordinator::new(
        SourceRegistry::new()
            .with(Delayed::new(SourceKind::Fts, 1, 5_000))
            .with(Delayed::new(SourceKind::RepoMap, 1, 0)),
    )
    .with_default_sources(
        SourceConfig::none()
            .with(SourceKind::Fts, true)
            .with(SourceKind::RepoMap, true),
    )
    .with_observer(logger.clone());

    let args = RetrievalArguments::new("slow query");
    for _ in 0..3 {
        let outcome = tokio::time::timeout(Duration::from_millis(10), coordinator.retrieve_all(&args)).await;
        assert!(outcome.is_err());
    }

    assert_eq!(logger.active_retrievals(), 0);
    assert!(logger.recent_metrics().is_empty());
}

#[tokio::test]
async fn result_serializes_with_camel_case_keys() {
    let coordinator = RetrievalCoordinator::new(SourceRegistry::new().with(Delayed::new(SourceKind::Fts, 1, 0)))
        .with_default_sources(SourceConfig::none().with(SourceKind::Fts, true));

    let result = coordinator.retrieve_all(&RetrievalArguments::new("auth")).await;
    let json = serde_json::to_value(&result).unwrap();

    assert!(json.get("totalTimeMs").is_some());
    assert_eq!(json["metadata"][0]["source"], "fts");
    assert!(json["metadata"][0]["timeMs"].is_u64());
    assert_eq!(json["sources"]["fts"].as_array().unwrap().len(), 1);
    assert_eq!(json["sources"]["toolBasedSearch"].as_array().unwrap().len(), 0);
}
