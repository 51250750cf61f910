//! # Context Retrieval
//!
//! Concurrent multi-source context retrieval for code assistants.
//!
//! ## Features
//!
//! - **Fan-out** - every enabled source runs concurrently; failures are contained
//! - **Per-source metadata** - count, latency and error for each source
//! - **Fusion** - declared-order concatenation with digest de-duplication,
//!   or opt-in weighted reciprocal rank fusion
//! - **Observability** - pluggable observer, `log`-backed retrieval logger and telemetry
//!
//! ## Architecture
//!
//! ```text
//! RetrievalArguments
//!     │
//!     └──> RetrievalCoordinator (SourceRegistry + SourceConfig)
//!            ├─ fts             -> FullTextSource (TextIndex)
//!            ├─ embeddings      -> EmbeddingsSource (VectorIndex)
//!            ├─ recentlyEdited  -> RecentlyEditedSource (RecentFilesTracker)
//!            ├─ repoMap         -> RepoMapSource (RepoMapProvider)
//!            ├─ lspDefinitions  -> LspDefinitionsSource (IdeNavigation)
//!            ├─ importAnalysis  -> ImportAnalysisSource (DependencyGraph)
//!            └─ others          -> PlaceholderSource
//!                  │
//!                  v
//!            RetrievalResult {sources, metadata, total_time_ms}
//!                  │
//!                  v
//!            FusionStrategy (DeclaredOrderFusion | WeightedRrfFusion)
//!                  │
//!                  v
//!            Vec<Chunk> (<= n_final)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use context_retrieval::{
//!     fuse, RetrievalArguments, RetrievalCoordinator, SourceConfig, SourceKind, SourceRegistry,
//! };
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let coordinator = RetrievalCoordinator::new(SourceRegistry::new())
//!     .with_default_sources(SourceConfig::none().with(SourceKind::StaticContext, true));
//!
//! let result = coordinator.retrieve_all(&RetrievalArguments::new("where is auth handled")).await;
//! assert_eq!(result.metadata.len(), 1);
//! assert!(result.metadata[0].success);
//!
//! let fused = fuse(&result.sources, 10);
//! assert!(fused.is_empty());
//! # });
//! ```

mod collaborators;
mod config;
mod coordinator;
mod error;
mod fusion;
mod ide;
mod observer;
mod pipeline;
mod sources;
mod terms;
mod types;

pub use collaborators::{
    FileReader, FsFileReader, LogTelemetry, NoopTelemetry, OpenFiles, RepoMapProvider, Telemetry,
    TextIndex, VectorIndex,
};
pub use config::{RetrievalConfig, CONFIG_ENV_VAR};
pub use coordinator::RetrievalCoordinator;
pub use error::{Result, RetrievalError};
pub use fusion::{
    fuse, DeclaredOrderFusion, FusionOptions, FusionStrategy, WeightedRrfFusion, DEFAULT_MAX_CHUNKS,
};
pub use ide::{DocumentSymbol, IdeNavigation, Location, Position, Range, RangeInFile};
pub use observer::{
    NoopObserver, RetrievalLogLevel, RetrievalLogger, RetrievalLoggerConfig, RetrievalObserver,
    RetrievalPerformanceMetrics, SourceLogEntry, SourceMetric, SourceStatus,
};
pub use pipeline::{RetrievalPipeline, DEFAULT_N_FINAL};
pub use sources::{
    extract_query_symbols, EmbeddingsSource, FullTextSource, ImportAnalysisSource,
    LspDefinitionsSource, LspRetrievalConfig, PlaceholderSource, RecentFilesTracker,
    RecentlyEditedSource, RepoMapSource, RetrievalSource, SourceRegistry,
};
pub use terms::{build_fts_query, clean_search_terms};
pub use types::{
    RetrievalArguments, RetrievalResult, RetrievalSources, ScopeTag, SourceConfig, SourceKind,
    SourceMetadata, DEFAULT_N_RETRIEVE,
};
