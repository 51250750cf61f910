//! Retrieval source adapters.
//!
//! Each retrieval method implements [`RetrievalSource`]; the coordinator picks
//! adapters by [`SourceKind`] through a [`SourceRegistry`].

mod embeddings;
mod fts;
mod import_analysis;
mod lsp;
mod placeholder;
mod recently_edited;
mod repo_map;

pub use embeddings::EmbeddingsSource;
pub use fts::FullTextSource;
pub use import_analysis::ImportAnalysisSource;
pub use lsp::{extract_query_symbols, LspDefinitionsSource, LspRetrievalConfig};
pub use placeholder::PlaceholderSource;
pub use recently_edited::{RecentFilesTracker, RecentlyEditedSource};
pub use repo_map::RepoMapSource;

use crate::types::{RetrievalArguments, SourceKind};
use async_trait::async_trait;
use context_chunk::Chunk;
use std::collections::HashMap;
use std::sync::Arc;

/// One retrieval method: query in, candidate chunks out
#[async_trait]
pub trait RetrievalSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn retrieve(&self, args: &RetrievalArguments) -> anyhow::Result<Vec<Chunk>>;
}

/// Adapter lookup table keyed by source kind.
///
/// Starts with a [`PlaceholderSource`] for every kind, so lookups never miss.
#[derive(Clone)]
pub struct SourceRegistry {
    sources: HashMap<SourceKind, Arc<dyn RetrievalSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        let sources = SourceKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::new(PlaceholderSource::new(kind)) as Arc<dyn RetrievalSource>))
            .collect();
        Self { sources }
    }

    /// Register an adapter under its own kind, replacing the previous one
    pub fn register(&mut self, source: Arc<dyn RetrievalSource>) -> &mut Self {
        self.sources.insert(source.kind(), source);
        self
    }

    /// Builder form of [`Self::register`]
    #[must_use]
    pub fn with(mut self, source: impl RetrievalSource + 'static) -> Self {
        self.register(Arc::new(source));
        self
    }

    pub fn get(&self, kind: SourceKind) -> Arc<dyn RetrievalSource> {
        match self.sources.get(&kind) {
            Some(source) => Arc::clone(source),
            None => Arc::new(PlaceholderSource::new(kind)),
        }
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<SourceKind> = self.sources.keys().copied().collect();
        kinds.sort();
        f.debug_struct("SourceRegistry").field("kinds", &kinds).finish()
    }
}
