use crate::coordinator::RetrievalCoordinator;
use crate::fusion::{DeclaredOrderFusion, FusionStrategy};
use crate::types::{RetrievalArguments, RetrievalResult, RetrievalSources, ScopeTag, DEFAULT_N_RETRIEVE};
use context_chunk::Chunk;
use std::sync::Arc;

/// Final chunk count handed to the model when not configured
pub const DEFAULT_N_FINAL: usize = 10;

/// Retrieve from every enabled source, then fuse into one ranked list
pub struct RetrievalPipeline {
    coordinator: RetrievalCoordinator,
    fusion: Arc<dyn FusionStrategy>,
    n_retrieve: usize,
    n_final: usize,
}

impl RetrievalPipeline {
    pub fn new(coordinator: RetrievalCoordinator) -> Self {
        Self {
            coordinator,
            fusion: Arc::new(DeclaredOrderFusion),
            n_retrieve: DEFAULT_N_RETRIEVE,
            n_final: DEFAULT_N_FINAL,
        }
    }

    #[must_use]
    pub fn with_fusion(mut self, fusion: Arc<dyn FusionStrategy>) -> Self {
        self.fusion = fusion;
        self
    }

    #[must_use]
    pub fn with_limits(mut self, n_retrieve: usize, n_final: usize) -> Self {
        self.n_retrieve = n_retrieve;
        self.n_final = n_final;
        self
    }

    pub fn coordinator(&self) -> &RetrievalCoordinator {
        &self.coordinator
    }

    pub fn n_retrieve(&self) -> usize {
        self.n_retrieve
    }

    pub fn n_final(&self) -> usize {
        self.n_final
    }

    pub async fn retrieve_from_multiple_sources(
        &self,
        query: &str,
        tags: &[ScopeTag],
        filter_directory: Option<&str>,
        current_file: Option<&str>,
    ) -> RetrievalResult {
        let mut args = RetrievalArguments::new(query)
            .n_retrieve(self.n_retrieve)
            .tags(tags.to_vec());
        args.filter_directory = filter_directory.map(str::to_string);
        args.current_file = current_file.map(str::to_string);

        let result = self.coordinator.retrieve_all(&args).await;

        let counts: Vec<String> = result
            .metadata
            .iter()
            .map(|entry| format!("{}={}", entry.source, entry.count))
            .collect();
        log::info!(
            "Multi-source retrieval took {}ms: {}",
            result.total_time_ms,
            counts.join(", ")
        );

        result
    }

    pub fn fuse_results(&self, sources: &RetrievalSources) -> Vec<Chunk> {
        let total = sources.total_chunks();
        let fused = self.fusion.fuse(sources, self.n_final);

        let unique = {
            let mut digests: Vec<&str> = sources
                .iter()
                .flat_map(|(_, chunks)| chunks.iter().map(|chunk| chunk.digest.as_str()))
                .collect();
            digests.sort_unstable();
            digests.dedup();
            digests.len()
        };
        log::info!(
            "Fusion: {total} chunks, {} duplicates removed, {} kept",
            total - unique,
            fused.len()
        );

        fused
    }

    /// Retrieve then fuse
    pub async fn run_enhanced(
        &self,
        query: &str,
        tags: &[ScopeTag],
        filter_directory: Option<&str>,
        current_file: Option<&str>,
    ) -> Vec<Chunk> {
        let result = self
            .retrieve_from_multiple_sources(query, tags, filter_directory, current_file)
            .await;
        self.fuse_results(&result.sources)
    }
}

impl std::fmt::Debug for RetrievalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalPipeline")
            .field("coordinator", &self.coordinator)
            .field("n_retrieve", &self.n_retrieve)
            .field("n_final", &self.n_final)
            .finish_non_exhaustive()
    }
}
