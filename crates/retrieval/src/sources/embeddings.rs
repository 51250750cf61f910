use super::RetrievalSource;
use crate::collaborators::VectorIndex;
use crate::types::{RetrievalArguments, SourceKind};
use async_trait::async_trait;
use context_chunk::Chunk;
use std::sync::Arc;

/// Semantic search through the vector index, if one is configured
pub struct EmbeddingsSource {
    index: Option<Arc<dyn VectorIndex>>,
}

impl EmbeddingsSource {
    pub fn new(index: Option<Arc<dyn VectorIndex>>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl RetrievalSource for EmbeddingsSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Embeddings
    }

    async fn retrieve(&self, args: &RetrievalArguments) -> anyhow::Result<Vec<Chunk>> {
        let Some(index) = &self.index else {
            log::debug!("No vector index configured, skipping embeddings retrieval");
            return Ok(Vec::new());
        };

        let mut chunks = index
            .retrieve(&args.query, args.n_retrieve, &args.tags, args.filter_directory.as_deref())
            .await?;
        chunks.truncate(args.n_retrieve);
        Ok(chunks)
    }
}
