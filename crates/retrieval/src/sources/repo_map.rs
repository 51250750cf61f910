use super::RetrievalSource;
use crate::collaborators::RepoMapProvider;
use crate::types::{RetrievalArguments, SourceKind};
use async_trait::async_trait;
use context_chunk::Chunk;
use std::sync::Arc;

/// Files picked by the model from a repository map
pub struct RepoMapSource {
    provider: Option<Arc<dyn RepoMapProvider>>,
}

impl RepoMapSource {
    pub fn new(provider: Option<Arc<dyn RepoMapProvider>>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl RetrievalSource for RepoMapSource {
    fn kind(&self) -> SourceKind {
        SourceKind::RepoMap
    }

    async fn retrieve(&self, args: &RetrievalArguments) -> anyhow::Result<Vec<Chunk>> {
        let Some(provider) = &self.provider else {
            log::debug!("No repo map provider configured, skipping repo map retrieval");
            return Ok(Vec::new());
        };
        provider
            .request_files(&args.query, args.filter_directory.as_deref())
            .await
    }
}
