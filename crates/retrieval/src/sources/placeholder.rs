use super::RetrievalSource;
use crate::types::{RetrievalArguments, SourceKind};
use async_trait::async_trait;
use context_chunk::Chunk;

/// Stand-in for a source without an implementation: succeeds with nothing
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderSource {
    kind: SourceKind,
}

impl PlaceholderSource {
    pub const fn new(kind: SourceKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl RetrievalSource for PlaceholderSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn retrieve(&self, _args: &RetrievalArguments) -> anyhow::Result<Vec<Chunk>> {
        log::debug!("Source {} has no implementation, returning no chunks", self.kind);
        Ok(Vec::new())
    }
}
