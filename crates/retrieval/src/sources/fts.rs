use super::RetrievalSource;
use crate::collaborators::TextIndex;
use crate::terms::build_fts_query;
use crate::types::{RetrievalArguments, SourceKind};
use async_trait::async_trait;
use context_chunk::Chunk;
use std::sync::Arc;

/// Keyword search through the full-text index
pub struct FullTextSource {
    index: Arc<dyn TextIndex>,
}

impl FullTextSource {
    pub fn new(index: Arc<dyn TextIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl RetrievalSource for FullTextSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Fts
    }

    async fn retrieve(&self, args: &RetrievalArguments) -> anyhow::Result<Vec<Chunk>> {
        if args.query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let Some(terms) = build_fts_query(&args.query) else {
            log::debug!("No searchable terms in query {:?}", args.query);
            return Ok(Vec::new());
        };

        let mut chunks = self
            .index
            .retrieve(args.n_retrieve, &terms, &args.tags, args.filter_directory.as_deref())
            .await?;
        chunks.truncate(args.n_retrieve);
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScopeTag;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingIndex {
        calls: AtomicUsize,
        last_terms: Mutex<Option<String>>,
    }

    #[async_trait]
    impl TextIndex for RecordingIndex {
        async fn retrieve(
            &self,
            n: usize,
            terms: &str,
            _tags: &[ScopeTag],
            _directory: Option<&str>,
        ) -> anyhow::Result<Vec<Chunk>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_terms.lock().unwrap() = Some(terms.to_string());
            Ok((0..n + 5)
                .map(|i| Chunk::new("src/lib.rs", i, i, format!("line {i}")))
                .collect())
        }
    }

    #[tokio::test]
    async fn blank_query_skips_the_index() {
        let index = Arc::new(RecordingIndex::default());
        let source = FullTextSource::new(index.clone());

        for query in ["", "   ", "\n\t"] {
            let chunks = source.retrieve(&RetrievalArguments::new(query)).await.unwrap();
            assert!(chunks.is_empty());
        }
        assert_eq!(index.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cleaned_terms_reach_the_index() {
        let index = Arc::new(RecordingIndex::default());
        let source = FullTextSource::new(index.clone());

        let chunks = source
            .retrieve(&RetrievalArguments::new("parsing tokens").n_retrieve(4))
            .await
            .unwrap();

        assert_eq!(chunks.len(), 4);
        assert_eq!(
            index.last_terms.lock().unwrap().as_deref(),
            Some("\"pars\" OR \"token\"")
        );
    }
}
