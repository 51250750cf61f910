use super::RetrievalSource;
use crate::collaborators::FileReader;
use crate::error::RetrievalError;
use crate::types::{RetrievalArguments, SourceKind};
use async_trait::async_trait;
use context_chunk::{Chunk, LineChunker};
use context_graph::{DependencyGraph, FindRelatedOptions};
use std::sync::{Arc, RwLock};

/// Files near the current file in the import graph.
///
/// The graph is shared with whoever keeps it up to date; the read guard is
/// released before any file is read.
pub struct ImportAnalysisSource {
    graph: Arc<RwLock<DependencyGraph>>,
    reader: Arc<dyn FileReader>,
    chunker: LineChunker,
    options: FindRelatedOptions,
}

impl ImportAnalysisSource {
    pub fn new(graph: Arc<RwLock<DependencyGraph>>, reader: Arc<dyn FileReader>, chunker: LineChunker) -> Self {
        Self {
            graph,
            reader,
            chunker,
            options: FindRelatedOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: FindRelatedOptions) -> Self {
        self.options = options;
        self
    }

    fn related_files(&self, current_file: &str) -> Result<Vec<String>, RetrievalError> {
        let graph = self.graph.read().map_err(|_| RetrievalError::GraphLock)?;
        Ok(graph.find_related_files(current_file, &self.options).all_files)
    }
}

#[async_trait]
impl RetrievalSource for ImportAnalysisSource {
    fn kind(&self) -> SourceKind {
        SourceKind::ImportAnalysis
    }

    async fn retrieve(&self, args: &RetrievalArguments) -> anyhow::Result<Vec<Chunk>> {
        let Some(current_file) = args.current_file.as_deref() else {
            log::debug!("Import analysis skipped: no current file");
            return Ok(Vec::new());
        };

        let related = self.related_files(current_file)?;

        let mut chunks = Vec::new();
        for filepath in &related {
            if chunks.len() >= args.n_retrieve {
                break;
            }
            match self.reader.read_file(filepath).await {
                Ok(contents) => chunks.extend(self.chunker.chunk_document(filepath, &contents)),
                Err(e) => log::debug!("Import analysis: skipping {filepath}: {e:#}"),
            }
        }

        log::debug!(
            "Import analysis: {} related files for {current_file}, {} chunks",
            related.len(),
            chunks.len()
        );
        chunks.truncate(args.n_retrieve);
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_graph::{BuildOptions, DependencyGraphBuilder, InMemoryImportExtractor};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    struct MapReader(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl FileReader for MapReader {
        async fn read_file(&self, filepath: &str) -> anyhow::Result<String> {
            self.0
                .get(filepath)
                .map(|content| content.to_string())
                .ok_or_else(|| anyhow::anyhow!("no such file: {filepath}"))
        }
    }

    fn source() -> ImportAnalysisSource {
        let builder = DependencyGraphBuilder::from_extractor(
            InMemoryImportExtractor::new()
                .with_imports("app.ts", ["db.ts", "missing.ts"])
                .with_imports("db.ts", ["config.ts"]),
        );
        let graph = builder.build(&["app.ts", "db.ts"], &BuildOptions::default());
        let reader = MapReader(HashMap::from([
            ("app.ts", "import { db } from './db';"),
            ("db.ts", "import { config } from './config';"),
            ("config.ts", "export const config = {};"),
        ]));

        ImportAnalysisSource::new(Arc::new(RwLock::new(graph)), Arc::new(reader), LineChunker::default())
    }

    #[tokio::test]
    async fn related_files_are_chunked_nearest_first() {
        let chunks = source()
            .retrieve(&RetrievalArguments::new("db setup").current_file("app.ts"))
            .await
            .unwrap();

        let paths: Vec<&str> = chunks.iter().map(|c| c.filepath.as_str()).collect();
        assert_eq!(paths, vec!["db.ts", "config.ts"]);
    }

    #[tokio::test]
    async fn no_current_file_yields_nothing() {
        let chunks = source().retrieve(&RetrievalArguments::new("db setup")).await.unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn result_respects_n_retrieve() {
        let chunks = source()
            .retrieve(&RetrievalArguments::new("db").current_file("app.ts").n_retrieve(1))
            .await
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].filepath, "db.ts");
    }
}
