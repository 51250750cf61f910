use super::RetrievalSource;
use crate::collaborators::{FileReader, OpenFiles};
use crate::types::{RetrievalArguments, SourceKind};
use async_trait::async_trait;
use context_chunk::{Chunk, LineChunker};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Bounded most-recently-used list of edited or opened files
pub struct RecentFilesTracker {
    cache: Mutex<LruCache<String, ()>>,
}

impl RecentFilesTracker {
    pub const DEFAULT_CAPACITY: usize = 20;

    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Move `filepath` to the front, evicting the oldest entry when full
    pub fn mark(&self, filepath: impl Into<String>) {
        self.cache().put(filepath.into(), ());
    }

    /// Up to `n` paths, most recent first
    pub fn recent(&self, n: usize) -> Vec<String> {
        self.cache().iter().take(n).map(|(path, _)| path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.cache().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache().is_empty()
    }

    fn cache(&self) -> MutexGuard<'_, LruCache<String, ()>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RecentFilesTracker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// Chunks of recently edited files, topped up with open editor files
pub struct RecentlyEditedSource {
    tracker: Arc<RecentFilesTracker>,
    open_files: Option<Arc<dyn OpenFiles>>,
    reader: Arc<dyn FileReader>,
    chunker: LineChunker,
}

impl RecentlyEditedSource {
    pub fn new(tracker: Arc<RecentFilesTracker>, reader: Arc<dyn FileReader>, chunker: LineChunker) -> Self {
        Self {
            tracker,
            open_files: None,
            reader,
            chunker,
        }
    }

    #[must_use]
    pub fn with_open_files(mut self, open_files: Arc<dyn OpenFiles>) -> Self {
        self.open_files = Some(open_files);
        self
    }

    async fn candidate_files(&self, n: usize) -> anyhow::Result<Vec<String>> {
        let mut files = self.tracker.recent(n);
        if files.len() >= n {
            return Ok(files);
        }

        if let Some(open_files) = &self.open_files {
            for filepath in open_files.open_files().await? {
                if files.len() >= n {
                    break;
                }
                if !files.contains(&filepath) {
                    files.push(filepath);
                }
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl RetrievalSource for RecentlyEditedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::RecentlyEdited
    }

    async fn retrieve(&self, args: &RetrievalArguments) -> anyhow::Result<Vec<Chunk>> {
        let files = self.candidate_files(args.n_retrieve).await?;

        let mut chunks = Vec::new();
        for filepath in &files {
            let contents = self.reader.read_file(filepath).await?;
            chunks.extend(self.chunker.chunk_document(filepath, &contents));
        }

        log::debug!(
            "Recently edited: {} files produced {} chunks",
            files.len(),
            chunks.len()
        );
        chunks.truncate(args.n_retrieve);
        Ok(chunks)
    }
}
