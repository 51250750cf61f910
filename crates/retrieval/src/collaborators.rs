//! External services the retrieval sources call into.
//!
//! All of these are implemented by the host (editor, index service, model
//! client). Errors are `anyhow` so hosts can attach their own context; the
//! coordinator turns them into metadata strings.

use crate::types::ScopeTag;
use anyhow::Context;
use async_trait::async_trait;
use context_chunk::Chunk;

/// Full-text index over the workspace
#[async_trait]
pub trait TextIndex: Send + Sync {
    /// `terms` is an OR-joined, quote-escaped term list
    async fn retrieve(
        &self,
        n: usize,
        terms: &str,
        tags: &[ScopeTag],
        directory: Option<&str>,
    ) -> anyhow::Result<Vec<Chunk>>;
}

/// Embedding index over the workspace
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn retrieve(
        &self,
        query: &str,
        n: usize,
        tags: &[ScopeTag],
        directory: Option<&str>,
    ) -> anyhow::Result<Vec<Chunk>>;
}

#[async_trait]
pub trait FileReader: Send + Sync {
    /// Fails if the file is missing or unreadable
    async fn read_file(&self, filepath: &str) -> anyhow::Result<String>;
}

/// Reads files straight from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFileReader;

#[async_trait]
impl FileReader for FsFileReader {
    async fn read_file(&self, filepath: &str) -> anyhow::Result<String> {
        tokio::fs::read_to_string(filepath)
            .await
            .with_context(|| format!("Failed to read {filepath}"))
    }
}

/// Files currently open in the editor
#[async_trait]
pub trait OpenFiles: Send + Sync {
    async fn open_files(&self) -> anyhow::Result<Vec<String>>;
}

/// Model-driven repository map lookup
#[async_trait]
pub trait RepoMapProvider: Send + Sync {
    async fn request_files(
        &self,
        query: &str,
        filter_directory: Option<&str>,
    ) -> anyhow::Result<Vec<Chunk>>;
}

/// Error sink for failed sources. Must not fail or block.
pub trait Telemetry: Send + Sync {
    fn capture_error(&self, tag: &str, message: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn capture_error(&self, _tag: &str, _message: &str) {}
}

/// Reports source failures through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn capture_error(&self, tag: &str, message: &str) {
        log::error!("[{tag}] {message}");
    }
}
