use crate::error::{ChunkError, Result};
use crate::types::{estimate_tokens, Chunk};

/// Line-based chunking with a soft token budget per chunk.
///
/// Lines are accumulated until the next line would push the chunk over
/// `max_chunk_tokens`. A single line that is larger than the budget becomes a
/// chunk of its own rather than being split mid-line.
#[derive(Debug, Clone, Copy)]
pub struct LineChunker {
    max_chunk_tokens: usize,
}

impl LineChunker {
    pub const DEFAULT_MAX_CHUNK_TOKENS: usize = 384;

    pub fn new(max_chunk_tokens: usize) -> Result<Self> {
        if max_chunk_tokens == 0 {
            return Err(ChunkError::invalid_config("max_chunk_tokens must be > 0"));
        }
        Ok(Self { max_chunk_tokens })
    }

    #[must_use]
    pub const fn max_chunk_tokens(&self) -> usize {
        self.max_chunk_tokens
    }

    /// Split a document into consecutive chunks
    #[must_use]
    pub fn chunk_document(&self, filepath: &str, contents: &str) -> Vec<Chunk> {
        let lines: Vec<&str> = contents.lines().collect();
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut tokens = 0;

        for (line_no, line) in lines.iter().enumerate() {
            let line_tokens = estimate_tokens(line);
            if line_no > start && tokens + line_tokens > self.max_chunk_tokens {
                chunks.push(self.make_chunk(filepath, &lines, start, line_no - 1, chunks.len()));
                start = line_no;
                tokens = 0;
            }
            tokens += line_tokens;
        }

        if start < lines.len() {
            chunks.push(self.make_chunk(filepath, &lines, start, lines.len() - 1, chunks.len()));
        }

        chunks
    }

    fn make_chunk(
        &self,
        filepath: &str,
        lines: &[&str],
        start: usize,
        end: usize,
        index: usize,
    ) -> Chunk {
        Chunk::new(filepath, start, end, lines[start..=end].join("\n")).with_index(index)
    }
}

impl Default for LineChunker {
    fn default() -> Self {
        Self {
            max_chunk_tokens: Self::DEFAULT_MAX_CHUNK_TOKENS,
        }
    }
}
