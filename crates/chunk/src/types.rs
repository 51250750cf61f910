use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A contiguous slice of a file's content, as returned by a retrieval source.
///
/// Two chunks with the same `digest` are the same artifact, whatever their other fields say.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// The slice content
    pub content: String,

    /// Source file path
    pub filepath: String,

    /// Start line (0-indexed)
    pub start_line: usize,

    /// End line (0-indexed, inclusive)
    pub end_line: usize,

    /// Identity key used for de-duplication
    pub digest: String,

    /// Position of this chunk within the list that produced it
    pub index: usize,

    /// Source-specific annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Chunk {
    /// Create a chunk whose digest is derived from its location and content
    #[must_use]
    pub fn new(
        filepath: impl Into<String>,
        start_line: usize,
        end_line: usize,
        content: impl Into<String>,
    ) -> Self {
        let filepath = filepath.into();
        let content = content.into();
        let digest = content_digest(&filepath, start_line, end_line, &content);
        Self {
            content,
            filepath,
            start_line,
            end_line,
            digest,
            index: 0,
            metadata: None,
        }
    }

    /// Builder: replace the derived digest with a caller-supplied one
    #[must_use]
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = digest.into();
        self
    }

    /// Builder: set the position index
    #[must_use]
    pub const fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Builder: add one metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the number of lines in this chunk
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Check if chunk contains a specific line
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    /// Look up a metadata entry
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }
}

/// Hex SHA-256 over a chunk's path, line range and content.
#[must_use]
pub fn content_digest(filepath: &str, start_line: usize, end_line: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(filepath.as_bytes());
    hasher.update([0u8]);
    hasher.update(start_line.to_le_bytes());
    hasher.update(end_line.to_le_bytes());
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Rough token estimate for code: ~4 chars per token, never zero.
#[must_use]
pub fn estimate_tokens(content: &str) -> usize {
    (content.len() / 4).max(1)
}
