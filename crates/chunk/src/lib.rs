//! # Context Chunk
//!
//! Shared value types for multi-source context retrieval.
//!
//! A [`Chunk`] is a contiguous slice of a file with position metadata and a
//! content-derived identity digest. Every retrieval source produces chunks, and
//! fusion de-duplicates them by digest.
//!
//! ## Example
//!
//! ```rust
//! use context_chunk::{Chunk, LineChunker};
//!
//! let chunker = LineChunker::default();
//! let chunks = chunker.chunk_document("src/lib.rs", "fn a() {}\nfn b() {}\n");
//! assert_eq!(chunks.len(), 1);
//!
//! let same = Chunk::new("src/lib.rs", 0, 1, "fn a() {}\nfn b() {}");
//! assert_eq!(chunks[0].digest, same.digest);
//! ```

mod chunker;
mod error;
mod types;

pub use chunker::LineChunker;
pub use error::{ChunkError, Result};
pub use types::{content_digest, estimate_tokens, Chunk};
