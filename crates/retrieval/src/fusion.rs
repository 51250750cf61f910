use crate::error::{Result, RetrievalError};
use crate::types::{RetrievalSources, SourceKind};
use context_chunk::Chunk;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Final number of chunks kept when the caller does not say otherwise
pub const DEFAULT_MAX_CHUNKS: usize = 30;

/// Combines per-source chunk lists into one bounded list
pub trait FusionStrategy: Send + Sync {
    fn fuse(&self, sources: &RetrievalSources, max_final: usize) -> Vec<Chunk>;
}

/// Concatenate lists in declared source order, keep the first chunk per
/// digest, truncate to `max_final`.
///
/// Idempotent: fusing a list that is already fused returns it unchanged.
pub fn fuse(sources: &RetrievalSources, max_final: usize) -> Vec<Chunk> {
    let mut seen = HashSet::new();
    sources
        .iter()
        .flat_map(|(_, chunks)| chunks)
        .filter(|chunk| seen.insert(chunk.digest.as_str()))
        .take(max_final)
        .cloned()
        .collect()
}

/// Base strategy: declared source order plus exact-digest de-duplication
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredOrderFusion;

impl FusionStrategy for DeclaredOrderFusion {
    fn fuse(&self, sources: &RetrievalSources, max_final: usize) -> Vec<Chunk> {
        fuse(sources, max_final)
    }
}

/// Fusion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionOptions {
    /// Upper bound on fused output; a larger `n_final` is clamped to it
    pub max_chunks: usize,

    /// Reserved for near-duplicate detection; exact digests are always de-duplicated
    pub enable_semantic_dedup: bool,

    /// Reserved for boosting chunks that several sources agree on
    pub enable_cross_reference: bool,

    /// Per-source weights used by [`WeightedRrfFusion`]
    pub source_weights: BTreeMap<SourceKind, f32>,
}

impl Default for FusionOptions {
    fn default() -> Self {
        Self {
            max_chunks: DEFAULT_MAX_CHUNKS,
            enable_semantic_dedup: true,
            enable_cross_reference: true,
            source_weights: default_source_weights(),
        }
    }
}

impl FusionOptions {
    pub fn weight(&self, kind: SourceKind) -> f32 {
        self.source_weights.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chunks == 0 {
            return Err(RetrievalError::config("fusion.max_chunks must be greater than 0"));
        }
        for (kind, weight) in &self.source_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(RetrievalError::config(format!(
                    "fusion weight for {kind} must be a non-negative number, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

fn default_source_weights() -> BTreeMap<SourceKind, f32> {
    BTreeMap::from([
        (SourceKind::Fts, 0.15),
        (SourceKind::Embeddings, 0.25),
        (SourceKind::RecentlyEdited, 0.15),
        (SourceKind::RepoMap, 0.10),
        (SourceKind::LspDefinitions, 0.15),
        (SourceKind::ImportAnalysis, 0.10),
        (SourceKind::RecentlyVisitedRanges, 0.05),
        (SourceKind::StaticContext, 0.03),
        (SourceKind::ToolBasedSearch, 0.02),
    ])
}

/// Weighted Reciprocal Rank Fusion across sources.
///
/// score(chunk) = Σ weight(source) / (k + rank + 1), summed over every source
/// that returned the chunk's digest. Ties keep first-seen order.
#[derive(Debug, Clone)]
pub struct WeightedRrfFusion {
    /// RRF constant k (typically 60)
    k: f32,
    weights: BTreeMap<SourceKind, f32>,
}

impl WeightedRrfFusion {
    pub const DEFAULT_K: f32 = 60.0;

    pub fn new(options: &FusionOptions) -> Self {
        Self {
            k: Self::DEFAULT_K,
            weights: options.source_weights.clone(),
        }
    }

    #[must_use]
    pub fn with_k(mut self, k: f32) -> Self {
        self.k = k;
        self
    }
}

impl Default for WeightedRrfFusion {
    fn default() -> Self {
        Self::new(&FusionOptions::default())
    }
}

impl FusionStrategy for WeightedRrfFusion {
    fn fuse(&self, sources: &RetrievalSources, max_final: usize) -> Vec<Chunk> {
        let mut first_seen: Vec<&Chunk> = Vec::new();
        let mut scores: HashMap<&str, f32> = HashMap::new();

        for (kind, chunks) in sources.iter() {
            let weight = self.weights.get(&kind).copied().unwrap_or(0.0);
            for (rank, chunk) in chunks.iter().enumerate() {
                let score = scores.entry(chunk.digest.as_str()).or_insert_with(|| {
                    first_seen.push(chunk);
                    0.0
                });
                *score += weight / (self.k + rank as f32 + 1.0);
            }
        }

        // sort_by is stable, so equal scores keep first-seen order
        let mut ranked: Vec<(&Chunk, f32)> = first_seen
            .into_iter()
            .map(|chunk| (chunk, scores.get(chunk.digest.as_str()).copied().unwrap_or(0.0)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        ranked
            .into_iter()
            .take(max_final)
            .map(|(chunk, _)| chunk.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk(path: &str, line: usize) -> Chunk {
        Chunk::new(path, line, line, format!("{path}:{line}"))
    }

    fn paths(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.filepath.as_str()).collect()
    }

    #[test]
    fn declared_order_wins_over_insertion_order() {
        let mut sources = RetrievalSources::new();
        sources.insert(SourceKind::RepoMap, vec![chunk("repo_map.rs", 0)]);
        sources.insert(SourceKind::Fts, vec![chunk("fts.rs", 0)]);
        sources.insert(SourceKind::Embeddings, vec![chunk("embeddings.rs", 0)]);

        assert_eq!(
            paths(&fuse(&sources, 10)),
            vec!["fts.rs", "embeddings.rs", "repo_map.rs"]
        );
    }

    #[test]
    fn duplicates_keep_the_earliest_source() {
        let shared = chunk("shared.rs", 3);
        let mut sources = RetrievalSources::new();
        sources.insert(SourceKind::Fts, vec![chunk("a.rs", 0), shared.clone()]);
        sources.insert(SourceKind::Embeddings, vec![shared.clone(), chunk("b.rs", 0)]);

        let fused = fuse(&sources, 10);
        assert_eq!(paths(&fused), vec!["a.rs", "shared.rs", "b.rs"]);
    }

    #[test]
    fn output_is_truncated() {
        let mut sources = RetrievalSources::new();
        sources.insert(SourceKind::Fts, (0..20).map(|i| chunk("a.rs", i)).collect());

        assert_eq!(fuse(&sources, 5).len(), 5);
        assert!(fuse(&sources, 0).is_empty());
    }

    #[test]
    fn rrf_promotes_chunks_found_by_several_sources() {
        let shared = chunk("shared.rs", 0);
        let mut sources = RetrievalSources::new();
        sources.insert(SourceKind::Fts, vec![chunk("fts_only.rs", 0), shared.clone()]);
        sources.insert(SourceKind::Embeddings, vec![chunk("emb_only.rs", 0), shared]);

        let fused = WeightedRrfFusion::default().fuse(&sources, 10);
        assert_eq!(paths(&fused), vec!["shared.rs", "emb_only.rs", "fts_only.rs"]);
    }

    #[test]
    fn rrf_ties_keep_first_seen_order() {
        let options = FusionOptions {
            source_weights: SourceKind::ALL.into_iter().map(|kind| (kind, 1.0)).collect(),
            ..FusionOptions::default()
        };
        let mut sources = RetrievalSources::new();
        sources.insert(SourceKind::Fts, vec![chunk("a.rs", 0)]);
        sources.insert(SourceKind::RepoMap, vec![chunk("b.rs", 0)]);

        let fused = WeightedRrfFusion::new(&options).fuse(&sources, 10);
        assert_eq!(paths(&fused), vec!["a.rs", "b.rs"]);
    }

    #[test]
    fn default_weights_cover_every_source() {
        let options = FusionOptions::default();
        for kind in SourceKind::ALL {
            assert!(options.weight(kind) > 0.0, "{kind} has no weight");
        }
        let total: f32 = options.source_weights.values().sum();
        assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn negative_and_nan_weights_are_rejected() {
        let mut options = FusionOptions::default();
        options.source_weights.insert(SourceKind::Fts, -0.1);
        assert!(options.validate().is_err());

        options.source_weights.insert(SourceKind::Fts, f32::NAN);
        assert!(options.validate().is_err());

        assert!(FusionOptions::default().validate().is_ok());
    }
}
