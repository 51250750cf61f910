use context_chunk::Chunk;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-source cap used when the caller does not give one
pub const DEFAULT_N_RETRIEVE: usize = 25;

/// Retrieval methods, in declared (fusion) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    Fts,
    Embeddings,
    RecentlyEdited,
    RepoMap,
    LspDefinitions,
    ImportAnalysis,
    RecentlyVisitedRanges,
    StaticContext,
    ToolBasedSearch,
}

impl SourceKind {
    pub const ALL: [SourceKind; 9] = [
        SourceKind::Fts,
        SourceKind::Embeddings,
        SourceKind::RecentlyEdited,
        SourceKind::RepoMap,
        SourceKind::LspDefinitions,
        SourceKind::ImportAnalysis,
        SourceKind::RecentlyVisitedRanges,
        SourceKind::StaticContext,
        SourceKind::ToolBasedSearch,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fts => "fts",
            Self::Embeddings => "embeddings",
            Self::RecentlyEdited => "recentlyEdited",
            Self::RepoMap => "repoMap",
            Self::LspDefinitions => "lspDefinitions",
            Self::ImportAnalysis => "importAnalysis",
            Self::RecentlyVisitedRanges => "recentlyVisitedRanges",
            Self::StaticContext => "staticContext",
            Self::ToolBasedSearch => "toolBasedSearch",
        }
    }

    /// Tag reported to telemetry when this source fails
    pub fn telemetry_tag(self) -> String {
        format!("multi_source_{}_retrieval", self.as_str())
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which sources run for a retrieval.
///
/// Core sources default to on; experimental ones stay off unless enabled.
/// Keys are the source names (`recentlyEdited`, `importAnalysis`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceConfig {
    pub fts: bool,
    pub embeddings: bool,
    pub recently_edited: bool,
    pub repo_map: bool,
    pub lsp_definitions: bool,
    pub import_analysis: bool,
    pub recently_visited_ranges: bool,
    pub static_context: bool,
    pub tool_based_search: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            fts: true,
            embeddings: true,
            recently_edited: true,
            repo_map: true,
            lsp_definitions: true,
            import_analysis: false,
            recently_visited_ranges: false,
            static_context: false,
            tool_based_search: false,
        }
    }
}

impl SourceConfig {
    /// Every source disabled
    pub const fn none() -> Self {
        Self {
            fts: false,
            embeddings: false,
            recently_edited: false,
            repo_map: false,
            lsp_definitions: false,
            import_analysis: false,
            recently_visited_ranges: false,
            static_context: false,
            tool_based_search: false,
        }
    }

    /// Every source enabled
    pub const fn all() -> Self {
        Self {
            fts: true,
            embeddings: true,
            recently_edited: true,
            repo_map: true,
            lsp_definitions: true,
            import_analysis: true,
            recently_visited_ranges: true,
            static_context: true,
            tool_based_search: true,
        }
    }

    pub const fn is_enabled(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Fts => self.fts,
            SourceKind::Embeddings => self.embeddings,
            SourceKind::RecentlyEdited => self.recently_edited,
            SourceKind::RepoMap => self.repo_map,
            SourceKind::LspDefinitions => self.lsp_definitions,
            SourceKind::ImportAnalysis => self.import_analysis,
            SourceKind::RecentlyVisitedRanges => self.recently_visited_ranges,
            SourceKind::StaticContext => self.static_context,
            SourceKind::ToolBasedSearch => self.tool_based_search,
        }
    }

    pub fn set(&mut self, kind: SourceKind, enabled: bool) {
        let slot = match kind {
            SourceKind::Fts => &mut self.fts,
            SourceKind::Embeddings => &mut self.embeddings,
            SourceKind::RecentlyEdited => &mut self.recently_edited,
            SourceKind::RepoMap => &mut self.repo_map,
            SourceKind::LspDefinitions => &mut self.lsp_definitions,
            SourceKind::ImportAnalysis => &mut self.import_analysis,
            SourceKind::RecentlyVisitedRanges => &mut self.recently_visited_ranges,
            SourceKind::StaticContext => &mut self.static_context,
            SourceKind::ToolBasedSearch => &mut self.tool_based_search,
        };
        *slot = enabled;
    }

    /// Builder: toggle one source
    #[must_use]
    pub fn with(mut self, kind: SourceKind, enabled: bool) -> Self {
        self.set(kind, enabled);
        self
    }

    /// Enabled sources in declared order
    pub fn enabled(&self) -> Vec<SourceKind> {
        SourceKind::ALL
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }
}

/// Branch-scoped directory a search is restricted to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeTag {
    pub directory: String,
    pub branch: String,
}

/// Inputs for one multi-source retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalArguments {
    pub query: String,

    #[serde(default)]
    pub tags: Vec<ScopeTag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_directory: Option<String>,

    /// Advisory per-source cap; each source truncates on its own
    #[serde(default = "default_n_retrieve")]
    pub n_retrieve: usize,

    /// Overrides the coordinator's default source selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_config: Option<SourceConfig>,

    /// File the user is working in (LSP and import analysis anchor on it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,
}

fn default_n_retrieve() -> usize {
    DEFAULT_N_RETRIEVE
}

impl RetrievalArguments {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            tags: Vec::new(),
            filter_directory: None,
            n_retrieve: DEFAULT_N_RETRIEVE,
            source_config: None,
            current_file: None,
        }
    }

    #[must_use]
    pub fn n_retrieve(mut self, n_retrieve: usize) -> Self {
        self.n_retrieve = n_retrieve;
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: Vec<ScopeTag>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn filter_directory(mut self, directory: impl Into<String>) -> Self {
        self.filter_directory = Some(directory.into());
        self
    }

    #[must_use]
    pub fn source_config(mut self, config: SourceConfig) -> Self {
        self.source_config = Some(config);
        self
    }

    #[must_use]
    pub fn current_file(mut self, filepath: impl Into<String>) -> Self {
        self.current_file = Some(filepath.into());
        self
    }
}

/// Outcome of one source call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    pub source: SourceKind,
    pub count: usize,
    pub time_ms: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Chunk lists keyed by source; every kind is always present
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RetrievalSources(BTreeMap<SourceKind, Vec<Chunk>>);

impl RetrievalSources {
    pub fn new() -> Self {
        Self(SourceKind::ALL.into_iter().map(|kind| (kind, Vec::new())).collect())
    }

    pub fn get(&self, kind: SourceKind) -> &[Chunk] {
        self.0.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, kind: SourceKind, chunks: Vec<Chunk>) {
        self.0.insert(kind, chunks);
    }

    /// Lists in declared order
    pub fn iter(&self) -> impl Iterator<Item = (SourceKind, &[Chunk])> {
        self.0.iter().map(|(kind, chunks)| (*kind, chunks.as_slice()))
    }

    pub fn total_chunks(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

impl Default for RetrievalSources {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<SourceKind> for RetrievalSources {
    type Output = [Chunk];

    fn index(&self, kind: SourceKind) -> &Self::Output {
        self.get(kind)
    }
}

/// Aggregate of one `retrieve_all` call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResult {
    pub sources: RetrievalSources,

    /// One entry per enabled source, in completion order
    pub metadata: Vec<SourceMetadata>,

    pub total_time_ms: u64,
}

impl RetrievalResult {
    pub fn metadata_for(&self, kind: SourceKind) -> Option<&SourceMetadata> {
        self.metadata.iter().find(|entry| entry.source == kind)
    }

    pub fn failed_sources(&self) -> Vec<SourceKind> {
        self.metadata
            .iter()
            .filter(|entry| !entry.success)
            .map(|entry| entry.source)
            .collect()
    }
}
