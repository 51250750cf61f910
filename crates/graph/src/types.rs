use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{SystemTime, UNIX_EPOCH};

/// A directed walk that returns to its starting file: `cycle[0] == cycle[cycle.len() - 1]`.
pub type Cycle = Vec<String>;

/// Lifecycle of a file node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Exists only because another file imports it; its own imports are unknown
    Referenced,

    /// Its own imports have been extracted
    Scanned,
}

/// Arena payload for one file
#[derive(Debug, Clone)]
pub(crate) struct FileNode {
    pub filepath: String,
    pub state: NodeState,
    pub last_updated: SystemTime,
}

impl FileNode {
    pub fn referenced(filepath: &str) -> Self {
        Self {
            filepath: filepath.to_string(),
            state: NodeState::Referenced,
            last_updated: SystemTime::now(),
        }
    }
}

/// Snapshot of one node and its edges
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyNode {
    pub filepath: String,

    /// Files this file imports (outgoing edges), no duplicates
    pub imports: Vec<String>,

    /// Files that import this file (incoming edges), no duplicates
    pub imported_by: Vec<String>,

    pub import_count: usize,
    pub imported_by_count: usize,

    /// Unix time in milliseconds
    pub last_updated: u64,

    pub state: NodeState,
}

/// Graph-level metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    pub node_count: usize,
    pub edge_count: usize,

    /// Unix time in milliseconds
    pub last_built: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub circular_dependencies: Option<Vec<Cycle>>,
}

/// Options for [`crate::DependencyGraphBuilder::build_graph`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildOptions {
    /// Run cycle detection after the build and keep the result in the graph metadata
    pub detect_circular: bool,
}

/// Which edges a traversal follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Outgoing edges: files this file imports
    Imports,

    /// Incoming edges: files importing this file
    ImportedBy,

    #[default]
    Both,
}

/// Options for [`crate::DependencyGraph::find_related_files`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FindRelatedOptions {
    pub max_depth: usize,
    pub direction: Direction,
    pub max_files: usize,
    pub include_self: bool,
}

impl Default for FindRelatedOptions {
    fn default() -> Self {
        Self {
            max_depth: 2,
            direction: Direction::Both,
            max_files: 100,
            include_self: false,
        }
    }
}

impl FindRelatedOptions {
    #[must_use]
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub const fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub const fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    #[must_use]
    pub const fn include_self(mut self, include_self: bool) -> Self {
        self.include_self = include_self;
        self
    }
}

/// Result of a breadth-first related-files query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedFilesResult {
    pub source_file: String,

    /// Files grouped by the depth at which they were first visited
    pub files_by_depth: BTreeMap<usize, BTreeSet<String>>,

    /// All files in visit order (nearest depth first)
    pub all_files: Vec<String>,

    pub count: usize,
}

/// Shortest import path between two files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportChain {
    pub from: String,
    pub to: String,

    /// Ordered files, including `from` and `to`
    pub path: Vec<String>,

    /// Number of edges: `path.len() - 1`
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDegree {
    pub filepath: String,
    pub count: usize,
}

/// Summary statistics over the whole graph
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyGraphStats {
    pub total_files: usize,
    pub total_imports: usize,
    pub avg_imports_per_file: f64,

    /// Top 10 by out-degree
    pub most_imports: Vec<FileDegree>,

    /// Top 10 by in-degree
    pub most_imported_by: Vec<FileDegree>,

    /// Cycle count from the last stored detection pass (0 if none ran)
    pub circular_dependency_count: usize,

    /// Files with neither imports nor importers
    pub isolated_files: Vec<String>,
}

pub(crate) fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
