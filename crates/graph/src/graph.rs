use crate::types::{unix_millis, Cycle, DependencyNode, Direction, FileNode, GraphMetadata, NodeState};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction as EdgeDirection;
use std::collections::HashMap;
use std::time::SystemTime;

/// File-level import graph.
///
/// Nodes are files keyed by path, edges point from an importing file to the
/// file it imports. Edges are unique per ordered pair and both adjacency
/// directions are always consistent because they come from the same arena.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Directed graph (importer -> imported)
    graph: DiGraph<FileNode, ()>,

    /// File path -> NodeIndex mapping for fast lookup
    path_index: HashMap<String, NodeIndex>,

    last_built: SystemTime,
    circular_dependencies: Option<Vec<Cycle>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            path_index: HashMap::new(),
            last_built: SystemTime::now(),
            circular_dependencies: None,
        }
    }

    /// Remove every node, edge and stored cycle
    pub fn clear(&mut self) {
        self.graph.clear();
        self.path_index.clear();
        self.circular_dependencies = None;
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, filepath: &str) -> bool {
        self.path_index.contains_key(filepath)
    }

    /// True once the file's own imports have been extracted
    pub fn is_scanned(&self, filepath: &str) -> bool {
        self.index_of(filepath)
            .is_some_and(|idx| self.graph[idx].state == NodeState::Scanned)
    }

    /// All file paths in node creation order
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.graph
            .node_indices()
            .map(move |idx| self.graph[idx].filepath.as_str())
    }

    /// Files `filepath` imports, in edge insertion order
    pub fn imports(&self, filepath: &str) -> Vec<&str> {
        self.index_of(filepath)
            .map(|idx| self.paths(self.neighbors(idx, Direction::Imports)))
            .unwrap_or_default()
    }

    /// Files importing `filepath`, in edge insertion order
    pub fn imported_by(&self, filepath: &str) -> Vec<&str> {
        self.index_of(filepath)
            .map(|idx| self.paths(self.neighbors(idx, Direction::ImportedBy)))
            .unwrap_or_default()
    }

    /// Snapshot of one node with both adjacency lists
    pub fn node(&self, filepath: &str) -> Option<DependencyNode> {
        let idx = self.index_of(filepath)?;
        let node = &self.graph[idx];
        let imports: Vec<String> = self
            .paths(self.neighbors(idx, Direction::Imports))
            .into_iter()
            .map(str::to_string)
            .collect();
        let imported_by: Vec<String> = self
            .paths(self.neighbors(idx, Direction::ImportedBy))
            .into_iter()
            .map(str::to_string)
            .collect();

        Some(DependencyNode {
            filepath: node.filepath.clone(),
            import_count: imports.len(),
            imported_by_count: imported_by.len(),
            imports,
            imported_by,
            last_updated: unix_millis(node.last_updated),
            state: node.state,
        })
    }

    pub fn metadata(&self) -> GraphMetadata {
        GraphMetadata {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            last_built: unix_millis(self.last_built),
            circular_dependencies: self.circular_dependencies.clone(),
        }
    }

    /// Cycles stored by the last build that requested detection
    pub fn circular_dependencies(&self) -> Option<&[Cycle]> {
        self.circular_dependencies.as_deref()
    }

    pub fn last_built(&self) -> SystemTime {
        self.last_built
    }

    pub(crate) fn index_of(&self, filepath: &str) -> Option<NodeIndex> {
        self.path_index.get(filepath).copied()
    }

    pub(crate) fn path_of(&self, idx: NodeIndex) -> &str {
        &self.graph[idx].filepath
    }

    pub(crate) fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    /// Get or create the node for `filepath`; new nodes start as `Referenced`
    pub(crate) fn ensure_node(&mut self, filepath: &str) -> NodeIndex {
        if let Some(idx) = self.index_of(filepath) {
            return idx;
        }
        let idx = self.graph.add_node(FileNode::referenced(filepath));
        self.path_index.insert(filepath.to_string(), idx);
        idx
    }

    /// Add an import edge unless it already exists
    pub(crate) fn add_import(&mut self, from: NodeIndex, to: NodeIndex) -> bool {
        if self.graph.find_edge(from, to).is_some() {
            return false;
        }
        self.graph.add_edge(from, to, ());
        true
    }

    pub(crate) fn mark_scanned(&mut self, idx: NodeIndex) {
        let node = &mut self.graph[idx];
        node.state = NodeState::Scanned;
        node.last_updated = SystemTime::now();
    }

    pub(crate) fn mark_built(&mut self, circular_dependencies: Option<Vec<Cycle>>) {
        self.last_built = SystemTime::now();
        self.circular_dependencies = circular_dependencies;
    }

    /// Adjacent nodes in edge insertion order.
    ///
    /// `Both` lists outgoing neighbors first, then incoming; a node adjacent
    /// both ways appears twice and callers de-duplicate.
    pub(crate) fn neighbors(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        match direction {
            Direction::Imports => self.directed(idx, EdgeDirection::Outgoing),
            Direction::ImportedBy => self.directed(idx, EdgeDirection::Incoming),
            Direction::Both => {
                let mut all = self.directed(idx, EdgeDirection::Outgoing);
                all.extend(self.directed(idx, EdgeDirection::Incoming));
                all
            }
        }
    }

    pub(crate) fn degree(&self, idx: NodeIndex, direction: EdgeDirection) -> usize {
        self.graph.neighbors_directed(idx, direction).count()
    }

    fn directed(&self, idx: NodeIndex, direction: EdgeDirection) -> Vec<NodeIndex> {
        // petgraph walks adjacency newest-first
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        neighbors.reverse();
        neighbors
    }

    fn paths(&self, indices: Vec<NodeIndex>) -> Vec<&str> {
        indices.into_iter().map(|idx| self.path_of(idx)).collect()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
