use crate::extractor::ImportExtractor;
use crate::graph::DependencyGraph;
use crate::types::BuildOptions;
use std::sync::Arc;

/// Populates a [`DependencyGraph`] from an [`ImportExtractor`]
#[derive(Clone)]
pub struct DependencyGraphBuilder {
    extractor: Arc<dyn ImportExtractor>,
}

impl DependencyGraphBuilder {
    pub fn new(extractor: Arc<dyn ImportExtractor>) -> Self {
        Self { extractor }
    }

    pub fn from_extractor(extractor: impl ImportExtractor + 'static) -> Self {
        Self::new(Arc::new(extractor))
    }

    /// Build a fresh graph from `files`
    pub fn build<S: AsRef<str>>(&self, files: &[S], options: &BuildOptions) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        self.build_graph(&mut graph, files, options);
        graph
    }

    /// Clear `graph` and rebuild it from `files`.
    ///
    /// Each listed file is scanned once; imported files outside the list are
    /// created as `Referenced` nodes.
    pub fn build_graph<'g, S: AsRef<str>>(
        &self,
        graph: &'g mut DependencyGraph,
        files: &[S],
        options: &BuildOptions,
    ) -> &'g DependencyGraph {
        graph.clear();

        for file in files {
            self.add_file_to_graph(graph, file.as_ref());
        }

        let cycles = options
            .detect_circular
            .then(|| graph.detect_circular_dependencies());
        if let Some(found) = &cycles {
            if !found.is_empty() {
                log::warn!("Detected {} circular dependencies", found.len());
            }
        }
        graph.mark_built(cycles);

        log::info!(
            "Built dependency graph: {} files, {} imports",
            graph.node_count(),
            graph.edge_count()
        );

        graph
    }

    /// Scan one file and add its import edges.
    ///
    /// No-op when the file was already scanned. A `Referenced` node is
    /// upgraded in place, keeping its existing incoming edges.
    pub fn add_file_to_graph(&self, graph: &mut DependencyGraph, filepath: &str) {
        if graph.is_scanned(filepath) {
            return;
        }

        let targets = match self.extractor.extract(filepath) {
            Some(imports) => imports.resolved_paths(),
            None => {
                log::debug!("No imports extracted for {filepath}");
                Vec::new()
            }
        };

        let from = graph.ensure_node(filepath);
        for target in &targets {
            let to = graph.ensure_node(target);
            graph.add_import(from, to);
        }
        graph.mark_scanned(from);
    }
}

impl std::fmt::Debug for DependencyGraphBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraphBuilder").finish_non_exhaustive()
    }
}
