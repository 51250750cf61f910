use crate::graph::DependencyGraph;
use crate::types::{DependencyGraphStats, FileDegree};
use petgraph::Direction as EdgeDirection;

const TOP_FILES: usize = 10;

impl DependencyGraph {
    pub fn get_stats(&self) -> DependencyGraphStats {
        let total_files = self.node_count();
        let total_imports = self.edge_count();
        let avg_imports_per_file = if total_files > 0 {
            total_imports as f64 / total_files as f64
        } else {
            0.0
        };

        let mut most_imports = Vec::with_capacity(total_files);
        let mut most_imported_by = Vec::with_capacity(total_files);
        let mut isolated_files = Vec::new();

        for idx in self.node_indices() {
            let filepath = self.path_of(idx);
            let out_degree = self.degree(idx, EdgeDirection::Outgoing);
            let in_degree = self.degree(idx, EdgeDirection::Incoming);

            if out_degree == 0 && in_degree == 0 {
                isolated_files.push(filepath.to_string());
            }
            most_imports.push(FileDegree {
                filepath: filepath.to_string(),
                count: out_degree,
            });
            most_imported_by.push(FileDegree {
                filepath: filepath.to_string(),
                count: in_degree,
            });
        }

        DependencyGraphStats {
            total_files,
            total_imports,
            avg_imports_per_file,
            most_imports: top(most_imports),
            most_imported_by: top(most_imported_by),
            circular_dependency_count: self.circular_dependencies().map_or(0, <[_]>::len),
            isolated_files,
        }
    }
}

/// Highest counts first; ties keep node order (stable sort)
fn top(mut degrees: Vec<FileDegree>) -> Vec<FileDegree> {
    degrees.sort_by(|a, b| b.count.cmp(&a.count));
    degrees.truncate(TOP_FILES);
    degrees
}
