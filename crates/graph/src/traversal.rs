use crate::graph::DependencyGraph;
use crate::types::{Direction, FindRelatedOptions, ImportChain, RelatedFilesResult};
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

impl DependencyGraph {
    /// Breadth-first search for files related to `start`.
    ///
    /// A file is recorded at the depth where it is first visited. Expansion
    /// stops past `max_depth`, and recording stops once `max_files` files
    /// have been collected. An unknown start file yields an empty result.
    pub fn find_related_files(&self, start: &str, options: &FindRelatedOptions) -> RelatedFilesResult {
        let mut files_by_depth: BTreeMap<usize, BTreeSet<String>> = BTreeMap::new();
        let mut all_files = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();

        visited.insert(start);
        queue.push_back((start, 0));

        while let Some((file, depth)) = queue.pop_front() {
            if depth > 0 || options.include_self {
                if all_files.len() >= options.max_files {
                    break;
                }
                files_by_depth
                    .entry(depth)
                    .or_default()
                    .insert(file.to_string());
                all_files.push(file.to_string());
            }

            if depth >= options.max_depth {
                continue;
            }

            let Some(idx) = self.index_of(file) else {
                continue;
            };

            for neighbor in self.neighbors(idx, options.direction) {
                let path = self.path_of(neighbor);
                if visited.insert(path) {
                    queue.push_back((path, depth + 1));
                }
            }
        }

        RelatedFilesResult {
            source_file: start.to_string(),
            count: all_files.len(),
            files_by_depth,
            all_files,
        }
    }

    /// Shortest import path from `from` to `to` following import edges only.
    ///
    /// `from == to` yields a zero-length chain.
    pub fn get_import_chain(&self, from: &str, to: &str) -> Option<ImportChain> {
        if from == to {
            return Some(ImportChain {
                from: from.to_string(),
                to: to.to_string(),
                path: vec![from.to_string()],
                length: 0,
            });
        }

        let start = self.index_of(from)?;
        let target = self.index_of(to)?;

        let mut parents: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if current == target {
                let path = self.unwind(&parents, start, target);
                return Some(ImportChain {
                    from: from.to_string(),
                    to: to.to_string(),
                    length: path.len() - 1,
                    path,
                });
            }

            for neighbor in self.neighbors(current, Direction::Imports) {
                if visited.insert(neighbor) {
                    parents.insert(neighbor, current);
                    queue.push_back(neighbor);
                }
            }
        }

        None
    }

    fn unwind(&self, parents: &HashMap<NodeIndex, NodeIndex>, start: NodeIndex, target: NodeIndex) -> Vec<String> {
        let mut path = vec![self.path_of(target).to_string()];
        let mut current = target;
        while current != start {
            match parents.get(&current) {
                Some(&parent) => {
                    path.push(self.path_of(parent).to_string());
                    current = parent;
                }
                None => break,
            }
        }
        path.reverse();
        path
    }
}
