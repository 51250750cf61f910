use crate::graph::DependencyGraph;
use crate::types::{Cycle, Direction};
use petgraph::graph::NodeIndex;

/// One level of the explicit DFS stack
struct Frame {
    node: NodeIndex,
    neighbors: Vec<NodeIndex>,
    next: usize,
}

impl DependencyGraph {
    /// Find import cycles with a depth-first search over import edges.
    ///
    /// Roots are taken in node creation order and neighbors in edge insertion
    /// order. Every back edge to a node on the current path yields one cycle:
    /// the path from that node to the current one, closed by repeating the
    /// first file. Cycles are not de-duplicated across rotations.
    pub fn detect_circular_dependencies(&self) -> Vec<Cycle> {
        let node_count = self.node_count();
        let mut visited = vec![false; node_count];
        let mut on_path = vec![false; node_count];
        let mut cycles = Vec::new();

        for root in self.node_indices() {
            if visited[root.index()] {
                continue;
            }

            let mut path: Vec<NodeIndex> = Vec::new();
            let mut stack: Vec<Frame> = Vec::new();
            self.enter(root, &mut visited, &mut on_path, &mut path, &mut stack);

            while let Some(frame) = stack.last_mut() {
                let Some(&next) = frame.neighbors.get(frame.next) else {
                    on_path[frame.node.index()] = false;
                    path.pop();
                    stack.pop();
                    continue;
                };
                frame.next += 1;

                if !visited[next.index()] {
                    self.enter(next, &mut visited, &mut on_path, &mut path, &mut stack);
                } else if on_path[next.index()] {
                    if let Some(start) = path.iter().position(|&idx| idx == next) {
                        let mut cycle: Cycle = path[start..]
                            .iter()
                            .map(|&idx| self.path_of(idx).to_string())
                            .collect();
                        cycle.push(self.path_of(next).to_string());
                        cycles.push(cycle);
                    }
                }
            }
        }

        cycles
    }

    fn enter(
        &self,
        node: NodeIndex,
        visited: &mut [bool],
        on_path: &mut [bool],
        path: &mut Vec<NodeIndex>,
        stack: &mut Vec<Frame>,
    ) {
        visited[node.index()] = true;
        on_path[node.index()] = true;
        path.push(node);
        stack.push(Frame {
            node,
            neighbors: self.neighbors(node, Direction::Imports),
            next: 0,
        });
    }
}
