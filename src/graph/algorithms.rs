use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::Direction;

use crate::graph::engine::SymbolGraph;

impl SymbolGraph {
    /// Everything reachable over successor edges. Inheritance edges point
    /// from subtype to supertype, so "up" follows successors.
    pub fn ancestors_of(&self, name: &str) -> Vec<String> {
        self.reachable(name, Direction::Outgoing)
    }

    /// Everything reachable over predecessor edges ("down" for an
    /// inheritance-shaped graph).
    pub fn descendants_of(&self, name: &str) -> Vec<String> {
        self.reachable(name, Direction::Incoming)
    }

    /// BFS over successor edges. The start node is excluded unless a cycle
    /// leads back to it.
    pub fn transitive_closure(&self, name: &str) -> Vec<String> {
        self.reachable(name, Direction::Outgoing)
    }

    fn reachable(&self, name: &str, direction: Direction) -> Vec<String> {
        if !self.has_node(name) {
            return Vec::new();
        }

        let mut result = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(name.to_string());

        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(name.to_string());

        let mut start_re_reached = false;
        while let Some(current) = queue.pop_front() {
            let neighbors = match direction {
                Direction::Outgoing => self.successors_of(&current),
                Direction::Incoming => self.predecessors_of(&current),
            };
            for next in neighbors {
                if next == name {
                    if !start_re_reached {
                        start_re_reached = true;
                        result.push(next);
                    }
                } else if visited.insert(next.clone()) {
                    result.push(next.clone());
                    queue.push_back(next);
                }
            }
        }
        result
    }

    /// Enumerate every distinct cycle as an ordered node sequence, closed
    /// by repeating the first node. DFS with a recursion-stack set; the
    /// path is copied per branch so cycles sharing a prefix are each
    /// reported. Start nodes and successors are taken in sorted order to
    /// keep the report deterministic.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();

        let mut names = self.node_names();
        names.sort();

        for name in names {
            if !visited.contains(&name) {
                let mut stack: HashSet<String> = HashSet::new();
                self.cycle_dfs(&name, Vec::new(), &mut stack, &mut visited, &mut cycles);
            }
        }
        cycles
    }

    fn cycle_dfs(
        &self,
        node: &str,
        path: Vec<String>,
        stack: &mut HashSet<String>,
        visited: &mut HashSet<String>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        if stack.contains(node) {
            if let Some(pos) = path.iter().position(|n| n == node) {
                let mut cycle = path[pos..].to_vec();
                cycle.push(node.to_string());
                cycles.push(cycle);
            }
            return;
        }
        if visited.contains(node) {
            return;
        }
        visited.insert(node.to_string());
        stack.insert(node.to_string());

        let mut next_path = path;
        next_path.push(node.to_string());

        let mut successors = self.successors_of(node);
        successors.sort();
        for successor in successors {
            self.cycle_dfs(&successor, next_path.clone(), stack, visited, cycles);
        }

        stack.remove(node);
    }

    /// Depth labeling for inheritance-shaped graphs. Roots are nodes with
    /// no outgoing edge (no superclass); each root seeds a layered BFS
    /// downward over predecessor edges. A node reachable from several
    /// roots keeps its first-assigned depth. The result is cached on the
    /// graph and returned.
    pub fn calculate_depths(&mut self) -> HashMap<String, usize> {
        let mut depths: HashMap<String, usize> = HashMap::new();

        let mut roots: Vec<String> = self
            .node_names()
            .into_iter()
            .filter(|name| self.successors_of(name).is_empty())
            .collect();
        roots.sort();

        for root in roots {
            if depths.contains_key(&root) {
                continue;
            }
            depths.insert(root.clone(), 0);

            let mut queue: VecDeque<String> = VecDeque::new();
            queue.push_back(root);
            while let Some(current) = queue.pop_front() {
                let depth = depths[&current];
                for child in self.predecessors_of(&current) {
                    if !depths.contains_key(&child) {
                        depths.insert(child.clone(), depth + 1);
                        queue.push_back(child);
                    }
                }
            }
        }

        *self.depths_mut() = depths.clone();
        depths
    }
}
