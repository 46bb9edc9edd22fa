use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Which specialized graph an instance encodes. The engine itself is
/// generic; only the depth cache is inheritance-specific by convention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    Inheritance,
    Dependency,
    MethodCall,
    Mixin,
}

impl GraphKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GraphKind::Inheritance => "inheritance",
            GraphKind::Dependency => "dependency",
            GraphKind::MethodCall => "method_call",
            GraphKind::Mixin => "mixin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "inheritance" => Some(GraphKind::Inheritance),
            "dependency" => Some(GraphKind::Dependency),
            "method_call" => Some(GraphKind::MethodCall),
            "mixin" => Some(GraphKind::Mixin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Inherits,
    DependsOn,
    Calls,
    Include,
    Extend,
    Prepend,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Inherits => "inherits",
            EdgeKind::DependsOn => "depends_on",
            EdgeKind::Calls => "calls",
            EdgeKind::Include => "include",
            EdgeKind::Extend => "extend",
            EdgeKind::Prepend => "prepend",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "inherits" => Some(EdgeKind::Inherits),
            "depends_on" => Some(EdgeKind::DependsOn),
            "calls" => Some(EdgeKind::Calls),
            "include" => Some(EdgeKind::Include),
            "extend" => Some(EdgeKind::Extend),
            "prepend" => Some(EdgeKind::Prepend),
            _ => None,
        }
    }
}

/// One edge in persistable form: endpoints plus its attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeRecord {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeKind,
    #[serde(default = "default_edge_weight")]
    pub weight: f64,
}

fn default_edge_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    attrs: Map<String, Value>,
}

#[derive(Debug, Clone)]
struct EdgeData {
    kind: EdgeKind,
    weight: f64,
}

/// Directed graph over symbol names: petgraph storage behind a
/// name-to-index map, typed weighted multi-edges, and a depth cache for
/// inheritance-shaped instances. Edge endpoints are auto-created, so the
/// node set always covers the edge list.
#[derive(Debug, Clone)]
pub struct SymbolGraph {
    kind: GraphKind,
    graph: StableDiGraph<NodeData, EdgeData>,
    node_ids: HashMap<String, NodeIndex>,
    depths: HashMap<String, usize>,
}

impl SymbolGraph {
    pub fn new(kind: GraphKind) -> Self {
        Self {
            kind,
            graph: StableDiGraph::new(),
            node_ids: HashMap::new(),
            depths: HashMap::new(),
        }
    }

    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.node_ids.contains_key(name)
    }

    /// First write wins: re-adding an existing node keeps its attributes.
    pub fn add_node(&mut self, name: &str, attrs: Map<String, Value>) {
        if self.node_ids.contains_key(name) {
            return;
        }
        let idx = self.graph.add_node(NodeData {
            name: name.to_string(),
            attrs,
        });
        self.node_ids.insert(name.to_string(), idx);
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.node_ids.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(NodeData {
            name: name.to_string(),
            attrs: Map::new(),
        });
        self.node_ids.insert(name.to_string(), idx);
        idx
    }

    /// Appends an edge, creating missing endpoints. Parallel edges are
    /// allowed; callers de-duplicate upstream when they care.
    pub fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind, weight: f64) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        self.graph.add_edge(from_idx, to_idx, EdgeData { kind, weight });
    }

    /// Removes the node, every edge touching it, and its depth entry.
    pub fn remove_node(&mut self, name: &str) -> bool {
        match self.node_ids.remove(name) {
            Some(idx) => {
                self.graph.remove_node(idx);
                self.depths.remove(name);
                true
            }
            None => false,
        }
    }

    pub fn node_attrs(&self, name: &str) -> Option<&Map<String, Value>> {
        self.node_ids
            .get(name)
            .map(|&idx| &self.graph[idx].attrs)
    }

    /// Node names in insertion order.
    pub fn node_names(&self) -> Vec<String> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx].name.clone())
            .collect()
    }

    /// Edges in insertion order, in persistable form.
    pub fn edge_records(&self) -> Vec<EdgeRecord> {
        self.graph
            .edge_indices()
            .filter_map(|edge_idx| {
                let (from, to) = self.graph.edge_endpoints(edge_idx)?;
                let data = &self.graph[edge_idx];
                Some(EdgeRecord {
                    from: self.graph[from].name.clone(),
                    to: self.graph[to].name.clone(),
                    edge_type: data.kind,
                    weight: data.weight,
                })
            })
            .collect()
    }

    /// De-duplicated direct successor names, oldest edge first.
    pub fn successors_of(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// De-duplicated direct predecessor names, oldest edge first.
    pub fn predecessors_of(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Incoming)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<String> {
        let Some(&idx) = self.node_ids.get(name) else {
            return Vec::new();
        };
        // petgraph walks adjacency newest-first; flip to insertion order.
        let mut indices: Vec<NodeIndex> =
            self.graph.neighbors_directed(idx, direction).collect();
        indices.reverse();

        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut names = Vec::new();
        for neighbor in indices {
            if seen.insert(neighbor) {
                names.push(self.graph[neighbor].name.clone());
            }
        }
        names
    }

    pub fn depths(&self) -> &HashMap<String, usize> {
        &self.depths
    }

    /// Reinstall a depth cache, e.g. when loading a persisted graph.
    pub fn set_depths(&mut self, depths: HashMap<String, usize>) {
        self.depths = depths;
    }

    pub(crate) fn depths_mut(&mut self) -> &mut HashMap<String, usize> {
        &mut self.depths
    }
}
