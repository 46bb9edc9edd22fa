use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use crate::core::entity::{Entity, EntityKind, MixinKind, MixinRef};
use crate::core::facts::MissingReference;
use crate::core::normalizer::NormalizedResult;
use crate::graph::{EdgeKind, EdgeRecord, GraphKind, SymbolGraph};
use crate::index::fuzzy::FuzzyMatch;
use crate::index::symbol_index::{SearchOptions, SymbolIndex};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallHop {
    pub fqname: String,
    pub depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hotspot {
    pub fqname: String,
    pub fan_in: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stats {
    pub classes: usize,
    pub modules: usize,
    pub methods: usize,
    pub inheritance: GraphStats,
    pub dependency: GraphStats,
    pub method_call: GraphStats,
    pub mixin: GraphStats,
    pub cycles: usize,
    pub missing_references: usize,
}

/// The full query surface: the symbol index composed with the four
/// specialized graphs, plus the derived cycle and missing-reference
/// reports. One logical owner; callers serialize their own mutations.
#[derive(Debug, Clone)]
pub struct IndexedResult {
    pub symbol_index: SymbolIndex,
    pub inheritance_graph: SymbolGraph,
    pub dependency_graph: SymbolGraph,
    pub method_call_graph: SymbolGraph,
    pub mixin_graph: SymbolGraph,
    pub circular_dependencies: Vec<Vec<String>>,
    pub missing_references: Vec<MissingReference>,
}

fn kind_attrs(kind: &str) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("kind".to_string(), Value::String(kind.to_string()));
    attrs
}

fn mixin_edge_kind(kind: MixinKind) -> EdgeKind {
    match kind {
        MixinKind::Include => EdgeKind::Include,
        MixinKind::Extend => EdgeKind::Extend,
        MixinKind::Prepend => EdgeKind::Prepend,
    }
}

impl IndexedResult {
    /// Load resolved entities into the index and the four graph builders,
    /// then derive depths and dependency cycles.
    pub fn from_normalized(result: &NormalizedResult) -> Self {
        let mut symbol_index = SymbolIndex::new();
        for class in &result.classes {
            symbol_index.add(Entity::Class(class.clone()));
        }
        for module in &result.modules {
            symbol_index.add(Entity::Module(module.clone()));
        }
        for method in &result.methods {
            symbol_index.add(Entity::Method(method.clone()));
        }

        let mut missing = result.missing_references.clone();

        // Inheritance: one edge per declared superclass, subtype first.
        let mut inheritance_graph = SymbolGraph::new(GraphKind::Inheritance);
        for class in &result.classes {
            inheritance_graph.add_node(&class.fqname, kind_attrs("class"));
        }
        for class in &result.classes {
            if let Some(superclass) = &class.superclass {
                if !superclass.is_empty() {
                    inheritance_graph.add_edge(
                        &class.fqname,
                        superclass,
                        EdgeKind::Inherits,
                        1.0,
                    );
                }
            }
        }

        // Mixins: class -> module, typed by the mixin kind.
        let mut mixin_graph = SymbolGraph::new(GraphKind::Mixin);
        for module in &result.modules {
            mixin_graph.add_node(&module.fqname, kind_attrs("module"));
        }
        for class in &result.classes {
            for mixin in &class.mixins {
                mixin_graph.add_edge(
                    &class.fqname,
                    &mixin.module_fqname,
                    mixin_edge_kind(mixin.kind),
                    1.0,
                );
            }
        }

        // Calls: resolve callees to method fqnames when possible; calls to
        // unknown targets keep their edge and are reported as missing.
        let method_fqnames: HashSet<&str> =
            result.methods.iter().map(|m| m.fqname.as_str()).collect();
        let mut methods_by_name: HashMap<&str, Vec<&str>> = HashMap::new();
        for method in &result.methods {
            methods_by_name
                .entry(method.name.as_str())
                .or_default()
                .push(method.fqname.as_str());
        }

        let mut method_call_graph = SymbolGraph::new(GraphKind::MethodCall);
        for method in &result.methods {
            method_call_graph.add_node(&method.fqname, kind_attrs("method"));
        }

        let mut resolved_calls: Vec<(String, String)> = Vec::new();
        for call in &result.method_calls {
            if call.caller.is_empty() || call.callee.is_empty() {
                continue;
            }
            let target = if method_fqnames.contains(call.callee.as_str()) {
                Some(call.callee.clone())
            } else {
                match methods_by_name.get(call.callee.as_str()) {
                    Some(fqnames) if fqnames.len() == 1 => Some(fqnames[0].to_string()),
                    _ => None,
                }
            };
            match target {
                Some(target) => {
                    method_call_graph.add_edge(&call.caller, &target, EdgeKind::Calls, 1.0);
                    resolved_calls.push((call.caller.clone(), target));
                }
                None => {
                    method_call_graph.add_edge(&call.caller, &call.callee, EdgeKind::Calls, 1.0);
                    missing.push(MissingReference::new(&call.callee, &call.caller, "call"));
                }
            }
        }

        // Dependencies: owner-level coupling from resolved calls plus
        // explicit mixin targets; self-edges and repeats are skipped.
        let mut dependency_graph = SymbolGraph::new(GraphKind::Dependency);
        for class in &result.classes {
            dependency_graph.add_node(&class.fqname, kind_attrs("class"));
        }
        for module in &result.modules {
            dependency_graph.add_node(&module.fqname, kind_attrs("module"));
        }

        let owner_of: HashMap<&str, &str> = result
            .methods
            .iter()
            .map(|m| (m.fqname.as_str(), m.owner.as_str()))
            .collect();
        let mut seen_dependencies: HashSet<(String, String)> = HashSet::new();
        for (caller, callee) in &resolved_calls {
            let (Some(&caller_owner), Some(&callee_owner)) =
                (owner_of.get(caller.as_str()), owner_of.get(callee.as_str()))
            else {
                continue;
            };
            if caller_owner.is_empty() || callee_owner.is_empty() || caller_owner == callee_owner
            {
                continue;
            }
            if seen_dependencies.insert((caller_owner.to_string(), callee_owner.to_string())) {
                dependency_graph.add_edge(caller_owner, callee_owner, EdgeKind::DependsOn, 1.0);
            }
        }
        for class in &result.classes {
            for mixin in &class.mixins {
                if seen_dependencies
                    .insert((class.fqname.clone(), mixin.module_fqname.clone()))
                {
                    dependency_graph.add_edge(
                        &class.fqname,
                        &mixin.module_fqname,
                        EdgeKind::DependsOn,
                        1.0,
                    );
                }
            }
        }

        inheritance_graph.calculate_depths();
        let circular_dependencies = dependency_graph.find_cycles();

        missing.sort_by(|a, b| {
            (&a.symbol, &a.referenced_by, &a.reference_type)
                .cmp(&(&b.symbol, &b.referenced_by, &b.reference_type))
        });
        missing.dedup();

        Self {
            symbol_index,
            inheritance_graph,
            dependency_graph,
            method_call_graph,
            mixin_graph,
            circular_dependencies,
            missing_references: missing,
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn get(&self, fqname: &str) -> Option<&Entity> {
        self.symbol_index.get(fqname)
    }

    pub fn search(&self, pattern: &str, options: &SearchOptions) -> Result<Vec<&Entity>> {
        self.symbol_index.search(pattern, options)
    }

    pub fn fuzzy_search(&self, query: &str, threshold: f64) -> Vec<FuzzyMatch> {
        self.symbol_index.fuzzy_search(query, threshold)
    }

    pub fn ancestors(&self, fqname: &str) -> Vec<String> {
        self.inheritance_graph.ancestors_of(fqname)
    }

    pub fn descendants(&self, fqname: &str) -> Vec<String> {
        self.inheritance_graph.descendants_of(fqname)
    }

    /// Names that depend on this symbol.
    pub fn fan_in(&self, fqname: &str) -> Vec<String> {
        self.dependency_graph.predecessors_of(fqname)
    }

    /// Names this symbol depends on.
    pub fn fan_out(&self, fqname: &str) -> Vec<String> {
        self.dependency_graph.successors_of(fqname)
    }

    /// Breadth-first walk of outgoing calls up to `max_depth` hops.
    pub fn trace_calls(&self, fqname: &str, max_depth: usize) -> Vec<CallHop> {
        if !self.method_call_graph.has_node(fqname) || max_depth == 0 {
            return Vec::new();
        }

        let mut hops = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(fqname.to_string());

        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((fqname.to_string(), 0));
        while let Some((current, depth)) = queue.pop_front() {
            if depth == max_depth {
                continue;
            }
            for callee in self.method_call_graph.successors_of(&current) {
                if visited.insert(callee.clone()) {
                    hops.push(CallHop {
                        fqname: callee.clone(),
                        depth: depth + 1,
                    });
                    queue.push_back((callee, depth + 1));
                }
            }
        }
        hops
    }

    /// Direct mixins plus mixins contributed by every resolved ancestor,
    /// de-duplicated, nearest declaration first.
    pub fn effective_mixins(&self, class_fqname: &str) -> Vec<MixinRef> {
        let Some(Entity::Class(class)) = self.symbol_index.get(class_fqname) else {
            return Vec::new();
        };

        let mut mixins: Vec<MixinRef> = Vec::new();
        for ancestor in &class.inheritance_chain {
            if let Some(Entity::Class(ancestor)) = self.symbol_index.get(ancestor) {
                for mixin in &ancestor.mixins {
                    if !mixins.contains(mixin) {
                        mixins.push(mixin.clone());
                    }
                }
            }
        }
        mixins
    }

    /// BFS over the union of inheritance edges (both directions) and mixin
    /// edges (forward only). Returns the node sequence including both
    /// endpoints, or `None` when unreachable.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let known = |name: &str| {
            self.inheritance_graph.has_node(name) || self.mixin_graph.has_node(name)
        };
        if !known(from) || !known(to) {
            return None;
        }
        if from == to {
            return Some(vec![from.to_string()]);
        }

        let mut parents: HashMap<String, String> = HashMap::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(from.to_string());
        parents.insert(from.to_string(), String::new());

        while let Some(current) = queue.pop_front() {
            let mut neighbors = self.inheritance_graph.successors_of(&current);
            neighbors.extend(self.inheritance_graph.predecessors_of(&current));
            neighbors.extend(self.mixin_graph.successors_of(&current));

            for next in neighbors {
                if parents.contains_key(&next) {
                    continue;
                }
                parents.insert(next.clone(), current.clone());
                if next == to {
                    let mut path = vec![next];
                    let mut cursor = current.clone();
                    while !cursor.is_empty() {
                        path.push(cursor.clone());
                        cursor = parents[&cursor].clone();
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }

    /// Symbols ranked by dependency fan-in, strongest first.
    pub fn hotspots(&self, limit: usize) -> Vec<Hotspot> {
        let mut hotspots: Vec<Hotspot> = self
            .dependency_graph
            .node_names()
            .into_iter()
            .map(|fqname| {
                let fan_in = self.dependency_graph.predecessors_of(&fqname).len();
                Hotspot { fqname, fan_in }
            })
            .collect();
        hotspots.sort_by(|a, b| b.fan_in.cmp(&a.fan_in).then_with(|| a.fqname.cmp(&b.fqname)));
        hotspots.truncate(limit);
        hotspots
    }

    pub fn missing_references(&self) -> &[MissingReference] {
        &self.missing_references
    }

    pub fn missing_references_of(&self, reference_type: &str) -> Vec<&MissingReference> {
        self.missing_references
            .iter()
            .filter(|m| m.reference_type == reference_type)
            .collect()
    }

    pub fn stats(&self) -> Stats {
        Stats {
            classes: self.symbol_index.of_kind(EntityKind::Class).len(),
            modules: self.symbol_index.of_kind(EntityKind::Module).len(),
            methods: self.symbol_index.of_kind(EntityKind::Method).len(),
            inheritance: GraphStats {
                nodes: self.inheritance_graph.node_count(),
                edges: self.inheritance_graph.edge_count(),
            },
            dependency: GraphStats {
                nodes: self.dependency_graph.node_count(),
                edges: self.dependency_graph.edge_count(),
            },
            method_call: GraphStats {
                nodes: self.method_call_graph.node_count(),
                edges: self.method_call_graph.edge_count(),
            },
            mixin: GraphStats {
                nodes: self.mixin_graph.node_count(),
                edges: self.mixin_graph.edge_count(),
            },
            cycles: self.circular_dependencies.len(),
            missing_references: self.missing_references.len(),
        }
    }

    // ── Incremental updates ─────────────────────────────────────────────
    //
    // Callers serialize these themselves; there is no internal locking.

    /// Register a symbol that arrived after initial construction. Graph
    /// nodes are created (and a class's superclass/mixin edges added);
    /// the inheritance depth cache is refreshed.
    pub fn add_symbol(&mut self, entity: Entity) {
        match &entity {
            Entity::Class(class) => {
                self.inheritance_graph.add_node(&class.fqname, kind_attrs("class"));
                self.dependency_graph.add_node(&class.fqname, kind_attrs("class"));
                if let Some(superclass) = &class.superclass {
                    if !superclass.is_empty() {
                        self.inheritance_graph.add_edge(
                            &class.fqname,
                            superclass,
                            EdgeKind::Inherits,
                            1.0,
                        );
                    }
                }
                for mixin in &class.mixins {
                    self.mixin_graph.add_edge(
                        &class.fqname,
                        &mixin.module_fqname,
                        mixin_edge_kind(mixin.kind),
                        1.0,
                    );
                }
                self.inheritance_graph.calculate_depths();
            }
            Entity::Module(module) => {
                self.mixin_graph.add_node(&module.fqname, kind_attrs("module"));
                self.dependency_graph.add_node(&module.fqname, kind_attrs("module"));
            }
            Entity::Method(method) => {
                self.method_call_graph.add_node(&method.fqname, kind_attrs("method"));
            }
        }
        self.symbol_index.add(entity);
    }

    /// Replace the indexed record. Node membership is kept; edge-level
    /// structure changes require a rebuild from facts.
    pub fn update_symbol(&mut self, entity: Entity) {
        match &entity {
            Entity::Class(class) => {
                self.inheritance_graph.add_node(&class.fqname, kind_attrs("class"));
                self.dependency_graph.add_node(&class.fqname, kind_attrs("class"));
            }
            Entity::Module(module) => {
                self.mixin_graph.add_node(&module.fqname, kind_attrs("module"));
                self.dependency_graph.add_node(&module.fqname, kind_attrs("module"));
            }
            Entity::Method(method) => {
                self.method_call_graph.add_node(&method.fqname, kind_attrs("method"));
            }
        }
        self.symbol_index.update(entity);
    }

    /// Drop a symbol from the index and every graph, then refresh the
    /// derived depth and cycle reports.
    pub fn remove_symbol(&mut self, fqname: &str) -> Option<Entity> {
        let entity = self.symbol_index.remove(fqname)?;
        self.inheritance_graph.remove_node(fqname);
        self.dependency_graph.remove_node(fqname);
        self.method_call_graph.remove_node(fqname);
        self.mixin_graph.remove_node(fqname);
        self.inheritance_graph.calculate_depths();
        self.circular_dependencies = self.dependency_graph.find_cycles();
        Some(entity)
    }

    // ── Persistence ─────────────────────────────────────────────────────

    pub fn to_json(&self) -> Value {
        json!({
            "symbol_index": { "symbols": self.symbol_index.entities() },
            "inheritance_graph": graph_to_json(&self.inheritance_graph),
            "dependency_graph": graph_to_json(&self.dependency_graph),
            "method_call_graph": graph_to_json(&self.method_call_graph),
            "mixin_graph": graph_to_json(&self.mixin_graph),
            "circular_dependencies": self.circular_dependencies,
            "missing_references": self.missing_references,
        })
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let symbols: Vec<Entity> = match value.pointer("/symbol_index/symbols") {
            Some(symbols) => serde_json::from_value(symbols.clone())?,
            None => Vec::new(),
        };
        let mut symbol_index = SymbolIndex::new();
        for entity in symbols {
            symbol_index.add(entity);
        }

        let inheritance_graph =
            graph_from_json(value.get("inheritance_graph"), GraphKind::Inheritance)?;
        let dependency_graph =
            graph_from_json(value.get("dependency_graph"), GraphKind::Dependency)?;
        let method_call_graph =
            graph_from_json(value.get("method_call_graph"), GraphKind::MethodCall)?;
        let mixin_graph = graph_from_json(value.get("mixin_graph"), GraphKind::Mixin)?;

        let circular_dependencies: Vec<Vec<String>> = match value.get("circular_dependencies") {
            Some(cycles) => serde_json::from_value(cycles.clone())?,
            None => Vec::new(),
        };
        let missing_references: Vec<MissingReference> = match value.get("missing_references") {
            Some(missing) => serde_json::from_value(missing.clone())?,
            None => Vec::new(),
        };

        Ok(Self {
            symbol_index,
            inheritance_graph,
            dependency_graph,
            method_call_graph,
            mixin_graph,
            circular_dependencies,
            missing_references,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string(&self.to_json())?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)?;
        Self::from_json(&value)
    }
}

fn graph_to_json(graph: &SymbolGraph) -> Value {
    let mut nodes = Map::new();
    for name in graph.node_names() {
        let attrs = graph.node_attrs(&name).cloned().unwrap_or_default();
        nodes.insert(name, Value::Object(attrs));
    }
    json!({
        "type": graph.kind().as_str(),
        "nodes": nodes,
        "edges": graph.edge_records(),
        "depths": graph.depths(),
    })
}

/// Rebuild a graph from its persisted form. Adjacency indexes come back
/// through `add_node`/`add_edge`; the depth cache is derived state and is
/// reinstated explicitly.
fn graph_from_json(value: Option<&Value>, fallback: GraphKind) -> Result<SymbolGraph> {
    let Some(value) = value else {
        return Ok(SymbolGraph::new(fallback));
    };

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .and_then(GraphKind::parse)
        .unwrap_or(fallback);
    let mut graph = SymbolGraph::new(kind);

    if let Some(nodes) = value.get("nodes").and_then(Value::as_object) {
        for (name, attrs) in nodes {
            graph.add_node(name, attrs.as_object().cloned().unwrap_or_default());
        }
    }
    if let Some(edges) = value.get("edges").and_then(Value::as_array) {
        for edge in edges {
            let record: EdgeRecord = serde_json::from_value(edge.clone())?;
            graph.add_edge(&record.from, &record.to, record.edge_type, record.weight);
        }
    }
    if let Some(depths) = value.get("depths") {
        let depths: HashMap<String, usize> =
            serde_json::from_value(depths.clone()).unwrap_or_default();
        graph.set_depths(depths);
    }
    Ok(graph)
}
