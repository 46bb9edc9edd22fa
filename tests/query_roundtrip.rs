use symgraph::core::facts::{ClassFact, FactSet, MethodCallFact, MethodFact, MixinFact, ModuleFact};
use symgraph::core::Normalizer;
use symgraph::index::IndexedResult;

fn class(name: &str, superclass: Option<&str>) -> ClassFact {
    ClassFact {
        name: name.to_string(),
        superclass: superclass.map(str::to_string),
        source: Some("static".to_string()),
        ..Default::default()
    }
}

fn module(name: &str) -> ModuleFact {
    ModuleFact {
        name: name.to_string(),
        source: Some("static".to_string()),
        ..Default::default()
    }
}

fn method(name: &str, owner: &str) -> MethodFact {
    MethodFact {
        name: name.to_string(),
        owner: owner.to_string(),
        scope: Some("instance".to_string()),
        source: Some("static".to_string()),
        ..Default::default()
    }
}

fn call(caller: &str, callee: &str) -> MethodCallFact {
    MethodCallFact {
        caller: caller.to_string(),
        callee: callee.to_string(),
        ..Default::default()
    }
}

fn mixin(class: &str, module: &str, kind: &str) -> MixinFact {
    MixinFact {
        class: class.to_string(),
        module: module.to_string(),
        kind: Some(kind.to_string()),
    }
}

fn sample_result() -> IndexedResult {
    let facts = FactSet {
        classes: vec![class("Base", None), class("Child", Some("Base")), class("Service", None)],
        modules: vec![module("Helpers"), module("Loggable")],
        methods: vec![
            method("process", "Base"),
            method("run", "Child"),
            method("assist", "Helpers"),
            method("serve", "Service"),
        ],
        method_calls: vec![call("Child::run", "process"), call("Service::serve", "missing_fn")],
        mixins: vec![
            mixin("Child", "Helpers", "include"),
            mixin("Base", "Loggable", "include"),
            mixin("Service", "Helpers", "extend"),
        ],
        ..Default::default()
    };
    IndexedResult::from_normalized(&Normalizer::default().normalize(facts))
}

#[test]
fn graph_queries_cover_ancestry_and_dependencies() {
    let indexed = sample_result();

    assert_eq!(indexed.ancestors("Child"), vec!["Base"]);
    assert_eq!(indexed.descendants("Base"), vec!["Child"]);

    // Child depends on Base through the resolved call and on Helpers
    // through its mixin.
    let fan_out = indexed.fan_out("Child");
    assert!(fan_out.contains(&"Base".to_string()));
    assert!(fan_out.contains(&"Helpers".to_string()));
    assert_eq!(indexed.fan_in("Helpers").len(), 2);

    assert!(indexed.circular_dependencies.is_empty());
}

#[test]
fn trace_calls_walks_resolved_edges() {
    let indexed = sample_result();

    let hops = indexed.trace_calls("Child::run", 3);
    assert_eq!(hops.len(), 1);
    assert_eq!(hops[0].fqname, "Base::process");
    assert_eq!(hops[0].depth, 1);

    assert!(indexed.trace_calls("Child::run", 0).is_empty());
    assert!(indexed.trace_calls("nope", 3).is_empty());
}

#[test]
fn unresolved_call_keeps_edge_and_missing_reference() {
    let indexed = sample_result();

    let called = indexed.method_call_graph.successors_of("Service::serve");
    assert_eq!(called, vec!["missing_fn"]);
    assert!(indexed
        .missing_references_of("call")
        .iter()
        .any(|m| m.symbol == "missing_fn" && m.referenced_by == "Service::serve"));
}

#[test]
fn effective_mixins_include_inherited_ones() {
    let indexed = sample_result();

    let mixins = indexed.effective_mixins("Child");
    let modules: Vec<&str> = mixins.iter().map(|m| m.module_fqname.as_str()).collect();
    assert_eq!(modules, vec!["Helpers", "Loggable"]);

    assert!(indexed.effective_mixins("Helpers").is_empty());
}

#[test]
fn shortest_path_uses_inheritance_both_ways_and_mixins_forward() {
    let indexed = sample_result();

    // Down the hierarchy, then out through Child's mixin.
    assert_eq!(
        indexed.shortest_path("Base", "Helpers"),
        Some(vec![
            "Base".to_string(),
            "Child".to_string(),
            "Helpers".to_string()
        ])
    );
    // Mixin edges are not traversed backwards.
    assert_eq!(indexed.shortest_path("Helpers", "Service"), None);
    assert_eq!(
        indexed.shortest_path("Child", "Child"),
        Some(vec!["Child".to_string()])
    );
    assert_eq!(indexed.shortest_path("Child", "Nowhere"), None);
}

#[test]
fn hotspots_rank_by_fan_in() {
    let indexed = sample_result();

    let hotspots = indexed.hotspots(2);
    assert_eq!(hotspots.len(), 2);
    assert_eq!(hotspots[0].fqname, "Helpers");
    assert_eq!(hotspots[0].fan_in, 2);
    assert_eq!(hotspots[1].fan_in, 1);
}

#[test]
fn depths_cover_every_class_in_the_hierarchy() {
    let indexed = sample_result();
    let depths = indexed.inheritance_graph.depths();

    assert_eq!(depths["Base"], 0);
    assert_eq!(depths["Service"], 0);
    assert_eq!(depths["Child"], 1);
}

#[test]
fn serialized_document_round_trips_without_loss() {
    let indexed = sample_result();

    let document = indexed.to_json();
    let reloaded = IndexedResult::from_json(&document).unwrap();

    // Same canonical JSON, including the reconstructed depth caches.
    assert_eq!(document, reloaded.to_json());

    // Spot checks on the rebuilt adjacency and index.
    assert_eq!(reloaded.ancestors("Child"), vec!["Base"]);
    assert_eq!(
        reloaded.method_call_graph.successors_of("Child::run"),
        vec!["Base::process"]
    );
    assert!(reloaded.get("Base::process").is_some());
    assert_eq!(reloaded.inheritance_graph.depths()["Child"], 1);
    assert_eq!(reloaded.missing_references().len(), indexed.missing_references().len());
}

#[test]
fn incremental_remove_drops_symbol_everywhere() {
    let mut indexed = sample_result();

    assert!(indexed.remove_symbol("Child").is_some());
    assert!(indexed.get("Child").is_none());
    assert!(indexed.descendants("Base").is_empty());
    assert!(!indexed.inheritance_graph.has_node("Child"));
    assert!(indexed.remove_symbol("Child").is_none());
}

#[test]
fn incremental_add_extends_index_and_graphs() {
    use symgraph::core::entity::{ClassEntity, Entity};

    let mut indexed = sample_result();
    let newcomer = ClassEntity::new(
        "class_Late".to_string(),
        "Late".to_string(),
        Vec::new(),
    )
    .with_superclass("Base".to_string());

    indexed.add_symbol(Entity::Class(newcomer));

    assert!(indexed.get("Late").is_some());
    assert_eq!(indexed.ancestors("Late"), vec!["Base"]);
    assert_eq!(indexed.inheritance_graph.depths()["Late"], 1);
}
