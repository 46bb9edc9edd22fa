use symgraph::core::facts::{ClassFact, FactSet, MethodFact, MixinFact, ModuleFact};
use symgraph::core::Normalizer;

fn class(name: &str, superclass: Option<&str>) -> ClassFact {
    ClassFact {
        name: name.to_string(),
        superclass: superclass.map(str::to_string),
        source: Some("static".to_string()),
        ..Default::default()
    }
}

fn nested_class(name: &str, namespace_path: &[&str]) -> ClassFact {
    ClassFact {
        name: name.to_string(),
        namespace_path: namespace_path.iter().map(|s| s.to_string()).collect(),
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

fn method(name: &str, owner: &str, scope: &str) -> MethodFact {
    MethodFact {
        name: name.to_string(),
        owner: owner.to_string(),
        scope: Some(scope.to_string()),
        source: Some("static".to_string()),
        ..Default::default()
    }
}

#[test]
fn inheritance_chain_walks_to_deepest_ancestor() {
    let facts = FactSet {
        classes: vec![class("A", Some("B")), class("B", Some("C")), class("C", None)],
        ..Default::default()
    };

    let result = Normalizer::default().normalize(facts);

    let a = result.classes.iter().find(|c| c.fqname == "A").unwrap();
    let b = result.classes.iter().find(|c| c.fqname == "B").unwrap();
    let c = result.classes.iter().find(|c| c.fqname == "C").unwrap();
    assert_eq!(a.inheritance_chain, vec!["A", "B", "C"]);
    assert_eq!(b.inheritance_chain, vec!["B", "C"]);
    assert_eq!(c.inheritance_chain, vec!["C"]);
}

#[test]
fn inheritance_chain_stops_at_unknown_superclass() {
    let facts = FactSet {
        classes: vec![class("A", Some("B")), class("B", Some("Ghost"))],
        ..Default::default()
    };

    let result = Normalizer::default().normalize(facts);

    let a = result.classes.iter().find(|c| c.fqname == "A").unwrap();
    assert_eq!(a.inheritance_chain, vec!["A", "B"]);

    // Not an error, but queryable afterwards.
    assert!(result
        .missing_references
        .iter()
        .any(|m| m.symbol == "Ghost" && m.referenced_by == "B" && m.reference_type == "superclass"));
    assert!(result.errors.is_empty());
}

#[test]
fn inheritance_cycle_terminates_on_revisit() {
    let facts = FactSet {
        classes: vec![class("X", Some("Y")), class("Y", Some("X"))],
        ..Default::default()
    };

    let result = Normalizer::default().normalize(facts);

    let x = result.classes.iter().find(|c| c.fqname == "X").unwrap();
    let y = result.classes.iter().find(|c| c.fqname == "Y").unwrap();
    assert_eq!(x.inheritance_chain, vec!["X", "Y"]);
    assert_eq!(y.inheritance_chain, vec!["Y", "X"]);
}

#[test]
fn namespace_resolver_links_children() {
    let facts = FactSet {
        classes: vec![
            class("Outer", None),
            nested_class("Inner", &["Outer"]),
            nested_class("Deep", &["Outer", "Inner"]),
        ],
        ..Default::default()
    };

    let result = Normalizer::default().normalize(facts);

    let outer = result.classes.iter().find(|c| c.fqname == "Outer").unwrap();
    let inner = result
        .classes
        .iter()
        .find(|c| c.fqname == "Outer::Inner")
        .unwrap();
    assert_eq!(outer.children, vec!["Outer::Inner"]);
    assert_eq!(inner.children, vec!["Outer::Inner::Deep"]);
}

#[test]
fn cross_reference_registers_and_propagates_methods() {
    let facts = FactSet {
        classes: vec![class("Base", None), class("Child", Some("Base"))],
        methods: vec![method("process", "Base", "instance")],
        ..Default::default()
    };

    let result = Normalizer::default().normalize(facts);

    let base = result.classes.iter().find(|c| c.fqname == "Base").unwrap();
    let child = result.classes.iter().find(|c| c.fqname == "Child").unwrap();
    assert_eq!(base.instance_methods, vec!["process"]);
    assert!(base.available_instance_methods.contains(&"process".to_string()));
    assert!(child.instance_methods.is_empty());
    assert!(child.available_instance_methods.contains(&"process".to_string()));

    let process = result.methods.iter().find(|m| m.name == "process").unwrap();
    assert!(process.available_in.contains(&"Base".to_string()));
    assert!(process.available_in.contains(&"Child".to_string()));
}

#[test]
fn unresolved_owner_leaves_method_unpropagated() {
    let facts = FactSet {
        classes: vec![class("Known", None)],
        methods: vec![method("orphan", "Unknown", "instance")],
        ..Default::default()
    };

    let result = Normalizer::default().normalize(facts);

    let orphan = result.methods.iter().find(|m| m.name == "orphan").unwrap();
    assert!(orphan.available_in.is_empty());
    assert!(result
        .missing_references
        .iter()
        .any(|m| m.symbol == "Unknown" && m.reference_type == "owner"));
    assert!(result.errors.is_empty());
}

#[test]
fn include_propagates_module_methods() {
    let facts = FactSet {
        classes: vec![class("C", None)],
        modules: vec![module("M")],
        methods: vec![
            method("greet", "M", "instance"),
            method("build", "M", "class"),
        ],
        mixins: vec![MixinFact {
            class: "C".to_string(),
            module: "M".to_string(),
            kind: Some("include".to_string()),
        }],
        ..Default::default()
    };

    let result = Normalizer::default().normalize(facts);

    let c = result.classes.iter().find(|c| c.fqname == "C").unwrap();
    assert!(c.available_instance_methods.contains(&"greet".to_string()));
    assert!(c.available_class_methods.contains(&"build".to_string()));

    let greet = result.methods.iter().find(|m| m.name == "greet").unwrap();
    assert!(greet.available_in.contains(&"C".to_string()));
}

#[test]
fn extend_propagates_as_class_methods() {
    let facts = FactSet {
        classes: vec![class("C", None)],
        modules: vec![module("M")],
        methods: vec![method("helper", "M", "instance")],
        mixins: vec![MixinFact {
            class: "C".to_string(),
            module: "M".to_string(),
            kind: Some("extend".to_string()),
        }],
        ..Default::default()
    };

    let result = Normalizer::default().normalize(facts);

    let c = result.classes.iter().find(|c| c.fqname == "C").unwrap();
    assert!(c.available_class_methods.contains(&"helper".to_string()));
    assert!(!c.available_instance_methods.contains(&"helper".to_string()));
}

// Current behavior, not a guarantee: prepend is recorded as a mixin
// relationship but contributes nothing to method availability.
#[test]
fn prepend_records_edge_without_propagation() {
    let facts = FactSet {
        classes: vec![class("C", None)],
        modules: vec![module("M")],
        methods: vec![method("shadow", "M", "instance")],
        mixins: vec![MixinFact {
            class: "C".to_string(),
            module: "M".to_string(),
            kind: Some("prepend".to_string()),
        }],
        ..Default::default()
    };

    let result = Normalizer::default().normalize(facts);

    let c = result.classes.iter().find(|c| c.fqname == "C").unwrap();
    assert_eq!(c.mixins.len(), 1);
    assert!(c.available_instance_methods.is_empty());
    assert!(c.available_class_methods.is_empty());

    let shadow = result.methods.iter().find(|m| m.name == "shadow").unwrap();
    assert!(shadow.available_in.is_empty());
}

#[test]
fn unknown_mixin_module_is_recorded_not_fatal() {
    let facts = FactSet {
        classes: vec![class("C", None)],
        mixins: vec![MixinFact {
            class: "C".to_string(),
            module: "Ghost".to_string(),
            kind: Some("include".to_string()),
        }],
        ..Default::default()
    };

    let result = Normalizer::default().normalize(facts);

    assert!(result
        .missing_references
        .iter()
        .any(|m| m.symbol == "Ghost" && m.referenced_by == "C" && m.reference_type == "mixin"));
    assert!(result.errors.is_empty());
}

#[test]
fn invalid_visibility_is_coerced_with_validation_error() {
    let mut bad = method("m", "C", "instance");
    bad.visibility = Some("sideways".to_string());
    let facts = FactSet {
        classes: vec![class("C", None)],
        methods: vec![bad],
        ..Default::default()
    };

    let result = Normalizer::default().normalize(facts);

    let m = result.methods.iter().find(|m| m.name == "m").unwrap();
    assert_eq!(m.visibility.to_string(), "public");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].error_type, "validation");
}
