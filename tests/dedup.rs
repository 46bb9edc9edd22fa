use symgraph::core::dedup::{Deduplicator, SourcePrecedence};
use symgraph::core::entity::{ClassEntity, EntitySet, MethodEntity, Provenance, Source, Visibility};
use symgraph::core::facts::{ClassFact, FactSet, MethodFact};
use symgraph::core::Normalizer;

fn class_entity(fqname: &str, source: Source, confidence: f64) -> ClassEntity {
    ClassEntity::new(format!("class_{fqname}"), fqname.to_string(), Vec::new())
        .with_provenance(Provenance::new(source, confidence, 0))
}

fn method_fact(symbol_id: &str, source: &str, visibility: &str) -> MethodFact {
    MethodFact {
        symbol_id: Some(symbol_id.to_string()),
        name: "m".to_string(),
        owner: "C".to_string(),
        scope: Some("instance".to_string()),
        visibility: Some(visibility.to_string()),
        source: Some(source.to_string()),
        ..Default::default()
    }
}

#[test]
fn dedup_is_idempotent() {
    let mut set = EntitySet {
        classes: vec![
            class_entity("C", Source::Static, 0.75),
            class_entity("C", Source::Runtime, 0.85),
            class_entity("D", Source::Static, 0.75),
        ],
        ..Default::default()
    };

    let dedup = Deduplicator::default();
    dedup.dedup(&mut set);
    assert_eq!(set.classes.len(), 2);

    let after_first = set.clone();
    dedup.dedup(&mut set);
    assert_eq!(set, after_first);
}

#[test]
fn merge_keeps_primary_fields_and_most_restrictive_visibility() {
    let facts = FactSet {
        classes: vec![ClassFact {
            name: "C".to_string(),
            ..Default::default()
        }],
        methods: vec![
            method_fact("m_typed", "type_signature", "public"),
            method_fact("m_static", "static", "private"),
        ],
        ..Default::default()
    };

    let result = Normalizer::default().normalize(facts);

    assert_eq!(result.methods.len(), 1);
    let merged = &result.methods[0];
    // Higher-precedence source wins identity; visibility still tightens.
    assert_eq!(merged.symbol_id, "m_typed");
    assert_eq!(merged.visibility, Visibility::Private);
    assert!(merged.provenance.sources.contains(&Source::TypeSignature));
    assert!(merged.provenance.sources.contains(&Source::Static));
    assert!((merged.provenance.confidence - 0.95).abs() < f64::EPSILON);
}

#[test]
fn merge_combines_provenance_and_takes_max_confidence() {
    let mut set = EntitySet {
        classes: vec![
            class_entity("C", Source::Static, 0.75),
            class_entity("C", Source::Runtime, 0.85),
        ],
        ..Default::default()
    };

    Deduplicator::default().dedup(&mut set);

    let merged = &set.classes[0];
    assert_eq!(merged.provenance.sources, vec![Source::Static, Source::Runtime]);
    assert!((merged.provenance.confidence - 0.85).abs() < f64::EPSILON);
}

#[test]
fn superclass_comes_from_best_sourced_member() {
    let mut typed = class_entity("C", Source::TypeSignature, 0.95);
    typed.superclass = Some("TypedParent".to_string());
    let mut parsed = class_entity("C", Source::Static, 0.75);
    parsed.superclass = Some("ParsedParent".to_string());

    // Lower-precedence member first: the primary changes, and so does the
    // superclass pick.
    let mut set = EntitySet {
        classes: vec![parsed, typed],
        ..Default::default()
    };
    Deduplicator::default().dedup(&mut set);
    assert_eq!(set.classes[0].superclass.as_deref(), Some("TypedParent"));
}

#[test]
fn superclass_filled_from_lower_precedence_when_primary_lacks_one() {
    let typed = class_entity("C", Source::TypeSignature, 0.95);
    let mut parsed = class_entity("C", Source::Static, 0.75);
    parsed.superclass = Some("Parent".to_string());

    let mut set = EntitySet {
        classes: vec![typed, parsed],
        ..Default::default()
    };
    Deduplicator::default().dedup(&mut set);

    let merged = &set.classes[0];
    assert_eq!(merged.symbol_id, "class_C");
    assert_eq!(merged.superclass.as_deref(), Some("Parent"));
}

#[test]
fn equal_precedence_ties_keep_first_occurrence() {
    let mut first = MethodEntity::new("m_first".to_string(), "m".to_string(), "C".to_string());
    first.provenance = Provenance::new(Source::Runtime, 0.85, 0);
    let mut second = MethodEntity::new("m_second".to_string(), "m".to_string(), "C".to_string());
    second.provenance = Provenance::new(Source::Runtime, 0.85, 0);

    let mut set = EntitySet {
        methods: vec![first, second],
        ..Default::default()
    };
    Deduplicator::default().dedup(&mut set);

    assert_eq!(set.methods.len(), 1);
    assert_eq!(set.methods[0].symbol_id, "m_first");
}

#[test]
fn custom_precedence_order_is_honored() {
    // Rank static above everything else for this invocation.
    let precedence = SourcePrecedence::new(vec![
        Source::Static,
        Source::TypeSignature,
        Source::InlineSignature,
        Source::Runtime,
        Source::Documentation,
        Source::Inferred,
    ]);

    let typed = class_entity("C", Source::TypeSignature, 0.95);
    let mut parsed = class_entity("C", Source::Static, 0.75);
    parsed.symbol_id = "from_static".to_string();

    let mut set = EntitySet {
        classes: vec![typed, parsed],
        ..Default::default()
    };
    Deduplicator::new(precedence).dedup(&mut set);
    assert_eq!(set.classes[0].symbol_id, "from_static");
}
