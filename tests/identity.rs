use symgraph::core::entity::{arity_of, EntityKind, ParamKind, Parameter, Source};
use symgraph::core::identity::{compute_confidence, generate_symbol_id};

fn param(name: &str, kind: ParamKind) -> Parameter {
    Parameter {
        name: name.to_string(),
        kind,
        default: None,
    }
}

#[test]
fn generated_ids_are_deterministic() {
    assert_eq!(generate_symbol_id(EntityKind::Class, "User"), "class_User");
    assert_eq!(generate_symbol_id(EntityKind::Method, "save"), "method_save");
    assert_eq!(
        generate_symbol_id(EntityKind::Module, "Billing"),
        "module_Billing"
    );
}

#[test]
fn confidence_adds_location_bonus_and_clamps() {
    // 0.95 base + 0.05 location bonus, clamped to 1.0.
    let score = compute_confidence(Source::TypeSignature, true, "User");
    assert!((score - 1.0).abs() < f64::EPSILON);
}

#[test]
fn confidence_penalizes_missing_name() {
    // 0.95 + 0.05 - 0.10 for the empty name.
    let score = compute_confidence(Source::TypeSignature, true, "");
    assert!((score - 0.90).abs() < f64::EPSILON);
}

#[test]
fn confidence_bases_follow_source_ranking() {
    let ordered = [
        Source::TypeSignature,
        Source::InlineSignature,
        Source::Runtime,
        Source::Documentation,
        Source::Static,
        Source::Inferred,
    ];
    let scores: Vec<f64> = ordered
        .iter()
        .map(|&s| compute_confidence(s, false, "name"))
        .collect();
    for pair in scores.windows(2) {
        assert!(pair[0] > pair[1]);
    }
    assert!((scores[5] - 0.50).abs() < f64::EPSILON);
}

#[test]
fn unknown_source_tags_fall_back_to_inferred() {
    assert_eq!(Source::parse("psychic"), Source::Inferred);
    assert_eq!(Source::parse("runtime"), Source::Runtime);
}

#[test]
fn arity_counts_required_parameters_exactly() {
    let params = vec![param("a", ParamKind::Required), param("b", ParamKind::Required)];
    assert_eq!(arity_of(&params), 2);
    assert_eq!(arity_of(&[]), 0);
}

#[test]
fn arity_goes_negative_with_optional_or_rest() {
    let params = vec![
        param("a", ParamKind::Required),
        param("b", ParamKind::Optional),
    ];
    assert_eq!(arity_of(&params), -2);

    let params = vec![param("args", ParamKind::Rest)];
    assert_eq!(arity_of(&params), -1);
}

#[test]
fn block_parameters_do_not_affect_arity() {
    let params = vec![
        param("a", ParamKind::Required),
        param("blk", ParamKind::Block),
    ];
    assert_eq!(arity_of(&params), 1);
}
