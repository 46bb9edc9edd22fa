use crate::core::entity::{EntityKind, Source};

/// Deterministic fallback identifier for facts that carry no explicit id.
/// Explicit ids survive reprocessing; generated ones only depend on the
/// kind and name.
pub fn generate_symbol_id(kind: EntityKind, name: &str) -> String {
    format!("{}_{}", kind.as_str(), name)
}

/// Base confidence per source tag. Typed signatures rank above runtime
/// introspection, which ranks above documentation and plain structural
/// parses; unattributed facts bottom out at 0.5.
fn base_confidence(source: Source) -> f64 {
    match source {
        Source::TypeSignature => 0.95,
        Source::InlineSignature => 0.90,
        Source::Runtime => 0.85,
        Source::Documentation => 0.80,
        Source::Static => 0.75,
        Source::Inferred => 0.50,
    }
}

/// Score a fact: source base, +0.05 when a location is present, -0.10 when
/// the name is missing or empty, clamped to [0, 1]. Feeds display only;
/// merge precedence uses source identity, not this value.
pub fn compute_confidence(source: Source, has_location: bool, name: &str) -> f64 {
    let mut confidence = base_confidence(source);
    if has_location {
        confidence += 0.05;
    }
    if name.trim().is_empty() {
        confidence -= 0.10;
    }
    confidence.clamp(0.0, 1.0)
}
