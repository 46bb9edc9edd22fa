//! # symgraph
//!
//! Cross-referenced symbol knowledge graphs for AI code analysis.
//!
//! symgraph takes raw, source-tagged symbol facts (classes, modules,
//! methods, calls, mixins) gathered by independent extraction front ends
//! and produces a canonical, deduplicated entity model plus four queryable
//! directed graphs: inheritance, dependency, method-call, and mixin.
//!
//! ## Pipeline
//!
//! facts -> resolution (namespace, inheritance, cross-reference, mixin)
//! -> deduplication (source-precedence merge) -> graph construction
//! -> query surface and JSON persistence.
//!
//! Conflicting facts are reconciled by a deterministic, injectable source
//! precedence policy rather than a claim of universal correctness.

pub mod core;
pub mod graph;
pub mod index;
