use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::dedup::{Deduplicator, SourcePrecedence};
use crate::core::entity::{
    ClassEntity, EntityKind, EntitySet, Location, MethodEntity, MethodScope, MixinKind, MixinRef,
    ModuleEntity, ParamKind, Parameter, Provenance, Source, Visibility,
};
use crate::core::facts::{
    ClassFact, EngineError, FactSet, MethodCallFact, MethodFact, MissingReference, MixinFact,
    ModuleFact,
};
use crate::core::identity::{compute_confidence, generate_symbol_id};
use crate::core::resolver::ResolutionPipeline;

/// The deduplicated, resolved entity collections handed to downstream
/// consumers, with record-level errors and unresolved references attached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub classes: Vec<ClassEntity>,
    pub modules: Vec<ModuleEntity>,
    pub methods: Vec<MethodEntity>,
    pub method_calls: Vec<MethodCallFact>,
    pub errors: Vec<EngineError>,
    pub missing_references: Vec<MissingReference>,
}

impl NormalizedResult {
    pub fn entity_count(&self) -> usize {
        self.classes.len() + self.modules.len() + self.methods.len()
    }
}

/// Turns raw fact collections into a `NormalizedResult`: entity
/// construction, the four-stage resolution pipeline, deduplication, and a
/// final deterministic ordering. Batch-oriented and single-threaded except
/// for the pure per-record construction maps.
pub struct Normalizer {
    precedence: SourcePrecedence,
}

impl Normalizer {
    pub fn new(precedence: SourcePrecedence) -> Self {
        Self { precedence }
    }

    pub fn normalize(&self, facts: FactSet) -> NormalizedResult {
        let FactSet {
            classes,
            modules,
            methods,
            method_calls,
            mixins,
            errors: front_end_errors,
        } = facts;

        let mut errors = front_end_errors;

        let mut class_entities: Vec<ClassEntity> =
            classes.par_iter().map(build_class).collect();
        let module_entities: Vec<ModuleEntity> =
            modules.par_iter().map(build_module).collect();

        let built_methods: Vec<(MethodEntity, Vec<EngineError>)> =
            methods.par_iter().map(build_method).collect();
        let mut method_entities = Vec::with_capacity(built_methods.len());
        for (entity, mut method_errors) in built_methods {
            method_entities.push(entity);
            errors.append(&mut method_errors);
        }

        let mut missing = Vec::new();
        attach_mixins(&mut class_entities, &mixins, &mut errors, &mut missing);

        let mut set = EntitySet {
            classes: class_entities,
            modules: module_entities,
            methods: method_entities,
        };

        missing.extend(ResolutionPipeline::new().run(&mut set));
        Deduplicator::new(self.precedence.clone()).dedup(&mut set);

        // Deterministic output ordering: differently-ordered input facts
        // produce identical collections.
        finalize_ordering(&mut set);

        missing.sort_by(|a, b| {
            (&a.symbol, &a.referenced_by, &a.reference_type)
                .cmp(&(&b.symbol, &b.referenced_by, &b.reference_type))
        });
        missing.dedup();

        NormalizedResult {
            classes: set.classes,
            modules: set.modules,
            methods: set.methods,
            method_calls,
            errors,
            missing_references: missing,
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(SourcePrecedence::default())
    }
}

/// Sort the entity collections and every set-like grown field so the
/// output is byte-identical across input orderings. Sequence-valued
/// fields (inheritance chains, parameters, mixins) keep their meaning
/// and are left alone.
fn finalize_ordering(set: &mut EntitySet) {
    set.classes
        .sort_by(|a, b| a.fqname.cmp(&b.fqname).then_with(|| a.symbol_id.cmp(&b.symbol_id)));
    set.modules
        .sort_by(|a, b| a.fqname.cmp(&b.fqname).then_with(|| a.symbol_id.cmp(&b.symbol_id)));
    set.methods
        .sort_by(|a, b| a.fqname.cmp(&b.fqname).then_with(|| a.symbol_id.cmp(&b.symbol_id)));

    for class in &mut set.classes {
        class.children.sort();
        class.instance_methods.sort();
        class.class_methods.sort();
        class.available_instance_methods.sort();
        class.available_class_methods.sort();
        class.provenance.sources.sort();
    }
    for module in &mut set.modules {
        module.children.sort();
        module.instance_methods.sort();
        module.class_methods.sort();
        module.provenance.sources.sort();
    }
    for method in &mut set.methods {
        method.available_in.sort();
        method.provenance.sources.sort();
    }
}

fn provenance_for(source: Option<&str>, has_location: bool, name: &str, timestamp: u64) -> Provenance {
    let source = source.map(Source::parse).unwrap_or(Source::Inferred);
    let confidence = compute_confidence(source, has_location, name);
    Provenance::new(source, confidence, timestamp)
}

fn location_for(file: Option<&std::path::PathBuf>, line: Option<usize>) -> Option<Location> {
    file.map(|f| Location::new(f.clone(), line.unwrap_or(0)))
}

fn build_class(fact: &ClassFact) -> ClassEntity {
    let symbol_id = fact
        .symbol_id
        .clone()
        .unwrap_or_else(|| generate_symbol_id(EntityKind::Class, &fact.name));
    let provenance = provenance_for(
        fact.source.as_deref(),
        fact.file.is_some(),
        &fact.name,
        fact.timestamp,
    );

    let mut class = ClassEntity::new(symbol_id, fact.name.clone(), fact.namespace_path.clone())
        .with_provenance(provenance);
    if let Some(location) = location_for(fact.file.as_ref(), fact.line) {
        class = class.with_location(location);
    }
    if let Some(superclass) = &fact.superclass {
        if !superclass.is_empty() {
            class = class.with_superclass(superclass.clone());
        }
    }
    class
}

fn build_module(fact: &ModuleFact) -> ModuleEntity {
    let symbol_id = fact
        .symbol_id
        .clone()
        .unwrap_or_else(|| generate_symbol_id(EntityKind::Module, &fact.name));
    let provenance = provenance_for(
        fact.source.as_deref(),
        fact.file.is_some(),
        &fact.name,
        fact.timestamp,
    );

    let mut module = ModuleEntity::new(symbol_id, fact.name.clone(), fact.namespace_path.clone())
        .with_provenance(provenance);
    if let Some(location) = location_for(fact.file.as_ref(), fact.line) {
        module = module.with_location(location);
    }
    module
}

fn build_method(fact: &MethodFact) -> (MethodEntity, Vec<EngineError>) {
    let mut errors = Vec::new();

    let symbol_id = fact
        .symbol_id
        .clone()
        .unwrap_or_else(|| generate_symbol_id(EntityKind::Method, &fact.name));
    let provenance = provenance_for(
        fact.source.as_deref(),
        fact.file.is_some(),
        &fact.name,
        fact.timestamp,
    );

    // Unrecognized enum-like fields are recorded and coerced to a safe
    // default; missing ones default silently.
    let scope = match fact.scope.as_deref() {
        None => MethodScope::Instance,
        Some(value) => MethodScope::parse(value).unwrap_or_else(|| {
            errors.push(EngineError::validation(
                format!("unrecognized method scope '{value}'"),
                json!({ "field": "scope", "value": value, "method": fact.name }),
            ));
            MethodScope::Instance
        }),
    };
    let visibility = match fact.visibility.as_deref() {
        None => Visibility::Public,
        Some(value) => Visibility::parse(value).unwrap_or_else(|| {
            errors.push(EngineError::validation(
                format!("unrecognized visibility '{value}'"),
                json!({ "field": "visibility", "value": value, "method": fact.name }),
            ));
            Visibility::Public
        }),
    };

    let parameters: Vec<Parameter> = fact
        .parameters
        .iter()
        .map(|p| {
            let kind = match p.kind.as_deref() {
                None => ParamKind::Required,
                Some(value) => ParamKind::parse(value).unwrap_or_else(|| {
                    errors.push(EngineError::validation(
                        format!("unrecognized parameter kind '{value}'"),
                        json!({ "field": "kind", "value": value, "parameter": p.name }),
                    ));
                    ParamKind::Required
                }),
            };
            Parameter {
                name: p.name.clone(),
                kind,
                default: p.default.clone(),
            }
        })
        .collect();

    let mut method = MethodEntity::new(symbol_id, fact.name.clone(), fact.owner.clone())
        .with_provenance(provenance)
        .with_parameters(parameters);
    method.scope = scope;
    method.visibility = visibility;
    if let Some(location) = location_for(fact.file.as_ref(), fact.line) {
        method = method.with_location(location);
    }
    (method, errors)
}

/// Attach mixin facts to every matching class record (duplicates are merged
/// later, so all members must carry the relationship). Unknown target
/// classes become missing references, unknown kinds validation errors.
fn attach_mixins(
    classes: &mut [ClassEntity],
    mixins: &[MixinFact],
    errors: &mut Vec<EngineError>,
    missing: &mut Vec<MissingReference>,
) {
    for fact in mixins {
        let kind = match fact.kind.as_deref() {
            None => MixinKind::Include,
            Some(value) => MixinKind::parse(value).unwrap_or_else(|| {
                errors.push(EngineError::validation(
                    format!("unrecognized mixin kind '{value}'"),
                    json!({ "field": "kind", "value": value, "class": fact.class }),
                ));
                MixinKind::Include
            }),
        };

        let mut attached = false;
        for class in classes.iter_mut() {
            if class.fqname == fact.class {
                let mixin = MixinRef {
                    kind,
                    module_fqname: fact.module.clone(),
                };
                if !class.mixins.contains(&mixin) {
                    class.mixins.push(mixin);
                }
                attached = true;
            }
        }
        if !attached {
            missing.push(MissingReference::new(
                &fact.class,
                &fact.module,
                "mixin_target",
            ));
        }
    }
}
