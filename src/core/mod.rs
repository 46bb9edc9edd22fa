pub mod dedup;
pub mod entity;
pub mod facts;
pub mod identity;
pub mod normalizer;
pub mod resolver;

pub use dedup::{Deduplicator, SourcePrecedence};
pub use entity::{
    ClassEntity, Entity, EntityKind, EntitySet, Location, MethodEntity, MethodScope, MixinKind,
    MixinRef, ModuleEntity, ParamKind, Parameter, Provenance, Source, Visibility,
};
pub use facts::{EngineError, FactSet, MissingReference};
pub use normalizer::{NormalizedResult, Normalizer};
pub use resolver::ResolutionPipeline;
