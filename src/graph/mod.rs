mod algorithms;
mod engine;

pub use engine::{EdgeKind, EdgeRecord, GraphKind, SymbolGraph};
