pub mod fuzzy;
pub mod query;
pub mod symbol_index;

pub use fuzzy::FuzzyMatch;
pub use query::{CallHop, Hotspot, IndexedResult, Stats};
pub use symbol_index::{SearchOptions, SymbolIndex};
