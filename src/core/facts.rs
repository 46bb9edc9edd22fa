use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A record-level problem recorded into the result instead of aborting the
/// batch. Front ends may ship their own entries; those pass through
/// untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl EngineError {
    pub fn validation(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            error_type: "validation".to_string(),
            message: message.into(),
            data,
        }
    }
}

/// A reference to a symbol that is absent from the resolved entity set.
/// Not an error; kept queryable for later inspection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissingReference {
    pub symbol: String,
    pub referenced_by: String,
    pub reference_type: String,
}

impl MissingReference {
    pub fn new(
        symbol: impl Into<String>,
        referenced_by: impl Into<String>,
        reference_type: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            referenced_by: referenced_by.into(),
            reference_type: reference_type.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassFact {
    pub symbol_id: Option<String>,
    pub name: String,
    pub namespace_path: Vec<String>,
    pub superclass: Option<String>,
    pub source: Option<String>,
    pub file: Option<PathBuf>,
    pub line: Option<usize>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModuleFact {
    pub symbol_id: Option<String>,
    pub name: String,
    pub namespace_path: Vec<String>,
    pub source: Option<String>,
    pub file: Option<PathBuf>,
    pub line: Option<usize>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParameterFact {
    pub name: String,
    pub kind: Option<String>,
    pub default: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MethodFact {
    pub symbol_id: Option<String>,
    pub name: String,
    pub owner: String,
    pub scope: Option<String>,
    pub visibility: Option<String>,
    pub parameters: Vec<ParameterFact>,
    pub source: Option<String>,
    pub file: Option<PathBuf>,
    pub line: Option<usize>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MethodCallFact {
    pub caller: String,
    pub callee: String,
    pub file: Option<PathBuf>,
    pub line: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MixinFact {
    pub class: String,
    pub module: String,
    pub kind: Option<String>,
}

/// The five named fact collections produced by an extraction front end,
/// plus any errors it already recorded. Missing collections default to
/// empty and extra fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FactSet {
    pub classes: Vec<ClassFact>,
    pub modules: Vec<ModuleFact>,
    pub methods: Vec<MethodFact>,
    pub method_calls: Vec<MethodCallFact>,
    pub mixins: Vec<MixinFact>,
    pub errors: Vec<EngineError>,
}

impl FactSet {
    /// Lenient construction: a document that does not look like a fact set
    /// at all yields empty collections rather than failing.
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(json) {
            Ok(value) => Self::from_value(value),
            Err(_) => Self::default(),
        }
    }

    /// Read one fact document from disk. I/O failures are real errors;
    /// shape problems degrade to an empty set.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content))
    }

    /// Append another fact set, preserving arrival order per collection.
    pub fn merge(&mut self, other: FactSet) {
        self.classes.extend(other.classes);
        self.modules.extend(other.modules);
        self.methods.extend(other.methods);
        self.method_calls.extend(other.method_calls);
        self.mixins.extend(other.mixins);
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.modules.is_empty()
            && self.methods.is_empty()
            && self.method_calls.is_empty()
            && self.mixins.is_empty()
    }
}
