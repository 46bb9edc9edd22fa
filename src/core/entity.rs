use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Class,
    Module,
    Method,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Class => "class",
            EntityKind::Module => "module",
            EntityKind::Method => "method",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin of a fact about a symbol. Tags that are not recognized are
/// treated as `Inferred`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    TypeSignature,
    InlineSignature,
    Runtime,
    Documentation,
    Static,
    Inferred,
}

impl Source {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "type_signature" => Source::TypeSignature,
            "inline_signature" => Source::InlineSignature,
            "runtime" => Source::Runtime,
            "documentation" => Source::Documentation,
            "static" => Source::Static,
            _ => Source::Inferred,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Source::TypeSignature => "type_signature",
            Source::InlineSignature => "inline_signature",
            Source::Runtime => "runtime",
            Source::Documentation => "documentation",
            Source::Static => "static",
            Source::Inferred => "inferred",
        }
    }
}

/// Where a symbol was declared. Facts without position information simply
/// omit this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
}

impl Location {
    pub fn new(file: PathBuf, line: usize) -> Self {
        Self { file, line }
    }
}

/// Origin set and derived confidence for a fact. Merging never mutates
/// either side; it produces a fresh value combining the source sets and
/// keeping the higher confidence and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provenance {
    pub sources: Vec<Source>,
    pub confidence: f64,
    pub timestamp: u64,
}

impl Provenance {
    pub fn new(source: Source, confidence: f64, timestamp: u64) -> Self {
        Self {
            sources: vec![source],
            confidence,
            timestamp,
        }
    }

    pub fn merged(&self, other: &Provenance) -> Provenance {
        let mut sources = self.sources.clone();
        for source in &other.sources {
            if !sources.contains(source) {
                sources.push(*source);
            }
        }
        Provenance {
            sources,
            confidence: self.confidence.max(other.confidence),
            timestamp: self.timestamp.max(other.timestamp),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }

    /// Higher rank means more restrictive: private > protected > public.
    pub fn restrictiveness(self) -> u8 {
        match self {
            Visibility::Public => 0,
            Visibility::Protected => 1,
            Visibility::Private => 2,
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MethodScope {
    Instance,
    Class,
}

impl MethodScope {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "instance" => Some(MethodScope::Instance),
            "class" => Some(MethodScope::Class),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Required,
    Optional,
    Rest,
    Keyword,
    KeywordRest,
    Block,
}

impl ParamKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "required" => Some(ParamKind::Required),
            "optional" => Some(ParamKind::Optional),
            "rest" => Some(ParamKind::Rest),
            "keyword" => Some(ParamKind::Keyword),
            "keyword_rest" => Some(ParamKind::KeywordRest),
            "block" => Some(ParamKind::Block),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<String>,
}

/// Signed arity: non-negative is an exact count, negative means at least
/// `-(n + 1)` required arguments. Block parameters never count.
pub fn arity_of(parameters: &[Parameter]) -> i32 {
    let required = parameters
        .iter()
        .filter(|p| p.kind == ParamKind::Required)
        .count() as i32;
    let variadic = parameters.iter().any(|p| {
        matches!(
            p.kind,
            ParamKind::Optional | ParamKind::Rest | ParamKind::Keyword | ParamKind::KeywordRest
        )
    });
    if variadic {
        -(required + 1)
    } else {
        required
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MixinKind {
    Include,
    Extend,
    Prepend,
}

impl MixinKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "include" => Some(MixinKind::Include),
            "extend" => Some(MixinKind::Extend),
            "prepend" => Some(MixinKind::Prepend),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MixinRef {
    pub kind: MixinKind,
    pub module_fqname: String,
}

/// Join a namespace path and a simple name into a fully qualified name.
/// `fqname` is always recomputed from these two, never stored inconsistently.
pub fn compose_fqname(namespace_path: &[String], name: &str) -> String {
    if namespace_path.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", namespace_path.join("::"), name)
    }
}

/// The fqname of the enclosing namespace, or `None` at the top level.
pub fn parent_fqname(namespace_path: &[String]) -> Option<String> {
    if namespace_path.is_empty() {
        None
    } else {
        Some(namespace_path.join("::"))
    }
}

pub(crate) fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassEntity {
    pub symbol_id: String,
    pub name: String,
    pub namespace_path: Vec<String>,
    pub fqname: String,
    pub location: Option<Location>,
    pub provenance: Provenance,
    pub superclass: Option<String>,
    pub inheritance_chain: Vec<String>,
    pub children: Vec<String>,
    pub instance_methods: Vec<String>,
    pub class_methods: Vec<String>,
    pub available_instance_methods: Vec<String>,
    pub available_class_methods: Vec<String>,
    pub mixins: Vec<MixinRef>,
}

impl ClassEntity {
    pub fn new(symbol_id: String, name: String, namespace_path: Vec<String>) -> Self {
        let fqname = compose_fqname(&namespace_path, &name);
        Self {
            symbol_id,
            name,
            namespace_path,
            fqname,
            location: None,
            provenance: Provenance::new(Source::Inferred, 0.5, 0),
            superclass: None,
            inheritance_chain: Vec::new(),
            children: Vec::new(),
            instance_methods: Vec::new(),
            class_methods: Vec::new(),
            available_instance_methods: Vec::new(),
            available_class_methods: Vec::new(),
            mixins: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn with_superclass(mut self, superclass: String) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn add_child(&mut self, fqname: &str) {
        push_unique(&mut self.children, fqname);
    }

    pub fn add_available_method(&mut self, scope: MethodScope, name: &str) {
        match scope {
            MethodScope::Instance => push_unique(&mut self.available_instance_methods, name),
            MethodScope::Class => push_unique(&mut self.available_class_methods, name),
        }
    }

    pub fn add_owned_method(&mut self, scope: MethodScope, name: &str) {
        match scope {
            MethodScope::Instance => push_unique(&mut self.instance_methods, name),
            MethodScope::Class => push_unique(&mut self.class_methods, name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleEntity {
    pub symbol_id: String,
    pub name: String,
    pub namespace_path: Vec<String>,
    pub fqname: String,
    pub location: Option<Location>,
    pub provenance: Provenance,
    pub children: Vec<String>,
    pub instance_methods: Vec<String>,
    pub class_methods: Vec<String>,
}

impl ModuleEntity {
    pub fn new(symbol_id: String, name: String, namespace_path: Vec<String>) -> Self {
        let fqname = compose_fqname(&namespace_path, &name);
        Self {
            symbol_id,
            name,
            namespace_path,
            fqname,
            location: None,
            provenance: Provenance::new(Source::Inferred, 0.5, 0),
            children: Vec::new(),
            instance_methods: Vec::new(),
            class_methods: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn add_child(&mut self, fqname: &str) {
        push_unique(&mut self.children, fqname);
    }

    pub fn add_owned_method(&mut self, scope: MethodScope, name: &str) {
        match scope {
            MethodScope::Instance => push_unique(&mut self.instance_methods, name),
            MethodScope::Class => push_unique(&mut self.class_methods, name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MethodEntity {
    pub symbol_id: String,
    pub name: String,
    pub namespace_path: Vec<String>,
    pub fqname: String,
    pub location: Option<Location>,
    pub provenance: Provenance,
    pub owner: String,
    pub scope: MethodScope,
    pub visibility: Visibility,
    pub parameters: Vec<Parameter>,
    pub arity: i32,
    pub available_in: Vec<String>,
}

impl MethodEntity {
    pub fn new(symbol_id: String, name: String, owner: String) -> Self {
        let namespace_path: Vec<String> = if owner.is_empty() {
            Vec::new()
        } else {
            owner.split("::").map(str::to_string).collect()
        };
        let fqname = compose_fqname(&namespace_path, &name);
        Self {
            symbol_id,
            name,
            namespace_path,
            fqname,
            location: None,
            provenance: Provenance::new(Source::Inferred, 0.5, 0),
            owner,
            scope: MethodScope::Instance,
            visibility: Visibility::Public,
            parameters: Vec::new(),
            arity: 0,
            available_in: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.arity = arity_of(&parameters);
        self.parameters = parameters;
        self
    }

    pub fn add_available_in(&mut self, fqname: &str) {
        push_unique(&mut self.available_in, fqname);
    }
}

/// The working collections the pipeline resolves and deduplicates.
/// Entities are created once, mutated in place during resolution, and
/// merged down to one canonical record per fqname afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntitySet {
    pub classes: Vec<ClassEntity>,
    pub modules: Vec<ModuleEntity>,
    pub methods: Vec<MethodEntity>,
}

impl EntitySet {
    pub fn len(&self) -> usize {
        self.classes.len() + self.modules.len() + self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.modules.is_empty() && self.methods.is_empty()
    }
}

/// A normalized record for a class, module, or method. Closed set of
/// variants; every consumer matches exhaustively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Class(ClassEntity),
    Module(ModuleEntity),
    Method(MethodEntity),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Class(_) => EntityKind::Class,
            Entity::Module(_) => EntityKind::Module,
            Entity::Method(_) => EntityKind::Method,
        }
    }

    pub fn symbol_id(&self) -> &str {
        match self {
            Entity::Class(c) => &c.symbol_id,
            Entity::Module(m) => &m.symbol_id,
            Entity::Method(m) => &m.symbol_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Class(c) => &c.name,
            Entity::Module(m) => &m.name,
            Entity::Method(m) => &m.name,
        }
    }

    pub fn fqname(&self) -> &str {
        match self {
            Entity::Class(c) => &c.fqname,
            Entity::Module(m) => &m.fqname,
            Entity::Method(m) => &m.fqname,
        }
    }

    pub fn namespace_path(&self) -> &[String] {
        match self {
            Entity::Class(c) => &c.namespace_path,
            Entity::Module(m) => &m.namespace_path,
            Entity::Method(m) => &m.namespace_path,
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            Entity::Class(c) => c.location.as_ref(),
            Entity::Module(m) => m.location.as_ref(),
            Entity::Method(m) => m.location.as_ref(),
        }
    }

    pub fn provenance(&self) -> &Provenance {
        match self {
            Entity::Class(c) => &c.provenance,
            Entity::Module(m) => &m.provenance,
            Entity::Method(m) => &m.provenance,
        }
    }
}
