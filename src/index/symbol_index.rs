use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::entity::{Entity, EntityKind};

/// Search filters compose as a conjunction: a symbol must satisfy the
/// pattern and every filter that is set.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Treat the pattern as a regular expression instead of a literal.
    pub regex: bool,
    /// Literal matching only; regex patterns carry their own flags.
    pub case_sensitive: bool,
    pub kind: Option<EntityKind>,
    pub namespace: Option<String>,
    /// Regular expression applied to the declaring file path.
    pub file_pattern: Option<String>,
}

/// Primary fqname lookup plus secondary indexes by kind, namespace, and
/// declaring file. All four stay consistent through add/update/remove.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    symbols: HashMap<String, Entity>,
    by_kind: HashMap<EntityKind, Vec<String>>,
    by_namespace: HashMap<String, Vec<String>>,
    by_file: HashMap<PathBuf, Vec<String>>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, fqname: &str) -> Option<&Entity> {
        self.symbols.get(fqname)
    }

    pub fn contains(&self, fqname: &str) -> bool {
        self.symbols.contains_key(fqname)
    }

    /// Insert or replace the entry for the entity's fqname.
    pub fn add(&mut self, entity: Entity) {
        let fqname = entity.fqname().to_string();
        self.remove(&fqname);

        self.by_kind
            .entry(entity.kind())
            .or_default()
            .push(fqname.clone());
        self.by_namespace
            .entry(entity.namespace_path().join("::"))
            .or_default()
            .push(fqname.clone());
        if let Some(location) = entity.location() {
            self.by_file
                .entry(location.file.clone())
                .or_default()
                .push(fqname.clone());
        }
        self.symbols.insert(fqname, entity);
    }

    pub fn update(&mut self, entity: Entity) {
        self.add(entity);
    }

    pub fn remove(&mut self, fqname: &str) -> Option<Entity> {
        let entity = self.symbols.remove(fqname)?;

        if let Some(names) = self.by_kind.get_mut(&entity.kind()) {
            names.retain(|n| n != fqname);
        }
        if let Some(names) = self
            .by_namespace
            .get_mut(&entity.namespace_path().join("::"))
        {
            names.retain(|n| n != fqname);
        }
        if let Some(location) = entity.location() {
            if let Some(names) = self.by_file.get_mut(&location.file) {
                names.retain(|n| n != fqname);
            }
        }
        Some(entity)
    }

    /// All entries, ordered by fqname.
    pub fn entities(&self) -> Vec<&Entity> {
        let mut entities: Vec<&Entity> = self.symbols.values().collect();
        entities.sort_by(|a, b| a.fqname().cmp(b.fqname()));
        entities
    }

    pub fn of_kind(&self, kind: EntityKind) -> Vec<&Entity> {
        self.collect_names(self.by_kind.get(&kind))
    }

    pub fn in_namespace(&self, namespace: &str) -> Vec<&Entity> {
        self.collect_names(self.by_namespace.get(namespace))
    }

    pub fn in_file(&self, file: &Path) -> Vec<&Entity> {
        self.collect_names(self.by_file.get(file))
    }

    fn collect_names(&self, names: Option<&Vec<String>>) -> Vec<&Entity> {
        let mut entities: Vec<&Entity> = names
            .map(|names| names.iter().filter_map(|n| self.symbols.get(n)).collect())
            .unwrap_or_default();
        entities.sort_by(|a, b| a.fqname().cmp(b.fqname()));
        entities
    }

    /// Pattern search over simple names and fqnames with AND-composed
    /// filters. Regex compilation problems surface as errors; everything
    /// else degrades to an empty result.
    pub fn search(&self, pattern: &str, options: &SearchOptions) -> Result<Vec<&Entity>> {
        let matcher: Box<dyn Fn(&str) -> bool> = if options.regex {
            let regex = Regex::new(pattern)?;
            Box::new(move |candidate: &str| regex.is_match(candidate))
        } else if options.case_sensitive {
            let needle = pattern.to_string();
            Box::new(move |candidate: &str| candidate.contains(&needle))
        } else {
            let needle = pattern.to_lowercase();
            Box::new(move |candidate: &str| candidate.to_lowercase().contains(&needle))
        };

        let file_regex = match &options.file_pattern {
            Some(pattern) => Some(Regex::new(pattern)?),
            None => None,
        };

        let mut matches: Vec<&Entity> = self
            .symbols
            .values()
            .filter(|entity| matcher(entity.name()) || matcher(entity.fqname()))
            .filter(|entity| options.kind.map_or(true, |kind| entity.kind() == kind))
            .filter(|entity| {
                options
                    .namespace
                    .as_deref()
                    .map_or(true, |ns| entity.namespace_path().join("::") == ns)
            })
            .filter(|entity| match &file_regex {
                None => true,
                Some(regex) => entity
                    .location()
                    .map_or(false, |loc| regex.is_match(&loc.file.to_string_lossy())),
            })
            .collect();

        matches.sort_by(|a, b| a.fqname().cmp(b.fqname()));
        Ok(matches)
    }
}
