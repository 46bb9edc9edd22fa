use std::collections::HashMap;

use crate::core::entity::{
    ClassEntity, EntitySet, MethodEntity, ModuleEntity, Provenance, Source,
};

/// Total order over fact sources used to pick a primary record when several
/// facts denote the same symbol. Injected per invocation so the policy can
/// be swapped; the default ranks typed signatures above runtime
/// introspection, documentation, structural parses, and inferred facts.
#[derive(Debug, Clone)]
pub struct SourcePrecedence {
    order: Vec<Source>,
}

impl SourcePrecedence {
    /// `order` lists sources from highest precedence to lowest.
    pub fn new(order: Vec<Source>) -> Self {
        Self { order }
    }

    /// Rank of a single source; higher wins. Sources absent from the
    /// configured order rank below everything listed.
    pub fn rank(&self, source: Source) -> usize {
        self.order
            .iter()
            .position(|s| *s == source)
            .map(|pos| self.order.len() - pos)
            .unwrap_or(0)
    }

    /// Rank of the strongest source in a provenance set.
    pub fn best_rank(&self, sources: &[Source]) -> usize {
        sources.iter().map(|&s| self.rank(s)).max().unwrap_or(0)
    }
}

impl Default for SourcePrecedence {
    fn default() -> Self {
        Self::new(vec![
            Source::TypeSignature,
            Source::InlineSignature,
            Source::Runtime,
            Source::Documentation,
            Source::Static,
            Source::Inferred,
        ])
    }
}

/// Collapses duplicate entities (same fqname within a collection) into one
/// canonical record. The primary member keeps its identity and collections;
/// provenance is unioned, method visibility tightens to the most
/// restrictive value, and a class superclass is taken from the
/// best-sourced member that has one. Running twice is a no-op.
pub struct Deduplicator {
    precedence: SourcePrecedence,
}

impl Deduplicator {
    pub fn new(precedence: SourcePrecedence) -> Self {
        Self { precedence }
    }

    pub fn dedup(&self, set: &mut EntitySet) {
        let classes = std::mem::take(&mut set.classes);
        let modules = std::mem::take(&mut set.modules);
        let methods = std::mem::take(&mut set.methods);

        set.classes = group_by_fqname(classes, |c| &c.fqname)
            .into_iter()
            .map(|group| self.merge_classes(group))
            .collect();
        set.modules = group_by_fqname(modules, |m| &m.fqname)
            .into_iter()
            .map(|group| self.merge_modules(group))
            .collect();
        set.methods = group_by_fqname(methods, |m| &m.fqname)
            .into_iter()
            .map(|group| self.merge_methods(group))
            .collect();
    }

    /// Index of the member whose strongest source ranks highest; ties keep
    /// the first occurrence.
    fn primary_index(&self, provenances: &[&Provenance]) -> usize {
        let mut best = 0;
        let mut best_rank = self.precedence.best_rank(&provenances[0].sources);
        for (idx, prov) in provenances.iter().enumerate().skip(1) {
            let rank = self.precedence.best_rank(&prov.sources);
            if rank > best_rank {
                best = idx;
                best_rank = rank;
            }
        }
        best
    }

    fn merged_provenance(group_provenances: &[&Provenance]) -> Provenance {
        let mut merged = group_provenances[0].clone();
        for prov in &group_provenances[1..] {
            merged = merged.merged(prov);
        }
        merged
    }

    fn merge_classes(&self, group: Vec<ClassEntity>) -> ClassEntity {
        if group.len() == 1 {
            return group.into_iter().next().expect("non-empty group");
        }

        let provenances: Vec<&Provenance> = group.iter().map(|c| &c.provenance).collect();
        let primary_idx = self.primary_index(&provenances);
        let provenance = Self::merged_provenance(&provenances);

        // Superclass comes from the best-sourced member that declares one,
        // which is not necessarily the primary.
        let mut superclass: Option<String> = None;
        let mut superclass_rank = 0;
        for class in &group {
            if let Some(parent) = &class.superclass {
                if parent.is_empty() {
                    continue;
                }
                let rank = self.precedence.best_rank(&class.provenance.sources);
                if superclass.is_none() || rank > superclass_rank {
                    superclass = Some(parent.clone());
                    superclass_rank = rank;
                }
            }
        }

        let mut merged = group
            .into_iter()
            .nth(primary_idx)
            .expect("primary index in bounds");
        merged.provenance = provenance;
        if superclass.is_some() {
            merged.superclass = superclass;
        }
        merged
    }

    fn merge_modules(&self, group: Vec<ModuleEntity>) -> ModuleEntity {
        if group.len() == 1 {
            return group.into_iter().next().expect("non-empty group");
        }

        let provenances: Vec<&Provenance> = group.iter().map(|m| &m.provenance).collect();
        let primary_idx = self.primary_index(&provenances);
        let provenance = Self::merged_provenance(&provenances);

        let mut merged = group
            .into_iter()
            .nth(primary_idx)
            .expect("primary index in bounds");
        merged.provenance = provenance;
        merged
    }

    fn merge_methods(&self, group: Vec<MethodEntity>) -> MethodEntity {
        if group.len() == 1 {
            return group.into_iter().next().expect("non-empty group");
        }

        let provenances: Vec<&Provenance> = group.iter().map(|m| &m.provenance).collect();
        let primary_idx = self.primary_index(&provenances);
        let provenance = Self::merged_provenance(&provenances);

        let visibility = group
            .iter()
            .map(|m| m.visibility)
            .max_by_key(|v| v.restrictiveness())
            .expect("non-empty group");

        let mut merged = group
            .into_iter()
            .nth(primary_idx)
            .expect("primary index in bounds");
        merged.provenance = provenance;
        merged.visibility = visibility;
        merged
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(SourcePrecedence::default())
    }
}

/// Split a collection into fqname groups, preserving the first-occurrence
/// order of both groups and members (the tie-break policy depends on it).
fn group_by_fqname<T>(items: Vec<T>, fqname: impl Fn(&T) -> &str) -> Vec<Vec<T>> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<T>> = HashMap::new();
    for item in items {
        let key = fqname(&item).to_string();
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(item);
    }
    order
        .into_iter()
        .map(|key| groups.remove(&key).expect("group recorded"))
        .collect()
}
