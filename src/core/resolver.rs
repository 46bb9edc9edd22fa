use std::collections::{HashMap, HashSet};

use crate::core::entity::{parent_fqname, EntityKind, EntitySet, MethodScope, MixinKind};
use crate::core::facts::MissingReference;

/// Runs the four resolvers in their fixed dependency order over an entity
/// set. Every pass assumes all entities already exist (possibly still
/// duplicated) and grows fields in place; nothing here aborts the batch.
/// Unresolvable references are skipped and reported as missing references.
pub struct ResolutionPipeline;

impl ResolutionPipeline {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, set: &mut EntitySet) -> Vec<MissingReference> {
        let mut missing = Vec::new();
        Self::resolve_namespaces(set);
        Self::resolve_inheritance(set, &mut missing);
        Self::resolve_cross_references(set, &mut missing);
        Self::resolve_mixins(set, &mut missing);
        missing
    }

    fn class_index(set: &EntitySet) -> HashMap<String, usize> {
        set.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.fqname.clone(), i))
            .collect()
    }

    fn module_index(set: &EntitySet) -> HashMap<String, usize> {
        set.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (m.fqname.clone(), i))
            .collect()
    }

    /// Attach every nested class/module to the `children` list of its
    /// enclosing namespace, when that namespace is a known entity.
    /// Idempotent; methods are tracked through ownership, not nesting.
    fn resolve_namespaces(set: &mut EntitySet) {
        let classes = Self::class_index(set);
        let modules = Self::module_index(set);

        let mut links: Vec<(String, String)> = Vec::new();
        for class in &set.classes {
            if let Some(parent) = parent_fqname(&class.namespace_path) {
                links.push((parent, class.fqname.clone()));
            }
        }
        for module in &set.modules {
            if let Some(parent) = parent_fqname(&module.namespace_path) {
                links.push((parent, module.fqname.clone()));
            }
        }

        for (parent, child) in links {
            if let Some(&idx) = classes.get(&parent) {
                set.classes[idx].add_child(&child);
            } else if let Some(&idx) = modules.get(&parent) {
                set.modules[idx].add_child(&child);
            }
        }
    }

    /// Walk superclass pointers into an ancestry chain starting at the
    /// class itself. The walk stops at an empty or unknown superclass (the
    /// chain then ends at the last resolvable ancestor) and on revisiting a
    /// name, so superclass cycles terminate.
    fn resolve_inheritance(set: &mut EntitySet, missing: &mut Vec<MissingReference>) {
        let classes = Self::class_index(set);
        let superclass_of: HashMap<String, Option<String>> = set
            .classes
            .iter()
            .map(|c| (c.fqname.clone(), c.superclass.clone()))
            .collect();

        for class in &mut set.classes {
            let mut chain = vec![class.fqname.clone()];
            let mut visited: HashSet<String> = HashSet::new();
            visited.insert(class.fqname.clone());

            let mut current = class.superclass.clone();
            while let Some(parent) = current {
                if parent.is_empty() || visited.contains(&parent) || !classes.contains_key(&parent)
                {
                    break;
                }
                visited.insert(parent.clone());
                chain.push(parent.clone());
                current = superclass_of.get(&parent).cloned().flatten();
            }
            class.inheritance_chain = chain;
        }

        for class in &set.classes {
            if let Some(parent) = &class.superclass {
                if !parent.is_empty() && !classes.contains_key(parent) {
                    missing.push(MissingReference::new(parent, &class.fqname, "superclass"));
                }
            }
        }
    }

    /// Register each method with its owning type, then propagate the name
    /// down every class whose ancestry contains that owner. Methods whose
    /// owner does not resolve are left unpropagated.
    fn resolve_cross_references(set: &mut EntitySet, missing: &mut Vec<MissingReference>) {
        let classes = Self::class_index(set);
        let modules = Self::module_index(set);

        // Reverse index: chain member fqname -> classes that inherit it.
        let mut inheritors: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, class) in set.classes.iter().enumerate() {
            for ancestor in &class.inheritance_chain {
                inheritors.entry(ancestor.clone()).or_default().push(idx);
            }
        }

        for m_idx in 0..set.methods.len() {
            let (owner, name, scope, method_fqname) = {
                let method = &set.methods[m_idx];
                (
                    method.owner.clone(),
                    method.name.clone(),
                    method.scope,
                    method.fqname.clone(),
                )
            };

            let owner_kind = if classes.contains_key(&owner) {
                EntityKind::Class
            } else if modules.contains_key(&owner) {
                EntityKind::Module
            } else {
                missing.push(MissingReference::new(&owner, &method_fqname, "owner"));
                continue;
            };

            match owner_kind {
                EntityKind::Class => {
                    set.classes[classes[&owner]].add_owned_method(scope, &name);
                }
                EntityKind::Module => {
                    set.modules[modules[&owner]].add_owned_method(scope, &name);
                }
                EntityKind::Method => unreachable!("methods never own methods"),
            }

            if let Some(class_indices) = inheritors.get(&owner) {
                let targets: Vec<String> = class_indices
                    .iter()
                    .map(|&idx| set.classes[idx].fqname.clone())
                    .collect();
                for &idx in class_indices {
                    set.classes[idx].add_available_method(scope, &name);
                }
                for target in &targets {
                    set.methods[m_idx].add_available_in(target);
                }
            }
        }
    }

    /// Propagate module-owned methods onto classes through their mixins.
    /// `include` keeps instance methods on instance scope and class methods
    /// on class scope; `extend` always lands on class scope. `prepend`
    /// stays a graph-level relationship and does not alter availability.
    fn resolve_mixins(set: &mut EntitySet, missing: &mut Vec<MissingReference>) {
        let modules = Self::module_index(set);

        let mut methods_by_owner: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, method) in set.methods.iter().enumerate() {
            methods_by_owner
                .entry(method.owner.clone())
                .or_default()
                .push(idx);
        }

        for c_idx in 0..set.classes.len() {
            let class_fqname = set.classes[c_idx].fqname.clone();
            let mixins = set.classes[c_idx].mixins.clone();

            for mixin in mixins {
                if !modules.contains_key(&mixin.module_fqname) {
                    missing.push(MissingReference::new(
                        &mixin.module_fqname,
                        &class_fqname,
                        "mixin",
                    ));
                    continue;
                }
                if mixin.kind == MixinKind::Prepend {
                    continue;
                }

                let module_methods = methods_by_owner
                    .get(&mixin.module_fqname)
                    .cloned()
                    .unwrap_or_default();

                for m_idx in module_methods {
                    let (name, scope) = {
                        let method = &set.methods[m_idx];
                        (method.name.clone(), method.scope)
                    };
                    let target_scope = match (mixin.kind, scope) {
                        (MixinKind::Include, MethodScope::Instance) => MethodScope::Instance,
                        (MixinKind::Include, MethodScope::Class) => MethodScope::Class,
                        (MixinKind::Extend, _) => MethodScope::Class,
                        (MixinKind::Prepend, _) => continue,
                    };
                    set.classes[c_idx].add_available_method(target_scope, &name);
                    set.methods[m_idx].add_available_in(&class_fqname);
                }
            }
        }
    }
}

impl Default for ResolutionPipeline {
    fn default() -> Self {
        Self::new()
    }
}
