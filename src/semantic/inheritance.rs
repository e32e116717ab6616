//! Inheritance Resolver — flattens a definition and its ancestors.
//!
//! Inheritance edges are walked depth-first in source order. Style and var
//! groups overlay by name (the definition's own entries last, so they win);
//! element groups append, inherited children first.
//!
//! Every successful flatten is cached per definition for the rest of the
//! compilation unit. Flattens that exclude an ancestor (`delete @Style X;`)
//! bypass the cache in both directions.

use rustc_hash::{FxHashMap, FxHashSet};

use super::definition::Definition;
use super::diagnostics::DiagnosticCollector;
use super::error::{SemanticError, SemanticResult};
use super::ids::DefId;
use super::resolver::QualifiedNameResolver;
use super::specialize::SpecializationEngine;
use crate::syntax::{Body, Category, GroupKind, PropertyValue, SpecializationOp};

/// Flattens definitions and applies edits on top of the flattened result.
#[derive(Debug, Clone, Default)]
pub struct InheritanceResolver {
    cache: FxHashMap<DefId, SemanticResult<Body>>,
    engine: SpecializationEngine,
    debug: bool,
}

impl InheritanceResolver {
    pub fn new(engine: SpecializationEngine) -> Self {
        Self {
            cache: FxHashMap::default(),
            engine,
            debug: false,
        }
    }

    /// Trace every freshly flattened body at debug level.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn engine(&self) -> SpecializationEngine {
        self.engine
    }

    pub fn is_cached(&self, id: DefId) -> bool {
        self.cache.contains_key(&id)
    }

    /// Forget every cached result. Needed after the store grows by merging
    /// another unit, since names may now resolve differently.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Flatten `id` with all of its ancestors.
    ///
    /// Warnings from edge-level edits go to `warnings`; they are reported the
    /// first time the definition is flattened only.
    pub fn flatten(
        &mut self,
        symbols: &QualifiedNameResolver<'_>,
        id: DefId,
        warnings: &mut DiagnosticCollector,
    ) -> SemanticResult<Body> {
        if let Some(cached) = self.cache.get(&id) {
            tracing::trace!("[INHERIT] cache hit for {}", id);
            return cached.clone();
        }
        let result = self.walk(symbols, id, None, &mut Vec::new(), warnings);
        if result.is_err() {
            self.cache.insert(id, result.clone());
        }
        result
    }

    /// Flatten `id` as if every definition in `excluded` did not exist.
    pub fn flatten_excluding(
        &mut self,
        symbols: &QualifiedNameResolver<'_>,
        id: DefId,
        excluded: &FxHashSet<DefId>,
        warnings: &mut DiagnosticCollector,
    ) -> SemanticResult<Body> {
        if excluded.is_empty() {
            return self.flatten(symbols, id, warnings);
        }
        self.walk(symbols, id, Some(excluded), &mut Vec::new(), warnings)
    }

    /// Flatten `id` and apply `ops` to an owned copy.
    ///
    /// `DeleteInheritance` ops are turned into an exclusion set first; the
    /// remaining ops then run in declaration order.
    pub fn specialize(
        &mut self,
        symbols: &QualifiedNameResolver<'_>,
        id: DefId,
        ops: &[SpecializationOp],
        warnings: &mut DiagnosticCollector,
    ) -> SemanticResult<Body> {
        check_specializable(&symbols.store()[id], ops)?;
        self.contribution(symbols, id, ops, None, &mut Vec::new(), warnings)
    }

    /// Every definition `id` inherits from, directly or transitively.
    /// Unresolvable edges are skipped.
    pub fn ancestors(&self, symbols: &QualifiedNameResolver<'_>, id: DefId) -> Vec<DefId> {
        let store = symbols.store();
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let def = &store[current];
            let scope = symbols.at(def.namespace);
            for edge in def.inherited.iter().rev() {
                if let Ok(parent) = scope.resolve(&edge.target, Category::kind(def.kind())) {
                    if parent != id && seen.insert(parent) {
                        order.push(parent);
                        stack.push(parent);
                    }
                }
            }
        }
        order
    }

    fn walk(
        &mut self,
        symbols: &QualifiedNameResolver<'_>,
        id: DefId,
        exclude: Option<&FxHashSet<DefId>>,
        path: &mut Vec<DefId>,
        warnings: &mut DiagnosticCollector,
    ) -> SemanticResult<Body> {
        let store = symbols.store();
        if exclude.is_none() {
            if let Some(cached) = self.cache.get(&id) {
                return cached.clone();
            }
        }
        if let Some(start) = path.iter().position(|seen| *seen == id) {
            let mut cycle: Vec<String> = path[start..]
                .iter()
                .map(|d| store[*d].identity.to_string())
                .collect();
            cycle.push(store[id].identity.to_string());
            tracing::debug!("[INHERIT] cycle: {}", cycle.join(" -> "));
            return Err(SemanticError::CyclicInheritance { path: cycle });
        }

        path.push(id);
        let result = self.merge(symbols, id, exclude, path, warnings);
        path.pop();

        if let Ok(body) = &result {
            if self.debug {
                tracing::debug!("[INHERIT] flattened {}: {:?}", store[id].identity, body);
            }
            if exclude.is_none() {
                self.cache.insert(id, Ok(body.clone()));
            }
        }
        result
    }

    fn merge(
        &mut self,
        symbols: &QualifiedNameResolver<'_>,
        id: DefId,
        exclude: Option<&FxHashSet<DefId>>,
        path: &mut Vec<DefId>,
        warnings: &mut DiagnosticCollector,
    ) -> SemanticResult<Body> {
        let def = &symbols.store()[id];
        let scope = symbols.at(def.namespace);
        let mut merged = Body::empty(def.kind());

        for edge in &def.inherited {
            let parent = scope.resolve(&edge.target, Category::kind(def.kind()))?;
            // Edits inside a body are the owner's, so the owner must allow them.
            check_specializable(def, &edge.specialization)?;
            if exclude.is_some_and(|excluded| excluded.contains(&parent)) {
                tracing::trace!("[INHERIT] {} skips excluded {}", def.identity, edge.target);
                continue;
            }
            let inherited =
                self.contribution(symbols, parent, &edge.specialization, exclude, path, warnings)?;
            tracing::trace!(
                "[INHERIT] {} <- {} ({:?})",
                def.identity,
                edge.target,
                edge.style
            );
            overlay(&mut merged, inherited, def)?;
        }
        overlay(&mut merged, own_body(def), def)?;
        Ok(merged)
    }

    /// The body `id` contributes after `ops` are applied to it.
    fn contribution(
        &mut self,
        symbols: &QualifiedNameResolver<'_>,
        id: DefId,
        ops: &[SpecializationOp],
        exclude: Option<&FxHashSet<DefId>>,
        path: &mut Vec<DefId>,
        warnings: &mut DiagnosticCollector,
    ) -> SemanticResult<Body> {
        if ops.is_empty() {
            return self.walk(symbols, id, exclude, path, warnings);
        }

        let def = &symbols.store()[id];
        let target = def.identity.to_string();

        let mut excluded: FxHashSet<DefId> = exclude.cloned().unwrap_or_default();
        let deletions: Vec<_> = ops
            .iter()
            .filter_map(|op| match op {
                SpecializationOp::DeleteInheritance(name) => Some(name),
                _ => None,
            })
            .collect();
        if !deletions.is_empty() {
            let ancestors = self.ancestors(symbols, id);
            let scope = symbols.at(def.namespace);
            for name in deletions {
                match scope.resolve(name, Category::kind(def.kind())) {
                    Ok(parent) if ancestors.contains(&parent) => {
                        tracing::debug!("[INHERIT] {} drops {}", target, name);
                        excluded.insert(parent);
                    }
                    _ => warnings.report(
                        SemanticError::DanglingAnchor {
                            anchor: format!("delete {name}"),
                            target: target.clone(),
                        },
                        None,
                    ),
                }
            }
        }

        let base = if excluded.is_empty() {
            self.walk(symbols, id, None, path, warnings)?
        } else {
            self.walk(symbols, id, Some(&excluded), path, warnings)?
        };
        Ok(self.engine.specialize(base, ops, &target, warnings))
    }
}

/// A definition's own body, with its no-value properties as placeholders.
fn own_body(def: &Definition) -> Body {
    let mut body = def.body.clone();
    if let Body::Style(style) = &mut body {
        for name in &def.no_value_properties {
            if !style.contains(name) {
                style
                    .properties
                    .insert(name.clone(), PropertyValue::Placeholder);
            }
        }
    }
    body
}

fn overlay(merged: &mut Body, later: Body, def: &Definition) -> SemanticResult<()> {
    let found = later.kind();
    if merged.overlay(later) {
        Ok(())
    } else {
        Err(SemanticError::KindMismatch {
            name: def.identity.to_string(),
            expected: def.kind().to_string(),
            found: found.to_string(),
        })
    }
}

/// Only customs may carry edits, either at a use-site or inside their body.
/// Templates accept value overrides on var groups and nothing else.
fn check_specializable(def: &Definition, ops: &[SpecializationOp]) -> SemanticResult<()> {
    let allowed = ops.is_empty()
        || def.is_custom()
        || (def.kind() == GroupKind::Var
            && ops
                .iter()
                .all(|op| matches!(op, SpecializationOp::AssignProperty { .. })));
    if allowed {
        Ok(())
    } else {
        Err(SemanticError::InvalidSpecialization {
            target: def.identity.to_string(),
        })
    }
}
