//! The per-compilation-unit semantic model.
//!
//! The parser drives the model top to bottom while it walks the source
//! (register definitions, open and close namespaces and scopes, register
//! `except` rules). Once the unit is registered, the generator asks for an
//! instance at every use-site. Every error is recorded in the model's
//! diagnostics as well as returned, so the generator may either use `?` or
//! inspect the full list before deciding to emit.

use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::config::EngineConfig;
use super::constraint::{ConstraintKind, ConstraintRule, ConstraintValidator, RuleScope, UseTarget};
use super::definition::{Definition, DefinitionStore, InheritanceEdge};
use super::diagnostics::{Diagnostic, DiagnosticCollector};
use super::error::{SemanticError, SemanticResult};
use super::ids::{DefId, NamespaceId, ScopeId};
use super::inheritance::InheritanceResolver;
use super::instance::{Instantiator, ResolvedInstance, UseContext};
use super::namespace::{Alias, NamespaceRegistry};
use super::resolver::QualifiedNameResolver;
use super::scope::{ScopeKind, ScopeStack, SymbolRef};
use super::specialize::SpecializationEngine;
use crate::base::Span;
use crate::base::text::is_valid_name;
use crate::syntax::{
    Body, Category, GroupKind, GroupUsage, Identity, NameError, Origin, QualifiedName,
    SpecializationOp, parse_path,
};

/// Where an `except` rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleLevel {
    /// The current scope and every scope nested in it.
    Scope,
    /// The current namespace and every namespace nested in it.
    Global,
}

/// Semantic state of one compilation unit.
#[derive(Debug, Clone)]
pub struct SemanticModel {
    config: EngineConfig,
    scopes: ScopeStack,
    namespaces: NamespaceRegistry,
    store: DefinitionStore,
    inheritance: InheritanceResolver,
    constraints: ConstraintValidator,
    diagnostics: DiagnosticCollector,
    /// Scope of the file-default namespace opened by `begin_unit`.
    unit_scope: Option<ScopeId>,
}

impl Default for SemanticModel {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SemanticModel {
    pub fn new(config: EngineConfig) -> Self {
        let inheritance = Self::inheritance_for(&config);
        Self {
            config,
            scopes: ScopeStack::new(),
            namespaces: NamespaceRegistry::new(),
            store: DefinitionStore::new(),
            inheritance,
            constraints: ConstraintValidator::new(),
            diagnostics: DiagnosticCollector::new(),
            unit_scope: None,
        }
    }

    fn inheritance_for(config: &EngineConfig) -> InheritanceResolver {
        InheritanceResolver::new(SpecializationEngine::new(config.index_initial_count))
            .with_debug(config.debug_mode)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the configuration, e.g. after a `[Configuration]` block.
    ///
    /// Cached flattens are dropped since index bases may have changed.
    pub fn configure(&mut self, config: EngineConfig) {
        tracing::debug!("[MODEL] reconfigured: {:?}", config);
        self.inheritance = Self::inheritance_for(&config);
        self.config = config;
    }

    // ========================================================================
    // REGISTRATION (parse phase)
    // ========================================================================

    /// Start a compilation unit. Unless disabled, opens an implicit
    /// namespace named after the file.
    pub fn begin_unit(&mut self, file_stem: &str) {
        if self.config.disable_default_namespace || file_stem.is_empty() {
            return;
        }
        let ns = self
            .namespaces
            .declare_in(NamespaceId::ROOT, &[SmolStr::new(file_stem)], false);
        self.unit_scope = Some(self.scopes.enter_namespace(ns));
        tracing::debug!("[MODEL] unit '{}' in default namespace", file_stem);
    }

    /// Close the implicit file namespace, and any scope left open inside it.
    pub fn end_unit(&mut self) {
        if let Some(unit) = self.unit_scope.take() {
            while self.scopes.exit() != unit {}
        }
    }

    /// Open `[Namespace] a.b` inside the current namespace.
    pub fn enter_namespace(&mut self, path: &str) -> SemanticResult<NamespaceId> {
        let segments = match parse_path(path.trim()) {
            Ok(segments) => segments,
            Err(e) => return Err(self.record(SemanticError::malformed(path, e), None)),
        };
        Ok(self.enter_namespace_path(&segments))
    }

    /// Open a namespace given as segments.
    pub fn enter_namespace_path(&mut self, path: &[SmolStr]) -> NamespaceId {
        let parent = self.current_namespace();
        let ns = self.namespaces.declare_in(parent, path, true);
        // The outermost segment becomes visible in the enclosing scope; a
        // second block for the same namespace finds it already there.
        if let Some(first) = path.first() {
            let head = self.namespaces.child(parent, first);
            let current = self.scopes.scope(self.scopes.current());
            if let (Some(head), None) = (head, current.get(first)) {
                let _ = self.scopes.define(first.clone(), SymbolRef::Namespace(head));
            }
        }
        self.scopes.enter_namespace(ns);
        ns
    }

    /// Close the innermost `[Namespace]` block.
    ///
    /// # Panics
    ///
    /// Panics when the current scope is not a namespace scope.
    pub fn exit_namespace(&mut self) {
        let kind = self.scopes.scope(self.scopes.current()).kind;
        assert!(
            kind == ScopeKind::Namespace && Some(self.scopes.current()) != self.unit_scope,
            "exit_namespace called outside a [Namespace] block (current scope: {kind:?})"
        );
        self.scopes.exit();
    }

    pub fn enter_scope(&mut self, kind: ScopeKind) -> ScopeId {
        self.scopes.enter(kind)
    }

    /// # Panics
    ///
    /// Panics when the current scope is Global.
    pub fn exit_scope(&mut self) -> ScopeId {
        self.scopes.exit()
    }

    /// Register a `[Template]` group in the current namespace.
    pub fn register_template(
        &mut self,
        identity: Identity,
        body: Body,
        inherited: Vec<InheritanceEdge>,
    ) -> SemanticResult<DefId> {
        let identity = Identity {
            origin: Origin::Template,
            ..identity
        };
        self.register_definition(identity, body, inherited, IndexSet::new(), None)
    }

    /// Register a `[Custom]` group in the current namespace.
    pub fn register_custom(
        &mut self,
        identity: Identity,
        body: Body,
        inherited: Vec<InheritanceEdge>,
        no_value_properties: IndexSet<SmolStr>,
    ) -> SemanticResult<DefId> {
        let identity = Identity {
            origin: Origin::Custom,
            ..identity
        };
        self.register_definition(identity, body, inherited, no_value_properties, None)
    }

    /// Register a definition with its source location.
    pub fn register_definition(
        &mut self,
        identity: Identity,
        body: Body,
        inherited: Vec<InheritanceEdge>,
        no_value_properties: IndexSet<SmolStr>,
        span: Option<Span>,
    ) -> SemanticResult<DefId> {
        if body.kind() != identity.kind {
            let err = SemanticError::KindMismatch {
                name: identity.to_string(),
                expected: identity.kind.to_string(),
                found: body.kind().to_string(),
            };
            return Err(self.record(err, span));
        }

        let namespace = self.current_namespace();
        let scope = self.scopes.current();
        let key = identity.to_string();
        let id = self.store.push(Definition {
            identity,
            namespace,
            scope,
            inherited,
            body,
            no_value_properties,
            span,
        });
        let identity = &self.store[id].identity;
        let registered = self
            .namespaces
            .insert_definition(namespace, identity, id)
            .and_then(|()| self.scopes.define(key, SymbolRef::Definition(id)));
        match registered {
            Ok(()) => Ok(id),
            Err(err) => Err(self.record(err, span)),
        }
    }

    /// Register one `except` item at the current scope or namespace.
    pub fn register_constraint(&mut self, kind: ConstraintKind, level: RuleLevel) {
        self.register_constraint_at(kind, level, None);
    }

    fn register_constraint_at(
        &mut self,
        kind: ConstraintKind,
        level: RuleLevel,
        span: Option<Span>,
    ) {
        let scope = match level {
            RuleLevel::Scope => RuleScope::Scope(self.scopes.current()),
            RuleLevel::Global => RuleScope::Global(self.current_namespace()),
        };
        self.constraints.add(ConstraintRule { kind, scope, span });
    }

    /// Parse and register an `except` clause (`except span, @Html;`).
    pub fn register_except(
        &mut self,
        clause: &str,
        level: RuleLevel,
        span: Option<Span>,
    ) -> SemanticResult<()> {
        match ConstraintKind::parse_clause(clause) {
            Ok(items) => {
                for kind in items {
                    self.register_constraint_at(kind, level, span);
                }
                Ok(())
            }
            Err(e) => Err(self.record(SemanticError::malformed(clause, e), span)),
        }
    }

    /// Register `alias` in the current namespace for the definition `target`
    /// resolves to from here (`[Import] [Custom] @Element Button from ui as Btn`).
    ///
    /// The alias is visible in the current namespace and every namespace
    /// nested in it, and is tried before any definition of the same name.
    pub fn register_alias(
        &mut self,
        alias: &str,
        target: &str,
        span: Option<Span>,
    ) -> SemanticResult<DefId> {
        let result = self.alias_definition(alias, target);
        result.map_err(|err| self.record(err, span))
    }

    /// Register `alias` in the current namespace for the namespace at the
    /// dotted `path`, found the way a qualified name's path is
    /// (`[Import] @Chtl from vendor.ui as Kit`, then `Button from Kit`).
    pub fn register_namespace_alias(
        &mut self,
        alias: &str,
        path: &str,
        span: Option<Span>,
    ) -> SemanticResult<NamespaceId> {
        let result = self.alias_namespace(alias, path);
        result.map_err(|err| self.record(err, span))
    }

    fn alias_definition(&mut self, alias: &str, target: &str) -> SemanticResult<DefId> {
        let namespace = self.current_namespace();
        let name = Self::alias_name(alias)?;
        let id = self.resolver().at(namespace).resolve_token(target, Category::ANY)?;
        self.namespaces
            .insert_alias(namespace, name, Alias::Definition(id))?;
        Ok(id)
    }

    fn alias_namespace(&mut self, alias: &str, path: &str) -> SemanticResult<NamespaceId> {
        let namespace = self.current_namespace();
        let name = Self::alias_name(alias)?;
        let segments = parse_path(path).map_err(|e| SemanticError::malformed(path, e))?;
        let target = self
            .namespaces
            .locate(namespace, &segments)
            .ok_or_else(|| SemanticError::unresolved(path))?;
        self.namespaces
            .insert_alias(namespace, name, Alias::Namespace(target))?;
        Ok(target)
    }

    fn alias_name(alias: &str) -> SemanticResult<SmolStr> {
        if is_valid_name(alias) {
            Ok(SmolStr::new(alias))
        } else {
            Err(SemanticError::malformed(
                alias,
                NameError::InvalidSegment(alias.to_string()),
            ))
        }
    }

    // ========================================================================
    // RESOLUTION (generate phase)
    // ========================================================================

    /// The current scope and namespace, to be stored with a use-site.
    pub fn context(&self) -> UseContext {
        UseContext::new(self.scopes.current(), self.current_namespace())
    }

    fn current_namespace(&self) -> NamespaceId {
        self.scopes.namespace_of(self.scopes.current())
    }

    fn resolver(&self) -> QualifiedNameResolver<'_> {
        QualifiedNameResolver::new(&self.namespaces, &self.store)
            .with_strategy(self.config.conflict_strategy)
    }

    /// Resolve a name token to a definition, honouring `except` rules.
    pub fn resolve_definition(
        &mut self,
        token: &str,
        expected: Category,
        ctx: UseContext,
    ) -> SemanticResult<DefId> {
        let result = QualifiedName::parse(token)
            .map_err(|e| SemanticError::malformed(token, e))
            .and_then(|name| {
                let id = self.resolver().at(ctx.namespace).resolve(&name, expected)?;
                self.constraints.check(
                    &self.scopes,
                    &self.namespaces,
                    ctx.scope,
                    ctx.namespace,
                    UseTarget::Definition(&self.store[id].identity),
                )?;
                Ok(id)
            });
        result.map_err(|err| self.record(err, None))
    }

    /// Resolve a name token to a ready-to-emit instance.
    pub fn resolve(
        &mut self,
        token: &str,
        expected: Category,
        ctx: UseContext,
    ) -> SemanticResult<ResolvedInstance> {
        match QualifiedName::parse(token) {
            Ok(name) => self.instantiate(&name, &[], expected, ctx, None),
            Err(e) => Err(self.record(SemanticError::malformed(token, e), None)),
        }
    }

    /// Like [`resolve`](Self::resolve), but a failed use-site yields an
    /// empty instance. The error is still recorded.
    pub fn resolve_or_empty(
        &mut self,
        token: &str,
        expected: Category,
        ctx: UseContext,
    ) -> ResolvedInstance {
        self.resolve(token, expected, ctx).unwrap_or_else(|_| {
            let kind = QualifiedName::parse(token)
                .ok()
                .and_then(|name| name.kind)
                .or(expected.kind)
                .unwrap_or(GroupKind::Element);
            ResolvedInstance::empty(kind)
        })
    }

    /// Resolve a usage with its specialization block.
    pub fn resolve_usage(
        &mut self,
        usage: &GroupUsage,
        expected: Category,
        ctx: UseContext,
    ) -> SemanticResult<ResolvedInstance> {
        self.instantiate(&usage.name, &usage.specialization, expected, ctx, usage.span)
    }

    /// Resolve `name`, then flatten, specialize and expand it.
    pub fn instantiate(
        &mut self,
        name: &QualifiedName,
        ops: &[SpecializationOp],
        expected: Category,
        ctx: UseContext,
        span: Option<Span>,
    ) -> SemanticResult<ResolvedInstance> {
        let Self {
            config,
            scopes,
            namespaces,
            store,
            inheritance,
            constraints,
            diagnostics,
            ..
        } = self;
        let symbols = QualifiedNameResolver::new(namespaces, store)
            .with_strategy(config.conflict_strategy)
            .with_namespace(ctx.namespace);
        let mut instantiator =
            Instantiator::new(symbols, scopes, constraints, inheritance, diagnostics);

        let result = instantiator.resolve_at(name, expected, ctx).and_then(|id| {
            let body = instantiator.instantiate(id, ops, ctx)?;
            Ok(ResolvedInstance {
                definition: Some(id),
                identity: Some(store[id].identity.clone()),
                body,
            })
        });
        match result {
            Ok(instance) => {
                tracing::trace!("[MODEL] {} resolved", name);
                Ok(instance)
            }
            Err(err) => Err(self.record(err, span)),
        }
    }

    /// Flatten a definition with all its ancestors, without edits.
    ///
    /// An id this model never handed out is an `UnresolvedName`.
    pub fn flatten(&mut self, id: DefId) -> SemanticResult<Body> {
        let Some(span) = self.store.get(id).map(|def| def.span) else {
            return Err(self.record(SemanticError::unresolved(id), None));
        };
        let symbols = QualifiedNameResolver::new(&self.namespaces, &self.store)
            .with_strategy(self.config.conflict_strategy);
        let result = self.inheritance.flatten(&symbols, id, &mut self.diagnostics);
        result.map_err(|err| self.record(err, span))
    }

    /// Check a plain HTML element against the `except` rules at `ctx`.
    pub fn check_element(&mut self, tag: &str, ctx: UseContext) -> SemanticResult<()> {
        let result = self.constraints.check(
            &self.scopes,
            &self.namespaces,
            ctx.scope,
            ctx.namespace,
            UseTarget::Element(tag),
        );
        result.map_err(|err| self.record(err, None))
    }

    /// Look up `ThemeColor(primary)` or, with an override,
    /// `ThemeColor(primary = red)`.
    pub fn resolve_variable(
        &mut self,
        group_token: &str,
        key: &str,
        override_value: Option<&str>,
        ctx: UseContext,
    ) -> SemanticResult<String> {
        let group = match QualifiedName::parse(group_token) {
            Ok(group) => group,
            Err(e) => return Err(self.record(SemanticError::malformed(group_token, e), None)),
        };
        let result = self
            .instantiator()
            .var_value(&group, key, override_value, ctx);
        result.map_err(|err| self.record(err, None))
    }

    /// Substitute every var group reference in `text`, resolved at `ctx`.
    /// References that are not var groups (CSS functions) stay as written.
    pub fn substitute_variables(&mut self, text: &str, ctx: UseContext) -> String {
        let mut instantiator = self.instantiator();
        let owner = instantiator.owner(ctx.namespace);
        instantiator.substitute(text, &owner, ctx)
    }

    fn instantiator(&mut self) -> Instantiator<'_> {
        let symbols = QualifiedNameResolver::new(&self.namespaces, &self.store)
            .with_strategy(self.config.conflict_strategy);
        Instantiator::new(
            symbols,
            &self.scopes,
            &self.constraints,
            &mut self.inheritance,
            &mut self.diagnostics,
        )
    }

    // ========================================================================
    // MERGING
    // ========================================================================

    /// Merge the namespaces and definitions of another unit (an imported
    /// module) under `under_path`. Same-named namespaces merge recursively;
    /// an identity already present in a merged namespace is a
    /// `DuplicateName` and the existing definition wins.
    ///
    /// Namespace-global `except` rules and aliases come along, remapped to
    /// the merged namespaces. Scope rules stay behind since their scopes do
    /// not exist here. The other unit's diagnostics are appended.
    pub fn absorb(&mut self, other: SemanticModel, under_path: &[SmolStr]) {
        let mount = self
            .namespaces
            .declare_in(NamespaceId::ROOT, under_path, false);
        let mapping = self.namespaces.graft(&other.namespaces, mount);
        tracing::debug!(
            "[MODEL] absorbing {} definition(s) under '{}'",
            other.store.len(),
            self.namespaces.display_path(mount)
        );

        let mut moved: FxHashMap<DefId, DefId> = FxHashMap::default();
        for index in 0..other.namespaces.namespace_count() {
            let source = NamespaceId::new(index);
            let target = mapping[index];
            for old in other.namespaces.node(source).definitions() {
                let mut def = other.store[old].clone();
                def.namespace = target;
                def.scope = ScopeId::GLOBAL;
                let span = def.span;
                let identity = def.identity.clone();
                let id = self.store.push(def);
                match self.namespaces.insert_definition(target, &identity, id) {
                    Ok(()) => {
                        moved.insert(old, id);
                    }
                    Err(err) => {
                        // Aliases follow the definition that won.
                        let kept = self.namespaces.node(target).get(
                            identity.origin,
                            identity.kind,
                            &identity.name,
                        );
                        moved.insert(old, kept.unwrap_or(id));
                        self.record(err, span);
                    }
                }
            }
        }

        for index in 0..other.namespaces.namespace_count() {
            let target = mapping[index];
            for (name, alias) in other.namespaces.node(NamespaceId::new(index)).aliases() {
                let alias = match alias {
                    Alias::Definition(old) => match moved.get(&old) {
                        Some(id) => Alias::Definition(*id),
                        None => continue,
                    },
                    Alias::Namespace(ns) => Alias::Namespace(mapping[ns.index()]),
                };
                if let Err(err) = self.namespaces.insert_alias(target, name.clone(), alias) {
                    self.record(err, None);
                }
            }
        }

        for rule in other.constraints.rules() {
            if let RuleScope::Global(ns) = rule.scope {
                self.constraints.add(ConstraintRule {
                    scope: RuleScope::Global(mapping[ns.index()]),
                    ..rule.clone()
                });
            }
        }

        let mut imported = other.diagnostics;
        self.diagnostics.append(&mut imported);
        self.inheritance.clear();
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn definition(&self, id: DefId) -> Option<&Definition> {
        self.store.get(id)
    }

    pub fn definitions(&self) -> impl Iterator<Item = (DefId, &Definition)> {
        self.store.iter()
    }

    /// Find the definition registered under `identity` in the namespace at
    /// `path` (dotted, empty for the root).
    pub fn find(&self, path: &str, identity: &Identity) -> Option<DefId> {
        let ns = self.namespace(path)?;
        self.namespaces
            .node(ns)
            .get(identity.origin, identity.kind, &identity.name)
    }

    /// The namespace at dotted `path` from the root.
    pub fn namespace(&self, path: &str) -> Option<NamespaceId> {
        if path.is_empty() {
            return Some(NamespaceId::ROOT);
        }
        let segments = parse_path(path).ok()?;
        self.namespaces.lookup_path(NamespaceId::ROOT, &segments)
    }

    pub fn namespace_path(&self, id: NamespaceId) -> String {
        self.namespaces.display_path(id)
    }

    /// Every definition of `category` visible from `ctx`; inner namespaces
    /// hide the same identity further out.
    pub fn visible_definitions(&self, ctx: UseContext, category: Category) -> Vec<DefId> {
        self.resolver().at(ctx.namespace).visible(category)
    }

    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    pub fn namespaces(&self) -> &NamespaceRegistry {
        &self.namespaces
    }

    pub fn store(&self) -> &DefinitionStore {
        &self.store
    }

    pub fn constraints(&self) -> &ConstraintValidator {
        &self.constraints
    }

    // ========================================================================
    // DIAGNOSTICS
    // ========================================================================

    /// Every diagnostic recorded so far, in order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.diagnostics()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.errors()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.warnings()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    fn record(&mut self, err: SemanticError, span: Option<Span>) -> SemanticError {
        self.diagnostics.report(err.clone(), span);
        err
    }
}
