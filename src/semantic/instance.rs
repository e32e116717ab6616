//! Resolved instances and nested usage expansion.
//!
//! An instance is what the generator emits for one use-site: the flattened,
//! specialized body with every nested `@Element X;` / `@Style X;` usage
//! inlined and every var reference substituted. It owns all of its content.

use super::constraint::{ConstraintValidator, UseTarget};
use super::diagnostics::DiagnosticCollector;
use super::error::{SemanticError, SemanticResult};
use super::ids::{DefId, NamespaceId, ScopeId};
use super::inheritance::InheritanceResolver;
use super::resolver::QualifiedNameResolver;
use super::scope::ScopeStack;
use super::variables;
use crate::syntax::{
    Body, Category, ElementNode, GroupKind, GroupUsage, Identity, Node, PropertyValue,
    QualifiedName, SpecializationOp, StyleEntry,
};

/// Where a use-site sits: its lexical scope and its namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UseContext {
    pub scope: ScopeId,
    pub namespace: NamespaceId,
}

impl UseContext {
    pub fn new(scope: ScopeId, namespace: NamespaceId) -> Self {
        Self { scope, namespace }
    }

    /// The global scope of the root namespace.
    pub fn global() -> Self {
        Self::new(ScopeId::GLOBAL, NamespaceId::ROOT)
    }
}

/// A ready-to-emit instance produced for one use-site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstance {
    /// The definition it was built from. `None` for the empty stand-in
    /// returned when resolution failed.
    pub definition: Option<DefId>,
    pub identity: Option<Identity>,
    pub body: Body,
}

impl ResolvedInstance {
    /// An instance with no content, used in place of a failed use-site.
    pub fn empty(kind: GroupKind) -> Self {
        Self {
            definition: None,
            identity: None,
            body: Body::empty(kind),
        }
    }

    pub fn kind(&self) -> GroupKind {
        self.body.kind()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Expands one use-site, recursing into nested usages.
pub(crate) struct Instantiator<'m> {
    symbols: QualifiedNameResolver<'m>,
    scopes: &'m ScopeStack,
    constraints: &'m ConstraintValidator,
    inheritance: &'m mut InheritanceResolver,
    diagnostics: &'m mut DiagnosticCollector,
    /// Definitions currently being expanded, outermost first.
    expanding: Vec<DefId>,
}

impl<'m> Instantiator<'m> {
    pub(crate) fn new(
        symbols: QualifiedNameResolver<'m>,
        scopes: &'m ScopeStack,
        constraints: &'m ConstraintValidator,
        inheritance: &'m mut InheritanceResolver,
        diagnostics: &'m mut DiagnosticCollector,
    ) -> Self {
        Self {
            symbols,
            scopes,
            constraints,
            inheritance,
            diagnostics,
            expanding: Vec::new(),
        }
    }

    /// Resolve `name` at `site` and check it against the `except` rules.
    pub(crate) fn resolve_at(
        &self,
        name: &QualifiedName,
        expected: Category,
        site: UseContext,
    ) -> SemanticResult<DefId> {
        let id = self.symbols.at(site.namespace).resolve(name, expected)?;
        self.check_definition(id, site)?;
        Ok(id)
    }

    fn check_definition(&self, id: DefId, site: UseContext) -> SemanticResult<()> {
        let identity = &self.symbols.store()[id].identity;
        self.constraints.check(
            self.scopes,
            self.symbols.namespaces(),
            site.scope,
            site.namespace,
            UseTarget::Definition(identity),
        )
    }

    /// Build the instance body of `id` with `ops` applied.
    pub(crate) fn instantiate(
        &mut self,
        id: DefId,
        ops: &[SpecializationOp],
        site: UseContext,
    ) -> SemanticResult<Body> {
        let store = self.symbols.store();
        if let Some(start) = self.expanding.iter().position(|seen| *seen == id) {
            let mut path: Vec<String> = self.expanding[start..]
                .iter()
                .map(|d| store[*d].identity.to_string())
                .collect();
            path.push(store[id].identity.to_string());
            return Err(SemanticError::CyclicInheritance { path });
        }
        self.expanding.push(id);
        let result = self.build(id, ops, site);
        self.expanding.pop();
        result
    }

    fn build(
        &mut self,
        id: DefId,
        ops: &[SpecializationOp],
        site: UseContext,
    ) -> SemanticResult<Body> {
        let def = &self.symbols.store()[id];
        let target = def.identity.to_string();
        let mut body = self
            .inheritance
            .specialize(&self.symbols, id, ops, self.diagnostics)?;
        self.inheritance
            .engine()
            .finish(&mut body, &target, self.diagnostics);

        // Names inside a body resolve where the definition was written.
        let owner = self.symbols.at(def.namespace);
        match &mut body {
            Body::Element(element) => {
                self.check_tags(&element.nodes, site)?;
                let nodes = std::mem::take(&mut element.nodes);
                element.nodes = self.expand_nodes(nodes, &owner, site);
            }
            Body::Style(style) => {
                for value in style.properties.values_mut() {
                    if let PropertyValue::Value(text) = value {
                        *text = self.substitute(text, &owner, site);
                    }
                }
            }
            Body::Var(_) => {}
        }
        Ok(body)
    }

    /// Check every element of `nodes`, children included. Nested usages are
    /// checked when they are expanded.
    fn check_tags(&self, nodes: &[Node], site: UseContext) -> SemanticResult<()> {
        for node in nodes {
            if let Node::Element(element) = node {
                self.constraints.check(
                    self.scopes,
                    self.symbols.namespaces(),
                    site.scope,
                    site.namespace,
                    UseTarget::Element(&element.tag),
                )?;
                self.check_tags(&element.children, site)?;
            }
        }
        Ok(())
    }

    fn expand_nodes(
        &mut self,
        nodes: Vec<Node>,
        owner: &QualifiedNameResolver<'m>,
        site: UseContext,
    ) -> Vec<Node> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Text(_) => out.push(node),
                Node::Element(mut element) => {
                    self.expand_element(&mut element, owner, site);
                    out.push(Node::Element(element));
                }
                Node::Usage(usage) => {
                    if let Some(Body::Element(inlined)) =
                        self.nested(&usage, GroupKind::Element, owner, site)
                    {
                        out.extend(inlined.nodes);
                    }
                }
            }
        }
        out
    }

    fn expand_element(
        &mut self,
        element: &mut ElementNode,
        owner: &QualifiedNameResolver<'m>,
        site: UseContext,
    ) {
        for entry in std::mem::take(&mut element.style) {
            match entry {
                StyleEntry::Property { name, value } => {
                    let value = self.substitute(&value, owner, site);
                    element.set_style(name, value);
                }
                StyleEntry::Usage(usage) => {
                    if let Some(Body::Style(style)) =
                        self.nested(&usage, GroupKind::Style, owner, site)
                    {
                        for (name, value) in style.properties {
                            if let PropertyValue::Value(value) = value {
                                element.set_style(name, value);
                            }
                        }
                    }
                }
            }
        }
        let children = std::mem::take(&mut element.children);
        element.children = self.expand_nodes(children, owner, site);
    }

    /// Expand a nested usage. Failures are recorded against the usage and
    /// the usage is dropped.
    fn nested(
        &mut self,
        usage: &GroupUsage,
        kind: GroupKind,
        owner: &QualifiedNameResolver<'m>,
        site: UseContext,
    ) -> Option<Body> {
        let result = owner
            .resolve(&usage.name, Category::kind(kind))
            .and_then(|id| {
                self.check_definition(id, site)?;
                self.instantiate(id, &usage.specialization, site)
            });
        match result {
            Ok(body) => Some(body),
            Err(err) => {
                self.diagnostics.report(err, usage.span);
                None
            }
        }
    }

    /// Value of `key` in var group `group`, or `override_value` when the
    /// use-site supplies one.
    pub(crate) fn var_value(
        &mut self,
        group: &QualifiedName,
        key: &str,
        override_value: Option<&str>,
        site: UseContext,
    ) -> SemanticResult<String> {
        let id = self.resolve_at(group, Category::kind(GroupKind::Var), site)?;
        self.var_value_of(id, group, key, override_value)
    }

    fn var_value_of(
        &mut self,
        id: DefId,
        group: &QualifiedName,
        key: &str,
        override_value: Option<&str>,
    ) -> SemanticResult<String> {
        let body = self.inheritance.flatten(&self.symbols, id, self.diagnostics)?;
        let value = body
            .as_var()
            .and_then(|vars| vars.get(key))
            .ok_or_else(|| SemanticError::unresolved(format!("{group}({key})")))?;
        Ok(override_value.unwrap_or(value).to_string())
    }

    /// Replace var references in `text` whose group resolves, from `owner`,
    /// to a var group.
    pub(crate) fn substitute(
        &mut self,
        text: &str,
        owner: &QualifiedNameResolver<'m>,
        site: UseContext,
    ) -> String {
        variables::substitute(text, |reference| {
            let group = QualifiedName::typed(GroupKind::Var, reference.group);
            // Anything that is not a var group is plain CSS.
            let id = owner.resolve(&group, Category::ANY).ok()?;
            let result = self.check_definition(id, site).and_then(|()| {
                self.var_value_of(id, &group, reference.key, reference.override_value)
            });
            match result {
                Ok(value) => Some(value),
                Err(err) => {
                    self.diagnostics.report(err, None);
                    None
                }
            }
        })
    }

    pub(crate) fn owner(&self, namespace: NamespaceId) -> QualifiedNameResolver<'m> {
        self.symbols.at(namespace)
    }
}
