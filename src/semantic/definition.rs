//! Registered templates and customs.
//!
//! Definitions are immutable once registered. The resolver and the
//! specialization engine only ever read them and clone bodies out.

use indexmap::IndexSet;
use smol_str::SmolStr;

use super::ids::{DefId, NamespaceId, ScopeId};
use crate::base::Span;
use crate::syntax::{Body, GroupKind, Identity, Origin, QualifiedName, SpecializationOp};

/// How an inheritance edge was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InheritanceStyle {
    /// Bare `@Style Base;` inside a body.
    Composition,
    /// `inherit @Style Base;`
    Explicit,
}

/// One inheritance edge of a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritanceEdge {
    pub target: QualifiedName,
    pub style: InheritanceStyle,
    /// Edits applied to the inherited contribution before it is merged
    /// (`@Style WhiteText { delete color; }` inside a custom body).
    pub specialization: Vec<SpecializationOp>,
    pub span: Option<Span>,
}

impl InheritanceEdge {
    pub fn composition(target: QualifiedName) -> Self {
        Self {
            target,
            style: InheritanceStyle::Composition,
            specialization: Vec::new(),
            span: None,
        }
    }

    pub fn explicit(target: QualifiedName) -> Self {
        Self {
            style: InheritanceStyle::Explicit,
            ..Self::composition(target)
        }
    }

    pub fn with_ops(mut self, ops: Vec<SpecializationOp>) -> Self {
        self.specialization = ops;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

/// A registered `[Template]` or `[Custom]` group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub identity: Identity,
    /// Namespace the definition was registered in.
    pub namespace: NamespaceId,
    /// Scope that was current at registration.
    pub scope: ScopeId,
    /// Inheritance edges in source order.
    pub inherited: Vec<InheritanceEdge>,
    pub body: Body,
    /// Properties declared without a value (customs only).
    pub no_value_properties: IndexSet<SmolStr>,
    pub span: Option<Span>,
}

impl Definition {
    pub fn kind(&self) -> GroupKind {
        self.identity.kind
    }

    pub fn origin(&self) -> Origin {
        self.identity.origin
    }

    pub fn is_custom(&self) -> bool {
        self.identity.origin == Origin::Custom
    }

    pub fn has_inheritance(&self) -> bool {
        !self.inherited.is_empty()
    }
}

/// Arena of every definition of a compilation unit.
#[derive(Debug, Clone, Default)]
pub struct DefinitionStore {
    definitions: Vec<Definition>,
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition and return its id.
    ///
    /// Uniqueness is the namespace registry's concern; the store accepts
    /// anything so that a rejected duplicate can still be reported with
    /// its own id.
    pub fn push(&mut self, definition: Definition) -> DefId {
        let id = DefId::new(self.definitions.len());
        tracing::debug!("[DEFINE] {} = {}", id, definition.identity);
        self.definitions.push(definition);
        id
    }

    pub fn get(&self, id: DefId) -> Option<&Definition> {
        self.definitions.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DefId, &Definition)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(i, d)| (DefId::new(i), d))
    }
}

impl std::ops::Index<DefId> for DefinitionStore {
    type Output = Definition;

    fn index(&self, id: DefId) -> &Definition {
        &self.definitions[id.index()]
    }
}
