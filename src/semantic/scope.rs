//! Nested lexical scopes.
//!
//! Scopes are kept in an arena and never freed: exiting a scope only moves
//! the cursor back to its parent. A use-site recorded during registration can
//! therefore still walk its scope chain when it is resolved later.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::error::{SemanticError, SemanticResult};
use super::ids::{DefId, NamespaceId, ScopeId};

/// Syntactic block that introduced a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Global,
    Namespace,
    Template,
    Custom,
    Element,
}

/// What a scope-level name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolRef {
    Definition(DefId),
    Namespace(NamespaceId),
}

/// A lexical scope.
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Namespace that was current when the scope was entered.
    pub namespace: NamespaceId,
    pub children: Vec<ScopeId>,
    symbols: FxHashMap<SmolStr, SymbolRef>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>, namespace: NamespaceId) -> Self {
        Self {
            kind,
            parent,
            namespace,
            children: Vec::new(),
            symbols: FxHashMap::default(),
        }
    }

    /// Get a symbol defined directly in this scope (no chain walking).
    pub fn get(&self, name: &str) -> Option<SymbolRef> {
        self.symbols.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// The stack of open scopes, backed by an arena of every scope ever entered.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeKind::Global, None, NamespaceId::ROOT)],
            current: ScopeId::GLOBAL,
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Number of open scopes above Global.
    pub fn depth(&self) -> usize {
        self.chain(self.current).count() - 1
    }

    /// Enter a new scope nested in the current one. It inherits the current
    /// namespace.
    pub fn enter(&mut self, kind: ScopeKind) -> ScopeId {
        let namespace = self.scope(self.current).namespace;
        self.push(kind, namespace)
    }

    /// Enter the scope of a `[Namespace]` block.
    pub fn enter_namespace(&mut self, namespace: NamespaceId) -> ScopeId {
        self.push(ScopeKind::Namespace, namespace)
    }

    fn push(&mut self, kind: ScopeKind, namespace: NamespaceId) -> ScopeId {
        let parent = self.current;
        let id = ScopeId::new(self.scopes.len());
        self.scopes.push(Scope::new(kind, Some(parent), namespace));
        self.scopes[parent.index()].children.push(id);
        self.current = id;
        tracing::trace!("[SCOPE] enter {:?} {} (parent {})", kind, id, parent);
        id
    }

    /// Leave the current scope.
    ///
    /// # Panics
    ///
    /// Panics when the current scope is Global.
    pub fn exit(&mut self) -> ScopeId {
        let leaving = self.current;
        let parent = self
            .scope(leaving)
            .parent
            .unwrap_or_else(|| panic!("ScopeStack::exit called on the Global scope"));
        tracing::trace!("[SCOPE] exit {} -> {}", leaving, parent);
        self.current = parent;
        leaving
    }

    /// Define `name` in the current scope.
    ///
    /// Fails only when the same name already exists in this very scope;
    /// shadowing a name of an enclosing scope is allowed.
    pub fn define(&mut self, name: impl Into<SmolStr>, symbol: SymbolRef) -> SemanticResult<()> {
        let name = name.into();
        let current = self.current;
        let scope = &mut self.scopes[current.index()];
        if scope.symbols.contains_key(&name) {
            return Err(SemanticError::DuplicateName {
                name: name.to_string(),
                scope: format!("{:?} scope {}", scope.kind, current),
            });
        }
        tracing::trace!("[SCOPE] define '{}' in {}", name, current);
        scope.symbols.insert(name, symbol);
        Ok(())
    }

    /// Look `name` up from the current scope outwards.
    pub fn lookup(&self, name: &str) -> Option<SymbolRef> {
        self.lookup_from(self.current, name)
    }

    /// Look `name` up from `scope` outwards to Global.
    pub fn lookup_from(&self, scope: ScopeId, name: &str) -> Option<SymbolRef> {
        for id in self.chain(scope) {
            if let Some(symbol) = self.scope(id).get(name) {
                tracing::trace!("[SCOPE] found '{}' in {}", name, id);
                return Some(symbol);
            }
        }
        None
    }

    /// Scope ids from `scope` (inclusive) up to Global.
    pub fn chain(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), move |id| self.scope(*id).parent)
    }

    /// Namespace that was current inside `scope`.
    pub fn namespace_of(&self, scope: ScopeId) -> NamespaceId {
        self.scope(scope).namespace
    }
}
