//! Qualified Name Resolver — name tokens to definitions.
//!
//! Resolution follows the namespace chain rather than the lexical scope
//! chain:
//!
//! 1. A name with a namespace path (`space.Box`, `Box from space`) is looked
//!    up in the first namespace, walking from the current one up to the
//!    root, under which that path exists. There is no fallback past it.
//! 2. A bare name that is a definition alias of the current namespace or an
//!    ancestor names the aliased definition. Otherwise it collects
//!    candidates from the current namespace and each ancestor up to the root.
//! 3. Several candidates are narrowed by the [`ConflictResolutionStrategy`].

use rustc_hash::FxHashSet;
use std::fmt;
use std::str::FromStr;

use super::definition::DefinitionStore;
use super::error::{SemanticError, SemanticResult};
use super::ids::{DefId, NamespaceId};
use super::namespace::{Alias, NamespaceRegistry};
use crate::syntax::{Category, Identity, QualifiedName};

// ============================================================================
// CONFLICT STRATEGY
// ============================================================================

/// How to pick one definition when a bare name is visible several times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictResolutionStrategy {
    /// The innermost namespace that has any candidate wins.
    #[default]
    PreferCurrentNamespace,
    /// Candidates from `[Namespace]` blocks win over those from implicit
    /// (file-default or import) namespaces. Without one, the innermost
    /// candidate wins.
    PreferExplicitlyQualified,
    /// Any second candidate is an error.
    Error,
}

impl fmt::Display for ConflictResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictResolutionStrategy::PreferCurrentNamespace => "PREFER_CURRENT_NAMESPACE",
            ConflictResolutionStrategy::PreferExplicitlyQualified => "PREFER_EXPLICIT",
            ConflictResolutionStrategy::Error => "ERROR",
        })
    }
}

impl FromStr for ConflictResolutionStrategy {
    type Err = String;

    /// Accepts `PREFER_CURRENT_NAMESPACE`, `PreferCurrentNamespace`,
    /// `prefer-current` and similar spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "prefercurrentnamespace" | "prefercurrent" | "current" => {
                Ok(ConflictResolutionStrategy::PreferCurrentNamespace)
            }
            "preferexplicitlyqualified" | "preferexplicit" | "explicit" => {
                Ok(ConflictResolutionStrategy::PreferExplicitlyQualified)
            }
            "error" => Ok(ConflictResolutionStrategy::Error),
            _ => Err(format!("unknown conflict strategy '{s}'")),
        }
    }
}

// ============================================================================
// RESOLUTION RESULT
// ============================================================================

/// Result of looking a name up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveResult {
    /// Exactly one definition.
    Found(DefId),
    /// Several definitions the strategy could not choose between.
    Ambiguous(Vec<DefId>),
    NotFound,
}

impl ResolveResult {
    /// Get the resolved definition if unambiguous.
    pub fn definition(&self) -> Option<DefId> {
        match self {
            ResolveResult::Found(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ResolveResult::Found(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolveResult::Ambiguous(_))
    }

    fn from_candidates(mut candidates: Vec<DefId>) -> Self {
        match candidates.len() {
            0 => ResolveResult::NotFound,
            1 => ResolveResult::Found(candidates.remove(0)),
            _ => ResolveResult::Ambiguous(candidates),
        }
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolver for name tokens, anchored at one namespace.
#[derive(Clone, Debug)]
pub struct QualifiedNameResolver<'a> {
    namespaces: &'a NamespaceRegistry,
    store: &'a DefinitionStore,
    strategy: ConflictResolutionStrategy,
    current: NamespaceId,
}

impl<'a> QualifiedNameResolver<'a> {
    pub fn new(namespaces: &'a NamespaceRegistry, store: &'a DefinitionStore) -> Self {
        Self {
            namespaces,
            store,
            strategy: ConflictResolutionStrategy::default(),
            current: NamespaceId::ROOT,
        }
    }

    /// Set the namespace resolution starts from.
    pub fn with_namespace(mut self, namespace: NamespaceId) -> Self {
        self.current = namespace;
        self
    }

    pub fn with_strategy(mut self, strategy: ConflictResolutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// A copy of this resolver anchored at another namespace.
    pub fn at(&self, namespace: NamespaceId) -> Self {
        self.clone().with_namespace(namespace)
    }

    pub fn namespaces(&self) -> &'a NamespaceRegistry {
        self.namespaces
    }

    pub fn store(&self) -> &'a DefinitionStore {
        self.store
    }

    pub fn current(&self) -> NamespaceId {
        self.current
    }

    /// Parse and resolve a name token such as `[Custom] @Element space.Box`.
    pub fn resolve_token(&self, token: &str, expected: Category) -> SemanticResult<DefId> {
        let name = QualifiedName::parse(token).map_err(|e| SemanticError::malformed(token, e))?;
        self.resolve(&name, expected)
    }

    /// Resolve `name` to exactly one definition of the `expected` category.
    pub fn resolve(&self, name: &QualifiedName, expected: Category) -> SemanticResult<DefId> {
        let category = narrow(name, expected)?;
        match self.lookup(name, category) {
            ResolveResult::Found(id) => Ok(id),
            ResolveResult::Ambiguous(ids) => Err(SemanticError::AmbiguousName {
                name: name.to_string(),
                candidates: ids.iter().map(|id| self.describe(*id)).collect(),
            }),
            ResolveResult::NotFound => {
                // Same name under another group type reads better as a mismatch.
                if category != Category::ANY {
                    let other = match self.lookup(name, Category::ANY) {
                        ResolveResult::Found(id) => Some(id),
                        ResolveResult::Ambiguous(ids) => ids.first().copied(),
                        ResolveResult::NotFound => None,
                    };
                    if let Some(id) = other {
                        return Err(SemanticError::KindMismatch {
                            name: name.to_string(),
                            expected: category.to_string(),
                            found: self.store[id].identity.to_string(),
                        });
                    }
                }
                tracing::debug!(
                    "[RESOLVE] '{}' not found from '{}'",
                    name,
                    self.namespaces.display_path(self.current)
                );
                Err(SemanticError::unresolved(name))
            }
        }
    }

    /// Look `name` up without turning the outcome into an error.
    pub fn lookup(&self, name: &QualifiedName, category: Category) -> ResolveResult {
        if name.is_qualified() {
            let Some(ns) = self.namespaces.locate(self.current, &name.path) else {
                return ResolveResult::NotFound;
            };
            let candidates = self.namespaces.candidates(ns, &name.name, category);
            tracing::trace!(
                "[RESOLVE] '{}' in '{}' -> {:?}",
                name,
                self.namespaces.display_path(ns),
                candidates
            );
            return ResolveResult::from_candidates(candidates);
        }

        if let Some(id) = self.aliased(&name.name, category) {
            tracing::trace!("[RESOLVE] '{}' is an alias of {}", name, self.describe(id));
            return ResolveResult::Found(id);
        }

        // Candidates grouped per namespace level, innermost first.
        let levels: Vec<(NamespaceId, Vec<DefId>)> = self
            .namespaces
            .ancestors(self.current)
            .map(|ns| (ns, self.namespaces.candidates(ns, &name.name, category)))
            .filter(|(_, found)| !found.is_empty())
            .collect();

        let total: usize = levels.iter().map(|(_, found)| found.len()).sum();
        tracing::trace!(
            "[RESOLVE] '{}' from '{}': {} candidate(s) on {} level(s)",
            name,
            self.namespaces.display_path(self.current),
            total,
            levels.len()
        );
        if total <= 1 {
            return ResolveResult::from_candidates(
                levels.into_iter().flat_map(|(_, found)| found).collect(),
            );
        }

        match self.strategy {
            ConflictResolutionStrategy::PreferCurrentNamespace => {
                let innermost = levels.into_iter().next().map(|(_, found)| found);
                ResolveResult::from_candidates(innermost.unwrap_or_default())
            }
            ConflictResolutionStrategy::PreferExplicitlyQualified => {
                // Innermost explicit candidate, else the innermost candidate.
                let all: Vec<DefId> = levels.into_iter().flat_map(|(_, found)| found).collect();
                let explicit = all
                    .iter()
                    .copied()
                    .find(|id| self.namespaces.node(self.store[*id].namespace).explicit);
                match explicit.or_else(|| all.first().copied()) {
                    Some(id) => ResolveResult::Found(id),
                    None => ResolveResult::NotFound,
                }
            }
            ConflictResolutionStrategy::Error => ResolveResult::Ambiguous(
                levels.into_iter().flat_map(|(_, found)| found).collect(),
            ),
        }
    }

    /// The innermost definition alias `name` whose target fits `category`.
    fn aliased(&self, name: &str, category: Category) -> Option<DefId> {
        self.namespaces.ancestors(self.current).find_map(|ns| {
            match self.namespaces.node(ns).alias(name)? {
                Alias::Definition(id) if category.matches(&self.store[id].identity) => Some(id),
                _ => None,
            }
        })
    }

    /// Every definition of `category` visible from the current namespace.
    ///
    /// An identity declared in an inner namespace hides the same identity
    /// further out.
    pub fn visible(&self, category: Category) -> Vec<DefId> {
        let mut seen: FxHashSet<&Identity> = FxHashSet::default();
        let mut visible = Vec::new();
        for ns in self.namespaces.ancestors(self.current) {
            for id in self.namespaces.node(ns).definitions() {
                let identity = &self.store[id].identity;
                if category.matches(identity) && seen.insert(identity) {
                    visible.push(id);
                }
            }
        }
        visible
    }

    /// `[Template] @Style Box (space.room)`
    fn describe(&self, id: DefId) -> String {
        let def = &self.store[id];
        let path = self.namespaces.display_path(def.namespace);
        if path.is_empty() {
            def.identity.to_string()
        } else {
            format!("{} ({})", def.identity, path)
        }
    }
}

/// Combine what the token says with what the use-site expects.
fn narrow(name: &QualifiedName, expected: Category) -> SemanticResult<Category> {
    let mismatch = |expected: String, found: String| SemanticError::KindMismatch {
        name: name.to_string(),
        expected,
        found,
    };
    let origin = match (name.origin, expected.origin) {
        (Some(a), Some(b)) if a != b => return Err(mismatch(b.to_string(), a.to_string())),
        (a, b) => a.or(b),
    };
    let kind = match (name.kind, expected.kind) {
        (Some(a), Some(b)) if a != b => return Err(mismatch(b.to_string(), a.to_string())),
        (a, b) => a.or(b),
    };
    Ok(Category { origin, kind })
}
