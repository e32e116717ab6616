//! The tree of `[Namespace]` declarations.
//!
//! Nodes live in an arena; parents and children are ids. Declaring a path
//! that already exists returns the existing node, so two `[Namespace] a { }`
//! blocks (or a block and an imported module mounted at `a`) share one
//! definition table.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::error::{SemanticError, SemanticResult};
use super::ids::{DefId, NamespaceId};
use crate::syntax::{Category, GroupKind, Identity, Origin};

const ORIGINS: [Origin; 2] = [Origin::Template, Origin::Custom];
const KINDS: [GroupKind; 3] = [GroupKind::Style, GroupKind::Element, GroupKind::Var];

/// What an import alias (`[Import] ... as Alias`) stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alias {
    Definition(DefId),
    Namespace(NamespaceId),
}

/// One namespace in the tree.
#[derive(Debug, Clone)]
pub struct NamespaceNode {
    pub name: SmolStr,
    pub parent: Option<NamespaceId>,
    pub children: IndexMap<SmolStr, NamespaceId>,
    /// Declared by a `[Namespace]` block rather than implied by a file name
    /// or an import mount point.
    pub explicit: bool,
    definitions: FxHashMap<(Origin, GroupKind), IndexMap<SmolStr, DefId>>,
    aliases: IndexMap<SmolStr, Alias>,
}

impl NamespaceNode {
    fn new(name: SmolStr, parent: Option<NamespaceId>, explicit: bool) -> Self {
        Self {
            name,
            parent,
            children: IndexMap::new(),
            explicit,
            definitions: FxHashMap::default(),
            aliases: IndexMap::new(),
        }
    }

    /// Definition registered here under exactly this identity.
    pub fn get(&self, origin: Origin, kind: GroupKind, name: &str) -> Option<DefId> {
        self.definitions.get(&(origin, kind))?.get(name).copied()
    }

    /// Definitions named `name` whose identity matches `category`, in a
    /// stable (origin, type) order.
    pub fn candidates(&self, name: &str, category: Category) -> Vec<DefId> {
        let mut found = Vec::new();
        for origin in ORIGINS {
            for kind in KINDS {
                if category.origin.is_some_and(|o| o != origin)
                    || category.kind.is_some_and(|k| k != kind)
                {
                    continue;
                }
                if let Some(id) = self.get(origin, kind, name) {
                    found.push(id);
                }
            }
        }
        found
    }

    pub fn alias(&self, name: &str) -> Option<Alias> {
        self.aliases.get(name).copied()
    }

    /// Aliases registered directly in this namespace, in registration order.
    pub fn aliases(&self) -> impl Iterator<Item = (&SmolStr, Alias)> + '_ {
        self.aliases.iter().map(|(name, alias)| (name, *alias))
    }

    /// All definitions registered directly in this namespace.
    pub fn definitions(&self) -> impl Iterator<Item = DefId> + '_ {
        ORIGINS
            .into_iter()
            .flat_map(move |o| KINDS.into_iter().map(move |k| (o, k)))
            .filter_map(|key| self.definitions.get(&key))
            .flat_map(|table| table.values().copied())
    }
}

/// The namespace tree of one compilation unit.
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    nodes: Vec<NamespaceNode>,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self {
            nodes: vec![NamespaceNode::new(SmolStr::default(), None, false)],
        }
    }

    pub fn node(&self, id: NamespaceId) -> &NamespaceNode {
        &self.nodes[id.index()]
    }

    /// Number of namespaces, the root included.
    pub fn namespace_count(&self) -> usize {
        self.nodes.len()
    }

    /// Declare `path` from the root, creating missing segments.
    pub fn declare(&mut self, path: &[SmolStr]) -> NamespaceId {
        self.declare_in(NamespaceId::ROOT, path, true)
    }

    /// Declare `path` below `parent`, creating missing segments.
    ///
    /// An existing leaf is reused (merged). `explicit` marks the leaf as
    /// declared by a `[Namespace]` block; it never resets an explicit node.
    pub fn declare_in(
        &mut self,
        parent: NamespaceId,
        path: &[SmolStr],
        explicit: bool,
    ) -> NamespaceId {
        let mut current = parent;
        for segment in path {
            current = match self.child(current, segment) {
                Some(existing) => {
                    tracing::debug!(
                        "[NAMESPACE] merging into existing '{}'",
                        self.display_path(existing)
                    );
                    existing
                }
                None => {
                    let id = NamespaceId::new(self.nodes.len());
                    self.nodes
                        .push(NamespaceNode::new(segment.clone(), Some(current), false));
                    self.nodes[current.index()]
                        .children
                        .insert(segment.clone(), id);
                    tracing::debug!("[NAMESPACE] declared '{}'", self.display_path(id));
                    id
                }
            };
        }
        if explicit && current != NamespaceId::ROOT {
            self.nodes[current.index()].explicit = true;
        }
        current
    }

    pub fn child(&self, parent: NamespaceId, name: &str) -> Option<NamespaceId> {
        self.node(parent).children.get(name).copied()
    }

    /// Follow `path` down from `from`. Does not create anything.
    pub fn lookup_path(&self, from: NamespaceId, path: &[SmolStr]) -> Option<NamespaceId> {
        path.iter()
            .try_fold(from, |current, segment| self.child(current, segment))
    }

    /// The first namespace, walking from `from` up to the root, under which
    /// `path` exists. A namespace alias as first segment is tried before the
    /// children of each level.
    pub fn locate(&self, from: NamespaceId, path: &[SmolStr]) -> Option<NamespaceId> {
        self.ancestors(from).find_map(|ns| {
            let found = self
                .through_alias(ns, path)
                .or_else(|| self.lookup_path(ns, path));
            tracing::trace!(
                "[NAMESPACE] '{}' under '{}': {:?}",
                path.join("."),
                self.display_path(ns),
                found
            );
            found
        })
    }

    fn through_alias(&self, ns: NamespaceId, path: &[SmolStr]) -> Option<NamespaceId> {
        let (first, rest) = path.split_first()?;
        match self.node(ns).alias(first)? {
            Alias::Namespace(target) => self.lookup_path(target, rest),
            Alias::Definition(_) => None,
        }
    }

    /// Register `name` as an alias in `namespace`. An alias name can be
    /// registered once per namespace.
    pub fn insert_alias(
        &mut self,
        namespace: NamespaceId,
        name: SmolStr,
        alias: Alias,
    ) -> SemanticResult<()> {
        if self.node(namespace).aliases.contains_key(&name) {
            return Err(SemanticError::DuplicateName {
                name: format!("alias {name}"),
                scope: self.describe(namespace),
            });
        }
        tracing::debug!(
            "[NAMESPACE] alias '{}' -> {:?} in '{}'",
            name,
            alias,
            self.display_path(namespace)
        );
        self.nodes[namespace.index()].aliases.insert(name, alias);
        Ok(())
    }

    /// Register a definition in `namespace`.
    ///
    /// The same (origin, type, name) twice in one namespace is a
    /// `DuplicateName`; the first registration is kept.
    pub fn insert_definition(
        &mut self,
        namespace: NamespaceId,
        identity: &Identity,
        def: DefId,
    ) -> SemanticResult<()> {
        let table = self.nodes[namespace.index()]
            .definitions
            .entry((identity.origin, identity.kind))
            .or_default();
        if table.contains_key(&identity.name) {
            return Err(SemanticError::DuplicateName {
                name: identity.to_string(),
                scope: self.describe(namespace),
            });
        }
        table.insert(identity.name.clone(), def);
        Ok(())
    }

    /// Candidates for `name` in exactly one namespace.
    pub fn candidates(
        &self,
        namespace: NamespaceId,
        name: &str,
        category: Category,
    ) -> Vec<DefId> {
        self.node(namespace).candidates(name, category)
    }

    /// Resolve `path.name` starting at `from`, walking up to the root to find
    /// the first namespace containing `path`. Returns a definition only when
    /// exactly one candidate of `category` lives there.
    pub fn resolve_qualified(
        &self,
        from: NamespaceId,
        path: &[SmolStr],
        name: &str,
        category: Category,
    ) -> Option<DefId> {
        let ns = self.locate(from, path)?;
        match self.candidates(ns, name, category).as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// `id` and each of its ancestors, innermost first, ending at the root.
    pub fn ancestors(&self, id: NamespaceId) -> impl Iterator<Item = NamespaceId> + '_ {
        std::iter::successors(Some(id), move |ns| self.node(*ns).parent)
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_within(&self, id: NamespaceId, ancestor: NamespaceId) -> bool {
        self.ancestors(id).any(|ns| ns == ancestor)
    }

    /// Segments from the root to `id`. The root itself has an empty path.
    pub fn path(&self, id: NamespaceId) -> Vec<SmolStr> {
        let mut path: Vec<SmolStr> = self
            .ancestors(id)
            .filter(|ns| *ns != NamespaceId::ROOT)
            .map(|ns| self.node(ns).name.clone())
            .collect();
        path.reverse();
        path
    }

    /// Dotted path of `id` (`space.room`), empty for the root.
    pub fn display_path(&self, id: NamespaceId) -> String {
        self.path(id).join(".")
    }

    fn describe(&self, id: NamespaceId) -> String {
        if id == NamespaceId::ROOT {
            "the global namespace".to_string()
        } else {
            format!("namespace '{}'", self.display_path(id))
        }
    }

    /// Copy the namespace tree of `other` below `under`, merging nodes that
    /// already exist. Definition tables are not copied.
    ///
    /// Returns, for every node of `other`, the id of its counterpart here.
    pub fn graft(&mut self, other: &NamespaceRegistry, under: NamespaceId) -> Vec<NamespaceId> {
        let mut mapping = vec![under; other.nodes.len()];
        // Parents always precede their children in the arena.
        for (index, node) in other.nodes.iter().enumerate().skip(1) {
            let parent = node.parent.map_or(under, |p| mapping[p.index()]);
            mapping[index] =
                self.declare_in(parent, std::slice::from_ref(&node.name), node.explicit);
        }
        mapping
    }
}
