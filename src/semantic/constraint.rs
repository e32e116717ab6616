//! `except` rules and their evaluation.
//!
//! ```text
//! div { except span, [Custom] @Element Box; }    scope rules
//! [Namespace] ui { except [Template] @Var; }    namespace-global rule
//! body { except my-*; }                          prefix rule
//! ```
//!
//! A bare name denies both the HTML tag and any definition of that name.
//! Rules only ever deny. A use is rejected when any rule of an enclosing
//! scope, or any global rule of the use-site namespace or one of its
//! ancestors, matches it.

use smol_str::SmolStr;
use std::fmt;

use super::error::{SemanticError, SemanticResult};
use super::ids::{NamespaceId, ScopeId};
use super::namespace::NamespaceRegistry;
use super::scope::ScopeStack;
use crate::base::Span;
use crate::base::text::is_valid_name;
use crate::syntax::{Category, GroupKind, Identity, NameError, Origin};

// ============================================================================
// RULES
// ============================================================================

/// A whole class of constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// Every plain HTML element (`except @Html;`).
    Html,
    /// Every definition of a category (`except [Custom];`, `except @Var;`).
    Definitions(Category),
}

/// One specific construct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExactTarget {
    /// A tag or definition name (`except span;`, `except Box;`).
    Name(SmolStr),
    /// Tags and definition names starting with a prefix (`except my-*;`).
    Prefix(SmolStr),
    /// A definition by name, optionally narrowed by category
    /// (`except [Custom] @Element Box;`).
    Definition { category: Category, name: SmolStr },
}

/// What an `except` item denies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Exact(ExactTarget),
    TypeCategory(TypeCategory),
}

/// Where a rule was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleScope {
    Scope(ScopeId),
    /// Applies to the namespace and everything nested in it.
    Global(NamespaceId),
}

/// A registered `except` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintRule {
    pub kind: ConstraintKind,
    pub scope: RuleScope,
    pub span: Option<Span>,
}

/// A use being checked against the rules.
#[derive(Debug, Clone, Copy)]
pub enum UseTarget<'a> {
    Element(&'a str),
    Definition(&'a Identity),
}

impl UseTarget<'_> {
    /// The tag or the definition name.
    pub fn name(&self) -> &str {
        match self {
            UseTarget::Element(tag) => tag,
            UseTarget::Definition(identity) => &identity.name,
        }
    }
}

impl fmt::Display for UseTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UseTarget::Element(tag) => f.write_str(tag),
            UseTarget::Definition(identity) => write!(f, "{identity}"),
        }
    }
}

impl ConstraintKind {
    pub fn matches(&self, target: UseTarget<'_>) -> bool {
        match (self, target) {
            (ConstraintKind::Exact(ExactTarget::Name(name)), target) => {
                name.as_str() == target.name()
            }
            (ConstraintKind::Exact(ExactTarget::Prefix(prefix)), target) => {
                target.name().starts_with(prefix.as_str())
            }
            (
                ConstraintKind::Exact(ExactTarget::Definition { category, name }),
                UseTarget::Definition(identity),
            ) => *name == identity.name && category.matches(identity),
            (ConstraintKind::TypeCategory(TypeCategory::Html), UseTarget::Element(_)) => true,
            (
                ConstraintKind::TypeCategory(TypeCategory::Definitions(category)),
                UseTarget::Definition(identity),
            ) => category.matches(identity),
            _ => false,
        }
    }

    /// Parse an `except` clause into its items.
    ///
    /// Accepts the clause with or without the leading `except` keyword and
    /// trailing `;`: `except span, [Custom] @Element Box, @Html;`
    ///
    /// A trailing `*` is only allowed on a bare name. `[Origin]` blocks are
    /// not tracked here, so `[Origin] @Html` is rejected as an unknown prefix.
    pub fn parse_clause(text: &str) -> Result<Vec<ConstraintKind>, NameError> {
        let text = text.trim();
        let text = text
            .strip_prefix("except")
            .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
            .unwrap_or(text);
        let text = text.trim().trim_end_matches(';');
        text.split(',').map(|item| Self::parse_item(item.trim())).collect()
    }

    fn parse_item(item: &str) -> Result<ConstraintKind, NameError> {
        let mut words = item.split_whitespace().peekable();
        let mut category = Category::ANY;

        if let Some(&word) = words.peek().filter(|w| w.starts_with('[')) {
            category.origin = Some(match word {
                "[Template]" => Origin::Template,
                "[Custom]" => Origin::Custom,
                _ => return Err(NameError::UnknownPrefix(word.to_string())),
            });
            words.next();
        }
        if let Some(&word) = words.peek().filter(|w| w.starts_with('@')) {
            words.next();
            category.kind = Some(match word {
                "@Html" if category.origin.is_none() => {
                    return match words.next() {
                        None => Ok(ConstraintKind::TypeCategory(TypeCategory::Html)),
                        Some(extra) => Err(NameError::Unexpected(extra.to_string())),
                    };
                }
                "@Style" => GroupKind::Style,
                "@Element" => GroupKind::Element,
                "@Var" => GroupKind::Var,
                _ => return Err(NameError::UnknownType(word.to_string())),
            });
        }

        let name = words.next();
        if let Some(extra) = words.next() {
            return Err(NameError::Unexpected(extra.to_string()));
        }
        match name {
            None if category == Category::ANY => Err(NameError::Empty),
            None => Ok(ConstraintKind::TypeCategory(TypeCategory::Definitions(
                category,
            ))),
            Some(name) if category == Category::ANY => match name.strip_suffix('*') {
                Some(prefix) if is_valid_name(prefix) => {
                    Ok(ConstraintKind::Exact(ExactTarget::Prefix(prefix.into())))
                }
                None if is_valid_name(name) => {
                    Ok(ConstraintKind::Exact(ExactTarget::Name(name.into())))
                }
                _ => Err(NameError::InvalidSegment(name.to_string())),
            },
            Some(name) if !is_valid_name(name) => Err(NameError::InvalidSegment(name.to_string())),
            Some(name) => Ok(ConstraintKind::Exact(ExactTarget::Definition {
                category,
                name: name.into(),
            })),
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::Exact(ExactTarget::Name(name)) => f.write_str(name),
            ConstraintKind::Exact(ExactTarget::Prefix(prefix)) => write!(f, "{prefix}*"),
            ConstraintKind::Exact(ExactTarget::Definition { category, name }) => {
                if *category == Category::ANY {
                    f.write_str(name)
                } else {
                    write!(f, "{category} {name}")
                }
            }
            ConstraintKind::TypeCategory(TypeCategory::Html) => f.write_str("@Html"),
            ConstraintKind::TypeCategory(TypeCategory::Definitions(category)) => {
                write!(f, "{category}")
            }
        }
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

/// Holds every `except` rule of a compilation unit.
#[derive(Debug, Clone, Default)]
pub struct ConstraintValidator {
    rules: Vec<ConstraintRule>,
}

impl ConstraintValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: ConstraintRule) {
        tracing::debug!("[EXCEPT] {} in {:?}", rule.kind, rule.scope);
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[ConstraintRule] {
        &self.rules
    }

    /// The first rule denying `target` at a use-site in `scope` /
    /// `namespace`, if any.
    pub fn find_violation(
        &self,
        scopes: &ScopeStack,
        namespaces: &NamespaceRegistry,
        scope: ScopeId,
        namespace: NamespaceId,
        target: UseTarget<'_>,
    ) -> Option<&ConstraintRule> {
        let global = self.rules.iter().find(|rule| match rule.scope {
            RuleScope::Global(ns) => {
                namespaces.is_within(namespace, ns) && rule.kind.matches(target)
            }
            RuleScope::Scope(_) => false,
        });
        if global.is_some() {
            return global;
        }
        scopes.chain(scope).find_map(|level| {
            self.rules.iter().find(|rule| {
                rule.scope == RuleScope::Scope(level) && rule.kind.matches(target)
            })
        })
    }

    pub fn is_allowed(
        &self,
        scopes: &ScopeStack,
        namespaces: &NamespaceRegistry,
        scope: ScopeId,
        namespace: NamespaceId,
        target: UseTarget<'_>,
    ) -> bool {
        self.find_violation(scopes, namespaces, scope, namespace, target)
            .is_none()
    }

    /// Like [`is_allowed`](Self::is_allowed), as a `ConstraintViolation`.
    pub fn check(
        &self,
        scopes: &ScopeStack,
        namespaces: &NamespaceRegistry,
        scope: ScopeId,
        namespace: NamespaceId,
        target: UseTarget<'_>,
    ) -> SemanticResult<()> {
        match self.find_violation(scopes, namespaces, scope, namespace, target) {
            None => Ok(()),
            Some(rule) => {
                tracing::trace!("[EXCEPT] {} denied by {}", target, rule.kind);
                Err(SemanticError::ConstraintViolation {
                    target: target.to_string(),
                    rule: rule.kind.to_string(),
                })
            }
        }
    }
}
