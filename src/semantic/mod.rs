//! # Semantic Resolution
//!
//! Turns registered `[Template]`, `[Custom]` and `[Namespace]` declarations
//! and `except` rules into a queryable symbol universe, and builds concrete
//! instances for use-sites on demand.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! model        → SemanticModel: per-unit context driven by parser and generator
//!   ↓
//! instance     → nested usage expansion, ResolvedInstance
//!   ↓
//! inheritance  → flatten with cycle detection, DeleteInheritance
//! specialize   → edit ops on owned bodies
//! constraint   → except rules
//!   ↓
//! resolver     → qualified names, conflict strategies
//!   ↓
//! scope, namespace, definition  → arenas addressed by ids
//! ```

mod config;
mod constraint;
mod definition;
mod diagnostics;
mod error;
mod ids;
mod inheritance;
mod instance;
mod model;
mod namespace;
mod resolver;
mod scope;
mod specialize;
pub mod variables;

pub use config::{ConfigError, EngineConfig};
pub use constraint::{
    ConstraintKind, ConstraintRule, ConstraintValidator, ExactTarget, RuleScope, TypeCategory,
    UseTarget,
};
pub use definition::{Definition, DefinitionStore, InheritanceEdge, InheritanceStyle};
pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity, codes};
pub use error::{SemanticError, SemanticResult};
pub use ids::{DefId, NamespaceId, ScopeId};
pub use inheritance::InheritanceResolver;
pub use instance::{ResolvedInstance, UseContext};
pub use model::{RuleLevel, SemanticModel};
pub use namespace::{Alias, NamespaceNode, NamespaceRegistry};
pub use resolver::{ConflictResolutionStrategy, QualifiedNameResolver, ResolveResult};
pub use scope::{Scope, ScopeKind, ScopeStack, SymbolRef};
pub use specialize::SpecializationEngine;
