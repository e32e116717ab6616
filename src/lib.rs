//! # chtl-base
//!
//! Semantic resolution engine for the CHTL templating language.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! semantic  → namespaces, definitions, inheritance, specialization, except rules
//!   ↓
//! syntax    → content model handed over by the parser (bodies, names, selectors)
//!   ↓
//! base      → Primitives (Span, Position, identifier classes)
//! ```
//!
//! The CHTL tokenizer, parser and HTML/CSS/JS generator are separate crates
//! that drive a [`SemanticModel`](semantic::SemanticModel): the parser
//! registers declarations while it walks a file, then the generator resolves
//! every use-site into a [`ResolvedInstance`](semantic::ResolvedInstance).

// ============================================================================
// MODULES (dependency order: base → syntax → semantic)
// ============================================================================

/// Foundation types: Span, Position, identifier character classes
pub mod base;

/// Syntax: bodies, qualified names, selectors, specialization ops
pub mod syntax;

/// Semantic resolution: the per-unit model and its components
pub mod semantic;

// Re-export foundation types
pub use base::{Position, Span};

// Re-export the entry points
pub use semantic::{
    Diagnostic, EngineConfig, ResolvedInstance, SemanticError, SemanticModel, Severity,
    UseContext,
};
pub use syntax::{Body, Category, GroupKind, Identity, Origin, QualifiedName};
