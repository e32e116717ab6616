//! Diagnostics — Semantic error reporting.
//!
//! Resolution never stops at the first problem: every error or warning is
//! recorded here against the definition or use-site that caused it, and the
//! generator inspects the full list once the parse-and-register phase ends.

use std::sync::Arc;

use super::error::SemanticError;
use crate::base::Span;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// Source range of the offending construct, when the caller supplied one.
    pub span: Option<Span>,
    /// Severity level.
    pub severity: Severity,
    /// Error/warning code (e.g., "E0001").
    pub code: Option<Arc<str>>,
    /// The diagnostic message.
    pub message: Arc<str>,
    /// The typed error this diagnostic was built from.
    pub error: Option<SemanticError>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<Arc<str>>) -> Self {
        Self {
            span: None,
            severity: Severity::Error,
            code: None,
            message: message.into(),
            error: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(message)
        }
    }

    /// Build a diagnostic from a typed error, taking its code and severity.
    pub fn from_error(error: SemanticError) -> Self {
        Self {
            span: None,
            severity: error.severity(),
            code: Some(Arc::from(error.code())),
            message: Arc::from(error.to_string()),
            error: Some(error),
        }
    }

    /// Set the span for this diagnostic.
    pub fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.severity.as_str())?;
        if let Some(code) = &self.code {
            write!(f, "[{code}]")?;
        }
        if let Some(span) = &self.span {
            write!(f, " at {}", span.start)?;
        }
        write!(f, ": {}", self.message)
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes for semantic errors.
///
/// ## Error Code Ranges
///
/// - **E0001-E0099**: Resolution errors (names, inheritance, constraints)
/// - **W0001-W0099**: Warnings (stale specialization, unfilled placeholders)
pub mod codes {
    // ========================================================================
    // SEMANTIC ERRORS (E0001-E0099)
    // ========================================================================

    /// Undefined reference (name not found).
    pub const UNDEFINED_REFERENCE: &str = "E0001";
    /// Ambiguous reference (multiple candidates).
    pub const AMBIGUOUS_REFERENCE: &str = "E0002";
    /// Group used where a group of another type is required.
    pub const TYPE_MISMATCH: &str = "E0003";
    /// Duplicate definition.
    pub const DUPLICATE_DEFINITION: &str = "E0004";
    /// Name token could not be parsed.
    pub const MALFORMED_NAME: &str = "E0005";
    /// Specialization applied to a template.
    pub const INVALID_SPECIALIZATION: &str = "E0006";
    /// Circular inheritance or usage.
    pub const CIRCULAR_DEPENDENCY: &str = "E0007";
    /// Use denied by an `except` rule.
    pub const CONSTRAINT_VIOLATION: &str = "E0011";

    // ========================================================================
    // WARNINGS (W0001-W0099)
    // ========================================================================

    /// Specialization anchor matched nothing.
    pub const DANGLING_ANCHOR: &str = "W0001";
    /// Placeholder property left without a value.
    pub const UNFILLED_PLACEHOLDER: &str = "W0002";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during semantic analysis.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::debug!("[DIAG] {}", diagnostic),
            Severity::Warning => tracing::warn!("[DIAG] {}", diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }

    /// Record a typed error at an optional location.
    pub fn report(&mut self, error: SemanticError, span: Option<Span>) {
        self.add(Diagnostic::from_error(error).with_span(span));
    }

    /// Get all diagnostics, in the order they were recorded.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get only the errors.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Get only the warnings.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Get the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Move all diagnostics of `other` into this collector.
    pub fn append(&mut self, other: &mut DiagnosticCollector) {
        self.diagnostics.append(&mut other.diagnostics);
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
