//! Error types for semantic resolution.

use thiserror::Error;

use super::diagnostics::{Severity, codes};

/// Errors raised while registering or resolving definitions.
///
/// Each error is recorded against one definition or use-site; the rest of
/// the compilation unit keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    /// Same name registered twice in one scope or namespace.
    #[error("duplicate definition: '{name}' is already defined in {scope}")]
    DuplicateName { name: String, scope: String },

    /// A template/custom chain refers back to itself.
    #[error("cyclic inheritance: {}", .path.join(" -> "))]
    CyclicInheritance { path: Vec<String> },

    /// A name matches nothing visible.
    #[error("unresolved name: '{name}'")]
    UnresolvedName { name: String },

    /// A name matches several candidates and the strategy cannot pick one.
    #[error("ambiguous name: '{name}' could be: {}", .candidates.join(", "))]
    AmbiguousName {
        name: String,
        candidates: Vec<String>,
    },

    /// An `except` rule denies the use.
    #[error("'{target}' is not allowed here (except {rule})")]
    ConstraintViolation { target: String, rule: String },

    /// A specialization anchor matched nothing.
    #[error("'{anchor}' matches nothing in {target}")]
    DanglingAnchor { anchor: String, target: String },

    /// The token is not a qualified name.
    #[error("malformed name '{token}': {reason}")]
    MalformedName { token: String, reason: String },

    /// A group of one type used where another is required.
    #[error("type mismatch for '{name}': expected {expected}, found {found}")]
    KindMismatch {
        name: String,
        expected: String,
        found: String,
    },

    /// Edit operations applied to a `[Template]`.
    #[error("{target} is a template and cannot be specialized")]
    InvalidSpecialization { target: String },

    /// A no-value property was never given a value.
    #[error("property '{property}' of {target} has no value")]
    UnfilledPlaceholder { property: String, target: String },
}

impl SemanticError {
    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            SemanticError::DuplicateName { .. } => codes::DUPLICATE_DEFINITION,
            SemanticError::CyclicInheritance { .. } => codes::CIRCULAR_DEPENDENCY,
            SemanticError::UnresolvedName { .. } => codes::UNDEFINED_REFERENCE,
            SemanticError::AmbiguousName { .. } => codes::AMBIGUOUS_REFERENCE,
            SemanticError::ConstraintViolation { .. } => codes::CONSTRAINT_VIOLATION,
            SemanticError::MalformedName { .. } => codes::MALFORMED_NAME,
            SemanticError::KindMismatch { .. } => codes::TYPE_MISMATCH,
            SemanticError::InvalidSpecialization { .. } => codes::INVALID_SPECIALIZATION,
            SemanticError::DanglingAnchor { .. } => codes::DANGLING_ANCHOR,
            SemanticError::UnfilledPlaceholder { .. } => codes::UNFILLED_PLACEHOLDER,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SemanticError::DanglingAnchor { .. } | SemanticError::UnfilledPlaceholder { .. } => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }

    pub(crate) fn malformed(token: &str, reason: impl ToString) -> Self {
        SemanticError::MalformedName {
            token: token.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn unresolved(name: impl ToString) -> Self {
        SemanticError::UnresolvedName {
            name: name.to_string(),
        }
    }
}

pub type SemanticResult<T> = Result<T, SemanticError>;
