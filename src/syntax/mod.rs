//! Syntax: the content model produced by the parser.
//!
//! The CHTL parser (an external collaborator) turns `[Template]` and
//! `[Custom]` blocks into these values and hands them to the semantic
//! layer together with their inheritance edges and use-site edits.

mod content;
mod names;
mod selector;
mod specialization;

pub use content::{
    Body, ElementBody, ElementNode, GroupUsage, Node, PropertyValue, StyleBody, StyleEntry,
    VarBody,
};
pub use names::{Category, GroupKind, Identity, NameError, Origin, QualifiedName, parse_path};
pub use selector::Selector;
pub use specialization::{Anchor, InsertPosition, SpecializationOp};
