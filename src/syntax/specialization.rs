//! Specialization operations written at a use-site or on an inheritance edge.
//!
//! ```text
//! @Element Box {
//!     delete span;                 DeleteContent(Selector)
//!     delete div[1];               DeleteContent(Nth)
//!     delete @Element Line;        DeleteInheritance
//!     insert after div[0] { … }    InsertContent
//!     div[1] { style { … } }       ModifyContent
//! }
//! @Style Text { delete color; }    DeleteProperty
//! @Style Text { color: red; }      AssignProperty
//! ```

use indexmap::IndexMap;
use smol_str::SmolStr;
use std::fmt;

use super::content::{Node, StyleEntry};
use super::names::{NameError, QualifiedName};
use super::selector::Selector;

/// Where inserted content goes relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InsertPosition {
    After,
    Before,
    Replace,
    AtTop,
    AtBottom,
}

impl InsertPosition {
    /// `at top` / `at bottom` ignore any anchor.
    pub fn needs_anchor(self) -> bool {
        matches!(
            self,
            InsertPosition::After | InsertPosition::Before | InsertPosition::Replace
        )
    }
}

impl fmt::Display for InsertPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InsertPosition::After => "after",
            InsertPosition::Before => "before",
            InsertPosition::Replace => "replace",
            InsertPosition::AtTop => "at top",
            InsertPosition::AtBottom => "at bottom",
        })
    }
}

/// Addresses a child of an element group.
///
/// Indices are written in source numbering; the engine subtracts the
/// configured `INDEX_INITIAL_COUNT` before matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Anchor {
    /// Position among the element children.
    Index(usize),
    /// First element matching the selector.
    Selector(Selector),
    /// n-th element matching the selector (`div[1]`).
    Nth(Selector, usize),
}

impl Anchor {
    /// Parse `div`, `.card`, or `div[1]`.
    pub fn parse(text: &str) -> Result<Self, NameError> {
        let text = text.trim();
        match text.strip_suffix(']').and_then(|t| t.split_once('[')) {
            Some((sel, index)) => {
                let index = index
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| NameError::Unexpected(index.to_string()))?;
                if sel.trim().is_empty() {
                    Ok(Anchor::Index(index))
                } else {
                    Ok(Anchor::Nth(Selector::parse(sel)?, index))
                }
            }
            None => Ok(Anchor::Selector(Selector::parse(text)?)),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Index(i) => write!(f, "[{i}]"),
            Anchor::Selector(sel) => write!(f, "{sel}"),
            Anchor::Nth(sel, i) => write!(f, "{sel}[{i}]"),
        }
    }
}

/// A single edit applied to a flattened body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpecializationOp {
    /// `delete color;` on a style or var group.
    DeleteProperty(SmolStr),
    /// `delete @Style WhiteText;` removes an inherited contribution.
    DeleteInheritance(QualifiedName),
    InsertContent {
        position: InsertPosition,
        anchor: Option<Anchor>,
        content: Vec<Node>,
    },
    DeleteContent(Anchor),
    /// Fill a placeholder or override a property / var key.
    AssignProperty { name: SmolStr, value: String },
    /// Add local style entries and attributes to a matched child.
    ModifyContent {
        anchor: Anchor,
        style: Vec<StyleEntry>,
        attributes: IndexMap<SmolStr, String>,
    },
}

impl SpecializationOp {
    pub fn delete_property(name: impl Into<SmolStr>) -> Self {
        SpecializationOp::DeleteProperty(name.into())
    }

    pub fn assign(name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        SpecializationOp::AssignProperty {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn insert(position: InsertPosition, anchor: Option<Anchor>, content: Vec<Node>) -> Self {
        SpecializationOp::InsertContent {
            position,
            anchor,
            content,
        }
    }
}

impl fmt::Display for SpecializationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecializationOp::DeleteProperty(name) => write!(f, "delete {name}"),
            SpecializationOp::DeleteInheritance(target) => write!(f, "delete {target}"),
            SpecializationOp::InsertContent {
                position, anchor, ..
            } => match anchor {
                Some(anchor) => write!(f, "insert {position} {anchor}"),
                None => write!(f, "insert {position}"),
            },
            SpecializationOp::DeleteContent(anchor) => write!(f, "delete {anchor}"),
            SpecializationOp::AssignProperty { name, value } => write!(f, "{name}: {value}"),
            SpecializationOp::ModifyContent { anchor, .. } => write!(f, "{anchor} {{ … }}"),
        }
    }
}
