//! Definition identities and qualified names.
//!
//! A CHTL name token looks like `[Custom] @Element space.room.Box` or
//! `@Style Box from space.room`. Every part except the base name is optional:
//!
//! ```text
//! [Template|Custom]  @Style|@Element|@Var  a.b.Name  [from x.y]
//! ```

use smol_str::SmolStr;
use std::fmt;

use crate::base::text::is_valid_name;

/// Which declaration form introduced a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Origin {
    Template,
    Custom,
}

impl Origin {
    pub fn keyword(self) -> &'static str {
        match self {
            Origin::Template => "[Template]",
            Origin::Custom => "[Custom]",
        }
    }

    fn from_bracket(text: &str) -> Option<Self> {
        match text {
            "[Template]" => Some(Origin::Template),
            "[Custom]" => Some(Origin::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The group type of a definition: style group, element group or var group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupKind {
    Style,
    Element,
    Var,
}

impl GroupKind {
    pub fn keyword(self) -> &'static str {
        match self {
            GroupKind::Style => "@Style",
            GroupKind::Element => "@Element",
            GroupKind::Var => "@Var",
        }
    }

    fn from_at(text: &str) -> Option<Self> {
        match text {
            "@Style" => Some(GroupKind::Style),
            "@Element" => Some(GroupKind::Element),
            "@Var" => Some(GroupKind::Var),
            _ => None,
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Identity of a registered definition: `(origin, type, name)`.
///
/// The owning namespace is stored on the definition itself; two definitions
/// with the same identity may coexist in different namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identity {
    pub origin: Origin,
    pub kind: GroupKind,
    pub name: SmolStr,
}

impl Identity {
    pub fn new(origin: Origin, kind: GroupKind, name: impl Into<SmolStr>) -> Self {
        Self {
            origin,
            kind,
            name: name.into(),
        }
    }

    pub fn template(kind: GroupKind, name: impl Into<SmolStr>) -> Self {
        Self::new(Origin::Template, kind, name)
    }

    pub fn custom(kind: GroupKind, name: impl Into<SmolStr>) -> Self {
        Self::new(Origin::Custom, kind, name)
    }

    pub fn category(&self) -> Category {
        Category::exact(self.origin, self.kind)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.origin, self.kind, self.name)
    }
}

/// What a use-site expects to find. `None` fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Category {
    pub origin: Option<Origin>,
    pub kind: Option<GroupKind>,
}

impl Category {
    pub const ANY: Category = Category {
        origin: None,
        kind: None,
    };

    pub fn kind(kind: GroupKind) -> Self {
        Self {
            origin: None,
            kind: Some(kind),
        }
    }

    pub fn exact(origin: Origin, kind: GroupKind) -> Self {
        Self {
            origin: Some(origin),
            kind: Some(kind),
        }
    }

    pub fn matches(&self, identity: &Identity) -> bool {
        self.origin.is_none_or(|o| o == identity.origin)
            && self.kind.is_none_or(|k| k == identity.kind)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.origin, self.kind) {
            (Some(o), Some(k)) => write!(f, "{o} {k}"),
            (Some(o), None) => write!(f, "{o}"),
            (None, Some(k)) => write!(f, "{k}"),
            (None, None) => f.write_str("any definition"),
        }
    }
}

/// Reason a token failed to parse as a qualified name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("empty name")]
    Empty,
    #[error("unknown bracket prefix '{0}'")]
    UnknownPrefix(String),
    #[error("unknown type modifier '{0}'")]
    UnknownType(String),
    #[error("invalid identifier '{0}'")]
    InvalidSegment(String),
    #[error("namespace given twice (dotted path and `from`)")]
    DuplicatePath,
    #[error("unexpected '{0}'")]
    Unexpected(String),
}

/// A parsed name token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QualifiedName {
    pub origin: Option<Origin>,
    pub kind: Option<GroupKind>,
    /// Namespace path, outermost first. Empty when unqualified.
    pub path: Vec<SmolStr>,
    pub name: SmolStr,
}

impl QualifiedName {
    /// A bare, unqualified name.
    pub fn simple(name: impl Into<SmolStr>) -> Self {
        Self {
            origin: None,
            kind: None,
            path: Vec::new(),
            name: name.into(),
        }
    }

    /// `@Kind Name`, the composition form used inside bodies.
    pub fn typed(kind: GroupKind, name: impl Into<SmolStr>) -> Self {
        Self {
            kind: Some(kind),
            ..Self::simple(name)
        }
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_qualified(&self) -> bool {
        !self.path.is_empty()
    }

    pub fn category(&self) -> Category {
        Category {
            origin: self.origin,
            kind: self.kind,
        }
    }

    /// Parse a name token.
    pub fn parse(token: &str) -> Result<Self, NameError> {
        let mut words = token.split_whitespace().peekable();

        let mut origin = None;
        if let Some(&word) = words.peek().filter(|w| w.starts_with('[')) {
            origin = Some(
                Origin::from_bracket(word)
                    .ok_or_else(|| NameError::UnknownPrefix(word.to_string()))?,
            );
            words.next();
        }

        let mut kind = None;
        if let Some(&word) = words.peek().filter(|w| w.starts_with('@')) {
            kind = Some(
                GroupKind::from_at(word).ok_or_else(|| NameError::UnknownType(word.to_string()))?,
            );
            words.next();
        }

        let dotted = words.next().ok_or(NameError::Empty)?;
        let mut segments = parse_path(dotted)?;
        let name = segments.pop().ok_or(NameError::Empty)?;
        let mut path = segments;

        match words.next() {
            None => {}
            Some("from") => {
                if !path.is_empty() {
                    return Err(NameError::DuplicatePath);
                }
                let ns = words.next().ok_or(NameError::Empty)?;
                path = parse_path(ns)?;
            }
            Some(other) => return Err(NameError::Unexpected(other.to_string())),
        }
        if let Some(extra) = words.next() {
            return Err(NameError::Unexpected(extra.to_string()));
        }

        Ok(Self {
            origin,
            kind,
            path,
            name,
        })
    }
}

/// Parse a dot-separated namespace path (`a.b.c`).
pub fn parse_path(text: &str) -> Result<Vec<SmolStr>, NameError> {
    if text.is_empty() {
        return Err(NameError::Empty);
    }
    text.split('.')
        .map(|segment| {
            if is_valid_name(segment) {
                Ok(SmolStr::new(segment))
            } else {
                Err(NameError::InvalidSegment(segment.to_string()))
            }
        })
        .collect()
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(origin) = self.origin {
            write!(f, "{origin} ")?;
        }
        if let Some(kind) = self.kind {
            write!(f, "{kind} ")?;
        }
        for segment in &self.path {
            write!(f, "{segment}.")?;
        }
        f.write_str(&self.name)
    }
}

impl std::str::FromStr for QualifiedName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
