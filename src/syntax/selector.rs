//! Element selectors used as specialization anchors.
//!
//! Supported forms: `div`, `.card`, `#main`, and compounds such as
//! `div.card#main`. A selector matches an element when every part it names
//! matches.

use smol_str::SmolStr;
use std::fmt;

use super::content::ElementNode;
use super::names::NameError;
use crate::base::text::scan_name;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selector {
    pub tag: Option<SmolStr>,
    pub classes: Vec<SmolStr>,
    pub id: Option<SmolStr>,
}

impl Selector {
    pub fn tag(tag: impl Into<SmolStr>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn class(class: impl Into<SmolStr>) -> Self {
        Self {
            classes: vec![class.into()],
            ..Self::default()
        }
    }

    pub fn id(id: impl Into<SmolStr>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn parse(text: &str) -> Result<Self, NameError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NameError::Empty);
        }

        let mut selector = Selector::default();
        let mut pos = 0;
        while pos < text.len() {
            let sigil = text[pos..].chars().next().unwrap_or_default();
            let start = if sigil == '.' || sigil == '#' { pos + 1 } else { pos };
            let end = scan_name(text, start);
            if end == start {
                return Err(NameError::InvalidSegment(text[pos..].to_string()));
            }
            let part = SmolStr::new(&text[start..end]);
            match sigil {
                '.' => selector.classes.push(part),
                '#' if selector.id.is_none() => selector.id = Some(part),
                '#' => return Err(NameError::Unexpected(text[pos..].to_string())),
                _ if pos == 0 => selector.tag = Some(part),
                _ => return Err(NameError::Unexpected(text[pos..].to_string())),
            }
            pos = end;
        }
        Ok(selector)
    }

    pub fn matches(&self, element: &ElementNode) -> bool {
        self.tag.as_deref().is_none_or(|t| t == element.tag.as_str())
            && self.id.as_deref().is_none_or(|id| element.id() == Some(id))
            && self.classes.iter().all(|c| element.has_class(c))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            f.write_str(tag)?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Selector {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
