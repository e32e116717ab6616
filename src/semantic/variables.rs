//! Var group references inside property values.
//!
//! A value such as `1px solid ThemeColor(primary)` refers to key `primary`
//! of var group `ThemeColor`; `ThemeColor(primary = red)` overrides it at
//! the use-site. Plain CSS functions (`rgb(0, 0, 0)`) have the same shape,
//! so a reference is only replaced when its group resolves to a var group.

use std::ops::Range;

use crate::base::text::{is_name_char, is_valid_name, scan_name};

/// A `Group(key)` or `Group(key = value)` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarReference<'t> {
    pub group: &'t str,
    pub key: &'t str,
    pub override_value: Option<&'t str>,
    /// Byte range of the whole reference in the scanned text.
    pub range: Range<usize>,
}

/// Every reference-shaped occurrence in `text`, left to right.
pub fn find_references(text: &str) -> Vec<VarReference<'_>> {
    let mut found = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let starts_word = text[..pos]
            .chars()
            .next_back()
            .is_none_or(|prev| !is_name_char(prev));
        let end = if starts_word { scan_name(text, pos) } else { pos };
        if end == pos {
            pos += text[pos..].chars().next().map_or(1, char::len_utf8);
            continue;
        }
        if let Some(reference) = reference_at(text, pos, end) {
            pos = reference.range.end;
            found.push(reference);
        } else {
            pos = end;
        }
    }
    found
}

fn reference_at(text: &str, start: usize, name_end: usize) -> Option<VarReference<'_>> {
    let rest = text[name_end..].strip_prefix('(')?;
    let close = rest.find(')')?;
    let inner = &rest[..close];
    let (key, override_value) = match inner.split_once('=') {
        Some((key, value)) => (key.trim(), Some(value.trim())),
        None => (inner.trim(), None),
    };
    if !is_valid_name(key) {
        return None;
    }
    Some(VarReference {
        group: &text[start..name_end],
        key,
        override_value,
        range: start..name_end + 1 + close + 1,
    })
}

/// Replace each reference for which `lookup` yields a value.
pub fn substitute<F>(text: &str, mut lookup: F) -> String
where
    F: FnMut(&VarReference<'_>) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for reference in find_references(text) {
        if let Some(value) = lookup(&reference) {
            out.push_str(&text[last..reference.range.start]);
            out.push_str(&value);
            last = reference.range.end;
        }
    }
    out.push_str(&text[last..]);
    out
}
