//! Character classes for CHTL identifiers.
//!
//! Names of templates, customs, namespaces and var keys follow Unicode
//! Standard Annex #31, extended with `-` so CSS-flavoured names such as
//! `theme-color` are accepted.

/// Check if a character may start a name.
#[inline]
pub fn is_name_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

/// Check if a character may continue a name.
#[inline]
pub fn is_name_char(c: char) -> bool {
    c == '-' || unicode_ident::is_xid_continue(c)
}

/// Check if a whole string is a valid name.
pub fn is_valid_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if is_name_start(first) => chars.all(is_name_char),
        _ => false,
    }
}

/// Find the end (byte offset) of the name starting at `start`.
///
/// Returns `start` itself when no name begins there.
pub fn scan_name(text: &str, start: usize) -> usize {
    let mut iter = text[start..].char_indices();
    match iter.next() {
        Some((_, c)) if is_name_start(c) => {}
        _ => return start,
    }
    for (offset, c) in iter {
        if !is_name_char(c) {
            return start + offset;
        }
    }
    text.len()
}
