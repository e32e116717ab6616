//! Foundation types for the CHTL toolchain.
//!
//! This module provides fundamental types used throughout the compiler:
//! - [`Position`], [`Span`] - Line/column positions for source constructs
//! - Identifier character classes shared by name and selector parsing
//!
//! This module has NO dependencies on other chtl modules.

mod position;
pub mod text;

pub use position::{Position, Span};
