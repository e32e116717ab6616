//! Arena identifiers.
//!
//! Scopes, namespaces and definitions live in flat vectors and refer to each
//! other by index, so parent links never need shared ownership.

use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// Create an id from an arena index
            pub fn new(index: usize) -> Self {
                Self(index as u32)
            }

            /// Get the index into the arena
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

arena_id!(
    /// Identifier of a lexical scope.
    ScopeId
);
arena_id!(
    /// Identifier of a namespace node.
    NamespaceId
);
arena_id!(
    /// Identifier of a registered template or custom definition.
    DefId
);

impl ScopeId {
    /// The Global scope, alive for the whole compilation unit.
    pub const GLOBAL: ScopeId = ScopeId(0);
}

impl NamespaceId {
    /// The unnamed root namespace.
    pub const ROOT: NamespaceId = NamespaceId(0);
}
