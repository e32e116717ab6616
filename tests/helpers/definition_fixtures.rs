//! Units shared by several test files, built as the parser would register
//! them.

use chtl::semantic::{SemanticModel, UseContext};

use super::model_helpers::{bare_model, element_custom, style_template};

/// ```text
/// [Custom] @Element Box { div {} span {} }
/// [Namespace] space {
///     [Custom] @Element Box { section {} }
///     [Namespace] room {
///         [Template] @Style Box { color: red; }
///     }
/// }
/// ```
pub fn nested_spaces() -> NestedSpaces {
    let mut model = bare_model();
    let root = model.context();
    element_custom(&mut model, "Box", &["div", "span"]);

    model.enter_namespace("space").unwrap_or_else(|e| panic!("{e}"));
    let space = model.context();
    element_custom(&mut model, "Box", &["section"]);

    model.enter_namespace("room").unwrap_or_else(|e| panic!("{e}"));
    let room = model.context();
    style_template(&mut model, "Box", &[("color", "red")], &[]);

    model.exit_namespace();
    model.exit_namespace();
    NestedSpaces {
        model,
        root,
        space,
        room,
    }
}

/// A registered unit plus the use-site context of each of its namespaces.
pub struct NestedSpaces {
    pub model: SemanticModel,
    pub root: UseContext,
    pub space: UseContext,
    pub room: UseContext,
}

/// ```text
/// [Template] @Style Base { color: red; margin: 0; }
/// [Template] @Style Derived { @Style Base; color: blue; }
/// ```
pub fn base_and_derived() -> SemanticModel {
    let mut model = bare_model();
    style_template(&mut model, "Base", &[("color", "red"), ("margin", "0")], &[]);
    style_template(&mut model, "Derived", &[("color", "blue")], &["Base"]);
    model
}
