//! Var groups: key lookup, use-site overrides and substitution in values.

use chtl::semantic::{InheritanceEdge, SemanticError, SemanticModel, UseContext};
use chtl::syntax::{Category, GroupKind, Identity, QualifiedName};
use rstest::{fixture, rstest};

use crate::helpers::diagnostic_helpers::*;
use crate::helpers::model_helpers::*;

/// `[Template] @Var Theme { primary: red; gap: 4px; }` plus a custom var
/// group inheriting it and a style group named `Palette`.
#[fixture]
fn themed() -> (SemanticModel, UseContext) {
    let mut model = bare_model();
    var_template(&mut model, "Theme", &[("primary", "red"), ("gap", "4px")]);
    model
        .register_custom(
            Identity::custom(GroupKind::Var, "Dark"),
            vars(&[("primary", "black")]),
            vec![InheritanceEdge::explicit(QualifiedName::typed(
                GroupKind::Var,
                "Theme",
            ))],
            Default::default(),
        )
        .unwrap();
    style_template(&mut model, "Palette", &[("color", "Theme(primary)")], &[]);
    let ctx = model.context();
    (model, ctx)
}

#[rstest]
#[case::plain("Theme", "primary", None, "red")]
#[case::override_value("Theme", "primary", Some("blue"), "blue")]
#[case::inherited("Dark", "gap", None, "4px")]
#[case::overridden_by_child("Dark", "primary", None, "black")]
#[case::qualified("[Template] @Var Theme", "gap", None, "4px")]
fn test_resolve_variable(
    themed: (SemanticModel, UseContext),
    #[case] group: &str,
    #[case] key: &str,
    #[case] override_value: Option<&str>,
    #[case] expected: &str,
) {
    let (mut model, ctx) = themed;
    let value = model
        .resolve_variable(group, key, override_value, ctx)
        .unwrap();
    assert_eq!(value, expected);
    assert_no_errors(&model);
}

#[rstest]
fn test_missing_key_is_unresolved(themed: (SemanticModel, UseContext)) {
    let (mut model, ctx) = themed;
    let err = model
        .resolve_variable("Theme", "secondary", None, ctx)
        .unwrap_err();
    assert_eq!(
        err,
        SemanticError::UnresolvedName {
            name: "Theme(secondary)".to_string()
        }
    );
}

#[rstest]
fn test_non_var_group_is_a_kind_mismatch(themed: (SemanticModel, UseContext)) {
    let (mut model, ctx) = themed;
    let err = model
        .resolve_variable("Palette", "color", None, ctx)
        .unwrap_err();
    assert!(matches!(err, SemanticError::KindMismatch { .. }));
}

#[rstest]
#[case::single("Theme(primary)", "red")]
#[case::embedded("1px solid Theme(primary)", "1px solid red")]
#[case::override_value("Theme(primary = blue) Theme(gap)", "blue 4px")]
#[case::css_function("rgb(0, 0, 0) calc(gap)", "rgb(0, 0, 0) calc(gap)")]
#[case::not_a_var_group("Palette(color)", "Palette(color)")]
#[case::no_references("10px", "10px")]
fn test_substitute_variables(
    themed: (SemanticModel, UseContext),
    #[case] text: &str,
    #[case] expected: &str,
) {
    let (mut model, ctx) = themed;
    assert_eq!(model.substitute_variables(text, ctx), expected);
    assert_no_errors(&model);
}

#[rstest]
fn test_style_values_are_substituted_on_resolve(themed: (SemanticModel, UseContext)) {
    let (mut model, ctx) = themed;
    let body = resolve_body(&mut model, "@Style Palette", Category::ANY, ctx);
    assert_eq!(style_value(&body, "color").as_deref(), Some("red"));

    // The stored definition keeps the reference.
    let id = model
        .find("", &Identity::template(GroupKind::Style, "Palette"))
        .unwrap();
    assert_eq!(
        model.definition(id).unwrap().body,
        style(&[("color", "Theme(primary)")])
    );
}

#[rstest]
fn test_missing_key_in_value_is_reported_and_kept(themed: (SemanticModel, UseContext)) {
    let (mut model, ctx) = themed;
    assert_eq!(
        model.substitute_variables("Theme(missing)", ctx),
        "Theme(missing)"
    );
    assert!(model.has_errors());
}
