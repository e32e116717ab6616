//! `except` rules: exact targets, type categories, scope and namespace
//! levels, and their effect on instance expansion.

use chtl::semantic::{
    ConstraintKind, ExactTarget, RuleLevel, ScopeKind, SemanticError, SemanticModel, Severity,
    TypeCategory, UseContext, codes,
};
use chtl::syntax::{
    Body, Category, ElementBody, ElementNode, GroupKind, GroupUsage, Identity, Origin,
    QualifiedName,
};
use rstest::rstest;

use crate::helpers::diagnostic_helpers::*;
use crate::helpers::model_helpers::*;

/// A unit with `[Custom] @Element Box` and an element scope `S` holding
/// `except_clause`. Returns the model, a context at `S` and one nested in it.
fn guarded(except_clause: &str, except_first: bool) -> (SemanticModel, UseContext, UseContext) {
    let mut model = bare_model();
    if !except_first {
        element_custom(&mut model, "Box", &["div", "span"]);
    }
    model.enter_scope(ScopeKind::Element);
    model
        .register_except(except_clause, RuleLevel::Scope, None)
        .unwrap();
    let at_s = model.context();
    model.enter_scope(ScopeKind::Element);
    let nested = model.context();
    model.exit_scope();
    model.exit_scope();
    if except_first {
        element_custom(&mut model, "Box", &["div", "span"]);
    }
    (model, at_s, nested)
}

// =============================================================================
// MONOTONICITY
// =============================================================================

#[rstest]
fn test_denied_at_scope_and_below(#[values(true, false)] except_first: bool) {
    let (mut model, at_s, nested) = guarded("except [Custom] @Element Box;", except_first);

    for ctx in [at_s, nested] {
        let err = model
            .resolve("@Element Box", Category::ANY, ctx)
            .unwrap_err();
        assert!(matches!(err, SemanticError::ConstraintViolation { .. }));
    }
    assert_reported(&model, codes::CONSTRAINT_VIOLATION, Severity::Error);

    // Outside the guarded scope nothing is denied.
    let global = UseContext::global();
    let body = resolve_body(&mut model, "@Element Box", Category::ANY, global);
    assert_eq!(tags_of(&body), ["div", "span"]);
}

#[rstest]
fn test_bare_name_denies_definition(#[values(true, false)] except_first: bool) {
    let (mut model, at_s, nested) = guarded("except Box;", except_first);

    for ctx in [at_s, nested] {
        let err = model
            .resolve("@Element Box", Category::ANY, ctx)
            .unwrap_err();
        assert!(matches!(err, SemanticError::ConstraintViolation { .. }));
        assert!(model.resolve_definition("Box", Category::ANY, ctx).is_err());
    }
    assert!(
        model
            .resolve("@Element Box", Category::ANY, UseContext::global())
            .is_ok()
    );
}

#[test]
fn test_resolve_definition_honours_rules() {
    let (mut model, at_s, _) = guarded("except @Element;", true);
    assert!(matches!(
        model.resolve_definition("Box", Category::ANY, at_s),
        Err(SemanticError::ConstraintViolation { .. })
    ));
    assert!(
        model
            .resolve_definition("Box", Category::ANY, UseContext::global())
            .is_ok()
    );
}

// =============================================================================
// CATEGORIES
// =============================================================================

#[rstest]
#[case::exact_element("except span;", "span", false)]
#[case::other_element("except span;", "div", true)]
#[case::html("except @Html;", "div", false)]
#[case::definitions_only("except @Element;", "div", true)]
#[case::prefix("except my-*;", "my-card", false)]
#[case::prefix_other("except my-*;", "card", true)]
fn test_plain_elements(#[case] clause: &str, #[case] tag: &str, #[case] allowed: bool) {
    let (mut model, at_s, _) = guarded(clause, false);
    assert_eq!(model.check_element(tag, at_s).is_ok(), allowed);
}

#[rstest]
#[case::any_style("except @Style;", "[Custom] @Style Text", false)]
#[case::template_only("except [Template] @Style;", "[Custom] @Style Text", true)]
#[case::template_only_denies("except [Template] @Style;", "[Template] @Style Text", false)]
#[case::exact_other_name("except @Style Other;", "[Custom] @Style Text", true)]
#[case::var_rule("except @Var;", "[Custom] @Style Text", true)]
#[case::bare_name("except Text;", "[Template] @Style Text", false)]
#[case::bare_prefix("except Te*;", "[Custom] @Style Text", false)]
#[case::bare_other_prefix("except Tx*;", "[Custom] @Style Text", true)]
fn test_definition_categories(#[case] clause: &str, #[case] token: &str, #[case] allowed: bool) {
    let mut model = bare_model();
    style_template(&mut model, "Text", &[("color", "red")], &[]);
    style_custom(&mut model, "Text", &[("color", "blue")], &[]);
    model.enter_scope(ScopeKind::Element);
    model.register_except(clause, RuleLevel::Scope, None).unwrap();
    let ctx = model.context();

    assert_eq!(model.resolve(token, Category::ANY, ctx).is_ok(), allowed);
}

#[test]
fn test_parse_clause_items() {
    let kinds =
        ConstraintKind::parse_clause("except span, [Custom] @Element Box, @Html;").unwrap();
    assert_eq!(
        kinds,
        vec![
            ConstraintKind::Exact(ExactTarget::Name("span".into())),
            ConstraintKind::Exact(ExactTarget::Definition {
                category: Category::exact(Origin::Custom, GroupKind::Element),
                name: "Box".into(),
            }),
            ConstraintKind::TypeCategory(TypeCategory::Html),
        ]
    );
}

#[rstest]
#[case::unknown_type("except @Bogus;")]
#[case::trailing("except span div;")]
#[case::empty("except ;")]
fn test_malformed_clause(#[case] clause: &str) {
    let mut model = bare_model();
    let err = model
        .register_except(clause, RuleLevel::Scope, None)
        .unwrap_err();
    assert!(matches!(err, SemanticError::MalformedName { .. }));
    assert!(model.constraints().rules().is_empty());
}

// =============================================================================
// NAMESPACE-WIDE RULES
// =============================================================================

#[test]
fn test_global_rule_covers_nested_namespaces() {
    let mut model = bare_model();
    model.enter_namespace("locked").unwrap();
    model.register_constraint(
        ConstraintKind::TypeCategory(TypeCategory::Html),
        RuleLevel::Global,
    );
    let locked = model.context();
    model.enter_namespace("inner").unwrap();
    let inner = model.context();
    model.exit_namespace();
    model.exit_namespace();

    assert!(model.check_element("div", locked).is_err());
    assert!(model.check_element("div", inner).is_err());
    assert!(model.check_element("div", UseContext::global()).is_ok());
}

// =============================================================================
// EXPANSION
// =============================================================================

#[test]
fn test_denied_tag_inside_instance_fails_use_site() {
    let (mut model, at_s, _) = guarded("except span;", false);
    assert!(matches!(
        model.resolve("@Element Box", Category::ANY, at_s),
        Err(SemanticError::ConstraintViolation { .. })
    ));
}

#[test]
fn test_denied_tag_below_top_level_fails_use_site() {
    let mut model = bare_model();
    model
        .register_custom(
            Identity::custom(GroupKind::Element, "Box"),
            Body::Element(
                ElementBody::new().with(ElementNode::new("div").with_child(ElementNode::new("span"))),
            ),
            Vec::new(),
            Default::default(),
        )
        .unwrap();
    model.enter_scope(ScopeKind::Element);
    model
        .register_except("except span;", RuleLevel::Scope, None)
        .unwrap();
    let ctx = model.context();

    assert!(matches!(
        model.resolve("@Element Box", Category::ANY, ctx),
        Err(SemanticError::ConstraintViolation { .. })
    ));
    assert_reported(&model, codes::CONSTRAINT_VIOLATION, Severity::Error);
    assert!(
        model
            .resolve("@Element Box", Category::ANY, UseContext::global())
            .is_ok()
    );
}

#[test]
fn test_denied_nested_usage_is_dropped() {
    let mut model = bare_model();
    element_custom(&mut model, "Inner", &["em"]);
    model
        .register_custom(
            Identity::custom(GroupKind::Element, "Outer"),
            Body::Element(
                ElementBody::new()
                    .with(ElementNode::new("div"))
                    .with(GroupUsage::new(QualifiedName::typed(GroupKind::Element, "Inner"))),
            ),
            Vec::new(),
            Default::default(),
        )
        .unwrap();
    model.enter_scope(ScopeKind::Element);
    model
        .register_except("except @Element Inner;", RuleLevel::Scope, None)
        .unwrap();
    let ctx = model.context();

    let body = resolve_body(&mut model, "@Element Outer", Category::ANY, ctx);
    assert_eq!(tags_of(&body), ["div"]);
    assert_reported(&model, codes::CONSTRAINT_VIOLATION, Severity::Error);
}
