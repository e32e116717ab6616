//! Qualified name resolution: walking up namespaces, conflict strategies,
//! type mismatches and malformed tokens.

use chtl::semantic::{ConflictResolutionStrategy, EngineConfig, SemanticError, Severity, codes};
use chtl::syntax::{Category, GroupKind, Identity, Origin};
use rstest::rstest;

use crate::helpers::definition_fixtures::nested_spaces;
use crate::helpers::diagnostic_helpers::*;
use crate::helpers::model_helpers::*;

// =============================================================================
// QUALIFIED NAMES
// =============================================================================

#[rstest]
#[case::dotted("@Element space.Box")]
#[case::from_clause("@Element Box from space")]
#[case::with_origin("[Custom] @Element space.Box")]
fn test_qualified_name_walks_up_from_inner_namespace(#[case] token: &str) {
    let mut fx = nested_spaces();
    let body = resolve_body(
        &mut fx.model,
        token,
        Category::kind(GroupKind::Element),
        fx.room,
    );
    assert_eq!(tags_of(&body), ["section"]);
    assert_no_errors(&fx.model);
}

#[test]
fn test_qualified_name_does_not_search_siblings() {
    let mut fx = nested_spaces();
    // `room` lives under `space`, not under the root.
    let err = fx
        .model
        .resolve("@Style room.Box", Category::ANY, fx.root)
        .unwrap_err();
    assert!(matches!(err, SemanticError::UnresolvedName { .. }));

    let body = resolve_body(&mut fx.model, "@Style room.Box", Category::ANY, fx.space);
    assert_eq!(style_value(&body, "color").as_deref(), Some("red"));
}

// =============================================================================
// UNQUALIFIED NAMES AND STRATEGIES
// =============================================================================

#[test]
fn test_bare_name_prefers_innermost_namespace() {
    let mut fx = nested_spaces();
    let body = resolve_body(
        &mut fx.model,
        "Box",
        Category::kind(GroupKind::Element),
        fx.room,
    );
    assert_eq!(tags_of(&body), ["section"]);

    let body = resolve_body(
        &mut fx.model,
        "Box",
        Category::kind(GroupKind::Element),
        fx.root,
    );
    assert_eq!(tags_of(&body), ["div", "span"]);
}

#[test]
fn test_bare_name_any_category_finds_nearest_group() {
    let mut fx = nested_spaces();
    let instance = fx.model.resolve("Box", Category::ANY, fx.room).unwrap();
    assert_eq!(instance.kind(), GroupKind::Style);
    assert_eq!(instance.identity.unwrap().origin, Origin::Template);
}

#[test]
fn test_error_strategy_reports_ambiguity() {
    let mut fx = nested_spaces();
    fx.model.configure(
        EngineConfig::default()
            .without_default_namespace()
            .with_strategy(ConflictResolutionStrategy::Error),
    );

    let err = fx
        .model
        .resolve("Box", Category::kind(GroupKind::Element), fx.room)
        .unwrap_err();
    match err {
        SemanticError::AmbiguousName { candidates, .. } => assert_eq!(candidates.len(), 2),
        other => panic!("expected ambiguity, got {other:?}"),
    }
    assert_reported(&fx.model, codes::AMBIGUOUS_REFERENCE, Severity::Error);
}

#[test]
fn test_explicit_strategy_prefers_declared_namespace() {
    let mut fx = nested_spaces();
    fx.model.configure(
        EngineConfig::default()
            .without_default_namespace()
            .with_strategy(ConflictResolutionStrategy::PreferExplicitlyQualified),
    );

    let body = resolve_body(
        &mut fx.model,
        "Box",
        Category::kind(GroupKind::Element),
        fx.room,
    );
    assert_eq!(tags_of(&body), ["section"]);
}

#[test]
fn test_template_and_custom_of_same_name_need_origin() {
    let mut model = bare_model();
    style_template(&mut model, "Text", &[("color", "red")], &[]);
    style_custom(&mut model, "Text", &[("color", "blue")], &[]);
    let ctx = model.context();

    assert!(matches!(
        model.resolve("@Style Text", Category::ANY, ctx),
        Err(SemanticError::AmbiguousName { .. })
    ));
    let body = resolve_body(&mut model, "[Custom] @Style Text", Category::ANY, ctx);
    assert_eq!(style_value(&body, "color").as_deref(), Some("blue"));
}

// =============================================================================
// FAILURES
// =============================================================================

#[test]
fn test_wrong_group_type_is_a_kind_mismatch() {
    let mut fx = nested_spaces();
    let err = fx
        .model
        .resolve("@Var Box", Category::ANY, fx.room)
        .unwrap_err();
    assert!(matches!(err, SemanticError::KindMismatch { .. }));
    assert_reported(&fx.model, codes::TYPE_MISMATCH, Severity::Error);
}

#[test]
fn test_unknown_name_is_unresolved() {
    let mut fx = nested_spaces();
    let err = fx
        .model
        .resolve("Nowhere", Category::ANY, fx.room)
        .unwrap_err();
    assert_eq!(err.code(), codes::UNDEFINED_REFERENCE);
    assert!(err.to_string().contains("Nowhere"));
}

#[rstest]
#[case::unknown_type("@Bogus Box")]
#[case::unknown_prefix("[Origin] @Style Box")]
#[case::missing_name("[Template] @Style")]
#[case::trailing_words("@Style Box extra")]
#[case::bad_segment("@Style space..Box")]
#[case::double_path("@Style space.Box from room")]
fn test_malformed_tokens(#[case] token: &str) {
    let mut fx = nested_spaces();
    let err = fx.model.resolve(token, Category::ANY, fx.root).unwrap_err();
    assert!(
        matches!(err, SemanticError::MalformedName { .. }),
        "'{token}' gave {err:?}"
    );
    assert_reported(&fx.model, codes::MALFORMED_NAME, Severity::Error);
}

#[test]
fn test_failed_use_site_yields_empty_instance() {
    let mut fx = nested_spaces();
    let instance = fx
        .model
        .resolve_or_empty("@Element Missing", Category::ANY, fx.root);
    assert!(instance.is_empty());
    assert_eq!(instance.kind(), GroupKind::Element);
    assert!(instance.definition.is_none());
    assert!(fx.model.has_errors());
}

// =============================================================================
// QUERIES
// =============================================================================

#[test]
fn test_visible_definitions_hide_outer_duplicates() {
    let fx = nested_spaces();
    let visible = fx.model.visible_definitions(fx.room, Category::ANY);
    assert_eq!(visible.len(), 2);

    let visible = fx
        .model
        .visible_definitions(fx.root, Category::kind(GroupKind::Element));
    assert_eq!(visible.len(), 1);
}

#[test]
fn test_find_by_namespace_path() {
    let fx = nested_spaces();
    let id = fx
        .model
        .find("space.room", &Identity::template(GroupKind::Style, "Box"))
        .unwrap();
    let def = fx.model.definition(id).unwrap();
    assert_eq!(fx.model.namespace_path(def.namespace), "space.room");
    assert_eq!(fx.model.namespace("space.room"), Some(def.namespace));
    assert!(fx.model.namespace("room").is_none());
}
