//! Use-site edits on custom groups: content insertion and deletion,
//! property assignment, no-value properties and index bases.

use chtl::semantic::{EngineConfig, SemanticError, SemanticModel, Severity, codes};
use chtl::syntax::{
    Anchor, Category, ElementNode, GroupKind, GroupUsage, Identity, InsertPosition, Node,
    QualifiedName, Selector, SpecializationOp, StyleEntry,
};
use indexmap::{IndexMap, IndexSet};
use rstest::rstest;
use smol_str::SmolStr;

use crate::helpers::diagnostic_helpers::*;
use crate::helpers::model_helpers::*;

fn box_model(config: EngineConfig) -> SemanticModel {
    let mut model = SemanticModel::new(config.without_default_namespace());
    element_custom(&mut model, "Box", &["div", "span"]);
    model
}

fn specialize_box(model: &mut SemanticModel, ops: Vec<SpecializationOp>) -> Vec<String> {
    let ctx = model.context();
    let usage = GroupUsage::new(QualifiedName::typed(GroupKind::Element, "Box")).with_ops(ops);
    let instance = model
        .resolve_usage(&usage, Category::kind(GroupKind::Element), ctx)
        .unwrap();
    tags_of(&instance.body)
}

// =============================================================================
// CONTENT DELETION
// =============================================================================

#[test]
fn test_delete_first_child_by_index() {
    let mut model = box_model(EngineConfig::default());
    let tags = specialize_box(
        &mut model,
        vec![SpecializationOp::DeleteContent(Anchor::Index(0))],
    );
    assert_eq!(tags, ["span"]);
    assert_no_errors(&model);
}

#[rstest]
#[case::by_tag(Anchor::Selector(Selector::tag("span")), &["div"])]
#[case::by_nth(Anchor::Nth(Selector::tag("div"), 0), &["span"])]
#[case::by_index(Anchor::Index(1), &["div"])]
fn test_delete_content_anchors(#[case] anchor: Anchor, #[case] expected: &[&str]) {
    let mut model = box_model(EngineConfig::default());
    let tags = specialize_box(&mut model, vec![SpecializationOp::DeleteContent(anchor)]);
    assert_eq!(tags, expected);
}

#[test]
fn test_bare_delete_name_removes_element() {
    let mut model = box_model(EngineConfig::default());
    let tags = specialize_box(&mut model, vec![SpecializationOp::delete_property("div")]);
    assert_eq!(tags, ["span"]);
}

#[test]
fn test_index_base_from_configuration() {
    let mut model = box_model(EngineConfig::default().with_index_initial_count(1));
    let tags = specialize_box(
        &mut model,
        vec![SpecializationOp::DeleteContent(Anchor::Index(1))],
    );
    assert_eq!(tags, ["span"]);

    // Below the base there is nothing to match.
    let tags = specialize_box(
        &mut model,
        vec![SpecializationOp::DeleteContent(Anchor::Index(0))],
    );
    assert_eq!(tags, ["div", "span"]);
    assert_reported(&model, codes::DANGLING_ANCHOR, Severity::Warning);
}

#[test]
fn test_dangling_anchor_is_a_warning() {
    let mut model = box_model(EngineConfig::default());
    let tags = specialize_box(
        &mut model,
        vec![
            SpecializationOp::DeleteContent(Anchor::Selector(Selector::tag("table"))),
            SpecializationOp::DeleteContent(Anchor::Index(0)),
        ],
    );

    // The dangling op is skipped, the rest still apply.
    assert_eq!(tags, ["span"]);
    assert_reported(&model, codes::DANGLING_ANCHOR, Severity::Warning);
    assert_no_errors(&model);
}

// =============================================================================
// CONTENT INSERTION
// =============================================================================

#[rstest]
#[case::at_top(InsertPosition::AtTop, None, &["p", "div", "span"])]
#[case::at_bottom(InsertPosition::AtBottom, None, &["div", "span", "p"])]
#[case::after(InsertPosition::After, Some(Anchor::Index(0)), &["div", "p", "span"])]
#[case::before(
    InsertPosition::Before,
    Some(Anchor::Selector(Selector::tag("span"))),
    &["div", "p", "span"]
)]
#[case::replace(InsertPosition::Replace, Some(Anchor::Index(1)), &["div", "p"])]
fn test_insert_content(
    #[case] position: InsertPosition,
    #[case] anchor: Option<Anchor>,
    #[case] expected: &[&str],
) {
    let mut model = box_model(EngineConfig::default());
    let ops = vec![SpecializationOp::insert(
        position,
        anchor,
        vec![ElementNode::new("p").into()],
    )];
    assert_eq!(specialize_box(&mut model, ops), expected);
}

#[test]
fn test_inserted_usage_is_expanded() {
    let mut model = box_model(EngineConfig::default());
    element_custom(&mut model, "Footer", &["footer"]);
    let usage = GroupUsage::new(QualifiedName::typed(GroupKind::Element, "Footer"));
    let ops = vec![SpecializationOp::insert(
        InsertPosition::AtBottom,
        None,
        vec![Node::Usage(usage)],
    )];

    assert_eq!(specialize_box(&mut model, ops), ["div", "span", "footer"]);
}

// =============================================================================
// CONTENT MODIFICATION
// =============================================================================

#[test]
fn test_modify_content_adds_style_and_attributes() {
    let mut model = box_model(EngineConfig::default());
    let ctx = model.context();
    let mut attributes = IndexMap::new();
    attributes.insert(SmolStr::new("class"), "highlight".to_string());
    let op = SpecializationOp::ModifyContent {
        anchor: Anchor::Nth(Selector::tag("span"), 0),
        style: vec![StyleEntry::property("color", "red")],
        attributes,
    };

    let instance = model
        .instantiate(
            &QualifiedName::typed(GroupKind::Element, "Box"),
            &[op],
            Category::kind(GroupKind::Element),
            ctx,
            None,
        )
        .unwrap();
    let element = instance.body.as_element().unwrap();
    let span = element.nodes[1].as_element().unwrap();
    assert_eq!(span.tag, "span");
    assert!(span.has_class("highlight"));
    assert_eq!(span.style_value("color"), Some("red"));
}

// =============================================================================
// PROPERTIES
// =============================================================================

#[test]
fn test_no_value_property_filled_at_use_site() {
    let mut model = bare_model();
    let mut no_value = IndexSet::new();
    no_value.insert(SmolStr::new("color"));
    model
        .register_custom(
            Identity::custom(GroupKind::Style, "Text"),
            style(&[("font", "serif")]),
            Vec::new(),
            no_value,
        )
        .unwrap();
    let ctx = model.context();

    let usage = GroupUsage::new(QualifiedName::typed(GroupKind::Style, "Text"))
        .with_ops(vec![SpecializationOp::assign("color", "green")]);
    let filled = model
        .resolve_usage(&usage, Category::kind(GroupKind::Style), ctx)
        .unwrap();
    assert_eq!(style_value(&filled.body, "color").as_deref(), Some("green"));
    assert_no_errors(&model);
    assert_eq!(model.warnings().count(), 0);

    // Left unfilled, the property is dropped with a warning.
    let unfilled = resolve_body(&mut model, "@Style Text", Category::ANY, ctx);
    assert_eq!(style_value(&unfilled, "color"), None);
    assert_eq!(style_value(&unfilled, "font").as_deref(), Some("serif"));
    assert_reported(&model, codes::UNFILLED_PLACEHOLDER, Severity::Warning);
}

#[test]
fn test_template_use_site_edits_are_rejected() {
    let mut model = bare_model();
    style_template(&mut model, "Plain", &[("color", "red")], &[]);
    let ctx = model.context();

    let usage = GroupUsage::new(QualifiedName::typed(GroupKind::Style, "Plain"))
        .with_ops(vec![SpecializationOp::delete_property("color")]);
    let err = model
        .resolve_usage(&usage, Category::kind(GroupKind::Style), ctx)
        .unwrap_err();
    assert!(matches!(err, SemanticError::InvalidSpecialization { .. }));
    assert_reported(&model, codes::INVALID_SPECIALIZATION, Severity::Error);
}

#[test]
fn test_var_template_accepts_value_overrides() {
    let mut model = bare_model();
    var_template(&mut model, "Theme", &[("primary", "red"), ("accent", "blue")]);
    let ctx = model.context();

    let usage = GroupUsage::new(QualifiedName::typed(GroupKind::Var, "Theme"))
        .with_ops(vec![SpecializationOp::assign("primary", "black")]);
    let instance = model
        .resolve_usage(&usage, Category::kind(GroupKind::Var), ctx)
        .unwrap();
    let vars = instance.body.as_var().unwrap();
    assert_eq!(vars.get("primary"), Some("black"));
    assert_eq!(vars.get("accent"), Some("blue"));
}
