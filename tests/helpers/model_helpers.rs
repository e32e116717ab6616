//! Model builders: construct a `SemanticModel` the way the parser would.

use chtl::semantic::{DefId, EngineConfig, InheritanceEdge, SemanticModel, UseContext};
use chtl::syntax::{
    Body, Category, ElementBody, ElementNode, GroupKind, Identity, QualifiedName, StyleBody,
    VarBody,
};

/// A model whose definitions land in the root namespace.
pub fn bare_model() -> SemanticModel {
    SemanticModel::new(EngineConfig::default().without_default_namespace())
}

/// A model for a unit named `file_stem`, with its implicit namespace open.
pub fn unit_model(file_stem: &str) -> SemanticModel {
    let mut model = SemanticModel::default();
    model.begin_unit(file_stem);
    model
}

pub fn style(pairs: &[(&str, &str)]) -> Body {
    pairs
        .iter()
        .fold(StyleBody::new(), |body, (name, value)| body.with(*name, *value))
        .into()
}

pub fn vars(pairs: &[(&str, &str)]) -> Body {
    pairs
        .iter()
        .fold(VarBody::new(), |body, (key, value)| body.with(*key, *value))
        .into()
}

/// An element body of empty top-level elements.
pub fn elements(tags: &[&str]) -> Body {
    tags.iter()
        .fold(ElementBody::new(), |body, tag| body.with(ElementNode::new(*tag)))
        .into()
}

/// Composition edges (`@Kind Parent;`) for each parent name.
pub fn composed(kind: GroupKind, parents: &[&str]) -> Vec<InheritanceEdge> {
    parents
        .iter()
        .map(|parent| InheritanceEdge::composition(QualifiedName::typed(kind, *parent)))
        .collect()
}

/// Register `[Template] @Style name` composed from `parents`.
pub fn style_template(
    model: &mut SemanticModel,
    name: &str,
    pairs: &[(&str, &str)],
    parents: &[&str],
) -> DefId {
    model
        .register_template(
            Identity::template(GroupKind::Style, name),
            style(pairs),
            composed(GroupKind::Style, parents),
        )
        .unwrap_or_else(|e| panic!("registering {name} failed: {e}"))
}

/// Register `[Custom] @Style name` composed from `parents`.
pub fn style_custom(
    model: &mut SemanticModel,
    name: &str,
    pairs: &[(&str, &str)],
    parents: &[&str],
) -> DefId {
    model
        .register_custom(
            Identity::custom(GroupKind::Style, name),
            style(pairs),
            composed(GroupKind::Style, parents),
            Default::default(),
        )
        .unwrap_or_else(|e| panic!("registering {name} failed: {e}"))
}

/// Register `[Custom] @Element name` holding empty `tags`.
pub fn element_custom(model: &mut SemanticModel, name: &str, tags: &[&str]) -> DefId {
    model
        .register_custom(
            Identity::custom(GroupKind::Element, name),
            elements(tags),
            Vec::new(),
            Default::default(),
        )
        .unwrap_or_else(|e| panic!("registering {name} failed: {e}"))
}

/// Register `[Template] @Var name`.
pub fn var_template(model: &mut SemanticModel, name: &str, pairs: &[(&str, &str)]) -> DefId {
    model
        .register_template(Identity::template(GroupKind::Var, name), vars(pairs), Vec::new())
        .unwrap_or_else(|e| panic!("registering {name} failed: {e}"))
}

/// Top-level element tags of an element body.
pub fn tags_of(body: &Body) -> Vec<String> {
    body.as_element()
        .unwrap_or_else(|| panic!("expected an element body, got {body:?}"))
        .tags()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Value of `property` in a style body.
pub fn style_value(body: &Body, property: &str) -> Option<String> {
    body.as_style()
        .unwrap_or_else(|| panic!("expected a style body, got {body:?}"))
        .get(property)
        .map(str::to_string)
}

/// Resolve `token` at `ctx` and return the instance body.
pub fn resolve_body(
    model: &mut SemanticModel,
    token: &str,
    expected: Category,
    ctx: UseContext,
) -> Body {
    model
        .resolve(token, expected, ctx)
        .unwrap_or_else(|e| panic!("'{token}' did not resolve: {e}"))
        .body
}
