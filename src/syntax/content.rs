//! Structured content of template and custom bodies.
//!
//! The parser hands bodies over in this shape; the semantic layer flattens,
//! specializes and finally returns the same shape as a ready-to-emit instance.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::names::{GroupKind, QualifiedName};
use super::specialization::SpecializationOp;
use crate::base::Span;

/// Value of a style property or var-group key.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyValue {
    Value(String),
    /// A no-value property of a custom style group, filled at the use-site.
    Placeholder,
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Value(v) => Some(v),
            PropertyValue::Placeholder => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, PropertyValue::Placeholder)
    }
}

/// Body of a style group: an ordered property list with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StyleBody {
    pub properties: IndexMap<SmolStr, PropertyValue>,
}

impl StyleBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn with_placeholder(mut self, name: impl Into<SmolStr>) -> Self {
        self.properties
            .insert(name.into(), PropertyValue::Placeholder);
        self
    }

    pub fn set(&mut self, name: impl Into<SmolStr>, value: impl Into<String>) {
        self.properties
            .insert(name.into(), PropertyValue::Value(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(PropertyValue::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.properties.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Names of properties that still have no value.
    pub fn placeholders(&self) -> impl Iterator<Item = &SmolStr> {
        self.properties
            .iter()
            .filter(|(_, v)| v.is_placeholder())
            .map(|(k, _)| k)
    }

    /// Overlay `later` on top of `self`.
    ///
    /// Later values win, except that a placeholder never erases a concrete
    /// value already present.
    pub fn overlay(&mut self, later: StyleBody) {
        for (name, value) in later.properties {
            if value.is_placeholder() && self.get(&name).is_some() {
                continue;
            }
            self.properties.insert(name, value);
        }
    }
}

/// Body of a var group: ordered `key -> value` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarBody {
    pub vars: IndexMap<SmolStr, String>,
}

impl VarBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn overlay(&mut self, later: VarBody) {
        self.vars.extend(later.vars);
    }
}

/// A nested usage of another group inside an element tree or local style.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupUsage {
    pub name: QualifiedName,
    pub specialization: Vec<SpecializationOp>,
    pub span: Option<Span>,
}

impl GroupUsage {
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            specialization: Vec::new(),
            span: None,
        }
    }

    pub fn with_ops(mut self, ops: Vec<SpecializationOp>) -> Self {
        self.specialization = ops;
        self
    }
}

/// One entry of an element's local `style { }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StyleEntry {
    Property { name: SmolStr, value: String },
    Usage(GroupUsage),
}

impl StyleEntry {
    pub fn property(name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        StyleEntry::Property {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An HTML element inside an element group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementNode {
    pub tag: SmolStr,
    pub attributes: IndexMap<SmolStr, String>,
    pub style: Vec<StyleEntry>,
    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            style: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_style(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.style.push(StyleEntry::property(name, value));
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(|s| s.trim())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .into_iter()
            .flat_map(|c| c.split_whitespace())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Set a local style property, replacing an existing one of the same name.
    pub fn set_style(&mut self, name: SmolStr, value: String) {
        for entry in &mut self.style {
            if let StyleEntry::Property { name: n, value: v } = entry {
                if *n == name {
                    *v = value;
                    return;
                }
            }
        }
        self.style.push(StyleEntry::Property { name, value });
    }

    /// Value of a local style property, if present.
    pub fn style_value(&self, name: &str) -> Option<&str> {
        self.style.iter().find_map(|entry| match entry {
            StyleEntry::Property { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }
}

/// A node in an element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Node {
    Element(ElementNode),
    Text(String),
    Usage(GroupUsage),
}

impl Node {
    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }
}

impl From<ElementNode> for Node {
    fn from(node: ElementNode) -> Self {
        Node::Element(node)
    }
}

impl From<GroupUsage> for Node {
    fn from(usage: GroupUsage) -> Self {
        Node::Usage(usage)
    }
}

/// Body of an element group: an ordered list of nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementBody {
    pub nodes: Vec<Node>,
}

impl ElementBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, node: impl Into<Node>) -> Self {
        self.nodes.push(node.into());
        self
    }

    /// Tags of the element nodes, in order. Text and usages are skipped.
    pub fn tags(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(Node::as_element)
            .map(|e| e.tag.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// The structured content of a definition or instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Body {
    Style(StyleBody),
    Element(ElementBody),
    Var(VarBody),
}

impl Body {
    /// An empty body of the given kind.
    pub fn empty(kind: GroupKind) -> Self {
        match kind {
            GroupKind::Style => Body::Style(StyleBody::default()),
            GroupKind::Element => Body::Element(ElementBody::default()),
            GroupKind::Var => Body::Var(VarBody::default()),
        }
    }

    pub fn kind(&self) -> GroupKind {
        match self {
            Body::Style(_) => GroupKind::Style,
            Body::Element(_) => GroupKind::Element,
            Body::Var(_) => GroupKind::Var,
        }
    }

    pub fn as_style(&self) -> Option<&StyleBody> {
        match self {
            Body::Style(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&ElementBody> {
        match self {
            Body::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<&VarBody> {
        match self {
            Body::Var(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Body::Style(s) => s.is_empty(),
            Body::Element(e) => e.is_empty(),
            Body::Var(v) => v.is_empty(),
        }
    }

    /// Merge `later` into `self`.
    ///
    /// Style and var groups override by name; element groups append.
    /// Bodies of different kinds are left untouched and `false` is returned.
    pub fn overlay(&mut self, later: Body) -> bool {
        match (self, later) {
            (Body::Style(base), Body::Style(later)) => base.overlay(later),
            (Body::Var(base), Body::Var(later)) => base.overlay(later),
            (Body::Element(base), Body::Element(later)) => base.nodes.extend(later.nodes),
            _ => return false,
        }
        true
    }
}

impl From<StyleBody> for Body {
    fn from(body: StyleBody) -> Self {
        Body::Style(body)
    }
}

impl From<ElementBody> for Body {
    fn from(body: ElementBody) -> Self {
        Body::Element(body)
    }
}

impl From<VarBody> for Body {
    fn from(body: VarBody) -> Self {
        Body::Var(body)
    }
}
