//! Specialization Engine — applies use-site edits to a flattened body.
//!
//! The engine only ever sees owned copies: the body it edits was cloned out
//! of the inheritance cache, so nothing it does can leak back into the
//! definition store.
//!
//! `DeleteInheritance` is not handled here. Removing an inherited
//! contribution needs a fresh flatten, which the inheritance resolver does
//! before handing the remaining ops to this engine.

use smol_str::SmolStr;

use super::diagnostics::DiagnosticCollector;
use super::error::SemanticError;
use crate::syntax::{
    Anchor, Body, ElementNode, InsertPosition, Node, Selector, SpecializationOp, StyleBody,
    StyleEntry, VarBody,
};

/// Applies [`SpecializationOp`]s in declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecializationEngine {
    /// Value subtracted from indices written in source.
    index_base: usize,
}

impl SpecializationEngine {
    pub fn new(index_base: usize) -> Self {
        Self { index_base }
    }

    /// Apply `ops` to an owned body and return it.
    ///
    /// Ops whose anchor matches nothing, or that make no sense for the
    /// body's group type, are skipped with a `DanglingAnchor` warning.
    pub fn specialize(
        &self,
        mut body: Body,
        ops: &[SpecializationOp],
        target: &str,
        warnings: &mut DiagnosticCollector,
    ) -> Body {
        for op in ops {
            tracing::trace!("[SPECIALIZE] {} on {}", op, target);
            let applied = match &mut body {
                Body::Style(style) => self.apply_style(style, op),
                Body::Var(vars) => self.apply_var(vars, op),
                Body::Element(element) => self.apply_element(&mut element.nodes, op),
            };
            if !applied {
                warnings.report(
                    SemanticError::DanglingAnchor {
                        anchor: op.to_string(),
                        target: target.to_string(),
                    },
                    None,
                );
            }
        }
        body
    }

    /// Drop placeholders that were never filled, warning for each one.
    pub fn finish(&self, body: &mut Body, target: &str, warnings: &mut DiagnosticCollector) {
        if let Body::Style(style) = body {
            let unfilled: Vec<SmolStr> = style.placeholders().cloned().collect();
            for property in unfilled {
                style.remove(&property);
                warnings.report(
                    SemanticError::UnfilledPlaceholder {
                        property: property.to_string(),
                        target: target.to_string(),
                    },
                    None,
                );
            }
        }
    }

    fn apply_style(&self, style: &mut StyleBody, op: &SpecializationOp) -> bool {
        match op {
            SpecializationOp::DeleteProperty(name) => style.remove(name).is_some(),
            SpecializationOp::AssignProperty { name, value } => {
                style.set(name.clone(), value.clone());
                true
            }
            SpecializationOp::DeleteInheritance(_) => true,
            _ => false,
        }
    }

    fn apply_var(&self, vars: &mut VarBody, op: &SpecializationOp) -> bool {
        match op {
            SpecializationOp::DeleteProperty(name) => vars.vars.shift_remove(name).is_some(),
            SpecializationOp::AssignProperty { name, value } => {
                vars.vars.insert(name.clone(), value.clone());
                true
            }
            SpecializationOp::DeleteInheritance(_) => true,
            _ => false,
        }
    }

    fn apply_element(&self, nodes: &mut Vec<Node>, op: &SpecializationOp) -> bool {
        match op {
            // `delete span;` reaches us as a bare name when the parser could
            // not tell the group type.
            SpecializationOp::DeleteProperty(name) => match Selector::parse(name) {
                Ok(selector) => self.delete(nodes, &Anchor::Selector(selector)),
                Err(_) => false,
            },
            SpecializationOp::DeleteContent(anchor) => self.delete(nodes, anchor),
            SpecializationOp::InsertContent {
                position,
                anchor,
                content,
            } => self.insert(nodes, *position, anchor.as_ref(), content),
            SpecializationOp::ModifyContent {
                anchor,
                style,
                attributes,
            } => {
                let Some(index) = self.find(nodes, anchor) else {
                    return false;
                };
                let Node::Element(element) = &mut nodes[index] else {
                    return false;
                };
                modify(element, style, attributes);
                true
            }
            SpecializationOp::DeleteInheritance(_) => true,
            SpecializationOp::AssignProperty { .. } => false,
        }
    }

    fn delete(&self, nodes: &mut Vec<Node>, anchor: &Anchor) -> bool {
        match self.find(nodes, anchor) {
            Some(index) => {
                nodes.remove(index);
                true
            }
            None => false,
        }
    }

    fn insert(
        &self,
        nodes: &mut Vec<Node>,
        position: InsertPosition,
        anchor: Option<&Anchor>,
        content: &[Node],
    ) -> bool {
        let at = match position {
            InsertPosition::AtTop => 0,
            InsertPosition::AtBottom => nodes.len(),
            InsertPosition::Before | InsertPosition::After | InsertPosition::Replace => {
                let Some(index) = anchor.and_then(|a| self.find(nodes, a)) else {
                    return false;
                };
                match position {
                    InsertPosition::After => index + 1,
                    InsertPosition::Replace => {
                        nodes.remove(index);
                        index
                    }
                    _ => index,
                }
            }
        };
        nodes.splice(at..at, content.iter().cloned());
        true
    }

    /// Index into `nodes` of the element the anchor designates.
    ///
    /// Positional anchors count element nodes only; text and unexpanded
    /// usages are skipped.
    pub fn find(&self, nodes: &[Node], anchor: &Anchor) -> Option<usize> {
        let elements = nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| node.as_element().map(|e| (i, e)));
        let found = match anchor {
            Anchor::Index(n) => {
                let n = n.checked_sub(self.index_base)?;
                elements.map(|(i, _)| i).nth(n)
            }
            Anchor::Selector(selector) => elements
                .filter(|(_, e)| selector.matches(e))
                .map(|(i, _)| i)
                .next(),
            Anchor::Nth(selector, n) => {
                let n = n.checked_sub(self.index_base)?;
                elements
                    .filter(|(_, e)| selector.matches(e))
                    .map(|(i, _)| i)
                    .nth(n)
            }
        };
        tracing::trace!("[SPECIALIZE] anchor {} -> {:?}", anchor, found);
        found
    }
}

fn modify(
    element: &mut ElementNode,
    style: &[StyleEntry],
    attributes: &indexmap::IndexMap<SmolStr, String>,
) {
    for entry in style {
        match entry {
            StyleEntry::Property { name, value } => element.set_style(name.clone(), value.clone()),
            StyleEntry::Usage(_) => element.style.push(entry.clone()),
        }
    }
    for (name, value) in attributes {
        element.attributes.insert(name.clone(), value.clone());
    }
}
