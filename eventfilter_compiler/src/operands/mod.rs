//! Operand Graph Builder storage
//!
//! `OperandList` is the per-parse arena. Every node created while matching
//! one filter text lives here and is addressed by `OperandId`; dropping the
//! list releases all of them at once.

pub mod error;
pub mod types;

pub use error::ArenaError;
pub use types::{Arity, Binding, Operand, OperandId, OperandNode, OperatorKind};

use crate::config::compile_time::{operands, references};
use crate::utils::Span;
use std::ops::Index;

#[derive(Debug, Clone)]
pub struct OperandList {
    nodes: Vec<OperandNode>,
    select: Vec<OperandId>,
    bindings: Vec<Binding>,
    max_nodes: usize,
    max_select: usize,
    max_bindings: usize,
}

impl Default for OperandList {
    fn default() -> Self {
        Self::new()
    }
}

impl OperandList {
    /// Arena bounded by the compile-time limits
    pub fn new() -> Self {
        Self::with_limits(
            operands::MAX_OPERAND_NODES,
            operands::MAX_SELECT_OPERANDS,
            references::MAX_BINDINGS,
        )
    }

    pub fn with_limits(max_nodes: usize, max_select: usize, max_bindings: usize) -> Self {
        Self {
            nodes: Vec::new(),
            select: Vec::new(),
            bindings: Vec::new(),
            max_nodes,
            max_select,
            max_bindings,
        }
    }

    /// Allocate a node
    pub fn push(&mut self, operand: Operand, span: Span) -> Result<OperandId, ArenaError> {
        if self.nodes.len() >= self.max_nodes {
            return Err(ArenaError::exhausted("operand nodes", self.max_nodes, span));
        }
        let id = OperandId(self.nodes.len());
        self.nodes.push(OperandNode {
            operand,
            declared_name: None,
            span,
        });
        Ok(id)
    }

    /// Append a node to the select list
    pub fn push_select(&mut self, id: OperandId) -> Result<(), ArenaError> {
        if self.select.len() >= self.max_select {
            return Err(ArenaError::exhausted(
                "select operands",
                self.max_select,
                self[id].span,
            ));
        }
        self.select.push(id);
        Ok(())
    }

    /// Record `$name := id` and mark the node with its declared name
    pub fn bind(&mut self, name: &str, id: OperandId, span: Span) -> Result<(), ArenaError> {
        if self.bindings.len() >= self.max_bindings {
            return Err(ArenaError::exhausted("bindings", self.max_bindings, span));
        }
        let node = &mut self.nodes[id.0];
        if node.declared_name.is_none() {
            node.declared_name = Some(name.to_string());
        }
        self.bindings.push(Binding {
            name: name.to_string(),
            target: id,
            span,
        });
        Ok(())
    }

    /// Point a Reference node at its bound target. Returns false when `id`
    /// is not a Reference.
    pub fn set_reference_target(&mut self, id: OperandId, target: OperandId) -> bool {
        match self.nodes.get_mut(id.0).map(|node| &mut node.operand) {
            Some(Operand::Reference { target: slot, .. }) => {
                *slot = Some(target);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: OperandId) -> Option<&OperandNode> {
        self.nodes.get(id.0)
    }

    pub fn select_list(&self) -> &[OperandId] {
        &self.select
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes with their handles, in creation order
    pub fn iter(&self) -> impl Iterator<Item = (OperandId, &OperandNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (OperandId(index), node))
    }
}

/// Handles are only minted by the list that owns them; indexing with a
/// handle from another list panics.
impl Index<OperandId> for OperandList {
    type Output = OperandNode;

    fn index(&self, id: OperandId) -> &OperandNode {
        &self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Variant;
    use assert_matches::assert_matches;

    fn literal(list: &mut OperandList, value: i32) -> OperandId {
        list.push(Operand::Literal(Variant::Int32(value)), Span::dummy())
            .unwrap()
    }

    #[test]
    fn test_push_and_link() {
        let mut list = OperandList::new();
        let a = literal(&mut list, 1);
        let b = literal(&mut list, 2);
        let op = list
            .push(
                Operand::Operator {
                    kind: OperatorKind::Equals,
                    children: vec![a, b],
                },
                Span::dummy(),
            )
            .unwrap();

        assert_eq!(list.len(), 3);
        assert_matches!(&list[op].operand, Operand::Operator { children, .. } if children == &vec![a, b]);
        assert_eq!(list.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![a, b, op]);
    }

    #[test]
    fn test_select_list_keeps_order_and_duplicates() {
        let mut list = OperandList::new();
        let a = literal(&mut list, 1);
        let b = literal(&mut list, 2);
        list.push_select(b).unwrap();
        list.push_select(a).unwrap();
        list.push_select(b).unwrap();
        assert_eq!(list.select_list(), &[b, a, b]);
    }

    #[test]
    fn test_bind_marks_declared_name() {
        let mut list = OperandList::new();
        let a = literal(&mut list, 1);
        list.bind("limit", a, Span::dummy()).unwrap();
        assert_eq!(list[a].declared_name.as_deref(), Some("limit"));
        assert_eq!(list.bindings().len(), 1);
        assert_eq!(list.bindings()[0].target, a);
    }

    #[test]
    fn test_reference_target() {
        let mut list = OperandList::new();
        let a = literal(&mut list, 1);
        let r = list
            .push(
                Operand::Reference {
                    name: "x".into(),
                    target: None,
                },
                Span::dummy(),
            )
            .unwrap();
        assert!(list.set_reference_target(r, a));
        assert!(!list.set_reference_target(a, r));
        assert_matches!(list[r].operand, Operand::Reference { target: Some(t), .. } if t == a);
    }

    #[test]
    fn test_capacity_limits() {
        let mut list = OperandList::with_limits(1, 1, 1);
        let a = literal(&mut list, 1);
        assert_matches!(
            list.push(Operand::Literal(Variant::Int32(2)), Span::dummy()),
            Err(ArenaError::Exhausted { what: "operand nodes", limit: 1, .. })
        );
        list.push_select(a).unwrap();
        assert!(list.push_select(a).is_err());
        list.bind("x", a, Span::dummy()).unwrap();
        assert!(list.bind("y", a, Span::dummy()).is_err());
    }

    #[test]
    fn test_operator_arity() {
        assert!(OperatorKind::Not.arity().accepts(1));
        assert!(OperatorKind::GreaterThan.arity().accepts(2));
        assert!(OperatorKind::Between.arity().accepts(3));
        assert!(OperatorKind::InList.arity().accepts(1));
        assert!(OperatorKind::InList.arity().accepts(5));
        assert!(!OperatorKind::Between.arity().accepts(2));
    }
}
