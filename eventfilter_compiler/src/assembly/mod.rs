//! Filter Assembly
//!
//! Linearizes the resolved operand DAG into the flat element array of an
//! `EventFilter`. Operator nodes become elements, numbered in pre-order from
//! the WHERE root (element 0); literals and attribute operands are inlined at
//! each use site. Each operator node gets one element no matter how many
//! aliases reach it. A node reached again while its own children are still
//! being emitted closes a reference cycle and fails the whole assembly.
//! Bound operators that no root reaches are not emitted, but they are walked
//! the same way so a cycle among them still fails.
//!
//! The walk uses an explicit stack so alias-nested expressions cannot exhaust
//! the native stack.

pub mod error;
pub mod types;

pub use error::{AssemblyError, AssemblyResult};
pub use types::{AssembledFilter, AssemblyStats, EventFilter, FilterElement, FilterOperand};

use crate::config::compile_time::assembly::{MAX_CYCLE_PATH_LENGTH, MAX_ELEMENTS};
use crate::config::compile_time::references::MAX_ALIAS_CHAIN_DEPTH;
use crate::config::runtime::CompilerPreferences;
use crate::logging::codes;
use crate::operands::{Operand, OperandId, OperandList, OperatorKind};
use crate::types::Variant;
use crate::{log_debug, log_error, log_info, log_success};
use std::collections::HashMap;

/// Build the filter for a resolved operand list
pub fn assemble_filter(
    operands: &OperandList,
    top: Option<OperandId>,
    preferences: &CompilerPreferences,
) -> AssemblyResult<AssembledFilter> {
    log_info!("Starting filter assembly",
        "nodes" => operands.len(),
        "select_entries" => operands.select_list().len(),
        "where" => top.is_some()
    );

    let result = FilterAssembler::new(operands)
        .with_select_indices(preferences.emit_select_indices)
        .with_element_logging(preferences.log_assembly_details)
        .assemble(top);

    match &result {
        Ok(assembled) => {
            log_success!(codes::success::FILTER_ASSEMBLY_COMPLETE,
                "Filter assembly completed",
                "elements" => assembled.stats.elements,
                "select_entries" => assembled.stats.select_entries,
                "shared" => assembled.stats.shared_elements,
                "select_indices" => assembled.stats.select_indices
            );
        }
        Err(error) => {
            log_error!(error.error_code(), "Filter assembly failed",
                span = error.span(),
                "error" => error
            );
        }
    }

    result
}

/// Three-color marking; the index is the node's element slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress(u32),
    Done(u32),
}

/// Colour for the check over bindings no root reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unseen,
    Open,
    Closed,
}

/// An operator whose children are being emitted
struct Frame {
    node: OperandId,
    kind: OperatorKind,
    index: u32,
    next_child: usize,
    operands: Vec<FilterOperand>,
}

pub struct FilterAssembler<'a> {
    operands: &'a OperandList,
    marks: Vec<Mark>,
    elements: Vec<Option<FilterElement>>,
    stack: Vec<Frame>,
    /// Non-operator select targets and their select position
    select_positions: HashMap<OperandId, u32>,
    emit_select_indices: bool,
    in_where: bool,
    max_elements: usize,
    log_elements: bool,
    stats: AssemblyStats,
}

impl<'a> FilterAssembler<'a> {
    pub fn new(operands: &'a OperandList) -> Self {
        Self {
            operands,
            marks: vec![Mark::Unvisited; operands.len()],
            elements: Vec::new(),
            stack: Vec::new(),
            select_positions: HashMap::new(),
            emit_select_indices: true,
            in_where: false,
            max_elements: MAX_ELEMENTS,
            log_elements: false,
            stats: AssemblyStats::default(),
        }
    }

    pub fn with_select_indices(mut self, enabled: bool) -> Self {
        self.emit_select_indices = enabled;
        self
    }

    pub fn with_element_logging(mut self, enabled: bool) -> Self {
        self.log_elements = enabled;
        self
    }

    pub fn with_max_elements(mut self, limit: usize) -> Self {
        self.max_elements = limit;
        self
    }

    pub fn assemble(mut self, top: Option<OperandId>) -> AssemblyResult<AssembledFilter> {
        let operands = self.operands;

        let select_targets = operands
            .select_list()
            .iter()
            .map(|&id| self.resolve_alias(id))
            .collect::<AssemblyResult<Vec<_>>>()?;

        if self.emit_select_indices {
            for (position, &target) in select_targets.iter().enumerate() {
                if !matches!(operands[target].operand, Operand::Operator { .. }) {
                    self.select_positions
                        .entry(target)
                        .or_insert(position as u32);
                }
            }
        }

        if let Some(top) = top {
            self.in_where = true;
            let root = self.resolve_alias(top)?;
            if matches!(operands[root].operand, Operand::Operator { .. }) {
                self.emit_tree(root)?;
            } else {
                self.wrap_root(root)?;
            }
            self.in_where = false;
        }

        let mut select = Vec::with_capacity(select_targets.len());
        for target in select_targets {
            let entry = match &operands[target].operand {
                Operand::Operator { .. } => FilterOperand::Element(self.element_for(target)?),
                _ => self.value_operand(target)?,
            };
            select.push(entry);
        }

        debug_assert!(self.stack.is_empty());
        debug_assert!(self.elements.iter().all(Option::is_some));

        self.check_unreached_bindings()?;

        let elements: Vec<FilterElement> = self.elements.into_iter().flatten().collect();
        self.stats.elements = elements.len();
        self.stats.select_entries = select.len();

        Ok(AssembledFilter {
            filter: EventFilter { select, elements },
            stats: self.stats,
        })
    }

    /// A WHERE clause that is a bare value becomes `EQUALS(value, true)`
    fn wrap_root(&mut self, root: OperandId) -> AssemblyResult<()> {
        let index = self.reserve(root)?;
        let subject = self.value_operand(root)?;
        self.elements[index as usize] = Some(FilterElement {
            operator: OperatorKind::Equals,
            operands: vec![subject, FilterOperand::Literal(Variant::Boolean(true))],
        });
        self.stats.wrapped_root = true;
        Ok(())
    }

    /// Element index of an operator node, emitting it if needed
    fn element_for(&mut self, node: OperandId) -> AssemblyResult<u32> {
        match self.marks[node.index()] {
            Mark::Done(index) => {
                self.stats.shared_elements += 1;
                Ok(index)
            }
            Mark::InProgress(_) => Err(self.cycle_error(node)),
            Mark::Unvisited => self.emit_tree(node),
        }
    }

    /// Emit `root` and every operator below it not emitted yet
    fn emit_tree(&mut self, root: OperandId) -> AssemblyResult<u32> {
        let operands = self.operands;
        let root_index = self.open(root)?;

        while let Some(top) = self.stack.len().checked_sub(1) {
            let node = self.stack[top].node;
            let children: &[OperandId] = match &operands[node].operand {
                Operand::Operator { children, .. } => children,
                _ => &[],
            };

            let Some(&child) = children.get(self.stack[top].next_child) else {
                self.close();
                continue;
            };
            self.stack[top].next_child += 1;

            let target = self.resolve_alias(child)?;
            let operand = match &operands[target].operand {
                Operand::Operator { .. } => match self.marks[target.index()] {
                    Mark::Done(index) => {
                        self.stats.shared_elements += 1;
                        FilterOperand::Element(index)
                    }
                    Mark::InProgress(_) => return Err(self.cycle_error(target)),
                    Mark::Unvisited => {
                        // the parent refers to the child's slot before the child is filled
                        let index = self.reserve(target)?;
                        self.stack[top].operands.push(FilterOperand::Element(index));
                        self.push_frame(target, index);
                        continue;
                    }
                },
                _ => self.value_operand(target)?,
            };
            self.stack[top].operands.push(operand);
        }

        Ok(root_index)
    }

    fn open(&mut self, node: OperandId) -> AssemblyResult<u32> {
        let index = self.reserve(node)?;
        self.push_frame(node, index);
        Ok(index)
    }

    /// Claim the next element slot for `node` and mark it in progress
    fn reserve(&mut self, node: OperandId) -> AssemblyResult<u32> {
        if self.elements.len() >= self.max_elements {
            return Err(AssemblyError::element_limit(
                self.max_elements,
                self.operands[node].span,
            ));
        }
        let index = self.elements.len() as u32;
        self.elements.push(None);
        self.marks[node.index()] = Mark::InProgress(index);
        Ok(index)
    }

    fn push_frame(&mut self, node: OperandId, index: u32) {
        let (kind, arity) = match &self.operands[node].operand {
            Operand::Operator { kind, children } => (*kind, children.len()),
            _ => (OperatorKind::Equals, 0),
        };
        self.stack.push(Frame {
            node,
            kind,
            index,
            next_child: 0,
            operands: Vec::with_capacity(arity),
        });
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let element = FilterElement {
            operator: frame.kind,
            operands: frame.operands,
        };
        if self.log_elements {
            log_debug!("Element emitted",
                "index" => frame.index,
                "element" => &element
            );
        }
        self.elements[frame.index as usize] = Some(element);
        self.marks[frame.node.index()] = Mark::Done(frame.index);
    }

    /// Reject cycles among bound operators no root reaches; nothing is emitted
    fn check_unreached_bindings(&self) -> AssemblyResult<()> {
        let operands = self.operands;
        let mut visits = vec![Visit::Unseen; operands.len()];

        for binding in operands.bindings() {
            let target = self.resolve_alias(binding.target)?;
            if self.needs_check(target) && visits[target.index()] == Visit::Unseen {
                self.check_acyclic(target, &mut visits)?;
            }
        }
        Ok(())
    }

    /// Operator not emitted by the walk from the roots
    fn needs_check(&self, node: OperandId) -> bool {
        matches!(self.operands[node].operand, Operand::Operator { .. })
            && self.marks[node.index()] == Mark::Unvisited
    }

    fn check_acyclic(&self, root: OperandId, visits: &mut [Visit]) -> AssemblyResult<()> {
        let operands = self.operands;
        let mut path: Vec<(OperandId, usize)> = vec![(root, 0)];
        visits[root.index()] = Visit::Open;

        while let Some(last) = path.last_mut() {
            let (node, next) = *last;
            let children: &[OperandId] = match &operands[node].operand {
                Operand::Operator { children, .. } => children,
                _ => &[],
            };
            let Some(&child) = children.get(next) else {
                visits[node.index()] = Visit::Closed;
                path.pop();
                continue;
            };
            last.1 += 1;

            let target = self.resolve_alias(child)?;
            if !self.needs_check(target) {
                continue;
            }
            match visits[target.index()] {
                Visit::Closed => {}
                Visit::Open => {
                    let nodes = path.iter().map(|&(id, _)| id).collect::<Vec<_>>();
                    return Err(self.cycle_from(&nodes, target));
                }
                Visit::Unseen => {
                    visits[target.index()] = Visit::Open;
                    path.push((target, 0));
                }
            }
        }
        Ok(())
    }

    /// Literal, attribute operand or select index for a non-operator node
    fn value_operand(&mut self, node: OperandId) -> AssemblyResult<FilterOperand> {
        if self.in_where {
            if let Some(&position) = self.select_positions.get(&node) {
                self.stats.select_indices += 1;
                return Ok(FilterOperand::SelectIndex(position));
            }
        }
        let operand = match &self.operands[node].operand {
            Operand::Literal(value) => FilterOperand::Literal(value.clone()),
            Operand::Attribute(attribute) => FilterOperand::Attribute(attribute.clone()),
            Operand::Operator { .. } => return self.element_for(node).map(FilterOperand::Element),
            Operand::Reference { name, .. } => {
                return Err(AssemblyError::unresolved_reference(
                    name,
                    self.operands[node].span,
                ))
            }
        };
        self.stats.inlined_operands += 1;
        Ok(operand)
    }

    /// Follow resolved references to the node they alias
    fn resolve_alias(&self, id: OperandId) -> AssemblyResult<OperandId> {
        let mut current = id;
        for _ in 0..=MAX_ALIAS_CHAIN_DEPTH {
            match &self.operands[current].operand {
                Operand::Reference {
                    target: Some(next), ..
                } => current = *next,
                Operand::Reference { name, target: None } => {
                    return Err(AssemblyError::unresolved_reference(
                        name,
                        self.operands[current].span,
                    ))
                }
                _ => return Ok(current),
            }
        }
        Err(AssemblyError::cycle(
            vec![self.label(id), self.label(id)],
            self.operands[id].span,
        ))
    }

    /// Path from the first in-progress occurrence of `node` back to itself
    fn cycle_error(&self, node: OperandId) -> AssemblyError {
        let nodes: Vec<OperandId> = self.stack.iter().map(|frame| frame.node).collect();
        self.cycle_from(&nodes, node)
    }

    fn cycle_from(&self, open: &[OperandId], node: OperandId) -> AssemblyError {
        let start = open.iter().position(|&id| id == node).unwrap_or(0);

        let mut path: Vec<String> = open[start..].iter().map(|&id| self.label(id)).collect();
        path.push(self.label(node));

        if path.len() > MAX_CYCLE_PATH_LENGTH {
            path.truncate(MAX_CYCLE_PATH_LENGTH);
            path.push("...".to_string());
        }

        AssemblyError::cycle(path, self.operands[node].span)
    }

    fn label(&self, node: OperandId) -> String {
        let slot = &self.operands[node];
        match (&slot.declared_name, &slot.operand) {
            (Some(name), _) => format!("${}", name),
            (None, Operand::Operator { kind, .. }) => kind.as_str().to_string(),
            (None, Operand::Reference { name, .. }) => format!("${}", name),
            (None, other) => format!("{} {}", other.shape(), node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute_path::DefaultAttributePathParser;
    use crate::literal::DefaultValueParser;
    use crate::reference_resolution::resolve_references;
    use crate::syntax::{ParseContext, ParsedFilter};
    use crate::types::AttributeOperand;
    use assert_matches::assert_matches;

    fn preferences(emit_select_indices: bool) -> CompilerPreferences {
        CompilerPreferences {
            log_match_details: false,
            log_resolution_details: false,
            log_assembly_details: true,
            emit_select_indices,
        }
    }

    fn resolved(text: &str) -> ParsedFilter {
        let mut parsed = ParseContext::new(
            text,
            crate::config::compile_time::syntax::MAX_PARSE_DEPTH,
            &DefaultValueParser,
            &DefaultAttributePathParser,
        )
        .parse()
        .unwrap();
        resolve_references(&mut parsed.operands, parsed.top, &preferences(true)).unwrap();
        parsed
    }

    fn assemble(text: &str) -> AssemblyResult<AssembledFilter> {
        let parsed = resolved(text);
        assemble_filter(&parsed.operands, parsed.top, &preferences(true))
    }

    fn attribute(name: &str) -> FilterOperand {
        FilterOperand::Attribute(AttributeOperand::event_field(&[name]))
    }

    #[test]
    fn test_where_root_is_element_zero() {
        let assembled = assemble(
            "SELECT $1/Severity#Value FOR $s := $1/Severity#Value WHERE GREATERTHAN($s, INT32 500)",
        )
        .unwrap();
        let filter = assembled.filter;

        assert_eq!(filter.select, vec![attribute("Severity")]);
        assert_eq!(
            filter.elements,
            vec![FilterElement {
                operator: OperatorKind::GreaterThan,
                operands: vec![attribute("Severity"), FilterOperand::Literal(Variant::Int32(500))],
            }]
        );
    }

    #[test]
    fn test_children_are_numbered_in_pre_order() {
        let filter = assemble("SELECT /A WHERE AND(NOT(ISNULL(/B)), OR(/C, /D))")
            .unwrap()
            .filter;
        let operators: Vec<_> = filter.elements.iter().map(|e| e.operator).collect();
        assert_eq!(
            operators,
            vec![
                OperatorKind::And,
                OperatorKind::Not,
                OperatorKind::IsNull,
                OperatorKind::Or
            ]
        );
        assert_eq!(
            filter.elements[0].operands,
            vec![FilterOperand::Element(1), FilterOperand::Element(3)]
        );
        assert_eq!(filter.elements[1].operands, vec![FilterOperand::Element(2)]);
    }

    #[test]
    fn test_shared_alias_is_emitted_once() {
        let assembled = assemble(
            "SELECT /A FOR $sev := GREATERTHAN(/Severity, 100) WHERE AND($sev, NOT($sev))",
        )
        .unwrap();
        let filter = assembled.filter;
        assert_eq!(filter.elements.len(), 3);
        assert_eq!(
            filter.elements[0].operands,
            vec![FilterOperand::Element(1), FilterOperand::Element(2)]
        );
        assert_eq!(filter.elements[2].operands, vec![FilterOperand::Element(1)]);
        assert_eq!(assembled.stats.shared_elements, 1);
    }

    #[test]
    fn test_binding_cycle_is_rejected() {
        let error = assemble("SELECT /A FOR $a := AND(/X, $b) AND $b := OR(/Y, $a) WHERE $a")
            .unwrap_err();
        match error {
            AssemblyError::Cycle { path, .. } => {
                assert_eq!(path, vec!["$a", "$b", "$a"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_cycle_in_unused_bindings_is_rejected() {
        let error =
            assemble("SELECT /A FOR $a := AND(/X, $b) AND $b := OR(/Y, $a)").unwrap_err();
        assert_matches!(error, AssemblyError::Cycle { ref path, .. } if path == &vec!["$a", "$b", "$a"]);

        let error = assemble("SELECT /A FOR $a := AND(/X, $b) AND $b := OR(/Y, $a) WHERE ISNULL(/C)")
            .unwrap_err();
        assert_matches!(error, AssemblyError::Cycle { .. });

        let error = assemble("SELECT /A FOR $a := NOT($a)").unwrap_err();
        assert_matches!(error, AssemblyError::Cycle { ref path, .. } if path.len() == 2);
    }

    #[test]
    fn test_unused_bindings_are_not_emitted() {
        let assembled =
            assemble("SELECT /A FOR $n := NOT(/B) AND $m := AND($n, $n) WHERE ISNULL(/C)").unwrap();
        assert_eq!(assembled.filter.elements.len(), 1);
        assert_eq!(assembled.filter.elements[0].operator, OperatorKind::IsNull);
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let error = assemble("SELECT /A FOR $a := NOT($a) WHERE $a").unwrap_err();
        assert_matches!(error, AssemblyError::Cycle { ref path, .. } if path.len() == 2);
    }

    #[test]
    fn test_select_index_for_shared_select_node() {
        let filter = assemble("SELECT /Message, $s FOR $s := /Severity WHERE GREATERTHAN($s, 5)")
            .unwrap()
            .filter;
        assert_eq!(filter.select, vec![attribute("Message"), attribute("Severity")]);
        assert_eq!(filter.elements[0].operands[0], FilterOperand::SelectIndex(1));

        let parsed = resolved("SELECT /Message, $s FOR $s := /Severity WHERE GREATERTHAN($s, 5)");
        let filter = assemble_filter(&parsed.operands, parsed.top, &preferences(false))
            .unwrap()
            .filter;
        assert_eq!(filter.elements[0].operands[0], attribute("Severity"));
    }

    #[test]
    fn test_equal_text_is_not_the_same_node() {
        let filter = assemble("SELECT /Severity WHERE GREATERTHAN(/Severity, 5)")
            .unwrap()
            .filter;
        assert_eq!(filter.elements[0].operands[0], attribute("Severity"));
    }

    #[test]
    fn test_value_root_is_wrapped() {
        let assembled = assemble("SELECT /A FOR $flag := /Active WHERE $flag").unwrap();
        assert!(assembled.stats.wrapped_root);
        assert_eq!(
            assembled.filter.elements,
            vec![FilterElement {
                operator: OperatorKind::Equals,
                operands: vec![attribute("Active"), FilterOperand::Literal(Variant::Boolean(true))],
            }]
        );
    }

    #[test]
    fn test_operator_select_entry_follows_where_elements() {
        let filter = assemble("SELECT /A, NOT(/B) WHERE ISNULL(/C)").unwrap().filter;
        assert_eq!(filter.select[1], FilterOperand::Element(1));
        assert_eq!(filter.elements[1].operator, OperatorKind::Not);
    }

    #[test]
    fn test_operator_select_entry_shared_with_where() {
        let filter = assemble("SELECT $n FOR $n := NOT(/B) WHERE OR($n, /C)").unwrap().filter;
        assert_eq!(filter.elements.len(), 2);
        assert_eq!(filter.select, vec![FilterOperand::Element(1)]);
    }

    #[test]
    fn test_no_where_clause() {
        let filter = assemble("SELECT /A, /B").unwrap().filter;
        assert!(!filter.has_where_clause());
        assert_eq!(filter.select.len(), 2);
    }

    #[test]
    fn test_element_limit() {
        let parsed = resolved("SELECT /A WHERE AND(NOT(/B), NOT(/C))");
        let result = FilterAssembler::new(&parsed.operands)
            .with_max_elements(2)
            .assemble(parsed.top);
        assert_matches!(result, Err(AssemblyError::ElementLimit { limit: 2, .. }));
    }

    #[test]
    fn test_unresolved_reference_is_reported() {
        let parsed = ParseContext::new(
            "SELECT /A WHERE NOT($x)",
            crate::config::compile_time::syntax::MAX_PARSE_DEPTH,
            &DefaultValueParser,
            &DefaultAttributePathParser,
        )
        .parse()
        .unwrap();
        let result = FilterAssembler::new(&parsed.operands).assemble(parsed.top);
        assert_matches!(result, Err(AssemblyError::UnresolvedReference { ref name, .. }) if name == "x");
    }
}
