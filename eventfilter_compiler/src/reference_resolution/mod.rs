//! Reference Resolution
//!
//! Binds every `$name` to the node its FOR-clause assignment names, walking
//! from the select list and the WHERE root first and then from each bound
//! expression, so an unused binding still has to name defined aliases. Resolution aliases rather than
//! copies: all occurrences of one name point at the same node, so the graph
//! becomes a DAG with shared sub-expressions (or a cyclic graph, which the
//! assembler rejects).

use crate::config::compile_time::references::MAX_ALIAS_CHAIN_DEPTH;
use crate::config::runtime::CompilerPreferences;
use crate::logging::codes;
use crate::operands::{Operand, OperandId, OperandList};
use crate::utils::Span;
use crate::{log_debug, log_error, log_info, log_success};
use std::collections::HashMap;

pub mod error;
pub mod types;

// Re-export main types
pub use error::{ReferenceError, ResolutionResult};
pub use types::ResolutionStats;

type BindingTable = HashMap<String, (OperandId, Span)>;

/// Main entry point for reference resolution
pub fn resolve_references(
    operands: &mut OperandList,
    top: Option<OperandId>,
    preferences: &CompilerPreferences,
) -> ResolutionResult<ResolutionStats> {
    log_info!("Starting reference resolution",
        "nodes" => operands.len(),
        "bindings" => operands.bindings().len(),
        "select_entries" => operands.select_list().len()
    );

    let result = resolve(operands, top, preferences);

    match &result {
        Ok(stats) => {
            log_success!(codes::success::REFERENCE_RESOLUTION_COMPLETE,
                "Reference resolution completed",
                "resolved" => stats.references_resolved,
                "shared" => stats.shared_targets,
                "unused_bindings" => stats.unused_bindings
            );
        }
        Err(error) => {
            log_error!(error.error_code(), "Reference resolution failed",
                span = error.span(),
                "name" => error.affected_name().unwrap_or("-"),
                "error" => error
            );
        }
    }

    result
}

fn resolve(
    operands: &mut OperandList,
    top: Option<OperandId>,
    preferences: &CompilerPreferences,
) -> ResolutionResult<ResolutionStats> {
    let mut walk = ReferenceWalk {
        table: build_binding_table(operands)?,
        visited: vec![false; operands.len()],
        uses: HashMap::new(),
        resolved: Vec::new(),
        log_details: preferences.log_resolution_details,
    };

    let mut stats = ResolutionStats::new();
    stats.bindings = operands.bindings().len();

    // select entries first, in order, then the WHERE root
    let mut roots: Vec<OperandId> = top.into_iter().collect();
    roots.extend(operands.select_list().iter().rev().copied());
    walk.run(operands, roots)?;

    stats.unused_bindings = operands
        .bindings()
        .iter()
        .filter(|binding| !walk.visited[binding.target.index()])
        .count();
    if stats.unused_bindings > 0 {
        log_debug!("Unused FOR-clause bindings", "count" => stats.unused_bindings);
    }

    // bindings nothing uses must still name defined aliases
    let bound: Vec<OperandId> = operands
        .bindings()
        .iter()
        .rev()
        .map(|binding| binding.target)
        .collect();
    walk.run(operands, bound)?;

    for &id in &walk.resolved {
        let length = follow_alias_chain(operands, id)?;
        stats.max_alias_chain = stats.max_alias_chain.max(length);
    }

    stats.references_resolved = walk.resolved.len();
    stats.shared_targets = walk.uses.values().filter(|&&count| count > 1).count();

    Ok(stats)
}

/// Iterative walk state shared by the root and binding passes
struct ReferenceWalk {
    table: BindingTable,
    visited: Vec<bool>,
    uses: HashMap<OperandId, usize>,
    resolved: Vec<OperandId>,
    log_details: bool,
}

impl ReferenceWalk {
    /// Resolve every reference reachable from `stack` not visited yet
    fn run(
        &mut self,
        operands: &mut OperandList,
        mut stack: Vec<OperandId>,
    ) -> ResolutionResult<()> {
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut self.visited[id.index()], true) {
                continue;
            }

            let name = match &operands[id].operand {
                Operand::Operator { children, .. } => {
                    stack.extend(children.iter().rev().copied());
                    continue;
                }
                Operand::Reference { name, .. } => name.clone(),
                Operand::Literal(_) | Operand::Attribute(_) => continue,
            };

            let Some(&(target, _)) = self.table.get(name.as_str()) else {
                return Err(ReferenceError::undefined_reference(&name, operands[id].span));
            };

            operands.set_reference_target(id, target);
            *self.uses.entry(target).or_default() += 1;
            self.resolved.push(id);
            stack.push(target);

            if self.log_details {
                log_debug!("Reference resolved",
                    "name" => &name,
                    "reference" => id,
                    "target" => target,
                    "target_shape" => operands[target].operand.shape()
                );
            }
        }
        Ok(())
    }
}

/// Name table from the FOR-clause assignments; a name may be bound once
fn build_binding_table(operands: &OperandList) -> ResolutionResult<BindingTable> {
    let mut table = BindingTable::with_capacity(operands.bindings().len());
    for binding in operands.bindings() {
        if let Some(&(_, first)) = table.get(binding.name.as_str()) {
            return Err(ReferenceError::duplicate_binding(
                &binding.name,
                first,
                binding.span,
            ));
        }
        table.insert(binding.name.clone(), (binding.target, binding.span));
    }
    Ok(table)
}

/// Walk `$a := $b := ...` from a resolved reference; returns the chain length
fn follow_alias_chain(operands: &OperandList, start: OperandId) -> ResolutionResult<usize> {
    let mut chain: Vec<OperandId> = Vec::new();
    let mut current = start;

    while let Operand::Reference { target, .. } = &operands[current].operand {
        if let Some(position) = chain.iter().position(|&id| id == current) {
            let names = chain[position..]
                .iter()
                .filter_map(|&id| reference_name(operands, id))
                .collect();
            return Err(ReferenceError::alias_cycle(names, operands[start].span));
        }
        if chain.len() >= MAX_ALIAS_CHAIN_DEPTH {
            let name = reference_name(operands, start).unwrap_or_default();
            return Err(ReferenceError::alias_chain_too_deep(
                &name,
                MAX_ALIAS_CHAIN_DEPTH,
                operands[start].span,
            ));
        }
        chain.push(current);
        match target {
            Some(next) => current = *next,
            None => break,
        }
    }

    Ok(chain.len())
}

fn reference_name(operands: &OperandList, id: OperandId) -> Option<String> {
    match &operands[id].operand {
        Operand::Reference { name, .. } => Some(name.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute_path::DefaultAttributePathParser;
    use crate::literal::DefaultValueParser;
    use crate::syntax::{ParseContext, ParsedFilter};
    use assert_matches::assert_matches;

    fn parse(text: &str) -> ParsedFilter {
        ParseContext::new(
            text,
            crate::config::compile_time::syntax::MAX_PARSE_DEPTH,
            &DefaultValueParser,
            &DefaultAttributePathParser,
        )
        .parse()
        .unwrap()
    }

    fn resolve_text(text: &str) -> (ParsedFilter, ResolutionResult<ResolutionStats>) {
        let mut parsed = parse(text);
        let result = resolve_references(
            &mut parsed.operands,
            parsed.top,
            &CompilerPreferences::default(),
        );
        (parsed, result)
    }

    fn where_children(parsed: &ParsedFilter) -> Vec<OperandId> {
        match &parsed.operands[parsed.top.unwrap()].operand {
            Operand::Operator { children, .. } => children.clone(),
            other => panic!("expected operator, found {}", other.shape()),
        }
    }

    fn target_of(parsed: &ParsedFilter, id: OperandId) -> Option<OperandId> {
        match &parsed.operands[id].operand {
            Operand::Reference { target, .. } => *target,
            _ => None,
        }
    }

    #[test]
    fn test_reference_points_at_binding() {
        let (parsed, result) =
            resolve_text("SELECT /A FOR $s := /Severity WHERE GREATERTHAN($s, 500)");
        let stats = result.unwrap();
        assert_eq!(stats.references_resolved, 1);
        assert_eq!(stats.unused_bindings, 0);

        let children = where_children(&parsed);
        let bound = parsed.operands.bindings()[0].target;
        assert_eq!(target_of(&parsed, children[0]), Some(bound));
    }

    #[test]
    fn test_two_uses_share_one_node() {
        let (parsed, result) = resolve_text(
            "SELECT /A FOR $sev := GREATERTHAN(/Severity, 100) WHERE AND($sev, NOT($sev))",
        );
        let stats = result.unwrap();
        assert_eq!(stats.references_resolved, 2);
        assert_eq!(stats.shared_targets, 1);
        assert!(stats.has_sharing());

        let children = where_children(&parsed);
        let inner = match &parsed.operands[children[1]].operand {
            Operand::Operator { children, .. } => children[0],
            _ => unreachable!(),
        };
        assert_eq!(target_of(&parsed, children[0]), target_of(&parsed, inner));
    }

    #[test]
    fn test_references_in_select_are_resolved() {
        let (parsed, result) = resolve_text("SELECT $m FOR $m := /Message");
        assert_eq!(result.unwrap().references_resolved, 1);
        let entry = parsed.operands.select_list()[0];
        assert!(target_of(&parsed, entry).is_some());
    }

    #[test]
    fn test_undefined_reference() {
        let (_, result) = resolve_text("SELECT /A WHERE EQUALS($missing, 1)");
        assert_matches!(
            result,
            Err(ReferenceError::UndefinedReference { ref name, .. }) if name == "missing"
        );
    }

    #[test]
    fn test_undefined_reference_inside_binding() {
        let (_, result) = resolve_text("SELECT /A FOR $a := NOT($b) WHERE $a");
        assert_matches!(
            result,
            Err(ReferenceError::UndefinedReference { ref name, .. }) if name == "b"
        );
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let (_, result) = resolve_text("SELECT /A FOR $a := 1 AND $a := 2 WHERE $a");
        assert_matches!(result, Err(ReferenceError::DuplicateBinding { ref name, .. }) if name == "a");
    }

    #[test]
    fn test_pure_alias_cycle() {
        let (_, result) = resolve_text("SELECT /A FOR $a := $b AND $b := $a WHERE $a");
        assert_matches!(result, Err(ReferenceError::AliasCycle { ref names, .. }) if names.len() == 2);

        let (_, result) = resolve_text("SELECT /A FOR $a := $a WHERE $a");
        assert_matches!(result, Err(ReferenceError::AliasCycle { ref names, .. }) if names == &vec!["a".to_string()]);
    }

    #[test]
    fn test_alias_chain_resolves() {
        let (_, result) = resolve_text("SELECT /A FOR $a := $b AND $b := /Severity WHERE ISNULL($a)");
        let stats = result.unwrap();
        assert_eq!(stats.references_resolved, 2);
        assert_eq!(stats.max_alias_chain, 2);
    }

    #[test]
    fn test_cycle_through_operator_is_left_to_assembly() {
        let (_, result) = resolve_text(
            "SELECT /A FOR $a := AND(/X, $b) AND $b := OR(/Y, $a) WHERE $a",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_unused_binding_is_counted() {
        let (_, result) = resolve_text("SELECT /A FOR $unused := /B");
        let stats = result.unwrap();
        assert_eq!(stats.unused_bindings, 1);
        assert_eq!(stats.references_resolved, 0);

        let (parsed, result) = resolve_text("SELECT /A FOR $a := NOT($b) AND $b := /C");
        let stats = result.unwrap();
        assert_eq!(stats.unused_bindings, 2);
        assert_eq!(stats.references_resolved, 1);
        let not_children = match &parsed.operands[parsed.operands.bindings()[0].target].operand {
            Operand::Operator { children, .. } => children.clone(),
            other => panic!("expected operator, found {}", other.shape()),
        };
        assert_eq!(
            target_of(&parsed, not_children[0]),
            Some(parsed.operands.bindings()[1].target)
        );
    }

    #[test]
    fn test_unused_binding_must_name_defined_aliases() {
        let (_, result) = resolve_text("SELECT /A FOR $unused := $nowhere");
        assert_matches!(
            result,
            Err(ReferenceError::UndefinedReference { ref name, .. }) if name == "nowhere"
        );

        let (_, result) = resolve_text("SELECT /A FOR $a := $b AND $b := $a");
        assert_matches!(result, Err(ReferenceError::AliasCycle { .. }));
    }
}
