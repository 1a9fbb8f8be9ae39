//! The compiled event filter

use crate::operands::OperatorKind;
use crate::types::{AttributeOperand, Variant};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One operand of a filter element, or one select entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum FilterOperand {
    Literal(Variant),
    Attribute(AttributeOperand),
    /// Index into `EventFilter::elements`
    Element(u32),
    /// Index into `EventFilter::select`
    SelectIndex(u32),
}

impl fmt::Display for FilterOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{} {}", value.builtin_type(), value),
            Self::Attribute(operand) => write!(f, "{}", operand),
            Self::Element(index) => write!(f, "element[{}]", index),
            Self::SelectIndex(index) => write!(f, "select[{}]", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterElement {
    pub operator: OperatorKind,
    pub operands: Vec<FilterOperand>,
}

impl fmt::Display for FilterElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.operator)?;
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", operand)?;
        }
        write!(f, ")")
    }
}

/// Select entries plus the linearized WHERE clause. Element 0 is the WHERE
/// root; operator select entries follow the WHERE elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    pub select: Vec<FilterOperand>,
    pub elements: Vec<FilterElement>,
}

impl EventFilter {
    pub fn has_where_clause(&self) -> bool {
        !self.elements.is_empty()
    }

    pub fn element(&self, index: u32) -> Option<&FilterElement> {
        self.elements.get(index as usize)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "select:")?;
        for (i, entry) in self.select.iter().enumerate() {
            writeln!(f, "  [{}] {}", i, entry)?;
        }
        writeln!(f, "elements:")?;
        for (i, element) in self.elements.iter().enumerate() {
            writeln!(f, "  [{}] {}", i, element)?;
        }
        Ok(())
    }
}

/// Assembly statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyStats {
    pub elements: usize,
    pub select_entries: usize,
    /// Element references that reused an already emitted element
    pub shared_elements: usize,
    pub select_indices: usize,
    pub inlined_operands: usize,
    /// A non-operator WHERE root was wrapped in EQUALS(x, true)
    pub wrapped_root: bool,
}

/// Assembler output
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledFilter {
    pub filter: EventFilter,
    pub stats: AssemblyStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let filter = EventFilter {
            select: vec![FilterOperand::Attribute(AttributeOperand::event_field(&[
                "Severity",
            ]))],
            elements: vec![FilterElement {
                operator: OperatorKind::GreaterThan,
                operands: vec![FilterOperand::SelectIndex(0), FilterOperand::Literal(Variant::Int32(5))],
            }],
        };
        let text = filter.to_string();
        assert!(text.contains("[0] /Severity#Value"));
        assert!(text.contains("GREATERTHAN(select[0], INT32 5)"));
    }

    #[test]
    fn test_json_shape() {
        let filter = EventFilter {
            select: vec![],
            elements: vec![FilterElement {
                operator: OperatorKind::Not,
                operands: vec![FilterOperand::Element(1)],
            }],
        };
        let json: serde_json::Value = serde_json::from_str(&filter.to_json().unwrap()).unwrap();
        assert_eq!(json["elements"][0]["operator"], "Not");
        assert_eq!(json["elements"][0]["operands"][0]["kind"], "Element");
        assert_eq!(json["elements"][0]["operands"][0]["value"], 1);
    }
}
