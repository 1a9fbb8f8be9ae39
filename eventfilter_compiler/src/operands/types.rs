//! Operand graph node types
use crate::types::{AttributeOperand, Variant};
use crate::utils::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a node in an `OperandList`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperandId(pub(crate) usize);

impl OperandId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for OperandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Filter operators, numbered as on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    Equals,
    IsNull,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Like,
    Not,
    Between,
    InList,
    And,
    Or,
    Cast,
    OfType,
    BitwiseAnd,
    BitwiseOr,
}

/// Number of children an operator takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl OperatorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "EQUALS",
            Self::IsNull => "ISNULL",
            Self::GreaterThan => "GREATERTHAN",
            Self::LessThan => "LESSTHAN",
            Self::GreaterThanOrEqual => "GREATERTHANOREQUAL",
            Self::LessThanOrEqual => "LESSTHANOREQUAL",
            Self::Like => "LIKE",
            Self::Not => "NOT",
            Self::Between => "BETWEEN",
            Self::InList => "INLIST",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Cast => "CAST",
            Self::OfType => "OFTYPE",
            Self::BitwiseAnd => "BITWISEAND",
            Self::BitwiseOr => "BITWISEOR",
        }
    }

    /// Protocol filter operator id
    pub const fn id(self) -> u32 {
        match self {
            Self::Equals => 0,
            Self::IsNull => 1,
            Self::GreaterThan => 2,
            Self::LessThan => 3,
            Self::GreaterThanOrEqual => 4,
            Self::LessThanOrEqual => 5,
            Self::Like => 6,
            Self::Not => 7,
            Self::Between => 8,
            Self::InList => 9,
            Self::And => 10,
            Self::Or => 11,
            Self::Cast => 12,
            Self::OfType => 14,
            Self::BitwiseAnd => 16,
            Self::BitwiseOr => 17,
        }
    }

    pub const fn arity(self) -> Arity {
        match self {
            Self::Not | Self::IsNull | Self::OfType => Arity::Exactly(1),
            Self::Between => Arity::Exactly(3),
            Self::InList => Arity::AtLeast(1),
            _ => Arity::Exactly(2),
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The four operand shapes
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Variant),
    Attribute(AttributeOperand),
    /// `$name`; `target` is filled in by reference resolution
    Reference {
        name: String,
        target: Option<OperandId>,
    },
    Operator {
        kind: OperatorKind,
        children: Vec<OperandId>,
    },
}

impl Operand {
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Literal(_) => "literal",
            Self::Attribute(_) => "attribute operand",
            Self::Reference { .. } => "reference",
            Self::Operator { .. } => "operator",
        }
    }
}

/// Arena slot: the operand plus its binding name and source location
#[derive(Debug, Clone, PartialEq)]
pub struct OperandNode {
    pub operand: Operand,
    /// Set when the node is the right side of `$name := ...`
    pub declared_name: Option<String>,
    pub span: Span,
}

/// A FOR-clause assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub target: OperandId,
    pub span: Span,
}
