//! Attribute-Path Sub-Parser boundary
//!
//! The grammar only decides where an attribute operand starts and ends; the
//! captured text is handed to an `AttributePathParser` which produces the
//! structured operand.

pub mod error;
pub mod parser;

pub use error::AttributePathError;
pub use parser::DefaultAttributePathParser;

use crate::types::AttributeOperand;
use crate::utils::Span;

pub trait AttributePathParser {
    fn parse_attribute_operand(
        &self,
        text: &str,
        span: Span,
    ) -> Result<AttributeOperand, AttributePathError>;
}
