//! Literal Value Converter
//!
//! The grammar recognises the lexical shape of a literal and captures its
//! raw text; turning that text into a typed value is delegated to a
//! `ValueParser`. `DefaultValueParser` covers every builtin type the
//! grammar can name.

pub mod converter;
pub mod error;

pub use converter::DefaultValueParser;
pub use error::ConversionError;

use crate::types::{BuiltinType, Variant};
use crate::utils::Span;

/// Typed-value parser consulted by the grammar for each literal
pub trait ValueParser {
    /// Convert `text` (the raw captured lexeme) into a value of type `ty`.
    /// `span` locates the lexeme for error reporting.
    fn parse_value(&self, ty: BuiltinType, text: &str, span: Span)
        -> Result<Variant, ConversionError>;
}
