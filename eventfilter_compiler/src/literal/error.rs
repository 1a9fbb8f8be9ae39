//! Error types for literal value conversion

use crate::logging::codes;
use crate::types::BuiltinType;
use crate::utils::Span;
use thiserror::Error;

/// Literal conversion failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Text does not have the lexical form of the declared type
    #[error("invalid {ty} literal '{text}': {reason} at {span}")]
    InvalidLiteral {
        ty: BuiltinType,
        text: String,
        reason: String,
        span: Span,
    },

    /// Text is well formed but the value does not fit the declared type
    #[error("{ty} literal '{text}' is out of range at {span}")]
    OutOfRange {
        ty: BuiltinType,
        text: String,
        span: Span,
    },
}

impl ConversionError {
    pub fn invalid_literal(ty: BuiltinType, text: &str, reason: &str, span: Span) -> Self {
        Self::InvalidLiteral {
            ty,
            text: text.to_string(),
            reason: reason.to_string(),
            span,
        }
    }

    pub fn out_of_range(ty: BuiltinType, text: &str, span: Span) -> Self {
        Self::OutOfRange {
            ty,
            text: text.to_string(),
            span,
        }
    }

    /// Get the appropriate error code for global logging system
    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::InvalidLiteral { .. } => codes::literal::INVALID_LITERAL,
            Self::OutOfRange { .. } => codes::literal::LITERAL_OUT_OF_RANGE,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::InvalidLiteral { span, .. } | Self::OutOfRange { span, .. } => *span,
        }
    }
}
