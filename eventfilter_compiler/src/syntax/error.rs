//! Error types for the grammar pass
//!
//! `SyntaxError` covers input that does not match the grammar. `ParseError`
//! is what the pass reports: the sticky first failure, which may also come
//! from a semantic action (literal conversion, attribute path, arena).

use crate::attribute_path::AttributePathError;
use crate::literal::ConversionError;
use crate::logging::{codes, Code};
use crate::operands::ArenaError;
use crate::utils::Span;

pub type SyntaxResult<T> = Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Unexpected {found} at {span}: expected {}", .expected.join(" or "))]
    UnexpectedInput {
        expected: Vec<String>,
        found: String,
        span: Span,
    },

    #[error("Maximum nesting depth {max_depth} exceeded at {span}")]
    MaxDepthExceeded { max_depth: usize, span: Span },

    #[error("Identifier '${name}' exceeds {max_length} characters at {span}")]
    IdentifierTooLong {
        name: String,
        max_length: usize,
        span: Span,
    },
}

impl SyntaxError {
    pub fn unexpected_input(expected: &[&str], found: &str, span: Span) -> Self {
        let expected = if expected.is_empty() {
            vec!["valid filter syntax".to_string()]
        } else {
            expected
                .iter()
                .map(|e| {
                    if e.bytes().any(|b| b.is_ascii_lowercase()) {
                        e.to_string()
                    } else {
                        format!("'{}'", e)
                    }
                })
                .collect()
        };
        Self::UnexpectedInput {
            expected,
            found: found.to_string(),
            span,
        }
    }

    pub fn max_depth_exceeded(max_depth: usize, span: Span) -> Self {
        Self::MaxDepthExceeded { max_depth, span }
    }

    pub fn identifier_too_long(name: &str, max_length: usize, span: Span) -> Self {
        Self::IdentifierTooLong {
            name: name.to_string(),
            max_length,
            span,
        }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::UnexpectedInput { .. } => codes::syntax::UNEXPECTED_INPUT,
            Self::MaxDepthExceeded { .. } => codes::syntax::MAX_RECURSION_DEPTH,
            Self::IdentifierTooLong { .. } => codes::syntax::IDENTIFIER_TOO_LONG,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedInput { span, .. }
            | Self::MaxDepthExceeded { span, .. }
            | Self::IdentifierTooLong { span, .. } => *span,
        }
    }

    /// Depth exhaustion is a resource bound, not a grammar mismatch
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, Self::MaxDepthExceeded { .. })
    }
}

/// First failure of the grammar pass
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Literal(#[from] ConversionError),

    #[error(transparent)]
    AttributePath(#[from] AttributePathError),

    #[error(transparent)]
    Arena(#[from] ArenaError),
}

impl ParseError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::Syntax(e) => e.error_code(),
            Self::Literal(e) => e.error_code(),
            Self::AttributePath(e) => e.error_code(),
            Self::Arena(e) => e.error_code(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Syntax(e) => e.span(),
            Self::Literal(e) => e.span(),
            Self::AttributePath(e) => e.span(),
            Self::Arena(e) => e.span(),
        }
    }
}
