//! Error types for attribute-path parsing

use crate::logging::codes;
use crate::utils::Span;
use thiserror::Error;

/// Malformed node-id/path/attribute/range text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributePathError {
    #[error("empty attribute operand at {span}")]
    Empty { span: Span },

    #[error("invalid type definition node id '{text}': {reason} at {span}")]
    InvalidNodeId {
        text: String,
        reason: String,
        span: Span,
    },

    #[error("empty browse name in '{path}' at {span}")]
    EmptyBrowseName { path: String, span: Span },

    #[error("invalid browse name '{name}': {reason} at {span}")]
    InvalidBrowseName {
        name: String,
        reason: String,
        span: Span,
    },

    #[error("unknown attribute '{name}' at {span}")]
    UnknownAttribute { name: String, span: Span },

    #[error("invalid index range '[{text}]' at {span}")]
    InvalidRange { text: String, span: Span },

    #[error("unexpected '{text}' after attribute operand at {span}")]
    TrailingInput { text: String, span: Span },
}

impl AttributePathError {
    pub fn invalid_node_id(text: &str, reason: &str, span: Span) -> Self {
        Self::InvalidNodeId {
            text: text.to_string(),
            reason: reason.to_string(),
            span,
        }
    }

    pub fn invalid_browse_name(name: &str, reason: &str, span: Span) -> Self {
        Self::InvalidBrowseName {
            name: name.to_string(),
            reason: reason.to_string(),
            span,
        }
    }

    pub fn unknown_attribute(name: &str, span: Span) -> Self {
        Self::UnknownAttribute {
            name: name.to_string(),
            span,
        }
    }

    pub fn invalid_range(text: &str, span: Span) -> Self {
        Self::InvalidRange {
            text: text.to_string(),
            span,
        }
    }

    pub fn error_code(&self) -> codes::Code {
        codes::attribute::INVALID_ATTRIBUTE_PATH
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Empty { span }
            | Self::InvalidNodeId { span, .. }
            | Self::EmptyBrowseName { span, .. }
            | Self::InvalidBrowseName { span, .. }
            | Self::UnknownAttribute { span, .. }
            | Self::InvalidRange { span, .. }
            | Self::TrailingInput { span, .. } => *span,
        }
    }
}
