//! Error types for Filter Assembly

use crate::logging::codes;
use crate::utils::Span;
use thiserror::Error;

pub type AssemblyResult<T> = Result<T, AssemblyError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// A sub-expression reaches itself through shared aliases
    #[error("Reference cycle {} at {span}", .path.join(" -> "))]
    Cycle { path: Vec<String>, span: Span },

    /// More elements than the filter may hold
    #[error("Filter needs more than {limit} elements at {span}")]
    ElementLimit { limit: usize, span: Span },

    /// A reference reached assembly without a target
    #[error("Reference '${name}' was not resolved before assembly at {span}")]
    UnresolvedReference { name: String, span: Span },
}

impl AssemblyError {
    pub fn cycle(path: Vec<String>, span: Span) -> Self {
        Self::Cycle { path, span }
    }

    pub fn element_limit(limit: usize, span: Span) -> Self {
        Self::ElementLimit { limit, span }
    }

    pub fn unresolved_reference(name: &str, span: Span) -> Self {
        Self::UnresolvedReference {
            name: name.to_string(),
            span,
        }
    }

    /// Get the appropriate error code for global logging system
    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::Cycle { .. } => codes::assembly::REFERENCE_CYCLE,
            Self::ElementLimit { .. } => codes::assembly::ELEMENT_LIMIT_EXCEEDED,
            Self::UnresolvedReference { .. } => codes::system::INTERNAL_ERROR,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Cycle { span, .. }
            | Self::ElementLimit { span, .. }
            | Self::UnresolvedReference { span, .. } => *span,
        }
    }
}
