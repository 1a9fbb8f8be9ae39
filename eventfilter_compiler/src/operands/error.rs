//! Arena allocation errors

use crate::logging::codes;
use crate::utils::Span;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// A capacity limit of the operand list was reached
    #[error("too many {what}: limit is {limit} at {span}")]
    Exhausted {
        what: &'static str,
        limit: usize,
        span: Span,
    },
}

impl ArenaError {
    pub fn exhausted(what: &'static str, limit: usize, span: Span) -> Self {
        Self::Exhausted { what, limit, span }
    }

    pub fn error_code(&self) -> codes::Code {
        codes::operands::ARENA_EXHAUSTED
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Exhausted { span, .. } => *span,
        }
    }
}
