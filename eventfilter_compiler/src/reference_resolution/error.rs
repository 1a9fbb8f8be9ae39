//! Error types for Reference Resolution

use crate::logging::codes;
use crate::utils::Span;
use thiserror::Error;

/// Result type for Reference Resolution operations
pub type ResolutionResult<T> = Result<T, ReferenceError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    /// `$name` used without a FOR-clause binding
    #[error("Undefined reference '${name}' at {span}")]
    UndefinedReference { name: String, span: Span },

    /// The same name bound by two assignments
    #[error("Alias '${name}' bound twice: first at {first}, again at {second}")]
    DuplicateBinding {
        name: String,
        first: Span,
        second: Span,
    },

    /// Aliases bound only to each other
    #[error("Alias cycle {} at {span}", describe_cycle(.names))]
    AliasCycle { names: Vec<String>, span: Span },

    /// Alias chain longer than the configured bound
    #[error("Alias chain starting at '${name}' exceeds {limit} links at {span}")]
    AliasChainTooDeep {
        name: String,
        limit: usize,
        span: Span,
    },
}

fn describe_cycle(names: &[String]) -> String {
    let mut path: Vec<String> = names.iter().map(|n| format!("${}", n)).collect();
    if let Some(first) = path.first().cloned() {
        path.push(first);
    }
    path.join(" -> ")
}

impl ReferenceError {
    pub fn undefined_reference(name: &str, span: Span) -> Self {
        Self::UndefinedReference {
            name: name.to_string(),
            span,
        }
    }

    pub fn duplicate_binding(name: &str, first: Span, second: Span) -> Self {
        Self::DuplicateBinding {
            name: name.to_string(),
            first,
            second,
        }
    }

    pub fn alias_cycle(names: Vec<String>, span: Span) -> Self {
        Self::AliasCycle { names, span }
    }

    pub fn alias_chain_too_deep(name: &str, limit: usize, span: Span) -> Self {
        Self::AliasChainTooDeep {
            name: name.to_string(),
            limit,
            span,
        }
    }

    /// Get the appropriate error code for global logging system
    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::UndefinedReference { .. } => codes::references::UNDEFINED_REFERENCE,
            Self::DuplicateBinding { .. } => codes::references::DUPLICATE_BINDING,
            Self::AliasCycle { .. } => codes::references::ALIAS_CYCLE,
            Self::AliasChainTooDeep { .. } => codes::system::RESOURCE_EXHAUSTION,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UndefinedReference { span, .. }
            | Self::AliasCycle { span, .. }
            | Self::AliasChainTooDeep { span, .. } => *span,
            Self::DuplicateBinding { second, .. } => *second,
        }
    }

    /// Name the error is about
    pub fn affected_name(&self) -> Option<&str> {
        match self {
            Self::UndefinedReference { name, .. }
            | Self::DuplicateBinding { name, .. }
            | Self::AliasChainTooDeep { name, .. } => Some(name),
            Self::AliasCycle { names, .. } => names.first().map(|s| s.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_description_closes_the_loop() {
        let error = ReferenceError::alias_cycle(vec!["a".into(), "b".into()], Span::dummy());
        assert!(error.to_string().contains("$a -> $b -> $a"));
        assert_eq!(error.affected_name(), Some("a"));
        assert_eq!(error.error_code(), codes::references::ALIAS_CYCLE);
    }

    #[test]
    fn test_duplicate_binding_reports_second_site() {
        let first = Span::dummy();
        let second = crate::utils::SourceMap::new("FOR $a := 1 AND $a := 2").span(16, 18);
        let error = ReferenceError::duplicate_binding("a", first, second);
        assert_eq!(error.span(), second);
        assert_eq!(error.error_code(), codes::references::DUPLICATE_BINDING);
    }
}
