use crate::assembly::AssemblyError;
use crate::attribute_path::AttributePathError;
use crate::literal::ConversionError;
use crate::logging::{codes, Code};
use crate::operands::ArenaError;
use crate::reference_resolution::ReferenceError;
use crate::syntax::{ParseError, SyntaxError};
use crate::utils::{SourceMap, Span};

/// What went wrong, independent of the pass that noticed it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    LiteralConversion,
    AttributePath,
    UnresolvedReference,
    DuplicateBinding,
    Cycle,
    ResourceExhaustion,
    /// The filter source could not be read
    Input,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::LiteralConversion => "literal conversion",
            Self::AttributePath => "attribute path",
            Self::UnresolvedReference => "unresolved reference",
            Self::DuplicateBinding => "duplicate binding",
            Self::Cycle => "cycle",
            Self::ResourceExhaustion => "resource exhaustion",
            Self::Input => "input",
        }
    }
}

/// Compilation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("Filter text is {length} bytes (max: {limit})")]
    InputTooLarge { length: usize, limit: usize },

    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Syntax analysis failed: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Literal conversion failed: {0}")]
    Literal(#[from] ConversionError),

    #[error("Attribute operand rejected: {0}")]
    AttributePath(#[from] AttributePathError),

    #[error("Operand allocation failed: {0}")]
    Arena(#[from] ArenaError),

    #[error("Reference resolution failed: {0}")]
    Reference(#[from] ReferenceError),

    #[error("Filter assembly failed: {0}")]
    Assembly(#[from] AssemblyError),
}

impl From<ParseError> for CompileError {
    fn from(error: ParseError) -> Self {
        match error {
            ParseError::Syntax(e) => Self::Syntax(e),
            ParseError::Literal(e) => Self::Literal(e),
            ParseError::AttributePath(e) => Self::AttributePath(e),
            ParseError::Arena(e) => Self::Arena(e),
        }
    }
}

impl CompileError {
    pub fn io(path: &str, error: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            message: error.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputTooLarge { .. } | Self::Arena(_) => ErrorKind::ResourceExhaustion,
            Self::Io { .. } => ErrorKind::Input,
            Self::Syntax(e) if e.is_resource_exhaustion() => ErrorKind::ResourceExhaustion,
            Self::Syntax(_) => ErrorKind::Syntax,
            Self::Literal(_) => ErrorKind::LiteralConversion,
            Self::AttributePath(_) => ErrorKind::AttributePath,
            Self::Reference(e) => match e {
                ReferenceError::UndefinedReference { .. } => ErrorKind::UnresolvedReference,
                ReferenceError::DuplicateBinding { .. } => ErrorKind::DuplicateBinding,
                ReferenceError::AliasCycle { .. } => ErrorKind::Cycle,
                ReferenceError::AliasChainTooDeep { .. } => ErrorKind::ResourceExhaustion,
            },
            Self::Assembly(e) => match e {
                AssemblyError::Cycle { .. } => ErrorKind::Cycle,
                AssemblyError::ElementLimit { .. } => ErrorKind::ResourceExhaustion,
                AssemblyError::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            },
        }
    }

    /// Get the appropriate error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::InputTooLarge { .. } => codes::input::INPUT_TOO_LARGE,
            Self::Io { .. } => codes::input::INPUT_READ_ERROR,
            Self::Syntax(e) => e.error_code(),
            Self::Literal(e) => e.error_code(),
            Self::AttributePath(e) => e.error_code(),
            Self::Arena(e) => e.error_code(),
            Self::Reference(e) => e.error_code(),
            Self::Assembly(e) => e.error_code(),
        }
    }

    /// Location in the filter text, when the error has one
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::InputTooLarge { .. } | Self::Io { .. } => None,
            Self::Syntax(e) => Some(e.span()),
            Self::Literal(e) => Some(e.span()),
            Self::AttributePath(e) => Some(e.span()),
            Self::Arena(e) => Some(e.span()),
            Self::Reference(e) => Some(e.span()),
            Self::Assembly(e) => Some(e.span()),
        }
    }

    /// Diagnostic with the offending source line underlined
    pub fn render(&self, source: &str) -> String {
        let message = format!("[{}] {}", self.error_code(), self);
        match self.span() {
            Some(span) => SourceMap::new(source).format_error(&span, &message),
            None => format!("error: {}\n", message),
        }
    }
}
