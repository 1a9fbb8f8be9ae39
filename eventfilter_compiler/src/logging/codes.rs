//! Consolidated error codes and classification system
//!
//! Single source of truth for all error codes, their metadata, and classification functions.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for an error code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub const fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
    pub const RESOURCE_EXHAUSTION: Code = Code::new("ERR003");
}

/// Input acceptance error codes
pub mod input {
    use super::Code;

    pub const INPUT_TOO_LARGE: Code = Code::new("E005");
    pub const INPUT_READ_ERROR: Code = Code::new("E006");
}

/// Syntax analysis error codes
pub mod syntax {
    use super::Code;

    pub const UNEXPECTED_INPUT: Code = Code::new("E040");
    pub const MAX_RECURSION_DEPTH: Code = Code::new("E041");
    pub const IDENTIFIER_TOO_LONG: Code = Code::new("E042");
}

/// Literal conversion error codes
pub mod literal {
    use super::Code;

    pub const INVALID_LITERAL: Code = Code::new("E060");
    pub const LITERAL_OUT_OF_RANGE: Code = Code::new("E061");
}

/// Attribute operand error codes
pub mod attribute {
    use super::Code;

    pub const INVALID_ATTRIBUTE_PATH: Code = Code::new("E070");
}

/// Operand arena error codes
pub mod operands {
    use super::Code;

    pub const ARENA_EXHAUSTED: Code = Code::new("E080");
}

/// Reference resolution error codes
pub mod references {
    use super::Code;

    pub const UNDEFINED_REFERENCE: Code = Code::new("E110");
    pub const DUPLICATE_BINDING: Code = Code::new("E111");
    pub const ALIAS_CYCLE: Code = Code::new("E112");
}

/// Filter assembly error codes
pub mod assembly {
    use super::Code;

    pub const REFERENCE_CYCLE: Code = Code::new("E140");
    pub const ELEMENT_LIMIT_EXCEEDED: Code = Code::new("E141");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const SYNTAX_MATCH_COMPLETE: Code = Code::new("I040");
    pub const REFERENCE_RESOLUTION_COMPLETE: Code = Code::new("I060");
    pub const FILTER_ASSEMBLY_COMPLETE: Code = Code::new("I080");
    pub const COMPILATION_COMPLETE: Code = Code::new("I090");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

const REGISTERED_CODES: &[ErrorMetadata] = &[
    // System errors
    ErrorMetadata::new(
        "ERR001",
        "System",
        Severity::Critical,
        false,
        true,
        "Critical internal compiler error",
        "File a bug report with the filter text that triggered it",
    ),
    ErrorMetadata::new(
        "ERR002",
        "System",
        Severity::Critical,
        false,
        true,
        "System initialization failure",
        "Check logging configuration and environment variables",
    ),
    ErrorMetadata::new(
        "ERR003",
        "System",
        Severity::Critical,
        false,
        true,
        "Compile-time resource limit exhausted",
        "Simplify the filter or raise the limit in the build profile",
    ),
    // Input errors
    ErrorMetadata::new(
        "E005",
        "Input",
        Severity::Medium,
        false,
        true,
        "Filter text exceeds the maximum input length",
        "Shorten the filter text or raise max_input_length",
    ),
    ErrorMetadata::new(
        "E006",
        "Input",
        Severity::Medium,
        false,
        true,
        "Filter source could not be read",
        "Check the path and file permissions",
    ),
    // Syntax errors
    ErrorMetadata::new(
        "E040",
        "Syntax",
        Severity::High,
        false,
        true,
        "Input does not match the event filter grammar",
        "Check keyword spelling, parentheses and brackets near the reported position",
    ),
    ErrorMetadata::new(
        "E041",
        "Syntax",
        Severity::High,
        false,
        true,
        "Operand nesting exceeds the maximum parse depth",
        "Flatten the expression using FOR-clause aliases",
    ),
    ErrorMetadata::new(
        "E042",
        "Syntax",
        Severity::Medium,
        false,
        true,
        "Reference name exceeds the maximum identifier length",
        "Use a shorter alias name",
    ),
    // Literal errors
    ErrorMetadata::new(
        "E060",
        "Literal",
        Severity::High,
        false,
        true,
        "Literal text is not valid for its declared type",
        "Check the literal against the lexical rules of its type keyword",
    ),
    ErrorMetadata::new(
        "E061",
        "Literal",
        Severity::High,
        false,
        true,
        "Literal value is outside the range of its declared type",
        "Use a wider type keyword or a smaller value",
    ),
    // Attribute operand errors
    ErrorMetadata::new(
        "E070",
        "AttributeOperand",
        Severity::High,
        false,
        true,
        "Malformed node id, browse path, attribute or index range",
        "Check the attribute operand syntax",
    ),
    // Arena errors
    ErrorMetadata::new(
        "E080",
        "Operands",
        Severity::Critical,
        false,
        true,
        "Operand arena capacity exhausted",
        "Simplify the filter or raise max_operand_nodes",
    ),
    // Reference errors
    ErrorMetadata::new(
        "E110",
        "References",
        Severity::High,
        false,
        true,
        "Reference used without a matching FOR-clause binding",
        "Declare the alias in the FOR clause",
    ),
    ErrorMetadata::new(
        "E111",
        "References",
        Severity::High,
        false,
        true,
        "Alias bound more than once in the FOR clause",
        "Rename one of the bindings",
    ),
    ErrorMetadata::new(
        "E112",
        "References",
        Severity::High,
        false,
        true,
        "Aliases bound only to each other never reach an operand",
        "Bind at least one alias in the chain to a concrete operand",
    ),
    // Assembly errors
    ErrorMetadata::new(
        "E140",
        "Assembly",
        Severity::High,
        false,
        true,
        "Aliased sub-expressions reference themselves",
        "Break the cycle between the FOR-clause bindings",
    ),
    ErrorMetadata::new(
        "E141",
        "Assembly",
        Severity::Critical,
        false,
        true,
        "Element count exceeds the maximum filter size",
        "Simplify the filter or raise max_elements",
    ),
    // Success codes
    ErrorMetadata::new(
        "I004",
        "System",
        Severity::Low,
        true,
        false,
        "Logging system initialized",
        "Continue",
    ),
    ErrorMetadata::new(
        "I040",
        "Syntax",
        Severity::Low,
        true,
        false,
        "Filter text matched the grammar",
        "Continue to reference resolution",
    ),
    ErrorMetadata::new(
        "I060",
        "References",
        Severity::Low,
        true,
        false,
        "All references resolved",
        "Continue to filter assembly",
    ),
    ErrorMetadata::new(
        "I080",
        "Assembly",
        Severity::Low,
        true,
        false,
        "Filter elements assembled",
        "Compiled filter is ready",
    ),
    ErrorMetadata::new(
        "I090",
        "Pipeline",
        Severity::Low,
        true,
        false,
        "Event filter compilation completed",
        "Hand the filter to the evaluator",
    ),
];

/// Error metadata registry using OnceLock for thread safety
static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

/// Initialize and get the error registry
fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        REGISTERED_CODES
            .iter()
            .map(|metadata| (metadata.code, metadata.clone()))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get error metadata for a specific error code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Get error severity from error code
pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if error is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Check if error requires immediate halt
pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

/// Get human-readable description for error code
pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for error code
pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get error category from error code
pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registered_codes_are_unique() {
        let mut seen = HashSet::new();
        for metadata in REGISTERED_CODES {
            assert!(seen.insert(metadata.code), "duplicate code {}", metadata.code);
        }
    }

    #[test]
    fn test_every_error_constant_has_metadata() {
        let constants = [
            system::INTERNAL_ERROR,
            system::INITIALIZATION_FAILURE,
            system::RESOURCE_EXHAUSTION,
            input::INPUT_TOO_LARGE,
            syntax::UNEXPECTED_INPUT,
            syntax::MAX_RECURSION_DEPTH,
            literal::LITERAL_OUT_OF_RANGE,
            attribute::INVALID_ATTRIBUTE_PATH,
            operands::ARENA_EXHAUSTED,
            references::UNDEFINED_REFERENCE,
            references::DUPLICATE_BINDING,
            assembly::REFERENCE_CYCLE,
            success::COMPILATION_COMPLETE,
        ];
        for code in constants {
            assert!(get_error_metadata(code.as_str()).is_some(), "{}", code);
        }
    }

    #[test]
    fn test_unknown_code_defaults() {
        assert_eq!(get_description("X999"), "Unknown error");
        assert_eq!(get_category("X999"), "Unknown");
        assert_eq!(get_severity("X999"), Severity::Medium);
        assert!(is_recoverable("X999"));
        assert!(!requires_halt("X999"));
    }

    #[test]
    fn test_classification() {
        assert_eq!(get_category("E140"), "Assembly");
        assert_eq!(get_severity("ERR003"), Severity::Critical);
        assert!(requires_halt("E110"));
        assert!(!get_action("E111").is_empty());
    }
}
