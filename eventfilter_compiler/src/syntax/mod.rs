//! Syntax analysis module - filter text to operand graph
//!
//! Runs the grammar over the input with the matcher engine. Semantic actions
//! allocate operands into one `OperandList`, link operator children, fill the
//! select list and record FOR-clause bindings. References are left unresolved.

pub mod error;
pub mod keywords;
pub mod parser;

// Re-export core types
pub use error::{ParseError, SyntaxError, SyntaxResult};
pub use parser::{ParseContext, ParsedFilter};

use crate::attribute_path::AttributePathParser;
use crate::config::compile_time::syntax::MAX_PARSE_DEPTH;
use crate::config::runtime::CompilerPreferences;
use crate::literal::ValueParser;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};

/// Match `text` against the event filter grammar with global logging
pub fn parse_event_filter(
    text: &str,
    value_parser: &dyn ValueParser,
    path_parser: &dyn AttributePathParser,
    preferences: &CompilerPreferences,
) -> SyntaxResult<ParsedFilter> {
    log_debug!("Starting syntax analysis", "bytes" => text.len());

    let result = ParseContext::new(text, MAX_PARSE_DEPTH, value_parser, path_parser)
        .with_match_logging(preferences.log_match_details)
        .parse();

    match &result {
        Ok(parsed) => {
            log_success!(
                codes::success::SYNTAX_MATCH_COMPLETE,
                "Syntax analysis completed successfully",
                "nodes" => parsed.operands.len(),
                "select_entries" => parsed.operands.select_list().len(),
                "bindings" => parsed.operands.bindings().len(),
                "where" => parsed.top.is_some()
            );
        }
        Err(error) => {
            log_error!(error.error_code(), "Syntax analysis failed",
                span = error.span(),
                "error" => error
            );
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute_path::DefaultAttributePathParser;
    use crate::literal::DefaultValueParser;
    use assert_matches::assert_matches;

    fn preferences() -> CompilerPreferences {
        CompilerPreferences {
            log_match_details: true,
            ..CompilerPreferences::default()
        }
    }

    #[test]
    fn test_parse_event_filter_success() {
        let parsed = parse_event_filter(
            "SELECT /Message, /Severity WHERE GREATERTHAN(/Severity, UINT16 100)",
            &DefaultValueParser,
            &DefaultAttributePathParser,
            &preferences(),
        )
        .unwrap();
        assert_eq!(parsed.operands.select_list().len(), 2);
        assert!(parsed.top.is_some());
    }

    #[test]
    fn test_parse_event_filter_failure() {
        let result = parse_event_filter(
            "SELECT",
            &DefaultValueParser,
            &DefaultAttributePathParser,
            &preferences(),
        );
        assert_matches!(result, Err(ParseError::Syntax(_)));
    }
}
