//! Compilation pipeline: filter text -> operand graph -> resolved DAG -> event filter
//!
//! Every call owns one operand arena. It is dropped when the call returns,
//! whether compilation succeeded or not; only the assembled `EventFilter`
//! leaves the call.

mod error;
mod result;

// Re-export public types
pub use error::{CompileError, ErrorKind};
pub use result::{CompileResult, CompileStats};

use crate::assembly::assemble_filter;
use crate::attribute_path::{AttributePathParser, DefaultAttributePathParser};
use crate::config::compile_time::input::MAX_INPUT_LENGTH;
use crate::config::runtime::CompilerPreferences;
use crate::literal::{DefaultValueParser, ValueParser};
use crate::logging::{self, codes};
use crate::reference_resolution::resolve_references;
use crate::{log_error, log_info};
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Compile filter text with default preferences and parsers
pub fn compile_event_filter(text: &str) -> Result<CompileResult, CompileError> {
    compile_event_filter_with(
        text,
        &CompilerPreferences::default(),
        &DefaultValueParser,
        &DefaultAttributePathParser,
    )
}

/// Compile filter text with caller-supplied preferences and value/path parsers
pub fn compile_event_filter_with(
    text: &str,
    preferences: &CompilerPreferences,
    value_parser: &dyn ValueParser,
    path_parser: &dyn AttributePathParser,
) -> Result<CompileResult, CompileError> {
    let start_time = Instant::now();

    let result = run_passes(text, preferences, value_parser, path_parser, start_time);
    if let Err(error) = &result {
        log_error!(error.error_code(), "Event filter compilation failed",
            "kind" => error.kind().as_str(),
            "recoverable" => codes::is_recoverable(error.error_code().as_str()),
            "error" => error
        );
    }
    result
}

fn run_passes(
    text: &str,
    preferences: &CompilerPreferences,
    value_parser: &dyn ValueParser,
    path_parser: &dyn AttributePathParser,
    start_time: Instant,
) -> Result<CompileResult, CompileError> {
    // Reject oversize input before any matching
    if text.len() > MAX_INPUT_LENGTH {
        return Err(CompileError::InputTooLarge {
            length: text.len(),
            limit: MAX_INPUT_LENGTH,
        });
    }

    log_info!("Starting event filter compilation", "bytes" => text.len());

    // Pass 1: grammar match and operand graph
    let mut parsed =
        crate::syntax::parse_event_filter(text, value_parser, path_parser, preferences)?;

    // Pass 2: reference resolution
    let resolution = resolve_references(&mut parsed.operands, parsed.top, preferences)?;

    // Pass 3: linearization
    let assembled = assemble_filter(&parsed.operands, parsed.top, preferences)?;

    let stats = CompileStats {
        input_bytes: text.len(),
        operand_nodes: parsed.operands.len(),
        bindings: parsed.operands.bindings().len(),
        resolution,
        assembly: assembled.stats,
        duration: start_time.elapsed(),
    };
    let result = CompileResult::new(assembled.filter, stats);
    result.log_success();

    Ok(result)
}

/// Read a filter from `path` and compile it
pub fn compile_file(
    path: impl AsRef<Path>,
    preferences: &CompilerPreferences,
) -> Result<CompileResult, CompileError> {
    let path = path.as_ref();
    let name = path.display().to_string();

    // Set up source context for global logging
    logging::with_source_context(&name, || {
        let text = read_source(path)?;
        compile_event_filter_with(
            &text,
            preferences,
            &DefaultValueParser,
            &DefaultAttributePathParser,
        )
    })
}

/// Read filter text, rejecting files over `MAX_INPUT_LENGTH` before reading them
pub fn read_source(path: impl AsRef<Path>) -> Result<String, CompileError> {
    let path = path.as_ref();
    let name = path.display().to_string();

    let metadata = fs::metadata(path).map_err(|e| {
        let error = CompileError::io(&name, &e);
        log_error!(error.error_code(), "Cannot access filter file", "file" => &name);
        error
    })?;
    if metadata.len() > MAX_INPUT_LENGTH as u64 {
        let error = CompileError::InputTooLarge {
            length: usize::try_from(metadata.len()).unwrap_or(usize::MAX),
            limit: MAX_INPUT_LENGTH,
        };
        log_error!(error.error_code(), "Filter file rejected", "file" => &name);
        return Err(error);
    }

    fs::read_to_string(path).map_err(|e| {
        let error = CompileError::io(&name, &e);
        log_error!(error.error_code(), "Cannot read filter file", "file" => &name);
        error
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{EventFilter, FilterElement, FilterOperand};
    use crate::operands::OperatorKind;
    use crate::types::{AttributeOperand, Variant};
    use assert_matches::assert_matches;
    use std::io::Write;

    fn compile(text: &str) -> Result<EventFilter, CompileError> {
        let _ = crate::logging::init_global_logging();
        compile_event_filter(text).map(|result| result.filter)
    }

    fn kind_of(text: &str) -> ErrorKind {
        compile(text).unwrap_err().kind()
    }

    fn attribute(name: &str) -> FilterOperand {
        FilterOperand::Attribute(AttributeOperand::event_field(&[name]))
    }

    #[test]
    fn test_select_count_matches_written_operands() {
        let cases = [
            ("SELECT /A", 1),
            ("SELECT /A, /B", 2),
            ("SELECT /A, /A, /A", 3),
            ("SELECT /A, NOT(/B), INT32 5, $x FOR $x := /C", 4),
            ("SELECT (/A), /B WHERE EQUALS(/A, 1)", 2),
        ];
        for (text, expected) in cases {
            assert_eq!(compile(text).unwrap().select.len(), expected, "{}", text);
        }
    }

    #[test]
    fn test_unresolved_reference() {
        assert_eq!(
            kind_of("SELECT /A WHERE EQUALS($nope, 1)"),
            ErrorKind::UnresolvedReference
        );
        assert_eq!(kind_of("SELECT $nope"), ErrorKind::UnresolvedReference);
    }

    #[test]
    fn test_shared_alias_not_double_counted() {
        let shared = compile(
            "SELECT /A FOR $x := AND(GREATERTHAN(/Severity, 10), ISNULL(/Message)) \
             WHERE OR($x, NOT($x))",
        )
        .unwrap();
        // OR, AND, GREATERTHAN, ISNULL, NOT
        assert_eq!(shared.elements.len(), 5);

        let copied = compile(
            "SELECT /A WHERE OR(AND(GREATERTHAN(/Severity, 10), ISNULL(/Message)), \
             NOT(AND(GREATERTHAN(/Severity, 10), ISNULL(/Message))))",
        )
        .unwrap();
        assert_eq!(copied.elements.len(), 8);
    }

    #[test]
    fn test_binding_cycle() {
        let result = compile("SELECT /A FOR $a := AND(/X, $b) AND $b := OR(/Y, $a) WHERE $a");
        assert_matches!(&result, Err(e) if e.kind() == ErrorKind::Cycle);

        assert_eq!(kind_of("SELECT /A FOR $a := $b AND $b := $a WHERE $a"), ErrorKind::Cycle);
    }

    #[test]
    fn test_unused_bindings_are_still_checked() {
        assert_eq!(
            kind_of("SELECT /A FOR $unused := $nowhere"),
            ErrorKind::UnresolvedReference
        );
        assert_eq!(
            kind_of("SELECT /A FOR $a := AND(/X, $b) AND $b := OR(/Y, $a)"),
            ErrorKind::Cycle
        );
        assert_eq!(
            kind_of("SELECT /A FOR $a := AND(/X, $b) AND $b := OR(/Y, $a) WHERE ISNULL(/C)"),
            ErrorKind::Cycle
        );

        let filter = compile("SELECT /A FOR $unused := NOT(/B) WHERE ISNULL(/C)").unwrap();
        assert_eq!(filter.elements.len(), 1);
    }

    #[test]
    fn test_literal_range_violation() {
        let error = compile("SELECT /A WHERE EQUALS(/B, UINT16 70000)").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::LiteralConversion);
        assert_matches!(error, CompileError::Literal(_));
        assert_eq!(kind_of("SELECT SBYTE 128"), ErrorKind::LiteralConversion);
    }

    #[test]
    fn test_comments_are_transparent() {
        let plain = compile("SELECT $1/Severity#Value").unwrap();
        let commented = compile("SELECT /*c*/ $1/Severity#Value # trailing comment").unwrap();
        assert_eq!(plain, commented);
    }

    #[test]
    fn test_documented_example() {
        let filter = compile(
            "SELECT $1/Severity#Value FOR $s := $1/Severity#Value WHERE GREATERTHAN($s, INT32 500)",
        )
        .unwrap();
        assert_eq!(filter.select, vec![attribute("Severity")]);
        assert_eq!(
            filter.elements,
            vec![FilterElement {
                operator: OperatorKind::GreaterThan,
                operands: vec![attribute("Severity"), FilterOperand::Literal(Variant::Int32(500))],
            }]
        );
    }

    #[test]
    fn test_between_example() {
        let filter =
            compile("SELECT /A FOR $x := /Severity WHERE BETWEEN $x [ INT32 0, INT32 100 ]")
                .unwrap();
        assert_eq!(filter.elements.len(), 1);
        assert_eq!(filter.elements[0].operator, OperatorKind::Between);
        assert_eq!(
            filter.elements[0].operands,
            vec![
                attribute("Severity"),
                FilterOperand::Literal(Variant::Int32(0)),
                FilterOperand::Literal(Variant::Int32(100)),
            ]
        );

        assert_eq!(
            kind_of("SELECT /A FOR $x := /Severity WHERE BETWEEN $x ( INT32 0, INT32 100 )"),
            ErrorKind::Syntax
        );
    }

    #[test]
    fn test_duplicate_binding() {
        assert_eq!(
            kind_of("SELECT /A FOR $a := 1 AND $a := 2 WHERE EQUALS($a, 1)"),
            ErrorKind::DuplicateBinding
        );
    }

    #[test]
    fn test_attribute_path_error() {
        assert_eq!(kind_of("SELECT /Severity#Colour"), ErrorKind::AttributePath);
    }

    #[test]
    fn test_resource_limits() {
        let long = format!("SELECT /A # {}", "x".repeat(MAX_INPUT_LENGTH));
        let error = compile(&long).unwrap_err();
        assert_matches!(error, CompileError::InputTooLarge { .. });
        assert_eq!(error.kind(), ErrorKind::ResourceExhaustion);

        let depth = crate::config::compile_time::syntax::MAX_PARSE_DEPTH + 1;
        let nested = format!("SELECT {}/A{}", "NOT(".repeat(depth), ")".repeat(depth));
        assert_eq!(kind_of(&nested), ErrorKind::ResourceExhaustion);
    }

    #[test]
    fn test_render_points_at_the_error() {
        let source = "SELECT /A\nWHERE EQUALS(/B, UINT16 70000)";
        let error = compile(source).unwrap_err();
        let rendered = error.render(source);
        assert!(rendered.starts_with("error: [E061]"));
        assert!(rendered.contains("--> 2:"));
        assert!(rendered.contains("WHERE EQUALS(/B, UINT16 70000)"));
        assert!(rendered.contains('^'));
    }

    #[test]
    fn test_compile_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# alarms above 500").unwrap();
        writeln!(file, "SELECT /Message, /Severity").unwrap();
        writeln!(file, "WHERE GREATERTHAN(/Severity, UINT16 500)").unwrap();

        let result = compile_file(file.path(), &CompilerPreferences::default()).unwrap();
        assert_eq!(result.filter.select.len(), 2);
        assert_eq!(result.stats.assembly.elements, 1);
        assert!(result.stats.input_bytes > 0);

        let missing = compile_file(
            file.path().with_extension("missing"),
            &CompilerPreferences::default(),
        );
        assert_matches!(&missing, Err(e) if e.kind() == ErrorKind::Input);
    }

    #[test]
    fn test_oversize_file_is_rejected_before_reading() {
        let file = tempfile::NamedTempFile::new().unwrap();
        file.as_file()
            .set_len(MAX_INPUT_LENGTH as u64 + 1)
            .unwrap();

        let error = read_source(file.path()).unwrap_err();
        assert_matches!(error, CompileError::InputTooLarge { length, .. } if length == MAX_INPUT_LENGTH + 1);

        let error = compile_file(file.path(), &CompilerPreferences::default()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ResourceExhaustion);
    }

    #[test]
    fn test_independent_compilations_in_parallel() {
        let texts = [
            "SELECT /A WHERE EQUALS(/B, 1)",
            "SELECT /A FOR $x := NOT(/B) WHERE AND($x, $x)",
            "SELECT /A, /B, /C",
            "SELECT /A WHERE INLIST /B [1, 2, 3]",
        ];
        let expected: Vec<_> = texts.iter().map(|t| compile(t).unwrap()).collect();

        std::thread::scope(|scope| {
            let handles: Vec<_> = texts
                .iter()
                .map(|text| scope.spawn(move || compile(text).unwrap()))
                .collect();
            for (handle, expected) in handles.into_iter().zip(&expected) {
                assert_eq!(&handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_custom_value_parser() {
        use crate::literal::ConversionError;
        use crate::types::BuiltinType;
        use crate::utils::Span;

        /// Accepts only the text "42"
        struct Strict;
        impl ValueParser for Strict {
            fn parse_value(
                &self,
                ty: BuiltinType,
                text: &str,
                span: Span,
            ) -> Result<Variant, ConversionError> {
                match text {
                    "42" => Ok(Variant::Int32(42)),
                    _ => Err(ConversionError::invalid_literal(ty, text, "not 42", span)),
                }
            }
        }

        let preferences = CompilerPreferences::default();
        let ok = compile_event_filter_with(
            "SELECT 42",
            &preferences,
            &Strict,
            &DefaultAttributePathParser,
        );
        assert!(ok.is_ok());
        let err = compile_event_filter_with(
            "SELECT 41",
            &preferences,
            &Strict,
            &DefaultAttributePathParser,
        );
        assert_matches!(err, Err(CompileError::Literal(_)));
    }
}
