//! Default typed-value parser
//!
//! Receives the raw lexeme exactly as the grammar captured it, quotes
//! included, and produces a `Variant` of the requested type.

use super::error::ConversionError;
use super::ValueParser;
use crate::types::{
    BuiltinType, ExpandedNodeId, LocalizedText, NodeId, QualifiedName, StatusCode, Variant,
};
use crate::utils::Span;
use base64::Engine as _;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

/// Converter for every builtin type the grammar can name
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValueParser;

impl ValueParser for DefaultValueParser {
    fn parse_value(
        &self,
        ty: BuiltinType,
        text: &str,
        span: Span,
    ) -> Result<Variant, ConversionError> {
        let invalid = |reason: &str| ConversionError::invalid_literal(ty, text, reason, span);
        let out_of_range = || ConversionError::out_of_range(ty, text, span);

        match ty {
            BuiltinType::Boolean => match text {
                "true" | "TRUE" | "1" => Ok(Variant::Boolean(true)),
                "false" | "FALSE" | "0" => Ok(Variant::Boolean(false)),
                _ => Err(invalid("expected true or false")),
            },

            BuiltinType::SByte => {
                let value = parse_integer(text).ok_or_else(|| invalid("expected an integer"))?;
                i8::try_from(value)
                    .map(Variant::SByte)
                    .map_err(|_| out_of_range())
            }
            BuiltinType::Byte => {
                let value = parse_integer(text).ok_or_else(|| invalid("expected an integer"))?;
                u8::try_from(value)
                    .map(Variant::Byte)
                    .map_err(|_| out_of_range())
            }
            BuiltinType::Int16 => {
                let value = parse_integer(text).ok_or_else(|| invalid("expected an integer"))?;
                i16::try_from(value)
                    .map(Variant::Int16)
                    .map_err(|_| out_of_range())
            }
            BuiltinType::UInt16 => {
                let value = parse_integer(text).ok_or_else(|| invalid("expected an integer"))?;
                u16::try_from(value)
                    .map(Variant::UInt16)
                    .map_err(|_| out_of_range())
            }
            BuiltinType::Int32 => {
                let value = parse_integer(text).ok_or_else(|| invalid("expected an integer"))?;
                i32::try_from(value)
                    .map(Variant::Int32)
                    .map_err(|_| out_of_range())
            }
            BuiltinType::UInt32 => {
                let value = parse_integer(text).ok_or_else(|| invalid("expected an integer"))?;
                u32::try_from(value)
                    .map(Variant::UInt32)
                    .map_err(|_| out_of_range())
            }
            BuiltinType::Int64 => {
                let value = parse_integer(text).ok_or_else(|| invalid("expected an integer"))?;
                i64::try_from(value)
                    .map(Variant::Int64)
                    .map_err(|_| out_of_range())
            }
            BuiltinType::UInt64 => {
                let value = parse_integer(text).ok_or_else(|| invalid("expected an integer"))?;
                u64::try_from(value)
                    .map(Variant::UInt64)
                    .map_err(|_| out_of_range())
            }

            BuiltinType::Float => {
                let value = parse_decimal(text).ok_or_else(|| invalid("expected a number"))?;
                let narrowed = value as f32;
                if value.is_finite() && !narrowed.is_finite() {
                    return Err(out_of_range());
                }
                Ok(Variant::Float(narrowed))
            }
            BuiltinType::Double => {
                let value = parse_decimal(text).ok_or_else(|| invalid("expected a number"))?;
                if value.is_infinite() && !text.ends_with("Infinity") {
                    return Err(out_of_range());
                }
                Ok(Variant::Double(value))
            }

            BuiltinType::String => unquote(text)
                .map(Variant::String)
                .ok_or_else(|| invalid("expected a quoted string")),

            BuiltinType::DateTime => {
                let content = unquote(text).ok_or_else(|| invalid("expected a quoted date"))?;
                parse_date_time(&content)
                    .map(Variant::DateTime)
                    .ok_or_else(|| invalid("unrecognised date/time format"))
            }

            BuiltinType::Guid => {
                let content = token_content(text).ok_or_else(|| invalid("malformed quoting"))?;
                Uuid::parse_str(&content)
                    .map(Variant::Guid)
                    .map_err(|e| invalid(&e.to_string()))
            }

            BuiltinType::ByteString => {
                let content = token_content(text).ok_or_else(|| invalid("malformed quoting"))?;
                let bytes = match content
                    .strip_prefix("0x")
                    .or_else(|| content.strip_prefix("0X"))
                {
                    Some(hex) => decode_hex(hex).ok_or_else(|| invalid("invalid hex digits"))?,
                    None => base64::engine::general_purpose::STANDARD
                        .decode(content.as_bytes())
                        .map_err(|e| invalid(&e.to_string()))?,
                };
                Ok(Variant::ByteString(bytes))
            }

            BuiltinType::NodeId => {
                let content = token_content(text).ok_or_else(|| invalid("malformed quoting"))?;
                NodeId::parse(&content)
                    .map(Variant::NodeId)
                    .map_err(|e| invalid(&e.to_string()))
            }

            BuiltinType::ExpandedNodeId => {
                let content = token_content(text).ok_or_else(|| invalid("malformed quoting"))?;
                ExpandedNodeId::parse(&content)
                    .map(Variant::ExpandedNodeId)
                    .map_err(|e| invalid(&e.to_string()))
            }

            BuiltinType::QualifiedName => {
                let content = token_content(text).ok_or_else(|| invalid("malformed quoting"))?;
                QualifiedName::parse(&content)
                    .map(Variant::QualifiedName)
                    .map_err(|e| invalid(&e.to_string()))
            }

            BuiltinType::LocalizedText => {
                let parts = quoted_sequence(text)
                    .ok_or_else(|| invalid("expected one or two quoted strings"))?;
                match parts.as_slice() {
                    [text] => Ok(Variant::LocalizedText(LocalizedText::new(None, text))),
                    [locale, text] => Ok(Variant::LocalizedText(LocalizedText::new(
                        Some(locale),
                        text,
                    ))),
                    _ => Err(invalid("expected one or two quoted strings")),
                }
            }

            BuiltinType::StatusCode => {
                if let Some(code) = StatusCode::from_name(text) {
                    return Ok(Variant::StatusCode(code));
                }
                let value = parse_integer(text)
                    .ok_or_else(|| invalid("expected a status code name or number"))?;
                u32::try_from(value)
                    .map(|v| Variant::StatusCode(StatusCode(v)))
                    .map_err(|_| out_of_range())
            }

            BuiltinType::Variant => {
                let value: serde_json::Value =
                    serde_json::from_str(text).map_err(|e| invalid(&e.to_string()))?;
                if !value.is_object() {
                    return Err(invalid("JSON literal must be an object"));
                }
                Ok(Variant::Json(value))
            }
        }
    }
}

/// Decimal or `0x` hexadecimal integer with optional sign, widened to i128
fn parse_integer(text: &str) -> Option<i128> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            i128::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.parse::<i128>().ok()?
        }
        None => return None,
    };

    Some(if negative { -magnitude } else { magnitude })
}

fn parse_decimal(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ if text.bytes().any(|b| b.is_ascii_digit()) => text.parse::<f64>().ok(),
        _ => None,
    }
}

fn parse_date_time(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(parsed.and_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(parsed.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}

/// Content of a single quoted string (`"..."` or `'...'`) with escapes applied.
/// Returns None unless `text` is exactly one quoted string.
pub(crate) fn unquote(text: &str) -> Option<String> {
    let (content, consumed) = read_quoted(text)?;
    (consumed == text.len()).then_some(content)
}

/// Quoted content, or the bare text when not quoted
fn token_content(text: &str) -> Option<String> {
    if text.starts_with('"') || text.starts_with('\'') {
        unquote(text)
    } else {
        Some(text.to_string())
    }
}

/// Whitespace separated run of quoted strings
fn quoted_sequence(text: &str) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        let (content, consumed) = read_quoted(rest)?;
        parts.push(content);
        rest = rest[consumed..].trim_start();
    }
    (!parts.is_empty()).then_some(parts)
}

/// Read one quoted string at the start of `text`; returns content and bytes consumed
fn read_quoted(text: &str) -> Option<(String, usize)> {
    let mut chars = text.char_indices();
    let (_, quote) = chars.next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }

    let mut content = String::new();
    while let Some((index, c)) = chars.next() {
        match c {
            '\\' => {
                let (_, escaped) = chars.next()?;
                content.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                });
            }
            c if c == quote => return Some((content, index + c.len_utf8())),
            c => content.push(c),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn convert(ty: BuiltinType, text: &str) -> Result<Variant, ConversionError> {
        DefaultValueParser.parse_value(ty, text, Span::dummy())
    }

    #[test]
    fn test_integer_widths_and_ranges() {
        assert_eq!(convert(BuiltinType::SByte, "-128"), Ok(Variant::SByte(-128)));
        assert_eq!(convert(BuiltinType::Byte, "0xFF"), Ok(Variant::Byte(255)));
        assert_eq!(convert(BuiltinType::UInt16, "65535"), Ok(Variant::UInt16(65535)));
        assert_eq!(
            convert(BuiltinType::Int64, "-9223372036854775808"),
            Ok(Variant::Int64(i64::MIN))
        );
        assert_eq!(
            convert(BuiltinType::UInt64, "18446744073709551615"),
            Ok(Variant::UInt64(u64::MAX))
        );

        assert_matches!(
            convert(BuiltinType::UInt16, "70000"),
            Err(ConversionError::OutOfRange {
                ty: BuiltinType::UInt16,
                ..
            })
        );
        assert_matches!(
            convert(BuiltinType::Byte, "-1"),
            Err(ConversionError::OutOfRange { .. })
        );
        assert_matches!(
            convert(BuiltinType::Int32, "12a"),
            Err(ConversionError::InvalidLiteral { .. })
        );
    }

    #[test]
    fn test_floating_point() {
        assert_eq!(convert(BuiltinType::Double, "2.5e3"), Ok(Variant::Double(2500.0)));
        assert_eq!(convert(BuiltinType::Float, "-0.5"), Ok(Variant::Float(-0.5)));
        assert_matches!(
            convert(BuiltinType::Float, "1e300"),
            Err(ConversionError::OutOfRange { .. })
        );
        assert_matches!(
            convert(BuiltinType::Double, "abc"),
            Err(ConversionError::InvalidLiteral { .. })
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            convert(BuiltinType::String, r#""say \"hi\"\n""#),
            Ok(Variant::String("say \"hi\"\n".into()))
        );
        assert_eq!(
            convert(BuiltinType::String, "'single'"),
            Ok(Variant::String("single".into()))
        );
        assert_matches!(
            convert(BuiltinType::String, "bare"),
            Err(ConversionError::InvalidLiteral { .. })
        );
    }

    #[test]
    fn test_date_time_formats() {
        let expected = Variant::DateTime(
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(12, 30, 0)
                .unwrap()
                .and_utc(),
        );
        assert_eq!(
            convert(BuiltinType::DateTime, "\"2024-03-01T12:30:00Z\""),
            Ok(expected.clone())
        );
        assert_eq!(
            convert(BuiltinType::DateTime, "\"2024-03-01 12:30:00\""),
            Ok(expected)
        );
        assert!(convert(BuiltinType::DateTime, "\"2024-03-01\"").is_ok());
        assert_matches!(
            convert(BuiltinType::DateTime, "\"yesterday\""),
            Err(ConversionError::InvalidLiteral { .. })
        );
    }

    #[test]
    fn test_identifier_types() {
        assert_eq!(
            convert(BuiltinType::NodeId, "\"ns=2;s=Pump.Speed\""),
            Ok(Variant::NodeId(NodeId::string(2, "Pump.Speed")))
        );
        assert_eq!(
            convert(BuiltinType::NodeId, "i=2041"),
            Ok(Variant::NodeId(NodeId::base_event_type()))
        );
        assert_eq!(
            convert(BuiltinType::QualifiedName, "1:Severity"),
            Ok(Variant::QualifiedName(QualifiedName::new(1, "Severity")))
        );
        assert_matches!(
            convert(BuiltinType::Guid, "72962b91-fa75-4ae6-8d28-b404dc7daf63"),
            Ok(Variant::Guid(_))
        );
        assert_matches!(
            convert(BuiltinType::ExpandedNodeId, "\"nsu=urn:a;i=1\""),
            Ok(Variant::ExpandedNodeId(_))
        );
    }

    #[test]
    fn test_byte_string_encodings() {
        assert_eq!(
            convert(BuiltinType::ByteString, "\"AQID\""),
            Ok(Variant::ByteString(vec![1, 2, 3]))
        );
        assert_eq!(
            convert(BuiltinType::ByteString, "0x0A0b"),
            Ok(Variant::ByteString(vec![10, 11]))
        );
        assert_matches!(
            convert(BuiltinType::ByteString, "0xABC"),
            Err(ConversionError::InvalidLiteral { .. })
        );
    }

    #[test]
    fn test_localized_text() {
        assert_eq!(
            convert(BuiltinType::LocalizedText, "\"en-US\" \"High level\""),
            Ok(Variant::LocalizedText(LocalizedText::new(
                Some("en-US"),
                "High level"
            )))
        );
        assert_eq!(
            convert(BuiltinType::LocalizedText, "\"plain\""),
            Ok(Variant::LocalizedText(LocalizedText::new(None, "plain")))
        );
    }

    #[test]
    fn test_status_code_and_json() {
        assert_eq!(
            convert(BuiltinType::StatusCode, "BadTimeout"),
            Ok(Variant::StatusCode(StatusCode(0x800A_0000)))
        );
        assert_eq!(
            convert(BuiltinType::StatusCode, "0x80000000"),
            Ok(Variant::StatusCode(StatusCode(0x8000_0000)))
        );
        assert_matches!(
            convert(BuiltinType::Variant, r#"{"limit": 5, "unit": "bar"}"#),
            Ok(Variant::Json(_))
        );
        assert_matches!(
            convert(BuiltinType::Variant, "[1, 2]"),
            Err(ConversionError::InvalidLiteral { .. })
        );
    }
}
