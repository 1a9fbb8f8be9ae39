//! Default attribute-path parser
//!
//! Textual form, no embedded whitespace:
//!
//! ```text
//! [TypeDefinition] { ("/" | ".") [ns ":"] BrowseName } ["#" Attribute] ["[" Range "]"]
//! ```
//!
//! `TypeDefinition` is a node id (`ns=2;i=1234`, `i=2041`, `s=...`) or a
//! `$<digits>` placeholder for the default event type. A string node id runs
//! until the first `/`, `#` or `[`; a numeric one also stops at `.`.
//! Inside browse names `&` escapes the next character.

use super::error::AttributePathError;
use super::AttributePathParser;
use crate::types::{
    AttributeId, AttributeOperand, BrowsePathElement, NodeId, NumericRange, PathReference,
    QualifiedName,
};
use crate::utils::Span;

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAttributePathParser;

impl AttributePathParser for DefaultAttributePathParser {
    fn parse_attribute_operand(
        &self,
        text: &str,
        span: Span,
    ) -> Result<AttributeOperand, AttributePathError> {
        if text.is_empty() {
            return Err(AttributePathError::Empty { span });
        }

        let (type_definition, mut rest) = split_type_definition(text, span)?;

        let mut browse_path = Vec::new();
        while let Some(reference) = rest.chars().next().and_then(path_reference) {
            let (raw, tail) = split_browse_name(&rest[1..]);
            let name = unescape(raw)
                .ok_or_else(|| AttributePathError::invalid_browse_name(raw, "dangling '&'", span))?;
            if name.is_empty() {
                return Err(AttributePathError::EmptyBrowseName {
                    path: text.to_string(),
                    span,
                });
            }
            let target = QualifiedName::parse(&name).map_err(|e| {
                AttributePathError::invalid_browse_name(&name, &e.to_string(), span)
            })?;
            browse_path.push(BrowsePathElement { reference, target });
            rest = tail;
        }

        let mut attribute_id = AttributeId::Value;
        if let Some(after) = rest.strip_prefix('#') {
            let end = after.find('[').unwrap_or(after.len());
            let name = &after[..end];
            attribute_id = AttributeId::from_name(name)
                .ok_or_else(|| AttributePathError::unknown_attribute(name, span))?;
            rest = &after[end..];
        }

        let mut index_range = None;
        if let Some(after) = rest.strip_prefix('[') {
            let close = after
                .find(']')
                .ok_or_else(|| AttributePathError::invalid_range(after, span))?;
            let inner = &after[..close];
            index_range = Some(
                NumericRange::parse(inner)
                    .ok_or_else(|| AttributePathError::invalid_range(inner, span))?,
            );
            rest = &after[close + 1..];
        }

        if !rest.is_empty() {
            return Err(AttributePathError::TrailingInput {
                text: rest.to_string(),
                span,
            });
        }

        Ok(AttributeOperand {
            type_definition,
            browse_path,
            attribute_id,
            index_range,
        })
    }
}

fn path_reference(c: char) -> Option<PathReference> {
    match c {
        '/' => Some(PathReference::Hierarchical),
        '.' => Some(PathReference::Aggregates),
        _ => None,
    }
}

fn split_type_definition(
    text: &str,
    span: Span,
) -> Result<(NodeId, &str), AttributePathError> {
    if let Some(after) = text.strip_prefix('$') {
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(AttributePathError::invalid_node_id(
                text,
                "expected digits after '$'",
                span,
            ));
        }
        return Ok((NodeId::base_event_type(), &after[digits..]));
    }

    if text.starts_with(&['/', '.', '#', '['][..]) {
        return Ok((NodeId::base_event_type(), text));
    }

    let identifier = match text.strip_prefix("ns=") {
        Some(after) => after.split_once(';').map(|(_, id)| id).unwrap_or(after),
        None => text,
    };
    let numeric = identifier.starts_with("i=");

    let end = text
        .char_indices()
        .find(|&(_, c)| c == '/' || c == '#' || c == '[' || (numeric && c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());

    let node_text = &text[..end];
    let node_id = NodeId::parse(node_text)
        .map_err(|e| AttributePathError::invalid_node_id(node_text, &e.to_string(), span))?;
    Ok((node_id, &text[end..]))
}

/// Split off a browse name: everything up to the next unescaped delimiter
fn split_browse_name(text: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '&' => escaped = true,
            '/' | '.' | '#' | '[' => return (&text[..i], &text[i..]),
            _ => {}
        }
    }
    (text, "")
}

fn unescape(raw: &str) -> Option<String> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '&' {
            result.push(chars.next()?);
        } else {
            result.push(c);
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn parse(text: &str) -> Result<AttributeOperand, AttributePathError> {
        DefaultAttributePathParser.parse_attribute_operand(text, Span::dummy())
    }

    #[test]
    fn test_placeholder_type_and_defaults() {
        let operand = parse("$1/Severity#Value").unwrap();
        assert_eq!(operand, AttributeOperand::event_field(&["Severity"]));

        let bare = parse("/Severity").unwrap();
        assert_eq!(bare, operand);
    }

    #[test]
    fn test_explicit_type_definition_and_path() {
        let operand = parse("ns=2;i=1001/2:Limits.High#DisplayName").unwrap();
        assert_eq!(operand.type_definition, NodeId::numeric(2, 1001));
        assert_eq!(operand.browse_path.len(), 2);
        assert_eq!(operand.browse_path[0].target, QualifiedName::new(2, "Limits"));
        assert_eq!(operand.browse_path[1].reference, PathReference::Aggregates);
        assert_eq!(operand.attribute_id, AttributeId::DisplayName);
    }

    #[test]
    fn test_string_node_id_keeps_dots() {
        let operand = parse("ns=1;s=Plant.Boiler/Temperature").unwrap();
        assert_eq!(operand.type_definition, NodeId::string(1, "Plant.Boiler"));
        assert_eq!(operand.browse_path[0].target.name, "Temperature");
    }

    #[test]
    fn test_escapes_and_range() {
        let operand = parse("/Data&/Set&.1#Value[0:3,2]").unwrap();
        assert_eq!(operand.browse_path.len(), 1);
        assert_eq!(operand.browse_path[0].target.name, "Data/Set.1");
        assert_eq!(operand.index_range.unwrap().to_string(), "0:3,2");
    }

    #[test]
    fn test_type_definition_only() {
        let operand = parse("i=2915").unwrap();
        assert!(operand.browse_path.is_empty());
        assert_eq!(operand.attribute_id, AttributeId::Value);
    }

    #[test]
    fn test_errors() {
        assert_matches!(parse(""), Err(AttributePathError::Empty { .. }));
        assert_matches!(parse("$x/Severity"), Err(AttributePathError::InvalidNodeId { .. }));
        assert_matches!(parse("//Severity"), Err(AttributePathError::EmptyBrowseName { .. }));
        assert_matches!(
            parse("/Severity#Colour"),
            Err(AttributePathError::UnknownAttribute { .. })
        );
        assert_matches!(parse("/Severity[4:1]"), Err(AttributePathError::InvalidRange { .. }));
        assert_matches!(
            parse("/Severity[1]x"),
            Err(AttributePathError::TrailingInput { .. })
        );
        assert_matches!(
            parse("/Severity&"),
            Err(AttributePathError::InvalidBrowseName { .. })
        );
    }
}
