//! Keyword and symbol tables for the filter grammar
//!
//! Table order is the order alternatives are tried. Where one token is a
//! textual prefix of another the longer one comes first.

use crate::operands::OperatorKind;
use crate::types::BuiltinType;

/// Clause keywords
pub const SELECT: &str = "SELECT";
pub const WHERE: &str = "WHERE";
pub const FOR: &str = "FOR";
/// Separator between FOR-clause assignments
pub const AND: &str = "AND";
pub const ASSIGN: &str = ":=";

/// Lexical shape of the text following a literal type keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicalForm {
    /// `[+-]? (0x<hex> | <digits>)`
    Integer,
    /// `[+-]? <digits> [. <digits>] [e[+-]<digits>]`, `NaN`, `Infinity`
    Decimal,
    /// word characters: `true`, `false`
    Word,
    /// one quoted string
    Quoted,
    /// one or more quoted strings separated by spaces
    QuotedSequence,
    /// a quoted string or a bare run up to whitespace, `,`, `(`, `)`, `[`, `]`
    Token,
    /// a `{...}` object
    Json,
}

impl LexicalForm {
    /// What to report when the text after a type keyword has the wrong shape
    pub const fn label(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Decimal => "number",
            Self::Word => "true or false",
            Self::Quoted | Self::QuotedSequence => "quoted string",
            Self::Token => "literal text",
            Self::Json => "JSON object",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LiteralKeyword {
    pub keyword: &'static str,
    pub ty: BuiltinType,
    pub form: LexicalForm,
}

const fn literal(keyword: &'static str, ty: BuiltinType, form: LexicalForm) -> LiteralKeyword {
    LiteralKeyword { keyword, ty, form }
}

pub const LITERAL_KEYWORDS: &[LiteralKeyword] = &[
    literal("SBYTE", BuiltinType::SByte, LexicalForm::Integer),
    literal("BYTESTRING", BuiltinType::ByteString, LexicalForm::Token),
    literal("BYTE", BuiltinType::Byte, LexicalForm::Integer),
    literal("INT16", BuiltinType::Int16, LexicalForm::Integer),
    literal("INT32", BuiltinType::Int32, LexicalForm::Integer),
    literal("INT64", BuiltinType::Int64, LexicalForm::Integer),
    literal("UINT16", BuiltinType::UInt16, LexicalForm::Integer),
    literal("UINT32", BuiltinType::UInt32, LexicalForm::Integer),
    literal("UINT64", BuiltinType::UInt64, LexicalForm::Integer),
    literal("BOOLEAN", BuiltinType::Boolean, LexicalForm::Word),
    literal("DOUBLE", BuiltinType::Double, LexicalForm::Decimal),
    literal("FLOAT", BuiltinType::Float, LexicalForm::Decimal),
    literal("STRING", BuiltinType::String, LexicalForm::Quoted),
    literal("EXPANDEDNODEID", BuiltinType::ExpandedNodeId, LexicalForm::Token),
    literal("NODEID", BuiltinType::NodeId, LexicalForm::Token),
    literal("GUID", BuiltinType::Guid, LexicalForm::Token),
    literal("QUALIFIEDNAME", BuiltinType::QualifiedName, LexicalForm::Token),
    literal("LOCALIZEDTEXT", BuiltinType::LocalizedText, LexicalForm::QuotedSequence),
    literal("STATUSCODE", BuiltinType::StatusCode, LexicalForm::Token),
    literal("DATETIME", BuiltinType::DateTime, LexicalForm::Quoted),
    literal("JSON", BuiltinType::Variant, LexicalForm::Json),
];

/// How an operator's arguments are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorShape {
    /// `OP ( a )`
    Unary,
    /// `OP ( a , b )`
    Binary,
    /// `OP a [ low , high ]`
    Between,
    /// `OP a [ c1 , c2 , ... ]`, possibly empty
    InList,
}

#[derive(Debug, Clone, Copy)]
pub struct OperatorToken {
    pub token: &'static str,
    /// Word tokens need a word boundary; symbols do not
    pub is_word: bool,
    pub kind: OperatorKind,
    pub shape: OperatorShape,
}

const fn word(token: &'static str, kind: OperatorKind, shape: OperatorShape) -> OperatorToken {
    OperatorToken {
        token,
        is_word: true,
        kind,
        shape,
    }
}

const fn symbol(token: &'static str, kind: OperatorKind, shape: OperatorShape) -> OperatorToken {
    OperatorToken {
        token,
        is_word: false,
        kind,
        shape,
    }
}

pub const OPERATOR_TOKENS: &[OperatorToken] = &[
    // unary
    word("NOT", OperatorKind::Not, OperatorShape::Unary),
    symbol("!", OperatorKind::Not, OperatorShape::Unary),
    word("ISNULL", OperatorKind::IsNull, OperatorShape::Unary),
    word("OFTYPE", OperatorKind::OfType, OperatorShape::Unary),
    // binary
    word("GREATERTHANOREQUAL", OperatorKind::GreaterThanOrEqual, OperatorShape::Binary),
    symbol(">=", OperatorKind::GreaterThanOrEqual, OperatorShape::Binary),
    word("GREATERTHAN", OperatorKind::GreaterThan, OperatorShape::Binary),
    symbol(">", OperatorKind::GreaterThan, OperatorShape::Binary),
    word("LESSTHANOREQUAL", OperatorKind::LessThanOrEqual, OperatorShape::Binary),
    symbol("<=", OperatorKind::LessThanOrEqual, OperatorShape::Binary),
    word("LESSTHAN", OperatorKind::LessThan, OperatorShape::Binary),
    symbol("<", OperatorKind::LessThan, OperatorShape::Binary),
    word("EQUALS", OperatorKind::Equals, OperatorShape::Binary),
    symbol("==", OperatorKind::Equals, OperatorShape::Binary),
    word("LIKE", OperatorKind::Like, OperatorShape::Binary),
    word("CAST", OperatorKind::Cast, OperatorShape::Binary),
    word("BITWISEAND", OperatorKind::BitwiseAnd, OperatorShape::Binary),
    word("BITWISEOR", OperatorKind::BitwiseOr, OperatorShape::Binary),
    word("AND", OperatorKind::And, OperatorShape::Binary),
    symbol("&&", OperatorKind::And, OperatorShape::Binary),
    word("OR", OperatorKind::Or, OperatorShape::Binary),
    symbol("||", OperatorKind::Or, OperatorShape::Binary),
    symbol("&", OperatorKind::BitwiseAnd, OperatorShape::Binary),
    symbol("|", OperatorKind::BitwiseOr, OperatorShape::Binary),
    // between / in-list
    word("BETWEEN", OperatorKind::Between, OperatorShape::Between),
    word("INLIST", OperatorKind::InList, OperatorShape::InList),
];

/// Bare boolean words
pub const TRUE_WORDS: &[&str] = &["true", "TRUE"];
pub const FALSE_WORDS: &[&str] = &["false", "FALSE"];

/// Node id prefixes that may open an attribute operand
pub const NODE_ID_PREFIXES: &[&str] = &["ns=", "i=", "s=", "g=", "b="];

#[cfg(test)]
mod tests {
    use super::*;

    /// No token may be shadowed by an earlier token that is its prefix
    fn assert_longer_first(tokens: &[(&str, bool)]) {
        for (later_index, (later, _)) in tokens.iter().enumerate() {
            for (earlier, is_word) in &tokens[..later_index] {
                if later.starts_with(earlier) && later != earlier {
                    assert!(
                        *is_word,
                        "symbol '{}' is listed before the longer '{}'",
                        earlier, later
                    );
                }
            }
        }
    }

    #[test]
    fn test_literal_keywords_longer_first() {
        let tokens: Vec<_> = LITERAL_KEYWORDS.iter().map(|k| (k.keyword, false)).collect();
        assert_longer_first(&tokens);
    }

    #[test]
    fn test_operator_symbols_longer_first() {
        let tokens: Vec<_> = OPERATOR_TOKENS
            .iter()
            .map(|t| (t.token, t.is_word))
            .collect();
        assert_longer_first(&tokens);
    }

    #[test]
    fn test_every_operator_kind_has_a_keyword() {
        use OperatorKind::*;
        for kind in [
            Equals, IsNull, GreaterThan, LessThan, GreaterThanOrEqual, LessThanOrEqual, Like,
            Not, Between, InList, And, Or, Cast, OfType, BitwiseAnd, BitwiseOr,
        ] {
            assert!(
                OPERATOR_TOKENS
                    .iter()
                    .any(|t| t.kind == kind && t.is_word && t.token == kind.as_str()),
                "no keyword for {}",
                kind
            );
        }
    }
}
