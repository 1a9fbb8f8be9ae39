//! Grammar rules and semantic actions
//!
//! ```text
//! EventFilter  = _ SelectClause ( _ WhereClause | _ ForClause )* _ EOF   (each at most once)
//! SelectClause = "SELECT" _ Operand ( _ "," _ Operand )*
//! WhereClause  = "WHERE" _ ( Operator | Reference | AttributeOperand )
//! ForClause    = "FOR" _ Assignment ( _ "AND" _ Assignment )*
//! Assignment   = Reference _ ":=" _ Operand
//! Operand      = "(" _ Operand _ ")" | Reference | Literal | Operator | AttributeOperand
//! ```
//!
//! `_` is optional whitespace and comments. Every rule is an ordered choice:
//! the first alternative that matches wins and failed alternatives restore
//! the cursor. Nodes allocated by a failed alternative stay in the arena;
//! they are unreachable and released with it.
//!
//! Alternatives are gated on a cheap lookahead so that only real
//! expectations end up in syntax error messages.

use super::error::{ParseError, SyntaxError};
use super::keywords::{
    self, LexicalForm, LiteralKeyword, OperatorShape, OperatorToken, LITERAL_KEYWORDS,
    NODE_ID_PREFIXES, OPERATOR_TOKENS,
};
use crate::attribute_path::AttributePathParser;
use crate::config::compile_time::syntax::{MAX_ERROR_EXCERPT_LENGTH, MAX_IDENTIFIER_LENGTH};
use crate::literal::ValueParser;
use crate::log_debug;
use crate::matcher::{is_identifier_continue, is_identifier_start, Halt, Matcher};
use crate::operands::{Operand, OperandId, OperandList, OperatorKind};
use crate::types::BuiltinType;
use crate::utils::{SourceMap, Span};

type Rule<'a, 'p> = fn(&mut ParseContext<'a, 'p>) -> Option<OperandId>;

/// Result of a successful grammar match
#[derive(Debug, Clone)]
pub struct ParsedFilter {
    pub operands: OperandList,
    /// Root of the WHERE clause
    pub top: Option<OperandId>,
}

/// Per-call parse state: cursor, sticky error, arena and WHERE root
pub struct ParseContext<'a, 'p> {
    m: Matcher<'a>,
    source_map: SourceMap<'a>,
    operands: OperandList,
    top: Option<OperandId>,
    error: Option<ParseError>,
    max_depth: usize,
    value_parser: &'p dyn ValueParser,
    path_parser: &'p dyn AttributePathParser,
    log_match_details: bool,
}

impl<'a, 'p> ParseContext<'a, 'p> {
    pub fn new(
        input: &'a str,
        max_depth: usize,
        value_parser: &'p dyn ValueParser,
        path_parser: &'p dyn AttributePathParser,
    ) -> Self {
        Self {
            m: Matcher::new(input, max_depth),
            source_map: SourceMap::new(input),
            operands: OperandList::new(),
            top: None,
            error: None,
            max_depth,
            value_parser,
            path_parser,
            log_match_details: false,
        }
    }

    /// Use a custom arena (limits)
    pub fn with_operands(mut self, operands: OperandList) -> Self {
        self.operands = operands;
        self
    }

    pub fn with_match_logging(mut self, enabled: bool) -> Self {
        self.log_match_details = enabled;
        self
    }

    /// Match the whole input
    pub fn parse(mut self) -> Result<ParsedFilter, ParseError> {
        let matched = self.event_filter().is_some();

        if let Some(error) = self.error.take() {
            return Err(error);
        }
        if let Some(Halt::DepthExceeded { offset }) = self.m.halt_reason() {
            let span = self.source_map.span(offset, offset);
            return Err(SyntaxError::max_depth_exceeded(self.max_depth, span).into());
        }
        if !matched {
            return Err(self.syntax_error().into());
        }

        Ok(ParsedFilter {
            operands: self.operands,
            top: self.top,
        })
    }

    // ------------------------------------------------------------------
    // Combinators
    // ------------------------------------------------------------------

    fn attempt<T>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        if self.m.is_halted() {
            return None;
        }
        let start = self.m.checkpoint();
        let result = rule(self);
        if result.is_none() {
            self.m.restore(start);
        }
        result
    }

    /// Ordered choice: the first rule that matches wins
    fn choice(&mut self, rules: &[Rule<'a, 'p>]) -> Option<OperandId> {
        rules.iter().find_map(|rule| self.attempt(*rule))
    }

    /// Record the sticky error and stop matching
    fn fail<T>(&mut self, error: impl Into<ParseError>) -> Option<T> {
        if self.error.is_none() {
            self.error = Some(error.into());
        }
        self.m.abort();
        None
    }

    fn token(&mut self, text: &'static str) -> Option<()> {
        self.m.skip_trivia();
        self.m.literal(text).then_some(())
    }

    fn keyword(&mut self, word: &'static str) -> Option<()> {
        self.m.skip_trivia();
        self.m.keyword(word).then_some(())
    }

    fn looking_at(&self, text: &str) -> bool {
        self.m.rest().starts_with(text)
    }

    fn span_from(&self, start: usize) -> Span {
        self.source_map.span(start, self.m.position())
    }

    fn alloc(&mut self, operand: Operand, span: Span) -> Option<OperandId> {
        match self.operands.push(operand, span) {
            Ok(id) => Some(id),
            Err(error) => self.fail(error),
        }
    }

    // ------------------------------------------------------------------
    // Clauses
    // ------------------------------------------------------------------

    fn event_filter(&mut self) -> Option<()> {
        self.select_clause()?;

        let mut seen_where = false;
        let mut seen_for = false;
        loop {
            if !seen_where && self.attempt(Self::where_clause).is_some() {
                seen_where = true;
                continue;
            }
            if !seen_for && self.attempt(Self::for_clause).is_some() {
                seen_for = true;
                continue;
            }
            break;
        }

        self.m.skip_trivia();
        self.m.end_of_input().then_some(())
    }

    fn select_clause(&mut self) -> Option<()> {
        self.keyword(keywords::SELECT)?;
        let first = self.operand()?;
        self.push_select(first)?;

        while let Some(next) = self.attempt(|ctx| {
            ctx.token(",")?;
            ctx.operand()
        }) {
            self.push_select(next)?;
        }
        Some(())
    }

    fn push_select(&mut self, id: OperandId) -> Option<()> {
        match self.operands.push_select(id) {
            Ok(()) => Some(()),
            Err(error) => self.fail(error),
        }
    }

    fn where_clause(&mut self) -> Option<()> {
        self.keyword(keywords::WHERE)?;
        self.m.skip_trivia();
        let root = self.choice(&[Self::operator, Self::reference, Self::attribute_operand]);
        let Some(root) = root else {
            self.m.expected("operator, reference or attribute operand");
            return None;
        };
        self.top = Some(root);
        Some(())
    }

    fn for_clause(&mut self) -> Option<()> {
        self.keyword(keywords::FOR)?;
        self.assignment()?;
        while self
            .attempt(|ctx| {
                ctx.keyword(keywords::AND)?;
                ctx.assignment()
            })
            .is_some()
        {}
        Some(())
    }

    fn assignment(&mut self) -> Option<()> {
        self.m.skip_trivia();
        let start = self.m.position();
        let Some(name) = self.reference_name() else {
            self.m.expected("reference");
            return None;
        };
        let span = self.span_from(start);
        self.token(keywords::ASSIGN)?;
        let target = self.operand()?;

        if self.log_match_details {
            log_debug!("Binding matched", "name" => &name, "target" => target);
        }
        match self.operands.bind(&name, target, span) {
            Ok(()) => Some(()),
            Err(error) => self.fail(error),
        }
    }

    // ------------------------------------------------------------------
    // Operands
    // ------------------------------------------------------------------

    fn operand(&mut self) -> Option<OperandId> {
        self.m.skip_trivia();
        if !self.m.enter() {
            return None;
        }
        let result = self.choice(&[
            Self::parenthesized,
            Self::reference,
            Self::literal,
            Self::operator,
            Self::attribute_operand,
        ]);
        self.m.leave();

        if result.is_none() {
            self.m.expected("operand");
        }
        result
    }

    fn parenthesized(&mut self) -> Option<OperandId> {
        if !self.looking_at("(") {
            return None;
        }
        self.token("(")?;
        let inner = self.operand()?;
        self.token(")")?;
        Some(inner)
    }

    /// `$` identifier; returns the name
    fn reference_name(&mut self) -> Option<String> {
        let starts_identifier = self.m.peek_at(1).is_some_and(is_identifier_start);
        if !self.looking_at("$") || !starts_identifier {
            return None;
        }
        self.m.literal("$");

        let start = self.m.position();
        self.m.take_while(is_identifier_continue);
        let name = self.m.input().get(start..self.m.position())?;

        if name.len() > MAX_IDENTIFIER_LENGTH {
            let span = self.span_from(start);
            return self.fail(SyntaxError::identifier_too_long(
                name,
                MAX_IDENTIFIER_LENGTH,
                span,
            ));
        }
        Some(name.to_string())
    }

    fn reference(&mut self) -> Option<OperandId> {
        let start = self.m.position();
        let name = self.reference_name()?;
        let span = self.span_from(start);
        self.alloc(Operand::Reference { name, target: None }, span)
    }

    // ------------------------------------------------------------------
    // Literals
    // ------------------------------------------------------------------

    fn literal(&mut self) -> Option<OperandId> {
        for entry in LITERAL_KEYWORDS {
            if !self.looking_at(entry.keyword) {
                continue;
            }
            if let Some(id) = self.attempt(|ctx| ctx.typed_literal(entry)) {
                return Some(id);
            }
            if self.m.is_halted() {
                return None;
            }
        }
        self.choice(&[
            Self::bare_string,
            Self::bare_decimal,
            Self::bare_integer,
            Self::bare_boolean,
        ])
    }

    fn typed_literal(&mut self, entry: &LiteralKeyword) -> Option<OperandId> {
        let start = self.m.position();
        if !self.m.keyword(entry.keyword) {
            return None;
        }
        self.m.skip_trivia();

        let Some((text, text_start)) = self.lexeme(entry.form) else {
            self.m.expected(entry.form.label());
            return None;
        };
        let text_span = self.source_map.span(text_start, text_start + text.len());
        let id = self.convert(entry.ty, text, text_span, start)?;

        if self.log_match_details {
            log_debug!("Literal matched", "type" => entry.ty, "text" => text);
        }
        Some(id)
    }

    fn lexeme(&mut self, form: LexicalForm) -> Option<(&'a str, usize)> {
        match form {
            LexicalForm::Integer => self.m.capture(integer_lexeme),
            LexicalForm::Decimal => self.m.capture(decimal_lexeme),
            LexicalForm::Word => self
                .m
                .capture(|m| m.take_while(is_identifier_continue) > 0),
            LexicalForm::Quoted => self.m.capture(Matcher::quoted_string),
            LexicalForm::QuotedSequence => self.m.capture(|m| {
                if !m.quoted_string() {
                    return false;
                }
                while m
                    .attempt(|m| {
                        let gap = m.take_while(|b| b == b' ' || b == b'\t');
                        (gap > 0 && m.peek().is_some_and(is_quote) && m.quoted_string())
                            .then_some(())
                    })
                    .is_some()
                {}
                true
            }),
            LexicalForm::Token => self.m.capture(|m| {
                if m.peek().is_some_and(is_quote) {
                    m.quoted_string()
                } else {
                    m.take_while(is_token_byte) > 0
                }
            }),
            LexicalForm::Json => self.m.capture(Matcher::balanced_braces),
        }
    }

    /// Hand captured text to the value parser and allocate the literal
    fn convert(
        &mut self,
        ty: BuiltinType,
        text: &str,
        text_span: Span,
        start: usize,
    ) -> Option<OperandId> {
        match self.value_parser.parse_value(ty, text, text_span) {
            Ok(value) => {
                let span = self.span_from(start);
                self.alloc(Operand::Literal(value), span)
            }
            Err(error) => self.fail(error),
        }
    }

    fn bare_string(&mut self) -> Option<OperandId> {
        if !self.m.peek().is_some_and(is_quote) {
            return None;
        }
        let (text, start) = self.m.capture(Matcher::quoted_string)?;
        let span = self.span_from(start);
        self.convert(BuiltinType::String, text, span, start)
    }

    fn bare_decimal(&mut self) -> Option<OperandId> {
        if !self.at_number() {
            return None;
        }
        let (text, start) = self.m.capture(decimal_lexeme)?;
        // plain integers are left to bare_integer
        if !text.bytes().any(|b| matches!(b, b'.' | b'e' | b'E')) {
            return None;
        }
        let span = self.span_from(start);
        self.convert(BuiltinType::Double, text, span, start)
    }

    fn bare_integer(&mut self) -> Option<OperandId> {
        if !self.at_number() {
            return None;
        }
        let (text, start) = self.m.capture(integer_lexeme)?;
        let span = self.span_from(start);
        self.convert(BuiltinType::Int32, text, span, start)
    }

    fn at_number(&self) -> bool {
        match self.m.peek() {
            Some(b'+') | Some(b'-') => self.m.peek_at(1).is_some_and(|b| b.is_ascii_digit()),
            Some(b) => b.is_ascii_digit(),
            None => false,
        }
    }

    fn bare_boolean(&mut self) -> Option<OperandId> {
        let start = self.m.position();
        let value = if let Some(word) = self.word_from(keywords::TRUE_WORDS) {
            self.m.keyword(word).then_some("true")?
        } else if let Some(word) = self.word_from(keywords::FALSE_WORDS) {
            self.m.keyword(word).then_some("false")?
        } else {
            return None;
        };
        let span = self.span_from(start);
        self.convert(BuiltinType::Boolean, value, span, start)
    }

    fn word_from(&self, words: &[&'static str]) -> Option<&'static str> {
        words.iter().copied().find(|w| self.looking_at(w))
    }

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------

    fn operator(&mut self) -> Option<OperandId> {
        for token in OPERATOR_TOKENS {
            if !self.looking_at(token.token) {
                continue;
            }
            if let Some(id) = self.attempt(|ctx| ctx.operator_form(token)) {
                return Some(id);
            }
            if self.m.is_halted() {
                return None;
            }
        }
        None
    }

    fn operator_form(&mut self, token: &OperatorToken) -> Option<OperandId> {
        let start = self.m.position();
        let matched = if token.is_word {
            self.m.keyword(token.token)
        } else {
            self.m.literal(token.token)
        };
        if !matched {
            return None;
        }

        let children = match token.shape {
            OperatorShape::Unary => {
                self.token("(")?;
                let operand = self.operand()?;
                self.token(")")?;
                vec![operand]
            }
            OperatorShape::Binary => {
                self.token("(")?;
                let left = self.operand()?;
                self.token(",")?;
                let right = self.operand()?;
                self.token(")")?;
                vec![left, right]
            }
            OperatorShape::Between => {
                let subject = self.operand()?;
                self.token("[")?;
                let low = self.operand()?;
                self.token(",")?;
                let high = self.operand()?;
                self.token("]")?;
                vec![subject, low, high]
            }
            OperatorShape::InList => {
                let subject = self.operand()?;
                self.token("[")?;
                let mut children = vec![subject];
                if let Some(first) = self.attempt(Self::operand) {
                    children.push(first);
                    while let Some(next) = self.attempt(|ctx| {
                        ctx.token(",")?;
                        ctx.operand()
                    }) {
                        children.push(next);
                    }
                }
                self.token("]")?;
                children
            }
        };

        let span = self.span_from(start);
        if self.log_match_details {
            log_debug!("Operator matched",
                "kind" => token.kind,
                "children" => children.len()
            );
        }
        self.alloc_operator(token.kind, children, span)
    }

    fn alloc_operator(
        &mut self,
        kind: OperatorKind,
        children: Vec<OperandId>,
        span: Span,
    ) -> Option<OperandId> {
        debug_assert!(kind.arity().accepts(children.len()));
        self.alloc(Operand::Operator { kind, children }, span)
    }

    // ------------------------------------------------------------------
    // Attribute operands
    // ------------------------------------------------------------------

    fn attribute_operand(&mut self) -> Option<OperandId> {
        if !self.at_attribute_start() {
            return None;
        }

        let (text, start) = self.m.capture(|m| {
            if !attribute_body(m) {
                return false;
            }
            // trailing index range, e.g. [0:3,2]
            m.attempt(|m| {
                if m.peek() != Some(b'[') {
                    return None;
                }
                m.literal("[");
                let digits = m.take_while(|b| b.is_ascii_digit() || b == b':' || b == b',');
                (digits > 0 && m.peek() == Some(b']') && m.literal("]")).then_some(())
            });
            true
        })?;

        let span = self.span_from(start);
        match self.path_parser.parse_attribute_operand(text, span) {
            Ok(operand) => {
                if self.log_match_details {
                    log_debug!("Attribute operand matched", "text" => text);
                }
                self.alloc(Operand::Attribute(operand), span)
            }
            Err(error) => self.fail(error),
        }
    }

    fn at_attribute_start(&self) -> bool {
        match self.m.peek() {
            Some(b'/') | Some(b'.') => true,
            Some(b'$') => self.m.peek_at(1).is_some_and(|b| b.is_ascii_digit()),
            _ => NODE_ID_PREFIXES.iter().any(|prefix| self.looking_at(prefix)),
        }
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    fn syntax_error(&self) -> SyntaxError {
        let failure = self.m.farthest_failure();
        let input = self.m.input();
        let offset = failure.offset.min(input.len());
        let rest = input.get(offset..).unwrap_or_default();

        let found = if rest.is_empty() {
            "end of input".to_string()
        } else {
            let line = rest.lines().next().unwrap_or_default();
            let excerpt: String = line.chars().take(MAX_ERROR_EXCERPT_LENGTH).collect();
            format!("'{}'", excerpt)
        };

        let end = offset + rest.chars().next().map_or(0, char::len_utf8);
        let span = self.source_map.span(offset, end);
        SyntaxError::unexpected_input(&failure.expected, &found, span)
    }
}

// ----------------------------------------------------------------------
// Lexical helpers. These never record expectations; the calling rule
// reports one label for the whole lexeme.
// ----------------------------------------------------------------------

fn is_quote(b: u8) -> bool {
    b == b'"' || b == b'\''
}

fn is_token_byte(b: u8) -> bool {
    !b.is_ascii_whitespace() && !matches!(b, b',' | b'(' | b')' | b'[' | b']')
}

/// Consume `text` if the input starts with it
fn eat(m: &mut Matcher<'_>, text: &'static str) -> bool {
    m.rest().starts_with(text) && m.literal(text)
}

fn sign(m: &mut Matcher<'_>) {
    if !eat(m, "+") {
        eat(m, "-");
    }
}

fn digits(m: &mut Matcher<'_>) -> usize {
    m.take_while(|b| b.is_ascii_digit())
}

/// `[+-]? (0x<hex>+ | <digit>+)` not followed by a word character or `.`
fn integer_lexeme(m: &mut Matcher<'_>) -> bool {
    sign(m);
    let count = if eat(m, "0x") || eat(m, "0X") {
        m.take_while(|b| b.is_ascii_hexdigit())
    } else {
        digits(m)
    };
    count > 0
        && !m
            .peek()
            .is_some_and(|b| is_identifier_continue(b) || b == b'.')
}

/// `[+-]? <digit>+ [. <digit>+] [(e|E) [+-]? <digit>+]`, or `NaN` / `[+-]Infinity`
fn decimal_lexeme(m: &mut Matcher<'_>) -> bool {
    if eat(m, "NaN") {
        return !m.peek().is_some_and(is_identifier_continue);
    }
    sign(m);
    if eat(m, "Infinity") {
        return !m.peek().is_some_and(is_identifier_continue);
    }
    if digits(m) == 0 {
        return false;
    }
    if m.peek() == Some(b'.') && m.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
        eat(m, ".");
        digits(m);
    }
    m.attempt(|m| {
        if !eat(m, "e") && !eat(m, "E") {
            return None;
        }
        sign(m);
        (digits(m) > 0).then_some(())
    });
    !m.peek().is_some_and(|b| is_identifier_continue(b) || b == b'.')
}

/// Attribute operand text up to whitespace or a delimiter; `&` escapes one character
fn attribute_body(m: &mut Matcher<'_>) -> bool {
    let start = m.position();
    loop {
        match m.peek() {
            Some(b'&') => {
                eat(m, "&");
                if let Some(escaped) = m.rest().chars().next() {
                    for _ in 0..escaped.len_utf8() {
                        m.byte_if(|_| true, "escaped character");
                    }
                }
            }
            // a block comment ends the operand
            Some(b'/') if m.peek_at(1) == Some(b'*') => break,
            Some(b) if is_token_byte(b) => {
                m.byte_if(|_| true, "attribute operand");
            }
            _ => break,
        }
    }
    m.position() > start
}
