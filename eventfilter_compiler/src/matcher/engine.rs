//! Backtracking matcher over the raw input bytes
//!
//! Primitives either consume input and succeed or leave the cursor where it
//! was and fail. Ordered choice is built from `checkpoint`/`restore`
//! (see `attempt`). The engine never skips whitespace on its own; grammar
//! rules call `skip_trivia` at token boundaries.

use std::collections::BTreeSet;

/// Saved cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Why the matcher stopped accepting input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// A semantic action reported an error
    Aborted,
    /// Rule nesting exceeded the configured depth
    DepthExceeded { offset: usize },
}

/// Furthest position any rule attempt reached, and what was expected there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarthestFailure {
    pub offset: usize,
    pub expected: Vec<&'static str>,
}

#[derive(Debug)]
pub struct Matcher<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
    max_depth: usize,
    halt: Option<Halt>,
    farthest: usize,
    expected: BTreeSet<&'static str>,
}

impl<'a> Matcher<'a> {
    pub fn new(input: &'a str, max_depth: usize) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
            max_depth,
            halt: None,
            farthest: 0,
            expected: BTreeSet::new(),
        }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn rest(&self) -> &'a str {
        self.input.get(self.pos..).unwrap_or_default()
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    pub fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + ahead).copied()
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    // ------------------------------------------------------------------
    // Backtracking
    // ------------------------------------------------------------------

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0;
    }

    /// Run `rule`; on failure the cursor is put back where it started
    pub fn attempt<T>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        if self.is_halted() {
            return None;
        }
        let start = self.checkpoint();
        let result = rule(self);
        if result.is_none() {
            self.restore(start);
        }
        result
    }

    /// Run `rule` and return the text it consumed
    pub fn capture(&mut self, rule: impl FnOnce(&mut Self) -> bool) -> Option<(&'a str, usize)> {
        let start = self.pos;
        self.attempt(|m| rule(m).then_some(()))?;
        let text = self.input.get(start..self.pos)?;
        Some((text, start))
    }

    // ------------------------------------------------------------------
    // Sticky failure and depth guard
    // ------------------------------------------------------------------

    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }

    pub fn halt_reason(&self) -> Option<Halt> {
        self.halt
    }

    /// Stop matching; the first halt wins
    pub fn abort(&mut self) {
        if self.halt.is_none() {
            self.halt = Some(Halt::Aborted);
        }
    }

    /// Enter a nested rule; fails (and halts) once the depth limit is hit
    pub fn enter(&mut self) -> bool {
        if self.is_halted() {
            return false;
        }
        if self.depth >= self.max_depth {
            self.halt = Some(Halt::DepthExceeded { offset: self.pos });
            return false;
        }
        self.depth += 1;
        true
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    // ------------------------------------------------------------------
    // Failure bookkeeping
    // ------------------------------------------------------------------

    /// Record that `what` was expected at the current position
    pub fn expected(&mut self, what: &'static str) {
        if self.pos > self.farthest {
            self.farthest = self.pos;
            self.expected.clear();
        }
        if self.pos == self.farthest {
            self.expected.insert(what);
        }
    }

    pub fn farthest_failure(&self) -> FarthestFailure {
        FarthestFailure {
            offset: self.farthest.max(self.pos),
            expected: self.expected.iter().copied().collect(),
        }
    }

    // ------------------------------------------------------------------
    // Terminals
    // ------------------------------------------------------------------

    /// Exact text match
    pub fn literal(&mut self, text: &'static str) -> bool {
        if self.is_halted() {
            return false;
        }
        if self.rest().starts_with(text) {
            self.pos += text.len();
            true
        } else {
            self.expected(text);
            false
        }
    }

    /// Keyword match: exact text not followed by an identifier character
    pub fn keyword(&mut self, word: &'static str) -> bool {
        if self.is_halted() {
            return false;
        }
        let rest = self.rest();
        let boundary = rest
            .as_bytes()
            .get(word.len())
            .map_or(true, |&b| !is_identifier_continue(b));
        if rest.starts_with(word) && boundary {
            self.pos += word.len();
            true
        } else {
            self.expected(word);
            false
        }
    }

    /// Consume one byte matching `class`
    pub fn byte_if(&mut self, class: impl Fn(u8) -> bool, what: &'static str) -> bool {
        if self.is_halted() {
            return false;
        }
        match self.peek() {
            Some(b) if class(b) => {
                self.pos += 1;
                true
            }
            _ => {
                self.expected(what);
                false
            }
        }
    }

    /// Consume bytes while `class` holds; returns how many were consumed
    pub fn take_while(&mut self, class: impl Fn(u8) -> bool) -> usize {
        if self.is_halted() {
            return 0;
        }
        let count = self
            .rest()
            .as_bytes()
            .iter()
            .take_while(|&&b| class(b))
            .count();
        self.pos += count;
        count
    }

    /// One or more bytes of `class`
    pub fn take_while1(&mut self, class: impl Fn(u8) -> bool, what: &'static str) -> bool {
        if self.take_while(class) > 0 {
            true
        } else {
            self.expected(what);
            false
        }
    }

    /// End of input
    pub fn end_of_input(&mut self) -> bool {
        if self.is_at_end() {
            true
        } else {
            self.expected("end of input");
            false
        }
    }

    /// Optional whitespace and comments: `# ...` to end of line, `/* ... */`.
    /// An unterminated block comment is left in place for the caller to reject.
    pub fn skip_trivia(&mut self) {
        if self.is_halted() {
            return;
        }
        loop {
            self.take_while(|b| b.is_ascii_whitespace());
            let rest = self.rest();
            if rest.starts_with('#') {
                let line_end = rest.find('\n').unwrap_or(rest.len());
                self.pos += line_end;
            } else if let Some(body) = rest.strip_prefix("/*") {
                match body.find("*/") {
                    Some(close) => self.pos += 2 + close + 2,
                    None => return,
                }
            } else {
                return;
            }
        }
    }

    /// A double or single quoted string with backslash escapes
    pub fn quoted_string(&mut self) -> bool {
        self.attempt(|m| {
            let quote = match m.peek() {
                Some(q @ (b'"' | b'\'')) => q,
                _ => {
                    m.expected("quoted string");
                    return None;
                }
            };
            m.pos += 1;
            loop {
                match m.peek() {
                    None => {
                        m.expected("closing quote");
                        return None;
                    }
                    Some(b'\\') => {
                        m.pos += 1;
                        if m.peek().is_none() {
                            m.expected("escaped character");
                            return None;
                        }
                        m.advance_char();
                    }
                    Some(b) if b == quote => {
                        m.pos += 1;
                        return Some(());
                    }
                    Some(_) => m.advance_char(),
                }
            }
        })
        .is_some()
    }

    /// A `{...}` object with nested braces; braces inside strings are ignored
    pub fn balanced_braces(&mut self) -> bool {
        self.attempt(|m| {
            if !m.literal("{") {
                return None;
            }
            let mut depth = 1usize;
            while depth > 0 {
                match m.peek() {
                    None => {
                        m.expected("'}'");
                        return None;
                    }
                    Some(b'"') | Some(b'\'') => {
                        if !m.quoted_string() {
                            return None;
                        }
                    }
                    Some(b'{') => {
                        depth += 1;
                        m.pos += 1;
                    }
                    Some(b'}') => {
                        depth -= 1;
                        m.pos += 1;
                    }
                    Some(_) => m.advance_char(),
                }
            }
            Some(())
        })
        .is_some()
    }

    fn advance_char(&mut self) {
        let width = self.rest().chars().next().map_or(1, char::len_utf8);
        self.pos += width;
    }
}

pub fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

pub fn is_identifier_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_restores_on_failure() {
        let mut m = Matcher::new("SELECTX", 8);
        let matched = m.attempt(|m| m.keyword("SELECT").then_some(()));
        assert!(matched.is_none());
        assert_eq!(m.position(), 0);
        assert!(m.literal("SELECT"));
        assert_eq!(m.rest(), "X");
    }

    #[test]
    fn test_longer_alternative_must_come_first() {
        // ">" listed before ">=" commits to a partial token
        let mut m = Matcher::new(">=(", 8);
        assert!(m.literal(">"));
        assert!(!m.literal("("));

        let mut m = Matcher::new(">=(", 8);
        assert!(m.literal(">=") || m.literal(">"));
        assert!(m.literal("("));
    }

    #[test]
    fn test_skip_trivia_handles_comments() {
        let mut m = Matcher::new("  # line\n /* block */\tWHERE", 8);
        m.skip_trivia();
        assert_eq!(m.rest(), "WHERE");

        let mut m = Matcher::new("/* open", 8);
        m.skip_trivia();
        assert_eq!(m.position(), 0);
    }

    #[test]
    fn test_capture_returns_consumed_text() {
        let mut m = Matcher::new("abc123 rest", 8);
        let captured = m.capture(|m| m.take_while1(is_identifier_continue, "identifier"));
        assert_eq!(captured, Some(("abc123", 0)));
        assert_eq!(m.rest(), " rest");
    }

    #[test]
    fn test_quoted_strings_and_braces() {
        let mut m = Matcher::new(r#""a \" b" tail"#, 8);
        assert!(m.quoted_string());
        assert_eq!(m.rest(), " tail");

        let mut m = Matcher::new(r#"{"k": {"x": "}"}} after"#, 8);
        assert!(m.balanced_braces());
        assert_eq!(m.rest(), " after");

        let mut m = Matcher::new("\"unterminated", 8);
        assert!(!m.quoted_string());
        assert_eq!(m.position(), 0);
    }

    #[test]
    fn test_depth_guard_halts() {
        let mut m = Matcher::new("x", 2);
        assert!(m.enter());
        assert!(m.enter());
        assert!(!m.enter());
        assert_eq!(m.halt_reason(), Some(Halt::DepthExceeded { offset: 0 }));
        assert!(!m.literal("x"));
    }

    #[test]
    fn test_abort_is_sticky() {
        let mut m = Matcher::new("abc", 4);
        m.abort();
        assert!(m.is_halted());
        assert!(m.attempt(|m| m.literal("a").then_some(())).is_none());
    }

    #[test]
    fn test_farthest_failure_collects_expectations() {
        let mut m = Matcher::new("SELECT ?", 4);
        assert!(m.keyword("SELECT"));
        m.skip_trivia();
        assert!(!m.literal("("));
        assert!(!m.literal("$"));
        let failure = m.farthest_failure();
        assert_eq!(failure.offset, 7);
        assert_eq!(failure.expected, vec!["$", "("]);
    }
}
