//! Shared parser state for the cooperating expression, condition and action
//! parsers

use ruleflow_diagnostics::{
    DiagnosticCollection, ErrorCode, RuleDiagnostic, Severity, SourceSpan, Suggestion,
};
use ruleflow_lexer::{Token, TokenKind};

/// Recursive-descent parser over a lexed token stream.
///
/// The three grammar families (expressions, conditions, actions) share this
/// cursor so partial parses can hand off mid-stream; their productions live
/// in sibling modules as further `impl Parser` blocks.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) current: usize,
    pub(crate) file_id: u32,
    pub(crate) diagnostics: DiagnosticCollection,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, file_id: u32) -> Self {
        Self {
            tokens,
            current: 0,
            file_id,
            diagnostics: DiagnosticCollection::new(),
        }
    }

    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    /// At the EOF token (or past the end of the stream).
    pub fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    pub fn peek_kind(&self) -> &TokenKind {
        self.tokens
            .get(self.current)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    pub fn peek_span(&self) -> SourceSpan {
        self.tokens
            .get(self.current)
            .map(|t| t.span)
            .unwrap_or_else(|| SourceSpan::empty(self.file_id))
    }

    /// Span of the most recently consumed token.
    pub fn previous_span(&self) -> SourceSpan {
        if self.current == 0 {
            return SourceSpan::empty(self.file_id);
        }
        self.tokens
            .get(self.current - 1)
            .map(|t| t.span)
            .unwrap_or_else(|| SourceSpan::empty(self.file_id))
    }

    /// Span from a start marker through the last consumed token.
    pub fn span_from(&self, start: SourceSpan) -> SourceSpan {
        start.merge(&self.previous_span())
    }

    /// Check the current token kind, ignoring any payload.
    pub fn check(&self, expected: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(expected)
    }

    pub fn check_ahead(&self, offset: usize, expected: &TokenKind) -> bool {
        match self.tokens.get(self.current + offset) {
            Some(token) => std::mem::discriminant(&token.kind) == std::mem::discriminant(expected),
            None => false,
        }
    }

    pub fn advance(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.current)
            .cloned()
            .unwrap_or_else(|| {
                Token::new(TokenKind::Eof, SourceSpan::empty(self.file_id), String::new())
            });
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    /// Consume the current token if it matches, otherwise record an error
    /// and return `None`.
    pub fn consume(&mut self, expected: &TokenKind, description: &str) -> Option<Token> {
        if self.check(expected) {
            Some(self.advance())
        } else {
            let found = self.peek_kind().clone();
            let code = if found == TokenKind::Eof {
                ErrorCode::ParseUnexpectedEof
            } else {
                ErrorCode::ParseExpectedToken
            };
            self.error_with_suggestion(
                code,
                format!("expected {}, found '{}'", description, found),
                Some(Suggestion::new(
                    format!("insert {}", description),
                    expected.to_string(),
                    self.peek_span(),
                )),
            );
            None
        }
    }

    /// Consume an identifier and return its name.
    pub fn consume_identifier(&mut self, description: &str) -> Option<String> {
        match self.peek_kind() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            found => {
                let message = format!("expected {}, found '{}'", description, found);
                self.error(ErrorCode::ParseExpectedIdentifier, message);
                None
            }
        }
    }

    pub fn error(&mut self, code: ErrorCode, message: impl Into<String>) {
        self.error_with_suggestion(code, message, None);
    }

    pub fn error_with_suggestion(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        suggestion: Option<Suggestion>,
    ) {
        let mut diagnostic =
            RuleDiagnostic::new(code, Severity::Error, message, self.peek_span());
        if let Some(suggestion) = suggestion {
            diagnostic = diagnostic.with_suggestion(suggestion);
        }
        self.diagnostics.add(diagnostic);
    }

    /// Panic-mode recovery: skip to the next statement boundary or
    /// action-starting keyword so further diagnostics stay meaningful.
    pub fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            match self.peek_kind() {
                TokenKind::Newline | TokenKind::Semicolon | TokenKind::Comma => {
                    self.advance();
                    return;
                }
                kind if kind.starts_action() => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Snapshot of the cursor and diagnostics watermark for speculative
    /// parses.
    pub(crate) fn snapshot(&self) -> (usize, usize) {
        (self.current, self.diagnostics.len())
    }

    pub(crate) fn rollback(&mut self, snapshot: (usize, usize)) {
        self.current = snapshot.0;
        self.diagnostics.truncate(snapshot.1);
    }

    /// Require the stream to be fully consumed after a top-level parse.
    pub fn expect_end(&mut self) {
        if !self.is_at_end() {
            let found = self.peek_kind().clone();
            self.error(
                ErrorCode::ParseUnexpectedToken,
                format!("unexpected '{}' after a complete statement", found),
            );
        }
    }
}
