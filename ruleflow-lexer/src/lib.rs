//! Ruleflow Lexer
//!
//! Tokenizes rule DSL source text into a stream of tokens with source spans.
//! The DSL is English-like: keywords double as operators (`at_least`,
//! `starts_with`) and actions start with verbs (`set`, `calculate`).

use bigdecimal::BigDecimal;
use logos::Logos;
use ruleflow_diagnostics::{DiagnosticCollection, ErrorCode, RuleDiagnostic, SourceSpan};
use std::fmt;

/// A DSL token with source span information.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: SourceSpan,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: SourceSpan, text: String) -> Self {
        Self { kind, span, text }
    }
}

fn parse_number(slice: &str) -> Option<BigDecimal> {
    // Reject forms like `1.` and `1.2.3`
    let mut parts = slice.split('.');
    let _integer = parts.next()?;
    if let Some(fraction) = parts.next() {
        if fraction.is_empty() || parts.next().is_some() {
            return None;
        }
    }
    slice.parse::<BigDecimal>().ok()
}

fn unescape_string(slice: &str) -> Option<String> {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            _ => return None,
        }
    }
    Some(out)
}

/// Token kinds for the rule DSL.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Action keywords
    #[token("set")]
    Set,
    #[token("calculate")]
    Calculate,
    #[token("run")]
    Run,
    #[token("call")]
    Call,
    #[token("add")]
    Add,
    #[token("subtract")]
    Subtract,
    #[token("multiply")]
    Multiply,
    #[token("divide")]
    Divide,
    #[token("append")]
    Append,
    #[token("prepend")]
    Prepend,
    #[token("remove")]
    Remove,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("when")]
    When,
    #[token("to")]
    To,
    #[token("from")]
    From,
    #[token("by")]
    By,
    #[token("with")]
    With,
    #[token("as")]
    As,
    #[token("in")]
    In,
    #[token("forEach")]
    ForEach,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("circuit_breaker")]
    CircuitBreaker,

    // Word operators
    #[token("equals")]
    Equals,
    #[token("not_equals")]
    NotEquals,
    #[token("greater_than")]
    GreaterThan,
    #[token("less_than")]
    LessThan,
    #[token("at_least")]
    AtLeast,
    #[token("at_most")]
    AtMost,
    #[token("between")]
    Between,
    #[token("not_between")]
    NotBetween,
    #[token("contains")]
    Contains,
    #[token("starts_with")]
    StartsWith,
    #[token("ends_with")]
    EndsWith,
    #[token("matches")]
    Matches,
    #[token("in_list")]
    InList,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,

    // Symbols
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("**")]
    StarStar,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token(">=")]
    GtEq,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,

    // Literals
    #[regex(r"[0-9]+(\.[0-9]+)?(\.[0-9.]*)?", |lex| parse_number(lex.slice()))]
    Number(BigDecimal),
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape_string(lex.slice()))]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, |lex| unescape_string(lex.slice()))]
    Str(String),
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Identifier
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Statement delimiter; collapsed unless the caller asks for it
    #[token("\n")]
    Newline,

    // Whitespace and comments (skipped)
    #[regex(r"[ \t\r]+", logos::skip)]
    #[regex(r"#[^\n]*", logos::skip)]
    Whitespace,

    // Unterminated string literals; reported, never parsed
    #[regex(r#""([^"\\\n]|\\.)*"#)]
    #[regex(r#"'([^'\\\n]|\\.)*"#)]
    UnterminatedStr,

    // End of input, appended by the lexer
    Eof,

    // Error token for invalid input
    Error,
}

impl TokenKind {
    /// Keywords that can begin an action statement; the parser synchronizes
    /// on these after an error.
    pub fn starts_action(&self) -> bool {
        matches!(
            self,
            TokenKind::Set
                | TokenKind::Calculate
                | TokenKind::Run
                | TokenKind::Call
                | TokenKind::Add
                | TokenKind::Subtract
                | TokenKind::Multiply
                | TokenKind::Divide
                | TokenKind::Append
                | TokenKind::Prepend
                | TokenKind::Remove
                | TokenKind::If
                | TokenKind::ForEach
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::CircuitBreaker
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Set => write!(f, "set"),
            TokenKind::Calculate => write!(f, "calculate"),
            TokenKind::Run => write!(f, "run"),
            TokenKind::Call => write!(f, "call"),
            TokenKind::Add => write!(f, "add"),
            TokenKind::Subtract => write!(f, "subtract"),
            TokenKind::Multiply => write!(f, "multiply"),
            TokenKind::Divide => write!(f, "divide"),
            TokenKind::Append => write!(f, "append"),
            TokenKind::Prepend => write!(f, "prepend"),
            TokenKind::Remove => write!(f, "remove"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Then => write!(f, "then"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::When => write!(f, "when"),
            TokenKind::To => write!(f, "to"),
            TokenKind::From => write!(f, "from"),
            TokenKind::By => write!(f, "by"),
            TokenKind::With => write!(f, "with"),
            TokenKind::As => write!(f, "as"),
            TokenKind::In => write!(f, "in"),
            TokenKind::ForEach => write!(f, "forEach"),
            TokenKind::While => write!(f, "while"),
            TokenKind::Do => write!(f, "do"),
            TokenKind::CircuitBreaker => write!(f, "circuit_breaker"),
            TokenKind::Equals => write!(f, "equals"),
            TokenKind::NotEquals => write!(f, "not_equals"),
            TokenKind::GreaterThan => write!(f, "greater_than"),
            TokenKind::LessThan => write!(f, "less_than"),
            TokenKind::AtLeast => write!(f, "at_least"),
            TokenKind::AtMost => write!(f, "at_most"),
            TokenKind::Between => write!(f, "between"),
            TokenKind::NotBetween => write!(f, "not_between"),
            TokenKind::Contains => write!(f, "contains"),
            TokenKind::StartsWith => write!(f, "starts_with"),
            TokenKind::EndsWith => write!(f, "ends_with"),
            TokenKind::Matches => write!(f, "matches"),
            TokenKind::InList => write!(f, "in_list"),
            TokenKind::And => write!(f, "and"),
            TokenKind::Or => write!(f, "or"),
            TokenKind::Not => write!(f, "not"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::StarStar => write!(f, "**"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::EqEq => write!(f, "=="),
            TokenKind::NotEq => write!(f, "!="),
            TokenKind::GtEq => write!(f, ">="),
            TokenKind::LtEq => write!(f, "<="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Number(value) => write!(f, "{}", value),
            TokenKind::Str(value) => write!(f, "\"{}\"", value),
            TokenKind::True => write!(f, "true"),
            TokenKind::False => write!(f, "false"),
            TokenKind::Null => write!(f, "null"),
            TokenKind::Identifier(name) => write!(f, "{}", name),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Whitespace => write!(f, "whitespace"),
            TokenKind::UnterminatedStr => write!(f, "unterminated string"),
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Error => write!(f, "error"),
        }
    }
}

/// A lexer for rule DSL source text.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, TokenKind>,
    file_id: u32,
    source: &'source str,
    diagnostics: DiagnosticCollection,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str, file_id: u32) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            file_id,
            source,
            diagnostics: DiagnosticCollection::new(),
        }
    }

    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    fn classify_error(&mut self, text: &str, span: SourceSpan) {
        let first = text.chars().next().unwrap_or('?');
        let diagnostic = if first == '"' || first == '\'' {
            RuleDiagnostic::error(
                ErrorCode::LexInvalidEscape,
                format!("invalid escape sequence in string literal {}", text),
                span,
            )
            .with_note("supported escapes: \\\\ \\\" \\' \\n \\t")
        } else if first.is_ascii_digit() {
            RuleDiagnostic::error(
                ErrorCode::LexBadNumber,
                format!("invalid number literal '{}'", text),
                span,
            )
            .with_note("numbers are digits with an optional single decimal point, e.g. 650 or 0.35")
        } else {
            RuleDiagnostic::error(
                ErrorCode::LexInvalidCharacter,
                format!("invalid character: '{}'", first),
                span,
            )
        };
        self.diagnostics.add(diagnostic);
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.inner.next()?;
        let range = self.inner.span();
        let text = &self.source[range.clone()];
        let span = SourceSpan::new(self.file_id, range.start as u32, range.end as u32);

        match token {
            Ok(TokenKind::UnterminatedStr) => {
                // Report at the opening quote
                let open = SourceSpan::new(self.file_id, range.start as u32, range.start as u32 + 1);
                self.diagnostics.add(
                    RuleDiagnostic::error(
                        ErrorCode::LexUnterminatedString,
                        "unterminated string literal",
                        open,
                    )
                    .with_note("string literals use matched double or single quotes"),
                );
                Some(Token::new(TokenKind::Error, span, text.to_string()))
            }
            Ok(kind) => Some(Token::new(kind, span, text.to_string())),
            Err(_) => {
                self.classify_error(text, span);
                Some(Token::new(TokenKind::Error, span, text.to_string()))
            }
        }
    }
}

fn lex_inner(source: &str, file_id: u32, keep_newlines: bool) -> (Vec<Token>, DiagnosticCollection) {
    let mut lexer = Lexer::new(source, file_id);
    let mut tokens = Vec::new();

    for token in lexer.by_ref() {
        if token.kind == TokenKind::Newline && !keep_newlines {
            continue;
        }
        tokens.push(token);
    }

    let end = source.len() as u32;
    tokens.push(Token::new(
        TokenKind::Eof,
        SourceSpan::new(file_id, end, end),
        String::new(),
    ));

    let diagnostics = lexer.take_diagnostics();
    (tokens, diagnostics)
}

/// Lex a source string with newlines collapsed; the common mode for
/// single-expression and single-action strings embedded in documents.
pub fn lex(source: &str, file_id: u32) -> (Vec<Token>, DiagnosticCollection) {
    lex_inner(source, file_id, false)
}

/// Lex a source string keeping newline tokens, for statement-delimited
/// multi-line rule scripts.
pub fn lex_statements(source: &str, file_id: u32) -> (Vec<Token>, DiagnosticCollection) {
    lex_inner(source, file_id, true)
}

#[cfg(test)]
mod tests;
