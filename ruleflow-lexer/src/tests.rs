use super::*;
use bigdecimal::BigDecimal;
use std::str::FromStr;

fn kinds(source: &str) -> Vec<TokenKind> {
    let (tokens, diagnostics) = lex(source, 0);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {}", diagnostics);
    tokens.into_iter().map(|t| t.kind).collect()
}

#[test]
fn test_action_keywords() {
    let source = "set calculate run call add subtract multiply divide append prepend remove if then else when to from by with as in forEach while do circuit_breaker";
    let expected = [
        TokenKind::Set,
        TokenKind::Calculate,
        TokenKind::Run,
        TokenKind::Call,
        TokenKind::Add,
        TokenKind::Subtract,
        TokenKind::Multiply,
        TokenKind::Divide,
        TokenKind::Append,
        TokenKind::Prepend,
        TokenKind::Remove,
        TokenKind::If,
        TokenKind::Then,
        TokenKind::Else,
        TokenKind::When,
        TokenKind::To,
        TokenKind::From,
        TokenKind::By,
        TokenKind::With,
        TokenKind::As,
        TokenKind::In,
        TokenKind::ForEach,
        TokenKind::While,
        TokenKind::Do,
        TokenKind::CircuitBreaker,
        TokenKind::Eof,
    ];
    assert_eq!(kinds(source), expected);
}

#[test]
fn test_word_operators() {
    let source = "equals not_equals greater_than less_than at_least at_most between not_between contains starts_with ends_with matches in_list and or not";
    let expected = [
        TokenKind::Equals,
        TokenKind::NotEquals,
        TokenKind::GreaterThan,
        TokenKind::LessThan,
        TokenKind::AtLeast,
        TokenKind::AtMost,
        TokenKind::Between,
        TokenKind::NotBetween,
        TokenKind::Contains,
        TokenKind::StartsWith,
        TokenKind::EndsWith,
        TokenKind::Matches,
        TokenKind::InList,
        TokenKind::And,
        TokenKind::Or,
        TokenKind::Not,
        TokenKind::Eof,
    ];
    assert_eq!(kinds(source), expected);
}

#[test]
fn test_symbol_operators_longest_match() {
    let source = ">= <= == != > < ** * / % + -";
    let expected = [
        TokenKind::GtEq,
        TokenKind::LtEq,
        TokenKind::EqEq,
        TokenKind::NotEq,
        TokenKind::Gt,
        TokenKind::Lt,
        TokenKind::StarStar,
        TokenKind::Star,
        TokenKind::Slash,
        TokenKind::Percent,
        TokenKind::Plus,
        TokenKind::Minus,
        TokenKind::Eof,
    ];
    assert_eq!(kinds(source), expected);
}

#[test]
fn test_literals() {
    let (tokens, diagnostics) = lex("650 0.35 \"PRIME\" 'single' true false null", 0);
    assert!(diagnostics.is_empty());

    assert_eq!(tokens[0].kind, TokenKind::Number(BigDecimal::from(650)));
    assert_eq!(
        tokens[1].kind,
        TokenKind::Number(BigDecimal::from_str("0.35").unwrap())
    );
    assert_eq!(tokens[2].kind, TokenKind::Str("PRIME".to_string()));
    assert_eq!(tokens[3].kind, TokenKind::Str("single".to_string()));
    assert_eq!(tokens[4].kind, TokenKind::True);
    assert_eq!(tokens[5].kind, TokenKind::False);
    assert_eq!(tokens[6].kind, TokenKind::Null);
}

#[test]
fn test_string_escapes() {
    let (tokens, diagnostics) = lex(r#""line\nbreak \"quoted\" tab\t""#, 0);
    assert!(diagnostics.is_empty());
    assert_eq!(
        tokens[0].kind,
        TokenKind::Str("line\nbreak \"quoted\" tab\t".to_string())
    );
}

#[test]
fn test_unterminated_string() {
    let (tokens, diagnostics) = lex("set tier to \"PRIME", 0);
    assert!(diagnostics.has_errors());
    let diagnostic = diagnostics.first_error().unwrap();
    assert_eq!(diagnostic.code, ErrorCode::LexUnterminatedString);
    // Reported at the opening quote
    assert_eq!(diagnostic.primary_span.start(), 12);
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Error));
}

#[test]
fn test_bad_number() {
    let (_, diagnostics) = lex("calculate x as 1.2.3", 0);
    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.first_error().unwrap().code, ErrorCode::LexBadNumber);
}

#[test]
fn test_identifiers_and_property_paths() {
    let (tokens, diagnostics) = lex("user.profile.age items", 0);
    assert!(diagnostics.is_empty());
    assert_eq!(tokens[0].kind, TokenKind::Identifier("user".to_string()));
    assert_eq!(tokens[1].kind, TokenKind::Dot);
    assert_eq!(tokens[2].kind, TokenKind::Identifier("profile".to_string()));
    assert_eq!(tokens[3].kind, TokenKind::Dot);
    assert_eq!(tokens[4].kind, TokenKind::Identifier("age".to_string()));
    assert_eq!(tokens[5].kind, TokenKind::Identifier("items".to_string()));
}

#[test]
fn test_comments_and_newline_collapse() {
    let source = "set tier to \"PRIME\" # assign the tier\nset approved to true";
    let (tokens, diagnostics) = lex(source, 0);
    assert!(diagnostics.is_empty());
    assert!(!tokens.iter().any(|t| t.kind == TokenKind::Newline));
    assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Set).count(), 2);
}

#[test]
fn test_statement_mode_keeps_newlines() {
    let (tokens, diagnostics) = lex_statements("set a to 1\nset b to 2", 0);
    assert!(diagnostics.is_empty());
    assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Newline).count(), 1);
}

#[test]
fn test_spans_locate_tokens() {
    let source = "creditScore at_least 650";
    let (tokens, _) = lex(source, 7);
    assert_eq!(tokens[0].span.file_id, 7);
    assert_eq!(tokens[0].span.start(), 0);
    assert_eq!(tokens[0].span.end(), 11);
    assert_eq!(tokens[1].span.start(), 12);
    assert_eq!(&source[tokens[2].span.start()..tokens[2].span.end()], "650");
}

#[test]
fn test_invalid_character() {
    let (tokens, diagnostics) = lex("creditScore @ 650", 0);
    assert!(diagnostics.has_errors());
    assert_eq!(
        diagnostics.first_error().unwrap().code,
        ErrorCode::LexInvalidCharacter
    );
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Error));
}

#[test]
fn test_eof_is_last() {
    let (tokens, _) = lex("", 0);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
}
