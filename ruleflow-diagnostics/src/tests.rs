use codespan_reporting::diagnostic::Severity;

use crate::{DiagnosticCollection, ErrorCode, RuleDiagnostic, SourceMap, SourceSpan, Suggestion};

#[test]
fn error_codes_are_stable_strings() {
    assert_eq!(ErrorCode::LexUnterminatedString.as_str(), "LEX_UNTERMINATED_STRING");
    assert_eq!(ErrorCode::ParseUnexpectedToken.as_str(), "PARSE_001");
    assert_eq!(ErrorCode::EvalDivByZero.as_str(), "EVAL_DIV_BY_ZERO");
    assert_eq!(ErrorCode::NamingWrite.as_str(), "NAMING_WRITE");
    assert_eq!(ErrorCode::LoopMaxIterations.as_str(), "LOOP_MAX_ITERATIONS");
}

#[test]
fn source_map_locations_are_one_based() {
    let mut map = SourceMap::new();
    let file_id = map.add("rule", "set x to 1\nset y to 2");

    let first = SourceSpan::new(file_id, 0, 3);
    let loc = map.location(&first).unwrap();
    assert_eq!(loc.line, 1);
    assert_eq!(loc.column, 1);

    // "set y" starts right after the newline at offset 10
    let second = SourceSpan::new(file_id, 11, 14);
    let loc = map.location(&second).unwrap();
    assert_eq!(loc.line, 2);
    assert_eq!(loc.column, 1);
}

#[test]
fn collection_tracks_severity() {
    let mut diagnostics = DiagnosticCollection::new();
    assert!(diagnostics.is_empty());

    let span = SourceSpan::empty(0);
    diagnostics.add_warning(ErrorCode::EvalUndefined, "unbound variable", span);
    assert!(!diagnostics.has_errors());
    assert!(diagnostics.has_warnings());

    diagnostics.add_error(ErrorCode::ParseUnexpectedToken, "unexpected token", span);
    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(
        diagnostics.first_error().unwrap().code,
        ErrorCode::ParseUnexpectedToken
    );
}

#[test]
fn diagnostic_converts_to_codespan() {
    let span = SourceSpan::new(0, 4, 8);
    let diagnostic = RuleDiagnostic::error(ErrorCode::ParseExpectedToken, "expected 'to'", span)
        .with_suggestion(Suggestion::new("insert 'to'", "to", span))
        .with_note("actions use the form: set <variable> to <expression>");

    let rendered = diagnostic.to_codespan_diagnostic();
    assert_eq!(rendered.severity, Severity::Error);
    assert_eq!(rendered.code.as_deref(), Some("PARSE_002"));
    assert_eq!(rendered.labels.len(), 1);
    assert_eq!(rendered.notes.len(), 2);
}

#[test]
fn merge_preserves_order() {
    let span = SourceSpan::empty(0);
    let mut first = DiagnosticCollection::new();
    first.add_error(ErrorCode::ParseUnexpectedToken, "one", span);
    let mut second = DiagnosticCollection::new();
    second.add_error(ErrorCode::ParseUnexpectedEof, "two", span);

    first.merge(second);
    let codes: Vec<_> = first.iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![ErrorCode::ParseUnexpectedToken, ErrorCode::ParseUnexpectedEof]);
}
