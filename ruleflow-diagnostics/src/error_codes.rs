//! Stable error codes for the rule pipeline

/// Error codes for different categories of failures.
///
/// The string form is the stable, externally visible identifier carried on
/// diagnostics and evaluation results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Lexer errors
    LexInvalidCharacter,
    LexUnterminatedString,
    LexBadNumber,
    LexInvalidEscape,

    // Parser errors (PARSE_nnn)
    ParseUnexpectedToken,
    ParseExpectedToken,
    ParseUnexpectedEof,
    ParseInvalidExpression,
    ParseInvalidCondition,
    ParseInvalidAction,
    ParseExpectedIdentifier,
    ParseUnterminatedList,
    ParseInvalidDocument,

    // Naming convention violations
    NamingWrite,
    NamingInput,
    NamingConstant,

    // Evaluation errors
    EvalTypeError,
    EvalDivByZero,
    EvalUndefined,
    EvalCancelled,
    EvalInternal,
    LoopMaxIterations,

    // External collaborator failures
    ExtTimeout,
    ExtUnavailable,
}

impl ErrorCode {
    /// Get the error code as its stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::LexInvalidCharacter => "LEX_INVALID_CHARACTER",
            ErrorCode::LexUnterminatedString => "LEX_UNTERMINATED_STRING",
            ErrorCode::LexBadNumber => "LEX_BAD_NUMBER",
            ErrorCode::LexInvalidEscape => "LEX_INVALID_ESCAPE",

            // Parser errors
            ErrorCode::ParseUnexpectedToken => "PARSE_001",
            ErrorCode::ParseExpectedToken => "PARSE_002",
            ErrorCode::ParseUnexpectedEof => "PARSE_003",
            ErrorCode::ParseInvalidExpression => "PARSE_004",
            ErrorCode::ParseInvalidCondition => "PARSE_005",
            ErrorCode::ParseInvalidAction => "PARSE_006",
            ErrorCode::ParseExpectedIdentifier => "PARSE_007",
            ErrorCode::ParseUnterminatedList => "PARSE_008",
            ErrorCode::ParseInvalidDocument => "PARSE_009",

            // Naming convention violations
            ErrorCode::NamingWrite => "NAMING_WRITE",
            ErrorCode::NamingInput => "NAMING_INPUT",
            ErrorCode::NamingConstant => "NAMING_CONSTANT",

            // Evaluation errors
            ErrorCode::EvalTypeError => "EVAL_TYPE_ERROR",
            ErrorCode::EvalDivByZero => "EVAL_DIV_BY_ZERO",
            ErrorCode::EvalUndefined => "EVAL_UNDEFINED",
            ErrorCode::EvalCancelled => "EVAL_CANCELLED",
            ErrorCode::EvalInternal => "EVAL_INTERNAL",
            ErrorCode::LoopMaxIterations => "LOOP_MAX_ITERATIONS",

            // External collaborator failures
            ErrorCode::ExtTimeout => "EXT_TIMEOUT",
            ErrorCode::ExtUnavailable => "EXT_UNAVAILABLE",
        }
    }

    /// Whether diagnostics with this code came out of the parsing front end
    /// (lexer or parser) rather than the runtime.
    pub fn is_parse_front_end(&self) -> bool {
        matches!(
            self,
            ErrorCode::LexInvalidCharacter
                | ErrorCode::LexUnterminatedString
                | ErrorCode::LexBadNumber
                | ErrorCode::LexInvalidEscape
                | ErrorCode::ParseUnexpectedToken
                | ErrorCode::ParseExpectedToken
                | ErrorCode::ParseUnexpectedEof
                | ErrorCode::ParseInvalidExpression
                | ErrorCode::ParseInvalidCondition
                | ErrorCode::ParseInvalidAction
                | ErrorCode::ParseExpectedIdentifier
                | ErrorCode::ParseUnterminatedList
                | ErrorCode::ParseInvalidDocument
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
