//! Ruleflow Parser
//!
//! Recursive-descent parsers for the three grammar families of the rule
//! DSL: expressions, conditions and actions. One shared cursor lets the
//! parsers hand off to each other mid-stream (a condition contains
//! expressions, a conditional action contains a condition, and so on).
//!
//! Every failure carries a stable `PARSE_nnn` code, the offending location
//! and concrete suggestions. The action-list entry point performs
//! panic-mode recovery so batch validation sees every problem in one pass.

use ruleflow_ast::{Action, Condition, Expression};
use ruleflow_diagnostics::DiagnosticCollection;
use ruleflow_lexer::lex;

pub mod parser;

mod actions;
mod conditions;
mod expressions;

#[cfg(test)]
mod tests;

pub use parser::Parser;

/// Parse a single expression from source text.
pub fn parse_expression(source: &str, file_id: u32) -> Result<Expression, DiagnosticCollection> {
    let (tokens, lex_diagnostics) = lex(source, file_id);
    if lex_diagnostics.has_errors() {
        return Err(lex_diagnostics);
    }
    let mut parser = Parser::new(tokens, file_id);
    match parser.parse_expression() {
        Some(expression) => {
            parser.expect_end();
            finish(parser, expression)
        }
        None => Err(parser.take_diagnostics()),
    }
}

/// Parse a single condition from source text.
pub fn parse_condition(source: &str, file_id: u32) -> Result<Condition, DiagnosticCollection> {
    let (tokens, lex_diagnostics) = lex(source, file_id);
    if lex_diagnostics.has_errors() {
        return Err(lex_diagnostics);
    }
    let mut parser = Parser::new(tokens, file_id);
    match parser.parse_condition() {
        Some(condition) => {
            parser.expect_end();
            finish(parser, condition)
        }
        None => Err(parser.take_diagnostics()),
    }
}

/// Parse a single action from source text.
pub fn parse_action(source: &str, file_id: u32) -> Result<Action, DiagnosticCollection> {
    let (tokens, lex_diagnostics) = lex(source, file_id);
    if lex_diagnostics.has_errors() {
        return Err(lex_diagnostics);
    }
    let mut parser = Parser::new(tokens, file_id);
    match parser.parse_action() {
        Some(action) => {
            parser.expect_end();
            finish(parser, action)
        }
        None => Err(parser.take_diagnostics()),
    }
}

/// Parse a comma-separated action list, recovering after failures so the
/// returned diagnostics cover the whole input.
pub fn parse_actions(source: &str, file_id: u32) -> Result<Vec<Action>, DiagnosticCollection> {
    let (tokens, mut diagnostics) = lex(source, file_id);
    let mut parser = Parser::new(tokens, file_id);

    let mut actions = Vec::new();
    while !parser.is_at_end() {
        match parser.parse_action() {
            Some(action) => {
                actions.push(action);
                if parser.check(&ruleflow_lexer::TokenKind::Comma) {
                    parser.advance();
                } else if !parser.is_at_end() {
                    parser.expect_end();
                    parser.synchronize();
                }
            }
            None => parser.synchronize(),
        }
    }

    diagnostics.merge(parser.take_diagnostics());
    if diagnostics.has_errors() {
        Err(diagnostics)
    } else {
        Ok(actions)
    }
}

fn finish<T>(mut parser: Parser, value: T) -> Result<T, DiagnosticCollection> {
    let diagnostics = parser.take_diagnostics();
    if diagnostics.has_errors() {
        Err(diagnostics)
    } else {
        Ok(value)
    }
}
