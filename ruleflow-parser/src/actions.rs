//! Action parsing: verb-first statements, control flow and loops

use ruleflow_ast::*;
use ruleflow_diagnostics::{ErrorCode, Suggestion};
use ruleflow_lexer::TokenKind;

use crate::parser::Parser;

impl Parser {
    /// Parse a single action statement.
    pub fn parse_action(&mut self) -> Option<Action> {
        match self.peek_kind() {
            TokenKind::Set => self.parse_set(),
            TokenKind::Calculate => self.parse_calculate(),
            TokenKind::Run => self.parse_run(),
            TokenKind::Call => self.parse_call_action(),
            TokenKind::If => self.parse_conditional(),
            TokenKind::Add | TokenKind::Subtract => self.parse_add_subtract(),
            TokenKind::Multiply | TokenKind::Divide => self.parse_multiply_divide(),
            TokenKind::Append | TokenKind::Prepend => self.parse_append_prepend(),
            TokenKind::Remove => self.parse_remove(),
            TokenKind::CircuitBreaker => self.parse_circuit_breaker(),
            TokenKind::ForEach => self.parse_for_each(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            found => {
                let found = found.clone();
                self.error_with_suggestion(
                    ErrorCode::ParseInvalidAction,
                    format!("expected an action keyword, found '{}'", found),
                    Some(Suggestion::new(
                        "actions start with a verb such as 'set', 'calculate', 'if' or 'forEach'",
                        "set",
                        self.peek_span(),
                    )),
                );
                None
            }
        }
    }

    /// `action ( "," action )*`
    pub fn parse_action_list(&mut self) -> Option<Vec<Action>> {
        let mut actions = vec![self.parse_action()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            actions.push(self.parse_action()?);
        }
        Some(actions)
    }

    /// `action ( ";" action )*` — the loop-body form.
    pub fn parse_action_list_semi(&mut self) -> Option<Vec<Action>> {
        let mut actions = vec![self.parse_action()?];
        while self.check(&TokenKind::Semicolon) {
            self.advance();
            actions.push(self.parse_action()?);
        }
        Some(actions)
    }

    fn parse_set(&mut self) -> Option<Action> {
        let start = self.peek_span();
        self.advance();
        let variable = self.consume_identifier("a variable name after 'set'")?;
        self.consume(&TokenKind::To, "'to'")?;
        let value = self.parse_expression()?;
        Some(Action::Set(SetAction {
            variable,
            value,
            span: self.span_from(start),
        }))
    }

    fn parse_calculate(&mut self) -> Option<Action> {
        let start = self.peek_span();
        self.advance();
        let variable = self.consume_identifier("a variable name after 'calculate'")?;
        self.consume(&TokenKind::As, "'as'")?;
        let expression = self.parse_expression()?;
        Some(Action::Calculate(CalculateAction {
            variable,
            expression,
            span: self.span_from(start),
        }))
    }

    fn parse_run(&mut self) -> Option<Action> {
        let start = self.peek_span();
        self.advance();
        let variable = self.consume_identifier("a variable name after 'run'")?;
        self.consume(&TokenKind::As, "'as'")?;
        let expression = self.parse_expression()?;
        Some(Action::Run(RunAction {
            variable,
            expression,
            span: self.span_from(start),
        }))
    }

    fn parse_call_action(&mut self) -> Option<Action> {
        let start = self.peek_span();
        self.advance();
        let function = self.consume_identifier("a function name after 'call'")?;
        self.consume(&TokenKind::With, "'with'")?;
        self.consume(&TokenKind::LBracket, "'[' to open the argument list")?;

        let mut arguments = Vec::new();
        if !self.check(&TokenKind::RBracket) {
            loop {
                arguments.push(self.parse_expression()?);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.consume(&TokenKind::RBracket, "']' to close the argument list")?;

        Some(Action::FunctionCall(FunctionCallAction {
            function,
            arguments,
            span: self.span_from(start),
        }))
    }

    fn parse_conditional(&mut self) -> Option<Action> {
        let start = self.peek_span();
        self.advance();
        let condition = self.parse_condition()?;
        self.consume(&TokenKind::Then, "'then'")?;
        let then_actions = self.parse_action_list()?;
        let else_actions = if self.check(&TokenKind::Else) {
            self.advance();
            self.parse_action_list()?
        } else {
            Vec::new()
        };
        Some(Action::Conditional(ConditionalAction {
            condition,
            then_actions,
            else_actions,
            span: self.span_from(start),
        }))
    }

    fn parse_add_subtract(&mut self) -> Option<Action> {
        let start = self.peek_span();
        let op = if self.check(&TokenKind::Add) {
            ArithmeticActionOp::Add
        } else {
            ArithmeticActionOp::Subtract
        };
        self.advance();
        let value = self.parse_expression()?;
        match op {
            ArithmeticActionOp::Add => self.consume(&TokenKind::To, "'to'")?,
            _ => self.consume(&TokenKind::From, "'from'")?,
        };
        let variable = self.consume_identifier("the target variable name")?;
        Some(Action::Arithmetic(ArithmeticAction {
            op,
            variable,
            value,
            span: self.span_from(start),
        }))
    }

    fn parse_multiply_divide(&mut self) -> Option<Action> {
        let start = self.peek_span();
        let op = if self.check(&TokenKind::Multiply) {
            ArithmeticActionOp::Multiply
        } else {
            ArithmeticActionOp::Divide
        };
        self.advance();
        let variable = self.consume_identifier("the target variable name")?;
        self.consume(&TokenKind::By, "'by'")?;
        let value = self.parse_expression()?;
        Some(Action::Arithmetic(ArithmeticAction {
            op,
            variable,
            value,
            span: self.span_from(start),
        }))
    }

    fn parse_append_prepend(&mut self) -> Option<Action> {
        let start = self.peek_span();
        let op = if self.check(&TokenKind::Append) {
            ListActionOp::Append
        } else {
            ListActionOp::Prepend
        };
        self.advance();
        let value = self.parse_expression()?;
        self.consume(&TokenKind::To, "'to'")?;
        let list_variable = self.consume_identifier("the list variable name")?;
        Some(Action::List(ListAction {
            op,
            value,
            list_variable,
            span: self.span_from(start),
        }))
    }

    fn parse_remove(&mut self) -> Option<Action> {
        let start = self.peek_span();
        self.advance();
        let value = self.parse_expression()?;
        self.consume(&TokenKind::From, "'from'")?;
        let list_variable = self.consume_identifier("the list variable name")?;
        Some(Action::List(ListAction {
            op: ListActionOp::Remove,
            value,
            list_variable,
            span: self.span_from(start),
        }))
    }

    fn parse_circuit_breaker(&mut self) -> Option<Action> {
        let start = self.peek_span();
        self.advance();
        let message = match self.peek_kind() {
            TokenKind::Str(message) => {
                let message = message.clone();
                self.advance();
                message
            }
            found => {
                let found = found.clone();
                self.error_with_suggestion(
                    ErrorCode::ParseExpectedToken,
                    format!("expected a message string after 'circuit_breaker', found '{}'", found),
                    Some(Suggestion::new(
                        "add a quoted halt message",
                        "circuit_breaker \"reason\"",
                        self.peek_span(),
                    )),
                );
                return None;
            }
        };
        Some(Action::CircuitBreaker(CircuitBreakerAction {
            message,
            error_code: None,
            span: self.span_from(start),
        }))
    }

    fn parse_for_each(&mut self) -> Option<Action> {
        let start = self.peek_span();
        self.advance();
        let variable = self.consume_identifier("the loop variable name")?;
        let index_variable = if self.check(&TokenKind::Comma) {
            self.advance();
            Some(self.consume_identifier("the index variable name")?)
        } else {
            None
        };
        self.consume(&TokenKind::In, "'in'")?;
        let iterable = self.parse_expression()?;
        self.consume(&TokenKind::Colon, "':' before the loop body")?;
        let body = self.parse_action_list_semi()?;
        Some(Action::ForEach(ForEachAction {
            variable,
            index_variable,
            iterable,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_while(&mut self) -> Option<Action> {
        let start = self.peek_span();
        self.advance();
        let condition = self.parse_condition()?;
        self.consume(&TokenKind::Colon, "':' before the loop body")?;
        let body = self.parse_action_list_semi()?;
        Some(Action::While(WhileAction {
            condition,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_do_while(&mut self) -> Option<Action> {
        let start = self.peek_span();
        self.advance();
        self.consume(&TokenKind::Colon, "':' before the loop body")?;
        let body = self.parse_action_list_semi_until_while()?;
        self.consume(&TokenKind::While, "'while'")?;
        let condition = self.parse_condition()?;
        Some(Action::DoWhile(DoWhileAction {
            body,
            condition,
            span: self.span_from(start),
        }))
    }

    /// Like `parse_action_list_semi`, but stops cleanly at the trailing
    /// `while` of a do-while.
    fn parse_action_list_semi_until_while(&mut self) -> Option<Vec<Action>> {
        let mut actions = vec![self.parse_action()?];
        while self.check(&TokenKind::Semicolon) {
            self.advance();
            if self.check(&TokenKind::While) {
                break;
            }
            actions.push(self.parse_action()?);
        }
        Some(actions)
    }
}
