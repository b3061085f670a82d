//! Expression parsing: precedence climbing from `or` down to primaries

use ruleflow_ast::*;
use ruleflow_diagnostics::ErrorCode;
use ruleflow_lexer::TokenKind;

use crate::parser::Parser;

impl Parser {
    /// Parse a full expression.
    pub fn parse_expression(&mut self) -> Option<Expression> {
        self.parse_or_expression()
    }

    fn parse_or_expression(&mut self) -> Option<Expression> {
        let mut expr = self.parse_and_expression()?;
        while self.check(&TokenKind::Or) {
            let start = expr.span();
            self.advance();
            let right = self.parse_and_expression()?;
            expr = Expression::Binary(BinaryExpr {
                op: BinaryOp::Or,
                left: Box::new(expr),
                right: Box::new(right),
                span: self.span_from(start),
            });
        }
        Some(expr)
    }

    fn parse_and_expression(&mut self) -> Option<Expression> {
        let mut expr = self.parse_equality()?;
        while self.check(&TokenKind::And) {
            let start = expr.span();
            self.advance();
            let right = self.parse_equality()?;
            expr = Expression::Binary(BinaryExpr {
                op: BinaryOp::And,
                left: Box::new(expr),
                right: Box::new(right),
                span: self.span_from(start),
            });
        }
        Some(expr)
    }

    fn parse_equality(&mut self) -> Option<Expression> {
        let mut expr = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Equals | TokenKind::EqEq => BinaryOp::Equals,
                TokenKind::NotEquals | TokenKind::NotEq => BinaryOp::NotEquals,
                _ => break,
            };
            let start = expr.span();
            self.advance();
            let right = self.parse_comparison()?;
            expr = Expression::Binary(BinaryExpr {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                span: self.span_from(start),
            });
        }
        Some(expr)
    }

    /// Comparison operators, word and symbol forms normalized to one
    /// canonical enumerator.
    pub(crate) fn comparison_binary_op(&self) -> Option<BinaryOp> {
        match self.peek_kind() {
            TokenKind::Gt | TokenKind::GreaterThan => Some(BinaryOp::GreaterThan),
            TokenKind::Lt | TokenKind::LessThan => Some(BinaryOp::LessThan),
            TokenKind::GtEq | TokenKind::AtLeast => Some(BinaryOp::AtLeast),
            TokenKind::LtEq | TokenKind::AtMost => Some(BinaryOp::AtMost),
            TokenKind::Contains => Some(BinaryOp::Contains),
            TokenKind::StartsWith => Some(BinaryOp::StartsWith),
            TokenKind::EndsWith => Some(BinaryOp::EndsWith),
            TokenKind::Matches => Some(BinaryOp::Matches),
            TokenKind::InList => Some(BinaryOp::InList),
            _ => None,
        }
    }

    fn parse_comparison(&mut self) -> Option<Expression> {
        let mut expr = self.parse_term()?;
        while let Some(op) = self.comparison_binary_op() {
            let start = expr.span();
            self.advance();
            let right = self.parse_term()?;
            expr = Expression::Binary(BinaryExpr {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                span: self.span_from(start),
            });
        }
        Some(expr)
    }

    pub(crate) fn parse_term(&mut self) -> Option<Expression> {
        let mut expr = self.parse_factor()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => break,
            };
            let start = expr.span();
            self.advance();
            let right = self.parse_factor()?;
            expr = Expression::Binary(BinaryExpr {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                span: self.span_from(start),
            });
        }
        Some(expr)
    }

    fn parse_factor(&mut self) -> Option<Expression> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                TokenKind::Percent => BinaryOp::Modulo,
                _ => break,
            };
            let start = expr.span();
            self.advance();
            let right = self.parse_unary()?;
            expr = Expression::Binary(BinaryExpr {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                span: self.span_from(start),
            });
        }
        Some(expr)
    }

    fn parse_unary(&mut self) -> Option<Expression> {
        match self.peek_kind() {
            TokenKind::Minus => {
                let start = self.peek_span();
                self.advance();
                let operand = self.parse_unary()?;
                Some(Expression::Unary(UnaryExpr {
                    op: UnaryOp::Negate,
                    operand: Box::new(operand),
                    span: self.span_from(start),
                }))
            }
            // Unary plus is the identity
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            TokenKind::Not => {
                let start = self.peek_span();
                self.advance();
                let operand = self.parse_unary()?;
                Some(Expression::Unary(UnaryExpr {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    span: self.span_from(start),
                }))
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Option<Expression> {
        let expr = self.parse_primary()?;
        if self.check(&TokenKind::StarStar) {
            let start = expr.span();
            self.advance();
            // Right-associative
            let right = self.parse_unary()?;
            return Some(Expression::Binary(BinaryExpr {
                op: BinaryOp::Power,
                left: Box::new(expr),
                right: Box::new(right),
                span: self.span_from(start),
            }));
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<Expression> {
        let start = self.peek_span();
        match self.peek_kind().clone() {
            TokenKind::Number(value) => {
                self.advance();
                Some(Expression::Literal(LiteralExpr {
                    value: LiteralValue::Number(value),
                    span: start,
                }))
            }
            TokenKind::Str(value) => {
                self.advance();
                Some(Expression::Literal(LiteralExpr {
                    value: LiteralValue::String(value),
                    span: start,
                }))
            }
            TokenKind::True => {
                self.advance();
                Some(Expression::Literal(LiteralExpr {
                    value: LiteralValue::Boolean(true),
                    span: start,
                }))
            }
            TokenKind::False => {
                self.advance();
                Some(Expression::Literal(LiteralExpr {
                    value: LiteralValue::Boolean(false),
                    span: start,
                }))
            }
            TokenKind::Null => {
                self.advance();
                Some(Expression::Literal(LiteralExpr {
                    value: LiteralValue::Null,
                    span: start,
                }))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(&TokenKind::RParen, "')'")?;
                Some(expr)
            }
            TokenKind::LBracket => self.parse_list_literal(),
            TokenKind::Identifier(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    self.parse_call(name, start)
                } else {
                    self.parse_variable(name, start)
                }
            }
            TokenKind::Eof => {
                self.error(
                    ErrorCode::ParseUnexpectedEof,
                    "expected an expression, found end of input",
                );
                None
            }
            found => {
                self.error(
                    ErrorCode::ParseInvalidExpression,
                    format!("expected an expression, found '{}'", found),
                );
                None
            }
        }
    }

    /// List literals hold constant values only.
    fn parse_list_literal(&mut self) -> Option<Expression> {
        let start = self.peek_span();
        self.advance(); // consume '['

        let mut items = Vec::new();
        if !self.check(&TokenKind::RBracket) {
            loop {
                let element = self.parse_expression()?;
                match element {
                    Expression::Literal(literal) => items.push(literal.value),
                    other => {
                        self.error(
                            ErrorCode::ParseInvalidExpression,
                            format!("list literals may only contain constant values, found '{}'", other),
                        );
                        return None;
                    }
                }
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        if self.consume(&TokenKind::RBracket, "']' to close the list").is_none() {
            self.diagnostics.add(
                ruleflow_diagnostics::RuleDiagnostic::error(
                    ErrorCode::ParseUnterminatedList,
                    "unterminated list literal",
                    start,
                ),
            );
            return None;
        }

        Some(Expression::Literal(LiteralExpr {
            value: LiteralValue::List(items),
            span: self.span_from(start),
        }))
    }

    fn parse_call(
        &mut self,
        name: String,
        start: ruleflow_diagnostics::SourceSpan,
    ) -> Option<Expression> {
        self.advance(); // consume '('
        let mut arguments = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                arguments.push(self.parse_expression()?);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.consume(&TokenKind::RParen, "')' to close the argument list")?;
        let span = self.span_from(start);
        Some(Self::build_call(name, arguments, span))
    }

    /// Lower known call names to their dedicated nodes so one syntax has one
    /// evaluation path.
    fn build_call(
        name: String,
        arguments: Vec<Expression>,
        span: ruleflow_diagnostics::SourceSpan,
    ) -> Expression {
        if arguments.len() == 1 {
            if let Some(op) = UnaryOp::from_function_name(&name) {
                let operand = arguments.into_iter().next().unwrap();
                return Expression::Unary(UnaryExpr {
                    op,
                    operand: Box::new(operand),
                    span,
                });
            }
        }
        if !arguments.is_empty() {
            if let Some(op) = ArithmeticOp::from_function_name(&name) {
                return Expression::Arithmetic(ArithmeticExpr {
                    op,
                    operands: arguments,
                    span,
                });
            }
        }
        if name == "json_path" && arguments.len() == 2 {
            if let Expression::Literal(LiteralExpr {
                value: LiteralValue::String(path),
                ..
            }) = &arguments[1]
            {
                let path = path.clone();
                let source = arguments.into_iter().next().unwrap();
                return Expression::JsonPath(JsonPathExpr {
                    source: Box::new(source),
                    path,
                    span,
                });
            }
        }
        if name == "rest_call" && (2..=3).contains(&arguments.len()) {
            if let Expression::Literal(LiteralExpr {
                value: LiteralValue::String(method),
                ..
            }) = &arguments[0]
            {
                let method = method.to_uppercase();
                let mut rest = arguments.into_iter().skip(1);
                let url = rest.next().unwrap();
                let body = rest.next().map(Box::new);
                return Expression::RestCall(RestCallExpr {
                    method,
                    url: Box::new(url),
                    body,
                    headers: Vec::new(),
                    timeout_ms: None,
                    span,
                });
            }
        }
        Expression::FunctionCall(FunctionCallExpr {
            name,
            arguments,
            span,
        })
    }

    fn parse_variable(
        &mut self,
        name: String,
        start: ruleflow_diagnostics::SourceSpan,
    ) -> Option<Expression> {
        let mut property_path = Vec::new();
        let mut index = None;

        while self.check(&TokenKind::Dot) {
            self.advance();
            property_path.push(self.consume_identifier("a property name after '.'")?);
        }
        if self.check(&TokenKind::LBracket) {
            self.advance();
            let index_expr = self.parse_expression()?;
            self.consume(&TokenKind::RBracket, "']' to close the index")?;
            index = Some(Box::new(index_expr));
        }

        Some(Expression::Variable(VariableExpr {
            name,
            property_path,
            index,
            span: self.span_from(start),
        }))
    }
}
