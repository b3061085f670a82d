//! Condition parsing: logical composition over comparisons, with `between`
//! handled specially

use ruleflow_ast::*;
use ruleflow_lexer::TokenKind;

use crate::parser::Parser;

impl Parser {
    /// Parse a full condition.
    pub fn parse_condition(&mut self) -> Option<Condition> {
        self.parse_or_condition()
    }

    fn parse_or_condition(&mut self) -> Option<Condition> {
        let start = self.peek_span();
        let first = self.parse_and_condition()?;
        if !self.check(&TokenKind::Or) {
            return Some(first);
        }

        let mut operands = vec![first];
        while self.check(&TokenKind::Or) {
            self.advance();
            operands.push(self.parse_and_condition()?);
        }
        Some(Condition::Logical(LogicalCondition {
            op: LogicalOp::Or,
            operands,
            span: self.span_from(start),
        }))
    }

    fn parse_and_condition(&mut self) -> Option<Condition> {
        let start = self.peek_span();
        let first = self.parse_not_condition()?;
        if !self.check(&TokenKind::And) {
            return Some(first);
        }

        let mut operands = vec![first];
        while self.check(&TokenKind::And) {
            self.advance();
            operands.push(self.parse_not_condition()?);
        }
        Some(Condition::Logical(LogicalCondition {
            op: LogicalOp::And,
            operands,
            span: self.span_from(start),
        }))
    }

    fn parse_not_condition(&mut self) -> Option<Condition> {
        if self.check(&TokenKind::Not) {
            let start = self.peek_span();
            self.advance();
            let operand = self.parse_not_condition()?;
            return Some(Condition::Logical(LogicalCondition {
                op: LogicalOp::Not,
                operands: vec![operand],
                span: self.span_from(start),
            }));
        }

        if self.check(&TokenKind::LParen) {
            if let Some(condition) = self.try_parse_grouped_condition() {
                return Some(condition);
            }
        }

        self.parse_comparison_condition()
    }

    /// A parenthesis can open either a grouped condition or a grouped
    /// arithmetic operand; speculate on the condition reading and roll back
    /// when the content turns out to be a plain expression.
    fn try_parse_grouped_condition(&mut self) -> Option<Condition> {
        let snapshot = self.snapshot();
        self.advance(); // consume '('
        let inner = match self.parse_condition() {
            Some(condition) => condition,
            None => {
                self.rollback(snapshot);
                return None;
            }
        };
        if !self.check(&TokenKind::RParen) {
            self.rollback(snapshot);
            return None;
        }

        // A grouped bare expression such as `(a + b)` must stay available to
        // the comparison parser: `(a + b) > c`.
        if matches!(inner, Condition::Expression(_)) {
            self.rollback(snapshot);
            return None;
        }

        self.advance(); // consume ')'
        Some(inner)
    }

    fn comparison_op(&self) -> Option<ComparisonOp> {
        match self.peek_kind() {
            TokenKind::Equals | TokenKind::EqEq => Some(ComparisonOp::Equals),
            TokenKind::NotEquals | TokenKind::NotEq => Some(ComparisonOp::NotEquals),
            TokenKind::Gt | TokenKind::GreaterThan => Some(ComparisonOp::GreaterThan),
            TokenKind::Lt | TokenKind::LessThan => Some(ComparisonOp::LessThan),
            TokenKind::GtEq | TokenKind::AtLeast => Some(ComparisonOp::AtLeast),
            TokenKind::LtEq | TokenKind::AtMost => Some(ComparisonOp::AtMost),
            TokenKind::Between => Some(ComparisonOp::Between),
            TokenKind::NotBetween => Some(ComparisonOp::NotBetween),
            TokenKind::Contains => Some(ComparisonOp::Contains),
            TokenKind::StartsWith => Some(ComparisonOp::StartsWith),
            TokenKind::EndsWith => Some(ComparisonOp::EndsWith),
            TokenKind::Matches => Some(ComparisonOp::Matches),
            TokenKind::InList => Some(ComparisonOp::InList),
            _ => None,
        }
    }

    fn parse_comparison_condition(&mut self) -> Option<Condition> {
        let start = self.peek_span();
        let left = self.parse_term()?;

        let Some(op) = self.comparison_op() else {
            // Non-boolean primaries are wrapped and coerced at evaluation
            let span = self.span_from(start);
            return Some(Condition::Expression(ExpressionCondition {
                expression: left,
                span,
            }));
        };
        self.advance();

        if op == ComparisonOp::Between || op == ComparisonOp::NotBetween {
            let lower = self.parse_term()?;
            self.consume(&TokenKind::And, "'and' between the range bounds")?;
            let upper = self.parse_term()?;
            return Some(Condition::Comparison(ComparisonCondition {
                op,
                left,
                right: Some(lower),
                range_end: Some(upper),
                span: self.span_from(start),
            }));
        }

        let right = self.parse_term()?;
        Some(Condition::Comparison(ComparisonCondition {
            op,
            left,
            right: Some(right),
            range_end: None,
            span: self.span_from(start),
        }))
    }
}
