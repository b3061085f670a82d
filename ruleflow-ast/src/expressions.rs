//! Expression nodes for the rule DSL

use bigdecimal::BigDecimal;
use ruleflow_diagnostics::SourceSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A literal value embedded in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    String(String),
    Number(BigDecimal),
    Boolean(bool),
    List(Vec<LiteralValue>),
    Null,
}

impl LiteralValue {
    pub fn kind(&self) -> ExpressionType {
        match self {
            LiteralValue::String(_) => ExpressionType::String,
            LiteralValue::Number(_) => ExpressionType::Number,
            LiteralValue::Boolean(_) => ExpressionType::Boolean,
            LiteralValue::List(_) => ExpressionType::List,
            LiteralValue::Null => ExpressionType::Any,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::String(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    match c {
                        '\\' => write!(f, "\\\\")?,
                        '"' => write!(f, "\\\"")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        _ => write!(f, "{}", c)?,
                    }
                }
                write!(f, "\"")
            }
            LiteralValue::Number(n) => write!(f, "{}", n),
            LiteralValue::Boolean(b) => write!(f, "{}", b),
            LiteralValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            LiteralValue::Null => write!(f, "null"),
        }
    }
}

/// The statically known kind of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpressionType {
    String,
    Number,
    Boolean,
    List,
    Any,
}

/// Unary operators, including the word-form predicates the parser lowers
/// from single-argument call syntax (`exists(x)`, `length(name)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Negate,
    Not,
    Exists,
    IsNull,
    IsNumber,
    IsString,
    IsBoolean,
    IsList,
    ToUpper,
    ToLower,
    Length,
}

impl UnaryOp {
    /// The call-syntax name for word-form operators, if any.
    pub fn function_name(&self) -> Option<&'static str> {
        match self {
            UnaryOp::Negate | UnaryOp::Not => None,
            UnaryOp::Exists => Some("exists"),
            UnaryOp::IsNull => Some("is_null"),
            UnaryOp::IsNumber => Some("is_number"),
            UnaryOp::IsString => Some("is_string"),
            UnaryOp::IsBoolean => Some("is_boolean"),
            UnaryOp::IsList => Some("is_list"),
            UnaryOp::ToUpper => Some("to_upper"),
            UnaryOp::ToLower => Some("to_lower"),
            UnaryOp::Length => Some("length"),
        }
    }

    pub fn from_function_name(name: &str) -> Option<UnaryOp> {
        match name {
            "exists" => Some(UnaryOp::Exists),
            "is_null" => Some(UnaryOp::IsNull),
            "is_number" => Some(UnaryOp::IsNumber),
            "is_string" => Some(UnaryOp::IsString),
            "is_boolean" => Some(UnaryOp::IsBoolean),
            "is_list" => Some(UnaryOp::IsList),
            "to_upper" => Some(UnaryOp::ToUpper),
            "to_lower" => Some(UnaryOp::ToLower),
            "length" => Some(UnaryOp::Length),
            _ => None,
        }
    }
}

/// Binary operators after alias normalization (`at_least` and `>=` are the
/// same enumerator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    AtLeast,
    AtMost,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
    InList,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equals
                | BinaryOp::NotEquals
                | BinaryOp::GreaterThan
                | BinaryOp::LessThan
                | BinaryOp::AtLeast
                | BinaryOp::AtMost
                | BinaryOp::Contains
                | BinaryOp::StartsWith
                | BinaryOp::EndsWith
                | BinaryOp::Matches
                | BinaryOp::InList
        )
    }

    /// The canonical source form.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "**",
            BinaryOp::Equals => "equals",
            BinaryOp::NotEquals => "not_equals",
            BinaryOp::GreaterThan => "greater_than",
            BinaryOp::LessThan => "less_than",
            BinaryOp::AtLeast => "at_least",
            BinaryOp::AtMost => "at_most",
            BinaryOp::Contains => "contains",
            BinaryOp::StartsWith => "starts_with",
            BinaryOp::EndsWith => "ends_with",
            BinaryOp::Matches => "matches",
            BinaryOp::InList => "in_list",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

/// N-ary arithmetic operations; the parser lowers the matching call syntax
/// (`min(a, b)`, `round(x, 2)`) to this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Min,
    Max,
    Sum,
    Average,
    Abs,
    Round,
    Floor,
    Ceil,
    Sqrt,
}

impl ArithmeticOp {
    pub fn function_name(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Subtract => "subtract",
            ArithmeticOp::Multiply => "multiply",
            ArithmeticOp::Divide => "divide",
            ArithmeticOp::Modulo => "modulo",
            ArithmeticOp::Power => "pow",
            ArithmeticOp::Min => "min",
            ArithmeticOp::Max => "max",
            ArithmeticOp::Sum => "sum",
            ArithmeticOp::Average => "avg",
            ArithmeticOp::Abs => "abs",
            ArithmeticOp::Round => "round",
            ArithmeticOp::Floor => "floor",
            ArithmeticOp::Ceil => "ceil",
            ArithmeticOp::Sqrt => "sqrt",
        }
    }

    pub fn from_function_name(name: &str) -> Option<ArithmeticOp> {
        match name {
            "min" => Some(ArithmeticOp::Min),
            "max" => Some(ArithmeticOp::Max),
            "sum" => Some(ArithmeticOp::Sum),
            "avg" | "average" => Some(ArithmeticOp::Average),
            "abs" => Some(ArithmeticOp::Abs),
            "round" => Some(ArithmeticOp::Round),
            "floor" => Some(ArithmeticOp::Floor),
            "ceil" => Some(ArithmeticOp::Ceil),
            "sqrt" => Some(ArithmeticOp::Sqrt),
            "pow" => Some(ArithmeticOp::Power),
            _ => None,
        }
    }
}

/// A literal expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralExpr {
    pub value: LiteralValue,
    pub span: SourceSpan,
}

/// A variable reference with optional property path and index access:
/// `user.profile.age`, `items[2]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableExpr {
    pub name: String,
    pub property_path: Vec<String>,
    pub index: Option<Box<Expression>>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArithmeticExpr {
    pub op: ArithmeticOp,
    pub operands: Vec<Expression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallExpr {
    pub name: String,
    pub arguments: Vec<Expression>,
    pub span: SourceSpan,
}

/// A structured lookup into a map value: `json_path(payload, "items[0].price")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonPathExpr {
    pub source: Box<Expression>,
    pub path: String,
    pub span: SourceSpan,
}

/// An HTTP request through the injected client: never constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestCallExpr {
    pub method: String,
    pub url: Box<Expression>,
    pub body: Option<Box<Expression>>,
    pub headers: Vec<(String, Expression)>,
    pub timeout_ms: Option<u64>,
    pub span: SourceSpan,
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(LiteralExpr),
    Variable(VariableExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Arithmetic(ArithmeticExpr),
    FunctionCall(FunctionCallExpr),
    JsonPath(JsonPathExpr),
    RestCall(RestCallExpr),
}

/// Visitor over expression nodes; one dispatch point per variant.
pub trait ExpressionVisitor {
    type Output;

    fn visit_literal(&mut self, expr: &LiteralExpr) -> Self::Output;
    fn visit_variable(&mut self, expr: &VariableExpr) -> Self::Output;
    fn visit_unary(&mut self, expr: &UnaryExpr) -> Self::Output;
    fn visit_binary(&mut self, expr: &BinaryExpr) -> Self::Output;
    fn visit_arithmetic(&mut self, expr: &ArithmeticExpr) -> Self::Output;
    fn visit_function_call(&mut self, expr: &FunctionCallExpr) -> Self::Output;
    fn visit_json_path(&mut self, expr: &JsonPathExpr) -> Self::Output;
    fn visit_rest_call(&mut self, expr: &RestCallExpr) -> Self::Output;
}

impl Expression {
    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Expression::Literal(e) => visitor.visit_literal(e),
            Expression::Variable(e) => visitor.visit_variable(e),
            Expression::Unary(e) => visitor.visit_unary(e),
            Expression::Binary(e) => visitor.visit_binary(e),
            Expression::Arithmetic(e) => visitor.visit_arithmetic(e),
            Expression::FunctionCall(e) => visitor.visit_function_call(e),
            Expression::JsonPath(e) => visitor.visit_json_path(e),
            Expression::RestCall(e) => visitor.visit_rest_call(e),
        }
    }

    pub fn span(&self) -> SourceSpan {
        match self {
            Expression::Literal(e) => e.span,
            Expression::Variable(e) => e.span,
            Expression::Unary(e) => e.span,
            Expression::Binary(e) => e.span,
            Expression::Arithmetic(e) => e.span,
            Expression::FunctionCall(e) => e.span,
            Expression::JsonPath(e) => e.span,
            Expression::RestCall(e) => e.span,
        }
    }

    /// Whether the expression can be folded without an evaluation context.
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::Variable(_) => false,
            Expression::Unary(e) => e.operand.is_constant(),
            Expression::Binary(e) => e.left.is_constant() && e.right.is_constant(),
            Expression::Arithmetic(e) => e.operands.iter().all(Expression::is_constant),
            Expression::FunctionCall(_) => false,
            Expression::JsonPath(e) => e.source.is_constant(),
            Expression::RestCall(_) => false,
        }
    }

    pub fn has_variable_references(&self) -> bool {
        match self {
            Expression::Literal(_) => false,
            Expression::Variable(_) => true,
            Expression::Unary(e) => e.operand.has_variable_references(),
            Expression::Binary(e) => {
                e.left.has_variable_references() || e.right.has_variable_references()
            }
            Expression::Arithmetic(e) => {
                e.operands.iter().any(Expression::has_variable_references)
            }
            Expression::FunctionCall(e) => {
                e.arguments.iter().any(Expression::has_variable_references)
            }
            Expression::JsonPath(e) => e.source.has_variable_references(),
            Expression::RestCall(e) => {
                e.url.has_variable_references()
                    || e.body.as_deref().is_some_and(Expression::has_variable_references)
                    || e.headers.iter().any(|(_, v)| v.has_variable_references())
            }
        }
    }

    /// Node-count complexity measure.
    pub fn complexity(&self) -> usize {
        match self {
            Expression::Literal(_) | Expression::Variable(_) => 1,
            Expression::Unary(e) => 1 + e.operand.complexity(),
            Expression::Binary(e) => 1 + e.left.complexity() + e.right.complexity(),
            Expression::Arithmetic(e) => {
                1 + e.operands.iter().map(Expression::complexity).sum::<usize>()
            }
            Expression::FunctionCall(e) => {
                1 + e.arguments.iter().map(Expression::complexity).sum::<usize>()
            }
            Expression::JsonPath(e) => 1 + e.source.complexity(),
            Expression::RestCall(e) => {
                2 + e.url.complexity()
                    + e.body.as_deref().map_or(0, Expression::complexity)
                    + e.headers.iter().map(|(_, v)| v.complexity()).sum::<usize>()
            }
        }
    }

    /// The statically known kind, `Any` where the kind depends on runtime
    /// values.
    pub fn expression_type(&self) -> ExpressionType {
        match self {
            Expression::Literal(e) => e.value.kind(),
            Expression::Variable(_) => ExpressionType::Any,
            Expression::Unary(e) => match e.op {
                UnaryOp::Negate => ExpressionType::Number,
                UnaryOp::Length => ExpressionType::Number,
                UnaryOp::ToUpper | UnaryOp::ToLower => ExpressionType::String,
                _ => ExpressionType::Boolean,
            },
            Expression::Binary(e) => {
                if e.op.is_comparison() || e.op == BinaryOp::And || e.op == BinaryOp::Or {
                    ExpressionType::Boolean
                } else if e.op == BinaryOp::Add {
                    match (e.left.expression_type(), e.right.expression_type()) {
                        (ExpressionType::Number, ExpressionType::Number) => ExpressionType::Number,
                        (ExpressionType::String, _) | (_, ExpressionType::String) => {
                            ExpressionType::String
                        }
                        _ => ExpressionType::Any,
                    }
                } else {
                    ExpressionType::Number
                }
            }
            Expression::Arithmetic(_) => ExpressionType::Number,
            Expression::FunctionCall(_) => ExpressionType::Any,
            Expression::JsonPath(_) => ExpressionType::Any,
            Expression::RestCall(_) => ExpressionType::Any,
        }
    }

    /// Copy with every span reset, for location-insensitive structural
    /// comparison.
    pub fn strip_spans(&self) -> Expression {
        let mut stripped = self.clone();
        stripped.reset_spans();
        stripped
    }

    fn reset_spans(&mut self) {
        match self {
            Expression::Literal(e) => e.span = SourceSpan::default(),
            Expression::Variable(e) => {
                e.span = SourceSpan::default();
                if let Some(index) = &mut e.index {
                    index.reset_spans();
                }
            }
            Expression::Unary(e) => {
                e.span = SourceSpan::default();
                e.operand.reset_spans();
            }
            Expression::Binary(e) => {
                e.span = SourceSpan::default();
                e.left.reset_spans();
                e.right.reset_spans();
            }
            Expression::Arithmetic(e) => {
                e.span = SourceSpan::default();
                for operand in &mut e.operands {
                    operand.reset_spans();
                }
            }
            Expression::FunctionCall(e) => {
                e.span = SourceSpan::default();
                for argument in &mut e.arguments {
                    argument.reset_spans();
                }
            }
            Expression::JsonPath(e) => {
                e.span = SourceSpan::default();
                e.source.reset_spans();
            }
            Expression::RestCall(e) => {
                e.span = SourceSpan::default();
                e.url.reset_spans();
                if let Some(body) = &mut e.body {
                    body.reset_spans();
                }
                for (_, value) in &mut e.headers {
                    value.reset_spans();
                }
            }
        }
    }
}

impl fmt::Display for Expression {
    /// Canonical source form; re-parsing it reproduces the same structure.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(e) => write!(f, "{}", e.value),
            Expression::Variable(e) => {
                write!(f, "{}", e.name)?;
                for part in &e.property_path {
                    write!(f, ".{}", part)?;
                }
                if let Some(index) = &e.index {
                    write!(f, "[{}]", index)?;
                }
                Ok(())
            }
            Expression::Unary(e) => match e.op {
                UnaryOp::Negate => write!(f, "-{}", e.operand),
                UnaryOp::Not => write!(f, "not {}", e.operand),
                op => write!(f, "{}({})", op.function_name().unwrap(), e.operand),
            },
            Expression::Binary(e) => write!(f, "({} {} {})", e.left, e.op.symbol(), e.right),
            Expression::Arithmetic(e) => {
                write!(f, "{}(", e.op.function_name())?;
                for (i, operand) in e.operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", operand)?;
                }
                write!(f, ")")
            }
            Expression::FunctionCall(e) => {
                write!(f, "{}(", e.name)?;
                for (i, argument) in e.arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                write!(f, ")")
            }
            Expression::JsonPath(e) => {
                write!(f, "json_path({}, \"{}\")", e.source, e.path)
            }
            Expression::RestCall(e) => {
                write!(f, "rest_call(\"{}\", {}", e.method, e.url)?;
                if let Some(body) = &e.body {
                    write!(f, ", {}", body)?;
                }
                write!(f, ")")
            }
        }
    }
}
