use serde::Serialize;

use crate::syntax::SyntaxNode;
use crate::types::{FunctionType, StaticType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceSpan {
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl SourceSpan {
    pub fn new(line: usize, column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            line,
            column,
            end_line,
            end_column,
            start_byte: 0,
            end_byte: 0,
        }
    }

    pub fn single_point(line: usize, column: usize) -> Self {
        Self::new(line, column, line, column)
    }

    /// The span covered by a CST node. The end column points at the node's
    /// last character.
    pub fn of<N: SyntaxNode>(node: &N) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        let end_column = if end.line == start.line {
            end.column.saturating_sub(1).max(start.column)
        } else {
            end.column.saturating_sub(1).max(1)
        };
        let range = node.byte_range();
        Self {
            line: start.line,
            column: start.column,
            end_line: end.line,
            end_column,
            start_byte: range.start,
            end_byte: range.end,
        }
    }
}

impl Default for SourceSpan {
    fn default() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    VariableDeclaration(VariableDeclaration),
    VariableAssignment(VariableAssignment),
    FunctionDeclaration(FunctionDeclaration),
    StructDefinition(StructDefinition),
    EnumDefinition(EnumDefinition),
    While(WhileLoop),
    For(ForLoop),
    Expression(Expression),
}

impl Statement {
    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Statement::Expression(expression) => Some(expression),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: String,
    pub mutable: bool,
    pub declared_type: Option<StaticType>,
    /// The type recorded for the binding: the annotation when present,
    /// otherwise the value's type.
    pub ty: StaticType,
    pub value: Expression,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    Assign,
    Increment,
    Decrement,
}

impl AssignmentOperator {
    pub fn from_text(text: &str) -> Option<Self> {
        match text {
            "=" => Some(AssignmentOperator::Assign),
            "=+" => Some(AssignmentOperator::Increment),
            "=-" => Some(AssignmentOperator::Decrement),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentOperator::Assign => "=",
            AssignmentOperator::Increment => "=+",
            AssignmentOperator::Decrement => "=-",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableAssignment {
    pub name: String,
    pub operator: AssignmentOperator,
    pub value: Expression,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: StaticType,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: StaticType,
    pub body: Vec<Statement>,
    pub span: SourceSpan,
}

impl FunctionDeclaration {
    pub fn signature(&self) -> FunctionType {
        FunctionType::new(
            self.parameters
                .iter()
                .map(|param| (param.name.clone(), param.ty.clone()))
                .collect(),
            self.return_type.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: StaticType,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDefinition {
    pub name: String,
    pub fields: Vec<StructField>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDefinition {
    pub name: String,
    pub variants: Vec<String>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileLoop {
    pub condition: Expression,
    pub body: Vec<Statement>,
    pub span: SourceSpan,
}

/// How a `for` loop walks its iterable, decided from the iterable's type.
#[derive(Debug, Clone, PartialEq)]
pub enum Iteration {
    /// `for i in n`: counts from 0 up to `n`.
    Count(Expression),
    Range {
        start: Expression,
        end: Expression,
        inclusive: bool,
    },
    /// Lists and strings: one pass per element.
    Each(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub cursor: String,
    pub iteration: Iteration,
    pub body: Vec<Statement>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub ty: StaticType,
    pub span: SourceSpan,
}

impl Expression {
    pub fn new(kind: ExpressionKind, ty: StaticType, span: SourceSpan) -> Self {
        Self { kind, ty, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    /// The literal's contents between the quotes, escapes left as written.
    StrLiteral(String),
    /// The number as written in the source.
    NumLiteral(String),
    BoolLiteral(bool),
    InterpolatedStr(Vec<StrChunk>),
    ListLiteral(Vec<Expression>),
    MapLiteral(Vec<MapEntry>),
    Identifier(String),
    Binary(BinaryExpression),
    Unary(UnaryExpression),
    StructInstance(StructInstance),
    AnonymousFunction(AnonymousFunction),
    FunctionCall(FunctionCall),
    MemberAccess(MemberAccess),
    Range(RangeExpression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrChunk {
    Literal(String),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: String,
    pub value: Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub fn from_text(text: &str) -> Option<Self> {
        let operator = match text {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "%" => BinaryOperator::Modulo,
            "==" => BinaryOperator::Equal,
            "!=" => BinaryOperator::NotEqual,
            "<" => BinaryOperator::Less,
            "<=" => BinaryOperator::LessEqual,
            ">" => BinaryOperator::Greater,
            ">=" => BinaryOperator::GreaterEqual,
            "and" => BinaryOperator::And,
            "or" => BinaryOperator::Or,
            _ => return None,
        };
        Some(operator)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    /// Set when the source wrapped the expression in parentheses.
    pub has_precedence: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
}

impl UnaryOperator {
    pub fn from_text(text: &str) -> Option<Self> {
        match text {
            "-" => Some(UnaryOperator::Negate),
            "!" => Some(UnaryOperator::Not),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Not => "!",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructProperty {
    pub name: String,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructInstance {
    pub name: String,
    pub fields: Vec<StructProperty>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnonymousFunction {
    pub parameters: Vec<Parameter>,
    pub return_type: StaticType,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub target: Box<Expression>,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccess {
    pub target: Box<Expression>,
    pub member: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeExpression {
    pub start: Box<Expression>,
    pub end: Box<Expression>,
    pub inclusive: bool,
}
