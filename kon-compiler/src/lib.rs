mod ast;
mod checker;
mod compiler;
mod diagnostics;
mod error;
mod javascript;
mod lexer;
mod parser;
mod scope;
mod source;
pub mod syntax;
pub mod types;

pub use crate::ast::{
    AnonymousFunction, AssignmentOperator, BinaryExpression, BinaryOperator, EnumDefinition,
    Expression, ExpressionKind, ForLoop, FunctionCall, FunctionDeclaration, Iteration, MapEntry,
    MemberAccess, Parameter, Program, RangeExpression, SourceSpan, Statement, StrChunk,
    StructDefinition, StructField, StructInstance, StructProperty, UnaryExpression,
    UnaryOperator, VariableAssignment, VariableDeclaration, WhileLoop,
};
pub use crate::checker::{Checker, RESERVED_WORDS};
pub use crate::compiler::{check_source, check_tree, Compilation, CompileOptions, Compiler};
pub use crate::diagnostics::{Diagnostic, DiagnosticLevel, Diagnostics};
pub use crate::error::BuildError;
pub use crate::javascript::generate_javascript;
pub use crate::lexer::{Keyword, Lexer, LexerError, Token, TokenKind};
pub use crate::parser::{parse, ParseError, Parser};
pub use crate::scope::{Binding, ScopeChain};
pub use crate::source::{LineIndex, SourceFile, SourceId};
pub use crate::types::{compatible, is_iterable, StaticType};
