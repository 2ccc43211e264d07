use thiserror::Error;

use crate::syntax::{Position, SyntaxNode};

/// A CST shape the checker cannot build an AST from. Unlike diagnostics,
/// these abort the whole compilation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("unsupported {context} node '{kind}' at {position}")]
    UnsupportedNode {
        context: &'static str,
        kind: String,
        position: Position,
    },
    #[error("'{kind}' node at {position} is missing its '{field}' field")]
    MissingField {
        kind: String,
        field: &'static str,
        position: Position,
    },
    #[error("'{kind}' node at {position} has no children")]
    EmptyNode { kind: String, position: Position },
    #[error("invalid number literal '{text}' at {position}")]
    InvalidNumber { text: String, position: Position },
    #[error("unknown operator '{operator}' at {position}")]
    UnknownOperator { operator: String, position: Position },
}

impl BuildError {
    pub fn unsupported<N: SyntaxNode>(context: &'static str, node: &N) -> Self {
        BuildError::UnsupportedNode {
            context,
            kind: node.kind().to_string(),
            position: node.start_position(),
        }
    }

    pub fn missing_field<N: SyntaxNode>(node: &N, field: &'static str) -> Self {
        BuildError::MissingField {
            kind: node.kind().to_string(),
            field,
            position: node.start_position(),
        }
    }

    pub fn empty<N: SyntaxNode>(node: &N) -> Self {
        BuildError::EmptyNode {
            kind: node.kind().to_string(),
            position: node.start_position(),
        }
    }

    pub fn position(&self) -> Position {
        match self {
            BuildError::UnsupportedNode { position, .. }
            | BuildError::MissingField { position, .. }
            | BuildError::EmptyNode { position, .. }
            | BuildError::InvalidNumber { position, .. }
            | BuildError::UnknownOperator { position, .. } => *position,
        }
    }
}
