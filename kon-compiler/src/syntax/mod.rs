//! The concrete syntax tree contract consumed by the checker.
//!
//! The checker never depends on a particular parser. Anything that can answer
//! the questions on [`SyntaxNode`] (node kind, named children, children by
//! field name, byte range and position) can be type checked. The crate ships
//! [`SyntaxTree`], an owned arena produced by the bundled reference parser,
//! and, behind the `tree-sitter` feature, an implementation for
//! `tree_sitter::Node`.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

mod tree;
#[cfg(feature = "tree-sitter")]
mod tree_sitter_node;

pub use tree::{NodeId, SyntaxTree, TreeBuilder, TreeNode};

/// A 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

pub trait SyntaxNode: Clone {
    /// The grammar name of the node, e.g. `variable_definition`.
    fn kind(&self) -> &str;

    fn named_children(&self) -> Vec<Self>;

    fn child_by_field_name(&self, field: &str) -> Option<Self>;

    fn children_by_field_name(&self, field: &str) -> Vec<Self>;

    fn byte_range(&self) -> Range<usize>;

    fn start_position(&self) -> Position;

    /// The position just past the last character of the node.
    fn end_position(&self) -> Position;

    fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.byte_range()).unwrap_or_default()
    }
}
