use std::ops::Range;

use tree_sitter::Node;

use super::{Position, SyntaxNode};

impl<'tree> SyntaxNode for Node<'tree> {
    fn kind(&self) -> &str {
        Node::kind(self)
    }

    fn named_children(&self) -> Vec<Self> {
        let mut cursor = self.walk();
        Node::named_children(self, &mut cursor).collect()
    }

    fn child_by_field_name(&self, field: &str) -> Option<Self> {
        Node::child_by_field_name(self, field)
    }

    fn children_by_field_name(&self, field: &str) -> Vec<Self> {
        let mut cursor = self.walk();
        Node::children_by_field_name(self, field, &mut cursor).collect()
    }

    fn byte_range(&self) -> Range<usize> {
        Node::start_byte(self)..Node::end_byte(self)
    }

    fn start_position(&self) -> Position {
        let point = Node::start_position(self);
        Position::new(point.row + 1, point.column + 1)
    }

    fn end_position(&self) -> Position {
        let point = Node::end_position(self);
        Position::new(point.row + 1, point.column + 1)
    }
}
