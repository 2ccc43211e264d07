use std::fmt::Write as _;
use std::ops::Range;

use super::{Position, SyntaxNode};
use crate::source::LineIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy)]
struct Child {
    field: Option<&'static str>,
    id: NodeId,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: &'static str,
    range: Range<usize>,
    children: Vec<Child>,
}

/// An owned CST stored as an arena of nodes.
///
/// Nodes are pushed bottom-up through [`TreeBuilder`], so every child id is
/// smaller than its parent's and the tree cannot contain cycles.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
    lines: LineIndex,
}

impl SyntaxTree {
    pub fn root(&self) -> TreeNode<'_> {
        TreeNode {
            tree: self,
            id: self.root,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Renders the tree as an s-expression, with field names as prefixes.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out, self.root, None, 0);
        out
    }

    fn write_sexp(&self, out: &mut String, id: NodeId, field: Option<&str>, depth: usize) {
        let node = &self.nodes[id.index()];
        out.push_str(&"  ".repeat(depth));
        if let Some(field) = field {
            let _ = write!(out, "{field}: ");
        }
        let _ = write!(out, "({}", node.kind);
        if node.children.is_empty() {
            out.push_str(")\n");
            return;
        }
        out.push('\n');
        for child in &node.children {
            self.write_sexp(out, child.id, child.field, depth + 1);
        }
        out.push_str(&"  ".repeat(depth));
        out.push_str(")\n");
    }
}

#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn leaf(&mut self, kind: &'static str, range: Range<usize>) -> NodeId {
        self.node(kind, range, Vec::new())
    }

    pub fn node(
        &mut self,
        kind: &'static str,
        range: Range<usize>,
        children: Vec<(Option<&'static str>, NodeId)>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            range,
            children: children
                .into_iter()
                .map(|(field, id)| Child { field, id })
                .collect(),
        });
        id
    }

    pub fn range_of(&self, id: NodeId) -> Range<usize> {
        self.nodes[id.index()].range.clone()
    }

    pub fn finish(self, root: NodeId, source: &str) -> SyntaxTree {
        SyntaxTree {
            nodes: self.nodes,
            root,
            lines: LineIndex::new(source),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TreeNode<'a> {
    tree: &'a SyntaxTree,
    id: NodeId,
}

impl<'a> TreeNode<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn data(&self) -> &'a NodeData {
        &self.tree.nodes[self.id.index()]
    }

    fn with_id(&self, id: NodeId) -> Self {
        Self {
            tree: self.tree,
            id,
        }
    }
}

impl SyntaxNode for TreeNode<'_> {
    fn kind(&self) -> &str {
        self.data().kind
    }

    fn named_children(&self) -> Vec<Self> {
        self.data()
            .children
            .iter()
            .map(|child| self.with_id(child.id))
            .collect()
    }

    fn child_by_field_name(&self, field: &str) -> Option<Self> {
        self.data()
            .children
            .iter()
            .find(|child| child.field == Some(field))
            .map(|child| self.with_id(child.id))
    }

    fn children_by_field_name(&self, field: &str) -> Vec<Self> {
        self.data()
            .children
            .iter()
            .filter(|child| child.field == Some(field))
            .map(|child| self.with_id(child.id))
            .collect()
    }

    fn byte_range(&self) -> Range<usize> {
        self.data().range.clone()
    }

    fn start_position(&self) -> Position {
        self.tree.lines.position(self.data().range.start)
    }

    fn end_position(&self) -> Position {
        self.tree.lines.position(self.data().range.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (SyntaxTree, &'static str) {
        let source = "let x = 1";
        let mut builder = TreeBuilder::new();
        let binding = builder.leaf("binding_keyword", 0..3);
        let name = builder.leaf("identifier", 4..5);
        let value = builder.leaf("number", 8..9);
        let definition = builder.node(
            "variable_definition",
            0..9,
            vec![
                (Some("binding"), binding),
                (Some("name"), name),
                (Some("value"), value),
            ],
        );
        let root = builder.node("source_file", 0..9, vec![(None, definition)]);
        (builder.finish(root, source), source)
    }

    #[test]
    fn resolves_fields_and_text() {
        let (tree, source) = sample();
        let root = tree.root();
        assert_eq!(root.kind(), "source_file");
        let definition = &root.named_children()[0];
        let value = definition.child_by_field_name("value").expect("value field");
        assert_eq!(value.kind(), "number");
        assert_eq!(value.text(source), "1");
        assert_eq!(value.start_position(), Position::new(1, 9));
        assert!(definition.child_by_field_name("type").is_none());
    }

    #[test]
    fn renders_sexp_with_field_names() {
        let (tree, _) = sample();
        let sexp = tree.to_sexp();
        assert!(sexp.starts_with("(source_file\n"));
        assert!(sexp.contains("  (variable_definition\n"));
        assert!(sexp.contains("    value: (number)\n"));
    }
}
