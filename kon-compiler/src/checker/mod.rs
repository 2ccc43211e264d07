//! Builds the typed AST from a CST and checks it in the same pass.
//!
//! Semantic problems are collected as diagnostics and never stop the
//! traversal. Only CST shapes the builder does not understand abort, as a
//! [`BuildError`].

mod expressions;

use crate::ast::{
    AssignmentOperator, EnumDefinition, ExpressionKind, ForLoop, FunctionDeclaration,
    Iteration, Parameter, Program, SourceSpan, Statement, StructDefinition, StructField,
    VariableAssignment, VariableDeclaration, WhileLoop,
};
use crate::diagnostics::Diagnostics;
use crate::error::BuildError;
use crate::scope::{Binding, ScopeChain};
use crate::syntax::SyntaxNode;
use crate::types::{compatible, is_iterable, EnumType, FunctionType, StaticType, StructType};

/// Names that cannot be bound by a variable declaration.
pub const RESERVED_WORDS: &[&str] = &[
    "let", "mut", "of", "in", "if", "else", "true", "false", "or", "and", "struct", "enum", "fn",
    "while", "for",
];

pub struct Checker<'s> {
    source: &'s str,
    scopes: ScopeChain,
    diagnostics: Diagnostics,
}

impl<'s> Checker<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            scopes: ScopeChain::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn check<N: SyntaxNode>(&mut self, root: &N) -> Result<Program, BuildError> {
        let statements = self.build_statements(root)?;
        tracing::debug!(
            statements = statements.len(),
            diagnostics = self.diagnostics.len(),
            "checked program"
        );
        Ok(Program::new(statements))
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    fn text<N: SyntaxNode>(&self, node: &N) -> &'s str {
        node.text(self.source)
    }

    fn field<N: SyntaxNode>(&self, node: &N, field: &'static str) -> Result<N, BuildError> {
        node.child_by_field_name(field)
            .ok_or_else(|| BuildError::missing_field(node, field))
    }

    fn first_child<N: SyntaxNode>(&self, node: &N) -> Result<N, BuildError> {
        node.named_children()
            .into_iter()
            .next()
            .ok_or_else(|| BuildError::empty(node))
    }

    fn report_error(&mut self, message: impl Into<String>, span: SourceSpan) {
        self.diagnostics.push_error_with_span(message, Some(span));
    }

    fn report_warning(&mut self, message: impl Into<String>, span: SourceSpan) {
        self.diagnostics.push_warning_with_span(message, Some(span));
    }

    /// Reports `Type mismatch` unless the types are compatible. Nothing is
    /// reported when either side is `Unknown`.
    fn expect_type(&mut self, expected: &StaticType, actual: &StaticType, span: SourceSpan) {
        if expected.contains_unknown()
            || actual.contains_unknown()
            || compatible(expected, actual)
        {
            return;
        }
        self.report_error(
            format!("Type mismatch: expected {expected}, got {actual}"),
            span,
        );
    }

    fn build_statements<N: SyntaxNode>(&mut self, node: &N) -> Result<Vec<Statement>, BuildError> {
        let mut statements = Vec::new();
        for child in node.named_children() {
            if child.kind() == "comment" {
                continue;
            }
            statements.push(self.build_statement(&child)?);
        }
        Ok(statements)
    }

    fn build_statement<N: SyntaxNode>(&mut self, node: &N) -> Result<Statement, BuildError> {
        match node.kind() {
            "variable_definition" => self
                .build_variable_declaration(node)
                .map(Statement::VariableDeclaration),
            "variable_assignment" => self
                .build_variable_assignment(node)
                .map(Statement::VariableAssignment),
            "function_definition" => self
                .build_function_declaration(node)
                .map(Statement::FunctionDeclaration),
            "struct_definition" => self
                .build_struct_definition(node)
                .map(Statement::StructDefinition),
            "enum_definition" => self
                .build_enum_definition(node)
                .map(Statement::EnumDefinition),
            "while_loop" => self.build_while_loop(node).map(Statement::While),
            "for_loop" => self.build_for_loop(node).map(Statement::For),
            // Grammars may wrap each statement in a supertype node.
            "statement" => {
                let inner = self.first_child(node)?;
                self.build_statement(&inner)
            }
            _ => self.build_expression(node).map(Statement::Expression),
        }
    }

    fn build_variable_declaration<N: SyntaxNode>(
        &mut self,
        node: &N,
    ) -> Result<VariableDeclaration, BuildError> {
        let binding = self.field(node, "binding")?;
        let mutable = self.text(&binding) == "mut";
        let name_node = self.field(node, "name")?;
        let name = self.text(&name_node).to_string();

        if RESERVED_WORDS.contains(&name.as_str()) {
            self.report_error(
                format!("'{name}' is a reserved keyword"),
                SourceSpan::of(&name_node),
            );
        }

        let declared_type = match node.child_by_field_name("type") {
            Some(type_node) => Some(self.resolve_type(&type_node)?),
            None => None,
        };

        let value = self.build_expression(&self.field(node, "value")?)?;
        if let Some(declared) = &declared_type {
            self.expect_type(declared, &value.ty, value.span);
        }

        let ty = declared_type.clone().unwrap_or_else(|| value.ty.clone());
        self.scopes
            .declare_variable(Binding::new(name.clone(), mutable, ty.clone()));

        Ok(VariableDeclaration {
            name,
            mutable,
            declared_type,
            ty,
            value,
            span: SourceSpan::of(node),
        })
    }

    fn build_variable_assignment<N: SyntaxNode>(
        &mut self,
        node: &N,
    ) -> Result<VariableAssignment, BuildError> {
        let name_node = self.field(node, "name")?;
        let name = self.text(&name_node).to_string();
        let operator_node = self.field(node, "operator")?;
        let operator_text = self.text(&operator_node);
        let operator = AssignmentOperator::from_text(operator_text).ok_or_else(|| {
            BuildError::UnknownOperator {
                operator: operator_text.to_string(),
                position: operator_node.start_position(),
            }
        })?;
        let value = self.build_expression(&self.field(node, "value")?)?;

        match self.scopes.lookup_variable(&name).cloned() {
            None => self.report_error(format!("Undefined: '{name}'"), SourceSpan::of(&name_node)),
            Some(binding) if !binding.mutable => self.report_error(
                format!("'{name}' is not mutable"),
                SourceSpan::of(&name_node),
            ),
            Some(binding) => match operator {
                AssignmentOperator::Assign => {
                    if !binding.ty.contains_unknown()
                        && !value.ty.contains_unknown()
                        && !compatible(&binding.ty, &value.ty)
                    {
                        self.report_error(
                            format!(
                                "Expected a '{}' and received '{}'",
                                binding.ty, value.ty
                            ),
                            value.span,
                        );
                    }
                }
                AssignmentOperator::Increment | AssignmentOperator::Decrement
                    if !binding.ty.is_unknown() =>
                {
                    if binding.ty != StaticType::Num {
                        self.report_error(
                            format!("'{}' can only be used with 'Num'", operator.as_str()),
                            SourceSpan::of(&operator_node),
                        );
                    } else if !value.ty.is_unknown() && value.ty != StaticType::Num {
                        self.report_error(
                            format!("Expected a 'Num' and received '{}'", value.ty),
                            value.span,
                        );
                    }
                }
                AssignmentOperator::Increment | AssignmentOperator::Decrement => {}
            },
        }

        Ok(VariableAssignment {
            name,
            operator,
            value,
            span: SourceSpan::of(node),
        })
    }

    fn build_function_declaration<N: SyntaxNode>(
        &mut self,
        node: &N,
    ) -> Result<FunctionDeclaration, BuildError> {
        let name = self.text(&self.field(node, "name")?).to_string();
        let parameters = self.build_parameters(&self.field(node, "parameters")?)?;
        let annotation = match node.child_by_field_name("return") {
            Some(return_node) => Some(self.resolve_type(&return_node)?),
            None => None,
        };

        // Bound before the body so recursive calls resolve.
        let provisional = FunctionType::new(
            parameter_types(&parameters),
            annotation.clone().unwrap_or(StaticType::Unknown),
        );
        self.scopes.declare_variable(Binding::new(
            name.clone(),
            false,
            StaticType::Function(provisional),
        ));

        let (body, return_type) =
            self.build_function_body(&parameters, &self.field(node, "body")?, annotation, node)?;

        let declaration = FunctionDeclaration {
            name,
            parameters,
            return_type,
            body,
            span: SourceSpan::of(node),
        };
        self.scopes.declare_variable(Binding::new(
            declaration.name.clone(),
            false,
            StaticType::Function(declaration.signature()),
        ));

        Ok(declaration)
    }

    fn build_parameters<N: SyntaxNode>(&mut self, node: &N) -> Result<Vec<Parameter>, BuildError> {
        let mut parameters = Vec::new();
        for parameter in node.children_by_field_name("parameter") {
            let name = self.text(&self.field(&parameter, "name")?).to_string();
            let ty = match parameter.child_by_field_name("type") {
                Some(type_node) => self.resolve_type(&type_node)?,
                None => StaticType::Unknown,
            };
            parameters.push(Parameter {
                name,
                ty,
                span: SourceSpan::of(&parameter),
            });
        }
        Ok(parameters)
    }

    /// Checks a function body in a child scope holding the parameters and
    /// works out the effective return type.
    fn build_function_body<N: SyntaxNode>(
        &mut self,
        parameters: &[Parameter],
        body_node: &N,
        annotation: Option<StaticType>,
        function_node: &N,
    ) -> Result<(Vec<Statement>, StaticType), BuildError> {
        self.scopes.push_child();
        for parameter in parameters {
            self.scopes.declare_variable(Binding::new(
                parameter.name.clone(),
                false,
                parameter.ty.clone(),
            ));
        }
        let body = self.build_statements(body_node);
        self.scopes.pop();
        let body = body?;

        let trailing = body.last().and_then(Statement::as_expression);
        let computed = trailing
            .map(|expression| expression.ty.clone())
            .unwrap_or(StaticType::Void);

        let return_type = match annotation {
            Some(declared) => {
                let span = trailing
                    .map(|expression| expression.span)
                    .unwrap_or_else(|| SourceSpan::of(function_node));
                self.expect_type(&declared, &computed, span);
                declared
            }
            None => computed,
        };

        Ok((body, return_type))
    }

    fn build_struct_definition<N: SyntaxNode>(
        &mut self,
        node: &N,
    ) -> Result<StructDefinition, BuildError> {
        let name = self.text(&self.field(node, "name")?).to_string();
        self.scopes
            .declare_struct(StructType::new(name.clone(), Vec::new()));

        let mut fields = Vec::new();
        for field in node.children_by_field_name("field") {
            let field_name = self.text(&self.field(&field, "name")?).to_string();
            let ty = self.resolve_type_with(&self.field(&field, "type")?, false)?;
            fields.push(StructField {
                name: field_name,
                ty,
                span: SourceSpan::of(&field),
            });
        }

        self.scopes.declare_struct(StructType::new(
            name.clone(),
            fields
                .iter()
                .map(|field| (field.name.clone(), field.ty.clone()))
                .collect(),
        ));

        Ok(StructDefinition {
            name,
            fields,
            span: SourceSpan::of(node),
        })
    }

    fn build_enum_definition<N: SyntaxNode>(
        &mut self,
        node: &N,
    ) -> Result<EnumDefinition, BuildError> {
        let name = self.text(&self.field(node, "name")?).to_string();
        let variants: Vec<String> = node
            .children_by_field_name("variant")
            .iter()
            .map(|variant| self.text(variant).to_string())
            .collect();

        self.scopes
            .declare_enum(EnumType::new(name.clone(), variants.clone()));

        Ok(EnumDefinition {
            name,
            variants,
            span: SourceSpan::of(node),
        })
    }

    fn build_while_loop<N: SyntaxNode>(&mut self, node: &N) -> Result<WhileLoop, BuildError> {
        let condition = self.build_expression(&self.field(node, "condition")?)?;
        if !condition.ty.is_unknown() && condition.ty != StaticType::Bool {
            self.report_error(
                format!("Expected a 'Bool' and received '{}'", condition.ty),
                condition.span,
            );
        }

        self.scopes.push_child();
        let body = self.build_statements(&self.field(node, "body")?);
        self.scopes.pop();

        Ok(WhileLoop {
            condition,
            body: body?,
            span: SourceSpan::of(node),
        })
    }

    fn build_for_loop<N: SyntaxNode>(&mut self, node: &N) -> Result<ForLoop, BuildError> {
        let cursor = self.text(&self.field(node, "cursor")?).to_string();
        let iterable_node = self.field(node, "iterable")?;
        let unwrapped = self.strip_parentheses(&iterable_node)?;

        let (iteration, cursor_type) = if unwrapped.kind() == "range_expression" {
            let (start, end, inclusive) = self.build_range_bounds(&unwrapped)?;
            (
                Iteration::Range {
                    start,
                    end,
                    inclusive,
                },
                StaticType::Num,
            )
        } else {
            let iterable = self.build_expression(&iterable_node)?;
            if !iterable.ty.is_unknown() && !is_iterable(&iterable.ty) {
                self.report_error(
                    format!("Cannot iterate over a '{}'", iterable.ty),
                    iterable.span,
                );
            }
            match iterable.ty.clone() {
                StaticType::Num => (Iteration::Count(iterable), StaticType::Num),
                StaticType::Str => (Iteration::Each(iterable), StaticType::Str),
                StaticType::List(inner) => (Iteration::Each(iterable), *inner),
                StaticType::Range => match iterable.kind {
                    ExpressionKind::Range(range) => (
                        Iteration::Range {
                            start: *range.start,
                            end: *range.end,
                            inclusive: range.inclusive,
                        },
                        StaticType::Num,
                    ),
                    _ => (Iteration::Each(iterable), StaticType::Num),
                },
                _ => (Iteration::Each(iterable), StaticType::Unknown),
            }
        };

        self.scopes.push_child();
        self.scopes
            .declare_variable(Binding::new(cursor.clone(), false, cursor_type));
        let body = self.build_statements(&self.field(node, "body")?);
        self.scopes.pop();

        Ok(ForLoop {
            cursor,
            iteration,
            body: body?,
            span: SourceSpan::of(node),
        })
    }

    fn strip_parentheses<N: SyntaxNode>(&self, node: &N) -> Result<N, BuildError> {
        let mut current = node.clone();
        while matches!(current.kind(), "paren_expression" | "expression") {
            current = self.first_child(&current)?;
        }
        Ok(current)
    }

    /// Resolves a type annotation. Unresolvable names are reported and
    /// become `Unknown`.
    fn resolve_type<N: SyntaxNode>(&mut self, node: &N) -> Result<StaticType, BuildError> {
        self.resolve_type_with(node, true)
    }

    /// Struct fields resolve with `report` off, so unknown names quietly
    /// become `Unknown`.
    fn resolve_type_with<N: SyntaxNode>(
        &mut self,
        node: &N,
        report: bool,
    ) -> Result<StaticType, BuildError> {
        let inner = if node.kind() == "type" {
            self.first_child(node)?
        } else {
            node.clone()
        };

        match inner.kind() {
            "void" => Ok(StaticType::Void),
            "primitive_type" | "identifier" => {
                let name = self.text(&inner);
                if let Some(primitive) = StaticType::from_primitive(name) {
                    return Ok(primitive);
                }
                if let Some(definition) = self.scopes.lookup_struct(name) {
                    return Ok(StaticType::Struct(definition.clone()));
                }
                if let Some(definition) = self.scopes.lookup_enum(name) {
                    return Ok(StaticType::Enum(definition.clone()));
                }
                if report {
                    self.report_error(
                        format!("Missing definition for type '{name}'"),
                        SourceSpan::of(&inner),
                    );
                }
                Ok(StaticType::Unknown)
            }
            "list_type" => {
                let element = self.resolve_type_with(&self.field(&inner, "element")?, report)?;
                Ok(StaticType::List(Box::new(element)))
            }
            "map_type" => {
                let key_node = self.field(&inner, "key")?;
                let key = self.resolve_type_with(&key_node, report)?;
                if report && !key.is_unknown() && key != StaticType::Str {
                    self.report_error("Map keys must be 'Str'", SourceSpan::of(&key_node));
                }
                let value = self.resolve_type_with(&self.field(&inner, "value")?, report)?;
                Ok(StaticType::Map(Box::new(value)))
            }
            _ => Err(BuildError::unsupported("type", &inner)),
        }
    }
}

fn parameter_types(parameters: &[Parameter]) -> Vec<(String, StaticType)> {
    parameters
        .iter()
        .map(|parameter| (parameter.name.clone(), parameter.ty.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn check(source: &str) -> (Program, Diagnostics) {
        let tree = parse(source).expect("parse");
        let mut checker = Checker::new(source);
        let program = checker.check(&tree.root()).expect("check");
        (program, checker.into_diagnostics())
    }

    #[test]
    fn records_declared_and_inferred_types() {
        let (program, diagnostics) = check("let a: [Str] = []\nmut b = 1");
        assert!(diagnostics.is_empty());
        match &program.statements[0] {
            Statement::VariableDeclaration(declaration) => {
                assert_eq!(
                    declaration.ty,
                    StaticType::List(Box::new(StaticType::Str))
                );
                assert_eq!(declaration.value.ty, StaticType::EmptyList);
            }
            other => panic!("expected a declaration, got {other:?}"),
        }
        match &program.statements[1] {
            Statement::VariableDeclaration(declaration) => {
                assert!(declaration.mutable);
                assert_eq!(declaration.declared_type, None);
                assert_eq!(declaration.ty, StaticType::Num);
            }
            other => panic!("expected a declaration, got {other:?}"),
        }
    }

    #[test]
    fn mismatch_points_at_the_value() {
        let (_, diagnostics) = check("let name: Str = false");
        let diagnostic = &diagnostics.entries()[0];
        assert_eq!(diagnostic.message, "Type mismatch: expected Str, got Bool");
        let span = diagnostic.span.expect("span");
        assert_eq!((span.line, span.column), (1, 17));
        assert_eq!((span.end_line, span.end_column), (1, 21));
    }

    #[test]
    fn loop_scopes_do_not_leak() {
        let (_, diagnostics) = check("for i in 3 { let doubled = i * 2 }\ni\ndoubled");
        assert_eq!(
            diagnostics.messages(),
            vec!["Undefined: 'i'", "Undefined: 'doubled'"]
        );
    }

    #[test]
    fn unresolved_annotations_become_unknown() {
        let (program, diagnostics) = check("let p: Person = 1");
        assert_eq!(
            diagnostics.messages(),
            vec!["Missing definition for type 'Person'"]
        );
        match &program.statements[0] {
            Statement::VariableDeclaration(declaration) => {
                assert_eq!(declaration.ty, StaticType::Unknown)
            }
            other => panic!("expected a declaration, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_nodes_abort() {
        let source = "x";
        let mut builder = crate::syntax::TreeBuilder::new();
        let odd = builder.leaf("mystery", 0..1);
        let root = builder.node("source_file", 0..1, vec![(None, odd)]);
        let tree = builder.finish(root, source);

        let error = Checker::new(source).check(&tree.root()).unwrap_err();
        assert!(matches!(
            error,
            BuildError::UnsupportedNode { ref kind, .. } if kind == "mystery"
        ));
    }
}
