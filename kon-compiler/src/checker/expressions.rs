use super::{parameter_types, Checker};
use crate::ast::{
    AnonymousFunction, BinaryExpression, BinaryOperator, Expression, ExpressionKind,
    FunctionCall, MapEntry, MemberAccess, RangeExpression, SourceSpan, StrChunk, StructInstance,
    StructProperty, UnaryExpression, UnaryOperator,
};
use crate::error::BuildError;
use crate::syntax::SyntaxNode;
use crate::types::{compatible, lookup_member, literal_type, FunctionType, StaticType};

impl<'s> Checker<'s> {
    pub(super) fn build_expression<N: SyntaxNode>(
        &mut self,
        node: &N,
    ) -> Result<Expression, BuildError> {
        let span = SourceSpan::of(node);
        match node.kind() {
            "string" => {
                let text = self.text(node);
                let contents = text
                    .strip_prefix('"')
                    .and_then(|rest| rest.strip_suffix('"'))
                    .unwrap_or(text);
                Ok(Expression::new(
                    ExpressionKind::StrLiteral(contents.to_string()),
                    literal_type(node.kind()).unwrap_or(StaticType::Str),
                    span,
                ))
            }
            "interpolated_string" => self.build_interpolated_string(node),
            "number" => {
                let text = self.text(node);
                if text.parse::<f64>().is_err() {
                    return Err(BuildError::InvalidNumber {
                        text: text.to_string(),
                        position: node.start_position(),
                    });
                }
                Ok(Expression::new(
                    ExpressionKind::NumLiteral(text.to_string()),
                    literal_type(node.kind()).unwrap_or(StaticType::Num),
                    span,
                ))
            }
            "boolean" => Ok(Expression::new(
                ExpressionKind::BoolLiteral(self.text(node) == "true"),
                literal_type(node.kind()).unwrap_or(StaticType::Bool),
                span,
            )),
            "identifier" => {
                let name = self.text(node).to_string();
                let ty = self.resolve_identifier(&name, span);
                Ok(Expression::new(ExpressionKind::Identifier(name), ty, span))
            }
            "list_value" => self.build_list(node),
            "map_value" => self.build_map(node),
            "binary_expression" => self.build_binary(node),
            "paren_expression" => {
                let mut inner = self.build_expression(&self.first_child(node)?)?;
                if let ExpressionKind::Binary(binary) = &mut inner.kind {
                    binary.has_precedence = true;
                }
                inner.span = span;
                Ok(inner)
            }
            "unary_expression" => self.build_unary(node),
            "range_expression" => {
                let (start, end, inclusive) = self.build_range_bounds(node)?;
                self.report_error("Ranges can only be used in 'for' loops", span);
                Ok(Expression::new(
                    ExpressionKind::Range(RangeExpression {
                        start: Box::new(start),
                        end: Box::new(end),
                        inclusive,
                    }),
                    StaticType::Range,
                    span,
                ))
            }
            "struct_instance" => self.build_struct_instance(node),
            "anonymous_function" => self.build_anonymous_function(node),
            "function_call" => self.build_function_call(node),
            "member_access" => {
                let (expression, _) = self.build_member_access(node, None)?;
                Ok(expression)
            }
            // Grammars may wrap expressions in supertype nodes.
            "expression" | "primitive_value" => {
                let inner = self.first_child(node)?;
                self.build_expression(&inner)
            }
            _ => Err(BuildError::unsupported("expression", node)),
        }
    }

    fn resolve_identifier(&mut self, name: &str, span: SourceSpan) -> StaticType {
        match self.scopes.lookup_variable(name) {
            Some(binding) => binding.ty.clone(),
            None => {
                self.report_error(format!("Undefined: '{name}'"), span);
                StaticType::Unknown
            }
        }
    }

    fn build_interpolated_string<N: SyntaxNode>(
        &mut self,
        node: &N,
    ) -> Result<Expression, BuildError> {
        let mut chunks = Vec::new();
        for child in node.named_children() {
            match child.kind() {
                "interpolation" => {
                    let expression = self.build_expression(&self.first_child(&child)?)?;
                    chunks.push(StrChunk::Expression(expression));
                }
                _ => chunks.push(StrChunk::Literal(self.text(&child).to_string())),
            }
        }

        Ok(Expression::new(
            ExpressionKind::InterpolatedStr(chunks),
            StaticType::Str,
            SourceSpan::of(node),
        ))
    }

    fn build_list<N: SyntaxNode>(&mut self, node: &N) -> Result<Expression, BuildError> {
        let mut items = Vec::new();
        for child in node.named_children() {
            items.push(self.build_expression(&child)?);
        }

        let ty = match items.first() {
            None => StaticType::EmptyList,
            Some(first) => {
                let element = first.ty.clone();
                for item in &items[1..] {
                    if !element.is_unknown()
                        && !item.ty.is_unknown()
                        && !compatible(&element, &item.ty)
                    {
                        self.report_error(
                            format!("List elements must all be '{element}', got '{}'", item.ty),
                            item.span,
                        );
                    }
                }
                StaticType::List(Box::new(element))
            }
        };

        Ok(Expression::new(
            ExpressionKind::ListLiteral(items),
            ty,
            SourceSpan::of(node),
        ))
    }

    fn build_map<N: SyntaxNode>(&mut self, node: &N) -> Result<Expression, BuildError> {
        let mut entries = Vec::new();
        for entry in node.children_by_field_name("entry") {
            let key_node = self.field(&entry, "key")?;
            if key_node.kind() != "string" {
                return Err(BuildError::unsupported("map key", &key_node));
            }
            let key = self.text(&key_node);
            let key = key
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .unwrap_or(key)
                .to_string();
            let value = self.build_expression(&self.field(&entry, "value")?)?;
            entries.push(MapEntry { key, value });
        }

        let value_type = match entries.first() {
            None => StaticType::Unknown,
            Some(first) => {
                let expected = first.value.ty.clone();
                for entry in &entries[1..] {
                    let actual = &entry.value.ty;
                    if !expected.is_unknown() && !actual.is_unknown() && !compatible(&expected, actual)
                    {
                        self.report_error(
                            format!("Map values must all be '{expected}', got '{actual}'"),
                            entry.value.span,
                        );
                    }
                }
                expected
            }
        };

        Ok(Expression::new(
            ExpressionKind::MapLiteral(entries),
            StaticType::Map(Box::new(value_type)),
            SourceSpan::of(node),
        ))
    }

    fn build_binary<N: SyntaxNode>(&mut self, node: &N) -> Result<Expression, BuildError> {
        let left = self.build_expression(&self.field(node, "left")?)?;
        let operator_node = self.field(node, "operator")?;
        let operator_text = self.text(&operator_node);
        let operator =
            BinaryOperator::from_text(operator_text).ok_or_else(|| BuildError::UnknownOperator {
                operator: operator_text.to_string(),
                position: operator_node.start_position(),
            })?;
        let right = self.build_expression(&self.field(node, "right")?)?;

        let ty = if left.ty.is_unknown() || right.ty.is_unknown() {
            StaticType::Unknown
        } else {
            let (valid, result, requirement) = match operator {
                BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
                | BinaryOperator::Modulo => (
                    left.ty == StaticType::Num && right.ty == StaticType::Num,
                    StaticType::Num,
                    "'Num'",
                ),
                BinaryOperator::Less
                | BinaryOperator::LessEqual
                | BinaryOperator::Greater
                | BinaryOperator::GreaterEqual => (
                    left.ty == StaticType::Num && right.ty == StaticType::Num,
                    StaticType::Bool,
                    "'Num'",
                ),
                BinaryOperator::Equal | BinaryOperator::NotEqual => (
                    left.ty == right.ty
                        && matches!(left.ty, StaticType::Num | StaticType::Str | StaticType::Bool),
                    StaticType::Bool,
                    "'Num', 'Str', or 'Bool'",
                ),
                BinaryOperator::And | BinaryOperator::Or => (
                    left.ty == StaticType::Bool && right.ty == StaticType::Bool,
                    StaticType::Bool,
                    "'Bool'",
                ),
            };

            if valid {
                result
            } else {
                self.report_error(
                    format!(
                        "The '{}' operator can only be used between instances of {requirement}",
                        operator.as_str()
                    ),
                    SourceSpan::of(&operator_node),
                );
                result
            }
        };

        Ok(Expression::new(
            ExpressionKind::Binary(BinaryExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
                has_precedence: false,
            }),
            ty,
            SourceSpan::of(node),
        ))
    }

    fn build_unary<N: SyntaxNode>(&mut self, node: &N) -> Result<Expression, BuildError> {
        let operator_node = self.field(node, "operator")?;
        let operator_text = self.text(&operator_node);
        let operator =
            UnaryOperator::from_text(operator_text).ok_or_else(|| BuildError::UnknownOperator {
                operator: operator_text.to_string(),
                position: operator_node.start_position(),
            })?;
        let operand = self.build_expression(&self.field(node, "operand")?)?;

        let required = match operator {
            UnaryOperator::Negate => StaticType::Num,
            UnaryOperator::Not => StaticType::Bool,
        };
        if !operand.ty.is_unknown() && operand.ty != required {
            self.report_error(
                format!(
                    "The '{}' operator can only be used on '{required}'",
                    operator.as_str()
                ),
                SourceSpan::of(&operator_node),
            );
        }
        let ty = operand.ty.clone();

        Ok(Expression::new(
            ExpressionKind::Unary(UnaryExpression {
                operator,
                operand: Box::new(operand),
            }),
            ty,
            SourceSpan::of(node),
        ))
    }

    /// Builds both ends of a range and checks they are `Num`.
    pub(super) fn build_range_bounds<N: SyntaxNode>(
        &mut self,
        node: &N,
    ) -> Result<(Expression, Expression, bool), BuildError> {
        let start = self.build_expression(&self.field(node, "start")?)?;
        let operator_node = self.field(node, "operator")?;
        let operator = self.text(&operator_node);
        let inclusive = match operator {
            ".." => false,
            "..." => true,
            other => {
                return Err(BuildError::UnknownOperator {
                    operator: other.to_string(),
                    position: operator_node.start_position(),
                })
            }
        };
        let end = self.build_expression(&self.field(node, "end")?)?;

        let invalid = |ty: &StaticType| !ty.is_unknown() && *ty != StaticType::Num;
        if invalid(&start.ty) || invalid(&end.ty) {
            self.report_error(
                format!("The '{operator}' operator can only be used between instances of 'Num'"),
                SourceSpan::of(&operator_node),
            );
        }

        Ok((start, end, inclusive))
    }

    fn build_struct_instance<N: SyntaxNode>(
        &mut self,
        node: &N,
    ) -> Result<Expression, BuildError> {
        let name_node = self.field(node, "name")?;
        let name = self.text(&name_node).to_string();
        let definition = self.scopes.lookup_struct(&name).cloned();
        if definition.is_none() {
            self.report_error(
                format!("Missing definition for type '{name}'"),
                SourceSpan::of(&name_node),
            );
        }

        let mut provided = Vec::new();
        for property in node.children_by_field_name("field") {
            let field_name = self.text(&self.field(&property, "name")?).to_string();
            let value = self.build_expression(&self.field(&property, "value")?)?;

            if let Some(definition) = &definition {
                match definition.field(&field_name) {
                    Some(expected) => self.expect_type(expected, &value.ty, value.span),
                    None => self.report_warning(
                        format!("Struct '{name}' does not have a field named {field_name}"),
                        SourceSpan::of(&property),
                    ),
                }
            }

            provided.push(StructProperty {
                name: field_name,
                value,
            });
        }

        let Some(definition) = definition else {
            return Ok(Expression::new(
                ExpressionKind::StructInstance(StructInstance {
                    name,
                    fields: provided,
                }),
                StaticType::Unknown,
                SourceSpan::of(node),
            ));
        };

        let missing: Vec<&str> = definition
            .fields
            .iter()
            .map(|(field, _)| field.as_str())
            .filter(|field| !provided.iter().any(|property| property.name == *field))
            .collect();
        if !missing.is_empty() {
            self.report_error(
                format!(
                    "Missing fields for struct '{name}': {}.",
                    missing.join(", ")
                ),
                SourceSpan::of(node),
            );
        }

        // Definition order first, then anything the struct does not declare.
        let mut fields = Vec::with_capacity(provided.len());
        for (field, _) in &definition.fields {
            if let Some(index) = provided.iter().position(|property| &property.name == field) {
                fields.push(provided.remove(index));
            }
        }
        fields.extend(provided);

        Ok(Expression::new(
            ExpressionKind::StructInstance(StructInstance { name, fields }),
            StaticType::Struct(definition),
            SourceSpan::of(node),
        ))
    }

    fn build_anonymous_function<N: SyntaxNode>(
        &mut self,
        node: &N,
    ) -> Result<Expression, BuildError> {
        let parameters = self.build_parameters(&self.field(node, "parameters")?)?;
        let annotation = match node.child_by_field_name("return") {
            Some(return_node) => Some(self.resolve_type(&return_node)?),
            None => None,
        };
        let (body, return_type) =
            self.build_function_body(&parameters, &self.field(node, "body")?, annotation, node)?;

        let ty = StaticType::Function(FunctionType::new(
            parameter_types(&parameters),
            return_type.clone(),
        ));
        Ok(Expression::new(
            ExpressionKind::AnonymousFunction(AnonymousFunction {
                parameters,
                return_type,
                body,
            }),
            ty,
            SourceSpan::of(node),
        ))
    }

    fn build_function_call<N: SyntaxNode>(&mut self, node: &N) -> Result<Expression, BuildError> {
        let target_node = self.field(node, "target")?;
        let mut arguments = Vec::new();
        for argument in self.field(node, "arguments")?.named_children() {
            arguments.push(self.build_expression(&argument)?);
        }
        let call_span = SourceSpan::of(node);

        let (target, ty) = match target_node.kind() {
            "identifier" => {
                let name = self.text(&target_node).to_string();
                let target_span = SourceSpan::of(&target_node);
                let target_type = self.resolve_identifier(&name, target_span);
                let ty = match &target_type {
                    StaticType::Function(function) => {
                        let parameters: Vec<StaticType> = function
                            .parameters
                            .iter()
                            .map(|(_, ty)| ty.clone())
                            .collect();
                        self.check_arguments(&parameters, &arguments, call_span);
                        (*function.return_type).clone()
                    }
                    StaticType::Unknown => StaticType::Unknown,
                    _ => {
                        self.report_error(format!("'{name}' is not a function"), target_span);
                        StaticType::Unknown
                    }
                };
                (
                    Expression::new(ExpressionKind::Identifier(name), target_type, target_span),
                    ty,
                )
            }
            "member_access" => {
                self.build_member_access(&target_node, Some((arguments.as_slice(), call_span)))?
            }
            _ => (self.build_expression(&target_node)?, StaticType::Unknown),
        };

        Ok(Expression::new(
            ExpressionKind::FunctionCall(FunctionCall {
                target: Box::new(target),
                arguments,
            }),
            ty,
            call_span,
        ))
    }

    fn check_arguments(
        &mut self,
        parameters: &[StaticType],
        arguments: &[Expression],
        call_span: SourceSpan,
    ) {
        if parameters.len() != arguments.len() {
            self.report_error(
                format!(
                    "Expected {} arguments, got {}",
                    parameters.len(),
                    arguments.len()
                ),
                call_span,
            );
            return;
        }
        for (parameter, argument) in parameters.iter().zip(arguments) {
            self.expect_type(parameter, &argument.ty, argument.span);
        }
    }

    /// Builds `target.member`. When the access is the target of a call,
    /// `call` holds the arguments and the second value is the call's result
    /// type; otherwise it is the member's own type.
    fn build_member_access<N: SyntaxNode>(
        &mut self,
        node: &N,
        call: Option<(&[Expression], SourceSpan)>,
    ) -> Result<(Expression, StaticType), BuildError> {
        let target_node = self.field(node, "target")?;
        let member_node = self.field(node, "member")?;
        let member = self.text(&member_node).to_string();
        let span = SourceSpan::of(node);
        let member_span = SourceSpan::of(&member_node);

        if target_node.kind() != "identifier" {
            let target = self.build_expression(&target_node)?;
            return Ok((
                member_expression(target, member, StaticType::Unknown, span),
                StaticType::Unknown,
            ));
        }

        let name = self.text(&target_node).to_string();
        let target_span = SourceSpan::of(&target_node);
        let binding = self.scopes.lookup_variable(&name).cloned();

        let Some(binding) = binding else {
            if let Some(definition) = self.scopes.lookup_enum(&name).cloned() {
                let enum_type = StaticType::Enum(definition.clone());
                let member_type = if definition.index_of(&member).is_some() {
                    enum_type.clone()
                } else {
                    self.report_error(
                        format!("Enum '{name}' does not have a variant named {member}"),
                        member_span,
                    );
                    StaticType::Unknown
                };
                let result = self.call_non_function(&member, &member_type, call, member_span);
                let target = Expression::new(ExpressionKind::Identifier(name), enum_type, target_span);
                return Ok((member_expression(target, member, member_type, span), result));
            }

            self.report_error(format!("Undefined: '{name}'"), target_span);
            let target =
                Expression::new(ExpressionKind::Identifier(name), StaticType::Unknown, target_span);
            return Ok((
                member_expression(target, member, StaticType::Unknown, span),
                StaticType::Unknown,
            ));
        };

        let receiver = binding.ty.clone();
        let (member_type, result) = match &receiver {
            StaticType::Unknown => {
                self.report_error(format!("The type of '{name}' is unknown."), target_span);
                (StaticType::Unknown, StaticType::Unknown)
            }
            StaticType::Struct(definition) => {
                // Self-referential fields hold the struct as it looked
                // before its fields were known.
                let field_type = self
                    .scopes
                    .lookup_struct(&definition.name)
                    .and_then(|declared| declared.field(&member))
                    .or_else(|| definition.field(&member))
                    .cloned();
                let member_type = match field_type {
                    Some(ty) => ty,
                    None => {
                        self.report_error(
                            format!(
                                "Struct '{}' does not have a field named {member}",
                                definition.name
                            ),
                            member_span,
                        );
                        StaticType::Unknown
                    }
                };
                let result = self.call_non_function(&member, &member_type, call, member_span);
                (member_type, result)
            }
            _ => match lookup_member(&receiver, &member) {
                None => {
                    self.report_error(
                        format!("'{member}' is not a member of '{receiver}'"),
                        member_span,
                    );
                    (StaticType::Unknown, StaticType::Unknown)
                }
                Some(signature) => {
                    let parameters: Vec<StaticType> = signature
                        .parameters
                        .iter()
                        .map(|parameter| parameter.resolve(&receiver))
                        .collect();
                    let return_type = signature.return_type.resolve(&receiver);
                    let member_type = if signature.callable {
                        StaticType::Function(FunctionType::new(
                            parameters
                                .iter()
                                .enumerate()
                                .map(|(index, ty)| (format!("arg{index}"), ty.clone()))
                                .collect(),
                            return_type.clone(),
                        ))
                    } else {
                        return_type.clone()
                    };

                    let result = match call {
                        None => member_type.clone(),
                        Some(_) if !signature.callable => {
                            self.report_error(format!("'{member}' is not callable"), member_span);
                            StaticType::Unknown
                        }
                        Some((arguments, call_span)) => {
                            if signature.mutates && !binding.mutable {
                                self.report_error(
                                    format!("Cannot mutate immutable '{name}' with '.{member}()'"),
                                    call_span,
                                );
                            }
                            self.check_arguments(&parameters, arguments, call_span);
                            return_type
                        }
                    };
                    (member_type, result)
                }
            },
        };

        let target = Expression::new(ExpressionKind::Identifier(name), receiver, target_span);
        Ok((member_expression(target, member, member_type, span), result))
    }

    /// The result of calling a struct field or enum variant. Only fields
    /// holding functions can be called.
    fn call_non_function(
        &mut self,
        member: &str,
        member_type: &StaticType,
        call: Option<(&[Expression], SourceSpan)>,
        member_span: SourceSpan,
    ) -> StaticType {
        let Some((arguments, call_span)) = call else {
            return member_type.clone();
        };
        match member_type {
            StaticType::Unknown => StaticType::Unknown,
            StaticType::Function(function) => {
                let parameters: Vec<StaticType> =
                    function.parameters.iter().map(|(_, ty)| ty.clone()).collect();
                self.check_arguments(&parameters, arguments, call_span);
                (*function.return_type).clone()
            }
            _ => {
                self.report_error(format!("'{member}' is not callable"), member_span);
                StaticType::Unknown
            }
        }
    }
}

fn member_expression(
    target: Expression,
    member: String,
    ty: StaticType,
    span: SourceSpan,
) -> Expression {
    Expression::new(
        ExpressionKind::MemberAccess(MemberAccess {
            target: Box::new(target),
            member,
        }),
        ty,
        span,
    )
}
