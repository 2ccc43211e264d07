//! JavaScript emission for a checked [`Program`].

use crate::ast::{
    AssignmentOperator, BinaryOperator, EnumDefinition, Expression, ExpressionKind, ForLoop,
    Iteration, Parameter, Program, Statement, StrChunk, UnaryOperator,
};

const INDENT: &str = "  ";

pub fn generate_javascript(program: &Program) -> String {
    let mut generator = JavaScriptGenerator::new();
    generator.emit_statements(&program.statements);
    tracing::debug!(bytes = generator.output.len(), "generated javascript");
    generator.output
}

struct JavaScriptGenerator {
    output: String,
    indent: usize,
}

impl JavaScriptGenerator {
    fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push_str(INDENT);
        }
    }

    fn emit_statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.emit_statement(statement);
        }
    }

    /// Emits a function body; a trailing expression becomes the return value.
    fn emit_function_body(&mut self, body: &[Statement]) {
        let Some((last, rest)) = body.split_last() else {
            return;
        };
        self.emit_statements(rest);
        match last {
            Statement::Expression(expression) => {
                self.write_indent();
                self.output.push_str("return ");
                self.emit_expression(expression);
                self.output.push('\n');
            }
            other => self.emit_statement(other),
        }
    }

    fn emit_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::VariableDeclaration(declaration) => {
                self.write_indent();
                let keyword = if declaration.mutable { "let" } else { "const" };
                self.output.push_str(&format!("{keyword} {} = ", declaration.name));
                self.emit_expression(&declaration.value);
                self.output.push('\n');
            }
            Statement::VariableAssignment(assignment) => {
                self.write_indent();
                let operator = match assignment.operator {
                    AssignmentOperator::Assign => "=",
                    AssignmentOperator::Increment => "+=",
                    AssignmentOperator::Decrement => "-=",
                };
                self.output.push_str(&format!("{} {operator} ", assignment.name));
                self.emit_expression(&assignment.value);
                self.output.push('\n');
            }
            Statement::FunctionDeclaration(function) => {
                self.write_indent();
                self.output.push_str(&format!("function {}", function.name));
                self.emit_parameters(&function.parameters);
                self.output.push(' ');
                self.emit_block(
                    |generator| generator.emit_function_body(&function.body),
                    function.body.is_empty(),
                );
                self.output.push('\n');
            }
            Statement::StructDefinition(_) => {}
            Statement::EnumDefinition(definition) => self.emit_enum(definition),
            Statement::While(while_loop) => {
                self.write_indent();
                self.output.push_str("while (");
                self.emit_expression(&while_loop.condition);
                self.output.push_str(") ");
                self.emit_block(
                    |generator| generator.emit_statements(&while_loop.body),
                    false,
                );
                self.output.push('\n');
            }
            Statement::For(for_loop) => self.emit_for(for_loop),
            Statement::Expression(expression) => {
                self.write_indent();
                self.emit_expression(expression);
                self.output.push('\n');
            }
        }
    }

    /// Writes `{`, the indented contents and the closing `}` at the current
    /// indentation. Empty blocks collapse to `{}`.
    fn emit_block(&mut self, contents: impl FnOnce(&mut Self), empty: bool) {
        if empty {
            self.output.push_str("{}");
            return;
        }
        self.output.push_str("{\n");
        self.indent += 1;
        contents(self);
        self.indent -= 1;
        self.write_indent();
        self.output.push('}');
    }

    fn emit_parameters(&mut self, parameters: &[Parameter]) {
        let names: Vec<&str> = parameters
            .iter()
            .map(|parameter| parameter.name.as_str())
            .collect();
        self.output.push_str(&format!("({})", names.join(", ")));
    }

    fn emit_enum(&mut self, definition: &EnumDefinition) {
        self.write_indent();
        self.output.push_str(&format!("const {} = Object.freeze(", definition.name));
        if definition.variants.is_empty() {
            self.output.push_str("{})\n");
            return;
        }

        self.output.push_str("{\n");
        self.indent += 1;
        let last = definition.variants.len() - 1;
        for (index, variant) in definition.variants.iter().enumerate() {
            self.write_indent();
            self.output.push_str(&format!("{variant}: Object.freeze({{ index: {index} }})"));
            if index != last {
                self.output.push(',');
            }
            self.output.push('\n');
        }
        self.indent -= 1;
        self.write_indent();
        self.output.push_str("})\n");
    }

    fn emit_for(&mut self, for_loop: &ForLoop) {
        self.write_indent();
        let cursor = &for_loop.cursor;
        match &for_loop.iteration {
            Iteration::Count(limit) => {
                self.output.push_str(&format!("for (let {cursor} = 0; {cursor} < "));
                self.emit_expression(limit);
                self.output.push_str(&format!("; {cursor}++) "));
            }
            Iteration::Range {
                start,
                end,
                inclusive,
            } => {
                self.output.push_str(&format!("for (let {cursor} = "));
                self.emit_expression(start);
                let comparison = if *inclusive { "<=" } else { "<" };
                self.output.push_str(&format!("; {cursor} {comparison} "));
                self.emit_expression(end);
                self.output.push_str(&format!("; {cursor}++) "));
            }
            Iteration::Each(iterable) => {
                self.output.push_str(&format!("for (const {cursor} of "));
                self.emit_expression(iterable);
                self.output.push_str(") ");
            }
        }
        self.emit_block(
            |generator| generator.emit_statements(&for_loop.body),
            false,
        );
        self.output.push('\n');
    }

    fn emit_expression(&mut self, expression: &Expression) {
        match &expression.kind {
            ExpressionKind::StrLiteral(contents) => {
                self.output.push_str(&format!("\"{contents}\""));
            }
            ExpressionKind::NumLiteral(text) => self.output.push_str(text),
            ExpressionKind::BoolLiteral(value) => {
                self.output.push_str(&format!("{value}"));
            }
            ExpressionKind::InterpolatedStr(chunks) => {
                self.output.push('`');
                for chunk in chunks {
                    match chunk {
                        StrChunk::Literal(text) => self.output.push_str(&escape_template(text)),
                        StrChunk::Expression(inner) => {
                            self.output.push_str("${");
                            self.emit_expression(inner);
                            self.output.push('}');
                        }
                    }
                }
                self.output.push('`');
            }
            ExpressionKind::ListLiteral(items) => {
                self.output.push('[');
                self.emit_comma_separated(items);
                self.output.push(']');
            }
            ExpressionKind::MapLiteral(entries) => {
                self.output.push_str("new Map([");
                for (index, entry) in entries.iter().enumerate() {
                    if index > 0 {
                        self.output.push_str(", ");
                    }
                    self.output.push_str(&format!("[\"{}\", ", entry.key));
                    self.emit_expression(&entry.value);
                    self.output.push(']');
                }
                self.output.push_str("])");
            }
            ExpressionKind::Identifier(name) => self.output.push_str(name),
            ExpressionKind::Binary(binary) => {
                if binary.has_precedence {
                    self.output.push('(');
                }
                self.emit_expression(&binary.left);
                self.output.push_str(&format!(" {} ", binary_operator(binary.operator)));
                self.emit_expression(&binary.right);
                if binary.has_precedence {
                    self.output.push(')');
                }
            }
            ExpressionKind::Unary(unary) => {
                self.output.push_str(match unary.operator {
                    UnaryOperator::Negate => "-",
                    UnaryOperator::Not => "!",
                });
                self.emit_expression(&unary.operand);
            }
            ExpressionKind::StructInstance(instance) => {
                if instance.fields.is_empty() {
                    self.output.push_str("{}");
                    return;
                }
                self.output.push_str("{ ");
                for (index, field) in instance.fields.iter().enumerate() {
                    if index > 0 {
                        self.output.push_str(", ");
                    }
                    self.output.push_str(&format!("{}: ", field.name));
                    self.emit_expression(&field.value);
                }
                self.output.push_str(" }");
            }
            ExpressionKind::AnonymousFunction(function) => {
                self.emit_parameters(&function.parameters);
                self.output.push_str(" => ");
                self.emit_block(
                    |generator| generator.emit_function_body(&function.body),
                    function.body.is_empty(),
                );
            }
            ExpressionKind::FunctionCall(call) => {
                self.emit_expression(&call.target);
                self.output.push('(');
                self.emit_comma_separated(&call.arguments);
                self.output.push(')');
            }
            ExpressionKind::MemberAccess(access) => {
                self.emit_expression(&access.target);
                self.output.push_str(&format!(".{}", access.member));
            }
            // Only reachable for programs that failed checking: ranges are
            // consumed by `for` headers.
            ExpressionKind::Range(range) => {
                self.output.push_str("Array.from({ length: ");
                self.emit_expression(&range.end);
                self.output.push_str(" - ");
                self.emit_expression(&range.start);
                if range.inclusive {
                    self.output.push_str(" + 1");
                }
                self.output.push_str(" }, (_, i) => ");
                self.emit_expression(&range.start);
                self.output.push_str(" + i)");
            }
        }
    }

    fn emit_comma_separated(&mut self, expressions: &[Expression]) {
        for (index, expression) in expressions.iter().enumerate() {
            if index > 0 {
                self.output.push_str(", ");
            }
            self.emit_expression(expression);
        }
    }
}

/// Escapes literal text for a template literal so `${` and backticks stay
/// inert. Escape pairs from the source pass through as written, matching
/// plain string literals.
fn escape_template(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                escaped.push(ch);
                if let Some(next) = chars.next() {
                    escaped.push(next);
                }
            }
            '`' => escaped.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => escaped.push_str("\\$"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn binary_operator(operator: BinaryOperator) -> &'static str {
    match operator {
        BinaryOperator::Equal => "===",
        BinaryOperator::NotEqual => "!==",
        BinaryOperator::And => "&&",
        BinaryOperator::Or => "||",
        other => other.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryExpression, FunctionDeclaration, SourceSpan};
    use crate::types::StaticType;

    fn identifier(name: &str) -> Expression {
        Expression::new(
            ExpressionKind::Identifier(name.to_string()),
            StaticType::Num,
            SourceSpan::default(),
        )
    }

    fn add_function() -> Program {
        let sum = Expression::new(
            ExpressionKind::Binary(BinaryExpression {
                operator: BinaryOperator::Add,
                left: Box::new(identifier("x")),
                right: Box::new(identifier("y")),
                has_precedence: false,
            }),
            StaticType::Num,
            SourceSpan::default(),
        );
        let parameter = |name: &str| Parameter {
            name: name.to_string(),
            ty: StaticType::Num,
            span: SourceSpan::default(),
        };
        Program::new(vec![Statement::FunctionDeclaration(FunctionDeclaration {
            name: "add".to_string(),
            parameters: vec![parameter("x"), parameter("y")],
            return_type: StaticType::Num,
            body: vec![Statement::Expression(sum)],
            span: SourceSpan::default(),
        })])
    }

    #[test]
    fn trailing_expression_becomes_the_return_value() {
        assert_eq!(
            generate_javascript(&add_function()),
            "function add(x, y) {\n  return x + y\n}\n"
        );
    }

    #[test]
    fn generation_is_repeatable() {
        let program = add_function();
        assert_eq!(generate_javascript(&program), generate_javascript(&program));
    }

    #[test]
    fn empty_enums_freeze_an_empty_object() {
        let program = Program::new(vec![Statement::EnumDefinition(EnumDefinition {
            name: "Empty".to_string(),
            variants: Vec::new(),
            span: SourceSpan::default(),
        })]);
        assert_eq!(
            generate_javascript(&program),
            "const Empty = Object.freeze({})\n"
        );
    }

    #[test]
    fn template_text_escapes_placeholders_and_backticks() {
        assert_eq!(escape_template("${x}"), "\\${x}");
        assert_eq!(escape_template("a`b"), "a\\`b");
        assert_eq!(escape_template("cost: $5 {ok}"), "cost: $5 {ok}");
        assert_eq!(escape_template(r"line\n"), r"line\n");
        assert_eq!(escape_template(r"\${x}"), r"\${x}");
    }
}
