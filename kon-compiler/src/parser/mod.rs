//! The reference parser: turns Kon source into the CST consumed by the
//! checker. Statements are parsed by recursive descent and expressions by
//! precedence climbing.

use std::ops::Range;

use thiserror::Error;

use crate::lexer::{Keyword, Lexer, LexerError, Token, TokenKind};
use crate::syntax::{NodeId, SyntaxTree, TreeBuilder};
use crate::types::StaticType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error("{message} at line {line}, column {column} (found '{found}')")]
    Unexpected {
        message: String,
        found: String,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::Lexer(error) => error.line(),
            ParseError::Unexpected { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            ParseError::Lexer(error) => error.column(),
            ParseError::Unexpected { column, .. } => *column,
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

#[derive(Copy, Clone, PartialEq, PartialOrd)]
enum Precedence {
    Lowest = 0,
    Or,
    And,
    Equality,
    Comparison,
    Range,
    Term,
    Factor,
    Unary,
}

impl Precedence {
    fn of(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Keyword(Keyword::Or) => Some(Precedence::Or),
            TokenKind::Keyword(Keyword::And) => Some(Precedence::And),
            TokenKind::DoubleEqual | TokenKind::BangEqual => Some(Precedence::Equality),
            TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::Less
            | TokenKind::LessEqual => Some(Precedence::Comparison),
            TokenKind::DotDot | TokenKind::DotDotDot => Some(Precedence::Range),
            TokenKind::Plus | TokenKind::Minus => Some(Precedence::Term),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(Precedence::Factor),
            _ => None,
        }
    }
}

/// Lexes and parses `source` into a [`SyntaxTree`].
pub fn parse(source: &str) -> ParseResult<SyntaxTree> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(source, tokens).parse()
}

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    current: usize,
    builder: TreeBuilder,
    /// Open `(` and `[` around the current expression; newlines inside them
    /// do not end the expression.
    nesting: usize,
    /// Cleared while parsing `for`/`while` headers so `x {` starts the body
    /// instead of a struct instance or an anonymous function.
    allow_braced_expressions: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            current: 0,
            builder: TreeBuilder::new(),
            nesting: 0,
            allow_braced_expressions: true,
        }
    }

    pub fn parse(mut self) -> ParseResult<SyntaxTree> {
        let mut statements = Vec::new();

        loop {
            self.skip_newlines();
            if self.is_at_end() {
                break;
            }
            statements.push((None, self.parse_statement()?));
            self.expect_statement_end()?;
        }

        let root = self
            .builder
            .node("source_file", 0..self.source.len(), statements);
        Ok(self.builder.finish(root, self.source))
    }

    fn parse_statement(&mut self) -> ParseResult<NodeId> {
        match self.peek_kind() {
            TokenKind::Keyword(Keyword::Let) | TokenKind::Keyword(Keyword::Mut) => {
                self.parse_variable_definition()
            }
            TokenKind::Keyword(Keyword::Fn) => self.parse_function_definition(),
            TokenKind::Keyword(Keyword::Struct) => self.parse_struct_definition(),
            TokenKind::Keyword(Keyword::Enum) => self.parse_enum_definition(),
            TokenKind::Keyword(Keyword::While) => self.parse_while_loop(),
            TokenKind::Keyword(Keyword::For) => self.parse_for_loop(),
            TokenKind::Identifier
                if matches!(
                    self.peek_kind_at(1),
                    Some(TokenKind::Equal | TokenKind::EqualPlus | TokenKind::EqualMinus)
                ) =>
            {
                self.parse_variable_assignment()
            }
            _ => self.parse_expression(),
        }
    }

    fn parse_variable_definition(&mut self) -> ParseResult<NodeId> {
        let keyword = self.advance().clone();
        let binding = self.builder.leaf("binding_keyword", keyword.range());
        let name = self.expect_identifier("expected a variable name")?;

        let mut children = vec![(Some("binding"), binding), (Some("name"), name)];
        if self.check(TokenKind::Colon) {
            self.advance();
            children.push((Some("type"), self.parse_type()?));
        }

        self.expect_token(TokenKind::Equal, "expected '=' in variable definition")?;
        self.skip_newlines();
        children.push((Some("value"), self.parse_expression()?));

        Ok(self.finish_node("variable_definition", keyword.start, children))
    }

    fn parse_variable_assignment(&mut self) -> ParseResult<NodeId> {
        let start = self.peek().start;
        let name = self.expect_identifier("expected a variable name")?;
        let operator_token = self.advance().clone();
        let operator = self.builder.leaf("operator", operator_token.range());
        self.skip_newlines();
        let value = self.parse_expression()?;

        Ok(self.finish_node(
            "variable_assignment",
            start,
            vec![
                (Some("name"), name),
                (Some("operator"), operator),
                (Some("value"), value),
            ],
        ))
    }

    fn parse_function_definition(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().start; // consume 'fn'
        let name = self.expect_identifier("expected a function name")?;
        let parameters = self.parse_parameters()?;

        let mut children = vec![(Some("name"), name), (Some("parameters"), parameters)];
        if !self.check(TokenKind::LBrace) {
            children.push((Some("return"), self.parse_type()?));
        }
        children.push((Some("body"), self.parse_block()?));

        Ok(self.finish_node("function_definition", start, children))
    }

    fn parse_parameters(&mut self) -> ParseResult<NodeId> {
        let start = self.peek().start;
        self.expect_token(TokenKind::LParen, "expected '(' to start parameter list")?;

        let mut parameters = Vec::new();
        loop {
            self.skip_newlines();
            if self.check(TokenKind::RParen) {
                break;
            }

            let parameter_start = self.peek().start;
            let name = self.expect_identifier("expected a parameter name")?;
            let mut children = vec![(Some("name"), name)];
            if self.check(TokenKind::Colon) {
                self.advance();
                children.push((Some("type"), self.parse_type()?));
            }
            parameters.push((
                Some("parameter"),
                self.finish_node("parameter", parameter_start, children),
            ));

            self.skip_newlines();
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        self.skip_newlines();
        self.expect_token(TokenKind::RParen, "expected ')' after parameters")?;
        Ok(self.finish_node("parameters", start, parameters))
    }

    fn parse_struct_definition(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().start; // consume 'struct'
        let name = self.expect_identifier("expected a struct name")?;
        self.expect_token(TokenKind::LBrace, "expected '{' to start struct fields")?;

        let mut children = vec![(Some("name"), name)];
        loop {
            self.skip_separators();
            if self.check(TokenKind::RBrace) {
                break;
            }

            let field_start = self.peek().start;
            let field_name = self.expect_identifier("expected a field name")?;
            self.expect_token(TokenKind::Colon, "expected ':' after field name")?;
            let field_type = self.parse_type()?;
            children.push((
                Some("field"),
                self.finish_node(
                    "struct_field",
                    field_start,
                    vec![(Some("name"), field_name), (Some("type"), field_type)],
                ),
            ));
        }

        self.expect_token(TokenKind::RBrace, "expected '}' after struct fields")?;
        Ok(self.finish_node("struct_definition", start, children))
    }

    fn parse_enum_definition(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().start; // consume 'enum'
        let name = self.expect_identifier("expected an enum name")?;
        self.expect_token(TokenKind::LBrace, "expected '{' to start enum variants")?;

        let mut children = vec![(Some("name"), name)];
        loop {
            self.skip_separators();
            if self.check(TokenKind::RBrace) {
                break;
            }
            let variant = self.expect_identifier("expected a variant name")?;
            children.push((Some("variant"), variant));
        }

        self.expect_token(TokenKind::RBrace, "expected '}' after enum variants")?;
        Ok(self.finish_node("enum_definition", start, children))
    }

    fn parse_while_loop(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().start; // consume 'while'
        let condition = self.parse_header_expression()?;
        let body = self.parse_block()?;

        Ok(self.finish_node(
            "while_loop",
            start,
            vec![(Some("condition"), condition), (Some("body"), body)],
        ))
    }

    fn parse_for_loop(&mut self) -> ParseResult<NodeId> {
        let start = self.advance().start; // consume 'for'
        let cursor = self.expect_identifier("expected a loop variable after 'for'")?;
        self.expect_token(
            TokenKind::Keyword(Keyword::In),
            "expected 'in' after the loop variable",
        )?;
        let iterable = self.parse_header_expression()?;
        let body = self.parse_block()?;

        Ok(self.finish_node(
            "for_loop",
            start,
            vec![
                (Some("cursor"), cursor),
                (Some("iterable"), iterable),
                (Some("body"), body),
            ],
        ))
    }

    fn parse_header_expression(&mut self) -> ParseResult<NodeId> {
        let previous = std::mem::replace(&mut self.allow_braced_expressions, false);
        let result = self.parse_expression();
        self.allow_braced_expressions = previous;
        result
    }

    fn parse_block(&mut self) -> ParseResult<NodeId> {
        let start = self.peek().start;
        self.expect_token(TokenKind::LBrace, "expected '{' to start a block")?;

        let previous_nesting = std::mem::replace(&mut self.nesting, 0);
        let previous_braced = std::mem::replace(&mut self.allow_braced_expressions, true);

        let mut statements = Vec::new();
        let result = loop {
            self.skip_newlines();
            if self.check(TokenKind::RBrace) || self.is_at_end() {
                break Ok(());
            }
            match self.parse_statement() {
                Ok(statement) => statements.push((None, statement)),
                Err(error) => break Err(error),
            }
            if let Err(error) = self.expect_statement_end() {
                break Err(error);
            }
        };

        self.nesting = previous_nesting;
        self.allow_braced_expressions = previous_braced;
        result?;

        self.expect_token(TokenKind::RBrace, "expected '}' to close the block")?;
        Ok(self.finish_node("block", start, statements))
    }

    fn parse_type(&mut self) -> ParseResult<NodeId> {
        let start = self.peek().start;
        let inner = match self.peek_kind() {
            TokenKind::Identifier => {
                let token = self.advance().clone();
                let kind = if StaticType::from_primitive(&token.lexeme).is_some() {
                    "primitive_type"
                } else {
                    "identifier"
                };
                self.builder.leaf(kind, token.range())
            }
            TokenKind::LBracket => {
                self.advance();
                let first = self.parse_type()?;
                if self.check(TokenKind::Colon) {
                    self.advance();
                    let value = self.parse_type()?;
                    self.expect_token(TokenKind::RBracket, "expected ']' after map type")?;
                    self.finish_node(
                        "map_type",
                        start,
                        vec![(Some("key"), first), (Some("value"), value)],
                    )
                } else {
                    self.expect_token(TokenKind::RBracket, "expected ']' after list type")?;
                    self.finish_node("list_type", start, vec![(Some("element"), first)])
                }
            }
            _ => return Err(self.unexpected("expected a type")),
        };

        Ok(self.finish_node("type", start, vec![(None, inner)]))
    }

    fn parse_expression(&mut self) -> ParseResult<NodeId> {
        self.parse_expression_prec(Precedence::Lowest)
    }

    fn parse_expression_prec(&mut self, precedence: Precedence) -> ParseResult<NodeId> {
        let mut expr = self.parse_prefix_expression()?;

        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    expr = self.finish_call(expr)?;
                    continue;
                }
                TokenKind::Dot => {
                    expr = self.finish_member(expr)?;
                    continue;
                }
                TokenKind::Newline if self.nesting > 0 => {
                    self.skip_newlines();
                    continue;
                }
                _ => {}
            }

            let next_precedence = match Precedence::of(self.peek_kind()) {
                Some(p) => p,
                None => break,
            };

            if precedence >= next_precedence {
                break;
            }

            expr = self.parse_infix_expression(expr, next_precedence)?;
        }

        Ok(expr)
    }

    fn parse_prefix_expression(&mut self) -> ParseResult<NodeId> {
        if self.nesting > 0 {
            self.skip_newlines();
        }
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                Ok(self.builder.leaf("number", token.range()))
            }
            TokenKind::Boolean => {
                self.advance();
                Ok(self.builder.leaf("boolean", token.range()))
            }
            TokenKind::String => {
                self.advance();
                self.parse_string(&token)
            }
            TokenKind::Identifier => {
                self.advance();
                let name = self.builder.leaf("identifier", token.range());
                if self.allow_braced_expressions && self.check(TokenKind::LBrace) {
                    self.parse_struct_instance(name, token.start)
                } else {
                    Ok(name)
                }
            }
            TokenKind::Minus | TokenKind::Bang => {
                self.advance();
                let operator = self.builder.leaf("operator", token.range());
                let operand = self.parse_expression_prec(Precedence::Unary)?;
                Ok(self.finish_node(
                    "unary_expression",
                    token.start,
                    vec![(Some("operator"), operator), (Some("operand"), operand)],
                ))
            }
            TokenKind::LParen if self.allow_braced_expressions && self.starts_anonymous_function() => {
                self.parse_anonymous_function()
            }
            TokenKind::LParen => {
                self.advance();
                self.nesting += 1;
                let inner = self.parse_expression();
                self.nesting -= 1;
                let inner = inner?;
                self.skip_newlines();
                self.expect_token(TokenKind::RParen, "expected ')' after expression")?;
                Ok(self.finish_node("paren_expression", token.start, vec![(None, inner)]))
            }
            TokenKind::LBracket => {
                self.advance();
                self.nesting += 1;
                let collection = self.parse_collection(token.start);
                self.nesting -= 1;
                collection
            }
            _ => Err(self.unexpected("expected an expression")),
        }
    }

    fn parse_infix_expression(
        &mut self,
        left: NodeId,
        precedence: Precedence,
    ) -> ParseResult<NodeId> {
        let start = self.builder.range_of(left).start;
        let operator_token = self.advance().clone();
        let operator = self.builder.leaf("operator", operator_token.range());
        if self.nesting > 0 {
            self.skip_newlines();
        }
        let right = self.parse_expression_prec(precedence)?;

        match operator_token.kind {
            TokenKind::DotDot | TokenKind::DotDotDot => Ok(self.finish_node(
                "range_expression",
                start,
                vec![
                    (Some("start"), left),
                    (Some("operator"), operator),
                    (Some("end"), right),
                ],
            )),
            _ => Ok(self.finish_node(
                "binary_expression",
                start,
                vec![
                    (Some("left"), left),
                    (Some("operator"), operator),
                    (Some("right"), right),
                ],
            )),
        }
    }

    /// A string literal becomes `interpolated_string` when it contains at
    /// least one `{{ expr }}` section.
    fn parse_string(&mut self, token: &Token) -> ParseResult<NodeId> {
        let content = (token.start + 1)..token.end.saturating_sub(1);
        let sections = interpolation_sections(self.source, content.clone());
        if sections.is_empty() {
            return Ok(self.builder.leaf("string", token.range()));
        }

        let mut children = Vec::new();
        let mut cursor = content.start;
        for section in sections {
            if section.start > cursor {
                children.push((None, self.builder.leaf("string_content", cursor..section.start)));
            }
            let expression = self.parse_embedded_expression((section.start + 2)..(section.end - 2))?;
            children.push((
                None,
                self.builder
                    .node("interpolation", section.clone(), vec![(None, expression)]),
            ));
            cursor = section.end;
        }
        if cursor < content.end {
            children.push((None, self.builder.leaf("string_content", cursor..content.end)));
        }

        Ok(self
            .builder
            .node("interpolated_string", token.range(), children))
    }

    fn parse_embedded_expression(&mut self, range: Range<usize>) -> ParseResult<NodeId> {
        let tokens = Lexer::with_range(self.source, range).tokenize()?;
        let saved_tokens = std::mem::replace(&mut self.tokens, tokens);
        let saved_current = std::mem::replace(&mut self.current, 0);
        let saved_nesting = std::mem::replace(&mut self.nesting, 1);

        let result = self.parse_expression().and_then(|expression| {
            self.skip_newlines();
            if self.is_at_end() {
                Ok(expression)
            } else {
                Err(self.unexpected("expected '}}' to close interpolation"))
            }
        });

        self.tokens = saved_tokens;
        self.current = saved_current;
        self.nesting = saved_nesting;
        result
    }

    fn parse_struct_instance(&mut self, name: NodeId, start: usize) -> ParseResult<NodeId> {
        self.advance(); // consume '{'
        let mut children = vec![(Some("name"), name)];

        loop {
            self.skip_separators();
            if self.check(TokenKind::RBrace) {
                break;
            }

            let property_start = self.peek().start;
            let field_name = self.expect_identifier("expected a field name")?;
            self.expect_token(TokenKind::Colon, "expected ':' after field name")?;
            self.skip_newlines();
            let previous_nesting = std::mem::replace(&mut self.nesting, 1);
            let value = self.parse_expression();
            self.nesting = previous_nesting;
            let value = value?;
            children.push((
                Some("field"),
                self.finish_node(
                    "struct_property",
                    property_start,
                    vec![(Some("name"), field_name), (Some("value"), value)],
                ),
            ));
        }

        self.expect_token(TokenKind::RBrace, "expected '}' after struct fields")?;
        Ok(self.finish_node("struct_instance", start, children))
    }

    /// Looks past the matching `)` for the `{` of a body, optionally after a
    /// return type.
    fn starts_anonymous_function(&self) -> bool {
        let mut depth = 0usize;
        let mut index = self.current;
        while let Some(token) = self.tokens.get(index) {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            index += 1;
        }

        match self.tokens.get(index + 1).map(|token| token.kind) {
            Some(TokenKind::LBrace) => true,
            Some(TokenKind::Identifier) => matches!(
                self.tokens.get(index + 2).map(|token| token.kind),
                Some(TokenKind::LBrace)
            ),
            Some(TokenKind::LBracket) => true,
            _ => false,
        }
    }

    fn parse_anonymous_function(&mut self) -> ParseResult<NodeId> {
        let start = self.peek().start;
        let parameters = self.parse_parameters()?;
        let mut children = vec![(Some("parameters"), parameters)];
        if !self.check(TokenKind::LBrace) {
            children.push((Some("return"), self.parse_type()?));
        }
        children.push((Some("body"), self.parse_block()?));
        Ok(self.finish_node("anonymous_function", start, children))
    }

    fn parse_collection(&mut self, start: usize) -> ParseResult<NodeId> {
        self.skip_newlines();
        if self.check(TokenKind::RBracket) {
            self.advance();
            return Ok(self.finish_node("list_value", start, Vec::new()));
        }
        if self.check(TokenKind::Colon) && self.peek_kind_at(1) == Some(TokenKind::RBracket) {
            self.advance();
            self.advance();
            return Ok(self.finish_node("map_value", start, Vec::new()));
        }
        if self.check(TokenKind::String) && self.peek_kind_at(1) == Some(TokenKind::Colon) {
            return self.parse_map_entries(start);
        }

        let mut items = Vec::new();
        loop {
            items.push((None, self.parse_expression()?));
            self.skip_newlines();
            if self.check(TokenKind::Comma) {
                self.advance();
                self.skip_newlines();
                if self.check(TokenKind::RBracket) {
                    break;
                }
            } else {
                break;
            }
        }

        self.expect_token(TokenKind::RBracket, "expected ']' after list items")?;
        Ok(self.finish_node("list_value", start, items))
    }

    fn parse_map_entries(&mut self, start: usize) -> ParseResult<NodeId> {
        let mut entries = Vec::new();
        loop {
            self.skip_newlines();
            let key_token = self.peek().clone();
            if key_token.kind != TokenKind::String {
                return Err(self.unexpected("expected a string map key"));
            }
            self.advance();
            let key = self.builder.leaf("string", key_token.range());
            self.expect_token(TokenKind::Colon, "expected ':' after map key")?;
            let value = self.parse_expression()?;
            entries.push((
                Some("entry"),
                self.finish_node(
                    "map_entry",
                    key_token.start,
                    vec![(Some("key"), key), (Some("value"), value)],
                ),
            ));

            self.skip_newlines();
            if self.check(TokenKind::Comma) {
                self.advance();
                self.skip_newlines();
                if self.check(TokenKind::RBracket) {
                    break;
                }
            } else {
                break;
            }
        }

        self.expect_token(TokenKind::RBracket, "expected ']' after map entries")?;
        Ok(self.finish_node("map_value", start, entries))
    }

    fn finish_call(&mut self, target: NodeId) -> ParseResult<NodeId> {
        let start = self.builder.range_of(target).start;
        let arguments_start = self.advance().start; // consume '('
        let previous_nesting = std::mem::replace(&mut self.nesting, 1);
        let previous_braced = std::mem::replace(&mut self.allow_braced_expressions, true);

        let mut arguments = Vec::new();
        let result = loop {
            self.skip_newlines();
            if self.check(TokenKind::RParen) {
                break Ok(());
            }
            match self.parse_expression() {
                Ok(argument) => arguments.push((None, argument)),
                Err(error) => break Err(error),
            }
            self.skip_newlines();
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break Ok(());
            }
        };

        self.nesting = previous_nesting;
        self.allow_braced_expressions = previous_braced;
        result?;

        self.expect_token(TokenKind::RParen, "expected ')' after arguments")?;
        let arguments = self.finish_node("arguments", arguments_start, arguments);
        Ok(self.finish_node(
            "function_call",
            start,
            vec![(Some("target"), target), (Some("arguments"), arguments)],
        ))
    }

    fn finish_member(&mut self, target: NodeId) -> ParseResult<NodeId> {
        let start = self.builder.range_of(target).start;
        self.advance(); // consume '.'
        let member = self.expect_identifier("expected a member name after '.'")?;
        Ok(self.finish_node(
            "member_access",
            start,
            vec![(Some("target"), target), (Some("member"), member)],
        ))
    }

    fn finish_node(
        &mut self,
        kind: &'static str,
        start: usize,
        children: Vec<(Option<&'static str>, NodeId)>,
    ) -> NodeId {
        let end = self.previous_end().max(start);
        self.builder.node(kind, start..end, children)
    }

    fn expect_identifier(&mut self, message: &str) -> ParseResult<NodeId> {
        let token = self.peek().clone();
        if token.kind != TokenKind::Identifier {
            return Err(self.unexpected(message));
        }
        self.advance();
        Ok(self.builder.leaf("identifier", token.range()))
    }

    fn expect_token(&mut self, expected: TokenKind, message: &str) -> ParseResult<()> {
        if self.check(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(message))
        }
    }

    fn expect_statement_end(&mut self) -> ParseResult<()> {
        match self.peek_kind() {
            TokenKind::Newline | TokenKind::Eof | TokenKind::RBrace => Ok(()),
            _ => Err(self.unexpected("expected a new line after the statement")),
        }
    }

    fn unexpected(&self, message: &str) -> ParseError {
        let token = self.peek();
        ParseError::Unexpected {
            message: message.to_string(),
            found: if token.kind == TokenKind::Eof {
                "end of input".to_string()
            } else {
                token.lexeme.escape_default().to_string()
            },
            line: token.line,
            column: token.column,
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Fields and variants may be separated by commas, newlines or both.
    fn skip_separators(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Comma) {
            self.advance();
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current.min(last)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_kind_at(&self, offset: usize) -> Option<TokenKind> {
        self.tokens
            .get(self.current + offset)
            .map(|token| token.kind)
    }

    fn previous_end(&self) -> usize {
        self.current
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
            .map(|token| token.end)
            .unwrap_or(0)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        let index = self.current.saturating_sub(1);
        &self.tokens[index]
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }
}

/// Byte ranges of the `{{ ... }}` sections inside a string's contents,
/// including the braces. Escaped characters are skipped.
fn interpolation_sections(source: &str, content: Range<usize>) -> Vec<Range<usize>> {
    let bytes = source.as_bytes();
    let mut sections = Vec::new();
    let mut index = content.start;

    while index + 1 < content.end {
        match bytes[index] {
            b'\\' => index += 2,
            b'{' if bytes[index + 1] == b'{' => {
                let open = index;
                let mut close = index + 2;
                while close + 1 < content.end && !(bytes[close] == b'}' && bytes[close + 1] == b'}') {
                    close += 1;
                }
                if close + 1 >= content.end {
                    break;
                }
                sections.push(open..close + 2);
                index = close + 2;
            }
            _ => index += 1,
        }
    }

    sections
}
