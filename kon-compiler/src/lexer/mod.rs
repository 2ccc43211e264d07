use std::ops::Range;

use thiserror::Error;

use crate::source::LineIndex;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
    pub start: usize,
    pub end: usize,
}

impl Token {
    fn new(kind: TokenKind, lexeme: String, line: usize, column: usize, range: Range<usize>) -> Self {
        Self {
            kind,
            lexeme,
            line,
            column,
            start: range.start,
            end: range.end,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    /// A double-quoted string; the lexeme includes the quotes.
    String,
    Boolean,
    Keyword(Keyword),
    Newline,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,
    DotDot,
    DotDotDot,
    Equal,
    DoubleEqual,
    EqualPlus,
    EqualMinus,
    Bang,
    BangEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Let,
    Mut,
    Fn,
    Struct,
    Enum,
    While,
    For,
    In,
    Of,
    If,
    Else,
    And,
    Or,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Let => "let",
            Keyword::Mut => "mut",
            Keyword::Fn => "fn",
            Keyword::Struct => "struct",
            Keyword::Enum => "enum",
            Keyword::While => "while",
            Keyword::For => "for",
            Keyword::In => "in",
            Keyword::Of => "of",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::And => "and",
            Keyword::Or => "or",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexerError {
    #[error("Unexpected character '{character}' at line {line}, column {column}")]
    UnexpectedCharacter {
        character: char,
        line: usize,
        column: usize,
    },
    #[error("Unterminated string literal starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },
}

impl LexerError {
    pub fn line(&self) -> usize {
        match self {
            LexerError::UnexpectedCharacter { line, .. }
            | LexerError::UnterminatedString { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            LexerError::UnexpectedCharacter { column, .. }
            | LexerError::UnterminatedString { column, .. } => *column,
        }
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    end: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            end: input.len(),
            line: 1,
            column: 1,
        }
    }

    /// Lexes only `range` of `input`, keeping byte offsets and positions
    /// relative to the whole text. Used for expressions embedded in strings.
    pub fn with_range(input: &'a str, range: Range<usize>) -> Self {
        let start = LineIndex::new(input).position(range.start);
        Self {
            input,
            position: range.start,
            end: range.end.min(input.len()),
            line: start.line,
            column: start.column,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            match ch {
                ' ' | '\t' | '\r' => {
                    self.advance_char();
                }
                '\n' => tokens.push(self.simple_token(TokenKind::Newline)),
                '/' if self.peek_next_char() == Some('/') => self.skip_comment(),
                '"' => tokens.push(self.lex_string()?),
                '0'..='9' => tokens.push(self.lex_number()),
                'a'..='z' | 'A'..='Z' | '_' => tokens.push(self.lex_identifier_or_keyword()),
                '(' => tokens.push(self.simple_token(TokenKind::LParen)),
                ')' => tokens.push(self.simple_token(TokenKind::RParen)),
                '{' => tokens.push(self.simple_token(TokenKind::LBrace)),
                '}' => tokens.push(self.simple_token(TokenKind::RBrace)),
                '[' => tokens.push(self.simple_token(TokenKind::LBracket)),
                ']' => tokens.push(self.simple_token(TokenKind::RBracket)),
                ',' => tokens.push(self.simple_token(TokenKind::Comma)),
                ':' => tokens.push(self.simple_token(TokenKind::Colon)),
                '.' => tokens.push(self.lex_dot_variants()),
                '=' => tokens.push(self.lex_equals_variants()),
                '!' => tokens.push(self.lex_pair('=', TokenKind::Bang, TokenKind::BangEqual)),
                '>' => tokens.push(self.lex_pair('=', TokenKind::Greater, TokenKind::GreaterEqual)),
                '<' => tokens.push(self.lex_pair('=', TokenKind::Less, TokenKind::LessEqual)),
                '+' => tokens.push(self.simple_token(TokenKind::Plus)),
                '-' => tokens.push(self.simple_token(TokenKind::Minus)),
                '*' => tokens.push(self.simple_token(TokenKind::Star)),
                '/' => tokens.push(self.simple_token(TokenKind::Slash)),
                '%' => tokens.push(self.simple_token(TokenKind::Percent)),
                other => {
                    return Err(LexerError::UnexpectedCharacter {
                        character: other,
                        line: self.line,
                        column: self.column,
                    });
                }
            }
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
            self.position..self.position,
        ));

        Ok(tokens)
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == '\n' {
                break;
            }
            self.advance_char();
        }
    }

    fn lex_string(&mut self) -> Result<Token, LexerError> {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;
        self.advance_char(); // opening quote

        while let Some(ch) = self.peek_char() {
            match ch {
                '"' => {
                    self.advance_char();
                    return Ok(self.token_from(TokenKind::String, start, start_line, start_column));
                }
                '\\' => {
                    self.advance_char();
                    if self.advance_char().is_none() {
                        break;
                    }
                }
                '\n' => break,
                _ => {
                    self.advance_char();
                }
            }
        }

        Err(LexerError::UnterminatedString {
            line: start_line,
            column: start_column,
        })
    }

    fn lex_number(&mut self) -> Token {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;
        let mut seen_dot = false;

        while let Some(ch) = self.peek_char() {
            match ch {
                '0'..='9' => {
                    self.advance_char();
                }
                // `0..10` is a range, not a decimal.
                '.' if !seen_dot && matches!(self.peek_next_char(), Some('0'..='9')) => {
                    seen_dot = true;
                    self.advance_char();
                }
                _ => break,
            }
        }

        self.token_from(TokenKind::Number, start, start_line, start_column)
    }

    fn lex_identifier_or_keyword(&mut self) -> Token {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance_char();
            } else {
                break;
            }
        }

        let kind = match &self.input[start..self.position] {
            "true" | "false" => TokenKind::Boolean,
            lexeme => keyword_from_lexeme(lexeme)
                .map(TokenKind::Keyword)
                .unwrap_or(TokenKind::Identifier),
        };
        self.token_from(kind, start, start_line, start_column)
    }

    fn lex_dot_variants(&mut self) -> Token {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;
        self.advance_char();

        let kind = if self.peek_char() == Some('.') {
            self.advance_char();
            if self.peek_char() == Some('.') {
                self.advance_char();
                TokenKind::DotDotDot
            } else {
                TokenKind::DotDot
            }
        } else {
            TokenKind::Dot
        };
        self.token_from(kind, start, start_line, start_column)
    }

    fn lex_equals_variants(&mut self) -> Token {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;
        self.advance_char();

        let kind = match self.peek_char() {
            Some('=') => TokenKind::DoubleEqual,
            Some('+') => TokenKind::EqualPlus,
            Some('-') => TokenKind::EqualMinus,
            _ => return self.token_from(TokenKind::Equal, start, start_line, start_column),
        };
        self.advance_char();
        self.token_from(kind, start, start_line, start_column)
    }

    fn lex_pair(&mut self, next: char, single: TokenKind, double: TokenKind) -> Token {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;
        self.advance_char();

        let kind = if self.peek_char() == Some(next) {
            self.advance_char();
            double
        } else {
            single
        };
        self.token_from(kind, start, start_line, start_column)
    }

    fn simple_token(&mut self, kind: TokenKind) -> Token {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;
        self.advance_char();
        self.token_from(kind, start, start_line, start_column)
    }

    fn token_from(&self, kind: TokenKind, start: usize, line: usize, column: usize) -> Token {
        Token::new(
            kind,
            self.input[start..self.position].to_string(),
            line,
            column,
            start..self.position,
        )
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..self.end].chars().next()
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut iter = self.input[self.position..self.end].chars();
        iter.next()?;
        iter.next()
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }
}

fn keyword_from_lexeme(lexeme: &str) -> Option<Keyword> {
    match lexeme {
        "let" => Some(Keyword::Let),
        "mut" => Some(Keyword::Mut),
        "fn" => Some(Keyword::Fn),
        "struct" => Some(Keyword::Struct),
        "enum" => Some(Keyword::Enum),
        "while" => Some(Keyword::While),
        "for" => Some(Keyword::For),
        "in" => Some(Keyword::In),
        "of" => Some(Keyword::Of),
        "if" => Some(Keyword::If),
        "else" => Some(Keyword::Else),
        "and" => Some(Keyword::And),
        "or" => Some(Keyword::Or),
        _ => None,
    }
}
