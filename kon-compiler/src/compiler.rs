use anyhow::{bail, Result};

use crate::ast::{Program, SourceSpan};
use crate::checker::Checker;
use crate::diagnostics::Diagnostics;
use crate::error::BuildError;
use crate::javascript::generate_javascript;
use crate::lexer::{Lexer, Token};
use crate::parser::{ParseError, Parser};
use crate::source::SourceFile;
use crate::syntax::{SyntaxNode, SyntaxTree};

#[derive(Debug, Default, Clone)]
pub struct CompileOptions {
    /// Keep the token stream on the [`Compilation`].
    pub dump_tokens: bool,
    /// Fail the compilation when the checker reports warnings.
    pub warnings_as_errors: bool,
}

#[derive(Debug)]
pub struct Compilation {
    pub program: Program,
    pub javascript: String,
    pub tree: SyntaxTree,
    pub tokens: Option<Vec<Token>>,
}

pub struct Compiler {
    diagnostics: Diagnostics,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            diagnostics: Diagnostics::new(),
            options,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    #[tracing::instrument(skip(self, source), fields(path = %source.path.display()))]
    pub fn compile(&mut self, source: &SourceFile) -> Result<Compilation> {
        let text = source.contents.as_str();
        let tokens = match Lexer::new(text).tokenize() {
            Ok(tokens) => tokens,
            Err(error) => {
                self.report_parse_error(&ParseError::from(error));
                bail!("Parsing failed");
            }
        };
        tracing::debug!(tokens = tokens.len(), "lexed source");

        let dumped = self.options.dump_tokens.then(|| tokens.clone());
        let tree = match Parser::new(text, tokens).parse() {
            Ok(tree) => tree,
            Err(error) => {
                self.report_parse_error(&error);
                bail!("Parsing failed");
            }
        };
        tracing::debug!(nodes = tree.len(), "parsed source");

        let (program, diagnostics) = match check_tree(&tree.root(), text) {
            Ok(checked) => checked,
            Err(error) => {
                self.report_build_error(&error);
                bail!("Building the AST failed");
            }
        };

        let failed = diagnostics.has_errors()
            || (self.options.warnings_as_errors && diagnostics.has_warnings());
        self.diagnostics.extend(diagnostics);
        if failed {
            tracing::debug!(diagnostics = self.diagnostics.len(), "type checking failed");
            bail!("Type checking failed");
        }

        let javascript = generate_javascript(&program);
        Ok(Compilation {
            program,
            javascript,
            tree,
            tokens: dumped,
        })
    }

    fn report_parse_error(&mut self, error: &ParseError) {
        self.diagnostics
            .push_with_location(error.to_string(), error.line(), error.column());
    }

    fn report_build_error(&mut self, error: &BuildError) {
        let position = error.position();
        self.diagnostics.push_error_with_span(
            error.to_string(),
            Some(SourceSpan::single_point(position.line, position.column)),
        );
    }
}

/// Checks any CST against `source`, returning the program together with
/// every diagnostic the checker collected.
pub fn check_tree<N: SyntaxNode>(
    root: &N,
    source: &str,
) -> Result<(Program, Diagnostics), BuildError> {
    let mut checker = Checker::new(source);
    let program = checker.check(root)?;
    Ok((program, checker.into_diagnostics()))
}

/// Parses `source` with the bundled parser and checks it. Parse failures
/// surface as an error.
pub fn check_source(source: &str) -> Result<(Program, Diagnostics)> {
    let tree = crate::parser::parse(source)?;
    Ok(check_tree(&tree.root(), source)?)
}
