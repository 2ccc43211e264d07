use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use kon_compiler::{
    CompileOptions, Compiler, Diagnostic, DiagnosticLevel, Diagnostics, SourceFile, SourceId,
    SourceSpan,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "KON_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    Tokens,
    Cst,
    Ast,
    Js,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
}

#[derive(Parser)]
#[command(
    name = "kon",
    version,
    about = "Compile Kon source files to JavaScript."
)]
struct Cli {
    /// Log compiler stages to stderr (overrides KON_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a Kon file and print or write the generated JavaScript.
    Build(BuildArgs),
    /// Type check a Kon file without generating output.
    Check(CheckArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Path to a Kon source file.
    input: PathBuf,

    /// Write the JavaScript here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Print intermediate output (`tokens`, `cst`, `ast`, `js`).
    #[arg(long, value_enum)]
    emit: Vec<Emit>,

    /// Treat warnings as errors.
    #[arg(long)]
    warnings_as_errors: bool,
}

#[derive(Args)]
struct CheckArgs {
    /// Path to a Kon source file.
    input: PathBuf,

    /// How diagnostics are reported.
    #[arg(long, value_enum, default_value = "human")]
    format: Format,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build(args) => run_build(args),
        Command::Check(args) => run_check(args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_source(input: &Path) -> Result<SourceFile> {
    let contents =
        fs::read_to_string(input).with_context(|| format!("Failed to read {:?}", input))?;
    Ok(SourceFile::new(SourceId(0), input.to_path_buf(), contents))
}

fn run_build(args: BuildArgs) -> Result<()> {
    let source = read_source(&args.input)?;
    let line_cache: Vec<&str> = source.contents.lines().collect();
    let mut compiler = Compiler::new(CompileOptions {
        dump_tokens: args.emit.contains(&Emit::Tokens),
        warnings_as_errors: args.warnings_as_errors,
    });

    let compilation = match compiler.compile(&source) {
        Ok(compilation) => compilation,
        Err(err) => {
            print_diagnostics(&source, &line_cache, compiler.diagnostics());
            return Err(err.context("Compilation failed"));
        }
    };
    print_diagnostics(&source, &line_cache, compiler.diagnostics());

    if let Some(tokens) = &compilation.tokens {
        for token in tokens {
            println!(
                "{}:{} {:?} {:?}",
                token.line, token.column, token.kind, token.lexeme
            );
        }
    }
    if args.emit.contains(&Emit::Cst) {
        println!("{}", compilation.tree.to_sexp());
    }
    if args.emit.contains(&Emit::Ast) {
        println!("{:#?}", compilation.program);
    }

    match &args.output {
        Some(output) => {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create {:?}", parent))?;
                }
            }
            fs::write(output, &compilation.javascript)
                .with_context(|| format!("Failed to write {:?}", output))?;
            tracing::debug!(path = %output.display(), "wrote javascript");
            if args.emit.contains(&Emit::Js) {
                print!("{}", compilation.javascript);
            }
        }
        None => {
            let extra_only = !args.emit.is_empty() && !args.emit.contains(&Emit::Js);
            if !extra_only {
                print!("{}", compilation.javascript);
            }
        }
    }

    Ok(())
}

fn run_check(args: CheckArgs) -> Result<()> {
    let source = read_source(&args.input)?;
    let mut compiler = Compiler::new(CompileOptions::default());
    let result = compiler.compile(&source);

    match args.format {
        Format::Human => {
            let line_cache: Vec<&str> = source.contents.lines().collect();
            print_diagnostics(&source, &line_cache, compiler.diagnostics());
        }
        Format::Json => {
            let report = json!({
                "path": source.path.display().to_string(),
                "ok": result.is_ok(),
                "diagnostics": compiler.diagnostics().entries(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    match result {
        Ok(_) => Ok(()),
        Err(err) => bail!("{} in {}", err, source.path.display()),
    }
}

fn print_diagnostics(source: &SourceFile, lines: &[&str], diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        return;
    }
    eprintln!("Diagnostics:");
    for diagnostic in diagnostics.entries() {
        print_diagnostic(source, lines, diagnostic);
    }
}

fn print_diagnostic(source: &SourceFile, lines: &[&str], diagnostic: &Diagnostic) {
    let (level_label, marker) = match diagnostic.level {
        DiagnosticLevel::Error => ("error", "  -"),
        DiagnosticLevel::Warning => ("warning", "  ~"),
    };
    eprintln!("{} {}: {}", marker, level_label, diagnostic.message);
    let Some(span) = diagnostic.span else {
        return;
    };
    eprintln!(
        "     --> {}:{}:{}",
        source.path.display(),
        span.line,
        span.column
    );

    let Some(raw_line) = lines.get(span.line.saturating_sub(1)) else {
        return;
    };
    let display_line = raw_line.replace('\t', "    ");
    eprintln!("      {}", display_line);
    eprintln!("      {}", caret_line(raw_line, span));
}

/// Underlines the span on its first line, expanding tabs the same way the
/// printed source line does.
fn caret_line(raw_line: &str, span: SourceSpan) -> String {
    let mut carets = String::new();
    for ch in raw_line.chars().take(span.column.saturating_sub(1)) {
        match ch {
            '\t' => carets.push_str("    "),
            _ => carets.push(' '),
        }
    }

    let width = if span.end_line == span.line {
        span.end_column.saturating_sub(span.column).saturating_add(1)
    } else {
        raw_line
            .chars()
            .count()
            .saturating_sub(span.column.saturating_sub(1))
    };
    carets.push_str(&"^".repeat(width.max(1)));
    carets
}
