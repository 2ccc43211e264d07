use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn kon_binary() -> &'static str {
    env!("CARGO_BIN_EXE_kon")
}

fn run_build(script: &Path, extra: &[&str]) -> Output {
    Command::new(kon_binary())
        .arg("build")
        .arg(script)
        .args(extra)
        .env_remove("KON_LOG")
        .output()
        .expect("run kon build")
}

#[test]
fn prints_javascript_to_stdout() {
    let tmp = tempdir().expect("tempdir");
    let script = tmp.path().join("main.kon");
    fs::write(&script, "fn add(x: Num, y: Num) Num { x + y }\nlet total = add(1, 2)\n")
        .expect("write script");

    let output = run_build(&script, &[]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        "function add(x, y) {\n  return x + y\n}\nconst total = add(1, 2)\n"
    );
    assert!(output.stderr.is_empty());
}

#[test]
fn writes_javascript_to_the_output_path() {
    let tmp = tempdir().expect("tempdir");
    let script = tmp.path().join("colors.kon");
    fs::write(&script, "enum Color { Red, Green }\n").expect("write script");
    let target = tmp.path().join("dist").join("colors.js");

    let output = run_build(&script, &["--output", target.to_str().expect("utf-8 path")]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty(), "nothing should reach stdout");

    let written = fs::read_to_string(&target).expect("read output");
    assert_eq!(
        written,
        "const Color = Object.freeze({\n  Red: Object.freeze({ index: 0 }),\n  Green: Object.freeze({ index: 1 })\n})\n"
    );
}

#[test]
fn type_errors_fail_with_a_caret_diagnostic() {
    let tmp = tempdir().expect("tempdir");
    let script = tmp.path().join("bad.kon");
    fs::write(&script, "let name: Str = false\n").expect("write script");

    let output = run_build(&script, &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("  - error: Type mismatch: expected Str, got Bool"),
        "expected the mismatch message, got: {stderr}"
    );
    assert!(
        stderr.contains("bad.kon:1:17"),
        "expected a location, got: {stderr}"
    );
    assert!(
        stderr.contains("      let name: Str = false"),
        "expected the source line, got: {stderr}"
    );
    let carets = format!("      {}^^^^^\n", " ".repeat(16));
    assert!(
        stderr.contains(&carets),
        "expected carets under the value, got: {stderr}"
    );
    assert!(stderr.contains("Type checking failed"));
}

#[test]
fn parse_errors_are_reported_with_a_location() {
    let tmp = tempdir().expect("tempdir");
    let script = tmp.path().join("broken.kon");
    fs::write(&script, "let = 4\n").expect("write script");

    let output = run_build(&script, &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken.kon:1:5"), "got: {stderr}");
    assert!(stderr.contains("Parsing failed"), "got: {stderr}");
}

#[test]
fn warnings_pass_unless_promoted() {
    let tmp = tempdir().expect("tempdir");
    let script = tmp.path().join("pet.kon");
    fs::write(
        &script,
        "struct Pet { name: Str }\nlet rex = Pet{ name: \"Rex\", legs: 4 }\n",
    )
    .expect("write script");

    let lenient = run_build(&script, &[]);
    assert!(lenient.status.success());
    let stderr = String::from_utf8_lossy(&lenient.stderr);
    assert!(
        stderr.contains("  ~ warning: Struct 'Pet' does not have a field named legs"),
        "got: {stderr}"
    );

    let strict = run_build(&script, &["--warnings-as-errors"]);
    assert!(!strict.status.success());
    assert!(strict.stdout.is_empty());
}

#[test]
fn emits_intermediate_stages() {
    let tmp = tempdir().expect("tempdir");
    let script = tmp.path().join("stages.kon");
    fs::write(&script, "let x = 1\n").expect("write script");

    let output = run_build(&script, &["--emit", "cst", "--emit", "ast"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(source_file"), "got: {stdout}");
    assert!(stdout.contains("VariableDeclaration"), "got: {stdout}");
    assert!(
        !stdout.contains("const x = 1"),
        "javascript is only printed when requested alongside other stages"
    );

    let output = run_build(&script, &["--emit", "tokens", "--emit", "js"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1:1 Keyword(Let) \"let\""), "got: {stdout}");
    assert!(stdout.ends_with("const x = 1\n"), "got: {stdout}");
}

#[test]
fn missing_input_is_an_error() {
    let tmp = tempdir().expect("tempdir");
    let output = run_build(&tmp.path().join("nope.kon"), &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read"), "got: {stderr}");
}
