use kon_compiler::{check_source, generate_javascript};
use pretty_assertions::assert_eq;

fn emit(input: &str) -> String {
    let (program, _) = check_source(input).expect("source should parse");
    generate_javascript(&program)
}

fn assert_generates(input: &str, expected: &str) {
    assert_eq!(emit(input).trim(), expected.trim());
}

#[test]
fn literal_expressions() {
    assert_generates("let x = 42\nlet y = x", "const x = 42\nconst y = x");
    assert_generates(r#""foobar""#, r#""foobar""#);
    assert_generates(r#""foobar {{ 42 }}""#, "`foobar ${42}`");
    assert_generates("42", "42");
    assert_generates("false", "false");
    assert_generates("[1, 2, 3]", "[1, 2, 3]");
    assert_generates(
        r#"["jane": 1, "joe": 2]"#,
        r#"new Map([["jane", 1], ["joe", 2]])"#,
    );
}

#[test]
fn binary_expressions() {
    let cases = [
        ("42 + 20", "42 + 20"),
        ("42 - 20", "42 - 20"),
        ("42 * 20", "42 * 20"),
        ("42 / 2", "42 / 2"),
        ("42 % 2", "42 % 2"),
        ("(70 - 32) * 5 / 9", "(70 - 32) * 5 / 9"),
        ("42 == 42", "42 === 42"),
        ("42 != 42", "42 !== 42"),
        ("true or false", "true || false"),
        ("true and false", "true && false"),
        ("20 < 100", "20 < 100"),
        ("20 <= 100", "20 <= 100"),
        ("20 > 100", "20 > 100"),
        ("20 >= 100", "20 >= 100"),
    ];
    for (input, expected) in cases {
        assert_generates(input, expected);
    }
}

#[test]
fn unary_expressions() {
    assert_generates("-42", "-42");
    assert_generates("!true", "!true");
}

#[test]
fn function_declarations() {
    assert_generates("fn noop() {}", "function noop() {}");
    assert_generates("fn add(x: Num, y: Num) {}", "function add(x, y) {}");
    assert_generates("fn add(x: Num, y: Num) Num {}", "function add(x, y) {}");
    assert_generates(
        "fn add(x: Num, y: Num) Num { x + y }",
        "function add(x, y) {\n  return x + y\n}",
    );
    assert_generates(
        "fn add(x: Num, y: Num) Num {\n  let result = x + y\n\tresult\n}",
        "function add(x, y) {\n  const result = x + y\n  return result\n}",
    );
}

#[test]
fn anonymous_functions() {
    assert_generates("() {}", "() => {}");
    assert_generates(
        "(one, two) { one / two }",
        "(one, two) => {\n  return one / two\n}",
    );
}

#[test]
fn variable_declarations() {
    let cases = [
        (r#"mut explicit: Str = "Alice""#, r#"let explicit = "Alice""#),
        (r#"let explicit = "Alice""#, r#"const explicit = "Alice""#),
        ("mut power = 200", "let power = 200"),
        ("let power = 200", "const power = 200"),
        ("mut is_valid = true", "let is_valid = true"),
        ("let is_valid = false", "const is_valid = false"),
    ];
    for (input, expected) in cases {
        assert_generates(input, expected);
    }
}

#[test]
fn variable_assignments() {
    assert_generates(
        "mut name = \"Alice\"\nname = \"Bob\"",
        "let name = \"Alice\"\nname = \"Bob\"",
    );
    assert_generates(
        "mut x = 10\nx =+ 5\nx =- 5",
        "let x = 10\nx += 5\nx -= 5",
    );
}

#[test]
fn structs() {
    assert_generates("struct Foo {}\nlet a_foo = Foo{}", "const a_foo = {}");
    assert_generates(
        "struct Person { name: Str, age: Num, employed: Bool }\nPerson{ name: \"Joe\", age: 42, employed: true }",
        "{ name: \"Joe\", age: 42, employed: true }",
    );
}

#[test]
fn struct_fields_follow_definition_order() {
    assert_generates(
        "struct Point { x: Num, y: Num }\nPoint{ y: 2, x: 1 }",
        "{ x: 1, y: 2 }",
    );
}

#[test]
fn enums() {
    assert_generates(
        "enum Color { Red, Green, Yellow }",
        "const Color = Object.freeze({\n  Red: Object.freeze({ index: 0 }),\n  Green: Object.freeze({ index: 1 }),\n  Yellow: Object.freeze({ index: 2 })\n})",
    );
}

#[test]
fn enum_variants_are_member_accesses() {
    assert_generates(
        "enum Color { Red, Green }\nlet c = Color.Green",
        "const Color = Object.freeze({\n  Red: Object.freeze({ index: 0 }),\n  Green: Object.freeze({ index: 1 })\n})\nconst c = Color.Green",
    );
}

#[test]
fn while_loops() {
    assert_generates("while true { 20 }", "while (true) {\n  20\n}");
}

#[test]
fn for_loops() {
    assert_generates(
        "for i in 10 { i }",
        "for (let i = 0; i < 10; i++) {\n  i\n}",
    );
    assert_generates(
        "for num in 0..10 { num }",
        "for (let num = 0; num < 10; num++) {\n  num\n}",
    );
    assert_generates(
        r#"for name in ["jane", "joe"] { name }"#,
        "for (const name of [\"jane\", \"joe\"]) {\n  name\n}",
    );
    assert_generates(
        "let msg = \"hello world\"\nfor char in msg { char }",
        "const msg = \"hello world\"\nfor (const char of msg) {\n  char\n}",
    );
}

#[test]
fn inclusive_ranges_compare_with_less_or_equal() {
    assert_generates(
        "for i in 1...3 { i }",
        "for (let i = 1; i <= 3; i++) {\n  i\n}",
    );
}

#[test]
fn counting_loops_and_zero_based_ranges_share_a_header() {
    let count = emit("for i in 10 { i }");
    let range = emit("for i in 0..10 { i }");
    assert_eq!(count, range);
}

#[test]
fn nested_blocks_indent_two_spaces_per_level() {
    assert_generates(
        "fn outer() {\n  for i in 3 {\n    while false { i }\n  }\n}",
        "function outer() {\n  for (let i = 0; i < 3; i++) {\n    while (false) {\n      i\n    }\n  }\n}",
    );
}

#[test]
fn calls_and_member_calls() {
    assert_generates(
        "fn double(n: Num) Num { n * 2 }\ndouble(4)",
        "function double(n) {\n  return n * 2\n}\ndouble(4)",
    );
    assert_generates(
        "mut names = [\"a\"]\nnames.push(\"b\")\nnames.length",
        "let names = [\"a\"]\nnames.push(\"b\")\nnames.length",
    );
}

#[test]
fn interpolated_literal_text_stays_inert() {
    assert_generates(
        "let x = 1\nlet s = \"${x} {{ 2 }}\"",
        "const x = 1\nconst s = `\\${x} ${2}`",
    );
    assert_generates(r#""`tick` {{ 1 }}""#, r"`\`tick\` ${1}`");
}

#[test]
fn interpolation_mixes_literals_and_expressions() {
    assert_generates(
        "let name = \"Kon\"\n\"hi {{ name }}, you are {{ 1 + 2 }}\"",
        "const name = \"Kon\"\n`hi ${name}, you are ${1 + 2}`",
    );
}

#[test]
fn regenerating_a_program_is_byte_identical() {
    let source = "enum Color { Red, Green, Yellow }\nfn add(x: Num, y: Num) Num { x + y }\nfor i in 0..3 { add(i, 1) }";
    let (program, diagnostics) = check_source(source).expect("source should parse");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.messages());
    assert_eq!(generate_javascript(&program), generate_javascript(&program));
}
