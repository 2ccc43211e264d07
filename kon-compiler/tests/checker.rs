use kon_compiler::{
    check_source, DiagnosticLevel, Diagnostics, ExpressionKind, Iteration, Program, Statement,
    StaticType,
};
use pretty_assertions::assert_eq;

fn check(source: &str) -> (Program, Diagnostics) {
    check_source(source).expect("source should parse and build")
}

fn messages(source: &str) -> Vec<String> {
    let (_, diagnostics) = check(source);
    diagnostics
        .messages()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn assert_clean(source: &str) {
    let found = messages(source);
    assert!(found.is_empty(), "expected no diagnostics, found {found:?}");
}

fn assert_single(source: &str, expected: &str) {
    assert_eq!(messages(source), vec![expected.to_string()]);
}

#[test]
fn valid_programs_produce_no_diagnostics() {
    assert_clean("let name = \"Alice\"");
    assert_clean("mut count: Num = 0\ncount =+ 2\ncount =- 1\ncount = 7");
    assert_clean("let names: [Str] = []\nlet ages: [Str:Num] = [\"jane\": 1]");
    assert_clean("struct Person { name: Str, age: Num }\nlet joe = Person{ name: \"Joe\", age: 3 }\njoe.name");
    assert_clean("enum Color { Red, Green }\nlet c: Color = Color.Red");
    assert_clean("fn fib(n: Num) Num { fib(n - 1) + fib(n - 2) }");
    assert_clean("mut xs = [1, 2]\nxs.push(3)\nlet n: Num = xs.length\nlet first: Num = xs.at(0)");
    assert_clean("let greeting = \"hi\"\nlet shout: Str = greeting.trim()\ngreeting.length > 1");
    assert_clean("while 1 < 2 { let x = !false }");
    assert_clean("for c in \"abc\" { let s: Str = c }");
}

#[test]
fn declared_type_mismatches_point_at_the_value() {
    let (_, diagnostics) = check("let name: Str = false");
    let diagnostic = &diagnostics.entries()[0];
    assert_eq!(diagnostic.message, "Type mismatch: expected Str, got Bool");
    let span = diagnostic.span.expect("span");
    assert_eq!((span.line, span.column, span.end_line, span.end_column), (1, 17, 1, 21));

    let (_, diagnostics) = check("let name: Num = \"Alice\"");
    let span = diagnostics.entries()[0].span.expect("span");
    assert_eq!(diagnostics.messages(), vec!["Type mismatch: expected Num, got Str"]);
    assert_eq!((span.column, span.end_column), (17, 23));

    let (_, diagnostics) = check("let is_bool: Bool = \"Alice\"");
    let span = diagnostics.entries()[0].span.expect("span");
    assert_eq!(diagnostics.messages(), vec!["Type mismatch: expected Bool, got Str"]);
    assert_eq!((span.column, span.end_column), (21, 27));
}

#[test]
fn numbers_are_not_strings() {
    assert_single("let x: Str = 42", "Type mismatch: expected Str, got Num");
}

#[test]
fn reserved_words_cannot_be_bound() {
    assert_single("let while = 1", "'while' is a reserved keyword");
}

#[test]
fn annotations_must_resolve() {
    assert_single("let p: Person = 1", "Missing definition for type 'Person'");
    assert_single("let m: [Num:Str] = [:]", "Map keys must be 'Str'");
}

#[test]
fn assignment_rules() {
    assert_single("mut x = \"a\"\nx =+ 1", "'=+' can only be used with 'Num'");
    assert_single("mut x = \"a\"\nx =- 1", "'=-' can only be used with 'Num'");
    assert_single("let x = 0\nx = 1", "'x' is not mutable");
    assert_single("y = 1", "Undefined: 'y'");
    assert_single("mut x = 1\nx = \"one\"", "Expected a 'Num' and received 'Str'");
    assert_single("mut x = 1\nx =+ true", "Expected a 'Num' and received 'Bool'");
}

#[test]
fn empty_maps_fit_any_map_annotation() {
    assert_clean("let ages: [Str:Num] = [:]");
    assert_clean("mut ages = [\"a\": 1]\nages = [:]");
}

#[test]
fn assigning_an_empty_list_to_a_list_binding_is_allowed() {
    assert_clean("mut xs = [1]\nxs = []");
}

#[test]
fn binary_operator_rules() {
    assert_single(
        "1 + \"a\"",
        "The '+' operator can only be used between instances of 'Num'",
    );
    assert_single(
        "true < false",
        "The '<' operator can only be used between instances of 'Num'",
    );
    assert_single(
        "1 and true",
        "The 'and' operator can only be used between instances of 'Bool'",
    );
    assert_single(
        "1 == \"1\"",
        "The '==' operator can only be used between instances of 'Num', 'Str', or 'Bool'",
    );
}

#[test]
fn binary_errors_do_not_cascade() {
    assert_single(
        "let x: Num = (1 + true) * 2",
        "The '+' operator can only be used between instances of 'Num'",
    );
    assert_single("missing + 1", "Undefined: 'missing'");
}

#[test]
fn operator_errors_keep_the_result_type() {
    assert_eq!(
        messages("let x: Num = -false"),
        vec![
            "The '-' operator can only be used on 'Num'",
            "Type mismatch: expected Num, got Bool",
        ]
    );
    assert_eq!(
        messages("let x: Str = 1 + true"),
        vec![
            "The '+' operator can only be used between instances of 'Num'",
            "Type mismatch: expected Str, got Num",
        ]
    );
    assert_eq!(
        messages("let ok: Num = 1 < \"two\""),
        vec![
            "The '<' operator can only be used between instances of 'Num'",
            "Type mismatch: expected Num, got Bool",
        ]
    );
}

#[test]
fn unary_operator_rules() {
    let (_, diagnostics) = check("-false");
    assert_eq!(
        diagnostics.messages(),
        vec!["The '-' operator can only be used on 'Num'"]
    );
    let span = diagnostics.entries()[0].span.expect("span");
    assert_eq!((span.line, span.column, span.end_column), (1, 1, 1));

    assert_single("!\"foo\"", "The '!' operator can only be used on 'Bool'");
    assert_clean("let negative_number = -30");
}

#[test]
fn ranges_outside_loops_are_rejected() {
    assert_single("let r = 0..10", "Ranges can only be used in 'for' loops");
    assert_single(
        "for i in 0..\"ten\" { i }",
        "The '..' operator can only be used between instances of 'Num'",
    );
}

#[test]
fn struct_fields_may_refer_to_the_struct() {
    assert_clean("struct Node { next: [Node] }");
    assert_clean(
        "struct Node { value: Num, next: [Node] }\nlet n = Node{ value: 1, next: [] }\nfor m in n.next { let v: Num = m.value }",
    );
}

#[test]
fn struct_definitions_report_nothing() {
    assert_clean("struct Pet { owner: Person, tags: [Str:Tag] }");
    assert_clean("struct Odd { lookup: [Num:Str] }");
}

#[test]
fn loop_rules() {
    assert_single("while 1 { 2 }", "Expected a 'Bool' and received 'Num'");
    assert_single("for x in true { x }", "Cannot iterate over a 'Bool'");
    assert_single(
        "let m = [\"a\": 1]\nfor x in m { x }",
        "Cannot iterate over a '[Str:Num]'",
    );
}

#[test]
fn loop_cursors_take_the_element_type() {
    let (program, diagnostics) = check("for name in [\"jane\"] { let n: Num = name }");
    assert_eq!(
        diagnostics.messages(),
        vec!["Type mismatch: expected Num, got Str"]
    );
    match &program.statements[0] {
        Statement::For(for_loop) => assert!(matches!(for_loop.iteration, Iteration::Each(_))),
        other => panic!("expected a for loop, got {other:?}"),
    }
}

#[test]
fn parenthesised_ranges_still_drive_the_loop() {
    let (program, diagnostics) = check("for i in (1...3) { i }");
    assert!(diagnostics.is_empty());
    match &program.statements[0] {
        Statement::For(for_loop) => {
            assert!(matches!(
                for_loop.iteration,
                Iteration::Range {
                    inclusive: true,
                    ..
                }
            ));
        }
        other => panic!("expected a for loop, got {other:?}"),
    }
}

#[test]
fn collection_literals_are_homogeneous() {
    assert_single("[1, \"two\"]", "List elements must all be 'Num', got 'Str'");
    assert_single(
        "[\"a\": 1, \"b\": true]",
        "Map values must all be 'Num', got 'Bool'",
    );
}

#[test]
fn struct_instances_report_missing_fields_once() {
    assert_single(
        "struct Person { name: Str, age: Num }\nPerson{ name: \"Joe\" }",
        "Missing fields for struct 'Person': age.",
    );
    assert_single(
        "struct Person { name: Str, age: Num }\nPerson{}",
        "Missing fields for struct 'Person': name, age.",
    );
}

#[test]
fn struct_instance_field_rules() {
    assert_single("Ghost{}", "Missing definition for type 'Ghost'");
    assert_single(
        "struct Pet { name: Str }\nPet{ name: 1 }",
        "Type mismatch: expected Str, got Num",
    );

    let (_, diagnostics) = check("struct Pet { name: Str }\nPet{ name: \"Rex\", legs: 4 }");
    assert_eq!(
        diagnostics.messages(),
        vec!["Struct 'Pet' does not have a field named legs"]
    );
    assert_eq!(diagnostics.entries()[0].level, DiagnosticLevel::Warning);
    assert!(!diagnostics.has_errors());
}

#[test]
fn struct_field_access() {
    assert_single(
        "struct Pet { name: Str }\nlet rex = Pet{ name: \"Rex\" }\nrex.age",
        "Struct 'Pet' does not have a field named age",
    );
    assert_single(
        "struct Pet { name: Str }\nlet rex = Pet{ name: \"Rex\" }\nlet n: Num = rex.name",
        "Type mismatch: expected Num, got Str",
    );
}

#[test]
fn enum_variants() {
    let (program, diagnostics) = check("enum Color { Red, Green }\nlet c = Color.Green");
    assert!(diagnostics.is_empty());
    match &program.statements[1] {
        Statement::VariableDeclaration(declaration) => {
            assert!(matches!(&declaration.ty, StaticType::Enum(e) if e.name == "Color"));
        }
        other => panic!("expected a declaration, got {other:?}"),
    }
    assert_single(
        "enum Color { Red }\nColor.Blue",
        "Enum 'Color' does not have a variant named Blue",
    );
}

#[test]
fn member_rules() {
    assert_single("let xs = [1]\nxs.shuffle()", "'shuffle' is not a member of '[Num]'");
    assert_single(
        "let xs = [1]\nxs.push(2)",
        "Cannot mutate immutable 'xs' with '.push()'",
    );
    assert_single("mut xs = [1]\nxs.length()", "'length' is not callable");
    assert_single("mut xs = [1]\nxs.push(\"a\")", "Type mismatch: expected Num, got Str");
    assert_single("mut xs = [1]\nxs.push()", "Expected 1 arguments, got 0");
    assert_single(
        "mut ages = [\"a\": 1]\nages.set(\"b\", \"two\")",
        "Type mismatch: expected Num, got Str",
    );
    assert_clean("\"x\".length");
}

#[test]
fn members_on_unknown_bindings() {
    assert_single(
        "fn f(x) { x.length }",
        "The type of 'x' is unknown.",
    );
    assert_single("ghost.length", "Undefined: 'ghost'");
}

#[test]
fn identifiers_must_be_declared() {
    assert_single("let y = x", "Undefined: 'x'");
}

#[test]
fn redeclaration_in_the_same_scope_overwrites() {
    let (program, diagnostics) = check("let x = 1\nlet x = \"one\"\nlet y: Str = x");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.messages());
    assert_eq!(program.statements.len(), 3);
}

#[test]
fn block_scopes_shadow_and_end() {
    assert_clean("let x = 1\nwhile true { let x = \"inner\"\nlet s: Str = x }\nlet n: Num = x");
    assert_single("for i in 3 { let inside = i }\ninside", "Undefined: 'inside'");
}

#[test]
fn trailing_comments_are_ignored() {
    let (program, diagnostics) = check("// leading\nlet x = 1 // trailing\n");
    assert!(diagnostics.is_empty());
    assert_eq!(program.statements.len(), 1);
}

#[test]
fn interpolated_expressions_are_checked() {
    assert_single("\"hello {{ nobody }}\"", "Undefined: 'nobody'");
    let (program, _) = check("\"a{{ 1 }}b\"");
    let expression = program.statements[0].as_expression().expect("expression");
    assert_eq!(expression.ty, StaticType::Str);
    assert!(matches!(expression.kind, ExpressionKind::InterpolatedStr(ref chunks) if chunks.len() == 3));
}
