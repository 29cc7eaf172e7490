use pretty_assertions::assert_eq;
use crate::lox::lexer::scan;
use crate::lox::parser::parse;
use super::*;

fn run_with(interpreter: &mut Interpreter<Vec<String>>, source: &str) -> RuntimeResult<()> {
    let statements = parse(scan(source).expect("source should scan")).expect("source should parse");
    interpreter.interpret(&statements)
}

fn run(source: &str) -> (Vec<String>, RuntimeResult<()>) {
    let mut interpreter = Interpreter::with_output(Vec::new());
    let result = run_with(&mut interpreter, source);

    (interpreter.into_output(), result)
}

fn output(source: &str) -> Vec<String> {
    let (lines, result) = run(source);
    assert_eq!(result, Ok(()));
    lines
}

fn error(source: &str) -> (usize, String) {
    let (_, result) = run(source);
    let error = result.expect_err("program should fail");
    (error.line(), error.message)
}

#[test]
fn prints_canonical_forms() {
    assert_eq!(output("print nil; print true; print false; print 3; print 2.5; print \"text\";"),
               vec!["nil", "true", "false", "3", "2.5", "text"]);
}

#[test]
fn arithmetic_and_comparison() {
    assert_eq!(output("print 1 + 2 * 3; print (1 + 2) * 3; print 10 / 4; print -(3 - 5);"),
               vec!["7", "9", "2.5", "2"]);
    assert_eq!(output("print 1 < 2; print 2 <= 2; print 3 > 4; print 4 >= 5;"),
               vec!["true", "true", "false", "false"]);
}

#[test]
fn equality_never_coerces() {
    assert_eq!(output("print 1 == \"1\"; print nil == nil; print nil == false; print \"a\" != \"a\";"),
               vec!["false", "true", "false", "false"]);
}

#[test]
fn not_uses_truthiness() {
    assert_eq!(output("print !nil; print !0; print !\"\"; print !!false;"),
               vec!["true", "false", "false", "false"]);
}

#[test]
fn plus_concatenates_when_either_side_is_a_string() {
    assert_eq!(output("print \"a\" + \"b\"; print \"a\" + 1; print 2.5 + \"b\"; print nil + \"x\";"),
               vec!["ab", "a1", "2.5b", "nilx"]);
}

#[test]
fn operand_type_errors() {
    assert_eq!(error("print -\"a\";"), (1, String::from("Operand must be a number")));
    assert_eq!(error("print 1 < \"2\";"), (1, String::from("Operands must be numbers")));
    assert_eq!(error("print nil * 2;"), (1, String::from("Operands must be numbers")));
    assert_eq!(error("print true + 1;"), (1, String::from("Operands must be two numbers or two strings")));
}

#[test]
fn block_scoping_shadows() {
    let source = "var a = \"outer\";\n{\n  var a = \"inner\";\n  print a;\n}\nprint a;";

    assert_eq!(output(source), vec!["inner", "outer"]);
}

#[test]
fn assignment_reaches_enclosing_scope() {
    assert_eq!(output("var a = 1; { a = 2; } print a; var b; print b = 3; print b;"),
               vec!["2", "3", "3"]);
}

#[test]
fn undefined_variables() {
    assert_eq!(error("print missing;"), (1, String::from("Undefined variable 'missing'")));
    assert_eq!(error("\nmissing = 1;"), (2, String::from("Undefined variable 'missing'")));
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(output("print nil or \"yes\"; print \"hi\" or missing; print nil and missing; print 1 and 2;"),
               vec!["yes", "hi", "nil", "2"]);
}

#[test]
fn control_flow() {
    let source = "
        var i = 0;
        while (i < 3) { print i; i = i + 1; }
        for (var j = 0; j < 2; j = j + 1) print j;
        if (i == 3) print \"three\"; else print \"other\";
        if (nil) print \"never\";
    ";

    assert_eq!(output(source), vec!["0", "1", "2", "0", "1", "three"]);
}

#[test]
fn recursion_with_return() {
    let source = "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(5); print fib(10);";

    assert_eq!(output(source), vec!["5", "55"]);
}

#[test]
fn return_unwinds_through_loops_and_blocks() {
    let source = "
        fun find() {
            for (var i = 0; i < 10; i = i + 1) {
                { if (i == 4) return i; }
            }
            return -1;
        }
        print find();
    ";

    assert_eq!(output(source), vec!["4"]);
}

#[test]
fn function_without_return_yields_nil() {
    assert_eq!(output("fun f() { 1; } print f(); fun g() { return; } print g();"), vec!["nil", "nil"]);
}

#[test]
fn closures_outlive_their_defining_call() {
    let source = "
        fun makeCounter() {
            var count = 0;
            fun counter() {
                count = count + 1;
                return count;
            }
            return counter;
        }
        var counter = makeCounter();
        print counter();
        print counter();
    ";

    assert_eq!(output(source), vec!["1", "2"]);
}

#[test]
fn closures_see_later_mutations() {
    let source = "
        var x = \"before\";
        fun show() { print x; }
        x = \"after\";
        show();
    ";

    assert_eq!(output(source), vec!["after"]);
}

#[test]
fn closures_capture_defining_scope_not_calling_scope() {
    let source = "
        var a = \"global\";
        fun show() { print a; }
        fun caller() { var a = \"caller\"; show(); }
        caller();
    ";

    assert_eq!(output(source), vec!["global"]);
}

#[test]
fn arity_mismatch_names_both_counts() {
    let declaration = "fun pair(a, b) { return a; }\n";

    assert_eq!(error(&format!("{}pair(1);", declaration)), (2, String::from("Expected 2 arguments but got 1")));
    assert_eq!(error(&format!("{}pair(1, 2, 3);", declaration)), (2, String::from("Expected 2 arguments but got 3")));
}

#[test]
fn only_functions_are_callable() {
    assert_eq!(error("\"text\"();"), (1, String::from("Can only call functions and classes")));
    assert_eq!(error("var x = 1; x(2);"), (1, String::from("Can only call functions and classes")));
}

#[test]
fn functions_print_their_names() {
    assert_eq!(output("fun add(a, b) {} print add; print clock;"), vec!["<fn add>", "<native fn>"]);
}

#[test]
fn clock_returns_seconds() {
    assert_eq!(output("var t = clock(); print t > 0; print clock() >= t;"), vec!["true", "true"]);
    assert_eq!(error("clock(1);"), (1, String::from("Expected 0 arguments but got 1")));
}

#[test]
fn runtime_error_halts_remaining_statements() {
    let (lines, result) = run("print 1;\nprint missing;\nprint 2;");

    assert_eq!(lines, vec!["1"]);
    assert_eq!(result.map_err(|error| error.line()), Err(2));
}

#[test]
fn scope_is_restored_after_runtime_error() {
    let mut interpreter = Interpreter::with_output(Vec::new());

    assert!(run_with(&mut interpreter, "var a = \"global\"; { var a = \"inner\"; missing; }").is_err());
    assert_eq!(run_with(&mut interpreter, "print a;"), Ok(()));
    assert_eq!(interpreter.output(), &vec![String::from("global")]);
}

#[test]
fn unbounded_recursion_is_a_runtime_error() {
    assert_eq!(error("fun forever(n) { return forever(n + 1); }\nforever(0);"),
               (1, String::from("Stack overflow")));
}

#[test]
fn globals_persist_between_runs() {
    let mut interpreter = Interpreter::with_output(Vec::new());

    run_with(&mut interpreter, "var greeting = \"hi\"; fun shout(s) { return s + \"!\"; }").unwrap();
    run_with(&mut interpreter, "print shout(greeting);").unwrap();

    assert_eq!(interpreter.into_output(), vec!["hi!"]);
    assert!(Interpreter::new().globals().borrow().contains("clock"));
}
