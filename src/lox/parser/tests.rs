use pretty_assertions::assert_eq;
use crate::lox::lexer::scan;
use crate::lox::printer::AstPrinter;
use super::*;

fn parse_source(source: &str) -> (Vec<Stmt>, Vec<ParseError>) {
    let mut parser = Parser::new(scan(source).expect("source should scan"));
    let statements = parser.parse();

    (statements, parser.into_errors())
}

fn parse_ok(source: &str) -> Vec<Stmt> {
    let (statements, errors) = parse_source(source);
    assert_eq!(errors, vec![]);
    statements
}

fn messages(errors: &[ParseError]) -> Vec<(usize, String)> {
    errors.iter().map(|error| (error.line(), error.message.clone())).collect()
}

fn print(expr: &Expr) -> String {
    AstPrinter::new().print(expr)
}

#[test]
fn empty_program() {
    assert_eq!(parse_ok(""), vec![]);
}

#[test]
fn token_stream_without_eof_is_completed() {
    let mut parser = Parser::new(vec![]);

    assert_eq!(parser.parse(), vec![]);
    assert!(!parser.had_error());
}

#[test]
fn var_declarations() {
    let statements = parse_ok("var a; var b = 1 + 2;");

    match statements.as_slice() {
        [Stmt::Var { name: a, initializer: None }, Stmt::Var { name: b, initializer: Some(init) }] => {
            assert_eq!(a.lexeme(), "a");
            assert_eq!(b.lexeme(), "b");
            assert_eq!(print(init), "(+ 1 2)");
        },
        other => panic!("unexpected statements: {:?}", other),
    }
}

#[test]
fn function_declaration() {
    let statements = parse_ok("fun add(a, b) { return a + b; }");

    match statements.as_slice() {
        [Stmt::Function(function)] => {
            assert_eq!(function.name.lexeme(), "add");
            assert_eq!(function.params.iter().map(Token::lexeme).collect::<Vec<_>>(), vec!["a", "b"]);

            match function.body.as_slice() {
                [Stmt::Return { keyword, value: Some(value) }] => {
                    assert_eq!(keyword.lexeme(), "return");
                    assert_eq!(print(value), "(+ a b)");
                },
                other => panic!("unexpected body: {:?}", other),
            }
        },
        other => panic!("unexpected statements: {:?}", other),
    }
}

#[test]
fn if_else_binds_to_nearest_if() {
    let statements = parse_ok("if (a) if (b) print 1; else print 2;");

    match statements.as_slice() {
        [Stmt::If { otherwise: None, then, .. }] => {
            assert!(matches!(then.as_ref(), Stmt::If { otherwise: Some(_), .. }));
        },
        other => panic!("unexpected statements: {:?}", other),
    }
}

#[test]
fn for_loop_is_desugared() {
    let statements = parse_ok("for (var i = 0; i < 3; i = i + 1) print i;");

    match statements.as_slice() {
        [Stmt::Block(outer)] => match outer.as_slice() {
            [Stmt::Var { name, .. }, Stmt::While { condition, body }] => {
                assert_eq!(name.lexeme(), "i");
                assert_eq!(print(condition), "(< i 3)");

                match body.as_ref() {
                    Stmt::Block(inner) => match inner.as_slice() {
                        [Stmt::Print(value), Stmt::Expression(increment)] => {
                            assert_eq!(print(value), "i");
                            assert_eq!(print(increment), "(= i (+ i 1))");
                        },
                        other => panic!("unexpected loop body: {:?}", other),
                    },
                    other => panic!("unexpected loop body: {:?}", other),
                }
            },
            other => panic!("unexpected for block: {:?}", other),
        },
        other => panic!("unexpected statements: {:?}", other),
    }
}

#[test]
fn for_loop_without_clauses_loops_on_true() {
    let statements = parse_ok("for (;;) print 1;");

    match statements.as_slice() {
        [Stmt::Block(outer)] => match outer.as_slice() {
            [Stmt::While { condition, body }] => {
                assert_eq!(condition, &Expr::Literal(Literal::Boolean(true)));
                assert!(matches!(body.as_ref(), Stmt::Print(_)));
            },
            other => panic!("unexpected for block: {:?}", other),
        },
        other => panic!("unexpected statements: {:?}", other),
    }
}

#[test]
fn invalid_assignment_target_is_not_fatal() {
    let (statements, errors) = parse_source("a + b = c; print 1;");

    assert_eq!(messages(&errors), vec![(1, String::from("Invalid assignment target"))]);
    assert_eq!(errors[0].location(), " at '='");
    assert_eq!(statements.len(), 2);
}

#[test]
fn collects_every_error_and_recovers() {
    let source = "var = 1;\nprint 2;\nprint (3;\nvar ok = 4;\n1 +;";
    let (statements, errors) = parse_source(source);

    assert_eq!(messages(&errors), vec![
        (1, String::from("Expected variable name")),
        (3, String::from("Expected ')' after expression")),
        (5, String::from("Expected expression")),
    ]);
    assert_eq!(statements.len(), 2);
    assert!(matches!(&statements[1], Stmt::Var { name, .. } if name.lexeme() == "ok"));
}

#[test]
fn synchronizes_inside_blocks() {
    let (statements, errors) = parse_source("{ print ; print 1; }");

    assert_eq!(messages(&errors), vec![(1, String::from("Expected expression"))]);
    match statements.as_slice() {
        [Stmt::Block(inner)] => assert_eq!(inner.len(), 1),
        other => panic!("unexpected statements: {:?}", other),
    }
}

#[test]
fn error_at_end_of_input() {
    let (_, errors) = parse_source("print 1");

    assert_eq!(messages(&errors), vec![(1, String::from("Expected ';' after value"))]);
    assert_eq!(errors[0].location(), " at end");
}

#[test]
fn top_level_return_is_reported() {
    let (statements, errors) = parse_source("return 1;");

    assert_eq!(messages(&errors), vec![(1, String::from("Can't return from top-level code"))]);
    assert_eq!(statements.len(), 1);
}

#[test]
fn duplicate_parameters_are_reported() {
    let (_, errors) = parse_source("fun f(a, a) {}");

    assert_eq!(messages(&errors), vec![(1, String::from("Duplicate parameter name"))]);
}

#[test]
fn too_many_arguments_is_not_fatal() {
    let args = (0..256).map(|i| i.to_string()).collect::<Vec<_>>().join(", ");
    let (statements, errors) = parse_source(&format!("f({});", args));

    assert_eq!(messages(&errors), vec![(1, String::from("Can't have more than 255 arguments"))]);
    match statements.as_slice() {
        [Stmt::Expression(Expr::Call { args, .. })] => assert_eq!(args.len(), 256),
        other => panic!("unexpected statements: {:?}", other),
    }
}

#[test]
fn too_many_parameters_is_not_fatal() {
    let params = (0..256).map(|i| format!("p{}", i)).collect::<Vec<_>>().join(", ");
    let (statements, errors) = parse_source(&format!("fun f({}) {{}}", params));

    assert_eq!(messages(&errors), vec![(1, String::from("Can't have more than 255 parameters"))]);
    assert_eq!(statements.len(), 1);
}

#[test]
fn dot_is_not_an_expression() {
    let (_, errors) = parse_source(".;");

    assert_eq!(messages(&errors), vec![(1, String::from("Expected expression"))]);
}

#[test]
fn parse_helper_fails_on_any_error() {
    assert!(parse(scan("print 1;").unwrap()).is_ok());
    assert_eq!(parse(scan("print;").unwrap()).map_err(|errors| errors.len()), Err(1));
}

#[test]
fn deeply_nested_groupings_parse() {
    let source = format!("{}1{};", "(".repeat(5_000), ")".repeat(5_000));

    assert_eq!(parse_ok(&source).len(), 1);
}

#[test]
fn parsing_twice_is_identical() {
    let source = "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(5);";

    assert_eq!(parse_ok(source), parse_ok(source));
}
