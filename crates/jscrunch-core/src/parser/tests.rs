use super::*;
use crate::ast::*;
use crate::diagnostics::{CollectingDiagnosticHandler, DiagnosticHandler};
use crate::lexer::Lexer;
use std::sync::Arc;

fn parse_source(source: &str) -> Result<Program, ParserError> {
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    let tokens = Lexer::new(source).tokenize().expect("Lexing failed");
    let mut parser = Parser::new(tokens, handler);
    parser.parse()
}

fn parse_expr(source: &str) -> Expression {
    let program = parse_source(source).expect("Parse failed");
    match program.body.statements.into_iter().next() {
        Some(Statement::Expression(expr)) => expr,
        other => panic!("Expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_parse_var_statement() {
    let program = parse_source("var a = 1, b, c = a + 2;").expect("Parse failed");
    assert_eq!(program.statements().len(), 1);
    match &program.statements()[0] {
        Statement::Var(var) => {
            assert_eq!(var.declarations.len(), 3);
            assert_eq!(var.initializer_count(), 2);
            assert_eq!(var.declarations[1].name.name, "b");
        }
        other => panic!("Expected var statement, got {:?}", other),
    }
}

#[test]
fn test_parse_function_declaration() {
    let program = parse_source("function add(a, b) { return a + b; }").expect("Parse failed");
    match &program.statements()[0] {
        Statement::Function(func) => {
            assert!(func.is_declaration());
            assert_eq!(func.name.as_ref().map(|n| n.name.as_str()), Some("add"));
            assert_eq!(func.params.len(), 2);
            assert_eq!(func.body.len(), 1);
        }
        other => panic!("Expected function declaration, got {:?}", other),
    }
}

#[test]
fn test_binary_precedence() {
    let expr = parse_expr("a + b * c;");
    match expr.kind {
        ExpressionKind::Binary(BinaryOp::Add, _, right) => {
            assert_eq!(right.binary_op(), Some(BinaryOp::Mul));
        }
        other => panic!("Expected addition, got {:?}", other),
    }
}

#[test]
fn test_left_associativity() {
    let expr = parse_expr("a - b - c;");
    match expr.kind {
        ExpressionKind::Binary(BinaryOp::Sub, left, right) => {
            assert_eq!(left.binary_op(), Some(BinaryOp::Sub));
            assert!(right.is_identifier("c"));
        }
        other => panic!("Expected subtraction, got {:?}", other),
    }
}

#[test]
fn test_assignment_is_right_associative() {
    let expr = parse_expr("a = b = c;");
    match expr.kind {
        ExpressionKind::Binary(BinaryOp::Assign, left, right) => {
            assert!(left.is_identifier("a"));
            assert_eq!(right.binary_op(), Some(BinaryOp::Assign));
        }
        other => panic!("Expected assignment, got {:?}", other),
    }
}

#[test]
fn test_invalid_assignment_target() {
    assert!(parse_source("a + b = c;").is_err());
}

#[test]
fn test_conditional_and_comma() {
    let expr = parse_expr("a ? b : c, d;");
    match expr.kind {
        ExpressionKind::Binary(BinaryOp::Comma, left, _) => {
            assert!(matches!(left.kind, ExpressionKind::Conditional(..)));
        }
        other => panic!("Expected comma, got {:?}", other),
    }
}

#[test]
fn test_new_with_and_without_arguments() {
    let expr = parse_expr("new Foo;");
    assert!(matches!(expr.kind, ExpressionKind::New(_, None)));

    let expr = parse_expr("new a.b.C(1).d;");
    match expr.kind {
        ExpressionKind::Member(object, name) => {
            assert_eq!(name, "d");
            assert!(matches!(object.kind, ExpressionKind::New(_, Some(ref args)) if args.len() == 1));
        }
        other => panic!("Expected member access, got {:?}", other),
    }
}

#[test]
fn test_keyword_property_names() {
    let expr = parse_expr("a.default + b.new;");
    assert_eq!(expr.binary_op(), Some(BinaryOp::Add));
}

#[test]
fn test_object_literal_with_accessors() {
    let expr = parse_expr("({ a: 1, 'b': 2, 3: c, get x() { return 1; }, set x(v) {}, get: 4 });");
    match expr.kind {
        ExpressionKind::Object(properties) => {
            assert_eq!(properties.len(), 6);
            assert_eq!(properties[1].key, PropertyKey::String("b".to_string()));
            assert_eq!(properties[3].kind, PropertyKind::Get);
            assert_eq!(properties[4].kind, PropertyKind::Set);
            assert_eq!(properties[5].key, PropertyKey::Identifier("get".to_string()));
        }
        other => panic!("Expected object literal, got {:?}", other),
    }
}

#[test]
fn test_array_elisions() {
    let expr = parse_expr("[a,,b,];");
    match expr.kind {
        ExpressionKind::Array(elements) => {
            assert_eq!(elements.len(), 3);
            assert!(elements[1].is_none());
        }
        other => panic!("Expected array literal, got {:?}", other),
    }
}

#[test]
fn test_automatic_semicolon_insertion() {
    let program = parse_source("a = 1\nb = 2\nreturn\nc").expect("Parse failed");
    assert_eq!(program.statements().len(), 4);
    assert!(matches!(
        &program.statements()[2],
        Statement::Return(ReturnStatement { argument: None, .. })
    ));
}

#[test]
fn test_postfix_update_does_not_cross_newline() {
    let program = parse_source("a\n++b").expect("Parse failed");
    assert_eq!(program.statements().len(), 2);
}

#[test]
fn test_missing_semicolon_on_same_line_is_error() {
    assert!(parse_source("a = 1 b = 2").is_err());
}

#[test]
fn test_for_variants() {
    let program = parse_source(
        "for (var i = 0; i < n; i++) {} for (k in o) {} for (var j in o) ; for (;;) break;",
    )
    .expect("Parse failed");
    let statements = program.statements();
    assert!(matches!(statements[0], Statement::For(ForStatement { init: Some(ForInit::Var(_)), .. })));
    assert!(matches!(
        statements[1],
        Statement::ForIn(ForInStatement { left: ForInTarget::Expression(_), .. })
    ));
    assert!(matches!(statements[2], Statement::ForIn(ForInStatement { left: ForInTarget::Var(_), .. })));
    assert!(matches!(statements[3], Statement::For(ForStatement { init: None, test: None, .. })));
}

#[test]
fn test_for_initializer_with_in_inside_parens() {
    let program = parse_source("for (var a = ('x' in o); a; ) {}").expect("Parse failed");
    assert!(matches!(program.statements()[0], Statement::For(_)));
}

#[test]
fn test_switch_statement() {
    let program = parse_source("switch (x) { case 1: a(); break; default: case 2: b(); }")
        .expect("Parse failed");
    match &program.statements()[0] {
        Statement::Switch(switch) => {
            assert_eq!(switch.cases.len(), 3);
            assert_eq!(switch.cases[0].body.len(), 2);
            assert_eq!(switch.default_index(), Some(1));
            assert!(switch.cases[1].body.is_empty());
        }
        other => panic!("Expected switch, got {:?}", other),
    }
}

#[test]
fn test_try_requires_handler_or_finalizer() {
    assert!(parse_source("try { a(); } catch (e) { b(e); } finally { c(); }").is_ok());
    assert!(parse_source("try { a(); }").is_err());
}

#[test]
fn test_labeled_break_and_continue() {
    let program = parse_source("outer: while (a) { continue outer; break outer; }").expect("Parse failed");
    match &program.statements()[0] {
        Statement::Labeled(labeled) => assert_eq!(labeled.label, "outer"),
        other => panic!("Expected labeled statement, got {:?}", other),
    }
}

#[test]
fn test_preserved_comments_become_statements() {
    let program =
        parse_source("/*! keep */ a(); /* drop */ b(); /*@cc_on @*/ c();").expect("Parse failed");
    let statements = program.statements();
    assert_eq!(statements.len(), 5);
    assert!(matches!(statements[0], Statement::ImportantComment(_)));
    assert!(matches!(statements[3], Statement::ConditionalComment(_)));
}

#[test]
fn test_trailing_comment_in_block() {
    let program = parse_source("function f() { a(); /*! end */ }").expect("Parse failed");
    match &program.statements()[0] {
        Statement::Function(func) => {
            assert!(matches!(func.body.statements.last(), Some(Statement::ImportantComment(_))));
        }
        other => panic!("Expected function, got {:?}", other),
    }
}

#[test]
fn test_regex_literal_in_expression() {
    let expr = parse_expr("x = /ab+c/gi.test(y);");
    assert_eq!(expr.binary_op(), Some(BinaryOp::Assign));
}

#[test]
fn test_regex_literal_after_if_head() {
    let program = parse_source("if (a) /x/.test(b); else c = (d) / 2;").expect("Parse failed");
    match &program.statements()[0] {
        Statement::If(stmt) => {
            assert!(matches!(&*stmt.consequent, Statement::Expression(_)));
            assert!(stmt.alternate.is_some());
        }
        other => panic!("Expected if statement, got {:?}", other),
    }
}

#[test]
fn test_parse_error_is_reported() {
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    let tokens = Lexer::new("var = 1;").tokenize().expect("Lexing failed");
    let mut parser = Parser::new(tokens, handler.clone());
    assert!(parser.parse().is_err());
    assert!(handler.has_errors());
}
