use indoc::indoc;
use jscrunch_core::config::LocalRenaming;
use jscrunch_core::diagnostics::CollectingDiagnosticHandler;
use jscrunch_core::lexer::Lexer;
use jscrunch_core::optimizer::LogicalNot;
use jscrunch_core::parser::Parser;
use jscrunch_core::scope::{bind, ScopeTree};
use jscrunch_core::{
    ast::{Program, Statement},
    minify, CodeSettings, DiagnosticCode, DiagnosticHandler, Optimizer, TreeModifications,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;

fn minified(source: &str) -> String {
    minified_with(source, &CodeSettings::default())
}

fn minified_with(source: &str, settings: &CodeSettings) -> String {
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    minify(source, settings, handler).expect("minify failed")
}

fn parse(source: &str, handler: Arc<dyn DiagnosticHandler>) -> Program {
    let tokens = Lexer::new(source).tokenize().expect("Lexing failed");
    Parser::new(tokens, handler).parse().expect("Parse failed")
}

fn optimized(source: &str, settings: &CodeSettings) -> (Program, ScopeTree) {
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    let mut program = parse(source, handler.clone());
    let mut tree = bind(&mut program, settings, handler.as_ref());
    Optimizer::new(settings.clone(), handler)
        .optimize(&mut program, &mut tree)
        .expect("optimize failed");
    (program, tree)
}

const NESTED_SOURCE: &str = indoc! {"
    function outer(alpha, beta) {
        var gamma = alpha + beta;
        function inner(delta) {
            var epsilon = delta * gamma;
            return function (zeta) { return zeta + epsilon + alpha; };
        }
        try { inner(gamma); } catch (err) { log(err, beta); }
        return inner;
    }
"};

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn test_if_else_returns_become_conditional() {
    assert_eq!(
        minified("function f(a) { if (a) return 1; else return 2; }"),
        "function f(a){return a?1:2}"
    );
}

#[test]
fn test_declarations_hoisted_function_first() {
    let settings = CodeSettings {
        local_renaming: LocalRenaming::KeepAll,
        ..CodeSettings::default()
    };
    assert_eq!(
        minified_with("function g() { var x; var y; function f() {} f(); }", &settings),
        "function g(){function f(){}var x,y;f()}"
    );
}

#[test]
fn test_negated_comparison_is_flipped() {
    assert_eq!(minified("x = !(a < b);"), "x=a>=b");
}

#[test]
fn test_negated_assignment_keeps_wrapper() {
    assert_eq!(minified("x = !(a = b);"), "x=!(a=b)");

    let handler = Arc::new(CollectingDiagnosticHandler::new());
    let program = parse("a = b;", handler);
    let Some(Statement::Expression(assignment)) = program.body.statements.first() else {
        panic!("expected an expression statement");
    };
    let settings = CodeSettings::default();
    assert_eq!(LogicalNot::new(&settings).measure(assignment), 3);
}

#[test]
fn test_repeated_string_shared_through_variable() {
    assert_eq!(
        minified("function f() { return ['abc', 'abc', 'abc', 'abc', 'abc']; }"),
        "function f(){var a=\"abc\";return[a,a,a,a,a]}"
    );
}

// ============================================================================
// Renaming
// ============================================================================

#[test]
fn test_no_two_live_bindings_share_a_name() {
    let settings = CodeSettings::default();
    let (_, tree) = optimized(NESTED_SOURCE, &settings);

    for scope_id in tree.scopes_top_down() {
        let scope = tree.scope(scope_id);
        if !scope.is_known_at_compile_time {
            continue;
        }
        let mut owners = FxHashMap::default();
        for &field in scope.fields.values() {
            let ultimate = tree.ultimate(field);
            let name = tree.display_name(field).to_string();
            let previous = owners.insert(name.clone(), ultimate);
            assert!(
                previous.is_none() || previous == Some(ultimate),
                "name {name} bound twice in one scope"
            );
        }
    }
}

#[test]
fn test_captured_variable_keeps_outer_name() {
    assert_eq!(
        minified("function f(longName) { return function () { return longName; }; }"),
        "function f(a){return function(){return a}}"
    );

    let (_, tree) = optimized(NESTED_SOURCE, &CodeSettings::default());
    for scope_id in tree.scopes_top_down() {
        for &field in tree.scope(scope_id).fields.values() {
            let record = tree.field(field);
            if record.is_alias() {
                assert!(record.crunched_name.is_none());
                assert_eq!(
                    tree.display_name(field),
                    tree.display_name(tree.ultimate(field))
                );
            }
        }
    }
}

#[test]
fn test_output_parses_again() {
    let output = minified(NESTED_SOURCE);
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    let reparsed = parse(&output, handler.clone());
    assert_eq!(reparsed.body.len(), 1);
    assert!(!handler.has_errors());
}

#[test]
fn test_regex_after_statement_head_survives() {
    let output = minified("if (a) /x/.test(b);");
    assert!(output.contains("/x/.test(b)"));
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    parse(&output, handler.clone());
    assert!(!handler.has_errors());
}

#[test]
fn test_direct_eval_keeps_local_names() {
    let output = minified("function f(longName) { eval('x'); return longName; }");
    assert!(output.contains("longName"));
}

#[test]
fn test_no_auto_rename_list() {
    let settings = CodeSettings {
        no_auto_renames: vec!["keepMe".to_string()],
        ..CodeSettings::default()
    };
    let output = minified_with(
        "function f(keepMe, other) { return keepMe + other; }",
        &settings,
    );
    assert_eq!(output, "function f(keepMe,a){return keepMe+a}");
}

// ============================================================================
// Statement merging and settings
// ============================================================================

#[test]
fn test_adjacent_vars_merge_with_initializer() {
    assert_eq!(minified("var a; var b = 1;"), "var a,b=1");
}

#[test]
fn test_pretty_print_spans_lines() {
    let output = minified_with(
        "var a = 1; if (a) { b(); c(); }",
        &CodeSettings::pretty_print(),
    );
    assert!(output.lines().count() > 1);
    assert!(output.contains("if"));
}

#[test]
fn test_kill_switch_keeps_unused_function() {
    let source = "function g() { function unused() {} return 1; }";
    assert_eq!(minified(source), "function g(){return 1}");

    let mut settings = CodeSettings::default();
    settings.disable(TreeModifications::REMOVE_UNUSED_FUNCTIONS);
    assert_eq!(
        minified_with(source, &settings),
        "function g(){function a(){}return 1}"
    );
}

#[test]
fn test_diagnostics_reach_handler() {
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    minify(
        "function f(a, a) { return undeclaredThing; }",
        &CodeSettings::default(),
        handler.clone(),
    )
    .expect("minify failed");
    assert_eq!(handler.with_code(DiagnosticCode::DuplicateDeclaration).len(), 1);
    assert_eq!(handler.with_code(DiagnosticCode::UndeclaredVariable).len(), 1);
    assert!(!handler.has_errors());
}

#[test]
fn test_removed_function_reports_no_unused_arguments() {
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    let output = minify(
        "function g() { function f(unusedArg) {} return 1; }",
        &CodeSettings::default(),
        handler.clone(),
    )
    .expect("minify failed");
    assert_eq!(output, "function g(){return 1}");
    assert_eq!(handler.with_code(DiagnosticCode::UnusedFunction).len(), 1);
    assert!(handler.with_code(DiagnosticCode::UnusedArgument).is_empty());
}

#[test]
fn test_syntax_error_is_fatal() {
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    assert!(minify("function (", &CodeSettings::default(), handler).is_err());
}
