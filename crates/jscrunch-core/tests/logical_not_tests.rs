//! Property-based tests for the logical-not rewriter
//!
//! Random boolean-ish expressions are negated and re-printed; the printed
//! length must move by exactly what the rewriter predicted.

use jscrunch_core::ast::{Expression, ParenContext, Statement};
use jscrunch_core::codegen::{expression_len, CodeGenerator};
use jscrunch_core::diagnostics::CollectingDiagnosticHandler;
use jscrunch_core::lexer::Lexer;
use jscrunch_core::optimizer::LogicalNot;
use jscrunch_core::parser::Parser;
use jscrunch_core::{CodeSettings, TreeModifications};
use proptest::prelude::*;
use std::sync::Arc;

fn parse_expression(source: &str) -> Expression {
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    let tokens = Lexer::new(source).tokenize().expect("Lexing failed");
    let mut program = Parser::new(tokens, handler).parse().expect("Parse failed");
    match program.body.statements.remove(0) {
        Statement::Expression(expr) => expr,
        other => panic!("expected an expression statement, got {other:?}"),
    }
}

fn text(expr: &Expression, settings: &CodeSettings) -> String {
    CodeGenerator::new(settings).generate_expression_text(expr, ParenContext::TOP)
}

fn leaf_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-e]".prop_map(|s| s),
        Just("x.y".to_string()),
        Just("f()".to_string()),
        Just("1".to_string()),
    ]
}

fn comparison_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("<"),
        Just(">"),
        Just("<="),
        Just(">="),
        Just("=="),
        Just("!="),
        Just("==="),
        Just("!=="),
    ]
}

/// Expressions built from comparisons and `&&`/`||`, which negate into
/// each other without a `!` wrapper.
fn invertible_strategy() -> impl Strategy<Value = String> {
    leaf_strategy().prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), comparison_strategy(), inner.clone())
                .prop_map(|(l, op, r)| format!("({l}){op}({r})")),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("({l})&&({r})")),
            (inner.clone(), inner).prop_map(|(l, r)| format!("({l})||({r})")),
        ]
    })
}

/// Adds explicit `!`, arithmetic, conditionals, commas, assignments,
/// `in`/`instanceof` and boolean literals to the mix.
fn expression_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        leaf_strategy(),
        Just("true".to_string()),
        Just("false".to_string()),
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            (inner.clone(), comparison_strategy(), inner.clone())
                .prop_map(|(l, op, r)| format!("({l}){op}({r})")),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("({l})&&({r})")),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("({l})||({r})")),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("({l})+({r})")),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, t, e)| format!("({c})?({t}):({e})")),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("({l}),({r})")),
            ("[a-e]", inner.clone()).prop_map(|(name, r)| format!("{name}=({r})")),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("({l}) in ({r})")),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("({l}) instanceof ({r})")),
            inner.prop_map(|e| format!("!({e})")),
        ]
    })
}

fn try_parse_expression(source: &str) -> Option<Expression> {
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    let tokens = Lexer::new(source).tokenize().ok()?;
    let mut program = Parser::new(tokens, handler).parse().ok()?;
    match program.body.statements.remove(0) {
        Statement::Expression(expr) => Some(expr),
        _ => None,
    }
}

fn settings_for(minify_booleans: bool) -> CodeSettings {
    let mut settings = CodeSettings::default();
    if !minify_booleans {
        settings.disable(TreeModifications::BOOLEAN_LITERALS_AS_NOT_NUMBERS);
    }
    settings
}

proptest! {
    #[test]
    fn measure_matches_printed_delta(
        source in expression_strategy(),
        minify_booleans in any::<bool>(),
    ) {
        let settings = settings_for(minify_booleans);
        let not = LogicalNot::new(&settings);
        let parsed = try_parse_expression(&source);
        prop_assume!(parsed.is_some());
        let mut expr = parsed.unwrap();

        let before = expression_len(&expr, ParenContext::TOP, &settings) as i32;
        let predicted = not.measure(&expr);
        not.apply(&mut expr);
        let after = expression_len(&expr, ParenContext::TOP, &settings) as i32;

        prop_assert_eq!(after - before, predicted);
    }

    #[test]
    fn double_negation_restores_text(source in invertible_strategy()) {
        let settings = CodeSettings::default();
        let not = LogicalNot::new(&settings);
        let mut expr = parse_expression(&source);
        let original = text(&expr, &settings);

        not.apply(&mut expr);
        prop_assert!(text(&expr, &settings) != original);
        not.apply(&mut expr);

        prop_assert_eq!(text(&expr, &settings), original);
    }
}

#[test]
fn test_table_examples() {
    let settings = CodeSettings::default();
    let not = LogicalNot::new(&settings);
    for (source, delta, negated) in [
        ("a==b", 0, "a!=b"),
        ("a<b", 1, "a>=b"),
        ("a&&b", 2, "!a||!b"),
        ("a<b&&c", 2, "a>=b||!c"),
        ("!a", -1, "a"),
        ("a=b", 3, "!(a=b)"),
        ("a?b:c", 2, "a?!b:!c"),
        ("a,b", 1, "a,!b"),
        ("true", 0, "!1"),
    ] {
        let mut expr = parse_expression(source);
        assert_eq!(not.measure(&expr), delta, "measure of {source}");
        not.apply(&mut expr);
        assert_eq!(text(&expr, &settings), negated);
    }
}
