//! Renders a syntax tree back to JavaScript source.
//!
//! Parentheses are never stored in the tree; they are derived here from
//! operator precedence. Identifiers print under the name the resolver gave
//! their field when a [`ScopeTree`] is attached.

mod expressions;
mod statements;

use crate::ast::{Expression, ParenContext, Precedence, Program, Statement};
use crate::config::CodeSettings;
use crate::lexer::{is_identifier_part, is_reserved_word, is_valid_identifier};
use crate::scope::ScopeTree;

/// Code generator for minified or pretty-printed JavaScript
pub struct CodeGenerator<'a> {
    output: String,
    indent_level: usize,
    indent_str: String,
    settings: &'a CodeSettings,
    scopes: Option<&'a ScopeTree>,
    /// A `;` owed by the last statement, dropped before `}` in compact output.
    pending_semicolon: bool,
    /// Inside a `for` initializer, where a bare `in` would end the clause.
    no_in: bool,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(settings: &'a CodeSettings) -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            indent_str: " ".repeat(settings.indent_size),
            settings,
            scopes: None,
            pending_semicolon: false,
            no_in: false,
        }
    }

    /// Print identifiers under their resolved names.
    pub fn with_scopes(mut self, scopes: &'a ScopeTree) -> Self {
        self.scopes = Some(scopes);
        self
    }

    pub fn generate(mut self, program: &Program) -> String {
        self.generate_statement_list(&program.body.statements);
        self.pending_semicolon = false;
        if self.settings.is_multi_line() && !self.output.ends_with('\n') && !self.output.is_empty()
        {
            self.output.push('\n');
        }
        self.output
    }

    pub fn generate_expression_text(mut self, expr: &Expression, ctx: ParenContext) -> String {
        self.generate_expression(expr, ctx);
        self.output
    }

    pub fn generate_statement_text(mut self, statement: &Statement) -> String {
        self.generate_statement(statement);
        self.output
    }

    fn multi_line(&self) -> bool {
        self.settings.is_multi_line()
    }

    /// Appends `s`, first paying any owed semicolon and inserting a space
    /// where the two sides would otherwise lex as one token.
    fn write(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if self.pending_semicolon {
            self.pending_semicolon = false;
            self.output.push(';');
        }
        if let (Some(last), Some(first)) = (self.output.chars().last(), s.chars().next()) {
            if needs_separator(last, first) {
                self.output.push(' ');
            }
        }
        self.output.push_str(s);
    }

    /// A space that only appears in multi-line output.
    fn space(&mut self) {
        if self.multi_line() {
            self.write_raw(" ");
        }
    }

    fn write_raw(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn newline(&mut self) {
        if self.multi_line() {
            self.output.push('\n');
        }
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    fn write_indent(&mut self) {
        if !self.multi_line() {
            return;
        }
        if self.pending_semicolon {
            self.pending_semicolon = false;
            self.output.push(';');
        }
        for _ in 0..self.indent_level {
            self.output.push_str(&self.indent_str);
        }
    }

    /// Ends a statement that needs a terminator.
    fn end_statement(&mut self) {
        if self.multi_line() {
            self.write_raw(";");
            self.newline();
        } else {
            self.pending_semicolon = true;
        }
    }

    fn open_brace(&mut self) {
        self.space();
        self.write("{");
        self.newline();
        self.indent();
    }

    fn close_brace(&mut self) {
        self.pending_semicolon = false;
        self.dedent();
        self.write_indent();
        self.write("}");
    }

    fn identifier_name<'n>(&self, ident: &'n crate::ast::Identifier) -> &'n str
    where
        'a: 'n,
    {
        match (self.scopes, ident.field) {
            (Some(scopes), Some(field)) => scopes.display_name(field),
            _ => &ident.name,
        }
    }
}

fn needs_separator(last: char, first: char) -> bool {
    (is_identifier_part(last) && is_identifier_part(first))
        || (last == '+' && first == '+')
        || (last == '-' && first == '-')
        || (last == '/' && (first == '/' || first == '*'))
}

/// Precedence of `expr` as it will actually print under `settings`.
pub fn precedence_of(expr: &Expression, settings: &CodeSettings) -> Precedence {
    match expr.kind {
        crate::ast::ExpressionKind::Boolean(_) if settings.minify_booleans() => Precedence::Unary,
        _ => expr.precedence(),
    }
}

/// Printed length of `expr` in the slot described by `ctx`, with source
/// names.
pub fn expression_len(expr: &Expression, ctx: ParenContext, settings: &CodeSettings) -> usize {
    CodeGenerator::new(settings)
        .generate_expression_text(expr, ctx)
        .len()
}

/// Printed length of one statement in compact form, terminator excluded.
pub fn statement_len(statement: &Statement, settings: &CodeSettings) -> usize {
    let compact = CodeSettings {
        output_mode: crate::config::OutputMode::SingleLine,
        ..settings.clone()
    };
    CodeGenerator::new(&compact)
        .generate_statement_text(statement)
        .len()
}

/// Shortest source text for a number literal.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_sign_negative() {
        return format!("-{}", format_number(-value));
    }
    if value.is_infinite() {
        return "Infinity".to_string();
    }
    if value == value.trunc() && value < 1e21 {
        if let Some(text) = format_integer(value) {
            return text;
        }
    }

    let plain = format!("{}", value);
    let plain = plain.strip_prefix("0.").map_or(plain.clone(), |rest| format!(".{}", rest));
    let exponent = format!("{:e}", value);
    if exponent.len() < plain.len() {
        exponent
    } else {
        plain
    }
}

/// Integers from their shortest round-trip digits: `1e3` over `1000`, and
/// `12345678901234568e3` over the exact expansion of a value past 2^53.
fn format_integer(value: f64) -> Option<String> {
    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific.split_once('e')?;
    let exponent: i32 = exponent.parse().ok()?;
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let zeros = usize::try_from(exponent + 1 - digits.len() as i32).ok()?;
    if zeros > 2 {
        Some(format!("{}e{}", digits, zeros))
    } else {
        Some(format!("{}{}", digits, "0".repeat(zeros)))
    }
}

/// A string literal in whichever quote needs fewer escapes.
pub fn quote_string(value: &str) -> String {
    let doubles = value.matches('"').count();
    let singles = value.matches('\'').count();
    let quote = if singles < doubles { '\'' } else { '"' };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            '\0' => {
                if chars.peek().is_some_and(|next| next.is_ascii_digit()) {
                    out.push_str("\\x00");
                } else {
                    out.push_str("\\0");
                }
            }
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Whether a string property key can print without quotes.
fn is_bare_key(key: &str) -> bool {
    is_valid_identifier(key) && !is_reserved_word(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, ExpressionKind, Identifier, UnaryOp};
    use crate::config::OutputMode;
    use crate::diagnostics::CollectingDiagnosticHandler;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::span::Span;
    use indoc::indoc;
    use std::sync::Arc;

    fn parse(source: &str) -> Program {
        let handler = Arc::new(CollectingDiagnosticHandler::new());
        let tokens = Lexer::new(source).tokenize().expect("Lexing failed");
        Parser::new(tokens, handler).parse().expect("Parse failed")
    }

    fn emit(source: &str) -> String {
        let settings = CodeSettings {
            minify_code: false,
            ..CodeSettings::default()
        };
        CodeGenerator::new(&settings).generate(&parse(source))
    }

    fn ident(name: &str) -> Expression {
        Expression::synthetic(ExpressionKind::Identifier(Identifier::new(name, Span::dummy())))
    }

    #[test]
    fn test_compact_statements() {
        assert_eq!(emit("var a = 1, b;  a = b + 2;"), "var a=1,b;a=b+2");
        assert_eq!(emit("function f(x, y) { return x * y; }"), "function f(x,y){return x*y}");
        assert_eq!(emit("if (a) { b(); } else { c(); }"), "if(a)b();else c()");
    }

    #[test]
    fn test_parentheses_follow_precedence() {
        assert_eq!(emit("x = (a + b) * c;"), "x=(a+b)*c");
        assert_eq!(emit("x = a - (b - c);"), "x=a-(b-c)");
        assert_eq!(emit("x = a && (b && c);"), "x=a&&b&&c");
        assert_eq!(emit("x = a + (b + c);"), "x=a+(b+c)");
        assert_eq!(emit("x = (a, b);"), "x=(a,b)");
        assert_eq!(emit("x = !(a < b);"), "x=!(a<b)");
        assert_eq!(emit("x = (a ? b : c) ? d : e;"), "x=(a?b:c)?d:e");
    }

    #[test]
    fn test_token_separation() {
        assert_eq!(emit("x = a + +b;"), "x=a+ +b");
        assert_eq!(emit("x = a - -b;"), "x=a- -b");
        assert_eq!(emit("x = typeof y;"), "x=typeof y");
        assert_eq!(emit("x = a in b;"), "x=a in b");
        assert_eq!(emit("return;"), "return");
        assert_eq!(emit("throw new Error('x');"), "throw new Error(\"x\")");
    }

    #[test]
    fn test_statement_start_wrapping() {
        assert_eq!(emit("(function () {})();"), "(function(){}())");
        assert_eq!(emit("({a: 1}).a;"), "({a:1}.a)");
    }

    #[test]
    fn test_dangling_else_keeps_braces() {
        assert_eq!(emit("if (a) { if (b) c(); } else d();"), "if(a){if(b)c()}else d()");
    }

    #[test]
    fn test_empty_bodies() {
        assert_eq!(emit("for (;;) ;"), "for(;;);");
        assert_eq!(emit("while (a) {}"), "while(a){}");
        assert_eq!(emit("do x(); while (a);"), "do x();while(a)");
    }

    #[test]
    fn test_for_in_initializer_parenthesized() {
        assert_eq!(emit("for (var i = (a in b); i; ) {}"), "for(var i=(a in b);i;){}");
        assert_eq!(emit("for (var k in o) f(k);"), "for(var k in o)f(k)");
    }

    #[test]
    fn test_switch_and_try() {
        assert_eq!(
            emit("switch (x) { case 1: a(); break; default: b(); }"),
            "switch(x){case 1:a();break;default:b()}"
        );
        assert_eq!(
            emit("try { a(); } catch (e) { b(e); } finally { c(); }"),
            "try{a()}catch(e){b(e)}finally{c()}"
        );
    }

    #[test]
    fn test_new_and_member_special_cases() {
        assert_eq!(emit("x = new (a())();"), "x=new(a())()");
        assert_eq!(emit("x = (new A).b;"), "x=(new A).b");
        assert_eq!(emit("x = 1..toString();"), "x=1..toString()");
        assert_eq!(emit("x = [a, , b, ];"), "x=[a,,b]");
        assert_eq!(emit("x = [a, , ];"), "x=[a,,]");
    }

    #[test]
    fn test_object_keys() {
        assert_eq!(
            emit("x = {'a': 1, 'b c': 2, 3: 4, get d() { return 5; }};"),
            "x={a:1,\"b c\":2,3:4,get d(){return 5}}"
        );
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(100.0), "100");
        assert_eq!(format_number(1000.0), "1e3");
        assert_eq!(format_number(0.5), ".5");
        assert_eq!(format_number(1.25), "1.25");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_large_integers_use_shortest_digits() {
        let value = 12345678901234567890.0_f64;
        let text = format_number(value);
        assert!(text.len() < "12345678901234567168".len(), "{text}");
        assert!(text.ends_with("e3"), "{text}");
        assert_eq!(text.parse::<f64>().unwrap(), value);
        assert_eq!(format_number(9007199254740992.0), "9007199254740992");
        assert_eq!(format_number(123000.0), "123e3");
    }

    #[test]
    fn test_string_quoting() {
        assert_eq!(quote_string("abc"), "\"abc\"");
        assert_eq!(quote_string("say \"hi\""), "'say \"hi\"'");
        assert_eq!(quote_string("it's"), "\"it's\"");
        assert_eq!(quote_string("a\nb"), "\"a\\nb\"");
        assert_eq!(quote_string("\u{0}1"), "\"\\x001\"");
    }

    #[test]
    fn test_boolean_rendering() {
        let settings = CodeSettings::default();
        let program = parse("x = true; y = false;");
        assert_eq!(CodeGenerator::new(&settings).generate(&program), "x=!0;y=!1");

        let member = Expression::synthetic(ExpressionKind::Member(
            Box::new(Expression::boolean(true)),
            "toString".to_string(),
        ));
        assert_eq!(expression_len(&member, ParenContext::TOP, &settings), "(!0).toString".len());
    }

    #[test]
    fn test_expression_len_matches_text() {
        let settings = CodeSettings::default();
        let expr = Expression::unary(
            UnaryOp::Not,
            Expression::binary(BinaryOp::Add, ident("a"), ident("b")),
        );
        assert_eq!(expression_len(&expr, ParenContext::TOP, &settings), 6);
    }

    #[test]
    fn test_multi_line_output() {
        let settings = CodeSettings {
            output_mode: OutputMode::MultipleLines,
            minify_code: false,
            ..CodeSettings::default()
        };
        let program = parse("function f(a) { if (a) { return a + 1; } return 0; }");
        let expected = indoc! {"
            function f(a) {
                if (a) {
                    return a + 1;
                }
                return 0;
            }
        "};
        assert_eq!(CodeGenerator::new(&settings).generate(&program), expected);
    }
}
