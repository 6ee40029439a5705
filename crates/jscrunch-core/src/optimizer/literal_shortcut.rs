//! Shared variables for repeated literals.
//!
//! A string or number that occurs often enough inside one top-level
//! function is stored once in a synthesized `var` at the top of the
//! innermost function holding every occurrence, and each occurrence becomes
//! a reference to it. Runs between field reservation and renaming, so the
//! new variable gets a short name like any other local.

use super::{allowed, OptimizationPass};
use crate::ast::visit::{walk_catch_clause_mut, walk_expression_mut, walk_function_mut, walk_program_mut, walk_statement_mut, VisitMut};
use crate::ast::*;
use crate::codegen::{format_number, quote_string};
use crate::config::{CodeSettings, TreeModifications};
use crate::errors::CompilationError;
use crate::scope::{FieldId, ResolverPhase, ScopeId, ScopeTree};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::debug;

pub struct LiteralShortcutPass<'a> {
    settings: &'a CodeSettings,
}

impl<'a> LiteralShortcutPass<'a> {
    pub fn new(settings: &'a CodeSettings) -> Self {
        Self { settings }
    }
}

impl OptimizationPass for LiteralShortcutPass<'_> {
    fn name(&self) -> &'static str {
        "literal-shortcut"
    }

    fn run(
        &mut self,
        program: &mut Program,
        scopes: &mut ScopeTree,
    ) -> Result<bool, CompilationError> {
        scopes.advance_phase(ResolverPhase::FieldsReserved, ResolverPhase::LiteralsShortcut);
        if !allowed(self.settings, TreeModifications::COMBINE_DUPLICATE_LITERALS) {
            return Ok(false);
        }

        let mut walker = LiteralWalker::new(scopes, Mode::Collect);
        walker.visit_program_mut(program);
        let groups = std::mem::take(&mut walker.groups);

        let mut shortcuts = FxHashMap::default();
        let mut declarations: FxHashMap<ScopeId, Vec<VarDeclaration>> = FxHashMap::default();
        for (key, group) in groups {
            let Some(shortcut) = plan_shortcut(walker.scopes, &key.1, &group) else {
                continue;
            };
            let name = walker.scopes.field(shortcut.field).name.clone();
            declarations.entry(shortcut.owner).or_default().push(VarDeclaration {
                name: Identifier::with_field(name, shortcut.field),
                init: Some(key.1.to_expression(shortcut.negative)),
                span: crate::span::Span::dummy(),
            });
            shortcuts.insert(key, shortcut);
        }
        if shortcuts.is_empty() {
            return Ok(false);
        }
        debug!(count = shortcuts.len(), "literal shortcuts created");

        walker.mode = Mode::Replace;
        walker.shortcuts = shortcuts;
        walker.declarations = declarations;
        walker.visit_program_mut(program);
        Ok(true)
    }
}

/// A literal value, numbers by bit pattern of their magnitude.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Literal {
    String(String),
    Number(u64),
}

impl Literal {
    /// Printed length of the literal.
    fn text_len(&self) -> usize {
        match self {
            Literal::String(value) => quote_string(value).len(),
            Literal::Number(bits) => format_number(f64::from_bits(*bits)).len(),
        }
    }

    fn to_expression(&self, negative: bool) -> Expression {
        match self {
            Literal::String(value) => Expression::synthetic(ExpressionKind::String(value.clone())),
            Literal::Number(bits) => {
                let value = f64::from_bits(*bits);
                Expression::number(if negative { -value } else { value })
            }
        }
    }
}

/// The literal in `expr`, and whether it appears negated (`-5`).
fn literal_of(expr: &Expression) -> Option<(Literal, bool)> {
    match &expr.kind {
        ExpressionKind::String(value) => Some((Literal::String(value.clone()), false)),
        ExpressionKind::Number(value) => Some((Literal::Number(value.to_bits()), false)),
        ExpressionKind::Unary(UnaryOp::Minus, operand) => match operand.kind {
            ExpressionKind::Number(value) => Some((Literal::Number(value.to_bits()), true)),
            _ => None,
        },
        _ => None,
    }
}

/// Occurrences grouped under the top-level function they appear in.
type GroupKey = (ScopeId, Literal);

#[derive(Debug, Default)]
struct Occurrences {
    count: usize,
    negated: usize,
    scopes: Vec<ScopeId>,
}

#[derive(Debug, Clone, Copy)]
struct Shortcut {
    field: FieldId,
    owner: ScopeId,
    /// The variable holds the negated value.
    negative: bool,
}

/// Decides whether a group pays for a variable, and if so creates its
/// field in the innermost function enclosing every occurrence.
fn plan_shortcut(scopes: &mut ScopeTree, literal: &Literal, group: &Occurrences) -> Option<Shortcut> {
    let len = literal.text_len();
    if len <= 1 || group.count * (len - 1) <= len + 7 {
        return None;
    }
    let lca = group
        .scopes
        .iter()
        .copied()
        .reduce(|a, b| lowest_common_scope(scopes, a, b))?;
    let owner = scopes.function_scope_of(lca);
    if owner == scopes.global() {
        return None;
    }
    let resolved = scopes.subtree(owner).into_iter().all(|id| {
        let scope = scopes.scope(id);
        scope.is_known_at_compile_time && !scope.has_direct_eval
    });
    if !resolved {
        return None;
    }
    Some(Shortcut {
        field: scopes.create_generated_field(owner),
        owner,
        negative: group.negated * 2 > group.count,
    })
}

fn lowest_common_scope(scopes: &ScopeTree, a: ScopeId, b: ScopeId) -> ScopeId {
    let mut current = a;
    loop {
        if scopes.is_ancestor_or_self(current, b) {
            return current;
        }
        match scopes.scope(current).parent {
            Some(parent) => current = parent,
            None => return current,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Collect,
    Replace,
}

/// One walker for both passes over the tree, so the replacing pass sees
/// exactly the occurrences the collecting pass counted.
struct LiteralWalker<'a> {
    scopes: &'a mut ScopeTree,
    mode: Mode,
    stack: Vec<ScopeId>,
    groups: IndexMap<GroupKey, Occurrences>,
    shortcuts: FxHashMap<GroupKey, Shortcut>,
    declarations: FxHashMap<ScopeId, Vec<VarDeclaration>>,
}

impl<'a> LiteralWalker<'a> {
    fn new(scopes: &'a mut ScopeTree, mode: Mode) -> Self {
        Self {
            scopes,
            mode,
            stack: Vec::new(),
            groups: IndexMap::new(),
            shortcuts: FxHashMap::default(),
            declarations: FxHashMap::default(),
        }
    }

    fn current(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or_else(|| self.scopes.global())
    }

    /// The outermost function around the current position.
    fn top_level(&self) -> Option<ScopeId> {
        self.stack.get(1).copied()
    }

    fn with_scope(&mut self, scope: Option<ScopeId>, f: impl FnOnce(&mut Self)) {
        if let Some(scope) = scope {
            self.stack.push(scope);
            f(self);
            self.stack.pop();
        } else {
            f(self);
        }
    }

    fn literal(&mut self, expr: &mut Expression, literal: Literal, negated: bool) {
        let Some(top) = self.top_level() else {
            return;
        };
        let scope = self.current();
        let key = (top, literal);
        match self.mode {
            Mode::Collect => {
                let group = self.groups.entry(key).or_default();
                group.count += 1;
                group.negated += usize::from(negated);
                group.scopes.push(scope);
            }
            Mode::Replace => {
                let Some(shortcut) = self.shortcuts.get(&key).copied() else {
                    return;
                };
                let field = self.reference_to(shortcut.field, scope);
                let name = self.scopes.field(shortcut.field).name.clone();
                let reference = Expression::new(
                    ExpressionKind::Identifier(Identifier::with_field(name, field)),
                    expr.span,
                );
                *expr = if negated == shortcut.negative {
                    reference
                } else {
                    Expression::unary(UnaryOp::Minus, reference)
                };
            }
        }
    }

    /// A field in `scope` referring to `field`, with aliases created in
    /// every scope between it and the declaring one.
    fn reference_to(&mut self, field: FieldId, scope: ScopeId) -> FieldId {
        let owner = self.scopes.field(field).scope;
        let mut chain = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            if id == owner {
                break;
            }
            chain.push(id);
            current = self.scopes.scope(id).parent;
        }
        let mut reference = field;
        for &id in chain.iter().rev() {
            reference = self.scopes.create_alias(id, reference);
        }
        if reference != field {
            self.scopes.reserve_alias(reference);
        }
        self.scopes.add_reference(reference);
        reference
    }

    fn insert_declarations(&mut self, scope: Option<ScopeId>, body: &mut Block) {
        let Some(declarations) = scope.and_then(|id| self.declarations.remove(&id)) else {
            return;
        };
        let at = body.insertion_point();
        match body.statements.get_mut(at) {
            Some(Statement::Var(var)) => {
                var.declarations.splice(0..0, declarations);
            }
            _ => {
                body.insert(
                    at,
                    Statement::Var(VarStatement {
                        declarations,
                        span: crate::span::Span::dummy(),
                    }),
                );
            }
        }
    }
}

impl VisitMut for LiteralWalker<'_> {
    fn visit_program_mut(&mut self, program: &mut Program) {
        self.stack.clear();
        self.with_scope(program.scope, |walker| walk_program_mut(walker, program));
    }

    fn visit_function_mut(&mut self, func: &mut FunctionNode) {
        self.with_scope(func.scope, |walker| walk_function_mut(walker, func));
        if self.mode == Mode::Replace {
            self.insert_declarations(func.scope, &mut func.body);
        }
    }

    fn visit_catch_clause_mut(&mut self, clause: &mut CatchClause) {
        self.with_scope(clause.scope, |walker| walk_catch_clause_mut(walker, clause));
    }

    fn visit_statement_mut(&mut self, statement: &mut Statement) {
        match statement {
            // Directives must stay string literals.
            Statement::Expression(expr) if expr.is_string_literal() => {}
            Statement::With(with) => {
                let scope = with.scope;
                self.visit_expression_mut(&mut with.object);
                self.with_scope(scope, |walker| walker.visit_statement_mut(&mut with.body));
            }
            _ => walk_statement_mut(self, statement),
        }
    }

    fn visit_expression_mut(&mut self, expr: &mut Expression) {
        if let Some((literal, negated)) = literal_of(expr) {
            self.literal(expr, literal, negated);
            return;
        }
        match &mut expr.kind {
            ExpressionKind::Unary(UnaryOp::Delete, _) => {}
            // `typeof x == "string"` keeps its type name inline.
            ExpressionKind::Binary(op, left, right)
                if matches!(
                    op,
                    BinaryOp::Equal | BinaryOp::NotEqual | BinaryOp::StrictEqual | BinaryOp::StrictNotEqual
                ) && (is_typeof(left) || is_typeof(right)) =>
            {
                for side in [left, right] {
                    if !side.is_string_literal() {
                        self.visit_expression_mut(side);
                    }
                }
            }
            _ => walk_expression_mut(self, expr),
        }
    }
}

fn is_typeof(expr: &Expression) -> bool {
    matches!(expr.kind, ExpressionKind::Unary(UnaryOp::Typeof, _))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::CodeGenerator;
    use crate::optimizer::test_support::bound;
    use crate::scope::resolver;

    fn shortcut(source: &str) -> String {
        let settings = CodeSettings::default();
        let (mut program, mut tree, handler) = bound(source, &settings);
        resolver::analyze_scope(&mut tree, handler.as_ref());
        resolver::reserve_fields(&mut tree, &settings);
        LiteralShortcutPass::new(&settings)
            .run(&mut program, &mut tree)
            .expect("pass failed");
        resolver::hyper_crunch(&mut tree, &settings);
        resolver::validate_generated_names(&mut tree);
        CodeGenerator::new(&settings).with_scopes(&tree).generate(&program)
    }

    #[test]
    fn test_repeated_string_becomes_variable() {
        assert_eq!(
            shortcut("function f(){ return ['abc', 'abc', 'abc', 'abc', 'abc']; }"),
            "function f(){var a=\"abc\";return[a,a,a,a,a]}"
        );
    }

    #[test]
    fn test_too_few_occurrences_stay_inline() {
        assert_eq!(
            shortcut("function f(){ return ['abc', 'abc', 'abc']; }"),
            "function f(){return[\"abc\",\"abc\",\"abc\"]}"
        );
    }

    #[test]
    fn test_global_code_is_left_alone() {
        let output = shortcut("x = ['abc', 'abc', 'abc', 'abc', 'abc'];");
        assert_eq!(output.matches("\"abc\"").count(), 5);
    }

    #[test]
    fn test_majority_negated_numbers_store_negative() {
        assert_eq!(
            shortcut("function f(){ return [-12345, -12345, -12345, -12345, 12345]; }"),
            "function f(){var a=-12345;return[a,a,a,a,-a]}"
        );
    }

    #[test]
    fn test_shared_by_nested_function() {
        let output = shortcut(
            "function f(){ x('abcdef'); function g(){ y('abcdef', 'abcdef', 'abcdef'); } g(); }",
        );
        assert_eq!(output.matches("\"abcdef\"").count(), 1);
        assert!(output.starts_with("function f(){var "));
    }

    #[test]
    fn test_prepends_to_existing_var() {
        assert_eq!(
            shortcut("function f(){ var x = 1; return [x, 'abc', 'abc', 'abc', 'abc', 'abc']; }"),
            "function f(){var a=\"abc\",b=1;return[b,a,a,a,a,a]}"
        );
    }

    #[test]
    fn test_typeof_comparisons_keep_literal() {
        let output = shortcut(
            "function f(a,b,c,d){ return typeof a=='string'||typeof b=='string'||typeof c=='string'||typeof d=='string'; }",
        );
        assert_eq!(output.matches("\"string\"").count(), 4);
    }

    #[test]
    fn test_directives_are_not_replaced() {
        let output = shortcut(
            "function f(){ 'use strict'; return ['use strict', 'use strict', 'use strict', 'use strict']; }",
        );
        assert!(output.starts_with("function f(){\"use strict\";var a=\"use strict\";"));
    }

    #[test]
    fn test_disabled_by_kill_switch() {
        let mut settings = CodeSettings::default();
        settings.disable(TreeModifications::COMBINE_DUPLICATE_LITERALS);
        let (mut program, mut tree, handler) =
            bound("function f(){ return ['abc', 'abc', 'abc', 'abc', 'abc']; }", &settings);
        resolver::analyze_scope(&mut tree, handler.as_ref());
        resolver::reserve_fields(&mut tree, &settings);
        let changed = LiteralShortcutPass::new(&settings)
            .run(&mut program, &mut tree)
            .expect("pass failed");
        assert!(!changed);
        assert_eq!(tree.phase(), ResolverPhase::LiteralsShortcut);
    }
}
