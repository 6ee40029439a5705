//! Bottom-up peephole rewrites.
//!
//! Children are rewritten before their parents, so every rule sees the
//! final form of the statements it inspects. Statement rules run from
//! `visit_statement_mut`, list rules from `visit_block_mut`, and rules
//! that depend on being at the end of a function from `visit_function_mut`.

use super::{allowed, merge_adjacent_vars, unnest_blocks, LogicalNot, OptimizationPass};
use crate::ast::visit::{
    walk_block_mut, walk_expression, walk_function, walk_function_mut, walk_statement,
    walk_statement_mut, walk_switch_case_mut, VisitMut, Visitor,
};
use crate::ast::*;
use crate::codegen::{expression_len, statement_len};
use crate::config::{CodeSettings, TreeModifications};
use crate::diagnostics::{DiagnosticCode, DiagnosticHandler};
use crate::errors::CompilationError;
use crate::scope::{FieldId, FieldKind, ScopeId, ScopeKind, ScopeTree};
use crate::span::Span;

use tracing::trace;

pub struct AnalyzeNodesPass<'a> {
    settings: &'a CodeSettings,
    handler: &'a dyn DiagnosticHandler,
}

impl<'a> AnalyzeNodesPass<'a> {
    pub fn new(settings: &'a CodeSettings, handler: &'a dyn DiagnosticHandler) -> Self {
        Self { settings, handler }
    }
}

impl OptimizationPass for AnalyzeNodesPass<'_> {
    fn name(&self) -> &'static str {
        "analyze-nodes"
    }

    fn run(
        &mut self,
        program: &mut Program,
        scopes: &mut ScopeTree,
    ) -> Result<bool, CompilationError> {
        if !self.settings.minify_code {
            return Ok(false);
        }
        let mut analyzer = NodeAnalyzer {
            settings: self.settings,
            handler: self.handler,
            scopes,
            not: LogicalNot::new(self.settings),
            changed: false,
        };
        analyzer.visit_program_mut(program);
        Ok(analyzer.changed)
    }
}

struct NodeAnalyzer<'a> {
    settings: &'a CodeSettings,
    handler: &'a dyn DiagnosticHandler,
    scopes: &'a mut ScopeTree,
    not: LogicalNot<'a>,
    changed: bool,
}

impl VisitMut for NodeAnalyzer<'_> {
    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
        self.optimize_statements(&mut block.statements);
    }

    fn visit_function_mut(&mut self, func: &mut FunctionNode) {
        walk_function_mut(self, func);
        self.optimize_function_end(&mut func.body.statements);
        self.remove_unused_parameters(func);
    }

    fn visit_switch_case_mut(&mut self, case: &mut SwitchCase) {
        walk_switch_case_mut(self, case);
        if self.removes_dead_code(TreeModifications::REMOVE_UNREACHABLE_CODE) {
            self.remove_unreachable(&mut case.body);
        }
    }

    fn visit_statement_mut(&mut self, statement: &mut Statement) {
        walk_statement_mut(self, statement);
        if matches!(statement, Statement::If(_)) {
            return self.optimize_if(statement);
        }
        if matches!(statement, Statement::While(_)) {
            return self.optimize_while(statement);
        }
        match statement {
            Statement::Expression(expr) => self.reduce(expr, ParenContext::TOP, true),
            Statement::Var(var) => {
                for decl in &mut var.declarations {
                    if let Some(init) = &mut decl.init {
                        self.reduce(init, ParenContext::LIST_ITEM, false);
                    }
                }
            }
            Statement::DoWhile(do_while) => self.reduce(&mut do_while.test, ParenContext::TOP, true),
            Statement::For(for_stmt) => {
                if let Some(ForInit::Expression(init)) = &mut for_stmt.init {
                    self.reduce(init, ParenContext::TOP, true);
                }
                if let Some(test) = &mut for_stmt.test {
                    self.reduce(test, ParenContext::TOP, true);
                }
                if let Some(update) = &mut for_stmt.update {
                    self.reduce(update, ParenContext::TOP, true);
                }
            }
            Statement::ForIn(for_in) => self.reduce(&mut for_in.right, ParenContext::TOP, false),
            Statement::Switch(switch) => {
                self.reduce(&mut switch.discriminant, ParenContext::TOP, false);
                self.clean_switch(switch);
            }
            Statement::Return(ret) => {
                if let Some(argument) = &mut ret.argument {
                    self.reduce(argument, ParenContext::TOP, false);
                }
                self.simplify_return(ret);
            }
            Statement::Throw(throw) => self.reduce(&mut throw.argument, ParenContext::TOP, false),
            Statement::With(with) => self.reduce(&mut with.object, ParenContext::TOP, false),
            _ => {}
        }
    }
}

impl NodeAnalyzer<'_> {
    fn allowed(&self, modification: TreeModifications) -> bool {
        allowed(self.settings, modification)
    }

    fn removes_dead_code(&self, modification: TreeModifications) -> bool {
        self.settings.remove_unneeded_code && self.allowed(modification)
    }

    // ----- logical not -------------------------------------------------

    /// Rewrites `!x` subexpressions into cheaper negations of `x`, children
    /// first. `condition` is set where only the truthiness of the value is
    /// observed, which frees the rewrite from having to produce a boolean.
    fn reduce(&mut self, expr: &mut Expression, slot: ParenContext, condition: bool) {
        if !self.allowed(TreeModifications::REDUCE_LOGICAL_NOT) {
            return;
        }
        self.reduce_children(expr, condition);
        if self.not.reduce_not(expr, slot, !condition) {
            trace!("reduced logical not");
            self.changed = true;
        }
    }

    fn reduce_children(&mut self, expr: &mut Expression, condition: bool) {
        match &mut expr.kind {
            ExpressionKind::Unary(UnaryOp::Not, operand) => {
                self.reduce(operand, ParenContext::UNARY, true)
            }
            ExpressionKind::Unary(_, operand) => self.reduce(operand, ParenContext::UNARY, false),
            ExpressionKind::Binary(op, left, right) => {
                let op = *op;
                let (left_condition, right_condition) = if op.is_logical() {
                    (condition, condition)
                } else if op == BinaryOp::Comma {
                    (true, condition)
                } else {
                    (false, false)
                };
                self.reduce(left, ParenContext::binary(op, Side::Left), left_condition);
                self.reduce(right, ParenContext::binary(op, Side::Right), right_condition);
            }
            ExpressionKind::Conditional(test, consequent, alternate) => {
                self.reduce(test, ParenContext::CONDITIONAL_TEST, true);
                self.reduce(consequent, ParenContext::CONDITIONAL_BRANCH, condition);
                self.reduce(alternate, ParenContext::CONDITIONAL_BRANCH, condition);
            }
            ExpressionKind::Member(object, _) => {
                self.reduce(object, ParenContext::MEMBER_OBJECT, false)
            }
            ExpressionKind::Index(object, index) => {
                self.reduce(object, ParenContext::MEMBER_OBJECT, false);
                self.reduce(index, ParenContext::TOP, false);
            }
            ExpressionKind::Call(callee, args) => {
                self.reduce(callee, ParenContext::MEMBER_OBJECT, false);
                for arg in args {
                    self.reduce(arg, ParenContext::LIST_ITEM, false);
                }
            }
            ExpressionKind::New(_, Some(args)) => {
                for arg in args {
                    self.reduce(arg, ParenContext::LIST_ITEM, false);
                }
            }
            ExpressionKind::Array(elements) => {
                for element in elements.iter_mut().flatten() {
                    self.reduce(element, ParenContext::LIST_ITEM, false);
                }
            }
            ExpressionKind::Object(properties) => {
                for property in properties {
                    if property.kind == PropertyKind::Init {
                        self.reduce(&mut property.value, ParenContext::LIST_ITEM, false);
                    }
                }
            }
            _ => {}
        }
    }

    // ----- statements --------------------------------------------------

    fn optimize_if(&mut self, statement: &mut Statement) {
        let Statement::If(if_stmt) = statement else {
            return;
        };
        self.reduce(&mut if_stmt.test, ParenContext::TOP, true);

        if self.removes_dead_code(TreeModifications::EVALUATE_CONSTANT_CONDITIONS) {
            if let Some(truthy) = if_stmt.test.constant_truthiness() {
                if let Statement::If(if_stmt) = std::mem::replace(statement, Statement::empty()) {
                    *statement = fold_constant_if(if_stmt, truthy);
                    self.changed = true;
                }
                return;
            }
        }

        if self.allowed(TreeModifications::REMOVE_EMPTY_IF_PARTS) && self.remove_empty_if_parts(statement) {
            self.changed = true;
        }
        let Statement::If(if_stmt) = statement else {
            return;
        };

        if self.allowed(TreeModifications::IF_NOT_SWAP_BRANCHES)
            && if_stmt.alternate.is_some()
            && self.not.measure(&if_stmt.test) < 0
        {
            let mut swapped = if_stmt.clone();
            self.not.apply(&mut swapped.test);
            if let Some(alternate) = swapped.alternate.as_mut() {
                std::mem::swap(&mut swapped.consequent, alternate);
            }
            let candidate = Statement::If(swapped);
            if statement_len(&candidate, self.settings) < statement_len(statement, self.settings) {
                *statement = candidate;
                self.changed = true;
            }
        }

        if let Some(candidate) = self.if_as_expression(statement) {
            if statement_len(&candidate, self.settings) < statement_len(statement, self.settings) {
                *statement = candidate;
                self.changed = true;
            }
        }
    }

    /// Drops an empty `else`, and turns an empty `then` into either the bare
    /// test or a negated test guarding the `else` branch.
    fn remove_empty_if_parts(&mut self, statement: &mut Statement) -> bool {
        let Statement::If(if_stmt) = statement else {
            return false;
        };
        let mut changed = false;
        if if_stmt.alternate.as_ref().is_some_and(|a| a.is_empty_statement()) {
            if_stmt.alternate = None;
            changed = true;
        }
        if !if_stmt.consequent.is_empty_statement() {
            return changed;
        }
        match if_stmt.alternate.take() {
            None => {
                let test = Expression::take(&mut if_stmt.test);
                *statement = Statement::Expression(test);
            }
            Some(alternate) => {
                self.not.apply(&mut if_stmt.test);
                if_stmt.consequent = alternate;
            }
        }
        true
    }

    /// `if(c)a` as `c&&a` or `!c||a`, and `if(c)a;else b` as `c?a:b`, when
    /// every branch is made of expression statements. Returns the shortest
    /// candidate.
    fn if_as_expression(&self, statement: &Statement) -> Option<Statement> {
        let Statement::If(if_stmt) = statement else {
            return None;
        };
        let consequent = expression_only(&if_stmt.consequent)?;
        let expr = match &if_stmt.alternate {
            Some(alternate) => {
                if !self.allowed(TreeModifications::IF_ELSE_TO_CONDITIONAL) {
                    return None;
                }
                let alternate = expression_only(alternate)?;
                Expression::conditional(if_stmt.test.clone(), consequent, alternate)
            }
            None => {
                if !self.allowed(TreeModifications::IF_TO_LOGICAL_EXPRESSION) {
                    return None;
                }
                let mut negated = if_stmt.test.clone();
                self.not.apply_in(
                    &mut negated,
                    ParenContext::TOP,
                    ParenContext::binary(BinaryOp::LogicalOr, Side::Left),
                );
                let or = Expression::binary(BinaryOp::LogicalOr, negated, consequent.clone());
                let and = Expression::binary(BinaryOp::LogicalAnd, if_stmt.test.clone(), consequent);
                let slot = ParenContext::TOP;
                if expression_len(&or, slot, self.settings) < expression_len(&and, slot, self.settings) {
                    or
                } else {
                    and
                }
            }
        };
        Some(Statement::Expression(Expression::new(expr.kind, if_stmt.span)))
    }

    fn optimize_while(&mut self, statement: &mut Statement) {
        let Statement::While(while_stmt) = statement else {
            return;
        };
        self.reduce(&mut while_stmt.test, ParenContext::TOP, true);
        if self.removes_dead_code(TreeModifications::EVALUATE_CONSTANT_CONDITIONS)
            && while_stmt.test.constant_truthiness() == Some(false)
        {
            let survivors = surviving_declarations(&while_stmt.body);
            *statement = statements_as_one(survivors, while_stmt.span);
            self.changed = true;
        }
    }

    /// `return void 0` and `return undefined` are plain `return`.
    fn simplify_return(&mut self, ret: &mut ReturnStatement) {
        if !self.allowed(TreeModifications::REMOVE_REDUNDANT_RETURN) {
            return;
        }
        let redundant = match &ret.argument {
            Some(argument) if argument.is_void_zero() => true,
            Some(argument) => argument
                .as_identifier()
                .filter(|ident| ident.name == "undefined")
                .and_then(|ident| ident.field)
                .is_some_and(|field| {
                    self.scopes.field(self.scopes.ultimate(field)).kind == FieldKind::Predefined
                }),
            None => false,
        };
        if redundant {
            ret.argument = None;
            self.changed = true;
        }
    }

    // ----- switch ------------------------------------------------------

    fn clean_switch(&mut self, switch: &mut SwitchStatement) {
        let strip_break = self.allowed(TreeModifications::REMOVE_TRAILING_BREAK);
        if strip_break {
            self.strip_trailing_break(switch);
        }
        while let Some(index) = self.removable_case(switch) {
            let removed = switch.cases.remove(index);
            let (code, message) = match removed.test {
                None => (DiagnosticCode::RedundantDefault, "Redundant default case"),
                Some(_) => (DiagnosticCode::RedundantCase, "Redundant case"),
            };
            self.handler.emit(code, removed.span, message);
            self.changed = true;

            // The case before fell through into a break; keep it exiting.
            if index > 0 && index < switch.cases.len() {
                let previous = &mut switch.cases[index - 1];
                if !previous.body.last().is_some_and(Statement::is_jump) {
                    previous.body.push(Statement::Break(JumpStatement {
                        label: None,
                        span: Span::dummy(),
                    }));
                }
            }
        }
        if strip_break {
            self.strip_trailing_break(switch);
        }
    }

    fn strip_trailing_break(&mut self, switch: &mut SwitchStatement) {
        if let Some(last) = switch.cases.last_mut() {
            if last.body.last().is_some_and(Statement::is_unlabeled_break) {
                last.body.pop();
                self.changed = true;
            }
        }
    }

    /// The last case that does nothing but leave the switch, if removing it
    /// cannot change which code runs.
    fn removable_case(&self, switch: &SwitchStatement) -> Option<usize> {
        let has_default = switch.default_index().is_some();
        let last = switch.cases.len().checked_sub(1)?;
        (0..switch.cases.len()).rev().find(|&i| {
            let case = &switch.cases[i];
            let does_nothing = match case.body.as_slice() {
                [] => i == last,
                [only] => only.is_unlabeled_break(),
                _ => false,
            };
            if !does_nothing {
                return false;
            }
            match &case.test {
                None => self.allowed(TreeModifications::REMOVE_EMPTY_DEFAULT_CASE),
                Some(test) => {
                    !has_default
                        && self.allowed(TreeModifications::REMOVE_EMPTY_CASES)
                        && (test.is_constant() || test.as_identifier().is_some())
                }
            }
        })
    }

    // ----- statement lists ---------------------------------------------

    fn optimize_statements(&mut self, statements: &mut Vec<Statement>) {
        if self.allowed(TreeModifications::UNNEST_BLOCKS) {
            self.changed |= unnest_blocks(statements);
        }
        let before = statements.len();
        statements.retain(|s| !matches!(s, Statement::Empty(_)));
        self.changed |= statements.len() != before;

        if self.removes_dead_code(TreeModifications::REMOVE_UNREACHABLE_CODE) {
            self.remove_unreachable(statements);
        }
        if self.allowed(TreeModifications::COMBINE_ADJACENT_VAR_STATEMENTS) {
            self.changed |= merge_adjacent_vars(statements);
        }
        if self.allowed(TreeModifications::COMBINE_CONDITIONAL_COMMENTS) {
            self.changed |= merge_conditional_comments(statements);
        }
        if self.removes_dead_code(TreeModifications::REMOVE_UNUSED_FUNCTIONS) {
            self.remove_unused_functions(statements);
        }
        if self.allowed(TreeModifications::VAR_INITIALIZER_RETURN) {
            self.collapse_var_return(statements);
        }
        self.collapse_returns(statements);
    }

    /// Drops everything after the first jump except declarations, which
    /// are hoisted and so still visible.
    fn remove_unreachable(&mut self, statements: &mut Vec<Statement>) {
        let Some(jump) = statements.iter().position(Statement::is_jump) else {
            return;
        };
        if jump + 1 >= statements.len() {
            return;
        }
        let dead = statements.split_off(jump + 1);
        let mut survivors = Vec::new();
        let mut reported = false;
        for statement in dead {
            match statement {
                Statement::Function(_) | Statement::ImportantComment(_) => survivors.push(statement),
                Statement::Var(_) | Statement::Empty(_) => {
                    survivors.extend(surviving_declarations(&statement));
                }
                other => {
                    if !reported {
                        self.handler.emit(
                            DiagnosticCode::UnreachableCode,
                            other.span(),
                            "Unreachable code",
                        );
                        reported = true;
                    }
                    survivors.extend(surviving_declarations(&other));
                }
            }
        }
        merge_adjacent_vars(&mut survivors);
        statements.extend(survivors);
        self.changed = true;
    }

    fn remove_unused_functions(&mut self, statements: &mut Vec<Statement>) {
        let mut i = 0;
        while i < statements.len() {
            let unused = match &statements[i] {
                Statement::Function(func) => self.is_unused_function(func),
                _ => false,
            };
            if unused {
                let removed = statements.remove(i);
                release_references(self.scopes, &removed);
                self.changed = true;
            } else {
                i += 1;
            }
        }
    }

    fn is_unused_function(&self, func: &FunctionNode) -> bool {
        let Some(field) = func.name.as_ref().and_then(|name| name.field) else {
            return false;
        };
        let scope = self.scopes.field(field).scope;
        self.scopes.scope(scope).kind != ScopeKind::Global
            && self.is_statically_resolved(scope)
            && self.scopes.total_references(field) == 0
    }

    /// No code in `scope` or below it can look names up at runtime.
    fn is_statically_resolved(&self, scope: ScopeId) -> bool {
        self.scopes.subtree(scope).into_iter().all(|id| {
            let record = self.scopes.scope(id);
            record.is_known_at_compile_time && !record.has_direct_eval
        })
    }

    /// `var x = e; return x;` as `return e;`.
    ///
    /// Matches the last two statements of any block, not only two-statement
    /// bodies. Requiring the return to be the only reference to `x` keeps
    /// earlier statements from observing the dropped binding.
    fn collapse_var_return(&mut self, statements: &mut Vec<Statement>) {
        let len = statements.len();
        if len < 2 {
            return;
        }
        let (Statement::Var(var), Statement::Return(ret)) = (&statements[len - 2], &statements[len - 1])
        else {
            return;
        };
        let [decl] = var.declarations.as_slice() else {
            return;
        };
        let (Some(init), Some(argument)) = (&decl.init, &ret.argument) else {
            return;
        };
        let Some(returned) = argument.as_identifier().and_then(|ident| ident.field) else {
            return;
        };
        let Some(declared) = decl.name.field else {
            return;
        };
        let field = self.scopes.ultimate(declared);
        if field != self.scopes.ultimate(returned) || !self.is_private_local(field) {
            return;
        }

        let collapsed = Statement::Return(ReturnStatement {
            argument: Some(init.clone()),
            span: var.span.combine(&ret.span),
        });
        statements.truncate(len - 2);
        statements.push(collapsed);
        self.scopes.remove_reference(returned);
        self.scopes.field_mut(field).is_declared = false;
        self.changed = true;
    }

    /// A function-local variable with exactly one reference and nothing
    /// able to reach it by name.
    fn is_private_local(&self, field: FieldId) -> bool {
        let record = self.scopes.field(field);
        record.kind == FieldKind::Local
            && self.scopes.scope(record.scope).kind != ScopeKind::Global
            && self.is_statically_resolved(record.scope)
            && self.scopes.total_references(field) == 1
    }

    /// Folds `if(c)return a;else return b` and `if(c)return a;return b`
    /// into `return c?a:b`, from the end of the list backwards so each fold
    /// can feed the next.
    fn collapse_returns(&mut self, statements: &mut Vec<Statement>) {
        let if_else = self.allowed(TreeModifications::IF_ELSE_RETURN_TO_CONDITIONAL);
        let cascade = self.allowed(TreeModifications::IF_RETURN_CASCADE);
        let mut i = statements.len();
        while i > 0 {
            i -= 1;
            if if_else {
                if let Some(folded) = fold_if_else_return(&statements[i]) {
                    statements[i] = folded;
                    self.changed = true;
                }
            }
            if cascade && i + 1 < statements.len() {
                if let Some(folded) = fold_return_pair(&statements[i], &statements[i + 1]) {
                    statements[i] = folded;
                    statements.remove(i + 1);
                    self.changed = true;
                }
            }
        }
    }

    /// Rules that only hold at the very end of a function body, where
    /// falling off the end returns `undefined`.
    fn optimize_function_end(&mut self, statements: &mut Vec<Statement>) {
        if self.allowed(TreeModifications::REMOVE_REDUNDANT_RETURN)
            && matches!(statements.last(), Some(Statement::Return(ret)) if ret.argument.is_none())
        {
            statements.pop();
            self.changed = true;
        }

        if !self.allowed(TreeModifications::IF_RETURN_CASCADE) {
            return;
        }
        let Some(last) = statements.last() else {
            return;
        };
        let Some(folded) = fold_final_if_return(last) else {
            return;
        };
        let original = statements.len() - 1;
        statements[original] = folded;
        self.collapse_returns(statements);

        if !self.allowed(TreeModifications::RETURN_VOID_REVERSAL) {
            self.changed = true;
            return;
        }
        let Some(last) = statements.last_mut() else {
            return;
        };
        if let Some(expanded) = expand_void_return(last) {
            if statement_len(&expanded, self.settings) <= statement_len(last, self.settings) {
                *last = expanded;
                // Nothing cascaded into the fold, so the tree is as before.
                return;
            }
        }
        self.changed = true;
    }

    /// Removes trailing parameters nothing reads.
    fn remove_unused_parameters(&mut self, func: &mut FunctionNode) {
        if !self.removes_dead_code(TreeModifications::REMOVE_UNUSED_PARAMETERS)
            || func.kind == FunctionKind::Setter
        {
            return;
        }
        let Some(scope) = func.scope else {
            return;
        };
        if !self.is_statically_resolved(scope) {
            return;
        }
        if let Some(arguments) = self.scopes.lookup_local(scope, "arguments") {
            if self.scopes.total_references(arguments) > 0 {
                return;
            }
        }
        while let Some(last) = func.params.last() {
            match last.field {
                Some(field) if self.scopes.total_references(field) == 0 => {
                    func.params.pop();
                    self.changed = true;
                }
                _ => break,
            }
        }
    }
}

/// The branch of a constant `if` that can run, plus the declarations of
/// the one that cannot.
fn fold_constant_if(if_stmt: IfStatement, truthy: bool) -> Statement {
    let IfStatement {
        consequent,
        alternate,
        span,
        ..
    } = if_stmt;
    let (taken, skipped) = if truthy {
        (Some(consequent), alternate)
    } else {
        (alternate, Some(consequent))
    };
    let mut statements: Vec<Statement> = taken.map(|s| vec![*s]).unwrap_or_default();
    if let Some(skipped) = skipped {
        statements.extend(surviving_declarations(&skipped));
    }
    statements_as_one(statements, span)
}

fn statements_as_one(mut statements: Vec<Statement>, span: Span) -> Statement {
    match statements.len() {
        0 => Statement::Empty(span),
        1 => statements.remove(0),
        _ => Statement::Block(Block::new(statements, span)),
    }
}

/// The statement as one expression, when it is an expression statement or
/// a block of them.
fn expression_only(statement: &Statement) -> Option<Expression> {
    match statement {
        Statement::Expression(expr) => Some(expr.clone()),
        Statement::Block(block) => block
            .statements
            .iter()
            .map(|s| match s {
                Statement::Expression(expr) => Some(expr.clone()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?
            .into_iter()
            .reduce(|left, right| Expression::binary(BinaryOp::Comma, left, right)),
        _ => None,
    }
}

/// The argument of a statement that is `return x` or `{ return x }`.
fn single_return(statement: &Statement) -> Option<&Expression> {
    match statement {
        Statement::Return(ret) => ret.argument.as_ref(),
        Statement::Block(block) => match block.statements.as_slice() {
            [only] => single_return(only),
            _ => None,
        },
        _ => None,
    }
}

fn conditional_return(test: &Expression, consequent: &Expression, alternate: Expression, span: Span) -> Statement {
    Statement::Return(ReturnStatement {
        argument: Some(Expression::conditional(test.clone(), consequent.clone(), alternate)),
        span,
    })
}

fn fold_if_else_return(statement: &Statement) -> Option<Statement> {
    let Statement::If(if_stmt) = statement else {
        return None;
    };
    let consequent = single_return(&if_stmt.consequent)?;
    let alternate = single_return(if_stmt.alternate.as_deref()?)?;
    Some(conditional_return(&if_stmt.test, consequent, alternate.clone(), if_stmt.span))
}

fn fold_return_pair(first: &Statement, second: &Statement) -> Option<Statement> {
    let Statement::If(if_stmt) = first else {
        return None;
    };
    if if_stmt.alternate.is_some() {
        return None;
    }
    let consequent = single_return(&if_stmt.consequent)?;
    let Statement::Return(ReturnStatement {
        argument: Some(alternate),
        span,
    }) = second
    else {
        return None;
    };
    Some(conditional_return(
        &if_stmt.test,
        consequent,
        alternate.clone(),
        if_stmt.span.combine(span),
    ))
}

/// `if(c)return a` at the end of a function as `return c?a:void 0`.
fn fold_final_if_return(statement: &Statement) -> Option<Statement> {
    let Statement::If(if_stmt) = statement else {
        return None;
    };
    if if_stmt.alternate.is_some() {
        return None;
    }
    let consequent = single_return(&if_stmt.consequent)?;
    Some(conditional_return(
        &if_stmt.test,
        consequent,
        Expression::void_zero(),
        if_stmt.span,
    ))
}

/// `return c?a:void 0` back as `if(c)return a`.
fn expand_void_return(statement: &Statement) -> Option<Statement> {
    let Statement::Return(ReturnStatement {
        argument: Some(argument),
        span,
    }) = statement
    else {
        return None;
    };
    let ExpressionKind::Conditional(test, consequent, alternate) = &argument.kind else {
        return None;
    };
    if !alternate.is_void_zero() {
        return None;
    }
    Some(Statement::If(IfStatement {
        test: (**test).clone(),
        consequent: Box::new(Statement::Return(ReturnStatement {
            argument: Some((**consequent).clone()),
            span: *span,
        })),
        alternate: None,
        span: *span,
    }))
}

/// Joins adjacent `/*@ ... @*/` comments into one.
fn merge_conditional_comments(statements: &mut Vec<Statement>) -> bool {
    let mut changed = false;
    let mut merged: Vec<Statement> = Vec::with_capacity(statements.len());
    for statement in statements.drain(..) {
        if let (Some(Statement::ConditionalComment(previous)), Statement::ConditionalComment(next)) =
            (merged.last_mut(), &statement)
        {
            let head = previous.text.trim_end_matches("@*/").trim_end();
            let tail = next.text.trim_start_matches("/*@").trim_start();
            previous.text = format!("{} {}", head, tail);
            previous.span = previous.span.combine(&next.span);
            changed = true;
            continue;
        }
        merged.push(statement);
    }
    *statements = merged;
    changed
}

/// Declarations inside `statement` that stay in effect even if it never
/// runs: `var` names without their initializers, and function
/// declarations.
fn surviving_declarations(statement: &Statement) -> Vec<Statement> {
    let mut collector = DeclarationCollector::default();
    collector.visit_statement(statement);
    let mut survivors = collector.functions;
    if !collector.names.is_empty() {
        let span = collector.names[0].span;
        survivors.insert(
            0,
            Statement::Var(VarStatement {
                declarations: collector.names,
                span,
            }),
        );
    }
    survivors
}

#[derive(Default)]
struct DeclarationCollector {
    names: Vec<VarDeclaration>,
    functions: Vec<Statement>,
}

impl Visitor for DeclarationCollector {
    fn visit_statement(&mut self, statement: &Statement) {
        if let Statement::Function(_) = statement {
            self.functions.push(statement.clone());
            return;
        }
        walk_statement(self, statement);
    }

    fn visit_var_declaration(&mut self, decl: &VarDeclaration) {
        if !self.names.iter().any(|d| d.name.name == decl.name.name) {
            self.names.push(decl.name_only());
        }
    }

    fn visit_function(&mut self, _func: &FunctionNode) {}
}

/// Drops the references made from a subtree leaving the program.
fn release_references(scopes: &mut ScopeTree, statement: &Statement) {
    let mut releaser = ReferenceReleaser { scopes };
    releaser.visit_statement(statement);
}

struct ReferenceReleaser<'a> {
    scopes: &'a mut ScopeTree,
}

impl Visitor for ReferenceReleaser<'_> {
    fn visit_expression(&mut self, expr: &Expression) {
        if let ExpressionKind::Identifier(ident) = &expr.kind {
            if let Some(field) = ident.field {
                self.scopes.remove_reference(field);
            }
        }
        walk_expression(self, expr);
    }

    fn visit_function(&mut self, func: &FunctionNode) {
        if let Some(scope) = func.scope {
            self.scopes.detach(scope);
        }
        walk_function(self, func);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnosticHandler;
    use crate::optimizer::test_support::{bound, emit};

    fn analyzed_with(source: &str, settings: &CodeSettings) -> (String, Vec<DiagnosticCode>) {
        let (mut program, mut tree, _) = bound(source, settings);
        let handler = CollectingDiagnosticHandler::new();
        AnalyzeNodesPass::new(settings, &handler)
            .run(&mut program, &mut tree)
            .expect("pass failed");
        let codes = handler.get_diagnostics().into_iter().map(|d| d.code).collect();
        (emit(&program, settings), codes)
    }

    fn analyzed(source: &str) -> String {
        analyzed_with(source, &CodeSettings::default()).0
    }

    #[test]
    fn test_if_else_returns_become_conditional() {
        assert_eq!(
            analyzed("function f(a){ if (a) return 1; else return 2; }"),
            "function f(a){return a?1:2}"
        );
    }

    #[test]
    fn test_return_cascade() {
        assert_eq!(
            analyzed("function f(a,b){ if (a) return 1; if (b) return 2; return 3; }"),
            "function f(a,b){return a?1:b?2:3}"
        );
    }

    #[test]
    fn test_lone_final_if_return_is_kept() {
        assert_eq!(
            analyzed("function f(a){ g(); if (a) return 1; }"),
            "function f(a){g();if(a)return 1}"
        );
    }

    #[test]
    fn test_final_if_return_folds_into_cascade() {
        assert_eq!(
            analyzed("function f(a,b){ if (a) return 1; if (b) return 2; }"),
            "function f(a,b){return a?1:b?2:void 0}"
        );
    }

    #[test]
    fn test_var_then_return_collapses() {
        assert_eq!(
            analyzed("function f(a){ var x = a * 2; return x; }"),
            "function f(a){return a*2}"
        );
        assert_eq!(
            analyzed("function f(a){ var x = a * 2; g(x); return x; }"),
            "function f(a){var x=a*2;g(x);return x}"
        );
        assert_eq!(
            analyzed("function f(a){ g(); var x = a * 2; return x; }"),
            "function f(a){g();return a*2}"
        );
    }

    #[test]
    fn test_not_reduced_in_conditions() {
        assert_eq!(analyzed("if (!(a < b)) f();"), "a<b||f()");
        assert_eq!(analyzed("while (!(a <= b)) f();"), "while(a>b)f()");
        assert_eq!(analyzed("x = !(a < b);"), "x=a>=b");
        assert_eq!(analyzed("x = !!a;"), "x=!!a");
        assert_eq!(analyzed("if (!!a) f();"), "a&&f()");
    }

    #[test]
    fn test_assignment_stays_wrapped() {
        assert_eq!(analyzed("x = !(a = b);"), "x=!(a=b)");
    }

    #[test]
    fn test_if_else_with_not_swaps_branches() {
        assert_eq!(
            analyzed("function h(a){ if (!a) { f(); g(); } else return; }"),
            "function h(a){if(a)return;else{f();g()}}"
        );
    }

    #[test]
    fn test_if_else_swaps_when_negated_test_is_shorter() {
        assert_eq!(analyzed("if (!a || !b) f(); else g();"), "a&&b?g():f()");
        assert_eq!(analyzed("if (a != b) f(); else g();"), "a!=b?f():g()");
    }

    #[test]
    fn test_if_else_expressions_become_conditional() {
        assert_eq!(analyzed("if (a) f(); else g();"), "a?f():g()");
    }

    #[test]
    fn test_empty_branches() {
        assert_eq!(analyzed("if (a) {} else { f(); }"), "a||f()");
        assert_eq!(analyzed("if (a()) {}"), "a()");
    }

    #[test]
    fn test_constant_conditions_keep_declarations() {
        assert_eq!(analyzed("if (0) { var x = f(); g(); } h(x);"), "var x;h(x)");
        assert_eq!(analyzed("if (1) f(); else g();"), "f()");
        assert_eq!(analyzed("while (false) { var y = 1; }"), "var y");
    }

    #[test]
    fn test_unreachable_code_is_dropped() {
        let settings = CodeSettings::default();
        let (output, codes) = analyzed_with(
            "function f(){ return 1; g(); var x = 2; function h(){} }",
            &settings,
        );
        assert_eq!(output, "function f(){return 1;var x}");
        assert_eq!(codes, vec![DiagnosticCode::UnreachableCode]);
    }

    #[test]
    fn test_switch_cleanup() {
        let settings = CodeSettings::default();
        let (output, codes) = analyzed_with(
            "switch (x) { case 1: f(); break; case 2: break; case 3: break; }",
            &settings,
        );
        assert_eq!(output, "switch(x){case 1:f()}");
        assert_eq!(codes, vec![DiagnosticCode::RedundantCase, DiagnosticCode::RedundantCase]);
    }

    #[test]
    fn test_switch_keeps_cases_when_default_exists() {
        assert_eq!(
            analyzed("switch (x) { case 1: break; default: f(); }"),
            "switch(x){case 1:break;default:f()}"
        );
        assert_eq!(
            analyzed("switch (x) { case 1: f(); default: break; }"),
            "switch(x){case 1:f()}"
        );
    }

    #[test]
    fn test_switch_reattaches_break_on_fall_through() {
        assert_eq!(
            analyzed("switch (x) { case 1: f(); case 2: break; case 3: g(); }"),
            "switch(x){case 1:f();break;case 3:g()}"
        );
        assert_eq!(
            analyzed("switch (x) { case 1: case 2: break; case 3: g(); }"),
            "switch(x){case 3:g()}"
        );
    }

    #[test]
    fn test_redundant_returns() {
        assert_eq!(analyzed("function f(){ g(); return; }"), "function f(){g()}");
        assert_eq!(
            analyzed("function f(a){ if (a) return void 0; g(); }"),
            "function f(a){if(a)return;g()}"
        );
        assert_eq!(
            analyzed("function f(a){ if (a) return undefined; g(); }"),
            "function f(a){if(a)return;g()}"
        );
    }

    #[test]
    fn test_unused_functions_and_parameters() {
        assert_eq!(
            analyzed("function f(a, b, c){ function unused(){} return a; }"),
            "function f(a){return a}"
        );
        assert_eq!(
            analyzed("function f(a, b){ return arguments.length; }"),
            "function f(a,b){return arguments.length}"
        );
    }

    #[test]
    fn test_eval_blocks_removals() {
        assert_eq!(
            analyzed("function f(a){ function g(){} eval(a); }"),
            "function f(a){function g(){}eval(a)}"
        );
    }

    #[test]
    fn test_global_functions_are_kept() {
        assert_eq!(analyzed("function unused(){}"), "function unused(){}");
    }

    #[test]
    fn test_conditional_comments_merge() {
        assert_eq!(analyzed("/*@cc_on @*/ /*@if (x) @*/"), "/*@cc_on if (x) @*/");
    }

    #[test]
    fn test_kill_switch_disables_rule() {
        let mut settings = CodeSettings::default();
        settings.disable(TreeModifications::IF_ELSE_RETURN_TO_CONDITIONAL);
        let (output, _) = analyzed_with("function f(a){ if (a) return 1; else return 2; }", &settings);
        assert_eq!(output, "function f(a){if(a)return 1;else return 2}");
    }
}
