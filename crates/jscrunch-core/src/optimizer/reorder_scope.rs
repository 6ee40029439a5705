use super::{allowed, merge_adjacent_vars, unnest_blocks, OptimizationPass};
use crate::ast::visit::{walk_function_mut, walk_program_mut, VisitMut};
use crate::ast::*;
use crate::config::{CodeSettings, TreeModifications};
use crate::errors::CompilationError;
use crate::scope::ScopeTree;
use crate::span::Span;

use tracing::debug;

/// Hoists function declarations and `var` statements to the top of every
/// function body and of the program.
pub struct ReorderScopePass<'a> {
    settings: &'a CodeSettings,
    changed: bool,
}

impl<'a> ReorderScopePass<'a> {
    pub fn new(settings: &'a CodeSettings) -> Self {
        Self {
            settings,
            changed: false,
        }
    }
}

impl OptimizationPass for ReorderScopePass<'_> {
    fn name(&self) -> &'static str {
        "reorder-scope"
    }

    fn run(
        &mut self,
        program: &mut Program,
        _scopes: &mut ScopeTree,
    ) -> Result<bool, CompilationError> {
        self.changed = false;
        if !self.settings.minify_code || !self.settings.reorder_scope_declarations {
            return Ok(false);
        }
        self.visit_program_mut(program);
        Ok(self.changed)
    }
}

impl VisitMut for ReorderScopePass<'_> {
    fn visit_program_mut(&mut self, program: &mut Program) {
        walk_program_mut(self, program);
        self.reorder(&mut program.body);
    }

    fn visit_function_mut(&mut self, func: &mut FunctionNode) {
        walk_function_mut(self, func);
        self.reorder(&mut func.body);
    }
}

impl ReorderScopePass<'_> {
    fn reorder(&mut self, body: &mut Block) {
        let statements = &mut body.statements;
        if allowed(self.settings, TreeModifications::UNNEST_BLOCKS) {
            self.changed |= unnest_blocks(statements);
        }
        if allowed(self.settings, TreeModifications::COMBINE_ADJACENT_VAR_STATEMENTS) {
            self.changed |= merge_adjacent_vars(statements);
        }
        let insertion_point = body.insertion_point();
        if allowed(self.settings, TreeModifications::MOVE_FUNCTION_TO_TOP_OF_SCOPE) {
            self.changed |= hoist_functions(&mut body.statements, insertion_point);
        }
        if allowed(self.settings, TreeModifications::COMBINE_VAR_STATEMENTS_TO_TOP_OF_SCOPE) {
            self.changed |= combine_vars(&mut body.statements, insertion_point);
        }
    }
}

/// Moves direct function declarations to `insertion_point`, keeping their
/// relative order.
fn hoist_functions(statements: &mut Vec<Statement>, insertion_point: usize) -> bool {
    let positions: Vec<usize> = statements
        .iter()
        .enumerate()
        .filter(|(_, s)| matches!(s, Statement::Function(_)))
        .map(|(i, _)| i)
        .collect();
    let in_place = positions
        .iter()
        .enumerate()
        .all(|(n, &position)| position == insertion_point + n);
    if in_place {
        return false;
    }

    let mut functions = Vec::with_capacity(positions.len());
    let mut rest = Vec::with_capacity(statements.len() - positions.len());
    for statement in statements.drain(..) {
        if matches!(statement, Statement::Function(_)) {
            functions.push(statement);
        } else {
            rest.push(statement);
        }
    }
    let tail = rest.split_off(insertion_point.min(rest.len()));
    rest.extend(functions);
    rest.extend(tail);
    *statements = rest;
    debug!(count = positions.len(), "hoisted function declarations");
    true
}

/// Gathers the names of every direct `var` statement into one statement
/// after the hoisted functions. Statements with at most two initializers
/// leave their assignments behind as an expression; longer ones stay put.
fn combine_vars(statements: &mut Vec<Statement>, insertion_point: usize) -> bool {
    let var_count = statements
        .iter()
        .filter(|s| matches!(s, Statement::Var(_)))
        .count();
    if var_count < 2 {
        return false;
    }

    let mut target = insertion_point.min(statements.len());
    while matches!(statements.get(target), Some(Statement::Function(_))) {
        target += 1;
    }
    let created = !matches!(statements.get(target), Some(Statement::Var(_)));
    if created {
        statements.insert(
            target,
            Statement::Var(VarStatement {
                declarations: Vec::new(),
                span: Span::dummy(),
            }),
        );
    }

    let mut hoisted: Vec<VarDeclaration> = Vec::new();
    let mut changed = false;
    // Later statements never move ahead of the target, so indices before it
    // stay valid while the tail is rewritten.
    let mut i = target + 1;
    while i < statements.len() {
        let Statement::Var(var) = &statements[i] else {
            i += 1;
            continue;
        };
        match var.initializer_count() {
            0 => {
                hoisted.extend(var.declarations.iter().cloned());
                statements.remove(i);
                changed = true;
                continue;
            }
            1 | 2 => {
                let span = var.span;
                hoisted.extend(var.declarations.iter().map(VarDeclaration::name_only));
                let assignments = var
                    .declarations
                    .iter()
                    .cloned()
                    .filter_map(VarDeclaration::into_assignment)
                    .reduce(|left, right| Expression::binary(BinaryOp::Comma, left, right));
                if let Some(mut assignment) = assignments {
                    assignment.span = span;
                    statements[i] = Statement::Expression(assignment);
                    changed = true;
                }
            }
            _ => {}
        }
        i += 1;
    }

    if let Some(Statement::Var(combined)) = statements.get_mut(target) {
        for decl in hoisted {
            if !combined.contains_name(&decl.name.name) {
                combined.declarations.push(decl);
            }
        }
        if combined.declarations.is_empty() {
            statements.remove(target);
            return changed;
        }
    }
    changed || created
}
