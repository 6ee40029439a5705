//! Tree rewrites and the renaming pipeline.
//!
//! [`Optimizer::optimize`] runs the passes in a fixed order over one bound
//! program: scope reordering, block peepholes, then the renaming resolver
//! with the literal shortcut pass slotted between reservation and renaming.

use crate::ast::{Program, Statement, VarStatement};
use crate::config::{CodeSettings, TreeModifications};
use crate::diagnostics::DiagnosticHandler;
use crate::errors::CompilationError;
use crate::scope::{resolver, ScopeTree};

use std::sync::Arc;
use tracing::{debug, info};

mod analyze_nodes;
mod literal_shortcut;
mod logical_not;
mod reorder_scope;

pub use analyze_nodes::AnalyzeNodesPass;
pub use literal_shortcut::LiteralShortcutPass;
pub use logical_not::LogicalNot;
pub use reorder_scope::ReorderScopePass;

/// A rewrite over the whole bound program.
pub trait OptimizationPass {
    fn name(&self) -> &'static str;

    /// Runs the pass. Returns whether the tree changed.
    fn run(&mut self, program: &mut Program, scopes: &mut ScopeTree)
        -> Result<bool, CompilationError>;
}

/// Drives the rewrite passes and the renaming resolver.
pub struct Optimizer {
    settings: CodeSettings,
    handler: Arc<dyn DiagnosticHandler>,
}

impl Optimizer {
    pub fn new(settings: CodeSettings, handler: Arc<dyn DiagnosticHandler>) -> Self {
        Self { settings, handler }
    }

    /// Returns the names of the rewrite passes, in run order
    pub fn pass_names(&self) -> Vec<&'static str> {
        vec!["reorder-scope", "analyze-nodes", "literal-shortcut"]
    }

    /// Rewrites `program` and assigns short names in `scopes`.
    ///
    /// `scopes` must come fresh from binding `program`; the resolver phases
    /// run exactly once per tree.
    pub fn optimize(
        &mut self,
        program: &mut Program,
        scopes: &mut ScopeTree,
    ) -> Result<(), CompilationError> {
        scopes.recount_references(program);

        if self.settings.minify_code {
            let mut rewrites: Vec<Box<dyn OptimizationPass + '_>> = vec![
                Box::new(ReorderScopePass::new(&self.settings)),
                Box::new(AnalyzeNodesPass::new(&self.settings, self.handler.as_ref())),
            ];
            for pass in &mut rewrites {
                let changed = pass.run(program, scopes)?;
                debug!(pass = pass.name(), changed, "pass finished");
            }
            scopes.recount_references(program);
        } else {
            info!("code rewrites disabled, only formatting");
        }

        resolver::analyze_scope(scopes, self.handler.as_ref());
        resolver::reserve_fields(scopes, &self.settings);

        let mut literals = LiteralShortcutPass::new(&self.settings);
        let changed = literals.run(program, scopes)?;
        debug!(pass = literals.name(), changed, "pass finished");

        resolver::hyper_crunch(scopes, &self.settings);
        resolver::validate_generated_names(scopes);
        Ok(())
    }
}

/// Splices nested blocks into `statements`, recursively. Returns whether
/// anything moved.
pub(crate) fn unnest_blocks(statements: &mut Vec<Statement>) -> bool {
    if !statements.iter().any(|s| matches!(s, Statement::Block(_))) {
        return false;
    }
    let mut flattened = Vec::with_capacity(statements.len());
    for statement in statements.drain(..) {
        match statement {
            Statement::Block(mut block) => {
                unnest_blocks(&mut block.statements);
                flattened.extend(block.statements);
            }
            other => flattened.push(other),
        }
    }
    *statements = flattened;
    true
}

/// Joins each run of adjacent `var` statements into the first of the run.
pub(crate) fn merge_adjacent_vars(statements: &mut Vec<Statement>) -> bool {
    let mut changed = false;
    let mut merged: Vec<Statement> = Vec::with_capacity(statements.len());
    for statement in statements.drain(..) {
        if let (Some(Statement::Var(previous)), Statement::Var(next)) = (merged.last_mut(), &statement) {
            append_declarations(previous, next);
            changed = true;
            continue;
        }
        merged.push(statement);
    }
    *statements = merged;
    changed
}

fn append_declarations(target: &mut VarStatement, source: &VarStatement) {
    target.declarations.extend(source.declarations.iter().cloned());
    target.span = target.span.combine(&source.span);
}

/// Whether minification is on and `modification` is not switched off.
pub(crate) fn allowed(settings: &CodeSettings, modification: TreeModifications) -> bool {
    settings.minify_code && settings.is_modification_allowed(modification)
}
