//! Depth-first traversal of the syntax tree.
//!
//! `Visitor` borrows the tree for analysis passes, `VisitMut` borrows it
//! mutably for rewriting passes. Every method defaults to the matching
//! `walk_*` function, which recurses into the children. Override a method
//! and call its walk function to keep recursing; skip the call to prune.

use super::expression::*;
use super::statement::*;
use super::Program;

pub trait Visitor: Sized {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_statement(&mut self, statement: &Statement) {
        walk_statement(self, statement);
    }

    fn visit_expression(&mut self, expr: &Expression) {
        walk_expression(self, expr);
    }

    fn visit_function(&mut self, func: &FunctionNode) {
        walk_function(self, func);
    }

    fn visit_var_declaration(&mut self, decl: &VarDeclaration) {
        walk_var_declaration(self, decl);
    }

    fn visit_switch_case(&mut self, case: &SwitchCase) {
        walk_switch_case(self, case);
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause) {
        walk_catch_clause(self, clause);
    }

    fn visit_object_property(&mut self, property: &ObjectProperty) {
        walk_object_property(self, property);
    }

    /// Declared and referenced names alike.
    fn visit_identifier(&mut self, _ident: &Identifier) {}
}

pub fn walk_program<V: Visitor>(v: &mut V, program: &Program) {
    v.visit_block(&program.body);
}

pub fn walk_block<V: Visitor>(v: &mut V, block: &Block) {
    for statement in &block.statements {
        v.visit_statement(statement);
    }
}

pub fn walk_statement<V: Visitor>(v: &mut V, statement: &Statement) {
    match statement {
        Statement::Block(block) => v.visit_block(block),
        Statement::Var(var) => {
            for decl in &var.declarations {
                v.visit_var_declaration(decl);
            }
        }
        Statement::Function(func) => v.visit_function(func),
        Statement::Expression(expr) => v.visit_expression(expr),
        Statement::If(stmt) => {
            v.visit_expression(&stmt.test);
            v.visit_statement(&stmt.consequent);
            if let Some(alternate) = &stmt.alternate {
                v.visit_statement(alternate);
            }
        }
        Statement::For(stmt) => {
            match &stmt.init {
                Some(ForInit::Var(var)) => {
                    for decl in &var.declarations {
                        v.visit_var_declaration(decl);
                    }
                }
                Some(ForInit::Expression(expr)) => v.visit_expression(expr),
                None => {}
            }
            if let Some(test) = &stmt.test {
                v.visit_expression(test);
            }
            if let Some(update) = &stmt.update {
                v.visit_expression(update);
            }
            v.visit_statement(&stmt.body);
        }
        Statement::ForIn(stmt) => {
            match &stmt.left {
                ForInTarget::Var(decl) => v.visit_var_declaration(decl),
                ForInTarget::Expression(expr) => v.visit_expression(expr),
            }
            v.visit_expression(&stmt.right);
            v.visit_statement(&stmt.body);
        }
        Statement::While(stmt) => {
            v.visit_expression(&stmt.test);
            v.visit_statement(&stmt.body);
        }
        Statement::DoWhile(stmt) => {
            v.visit_statement(&stmt.body);
            v.visit_expression(&stmt.test);
        }
        Statement::Switch(stmt) => {
            v.visit_expression(&stmt.discriminant);
            for case in &stmt.cases {
                v.visit_switch_case(case);
            }
        }
        Statement::Try(stmt) => {
            v.visit_block(&stmt.block);
            if let Some(handler) = &stmt.handler {
                v.visit_catch_clause(handler);
            }
            if let Some(finalizer) = &stmt.finalizer {
                v.visit_block(finalizer);
            }
        }
        Statement::Labeled(stmt) => v.visit_statement(&stmt.body),
        Statement::Return(stmt) => {
            if let Some(argument) = &stmt.argument {
                v.visit_expression(argument);
            }
        }
        Statement::Throw(stmt) => v.visit_expression(&stmt.argument),
        Statement::With(stmt) => {
            v.visit_expression(&stmt.object);
            v.visit_statement(&stmt.body);
        }
        Statement::Break(_)
        | Statement::Continue(_)
        | Statement::Debugger(_)
        | Statement::Empty(_)
        | Statement::ImportantComment(_)
        | Statement::ConditionalComment(_) => {}
    }
}

pub fn walk_expression<V: Visitor>(v: &mut V, expr: &Expression) {
    match &expr.kind {
        ExpressionKind::Identifier(ident) => v.visit_identifier(ident),
        ExpressionKind::Array(elements) => {
            for element in elements.iter().flatten() {
                v.visit_expression(element);
            }
        }
        ExpressionKind::Object(properties) => {
            for property in properties {
                v.visit_object_property(property);
            }
        }
        ExpressionKind::Function(func) => v.visit_function(func),
        ExpressionKind::Member(object, _) => v.visit_expression(object),
        ExpressionKind::Index(object, index) => {
            v.visit_expression(object);
            v.visit_expression(index);
        }
        ExpressionKind::Call(callee, args) => {
            v.visit_expression(callee);
            for arg in args {
                v.visit_expression(arg);
            }
        }
        ExpressionKind::New(callee, args) => {
            v.visit_expression(callee);
            for arg in args.iter().flatten() {
                v.visit_expression(arg);
            }
        }
        ExpressionKind::Unary(_, operand) | ExpressionKind::Update { operand, .. } => {
            v.visit_expression(operand)
        }
        ExpressionKind::Binary(_, left, right) => {
            v.visit_expression(left);
            v.visit_expression(right);
        }
        ExpressionKind::Conditional(test, consequent, alternate) => {
            v.visit_expression(test);
            v.visit_expression(consequent);
            v.visit_expression(alternate);
        }
        ExpressionKind::Number(_)
        | ExpressionKind::String(_)
        | ExpressionKind::Regex { .. }
        | ExpressionKind::Boolean(_)
        | ExpressionKind::Null
        | ExpressionKind::This => {}
    }
}

pub fn walk_function<V: Visitor>(v: &mut V, func: &FunctionNode) {
    if let Some(name) = &func.name {
        v.visit_identifier(name);
    }
    for param in &func.params {
        v.visit_identifier(param);
    }
    v.visit_block(&func.body);
}

pub fn walk_var_declaration<V: Visitor>(v: &mut V, decl: &VarDeclaration) {
    v.visit_identifier(&decl.name);
    if let Some(init) = &decl.init {
        v.visit_expression(init);
    }
}

pub fn walk_switch_case<V: Visitor>(v: &mut V, case: &SwitchCase) {
    if let Some(test) = &case.test {
        v.visit_expression(test);
    }
    for statement in &case.body {
        v.visit_statement(statement);
    }
}

pub fn walk_catch_clause<V: Visitor>(v: &mut V, clause: &CatchClause) {
    v.visit_identifier(&clause.param);
    v.visit_block(&clause.body);
}

pub fn walk_object_property<V: Visitor>(v: &mut V, property: &ObjectProperty) {
    v.visit_expression(&property.value);
}

// ============================================================================
// Mutable traversal
// ============================================================================

pub trait VisitMut: Sized {
    fn visit_program_mut(&mut self, program: &mut Program) {
        walk_program_mut(self, program);
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
    }

    fn visit_statement_mut(&mut self, statement: &mut Statement) {
        walk_statement_mut(self, statement);
    }

    fn visit_expression_mut(&mut self, expr: &mut Expression) {
        walk_expression_mut(self, expr);
    }

    fn visit_function_mut(&mut self, func: &mut FunctionNode) {
        walk_function_mut(self, func);
    }

    fn visit_var_declaration_mut(&mut self, decl: &mut VarDeclaration) {
        walk_var_declaration_mut(self, decl);
    }

    fn visit_switch_case_mut(&mut self, case: &mut SwitchCase) {
        walk_switch_case_mut(self, case);
    }

    fn visit_catch_clause_mut(&mut self, clause: &mut CatchClause) {
        walk_catch_clause_mut(self, clause);
    }

    fn visit_identifier_mut(&mut self, _ident: &mut Identifier) {}
}

pub fn walk_program_mut<V: VisitMut>(v: &mut V, program: &mut Program) {
    v.visit_block_mut(&mut program.body);
}

pub fn walk_block_mut<V: VisitMut>(v: &mut V, block: &mut Block) {
    for statement in &mut block.statements {
        v.visit_statement_mut(statement);
    }
}

pub fn walk_statement_mut<V: VisitMut>(v: &mut V, statement: &mut Statement) {
    match statement {
        Statement::Block(block) => v.visit_block_mut(block),
        Statement::Var(var) => {
            for decl in &mut var.declarations {
                v.visit_var_declaration_mut(decl);
            }
        }
        Statement::Function(func) => v.visit_function_mut(func),
        Statement::Expression(expr) => v.visit_expression_mut(expr),
        Statement::If(stmt) => {
            v.visit_expression_mut(&mut stmt.test);
            v.visit_statement_mut(&mut stmt.consequent);
            if let Some(alternate) = &mut stmt.alternate {
                v.visit_statement_mut(alternate);
            }
        }
        Statement::For(stmt) => {
            match &mut stmt.init {
                Some(ForInit::Var(var)) => {
                    for decl in &mut var.declarations {
                        v.visit_var_declaration_mut(decl);
                    }
                }
                Some(ForInit::Expression(expr)) => v.visit_expression_mut(expr),
                None => {}
            }
            if let Some(test) = &mut stmt.test {
                v.visit_expression_mut(test);
            }
            if let Some(update) = &mut stmt.update {
                v.visit_expression_mut(update);
            }
            v.visit_statement_mut(&mut stmt.body);
        }
        Statement::ForIn(stmt) => {
            match &mut stmt.left {
                ForInTarget::Var(decl) => v.visit_var_declaration_mut(decl),
                ForInTarget::Expression(expr) => v.visit_expression_mut(expr),
            }
            v.visit_expression_mut(&mut stmt.right);
            v.visit_statement_mut(&mut stmt.body);
        }
        Statement::While(stmt) => {
            v.visit_expression_mut(&mut stmt.test);
            v.visit_statement_mut(&mut stmt.body);
        }
        Statement::DoWhile(stmt) => {
            v.visit_statement_mut(&mut stmt.body);
            v.visit_expression_mut(&mut stmt.test);
        }
        Statement::Switch(stmt) => {
            v.visit_expression_mut(&mut stmt.discriminant);
            for case in &mut stmt.cases {
                v.visit_switch_case_mut(case);
            }
        }
        Statement::Try(stmt) => {
            v.visit_block_mut(&mut stmt.block);
            if let Some(handler) = &mut stmt.handler {
                v.visit_catch_clause_mut(handler);
            }
            if let Some(finalizer) = &mut stmt.finalizer {
                v.visit_block_mut(finalizer);
            }
        }
        Statement::Labeled(stmt) => v.visit_statement_mut(&mut stmt.body),
        Statement::Return(stmt) => {
            if let Some(argument) = &mut stmt.argument {
                v.visit_expression_mut(argument);
            }
        }
        Statement::Throw(stmt) => v.visit_expression_mut(&mut stmt.argument),
        Statement::With(stmt) => {
            v.visit_expression_mut(&mut stmt.object);
            v.visit_statement_mut(&mut stmt.body);
        }
        Statement::Break(_)
        | Statement::Continue(_)
        | Statement::Debugger(_)
        | Statement::Empty(_)
        | Statement::ImportantComment(_)
        | Statement::ConditionalComment(_) => {}
    }
}

pub fn walk_expression_mut<V: VisitMut>(v: &mut V, expr: &mut Expression) {
    match &mut expr.kind {
        ExpressionKind::Identifier(ident) => v.visit_identifier_mut(ident),
        ExpressionKind::Array(elements) => {
            for element in elements.iter_mut().flatten() {
                v.visit_expression_mut(element);
            }
        }
        ExpressionKind::Object(properties) => {
            for property in properties {
                v.visit_expression_mut(&mut property.value);
            }
        }
        ExpressionKind::Function(func) => v.visit_function_mut(func),
        ExpressionKind::Member(object, _) => v.visit_expression_mut(object),
        ExpressionKind::Index(object, index) => {
            v.visit_expression_mut(object);
            v.visit_expression_mut(index);
        }
        ExpressionKind::Call(callee, args) => {
            v.visit_expression_mut(callee);
            for arg in args {
                v.visit_expression_mut(arg);
            }
        }
        ExpressionKind::New(callee, args) => {
            v.visit_expression_mut(callee);
            for arg in args.iter_mut().flatten() {
                v.visit_expression_mut(arg);
            }
        }
        ExpressionKind::Unary(_, operand) | ExpressionKind::Update { operand, .. } => {
            v.visit_expression_mut(operand)
        }
        ExpressionKind::Binary(_, left, right) => {
            v.visit_expression_mut(left);
            v.visit_expression_mut(right);
        }
        ExpressionKind::Conditional(test, consequent, alternate) => {
            v.visit_expression_mut(test);
            v.visit_expression_mut(consequent);
            v.visit_expression_mut(alternate);
        }
        ExpressionKind::Number(_)
        | ExpressionKind::String(_)
        | ExpressionKind::Regex { .. }
        | ExpressionKind::Boolean(_)
        | ExpressionKind::Null
        | ExpressionKind::This => {}
    }
}

pub fn walk_function_mut<V: VisitMut>(v: &mut V, func: &mut FunctionNode) {
    if let Some(name) = &mut func.name {
        v.visit_identifier_mut(name);
    }
    for param in &mut func.params {
        v.visit_identifier_mut(param);
    }
    v.visit_block_mut(&mut func.body);
}

pub fn walk_var_declaration_mut<V: VisitMut>(v: &mut V, decl: &mut VarDeclaration) {
    v.visit_identifier_mut(&mut decl.name);
    if let Some(init) = &mut decl.init {
        v.visit_expression_mut(init);
    }
}

pub fn walk_switch_case_mut<V: VisitMut>(v: &mut V, case: &mut SwitchCase) {
    if let Some(test) = &mut case.test {
        v.visit_expression_mut(test);
    }
    for statement in &mut case.body {
        v.visit_statement_mut(statement);
    }
}

pub fn walk_catch_clause_mut<V: VisitMut>(v: &mut V, clause: &mut CatchClause) {
    v.visit_identifier_mut(&mut clause.param);
    v.visit_block_mut(&mut clause.body);
}
