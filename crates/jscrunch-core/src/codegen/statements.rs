use super::CodeGenerator;
use crate::ast::*;

impl CodeGenerator<'_> {
    pub(super) fn generate_statement_list(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.generate_statement(statement);
        }
    }

    pub(super) fn generate_statement(&mut self, stmt: &Statement) {
        if let Statement::ImportantComment(_) = stmt {
            if !self.settings.preserve_important_comments {
                return;
            }
        }
        self.write_indent();
        match stmt {
            Statement::Block(block) => {
                self.write("{");
                self.newline();
                self.indent();
                self.generate_statement_list(&block.statements);
                self.close_brace();
                self.newline();
            }
            Statement::Var(var) => {
                self.generate_var(var);
                self.end_statement();
            }
            Statement::Function(func) => {
                self.generate_function(func);
                self.newline();
            }
            Statement::Expression(expr) => {
                self.generate_expression_statement(expr);
                self.end_statement();
            }
            Statement::If(if_stmt) => self.generate_if(if_stmt),
            Statement::For(for_stmt) => self.generate_for(for_stmt),
            Statement::ForIn(for_in) => self.generate_for_in(for_in),
            Statement::While(while_stmt) => {
                self.write("while");
                self.generate_condition(&while_stmt.test);
                self.generate_body(&while_stmt.body, false);
            }
            Statement::DoWhile(do_while) => {
                self.write("do");
                self.generate_body(&do_while.body, false);
                if self.multi_line() {
                    self.write_raw(" ");
                }
                self.write("while");
                self.generate_condition(&do_while.test);
                self.end_statement();
            }
            Statement::Switch(switch) => self.generate_switch(switch),
            Statement::Try(try_stmt) => self.generate_try(try_stmt),
            Statement::Labeled(labeled) => {
                self.write(&labeled.label);
                self.write(":");
                if self.multi_line() {
                    self.newline();
                    self.generate_statement(&labeled.body);
                } else {
                    self.generate_body(&labeled.body, false);
                }
            }
            Statement::Break(jump) => self.generate_jump("break", jump),
            Statement::Continue(jump) => self.generate_jump("continue", jump),
            Statement::Return(ret) => {
                self.write("return");
                if let Some(argument) = &ret.argument {
                    self.space();
                    self.generate_expression(argument, ParenContext::TOP);
                }
                self.end_statement();
            }
            Statement::Throw(throw) => {
                self.write("throw");
                self.space();
                self.generate_expression(&throw.argument, ParenContext::TOP);
                self.end_statement();
            }
            Statement::With(with) => {
                self.write("with");
                self.generate_condition(&with.object);
                self.generate_body(&with.body, false);
            }
            Statement::Debugger(_) => {
                self.write("debugger");
                self.end_statement();
            }
            Statement::Empty(_) => {
                self.write(";");
                self.newline();
            }
            Statement::ImportantComment(comment) => {
                self.write(&comment.text);
                self.write_raw("\n");
            }
            Statement::ConditionalComment(comment) => {
                self.write(&comment.text);
                self.newline();
            }
        }
    }

    /// An expression statement may not begin with `function` or `{`.
    fn generate_expression_statement(&mut self, expr: &Expression) {
        let wrap = matches!(
            expr.leftmost().kind,
            ExpressionKind::Function(_) | ExpressionKind::Object(_)
        );
        if wrap {
            self.write("(");
            self.generate_expression(expr, ParenContext::TOP);
            self.write(")");
        } else {
            self.generate_expression(expr, ParenContext::TOP);
        }
    }

    fn generate_var(&mut self, var: &VarStatement) {
        self.write("var");
        for (i, decl) in var.declarations.iter().enumerate() {
            if i > 0 {
                self.write(",");
                self.space();
            }
            self.generate_var_declaration(decl);
        }
    }

    fn generate_var_declaration(&mut self, decl: &VarDeclaration) {
        let name = self.identifier_name(&decl.name);
        self.write(name);
        if let Some(init) = &decl.init {
            self.space();
            self.write("=");
            self.space();
            self.generate_expression(init, ParenContext::LIST_ITEM);
        }
    }

    /// `(expr)` after `if`, `while` and friends.
    fn generate_condition(&mut self, expr: &Expression) {
        self.space();
        self.write("(");
        self.generate_expression(expr, ParenContext::TOP);
        self.write(")");
    }

    /// The body of a compound statement. Compact output drops the braces of
    /// a single-statement block unless `keep_braces` is set.
    fn generate_body(&mut self, body: &Statement, keep_braces: bool) {
        if self.multi_line() {
            self.open_brace();
            match body {
                Statement::Block(block) => self.generate_statement_list(&block.statements),
                Statement::Empty(_) => {}
                other => self.generate_statement(other),
            }
            self.close_brace();
            return;
        }

        match body {
            Statement::Block(block) => match block.statements.as_slice() {
                [single] if !keep_braces && can_stand_alone(single) => {
                    self.generate_body(single, false)
                }
                statements => {
                    self.write("{");
                    self.generate_statement_list(statements);
                    self.close_brace();
                }
            },
            other if keep_braces => {
                self.write("{");
                self.generate_statement(other);
                self.close_brace();
            }
            other => self.generate_statement(other),
        }
    }

    fn generate_if(&mut self, if_stmt: &IfStatement) {
        self.write("if");
        self.generate_condition(&if_stmt.test);
        match &if_stmt.alternate {
            None => {
                self.generate_body(&if_stmt.consequent, false);
                self.newline();
            }
            Some(alternate) => {
                let keep_braces = ends_with_open_if(&if_stmt.consequent);
                self.generate_body(&if_stmt.consequent, keep_braces);
                if self.multi_line() {
                    self.write_raw(" ");
                }
                self.write("else");
                match alternate.as_ref() {
                    Statement::If(nested) if self.multi_line() => {
                        self.write_raw(" ");
                        self.generate_if(nested);
                    }
                    other => {
                        self.generate_body(other, false);
                        self.newline();
                    }
                }
            }
        }
    }

    fn generate_for(&mut self, for_stmt: &ForStatement) {
        self.write("for");
        self.space();
        self.write("(");
        match &for_stmt.init {
            Some(ForInit::Var(var)) => {
                self.no_in = true;
                self.generate_var(var);
                self.no_in = false;
            }
            Some(ForInit::Expression(expr)) => {
                self.no_in = true;
                self.generate_expression(expr, ParenContext::TOP);
                self.no_in = false;
            }
            None => {}
        }
        self.write_raw(";");
        if let Some(test) = &for_stmt.test {
            self.space();
            self.generate_expression(test, ParenContext::TOP);
        }
        self.write_raw(";");
        if let Some(update) = &for_stmt.update {
            self.space();
            self.generate_expression(update, ParenContext::TOP);
        }
        self.write(")");
        self.generate_body(&for_stmt.body, false);
        self.newline();
    }

    fn generate_for_in(&mut self, for_in: &ForInStatement) {
        self.write("for");
        self.space();
        self.write("(");
        self.no_in = true;
        match &for_in.left {
            ForInTarget::Var(decl) => {
                self.write("var");
                self.generate_var_declaration(decl);
            }
            ForInTarget::Expression(expr) => {
                self.generate_expression(expr, ParenContext::MEMBER_OBJECT)
            }
        }
        self.no_in = false;
        self.write("in");
        self.generate_expression(&for_in.right, ParenContext::TOP);
        self.write(")");
        self.generate_body(&for_in.body, false);
        self.newline();
    }

    fn generate_switch(&mut self, switch: &SwitchStatement) {
        self.write("switch");
        self.generate_condition(&switch.discriminant);
        self.open_brace();
        for case in &switch.cases {
            self.write_indent();
            match &case.test {
                Some(test) => {
                    self.write("case");
                    self.write_raw_space_if_multi();
                    self.generate_expression(test, ParenContext::TOP);
                }
                None => self.write("default"),
            }
            self.write(":");
            self.newline();
            self.indent();
            self.generate_statement_list(&case.body);
            self.dedent();
        }
        self.close_brace();
        self.newline();
    }

    fn write_raw_space_if_multi(&mut self) {
        if self.multi_line() {
            self.write_raw(" ");
        }
    }

    fn generate_try(&mut self, try_stmt: &TryStatement) {
        self.write("try");
        self.generate_block_braced(&try_stmt.block);
        if let Some(handler) = &try_stmt.handler {
            self.space();
            self.write("catch");
            self.space();
            self.write("(");
            let name = self.identifier_name(&handler.param);
            self.write(name);
            self.write(")");
            self.generate_block_braced(&handler.body);
        }
        if let Some(finalizer) = &try_stmt.finalizer {
            self.space();
            self.write("finally");
            self.generate_block_braced(finalizer);
        }
        self.newline();
    }

    fn generate_block_braced(&mut self, block: &Block) {
        self.open_brace();
        self.generate_statement_list(&block.statements);
        self.close_brace();
    }

    fn generate_jump(&mut self, keyword: &str, jump: &JumpStatement) {
        self.write(keyword);
        if let Some(label) = &jump.label {
            self.write_raw(" ");
            self.write(label);
        }
        self.end_statement();
    }
}

/// Whether a statement may stand as a brace-less body.
fn can_stand_alone(statement: &Statement) -> bool {
    !matches!(
        statement,
        Statement::Function(_) | Statement::ImportantComment(_) | Statement::ConditionalComment(_)
    )
}

/// Whether `statement` ends in an `if` with no `else`, which would capture
/// an `else` written after it.
fn ends_with_open_if(statement: &Statement) -> bool {
    match statement {
        Statement::If(if_stmt) => match &if_stmt.alternate {
            None => true,
            Some(alternate) => ends_with_open_if(alternate),
        },
        Statement::Block(block) => match block.statements.as_slice() {
            [single] => ends_with_open_if(single),
            _ => false,
        },
        Statement::For(s) => ends_with_open_if(&s.body),
        Statement::ForIn(s) => ends_with_open_if(&s.body),
        Statement::While(s) => ends_with_open_if(&s.body),
        Statement::With(s) => ends_with_open_if(&s.body),
        Statement::Labeled(s) => ends_with_open_if(&s.body),
        _ => false,
    }
}
