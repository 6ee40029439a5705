use super::{ExpressionParser, Parser, ParserError};
use crate::ast::*;
use crate::lexer::TokenKind;

pub trait StatementParser {
    fn parse_statement(&mut self) -> Result<Statement, ParserError>;
    /// A braced statement list.
    fn parse_block(&mut self) -> Result<Block, ParserError>;
    /// Statements up to (not including) any of the `end` tokens, with
    /// preserved comments surfacing as statements.
    fn parse_statement_list(&mut self, end: &[TokenKind]) -> Result<Vec<Statement>, ParserError>;
}

impl StatementParser for Parser {
    fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        match self.current_kind() {
            TokenKind::LeftBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::Var => {
                let var = self.parse_var_statement(false)?;
                self.consume_semicolon()?;
                Ok(Statement::Var(var))
            }
            TokenKind::Function => {
                let func = self.parse_function(FunctionKind::Declaration)?;
                Ok(Statement::Function(Box::new(func)))
            }
            TokenKind::If => self.parse_if_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => {
                let jump = self.parse_jump()?;
                Ok(Statement::Break(jump))
            }
            TokenKind::Continue => {
                let jump = self.parse_jump()?;
                Ok(Statement::Continue(jump))
            }
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::With => self.parse_with_statement(),
            TokenKind::Debugger => {
                let span = self.advance();
                self.consume_semicolon()?;
                Ok(Statement::Debugger(span))
            }
            TokenKind::Semicolon => Ok(Statement::Empty(self.advance())),
            TokenKind::Identifier(_) if matches!(self.peek_kind(1), TokenKind::Colon) => {
                self.parse_labeled_statement()
            }
            _ => {
                let expr = self.parse_expression(false)?;
                self.consume_semicolon()?;
                Ok(Statement::Expression(expr))
            }
        }
    }

    fn parse_block(&mut self) -> Result<Block, ParserError> {
        let start_span = self.consume(TokenKind::LeftBrace, "Expected '{'")?;
        let statements = self.parse_statement_list(&[TokenKind::RightBrace])?;
        self.consume(TokenKind::RightBrace, "Expected '}'")?;
        Ok(Block::new(statements, self.span_from(start_span)))
    }

    fn parse_statement_list(&mut self, end: &[TokenKind]) -> Result<Vec<Statement>, ParserError> {
        let mut statements = Vec::new();
        loop {
            statements.extend(self.take_comment_statements());
            if self.is_at_end() || end.iter().any(|kind| self.at(kind)) {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }
}

// Statement implementations
impl Parser {
    pub(super) fn parse_identifier(&mut self) -> Result<Identifier, ParserError> {
        match self.current_kind() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.advance();
                Ok(Identifier::new(name, span))
            }
            _ => Err(self.error_here("Expected identifier")),
        }
    }

    /// `var a = 1, b`. With `no_in`, initializers stop before `in` so a
    /// for-in head can follow.
    fn parse_var_statement(&mut self, no_in: bool) -> Result<VarStatement, ParserError> {
        let start_span = self.consume(TokenKind::Var, "Expected 'var'")?;
        let mut declarations = Vec::new();
        loop {
            let name = self.parse_identifier()?;
            let init = if self.match_token(&[TokenKind::Equal]) {
                Some(self.parse_assignment(no_in)?)
            } else {
                None
            };
            let span = self.span_from(name.span);
            declarations.push(VarDeclaration { name, init, span });
            if !self.match_token(&[TokenKind::Comma]) {
                break;
            }
        }
        Ok(VarStatement {
            declarations,
            span: self.span_from(start_span),
        })
    }

    /// `function name(params) { body }`, with the name required for
    /// declarations and optional for expressions.
    pub(super) fn parse_function(&mut self, kind: FunctionKind) -> Result<FunctionNode, ParserError> {
        let start_span = self.consume(TokenKind::Function, "Expected 'function'")?;
        let name = if matches!(self.current_kind(), TokenKind::Identifier(_)) {
            Some(self.parse_identifier()?)
        } else if kind == FunctionKind::Declaration {
            return Err(self.error_here("Expected function name"));
        } else {
            None
        };
        self.parse_function_rest(kind, name, start_span)
    }

    pub(super) fn parse_function_rest(
        &mut self,
        kind: FunctionKind,
        name: Option<Identifier>,
        start_span: crate::span::Span,
    ) -> Result<FunctionNode, ParserError> {
        self.consume(TokenKind::LeftParen, "Expected '(' before parameters")?;
        let mut params = Vec::new();
        if !self.at(&TokenKind::RightParen) {
            loop {
                params.push(self.parse_identifier()?);
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;
        let body = self.parse_block()?;
        Ok(FunctionNode {
            kind,
            name,
            params,
            body,
            scope: None,
            span: self.span_from(start_span),
        })
    }

    fn parse_parenthesized(&mut self) -> Result<Expression, ParserError> {
        self.consume(TokenKind::LeftParen, "Expected '('")?;
        let expr = self.parse_expression(false)?;
        self.consume(TokenKind::RightParen, "Expected ')'")?;
        Ok(expr)
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParserError> {
        let start_span = self.advance();
        let test = self.parse_parenthesized()?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.match_token(&[TokenKind::Else]) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
            span: self.span_from(start_span),
        }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParserError> {
        let start_span = self.advance();
        self.consume(TokenKind::LeftParen, "Expected '(' after 'for'")?;

        let init = if self.at(&TokenKind::Var) {
            let mut var = self.parse_var_statement(true)?;
            if self.at(&TokenKind::In) && var.declarations.len() == 1 {
                self.advance();
                let decl = var.declarations.remove(0);
                return self.finish_for_in(ForInTarget::Var(decl), start_span);
            }
            Some(ForInit::Var(var))
        } else if self.at(&TokenKind::Semicolon) {
            None
        } else {
            let expr = self.parse_expression(true)?;
            if self.match_token(&[TokenKind::In]) {
                return self.finish_for_in(ForInTarget::Expression(expr), start_span);
            }
            Some(ForInit::Expression(expr))
        };

        self.consume(TokenKind::Semicolon, "Expected ';' in for statement")?;
        let test = if self.at(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.consume(TokenKind::Semicolon, "Expected ';' in for statement")?;
        let update = if self.at(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.consume(TokenKind::RightParen, "Expected ')' after for clauses")?;
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
            span: self.span_from(start_span),
        }))
    }

    fn finish_for_in(
        &mut self,
        left: ForInTarget,
        start_span: crate::span::Span,
    ) -> Result<Statement, ParserError> {
        let right = self.parse_expression(false)?;
        self.consume(TokenKind::RightParen, "Expected ')' after for-in")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::ForIn(ForInStatement {
            left,
            right,
            body,
            span: self.span_from(start_span),
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParserError> {
        let start_span = self.advance();
        let test = self.parse_parenthesized()?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::While(WhileStatement {
            test,
            body,
            span: self.span_from(start_span),
        }))
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement, ParserError> {
        let start_span = self.advance();
        let body = Box::new(self.parse_statement()?);
        self.consume(TokenKind::While, "Expected 'while' after do body")?;
        let test = self.parse_parenthesized()?;
        // A semicolon is always optional after do-while.
        self.match_token(&[TokenKind::Semicolon]);
        Ok(Statement::DoWhile(DoWhileStatement {
            body,
            test,
            span: self.span_from(start_span),
        }))
    }

    fn parse_switch_statement(&mut self) -> Result<Statement, ParserError> {
        let start_span = self.advance();
        let discriminant = self.parse_parenthesized()?;
        self.consume(TokenKind::LeftBrace, "Expected '{' after switch")?;

        let mut cases: Vec<SwitchCase> = Vec::new();
        let mut seen_default = false;
        loop {
            // Comments between cases attach to the case that follows.
            let leading = self.take_comment_statements();
            if self.match_token(&[TokenKind::RightBrace]) {
                if let Some(last) = cases.last_mut() {
                    last.body.extend(leading);
                }
                break;
            }
            let case_span = self.current_span();
            let test = match self.current_kind() {
                TokenKind::Case => {
                    self.advance();
                    Some(self.parse_expression(false)?)
                }
                TokenKind::Default => {
                    if seen_default {
                        return Err(self.error_here("Multiple default clauses"));
                    }
                    seen_default = true;
                    self.advance();
                    None
                }
                _ => return Err(self.error_here("Expected 'case' or 'default'")),
            };
            self.consume(TokenKind::Colon, "Expected ':' after case")?;
            let mut body = leading;
            body.extend(self.parse_statement_list(&[
                TokenKind::Case,
                TokenKind::Default,
                TokenKind::RightBrace,
            ])?);
            cases.push(SwitchCase {
                test,
                body,
                span: self.span_from(case_span),
            });
        }

        Ok(Statement::Switch(SwitchStatement {
            discriminant,
            cases,
            span: self.span_from(start_span),
        }))
    }

    fn parse_try_statement(&mut self) -> Result<Statement, ParserError> {
        let start_span = self.advance();
        let block = self.parse_block()?;

        let handler = if self.at(&TokenKind::Catch) {
            let catch_span = self.advance();
            self.consume(TokenKind::LeftParen, "Expected '(' after 'catch'")?;
            let param = self.parse_identifier()?;
            self.consume(TokenKind::RightParen, "Expected ')' after catch parameter")?;
            let body = self.parse_block()?;
            Some(CatchClause {
                param,
                body,
                scope: None,
                span: self.span_from(catch_span),
            })
        } else {
            None
        };

        let finalizer = if self.match_token(&[TokenKind::Finally]) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_here("Expected 'catch' or 'finally' after try block"));
        }

        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
            span: self.span_from(start_span),
        }))
    }

    fn at_statement_end(&self) -> bool {
        self.at(&TokenKind::Semicolon)
            || self.at(&TokenKind::RightBrace)
            || self.is_at_end()
            || self.current().newline_before
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParserError> {
        let start_span = self.advance();
        let argument = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.consume_semicolon()?;
        Ok(Statement::Return(ReturnStatement {
            argument,
            span: self.span_from(start_span),
        }))
    }

    /// `break` and `continue`, with an optional label on the same line.
    fn parse_jump(&mut self) -> Result<JumpStatement, ParserError> {
        let start_span = self.advance();
        let label = match self.current_kind() {
            TokenKind::Identifier(name) if !self.current().newline_before => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };
        self.consume_semicolon()?;
        Ok(JumpStatement {
            label,
            span: self.span_from(start_span),
        })
    }

    fn parse_throw_statement(&mut self) -> Result<Statement, ParserError> {
        let start_span = self.advance();
        if self.current().newline_before {
            return Err(self.error_here("Illegal newline after 'throw'"));
        }
        let argument = self.parse_expression(false)?;
        self.consume_semicolon()?;
        Ok(Statement::Throw(ThrowStatement {
            argument,
            span: self.span_from(start_span),
        }))
    }

    fn parse_with_statement(&mut self) -> Result<Statement, ParserError> {
        let start_span = self.advance();
        let object = self.parse_parenthesized()?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::With(WithStatement {
            object,
            body,
            scope: None,
            span: self.span_from(start_span),
        }))
    }

    fn parse_labeled_statement(&mut self) -> Result<Statement, ParserError> {
        let label = self.parse_identifier()?;
        self.consume(TokenKind::Colon, "Expected ':' after label")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::Labeled(LabeledStatement {
            label: label.name,
            body,
            span: self.span_from(label.span),
        }))
    }
}
