mod expression;
mod statement;

#[cfg(test)]
mod tests;

use crate::ast::{CommentStatement, Program, Statement};
use crate::diagnostics::DiagnosticHandler;
use crate::lexer::{Comment, CommentKind, Token, TokenKind};
use crate::span::Span;
use std::sync::Arc;
use thiserror::Error;

pub use expression::ExpressionParser;
pub use statement::StatementParser;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} at {span}")]
pub struct ParserError {
    pub message: String,
    pub span: Span,
}

/// Recursive-descent parser over a token stream.
///
/// Parsing stops at the first syntax error; there is nothing useful to
/// emit for a program that does not parse.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    diagnostic_handler: Arc<dyn DiagnosticHandler>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>, diagnostic_handler: Arc<dyn DiagnosticHandler>) -> Self {
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let end = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, end));
        }
        Parser {
            tokens,
            position: 0,
            diagnostic_handler,
        }
    }

    pub fn parse(&mut self) -> Result<Program, ParserError> {
        let start_span = self.current_span();
        match self.parse_statement_list(&[TokenKind::Eof]) {
            Ok(statements) => {
                let span = start_span.combine(&self.current_span());
                Ok(Program::new(statements, span))
            }
            Err(e) => {
                self.diagnostic_handler.error(e.span, &e.message);
                Err(e)
            }
        }
    }

    // Token stream management
    fn current(&self) -> &Token {
        // The constructor guarantees a trailing Eof token.
        let last = self.tokens.len() - 1;
        &self.tokens[self.position.min(last)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + offset).min(last)].kind
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Span {
        let span = self.current_span();
        if !self.is_at_end() {
            self.position += 1;
        }
        span
    }

    /// Compares token kinds, ignoring any payload.
    fn at(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.at(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Span, ParserError> {
        if self.at(&kind) {
            return Ok(self.advance());
        }
        Err(self.error_here(message))
    }

    /// Statement terminator, with automatic semicolon insertion before `}`,
    /// at end of input, and after a line break.
    fn consume_semicolon(&mut self) -> Result<(), ParserError> {
        if self.match_token(&[TokenKind::Semicolon]) {
            return Ok(());
        }
        if self.at(&TokenKind::RightBrace) || self.is_at_end() || self.current().newline_before {
            return Ok(());
        }
        Err(self.error_here("Expected ';'"))
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn previous_span(&self) -> Span {
        if self.position == 0 {
            return self.current_span();
        }
        self.tokens[self.position - 1].span
    }

    fn span_from(&self, start: Span) -> Span {
        start.combine(&self.previous_span())
    }

    fn error_here(&self, message: &str) -> ParserError {
        let found = match self.current_kind() {
            TokenKind::Eof => "end of input".to_string(),
            kind => format!("{:?}", kind),
        };
        ParserError {
            message: format!("{}, found {}", message, found),
            span: self.current_span(),
        }
    }

    /// Preserved comments attached to the current token, as statements.
    fn take_comment_statements(&mut self) -> Vec<Statement> {
        let index = self.position.min(self.tokens.len() - 1);
        std::mem::take(&mut self.tokens[index].comments)
            .into_iter()
            .map(comment_statement)
            .collect()
    }
}

fn comment_statement(comment: Comment) -> Statement {
    let node = CommentStatement {
        text: comment.text,
        span: comment.span,
    };
    match comment.kind {
        CommentKind::Important => Statement::ImportantComment(node),
        CommentKind::Conditional => Statement::ConditionalComment(node),
    }
}
