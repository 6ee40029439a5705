pub mod expression;
pub mod precedence;
pub mod statement;
pub mod visit;

pub use expression::{
    Expression, ExpressionKind, FunctionKind, FunctionNode, Identifier, ObjectProperty,
    PropertyKey, PropertyKind,
};
pub use precedence::{BinaryOp, ParenContext, Precedence, Side, UnaryOp, UpdateOp};
pub use statement::*;

use crate::scope::ScopeId;
use crate::span::Span;

/// Top-level program. Its body is the global scope's block.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Block,
    pub scope: Option<ScopeId>,
    pub span: Span,
}

impl Program {
    pub fn new(statements: Vec<Statement>, span: Span) -> Self {
        Program {
            body: Block::new(statements, span),
            scope: None,
            span,
        }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.body.statements
    }
}
