use super::precedence::{BinaryOp, Precedence, UnaryOp, UpdateOp};
use super::statement::Block;
use crate::scope::{FieldId, ScopeId};
use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
}

impl Expression {
    pub fn new(kind: ExpressionKind, span: Span) -> Self {
        Expression { kind, span }
    }

    /// Synthesized node with no source position.
    pub fn synthetic(kind: ExpressionKind) -> Self {
        Expression {
            kind,
            span: Span::dummy(),
        }
    }

    pub fn number(value: f64) -> Self {
        Self::synthetic(ExpressionKind::Number(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::synthetic(ExpressionKind::Boolean(value))
    }

    /// `void 0`
    pub fn void_zero() -> Self {
        Self::synthetic(ExpressionKind::Unary(
            UnaryOp::Void,
            Box::new(Expression::number(0.0)),
        ))
    }

    pub fn unary(op: UnaryOp, operand: Expression) -> Self {
        let span = operand.span;
        Expression::new(ExpressionKind::Unary(op, Box::new(operand)), span)
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        let span = left.span.combine(&right.span);
        Expression::new(
            ExpressionKind::Binary(op, Box::new(left), Box::new(right)),
            span,
        )
    }

    pub fn conditional(test: Expression, consequent: Expression, alternate: Expression) -> Self {
        let span = test.span.combine(&alternate.span);
        Expression::new(
            ExpressionKind::Conditional(Box::new(test), Box::new(consequent), Box::new(alternate)),
            span,
        )
    }

    /// Takes the expression out of `slot`, leaving a `null` literal behind.
    pub fn take(slot: &mut Expression) -> Expression {
        std::mem::replace(slot, Expression::synthetic(ExpressionKind::Null))
    }

    /// Precedence of the node as rendered, used for parenthesization.
    pub fn precedence(&self) -> Precedence {
        match &self.kind {
            ExpressionKind::Binary(op, _, _) => op.precedence(),
            ExpressionKind::Conditional(..) => Precedence::Conditional,
            ExpressionKind::Unary(..) => Precedence::Unary,
            ExpressionKind::Update { prefix: true, .. } => Precedence::Unary,
            ExpressionKind::Update { prefix: false, .. } => Precedence::Postfix,
            ExpressionKind::New(_, None) => Precedence::New,
            ExpressionKind::New(_, Some(_))
            | ExpressionKind::Call(..)
            | ExpressionKind::Member(..)
            | ExpressionKind::Index(..) => Precedence::LeftHandSide,
            ExpressionKind::Number(value) if value.is_sign_negative() => Precedence::Unary,
            _ => Precedence::Primary,
        }
    }

    pub fn binary_op(&self) -> Option<BinaryOp> {
        match &self.kind {
            ExpressionKind::Binary(op, _, _) => Some(*op),
            _ => None,
        }
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        matches!(&self.kind, ExpressionKind::Identifier(id) if id.name == name)
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match &self.kind {
            ExpressionKind::Identifier(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_string_literal(&self) -> bool {
        matches!(self.kind, ExpressionKind::String(_))
    }

    pub fn is_void_zero(&self) -> bool {
        matches!(
            &self.kind,
            ExpressionKind::Unary(UnaryOp::Void, operand)
                if matches!(operand.kind, ExpressionKind::Number(n) if n == 0.0)
        )
    }

    /// Literal whose evaluation has no side effects and no dependence on state.
    pub fn is_constant(&self) -> bool {
        matches!(
            self.kind,
            ExpressionKind::Number(_)
                | ExpressionKind::String(_)
                | ExpressionKind::Boolean(_)
                | ExpressionKind::Null
        ) || self.is_void_zero()
    }

    /// Statically known truthiness of a constant expression.
    pub fn constant_truthiness(&self) -> Option<bool> {
        match &self.kind {
            ExpressionKind::Boolean(b) => Some(*b),
            ExpressionKind::Number(n) => Some(*n != 0.0 && !n.is_nan()),
            ExpressionKind::String(s) => Some(!s.is_empty()),
            ExpressionKind::Null => Some(false),
            ExpressionKind::Unary(UnaryOp::Void, operand) if operand.is_constant() => Some(false),
            ExpressionKind::Unary(UnaryOp::Not, operand) => {
                operand.constant_truthiness().map(|b| !b)
            }
            _ => None,
        }
    }

    /// Whether evaluating the expression always yields a boolean value.
    pub fn is_boolean_valued(&self) -> bool {
        match &self.kind {
            ExpressionKind::Boolean(_) => true,
            ExpressionKind::Unary(UnaryOp::Not, _) => true,
            ExpressionKind::Unary(UnaryOp::Delete, _) => true,
            ExpressionKind::Binary(op, left, right) => {
                if op.is_comparison() || matches!(op, BinaryOp::In | BinaryOp::Instanceof) {
                    true
                } else if op.is_logical() {
                    left.is_boolean_valued() && right.is_boolean_valued()
                } else if *op == BinaryOp::Comma {
                    right.is_boolean_valued()
                } else {
                    false
                }
            }
            ExpressionKind::Conditional(_, consequent, alternate) => {
                consequent.is_boolean_valued() && alternate.is_boolean_valued()
            }
            _ => false,
        }
    }

    /// Leftmost primary of the expression, the token an expression statement
    /// would start with.
    pub fn leftmost(&self) -> &Expression {
        match &self.kind {
            ExpressionKind::Binary(_, left, _) => left.leftmost(),
            ExpressionKind::Conditional(test, _, _) => test.leftmost(),
            ExpressionKind::Call(callee, _) => callee.leftmost(),
            ExpressionKind::Member(object, _) | ExpressionKind::Index(object, _) => {
                object.leftmost()
            }
            ExpressionKind::Update {
                prefix: false,
                operand,
                ..
            } => operand.leftmost(),
            _ => self,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Number(f64),
    String(String),
    Regex { pattern: String, flags: String },
    Boolean(bool),
    Null,
    This,
    Identifier(Identifier),
    /// `None` entries are elisions (`[a,,b]`).
    Array(Vec<Option<Expression>>),
    Object(Vec<ObjectProperty>),
    Function(Box<FunctionNode>),
    Member(Box<Expression>, String),
    Index(Box<Expression>, Box<Expression>),
    Call(Box<Expression>, Vec<Expression>),
    /// `new X` without an argument list carries `None`.
    New(Box<Expression>, Option<Vec<Expression>>),
    Unary(UnaryOp, Box<Expression>),
    Update {
        op: UpdateOp,
        prefix: bool,
        operand: Box<Expression>,
    },
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    Conditional(Box<Expression>, Box<Expression>, Box<Expression>),
}

/// A name, either declared or looked up. After binding, `field` links it
/// to its variable record.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub field: Option<FieldId>,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Identifier {
            name: name.into(),
            field: None,
            span,
        }
    }

    pub fn with_field(name: impl Into<String>, field: FieldId) -> Self {
        Identifier {
            name: name.into(),
            field: Some(field),
            span: Span::dummy(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Identifier(String),
    String(String),
    Number(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProperty {
    pub key: PropertyKey,
    pub kind: PropertyKind,
    /// For getters and setters this is always a function expression.
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Declaration,
    Expression,
    Getter,
    Setter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub kind: FunctionKind,
    pub name: Option<Identifier>,
    pub params: Vec<Identifier>,
    pub body: Block,
    pub scope: Option<ScopeId>,
    pub span: Span,
}

impl FunctionNode {
    pub fn is_declaration(&self) -> bool {
        self.kind == FunctionKind::Declaration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Expression {
        Expression::synthetic(ExpressionKind::Identifier(Identifier::new(name, Span::dummy())))
    }

    #[test]
    fn test_precedence_of_shapes() {
        let add = Expression::binary(BinaryOp::Add, ident("a"), ident("b"));
        assert_eq!(add.precedence(), Precedence::Additive);
        let not = Expression::unary(UnaryOp::Not, ident("a"));
        assert_eq!(not.precedence(), Precedence::Unary);
        assert_eq!(Expression::number(-1.0).precedence(), Precedence::Unary);
        assert_eq!(ident("a").precedence(), Precedence::Primary);
    }

    #[test]
    fn test_boolean_valued() {
        let cmp = Expression::binary(BinaryOp::LessThan, ident("a"), ident("b"));
        assert!(cmp.is_boolean_valued());
        let or = Expression::binary(BinaryOp::LogicalOr, cmp.clone(), ident("c"));
        assert!(!or.is_boolean_valued());
        let not = Expression::unary(UnaryOp::Not, ident("c"));
        assert!(Expression::binary(BinaryOp::LogicalAnd, cmp, not).is_boolean_valued());
    }

    #[test]
    fn test_constant_truthiness() {
        assert_eq!(Expression::number(0.0).constant_truthiness(), Some(false));
        assert_eq!(Expression::void_zero().constant_truthiness(), Some(false));
        assert_eq!(
            Expression::unary(UnaryOp::Not, Expression::number(0.0)).constant_truthiness(),
            Some(true)
        );
        assert_eq!(ident("x").constant_truthiness(), None);
    }

    #[test]
    fn test_leftmost_through_calls() {
        let call = Expression::synthetic(ExpressionKind::Call(Box::new(ident("f")), vec![]));
        let seq = Expression::binary(BinaryOp::Comma, call, ident("g"));
        assert!(seq.leftmost().is_identifier("f"));
    }
}
