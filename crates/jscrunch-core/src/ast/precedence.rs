use serde::{Deserialize, Serialize};

/// Operator precedence levels, lowest binding first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    Comma,
    Assignment,
    Conditional,
    LogicalOr,
    LogicalAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    Equality,
    Relational,
    Shift,
    Additive,
    Multiplicative,
    Unary,
    Postfix,
    /// `new X` without arguments.
    New,
    /// Calls, member access and `new X()`.
    LeftHandSide,
    Primary,
}

impl Precedence {
    /// The next tighter-binding level.
    pub fn next(&self) -> Precedence {
        match self {
            Precedence::Comma => Precedence::Assignment,
            Precedence::Assignment => Precedence::Conditional,
            Precedence::Conditional => Precedence::LogicalOr,
            Precedence::LogicalOr => Precedence::LogicalAnd,
            Precedence::LogicalAnd => Precedence::BitwiseOr,
            Precedence::BitwiseOr => Precedence::BitwiseXor,
            Precedence::BitwiseXor => Precedence::BitwiseAnd,
            Precedence::BitwiseAnd => Precedence::Equality,
            Precedence::Equality => Precedence::Relational,
            Precedence::Relational => Precedence::Shift,
            Precedence::Shift => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Unary,
            Precedence::Unary => Precedence::Postfix,
            Precedence::Postfix => Precedence::New,
            Precedence::New => Precedence::LeftHandSide,
            Precedence::LeftHandSide | Precedence::Primary => Precedence::Primary,
        }
    }
}

/// Every infix operator, including assignments and the comma operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Comma,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ShlAssign,
    ShrAssign,
    UShrAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitXor,
    BitAnd,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    In,
    Instanceof,
    Shl,
    Shr,
    UShr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Comma => ",",
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::ModAssign => "%=",
            BinaryOp::ShlAssign => "<<=",
            BinaryOp::ShrAssign => ">>=",
            BinaryOp::UShrAssign => ">>>=",
            BinaryOp::BitAndAssign => "&=",
            BinaryOp::BitOrAssign => "|=",
            BinaryOp::BitXorAssign => "^=",
            BinaryOp::LogicalOr => "||",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::StrictEqual => "===",
            BinaryOp::StrictNotEqual => "!==",
            BinaryOp::LessThan => "<",
            BinaryOp::GreaterThan => ">",
            BinaryOp::LessThanEqual => "<=",
            BinaryOp::GreaterThanEqual => ">=",
            BinaryOp::In => "in",
            BinaryOp::Instanceof => "instanceof",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }

    pub fn precedence(&self) -> Precedence {
        match self {
            BinaryOp::Comma => Precedence::Comma,
            op if op.is_assignment() => Precedence::Assignment,
            BinaryOp::LogicalOr => Precedence::LogicalOr,
            BinaryOp::LogicalAnd => Precedence::LogicalAnd,
            BinaryOp::BitOr => Precedence::BitwiseOr,
            BinaryOp::BitXor => Precedence::BitwiseXor,
            BinaryOp::BitAnd => Precedence::BitwiseAnd,
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::StrictEqual
            | BinaryOp::StrictNotEqual => Precedence::Equality,
            BinaryOp::LessThan
            | BinaryOp::GreaterThan
            | BinaryOp::LessThanEqual
            | BinaryOp::GreaterThanEqual
            | BinaryOp::In
            | BinaryOp::Instanceof => Precedence::Relational,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => Precedence::Shift,
            BinaryOp::Add | BinaryOp::Sub => Precedence::Additive,
            _ => Precedence::Multiplicative,
        }
    }

    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::AddAssign
                | BinaryOp::SubAssign
                | BinaryOp::MulAssign
                | BinaryOp::DivAssign
                | BinaryOp::ModAssign
                | BinaryOp::ShlAssign
                | BinaryOp::ShrAssign
                | BinaryOp::UShrAssign
                | BinaryOp::BitAndAssign
                | BinaryOp::BitOrAssign
                | BinaryOp::BitXorAssign
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::LogicalAnd | BinaryOp::LogicalOr)
    }

    /// Equality and ordering comparisons.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::StrictEqual
                | BinaryOp::StrictNotEqual
                | BinaryOp::LessThan
                | BinaryOp::GreaterThan
                | BinaryOp::LessThanEqual
                | BinaryOp::GreaterThanEqual
        )
    }

    /// Operators for which `a op (b op c)` may be written `a op b op c`.
    ///
    /// `+` is absent: string concatenation and numeric addition do not
    /// associate when mixed.
    pub fn is_associative(&self) -> bool {
        matches!(
            self,
            BinaryOp::LogicalAnd
                | BinaryOp::LogicalOr
                | BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::Comma
        )
    }

    /// The comparison that yields the opposite result, with the relational
    /// flips treating NaN operands as ordinary values.
    pub fn inverse_comparison(&self) -> Option<BinaryOp> {
        let inverse = match self {
            BinaryOp::Equal => BinaryOp::NotEqual,
            BinaryOp::NotEqual => BinaryOp::Equal,
            BinaryOp::StrictEqual => BinaryOp::StrictNotEqual,
            BinaryOp::StrictNotEqual => BinaryOp::StrictEqual,
            BinaryOp::LessThan => BinaryOp::GreaterThanEqual,
            BinaryOp::GreaterThanEqual => BinaryOp::LessThan,
            BinaryOp::GreaterThan => BinaryOp::LessThanEqual,
            BinaryOp::LessThanEqual => BinaryOp::GreaterThan,
            _ => return None,
        };
        Some(inverse)
    }

    /// The plain operator of a compound assignment.
    pub fn compound_base(&self) -> Option<BinaryOp> {
        let base = match self {
            BinaryOp::AddAssign => BinaryOp::Add,
            BinaryOp::SubAssign => BinaryOp::Sub,
            BinaryOp::MulAssign => BinaryOp::Mul,
            BinaryOp::DivAssign => BinaryOp::Div,
            BinaryOp::ModAssign => BinaryOp::Mod,
            BinaryOp::ShlAssign => BinaryOp::Shl,
            BinaryOp::ShrAssign => BinaryOp::Shr,
            BinaryOp::UShrAssign => BinaryOp::UShr,
            BinaryOp::BitAndAssign => BinaryOp::BitAnd,
            BinaryOp::BitOrAssign => BinaryOp::BitOr,
            BinaryOp::BitXorAssign => BinaryOp::BitXor,
            _ => return None,
        };
        Some(base)
    }

    pub fn is_word(&self) -> bool {
        matches!(self, BinaryOp::In | BinaryOp::Instanceof)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    BitNot,
    Plus,
    Minus,
    Typeof,
    Void,
    Delete,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Typeof => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
        }
    }

    pub fn is_word(&self) -> bool {
        matches!(self, UnaryOp::Typeof | UnaryOp::Void | UnaryOp::Delete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl UpdateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

/// Which operand of a binary node a child occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Where an expression sits relative to its parent, as far as
/// parenthesization is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParenContext {
    pub prec: Precedence,
    pub side: Side,
    pub op: Option<BinaryOp>,
}

impl ParenContext {
    /// Statement level, argument lists joined by commas excepted.
    pub const TOP: ParenContext = ParenContext {
        prec: Precedence::Comma,
        side: Side::Left,
        op: None,
    };

    /// Function arguments, array elements, property values, initializers.
    pub const LIST_ITEM: ParenContext = ParenContext {
        prec: Precedence::Assignment,
        side: Side::Left,
        op: None,
    };

    pub const UNARY: ParenContext = ParenContext {
        prec: Precedence::Unary,
        side: Side::Left,
        op: None,
    };

    pub const CONDITIONAL_TEST: ParenContext = ParenContext {
        prec: Precedence::LogicalOr,
        side: Side::Left,
        op: None,
    };

    pub const CONDITIONAL_BRANCH: ParenContext = Self::LIST_ITEM;

    pub const MEMBER_OBJECT: ParenContext = ParenContext {
        prec: Precedence::LeftHandSide,
        side: Side::Left,
        op: None,
    };

    pub fn binary(op: BinaryOp, side: Side) -> Self {
        ParenContext {
            prec: op.precedence(),
            side,
            op: Some(op),
        }
    }
}

/// Whether a child of the given shape needs parentheses in `ctx`.
pub fn needs_parens(child_prec: Precedence, child_op: Option<BinaryOp>, ctx: ParenContext) -> bool {
    if child_prec < ctx.prec {
        return true;
    }
    if child_prec > ctx.prec || ctx.side == Side::Left {
        return false;
    }
    match (ctx.op, child_op) {
        (Some(parent), _) if parent.is_assignment() => false,
        (Some(parent), Some(child)) => !(parent == child && parent.is_associative()),
        _ => true,
    }
}

/// Characters of parentheses a child of the given shape costs in `ctx`.
pub fn paren_cost(child_prec: Precedence, child_op: Option<BinaryOp>, ctx: ParenContext) -> i32 {
    if needs_parens(child_prec, child_op, ctx) {
        2
    } else {
        0
    }
}
