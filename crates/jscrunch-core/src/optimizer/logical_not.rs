//! Cheapest logical negation of an expression.
//!
//! [`LogicalNot::measure_in`] predicts how many characters negating an
//! expression adds or saves; [`LogicalNot::apply_in`] performs that same
//! negation. Both dispatch through [`strategy_for`], so the structure
//! `apply_in` builds is always the one `measure_in` priced.
//!
//! Costs are counted in printed characters, parentheses included. The slot
//! an expression sits in is given as a [`ParenContext`] before and after the
//! rewrite, since De Morgan swaps move children into slots of a different
//! precedence.

use crate::ast::precedence::paren_cost;
use crate::ast::*;
use crate::codegen::precedence_of;
use crate::config::CodeSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// `a<b` to `a>=b` and the like.
    FlipComparison(BinaryOp),
    /// `a&&b` to `!a||!b`.
    DeMorgan(BinaryOp),
    /// `a,b` to `a,!b`.
    NegateRight,
    /// Negate both branches, or wrap, whichever is cheaper.
    Conditional,
    FlipBoolean,
    /// `!a` to `a`.
    StripNot,
    /// `!(...)`, the fallback.
    Wrap,
}

fn strategy_for(expr: &Expression) -> Strategy {
    match &expr.kind {
        ExpressionKind::Binary(op, _, _) => {
            if let Some(inverse) = op.inverse_comparison() {
                Strategy::FlipComparison(inverse)
            } else if *op == BinaryOp::LogicalAnd {
                Strategy::DeMorgan(BinaryOp::LogicalOr)
            } else if *op == BinaryOp::LogicalOr {
                Strategy::DeMorgan(BinaryOp::LogicalAnd)
            } else if *op == BinaryOp::Comma {
                Strategy::NegateRight
            } else {
                Strategy::Wrap
            }
        }
        ExpressionKind::Conditional(..) => Strategy::Conditional,
        ExpressionKind::Boolean(_) => Strategy::FlipBoolean,
        ExpressionKind::Unary(UnaryOp::Not, _) => Strategy::StripNot,
        _ => Strategy::Wrap,
    }
}

pub struct LogicalNot<'a> {
    settings: &'a CodeSettings,
}

impl<'a> LogicalNot<'a> {
    pub fn new(settings: &'a CodeSettings) -> Self {
        LogicalNot { settings }
    }

    /// Change in printed length from negating a standalone expression.
    pub fn measure(&self, expr: &Expression) -> i32 {
        self.measure_in(expr, ParenContext::TOP, ParenContext::TOP)
    }

    /// Negates a standalone expression.
    pub fn apply(&self, expr: &mut Expression) {
        self.apply_in(expr, ParenContext::TOP, ParenContext::TOP)
    }

    /// Change in printed length from replacing `expr`, printed in slot `old`,
    /// with its negation printed in slot `new`.
    pub fn measure_in(&self, expr: &Expression, old: ParenContext, new: ParenContext) -> i32 {
        match (strategy_for(expr), &expr.kind) {
            (Strategy::FlipComparison(inverse), ExpressionKind::Binary(op, _, _)) => {
                let prec = op.precedence();
                inverse.as_str().len() as i32 - op.as_str().len() as i32
                    + paren_cost(prec, Some(inverse), new)
                    - paren_cost(prec, Some(*op), old)
            }
            (Strategy::DeMorgan(swapped), ExpressionKind::Binary(op, left, right)) => {
                self.measure_in(
                    left,
                    ParenContext::binary(*op, Side::Left),
                    ParenContext::binary(swapped, Side::Left),
                ) + self.measure_in(
                    right,
                    ParenContext::binary(*op, Side::Right),
                    ParenContext::binary(swapped, Side::Right),
                ) + paren_cost(swapped.precedence(), Some(swapped), new)
                    - paren_cost(op.precedence(), Some(*op), old)
            }
            (Strategy::NegateRight, ExpressionKind::Binary(op, _, right)) => {
                let slot = ParenContext::binary(*op, Side::Right);
                self.measure_in(right, slot, slot) + self.reparen(expr, old, new)
            }
            (Strategy::Conditional, _) => {
                let branches = self.branches_cost(expr, old, new);
                let wrap = self.wrap_cost(expr, old, new);
                branches.min(wrap)
            }
            (Strategy::FlipBoolean, ExpressionKind::Boolean(value)) => {
                let text = if self.settings.minify_booleans() {
                    0
                } else if *value {
                    1
                } else {
                    -1
                };
                text + self.reparen(expr, old, new)
            }
            (Strategy::StripNot, ExpressionKind::Unary(_, operand)) => {
                self.parens(operand, new) - self.parens(expr, old) - 1
                    - self.parens(operand, ParenContext::UNARY)
            }
            _ => self.wrap_cost(expr, old, new),
        }
    }

    /// Replaces `expr` with its negation, choosing exactly the form
    /// [`measure_in`](Self::measure_in) priced for the same slots.
    pub fn apply_in(&self, expr: &mut Expression, old: ParenContext, new: ParenContext) {
        match strategy_for(expr) {
            Strategy::FlipComparison(inverse) => {
                if let ExpressionKind::Binary(op, _, _) = &mut expr.kind {
                    *op = inverse;
                }
            }
            Strategy::DeMorgan(swapped) => {
                if let ExpressionKind::Binary(op, left, right) = &mut expr.kind {
                    let original = *op;
                    *op = swapped;
                    self.apply_in(
                        left,
                        ParenContext::binary(original, Side::Left),
                        ParenContext::binary(swapped, Side::Left),
                    );
                    self.apply_in(
                        right,
                        ParenContext::binary(original, Side::Right),
                        ParenContext::binary(swapped, Side::Right),
                    );
                }
            }
            Strategy::NegateRight => {
                if let ExpressionKind::Binary(op, _, right) = &mut expr.kind {
                    let slot = ParenContext::binary(*op, Side::Right);
                    self.apply_in(right, slot, slot);
                }
            }
            Strategy::Conditional => {
                if self.branches_cost(expr, old, new) <= self.wrap_cost(expr, old, new) {
                    if let ExpressionKind::Conditional(_, consequent, alternate) = &mut expr.kind {
                        let slot = ParenContext::CONDITIONAL_BRANCH;
                        self.apply_in(consequent, slot, slot);
                        self.apply_in(alternate, slot, slot);
                    }
                } else {
                    wrap(expr);
                }
            }
            Strategy::FlipBoolean => {
                if let ExpressionKind::Boolean(value) = &mut expr.kind {
                    *value = !*value;
                }
            }
            Strategy::StripNot => {
                if let ExpressionKind::Unary(_, operand) = &mut expr.kind {
                    let inner = Expression::take(operand);
                    *expr = inner;
                }
            }
            Strategy::Wrap => wrap(expr),
        }
    }

    /// Replaces `!operand`, sitting in `slot`, with the negation of
    /// `operand` when that prints shorter. With `require_boolean` the
    /// replacement must also be guaranteed to produce a boolean.
    pub fn reduce_not(
        &self,
        expr: &mut Expression,
        slot: ParenContext,
        require_boolean: bool,
    ) -> bool {
        let ExpressionKind::Unary(UnaryOp::Not, operand) = &expr.kind else {
            return false;
        };
        let delta = self.measure_in(operand, ParenContext::UNARY, slot)
            - 1
            - paren_cost(Precedence::Unary, None, slot);
        if delta >= 0 {
            return false;
        }
        let mut candidate = (**operand).clone();
        self.apply_in(&mut candidate, ParenContext::UNARY, slot);
        if require_boolean && !candidate.is_boolean_valued() {
            return false;
        }
        *expr = candidate;
        true
    }

    fn parens(&self, expr: &Expression, ctx: ParenContext) -> i32 {
        paren_cost(precedence_of(expr, self.settings), expr.binary_op(), ctx)
    }

    /// Parenthesis change for a node whose own shape stays the same.
    fn reparen(&self, expr: &Expression, old: ParenContext, new: ParenContext) -> i32 {
        self.parens(expr, new) - self.parens(expr, old)
    }

    fn wrap_cost(&self, expr: &Expression, old: ParenContext, new: ParenContext) -> i32 {
        1 + paren_cost(Precedence::Unary, None, new) + self.parens(expr, ParenContext::UNARY)
            - self.parens(expr, old)
    }

    fn branches_cost(&self, expr: &Expression, old: ParenContext, new: ParenContext) -> i32 {
        let ExpressionKind::Conditional(_, consequent, alternate) = &expr.kind else {
            return self.wrap_cost(expr, old, new);
        };
        let slot = ParenContext::CONDITIONAL_BRANCH;
        self.measure_in(consequent, slot, slot)
            + self.measure_in(alternate, slot, slot)
            + self.reparen(expr, old, new)
    }
}

fn wrap(expr: &mut Expression) {
    let inner = Expression::take(expr);
    *expr = Expression::unary(UnaryOp::Not, inner);
}
