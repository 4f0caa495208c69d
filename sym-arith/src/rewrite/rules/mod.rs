//! Implementation of the rewrite rules.
//!
//! Each rule in this module is a function that takes the expression to simplify and the
//! [`Rewriter`] performing the rewrite, and returns `Some(expr)` with the simplified expression
//! if the rule applies, or `None` if the rule does not apply. A rule that applies records its
//! [`Step`](super::step::Step).
//!
//! Unless stated otherwise, the algebraic rules only fire on integer expressions, where
//! arithmetic is exact.

pub mod add;
pub mod cast;
pub mod compare;
pub mod div;
pub mod fold;
pub mod let_expr;
pub mod logical;
pub mod min_max;
pub mod modulo;
pub mod mul;
pub mod select;
pub mod sub;
pub mod vector;

use sym_ir::{BinaryOp, Expr, ExprKind};
use super::Rewriter;

/// If the expression is `lhs op c` for an integer constant `c`, returns `lhs` and `c`.
pub(crate) fn with_const(expr: &Expr, op: BinaryOp) -> Option<(&Expr, i64)> {
    let (lhs, rhs) = expr.as_op(op)?;
    Some((lhs, rhs.as_int()?))
}

/// Builds a binary operation, or returns `None` if the operand types do not match.
pub(crate) fn make(op: BinaryOp, lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Option<Expr> {
    Expr::try_binary(op, lhs, rhs).ok()
}

/// Creates an integer constant of the same type as `like`, or returns `None` if the value does
/// not fit the type.
pub(crate) fn constant(like: &Expr, value: i128) -> Option<Expr> {
    let dtype = like.dtype();
    let value = i64::try_from(value).ok()?;
    (dtype.is_integer() && dtype.fits(value)).then(|| Expr::make_const(dtype, value))
}

/// Returns true if `value` is a multiple of `divisor`, which must not be zero.
pub(crate) fn is_multiple(value: i64, divisor: i64) -> bool {
    value.checked_rem(divisor) == Some(0) || divisor == -1
}

/// Returns true if the expression has an integer type.
pub(crate) fn is_integer(expr: &Expr) -> bool {
    expr.dtype().is_integer()
}

/// Applies all rules.
pub fn all(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let by_kind: fn(&Expr, &mut Rewriter) -> Option<Expr> = match expr.kind() {
        ExprKind::Binary(op, ..) => match op {
            BinaryOp::Add => add::all,
            BinaryOp::Sub => sub::all,
            BinaryOp::Mul => mul::all,
            BinaryOp::Div | BinaryOp::FloorDiv => div::all,
            BinaryOp::Mod | BinaryOp::FloorMod => modulo::all,
            BinaryOp::Min | BinaryOp::Max => min_max::all,
            BinaryOp::And | BinaryOp::Or => logical::all,
            _ => compare::all,
        },
        ExprKind::Not(_) => logical::all,
        ExprKind::Select(..) | ExprKind::Call { .. } => select::all,
        ExprKind::Cast(_) => cast::all,
        ExprKind::Let { .. } => let_expr::all,
        _ => |_, _| None,
    };

    fold::all(expr, rw)
        .or_else(|| vector::all(expr, rw))
        .or_else(|| logical::known_literal(expr, rw))
        .or_else(|| by_kind(expr, rw))
}
