//! Constant folding and identities that hold for every operation.

use crate::rewrite::{step::Step, Rewriter};
use sym_ir::{eval::{floor_div, floor_mod}, BinaryOp, Expr, ExprKind};
use super::{constant, is_integer, make};

/// Evaluates an integer operation exactly. Returns `None` for division by zero and for results
/// outside the type of `like`.
pub(crate) fn fold_int(op: BinaryOp, a: i64, b: i64, like: &Expr) -> Option<Expr> {
    let (x, y) = (a as i128, b as i128);
    let value = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x.checked_div(y)?,
        BinaryOp::Mod => x.checked_rem(y)?,
        BinaryOp::FloorDiv => floor_div(x, y)?,
        BinaryOp::FloorMod => floor_mod(x, y)?,
        BinaryOp::Min => x.min(y),
        BinaryOp::Max => x.max(y),
        BinaryOp::Eq => return Some(Expr::bool(x == y)),
        BinaryOp::Ne => return Some(Expr::bool(x != y)),
        BinaryOp::Lt => return Some(Expr::bool(x < y)),
        BinaryOp::Le => return Some(Expr::bool(x <= y)),
        BinaryOp::Gt => return Some(Expr::bool(x > y)),
        BinaryOp::Ge => return Some(Expr::bool(x >= y)),
        BinaryOp::And | BinaryOp::Or => return None,
    };
    constant(like, value)
}

fn fold_float(op: BinaryOp, a: f64, b: f64, like: &Expr) -> Option<Expr> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div if b != 0.0 => a / b,
        BinaryOp::Min => a.min(b),
        BinaryOp::Max => a.max(b),
        BinaryOp::Eq => return Some(Expr::bool(a == b)),
        BinaryOp::Ne => return Some(Expr::bool(a != b)),
        BinaryOp::Lt => return Some(Expr::bool(a < b)),
        BinaryOp::Le => return Some(Expr::bool(a <= b)),
        BinaryOp::Gt => return Some(Expr::bool(a > b)),
        BinaryOp::Ge => return Some(Expr::bool(a >= b)),
        _ => return None,
    };
    Some(Expr::make_float(like.dtype(), value))
}

/// `1 + 2 = 3`
/// `3 < 4 = true`
/// `!false = true`
pub fn fold_constants(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let folded = match expr.kind() {
        ExprKind::Binary(op, lhs, rhs) => match (lhs.kind(), rhs.kind()) {
            (ExprKind::IntImm(a), ExprKind::IntImm(b)) => fold_int(*op, *a, *b, lhs),
            (ExprKind::FloatImm(a), ExprKind::FloatImm(b)) => fold_float(*op, a.0, b.0, lhs),
            (ExprKind::BoolImm(a), ExprKind::BoolImm(b)) => match op {
                BinaryOp::And => Some(Expr::bool(*a && *b)),
                BinaryOp::Or => Some(Expr::bool(*a || *b)),
                BinaryOp::Eq => Some(Expr::bool(a == b)),
                BinaryOp::Ne => Some(Expr::bool(a != b)),
                _ => None,
            },
            _ => None,
        },
        ExprKind::Not(value) => value.as_bool().map(|value| Expr::bool(!value)),
        _ => None,
    }?;

    rw.step(Step::FoldConstants);
    Some(folded)
}

/// `1 + x = x + 1`
/// `2 == x = x == 2`
///
/// Applies to the commutative operations.
pub fn constant_to_right(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    if !op.is_commutative() || !lhs.is_const() || rhs.is_const() {
        return None;
    }

    rw.step(Step::ConstantToRight);
    make(op, rhs.clone(), lhs.clone())
}

/// `x = 3`, if `x` is known to lie in `[3, 3]`
pub fn known_value(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    if !is_integer(expr) || !expr.dtype().is_scalar() || expr.is_const() {
        return None;
    }
    let value = rw.bound(expr).as_point()?;
    let value = constant(expr, value as i128)?;

    rw.step(Step::KnownValue);
    Some(value)
}

/// `x + 0 = x`
/// `x - 0 = x`
pub fn add_zero(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    if !matches!(op, BinaryOp::Add | BinaryOp::Sub) || !is_integer(expr) || !rhs.is_int(0) {
        return None;
    }

    rw.step(Step::AddZero);
    Some(lhs.clone())
}

/// `x - x = 0`
pub fn subtract_self(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, rhs) = expr.as_op(BinaryOp::Sub)?;
    if !is_integer(expr) || lhs != rhs {
        return None;
    }

    rw.step(Step::SubtractSelf);
    Some(Expr::make_const(expr.dtype(), 0))
}

/// `x * 1 = x`
/// `truncdiv(x, 1) = x`
/// `floordiv(x, 1) = x`
pub fn multiply_one(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    if !matches!(op, BinaryOp::Mul | BinaryOp::Div | BinaryOp::FloorDiv)
        || !is_integer(expr)
        || !rhs.is_int(1)
    {
        return None;
    }

    rw.step(Step::MultiplyOne);
    Some(lhs.clone())
}

/// `x * 0 = 0`
pub fn multiply_zero(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (_, rhs) = expr.as_op(BinaryOp::Mul)?;
    if !is_integer(expr) || !rhs.is_int(0) {
        return None;
    }

    rw.step(Step::MultiplyZero);
    Some(Expr::make_const(expr.dtype(), 0))
}

/// `truncmod(x, 1) = 0`
/// `floormod(x, 1) = 0`
pub fn mod_one(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, _, rhs) = expr.as_binary()?;
    if !matches!(op, BinaryOp::Mod | BinaryOp::FloorMod) || !is_integer(expr) || !rhs.is_int(1) {
        return None;
    }

    rw.step(Step::ModOne);
    Some(Expr::make_const(expr.dtype(), 0))
}

/// `truncdiv(x, x) = 1`
/// `floordiv(x, x) = 1`
///
/// Only if `x` is never zero.
pub fn divide_self(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    if !matches!(op, BinaryOp::Div | BinaryOp::FloorDiv) || !is_integer(expr) || lhs != rhs {
        return None;
    }
    if rw.bound(rhs).contains(0) {
        return None;
    }

    rw.step(Step::DivideSelf);
    Some(Expr::make_const(expr.dtype(), 1))
}

/// `min(x, x) = x`
/// `max(x, x) = x`
/// `a && a = a`
/// `a || a = a`
/// `x == x = true`
/// `x <= x = true`
/// `x != x = false`
/// `x < x = false`
pub fn same_operands(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    if lhs != rhs {
        return None;
    }
    let result = match op {
        BinaryOp::Min | BinaryOp::Max | BinaryOp::And | BinaryOp::Or => lhs.clone(),
        _ if !is_integer(lhs) => return None,
        BinaryOp::Eq | BinaryOp::Le | BinaryOp::Ge => Expr::make_const(expr.dtype(), 1),
        BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt => Expr::make_const(expr.dtype(), 0),
        _ => return None,
    };

    rw.step(Step::SameOperands);
    Some(result)
}

/// `true && a = a`
/// `false && a = false`
/// `true || a = true`
/// `false || a = a`
pub fn logical_constant(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    if !op.is_logical() {
        return None;
    }
    let (known, other) = match (lhs.as_bool(), rhs.as_bool()) {
        (Some(value), _) => (value, rhs),
        (_, Some(value)) => (value, lhs),
        _ => return None,
    };
    let result = match (op, known) {
        (BinaryOp::And, true) | (BinaryOp::Or, false) => other.clone(),
        (BinaryOp::And, false) | (BinaryOp::Or, true) => Expr::bool(known),
        _ => return None,
    };

    rw.step(Step::LogicalConstant);
    Some(result)
}

/// Applies all folding rules.
pub fn all(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    fold_constants(expr, rw)
        .or_else(|| constant_to_right(expr, rw))
        .or_else(|| logical_constant(expr, rw))
        .or_else(|| add_zero(expr, rw))
        .or_else(|| subtract_self(expr, rw))
        .or_else(|| multiply_one(expr, rw))
        .or_else(|| multiply_zero(expr, rw))
        .or_else(|| mod_one(expr, rw))
        .or_else(|| divide_self(expr, rw))
        .or_else(|| same_operands(expr, rw))
        .or_else(|| known_value(expr, rw))
}
