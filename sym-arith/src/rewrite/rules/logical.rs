//! Simplification rules for `&&`, `||` and `!`.

use crate::{const_int_bound::{BoundValue, ConstIntBound}, rewrite::{step::Step, Rewriter}};
use sym_ir::{BinaryOp, Expr, ExprKind};
use super::make;

/// Returns the negation of a condition, in the normal form the comparison rules produce: the
/// negation of `x < y` is `y <= x`, and the negation of `!a` is `a`.
///
/// Floating-point comparisons are negated with `!`, since `!(x < y)` differs from `y <= x` if
/// either operand is NaN.
pub(crate) fn negation(cond: &Expr) -> Option<Expr> {
    match cond.kind() {
        ExprKind::Not(value) => Some(value.clone()),
        ExprKind::Binary(op, lhs, rhs) if !lhs.dtype().is_float() => match op {
            BinaryOp::Lt => make(BinaryOp::Le, rhs.clone(), lhs.clone()),
            BinaryOp::Le => make(BinaryOp::Lt, rhs.clone(), lhs.clone()),
            BinaryOp::Gt => make(BinaryOp::Le, lhs.clone(), rhs.clone()),
            BinaryOp::Ge => make(BinaryOp::Lt, lhs.clone(), rhs.clone()),
            BinaryOp::Eq => make(BinaryOp::Ne, lhs.clone(), rhs.clone()),
            BinaryOp::Ne => make(BinaryOp::Eq, lhs.clone(), rhs.clone()),
            _ => Expr::try_not(cond.clone()).ok(),
        },
        _ => Expr::try_not(cond.clone()).ok(),
    }
}

/// If the condition restricts an integer expression to a range, returns the expression and the
/// range.
///
/// `x < 5` restricts `x` to `[-inf, 4]`, `5 <= x` to `[5, inf]`, and `x == 5` to `[5, 5]`.
pub(crate) fn as_range(cond: &Expr) -> Option<(&Expr, ConstIntBound)> {
    let (op, lhs, rhs) = cond.as_binary()?;
    if !lhs.dtype().is_integer() || !lhs.dtype().is_scalar() {
        return None;
    }
    let range = |min: i128, max: i128| {
        let end = |value: i128| BoundValue::from_i128(value);
        ConstIntBound::from_ends(end(min), end(max))
    };
    let (min, max) = (i64::MIN as i128, i64::MAX as i128);
    match (op, lhs.as_int(), rhs.as_int()) {
        (_, Some(_), Some(_)) => None,
        (BinaryOp::Lt, None, Some(c)) => Some((lhs, range(min, c as i128 - 1))),
        (BinaryOp::Le, None, Some(c)) => Some((lhs, range(min, c as i128))),
        (BinaryOp::Gt, None, Some(c)) => Some((lhs, range(c as i128 + 1, max))),
        (BinaryOp::Ge, None, Some(c)) => Some((lhs, range(c as i128, max))),
        (BinaryOp::Eq, None, Some(c)) => Some((lhs, ConstIntBound::point(c))),
        (BinaryOp::Lt, Some(c), None) => Some((rhs, range(c as i128 + 1, max))),
        (BinaryOp::Le, Some(c), None) => Some((rhs, range(c as i128, max))),
        (BinaryOp::Gt, Some(c), None) => Some((rhs, range(min, c as i128 - 1))),
        (BinaryOp::Ge, Some(c), None) => Some((rhs, range(min, c as i128))),
        (BinaryOp::Eq, Some(c), None) => Some((rhs, ConstIntBound::point(c))),
        _ => None,
    }
}

/// `!!a = a`
pub fn double_negation(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let ExprKind::Not(inner) = expr.kind() else { return None };
    let ExprKind::Not(value) = inner.kind() else { return None };

    rw.step(Step::DoubleNegation);
    Some(value.clone())
}

/// `!(x < y) = y <= x`
/// `!(x == y) = x != y`
pub fn negate_comparison(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let ExprKind::Not(inner) = expr.kind() else { return None };
    let (op, lhs, _) = inner.as_binary()?;
    if !op.is_comparison() || lhs.dtype().is_float() {
        return None;
    }
    let result = negation(inner)?;

    rw.step(Step::NegateComparison);
    Some(result)
}

/// `!(a && b) = !a || !b`
/// `!(a || b) = !a && !b`
pub fn de_morgan(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let ExprKind::Not(inner) = expr.kind() else { return None };
    let (op, a, b) = inner.as_binary()?;
    let dual = match op {
        BinaryOp::And => BinaryOp::Or,
        BinaryOp::Or => BinaryOp::And,
        _ => return None,
    };
    let result = make(dual, Expr::try_not(a.clone()).ok()?, Expr::try_not(b.clone()).ok()?)?;

    rw.step(Step::DeMorgan);
    Some(result)
}

/// `a && !a = false`
/// `x < y || y <= x = true`
pub fn complement(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, a, b) = expr.as_binary()?;
    if !op.is_logical() || negation(a).as_ref() != Some(b) {
        return None;
    }
    let result = Expr::make_const(expr.dtype(), (op == BinaryOp::Or) as i64);

    rw.step(Step::Complement);
    Some(result)
}

/// `x < 3 && 5 <= x = false`
/// `x < 5 || 3 <= x = true`
/// `x == 1 && x == 2 = false`
pub fn contradiction(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, a, b) = expr.as_binary()?;
    let ((x, first), (y, second)) = (as_range(a)?, as_range(b)?);
    if x != y {
        return None;
    }
    let value = match op {
        BinaryOp::And => {
            let both = first.intersect(&second);
            if both.min_bound() <= both.max_bound() {
                return None;
            }
            false
        },
        BinaryOp::Or => {
            // the union covers every value if the ranges meet without a gap
            let (lower, upper) = if first.min_bound() == BoundValue::NegInf { (first, second) } else { (second, first) };
            let covers = lower.min_bound() == BoundValue::NegInf
                && upper.max_bound() == BoundValue::PosInf
                && match (lower.max_bound(), upper.min_bound()) {
                    (BoundValue::Finite(hi), BoundValue::Finite(lo)) => lo as i128 <= hi as i128 + 1,
                    _ => true,
                };
            if !covers {
                return None;
            }
            true
        },
        _ => return None,
    };

    rw.step(Step::Contradiction);
    Some(Expr::make_const(expr.dtype(), value as i64))
}

/// `x < 3 && x < 5 = x < 3`
/// `x < 3 || x < 5 = x < 5`
/// `x == 2 && x < 5 = x == 2`
pub fn merge_ranges(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, a, b) = expr.as_binary()?;
    let ((x, first), (y, second)) = (as_range(a)?, as_range(b)?);
    if x != y {
        return None;
    }
    let keep_first = match op {
        BinaryOp::And if first.is_subset_of(&second) => true,
        BinaryOp::And if second.is_subset_of(&first) => false,
        BinaryOp::Or if second.is_subset_of(&first) => true,
        BinaryOp::Or if first.is_subset_of(&second) => false,
        _ => return None,
    };
    let result = if keep_first { a.clone() } else { b.clone() };

    rw.step(Step::MergeRanges);
    Some(result)
}

/// `x < 5 = true` inside a scope constrained by `x < 5`
/// `5 <= x = false` inside a scope constrained by `x < 5`
pub fn known_literal(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    if !expr.dtype().is_bool() || !expr.dtype().is_scalar() || expr.is_const() {
        return None;
    }
    let store = rw.analyzer().store();
    let value = store.literals().find_map(|literal| {
        if literal == expr {
            Some(true)
        } else if negation(literal).as_ref() == Some(expr) {
            Some(false)
        } else {
            None
        }
    })?;

    rw.step(Step::KnownLiteral);
    Some(Expr::bool(value))
}

/// Applies all logical rules.
pub fn all(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    double_negation(expr, rw)
        .or_else(|| negate_comparison(expr, rw))
        .or_else(|| de_morgan(expr, rw))
        .or_else(|| complement(expr, rw))
        .or_else(|| contradiction(expr, rw))
        .or_else(|| merge_ranges(expr, rw))
}
