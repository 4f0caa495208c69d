//! Simplification rules for `truncdiv` and `floordiv`.
//!
//! `floordiv` distributes over multiples of the divisor for every dividend. `truncdiv` only does
//! so when the dividend and its parts are non-negative and the divisor is positive, so those
//! rules consult the bound of the operands.

use crate::rewrite::{step::Step, Rewriter};
use sym_ir::{BinaryOp, Expr};
use super::{constant, is_integer, is_multiple, make, with_const};

/// Returns the divisor of a division by a non-zero constant, and whether the division rounds
/// toward negative infinity.
fn divisor(expr: &Expr) -> Option<(&Expr, i64, bool)> {
    let (op, x, c) = expr.as_binary()?;
    let floor = match op {
        BinaryOp::FloorDiv => true,
        BinaryOp::Div => false,
        _ => return None,
    };
    let c = c.as_int()?;
    (c != 0).then_some((x, c, floor))
}

/// `floordiv(x * 6, 3) = x * 2`
/// `floordiv(x * 2, 6) = floordiv(x, 3)`
///
/// The second form needs both constants to be positive.
pub fn divide_exact(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, ..) = expr.as_binary()?;
    let (lhs, c2, _) = divisor(expr)?;
    let (x, c1) = with_const(lhs, BinaryOp::Mul)?;
    let result = if is_multiple(c1, c2) {
        make(BinaryOp::Mul, x.clone(), constant(x, c1 as i128 / c2 as i128)?)?
    } else if c1 > 0 && c2 > 0 && c2 % c1 == 0 {
        make(op, x.clone(), constant(x, (c2 / c1) as i128)?)?
    } else {
        return None;
    };

    rw.step(Step::DivideExact);
    Some(result)
}

/// `floordiv(x * 8 + y, 4) = x * 2 + floordiv(y, 4)`
/// `floordiv(y + x * 8, 4) = x * 2 + floordiv(y, 4)`
/// `floordiv(x + 8, 4) = floordiv(x, 4) + 2`
/// `floordiv(x - 8, 4) = floordiv(x, 4) - 2`
///
/// For `truncdiv`, the divisor must be positive and the dividend and its parts non-negative.
pub fn split_divisible(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, ..) = expr.as_binary()?;
    let (lhs, c2, floor) = divisor(expr)?;
    if !floor && c2 < 0 {
        return None;
    }
    let (sum_op, a, b) = lhs.as_binary()?;

    let result = if let Some(c1) = b.as_int() {
        if !matches!(sum_op, BinaryOp::Add | BinaryOp::Sub) || !is_multiple(c1, c2) {
            return None;
        }
        if !floor && !(rw.bound(a).is_non_negative() && rw.bound(lhs).is_non_negative()) {
            return None;
        }
        let quotient = make(op, a.clone(), constant(a, c2 as i128)?)?;
        make(sum_op, quotient, constant(a, c1 as i128 / c2 as i128)?)?
    } else {
        if sum_op != BinaryOp::Add {
            return None;
        }
        let (term, rest, c1) = match (with_const(a, BinaryOp::Mul), with_const(b, BinaryOp::Mul)) {
            (Some((x, c1)), _) if is_multiple(c1, c2) => ((a, x), b, c1),
            (_, Some((x, c1))) if is_multiple(c1, c2) => ((b, x), a, c1),
            _ => return None,
        };
        let (product, x) = term;
        if !floor && !(rw.bound(product).is_non_negative() && rw.bound(rest).is_non_negative()) {
            return None;
        }
        let scaled = make(BinaryOp::Mul, x.clone(), constant(x, c1 as i128 / c2 as i128)?)?;
        make(BinaryOp::Add, scaled, make(op, rest.clone(), constant(rest, c2 as i128)?)?)?
    };

    rw.step(Step::SplitDivisible);
    Some(result)
}

/// `floordiv(floordiv(x, 2), 3) = floordiv(x, 6)`
/// `truncdiv(truncdiv(x, 2), 3) = truncdiv(x, 6)`
///
/// Both divisors must be positive.
pub fn nested_division(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, ..) = expr.as_binary()?;
    let (inner, c2, _) = divisor(expr)?;
    let (x, c1) = with_const(inner, op)?;
    if c1 <= 0 || c2 <= 0 {
        return None;
    }
    let result = make(op, x.clone(), constant(x, c1 as i128 * c2 as i128)?)?;

    rw.step(Step::NestedDivision);
    Some(result)
}

/// Applies all division rules.
pub fn all(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    if !is_integer(expr) {
        return None;
    }
    divide_exact(expr, rw)
        .or_else(|| split_divisible(expr, rw))
        .or_else(|| nested_division(expr, rw))
}
