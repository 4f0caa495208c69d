//! Simplification rules for `truncmod` and `floormod`.

use crate::rewrite::{step::Step, Rewriter};
use sym_ir::{eval::floor_mod, BinaryOp, Expr};
use super::{constant, is_integer, is_multiple, make, with_const};

/// Returns the modulus of a remainder by a non-zero constant, and whether the remainder takes the
/// sign of the divisor.
fn modulus(expr: &Expr) -> Option<(&Expr, i64, bool)> {
    let (op, x, c) = expr.as_binary()?;
    let floor = match op {
        BinaryOp::FloorMod => true,
        BinaryOp::Mod => false,
        _ => return None,
    };
    let c = c.as_int()?;
    (c != 0).then_some((x, c, floor))
}

/// `floormod(x, 8) = x` if `0 <= x < 8`
/// `truncmod(x, 8) = x` if `-8 < x < 8`
pub fn mod_in_range(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (x, c, floor) = modulus(expr)?;
    let bound = rw.bound(x);
    let c = c as i128;
    let (lo, hi) = (bound.min_bound().finite()? as i128, bound.max_bound().finite()? as i128);
    let in_range = if !floor {
        lo > -c.abs() && hi < c.abs()
    } else if c > 0 {
        lo >= 0 && hi < c
    } else {
        lo > c && hi <= 0
    };
    if !in_range {
        return None;
    }

    rw.step(Step::ModInRange);
    Some(x.clone())
}

/// `floormod(x * 8, 4) = 0`
pub fn divide_exact(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, c2, _) = modulus(expr)?;
    let (_, c1) = with_const(lhs, BinaryOp::Mul)?;
    if !is_multiple(c1, c2) {
        return None;
    }
    let result = constant(expr, 0)?;

    rw.step(Step::DivideExact);
    Some(result)
}

/// `floormod(x * 8 + y, 4) = floormod(y, 4)`
/// `floormod(y + x * 8, 4) = floormod(y, 4)`
///
/// For `truncmod`, the divisor must be positive and both terms non-negative.
pub fn split_divisible(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, ..) = expr.as_binary()?;
    let (lhs, c2, floor) = modulus(expr)?;
    if !floor && c2 < 0 {
        return None;
    }
    let (a, b) = lhs.as_op(BinaryOp::Add)?;
    let (product, rest) = match (with_const(a, BinaryOp::Mul), with_const(b, BinaryOp::Mul)) {
        (Some((_, c1)), _) if is_multiple(c1, c2) => (a, b),
        (_, Some((_, c1))) if is_multiple(c1, c2) => (b, a),
        _ => return None,
    };
    if !floor && !(rw.bound(product).is_non_negative() && rw.bound(rest).is_non_negative()) {
        return None;
    }
    let result = make(op, rest.clone(), constant(rest, c2 as i128)?)?;

    rw.step(Step::SplitDivisible);
    Some(result)
}

/// `floormod(x + 10, 4) = floormod(x + 2, 4)`
/// `floormod(x - 1, 4) = floormod(x + 3, 4)`
/// `truncmod(x + 8, 4) = truncmod(x, 4)` if `x >= 0`
pub fn reduce_offset(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, ..) = expr.as_binary()?;
    let (lhs, c2, floor) = modulus(expr)?;
    let (sum_op, x, c1) = lhs.as_binary()?;
    let c1 = match sum_op {
        BinaryOp::Add => c1.as_int()? as i128,
        BinaryOp::Sub => -(c1.as_int()? as i128),
        _ => return None,
    };

    let result = if floor {
        let reduced = floor_mod(c1, c2 as i128)?;
        if reduced == c1 {
            return None;
        }
        let dividend = if reduced == 0 {
            x.clone()
        } else {
            make(BinaryOp::Add, x.clone(), constant(x, reduced)?)?
        };
        make(op, dividend, constant(x, c2 as i128)?)?
    } else {
        if c2 <= 0 || c1 % c2 as i128 != 0 {
            return None;
        }
        if !(rw.bound(x).is_non_negative() && rw.bound(lhs).is_non_negative()) {
            return None;
        }
        make(op, x.clone(), constant(x, c2 as i128)?)?
    };

    rw.step(Step::ReduceOffset);
    Some(result)
}

/// `floormod(floormod(x, 8), 4) = floormod(x, 4)`
///
/// Both moduli must be positive, and the inner one a multiple of the outer one.
pub fn nested_division(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, ..) = expr.as_binary()?;
    let (inner, c2, _) = modulus(expr)?;
    let (x, c1) = with_const(inner, op)?;
    if c1 <= 0 || c2 <= 0 || c1 % c2 != 0 {
        return None;
    }
    let result = make(op, x.clone(), constant(x, c2 as i128)?)?;

    rw.step(Step::NestedDivision);
    Some(result)
}

/// `floormod(x, 4) = 1` if `x` is known to be `4k + 1`
///
/// For `truncmod`, `x` must also be non-negative, unless the remainder is zero.
pub fn modular_remainder(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (x, c, floor) = modulus(expr)?;
    if c <= 0 {
        return None;
    }
    let set = rw.modular(x);
    if set.coeff % c != 0 {
        return None;
    }
    let remainder = floor_mod(set.base as i128, c as i128)?;
    if !floor && remainder != 0 && !rw.bound(x).is_non_negative() {
        return None;
    }
    let result = constant(expr, remainder)?;

    rw.step(Step::ModularRemainder);
    Some(result)
}

/// Applies all remainder rules.
pub fn all(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    if !is_integer(expr) {
        return None;
    }
    mod_in_range(expr, rw)
        .or_else(|| divide_exact(expr, rw))
        .or_else(|| split_divisible(expr, rw))
        .or_else(|| modular_remainder(expr, rw))
        .or_else(|| nested_division(expr, rw))
        .or_else(|| reduce_offset(expr, rw))
}

#[cfg(test)]
mod tests {
    use crate::{rewrite::rewrite_simplify, Analyzer, Binding, Range};
    use pretty_assertions::assert_eq;
    use sym_ir::{build::*, Var};
    use super::*;

    #[test]
    fn floor_remainders() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        assert_eq!(rewrite_simplify(&analyzer, &floormod(x.clone() * 8 + y.clone(), 4)), floormod(y.clone(), 4));
        assert_eq!(rewrite_simplify(&analyzer, &floormod(x.clone() * 6 + 3, 3)), Expr::int32(0));
        assert_eq!(rewrite_simplify(&analyzer, &floormod(x.clone() + 10, 4)), floormod(x.clone() + 2, 4));
        assert_eq!(rewrite_simplify(&analyzer, &floormod(x.clone() - 1, 4)), floormod(x.clone() + 3, 4));
        assert_eq!(rewrite_simplify(&analyzer, &floormod(floormod(x.clone(), 8), 4)), floormod(x.clone(), 4));
        assert_eq!(rewrite_simplify(&analyzer, &floormod(x.clone() * 4 + 5, 2)), Expr::int32(1));
    }

    #[test]
    fn truncated_remainders_need_signs() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        let expr = truncmod(x.expr() * 4 + 5, 2);
        assert_eq!(rewrite_simplify(&analyzer, &expr), expr);

        analyzer.bind(&x, Binding::Range(Range::new(0, 100)), false).unwrap();
        assert_eq!(rewrite_simplify(&analyzer, &expr), Expr::int32(1));
        assert_eq!(rewrite_simplify(&analyzer, &truncmod(x.expr(), 200)), x.expr());
    }
}
