//! Simplification rules for comparisons.
//!
//! Integer comparisons are brought into a normal form: `>` and `>=` are flipped into `<` and `<=`,
//! a constant on the right is compared with `<`, and a constant on the left with `<=`. Constants
//! are then moved to one side and common terms cancelled.

use crate::rewrite::{step::Step, Rewriter};
use sym_ir::{eval::floor_div, BinaryOp, Expr, ExprKind};
use super::{constant, is_integer, make, with_const};

/// `ceil(a / b)` for a non-zero `b`.
fn ceil_div(a: i128, b: i128) -> Option<i128> {
    floor_div(-a, b).map(|q| -q)
}

/// `x - y < 0 = x < y`
/// `0 <= x - y = y <= x`
pub fn compare_difference(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    if !op.is_comparison() || !is_integer(lhs) {
        return None;
    }
    let result = if rhs.is_int(0) {
        let (x, y) = lhs.as_op(BinaryOp::Sub)?;
        make(op, x.clone(), y.clone())?
    } else if lhs.is_int(0) {
        let (x, y) = rhs.as_op(BinaryOp::Sub)?;
        make(op, y.clone(), x.clone())?
    } else {
        return None;
    };

    rw.step(Step::CompareDifference);
    Some(result)
}

/// `x > y = y < x`
/// `x >= y = y <= x`
/// `x <= 3 = x < 4`
/// `3 < x = 4 <= x`
pub fn normalize_comparison(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    let result = match op {
        BinaryOp::Gt => make(BinaryOp::Lt, rhs.clone(), lhs.clone())?,
        BinaryOp::Ge => make(BinaryOp::Le, rhs.clone(), lhs.clone())?,
        BinaryOp::Le if is_integer(lhs) && !lhs.is_const() => {
            let c = rhs.as_int()?;
            make(BinaryOp::Lt, lhs.clone(), constant(rhs, c as i128 + 1)?)?
        },
        BinaryOp::Lt if is_integer(lhs) && !rhs.is_const() => {
            let c = lhs.as_int()?;
            make(BinaryOp::Le, constant(lhs, c as i128 + 1)?, rhs.clone())?
        },
        _ => return None,
    };

    rw.step(Step::NormalizeComparison);
    Some(result)
}

/// `a == true = a`
/// `a == false = !a`
/// `a != true = !a`
/// `a != false = a`
pub fn bool_equality(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    let value = rhs.as_bool()?;
    let keep = match op {
        BinaryOp::Eq => value,
        BinaryOp::Ne => !value,
        _ => return None,
    };
    let result = if keep {
        lhs.clone()
    } else {
        Expr::try_not(lhs.clone()).ok()?
    };

    rw.step(Step::BoolEquality);
    Some(result)
}

/// `x < y = true` if `x < y` can be proven
pub fn compare_known(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    if !op.is_comparison() || !is_integer(lhs) {
        return None;
    }
    let value = rw.compare(lhs, rhs).decides(op)?;

    rw.step(Step::CompareKnown);
    Some(Expr::make_const(expr.dtype(), value as i64))
}

/// `x + 3 < 5 = x < 2`
/// `x - 3 == 5 = x == 8`
/// `10 - x < 4 = 6 < x`
/// `2 <= x + 3 = -1 <= x`
/// `2 <= 10 - x = x <= 8`
pub fn move_constant(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    if !op.is_comparison() || !is_integer(lhs) {
        return None;
    }
    let result = if let Some(c2) = rhs.as_int() {
        let c2 = c2 as i128;
        let (sum_op, a, b) = lhs.as_binary()?;
        match (sum_op, a.as_int(), b.as_int()) {
            (BinaryOp::Add, _, Some(c1)) => make(op, a.clone(), constant(a, c2 - c1 as i128)?)?,
            (BinaryOp::Sub, _, Some(c1)) => make(op, a.clone(), constant(a, c2 + c1 as i128)?)?,
            (BinaryOp::Sub, Some(c1), None) => {
                let c = constant(b, c1 as i128 - c2)?;
                match op {
                    BinaryOp::Eq | BinaryOp::Ne => make(op, b.clone(), c)?,
                    _ => make(op, c, b.clone())?,
                }
            },
            _ => return None,
        }
    } else if let Some(c1) = lhs.as_int() {
        let c1 = c1 as i128;
        let (sum_op, a, b) = rhs.as_binary()?;
        match (sum_op, a.as_int(), b.as_int()) {
            (BinaryOp::Add, _, Some(c2)) => make(op, constant(a, c1 - c2 as i128)?, a.clone())?,
            (BinaryOp::Sub, _, Some(c2)) => make(op, constant(a, c1 + c2 as i128)?, a.clone())?,
            (BinaryOp::Sub, Some(c2), None) => make(op, b.clone(), constant(b, c2 as i128 - c1)?)?,
            _ => return None,
        }
    } else {
        return None;
    };

    rw.step(Step::MoveConstant);
    Some(result)
}

/// `x * 4 < 10 = x < 3`
/// `x * -4 < 10 = -3 < x`
/// `10 <= x * 4 = 3 <= x`
/// `x * 4 == 8 = x == 2`
/// `x * 4 == 10 = false`
pub fn divide_comparison(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    if !op.is_comparison() || !is_integer(lhs) {
        return None;
    }
    let result = if let Some(c2) = rhs.as_int() {
        let (x, c1) = with_const(lhs, BinaryOp::Mul)?;
        let (c1, c2) = (c1 as i128, c2 as i128);
        match op {
            _ if c1 == 0 => return None,
            BinaryOp::Lt if c1 > 0 => make(op, x.clone(), constant(x, ceil_div(c2, c1)?)?)?,
            BinaryOp::Lt => make(op, constant(x, floor_div(c2, c1)?)?, x.clone())?,
            BinaryOp::Eq | BinaryOp::Ne if c2 % c1 == 0 => make(op, x.clone(), constant(x, c2 / c1)?)?,
            BinaryOp::Eq => Expr::make_const(expr.dtype(), 0),
            BinaryOp::Ne => Expr::make_const(expr.dtype(), 1),
            _ => return None,
        }
    } else if let Some(c1) = lhs.as_int() {
        let (x, c2) = with_const(rhs, BinaryOp::Mul)?;
        let (c1, c2) = (c1 as i128, c2 as i128);
        match op {
            BinaryOp::Le if c2 > 0 => make(op, constant(x, ceil_div(c1, c2)?)?, x.clone())?,
            BinaryOp::Le if c2 < 0 => make(op, x.clone(), constant(x, floor_div(c1, c2)?)?)?,
            _ => return None,
        }
    } else {
        return None;
    };

    rw.step(Step::DivideComparison);
    Some(result)
}

/// `x + y < x + z = y < z`
/// `x + y < x = y < 0`
/// `x - y < x - z = z < y`
/// `x * 4 < y * 4 = x < y`
pub fn cancel_comparison(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    if !op.is_comparison() || !is_integer(lhs) {
        return None;
    }
    let zero = || constant(lhs, 0);

    let (new_lhs, new_rhs) = if let (Some((a, b)), Some((c, d))) = (lhs.as_op(BinaryOp::Add), rhs.as_op(BinaryOp::Add)) {
        if a == c {
            (b.clone(), d.clone())
        } else if a == d {
            (b.clone(), c.clone())
        } else if b == c {
            (a.clone(), d.clone())
        } else if b == d {
            (a.clone(), c.clone())
        } else {
            return None;
        }
    } else if let (Some((a, b)), Some((c, d))) = (lhs.as_op(BinaryOp::Sub), rhs.as_op(BinaryOp::Sub)) {
        if a == c {
            (d.clone(), b.clone())
        } else if b == d {
            (a.clone(), c.clone())
        } else {
            return None;
        }
    } else if let (Some((x, c1)), Some((y, c2))) = (with_const(lhs, BinaryOp::Mul), with_const(rhs, BinaryOp::Mul)) {
        if c1 == 0 || c1 != c2 {
            return None;
        }
        if c1 > 0 || matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            (x.clone(), y.clone())
        } else {
            (y.clone(), x.clone())
        }
    } else if let Some((a, b)) = lhs.as_op(BinaryOp::Add) {
        if a == rhs {
            (b.clone(), zero()?)
        } else if b == rhs {
            (a.clone(), zero()?)
        } else {
            return None;
        }
    } else if let Some((a, b)) = rhs.as_op(BinaryOp::Add) {
        if a == lhs {
            (zero()?, b.clone())
        } else if b == lhs {
            (zero()?, a.clone())
        } else {
            return None;
        }
    } else if let Some((_, b)) = lhs.as_op(BinaryOp::Sub).filter(|&(a, _)| a == rhs) {
        (zero()?, b.clone())
    } else if let Some((_, b)) = rhs.as_op(BinaryOp::Sub).filter(|&(a, _)| a == lhs) {
        (b.clone(), zero()?)
    } else {
        return None;
    };
    let result = make(op, new_lhs, new_rhs)?;

    rw.step(Step::CancelComparison);
    Some(result)
}

/// `x * 8 + y < 16 = x < 2` if `0 <= y < 8`
/// `16 <= x * 8 + y = 2 <= x` if `0 <= y < 8`
pub fn drop_remainder(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    let (sum, c2, strict) = match op {
        BinaryOp::Lt => (lhs, rhs.as_int()?, true),
        BinaryOp::Le => (rhs, lhs.as_int()?, false),
        _ => return None,
    };
    let (a, b) = sum.as_op(BinaryOp::Add)?;
    let ((x, c1), y) = match (with_const(a, BinaryOp::Mul), with_const(b, BinaryOp::Mul)) {
        (Some(term), _) => (term, b),
        (_, Some(term)) => (term, a),
        _ => return None,
    };
    if c1 <= 0 || c2 % c1 != 0 {
        return None;
    }
    let bound = rw.bound(y);
    if !bound.is_non_negative() || bound.max_bound().finite().map_or(true, |max| max >= c1) {
        return None;
    }
    let quotient = constant(x, (c2 / c1) as i128)?;
    let result = if strict {
        make(op, x.clone(), quotient)?
    } else {
        make(op, quotient, x.clone())?
    };

    rw.step(Step::DropRemainder);
    Some(result)
}

/// `floordiv(x, 4) < 3 = x < 12`
/// `3 <= floordiv(x, 4) = 12 <= x`
pub fn compare_floordiv(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    let result = match op {
        BinaryOp::Lt => {
            let k = rhs.as_int()?;
            let (x, c) = with_const(lhs, BinaryOp::FloorDiv)?;
            if c <= 0 {
                return None;
            }
            make(op, x.clone(), constant(x, k as i128 * c as i128)?)?
        },
        BinaryOp::Le => {
            let k = lhs.as_int()?;
            let (x, c) = with_const(rhs, BinaryOp::FloorDiv)?;
            if c <= 0 {
                return None;
            }
            make(op, constant(x, k as i128 * c as i128)?, x.clone())?
        },
        _ => return None,
    };

    rw.step(Step::CompareFloorDiv);
    Some(result)
}

/// Applies all comparison rules.
pub fn all(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    if !matches!(expr.kind(), ExprKind::Binary(op, ..) if op.is_comparison()) {
        return None;
    }
    compare_difference(expr, rw)
        .or_else(|| normalize_comparison(expr, rw))
        .or_else(|| bool_equality(expr, rw))
        .or_else(|| compare_known(expr, rw))
        .or_else(|| move_constant(expr, rw))
        .or_else(|| divide_comparison(expr, rw))
        .or_else(|| cancel_comparison(expr, rw))
        .or_else(|| drop_remainder(expr, rw))
        .or_else(|| compare_floordiv(expr, rw))
}

#[cfg(test)]
mod tests {
    use crate::{rewrite::rewrite_simplify, Analyzer, Binding, Range};
    use pretty_assertions::assert_eq;
    use sym_ir::{build::*, Var};
    use super::*;

    #[test]
    fn normal_form() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        assert_eq!(rewrite_simplify(&analyzer, &gt(x.clone(), y.clone())), lt(y.clone(), x.clone()));
        assert_eq!(rewrite_simplify(&analyzer, &le(x.clone(), 3)), lt(x.clone(), 4));
        assert_eq!(rewrite_simplify(&analyzer, &gt(x.clone(), 3)), le(4, x.clone()));
        assert_eq!(rewrite_simplify(&analyzer, &lt(x.clone() - y.clone(), 0)), lt(x.clone(), y.clone()));
        assert_eq!(rewrite_simplify(&analyzer, &eq(lt(x.clone(), y.clone()), false)), le(y, x));
    }

    #[test]
    fn moves_and_divides_constants() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        assert_eq!(rewrite_simplify(&analyzer, &lt(x.clone() + 3, 5)), lt(x.clone(), 2));
        assert_eq!(rewrite_simplify(&analyzer, &eq(x.clone() - 3, 5)), eq(x.clone(), 8));
        assert_eq!(rewrite_simplify(&analyzer, &lt(Expr::int32(10) - x.clone(), 4)), le(7, x.clone()));
        assert_eq!(rewrite_simplify(&analyzer, &lt(x.clone() * 4, 10)), lt(x.clone(), 3));
        assert_eq!(rewrite_simplify(&analyzer, &lt(x.clone() * -4, 10)), le(-2, x.clone()));
        assert_eq!(rewrite_simplify(&analyzer, &ge(x.clone() * 4, 10)), le(3, x.clone()));
        assert_eq!(rewrite_simplify(&analyzer, &eq(x.clone() * 4, 10)), Expr::bool(false));
        assert_eq!(rewrite_simplify(&analyzer, &lt(floordiv(x.clone(), 4), 3)), lt(x, 12));
    }

    #[test]
    fn cancels_terms() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        let z = Var::int32("z").expr();
        assert_eq!(rewrite_simplify(&analyzer, &lt(x.clone() + y.clone(), z.clone() + x.clone())), lt(y.clone(), z.clone()));
        assert_eq!(rewrite_simplify(&analyzer, &lt(x.clone() - y.clone(), x.clone() - z.clone())), lt(z.clone(), y.clone()));
        assert_eq!(rewrite_simplify(&analyzer, &lt(x.clone() * -2, y.clone() * -2)), lt(y.clone(), x.clone()));
        assert_eq!(rewrite_simplify(&analyzer, &lt(x.clone() + y.clone(), x.clone())), lt(y, 0));
    }

    #[test]
    fn drops_bounded_remainder() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        let y = Var::int32("y");
        analyzer.bind(&y, Binding::Range(Range::new(0, 8)), false).unwrap();
        let expr = lt(x.expr() * 8 + y.expr(), 16);
        assert_eq!(rewrite_simplify(&analyzer, &expr), lt(x.expr(), 2));

        analyzer.bind(&x, Binding::Range(Range::new(0, 2)), false).unwrap();
        assert_eq!(rewrite_simplify(&analyzer, &expr), Expr::bool(true));
    }
}
