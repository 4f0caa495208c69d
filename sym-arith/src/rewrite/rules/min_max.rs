//! Simplification rules for `min` and `max`.

use crate::rewrite::{step::Step, Rewriter};
use sym_ir::{BinaryOp, Expr};
use super::{constant, is_integer, make, with_const};

/// Returns the operation dual to `op`: `min` for `max`, and `max` for `min`.
fn dual(op: BinaryOp) -> BinaryOp {
    if op == BinaryOp::Min {
        BinaryOp::Max
    } else {
        BinaryOp::Min
    }
}

fn as_min_max(expr: &Expr) -> Option<(BinaryOp, &Expr, &Expr)> {
    let (op, a, b) = expr.as_binary()?;
    matches!(op, BinaryOp::Min | BinaryOp::Max).then_some((op, a, b))
}

/// `min(x, y) = x` if `x <= y` can be proven
/// `max(x, y) = y` if `x <= y` can be proven
pub fn min_max_known(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, x, y) = as_min_max(expr)?;
    let relation = rw.compare(x, y);
    let result = match (op, relation.is_le(), relation.is_ge()) {
        (BinaryOp::Min, true, _) | (BinaryOp::Max, _, true) => x.clone(),
        (BinaryOp::Min, _, true) | (BinaryOp::Max, true, _) => y.clone(),
        _ => return None,
    };

    rw.step(Step::MinMaxKnown);
    Some(result)
}

/// `min(min(x, 3), 5) = min(x, 3)`
/// `max(max(x, 3), 5) = max(x, 5)`
pub fn min_max_constants(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, inner, c2) = as_min_max(expr)?;
    let c2 = c2.as_int()?;
    let (x, c1) = with_const(inner, op)?;
    let c = if op == BinaryOp::Min { c1.min(c2) } else { c1.max(c2) };
    let result = make(op, x.clone(), constant(x, c as i128)?)?;

    rw.step(Step::MinMaxConstants);
    Some(result)
}

/// `min(x, max(x, y)) = x`
/// `max(min(x, y), x) = x`
pub fn min_max_absorb(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, a, b) = as_min_max(expr)?;
    let absorbs = |x: &Expr, other: &Expr| {
        other.as_op(dual(op)).map_or(false, |(c, d)| c == x || d == x)
    };
    let result = if absorbs(a, b) {
        a.clone()
    } else if absorbs(b, a) {
        b.clone()
    } else {
        return None;
    };

    rw.step(Step::MinMaxAbsorb);
    Some(result)
}

/// `min(min(x, y), x) = min(x, y)`
/// `min(y, min(x, y)) = min(x, y)`
pub fn min_max_nested(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, a, b) = as_min_max(expr)?;
    let contains = |inner: &Expr, x: &Expr| inner.as_op(op).map_or(false, |(c, d)| c == x || d == x);
    let result = if contains(a, b) {
        a.clone()
    } else if contains(b, a) {
        b.clone()
    } else {
        return None;
    };

    rw.step(Step::MinMaxNested);
    Some(result)
}

/// `min(a + b, a + c) = a + min(b, c)`
/// `min(b - a, c - a) = min(b, c) - a`
/// `min(a - b, a - c) = a - max(b, c)`
pub fn min_max_common_term(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = as_min_max(expr)?;
    let result = if let (Some((a, b)), Some((c, d))) = (lhs.as_op(BinaryOp::Add), rhs.as_op(BinaryOp::Add)) {
        if a == c {
            make(BinaryOp::Add, a.clone(), make(op, b.clone(), d.clone())?)?
        } else if b == d {
            make(BinaryOp::Add, make(op, a.clone(), c.clone())?, b.clone())?
        } else if a == d {
            make(BinaryOp::Add, a.clone(), make(op, b.clone(), c.clone())?)?
        } else if b == c {
            make(BinaryOp::Add, make(op, a.clone(), d.clone())?, b.clone())?
        } else {
            return None;
        }
    } else if let (Some((a, b)), Some((c, d))) = (lhs.as_op(BinaryOp::Sub), rhs.as_op(BinaryOp::Sub)) {
        if b == d {
            make(BinaryOp::Sub, make(op, a.clone(), c.clone())?, b.clone())?
        } else if a == c {
            make(BinaryOp::Sub, a.clone(), make(dual(op), b.clone(), d.clone())?)?
        } else {
            return None;
        }
    } else {
        return None;
    };

    rw.step(Step::MinMaxCommonTerm);
    Some(result)
}

/// `min(x * 4, y * 4) = min(x, y) * 4`
/// `min(x * -4, y * -4) = max(x, y) * -4`
/// `min(x * 4, 12) = min(x, 3) * 4`
pub fn min_max_scale(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = as_min_max(expr)?;
    let (x, c) = with_const(lhs, BinaryOp::Mul)?;
    if c == 0 {
        return None;
    }
    let scaled_op = if c > 0 { op } else { dual(op) };
    let inner = match with_const(rhs, BinaryOp::Mul) {
        Some((y, c2)) if c2 == c => make(scaled_op, x.clone(), y.clone())?,
        _ => {
            let value = rhs.as_int()?;
            if c < 0 || value % c != 0 {
                return None;
            }
            make(op, x.clone(), constant(x, (value / c) as i128)?)?
        },
    };
    let result = make(BinaryOp::Mul, inner, constant(x, c as i128)?)?;

    rw.step(Step::MinMaxScale);
    Some(result)
}

/// Applies all `min` / `max` rules.
pub fn all(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    if !is_integer(expr) {
        return None;
    }
    min_max_constants(expr, rw)
        .or_else(|| min_max_absorb(expr, rw))
        .or_else(|| min_max_nested(expr, rw))
        .or_else(|| min_max_common_term(expr, rw))
        .or_else(|| min_max_scale(expr, rw))
        .or_else(|| min_max_known(expr, rw))
}

#[cfg(test)]
mod tests {
    use crate::{rewrite::rewrite_simplify, Analyzer, Binding, Range};
    use pretty_assertions::assert_eq;
    use sym_ir::{build::*, Var};
    use super::*;

    #[test]
    fn structural() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        assert_eq!(rewrite_simplify(&analyzer, &min(min(x.clone(), 3), 5)), min(x.clone(), 3));
        assert_eq!(rewrite_simplify(&analyzer, &max(max(x.clone(), 3), 5)), max(x.clone(), 5));
        assert_eq!(rewrite_simplify(&analyzer, &min(x.clone(), max(x.clone(), y.clone()))), x.clone());
        assert_eq!(rewrite_simplify(&analyzer, &max(min(y.clone(), x.clone()), x.clone())), x.clone());
        assert_eq!(rewrite_simplify(&analyzer, &min(min(x.clone(), y.clone()), y.clone())), min(x.clone(), y.clone()));
    }

    #[test]
    fn factors() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        let z = Var::int32("z").expr();
        assert_eq!(
            rewrite_simplify(&analyzer, &min(x.clone() + y.clone(), x.clone() + z.clone())),
            x.clone() + min(y.clone(), z.clone()),
        );
        assert_eq!(
            rewrite_simplify(&analyzer, &max(x.clone() - y.clone(), x.clone() - z.clone())),
            x.clone() - min(y.clone(), z.clone()),
        );
        assert_eq!(rewrite_simplify(&analyzer, &min(x.clone() * -2, y.clone() * -2)), max(x.clone(), y) * -2);
        assert_eq!(rewrite_simplify(&analyzer, &max(x.clone() * 4, 12)), max(x, 3) * 4);
    }

    #[test]
    fn proven_operand() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        let y = Var::int32("y");
        analyzer.bind(&x, Binding::Range(Range::new(0, 8)), false).unwrap();
        analyzer.bind(&y, Binding::Range(Range::new(8, 8)), false).unwrap();
        assert_eq!(rewrite_simplify(&analyzer, &min(x.expr(), y.expr())), x.expr());
        assert_eq!(rewrite_simplify(&analyzer, &max(x.expr(), y.expr())), y.expr());
        assert_eq!(rewrite_simplify(&analyzer, &max(x.expr() + 1, x.expr())), x.expr() + 1);
    }
}
