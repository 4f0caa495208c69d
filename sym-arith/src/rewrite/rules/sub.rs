//! Simplification rules for expressions involving subtraction.

use crate::rewrite::{step::Step, Rewriter};
use sym_ir::{BinaryOp, Expr};
use super::{add::{distribute_select, split_coefficient}, constant, is_integer, make, with_const};

/// `x - -3 = x + 3`
pub fn negative_constant(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (x, c) = with_const(expr, BinaryOp::Sub)?;
    if c >= 0 {
        return None;
    }
    let result = make(BinaryOp::Add, x.clone(), constant(x, -(c as i128))?)?;

    rw.step(Step::NegativeConstant);
    Some(result)
}

/// `(x + 1) - 2 = x + -1`
/// `(x - 1) - 2 = x - 3`
/// `(1 - x) - 2 = -1 - x`
/// `1 - (x + 2) = -1 - x`
/// `1 - (2 - x) = x + -1`
pub fn collect_constants(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, rhs) = expr.as_op(BinaryOp::Sub)?;
    let result = if let Some(c2) = rhs.as_int() {
        let c2 = c2 as i128;
        let (op, a, b) = lhs.as_binary()?;
        match (op, a.as_int(), b.as_int()) {
            (BinaryOp::Add, _, Some(c1)) => make(BinaryOp::Add, a.clone(), constant(a, c1 as i128 - c2)?)?,
            (BinaryOp::Sub, _, Some(c1)) => make(BinaryOp::Sub, a.clone(), constant(a, c1 as i128 + c2)?)?,
            (BinaryOp::Sub, Some(c1), None) => make(BinaryOp::Sub, constant(b, c1 as i128 - c2)?, b.clone())?,
            _ => return None,
        }
    } else {
        let c1 = lhs.as_int()? as i128;
        let (op, a, b) = rhs.as_binary()?;
        match (op, a.as_int(), b.as_int()) {
            (BinaryOp::Add, _, Some(c2)) => make(BinaryOp::Sub, constant(a, c1 - c2 as i128)?, a.clone())?,
            (BinaryOp::Sub, Some(c2), None) => make(BinaryOp::Add, b.clone(), constant(b, c1 - c2 as i128)?)?,
            _ => return None,
        }
    };

    rw.step(Step::CollectConstants);
    Some(result)
}

/// `(x + y) - x = y`
/// `x - (x + y) = 0 - y`
/// `x - (x - y) = y`
/// `(x - y) - x = 0 - y`
/// `(a + b) - (a + c) = b - c`
/// `(a - b) - (a - c) = c - b`
pub fn cancel_terms(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, rhs) = expr.as_op(BinaryOp::Sub)?;
    let zero = || constant(lhs, 0);
    let negate = |e: &Expr| make(BinaryOp::Sub, zero()?, e.clone());

    let result = if let Some((a, b)) = lhs.as_op(BinaryOp::Add) {
        if let Some((c, d)) = rhs.as_op(BinaryOp::Add) {
            let (x, y) = if a == c {
                (b, d)
            } else if a == d {
                (b, c)
            } else if b == c {
                (a, d)
            } else if b == d {
                (a, c)
            } else {
                return None;
            };
            make(BinaryOp::Sub, x.clone(), y.clone())?
        } else if a == rhs {
            b.clone()
        } else if b == rhs {
            a.clone()
        } else {
            return None;
        }
    } else if let Some((a, b)) = lhs.as_op(BinaryOp::Sub) {
        match rhs.as_op(BinaryOp::Sub) {
            Some((c, d)) if a == c => make(BinaryOp::Sub, d.clone(), b.clone())?,
            _ if a == rhs => negate(b)?,
            _ => return None,
        }
    } else if let Some((a, b)) = rhs.as_op(BinaryOp::Add) {
        if a == lhs {
            negate(b)?
        } else if b == lhs {
            negate(a)?
        } else {
            return None;
        }
    } else if let Some((a, b)) = rhs.as_op(BinaryOp::Sub) {
        if a != lhs {
            return None;
        }
        b.clone()
    } else {
        return None;
    };

    rw.step(Step::CancelTerms);
    Some(result)
}

/// `x * 5 - x * 2 = x * 3`
/// `x * 5 - x = x * 4`
/// `x - x * 5 = x * -4`
pub fn factor_terms(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, rhs) = expr.as_op(BinaryOp::Sub)?;
    let (x, a) = split_coefficient(lhs);
    let (y, b) = split_coefficient(rhs);
    if x != y || (a == 1 && b == 1) || x.is_const() {
        return None;
    }
    let result = make(BinaryOp::Mul, x.clone(), constant(x, a as i128 - b as i128)?)?;

    rw.step(Step::FactorTerms);
    Some(result)
}

/// `x - min(x, y) = max(x - y, 0)`
/// `x - max(x, y) = min(x - y, 0)`
/// `min(x, y) - x = min(y - x, 0)`
/// `max(x, y) - x = max(y - x, 0)`
pub fn subtract_min_max(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    /// If `expr` is `op(x, y)` or `op(y, x)`, returns `y`.
    fn other<'e>(expr: &'e Expr, op: BinaryOp, x: &Expr) -> Option<&'e Expr> {
        let (a, b) = expr.as_op(op)?;
        if a == x {
            Some(b)
        } else if b == x {
            Some(a)
        } else {
            None
        }
    }

    let (lhs, rhs) = expr.as_op(BinaryOp::Sub)?;
    let zero = constant(lhs, 0)?;
    let result = if let Some(y) = other(rhs, BinaryOp::Min, lhs) {
        make(BinaryOp::Max, make(BinaryOp::Sub, lhs.clone(), y.clone())?, zero)?
    } else if let Some(y) = other(rhs, BinaryOp::Max, lhs) {
        make(BinaryOp::Min, make(BinaryOp::Sub, lhs.clone(), y.clone())?, zero)?
    } else if let Some(y) = other(lhs, BinaryOp::Min, rhs) {
        make(BinaryOp::Min, make(BinaryOp::Sub, y.clone(), rhs.clone())?, zero)?
    } else if let Some(y) = other(lhs, BinaryOp::Max, rhs) {
        make(BinaryOp::Max, make(BinaryOp::Sub, y.clone(), rhs.clone())?, zero)?
    } else {
        return None;
    };

    rw.step(Step::SubtractMinMax);
    Some(result)
}

/// `(x + 1) - y = (x - y) + 1`
/// `(x - 1) - y = (x - y) - 1`
/// `x - (y + 1) = (x - y) - 1`
/// `x - (y - 1) = (x - y) + 1`
pub fn move_constant_out(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, rhs) = expr.as_op(BinaryOp::Sub)?;
    if lhs.is_const() || rhs.is_const() {
        return None;
    }
    let split = |e: &Expr| {
        let (op, x, c) = e.as_binary()?;
        (matches!(op, BinaryOp::Add | BinaryOp::Sub) && c.as_int().is_some() && !x.is_const())
            .then(|| (op, x.clone(), c.clone()))
    };
    let result = match (split(lhs), split(rhs)) {
        (Some((op, x, c)), _) => make(op, make(BinaryOp::Sub, x, rhs.clone())?, c)?,
        (_, Some((op, y, c))) => {
            let outer = if op == BinaryOp::Add { BinaryOp::Sub } else { BinaryOp::Add };
            make(outer, make(BinaryOp::Sub, lhs.clone(), y)?, c)?
        },
        _ => return None,
    };

    rw.step(Step::MoveConstantOut);
    Some(result)
}

/// Applies all subtraction rules.
pub fn all(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    if !is_integer(expr) {
        return None;
    }
    negative_constant(expr, rw)
        .or_else(|| collect_constants(expr, rw))
        .or_else(|| cancel_terms(expr, rw))
        .or_else(|| factor_terms(expr, rw))
        .or_else(|| subtract_min_max(expr, rw))
        .or_else(|| distribute_select(expr, rw))
        .or_else(|| move_constant_out(expr, rw))
}

#[cfg(test)]
mod tests {
    use crate::{rewrite::rewrite_simplify, Analyzer};
    use pretty_assertions::assert_eq;
    use sym_ir::{build::*, Var};
    use super::*;

    #[test]
    fn collects_constants() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        assert_eq!(rewrite_simplify(&analyzer, &((x.clone() - 1) - 2)), x.clone() - 3);
        assert_eq!(rewrite_simplify(&analyzer, &((x.clone() + 1) - 2)), x.clone() - 1);
        assert_eq!(rewrite_simplify(&analyzer, &(Expr::int32(1) - (x.clone() + 2))), Expr::int32(-1) - x.clone());
        assert_eq!(rewrite_simplify(&analyzer, &(Expr::int32(10) - (Expr::int32(4) - x.clone()))), x + 6);
    }

    #[test]
    fn cancels_common_terms() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        let z = Var::int32("z").expr();
        assert_eq!(rewrite_simplify(&analyzer, &((y.clone() + x.clone()) - (x.clone() + y.clone()))), Expr::int32(0));
        assert_eq!(rewrite_simplify(&analyzer, &((x.clone() + y.clone()) - (x.clone() + z.clone()))), y.clone() - z.clone());
        assert_eq!(rewrite_simplify(&analyzer, &(x.clone() - (x.clone() - y.clone()))), y.clone());
        assert_eq!(rewrite_simplify(&analyzer, &((x.clone() + 3) - (y.clone() + 1))), (x.clone() - y.clone()) + 2);
        assert_eq!(rewrite_simplify(&analyzer, &(x.clone() * 5 - x.clone())), x * 4);
    }

    #[test]
    fn subtracts_min_max() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        assert_eq!(
            rewrite_simplify(&analyzer, &(x.clone() - min(y.clone(), x.clone()))),
            max(x.clone() - y.clone(), 0),
        );
        assert_eq!(
            rewrite_simplify(&analyzer, &(max(x.clone(), y.clone()) - x.clone())),
            max(y - x, 0),
        );
    }
}
