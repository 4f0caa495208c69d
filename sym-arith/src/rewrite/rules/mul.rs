//! Simplification rules for expressions involving multiplication.

use crate::rewrite::{step::Step, Rewriter};
use sym_ir::{BinaryOp, Expr};
use super::{constant, is_integer, make, with_const};

/// `(x * 2) * 3 = x * 6`
pub fn collect_constants(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, c2) = with_const(expr, BinaryOp::Mul)?;
    let (x, c1) = with_const(lhs, BinaryOp::Mul)?;
    let result = make(BinaryOp::Mul, x.clone(), constant(x, c1 as i128 * c2 as i128)?)?;

    rw.step(Step::CollectConstants);
    Some(result)
}

/// `(x + 1) * 3 = x * 3 + 3`
/// `(x - 1) * 3 = x * 3 - 3`
/// `(1 - x) * 3 = 3 - x * 3`
pub fn distribute_constant(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, c2) = with_const(expr, BinaryOp::Mul)?;
    let (op, a, b) = lhs.as_binary()?;
    if !matches!(op, BinaryOp::Add | BinaryOp::Sub) {
        return None;
    }
    let scale = |e: &Expr| match e.as_int() {
        Some(c1) => constant(e, c1 as i128 * c2 as i128),
        None => make(BinaryOp::Mul, e.clone(), constant(e, c2 as i128)?),
    };
    if a.is_const() == b.is_const() {
        return None;
    }
    let result = make(op, scale(a)?, scale(b)?)?;

    rw.step(Step::DistributeConstant);
    Some(result)
}

/// Applies all multiplication rules.
pub fn all(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    if !is_integer(expr) {
        return None;
    }
    collect_constants(expr, rw)
        .or_else(|| distribute_constant(expr, rw))
}

#[cfg(test)]
mod tests {
    use crate::{rewrite::rewrite_simplify, Analyzer};
    use pretty_assertions::assert_eq;
    use sym_ir::Var;
    use super::*;

    #[test]
    fn scales_sums() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        assert_eq!(rewrite_simplify(&analyzer, &((x.clone() * 2) * 3)), x.clone() * 6);
        assert_eq!(rewrite_simplify(&analyzer, &((x.clone() + 1) * 4)), x.clone() * 4 + 4);
        assert_eq!(rewrite_simplify(&analyzer, &((Expr::int32(2) - x.clone()) * 3)), Expr::int32(6) - x * 3);
    }
}
