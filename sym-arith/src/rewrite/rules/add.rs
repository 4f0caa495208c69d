//! Simplification rules for expressions involving addition, including combining like terms and
//! reassembling division and remainder pairs.

use crate::rewrite::{step::Step, Rewriter};
use sym_ir::{BinaryOp, Expr, ExprKind};
use super::{constant, is_integer, make, with_const};

/// `x + -3 = x - 3`
pub fn negative_constant(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (x, c) = with_const(expr, BinaryOp::Add)?;
    if c >= 0 {
        return None;
    }
    let result = make(BinaryOp::Sub, x.clone(), constant(x, -(c as i128))?)?;

    rw.step(Step::NegativeConstant);
    Some(result)
}

/// `(x + 1) + 2 = x + 3`
/// `(x - 1) + 2 = x + 1`
/// `(1 - x) + 2 = 3 - x`
pub fn collect_constants(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, c2) = with_const(expr, BinaryOp::Add)?;
    let c2 = c2 as i128;
    let (op, a, b) = lhs.as_binary()?;
    let result = match (op, a.as_int(), b.as_int()) {
        (BinaryOp::Add, _, Some(c1)) => make(BinaryOp::Add, a.clone(), constant(a, c1 as i128 + c2)?)?,
        (BinaryOp::Sub, _, Some(c1)) => make(BinaryOp::Add, a.clone(), constant(a, c2 - c1 as i128)?)?,
        (BinaryOp::Sub, Some(c1), None) => make(BinaryOp::Sub, constant(b, c1 as i128 + c2)?, b.clone())?,
        _ => return None,
    };

    rw.step(Step::CollectConstants);
    Some(result)
}

/// `x + x = x * 2`
pub fn add_self(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, rhs) = expr.as_op(BinaryOp::Add)?;
    if lhs != rhs {
        return None;
    }
    let result = make(BinaryOp::Mul, lhs.clone(), constant(lhs, 2)?)?;

    rw.step(Step::AddSelf);
    Some(result)
}

/// Splits `x * c` into `(x, c)`, and any other expression `x` into `(x, 1)`.
pub(crate) fn split_coefficient(expr: &Expr) -> (&Expr, i64) {
    with_const(expr, BinaryOp::Mul).unwrap_or((expr, 1))
}

/// `x * 2 + x * 3 = x * 5`
/// `x * 2 + x = x * 3`
/// `x + x * 2 = x * 3`
pub fn factor_terms(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, rhs) = expr.as_op(BinaryOp::Add)?;
    let (x, a) = split_coefficient(lhs);
    let (y, b) = split_coefficient(rhs);
    if x != y || (a == 1 && b == 1) || x.is_const() {
        return None;
    }
    let result = make(BinaryOp::Mul, x.clone(), constant(x, a as i128 + b as i128)?)?;

    rw.step(Step::FactorTerms);
    Some(result)
}

/// `(x - y) + y = x`
/// `y + (x - y) = x`
pub fn cancel_terms(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, rhs) = expr.as_op(BinaryOp::Add)?;
    let result = match (lhs.as_op(BinaryOp::Sub), rhs.as_op(BinaryOp::Sub)) {
        (Some((x, y)), _) if y == rhs => x.clone(),
        (_, Some((x, y))) if y == lhs => x.clone(),
        _ => return None,
    };

    rw.step(Step::CancelTerms);
    Some(result)
}

/// `truncdiv(x, c) * c + truncmod(x, c) = x`
/// `floordiv(x, c) * c + floormod(x, c) = x`
///
/// The operands may also appear in the other order.
pub fn reassemble_div_mod(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    fn matches(product: &Expr, remainder: &Expr) -> Option<Expr> {
        let (quotient, c) = product.as_op(BinaryOp::Mul)?;
        let (div_op, x, divisor) = quotient.as_binary()?;
        let mod_op = match div_op {
            BinaryOp::Div => BinaryOp::Mod,
            BinaryOp::FloorDiv => BinaryOp::FloorMod,
            _ => return None,
        };
        let (y, modulus) = remainder.as_op(mod_op)?;
        (x == y && divisor == c && modulus == c).then(|| x.clone())
    }

    let (lhs, rhs) = expr.as_op(BinaryOp::Add)?;
    let result = matches(lhs, rhs).or_else(|| matches(rhs, lhs))?;

    rw.step(Step::ReassembleDivMod);
    Some(result)
}

/// `min(x, y) + max(x, y) = x + y`
/// `max(x, y) + min(x, y) = x + y`
pub fn min_plus_max(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, rhs) = expr.as_op(BinaryOp::Add)?;
    let ((a, b), (c, d)) = match (lhs.as_op(BinaryOp::Min), rhs.as_op(BinaryOp::Max)) {
        (Some(min), Some(max)) => (min, max),
        _ => (rhs.as_op(BinaryOp::Min)?, lhs.as_op(BinaryOp::Max)?),
    };
    if !((a == c && b == d) || (a == d && b == c)) {
        return None;
    }
    let result = make(BinaryOp::Add, a.clone(), b.clone())?;

    rw.step(Step::MinPlusMax);
    Some(result)
}

/// `select(c, a, b) + select(c, d, e) = select(c, a + d, b + e)`
/// `select(c, a, b) - select(c, d, e) = select(c, a - d, b - e)`
pub fn distribute_select(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    if !matches!(op, BinaryOp::Add | BinaryOp::Sub) {
        return None;
    }
    let (ExprKind::Select(c1, a, b), ExprKind::Select(c2, d, e)) = (lhs.kind(), rhs.kind()) else {
        return None;
    };
    if c1 != c2 {
        return None;
    }
    let result = Expr::try_select(c1.clone(), make(op, a.clone(), d.clone())?, make(op, b.clone(), e.clone())?).ok()?;

    rw.step(Step::DistributeSelect);
    Some(result)
}

/// `(x + 1) + y = (x + y) + 1`
/// `x + (y + 1) = (x + y) + 1`
/// `(x - 1) + y = (x + y) - 1`
/// `x + (y - 1) = (x + y) - 1`
pub fn move_constant_out(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, rhs) = expr.as_op(BinaryOp::Add)?;
    if lhs.is_const() || rhs.is_const() {
        return None;
    }
    let split = |e: &Expr| {
        let (op, x, c) = e.as_binary()?;
        (matches!(op, BinaryOp::Add | BinaryOp::Sub) && c.as_int().is_some() && !x.is_const())
            .then(|| (op, x.clone(), c.clone()))
    };
    let (sum, outer_op, c) = match (split(lhs), split(rhs)) {
        (Some((op, x, c)), _) => (make(BinaryOp::Add, x, rhs.clone())?, op, c),
        (_, Some((op, y, c))) => (make(BinaryOp::Add, lhs.clone(), y)?, op, c),
        _ => return None,
    };
    let result = make(outer_op, sum, c)?;

    rw.step(Step::MoveConstantOut);
    Some(result)
}

/// Applies all addition rules.
pub fn all(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    if !is_integer(expr) {
        return None;
    }
    negative_constant(expr, rw)
        .or_else(|| collect_constants(expr, rw))
        .or_else(|| cancel_terms(expr, rw))
        .or_else(|| add_self(expr, rw))
        .or_else(|| factor_terms(expr, rw))
        .or_else(|| reassemble_div_mod(expr, rw))
        .or_else(|| min_plus_max(expr, rw))
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
    fn factors_like_terms() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        assert_eq!(rewrite_simplify(&analyzer, &(x.clone() * 4 + x.clone())), x.clone() * 5);
        assert_eq!(rewrite_simplify(&analyzer, &(x.clone() + x.clone() * -1)), Expr::int32(0));
    }

    #[test]
    fn distributes_selects() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let c = lt(x.clone(), 3);
        let expr = select(c.clone(), x.clone(), 1) + select(c.clone(), 2, x.clone());
        assert_eq!(rewrite_simplify(&analyzer, &expr), select(c, x.clone() + 2, x + 1));
    }
}
