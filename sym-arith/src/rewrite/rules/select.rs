//! Simplification rules for `select` and `if_then_else`.

use crate::rewrite::{step::Step, Rewriter};
use sym_ir::{BinaryOp, CallOp, Expr, ExprKind};
use super::{is_integer, make};

/// Returns the condition and the two values of a `select` or an `if_then_else` call.
fn as_conditional(expr: &Expr) -> Option<(&Expr, &Expr, &Expr)> {
    match expr.kind() {
        ExprKind::Select(cond, t, f) => Some((cond, t, f)),
        ExprKind::Call { op: CallOp::IfThenElse, args } if args.len() == 3 => {
            Some((&args[0], &args[1], &args[2]))
        },
        _ => None,
    }
}

/// Rebuilds a conditional of the same kind as `like`.
fn rebuild(like: &Expr, cond: Expr, t: Expr, f: Expr) -> Option<Expr> {
    match like.kind() {
        ExprKind::Select(..) => Expr::try_select(cond, t, f).ok(),
        _ => Some(Expr::new(like.dtype(), ExprKind::Call { op: CallOp::IfThenElse, args: vec![cond, t, f] })),
    }
}

/// `select(true, a, b) = a`
/// `select(false, a, b) = b`
pub fn select_constant(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (cond, t, f) = as_conditional(expr)?;
    let result = if cond.as_bool()? { t.clone() } else { f.clone() };

    rw.step(Step::SelectConstant);
    Some(result)
}

/// `select(c, a, a) = a`
pub fn select_same(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (_, t, f) = as_conditional(expr)?;
    if t != f {
        return None;
    }

    rw.step(Step::SelectSame);
    Some(t.clone())
}

/// `select(!c, a, b) = select(c, b, a)`
pub fn select_negated(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (cond, t, f) = as_conditional(expr)?;
    let ExprKind::Not(inner) = cond.kind() else { return None };
    let result = rebuild(expr, inner.clone(), f.clone(), t.clone())?;

    rw.step(Step::SelectNegated);
    Some(result)
}

/// `select(x < y, x, y) = min(x, y)`
/// `select(x < y, y, x) = max(x, y)`
///
/// Also for `<=`. Only applies to integers.
pub fn select_to_min_max(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let ExprKind::Select(cond, t, f) = expr.kind() else { return None };
    if !is_integer(expr) {
        return None;
    }
    let (op, a, b) = cond.as_binary()?;
    if !matches!(op, BinaryOp::Lt | BinaryOp::Le) {
        return None;
    }
    let result = if t == a && f == b {
        make(BinaryOp::Min, a.clone(), b.clone())?
    } else if t == b && f == a {
        make(BinaryOp::Max, a.clone(), b.clone())?
    } else {
        return None;
    };

    rw.step(Step::SelectToMinMax);
    Some(result)
}

/// `select(c, select(c, a, b), d) = select(c, a, d)`
/// `select(c, a, select(c, b, d)) = select(c, a, d)`
pub fn select_nested(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (cond, t, f) = as_conditional(expr)?;
    let result = match (as_conditional(t), as_conditional(f)) {
        (Some((inner, a, _)), _) if inner == cond => rebuild(expr, cond.clone(), a.clone(), f.clone())?,
        (_, Some((inner, _, d))) if inner == cond => rebuild(expr, cond.clone(), t.clone(), d.clone())?,
        _ => return None,
    };

    rw.step(Step::SelectNested);
    Some(result)
}

/// Applies all conditional rules.
pub fn all(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    select_constant(expr, rw)
        .or_else(|| select_same(expr, rw))
        .or_else(|| select_negated(expr, rw))
        .or_else(|| select_to_min_max(expr, rw))
        .or_else(|| select_nested(expr, rw))
}

#[cfg(test)]
mod tests {
    use crate::{rewrite::rewrite_simplify, Analyzer};
    use pretty_assertions::assert_eq;
    use sym_ir::{build::*, Var};
    use super::*;

    #[test]
    fn selects() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        let c = lt(x.clone(), y.clone());
        assert_eq!(rewrite_simplify(&analyzer, &select(true, x.clone(), y.clone())), x.clone());
        assert_eq!(rewrite_simplify(&analyzer, &select(c.clone(), x.clone(), y.clone())), min(x.clone(), y.clone()));
        assert_eq!(rewrite_simplify(&analyzer, &select(c.clone(), y.clone(), x.clone())), max(x.clone(), y.clone()));
        assert_eq!(rewrite_simplify(&analyzer, &select(c.clone(), x.clone() + 1, x.clone() + 1)), x.clone() + 1);
        assert_eq!(
            rewrite_simplify(&analyzer, &select(c.clone(), select(c.clone(), x.clone(), 3), 4)),
            select(c, x, 4),
        );
    }

    #[test]
    fn if_then_else() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let expr = call(CallOp::IfThenElse, vec![Expr::bool(false), x.clone(), Expr::int32(0)]);
        assert_eq!(rewrite_simplify(&analyzer, &expr), Expr::int32(0));
        let expr = call(CallOp::IfThenElse, vec![lt(x.clone(), 3), x.clone() * 2, x.clone() * 2]);
        assert_eq!(rewrite_simplify(&analyzer, &expr), x * 2);
    }
}
