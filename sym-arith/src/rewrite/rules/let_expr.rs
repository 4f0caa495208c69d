//! Simplification rules for `let` bindings.

use crate::rewrite::{step::Step, Rewriter};
use sym_ir::{Expr, ExprKind};

/// `let x = v in b = b` if `b` does not use `x`
pub fn drop_let(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let ExprKind::Let { var, body, .. } = expr.kind() else { return None };
    if body.uses_var(var) {
        return None;
    }

    rw.step(Step::DropLet);
    Some(body.clone())
}

/// `let x = 4 in x + y = 4 + y`
///
/// The value is inlined if it is a constant or a variable, or if the body uses it at most once.
pub fn inline_let(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let ExprKind::Let { var, value, body } = expr.kind() else { return None };
    let trivial = value.is_const() || value.as_var().is_some();
    if !trivial && body.count_var_uses(var) > 1 {
        return None;
    }
    let result = body.substitute_var(var, value);

    rw.step(Step::InlineLet);
    Some(result)
}

/// Applies all `let` rules.
pub fn all(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    drop_let(expr, rw)
        .or_else(|| inline_let(expr, rw))
}

#[cfg(test)]
mod tests {
    use crate::{rewrite::rewrite_simplify, Analyzer};
    use pretty_assertions::assert_eq;
    use sym_ir::{build::*, Var};
    use super::*;

    #[test]
    fn inlines() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x");
        let y = Var::int32("y").expr();
        let expr = let_in(x.clone(), 4, x.expr() + y.clone());
        assert_eq!(rewrite_simplify(&analyzer, &expr), y.clone() + 4);
        let expr = let_in(x.clone(), y.clone() * 3, y.clone());
        assert_eq!(rewrite_simplify(&analyzer, &expr), y.clone());

        let shared = let_in(x.clone(), y.clone() * 3, x.expr() * x.expr());
        assert_eq!(rewrite_simplify(&analyzer, &shared), shared);
    }
}
