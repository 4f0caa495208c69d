//! Simplification rules for casts.

use crate::rewrite::{step::Step, Rewriter};
use sym_ir::{Expr, ExprKind};

/// `int64(3) = 3`
/// `float32(3) = 3.0`
/// `int32(2.7) = 2`
/// `bool(2) = true`
///
/// Integer targets must represent the value exactly.
pub fn fold_cast(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let ExprKind::Cast(value) = expr.kind() else { return None };
    let dtype = expr.dtype();
    if !dtype.is_scalar() {
        return None;
    }
    let result = match value.kind() {
        ExprKind::IntImm(v) if dtype.is_bool() => Expr::bool(*v != 0),
        ExprKind::IntImm(v) if dtype.is_float() => Expr::make_float(dtype, *v as f64),
        ExprKind::IntImm(v) if dtype.fits(*v) => Expr::make_const(dtype, *v),
        ExprKind::FloatImm(v) if dtype.is_float() => Expr::make_float(dtype, v.0),
        ExprKind::FloatImm(v) if dtype.is_integer() => {
            let truncated = v.0.trunc();
            // the range check also rejects NaN
            if !(truncated >= i64::MIN as f64 && truncated < i64::MAX as f64) || !dtype.fits(truncated as i64) {
                return None;
            }
            Expr::make_const(dtype, truncated as i64)
        },
        ExprKind::BoolImm(v) if !dtype.is_bool() => Expr::make_const(dtype, *v as i64),
        _ => return None,
    };

    rw.step(Step::FoldCast);
    Some(result)
}

/// `int32(x) = x` if `x` is already an `int32`
pub fn remove_cast(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let ExprKind::Cast(value) = expr.kind() else { return None };
    if value.dtype() != expr.dtype() {
        return None;
    }

    rw.step(Step::RemoveCast);
    Some(value.clone())
}

/// `int32(int64(x)) = x` if `x` is an `int32`
/// `int64(int16(x)) = int64(x)` if the value of `x` fits in an `int16`
///
/// Only applies to integer types.
pub fn collapse_cast(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let ExprKind::Cast(inner) = expr.kind() else { return None };
    let ExprKind::Cast(x) = inner.kind() else { return None };
    let (outer, middle) = (expr.dtype(), inner.dtype());
    if !(outer.is_integer() && middle.is_integer() && x.dtype().is_integer()) {
        return None;
    }
    if !rw.bound(x).fits(middle) {
        return None;
    }
    let result = if x.dtype() == outer {
        x.clone()
    } else {
        Expr::new(outer, ExprKind::Cast(x.clone()))
    };

    rw.step(Step::CollapseCast);
    Some(result)
}

/// Applies all cast rules.
pub fn all(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    fold_cast(expr, rw)
        .or_else(|| remove_cast(expr, rw))
        .or_else(|| collapse_cast(expr, rw))
}

#[cfg(test)]
mod tests {
    use crate::{rewrite::rewrite_simplify, Analyzer, ConstIntBound};
    use pretty_assertions::assert_eq;
    use sym_ir::{build::*, DataType, Var};
    use super::*;

    #[test]
    fn folds_constants() {
        let analyzer = Analyzer::new();
        let simplify = |expr: Expr| rewrite_simplify(&analyzer, &expr);
        assert_eq!(simplify(cast(DataType::int64(), 3)), Expr::int64(3));
        assert_eq!(simplify(cast(DataType::int(8), 300)), cast(DataType::int(8), 300));
        assert_eq!(simplify(cast(DataType::int32(), Expr::make_float(DataType::float(32), -2.7))), Expr::int32(-2));
        assert_eq!(simplify(cast(DataType::bool(), 2)), Expr::bool(true));
        assert_eq!(simplify(cast(DataType::int32(), true)), Expr::int32(1));
    }

    #[test]
    fn collapses_widening() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        let expr = cast(DataType::int32(), cast(DataType::int(16), x.expr()));
        assert_eq!(rewrite_simplify(&analyzer, &expr), expr);

        analyzer.const_int_bound_update(&x, ConstIntBound::new(0, 1000), false).unwrap();
        assert_eq!(rewrite_simplify(&analyzer, &expr), x.expr());
        let expr = cast(DataType::int32(), cast(DataType::int64(), x.expr()));
        assert_eq!(rewrite_simplify(&analyzer, &expr), x.expr());
    }
}
