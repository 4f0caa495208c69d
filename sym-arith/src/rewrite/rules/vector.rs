//! Simplification rules that push arithmetic through ramps and broadcasts, so that vector
//! expressions reduce to the same scalar rules.

use crate::rewrite::{step::Step, Rewriter};
use sym_ir::{BinaryOp, Expr, ExprKind};
use super::make;

fn as_broadcast(expr: &Expr) -> Option<(&Expr, u16)> {
    match expr.kind() {
        ExprKind::Broadcast { value, lanes } => Some((value, *lanes)),
        _ => None,
    }
}

fn as_ramp(expr: &Expr) -> Option<(&Expr, &Expr, u16)> {
    match expr.kind() {
        ExprKind::Ramp { base, stride, lanes } => Some((base, stride, *lanes)),
        _ => None,
    }
}

fn ramp(base: Expr, stride: Expr, lanes: u16) -> Option<Expr> {
    Expr::try_ramp(base, stride, lanes).ok()
}

fn broadcast(value: Expr, lanes: u16) -> Expr {
    let dtype = value.dtype().with_lanes(lanes);
    Expr::new(dtype, ExprKind::Broadcast { value, lanes })
}

/// `broadcast(a, n) + broadcast(b, n) = broadcast(a + b, n)`
///
/// Applies to every binary operation.
pub fn broadcast_op(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    let (a, lanes) = as_broadcast(lhs)?;
    let (b, _) = as_broadcast(rhs)?;
    let scalar = make(op, a.clone(), b.clone())?;

    rw.step(Step::BroadcastOp);
    Some(broadcast(scalar, lanes))
}

/// `ramp(a, s, n) + ramp(b, t, n) = ramp(a + b, s + t, n)`
/// `ramp(a, s, n) - ramp(b, t, n) = ramp(a - b, s - t, n)`
pub fn ramp_add_ramp(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    if !matches!(op, BinaryOp::Add | BinaryOp::Sub) {
        return None;
    }
    let (a, s, lanes) = as_ramp(lhs)?;
    let (b, t, _) = as_ramp(rhs)?;
    let result = ramp(make(op, a.clone(), b.clone())?, make(op, s.clone(), t.clone())?, lanes)?;

    rw.step(Step::RampAddRamp);
    Some(result)
}

/// `ramp(a, s, n) + broadcast(b, n) = ramp(a + b, s, n)`
/// `broadcast(b, n) + ramp(a, s, n) = ramp(b + a, s, n)`
/// `ramp(a, s, n) - broadcast(b, n) = ramp(a - b, s, n)`
/// `broadcast(b, n) - ramp(a, s, n) = ramp(b - a, 0 - s, n)`
pub fn ramp_add_broadcast(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (op, lhs, rhs) = expr.as_binary()?;
    if !matches!(op, BinaryOp::Add | BinaryOp::Sub) {
        return None;
    }
    let result = if let (Some((a, s, lanes)), Some((b, _))) = (as_ramp(lhs), as_broadcast(rhs)) {
        ramp(make(op, a.clone(), b.clone())?, s.clone(), lanes)?
    } else if let (Some((b, _)), Some((a, s, lanes))) = (as_broadcast(lhs), as_ramp(rhs)) {
        let stride = match op {
            BinaryOp::Add => s.clone(),
            _ => make(BinaryOp::Sub, Expr::make_const(s.dtype(), 0), s.clone())?,
        };
        ramp(make(op, b.clone(), a.clone())?, stride, lanes)?
    } else {
        return None;
    };

    rw.step(Step::RampAddBroadcast);
    Some(result)
}

/// `ramp(a, s, n) * broadcast(b, n) = ramp(a * b, s * b, n)`
/// `broadcast(b, n) * ramp(a, s, n) = ramp(a * b, s * b, n)`
pub fn ramp_mul_broadcast(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (lhs, rhs) = expr.as_op(BinaryOp::Mul)?;
    let ((a, s, lanes), (b, _)) = match (as_ramp(lhs), as_broadcast(rhs)) {
        (Some(ramp), Some(broadcast)) => (ramp, broadcast),
        _ => (as_ramp(rhs)?, as_broadcast(lhs)?),
    };
    let result = ramp(make(BinaryOp::Mul, a.clone(), b.clone())?, make(BinaryOp::Mul, s.clone(), b.clone())?, lanes)?;

    rw.step(Step::RampMulBroadcast);
    Some(result)
}

/// `ramp(a, 0, n) = broadcast(a, n)`
pub fn ramp_zero_stride(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let (base, stride, lanes) = as_ramp(expr)?;
    if !stride.is_int(0) {
        return None;
    }

    rw.step(Step::RampZeroStride);
    Some(broadcast(base.clone(), lanes))
}

/// `!broadcast(a, n) = broadcast(!a, n)`
/// `int64(broadcast(a, n)) = broadcast(int64(a), n)`
pub fn broadcast_unary(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    let scalar = match expr.kind() {
        ExprKind::Not(value) => {
            let (a, _) = as_broadcast(value)?;
            Expr::try_not(a.clone()).ok()?
        },
        ExprKind::Cast(value) => {
            let (a, _) = as_broadcast(value)?;
            Expr::new(expr.dtype().element_of(), ExprKind::Cast(a.clone()))
        },
        _ => return None,
    };

    rw.step(Step::BroadcastUnary);
    Some(broadcast(scalar, expr.lanes()))
}

/// Applies all vector rules.
pub fn all(expr: &Expr, rw: &mut Rewriter) -> Option<Expr> {
    if !expr.dtype().is_vector() {
        return None;
    }
    broadcast_op(expr, rw)
        .or_else(|| ramp_add_ramp(expr, rw))
        .or_else(|| ramp_add_broadcast(expr, rw))
        .or_else(|| ramp_mul_broadcast(expr, rw))
        .or_else(|| ramp_zero_stride(expr, rw))
        .or_else(|| broadcast_unary(expr, rw))
}

#[cfg(test)]
mod tests {
    use crate::{rewrite::rewrite_simplify, Analyzer};
    use pretty_assertions::assert_eq;
    use sym_ir::{build::*, Var};

    #[test]
    fn ramps_absorb_broadcasts() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let v = ramp(x.clone(), 1, 4) + broadcast(2, 4);
        assert_eq!(rewrite_simplify(&analyzer, &v), ramp(x.clone() + 2, 1, 4));
        let v = ramp(x.clone(), 1, 4) * broadcast(3, 4);
        assert_eq!(rewrite_simplify(&analyzer, &v), ramp(x.clone() * 3, 3, 4));
        let v = ramp(x.clone(), 2, 4) - ramp(x.clone(), 2, 4);
        assert_eq!(rewrite_simplify(&analyzer, &v), broadcast(0, 4));
    }

    #[test]
    fn broadcasts_fold() {
        let analyzer = Analyzer::new();
        let v = broadcast(3, 8) * broadcast(4, 8);
        assert_eq!(rewrite_simplify(&analyzer, &v), broadcast(12, 8));
        let cmp = lt(broadcast(1, 4), broadcast(2, 4));
        assert_eq!(rewrite_simplify(&analyzer, &cmp), broadcast(true, 4));
    }
}
