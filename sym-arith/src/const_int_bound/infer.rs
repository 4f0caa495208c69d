//! Inference of constant integer bounds.
//!
//! The bound of a node is computed from the bounds of its children, then intersected with
//! anything the [`BoundsStore`](crate::store::BoundsStore) knows about the node itself. Results
//! are memoized for the duration of one query.
//!
//! Division and remainder by a divisor that may be zero never produce a bound tighter than the
//! range of the data type.

use crate::analyzer::Analyzer;
use std::collections::HashMap;
use sym_ir::{BinaryOp, CallOp, DataType, Expr, ExprKind, Var};
use super::{BoundValue, ConstIntBound};

/// Infers the constant integer bound of an expression.
pub(crate) fn infer(analyzer: &Analyzer, expr: &Expr) -> ConstIntBound {
    Infer {
        analyzer,
        memo: HashMap::new(),
        locals: HashMap::new(),
    }.infer(&analyzer.isolate_lets(expr))
}

struct Infer<'a> {
    analyzer: &'a Analyzer,
    memo: HashMap<Expr, ConstIntBound>,

    /// Bounds of variables bound by enclosing `let` expressions.
    locals: HashMap<Var, ConstIntBound>,
}

impl Infer<'_> {
    fn infer(&mut self, expr: &Expr) -> ConstIntBound {
        if let Some(bound) = self.memo.get(expr) {
            return *bound;
        }

        let bound = self.infer_node(expr);
        let bound = match self.analyzer.store().bound_of(expr) {
            Some(known) => bound.intersect(&known),
            None => bound,
        };
        self.memo.insert(expr.clone(), bound);
        bound
    }

    fn infer_node(&mut self, expr: &Expr) -> ConstIntBound {
        let dtype = expr.dtype();
        match expr.kind() {
            ExprKind::Var(var) => self.infer_var(var),
            ExprKind::IntImm(value) => ConstIntBound::point(*value),
            ExprKind::BoolImm(value) => ConstIntBound::point(*value as i64),
            ExprKind::FloatImm(value) => {
                let (lo, hi) = (value.0.floor(), value.0.ceil());
                if lo.is_finite() && hi.is_finite() {
                    ConstIntBound::from_ends(
                        BoundValue::from_i128(lo as i128),
                        BoundValue::from_i128(hi as i128),
                    )
                } else {
                    ConstIntBound::everything()
                }
            },
            ExprKind::Cast(value) => self.infer_cast(dtype, value),
            _ if dtype.is_float() => ConstIntBound::everything(),
            ExprKind::Binary(op, lhs, rhs) => self.infer_binary(dtype, *op, lhs, rhs),
            ExprKind::Not(_) => ConstIntBound::new(0, 1),
            ExprKind::Select(_, t, f) => self.infer(t).union(&self.infer(f)),
            ExprKind::Ramp { base, stride, lanes } => {
                let offsets = ConstIntBound::new(0, *lanes as i64 - 1);
                self.infer(base).add(&self.infer(stride).mul(&offsets))
            },
            ExprKind::Broadcast { value, .. } => self.infer(value),
            ExprKind::Shuffle { vectors, .. } => vectors.iter()
                .map(|vector| self.infer(vector))
                .reduce(|a, b| a.union(&b))
                .unwrap_or_else(|| ConstIntBound::for_dtype(dtype)),
            ExprKind::Let { var, value, body } => {
                let value = self.infer(value);
                let shadowed = self.locals.insert(var.clone(), value);

                // memoized results inside the body depend on the binding
                let outer = std::mem::take(&mut self.memo);
                let bound = self.infer(body);
                self.memo = outer;

                match shadowed {
                    Some(previous) => self.locals.insert(var.clone(), previous),
                    None => self.locals.remove(var),
                };
                bound
            },
            ExprKind::Call { op, args } => self.infer_call(dtype, op, args),
        }
    }

    fn infer_var(&mut self, var: &Var) -> ConstIntBound {
        if let Some(bound) = self.locals.get(var) {
            return *bound;
        }
        let range = ConstIntBound::for_dtype(var.dtype);
        if var.is_shape() {
            range.intersect(&ConstIntBound::non_negative())
        } else {
            range
        }
    }

    fn infer_cast(&mut self, dtype: DataType, value: &Expr) -> ConstIntBound {
        let operand = self.infer(value);
        if dtype.is_bool() {
            return if !operand.contains(0) {
                ConstIntBound::point(1)
            } else if operand.as_point() == Some(0) {
                ConstIntBound::point(0)
            } else {
                ConstIntBound::new(0, 1)
            };
        }
        if dtype.is_float() || operand.fits(dtype) {
            operand
        } else {
            ConstIntBound::for_dtype(dtype)
        }
    }

    fn infer_binary(&mut self, dtype: DataType, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> ConstIntBound {
        if op.is_comparison() || op.is_logical() {
            return ConstIntBound::new(0, 1);
        }

        let a = self.infer(lhs);
        let b = self.infer(rhs);
        let result = match op {
            BinaryOp::Add => Some(a.add(&b)),
            BinaryOp::Sub => Some(a.sub(&b)),
            BinaryOp::Mul => Some(a.mul(&b)),
            BinaryOp::Div => a.div(&b, false),
            BinaryOp::FloorDiv => a.div(&b, true),
            BinaryOp::Mod => a.truncmod(&b),
            BinaryOp::FloorMod => a.floormod(&b),
            BinaryOp::Min => Some(a.min(&b)),
            BinaryOp::Max => Some(a.max(&b)),
            _ => None,
        };
        result.unwrap_or_else(|| ConstIntBound::for_dtype(dtype))
    }

    fn infer_call(&mut self, dtype: DataType, op: &CallOp, args: &[Expr]) -> ConstIntBound {
        let range = ConstIntBound::for_dtype(dtype);
        match (op, args) {
            (CallOp::ShiftRight, [value, amount]) => {
                let (value, amount) = (self.infer(value), self.infer(amount));
                value.shift_right(&amount).unwrap_or(range)
            },
            (CallOp::ShiftLeft, [value, amount]) => {
                let (value, amount) = (self.infer(value), self.infer(amount));
                value.shift_left(&amount).unwrap_or(range)
            },
            (CallOp::BitwiseAnd, [lhs, rhs]) => {
                let (a, b) = (self.infer(lhs), self.infer(rhs));
                match (a.is_non_negative(), b.is_non_negative()) {
                    (true, true) => ConstIntBound::from_ends(
                        BoundValue::Finite(0),
                        a.max_bound().min(b.max_bound()),
                    ),
                    (true, false) => ConstIntBound::from_ends(BoundValue::Finite(0), a.max_bound()),
                    (false, true) => ConstIntBound::from_ends(BoundValue::Finite(0), b.max_bound()),
                    (false, false) => range,
                }
            },
            (CallOp::IfThenElse, [_, t, f]) => self.infer(t).union(&self.infer(f)),
            _ => range,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{testing, Analyzer};
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use sym_ir::{build::*, eval, Value};
    use super::*;

    #[test]
    fn product_plus_constant() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        let y = Var::int32("y");
        analyzer.const_int_bound_update(&x, ConstIntBound::new(-2, 4), false).unwrap();
        analyzer.const_int_bound_update(&y, ConstIntBound::new(4, 10), false).unwrap();
        let bound = analyzer.const_int_bound(&(x.expr() * y.expr() + 20));
        assert_eq!((bound.min_value(), bound.max_value()), (0, 60));
    }

    #[test]
    fn unbound_variables() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let n = Var::shape("n", DataType::int64()).expr();
        let w = Var::new("w", DataType::int64()).expr();
        assert_eq!(analyzer.const_int_bound(&x), ConstIntBound::new(i32::MIN as i64, i32::MAX as i64));
        assert_eq!(analyzer.const_int_bound(&n), ConstIntBound::non_negative());
        assert!(analyzer.const_int_bound(&w).is_everything());
    }

    #[test]
    fn division_by_possible_zero() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        let y = Var::int32("y");
        analyzer.const_int_bound_update(&x, ConstIntBound::new(0, 100), false).unwrap();
        analyzer.const_int_bound_update(&y, ConstIntBound::new(-1, 4), false).unwrap();
        let (x, y) = (x.expr(), y.expr());
        assert_eq!(analyzer.const_int_bound(&floordiv(x.clone(), y.clone())), ConstIntBound::for_dtype(DataType::int32()));
        assert_eq!(analyzer.const_int_bound(&floordiv(x.clone(), 8)), ConstIntBound::new(0, 12));
        assert_eq!(analyzer.const_int_bound(&floormod(x.clone() - 50, 8)), ConstIntBound::new(0, 7));
        assert_eq!(analyzer.const_int_bound(&truncmod(x - 50, 8)), ConstIntBound::new(-7, 7));
    }

    #[test]
    fn casts_respect_target_range() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        analyzer.const_int_bound_update(&x, ConstIntBound::new(-5, 5), false).unwrap();
        let widened = cast(DataType::int64(), x.expr());
        assert_eq!(analyzer.const_int_bound(&widened), ConstIntBound::new(-5, 5));
        let unsigned = cast(DataType::uint(32), x.expr());
        assert_eq!(analyzer.const_int_bound(&unsigned), ConstIntBound::new(0, u32::MAX as i64));
        let truthy = cast(DataType::bool(), x.expr() + 10);
        assert_eq!(analyzer.const_int_bound(&truthy), ConstIntBound::point(1));
    }

    #[test]
    fn vectors_and_lets() {
        let analyzer = Analyzer::new();
        let v = ramp(0, 4, 8);
        assert_eq!(analyzer.const_int_bound(&v), ConstIntBound::new(0, 28));
        let t = Var::int32("t");
        let body = let_in(t.clone(), 3, t.expr() * 2 + 1);
        assert_eq!(analyzer.const_int_bound(&body), ConstIntBound::point(7));
        let shifted = call(CallOp::ShiftRight, vec![Expr::int32(100), Expr::int32(2)]);
        assert_eq!(analyzer.const_int_bound(&shifted), ConstIntBound::point(25));
    }

    #[test]
    fn bounds_are_sound() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut analyzer = Analyzer::new();
        let vars = testing::bound_vars(&mut analyzer, &[("x", -10, 10), ("y", 0, 20), ("z", -30, -1)]);
        let exprs = vars.iter().map(|(var, ..)| var.expr()).collect::<Vec<_>>();

        for _ in 0..300 {
            let expr = testing::random_expr(&mut rng, &exprs, 4);
            let bound = analyzer.const_int_bound(&expr);
            for _ in 0..20 {
                let env = testing::random_env(&mut rng, &vars);
                if let Some(Value::Int(value)) = eval(&expr, &env) {
                    assert!(bound.contains(value), "{} = {} is outside {}", expr, value, bound);
                }
            }
        }
    }
}
