//! Symbolic interval analysis.
//!
//! [`interval_set`](crate::interval_set) computes, for an expression over a set of *domain*
//! variables whose ranges are given as [`IntervalSet`]s, an interval with symbolic endpoints that
//! contains every value of the expression. Variables outside the domain are treated as fixed but
//! unknown, so sub-expressions that mention no domain variable are single points.
//!
//! For example, with `x` ranging over `[0, 10]`, the expression `x + y` ranges over
//! `[y, y + 10]`.

use crate::{analyzer::Analyzer, const_int_bound, rewrite};
use std::{collections::HashMap, fmt};
use sym_ir::{BinaryOp, DataType, Expr, ExprKind, Var};

/// A closed interval `[min, max]` with symbolic endpoints. A missing endpoint means the interval
/// is unbounded in that direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntervalSet {
    pub min_value: Option<Expr>,
    pub max_value: Option<Expr>,
}

impl IntervalSet {
    /// Creates the interval `[min, max]`.
    pub fn new(min: impl Into<Expr>, max: impl Into<Expr>) -> Self {
        Self { min_value: Some(min.into()), max_value: Some(max.into()) }
    }

    /// The interval containing only `value`.
    pub fn point(value: impl Into<Expr>) -> Self {
        let value = value.into();
        Self { min_value: Some(value.clone()), max_value: Some(value) }
    }

    /// The interval containing every value.
    pub fn everything() -> Self {
        Self { min_value: None, max_value: None }
    }

    /// If both endpoints are the same expression, returns it.
    pub fn as_point(&self) -> Option<&Expr> {
        match (&self.min_value, &self.max_value) {
            (Some(min), Some(max)) if min == max => Some(min),
            _ => None,
        }
    }

    pub fn is_single_point(&self) -> bool {
        self.as_point().is_some()
    }

    pub fn is_everything(&self) -> bool {
        self.min_value.is_none() && self.max_value.is_none()
    }

    /// The smallest interval containing both intervals.
    pub fn union(&self, other: &Self, analyzer: &Analyzer) -> Self {
        Self {
            min_value: both(&self.min_value, &other.min_value)
                .and_then(|(a, b)| make(analyzer, BinaryOp::Min, a, b)),
            max_value: both(&self.max_value, &other.max_value)
                .and_then(|(a, b)| make(analyzer, BinaryOp::Max, a, b)),
        }
    }

    /// The values contained in both intervals.
    pub fn intersect(&self, other: &Self, analyzer: &Analyzer) -> Self {
        Self {
            min_value: either(&self.min_value, &other.min_value, |a, b| make(analyzer, BinaryOp::Max, a, b)),
            max_value: either(&self.max_value, &other.max_value, |a, b| make(analyzer, BinaryOp::Min, a, b)),
        }
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.min_value {
            Some(min) => write!(f, "[{}, ", min)?,
            None => write!(f, "[-inf, ")?,
        }
        match &self.max_value {
            Some(max) => write!(f, "{}]", max),
            None => write!(f, "+inf]"),
        }
    }
}

fn both(a: &Option<Expr>, b: &Option<Expr>) -> Option<(Expr, Expr)> {
    Some((a.clone()?, b.clone()?))
}

fn either(
    a: &Option<Expr>,
    b: &Option<Expr>,
    f: impl FnOnce(Expr, Expr) -> Option<Expr>,
) -> Option<Expr> {
    match (a, b) {
        (Some(a), Some(b)) => f(a.clone(), b.clone()),
        (Some(a), None) | (None, Some(a)) => Some(a.clone()),
        (None, None) => None,
    }
}

/// Builds and simplifies `lhs op rhs`. Endpoints whose types cannot be combined give an
/// unbounded end.
fn make(analyzer: &Analyzer, op: BinaryOp, lhs: Expr, rhs: Expr) -> Option<Expr> {
    Expr::try_binary(op, lhs, rhs)
        .ok()
        .map(|expr| rewrite::rewrite_simplify(analyzer, &expr))
}

/// The sign of an expression, as far as constant bounds can prove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Positive,
    Negative,
    NonNegative,
    NonPositive,
    Unknown,
}

/// Computes the symbolic interval of an expression over the given domain.
pub(crate) fn infer(analyzer: &Analyzer, expr: &Expr, domain: &HashMap<Var, IntervalSet>) -> IntervalSet {
    Infer { analyzer, domain: domain.clone() }.infer(&analyzer.isolate_lets(expr))
}

struct Infer<'a> {
    analyzer: &'a Analyzer,

    /// The domain variables, extended with the variables bound by enclosing `let` expressions.
    domain: HashMap<Var, IntervalSet>,
}

impl Infer<'_> {
    fn infer(&mut self, expr: &Expr) -> IntervalSet {
        if let ExprKind::Broadcast { value, .. } = expr.kind() {
            return self.infer(value);
        }
        if expr.dtype().is_scalar() && !expr.any_var(|var| self.domain.contains_key(var)) {
            return IntervalSet::point(expr.clone());
        }

        match expr.kind() {
            ExprKind::Var(var) => self.domain.get(var)
                .cloned()
                .unwrap_or_else(|| IntervalSet::point(expr.clone())),
            ExprKind::Binary(op, lhs, rhs) => self.infer_binary(*op, lhs, rhs),
            ExprKind::Select(_, t, f) => {
                let (t, f) = (self.infer(t), self.infer(f));
                t.union(&f, self.analyzer)
            },
            ExprKind::Cast(value) => self.infer_cast(expr.dtype(), value),
            ExprKind::Ramp { base, stride, lanes } => {
                let Some(step) = stride.as_int() else {
                    return IntervalSet::everything();
                };
                let span = match step.checked_mul(*lanes as i64 - 1) {
                    Some(span) if stride.dtype().fits(span) => span,
                    _ => return IntervalSet::everything(),
                };
                let base = self.infer(base);
                let span = if span >= 0 {
                    IntervalSet::new(Expr::make_const(stride.dtype(), 0), Expr::make_const(stride.dtype(), span))
                } else {
                    IntervalSet::new(Expr::make_const(stride.dtype(), span), Expr::make_const(stride.dtype(), 0))
                };
                self.combine(BinaryOp::Add, &base, &span)
            },
            ExprKind::Let { var, value, body } => {
                let value = self.infer(value);
                let shadowed = self.domain.insert(var.clone(), value);
                let result = self.infer(body);
                match shadowed {
                    Some(previous) => self.domain.insert(var.clone(), previous),
                    None => self.domain.remove(var),
                };
                result
            },
            _ => IntervalSet::everything(),
        }
    }

    fn infer_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> IntervalSet {
        let a = self.infer(lhs);
        let b = self.infer(rhs);
        match op {
            BinaryOp::Add | BinaryOp::Sub => self.combine(op, &a, &b),
            BinaryOp::Mul => {
                if let Some(point) = b.as_point() {
                    self.scale(op, &a, point)
                } else if let Some(point) = a.as_point() {
                    self.scale(op, &b, point)
                } else {
                    IntervalSet::everything()
                }
            },
            BinaryOp::Div | BinaryOp::FloorDiv => match b.as_point() {
                Some(point) => self.scale(op, &a, point),
                None => IntervalSet::everything(),
            },
            BinaryOp::Mod | BinaryOp::FloorMod => match b.as_point() {
                Some(point) => self.remainder(op, &a, point),
                None => IntervalSet::everything(),
            },
            BinaryOp::Min => IntervalSet {
                min_value: both(&a.min_value, &b.min_value).and_then(|(x, y)| self.make(BinaryOp::Min, x, y)),
                max_value: either(&a.max_value, &b.max_value, |x, y| self.make(BinaryOp::Min, x, y)),
            },
            BinaryOp::Max => IntervalSet {
                min_value: either(&a.min_value, &b.min_value, |x, y| self.make(BinaryOp::Max, x, y)),
                max_value: both(&a.max_value, &b.max_value).and_then(|(x, y)| self.make(BinaryOp::Max, x, y)),
            },
            _ => IntervalSet::everything(),
        }
    }

    fn infer_cast(&mut self, dtype: DataType, value: &Expr) -> IntervalSet {
        let from = value.dtype();
        let widening = from.is_integer() && dtype.is_integer()
            && from.code == dtype.code
            && from.bits <= dtype.bits;
        if !widening {
            return IntervalSet::everything();
        }
        let element = dtype.element_of();
        let interval = self.infer(value);
        let cast = |end: Expr| Expr::new(element, ExprKind::Cast(end));
        IntervalSet {
            min_value: interval.min_value.map(cast),
            max_value: interval.max_value.map(cast),
        }
    }

    fn make(&self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Option<Expr> {
        make(self.analyzer, op, lhs, rhs)
    }

    /// The single-point interval `lhs op rhs`.
    fn make_point(&self, op: BinaryOp, lhs: Expr, rhs: Expr) -> IntervalSet {
        self.make(op, lhs, rhs).map_or_else(IntervalSet::everything, IntervalSet::point)
    }

    /// Classic interval addition and subtraction.
    fn combine(&self, op: BinaryOp, a: &IntervalSet, b: &IntervalSet) -> IntervalSet {
        let (min, max) = match op {
            BinaryOp::Add => (both(&a.min_value, &b.min_value), both(&a.max_value, &b.max_value)),
            _ => (both(&a.min_value, &b.max_value), both(&a.max_value, &b.min_value)),
        };
        IntervalSet {
            min_value: min.and_then(|(x, y)| self.make(op, x, y)),
            max_value: max.and_then(|(x, y)| self.make(op, x, y)),
        }
    }

    fn sign(&self, expr: &Expr) -> Sign {
        let bound = const_int_bound::infer(self.analyzer, expr);
        if bound.is_positive() {
            Sign::Positive
        } else if bound.is_negative() {
            Sign::Negative
        } else if bound.is_non_negative() {
            Sign::NonNegative
        } else if bound.is_non_positive() {
            Sign::NonPositive
        } else {
            Sign::Unknown
        }
    }

    /// Multiplies or divides every value of the interval by a single value.
    fn scale(&self, op: BinaryOp, a: &IntervalSet, factor: &Expr) -> IntervalSet {
        if let Some(point) = a.as_point() {
            return self.make_point(op, point.clone(), factor.clone());
        }

        let apply = |end: &Option<Expr>| end.clone().and_then(|end| self.make(op, end, factor.clone()));
        let is_div = op != BinaryOp::Mul;
        match self.sign(factor) {
            Sign::Positive => IntervalSet { min_value: apply(&a.min_value), max_value: apply(&a.max_value) },
            Sign::NonNegative if !is_div => {
                IntervalSet { min_value: apply(&a.min_value), max_value: apply(&a.max_value) }
            },
            Sign::Negative => IntervalSet { min_value: apply(&a.max_value), max_value: apply(&a.min_value) },
            Sign::NonPositive if !is_div => {
                IntervalSet { min_value: apply(&a.max_value), max_value: apply(&a.min_value) }
            },
            _ => IntervalSet::everything(),
        }
    }

    /// The remainder of every value of the interval by a single value.
    fn remainder(&self, op: BinaryOp, a: &IntervalSet, divisor: &Expr) -> IntervalSet {
        if let Some(point) = a.as_point() {
            return self.make_point(op, point.clone(), divisor.clone());
        }
        if self.sign(divisor) != Sign::Positive {
            return IntervalSet::everything();
        }

        let dividend_non_negative = a.min_value.as_ref()
            .map_or(false, |min| matches!(self.sign(min), Sign::Positive | Sign::NonNegative));
        let div_op = if op == BinaryOp::FloorMod { BinaryOp::FloorDiv } else { BinaryOp::Div };

        // the dividend stays within a single period: the remainder is monotonic
        if op == BinaryOp::FloorMod || dividend_non_negative {
            if let (Some(min), Some(max)) = (&a.min_value, &a.max_value) {
                let same_period = Expr::try_binary(div_op, max.clone(), divisor.clone())
                    .and_then(|hi| Ok((hi, Expr::try_binary(div_op, min.clone(), divisor.clone())?)))
                    .ok()
                    .and_then(|(hi, lo)| self.make(BinaryOp::Sub, hi, lo));
                if same_period.map_or(false, |diff| diff.is_int(0)) {
                    return IntervalSet {
                        min_value: self.make(op, min.clone(), divisor.clone()),
                        max_value: self.make(op, max.clone(), divisor.clone()),
                    };
                }
            }
        }

        let zero = Expr::make_const(divisor.dtype(), 0);
        let Some(top) = self.make(BinaryOp::Sub, divisor.clone(), Expr::make_const(divisor.dtype(), 1)) else {
            return IntervalSet::everything();
        };
        if op == BinaryOp::FloorMod || dividend_non_negative {
            IntervalSet::new(zero, top)
        } else {
            IntervalSet { min_value: self.make(BinaryOp::Sub, zero, top.clone()), max_value: Some(top) }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Analyzer, Binding, Range};
    use pretty_assertions::assert_eq;
    use sym_ir::build::*;
    use super::*;

    fn domain(entries: &[(&Var, IntervalSet)]) -> HashMap<Var, IntervalSet> {
        entries.iter().map(|(var, set)| ((*var).clone(), set.clone())).collect()
    }

    #[test]
    fn shifts_by_free_variable() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x");
        let y = Var::int32("y").expr();
        let dom = domain(&[(&x, IntervalSet::new(0, 10))]);
        let set = analyzer.interval_set(&(x.expr() + y.clone()), &dom);
        assert_eq!(set, IntervalSet::new(y.clone(), y + 10));
    }

    #[test]
    fn scaling_and_division() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x");
        let dom = domain(&[(&x, IntervalSet::new(2, 9))]);
        let x = x.expr();
        assert_eq!(analyzer.interval_set(&(x.clone() * 3), &dom), IntervalSet::new(6, 27));
        assert_eq!(analyzer.interval_set(&(x.clone() * -2), &dom), IntervalSet::new(-18, -4));
        assert_eq!(analyzer.interval_set(&floordiv(x.clone(), 4), &dom), IntervalSet::new(0, 2));
        assert_eq!(analyzer.interval_set(&floormod(x.clone(), 16), &dom), IntervalSet::new(2, 9));
        assert_eq!(analyzer.interval_set(&floormod(x.clone(), 4), &dom), IntervalSet::new(0, 3));
        assert_eq!(analyzer.interval_set(&truncmod(x - 5, 4), &dom), IntervalSet::new(-3, 3));
    }

    #[test]
    fn unknown_sign_is_unbounded() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x");
        let n = Var::int32("n").expr();
        let dom = domain(&[(&x, IntervalSet::new(0, 10))]);
        assert!(analyzer.interval_set(&(x.expr() * n.clone()), &dom).is_everything());
        let point = analyzer.interval_set(&(n.clone() * 2), &dom);
        assert_eq!(point.as_point(), Some(&(n * 2)));
    }

    #[test]
    fn min_max_select() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x");
        let dom = domain(&[(&x, IntervalSet::new(0, 10))]);
        let x = x.expr();
        assert_eq!(analyzer.interval_set(&min(x.clone(), 4), &dom), IntervalSet::new(0, 4));
        assert_eq!(analyzer.interval_set(&max(x.clone() - 3, 0), &dom), IntervalSet::new(0, 7));
        let chosen = select(lt(x.clone(), 5), x.clone() + 20, x);
        assert_eq!(analyzer.interval_set(&chosen, &dom), IntervalSet::new(0, 30));
    }

    #[test]
    fn ramps() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x");
        let dom = domain(&[(&x, IntervalSet::new(0, 10))]);
        assert_eq!(analyzer.interval_set(&ramp(x.expr(), 2, 4), &dom), IntervalSet::new(0, 16));
        assert_eq!(analyzer.interval_set(&ramp(x.expr(), -3, 3), &dom), IntervalSet::new(-6, 10));

        let w = Var::new("w", DataType::int64());
        let dom = domain(&[(&w, IntervalSet::new(Expr::int64(0), Expr::int64(1)))]);
        let huge = ramp(w.expr(), Expr::int64(i64::MAX / 2), 4);
        assert!(analyzer.interval_set(&huge, &dom).is_everything());
    }

    #[test]
    fn mistyped_domain_end_is_unbounded() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x");
        let y = Var::int32("y").expr();
        let n = Var::new("n", DataType::int64()).expr();
        let dom = domain(&[(&x, IntervalSet::new(0, n))]);
        let set = analyzer.interval_set(&(x.expr() + y.clone()), &dom);
        assert_eq!(set.min_value, Some(y));
        assert!(set.max_value.is_none());
    }

    #[test]
    fn set_operations() {
        let analyzer = Analyzer::new();
        let a = IntervalSet::new(0, 10);
        let b = IntervalSet::new(5, 20);
        assert_eq!(a.union(&b, &analyzer), IntervalSet::new(0, 20));
        assert_eq!(a.intersect(&b, &analyzer), IntervalSet::new(5, 10));
        let upper = IntervalSet { min_value: None, max_value: Some(Expr::int32(3)) };
        assert_eq!(a.intersect(&upper, &analyzer), IntervalSet::new(0, 3));
        assert!(a.union(&upper, &analyzer).min_value.is_none());
        assert!(IntervalSet::point(7).is_single_point());
    }

    #[test]
    fn range_bindings() {
        let mut analyzer = Analyzer::new();
        let i = Var::int32("i");
        let n = Var::shape("n", sym_ir::DataType::int32());
        analyzer.bind(&i, Binding::Range(Range::new(0, n.expr())), false).unwrap();
        let range = analyzer.store().range_of(&i).cloned();
        assert_eq!(range, Some(IntervalSet::new(0, n.expr() - 1)));
    }
}
