//! Proofs about the relation of two expressions.
//!
//! [`try_compare`] simplifies the difference `a - b` and inspects its constant bound and
//! congruence class. It is how rules such as `min(x, y) = x` discharge their side conditions.

use sym_ir::{BinaryOp, Expr};
use super::Rewriter;

/// The proven relation of `a` to `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareResult {
    /// `a < b`
    Lt,

    /// `a <= b`
    Le,

    /// `a == b`
    Eq,

    /// `a >= b`
    Ge,

    /// `a > b`
    Gt,

    /// `a != b`
    Ne,

    /// Nothing could be proven.
    Unknown,
}

impl CompareResult {
    /// Returns the truth value of `a op b` implied by this relation, or [`None`] if it is not
    /// implied either way.
    pub fn decides(self, op: BinaryOp) -> Option<bool> {
        use CompareResult::*;
        match (op, self) {
            (BinaryOp::Eq, Eq) => Some(true),
            (BinaryOp::Eq, Lt | Gt | Ne) => Some(false),
            (BinaryOp::Ne, Eq) => Some(false),
            (BinaryOp::Ne, Lt | Gt | Ne) => Some(true),
            (BinaryOp::Lt, Lt) => Some(true),
            (BinaryOp::Lt, Eq | Ge | Gt) => Some(false),
            (BinaryOp::Le, Lt | Le | Eq) => Some(true),
            (BinaryOp::Le, Gt) => Some(false),
            (BinaryOp::Gt, Gt) => Some(true),
            (BinaryOp::Gt, Eq | Le | Lt) => Some(false),
            (BinaryOp::Ge, Gt | Ge | Eq) => Some(true),
            (BinaryOp::Ge, Lt) => Some(false),
            _ => None,
        }
    }

    /// Returns true if `a <= b` is proven.
    pub fn is_le(self) -> bool {
        matches!(self, CompareResult::Lt | CompareResult::Le | CompareResult::Eq)
    }

    /// Returns true if `a >= b` is proven.
    pub fn is_ge(self) -> bool {
        matches!(self, CompareResult::Gt | CompareResult::Ge | CompareResult::Eq)
    }
}

/// Tries to prove how `lhs` relates to `rhs`. Only integer operands are compared.
pub fn try_compare(rw: &mut Rewriter, lhs: &Expr, rhs: &Expr) -> CompareResult {
    if !lhs.dtype().is_integer() || lhs.dtype() != rhs.dtype() {
        return CompareResult::Unknown;
    }
    if lhs == rhs {
        return CompareResult::Eq;
    }
    if let (Some(a), Some(b)) = (lhs.as_int(), rhs.as_int()) {
        return from_ordering(a.cmp(&b));
    }

    let Ok(diff) = Expr::try_binary(BinaryOp::Sub, lhs.clone(), rhs.clone()) else {
        return CompareResult::Unknown;
    };
    let diff = rw.nested(diff);
    if let Some(value) = diff.as_int() {
        return from_ordering(value.cmp(&0));
    }

    let bound = rw.bound(&diff);
    if bound.as_point() == Some(0) {
        return CompareResult::Eq;
    }
    if bound.is_negative() {
        return CompareResult::Lt;
    }
    if bound.is_positive() {
        return CompareResult::Gt;
    }

    let modular = rw.modular(&diff);
    let never_zero = !modular.contains(0) || !bound.contains(0);
    match (bound.is_non_positive(), bound.is_non_negative(), never_zero) {
        (true, _, true) => CompareResult::Lt,
        (_, true, true) => CompareResult::Gt,
        (true, _, false) => CompareResult::Le,
        (_, true, false) => CompareResult::Ge,
        (false, false, true) => CompareResult::Ne,
        _ => CompareResult::Unknown,
    }
}

fn from_ordering(ordering: std::cmp::Ordering) -> CompareResult {
    match ordering {
        std::cmp::Ordering::Less => CompareResult::Lt,
        std::cmp::Ordering::Equal => CompareResult::Eq,
        std::cmp::Ordering::Greater => CompareResult::Gt,
    }
}

#[cfg(test)]
mod tests {
    use crate::{Analyzer, ConstIntBound};
    use pretty_assertions::assert_eq;
    use sym_ir::{build::*, Var};
    use super::*;

    fn compare(analyzer: &Analyzer, a: &Expr, b: &Expr) -> CompareResult {
        let mut steps = Vec::new();
        let mut rw = Rewriter::new(analyzer, &mut steps);
        rw.compare(a, b)
    }

    #[test]
    fn relations() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        let y = Var::int32("y");
        analyzer.const_int_bound_update(&x, ConstIntBound::new(0, 10), false).unwrap();
        let (x, y) = (x.expr(), y.expr());
        assert_eq!(compare(&analyzer, &x, &(x.clone() + 1)), CompareResult::Lt);
        assert_eq!(compare(&analyzer, &x, &Expr::int32(10)), CompareResult::Le);
        assert_eq!(compare(&analyzer, &x, &Expr::int32(-1)), CompareResult::Gt);
        assert_eq!(compare(&analyzer, &(y.clone() + x.clone()), &(x.clone() + y.clone())), CompareResult::Eq);
        assert_eq!(compare(&analyzer, &(y.clone() * 2), &(y.clone() * 2 + 1)), CompareResult::Lt);
        assert_eq!(compare(&analyzer, &(y.clone() * 4), &(x.clone() * 4 + 2)), CompareResult::Ne);
        assert_eq!(compare(&analyzer, &x, &y), CompareResult::Unknown);
    }

    #[test]
    fn decisions() {
        assert_eq!(CompareResult::Lt.decides(BinaryOp::Le), Some(true));
        assert_eq!(CompareResult::Le.decides(BinaryOp::Lt), None);
        assert_eq!(CompareResult::Ne.decides(BinaryOp::Eq), Some(false));
        assert_eq!(CompareResult::Ge.decides(BinaryOp::Lt), Some(false));
        assert!(CompareResult::Eq.is_le() && CompareResult::Eq.is_ge());
    }
}
