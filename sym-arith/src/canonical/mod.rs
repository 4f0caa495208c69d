//! The canonical simplifier.
//!
//! Where the [rewrite simplifier](crate::rewrite) matches local patterns, the canonical simplifier
//! flattens every integer sum into a [`SumForm`]: a map from products of atoms to coefficients, plus
//! a constant. Like terms are then combined no matter how far apart they appear in the tree, which
//! is what the pattern rules cannot do.
//!
//! ```text
//! x * 3 - 4 * x + 1  =>  {x: -1} + 1  =>  1 - x
//! ```
//!
//! Division and remainder by a constant become [`Atom::Split`]s. The multiples of the divisor are
//! peeled off a split first: always for `floordiv` / `floormod`, and for `truncdiv` / `truncmod`
//! only when both the peeled part and the rest are proven non-negative. A quotient and remainder of
//! the same dividend recombine, so `floordiv(x, 8) * 8 + floormod(x, 8)` becomes `x`.
//!
//! Comparisons are normalized to `positive terms <op> negative terms + constant`, after dividing
//! out the common factor of the coefficients.
//!
//! The rebuilt expression is finished by the rewrite simplifier.

pub mod sum;

use crate::{analyzer::Analyzer, const_int_bound, rewrite};
use sum::{Atom, SplitKind, SumForm};
use sym_ir::{eval::{floor_div, floor_mod}, BinaryOp, Expr, ExprKind};
use tracing::trace;

struct Canonicalizer<'a> {
    analyzer: &'a Analyzer,
    max_terms: usize,
}

impl Canonicalizer<'_> {
    fn canonicalize(&self, expr: &Expr) -> Expr {
        let dtype = expr.dtype();
        match expr.kind() {
            ExprKind::Binary(op, lhs, rhs)
                if op.is_comparison() && lhs.dtype().is_integer() && lhs.dtype().is_scalar() =>
            {
                self.comparison(*op, lhs, rhs)
                    .unwrap_or_else(|| expr.map_children(|child| self.canonicalize(child)))
            },
            ExprKind::Binary(op, ..)
                if dtype.is_integer()
                    && dtype.is_scalar()
                    && (matches!(op, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul) || op.is_div_mod()) =>
            {
                self.to_sum(expr)
                    .to_expr()
                    .unwrap_or_else(|| expr.map_children(|child| self.canonicalize(child)))
            },
            _ => expr.map_children(|child| self.canonicalize(child)),
        }
    }

    /// The expression as an opaque leaf, with its own children canonicalized.
    fn leaf(&self, expr: &Expr) -> SumForm {
        let inner = expr.map_children(|child| self.canonicalize(child));
        SumForm::atom(expr.dtype(), Atom::Leaf(inner))
    }

    fn to_sum(&self, expr: &Expr) -> SumForm {
        let dtype = expr.dtype();
        if !dtype.is_integer() || !dtype.is_scalar() {
            return self.leaf(expr);
        }
        let result = match expr.kind() {
            ExprKind::IntImm(value) => return SumForm::constant(dtype, *value),
            ExprKind::Binary(op, lhs, rhs) => match op {
                BinaryOp::Add => self.to_sum(lhs).add(&self.to_sum(rhs)),
                BinaryOp::Sub => self.to_sum(lhs).sub(&self.to_sum(rhs)),
                BinaryOp::Mul => self.to_sum(lhs).mul(&self.to_sum(rhs), self.max_terms),
                BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod | BinaryOp::FloorMod => {
                    let kind = match op {
                        BinaryOp::Div => SplitKind::TruncDiv,
                        BinaryOp::Mod => SplitKind::TruncMod,
                        BinaryOp::FloorDiv => SplitKind::FloorDiv,
                        _ => SplitKind::FloorMod,
                    };
                    match rhs.as_int() {
                        Some(divisor) if divisor != 0 => self.split(self.to_sum(lhs), divisor, kind),
                        _ => None,
                    }
                },
                _ => None,
            },
            _ => None,
        };
        result
            .and_then(|sum| self.recombine(sum))
            .unwrap_or_else(|| self.leaf(expr))
    }

    /// Divides a sum by a constant, peeling off the multiples of the divisor.
    fn split(&self, sum: SumForm, divisor: i64, kind: SplitKind) -> Option<SumForm> {
        let is_div = matches!(kind, SplitKind::TruncDiv | SplitKind::FloorDiv);
        let floor = matches!(kind, SplitKind::FloorDiv | SplitKind::FloorMod);

        if let Some(quotient) = sum.divide_exact(divisor) {
            return Some(if is_div { quotient } else { SumForm::constant(sum.dtype, 0) });
        }
        if let Some(value) = sum.as_const() {
            let (a, b) = (value as i128, divisor as i128);
            let folded = match kind {
                SplitKind::TruncDiv => a / b,
                SplitKind::TruncMod => a % b,
                SplitKind::FloorDiv => floor_div(a, b)?,
                SplitKind::FloorMod => floor_mod(a, b)?,
            };
            let folded = i64::try_from(folded).ok().filter(|value| sum.dtype.fits(*value))?;
            return Some(SumForm::constant(sum.dtype, folded));
        }

        let (mut multiples, mut rest) = sum.partition(divisor);
        if floor {
            let constant = rest.constant as i128;
            let peeled = floor_div(constant, divisor as i128)?;
            multiples.constant = i64::try_from(peeled * divisor as i128).ok()?;
            rest.constant = i64::try_from(floor_mod(constant, divisor as i128)?).ok()?;
        } else {
            if divisor < 0 {
                return self.split_atom(sum, divisor, kind);
            }
            if rest.constant >= 0 {
                multiples.constant = rest.constant - rest.constant % divisor;
                rest.constant %= divisor;
            }
            let non_negative = |part: &SumForm| {
                part.to_expr()
                    .map_or(false, |expr| const_int_bound::infer(self.analyzer, &expr).is_non_negative())
            };
            if !non_negative(&multiples) || !non_negative(&rest) {
                return self.split_atom(sum, divisor, kind);
            }
        }

        let remainder = if rest.as_const().is_some() {
            self.split(rest, divisor, kind)?
        } else {
            self.split_atom(rest, divisor, kind)?
        };
        if is_div {
            multiples.divide_exact(divisor)?.add(&remainder)
        } else {
            Some(remainder)
        }
    }

    fn split_atom(&self, dividend: SumForm, divisor: i64, kind: SplitKind) -> Option<SumForm> {
        let dtype = dividend.dtype;
        let dividend = dividend.to_expr()?;
        Some(SumForm::atom(dtype, Atom::Split { dividend, divisor, kind }))
    }

    /// Replaces `div(e, c) * c * k + mod(e, c) * k` with `e * k`.
    fn recombine(&self, mut sum: SumForm) -> Option<SumForm> {
        loop {
            let pair = sum.terms.iter().find_map(|(term, &coeff)| {
                let [Atom::Split { dividend, divisor, kind }] = term.as_slice() else { return None };
                let remainder = vec![Atom::Split { dividend: dividend.clone(), divisor: *divisor, kind: kind.remainder()? }];
                let k = *sum.terms.get(&remainder)?;
                (k.checked_mul(*divisor)? == coeff).then(|| (term.clone(), remainder, k, dividend.clone()))
            });
            let Some((quotient, remainder, k, dividend)) = pair else { return Some(sum) };
            sum.terms.remove(&quotient);
            sum.terms.remove(&remainder);
            sum = sum.add(&self.to_sum(&dividend).scale(k)?)?;
        }
    }

    /// Normalizes `lhs op rhs` to `positive terms op negative terms + constant`.
    fn comparison(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Option<Expr> {
        let diff = self.to_sum(lhs).sub(&self.to_sum(rhs))?;
        // `diff op 0`, with `op` one of `<`, `==`, `!=`
        let (op, mut diff) = match op {
            BinaryOp::Lt => (BinaryOp::Lt, diff),
            BinaryOp::Le => (BinaryOp::Lt, diff.add(&SumForm::constant(lhs.dtype(), -1))?),
            BinaryOp::Gt => (BinaryOp::Lt, diff.scale(-1)?),
            BinaryOp::Ge => (BinaryOp::Lt, diff.scale(-1)?.add(&SumForm::constant(lhs.dtype(), -1))?),
            BinaryOp::Eq | BinaryOp::Ne => (op, diff),
            _ => return None,
        };

        if let Some(value) = diff.as_const() {
            let result = match op {
                BinaryOp::Lt => value < 0,
                BinaryOp::Eq => value == 0,
                _ => value != 0,
            };
            return Some(Expr::bool(result));
        }

        let g = diff.content();
        if g > 1 {
            let constant = diff.constant;
            diff.constant = 0;
            diff = diff.divide_exact(g)?;
            match op {
                BinaryOp::Lt => diff.constant = i64::try_from(floor_div(constant as i128, g as i128)?).ok()?,
                _ if constant % g != 0 => return Some(Expr::bool(op == BinaryOp::Ne)),
                _ => diff.constant = constant / g,
            }
        }

        let mut positive = SumForm::constant(diff.dtype, 0);
        let mut negative = SumForm::constant(diff.dtype, diff.constant.checked_neg()?);
        for (term, coeff) in diff.terms {
            if coeff > 0 {
                positive.terms.insert(term, coeff);
            } else {
                negative.terms.insert(term, coeff.checked_neg()?);
            }
        }
        Expr::try_binary(op, positive.to_expr()?, negative.to_expr()?).ok()
    }
}

/// Runs one canonical round: flatten, rebuild, and finish with the rewrite simplifier. The result
/// is discarded if it is larger than what the rewrite simplifier alone produces.
fn round(analyzer: &Analyzer, expr: &Expr) -> Expr {
    let canonicalizer = Canonicalizer {
        analyzer,
        max_terms: analyzer.config().max_canonical_terms,
    };
    let canonical = rewrite::rewrite_simplify(analyzer, &canonicalizer.canonicalize(expr));
    let rewritten = rewrite::rewrite_simplify(analyzer, expr);
    if canonical.node_count() > rewritten.node_count() {
        rewritten
    } else {
        canonical
    }
}

/// Simplifies an expression to canonical form, running up to `steps` rounds (at least one) until
/// the expression stops changing.
pub fn canonical_simplify(analyzer: &Analyzer, expr: &Expr, steps: usize) -> Expr {
    let mut current = analyzer.isolate_lets(expr);
    for step in 0..steps.max(1) {
        let next = round(analyzer, &current);
        trace!(step, from = %current, to = %next, "canonical round");
        if next == current {
            break;
        }
        current = next;
    }
    current
}

#[cfg(test)]
mod tests {
    use crate::{testing, Analyzer, Binding, Range};
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use sym_ir::{build::*, eval, Var};
    use super::*;

    fn canonical(analyzer: &Analyzer, expr: Expr) -> Expr {
        canonical_simplify(analyzer, &expr, 2)
    }

    #[test]
    fn combines_like_terms() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        assert_eq!(canonical(&analyzer, x.clone() * 3 - Expr::int32(4) * x.clone() + 1), Expr::int32(1) - x.clone());
        assert_eq!(
            canonical(&analyzer, (x.clone() + y.clone()) * 2 - (y.clone() - x.clone())),
            x.clone() * 3 + y.clone(),
        );
        assert_eq!(canonical(&analyzer, (x.clone() + 1) * (x.clone() - 1) - x.clone() * x.clone()), Expr::int32(-1));
        assert_eq!(canonical(&analyzer, x.clone() - (y.clone() + x.clone()) * 2 + y.clone() * 2), Expr::int32(0) - x);
    }

    #[test]
    fn recombines_splits() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        let expr = floordiv(x.clone() + y.clone(), 8) * 8 + y.clone() + floormod(y.clone() + x.clone(), 8);
        assert_eq!(canonical(&analyzer, expr), x.clone() + y.clone() * 2);
        let expr = floordiv(x.clone() * 4 + 6, 2);
        assert_eq!(canonical(&analyzer, expr), x.clone() * 2 + 3);
        let expr = floormod(x.clone() * 4 + y.clone() * 8 + 3, 4);
        assert_eq!(canonical(&analyzer, expr), Expr::int32(3));
    }

    #[test]
    fn truncated_splits_need_signs() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        let y = Var::int32("y");
        let expr = truncdiv(x.expr() * 4 + y.expr(), 4) - x.expr();
        assert_eq!(canonical(&analyzer, expr.clone()), truncdiv(x.expr() * 4 + y.expr(), 4) - x.expr());

        analyzer.bind(&x, Binding::Range(Range::new(0, 16)), false).unwrap();
        analyzer.bind(&y, Binding::Range(Range::new(0, 4)), false).unwrap();
        assert_eq!(canonical(&analyzer, expr), Expr::int32(0));
    }

    #[test]
    fn comparisons() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        assert_eq!(canonical(&analyzer, lt(x.clone() * 2 + y.clone(), y.clone() + 6)), lt(x.clone(), 3));
        assert_eq!(canonical(&analyzer, eq(x.clone() * 4 + y.clone() * 2, 5)), Expr::bool(false));
        assert_eq!(canonical(&analyzer, le(x.clone() + y.clone(), y.clone() - x.clone())), lt(x, 1));
    }

    #[test]
    fn preserves_values() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut analyzer = Analyzer::new();
        let vars = testing::bound_vars(&mut analyzer, &[("x", -16, 16), ("y", 0, 32), ("z", -4, 4)]);
        let leaves = vars.iter().map(|(var, _, _)| var.expr()).collect::<Vec<_>>();
        for _ in 0..200 {
            let expr = testing::random_expr(&mut rng, &leaves, 4);
            let simplified = canonical(&analyzer, expr.clone());
            for _ in 0..8 {
                let env = testing::random_env(&mut rng, &vars);
                if let Some(expected) = eval(&expr, &env) {
                    assert_eq!(eval(&simplified, &env), Some(expected), "{} => {}", expr, simplified);
                }
            }
        }
    }
}
