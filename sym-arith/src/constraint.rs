//! Constraint scopes.
//!
//! A constraint is a boolean condition that is assumed to hold while its scope is active, such as
//! the condition of an enclosing `if`. Entering a scope derives facts from the condition and
//! records them in the [`BoundsStore`](crate::BoundsStore); exiting it removes exactly those facts.
//!
//! Each conjunct of the condition (split on `&&`) is recorded as a known-true literal. Conjuncts
//! that compare an expression against a constant also bound that expression:
//!
//! ```text
//! x < 16          x in [-inf, 15]
//! 4 <= y + z      y + z in [4, inf]
//! ```
//!
//! and equalities on a remainder by a constant fix the congruence class of the dividend:
//!
//! ```text
//! floormod(i, 4) == 1      i = 1 (mod 4)
//! 3 == truncmod(j, 8)      j = 3 (mod 8)
//! ```

use crate::{
    analyzer::Analyzer,
    modular::ModularSet,
    rewrite::{self, rules::logical},
    store::Fact,
};
use std::{fmt, ops::{Deref, DerefMut}};
use sym_ir::{BinaryOp, Expr, ExprKind};

/// Identifies an active constraint scope, returned by
/// [`Analyzer::push_constraint`](crate::Analyzer::push_constraint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintToken(pub(crate) u64);

impl ConstraintToken {
    /// The numeric id of the scope.
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConstraintToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A constraint scope that is exited when dropped.
///
/// The scope borrows the analyzer mutably, and dereferences to it, so every query made through the
/// scope sees the constraint:
///
/// ```
/// use sym_arith::{Analyzer, ConstIntBound};
/// use sym_ir::{build::*, Var};
///
/// let mut analyzer = Analyzer::new();
/// let x = Var::int32("x").expr();
/// {
///     let scope = analyzer.enter_constraint(and(lt(x.clone(), 10), le(0, x.clone())));
///     assert_eq!(scope.const_int_bound(&x), ConstIntBound::new(0, 9));
/// }
/// assert!(analyzer.const_int_bound(&x).min_value() < 0);
/// ```
pub struct ConstraintScope<'a> {
    analyzer: &'a mut Analyzer,
    token: ConstraintToken,
}

impl<'a> ConstraintScope<'a> {
    pub(crate) fn new(analyzer: &'a mut Analyzer, token: ConstraintToken) -> Self {
        Self { analyzer, token }
    }

    /// The token of this scope.
    pub fn token(&self) -> ConstraintToken {
        self.token
    }
}

impl Deref for ConstraintScope<'_> {
    type Target = Analyzer;

    fn deref(&self) -> &Analyzer {
        &*self.analyzer
    }
}

impl DerefMut for ConstraintScope<'_> {
    fn deref_mut(&mut self) -> &mut Analyzer {
        &mut *self.analyzer
    }
}

impl Drop for ConstraintScope<'_> {
    fn drop(&mut self) {
        self.analyzer.exit_through(self.token);
    }
}

/// Splits a condition into its conjuncts.
fn conjuncts(cond: &Expr, out: &mut Vec<Expr>) {
    match cond.as_binary() {
        Some((BinaryOp::And, lhs, rhs)) => {
            conjuncts(lhs, out);
            conjuncts(rhs, out);
        },
        _ => out.push(cond.clone()),
    }
}

/// If the condition states the remainder of an expression by a constant, returns the expression
/// and its congruence class.
fn as_congruence(cond: &Expr) -> Option<(&Expr, ModularSet)> {
    let (BinaryOp::Eq, lhs, rhs) = cond.as_binary()? else {
        return None;
    };
    let (remainder, value) = match (lhs.as_int(), rhs.as_int()) {
        (None, Some(value)) => (lhs, value),
        (Some(value), None) => (rhs, value),
        _ => return None,
    };
    let (BinaryOp::Mod | BinaryOp::FloorMod, dividend, divisor) = remainder.as_binary()? else {
        return None;
    };
    match divisor.as_int()? {
        0 => None,
        divisor => Some((dividend, ModularSet::new(divisor, value))),
    }
}

/// Derives the facts implied by a condition.
///
/// Facts are read from both the condition as written and its rewritten form, since the rewrite
/// may turn a conjunct the extraction cannot read into one it can, or the other way around.
pub(crate) fn facts_of(analyzer: &Analyzer, cond: &Expr) -> Vec<Fact> {
    let mut literals = Vec::new();
    conjuncts(cond, &mut literals);
    conjuncts(&rewrite::rewrite_simplify(analyzer, cond), &mut literals);

    let mut seen = Vec::<Expr>::new();
    let mut facts = Vec::new();
    for literal in literals {
        if literal.as_bool() == Some(true) || seen.contains(&literal) {
            continue;
        }
        if let Some((target, bound)) = logical::as_range(&literal) {
            facts.push(Fact::Bound(target.clone(), bound));
        }
        if let Some((target, set)) = as_congruence(&literal) {
            facts.push(Fact::Modular(target.clone(), set));
        }
        if !matches!(literal.kind(), ExprKind::BoolImm(_)) {
            facts.push(Fact::Literal(literal.clone()));
        }
        seen.push(literal);
    }
    facts
}

#[cfg(test)]
mod tests {
    use crate::{error::{ConstraintOrder, NoActiveConstraint}, Analyzer, ConstIntBound, ModularSet};
    use pretty_assertions::assert_eq;
    use sym_ir::{build::*, Var};
    use super::*;

    #[test]
    fn congruences() {
        let x = Var::int32("x").expr();
        let fact = eq(3, truncmod(x.clone(), -8));
        assert_eq!(as_congruence(&fact), Some((&x, ModularSet::new(8, 3))));
        assert_eq!(as_congruence(&eq(floormod(x.clone(), 0), 1)), None);
        assert_eq!(as_congruence(&lt(floormod(x, 4), 1)), None);
    }

    #[test]
    fn facts_from_conjunctions() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        let cond = and(and(lt(x.clone(), 16), eq(floormod(y.clone(), 4), 1)), lt(x.clone(), y.clone()));
        let facts = facts_of(&analyzer, &cond);

        let bound = facts.iter().find_map(|fact| match fact {
            Fact::Bound(target, bound) if *target == x => Some(*bound),
            _ => None,
        });
        assert_eq!(bound.map(|bound| bound.max_value()), Some(15));
        assert!(facts.iter().any(|fact| matches!(fact, Fact::Modular(target, set) if *target == y && *set == ModularSet::new(4, 1))));
        assert!(facts.iter().any(|fact| matches!(fact, Fact::Literal(literal) if *literal == lt(x.clone(), y.clone()))));
    }

    #[test]
    fn scopes_restore_state() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        analyzer.const_int_bound_update(&x, ConstIntBound::new(0, 100), false).unwrap();
        let x = x.expr();
        let before = analyzer.const_int_bound(&x);

        {
            let mut outer = analyzer.enter_constraint(lt(x.clone(), 50));
            assert_eq!(outer.const_int_bound(&x), ConstIntBound::new(0, 49));
            {
                let inner = outer.enter_constraint(le(10, x.clone()));
                assert_eq!(inner.const_int_bound(&x), ConstIntBound::new(10, 49));
                assert_eq!(inner.store().depth(), 2);
            }
            assert_eq!(outer.const_int_bound(&x), ConstIntBound::new(0, 49));
        }

        assert_eq!(analyzer.const_int_bound(&x), before);
        assert_eq!(analyzer.store().depth(), 0);
        assert_eq!(analyzer.store().literals().count(), 0);
    }

    #[test]
    fn tokens_pop_in_order() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let outer = analyzer.push_constraint(lt(x.clone(), 8));
        let inner = analyzer.push_constraint(None::<Expr>);
        assert_ne!(outer, inner);

        let err = analyzer.pop_constraint(outer).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConstraintOrder>(),
            Some(&ConstraintOrder { token: outer.id(), innermost: inner.id() }),
        );
        analyzer.pop_constraint(inner).unwrap();
        analyzer.pop_constraint(outer).unwrap();

        let err = analyzer.pop_constraint(outer).unwrap_err();
        assert!(err.is::<NoActiveConstraint>());
    }

    #[test]
    fn dropped_scope_exits_forgotten_inner_scopes() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        {
            let mut scope = analyzer.enter_constraint(lt(x.clone(), 8));
            let _ = scope.push_constraint(lt(x.clone(), 4));
            assert_eq!(scope.store().depth(), 2);
        }
        assert_eq!(analyzer.store().depth(), 0);
        assert!(analyzer.const_int_bound(&x).max_value() > 8);
    }
}
