//! The [`Analyzer`], which owns the facts known about variables and answers queries with them.

use crate::{
    canonical,
    config::AnalyzerConfig,
    const_int_bound::{self, BoundValue, ConstIntBound},
    constraint::{self, ConstraintScope, ConstraintToken},
    error::{BindingConflict, BoundConflict, ConstraintOrder, NoActiveConstraint},
    interval::{self, IntervalSet},
    modular::{self, ModularSet},
    rewrite,
    store::{Binding, BoundsStore},
};
use std::collections::HashMap;
use sym_error::Error;
use sym_ir::{BinaryOp, Expr, Var};
use tracing::{debug, instrument, warn};

/// How hard [`Analyzer::can_prove`] tries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProofStrength {
    /// Simplify with the rewrite simplifier and check the constant bounds of the result.
    #[default]
    Default,

    /// Also compare the operands of comparisons over the symbolic ranges of range-bound
    /// variables. This proves facts such as `i < n` for `i` bound to `[0, n)`, where `n` has no
    /// constant bound.
    SymbolicBound,
}

/// Infers facts about symbolic integer expressions and simplifies them.
///
/// The analyzer holds a [`BoundsStore`] of everything known about variables: their bindings,
/// injected bounds, global facts, and the conditions of the enclosing constraint scopes. Every
/// query is answered under those facts.
///
/// ```
/// use sym_arith::{Analyzer, Binding, ProofStrength, Range};
/// use sym_ir::{build::*, Var};
///
/// let mut analyzer = Analyzer::new();
/// let x = Var::int32("x");
/// let y = Var::int32("y");
/// analyzer.bind(&x, Binding::Range(Range::new(0, 2)), false).unwrap();
/// analyzer.bind(&y, Binding::Range(Range::new(0, 8)), false).unwrap();
///
/// let cond = lt(x.expr() * 8 + y.expr(), 16);
/// assert!(analyzer.can_prove(&cond, ProofStrength::Default));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
    store: BoundsStore,
    next_token: u64,
}

impl Analyzer {
    /// Creates an analyzer that knows nothing, with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an analyzer that knows nothing, with the given configuration.
    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Everything the analyzer currently knows.
    pub fn store(&self) -> &BoundsStore {
        &self.store
    }

    /// The constant bound of an expression. See [`const_int_bound`](crate::const_int_bound).
    pub fn const_int_bound(&self, expr: &Expr) -> ConstIntBound {
        const_int_bound::infer(self, expr)
    }

    /// The congruence class of an expression. See [`modular_set`](crate::modular_set).
    pub fn modular_set(&self, expr: &Expr) -> ModularSet {
        modular::infer(self, expr)
    }

    /// The symbolic interval of an expression over the given domain. See
    /// [`interval_set`](crate::interval_set).
    pub fn interval_set(&self, expr: &Expr, domain: &HashMap<Var, IntervalSet>) -> IntervalSet {
        interval::infer(self, expr, domain)
    }

    /// Simplifies an expression with the rewrite rules.
    pub fn rewrite_simplify(&self, expr: &Expr) -> Expr {
        rewrite::rewrite_simplify(self, expr)
    }

    /// Simplifies an expression to canonical form.
    pub fn canonical_simplify(&self, expr: &Expr, steps: usize) -> Expr {
        canonical::canonical_simplify(self, expr, steps)
    }

    /// Simplifies an expression by alternating the rewrite and canonical simplifiers, for up to
    /// `steps` rounds, or [`AnalyzerConfig::default_simplify_steps`] if [`None`]. Stops early once
    /// a round leaves the expression unchanged.
    #[instrument(level = "debug", skip_all, fields(expr = %expr, steps = ?steps))]
    pub fn simplify(&self, expr: &Expr, steps: Option<usize>) -> Expr {
        let steps = steps.unwrap_or(self.config.default_simplify_steps).max(1);
        let mut current = expr.clone();
        for _ in 0..steps {
            let rewritten = self.rewrite_simplify(&current);
            let next = self.canonical_simplify(&rewritten, 1);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// Binds a variable to a value or a range.
    ///
    /// A variable bound to a value is substituted by the rewrite simplifier, and takes the bound
    /// and congruence class of the value. A variable bound to a range `[min, min + extent)` takes
    /// the constant bound of the range, and its symbolic range is used by
    /// [`ProofStrength::SymbolicBound`] proofs.
    ///
    /// Rebinding a variable to the binding it already has does nothing. Rebinding it to anything
    /// else is a [`BindingConflict`], unless `allow_override` is set.
    pub fn bind(&mut self, var: &Var, binding: Binding, allow_override: bool) -> Result<(), Error> {
        if let Some(existing) = self.store.bindings.get(var) {
            if *existing == binding {
                return Ok(());
            }
            if !allow_override {
                return Err(binding_conflict(var, existing, &binding));
            }
        }

        if let Binding::Range(range) = &binding {
            if range.extent.is_int(1) {
                self.bind(var, Binding::Value(range.min.clone()), allow_override)?;
                self.store.bindings.insert(var.clone(), binding);
                return Ok(());
            }
        }

        let (bound, modular, value, range) = match &binding {
            Binding::Value(value) => {
                let value = self.rewrite_simplify(value);
                let bound = self.const_int_bound(&value);
                let modular = self.modular_set(&value);
                (bound, Some(modular), Some(value), None)
            },
            Binding::Range(range) => {
                let last = Expr::try_binary(
                    BinaryOp::Sub,
                    Expr::try_binary(BinaryOp::Add, range.min.clone(), range.extent.clone())?,
                    1,
                )?;
                let last = self.rewrite_simplify(&last);
                let bound = ConstIntBound::from_ends(
                    self.const_int_bound(&range.min).min_bound(),
                    self.const_int_bound(&last).max_bound(),
                );
                let min = self.rewrite_simplify(&range.min);
                (bound, None, None, Some(IntervalSet::new(min, last)))
            },
        };

        if !allow_override && !self.store.bindings.contains_key(var) {
            if let Some(existing) = self.store.var_bounds.get(var) {
                if *existing != bound {
                    return Err(bound_conflict(var, existing, &bound));
                }
            }
        }

        debug!(%var, %binding, %bound, "bind");
        self.store.values.remove(var);
        self.store.ranges.remove(var);
        self.store.var_modular.remove(var);
        self.store.var_bounds.insert(var.clone(), bound);
        if let Some(modular) = modular {
            self.store.var_modular.insert(var.clone(), modular);
        }
        if let Some(value) = value {
            self.store.values.insert(var.clone(), value);
        }
        if let Some(range) = range {
            self.store.ranges.insert(var.clone(), range);
        }
        self.store.bindings.insert(var.clone(), binding);
        Ok(())
    }

    /// Injects a constant bound for a variable.
    ///
    /// Injecting a bound different from the one the variable already has is a [`BoundConflict`],
    /// unless `allow_override` is set.
    pub fn const_int_bound_update(
        &mut self,
        var: &Var,
        bound: ConstIntBound,
        allow_override: bool,
    ) -> Result<(), Error> {
        if let Some(existing) = self.store.var_bounds.get(var) {
            if *existing != bound && !allow_override {
                return Err(bound_conflict(var, existing, &bound));
            }
        }
        debug!(%var, %bound, "update bound");
        self.store.var_bounds.insert(var.clone(), bound);
        Ok(())
    }

    /// Records that an expression is never negative. The fact outlives every constraint scope,
    /// including the one it was recorded in.
    pub fn mark_global_non_neg_value(&mut self, expr: &Expr) {
        if expr.is_const() || !expr.dtype().is_integer() {
            return;
        }
        debug!(%expr, "mark non-negative");
        self.store.global_bounds.push((expr.clone(), ConstIntBound::non_negative()));
    }

    /// Enters a constraint scope in which the condition is assumed to hold. A [`None`] condition
    /// enters a scope that assumes nothing.
    ///
    /// The scope must be exited with [`Analyzer::pop_constraint`], in the reverse order scopes
    /// were entered. Prefer [`Analyzer::enter_constraint`], which exits on drop.
    #[must_use = "the scope must be exited with `pop_constraint`"]
    pub fn push_constraint(&mut self, cond: impl Into<Option<Expr>>) -> ConstraintToken {
        let token = ConstraintToken(self.next_token);
        self.next_token += 1;

        let facts = match cond.into() {
            Some(cond) => {
                debug!(%token, %cond, "enter constraint");
                constraint::facts_of(self, &self.isolate_lets(&cond))
            },
            None => {
                debug!(%token, "enter empty constraint");
                Vec::new()
            },
        };
        self.store.push_frame(token.0);
        for fact in facts {
            self.store.push_fact(fact);
        }
        token
    }

    /// Exits the innermost constraint scope, restoring exactly what was known before it was
    /// entered.
    ///
    /// Returns a [`ConstraintOrder`] error if the scope is not the innermost one, or a
    /// [`NoActiveConstraint`] error if no scope is active.
    pub fn pop_constraint(&mut self, token: ConstraintToken) -> Result<(), Error> {
        let Some(innermost) = self.store.innermost() else {
            return Err(Error::new(NoActiveConstraint { token: token.0 }));
        };
        if innermost.id != token.0 {
            if self.store.frames.iter().any(|frame| frame.id == token.0) {
                return Err(Error::new(ConstraintOrder { token: token.0, innermost: innermost.id }));
            }
            return Err(Error::new(NoActiveConstraint { token: token.0 }));
        }
        self.store.pop_frame();
        debug!(%token, "exit constraint");
        Ok(())
    }

    /// Enters a constraint scope that is exited when the returned guard is dropped.
    pub fn enter_constraint(&mut self, cond: impl Into<Option<Expr>>) -> ConstraintScope<'_> {
        let token = self.push_constraint(cond);
        ConstraintScope::new(self, token)
    }

    /// Exits the given scope along with any scope entered after it and never exited.
    pub(crate) fn exit_through(&mut self, token: ConstraintToken) {
        if !self.store.frames.iter().any(|frame| frame.id == token.0) {
            return;
        }
        while let Some(frame) = self.store.pop_frame() {
            if frame.id == token.0 {
                debug!(%token, "exit constraint");
                break;
            }
            warn!(token = frame.id, "constraint scope was never exited");
        }
    }

    /// Renames the variables bound by `let` expressions apart from each other and from every
    /// variable the store knows about, so that no fact about a variable applies inside a `let`
    /// that shadows it.
    pub(crate) fn isolate_lets(&self, expr: &Expr) -> Expr {
        if !expr.has_let() {
            return expr.clone();
        }
        let known = self.store.var_names();
        expr.rename_lets(|name| known.contains(name))
    }

    /// Returns true if the condition is proven to hold under everything the analyzer knows.
    ///
    /// `false` means the condition could not be proven, not that it was disproven.
    #[instrument(level = "debug", skip_all, fields(cond = %cond, strength = ?strength), ret)]
    pub fn can_prove(&self, cond: &Expr, strength: ProofStrength) -> bool {
        let simplified = self.rewrite_simplify(cond);
        if let Some(value) = simplified.as_bool() {
            return value;
        }
        if simplified.dtype().is_bool() && self.const_int_bound(&simplified).min_value() >= 1 {
            return true;
        }

        match strength {
            ProofStrength::Default => false,
            ProofStrength::SymbolicBound => {
                let canonical = self.canonical_simplify(&simplified, self.config.default_simplify_steps);
                canonical.as_bool() == Some(true) || self.prove_symbolic(&canonical)
            },
        }
    }

    /// Returns true if the two expressions are proven to be equal.
    pub fn can_prove_equal(&self, lhs: &Expr, rhs: &Expr) -> bool {
        if lhs == rhs {
            return true;
        }
        if lhs.dtype().is_integer() {
            let Ok(diff) = Expr::try_binary(BinaryOp::Sub, lhs.clone(), rhs.clone()) else {
                return false;
            };
            let diff = self.simplify(&diff, None);
            return diff.is_int(0) || self.const_int_bound(&diff).as_point() == Some(0);
        }
        Expr::try_binary(BinaryOp::Eq, lhs.clone(), rhs.clone())
            .map(|cond| self.can_prove(&cond, ProofStrength::Default))
            .unwrap_or(false)
    }

    /// Returns true if the expression is proven to be at least `value`.
    pub fn can_prove_greater_equal(&self, expr: &Expr, value: i64) -> bool {
        if !expr.dtype().is_integer() {
            return false;
        }
        if self.const_int_bound(expr).min_bound() >= BoundValue::Finite(value) {
            return true;
        }
        Expr::try_binary(BinaryOp::Ge, expr.clone(), value)
            .map(|cond| self.can_prove(&cond, ProofStrength::Default))
            .unwrap_or(false)
    }

    /// Returns true if the expression is proven to be less than `value`.
    pub fn can_prove_less(&self, expr: &Expr, value: i64) -> bool {
        if !expr.dtype().is_integer() {
            return false;
        }
        if self.const_int_bound(expr).max_bound() < BoundValue::Finite(value) {
            return true;
        }
        Expr::try_binary(BinaryOp::Lt, expr.clone(), value)
            .map(|cond| self.can_prove(&cond, ProofStrength::Default))
            .unwrap_or(false)
    }

    /// Proves a comparison by bounding the difference of its operands over the symbolic ranges of
    /// the range-bound variables.
    fn prove_symbolic(&self, cond: &Expr) -> bool {
        let Some((op, lhs, rhs)) = cond.as_binary() else {
            return false;
        };
        match op {
            BinaryOp::And => return self.prove_symbolic(lhs) && self.prove_symbolic(rhs),
            BinaryOp::Or => return self.prove_symbolic(lhs) || self.prove_symbolic(rhs),
            _ if !op.is_comparison() => return false,
            _ => {},
        }
        if !lhs.dtype().is_integer() || !lhs.dtype().is_scalar() {
            return false;
        }
        let Ok(diff) = Expr::try_binary(BinaryOp::Sub, lhs.clone(), rhs.clone()) else {
            return false;
        };

        let set = self.interval_set(&self.rewrite_simplify(&diff), &self.store.ranges);
        let upper = |check: fn(&ConstIntBound) -> bool| self.endpoint_satisfies(set.max_value.as_ref(), true, check);
        let lower = |check: fn(&ConstIntBound) -> bool| self.endpoint_satisfies(set.min_value.as_ref(), false, check);
        match op {
            BinaryOp::Lt => upper(ConstIntBound::is_negative),
            BinaryOp::Le => upper(ConstIntBound::is_non_positive),
            BinaryOp::Gt => lower(ConstIntBound::is_positive),
            BinaryOp::Ge => lower(ConstIntBound::is_non_negative),
            BinaryOp::Eq => upper(ConstIntBound::is_non_positive) && lower(ConstIntBound::is_non_negative),
            BinaryOp::Ne => upper(ConstIntBound::is_negative) || lower(ConstIntBound::is_positive),
            _ => false,
        }
    }

    /// Checks the constant bound of one end of a symbolic interval. Range-bound variables left in
    /// the end, such as `j` in the range `[0, j)` of `i`, are expanded by their own ranges.
    fn endpoint_satisfies(
        &self,
        end: Option<&Expr>,
        upper: bool,
        check: fn(&ConstIntBound) -> bool,
    ) -> bool {
        let Some(mut end) = end.cloned() else {
            return false;
        };
        let ranges = &self.store.ranges;
        for _ in 0..self.config.max_recursion_depth {
            if !end.any_var(|var| ranges.contains_key(var)) {
                break;
            }
            let set = self.interval_set(&end, ranges);
            let next = if upper { set.max_value } else { set.min_value };
            match next {
                Some(next) => end = next,
                None => return false,
            }
        }
        let end = self.canonical_simplify(&end, self.config.default_simplify_steps);
        check(&self.const_int_bound(&end))
    }
}

/// Builds the error for a rejected binding, rendered as `var = binding`.
fn binding_conflict(var: &Var, existing: &Binding, new: &Binding) -> Error {
    let name = var.to_string();
    let src = format!("{} = {}", name, new);
    let spans = vec![
        0..name.len(),
        name.len() + 1..name.len() + 2,
        name.len() + 3..src.len(),
    ];
    Error::with_source(src, spans, BindingConflict {
        var: name,
        existing: existing.to_string(),
        new: new.to_string(),
    })
}

fn bound_conflict(var: &Var, existing: &ConstIntBound, new: &ConstIntBound) -> Error {
    let name = var.to_string();
    Error::with_source(name.clone(), vec![0..name.len()], BoundConflict {
        var: name,
        existing: existing.to_string(),
        new: new.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use crate::{Binding, Range};
    use pretty_assertions::assert_eq;
    use sym_ir::{build::*, DataType};
    use super::*;

    #[test]
    fn let_shadows_known_facts() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        analyzer.const_int_bound_update(&x, ConstIntBound::new(0, 10), false).unwrap();

        let shadowed = let_in(x.clone(), 20, x.expr());
        assert_eq!(analyzer.const_int_bound(&shadowed), ConstIntBound::point(20));
        assert!(!analyzer.can_prove(&let_in(x.clone(), 20, lt(x.expr(), 11)), ProofStrength::Default));
        assert!(analyzer.can_prove(&let_in(x.clone(), 20, lt(10, x.expr())), ProofStrength::Default));

        let scope = analyzer.enter_constraint(eq(floormod(x.expr(), 4), 1));
        let shadowed = let_in(x.clone(), 6, x.expr());
        assert_eq!(scope.modular_set(&shadowed), ModularSet::constant(6));
        assert_eq!(scope.const_int_bound(&(shadowed + x.expr())), ConstIntBound::new(6, 16));
    }

    #[test]
    fn proves_bounded_comparison() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        let y = Var::int32("y");
        analyzer.bind(&y, Binding::Range(Range::new(0, 8)), false).unwrap();
        let cond = lt(x.expr() * 8 + y.expr(), 16);
        assert!(!analyzer.can_prove(&cond, ProofStrength::Default));
        assert_eq!(analyzer.rewrite_simplify(&cond), lt(x.expr(), 2));

        analyzer.bind(&x, Binding::Range(Range::new(0, 2)), false).unwrap();
        assert!(analyzer.can_prove(&cond, ProofStrength::Default));
        assert!(!analyzer.can_prove(&lt(x.expr() * 8 + y.expr(), 15), ProofStrength::Default));
    }

    #[test]
    fn rebinding() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        let y = Var::int32("y");
        analyzer.bind(&x, Binding::Range(Range::new(0, 4)), false).unwrap();
        analyzer.bind(&x, Binding::Range(Range::new(0, 4)), false).unwrap();

        let err = analyzer.bind(&x, Binding::Value(y.expr() + 1), false).unwrap_err();
        assert_eq!(
            err.downcast_ref::<BindingConflict>(),
            Some(&BindingConflict {
                var: "x".to_string(),
                existing: "range(0, 4)".to_string(),
                new: "y + 1".to_string(),
            }),
        );
        assert_eq!(err.src, "x = y + 1");
        assert_eq!(err.spans, vec![0..1, 2..3, 4..9]);
        assert_eq!(analyzer.const_int_bound(&x.expr()), ConstIntBound::new(0, 3));

        analyzer.bind(&x, Binding::Value(y.expr() + 1), true).unwrap();
        assert_eq!(analyzer.rewrite_simplify(&(x.expr() - y.expr())), Expr::int32(1));
        assert!(analyzer.store().range_of(&x).is_none());
    }

    #[test]
    fn bound_updates() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        analyzer.const_int_bound_update(&x, ConstIntBound::new(0, 10), false).unwrap();
        analyzer.const_int_bound_update(&x, ConstIntBound::new(0, 10), false).unwrap();
        let err = analyzer.const_int_bound_update(&x, ConstIntBound::new(0, 5), false).unwrap_err();
        assert!(err.is::<BoundConflict>());
        assert!(analyzer.bind(&x, Binding::Range(Range::new(0, 4)), false).is_err());

        analyzer.const_int_bound_update(&x, ConstIntBound::new(0, 5), true).unwrap();
        assert_eq!(analyzer.const_int_bound(&x.expr()), ConstIntBound::new(0, 5));
    }

    #[test]
    fn unit_ranges_bind_values() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        let n = Var::int32("n");
        analyzer.bind(&x, Binding::Range(Range::new(n.expr(), 1)), false).unwrap();
        assert_eq!(analyzer.rewrite_simplify(&(x.expr() - n.expr())), Expr::int32(0));
        assert!(analyzer.bind(&x, Binding::Range(Range::new(n.expr(), 1)), false).is_ok());
    }

    #[test]
    fn global_facts_outlive_scopes() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        {
            let mut scope = analyzer.enter_constraint(lt(x.clone(), 4));
            scope.mark_global_non_neg_value(&(x.clone() - y.clone()));
        }
        assert!(analyzer.can_prove_greater_equal(&(x.clone() - y.clone()), 0));
        assert!(!analyzer.can_prove_less(&x, 4));
    }

    #[test]
    fn literal_constraints() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        let cond = lt(x.clone(), y.clone());
        assert!(!analyzer.can_prove(&cond, ProofStrength::Default));
        {
            let scope = analyzer.enter_constraint(cond.clone());
            assert!(scope.can_prove(&cond, ProofStrength::Default));
            assert_eq!(scope.rewrite_simplify(&le(y.clone(), x.clone())), Expr::bool(false));
        }
        assert!(!analyzer.can_prove(&cond, ProofStrength::Default));
    }

    #[test]
    fn symbolic_bounds() {
        let mut analyzer = Analyzer::new();
        let n = Var::shape("n", DataType::int32());
        let i = Var::int32("i");
        let j = Var::int32("j");
        analyzer.bind(&i, Binding::Range(Range::new(0, n.expr())), false).unwrap();
        analyzer.bind(&j, Binding::Range(Range::new(0, i.expr())), false).unwrap();

        let cond = lt(i.expr(), n.expr());
        assert!(!analyzer.can_prove(&cond, ProofStrength::Default));
        assert!(analyzer.can_prove(&cond, ProofStrength::SymbolicBound));
        assert!(analyzer.can_prove(&le(i.expr() + 1, n.expr()), ProofStrength::SymbolicBound));
        assert!(analyzer.can_prove(&lt(j.expr(), n.expr()), ProofStrength::SymbolicBound));
        assert!(!analyzer.can_prove(&lt(i.expr() + 1, n.expr()), ProofStrength::SymbolicBound));
    }

    #[test]
    fn equality() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        let y = Var::int32("y").expr();
        assert!(analyzer.can_prove_equal(&(x.expr() * 3 - x.expr() * 4 + 1), &(Expr::int32(1) - x.expr())));
        assert!(analyzer.can_prove_equal(&(floordiv(x.expr(), 4) * 4 + floormod(x.expr(), 4)), &x.expr()));
        assert!(!analyzer.can_prove_equal(&x.expr(), &y));

        analyzer.bind(&x, Binding::Range(Range::new(0, 16)), false).unwrap();
        assert!(analyzer.can_prove_equal(&floordiv(x.expr(), 16), &Expr::int32(0)));
        assert!(analyzer.can_prove_less(&x.expr(), 16));
        assert!(!analyzer.can_prove_less(&x.expr(), 15));
        assert!(analyzer.can_prove_greater_equal(&x.expr(), 0));
        assert!(!analyzer.can_prove_greater_equal(&(x.expr() - 1), 0));
    }

    #[test]
    fn simplify_combines_simplifiers() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        let y = Var::int32("y").expr();
        analyzer.bind(&x, Binding::Range(Range::new(0, 8)), false).unwrap();
        let x = x.expr();

        let expr = floormod(x.clone(), 8) + y.clone() * 2 - (y.clone() + x.clone());
        assert_eq!(analyzer.simplify(&expr, None), y.clone());
        let expr = x.clone() * 3 - Expr::int32(4) * x.clone() + 1;
        assert_eq!(analyzer.simplify(&expr, Some(1)), Expr::int32(1) - x.clone());
        assert_eq!(analyzer.simplify(&y, Some(0)), y);
    }
}
