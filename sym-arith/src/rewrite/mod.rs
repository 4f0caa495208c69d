//! The rewrite simplifier.
//!
//! [`rewrite_simplify`] simplifies an expression bottom-up: the children of a node are simplified
//! first, then the rules in [`rules`] are applied to the node until none of them applies. After
//! each successful rule, the children of the result are simplified again, since the rule may
//! have built new sub-expressions.
//!
//! Rules may consult the [`Analyzer`] that owns the simplifier: constant bounds, congruences, the
//! conditions of enclosing constraints, and proofs about the relation of two operands (see
//! [`compare`]). A rule whose side condition cannot be proven does not fire, so the result is
//! always equal to the input for every assignment of its variables.
//!
//! # Termination
//!
//! The rules do not share a decreasing measure: some of them grow the expression they rewrite, and
//! two rules may undo each other. Termination rests on two checks made at every node.
//!
//! Every form a node takes is recorded. A rewrite whose result, after its children are simplified
//! again, equals a form the node already had is rejected: the loop stops at the form before it and
//! a warning is logged. The number of rules applied to one node is also capped by
//! [`AnalyzerConfig::max_rewrite_steps`]; reaching the cap keeps the latest form and logs a
//! warning. Either way the result is equal to the input, only possibly not fully simplified.
//!
//! [`AnalyzerConfig::max_rewrite_steps`]: crate::AnalyzerConfig::max_rewrite_steps

pub mod compare;
pub mod rules;
pub mod step;

use crate::{
    analyzer::Analyzer,
    const_int_bound::{self, ConstIntBound},
    modular::{self, ModularSet},
    step_collector::StepCollector,
};
use compare::CompareResult;
use std::collections::HashMap;
use step::Step;
use sym_ir::Expr;
use tracing::{trace, warn};

/// The state of one rewrite.
pub struct Rewriter<'a> {
    analyzer: &'a Analyzer,

    /// The nesting of proofs started from inside rules. Steps are only collected at depth zero.
    depth: usize,

    memo: HashMap<Expr, Expr>,
    step_collector: &'a mut dyn StepCollector<Step>,
}

impl<'a> Rewriter<'a> {
    pub(crate) fn new(analyzer: &'a Analyzer, step_collector: &'a mut dyn StepCollector<Step>) -> Self {
        Self { analyzer, depth: 0, memo: HashMap::new(), step_collector }
    }

    /// The analyzer that owns this rewrite.
    pub fn analyzer(&self) -> &'a Analyzer {
        self.analyzer
    }

    /// The constant bound of an expression.
    pub fn bound(&self, expr: &Expr) -> ConstIntBound {
        const_int_bound::infer(self.analyzer, expr)
    }

    /// The congruence class of an expression.
    pub fn modular(&self, expr: &Expr) -> ModularSet {
        modular::infer(self.analyzer, expr)
    }

    /// Records that a rule was applied.
    pub fn step(&mut self, step: Step) {
        if self.depth == 0 {
            self.step_collector.push(step);
        }
    }

    /// Simplifies an expression built by a rule, such as the difference of two operands. Returns
    /// the expression unchanged once proofs are nested too deeply.
    pub fn nested(&mut self, expr: Expr) -> Expr {
        if self.depth + 1 >= self.analyzer.config().max_recursion_depth {
            return expr;
        }
        self.depth += 1;
        let result = self.visit(&expr);
        self.depth -= 1;
        result
    }

    /// Tries to prove how `lhs` relates to `rhs`.
    pub fn compare(&mut self, lhs: &Expr, rhs: &Expr) -> CompareResult {
        compare::try_compare(self, lhs, rhs)
    }

    /// Simplifies a whole expression, substituting the variables bound to values first.
    pub(crate) fn run(&mut self, expr: &Expr) -> Expr {
        let store = self.analyzer.store();
        let expr = self.analyzer.isolate_lets(expr);
        let expr = if store.values.is_empty() {
            expr
        } else {
            expr.substitute(&|var| store.value_of(var).cloned())
        };
        self.visit(&expr)
    }

    fn visit(&mut self, expr: &Expr) -> Expr {
        if let Some(done) = self.memo.get(expr) {
            return done.clone();
        }

        let mut current = expr.map_children(|child| self.visit(child));
        let mut history = vec![current.clone()];
        let max_steps = self.analyzer.config().max_rewrite_steps;

        while let Some(next) = rules::all(&current, self) {
            trace!(from = %current, to = %next, "rewrite");
            let next = next.map_children(|child| self.visit(child));
            if history.contains(&next) {
                warn!(expr = %next, "rewrite cycle detected");
                break;
            }
            current = next;
            if history.len() > max_steps {
                warn!(expr = %current, steps = max_steps, "rewrite step limit reached");
                break;
            }
            history.push(current.clone());
        }

        if self.depth == 0 {
            self.memo.insert(expr.clone(), current.clone());
            self.memo.entry(current.clone()).or_insert_with(|| current.clone());
        }
        current
    }
}

/// Simplifies an expression with the rewrite rules.
pub fn rewrite_simplify(analyzer: &Analyzer, expr: &Expr) -> Expr {
    Rewriter::new(analyzer, &mut ()).run(expr)
}

/// Simplifies an expression with the rewrite rules. The steps taken by the simplifier are also
/// collected and returned.
pub fn rewrite_simplify_with_steps(analyzer: &Analyzer, expr: &Expr) -> (Expr, Vec<Step>) {
    let mut steps = Vec::new();
    let expr = Rewriter::new(analyzer, &mut steps).run(expr);
    (expr, steps)
}

#[cfg(test)]
mod tests {
    use crate::{testing, Analyzer, Binding, ConstIntBound, ProofStrength, Range};
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashMap;
    use sym_ir::{build::*, eval, DataType, Value, Var};
    use super::*;

    #[test]
    fn reassembles_division() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let expr = truncdiv(x.clone(), 8) * 8 + truncmod(x.clone(), 8);
        assert_eq!(rewrite_simplify(&analyzer, &expr), x.clone());
        let expr = floormod(x.clone(), 4) + floordiv(x.clone(), 4) * 4;
        assert_eq!(rewrite_simplify(&analyzer, &expr), x);
    }

    #[test]
    fn collects_steps() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let (result, steps) = rewrite_simplify_with_steps(&analyzer, &((x.clone() + 0) * 1));
        assert_eq!(result, x);
        assert_eq!(steps, vec![Step::AddZero, Step::MultiplyOne]);
    }

    #[test]
    fn constants_move_right() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        let expr = Expr::int32(10) + y.clone();
        assert_eq!(rewrite_simplify(&analyzer, &expr), y.clone() + 10);
        let expr = (x.clone() + 1) + (y.clone() + 2);
        assert_eq!(rewrite_simplify(&analyzer, &expr), (x.clone() + y.clone()) + 3);
        let expr = (x.clone() - 3) + 5;
        assert_eq!(rewrite_simplify(&analyzer, &expr), x + 2);
        assert_eq!(rewrite_simplify(&analyzer, &(y.clone() + -4)), y - 4);
    }

    #[test]
    fn cancels_terms() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        assert_eq!(rewrite_simplify(&analyzer, &((x.clone() + y.clone()) - x.clone())), y.clone());
        assert_eq!(rewrite_simplify(&analyzer, &((x.clone() - y.clone()) + y.clone())), x.clone());
        assert_eq!(rewrite_simplify(&analyzer, &(x.clone() * 2 + x.clone() * 3)), x.clone() * 5);
        assert_eq!(rewrite_simplify(&analyzer, &(x.clone() + x.clone())), x.clone() * 2);
        assert_eq!(
            rewrite_simplify(&analyzer, &(min(x.clone(), y.clone()) + max(x.clone(), y.clone()))),
            x + y,
        );
    }

    #[test]
    fn substitutes_values() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        let y = Var::int32("y");
        analyzer.bind(&x, Binding::Value(y.expr() + 1), false).unwrap();
        let expr = x.expr() - y.expr();
        assert_eq!(rewrite_simplify(&analyzer, &expr), Expr::int32(1));
    }

    #[test]
    fn inlining_never_captures() {
        let analyzer = Analyzer::new();
        let (x, y, z) = (Var::int32("x"), Var::int32("y"), Var::int32("z"));
        let inner = let_in(x.clone(), z.expr() * 3, x.expr() * x.expr() + y.expr());
        let expr = let_in(y.clone(), x.expr(), inner);
        let simplified = rewrite_simplify(&analyzer, &expr);

        let env = HashMap::from([(x, Value::Int(1)), (z, Value::Int(1))]);
        assert_eq!(eval(&expr, &env), Some(Value::Int(10)));
        assert_eq!(eval(&simplified, &env), Some(Value::Int(10)), "{}", simplified);
    }

    #[test]
    fn bound_values_are_not_captured() {
        let mut analyzer = Analyzer::new();
        let (a, x, z) = (Var::int32("a"), Var::int32("x"), Var::int32("z"));
        analyzer.bind(&a, Binding::Value(x.expr() + 1), false).unwrap();
        let expr = let_in(x.clone(), z.expr() * 3, x.expr() * x.expr() + a.expr());
        let simplified = rewrite_simplify(&analyzer, &expr);
        assert!(!simplified.uses_var(&a));

        let env = HashMap::from([(x, Value::Int(1)), (z, Value::Int(1))]);
        assert_eq!(eval(&simplified, &env), Some(Value::Int(11)), "{}", simplified);
    }

    #[test]
    fn shadowing_let_ignores_outer_bounds() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        analyzer.const_int_bound_update(&x, ConstIntBound::new(0, 10), false).unwrap();
        let expr = let_in(x.clone(), 20, lt(x.expr(), 11));
        assert_eq!(rewrite_simplify(&analyzer, &expr), Expr::bool(false));

        let y = Var::int32("y").expr();
        let expr = let_in(x.clone(), y.clone() * 4, min(x.expr(), 10) + x.expr());
        let simplified = rewrite_simplify(&analyzer, &expr);
        assert!(simplified.to_string().contains("min("), "{}", simplified);
    }

    #[test]
    fn uses_bounds() {
        let mut analyzer = Analyzer::new();
        let i = Var::int32("i");
        analyzer.bind(&i, Binding::Range(Range::new(0, 16)), false).unwrap();
        let i = i.expr();
        assert_eq!(rewrite_simplify(&analyzer, &floormod(i.clone(), 16)), i.clone());
        assert_eq!(rewrite_simplify(&analyzer, &floordiv(i.clone(), 16)), Expr::int32(0));
        assert_eq!(rewrite_simplify(&analyzer, &min(i.clone(), 20)), i.clone());
        assert_eq!(rewrite_simplify(&analyzer, &lt(i.clone(), 16)), Expr::bool(true));
        assert_eq!(rewrite_simplify(&analyzer, &max(i, 15)), Expr::int32(15));
    }

    #[test]
    fn floating_point_is_left_alone() {
        let analyzer = Analyzer::new();
        let f = Var::new("f", DataType::float(32)).expr();
        let expr = (f.clone() + 0) - f.clone();
        assert_eq!(rewrite_simplify(&analyzer, &expr), expr);
    }

    #[test]
    fn idempotent() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut analyzer = Analyzer::new();
        let vars = testing::bound_vars(&mut analyzer, &[("x", -8, 8), ("y", 0, 16)]);
        let leaves = vars.iter().map(|(var, ..)| var.expr()).collect::<Vec<_>>();
        for _ in 0..200 {
            let expr = testing::random_expr(&mut rng, &leaves, 3);
            let once = rewrite_simplify(&analyzer, &expr);
            let twice = rewrite_simplify(&analyzer, &once);
            assert_eq!(once, twice, "not idempotent on {}", expr);
        }
    }

    #[test]
    fn preserves_values() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut analyzer = Analyzer::new();
        let vars = testing::bound_vars(&mut analyzer, &[("x", -12, 12), ("y", 0, 30), ("z", 1, 9)]);
        let leaves = vars.iter().map(|(var, ..)| var.expr()).collect::<Vec<_>>();
        for _ in 0..400 {
            let expr = testing::random_expr(&mut rng, &leaves, 4);
            let simplified = rewrite_simplify(&analyzer, &expr);
            for _ in 0..16 {
                let env = testing::random_env(&mut rng, &vars);
                if let Some(expected) = eval(&expr, &env) {
                    assert_eq!(eval(&simplified, &env), Some(expected), "{} => {}", expr, simplified);
                }
            }
        }
    }

    #[test]
    fn preserves_values_of_conditions_and_vectors() {
        let mut rng = StdRng::seed_from_u64(23);
        let mut analyzer = Analyzer::new();
        let vars = testing::bound_vars(&mut analyzer, &[("x", -12, 12), ("y", 0, 30)]);
        let leaves = vars.iter().map(|(var, ..)| var.expr()).collect::<Vec<_>>();
        for i in 0..400 {
            let expr = if i % 2 == 0 {
                testing::random_cond(&mut rng, &leaves, 3)
            } else {
                testing::random_vector(&mut rng, &leaves, 2, 4)
            };
            let simplified = rewrite_simplify(&analyzer, &expr);
            assert_eq!(simplified.dtype(), expr.dtype(), "{} => {}", expr, simplified);
            for _ in 0..16 {
                let env = testing::random_env(&mut rng, &vars);
                if let Some(expected) = eval(&expr, &env) {
                    assert_eq!(eval(&simplified, &env), Some(expected), "{} => {}", expr, simplified);
                }
            }
        }
    }

    #[test]
    fn preserves_values_under_constraints() {
        let mut rng = StdRng::seed_from_u64(31);
        let mut analyzer = Analyzer::new();
        let vars = testing::bound_vars(&mut analyzer, &[("x", -12, 12), ("y", 0, 30), ("z", 1, 9)]);
        let leaves = vars.iter().map(|(var, ..)| var.expr()).collect::<Vec<_>>();
        for _ in 0..300 {
            let cond = testing::random_cond(&mut rng, &leaves, 2);
            let expr = testing::random_expr(&mut rng, &leaves, 3);
            let goal = testing::random_cond(&mut rng, &leaves, 1);

            let scope = analyzer.enter_constraint(cond.clone());
            let simplified = scope.rewrite_simplify(&expr);
            let proven = scope.can_prove(&goal, ProofStrength::Default);
            drop(scope);

            for _ in 0..32 {
                let env = testing::random_env(&mut rng, &vars);
                if eval(&cond, &env) != Some(Value::Bool(true)) {
                    continue;
                }
                if let Some(expected) = eval(&expr, &env) {
                    assert_eq!(
                        eval(&simplified, &env), Some(expected),
                        "{} => {} assuming {}", expr, simplified, cond,
                    );
                }
                if proven {
                    assert_ne!(
                        eval(&goal, &env), Some(Value::Bool(false)),
                        "proved {} assuming {}", goal, cond,
                    );
                }
            }
        }
    }
}
