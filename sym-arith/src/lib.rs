//! Analysis and simplification of symbolic integer expressions.
//!
//! Given expressions in the [`sym_ir`] IR, this crate infers conservative facts about the values
//! they can take, and rewrites them into simpler expressions that are equal for every assignment
//! of their variables:
//!
//! - [`const_int_bound`]: the constant range of an expression.
//! - [`modular_set`]: the congruence class of an expression.
//! - [`interval_set`]: the range of an expression, with symbolic ends, as some of its variables
//!   vary over their own ranges.
//! - [`rewrite_simplify`]: simplification by local rewrite rules.
//! - [`canonical_simplify`]: simplification by flattening sums and combining like terms.
//!
//! All of them are answered under what an [`Analyzer`] knows about the variables: their
//! bindings, injected bounds, and the conditions of the enclosing constraint scopes.
//!
//! ```
//! use sym_arith::{Analyzer, ConstIntBound};
//! use sym_ir::{build::*, Var};
//!
//! let mut analyzer = Analyzer::new();
//! let x = Var::int32("x");
//! let y = Var::int32("y");
//! analyzer.const_int_bound_update(&x, ConstIntBound::new(-2, 4), false).unwrap();
//! analyzer.const_int_bound_update(&y, ConstIntBound::new(4, 10), false).unwrap();
//!
//! let bound = sym_arith::const_int_bound(&analyzer, &(x.expr() * y.expr() + 20));
//! assert_eq!((bound.min_value(), bound.max_value()), (0, 60));
//! ```

pub mod analyzer;
pub mod canonical;
pub mod config;
pub mod const_int_bound;
pub mod constraint;
pub mod error;
pub mod interval;
pub mod modular;
pub mod rewrite;
pub mod step_collector;
pub mod store;

#[cfg(test)]
mod testing;

pub use analyzer::{Analyzer, ProofStrength};
pub use config::AnalyzerConfig;
pub use const_int_bound::{BoundValue, ConstIntBound};
pub use constraint::{ConstraintScope, ConstraintToken};
pub use error::{BindingConflict, BoundConflict, ConstraintOrder, NoActiveConstraint};
pub use interval::IntervalSet;
pub use modular::ModularSet;
pub use rewrite::step::Step;
pub use store::{Binding, BoundsStore, Range};

use std::collections::HashMap;
use sym_ir::{Expr, Var};

/// Infers the constant bound of an expression.
pub fn const_int_bound(analyzer: &Analyzer, expr: &Expr) -> ConstIntBound {
    const_int_bound::infer(analyzer, expr)
}

/// Infers the congruence class of an expression.
pub fn modular_set(analyzer: &Analyzer, expr: &Expr) -> ModularSet {
    modular::infer(analyzer, expr)
}

/// Infers the symbolic interval of an expression as the variables of `domain` vary over their
/// intervals.
pub fn interval_set(analyzer: &Analyzer, expr: &Expr, domain: &HashMap<Var, IntervalSet>) -> IntervalSet {
    interval::infer(analyzer, expr, domain)
}

/// Simplifies an expression with the rewrite rules.
pub fn rewrite_simplify(analyzer: &Analyzer, expr: &Expr) -> Expr {
    rewrite::rewrite_simplify(analyzer, expr)
}

/// Simplifies an expression to canonical form, running up to `steps` rounds.
pub fn canonical_simplify(analyzer: &Analyzer, expr: &Expr, steps: usize) -> Expr {
    canonical::canonical_simplify(analyzer, expr, steps)
}
