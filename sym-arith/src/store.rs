//! The facts an [`Analyzer`](crate::Analyzer) knows about its variables and expressions.
//!
//! Facts live in three layers:
//!
//! - **Bindings** made with [`Analyzer::bind`](crate::Analyzer::bind) and
//!   [`Analyzer::const_int_bound_update`](crate::Analyzer::const_int_bound_update) persist for the
//!   lifetime of the analyzer.
//! - **Global facts** recorded by
//!   [`Analyzer::mark_global_non_neg_value`](crate::Analyzer::mark_global_non_neg_value) also
//!   persist, even when recorded inside a constraint scope.
//! - **Constraint facts** derived from the condition of a constraint scope are pushed onto a
//!   stack. Each scope remembers the height of the stack when it was entered, and exiting the
//!   scope truncates the stack back to that height, so the state from before the scope is
//!   restored exactly.
//!
//! A query for an expression intersects what every layer knows about it.

use crate::{const_int_bound::ConstIntBound, interval::IntervalSet, modular::ModularSet};
use std::{collections::{HashMap, HashSet}, sync::Arc};
use sym_ir::{Expr, Var};

/// What a variable was bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// The variable always equals the expression.
    Value(Expr),

    /// The variable takes values in `[min, min + extent)`.
    Range(Range),
}

/// A half-open range `[min, min + extent)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub min: Expr,
    pub extent: Expr,
}

impl Range {
    pub fn new(min: impl Into<Expr>, extent: impl Into<Expr>) -> Self {
        Self { min: min.into(), extent: extent.into() }
    }
}

impl std::fmt::Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Value(value) => write!(f, "{}", value),
            Binding::Range(range) => write!(f, "range({}, {})", range.min, range.extent),
        }
    }
}

/// A fact derived from a constraint.
#[derive(Debug, Clone)]
pub(crate) enum Fact {
    /// The expression lies within the bound.
    Bound(Expr, ConstIntBound),

    /// The expression lies within the congruence class.
    Modular(Expr, ModularSet),

    /// The condition is true.
    Literal(Expr),
}

/// An active constraint scope.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub(crate) id: u64,

    /// The height of the fact stack when the scope was entered.
    pub(crate) height: usize,
}

/// Scoped storage of everything the analyzer knows.
#[derive(Debug, Clone, Default)]
pub struct BoundsStore {
    pub(crate) bindings: HashMap<Var, Binding>,
    pub(crate) var_bounds: HashMap<Var, ConstIntBound>,
    pub(crate) var_modular: HashMap<Var, ModularSet>,

    /// Variables bound to a value; the rewrite simplifier substitutes them.
    pub(crate) values: HashMap<Var, Expr>,

    /// Symbolic ranges of variables bound to a range, used to prove symbolic bounds.
    pub(crate) ranges: HashMap<Var, IntervalSet>,

    pub(crate) global_bounds: Vec<(Expr, ConstIntBound)>,
    pub(crate) facts: Vec<Fact>,
    pub(crate) frames: Vec<Frame>,
}

impl BoundsStore {
    /// Returns everything known about the bound of the expression, or [`None`] if nothing is.
    pub fn bound_of(&self, expr: &Expr) -> Option<ConstIntBound> {
        let mut known = expr.as_var().and_then(|var| self.var_bounds.get(var)).copied();
        let mut meet = |bound: &ConstIntBound| {
            known = Some(match known {
                Some(known) => known.intersect(bound),
                None => *bound,
            });
        };

        for (target, bound) in &self.global_bounds {
            if target == expr {
                meet(bound);
            }
        }
        for fact in &self.facts {
            if let Fact::Bound(target, bound) = fact {
                if target == expr {
                    meet(bound);
                }
            }
        }
        known
    }

    /// Returns everything known about the congruence class of the expression, or [`None`] if
    /// nothing is.
    pub fn modular_of(&self, expr: &Expr) -> Option<ModularSet> {
        let mut known = expr.as_var().and_then(|var| self.var_modular.get(var)).copied();
        for fact in &self.facts {
            if let Fact::Modular(target, set) = fact {
                if target == expr {
                    known = Some(match known {
                        Some(known) => known.intersect(set),
                        None => *set,
                    });
                }
            }
        }
        known
    }

    /// The value the variable is bound to, if any.
    pub fn value_of(&self, var: &Var) -> Option<&Expr> {
        self.values.get(var)
    }

    /// The symbolic range of the variable, if it is bound to a range.
    pub fn range_of(&self, var: &Var) -> Option<&IntervalSet> {
        self.ranges.get(var)
    }

    /// The binding of the variable, if any.
    pub fn binding_of(&self, var: &Var) -> Option<&Binding> {
        self.bindings.get(var)
    }

    /// Returns the conditions known to be true in the current scope, innermost last.
    pub fn literals(&self) -> impl Iterator<Item = &Expr> {
        self.facts.iter().filter_map(|fact| match fact {
            Fact::Literal(literal) => Some(literal),
            _ => None,
        })
    }

    /// The names of the variables the store knows something about, and of the variables that
    /// occur in its bindings and facts.
    pub(crate) fn var_names(&self) -> HashSet<Arc<str>> {
        let vars = self.bindings.keys()
            .chain(self.var_bounds.keys())
            .chain(self.var_modular.keys())
            .chain(self.ranges.keys());
        let exprs = self.bindings.values()
            .flat_map(|binding| match binding {
                Binding::Value(value) => vec![value],
                Binding::Range(range) => vec![&range.min, &range.extent],
            })
            .chain(self.global_bounds.iter().map(|(target, _)| target))
            .chain(self.facts.iter().map(|fact| match fact {
                Fact::Bound(target, _) | Fact::Modular(target, _) | Fact::Literal(target) => target,
            }));

        vars.map(|var| var.name.clone())
            .chain(exprs.flat_map(Expr::free_vars).map(|var| var.name))
            .collect()
    }

    /// The number of active constraint scopes.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn push_frame(&mut self, id: u64) {
        self.frames.push(Frame { id, height: self.facts.len() });
    }

    pub(crate) fn push_fact(&mut self, fact: Fact) {
        self.facts.push(fact);
    }

    /// Removes the innermost frame and every fact recorded since it was pushed.
    pub(crate) fn pop_frame(&mut self) -> Option<Frame> {
        let frame = self.frames.pop()?;
        self.facts.truncate(frame.height);
        Some(frame)
    }

    pub(crate) fn innermost(&self) -> Option<&Frame> {
        self.frames.last()
    }
}
