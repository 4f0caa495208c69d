//! Helpers for randomized soundness tests.

use crate::{Analyzer, ConstIntBound};
use rand::{rngs::StdRng, Rng};
use std::collections::HashMap;
use sym_ir::{build::*, BinaryOp, DataType, Expr, Value, Var};

/// Creates `int32` variables and bounds each one to its inclusive range.
pub(crate) fn bound_vars(analyzer: &mut Analyzer, specs: &[(&str, i64, i64)]) -> Vec<(Var, i64, i64)> {
    specs.iter()
        .map(|&(name, lo, hi)| {
            let var = Var::int32(name);
            analyzer.const_int_bound_update(&var, ConstIntBound::new(lo, hi), false).unwrap();
            (var, lo, hi)
        })
        .collect()
}

/// Picks a value for each variable within its range.
pub(crate) fn random_env(rng: &mut StdRng, vars: &[(Var, i64, i64)]) -> HashMap<Var, Value> {
    vars.iter()
        .map(|(var, lo, hi)| (var.clone(), Value::Int(rng.gen_range(*lo..=*hi))))
        .collect()
}

fn random_divisor(rng: &mut StdRng) -> Expr {
    let magnitude = rng.gen_range(1..=8);
    Expr::int32(if rng.gen_bool(0.8) { magnitude } else { -magnitude })
}

fn random_leaf(rng: &mut StdRng, leaves: &[Expr]) -> Expr {
    if rng.gen_bool(0.7) {
        leaves[rng.gen_range(0..leaves.len())].clone()
    } else {
        Expr::int32(rng.gen_range(-8..=8))
    }
}

/// Builds a random integer expression over the given leaves. Divisors are always non-zero
/// constants.
///
/// Leaves that are variables are sometimes rebound by a `let`, to a value that may lie outside
/// the range the variable is bounded to.
pub(crate) fn random_expr(rng: &mut StdRng, leaves: &[Expr], depth: usize) -> Expr {
    if depth == 0 || rng.gen_ratio(1, 4) {
        return random_leaf(rng, leaves);
    }

    let a = random_expr(rng, leaves, depth - 1);
    match rng.gen_range(0..14) {
        0 | 1 => add(a, random_expr(rng, leaves, depth - 1)),
        2 => sub(a, random_expr(rng, leaves, depth - 1)),
        3 => mul(a, random_expr(rng, leaves, depth - 1)),
        4 => floordiv(a, random_divisor(rng)),
        5 => floormod(a, random_divisor(rng)),
        6 => truncdiv(a, random_divisor(rng)),
        7 => truncmod(a, random_divisor(rng)),
        8 => min(a, random_expr(rng, leaves, depth - 1)),
        9 => max(a, random_expr(rng, leaves, depth - 1)),
        10 => {
            let b = random_expr(rng, leaves, depth - 1);
            let c = random_expr(rng, leaves, depth - 1);
            select(lt(a.clone(), c), a, b)
        },
        11 => select(random_cond(rng, leaves, depth - 1), a, random_expr(rng, leaves, depth - 1)),
        12 => match leaves[rng.gen_range(0..leaves.len())].as_var() {
            Some(var) => let_in(var.clone(), a, random_expr(rng, leaves, depth - 1)),
            None => a,
        },
        _ => cast(DataType::int32(), cast(DataType::int64(), a)),
    }
}

/// Builds a random condition: comparisons of random integer expressions, combined with `&&`,
/// `||` and `!`.
pub(crate) fn random_cond(rng: &mut StdRng, leaves: &[Expr], depth: usize) -> Expr {
    const COMPARISONS: [BinaryOp; 6] = [
        BinaryOp::Lt, BinaryOp::Le, BinaryOp::Gt, BinaryOp::Ge, BinaryOp::Eq, BinaryOp::Ne,
    ];

    if depth == 0 || rng.gen_ratio(1, 3) {
        let operand_depth = depth.min(2);
        let lhs = random_expr(rng, leaves, operand_depth);
        let rhs = if rng.gen_bool(0.5) {
            Expr::int32(rng.gen_range(-12..=12))
        } else {
            random_expr(rng, leaves, operand_depth)
        };
        let op = COMPARISONS[rng.gen_range(0..COMPARISONS.len())];
        return Expr::binary(op, lhs, rhs);
    }

    match rng.gen_range(0..3) {
        0 => and(random_cond(rng, leaves, depth - 1), random_cond(rng, leaves, depth - 1)),
        1 => or(random_cond(rng, leaves, depth - 1), random_cond(rng, leaves, depth - 1)),
        _ => not(random_cond(rng, leaves, depth - 1)),
    }
}

/// Builds a random `int32` vector of `lanes` lanes from ramps and broadcasts of random integer
/// expressions.
pub(crate) fn random_vector(rng: &mut StdRng, leaves: &[Expr], depth: usize, lanes: u16) -> Expr {
    let base = random_expr(rng, leaves, depth);
    let v = if rng.gen_bool(0.5) {
        ramp(base, Expr::int32(rng.gen_range(-3..=3)), lanes)
    } else {
        broadcast(base, lanes)
    };
    let w = broadcast(random_expr(rng, leaves, depth), lanes);
    match rng.gen_range(0..7) {
        0 => v + w,
        1 => v - w,
        2 => w - v,
        3 => v * broadcast(Expr::int32(rng.gen_range(-4..=4)), lanes),
        4 => floordiv(v, broadcast(random_divisor(rng), lanes)),
        5 => floormod(v, broadcast(random_divisor(rng), lanes)),
        _ => min(v, w),
    }
}
