//! Congruence analysis.
//!
//! A [`ModularSet`] `{coeff, base}` states that an expression always equals `coeff * k + base`
//! for some integer `k`. A coefficient of `0` pins the expression to the constant `base`, and a
//! coefficient of `1` carries no information. Congruences compose through linear arithmetic,
//! which lets the simplifiers prove facts such as `floormod(x * 6 + y * 4, 2) == 0`.

use crate::{analyzer::Analyzer, const_int_bound};
use std::{collections::HashMap, fmt};
use sym_ir::{BinaryOp, CallOp, Expr, ExprKind, Var};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The congruence class `x ≡ base (mod coeff)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModularSet {
    /// The modulus, never negative.
    pub coeff: i64,

    /// The remainder, in `[0, coeff)` unless `coeff` is zero.
    pub base: i64,
}

/// The greatest common divisor, where `gcd(0, x) = |x|`.
pub(crate) fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    i64::try_from(a).unwrap_or(i64::MAX)
}

impl ModularSet {
    /// Creates a congruence class, normalizing the base into `[0, coeff)`.
    pub fn new(coeff: i64, base: i64) -> Self {
        let Some(coeff) = coeff.checked_abs() else {
            return Self::everything();
        };
        let base = if coeff == 0 { base } else { base.rem_euclid(coeff) };
        Self { coeff, base }
    }

    /// The class that contains every integer.
    pub fn everything() -> Self {
        Self { coeff: 1, base: 0 }
    }

    /// The class containing only `value`.
    pub fn constant(value: i64) -> Self {
        Self { coeff: 0, base: value }
    }

    /// Returns true if the class contains a single value.
    pub fn is_const(&self) -> bool {
        self.coeff == 0
    }

    /// Returns true if the class carries no information.
    pub fn is_everything(&self) -> bool {
        self.coeff == 1
    }

    /// Returns true if the class contains `value`.
    pub fn contains(&self, value: i64) -> bool {
        if self.coeff == 0 {
            value == self.base
        } else {
            (value as i128 - self.base as i128).rem_euclid(self.coeff as i128) == 0
        }
    }

    /// `x + y`
    pub fn add(&self, other: &Self) -> Self {
        match self.base.checked_add(other.base) {
            Some(base) => Self::new(gcd(self.coeff, other.coeff), base),
            None => Self::combine_overflowed(self, other),
        }
    }

    /// `x - y`
    pub fn sub(&self, other: &Self) -> Self {
        match self.base.checked_sub(other.base) {
            Some(base) => Self::new(gcd(self.coeff, other.coeff), base),
            None => Self::combine_overflowed(self, other),
        }
    }

    /// `x * y`: `(c1 k1 + b1)(c2 k2 + b2)` is a multiple of `gcd(c1 c2, c1 b2, c2 b1)` away from
    /// `b1 b2`.
    pub fn mul(&self, other: &Self) -> Self {
        let products = (
            self.coeff.checked_mul(other.coeff),
            self.coeff.checked_mul(other.base),
            other.coeff.checked_mul(self.base),
            self.base.checked_mul(other.base),
        );
        match products {
            (Some(pq), Some(pm), Some(qn), Some(base)) => Self::new(gcd(pq, gcd(pm, qn)), base),
            _ => Self::everything(),
        }
    }

    /// Division by a non-zero constant. `non_negative` states whether the dividend is known to
    /// be non-negative, which makes truncating division round down too.
    pub fn div_by_const(&self, divisor: i64, floor: bool, non_negative: bool) -> Self {
        if divisor == 0 || self.coeff % divisor != 0 {
            return Self::everything();
        }
        if self.coeff == 0 {
            return match divide(self.base, divisor, floor) {
                Some(value) => Self::constant(value),
                None => Self::everything(),
            };
        }
        if self.base == 0 {
            return Self::new(self.coeff / divisor, 0);
        }
        if self.base > 0 && divisor > 0 && (floor || non_negative) {
            return Self::new(self.coeff / divisor, self.base / divisor);
        }
        Self::everything()
    }

    /// Remainder by a non-zero constant. The remainder differs from the dividend by a multiple
    /// of the divisor under both rounding modes.
    pub fn mod_by_const(&self, divisor: i64, floor: bool) -> Self {
        if divisor == 0 {
            return Self::everything();
        }
        if self.coeff == 0 {
            let value = if floor {
                self.base.checked_rem_euclid(divisor).map(|r| {
                    if r != 0 && divisor < 0 { r + divisor } else { r }
                })
            } else {
                self.base.checked_rem(divisor)
            };
            return value.map_or(Self::everything(), Self::constant);
        }
        Self::new(gcd(self.coeff, divisor), self.base)
    }

    /// The smallest class containing both classes.
    pub fn union(&self, other: &Self) -> Self {
        let diff = (self.base as i128 - other.base as i128).unsigned_abs();
        let diff = i64::try_from(diff).unwrap_or(1);
        Self::new(gcd(gcd(self.coeff, other.coeff), diff), self.base)
    }

    /// The values in both classes, by the Chinese remainder theorem.
    ///
    /// If the classes are disjoint (the constraints contradict each other) or the combined
    /// modulus overflows, the more precise of the two classes is returned.
    pub fn intersect(&self, other: &Self) -> Self {
        let fallback = if self.coeff == 0 || (other.coeff != 0 && self.coeff >= other.coeff) {
            *self
        } else {
            *other
        };
        match (self.coeff, other.coeff) {
            (0, _) => return *self,
            (_, 0) => return *other,
            _ => {},
        }

        let (c1, b1, c2, b2) = (self.coeff as i128, self.base as i128, other.coeff as i128, other.base as i128);
        let (g, p, _) = extended_gcd(c1, c2);
        if (b2 - b1) % g != 0 {
            return fallback;
        }
        let lcm = c1 / g * c2;
        let Ok(lcm_i64) = i64::try_from(lcm) else {
            return fallback;
        };
        // x = b1 + c1 * t, where c1 * t ≡ b2 - b1 (mod c2)
        let t = ((b2 - b1) / g * p).rem_euclid(c2 / g);
        let base = (b1 + c1 * t).rem_euclid(lcm);
        Self::new(lcm_i64, base as i64)
    }

    fn combine_overflowed(a: &Self, b: &Self) -> Self {
        let coeff = gcd(a.coeff, b.coeff);
        if coeff == 0 {
            return Self::everything();
        }
        let base = (a.base.rem_euclid(coeff) + b.base.rem_euclid(coeff)) % coeff;
        Self::new(coeff, base)
    }
}

impl fmt::Display for ModularSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{coeff: {}, base: {}}}", self.coeff, self.base)
    }
}

/// Returns `(g, p, q)` such that `a p + b q = g = gcd(a, b)`.
fn extended_gcd(a: i128, b: i128) -> (i128, i128, i128) {
    if b == 0 {
        (a, 1, 0)
    } else {
        let (g, p, q) = extended_gcd(b, a % b);
        (g, q, p - (a / b) * q)
    }
}

fn divide(a: i64, b: i64, floor: bool) -> Option<i64> {
    let quotient = a.checked_div(b)?;
    if floor && a % b != 0 && ((a < 0) != (b < 0)) {
        Some(quotient - 1)
    } else {
        Some(quotient)
    }
}

/// Infers the congruence class of an expression.
pub(crate) fn infer(analyzer: &Analyzer, expr: &Expr) -> ModularSet {
    Infer { analyzer, locals: HashMap::new() }.infer(&analyzer.isolate_lets(expr))
}

struct Infer<'a> {
    analyzer: &'a Analyzer,

    /// Classes of variables bound by enclosing `let` expressions.
    locals: HashMap<Var, ModularSet>,
}

impl Infer<'_> {
    fn infer(&mut self, expr: &Expr) -> ModularSet {
        if !expr.dtype().is_integer() {
            return ModularSet::everything();
        }
        if let Some(var) = expr.as_var() {
            if let Some(local) = self.locals.get(var) {
                return *local;
            }
        }
        let set = self.infer_node(expr);
        match self.analyzer.store().modular_of(expr) {
            Some(known) => set.intersect(&known),
            None => set,
        }
    }

    fn infer_node(&mut self, expr: &Expr) -> ModularSet {
        match expr.kind() {
            ExprKind::IntImm(value) => ModularSet::constant(*value),
            ExprKind::Binary(op, lhs, rhs) => self.infer_binary(*op, lhs, rhs),
            ExprKind::Select(_, t, f) => self.infer(t).union(&self.infer(f)),
            ExprKind::Cast(value) => {
                if value.dtype().is_integer()
                    && const_int_bound::infer(self.analyzer, value).fits(expr.dtype())
                {
                    self.infer(value)
                } else {
                    ModularSet::everything()
                }
            },
            ExprKind::Broadcast { value, .. } => self.infer(value),
            ExprKind::Ramp { base, stride, .. } => {
                let stride = self.infer(stride).mul(&ModularSet::everything());
                self.infer(base).add(&stride)
            },
            ExprKind::Let { var, value, body } => {
                let value = self.infer(value);
                let shadowed = self.locals.insert(var.clone(), value);
                let result = self.infer(body);
                match shadowed {
                    Some(previous) => self.locals.insert(var.clone(), previous),
                    None => self.locals.remove(var),
                };
                result
            },
            ExprKind::Call { op: CallOp::ShiftLeft, args } => match args.as_slice() {
                [value, amount] => match amount.as_int() {
                    Some(amount @ 0..=62) => {
                        self.infer(value).mul(&ModularSet::constant(1 << amount))
                    },
                    _ => ModularSet::everything(),
                },
                _ => ModularSet::everything(),
            },
            ExprKind::Call { op: CallOp::IfThenElse, args } => match args.as_slice() {
                [_, t, f] => self.infer(t).union(&self.infer(f)),
                _ => ModularSet::everything(),
            },
            _ => ModularSet::everything(),
        }
    }

    fn infer_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> ModularSet {
        match op {
            BinaryOp::Add => self.infer(lhs).add(&self.infer(rhs)),
            BinaryOp::Sub => self.infer(lhs).sub(&self.infer(rhs)),
            BinaryOp::Mul => self.infer(lhs).mul(&self.infer(rhs)),
            BinaryOp::Div | BinaryOp::FloorDiv => {
                let Some(divisor) = self.const_operand(rhs) else {
                    return ModularSet::everything();
                };
                let floor = op == BinaryOp::FloorDiv;
                let non_negative = !floor
                    && const_int_bound::infer(self.analyzer, lhs).is_non_negative();
                self.infer(lhs).div_by_const(divisor, floor, non_negative)
            },
            BinaryOp::Mod | BinaryOp::FloorMod => match self.const_operand(rhs) {
                Some(divisor) => self.infer(lhs).mod_by_const(divisor, op == BinaryOp::FloorMod),
                None => ModularSet::everything(),
            },
            BinaryOp::Min | BinaryOp::Max => self.infer(lhs).union(&self.infer(rhs)),
            _ => ModularSet::everything(),
        }
    }

    /// Returns the value of the operand if it is a non-zero constant, possibly broadcast.
    fn const_operand(&mut self, expr: &Expr) -> Option<i64> {
        let set = self.infer(expr);
        (set.is_const() && set.base != 0).then_some(set.base)
    }
}

#[cfg(test)]
mod tests {
    use crate::{testing, Analyzer, Binding, Range};
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use sym_ir::{build::*, eval, Value};
    use super::*;

    #[test]
    fn linear_combination() {
        let analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let y = Var::int32("y").expr();
        assert_eq!(analyzer.modular_set(&(x.clone() * 6 + y * 4)), ModularSet::new(2, 0));
        assert_eq!(analyzer.modular_set(&(x.clone() * 4 + 3)), ModularSet::new(4, 3));
        assert_eq!(analyzer.modular_set(&(x * 4 - 3)), ModularSet::new(4, 1));
    }

    #[test]
    fn division_and_remainder() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x");
        analyzer.bind(&x, Binding::Range(Range::new(0, 100)), false).unwrap();
        let x = x.expr();
        assert_eq!(analyzer.modular_set(&truncdiv(x.clone() * 8 + 4, 2)), ModularSet::new(4, 2));
        assert_eq!(analyzer.modular_set(&floordiv(x.clone() * 8, 4)), ModularSet::new(2, 0));
        assert_eq!(analyzer.modular_set(&floormod(x.clone() * 6 + 1, 4)), ModularSet::new(2, 1));
        assert_eq!(analyzer.modular_set(&floormod(Expr::int32(-7), 4)), ModularSet::constant(1));
        assert_eq!(analyzer.modular_set(&truncdiv(x * 3, 2)), ModularSet::everything());
    }

    #[test]
    fn union_and_intersection() {
        let a = ModularSet::new(6, 1);
        let b = ModularSet::new(4, 3);
        assert_eq!(a.union(&b), ModularSet::new(2, 1));
        assert_eq!(ModularSet::new(3, 2).intersect(&ModularSet::new(5, 3)), ModularSet::new(15, 8));
        assert_eq!(ModularSet::constant(7).union(&ModularSet::constant(7)), ModularSet::constant(7));
        assert_eq!(ModularSet::constant(3).union(&ModularSet::constant(7)), ModularSet::new(4, 3));
        assert!(ModularSet::new(15, 8).contains(23));
        assert!(!ModularSet::new(15, 8).contains(9));
    }

    #[test]
    fn constraint_facts() {
        let mut analyzer = Analyzer::new();
        let x = Var::int32("x").expr();
        let fact = eq(floormod(x.clone(), 4), 1);
        let scope = analyzer.enter_constraint(fact);
        assert_eq!(scope.modular_set(&(x.clone() * 2)), ModularSet::new(8, 2));
        drop(scope);
        assert_eq!(analyzer.modular_set(&(x * 2)), ModularSet::new(2, 0));
    }

    #[test]
    fn classes_are_sound() {
        let mut rng = StdRng::seed_from_u64(29);
        let mut analyzer = Analyzer::new();
        let vars = testing::bound_vars(&mut analyzer, &[("x", -16, 16), ("y", 0, 24)]);
        let x = vars[0].0.expr();
        let y = vars[1].0.expr();
        let leaves = vec![x.clone(), y.clone(), x * 4 + 2, y * 6 - 3];

        for _ in 0..300 {
            let expr = testing::random_expr(&mut rng, &leaves, 4);
            let set = analyzer.modular_set(&expr);
            for _ in 0..20 {
                let env = testing::random_env(&mut rng, &vars);
                if let Some(Value::Int(value)) = eval(&expr, &env) {
                    assert!(set.contains(value), "{} = {} is outside {}", expr, value, set);
                }
            }
        }
    }
}
