//! The flattened sum-of-products form used by the canonical simplifier.

use crate::rewrite::rules::is_multiple;
use std::collections::BTreeMap;
use sym_ir::{BinaryOp, DataType, Expr};

/// How a split atom divides its dividend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SplitKind {
    TruncDiv,
    TruncMod,
    FloorDiv,
    FloorMod,
}

impl SplitKind {
    pub fn op(self) -> BinaryOp {
        match self {
            SplitKind::TruncDiv => BinaryOp::Div,
            SplitKind::TruncMod => BinaryOp::Mod,
            SplitKind::FloorDiv => BinaryOp::FloorDiv,
            SplitKind::FloorMod => BinaryOp::FloorMod,
        }
    }

    /// The remainder matching a quotient, such as `floormod` for `floordiv`.
    pub fn remainder(self) -> Option<SplitKind> {
        match self {
            SplitKind::TruncDiv => Some(SplitKind::TruncMod),
            SplitKind::FloorDiv => Some(SplitKind::FloorMod),
            _ => None,
        }
    }
}

/// An indivisible factor of a term.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Atom {
    /// A variable, or any expression the sum form does not look into.
    Leaf(Expr),

    /// The quotient or remainder of a dividend by a non-zero constant. The dividend is kept in
    /// canonical form.
    Split { dividend: Expr, divisor: i64, kind: SplitKind },
}

impl Atom {
    fn to_expr(&self) -> Option<Expr> {
        match self {
            Atom::Leaf(expr) => Some(expr.clone()),
            Atom::Split { dividend, divisor, kind } => {
                let divisor = Expr::make_const(dividend.dtype(), *divisor);
                Expr::try_binary(kind.op(), dividend.clone(), divisor).ok()
            },
        }
    }
}

/// A sum of terms plus a constant: `c1 * (a * b) + c2 * d + ... + constant`.
///
/// Each term is a product of [`Atom`]s, kept sorted, mapped to its coefficient. Coefficients are
/// never zero. All arithmetic is checked; an operation that overflows returns [`None`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumForm {
    pub dtype: DataType,
    pub terms: BTreeMap<Vec<Atom>, i64>,
    pub constant: i64,
}

impl SumForm {
    pub fn constant(dtype: DataType, value: i64) -> Self {
        Self { dtype, terms: BTreeMap::new(), constant: value }
    }

    pub fn atom(dtype: DataType, atom: Atom) -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(vec![atom], 1);
        Self { dtype, terms, constant: 0 }
    }

    /// If the sum has no terms, returns its constant.
    pub fn as_const(&self) -> Option<i64> {
        self.terms.is_empty().then_some(self.constant)
    }

    /// Adds `coeff * term` to the sum, dropping the term if its coefficient becomes zero.
    pub fn add_term(&mut self, term: Vec<Atom>, coeff: i64) -> Option<()> {
        if coeff == 0 {
            return Some(());
        }
        let entry = self.terms.entry(term).or_insert(0);
        *entry = entry.checked_add(coeff)?;
        self.terms.retain(|_, coeff| *coeff != 0);
        Some(())
    }

    pub fn add(mut self, other: &Self) -> Option<Self> {
        for (term, coeff) in &other.terms {
            self.add_term(term.clone(), *coeff)?;
        }
        self.constant = self.constant.checked_add(other.constant)?;
        Some(self)
    }

    pub fn sub(self, other: &Self) -> Option<Self> {
        self.add(&other.clone().scale(-1)?)
    }

    pub fn scale(mut self, factor: i64) -> Option<Self> {
        if factor == 0 {
            return Some(Self::constant(self.dtype, 0));
        }
        for coeff in self.terms.values_mut() {
            *coeff = coeff.checked_mul(factor)?;
        }
        self.constant = self.constant.checked_mul(factor)?;
        Some(self)
    }

    /// Distributes the product of two sums. Returns [`None`] if the product would have more than
    /// `max_terms` terms.
    pub fn mul(self, other: &Self, max_terms: usize) -> Option<Self> {
        if let Some(factor) = other.as_const() {
            return self.scale(factor);
        }
        if let Some(factor) = self.as_const() {
            return other.clone().scale(factor);
        }
        if (self.terms.len() + 1) * (other.terms.len() + 1) > max_terms {
            return None;
        }

        let mut product = Self::constant(self.dtype, self.constant.checked_mul(other.constant)?);
        for (term, coeff) in &self.terms {
            product.add_term(term.clone(), coeff.checked_mul(other.constant)?)?;
        }
        for (term, coeff) in &other.terms {
            product.add_term(term.clone(), coeff.checked_mul(self.constant)?)?;
        }
        for (a, c1) in &self.terms {
            for (b, c2) in &other.terms {
                let mut term = a.iter().chain(b).cloned().collect::<Vec<_>>();
                term.sort();
                product.add_term(term, c1.checked_mul(*c2)?)?;
            }
        }
        Some(product)
    }

    /// The greatest common divisor of the term coefficients, or zero if there are no terms.
    pub fn content(&self) -> i64 {
        self.terms.values().fold(0, |g, coeff| crate::modular::gcd(g, *coeff))
    }

    /// Divides every coefficient and the constant by `divisor`, if all of them are multiples of it.
    pub fn divide_exact(&self, divisor: i64) -> Option<Self> {
        if divisor == 0 || !is_multiple(self.constant, divisor) || !is_multiple(self.content(), divisor) {
            return None;
        }
        let mut quotient = self.clone();
        for coeff in quotient.terms.values_mut() {
            *coeff = coeff.checked_div(divisor)?;
        }
        quotient.constant = quotient.constant.checked_div(divisor)?;
        Some(quotient)
    }

    /// Splits the sum into the terms whose coefficients are multiples of `divisor`, and the rest.
    /// The constant stays with the rest.
    pub fn partition(&self, divisor: i64) -> (Self, Self) {
        let mut multiples = Self::constant(self.dtype, 0);
        let mut rest = Self::constant(self.dtype, self.constant);
        for (term, coeff) in &self.terms {
            let target = if is_multiple(*coeff, divisor) { &mut multiples } else { &mut rest };
            target.terms.insert(term.clone(), *coeff);
        }
        (multiples, rest)
    }

    /// Rebuilds an expression: positive terms first, then the negative terms subtracted, then the
    /// constant. A sum with only negative terms starts from the constant, `c - x`, or from zero.
    pub fn to_expr(&self) -> Option<Expr> {
        let make = |op, lhs: Expr, rhs: Expr| Expr::try_binary(op, lhs, rhs).ok();
        let term_expr = |term: &[Atom], coeff: i64| -> Option<Expr> {
            let mut factors = term.iter().map(Atom::to_expr);
            let first = factors.next()??;
            let product = factors.try_fold(first, |acc, factor| make(BinaryOp::Mul, acc, factor?))?;
            if coeff == 1 {
                Some(product)
            } else {
                make(BinaryOp::Mul, product, self.constant_expr(coeff)?)
            }
        };

        let mut result: Option<Expr> = None;
        for (term, coeff) in self.terms.iter().filter(|(_, coeff)| **coeff > 0) {
            let term = term_expr(term, *coeff)?;
            result = Some(match result {
                Some(acc) => make(BinaryOp::Add, acc, term)?,
                None => term,
            });
        }

        let mut result = match result {
            Some(result) => result,
            None if self.terms.is_empty() => return self.constant_expr(self.constant),
            None => self.constant_expr(self.constant)?,
        };
        let starts_with_constant = !self.terms.values().any(|coeff| *coeff > 0);
        for (term, coeff) in self.terms.iter().filter(|(_, coeff)| **coeff < 0) {
            result = make(BinaryOp::Sub, result, term_expr(term, coeff.checked_neg()?)?)?;
        }

        if starts_with_constant || self.constant == 0 {
            Some(result)
        } else if self.constant > 0 {
            make(BinaryOp::Add, result, self.constant_expr(self.constant)?)
        } else {
            make(BinaryOp::Sub, result, self.constant_expr(self.constant.checked_neg()?)?)
        }
    }

    fn constant_expr(&self, value: i64) -> Option<Expr> {
        self.dtype.fits(value).then(|| Expr::make_const(self.dtype, value))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sym_ir::{build::*, Var};
    use super::*;

    fn leaf(name: &str) -> SumForm {
        SumForm::atom(DataType::int32(), Atom::Leaf(Var::int32(name).expr()))
    }

    #[test]
    fn like_terms_merge() {
        let x = leaf("x");
        let sum = x.clone().scale(3).unwrap().sub(&x.scale(4).unwrap()).unwrap()
            .add(&SumForm::constant(DataType::int32(), 1)).unwrap();
        assert_eq!(sum.to_expr().unwrap(), Expr::int32(1) - Var::int32("x").expr());
    }

    #[test]
    fn products_distribute() {
        let (x, y) = (leaf("x"), leaf("y"));
        let one = SumForm::constant(DataType::int32(), 1);
        let product = x.clone().add(&one).unwrap().mul(&y.clone().sub(&one).unwrap(), 64).unwrap();
        let (x, y) = (Var::int32("x").expr(), Var::int32("y").expr());
        assert_eq!(product.to_expr().unwrap(), ((x.clone() * y.clone() + y) - x) - 1);
    }

    #[test]
    fn distribution_is_capped() {
        let sum = ["a", "b", "c", "d", "e", "f", "g", "h"].iter()
            .map(|name| leaf(name))
            .try_fold(SumForm::constant(DataType::int32(), 0), |acc, term| acc.add(&term))
            .unwrap();
        assert!(sum.clone().mul(&sum, 64).is_none());
        assert!(sum.clone().mul(&sum, 100).is_some());
    }

    #[test]
    fn exact_division() {
        let x = leaf("x");
        let sum = x.scale(6).unwrap().add(&SumForm::constant(DataType::int32(), 4)).unwrap();
        assert_eq!(sum.content(), 6);
        assert!(sum.divide_exact(4).is_none());
        let halved = sum.divide_exact(2).unwrap();
        assert_eq!(halved.to_expr().unwrap(), Var::int32("x").expr() * 3 + 2);
    }
}
