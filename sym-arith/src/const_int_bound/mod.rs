//! Constant integer bounds.
//!
//! A [`ConstIntBound`] is a closed interval `[min, max]` containing every value an expression can
//! take. Each end is a [`BoundValue`], which is either finite or infinite in its direction, so
//! bound arithmetic never silently overflows: any finite result whose magnitude reaches
//! `2^63 - 1` saturates to the corresponding infinity.
//!
//! The bound of an expression is computed by [`const_int_bound`](crate::const_int_bound); see the
//! [`infer`] module for the rules.

pub mod infer;

pub(crate) use infer::infer;

use std::{cmp::Ordering, fmt};
use sym_ir::DataType;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The sentinel used by [`ConstIntBound::max_value`] for a bound that is unbounded above.
pub const POS_INF: i64 = i64::MAX;

/// The sentinel used by [`ConstIntBound::min_value`] for a bound that is unbounded below.
pub const NEG_INF: i64 = -i64::MAX;

/// One end of a [`ConstIntBound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoundValue {
    /// Negative infinity.
    NegInf,

    /// A finite value, strictly between [`NEG_INF`] and [`POS_INF`].
    Finite(i64),

    /// Positive infinity.
    PosInf,
}

impl BoundValue {
    /// Converts an exact value, saturating to the infinities at `±(2^63 - 1)`.
    pub fn from_i128(value: i128) -> Self {
        if value >= POS_INF as i128 {
            BoundValue::PosInf
        } else if value <= NEG_INF as i128 {
            BoundValue::NegInf
        } else {
            BoundValue::Finite(value as i64)
        }
    }

    /// Converts a value that may be one of the [`POS_INF`] / [`NEG_INF`] sentinels.
    pub fn from_sentinel(value: i64) -> Self {
        Self::from_i128(value as i128)
    }

    /// Returns the value, encoding infinities with the [`POS_INF`] / [`NEG_INF`] sentinels.
    pub fn to_sentinel(self) -> i64 {
        match self {
            BoundValue::NegInf => NEG_INF,
            BoundValue::Finite(value) => value,
            BoundValue::PosInf => POS_INF,
        }
    }

    /// Returns the value if it is finite.
    pub fn finite(self) -> Option<i64> {
        match self {
            BoundValue::Finite(value) => Some(value),
            _ => None,
        }
    }

    fn signum(self) -> i64 {
        match self {
            BoundValue::NegInf => -1,
            BoundValue::Finite(value) => value.signum(),
            BoundValue::PosInf => 1,
        }
    }

    fn inf_with_sign(sign: i64) -> Self {
        if sign < 0 {
            BoundValue::NegInf
        } else {
            BoundValue::PosInf
        }
    }

    fn neg(self) -> Self {
        match self {
            BoundValue::NegInf => BoundValue::PosInf,
            BoundValue::Finite(value) => BoundValue::Finite(-value),
            BoundValue::PosInf => BoundValue::NegInf,
        }
    }

    /// Adds two ends. Returns [`None`] for `inf + -inf`, which has no meaningful value.
    fn add(self, other: Self) -> Option<Self> {
        use BoundValue::*;
        match (self, other) {
            (PosInf, NegInf) | (NegInf, PosInf) => None,
            (PosInf, _) | (_, PosInf) => Some(PosInf),
            (NegInf, _) | (_, NegInf) => Some(NegInf),
            (Finite(a), Finite(b)) => Some(Self::from_i128(a as i128 + b as i128)),
        }
    }

    fn mul(self, other: Self) -> Self {
        match (self, other) {
            (BoundValue::Finite(0), _) | (_, BoundValue::Finite(0)) => BoundValue::Finite(0),
            (BoundValue::Finite(a), BoundValue::Finite(b)) => Self::from_i128(a as i128 * b as i128),
            (a, b) => Self::inf_with_sign(a.signum() * b.signum()),
        }
    }

    /// Divides two ends, rounding toward zero or toward negative infinity. The divisor must not
    /// be zero.
    fn div(self, other: Self, floor: bool) -> Self {
        match (self, other) {
            (BoundValue::Finite(a), BoundValue::Finite(b)) => {
                let (a, b) = (a as i128, b as i128);
                let quotient = a / b;
                let round_down = floor && a % b != 0 && ((a < 0) != (b < 0));
                Self::from_i128(if round_down { quotient - 1 } else { quotient })
            },
            (BoundValue::Finite(a), divisor) => {
                if floor && a != 0 && a.signum() != divisor.signum() {
                    BoundValue::Finite(-1)
                } else {
                    BoundValue::Finite(0)
                }
            },
            (a, b) => Self::inf_with_sign(a.signum() * b.signum()),
        }
    }
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::NegInf => write!(f, "-inf"),
            BoundValue::Finite(value) => write!(f, "{}", value),
            BoundValue::PosInf => write!(f, "+inf"),
        }
    }
}

/// A closed interval `[min, max]` of integers, possibly unbounded in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstIntBound {
    min: BoundValue,
    max: BoundValue,
}

impl ConstIntBound {
    /// Creates a bound from two values, where [`NEG_INF`] and [`POS_INF`] (or anything beyond
    /// them) mean unbounded.
    pub fn new(min_value: i64, max_value: i64) -> Self {
        Self {
            min: BoundValue::from_sentinel(min_value),
            max: BoundValue::from_sentinel(max_value),
        }
    }

    /// Creates a bound from its two ends.
    pub fn from_ends(min: BoundValue, max: BoundValue) -> Self {
        Self { min, max }
    }

    /// The bound containing every integer.
    pub fn everything() -> Self {
        Self { min: BoundValue::NegInf, max: BoundValue::PosInf }
    }

    /// The bound containing only `value`.
    pub fn point(value: i64) -> Self {
        Self::new(value, value)
    }

    /// `[0, +inf)`.
    pub fn non_negative() -> Self {
        Self { min: BoundValue::Finite(0), max: BoundValue::PosInf }
    }

    /// The range of values representable by the data type. Floating-point types are unbounded.
    pub fn for_dtype(dtype: DataType) -> Self {
        match (dtype.min_int(), dtype.max_int()) {
            (Some(min), Some(max)) => Self::new(min, max),
            _ => Self::everything(),
        }
    }

    /// The lower end, with [`NEG_INF`] meaning unbounded.
    pub fn min_value(&self) -> i64 {
        self.min.to_sentinel()
    }

    /// The upper end, with [`POS_INF`] meaning unbounded.
    pub fn max_value(&self) -> i64 {
        self.max.to_sentinel()
    }

    pub fn min_bound(&self) -> BoundValue {
        self.min
    }

    pub fn max_bound(&self) -> BoundValue {
        self.max
    }

    /// If the bound contains exactly one value, returns it.
    pub fn as_point(&self) -> Option<i64> {
        match (self.min, self.max) {
            (BoundValue::Finite(min), BoundValue::Finite(max)) if min == max => Some(min),
            _ => None,
        }
    }

    pub fn is_everything(&self) -> bool {
        self.min == BoundValue::NegInf && self.max == BoundValue::PosInf
    }

    /// Returns true if every value in the bound is at least zero.
    pub fn is_non_negative(&self) -> bool {
        self.min >= BoundValue::Finite(0)
    }

    /// Returns true if every value in the bound is greater than zero.
    pub fn is_positive(&self) -> bool {
        self.min > BoundValue::Finite(0)
    }

    /// Returns true if every value in the bound is at most zero.
    pub fn is_non_positive(&self) -> bool {
        self.max <= BoundValue::Finite(0)
    }

    /// Returns true if every value in the bound is less than zero.
    pub fn is_negative(&self) -> bool {
        self.max < BoundValue::Finite(0)
    }

    /// Returns true if the bound contains `value`.
    pub fn contains(&self, value: i64) -> bool {
        self.min <= BoundValue::Finite(value) && BoundValue::Finite(value) <= self.max
    }

    /// Returns true if every value of `self` is in `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        other.min <= self.min && self.max <= other.max
    }

    /// Returns true if every value of the bound is representable by the data type.
    pub fn fits(&self, dtype: DataType) -> bool {
        self.is_subset_of(&Self::for_dtype(dtype))
    }

    /// The smallest bound containing both bounds.
    pub fn union(&self, other: &Self) -> Self {
        Self { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    /// The values contained in both bounds.
    pub fn intersect(&self, other: &Self) -> Self {
        Self { min: self.min.max(other.min), max: self.max.min(other.max) }
    }

    /// `[a0 + b0, a1 + b1]`
    pub fn add(&self, other: &Self) -> Self {
        Self {
            min: self.min.add(other.min).unwrap_or(BoundValue::NegInf),
            max: self.max.add(other.max).unwrap_or(BoundValue::PosInf),
        }
    }

    /// `[-a1, -a0]`
    pub fn neg(&self) -> Self {
        Self { min: self.max.neg(), max: self.min.neg() }
    }

    /// `[a0 - b1, a1 - b0]`
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// The smallest bound containing the four corner products.
    pub fn mul(&self, other: &Self) -> Self {
        Self::from_corners(self, other, |a, b| a.mul(b))
    }

    /// Division rounding toward zero (`floor = false`) or negative infinity (`floor = true`).
    ///
    /// Returns [`None`] if the divisor may be zero.
    pub fn div(&self, divisor: &Self, floor: bool) -> Option<Self> {
        if !divisor.is_positive() && !divisor.is_negative() {
            return None;
        }
        Some(Self::from_corners(self, divisor, |a, b| a.div(b, floor)))
    }

    /// The remainder of division rounding toward zero. Its magnitude is less than the divisor's,
    /// and its sign follows the dividend.
    ///
    /// Returns [`None`] if the divisor may be zero.
    pub fn truncmod(&self, divisor: &Self) -> Option<Self> {
        if !divisor.is_positive() && !divisor.is_negative() {
            return None;
        }
        // largest possible |remainder|: max |divisor| - 1
        let cap = divisor.min.neg().max(divisor.max)
            .add(BoundValue::Finite(-1))
            .unwrap_or(BoundValue::PosInf);
        let min = if self.is_non_negative() {
            BoundValue::Finite(0)
        } else {
            self.min.max(cap.neg())
        };
        let max = if self.is_non_positive() {
            BoundValue::Finite(0)
        } else {
            self.max.min(cap)
        };
        Some(Self { min, max })
    }

    /// The remainder of division rounding toward negative infinity. Its sign follows the divisor.
    ///
    /// Returns [`None`] if the divisor may be zero.
    pub fn floormod(&self, divisor: &Self) -> Option<Self> {
        if divisor.is_positive() {
            let cap = divisor.max.add(BoundValue::Finite(-1)).unwrap_or(BoundValue::PosInf);
            if self.is_non_negative() {
                Some(Self { min: BoundValue::Finite(0), max: self.max.min(cap) })
            } else {
                Some(Self { min: BoundValue::Finite(0), max: cap })
            }
        } else if divisor.is_negative() {
            let cap = divisor.min.add(BoundValue::Finite(1)).unwrap_or(BoundValue::NegInf);
            if self.is_non_positive() {
                Some(Self { min: self.min.max(cap), max: BoundValue::Finite(0) })
            } else {
                Some(Self { min: cap, max: BoundValue::Finite(0) })
            }
        } else {
            None
        }
    }

    /// `[min(a0, b0), min(a1, b1)]`
    pub fn min(&self, other: &Self) -> Self {
        Self { min: self.min.min(other.min), max: self.max.min(other.max) }
    }

    /// `[max(a0, b0), max(a1, b1)]`
    pub fn max(&self, other: &Self) -> Self {
        Self { min: self.min.max(other.min), max: self.max.max(other.max) }
    }

    /// Arithmetic right shift by a non-negative amount. Returns [`None`] if the shift amount may
    /// be negative.
    pub fn shift_right(&self, amount: &Self) -> Option<Self> {
        if !amount.is_non_negative() {
            return None;
        }
        // shifting by 63 or more behaves like shifting by 62 followed by a shift to 0 / -1
        let clamp = |end: BoundValue| match end {
            BoundValue::Finite(value) => value.min(63) as u32,
            _ => 63,
        };
        let shift = |value: BoundValue, by: u32| match value {
            BoundValue::Finite(value) => BoundValue::Finite(value >> by),
            inf => inf,
        };
        let (lo, hi) = (clamp(amount.min), clamp(amount.max));
        let corners = [
            shift(self.min, lo), shift(self.min, hi),
            shift(self.max, lo), shift(self.max, hi),
        ];
        Some(Self::from_values(&corners))
    }

    /// Left shift by an amount in `[0, 62]`, as multiplication by a power of two. Returns
    /// [`None`] for other shift amounts.
    pub fn shift_left(&self, amount: &Self) -> Option<Self> {
        let (lo, hi) = (amount.min.finite()?, amount.max.finite()?);
        if lo < 0 || hi > 62 {
            return None;
        }
        Some(self.mul(&Self::new(1 << lo, 1 << hi)))
    }

    fn from_values(values: &[BoundValue]) -> Self {
        let min = values.iter().copied().min().unwrap_or(BoundValue::NegInf);
        let max = values.iter().copied().max().unwrap_or(BoundValue::PosInf);
        Self { min, max }
    }

    fn from_corners(a: &Self, b: &Self, f: impl Fn(BoundValue, BoundValue) -> BoundValue) -> Self {
        Self::from_values(&[f(a.min, b.min), f(a.min, b.max), f(a.max, b.min), f(a.max, b.max)])
    }
}

impl PartialOrd for ConstIntBound {
    /// Bounds are ordered by inclusion.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.is_subset_of(other), other.is_subset_of(self)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}

impl fmt::Display for ConstIntBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn saturates_to_infinity() {
        let big = ConstIntBound::new(NEG_INF, POS_INF);
        assert!(big.is_everything());
        let near = ConstIntBound::new(i64::MAX - 10, i64::MAX - 1);
        let sum = near.add(&ConstIntBound::point(100));
        assert_eq!(sum.max_bound(), BoundValue::PosInf);
        assert_eq!(sum.max_value(), POS_INF);
        assert_eq!(ConstIntBound::for_dtype(DataType::int64()), ConstIntBound::everything());
    }

    #[test]
    fn corner_products() {
        let a = ConstIntBound::new(-2, 4);
        let b = ConstIntBound::new(4, 10);
        assert_eq!(a.mul(&b), ConstIntBound::new(-20, 40));
        let unbounded = ConstIntBound::non_negative();
        assert_eq!(unbounded.mul(&ConstIntBound::new(-3, -1)), ConstIntBound::from_ends(BoundValue::NegInf, BoundValue::Finite(0)));
        assert_eq!(unbounded.mul(&ConstIntBound::point(0)), ConstIntBound::point(0));
    }

    #[test]
    fn division_rounding() {
        let a = ConstIntBound::new(-7, 7);
        let b = ConstIntBound::point(2);
        assert_eq!(a.div(&b, false), Some(ConstIntBound::new(-3, 3)));
        assert_eq!(a.div(&b, true), Some(ConstIntBound::new(-4, 3)));
        assert_eq!(a.div(&ConstIntBound::new(-1, 1), true), None);
        let to_inf = ConstIntBound::from_ends(BoundValue::Finite(1), BoundValue::PosInf);
        assert_eq!(ConstIntBound::new(-5, 5).div(&to_inf, true), Some(ConstIntBound::new(-5, 5)));
    }

    #[test]
    fn remainders() {
        let divisor = ConstIntBound::new(1, 8);
        assert_eq!(ConstIntBound::new(0, 3).truncmod(&divisor), Some(ConstIntBound::new(0, 3)));
        assert_eq!(ConstIntBound::new(-20, 20).truncmod(&divisor), Some(ConstIntBound::new(-7, 7)));
        assert_eq!(ConstIntBound::new(-20, 20).floormod(&divisor), Some(ConstIntBound::new(0, 7)));
        assert_eq!(
            ConstIntBound::new(-20, 20).floormod(&ConstIntBound::point(-4)),
            Some(ConstIntBound::new(-3, 0)),
        );
        assert_eq!(ConstIntBound::new(-20, 20).floormod(&ConstIntBound::new(0, 4)), None);
    }

    #[test]
    fn shifts() {
        let a = ConstIntBound::new(-16, 16);
        assert_eq!(a.shift_right(&ConstIntBound::new(1, 2)), Some(ConstIntBound::new(-8, 8)));
        assert_eq!(a.shift_left(&ConstIntBound::point(3)), Some(ConstIntBound::new(-128, 128)));
        assert_eq!(a.shift_left(&ConstIntBound::new(0, 63)), None);
    }

    #[test]
    fn inclusion_order() {
        let small = ConstIntBound::new(0, 3);
        let large = ConstIntBound::new(-1, 5);
        assert!(small < large);
        assert_eq!(small.partial_cmp(&ConstIntBound::new(4, 6)), None);
        assert_eq!(small.union(&ConstIntBound::new(4, 6)), ConstIntBound::new(0, 6));
        assert_eq!(small.intersect(&large), small);
    }
}
