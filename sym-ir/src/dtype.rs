//! Data types carried by every expression node.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of scalar value a [`DataType`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TypeCode {
    /// Signed two's complement integer.
    Int,

    /// Unsigned integer.
    UInt,

    /// IEEE floating-point number.
    Float,

    /// Brain floating-point number.
    BFloat,

    /// Boolean.
    Bool,
}

/// The type of an expression: a [`TypeCode`], a bit width, and a number of vector lanes.
///
/// Scalars have exactly one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DataType {
    /// The kind of scalar value.
    pub code: TypeCode,

    /// The number of bits of one lane.
    pub bits: u8,

    /// The number of lanes.
    pub lanes: u16,
}

impl DataType {
    /// Creates a scalar data type.
    pub const fn new(code: TypeCode, bits: u8) -> Self {
        Self { code, bits, lanes: 1 }
    }

    /// A signed integer type with the given number of bits.
    pub const fn int(bits: u8) -> Self {
        Self::new(TypeCode::Int, bits)
    }

    /// An unsigned integer type with the given number of bits.
    pub const fn uint(bits: u8) -> Self {
        Self::new(TypeCode::UInt, bits)
    }

    /// A floating-point type with the given number of bits.
    pub const fn float(bits: u8) -> Self {
        Self::new(TypeCode::Float, bits)
    }

    /// A brain floating-point type with the given number of bits.
    pub const fn bfloat(bits: u8) -> Self {
        Self::new(TypeCode::BFloat, bits)
    }

    /// The boolean type.
    pub const fn bool() -> Self {
        Self::new(TypeCode::Bool, 1)
    }

    /// `int32`, the usual index type.
    pub const fn int32() -> Self {
        Self::int(32)
    }

    /// `int64`.
    pub const fn int64() -> Self {
        Self::int(64)
    }

    /// Returns the same type with the given number of lanes.
    pub const fn with_lanes(self, lanes: u16) -> Self {
        Self { lanes, ..self }
    }

    /// Returns the scalar type of a single lane.
    pub const fn element_of(self) -> Self {
        self.with_lanes(1)
    }

    pub fn is_int(self) -> bool {
        self.code == TypeCode::Int
    }

    pub fn is_uint(self) -> bool {
        self.code == TypeCode::UInt
    }

    /// Returns true for signed and unsigned integers.
    pub fn is_integer(self) -> bool {
        matches!(self.code, TypeCode::Int | TypeCode::UInt)
    }

    /// Returns true for both floating-point codes.
    pub fn is_float(self) -> bool {
        matches!(self.code, TypeCode::Float | TypeCode::BFloat)
    }

    pub fn is_bool(self) -> bool {
        self.code == TypeCode::Bool
    }

    pub fn is_scalar(self) -> bool {
        self.lanes == 1
    }

    pub fn is_vector(self) -> bool {
        self.lanes > 1
    }

    /// The smallest value representable by one lane of this type, if it is an integer or boolean
    /// type.
    pub fn min_int(self) -> Option<i64> {
        match self.code {
            TypeCode::Int if self.bits >= 64 => Some(i64::MIN),
            TypeCode::Int => Some(-(1i64 << (self.bits - 1))),
            TypeCode::UInt | TypeCode::Bool => Some(0),
            TypeCode::Float | TypeCode::BFloat => None,
        }
    }

    /// The largest value representable by one lane of this type, if it is an integer or boolean
    /// type. Unsigned types wider than 63 bits are capped at [`i64::MAX`].
    pub fn max_int(self) -> Option<i64> {
        match self.code {
            TypeCode::Int if self.bits >= 64 => Some(i64::MAX),
            TypeCode::Int => Some((1i64 << (self.bits - 1)) - 1),
            TypeCode::UInt if self.bits >= 63 => Some(i64::MAX),
            TypeCode::UInt => Some((1i64 << self.bits) - 1),
            TypeCode::Bool => Some(1),
            TypeCode::Float | TypeCode::BFloat => None,
        }
    }

    /// Returns true if `value` is representable by one lane of this integer type.
    pub fn fits(self, value: i64) -> bool {
        match (self.min_int(), self.max_int()) {
            (Some(min), Some(max)) => min <= value && value <= max,
            _ => self.is_float(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            TypeCode::Int => write!(f, "int{}", self.bits)?,
            TypeCode::UInt => write!(f, "uint{}", self.bits)?,
            TypeCode::Float => write!(f, "float{}", self.bits)?,
            TypeCode::BFloat => write!(f, "bfloat{}", self.bits)?,
            TypeCode::Bool => write!(f, "bool")?,
        }
        if self.lanes > 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_ranges() {
        assert_eq!(DataType::int(8).min_int(), Some(-128));
        assert_eq!(DataType::int(8).max_int(), Some(127));
        assert_eq!(DataType::uint(32).max_int(), Some(4294967295));
        assert_eq!(DataType::int64().min_int(), Some(i64::MIN));
        assert_eq!(DataType::uint(64).max_int(), Some(i64::MAX));
        assert_eq!(DataType::float(32).max_int(), None);
        assert!(DataType::uint(8).fits(255));
        assert!(!DataType::uint(8).fits(-1));
    }

    #[test]
    fn display() {
        assert_eq!(DataType::int32().to_string(), "int32");
        assert_eq!(DataType::float(16).with_lanes(4).to_string(), "float16x4");
        assert_eq!(DataType::bool().with_lanes(8).element_of().to_string(), "bool");
    }
}
