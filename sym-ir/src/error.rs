//! Errors raised while building expressions.

use crate::dtype::DataType;
use sym_attrs::ErrorKind;
use sym_error::ErrorKind;

/// The operands of a binary operation have different data types.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("mismatched operand types for `{}`: `{}` and `{}`", op, lhs, rhs),
    labels = [format!("this is of type `{}`", lhs), format!("this is of type `{}`", rhs)],
    help = "insert a cast so that both operands have the same data type",
)]
pub struct MismatchedOperandTypes {
    /// The operation being built.
    pub op: String,

    /// The data type of the left-hand side.
    pub lhs: DataType,

    /// The data type of the right-hand side.
    pub rhs: DataType,
}

/// The operands of a node have the same scalar type, but a different number of vector lanes.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("mismatched lane counts for `{}`: {} and {}", node, lhs, rhs),
    labels = [format!("this has {} lane(s)", lhs), format!("this has {} lane(s)", rhs)],
    help = "broadcast the scalar operand to the vector width",
)]
pub struct MismatchedLanes {
    /// The kind of node being built.
    pub node: String,

    /// The lane count of the left-hand side.
    pub lhs: u16,

    /// The lane count of the right-hand side.
    pub rhs: u16,
}

/// An operand that must be boolean is not.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("`{}` expects boolean operands, found `{}`", node, found),
    labels = ["this operand"],
    help = "compare the value against zero to obtain a boolean",
)]
pub struct NonBooleanOperand {
    /// The kind of node being built.
    pub node: String,

    /// The data type of the offending operand.
    pub found: DataType,
}
