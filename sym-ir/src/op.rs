//! Operator kinds, with a static table of their properties.
//!
//! Operators are identified by the [`BinaryOp`] and [`CallOp`] enums. Every property an analyzer
//! needs (printed name, precedence, whether it compares or combines booleans) is looked up in
//! [`BINARY_OPS`], a table indexed by the operator's discriminant that is built at compile time.

use std::{fmt, sync::Arc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The precedence of an operator when printed in infix form. A higher precedence binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// `let x = v in body`
    Let,

    /// `||`
    Or,

    /// `&&`
    And,

    /// `==`, `!=`, `<`, `<=`, `>`, `>=`
    Compare,

    /// `+`, `-`
    Term,

    /// `*`
    Factor,

    /// `!`, which binds tighter than every binary operator.
    Not,

    /// Literals, variables, and anything printed in call syntax.
    Primary,
}

/// The family an operator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    /// Produces a value of the operand type.
    Arithmetic,

    /// Produces a boolean from two values of the same type.
    Comparison,

    /// Produces a boolean from two booleans.
    Logical,
}

/// Static description of a [`BinaryOp`].
#[derive(Debug)]
pub struct OpInfo {
    /// The name used when the operator is printed in call syntax.
    pub name: &'static str,

    /// The infix symbol, if the operator is printed in infix form.
    pub symbol: Option<&'static str>,

    pub precedence: Precedence,
    pub class: OpClass,
    pub commutative: bool,
}

/// A binary operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,

    /// Division rounding toward zero.
    Div,

    /// Remainder of [`BinaryOp::Div`]; takes the sign of the dividend.
    Mod,

    /// Division rounding toward negative infinity.
    FloorDiv,

    /// Remainder of [`BinaryOp::FloorDiv`]; takes the sign of the divisor.
    FloorMod,

    Min,
    Max,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

const fn info(
    name: &'static str,
    symbol: Option<&'static str>,
    precedence: Precedence,
    class: OpClass,
    commutative: bool,
) -> OpInfo {
    OpInfo { name, symbol, precedence, class, commutative }
}

/// Properties of every [`BinaryOp`], indexed by discriminant.
pub const BINARY_OPS: [OpInfo; 17] = [
    info("add", Some("+"), Precedence::Term, OpClass::Arithmetic, true),
    info("sub", Some("-"), Precedence::Term, OpClass::Arithmetic, false),
    info("mul", Some("*"), Precedence::Factor, OpClass::Arithmetic, true),
    info("truncdiv", None, Precedence::Primary, OpClass::Arithmetic, false),
    info("truncmod", None, Precedence::Primary, OpClass::Arithmetic, false),
    info("floordiv", None, Precedence::Primary, OpClass::Arithmetic, false),
    info("floormod", None, Precedence::Primary, OpClass::Arithmetic, false),
    info("min", None, Precedence::Primary, OpClass::Arithmetic, true),
    info("max", None, Precedence::Primary, OpClass::Arithmetic, true),
    info("eq", Some("=="), Precedence::Compare, OpClass::Comparison, true),
    info("ne", Some("!="), Precedence::Compare, OpClass::Comparison, true),
    info("lt", Some("<"), Precedence::Compare, OpClass::Comparison, false),
    info("le", Some("<="), Precedence::Compare, OpClass::Comparison, false),
    info("gt", Some(">"), Precedence::Compare, OpClass::Comparison, false),
    info("ge", Some(">="), Precedence::Compare, OpClass::Comparison, false),
    info("and", Some("&&"), Precedence::And, OpClass::Logical, true),
    info("or", Some("||"), Precedence::Or, OpClass::Logical, true),
];

impl BinaryOp {
    /// Every binary operation, in discriminant order.
    pub const ALL: [BinaryOp; 17] = [
        Self::Add, Self::Sub, Self::Mul, Self::Div, Self::Mod, Self::FloorDiv, Self::FloorMod,
        Self::Min, Self::Max, Self::Eq, Self::Ne, Self::Lt, Self::Le, Self::Gt, Self::Ge,
        Self::And, Self::Or,
    ];

    /// Returns the static description of this operation.
    pub fn info(self) -> &'static OpInfo {
        &BINARY_OPS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn symbol(self) -> Option<&'static str> {
        self.info().symbol
    }

    pub fn precedence(self) -> Precedence {
        self.info().precedence
    }

    pub fn class(self) -> OpClass {
        self.info().class
    }

    pub fn is_commutative(self) -> bool {
        self.info().commutative
    }

    pub fn is_comparison(self) -> bool {
        self.class() == OpClass::Comparison
    }

    pub fn is_logical(self) -> bool {
        self.class() == OpClass::Logical
    }

    /// Returns true for the four division / remainder operations.
    pub fn is_div_mod(self) -> bool {
        matches!(self, Self::Div | Self::Mod | Self::FloorDiv | Self::FloorMod)
    }

    /// The comparison that holds when the operands are swapped: `a < b` iff `b > a`.
    pub fn flip(self) -> Option<Self> {
        Some(match self {
            Self::Eq => Self::Eq,
            Self::Ne => Self::Ne,
            Self::Lt => Self::Gt,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Ge => Self::Le,
            _ => return None,
        })
    }

    /// The comparison that holds exactly when this one does not: `!(a < b)` iff `a >= b`.
    pub fn negate(self) -> Option<Self> {
        Some(match self {
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
            Self::Lt => Self::Ge,
            Self::Le => Self::Gt,
            Self::Gt => Self::Le,
            Self::Ge => Self::Lt,
            _ => return None,
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol() {
            Some(symbol) => write!(f, "{}", symbol),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// The operation performed by a [`Call`](crate::ExprKind::Call) node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CallOp {
    ShiftLeft,
    ShiftRight,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseNot,

    /// `if_then_else(cond, a, b)`: like `Select`, but only the chosen branch is evaluated.
    IfThenElse,

    /// A call the analyzers know nothing about.
    Opaque(Arc<str>),
}

impl CallOp {
    pub fn name(&self) -> &str {
        match self {
            Self::ShiftLeft => "shift_left",
            Self::ShiftRight => "shift_right",
            Self::BitwiseAnd => "bitwise_and",
            Self::BitwiseOr => "bitwise_or",
            Self::BitwiseXor => "bitwise_xor",
            Self::BitwiseNot => "bitwise_not",
            Self::IfThenElse => "if_then_else",
            Self::Opaque(name) => name,
        }
    }

    /// The number of arguments the operation takes, if fixed.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Self::BitwiseNot => Some(1),
            Self::ShiftLeft | Self::ShiftRight
                | Self::BitwiseAnd | Self::BitwiseOr | Self::BitwiseXor => Some(2),
            Self::IfThenElse => Some(3),
            Self::Opaque(_) => None,
        }
    }
}

impl fmt::Display for CallOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
