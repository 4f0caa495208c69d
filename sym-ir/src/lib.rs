//! The typed expression IR shared by the `sym-arith` analyzers.
//!
//! An expression is an immutable tree of [`Expr`] nodes. Every node carries a [`DataType`] and
//! one of the [`ExprKind`] variants: variables, constants, casts, binary operations,
//! vector ramps / broadcasts / shuffles, `let` bindings and calls. Expressions are built with the
//! type-checked constructors of the [`build`] module, and can be evaluated with [`eval()`].

pub mod build;
pub mod dtype;
pub mod error;
pub mod eval;
pub mod expr;
pub mod op;

pub use dtype::{DataType, TypeCode};
pub use eval::{eval, Value};
pub use expr::{Expr, ExprKind, ExprNode, FloatValue, Var};
pub use op::{BinaryOp, CallOp, OpClass, Precedence};
