//! Type-checked construction of expressions.
//!
//! [`Expr::try_binary`] and the other `try_*` constructors check the operand data types and
//! return an [`Error`] describing the mismatch. The free functions in this module ([`add`],
//! [`floordiv`], [`lt`], ...) and the operator overloads on [`Expr`] panic with the rendered error
//! instead; they are meant for building expressions that are well-typed by construction.
//!
//! Integer and floating-point constants adapt to the type of the other operand, so `x + 1` is
//! well-typed for an `int64` variable `x`, and `v * 2` broadcasts `2` for a vector `v`.

use crate::{
    dtype::DataType,
    error::{MismatchedLanes, MismatchedOperandTypes, NonBooleanOperand},
    expr::{Expr, ExprKind, FloatValue, Var},
    op::{BinaryOp, CallOp},
};
use std::{ops::{Add, Mul, Neg, Sub}, sync::Arc};
use sym_error::{Error, ErrorKind};

impl Expr {
    /// Creates a constant of the given type with the given value. Vector types produce a
    /// [`ExprKind::Broadcast`] of the scalar constant.
    pub fn make_const(dtype: DataType, value: i64) -> Expr {
        if dtype.is_vector() {
            let scalar = Expr::make_const(dtype.element_of(), value);
            return Expr::new(dtype, ExprKind::Broadcast { value: scalar, lanes: dtype.lanes });
        }
        let kind = if dtype.is_float() {
            ExprKind::FloatImm(FloatValue(value as f64))
        } else if dtype.is_bool() {
            ExprKind::BoolImm(value != 0)
        } else {
            ExprKind::IntImm(value)
        };
        Expr::new(dtype, kind)
    }

    /// Creates a floating-point constant of the given type.
    pub fn make_float(dtype: DataType, value: f64) -> Expr {
        if dtype.is_vector() {
            let scalar = Expr::make_float(dtype.element_of(), value);
            return Expr::new(dtype, ExprKind::Broadcast { value: scalar, lanes: dtype.lanes });
        }
        Expr::new(dtype, ExprKind::FloatImm(FloatValue(value)))
    }

    /// An `int32` constant.
    pub fn int32(value: i64) -> Expr {
        Expr::make_const(DataType::int32(), value)
    }

    /// An `int64` constant.
    pub fn int64(value: i64) -> Expr {
        Expr::make_const(DataType::int64(), value)
    }

    /// A boolean constant.
    pub fn bool(value: bool) -> Expr {
        Expr::new(DataType::bool(), ExprKind::BoolImm(value))
    }

    /// If the expression is a constant (or a broadcast constant) that can be represented exactly
    /// in `dtype`, returns the constant retyped to `dtype`.
    pub fn retype_const(&self, dtype: DataType) -> Option<Expr> {
        match self.kind() {
            ExprKind::IntImm(value) if dtype.is_float() || (dtype.is_integer() && dtype.fits(*value)) => {
                Some(Expr::make_const(dtype, *value))
            },
            ExprKind::FloatImm(value) if dtype.is_float() => Some(Expr::make_float(dtype, value.0)),
            ExprKind::Broadcast { value, .. } if value.is_const() => value.retype_const(dtype),
            _ => None,
        }
    }

    /// Builds a binary operation, checking that both operands have the same data type.
    ///
    /// A constant operand is retyped to the type of the other operand if it fits.
    pub fn try_binary(
        op: BinaryOp,
        lhs: impl Into<Expr>,
        rhs: impl Into<Expr>,
    ) -> Result<Expr, Error> {
        let (lhs, rhs) = unify_operands(lhs.into(), rhs.into());
        let form = Form::of(op);

        if op.is_logical() {
            for operand in [&lhs, &rhs] {
                if !operand.dtype().is_bool() {
                    return Err(operand_error(form, &lhs, &rhs, NonBooleanOperand {
                        node: form.name().to_string(),
                        found: operand.dtype(),
                    }));
                }
            }
        }

        check_same_type(form, &lhs, &rhs)?;

        let dtype = if op.is_comparison() {
            DataType::bool().with_lanes(lhs.lanes())
        } else {
            lhs.dtype()
        };
        Ok(Expr::new(dtype, ExprKind::Binary(op, lhs, rhs)))
    }

    /// Builds a binary operation, panicking if the operand types do not match.
    pub fn binary(op: BinaryOp, lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Expr {
        Expr::try_binary(op, lhs, rhs).unwrap_or_else(|err| panic!("{}", err))
    }

    /// Builds a logical negation of a boolean expression.
    pub fn try_not(value: impl Into<Expr>) -> Result<Expr, Error> {
        let value = value.into();
        if !value.dtype().is_bool() {
            let src = value.to_string();
            let span = 0..src.len();
            return Err(Error::with_source(src, vec![span], NonBooleanOperand {
                node: "not".to_string(),
                found: value.dtype(),
            }));
        }
        Ok(Expr::new(value.dtype(), ExprKind::Not(value)))
    }

    /// Builds `select(cond, t, f)`.
    pub fn try_select(
        cond: impl Into<Expr>,
        t: impl Into<Expr>,
        f: impl Into<Expr>,
    ) -> Result<Expr, Error> {
        let cond = cond.into();
        let (t, f) = unify_operands(t.into(), f.into());
        if !cond.dtype().is_bool() {
            let src = cond.to_string();
            let span = 0..src.len();
            return Err(Error::with_source(src, vec![span], NonBooleanOperand {
                node: "select".to_string(),
                found: cond.dtype(),
            }));
        }
        check_same_type(Form::Call("select"), &t, &f)?;
        if cond.lanes() != t.lanes() && cond.lanes() != 1 {
            return Err(Error::new(MismatchedLanes {
                node: "select".to_string(),
                lhs: cond.lanes(),
                rhs: t.lanes(),
            }));
        }
        Ok(Expr::new(t.dtype(), ExprKind::Select(cond, t, f)))
    }

    /// Builds `ramp(base, stride, lanes)`.
    pub fn try_ramp(
        base: impl Into<Expr>,
        stride: impl Into<Expr>,
        lanes: u16,
    ) -> Result<Expr, Error> {
        let (base, stride) = unify_operands(base.into(), stride.into());
        check_same_type(Form::Call("ramp"), &base, &stride)?;
        if base.dtype().is_vector() {
            return Err(Error::new(MismatchedLanes {
                node: "ramp".to_string(),
                lhs: base.lanes(),
                rhs: 1,
            }));
        }
        let dtype = base.dtype().with_lanes(lanes);
        Ok(Expr::new(dtype, ExprKind::Ramp { base, stride, lanes }))
    }
}

/// Retypes a constant operand to the type of the other operand, preferring to keep the type of
/// the left-hand side when both are constants.
fn unify_operands(lhs: Expr, rhs: Expr) -> (Expr, Expr) {
    if lhs.dtype() == rhs.dtype() {
        return (lhs, rhs);
    }
    let lhs_const = lhs.is_const() || matches!(lhs.kind(), ExprKind::Broadcast { value, .. } if value.is_const());
    if let Some(retyped) = rhs.retype_const(lhs.dtype()) {
        if !lhs_const || rhs.dtype() == DataType::int32() {
            return (lhs, retyped);
        }
    }
    if let Some(retyped) = lhs.retype_const(rhs.dtype()) {
        return (retyped, rhs);
    }
    (lhs, rhs)
}

/// The printed form of a node: an infix symbol, or a call name.
#[derive(Clone, Copy)]
enum Form<'a> {
    Infix(&'a str),
    Call(&'a str),
}

impl<'a> Form<'a> {
    fn of(op: BinaryOp) -> Self {
        match op.symbol() {
            Some(symbol) => Form::Infix(symbol),
            None => Form::Call(op.name()),
        }
    }

    fn name(self) -> &'a str {
        match self {
            Form::Infix(name) | Form::Call(name) => name,
        }
    }
}

/// Renders the node with both operands and returns the text with the spans of the operands.
fn render_operands(form: Form, lhs: &Expr, rhs: &Expr) -> (String, Vec<std::ops::Range<usize>>) {
    let lhs_src = lhs.to_string();
    let rhs_src = rhs.to_string();
    let (src, lhs_start, rhs_start) = match form {
        Form::Infix(symbol) => (
            format!("{} {} {}", lhs_src, symbol, rhs_src),
            0,
            lhs_src.len() + symbol.len() + 2,
        ),
        Form::Call(name) => (
            format!("{}({}, {})", name, lhs_src, rhs_src),
            name.len() + 1,
            name.len() + lhs_src.len() + 3,
        ),
    };
    let spans = vec![
        lhs_start..lhs_start + lhs_src.len(),
        rhs_start..rhs_start + rhs_src.len(),
    ];
    (src, spans)
}

fn operand_error(form: Form, lhs: &Expr, rhs: &Expr, kind: impl ErrorKind + 'static) -> Error {
    let (src, spans) = render_operands(form, lhs, rhs);
    Error::with_source(src, spans, kind)
}

fn check_same_type(form: Form, lhs: &Expr, rhs: &Expr) -> Result<(), Error> {
    if lhs.dtype() == rhs.dtype() {
        return Ok(());
    }
    if lhs.dtype().element_of() == rhs.dtype().element_of() {
        return Err(operand_error(form, lhs, rhs, MismatchedLanes {
            node: form.name().to_string(),
            lhs: lhs.lanes(),
            rhs: rhs.lanes(),
        }));
    }
    Err(operand_error(form, lhs, rhs, MismatchedOperandTypes {
        op: form.name().to_string(),
        lhs: lhs.dtype(),
        rhs: rhs.dtype(),
    }))
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::int32(value as i64)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        if DataType::int32().fits(value) {
            Expr::int32(value)
        } else {
            Expr::int64(value)
        }
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::bool(value)
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

/// Implements an arithmetic operator for `Expr` and `&Expr` in terms of [`Expr::binary`].
macro_rules! impl_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<T: Into<Expr>> $trait<T> for Expr {
            type Output = Expr;

            fn $method(self, rhs: T) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl<T: Into<Expr>> $trait<T> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: T) -> Expr {
                Expr::binary($op, self.clone(), rhs)
            }
        }
    };
}

impl_op!(Add, add, BinaryOp::Add);
impl_op!(Sub, sub, BinaryOp::Sub);
impl_op!(Mul, mul, BinaryOp::Mul);

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        let zero = Expr::make_const(self.dtype(), 0);
        Expr::binary(BinaryOp::Sub, zero, self)
    }
}

macro_rules! binary_fns {
    ($($(#[$meta:meta])* $name:ident => $op:expr),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Expr {
                Expr::binary($op, lhs, rhs)
            }
        )*
    };
}

binary_fns! {
    /// `lhs + rhs`
    add => BinaryOp::Add,

    /// `lhs - rhs`
    sub => BinaryOp::Sub,

    /// `lhs * rhs`
    mul => BinaryOp::Mul,

    /// Division rounding toward zero.
    truncdiv => BinaryOp::Div,

    /// Remainder of [`truncdiv`].
    truncmod => BinaryOp::Mod,

    /// Division rounding toward negative infinity.
    floordiv => BinaryOp::FloorDiv,

    /// Remainder of [`floordiv`].
    floormod => BinaryOp::FloorMod,

    min => BinaryOp::Min,
    max => BinaryOp::Max,
    eq => BinaryOp::Eq,
    ne => BinaryOp::Ne,
    lt => BinaryOp::Lt,
    le => BinaryOp::Le,
    gt => BinaryOp::Gt,
    ge => BinaryOp::Ge,
    and => BinaryOp::And,
    or => BinaryOp::Or,
}

/// `!value`
pub fn not(value: impl Into<Expr>) -> Expr {
    Expr::try_not(value).unwrap_or_else(|err| panic!("{}", err))
}

/// `select(cond, t, f)`
pub fn select(cond: impl Into<Expr>, t: impl Into<Expr>, f: impl Into<Expr>) -> Expr {
    Expr::try_select(cond, t, f).unwrap_or_else(|err| panic!("{}", err))
}

/// Converts `value` to `dtype`, keeping the lane count of `value`.
pub fn cast(dtype: DataType, value: impl Into<Expr>) -> Expr {
    let value = value.into();
    let dtype = dtype.with_lanes(value.lanes());
    Expr::new(dtype, ExprKind::Cast(value))
}

/// `ramp(base, stride, lanes)`
pub fn ramp(base: impl Into<Expr>, stride: impl Into<Expr>, lanes: u16) -> Expr {
    Expr::try_ramp(base, stride, lanes).unwrap_or_else(|err| panic!("{}", err))
}

/// `broadcast(value, lanes)`
pub fn broadcast(value: impl Into<Expr>, lanes: u16) -> Expr {
    let value = value.into();
    let dtype = value.dtype().with_lanes(lanes);
    Expr::new(dtype, ExprKind::Broadcast { value, lanes })
}

/// Picks `indices` out of the concatenated lanes of `vectors`.
pub fn shuffle(vectors: Vec<Expr>, indices: Vec<u32>) -> Expr {
    let element = vectors.first()
        .map(|vector| vector.dtype().element_of())
        .unwrap_or(DataType::int32());
    let lanes = u16::try_from(indices.len()).unwrap_or(u16::MAX);
    Expr::new(element.with_lanes(lanes), ExprKind::Shuffle { vectors, indices })
}

/// `let var = value in body`
pub fn let_in(var: Var, value: impl Into<Expr>, body: impl Into<Expr>) -> Expr {
    let body = body.into();
    Expr::new(body.dtype(), ExprKind::Let { var, value: value.into(), body })
}

/// A call to a builtin operation. The result type follows the operand type (the first value
/// argument for bitwise operations, the `then` branch for [`CallOp::IfThenElse`]).
///
/// Panics for [`CallOp::Opaque`]; use [`call_opaque`] instead.
pub fn call(op: CallOp, args: Vec<Expr>) -> Expr {
    let typed_arg = match op {
        CallOp::IfThenElse => args.get(1),
        CallOp::Opaque(_) => panic!("opaque calls need an explicit result type"),
        _ => args.first(),
    };
    let dtype = typed_arg.map(Expr::dtype).unwrap_or(DataType::int32());
    Expr::new(dtype, ExprKind::Call { op, args })
}

/// A call to an opaque, pure function the analyzers know nothing about.
pub fn call_opaque(name: impl Into<Arc<str>>, dtype: DataType, args: Vec<Expr>) -> Expr {
    Expr::new(dtype, ExprKind::Call { op: CallOp::Opaque(name.into()), args })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn constants_adapt_to_operand() {
        let x = Var::new("x", DataType::int64()).expr();
        let sum = x + 1;
        assert_eq!(sum.dtype(), DataType::int64());
        let (_, _, rhs) = sum.as_binary().unwrap();
        assert_eq!(rhs.dtype(), DataType::int64());

        let v = Var::new("v", DataType::int32().with_lanes(4)).expr();
        let scaled = v * 2;
        assert_eq!(scaled.to_string(), "v * broadcast(2, 4)");
    }

    #[test]
    fn comparisons_are_boolean() {
        let x = Var::int32("x").expr();
        let cmp = lt(x, 3);
        assert_eq!(cmp.dtype(), DataType::bool());
    }

    #[test]
    fn mismatched_types() {
        let x = Var::int32("x").expr();
        let y = Var::new("y", DataType::float(32)).expr();
        let err = Expr::try_binary(BinaryOp::Add, x, y).unwrap_err();
        assert!(err.is::<MismatchedOperandTypes>());
        assert_eq!(err.src, "x + y");
        assert_eq!(err.spans, vec![0..1, 4..5]);
        assert_eq!(
            err.to_string(),
            "mismatched operand types for `+`: `int32` and `float32` (in `x + y`)",
        );
    }

    #[test]
    fn mismatched_lanes() {
        let v = Var::new("v", DataType::int32().with_lanes(4)).expr();
        let w = Var::new("w", DataType::int32().with_lanes(8)).expr();
        let err = Expr::try_binary(BinaryOp::Min, v, w).unwrap_err();
        let kind = err.downcast_ref::<MismatchedLanes>().unwrap();
        assert_eq!((kind.lhs, kind.rhs), (4, 8));
        assert_eq!(err.spans, vec![4..5, 7..8]);
    }

    #[test]
    fn logical_needs_booleans() {
        let x = Var::int32("x").expr();
        let err = Expr::try_binary(BinaryOp::And, x.clone(), lt(x, 1)).unwrap_err();
        assert!(err.is::<NonBooleanOperand>());
    }

    #[test]
    #[should_panic(expected = "mismatched operand types")]
    fn operator_panics_on_mismatch() {
        let x = Var::int32("x").expr();
        let y = Var::new("y", DataType::int64()).expr();
        let _ = x + y;
    }
}
