//! A reference evaluator for expressions.
//!
//! The evaluator computes the exact value of an expression under an assignment of its variables.
//! It exists so that analysis results can be checked against concrete values: a bound is sound
//! if every evaluated value lies within it, and a simplification is sound if it evaluates to the
//! same value as its input.
//!
//! Evaluation returns [`None`] whenever the result is undefined: an unbound variable, division by
//! zero, an integer result that does not fit its data type, or a call to an opaque function.

use crate::{
    dtype::DataType,
    expr::{Expr, ExprKind, Var},
    op::{BinaryOp, CallOp},
};
use std::collections::HashMap;

/// The value of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),

    /// One value per lane.
    Vector(Vec<Value>),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            Value::Bool(value) => Some(*value as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the lanes of the value; a scalar has one lane.
    fn into_lanes(self, lanes: u16) -> Vec<Value> {
        match self {
            Value::Vector(values) => values,
            scalar => vec![scalar; lanes as usize],
        }
    }

    fn from_lanes(mut values: Vec<Value>) -> Value {
        if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Vector(values)
        }
    }
}

/// Evaluates the expression with the given variable assignment.
pub fn eval(expr: &Expr, env: &HashMap<Var, Value>) -> Option<Value> {
    Evaluator { env, locals: Vec::new() }.eval(expr)
}

struct Evaluator<'a> {
    env: &'a HashMap<Var, Value>,

    /// Variables bound by enclosing `let` expressions, innermost last.
    locals: Vec<(Var, Value)>,
}

impl Evaluator<'_> {
    fn lookup(&self, var: &Var) -> Option<Value> {
        self.locals.iter()
            .rev()
            .find(|(local, _)| local == var)
            .map(|(_, value)| value.clone())
            .or_else(|| self.env.get(var).cloned())
    }

    fn eval(&mut self, expr: &Expr) -> Option<Value> {
        let dtype = expr.dtype();
        let lanes = expr.lanes();
        match expr.kind() {
            ExprKind::Var(var) => self.lookup(var),
            ExprKind::IntImm(value) => Some(Value::Int(*value)),
            ExprKind::FloatImm(value) => Some(Value::Float(value.0)),
            ExprKind::BoolImm(value) => Some(Value::Bool(*value)),
            ExprKind::Cast(value) => {
                let values = self.eval(value)?.into_lanes(lanes);
                let cast = values.into_iter()
                    .map(|value| cast_scalar(value, dtype.element_of()))
                    .collect::<Option<Vec<_>>>()?;
                Some(Value::from_lanes(cast))
            },
            ExprKind::Binary(op, lhs, rhs) => {
                let element = lhs.dtype().element_of();
                let lhs = self.eval(lhs)?.into_lanes(lanes);
                let rhs = self.eval(rhs)?.into_lanes(lanes);
                let values = lhs.into_iter()
                    .zip(rhs)
                    .map(|(lhs, rhs)| binary_scalar(*op, lhs, rhs, element))
                    .collect::<Option<Vec<_>>>()?;
                Some(Value::from_lanes(values))
            },
            ExprKind::Not(value) => {
                let values = self.eval(value)?.into_lanes(lanes);
                let negated = values.into_iter()
                    .map(|value| value.as_bool().map(|b| Value::Bool(!b)))
                    .collect::<Option<Vec<_>>>()?;
                Some(Value::from_lanes(negated))
            },
            ExprKind::Select(cond, t, f) => {
                let cond = self.eval(cond)?.into_lanes(lanes);
                let t = self.eval(t)?.into_lanes(lanes);
                let f = self.eval(f)?.into_lanes(lanes);
                let values = cond.into_iter()
                    .zip(t.into_iter().zip(f))
                    .map(|(cond, (t, f))| Some(if cond.as_bool()? { t } else { f }))
                    .collect::<Option<Vec<_>>>()?;
                Some(Value::from_lanes(values))
            },
            ExprKind::Ramp { base, stride, lanes } => {
                let base = self.eval(base)?.as_int()?;
                let stride = self.eval(stride)?.as_int()?;
                let values = (0..*lanes as i128)
                    .map(|i| fit(base as i128 + i * stride as i128, dtype).map(Value::Int))
                    .collect::<Option<Vec<_>>>()?;
                Some(Value::Vector(values))
            },
            ExprKind::Broadcast { value, lanes } => {
                let value = self.eval(value)?;
                Some(Value::Vector(vec![value; *lanes as usize]))
            },
            ExprKind::Shuffle { vectors, indices } => {
                let mut all = Vec::new();
                for vector in vectors {
                    let lanes = vector.lanes();
                    all.extend(self.eval(vector)?.into_lanes(lanes));
                }
                let values = indices.iter()
                    .map(|&index| all.get(index as usize).cloned())
                    .collect::<Option<Vec<_>>>()?;
                Some(Value::from_lanes(values))
            },
            ExprKind::Let { var, value, body } => {
                let value = self.eval(value)?;
                self.locals.push((var.clone(), value));
                let result = self.eval(body);
                self.locals.pop();
                result
            },
            ExprKind::Call { op, args } => self.eval_call(op, args, dtype),
        }
    }

    fn eval_call(&mut self, op: &CallOp, args: &[Expr], dtype: DataType) -> Option<Value> {
        if !dtype.is_scalar() {
            return None;
        }
        match op {
            CallOp::IfThenElse => {
                let [cond, then, otherwise] = args else { return None };
                if self.eval(cond)?.as_bool()? {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            },
            CallOp::BitwiseNot => {
                let [value] = args else { return None };
                let value = self.eval(value)?.as_int()?;
                fit(!(value as i128), dtype).map(Value::Int)
            },
            CallOp::Opaque(_) => None,
            _ => {
                let [lhs, rhs] = args else { return None };
                let a = self.eval(lhs)?.as_int()? as i128;
                let b = self.eval(rhs)?.as_int()? as i128;
                let result = match op {
                    CallOp::ShiftLeft if (0..dtype.bits as i128).contains(&b) => a << b,
                    CallOp::ShiftRight if (0..dtype.bits as i128).contains(&b) => a >> b,
                    CallOp::BitwiseAnd => a & b,
                    CallOp::BitwiseOr => a | b,
                    CallOp::BitwiseXor => a ^ b,
                    _ => return None,
                };
                fit(result, dtype).map(Value::Int)
            },
        }
    }
}

/// Returns the value if it is representable in the integer type.
fn fit(value: i128, dtype: DataType) -> Option<i64> {
    let element = dtype.element_of();
    let value = i64::try_from(value).ok()?;
    element.fits(value).then_some(value)
}

/// Division rounding toward negative infinity.
pub fn floor_div(a: i128, b: i128) -> Option<i128> {
    if b == 0 {
        return None;
    }
    let q = a / b;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

/// Remainder of [`floor_div`]; takes the sign of the divisor.
pub fn floor_mod(a: i128, b: i128) -> Option<i128> {
    Some(a - b * floor_div(a, b)?)
}

fn binary_scalar(op: BinaryOp, lhs: Value, rhs: Value, dtype: DataType) -> Option<Value> {
    match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => Some(Value::Bool(match op {
            BinaryOp::And => a && b,
            BinaryOp::Or => a || b,
            BinaryOp::Eq => a == b,
            BinaryOp::Ne => a != b,
            _ => return binary_int(op, a as i128, b as i128, dtype),
        })),
        (Value::Float(a), Value::Float(b)) => Some(match op {
            BinaryOp::Add => Value::Float(a + b),
            BinaryOp::Sub => Value::Float(a - b),
            BinaryOp::Mul => Value::Float(a * b),
            BinaryOp::Div => Value::Float(a / b),
            BinaryOp::FloorDiv => Value::Float((a / b).floor()),
            BinaryOp::Min => Value::Float(a.min(b)),
            BinaryOp::Max => Value::Float(a.max(b)),
            BinaryOp::Eq => Value::Bool(a == b),
            BinaryOp::Ne => Value::Bool(a != b),
            BinaryOp::Lt => Value::Bool(a < b),
            BinaryOp::Le => Value::Bool(a <= b),
            BinaryOp::Gt => Value::Bool(a > b),
            BinaryOp::Ge => Value::Bool(a >= b),
            _ => return None,
        }),
        (Value::Int(a), Value::Int(b)) => binary_int(op, a as i128, b as i128, dtype),
        _ => None,
    }
}

fn binary_int(op: BinaryOp, a: i128, b: i128, dtype: DataType) -> Option<Value> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a.checked_div(b)?,
        BinaryOp::Mod => a.checked_rem(b)?,
        BinaryOp::FloorDiv => floor_div(a, b)?,
        BinaryOp::FloorMod => floor_mod(a, b)?,
        BinaryOp::Min => a.min(b),
        BinaryOp::Max => a.max(b),
        BinaryOp::Eq => return Some(Value::Bool(a == b)),
        BinaryOp::Ne => return Some(Value::Bool(a != b)),
        BinaryOp::Lt => return Some(Value::Bool(a < b)),
        BinaryOp::Le => return Some(Value::Bool(a <= b)),
        BinaryOp::Gt => return Some(Value::Bool(a > b)),
        BinaryOp::Ge => return Some(Value::Bool(a >= b)),
        BinaryOp::And | BinaryOp::Or => return None,
    };
    fit(value, dtype).map(Value::Int)
}

/// Converts a scalar to the given type. Integer conversions wrap around like two's complement
/// truncation; float to integer conversions that do not fit are undefined.
fn cast_scalar(value: Value, dtype: DataType) -> Option<Value> {
    if dtype.is_bool() {
        return Some(Value::Bool(match value {
            Value::Bool(b) => b,
            Value::Int(i) => i != 0,
            Value::Float(f) => f != 0.0,
            Value::Vector(_) => return None,
        }));
    }
    if dtype.is_float() {
        return Some(Value::Float(match value {
            Value::Bool(b) => b as i64 as f64,
            Value::Int(i) => i as f64,
            Value::Float(f) => f,
            Value::Vector(_) => return None,
        }));
    }
    let int = match value {
        Value::Bool(b) => b as i128,
        Value::Int(i) => i as i128,
        Value::Float(f) if f.is_finite() => f.trunc() as i128,
        _ => return None,
    };
    if dtype.bits >= 64 {
        return fit(int, dtype).map(Value::Int);
    }
    let modulus = 1i128 << dtype.bits;
    let mut wrapped = int.rem_euclid(modulus);
    if dtype.is_int() && wrapped >= modulus / 2 {
        wrapped -= modulus;
    }
    fit(wrapped, dtype).map(Value::Int)
}

#[cfg(test)]
mod tests {
    use crate::build::*;
    use pretty_assertions::assert_eq;
    use super::*;

    fn env(pairs: &[(&Var, i64)]) -> HashMap<Var, Value> {
        pairs.iter().map(|(var, value)| ((*var).clone(), Value::Int(*value))).collect()
    }

    #[test]
    fn division_semantics() {
        let x = Var::int32("x");
        let env = env(&[(&x, -7)]);
        let eval_int = |expr: Expr| eval(&expr, &env).and_then(|v| v.as_int());
        assert_eq!(eval_int(truncdiv(x.expr(), 2)), Some(-3));
        assert_eq!(eval_int(truncmod(x.expr(), 2)), Some(-1));
        assert_eq!(eval_int(floordiv(x.expr(), 2)), Some(-4));
        assert_eq!(eval_int(floormod(x.expr(), 2)), Some(1));
        assert_eq!(eval_int(floormod(x.expr(), -2)), Some(-1));
        assert_eq!(eval_int(truncdiv(x.expr(), 0)), None);
    }

    #[test]
    fn overflow_is_undefined() {
        let x = Var::int32("x");
        let env = env(&[(&x, i32::MAX as i64)]);
        assert_eq!(eval(&(x.expr() + 1), &env), None);
        assert_eq!(
            eval(&cast(DataType::int(8), x.expr()), &env),
            Some(Value::Int(-1)),
        );
    }

    #[test]
    fn vectors_and_lets() {
        let x = Var::int32("x");
        let env = env(&[(&x, 3)]);
        let ramp = ramp(x.expr(), 2, 4) + broadcast(1, 4);
        assert_eq!(
            eval(&ramp, &env),
            Some(Value::Vector(vec![Value::Int(4), Value::Int(6), Value::Int(8), Value::Int(10)])),
        );

        let y = Var::int32("y");
        let expr = let_in(y.clone(), x.expr() * 2, y.expr() + x.expr());
        assert_eq!(eval(&expr, &env), Some(Value::Int(9)));
        assert_eq!(eval(&y.expr(), &env), None);
    }
}
