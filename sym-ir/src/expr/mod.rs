//! The typed expression tree analyzed by `sym-arith`.
//!
//! An [`Expr`] is a cheap, reference-counted handle to an immutable [`ExprNode`]. Building a new
//! expression never mutates an existing one, so expressions can be shared freely between
//! analyzers and threads.
//!
//! # Structural equality
//!
//! The [`PartialEq`], [`Eq`] and [`Hash`] implementations of [`Expr`] compare expressions
//! **structurally**: two expressions are equal if they have the same data type, the same kind of
//! node, and structurally equal children. Two handles pointing to the same node are always equal,
//! which is checked first.
//!
//! Structural equality is a subset of semantic equality. `x + 1` and `1 + x` are not structurally
//! equal, even though they always evaluate to the same value. Deciding semantic equality is the job
//! of the simplifiers, which rewrite both expressions into a common form first.
//!
//! Every node caches the hash of its contents when it is built, so hashing an expression is
//! constant-time and comparing two unequal expressions usually is too.
//!
//! # Ordering
//!
//! [`Ord`] is a deterministic structural total order. It carries no mathematical meaning; it is
//! used to sort the terms of a sum into a canonical order.

mod iter;

use crate::{dtype::DataType, op::{BinaryOp, CallOp, Precedence}};
use iter::ExprIter;
use std::{
    cmp::Ordering,
    collections::{hash_map::DefaultHasher, HashSet},
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A variable.
///
/// Variables are identified by their name and data type. A variable marked as `non_negative` is
/// a *shape variable*: it models the extent of some dimension, and is assumed to never be
/// negative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Var {
    /// The name of the variable.
    pub name: Arc<str>,

    /// The data type of the variable.
    pub dtype: DataType,

    /// Whether the variable is known to be non-negative.
    pub non_negative: bool,
}

impl Var {
    /// Creates a new variable.
    pub fn new(name: impl Into<Arc<str>>, dtype: DataType) -> Self {
        Self { name: name.into(), dtype, non_negative: false }
    }

    /// Creates a new shape variable, which is implicitly non-negative.
    pub fn shape(name: impl Into<Arc<str>>, dtype: DataType) -> Self {
        Self { name: name.into(), dtype, non_negative: true }
    }

    /// Creates a new `int32` variable.
    pub fn int32(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, DataType::int32())
    }

    /// Returns true if this is a shape variable.
    pub fn is_shape(&self) -> bool {
        self.non_negative
    }

    /// Wraps the variable in an expression.
    pub fn expr(&self) -> Expr {
        Expr::new(self.dtype, ExprKind::Var(self.clone()))
    }

    /// Returns a copy of the variable named `name_1`, `name_2`, and so on, with the first suffix
    /// for which `taken` returns false.
    pub fn fresh(&self, taken: impl Fn(&str) -> bool) -> Self {
        let mut suffix = 1;
        loop {
            let name = format!("{}_{}", self.name, suffix);
            if !taken(&name) {
                return Self { name: name.into(), ..self.clone() };
            }
            suffix += 1;
        }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<Var> for Expr {
    fn from(var: Var) -> Self {
        Expr::new(var.dtype, ExprKind::Var(var))
    }
}

impl From<&Var> for Expr {
    fn from(var: &Var) -> Self {
        var.expr()
    }
}

/// A floating-point constant.
///
/// [`Eq`] and [`Hash`] are implemented on the bit pattern of the value, and [`Ord`] uses
/// [`f64::total_cmp`], so that constants can participate in structural comparisons.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FloatValue(pub f64);

impl PartialEq for FloatValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatValue {}

impl Hash for FloatValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for FloatValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// The kind of an expression node, along with its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExprKind {
    /// A variable, such as `x`.
    Var(Var),

    /// An integer constant. Also used for unsigned types.
    IntImm(i64),

    /// A floating-point constant.
    FloatImm(FloatValue),

    /// A boolean constant.
    BoolImm(bool),

    /// Conversion of the operand to the node's data type.
    Cast(Expr),

    /// A binary operation.
    Binary(BinaryOp, Expr, Expr),

    /// Logical negation.
    Not(Expr),

    /// `select(cond, true_value, false_value)`. Both values are evaluated.
    Select(Expr, Expr, Expr),

    /// A vector whose lane `i` is `base + i * stride`.
    Ramp { base: Expr, stride: Expr, lanes: u16 },

    /// A vector with `value` in each of its lanes.
    Broadcast { value: Expr, lanes: u16 },

    /// A vector made by picking `indices` out of the concatenated lanes of `vectors`.
    Shuffle { vectors: Vec<Expr>, indices: Vec<u32> },

    /// `let var = value in body`.
    Let { var: Var, value: Expr, body: Expr },

    /// A call to a builtin or opaque function.
    Call { op: CallOp, args: Vec<Expr> },
}

/// The node an [`Expr`] points to.
#[derive(Debug)]
pub struct ExprNode {
    /// The data type the expression evaluates to.
    pub dtype: DataType,

    /// The kind of the node.
    pub kind: ExprKind,

    hash: u64,
}

/// An immutable, reference-counted expression.
///
/// For more information about this type, see the [module-level documentation](self).
#[derive(Clone)]
pub struct Expr(Arc<ExprNode>);

impl Expr {
    /// Creates an expression node. No type checking is done; see the builders in
    /// [`crate::build`] for checked construction.
    pub fn new(dtype: DataType, kind: ExprKind) -> Self {
        let mut hasher = DefaultHasher::new();
        dtype.hash(&mut hasher);
        kind.hash(&mut hasher);
        let hash = hasher.finish();
        Self(Arc::new(ExprNode { dtype, kind, hash }))
    }

    /// The data type the expression evaluates to.
    pub fn dtype(&self) -> DataType {
        self.0.dtype
    }

    /// The kind of the node.
    pub fn kind(&self) -> &ExprKind {
        &self.0.kind
    }

    /// The number of vector lanes of the expression.
    pub fn lanes(&self) -> u16 {
        self.0.dtype.lanes
    }

    /// Returns true if both handles point to the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// If the expression is an [`ExprKind::IntImm`], returns its value.
    pub fn as_int(&self) -> Option<i64> {
        match self.kind() {
            ExprKind::IntImm(value) => Some(*value),
            _ => None,
        }
    }

    /// If the expression is an [`ExprKind::FloatImm`], returns its value.
    pub fn as_float(&self) -> Option<f64> {
        match self.kind() {
            ExprKind::FloatImm(value) => Some(value.0),
            _ => None,
        }
    }

    /// If the expression is an [`ExprKind::BoolImm`], returns its value.
    pub fn as_bool(&self) -> Option<bool> {
        match self.kind() {
            ExprKind::BoolImm(value) => Some(*value),
            _ => None,
        }
    }

    /// If the expression is an [`ExprKind::Var`], returns the variable.
    pub fn as_var(&self) -> Option<&Var> {
        match self.kind() {
            ExprKind::Var(var) => Some(var),
            _ => None,
        }
    }

    /// If the expression is an [`ExprKind::Binary`], returns the operation and its operands.
    pub fn as_binary(&self) -> Option<(BinaryOp, &Expr, &Expr)> {
        match self.kind() {
            ExprKind::Binary(op, lhs, rhs) => Some((*op, lhs, rhs)),
            _ => None,
        }
    }

    /// If the expression is the given binary operation, returns its operands.
    pub fn as_op(&self, op: BinaryOp) -> Option<(&Expr, &Expr)> {
        match self.kind() {
            ExprKind::Binary(this, lhs, rhs) if *this == op => Some((lhs, rhs)),
            _ => None,
        }
    }

    /// Returns true if the expression is an integer, floating-point or boolean constant.
    pub fn is_const(&self) -> bool {
        matches!(self.kind(), ExprKind::IntImm(_) | ExprKind::FloatImm(_) | ExprKind::BoolImm(_))
    }

    /// Returns true if the expression is the integer constant `value`.
    pub fn is_int(&self, value: i64) -> bool {
        self.as_int() == Some(value)
    }

    /// Returns the direct children of the expression, from left to right.
    ///
    /// The variable bound by an [`ExprKind::Let`] is not an expression and is not included.
    pub fn children(&self) -> Vec<&Expr> {
        match self.kind() {
            ExprKind::Var(_) | ExprKind::IntImm(_) | ExprKind::FloatImm(_) | ExprKind::BoolImm(_) => Vec::new(),
            ExprKind::Cast(value) | ExprKind::Not(value) | ExprKind::Broadcast { value, .. } => vec![value],
            ExprKind::Binary(_, lhs, rhs) => vec![lhs, rhs],
            ExprKind::Select(cond, t, f) => vec![cond, t, f],
            ExprKind::Ramp { base, stride, .. } => vec![base, stride],
            ExprKind::Shuffle { vectors, .. } => vectors.iter().collect(),
            ExprKind::Let { value, body, .. } => vec![value, body],
            ExprKind::Call { args, .. } => args.iter().collect(),
        }
    }

    /// Rebuilds the expression with each child replaced by `f(child)`.
    ///
    /// If `f` returns every child unchanged, the original handle is returned and no node is
    /// allocated.
    pub fn map_children(&self, mut f: impl FnMut(&Expr) -> Expr) -> Expr {
        let mut changed = false;
        let mut map = |expr: &Expr| {
            let mapped = f(expr);
            if !mapped.ptr_eq(expr) {
                changed = true;
            }
            mapped
        };

        let kind = match self.kind() {
            ExprKind::Var(_) | ExprKind::IntImm(_) | ExprKind::FloatImm(_) | ExprKind::BoolImm(_) => {
                return self.clone();
            },
            ExprKind::Cast(value) => ExprKind::Cast(map(value)),
            ExprKind::Not(value) => ExprKind::Not(map(value)),
            ExprKind::Binary(op, lhs, rhs) => {
                let lhs = map(lhs);
                ExprKind::Binary(*op, lhs, map(rhs))
            },
            ExprKind::Select(cond, t, f) => {
                let cond = map(cond);
                let t = map(t);
                ExprKind::Select(cond, t, map(f))
            },
            ExprKind::Ramp { base, stride, lanes } => {
                let base = map(base);
                ExprKind::Ramp { base, stride: map(stride), lanes: *lanes }
            },
            ExprKind::Broadcast { value, lanes } => {
                ExprKind::Broadcast { value: map(value), lanes: *lanes }
            },
            ExprKind::Shuffle { vectors, indices } => ExprKind::Shuffle {
                vectors: vectors.iter().map(&mut map).collect(),
                indices: indices.clone(),
            },
            ExprKind::Let { var, value, body } => {
                let value = map(value);
                ExprKind::Let { var: var.clone(), value, body: map(body) }
            },
            ExprKind::Call { op, args } => ExprKind::Call {
                op: op.clone(),
                args: args.iter().map(&mut map).collect(),
            },
        };

        if changed {
            Expr::new(self.dtype(), kind)
        } else {
            self.clone()
        }
    }

    /// Returns an iterator that traverses the tree of expressions in left-to-right post-order
    /// (i.e. depth-first).
    pub fn post_order_iter(&self) -> ExprIter {
        ExprIter::new(self)
    }

    /// Returns true if any variable in the expression satisfies the predicate.
    pub fn any_var(&self, mut predicate: impl FnMut(&Var) -> bool) -> bool {
        self.post_order_iter()
            .any(|expr| expr.as_var().map_or(false, &mut predicate))
    }

    /// Returns true if the expression mentions the given variable.
    pub fn uses_var(&self, var: &Var) -> bool {
        self.any_var(|v| v == var)
    }

    /// Counts the occurrences of the given variable in the expression.
    pub fn count_var_uses(&self, var: &Var) -> usize {
        self.post_order_iter()
            .filter(|expr| expr.as_var() == Some(var))
            .count()
    }

    /// Returns the number of nodes in the expression tree.
    pub fn node_count(&self) -> usize {
        self.post_order_iter().count()
    }

    /// Replaces every free occurrence of a variable for which `f` returns `Some` with the
    /// returned expression. Variables rebound by an inner [`ExprKind::Let`] are left alone inside
    /// its body.
    pub fn substitute(&self, f: &dyn Fn(&Var) -> Option<Expr>) -> Expr {
        fn go(expr: &Expr, f: &dyn Fn(&Var) -> Option<Expr>, shadowed: &mut Vec<Var>) -> Expr {
            match expr.kind() {
                ExprKind::Var(var) if !shadowed.contains(var) => {
                    f(var).unwrap_or_else(|| expr.clone())
                },
                ExprKind::Let { var, value, body } => {
                    let value = go(value, f, shadowed);

                    // rename the bound variable if a replacement inside the body mentions it
                    let replacements = body.free_vars()
                        .into_iter()
                        .filter(|free| free != var && !shadowed.contains(free))
                        .filter_map(|free| f(&free))
                        .collect::<Vec<_>>();
                    let (var, body) = if replacements.iter().any(|value| value.uses_var(var)) {
                        let fresh = var.fresh(|name| {
                            body.any_var(|v| &*v.name == name)
                                || replacements.iter().any(|value| value.any_var(|v| &*v.name == name))
                        });
                        let body = body.substitute_var(var, &fresh.expr());
                        (fresh, body)
                    } else {
                        (var.clone(), body.clone())
                    };

                    shadowed.push(var.clone());
                    let body = go(&body, f, shadowed);
                    shadowed.pop();
                    Expr::new(expr.dtype(), ExprKind::Let { var, value, body })
                },
                _ => expr.map_children(|child| go(child, f, shadowed)),
            }
        }

        go(self, f, &mut Vec::new())
    }

    /// Returns the variables that occur free in the expression, in order of first occurrence.
    pub fn free_vars(&self) -> Vec<Var> {
        fn go(expr: &Expr, bound: &mut Vec<Var>, out: &mut Vec<Var>) {
            match expr.kind() {
                ExprKind::Var(var) => {
                    if !bound.contains(var) && !out.contains(var) {
                        out.push(var.clone());
                    }
                },
                ExprKind::Let { var, value, body } => {
                    go(value, bound, out);
                    bound.push(var.clone());
                    go(body, bound, out);
                    bound.pop();
                },
                _ => {
                    for child in expr.children() {
                        go(child, bound, out);
                    }
                },
            }
        }

        let mut out = Vec::new();
        go(self, &mut Vec::new(), &mut out);
        out
    }

    /// Returns true if the expression contains a [`ExprKind::Let`].
    pub fn has_let(&self) -> bool {
        self.post_order_iter().any(|expr| matches!(expr.kind(), ExprKind::Let { .. }))
    }

    /// Renames the variables bound by [`ExprKind::Let`] expressions so that every `let` binds its
    /// own variable, and no bound variable shares its name with a free variable or with a name for
    /// which `reserved` returns true. A `let` whose variable already satisfies this keeps it.
    pub fn rename_lets(&self, reserved: impl Fn(&str) -> bool) -> Expr {
        fn go(
            expr: &Expr,
            renames: &mut Vec<(Var, Var)>,
            taken: &mut HashSet<Arc<str>>,
            reserved: &dyn Fn(&str) -> bool,
        ) -> Expr {
            match expr.kind() {
                ExprKind::Var(var) => match renames.iter().rev().find(|(from, _)| from == var) {
                    Some((_, to)) if to != var => to.expr(),
                    _ => expr.clone(),
                },
                ExprKind::Let { var, value, body } => {
                    let value = go(value, renames, taken, reserved);
                    let bound = if taken.contains(&*var.name) || reserved(&*var.name) {
                        var.fresh(|name| taken.contains(name) || reserved(name))
                    } else {
                        var.clone()
                    };
                    taken.insert(bound.name.clone());

                    renames.push((var.clone(), bound.clone()));
                    let body = go(body, renames, taken, reserved);
                    renames.pop();
                    Expr::new(expr.dtype(), ExprKind::Let { var: bound, value, body })
                },
                _ => expr.map_children(|child| go(child, renames, taken, reserved)),
            }
        }

        if !self.has_let() {
            return self.clone();
        }
        let mut taken = self.free_vars().into_iter().map(|var| var.name).collect();
        go(self, &mut Vec::new(), &mut taken, &reserved)
    }

    /// Replaces every free occurrence of `var` with `value`.
    pub fn substitute_var(&self, var: &Var, value: &Expr) -> Expr {
        self.substitute(&|v| (v == var).then(|| value.clone()))
    }

    /// Returns the precedence the expression is printed with.
    fn precedence(&self) -> Precedence {
        match self.kind() {
            ExprKind::Binary(op, ..) => op.precedence(),
            ExprKind::Not(_) => Precedence::Not,
            ExprKind::Let { .. } => Precedence::Let,
            _ => Precedence::Primary,
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.0.hash == other.0.hash
                && self.0.dtype == other.0.dtype
                && self.0.kind == other.0.kind)
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl PartialOrd for Expr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Expr {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.ptr_eq(other) {
            return Ordering::Equal;
        }
        self.0.kind.cmp(&other.0.kind)
            .then_with(|| self.0.dtype.cmp(&other.0.dtype))
    }
}

#[cfg(feature = "serde")]
impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.0.dtype, &self.0.kind).serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Expr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (dtype, kind) = <(DataType, ExprKind)>::deserialize(deserializer)?;
        Ok(Expr::new(dtype, kind))
    }
}

/// Writes `operand`, wrapped in parentheses if it binds looser than its parent operator.
fn fmt_operand(
    f: &mut fmt::Formatter<'_>,
    operand: &Expr,
    parent: Precedence,
    is_rhs: bool,
) -> fmt::Result {
    let precedence = operand.precedence();
    let needs_parens = precedence < parent
        || (precedence == parent && (is_rhs || parent == Precedence::Compare));
    if needs_parens {
        write!(f, "({})", operand)
    } else {
        write!(f, "{}", operand)
    }
}

/// Writes `items` separated by commas.
fn fmt_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    let mut iter = items.iter();
    if let Some(item) = iter.next() {
        write!(f, "{}", item)?;
        for item in iter {
            write!(f, ", {}", item)?;
        }
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ExprKind::Var(var) => write!(f, "{}", var),
            ExprKind::IntImm(value) => write!(f, "{}", value),
            ExprKind::FloatImm(value) => write!(f, "{:?}", value.0),
            ExprKind::BoolImm(value) => write!(f, "{}", value),
            ExprKind::Cast(value) => write!(f, "{}({})", self.dtype(), value),
            ExprKind::Binary(op, lhs, rhs) => match op.symbol() {
                Some(symbol) => {
                    let precedence = op.precedence();
                    fmt_operand(f, lhs, precedence, false)?;
                    write!(f, " {} ", symbol)?;
                    fmt_operand(f, rhs, precedence, true)
                },
                None => write!(f, "{}({}, {})", op.name(), lhs, rhs),
            },
            ExprKind::Not(value) => {
                write!(f, "!")?;
                fmt_operand(f, value, Precedence::Not, false)
            },
            ExprKind::Select(cond, t, e) => write!(f, "select({}, {}, {})", cond, t, e),
            ExprKind::Ramp { base, stride, lanes } => {
                write!(f, "ramp({}, {}, {})", base, stride, lanes)
            },
            ExprKind::Broadcast { value, lanes } => write!(f, "broadcast({}, {})", value, lanes),
            ExprKind::Shuffle { vectors, indices } => {
                write!(f, "shuffle([")?;
                fmt_list(f, vectors)?;
                write!(f, "], [")?;
                fmt_list(f, indices)?;
                write!(f, "])")
            },
            ExprKind::Let { var, value, body } => {
                write!(f, "let {} = {} in {}", var, value, body)
            },
            ExprKind::Call { op, args } => {
                write!(f, "{}(", op)?;
                fmt_list(f, args)?;
                write!(f, ")")
            },
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self, self.dtype())
    }
}
