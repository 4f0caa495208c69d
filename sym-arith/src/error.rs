//! Errors reported by the [`Analyzer`](crate::Analyzer).
//!
//! Inference itself never fails; these errors describe misuse of the analyzer's mutable state.

use ariadne::Fmt;
use sym_attrs::ErrorKind;
use sym_error::{ErrorKind, EXPR};

/// A variable was bound to a different value or range than the one it is already bound to.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("`{}` is already bound to `{}`", self.var, self.existing),
    labels = ["this variable", "", "the new binding"],
    help = format!(
        "pass {} to replace the binding",
        "allow_override = true".fg(EXPR),
    ),
)]
pub struct BindingConflict {
    /// The name of the variable.
    pub var: String,

    /// The existing binding, rendered.
    pub existing: String,

    /// The rejected binding, rendered.
    pub new: String,
}

/// A constant bound was injected for a variable that already has a different bound.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("`{}` already has the bound {}, which conflicts with {}", self.var, self.existing, self.new),
    labels = ["this variable"],
    help = format!(
        "pass {} to replace the bound",
        "allow_override = true".fg(EXPR),
    ),
)]
pub struct BoundConflict {
    /// The name of the variable.
    pub var: String,

    /// The existing bound, rendered.
    pub existing: String,

    /// The rejected bound, rendered.
    pub new: String,
}

/// A constraint scope was exited out of order.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("constraint scope {} exited while scope {} is still active", self.token, self.innermost),
    help = "constraint scopes must be exited in the reverse order they were entered",
)]
pub struct ConstraintOrder {
    /// The scope that was exited.
    pub token: u64,

    /// The innermost active scope.
    pub innermost: u64,
}

/// A constraint scope was exited when no scope is active.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(message = format!("constraint scope {} is not active", self.token))]
pub struct NoActiveConstraint {
    /// The scope that was exited.
    pub token: u64,
}
