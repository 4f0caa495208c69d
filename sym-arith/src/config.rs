#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Limits that bound the amount of work the analyzer performs.
///
/// The defaults are enough for the index expressions found in typical loop nests. Raising them
/// lets the simplifiers find more rewrites on large expressions, at the cost of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalyzerConfig {
    /// The maximum number of rules applied to a single node before the rewrite simplifier gives
    /// up on it.
    pub max_rewrite_steps: usize,

    /// The maximum nesting of proofs started from inside a rewrite rule, such as simplifying the
    /// difference of two operands to compare them.
    pub max_recursion_depth: usize,

    /// The maximum number of terms the canonical simplifier creates when it distributes a
    /// product of sums.
    pub max_canonical_terms: usize,

    /// The number of rewrite / canonical rounds [`Analyzer::simplify`] runs when no explicit
    /// count is given.
    ///
    /// [`Analyzer::simplify`]: crate::Analyzer::simplify
    pub default_simplify_steps: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_rewrite_steps: 64,
            max_recursion_depth: 8,
            max_canonical_terms: 64,
            default_simplify_steps: 2,
        }
    }
}
