/// Possible rewrite steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// `1 + 2 = 3`
    /// `3 < 4 = true`
    FoldConstants,

    /// `1 + x = x + 1`
    /// `2 == x = x == 2`
    ConstantToRight,

    /// `x = 3`, if `x` is known to lie in `[3, 3]`
    KnownValue,

    /// `x + 0 = x`
    /// `x - 0 = x`
    AddZero,

    /// `x - x = 0`
    SubtractSelf,

    /// `x * 1 = x`
    /// `floordiv(x, 1) = x`
    MultiplyOne,

    /// `x * 0 = 0`
    MultiplyZero,

    /// `floormod(x, 1) = 0`
    ModOne,

    /// `floordiv(x, x) = 1`, if `x` is never zero
    DivideSelf,

    /// `min(x, x) = x`
    /// `x <= x = true`
    /// `a && a = a`
    SameOperands,

    /// `true && a = a`
    /// `false || a = a`
    /// `false && a = false`
    LogicalConstant,

    /// `broadcast(a, n) + broadcast(b, n) = broadcast(a + b, n)`
    BroadcastOp,

    /// `ramp(a, s, n) + ramp(b, t, n) = ramp(a + b, s + t, n)`
    RampAddRamp,

    /// `ramp(a, s, n) + broadcast(b, n) = ramp(a + b, s, n)`
    RampAddBroadcast,

    /// `ramp(a, s, n) * broadcast(b, n) = ramp(a * b, s * b, n)`
    RampMulBroadcast,

    /// `ramp(a, 0, n) = broadcast(a, n)`
    RampZeroStride,

    /// `!broadcast(a, n) = broadcast(!a, n)`
    BroadcastUnary,

    /// `(x + 1) + 2 = x + 3`
    /// `(x * 2) * 3 = x * 6`
    CollectConstants,

    /// `x + -3 = x - 3`
    /// `x - -3 = x + 3`
    NegativeConstant,

    /// `x + x = x * 2`
    AddSelf,

    /// `x * 2 + x * 3 = x * 5`
    FactorTerms,

    /// `(x - y) + y = x`
    /// `(x + y) - x = y`
    CancelTerms,

    /// `(x + 1) + y = (x + y) + 1`
    MoveConstantOut,

    /// `min(x, y) + max(x, y) = x + y`
    MinPlusMax,

    /// `x - min(x, y) = max(x - y, 0)`
    SubtractMinMax,

    /// `select(c, a, b) + select(c, d, e) = select(c, a + d, b + e)`
    DistributeSelect,

    /// `truncdiv(x, c) * c + truncmod(x, c) = x`
    /// `floordiv(x, c) * c + floormod(x, c) = x`
    ReassembleDivMod,

    /// `(x + 1) * 2 = x * 2 + 2`
    DistributeConstant,

    /// `floordiv(x * 4 + y, 2) = x * 2 + floordiv(y, 2)`
    /// `floormod(x * 4 + y, 2) = floormod(y, 2)`
    SplitDivisible,

    /// `floordiv(x * 4, 2) = x * 2`
    /// `floormod(x * 4, 2) = 0`
    DivideExact,

    /// `floordiv(floordiv(x, 2), 3) = floordiv(x, 6)`
    /// `floormod(floormod(x, 6), 3) = floormod(x, 3)`
    NestedDivision,

    /// `floormod(x, 8) = x`, if `x` is known to lie in `[0, 8)`
    ModInRange,

    /// `floormod(x + 9, 4) = floormod(x + 1, 4)`
    ReduceOffset,

    /// `floormod(x, 4) = 1`, if `x` is known to be congruent to `1` modulo `4`
    ModularRemainder,

    /// `min(x, y) = x`, if `x <= y` is known
    MinMaxKnown,

    /// `min(min(x, 2), 3) = min(x, 2)`
    MinMaxConstants,

    /// `min(x, max(x, y)) = x`
    MinMaxAbsorb,

    /// `min(min(x, y), x) = min(x, y)`
    MinMaxNested,

    /// `min(a + b, a + c) = a + min(b, c)`
    MinMaxCommonTerm,

    /// `min(x * 2, y * 2) = min(x, y) * 2`
    /// `min(x * -2, y * -2) = max(x, y) * -2`
    MinMaxScale,

    /// `a > b = b < a`
    /// `x <= 3 = x < 4`
    /// `3 < x = 4 <= x`
    NormalizeComparison,

    /// `x < y = true`, if `x < y` is known
    CompareKnown,

    /// `x + 2 < 5 = x < 3`
    MoveConstant,

    /// `x * 4 < 10 = x < 3`
    /// `x * 4 == 10 = false`
    DivideComparison,

    /// `a + b < a + c = b < c`
    /// `x * 2 < y * 2 = x < y`
    CancelComparison,

    /// `x * 8 + y < 16 = x < 2`, if `y` is known to lie in `[0, 8)`
    DropRemainder,

    /// `floordiv(x, 4) < 3 = x < 12`
    CompareFloorDiv,

    /// `x - y < 0 = x < y`
    CompareDifference,

    /// `a == true = a`
    /// `a == false = !a`
    BoolEquality,

    /// `!!a = a`
    DoubleNegation,

    /// `!(a < b) = b <= a`
    /// `!(a == b) = a != b`
    NegateComparison,

    /// `!(a && b) = !a || !b`
    /// `!(a || b) = !a && !b`
    DeMorgan,

    /// `a && !a = false`
    /// `x < y || y <= x = true`
    Complement,

    /// `x < 3 && 5 <= x = false`
    /// `x < 5 || 3 <= x = true`
    Contradiction,

    /// `x < 3 && x < 5 = x < 3`
    /// `3 <= x || 5 <= x = 3 <= x`
    MergeRanges,

    /// `a = true`, if `a` is a condition of an enclosing constraint
    KnownLiteral,

    /// `select(true, a, b) = a`
    SelectConstant,

    /// `select(c, a, a) = a`
    SelectSame,

    /// `select(!c, a, b) = select(c, b, a)`
    SelectNegated,

    /// `select(x < y, x, y) = min(x, y)`
    /// `select(x < y, y, x) = max(x, y)`
    SelectToMinMax,

    /// `select(c, select(c, a, b), d) = select(c, a, d)`
    SelectNested,

    /// `int64(3) = 3`
    FoldCast,

    /// `int32(x) = x`, if `x` is already an `int32`
    RemoveCast,

    /// `int32(int64(x)) = int32(x)`, if `int64` holds every value of `x`
    CollapseCast,

    /// `let x = 3 in x + 1 = 3 + 1`
    InlineLet,

    /// `let x = y in z = z`
    DropLet,
}
