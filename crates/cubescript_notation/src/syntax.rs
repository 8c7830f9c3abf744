use strum::{Display, EnumIter};

/// Placement style of an operator relative to its operand(s).
///
/// A [`crate::Notation`] assigns one placement style to every composite
/// [`crate::Symbol`]. The parser selects its algorithm for a construct from
/// this assignment, so the same script grammar can be written with the
/// operator in front, behind, around, or between its operands.
#[derive(Debug, Display, EnumIter, Copy, Clone, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum Syntax {
    /// A single self-delimiting token, such as a move or a macro reference.
    Primary,
    /// Unary operator before its operand: `Operator, Operand`.
    Prefix,
    /// Unary operator after its operand: `Operand, Operator`.
    Suffix,
    /// Operand surrounded by a begin and an end token:
    /// `Begin, Operand, End`.
    Circumfix,
    /// Two operands surrounded by begin/end with the head operand first:
    /// `Begin, Operand2, Delimiter, Operand1, End`.
    Precircumfix,
    /// Two operands surrounded by begin/end with the head operand last:
    /// `Begin, Operand1, Delimiter, Operand2, End`.
    Postcircumfix,
    /// Binary operator between its operands, head first:
    /// `Operand2, Operator, Operand1`.
    Preinfix,
    /// Binary operator between its operands, head last:
    /// `Operand1, Operator, Operand2`.
    Postinfix,
}
