use strum::{Display, EnumIter};

/// Grammatical role of a token in a script.
///
/// Symbols come in two flavors: *composite* symbols name whole constructs
/// (moves, groupings, commutations, …) and are the keys under which a
/// [`crate::Syntax`] placement is configured; *sub-symbols* name the
/// individual tokens a construct is written with (begin/end markers,
/// operators, delimiters, permutation faces and signs). Every sub-symbol
/// knows the composite it belongs to via [`Symbol::composite`].
#[derive(Debug, Display, EnumIter, Copy, Clone, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum Symbol {
    /// A primitive twist bound to a move token.
    Move,
    /// A statement without effect.
    Nop,
    /// A reference to a registered macro.
    Macro,
    /// An explicit parenthesized sequence.
    Grouping,
    /// Inversion of a statement.
    Inversion,
    /// Reflection of a statement.
    Reflection,
    /// Repetition of a statement.
    Repetition,
    /// Conjugation `A B A'`.
    Conjugation,
    /// Commutation `A B A' B'`.
    Commutation,
    /// Rotated statement `A' B A`.
    Rotation,
    /// Permutation-cycle statement.
    Permutation,

    /// Begin marker of a grouping.
    GroupingBegin,
    /// End marker of a grouping.
    GroupingEnd,
    /// Begin marker of a circumfix inversion.
    InversionBegin,
    /// End marker of a circumfix inversion.
    InversionEnd,
    /// Unary inversion operator.
    InversionOperator,
    /// Begin marker of a circumfix reflection.
    ReflectionBegin,
    /// End marker of a circumfix reflection.
    ReflectionEnd,
    /// Unary reflection operator.
    ReflectionOperator,
    /// Begin marker of a repetition count.
    RepetitionBegin,
    /// End marker of a repetition count.
    RepetitionEnd,
    /// Infix repetition operator.
    RepetitionOperator,
    /// Begin marker of a conjugation.
    ConjugationBegin,
    /// End marker of a conjugation.
    ConjugationEnd,
    /// Delimiter between conjugator and conjugated operand.
    ConjugationDelimiter,
    /// Infix conjugation operator.
    ConjugationOperator,
    /// Begin marker of a commutation.
    CommutationBegin,
    /// End marker of a commutation.
    CommutationEnd,
    /// Delimiter between commutator and commutated operand.
    CommutationDelimiter,
    /// Infix commutation operator.
    CommutationOperator,
    /// Begin marker of a rotation.
    RotationBegin,
    /// End marker of a rotation.
    RotationEnd,
    /// Delimiter between rotator and rotated operand.
    RotationDelimiter,
    /// Infix rotation operator.
    RotationOperator,
    /// Begin marker of a permutation cycle.
    PermutationBegin,
    /// End marker of a permutation cycle.
    PermutationEnd,
    /// Delimiter between permutation cycle members.
    PermutationDelimiter,
    /// `+` orientation sign of a permutation cycle.
    PermutationPlus,
    /// `-` orientation sign of a permutation cycle.
    PermutationMinus,
    /// `++` orientation sign of a permutation cycle.
    PermutationPlusPlus,
    /// Right face of a permutation member.
    FaceR,
    /// Up face of a permutation member.
    FaceU,
    /// Front face of a permutation member.
    FaceF,
    /// Left face of a permutation member.
    FaceL,
    /// Down face of a permutation member.
    FaceD,
    /// Back face of a permutation member.
    FaceB,
    /// Begin marker of a block comment.
    MultiLineCommentBegin,
    /// End marker of a block comment.
    MultiLineCommentEnd,
    /// Begin marker of a comment that runs to the end of the line.
    SingleLineCommentBegin,
}

impl Symbol {
    /// Returns the composite symbol this symbol belongs to.
    ///
    /// Composite symbols return themselves.
    pub fn composite(self) -> Symbol {
        use Symbol::*;
        match self {
            GroupingBegin | GroupingEnd => Grouping,
            InversionBegin | InversionEnd | InversionOperator => Inversion,
            ReflectionBegin | ReflectionEnd | ReflectionOperator => Reflection,
            RepetitionBegin | RepetitionEnd | RepetitionOperator => Repetition,
            ConjugationBegin | ConjugationEnd | ConjugationDelimiter | ConjugationOperator => {
                Conjugation
            }
            CommutationBegin | CommutationEnd | CommutationDelimiter | CommutationOperator => {
                Commutation
            }
            RotationBegin | RotationEnd | RotationDelimiter | RotationOperator => Rotation,
            PermutationBegin | PermutationEnd | PermutationDelimiter | PermutationPlus
            | PermutationMinus | PermutationPlusPlus | FaceR | FaceU | FaceF | FaceL | FaceD
            | FaceB => Permutation,
            other => other,
        }
    }

    /// Returns whether this symbol is a composite symbol.
    pub fn is_composite(self) -> bool {
        self.composite() == self
    }

    /// Returns whether this symbol belongs to the given composite symbol.
    pub fn is_sub_symbol_of(self, composite: Symbol) -> bool {
        self.composite() == composite
    }

    /// Returns whether this symbol is the begin marker of a construct.
    pub fn is_begin(self) -> bool {
        use Symbol::*;
        matches!(
            self,
            GroupingBegin
                | InversionBegin
                | ReflectionBegin
                | RepetitionBegin
                | ConjugationBegin
                | CommutationBegin
                | RotationBegin
                | PermutationBegin
        )
    }

    /// Returns whether this symbol is the end marker of a construct.
    pub fn is_end(self) -> bool {
        use Symbol::*;
        matches!(
            self,
            GroupingEnd
                | InversionEnd
                | ReflectionEnd
                | RepetitionEnd
                | ConjugationEnd
                | CommutationEnd
                | RotationEnd
                | PermutationEnd
        )
    }

    /// Returns whether this symbol is a unary or infix operator token.
    pub fn is_operator(self) -> bool {
        use Symbol::*;
        matches!(
            self,
            InversionOperator
                | ReflectionOperator
                | RepetitionOperator
                | ConjugationOperator
                | CommutationOperator
                | RotationOperator
        )
    }

    /// Returns whether this symbol delimits the operands of a construct.
    pub fn is_delimiter(self) -> bool {
        use Symbol::*;
        matches!(
            self,
            ConjugationDelimiter | CommutationDelimiter | RotationDelimiter | PermutationDelimiter
        )
    }

    /// Returns whether this symbol names a face of a permutation member.
    pub fn is_face(self) -> bool {
        use Symbol::*;
        matches!(self, FaceR | FaceU | FaceF | FaceL | FaceD | FaceB)
    }

    /// Returns the canonical index of a face symbol in R, U, F, L, D, B
    /// order, or `None` for non-face symbols.
    pub fn face_index(self) -> Option<usize> {
        use Symbol::*;
        match self {
            FaceR => Some(0),
            FaceU => Some(1),
            FaceF => Some(2),
            FaceL => Some(3),
            FaceD => Some(4),
            FaceB => Some(5),
            _ => None,
        }
    }

    /// Returns whether this symbol is a permutation orientation sign.
    pub fn is_permutation_sign(self) -> bool {
        use Symbol::*;
        matches!(self, PermutationPlus | PermutationMinus | PermutationPlusPlus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_symbols_know_their_composite() {
        assert_eq!(Symbol::CommutationBegin.composite(), Symbol::Commutation);
        assert_eq!(Symbol::FaceU.composite(), Symbol::Permutation);
        assert_eq!(Symbol::PermutationPlus.composite(), Symbol::Permutation);
        assert_eq!(Symbol::Move.composite(), Symbol::Move);
        assert!(Symbol::FaceU.is_sub_symbol_of(Symbol::Permutation));
        assert!(!Symbol::FaceU.is_sub_symbol_of(Symbol::Grouping));
    }

    #[test]
    fn role_predicates() {
        assert!(Symbol::GroupingBegin.is_begin());
        assert!(Symbol::RotationEnd.is_end());
        assert!(Symbol::InversionOperator.is_operator());
        assert!(Symbol::CommutationDelimiter.is_delimiter());
        assert!(Symbol::PermutationPlusPlus.is_permutation_sign());
        assert_eq!(Symbol::FaceB.face_index(), Some(5));
        assert_eq!(Symbol::Nop.face_index(), None);
    }
}
