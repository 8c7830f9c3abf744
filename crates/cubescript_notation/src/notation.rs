use indexmap::IndexMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{Move, Symbol, Syntax};

/// Error raised while building a [`Notation`].
///
/// All configuration problems are detected here, before any script is
/// parsed; a finished [`Notation`] is always internally consistent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    /// The layer count is outside the supported range.
    #[error("unsupported layer count {0}, expected 2..=7")]
    UnsupportedLayerCount(u8),
    /// The symbol/syntax pair is not a legal combination.
    #[error("syntax {syntax} is not valid for {symbol}")]
    InvalidSyntax {
        /// The composite symbol the syntax was configured for.
        symbol: Symbol,
        /// The rejected placement style.
        syntax: Syntax,
    },
    /// A syntax was configured for a sub-symbol instead of its composite.
    #[error("{0} is not a composite symbol and cannot carry a syntax")]
    NotAComposite(Symbol),
    /// A token spelling was empty.
    #[error("empty token for {0}")]
    EmptyToken(Symbol),
    /// The same spelling was bound twice to the same symbol.
    #[error("token \"{token}\" is already bound to {symbol}")]
    ConflictingToken {
        /// The symbol the token was already bound to.
        symbol: Symbol,
        /// The duplicated spelling.
        token: String,
    },
    /// A move was registered whose layer mask does not fit the puzzle.
    #[error("layer mask {layer_mask:#b} does not fit a {layer_count}-layer puzzle")]
    InvalidLayerMask {
        /// The rejected layer mask.
        layer_mask: u32,
        /// The layer count of the notation.
        layer_count: u8,
    },
    /// A macro name was registered twice.
    #[error("macro \"{0}\" is already defined")]
    ConflictingMacro(String),
}

/// Immutable description of the tokens and placement styles of a script
/// dialect, for one puzzle size.
///
/// Built through [`NotationBuilder`]; see [`Notation::default_notation`]
/// for the built-in dialect.
#[derive(Debug, Clone)]
pub struct Notation {
    layer_count: u8,
    symbol_to_tokens: IndexMap<Symbol, Vec<String>>,
    token_to_symbols: IndexMap<String, SmallVec<[Symbol; 2]>>,
    move_to_tokens: IndexMap<Move, Vec<String>>,
    token_to_move: IndexMap<String, Move>,
    symbol_to_syntax: IndexMap<Symbol, Syntax>,
    macros: IndexMap<String, String>,
}

impl Notation {
    /// Returns a builder for a notation of the given layer count (2..=7).
    pub fn builder(layer_count: u8) -> Result<NotationBuilder, NotationError> {
        NotationBuilder::new(layer_count)
    }

    /// Returns the number of layers of the puzzle this notation is for.
    pub fn layer_count(&self) -> u8 {
        self.layer_count
    }

    /// Returns whether the symbol has a configured syntax or token.
    pub fn is_supported(&self, symbol: Symbol) -> bool {
        self.symbol_to_syntax.contains_key(&symbol) || self.symbol_to_tokens.contains_key(&symbol)
    }

    /// Returns the placement style of the symbol's composite, defaulting
    /// to [`Syntax::Primary`] when none is configured.
    pub fn syntax(&self, symbol: Symbol) -> Syntax {
        self.symbol_to_syntax
            .get(&symbol.composite())
            .copied()
            .unwrap_or(Syntax::Primary)
    }

    /// Returns the first token bound to the symbol, if any.
    pub fn token(&self, symbol: Symbol) -> Option<&str> {
        self.symbol_to_tokens
            .get(&symbol)
            .and_then(|tokens| tokens.first())
            .map(String::as_str)
    }

    /// Returns every token bound to the symbol.
    pub fn all_tokens(&self, symbol: Symbol) -> &[String] {
        self.symbol_to_tokens
            .get(&symbol)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the first token bound to the move, if any.
    pub fn move_token(&self, mv: Move) -> Option<&str> {
        self.move_to_tokens
            .get(&mv)
            .and_then(|tokens| tokens.first())
            .map(String::as_str)
    }

    /// Returns the move bound to the token, if any.
    pub fn move_from_token(&self, token: &str) -> Option<Move> {
        self.token_to_move.get(token).copied()
    }

    /// Returns every move registered with this notation.
    pub fn all_moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.move_to_tokens.keys().copied()
    }

    /// Returns every token spelling of this notation, macros included.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.token_to_symbols.keys().map(String::as_str)
    }

    /// Returns all symbols a (potentially ambiguous) token may stand for,
    /// in registration order.
    pub fn symbols_for(&self, token: &str) -> &[Symbol] {
        self.token_to_symbols
            .get(token)
            .map(SmallVec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the symbol the token stands for within the given composite
    /// construct, if any.
    pub fn symbol_in_composite(&self, token: &str, composite: Symbol) -> Option<Symbol> {
        self.symbols_for(token)
            .iter()
            .copied()
            .find(|s| s.is_sub_symbol_of(composite))
    }

    /// Returns the source text of the named macro, if defined.
    pub fn macro_body(&self, name: &str) -> Option<&str> {
        self.macros.get(name).map(String::as_str)
    }

    /// Returns the macro table in registration order.
    pub fn macros(&self) -> impl Iterator<Item = (&str, &str)> {
        self.macros.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Placement styles that are legal for each composite symbol.
fn valid_syntaxes(symbol: Symbol) -> &'static [Syntax] {
    use Syntax::*;
    match symbol {
        Symbol::Move | Symbol::Nop | Symbol::Macro => &[Primary],
        Symbol::Grouping => &[Circumfix],
        Symbol::Inversion | Symbol::Reflection => &[Prefix, Suffix, Circumfix],
        Symbol::Repetition => &[Prefix, Suffix, Preinfix, Postinfix],
        Symbol::Conjugation | Symbol::Commutation | Symbol::Rotation => {
            &[Prefix, Suffix, Precircumfix, Postcircumfix, Preinfix, Postinfix]
        }
        Symbol::Permutation => &[Prefix, Suffix, Precircumfix, Postcircumfix],
        _ => &[],
    }
}

/// Mutable builder for a [`Notation`].
///
/// Every mutation validates its input immediately and fails with a
/// [`NotationError`] rather than deferring problems to parse time.
#[derive(Debug, Clone)]
pub struct NotationBuilder {
    notation: Notation,
}

impl NotationBuilder {
    /// Creates an empty builder for a puzzle with the given layer count.
    pub fn new(layer_count: u8) -> Result<Self, NotationError> {
        if !(2..=7).contains(&layer_count) {
            return Err(NotationError::UnsupportedLayerCount(layer_count));
        }
        Ok(Self {
            notation: Notation {
                layer_count,
                symbol_to_tokens: IndexMap::new(),
                token_to_symbols: IndexMap::new(),
                move_to_tokens: IndexMap::new(),
                token_to_move: IndexMap::new(),
                symbol_to_syntax: IndexMap::new(),
                macros: IndexMap::new(),
            },
        })
    }

    /// Binds a token spelling to a symbol. A spelling may be bound to
    /// several different symbols; the parser disambiguates by context.
    pub fn add_token(&mut self, symbol: Symbol, token: &str) -> Result<&mut Self, NotationError> {
        if token.is_empty() {
            return Err(NotationError::EmptyToken(symbol));
        }
        let symbols = self
            .notation
            .token_to_symbols
            .entry(token.to_owned())
            .or_default();
        if symbols.contains(&symbol) {
            return Err(NotationError::ConflictingToken {
                symbol,
                token: token.to_owned(),
            });
        }
        symbols.push(symbol);
        self.notation
            .symbol_to_tokens
            .entry(symbol)
            .or_default()
            .push(token.to_owned());
        Ok(self)
    }

    /// Binds a token spelling to a primitive move.
    pub fn add_move(&mut self, mv: Move, token: &str) -> Result<&mut Self, NotationError> {
        let layer_count = self.notation.layer_count;
        if mv.layer_count() != layer_count {
            return Err(NotationError::InvalidLayerMask {
                layer_mask: mv.layer_mask(),
                layer_count,
            });
        }
        self.add_token(Symbol::Move, token)?;
        self.notation
            .move_to_tokens
            .entry(mv)
            .or_default()
            .push(token.to_owned());
        self.notation.token_to_move.insert(token.to_owned(), mv);
        Ok(self)
    }

    /// Selects the placement style for a composite symbol.
    pub fn put_syntax(&mut self, symbol: Symbol, syntax: Syntax) -> Result<&mut Self, NotationError> {
        if !symbol.is_composite() {
            return Err(NotationError::NotAComposite(symbol));
        }
        if !valid_syntaxes(symbol).contains(&syntax) {
            return Err(NotationError::InvalidSyntax { symbol, syntax });
        }
        self.notation.symbol_to_syntax.insert(symbol, syntax);
        Ok(self)
    }

    /// Registers a named macro. The body is parsed lazily, on first
    /// reference.
    pub fn put_macro(&mut self, name: &str, body: &str) -> Result<&mut Self, NotationError> {
        if self.notation.macros.contains_key(name) {
            return Err(NotationError::ConflictingMacro(name.to_owned()));
        }
        self.add_token(Symbol::Macro, name)?;
        self.notation.macros.insert(name.to_owned(), body.to_owned());
        Ok(self)
    }

    /// Finishes the builder.
    pub fn build(self) -> Notation {
        self.notation
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rejects_bad_layer_counts() {
        assert_eq!(
            NotationBuilder::new(1).map(|_| ()),
            Err(NotationError::UnsupportedLayerCount(1))
        );
        assert_eq!(
            NotationBuilder::new(8).map(|_| ()),
            Err(NotationError::UnsupportedLayerCount(8))
        );
        assert!(NotationBuilder::new(2).is_ok());
        assert!(NotationBuilder::new(7).is_ok());
    }

    #[test]
    fn rejects_invalid_symbol_syntax_pairs() {
        let mut b = NotationBuilder::new(3).unwrap();
        assert_eq!(
            b.put_syntax(Symbol::Repetition, Syntax::Circumfix).err(),
            Some(NotationError::InvalidSyntax {
                symbol: Symbol::Repetition,
                syntax: Syntax::Circumfix,
            })
        );
        assert_eq!(
            b.put_syntax(Symbol::Move, Syntax::Suffix).err(),
            Some(NotationError::InvalidSyntax {
                symbol: Symbol::Move,
                syntax: Syntax::Suffix,
            })
        );
        assert_eq!(
            b.put_syntax(Symbol::GroupingBegin, Syntax::Circumfix).err(),
            Some(NotationError::NotAComposite(Symbol::GroupingBegin))
        );
        assert!(b.put_syntax(Symbol::Commutation, Syntax::Preinfix).is_ok());
    }

    #[test]
    fn rejects_conflicting_tokens() {
        let mut b = NotationBuilder::new(3).unwrap();
        b.add_token(Symbol::Nop, ".").unwrap();
        assert_eq!(
            b.add_token(Symbol::Nop, ".").err(),
            Some(NotationError::ConflictingToken {
                symbol: Symbol::Nop,
                token: ".".to_owned(),
            })
        );
        // The same spelling may serve several symbols.
        assert!(b.add_token(Symbol::PermutationDelimiter, ".").is_ok());
        assert_eq!(
            b.add_token(Symbol::Nop, "").err(),
            Some(NotationError::EmptyToken(Symbol::Nop))
        );
    }

    #[test]
    fn ambiguous_tokens_keep_registration_order() {
        let mut b = NotationBuilder::new(3).unwrap();
        b.add_token(Symbol::PermutationBegin, "(").unwrap();
        b.add_token(Symbol::GroupingBegin, "(").unwrap();
        let n = b.build();
        assert_eq!(
            n.symbols_for("("),
            &[Symbol::PermutationBegin, Symbol::GroupingBegin]
        );
        assert_eq!(
            n.symbol_in_composite("(", Symbol::Grouping),
            Some(Symbol::GroupingBegin)
        );
    }
}
