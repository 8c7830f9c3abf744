//! Notation-directed script parser.
//!
//! One parsing algorithm serves every notation: each construct is parsed
//! by the routine selected by the [`Syntax`] placement its composite
//! [`Symbol`] is configured with. Tokens may be ambiguous between several
//! symbols; the parser tries each candidate in notation order and
//! backtracks on failure, keeping the error that got furthest into the
//! input.
//!
//! Suffix constructs are folded greedily after every statement, which
//! gives suffix and circumfix operators the tightest binding; prefix and
//! infix constructs wrap whole statements and bind looser.

use indexmap::IndexMap;
use smallvec::SmallVec;

use cubescript_notation::{Notation, Symbol, Syntax};

use crate::ast::{CORNER_FACES, EDGE_FACES, Node, NodeKind, PartFamily, PermItem, PermutationCycle};
use crate::error::{ErrorKind, ParseError};
use crate::macros::MacroResolver;
use crate::token::{KeywordTable, TokenKind, Tokenizer};

/// Default ceiling for statement nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Parser for move scripts written in one [`Notation`].
///
/// A parser is cheap to construct and may be reused for any number of
/// scripts. Parsing never mutates the notation.
#[derive(Debug)]
pub struct ScriptParser<'n> {
    notation: &'n Notation,
    local_macros: IndexMap<String, String>,
    max_depth: usize,
}

impl<'n> ScriptParser<'n> {
    /// Creates a parser for the given notation.
    pub fn new(notation: &'n Notation) -> Self {
        Self {
            notation,
            local_macros: IndexMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Creates a parser with additional local macros. Macros defined by
    /// the notation shadow local macros of the same name.
    pub fn with_local_macros(
        notation: &'n Notation,
        local_macros: IndexMap<String, String>,
    ) -> Self {
        Self {
            local_macros,
            ..Self::new(notation)
        }
    }

    /// Returns the notation this parser reads.
    pub fn notation(&self) -> &'n Notation {
        self.notation
    }

    /// Replaces the nesting ceiling. Exceeding it aborts the parse with a
    /// resource error instead of overflowing the stack.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Parses a script into a [`NodeKind::Sequence`] tree.
    pub fn parse(&self, input: &str) -> Result<Node, ParseError> {
        let keywords = self.keyword_table();
        let mut tt = Tokenizer::new(input, &keywords);
        let mut run = Run {
            parser: self,
            macros: MacroResolver::new(),
        };
        run.parse_script(&mut tt)
    }

    fn keyword_table(&self) -> KeywordTable {
        let mut table = KeywordTable::new();
        for token in self.notation.tokens() {
            table.add_keyword(token);
        }
        for name in self.local_macros.keys() {
            table.add_keyword(name);
        }
        let begin = self.notation.token(Symbol::MultiLineCommentBegin);
        let end = self.notation.token(Symbol::MultiLineCommentEnd);
        if let (Some(begin), Some(end)) = (begin, end) {
            table.add_comment(begin, end);
        }
        if let Some(begin) = self.notation.token(Symbol::SingleLineCommentBegin) {
            table.add_comment(begin, "\n");
        }
        table
    }
}

/// State of one `parse` call: the macro memoization table and a handle on
/// the parser configuration.
struct Run<'p, 'n> {
    parser: &'p ScriptParser<'n>,
    macros: MacroResolver,
}

/// Errors that abort the parse immediately instead of participating in
/// backtracking: resource exhaustion and macro recursion.
fn is_fatal(e: &ParseError) -> bool {
    matches!(e.kind, ErrorKind::Resource | ErrorKind::Macro)
}

impl<'n> Run<'_, 'n> {
    fn notation(&self) -> &'n Notation {
        self.parser.notation
    }

    /// Formats an error around the current token, in the form
    /// `"<message> Found \"<token>\"."`.
    fn exception(&self, tt: &Tokenizer<'_>, message: impl AsRef<str>) -> ParseError {
        ParseError::syntax(
            format!("{} Found \"{}\".", message.as_ref(), tt.string_value()),
            tt.start_position(),
            tt.end_position(),
        )
    }

    fn parse_script(&mut self, tt: &mut Tokenizer<'_>) -> Result<Node, ParseError> {
        let mut children = Vec::new();
        while tt.next_token()? != TokenKind::Eof {
            tt.push_back();
            self.parse_statement(tt, &mut children, 0)?;
        }
        Ok(Node::new(NodeKind::Sequence(children), 0, tt.end_position()))
    }

    /// Parses one statement into `parent`, then folds any suffixes onto
    /// it.
    fn parse_statement(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        depth: usize,
    ) -> Result<(), ParseError> {
        if depth > self.parser.max_depth {
            return Err(ParseError::new(
                ErrorKind::Resource,
                "Statement: Maximum nesting depth exceeded.",
                tt.start_position(),
                tt.end_position(),
            ));
        }
        match tt.next_token()? {
            TokenKind::Number => {
                tt.push_back();
                self.parse_repetition(tt, parent, depth)?;
            }
            TokenKind::Keyword => {
                tt.push_back();
                self.parse_non_suffix_or_backtrack(tt, parent, depth)?;
            }
            _ => return Err(self.exception(tt, "Statement: Keyword or Number expected.")),
        }

        // Suffixes are folded here so that they take precedence over
        // every other construct.
        self.parse_suffixes(tt, parent, depth)
    }

    /// Tries every candidate symbol of the next keyword token,
    /// backtracking tokenizer and tree between attempts.
    fn parse_non_suffix_or_backtrack(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        depth: usize,
    ) -> Result<(), ParseError> {
        if tt.next_token()? != TokenKind::Keyword {
            return Err(self.exception(tt, "Statement: Keyword expected."));
        }
        let token = tt.string_value();

        let mut candidates: SmallVec<[Symbol; 4]> =
            self.notation().symbols_for(token).iter().copied().collect();
        if self.parser.local_macros.contains_key(token) && !candidates.contains(&Symbol::Macro) {
            candidates.push(Symbol::Macro);
        }

        let saved_tt = tt.clone();
        let saved_children = parent.clone();
        let mut best: Option<ParseError> = None;
        for symbol in candidates {
            match self.parse_non_suffix(tt, parent, token, symbol, depth) {
                Ok(()) => return Ok(()),
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    log::trace!("backtracking from {symbol} for token {token:?}: {e}");
                    *tt = saved_tt.clone();
                    parent.clear();
                    parent.extend(saved_children.iter().cloned());
                    if best.as_ref().is_none_or(|b| b.end < e.end) {
                        best = Some(e);
                    }
                }
            }
        }
        Err(best.unwrap_or_else(|| self.exception(tt, "Statement: Illegal token.")))
    }

    /// Parses a statement that starts with `token` interpreted as
    /// `symbol`. The token has already been consumed.
    fn parse_non_suffix(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        token: &str,
        symbol: Symbol,
        depth: usize,
    ) -> Result<(), ParseError> {
        if symbol.composite() == Symbol::Permutation {
            tt.push_back();
            return self.parse_permutation(tt, parent, depth);
        }
        match self.notation().syntax(symbol) {
            Syntax::Primary => self.parse_primary(tt, parent, token, symbol, depth),
            Syntax::Prefix => self.parse_prefix(tt, parent, symbol, depth),
            Syntax::Circumfix => self.parse_circumfix(tt, parent, symbol, depth),
            Syntax::Precircumfix => self.parse_precircumfix(tt, parent, symbol, depth),
            Syntax::Postcircumfix => self.parse_postcircumfix(tt, parent, symbol, depth),
            Syntax::Preinfix => self.parse_preinfix(tt, parent, symbol, depth),
            Syntax::Postinfix => self.parse_postinfix(tt, parent, symbol, depth),
            syntax => Err(self.exception(tt, format!("Unexpected Syntax: {syntax}"))),
        }
    }

    fn parse_primary(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        token: &str,
        symbol: Symbol,
        depth: usize,
    ) -> Result<(), ParseError> {
        let start = tt.start_position();
        let end = tt.end_position();
        match symbol {
            Symbol::Nop => {
                parent.push(Node::new(NodeKind::Nop, start, end));
                Ok(())
            }
            Symbol::Move => {
                let mv = self
                    .notation()
                    .move_from_token(token)
                    .ok_or_else(|| self.exception(tt, "Move: Invalid move token."))?;
                parent.push(Node::new(NodeKind::Move(mv), start, end));
                Ok(())
            }
            Symbol::Macro => self.parse_macro(tt, parent, token, depth),
            _ => Err(self.exception(
                tt,
                format!("Primary Expression: {symbol} cannot be used as a primary expression."),
            )),
        }
    }

    /// Expands a macro reference. The expansion is memoized per parser
    /// run and re-spanned to the reference site.
    fn parse_macro(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        token: &str,
        _depth: usize,
    ) -> Result<(), ParseError> {
        let start = tt.start_position();
        let end = tt.end_position();
        let body = self
            .notation()
            .macro_body(token)
            .or_else(|| self.parser.local_macros.get(token).map(String::as_str))
            .ok_or_else(|| {
                ParseError::new(
                    ErrorKind::Macro,
                    format!("Macro: Undefined macro \"{token}\"."),
                    start,
                    end,
                )
            })?;

        let expansion = match self.macros.cached(token) {
            Some(cached) => cached.clone(),
            None => {
                if self.macros.is_in_progress(token) {
                    return Err(ParseError::new(
                        ErrorKind::Macro,
                        format!("Macro: Illegal recursion in macro \"{token}\"."),
                        start,
                        end,
                    ));
                }
                log::debug!("expanding macro {token:?}");
                self.macros.begin(token);
                let mut sub = tt.with_input(body);
                let result = self.parse_script(&mut sub);
                self.macros.end(token);
                let script = result.map_err(|e| {
                    ParseError::new(
                        e.kind,
                        format!(
                            "Error in macro \"{token}\":{} at {}..{}",
                            e.message, e.start, e.end
                        ),
                        start,
                        end,
                    )
                })?;
                self.macros.insert(token, script.clone());
                script
            }
        };

        let mut expansion = expansion;
        expansion.respan(start, end);
        parent.push(Node::new(
            NodeKind::Macro {
                name: token.to_owned(),
                expansion: Box::new(expansion),
            },
            start,
            end,
        ));
        Ok(())
    }

    /// Parses a repetition that starts with (prefix and infix placements)
    /// or follows (suffix placement) its repeat count.
    fn parse_repetition(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        depth: usize,
    ) -> Result<(), ParseError> {
        if tt.next_token()? != TokenKind::Number {
            return Err(ParseError::syntax(
                "Repetition: Number expected.",
                tt.start_position(),
                tt.end_position(),
            ));
        }
        let mut start = tt.start_position();
        let count = tt.numeric_value().unwrap_or(0);
        if count < 1 {
            return Err(ParseError::syntax(
                format!("Repetition: Illegal repeat count {count}."),
                tt.start_position(),
                tt.end_position(),
            ));
        }

        let mut operands = Vec::new();
        match self.notation().syntax(Symbol::Repetition) {
            Syntax::Prefix => self.parse_statement(tt, &mut operands, depth + 1)?,
            Syntax::Suffix => {
                let sibling = parent
                    .pop()
                    .ok_or_else(|| self.exception(tt, "Repetition: Operand missing."))?;
                start = sibling.start;
                operands.push(sibling);
            }
            Syntax::Preinfix => {
                if tt.next_token()? != TokenKind::Keyword
                    || !self
                        .notation()
                        .symbols_for(tt.string_value())
                        .contains(&Symbol::RepetitionOperator)
                {
                    return Err(self.exception(tt, "Repetition: Operator expected."));
                }
                self.parse_statement(tt, &mut operands, depth + 1)?;
            }
            // Postinfix repetition is handled by parse_postinfix; reaching
            // this point means the operator is missing.
            Syntax::Postinfix => {
                return Err(self.exception(tt, "Repetition: Operator expected."));
            }
            syntax => {
                return Err(ParseError::syntax(
                    format!("Repetition: Illegal syntax: {syntax}"),
                    tt.start_position(),
                    tt.end_position(),
                ));
            }
        }
        let end = tt.end_position();
        parent.push(Node::new(NodeKind::Repetition { count, operands }, start, end));
        Ok(())
    }

    /// Folds suffix constructs onto the last statement of `parent`, as
    /// long as any apply.
    fn parse_suffixes(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        depth: usize,
    ) -> Result<(), ParseError> {
        let mut saved_tt = tt.clone();
        let mut saved_children = parent.clone();
        'outer: loop {
            match tt.next_token()? {
                TokenKind::Keyword => {
                    let token = tt.string_value();
                    let candidates: SmallVec<[Symbol; 4]> =
                        self.notation().symbols_for(token).iter().copied().collect();
                    for symbol in candidates {
                        if symbol.composite() == Symbol::Permutation
                            || self.notation().syntax(symbol) != Syntax::Suffix
                        {
                            continue;
                        }
                        match self.parse_suffix(tt, parent, symbol, depth) {
                            Ok(()) => {
                                saved_tt = tt.clone();
                                saved_children = parent.clone();
                                continue 'outer;
                            }
                            Err(e) if is_fatal(&e) => return Err(e),
                            Err(_) => {
                                *tt = saved_tt.clone();
                                parent.clear();
                                parent.extend(saved_children.iter().cloned());
                            }
                        }
                    }
                    break;
                }
                TokenKind::Number
                    if self.notation().syntax(Symbol::Repetition) == Syntax::Suffix =>
                {
                    tt.push_back();
                    match self.parse_repetition(tt, parent, depth) {
                        Ok(()) => {
                            saved_tt = tt.clone();
                            saved_children = parent.clone();
                            continue;
                        }
                        Err(e) if is_fatal(&e) => return Err(e),
                        Err(_) => {
                            *tt = saved_tt.clone();
                            parent.clear();
                            parent.extend(saved_children.iter().cloned());
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
        *tt = saved_tt;
        parent.clear();
        parent.extend(saved_children.iter().cloned());
        Ok(())
    }

    /// Replaces the last statement of `parent` with a suffix construct
    /// wrapped around it.
    fn parse_suffix(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        symbol: Symbol,
        depth: usize,
    ) -> Result<(), ParseError> {
        let Some(sibling_start) = parent.last().map(|n| n.start) else {
            return Err(ParseError::syntax(
                "Suffix: No sibling for suffix.",
                tt.start_position(),
                tt.end_position(),
            ));
        };
        let kind = if symbol.is_begin() {
            let operand1 = self.parse_circumfix_operand(tt, symbol, depth)?;
            let sibling = parent
                .pop()
                .ok_or_else(|| self.exception(tt, "Suffix: No sibling for suffix."))?;
            self.composite_node(tt, symbol, operand1, Some(sibling))?
        } else if symbol.is_operator() {
            let sibling = parent
                .pop()
                .ok_or_else(|| self.exception(tt, "Suffix: No sibling for suffix."))?;
            self.composite_node(tt, symbol, sibling, None)?
        } else {
            return Err(self.exception(tt, "Suffix: Begin or Operator expected."));
        };
        parent.push(Node::new(kind, sibling_start, tt.end_position()));
        Ok(())
    }

    /// Parses a prefix construct: a binary prefix when the symbol opens a
    /// circumfix operand, a unary prefix when it is an operator.
    fn parse_prefix(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        symbol: Symbol,
        depth: usize,
    ) -> Result<(), ParseError> {
        let start = tt.start_position();
        let kind = if symbol.is_begin() {
            let operand1 = self.parse_circumfix_operand(tt, symbol, depth)?;
            let operand2 = self.parse_single_statement(tt, depth)?;
            self.composite_node(tt, symbol, operand1, Some(operand2))?
        } else if symbol.is_operator() {
            let mut operand = Vec::new();
            self.parse_statement(tt, &mut operand, depth + 1)?;
            let end = tt.end_position();
            let seq = Node::new(NodeKind::Sequence(operand), start, end);
            self.composite_node(tt, symbol, seq, None)?
        } else {
            return Err(self.exception(tt, "Prefix: Begin or Operator expected."));
        };
        parent.push(Node::new(kind, start, tt.end_position()));
        Ok(())
    }

    /// Parses a unary circumfix construct after its begin token.
    fn parse_circumfix(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        symbol: Symbol,
        depth: usize,
    ) -> Result<(), ParseError> {
        let start = tt.start_position();
        let operand1 = self.parse_circumfix_operand(tt, symbol, depth)?;
        let kind = self.composite_node(tt, symbol, operand1, None)?;
        parent.push(Node::new(kind, start, tt.end_position()));
        Ok(())
    }

    /// Parses a binary circumfix construct with the head operand first.
    fn parse_precircumfix(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        symbol: Symbol,
        depth: usize,
    ) -> Result<(), ParseError> {
        let start = tt.start_position();
        let mut operands = self.parse_circumfix_operands(tt, symbol, depth)?;
        if operands.len() != 2 {
            return Err(self.exception(tt, "Precircumfix: Two operands expected."));
        }
        let second = operands.pop().ok_or_else(|| {
            self.exception(tt, "Precircumfix: Two operands expected.")
        })?;
        let first = operands.pop().ok_or_else(|| {
            self.exception(tt, "Precircumfix: Two operands expected.")
        })?;
        let kind = self.composite_node(tt, symbol, first, Some(second))?;
        parent.push(Node::new(kind, start, tt.end_position()));
        Ok(())
    }

    /// Parses a binary circumfix construct with the head operand last.
    fn parse_postcircumfix(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        symbol: Symbol,
        depth: usize,
    ) -> Result<(), ParseError> {
        let start = tt.start_position();
        let mut operands = self.parse_circumfix_operands(tt, symbol, depth)?;
        if operands.len() != 2 {
            return Err(self.exception(tt, "Postcircumfix: Two operands expected."));
        }
        let head = operands.pop().ok_or_else(|| {
            self.exception(tt, "Postcircumfix: Two operands expected.")
        })?;
        let body = operands.pop().ok_or_else(|| {
            self.exception(tt, "Postcircumfix: Two operands expected.")
        })?;
        let kind = self.composite_node(tt, symbol, head, Some(body))?;
        parent.push(Node::new(kind, start, tt.end_position()));
        Ok(())
    }

    /// Replaces the last statement of `parent` with a pre-infix construct.
    fn parse_preinfix(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        symbol: Symbol,
        depth: usize,
    ) -> Result<(), ParseError> {
        if parent.is_empty() {
            return Err(self.exception(tt, "Preinfix: Operand expected."));
        }
        let operand2 = self.parse_single_statement(tt, depth)?;
        let operand1 = parent
            .pop()
            .ok_or_else(|| self.exception(tt, "Preinfix: Operand expected."))?;
        let start = operand1.start;
        let kind = self.composite_node(tt, symbol, operand1, Some(operand2))?;
        parent.push(Node::new(kind, start, tt.end_position()));
        Ok(())
    }

    /// Replaces the last statement of `parent` with a post-infix
    /// construct.
    fn parse_postinfix(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        symbol: Symbol,
        depth: usize,
    ) -> Result<(), ParseError> {
        if parent.is_empty() {
            return Err(self.exception(tt, "Postinfix: Operand expected."));
        }
        if symbol.composite() == Symbol::Repetition {
            if tt.next_token()? != TokenKind::Number {
                return Err(ParseError::syntax(
                    "Repetition: Repetition count expected.",
                    tt.start_position(),
                    tt.end_position(),
                ));
            }
            let count = tt.numeric_value().unwrap_or(0);
            if count < 1 {
                return Err(ParseError::syntax(
                    format!("Repetition: Illegal repeat count {count}."),
                    tt.start_position(),
                    tt.end_position(),
                ));
            }
            let operand2 = self
                .parse_single_statement_from(parent)
                .ok_or_else(|| self.exception(tt, "Postinfix: Operand expected."))?;
            let start = operand2.start;
            parent.push(Node::new(
                NodeKind::Repetition {
                    count,
                    operands: vec![operand2],
                },
                start,
                tt.end_position(),
            ));
            Ok(())
        } else {
            let operand1 = self.parse_single_statement(tt, depth)?;
            let operand2 = self
                .parse_single_statement_from(parent)
                .ok_or_else(|| self.exception(tt, "Postinfix: Operand expected."))?;
            let start = operand2.start;
            let kind = self.composite_node(tt, symbol, operand1, Some(operand2))?;
            parent.push(Node::new(kind, start, tt.end_position()));
            Ok(())
        }
    }

    /// Parses exactly one statement and returns it.
    fn parse_single_statement(
        &mut self,
        tt: &mut Tokenizer<'_>,
        depth: usize,
    ) -> Result<Node, ParseError> {
        let mut tmp = Vec::new();
        self.parse_statement(tt, &mut tmp, depth + 1)?;
        tmp.into_iter().next().ok_or_else(|| {
            ParseError::syntax(
                "Statement: Statement expected.",
                tt.start_position(),
                tt.end_position(),
            )
        })
    }

    fn parse_single_statement_from(&self, parent: &mut Vec<Node>) -> Option<Node> {
        parent.pop()
    }

    /// Parses the operands of a circumfix construct after its begin
    /// token, split at the construct's delimiter and terminated by its
    /// end token.
    fn parse_circumfix_operands(
        &mut self,
        tt: &mut Tokenizer<'_>,
        symbol: Symbol,
        depth: usize,
    ) -> Result<Vec<Node>, ParseError> {
        if !symbol.is_begin() {
            return Err(self.exception(tt, "Circumfix: Begin expected."));
        }
        let composite = symbol.composite();
        let notation = self.notation();

        let mut operands = Vec::new();
        let mut current = Vec::new();
        let mut current_start = tt.end_position();
        loop {
            match tt.next_token()? {
                TokenKind::Number => {
                    tt.push_back();
                    self.parse_statement(tt, &mut current, depth + 1)?;
                }
                TokenKind::Keyword => {
                    let token = tt.string_value();
                    let mut matched = None;
                    for &s in notation.symbols_for(token) {
                        if s.is_sub_symbol_of(composite) && (s.is_delimiter() || s.is_end()) {
                            matched = Some(s);
                            break;
                        }
                    }
                    match matched {
                        Some(s) if s.is_delimiter() => {
                            operands.push(Node::new(
                                NodeKind::Sequence(std::mem::take(&mut current)),
                                current_start,
                                tt.start_position(),
                            ));
                            current_start = tt.end_position();
                        }
                        Some(_) => {
                            operands.push(Node::new(
                                NodeKind::Sequence(current),
                                current_start,
                                tt.start_position(),
                            ));
                            return Ok(operands);
                        }
                        None => {
                            tt.push_back();
                            self.parse_statement(tt, &mut current, depth + 1)?;
                        }
                    }
                }
                _ => {
                    return Err(self.exception(tt, "Circumfix: Number, Keyword or End expected."));
                }
            }
        }
    }

    /// Parses the single operand of a circumfix construct.
    fn parse_circumfix_operand(
        &mut self,
        tt: &mut Tokenizer<'_>,
        symbol: Symbol,
        depth: usize,
    ) -> Result<Node, ParseError> {
        let mut operands = self.parse_circumfix_operands(tt, symbol, depth)?;
        if operands.len() != 1 {
            return Err(self.exception(tt, "Circumfix: Exactly one operand expected."));
        }
        operands
            .pop()
            .ok_or_else(|| self.exception(tt, "Circumfix: Exactly one operand expected."))
    }

    /// Builds the node for a composite construct from its operands.
    fn composite_node(
        &self,
        tt: &Tokenizer<'_>,
        symbol: Symbol,
        operand1: Node,
        operand2: Option<Node>,
    ) -> Result<NodeKind, ParseError> {
        match symbol.composite() {
            Symbol::Grouping => Ok(NodeKind::Grouping(self.unary_children(tt, operand1, operand2)?)),
            Symbol::Inversion => {
                Ok(NodeKind::Inversion(self.unary_children(tt, operand1, operand2)?))
            }
            Symbol::Reflection => {
                Ok(NodeKind::Reflection(self.unary_children(tt, operand1, operand2)?))
            }
            Symbol::Repetition => {
                // The repeat count is attached by the caller.
                if operand2.is_some() {
                    return Err(self.exception(tt, "Repetition: One operand expected."));
                }
                Ok(NodeKind::Repetition {
                    count: 1,
                    operands: vec![operand1],
                })
            }
            Symbol::Conjugation => {
                let (a, b) = self.binary_operands(tt, operand1, operand2)?;
                Ok(NodeKind::Conjugation {
                    conjugator: Box::new(a),
                    conjugated: Box::new(b),
                })
            }
            Symbol::Commutation => {
                let (a, b) = self.binary_operands(tt, operand1, operand2)?;
                Ok(NodeKind::Commutation {
                    commutator: Box::new(a),
                    commutated: Box::new(b),
                })
            }
            Symbol::Rotation => {
                let (a, b) = self.binary_operands(tt, operand1, operand2)?;
                Ok(NodeKind::Rotation {
                    rotator: Box::new(a),
                    rotated: Box::new(b),
                })
            }
            other => Err(self.exception(tt, format!("Composite: Unexpected operation: {other}"))),
        }
    }

    /// Flattens the operand of a unary construct into a child list.
    fn unary_children(
        &self,
        tt: &Tokenizer<'_>,
        operand1: Node,
        operand2: Option<Node>,
    ) -> Result<Vec<Node>, ParseError> {
        if operand2.is_some() {
            return Err(self.exception(tt, "Unary: One operand expected."));
        }
        match operand1.kind {
            NodeKind::Sequence(children) => Ok(children),
            _ => Ok(vec![operand1]),
        }
    }

    fn binary_operands(
        &self,
        tt: &Tokenizer<'_>,
        operand1: Node,
        operand2: Option<Node>,
    ) -> Result<(Node, Node), ParseError> {
        match operand2 {
            Some(operand2) => Ok((operand1, operand2)),
            None => Err(self.exception(tt, "Binary: Two operands expected.")),
        }
    }

    /// Parses a permutation-cycle statement. The first token (the begin
    /// token, or the cycle sign under prefix placement) is pushed back.
    fn parse_permutation(
        &mut self,
        tt: &mut Tokenizer<'_>,
        parent: &mut Vec<Node>,
        _depth: usize,
    ) -> Result<(), ParseError> {
        let notation = self.notation();
        let syntax = notation.syntax(Symbol::Permutation);
        let layer_count = notation.layer_count();
        let start = tt.start_position();

        let mut sign = None;
        if syntax == Syntax::Prefix {
            sign = self.parse_permutation_sign(tt)?;
        }
        if tt.next_token()? != TokenKind::Keyword
            || notation.symbol_in_composite(tt.string_value(), Symbol::Permutation)
                != Some(Symbol::PermutationBegin)
        {
            return Err(self.exception(tt, "Permutation: Begin expected."));
        }
        if syntax == Syntax::Precircumfix {
            sign = self.parse_permutation_sign(tt)?;
        }

        let mut cycle = CycleBuilder::new(layer_count);
        loop {
            if tt.next_token()? != TokenKind::Keyword {
                return Err(self.exception(tt, "Permutation: PermutationItem expected."));
            }
            let sym = notation.symbol_in_composite(tt.string_value(), Symbol::Permutation);
            match sym {
                Some(Symbol::PermutationEnd) => break,
                None => {
                    return Err(self.exception(tt, "Permutation: PermutationItem expected."));
                }
                Some(_) => {
                    tt.push_back();
                    self.parse_permutation_item(tt, &mut cycle, syntax)?;
                }
            }

            // After an item: a delimiter, or (under postcircumfix
            // placement) the cycle sign followed by the end token.
            if tt.next_token()? == TokenKind::Keyword {
                let sym = notation.symbol_in_composite(tt.string_value(), Symbol::Permutation);
                match sym {
                    Some(Symbol::PermutationDelimiter) => {}
                    Some(s) if s.is_permutation_sign() && syntax == Syntax::Postcircumfix => {
                        sign = Some(s);
                        if tt.next_token()? != TokenKind::Keyword
                            || notation.symbol_in_composite(tt.string_value(), Symbol::Permutation)
                                != Some(Symbol::PermutationEnd)
                        {
                            return Err(self.exception(tt, "Permutation: End expected."));
                        }
                        break;
                    }
                    _ => tt.push_back(),
                }
            } else {
                tt.push_back();
            }
        }

        if syntax == Syntax::Suffix {
            sign = self.parse_permutation_sign(tt)?;
        }
        if let Some(sign) = sign {
            cycle.set_sign(sign, tt.start_position(), tt.end_position())?;
        }
        let end = tt.end_position();
        parent.push(Node::new(
            NodeKind::Permutation(cycle.finish(tt.start_position(), end)?),
            start,
            end,
        ));
        Ok(())
    }

    /// Parses a permutation sign token, if one is next.
    fn parse_permutation_sign(
        &mut self,
        tt: &mut Tokenizer<'_>,
    ) -> Result<Option<Symbol>, ParseError> {
        if tt.next_token()? == TokenKind::Keyword {
            let sym = self
                .notation()
                .symbol_in_composite(tt.string_value(), Symbol::Permutation);
            if let Some(sym) = sym {
                if sym.is_permutation_sign() {
                    return Ok(Some(sym));
                }
            }
        }
        tt.push_back();
        Ok(None)
    }

    fn parse_permutation_item(
        &mut self,
        tt: &mut Tokenizer<'_>,
        cycle: &mut CycleBuilder,
        syntax: Syntax,
    ) -> Result<(), ParseError> {
        let start = tt.start_position();
        let mut sign = None;
        if matches!(syntax, Syntax::Precircumfix | Syntax::Prefix | Syntax::Postcircumfix) {
            sign = self.parse_permutation_sign(tt)?;
        }

        let faces = self.parse_permutation_faces(tt)?;
        let part_number = self.parse_permutation_part_number(tt, faces.len())?;

        if syntax == Syntax::Suffix && faces.len() == 1 {
            sign = self.parse_permutation_sign(tt)?;
        }

        cycle.add_item(&faces, sign, part_number, start, tt.end_position())
    }

    /// Parses one to three face tokens of a permutation member.
    fn parse_permutation_faces(
        &mut self,
        tt: &mut Tokenizer<'_>,
    ) -> Result<SmallVec<[Symbol; 3]>, ParseError> {
        let notation = self.notation();
        let mut faces = SmallVec::new();
        while faces.len() < 3 {
            if tt.next_token()? == TokenKind::Keyword {
                let sym = notation.symbol_in_composite(tt.string_value(), Symbol::Permutation);
                if let Some(sym) = sym {
                    if sym.is_face() {
                        faces.push(sym);
                        continue;
                    }
                }
            }
            break;
        }
        tt.push_back();

        if faces.is_empty() {
            return Err(self.exception(tt, "PermutationItem: Face expected."));
        }
        if notation.layer_count() < 3 && faces.len() < 3 {
            return Err(self.exception(tt, "PermutationItem: The 2x2 cube only has corner parts."));
        }
        Ok(faces)
    }

    /// Parses the optional part number of a permutation member and
    /// validates it against the layer count.
    fn parse_permutation_part_number(
        &mut self,
        tt: &mut Tokenizer<'_>,
        face_count: usize,
    ) -> Result<u32, ParseError> {
        let layer_count = self.notation().layer_count();
        let mut part_number = 0;
        if tt.next_token()? == TokenKind::Number {
            part_number = tt.numeric_value().unwrap_or(0);
        } else {
            tt.push_back();
        }
        match face_count {
            3 => {
                if part_number != 0 {
                    return Err(self.exception(
                        tt,
                        format!("PermutationItem: Invalid corner part number: {part_number}"),
                    ));
                }
            }
            2 => {
                let valid = match layer_count {
                    4 => (1..=2).contains(&part_number),
                    5 => part_number <= 2,
                    6 => (1..=4).contains(&part_number),
                    7 => part_number <= 4,
                    _ => part_number == 0,
                };
                if !valid {
                    return Err(self.exception(
                        tt,
                        format!("PermutationItem: Invalid edge part number: {part_number}"),
                    ));
                }
                if matches!(layer_count, 4 | 6) {
                    part_number -= 1;
                }
            }
            _ => {
                let valid = match layer_count {
                    4 => (1..=4).contains(&part_number),
                    5 => part_number <= 8,
                    6 => (1..=16).contains(&part_number),
                    7 => part_number <= 24,
                    _ => part_number == 0,
                };
                if !valid {
                    return Err(self.exception(
                        tt,
                        format!("PermutationItem: Invalid side part number: {part_number}"),
                    ));
                }
                if matches!(layer_count, 4 | 6) {
                    part_number -= 1;
                }
            }
        }
        Ok(part_number)
    }
}

/// Accumulates the members of one permutation cycle.
struct CycleBuilder {
    family: Option<PartFamily>,
    sign: i32,
    items: Vec<PermItem>,
    layer_count: u8,
}

const NO_SIGN: i32 = 0;
const MINUS_SIGN: i32 = 1;
const PLUSPLUS_SIGN: i32 = 2;
const PLUS_SIGN: i32 = 3;

fn sign_value(sign: Option<Symbol>) -> i32 {
    match sign {
        None => NO_SIGN,
        Some(Symbol::PermutationMinus) => MINUS_SIGN,
        Some(Symbol::PermutationPlusPlus) => PLUSPLUS_SIGN,
        _ => PLUS_SIGN,
    }
}

/// Folds the generic `+` sign into the family's own encoding: a `+` turn
/// is two thirds of a corner twist and a flip of an edge.
fn family_sign(family: PartFamily, s: i32) -> i32 {
    if s == PLUS_SIGN {
        match family {
            PartFamily::Corner => PLUSPLUS_SIGN,
            PartFamily::Edge => MINUS_SIGN,
            PartFamily::Side => PLUS_SIGN,
        }
    } else {
        s
    }
}

impl CycleBuilder {
    fn new(layer_count: u8) -> Self {
        Self {
            family: None,
            sign: NO_SIGN,
            items: Vec::new(),
            layer_count,
        }
    }

    fn add_item(
        &mut self,
        faces: &[Symbol],
        sign_symbol: Option<Symbol>,
        part_number: u32,
        start: usize,
        end: usize,
    ) -> Result<(), ParseError> {
        let family = match faces.len() {
            3 => PartFamily::Corner,
            2 => PartFamily::Edge,
            _ => PartFamily::Side,
        };
        match self.family {
            None => self.family = Some(family),
            Some(existing) if existing != family => {
                return Err(ParseError::syntax(
                    "Permutation: Permutation of different part types is not supported.",
                    start,
                    end,
                ));
            }
            Some(_) => {}
        }

        let s = family_sign(family, sign_value(sign_symbol));
        if self.items.is_empty() {
            self.sign = s;
        } else if family != PartFamily::Side && s != NO_SIGN {
            return Err(ParseError::syntax("PermutationItem: Illegal sign.", start, end));
        }

        let item = match family {
            PartFamily::Side => {
                let Some(face) = faces[0].face_index() else {
                    return Err(ParseError::syntax(
                        "PermutationItem: Face expected.",
                        start,
                        end,
                    ));
                };
                let location = face + 6 * part_number as usize;
                let orientation = if self.items.is_empty() { 0 } else { s };
                PermItem { location, orientation }
            }
            PartFamily::Edge => {
                if sign_symbol.is_some() && sign_symbol != Some(Symbol::PermutationPlus) {
                    return Err(ParseError::syntax(
                        "PermutationItem: Illegal sign for edge part.",
                        start,
                        end,
                    ));
                }
                let f0 = faces[0].face_index().unwrap_or(usize::MAX);
                let f1 = faces[1].face_index().unwrap_or(usize::MAX);
                let Some(loc) = EDGE_FACES
                    .iter()
                    .position(|&[a, b]| (a == f0 && b == f1) || (a == f1 && b == f0))
                else {
                    return Err(ParseError::syntax(
                        "PermutationItem: Impossible edge part.",
                        start,
                        end,
                    ));
                };
                let rotated = EDGE_FACES[loc][0] != f0;
                let location = loc + 12 * part_number as usize;
                PermItem {
                    location,
                    orientation: i32::from(rotated),
                }
            }
            PartFamily::Corner => {
                if sign_symbol == Some(Symbol::PermutationPlusPlus) {
                    return Err(ParseError::syntax(
                        "PermutationItem: Illegal sign for corner part.",
                        start,
                        end,
                    ));
                }
                let mut sorted: SmallVec<[usize; 3]> = faces
                    .iter()
                    .map(|f| f.face_index().unwrap_or(usize::MAX))
                    .collect();
                sorted.sort_unstable();
                let Some(loc) = CORNER_FACES.iter().position(|canonical| {
                    let mut c: [usize; 3] = *canonical;
                    c.sort_unstable();
                    c[..] == sorted[..]
                }) else {
                    return Err(ParseError::syntax(
                        "PermutationItem: Impossible corner part.",
                        start,
                        end,
                    ));
                };
                let canonical = CORNER_FACES[loc];
                let first = faces[0].face_index().unwrap_or(usize::MAX);
                let second = faces[1].face_index().unwrap_or(usize::MAX);
                let orientation = if first == canonical[0] {
                    if second == canonical[1] { 0 } else { 3 }
                } else if first == canonical[1] {
                    if second == canonical[2] { 2 } else { 5 }
                } else if second == canonical[0] {
                    1
                } else {
                    4
                };
                for existing in &self.items {
                    if existing.orientation / 3 != orientation / 3 {
                        return Err(ParseError::syntax(
                            "PermutationItem: Corner permutation cannot be clockwise and anticlockwise at the same time.",
                            start,
                            end,
                        ));
                    }
                }
                PermItem {
                    location: loc,
                    orientation,
                }
            }
        };

        self.items.push(item);
        Ok(())
    }

    /// Applies the cycle-level orientation sign, validating it against
    /// the part family.
    fn set_sign(&mut self, sign_symbol: Symbol, start: usize, end: usize) -> Result<(), ParseError> {
        let Some(family) = self.family else {
            return Err(ParseError::syntax("Permutation: Illegal sign.", start, end));
        };
        let illegal = match family {
            PartFamily::Edge => {
                matches!(sign_symbol, Symbol::PermutationPlusPlus | Symbol::PermutationMinus)
            }
            PartFamily::Corner => sign_symbol == Symbol::PermutationPlusPlus,
            PartFamily::Side => false,
        };
        if illegal {
            return Err(ParseError::syntax("Permutation: Illegal sign.", start, end));
        }
        self.sign = family_sign(family, sign_value(Some(sign_symbol)));
        Ok(())
    }

    fn finish(self, start: usize, end: usize) -> Result<PermutationCycle, ParseError> {
        let Some(family) = self.family else {
            return Err(ParseError::syntax(
                "Permutation: PermutationItem expected.",
                start,
                end,
            ));
        };
        Ok(PermutationCycle {
            family,
            sign: self.sign,
            items: self.items,
            layer_count: self.layer_count,
        })
    }
}
