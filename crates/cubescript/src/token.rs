//! Pull-based greedy tokenizer.
//!
//! By default the tokenizer reads the whole input as words. Keyword
//! spellings, digit runs and comments are activated by registering them in
//! a [`KeywordTable`]; whitespace (including the Unicode space
//! separators) is always skipped. Keyword matching is greedy: the longest
//! registered spelling wins, and registered spellings are preferred over
//! coincidental word runs.
//!
//! The tokenizer is cheap to clone, which is how the parser backtracks.

use std::collections::HashMap;

use crate::error::{ErrorKind, ParseError};

/// Kind of the current token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A registered keyword spelling.
    Keyword,
    /// A run of decimal digits.
    Number,
    /// A run of characters that is neither a keyword, digits nor
    /// whitespace.
    Word,
    /// End of input.
    Eof,
}

/// Prefix tree over registered keyword and comment spellings.
#[derive(Debug, Default)]
pub struct KeywordTable {
    root: TrieNode,
}

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    /// Set when a registered spelling ends here.
    keyword: Option<String>,
    /// Set when the spelling opens a comment; holds the end marker, or
    /// `"\n"` for comments that run to the end of the line.
    comment_end: Option<String>,
}

impl KeywordTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn node_for(&mut self, spelling: &str) -> &mut TrieNode {
        let mut node = &mut self.root;
        for ch in spelling.chars() {
            node = node.children.entry(ch).or_default();
        }
        node
    }

    /// Registers a keyword spelling.
    pub fn add_keyword(&mut self, spelling: &str) {
        let node = self.node_for(spelling);
        if node.keyword.is_none() {
            node.keyword = Some(spelling.to_owned());
        }
    }

    /// Registers a comment. `end` is the closing marker; use `"\n"` for a
    /// comment that runs to the end of the line.
    pub fn add_comment(&mut self, begin: &str, end: &str) {
        let node = self.node_for(begin);
        node.keyword = Some(begin.to_owned());
        node.comment_end = Some(end.to_owned());
    }
}

fn is_skipped(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\u{c}' | '\n' | '\r' | '\t' | '\u{b}' | '\u{a0}' | '\u{2028}' | '\u{2029}'
    )
}

/// Tokenizer over one input string.
#[derive(Debug, Clone)]
pub struct Tokenizer<'t> {
    input: &'t str,
    keywords: &'t KeywordTable,
    pos: usize,
    pushed_back: bool,
    kind: TokenKind,
    tstart: usize,
    tend: usize,
    sval: &'t str,
    nval: Option<u32>,
}

impl<'t> Tokenizer<'t> {
    /// Creates a tokenizer over `input` using the given keyword table.
    pub fn new(input: &'t str, keywords: &'t KeywordTable) -> Self {
        Self {
            input,
            keywords,
            pos: 0,
            pushed_back: false,
            kind: TokenKind::Eof,
            tstart: 0,
            tend: 0,
            sval: "<EOF>",
            nval: None,
        }
    }

    /// Creates a tokenizer with the same keyword table over a different
    /// input. Used for parsing macro bodies.
    pub fn with_input<'u>(&self, input: &'u str) -> Tokenizer<'u>
    where
        't: 'u,
    {
        Tokenizer::new(input, self.keywords)
    }

    /// Returns the kind of the current token.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Returns the start of the current token, inclusive.
    pub fn start_position(&self) -> usize {
        self.tstart
    }

    /// Returns the end of the current token, exclusive.
    pub fn end_position(&self) -> usize {
        self.tend
    }

    /// Returns the text of the current token, or `"<EOF>"` at end of
    /// input.
    pub fn string_value(&self) -> &'t str {
        self.sval
    }

    /// Returns the value of the current number token.
    pub fn numeric_value(&self) -> Option<u32> {
        self.nval
    }

    /// Makes the next [`Tokenizer::next_token`] call return the current
    /// token again.
    pub fn push_back(&mut self) {
        self.pushed_back = true;
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.input[pos..].chars().next()
    }

    /// Advances to the next token and returns its kind.
    pub fn next_token(&mut self) -> Result<TokenKind, ParseError> {
        if self.pushed_back {
            self.pushed_back = false;
            return Ok(self.kind);
        }

        loop {
            let mut start = self.pos;

            // Skip whitespace.
            while let Some(ch) = self.char_at(start) {
                if !is_skipped(ch) {
                    break;
                }
                start += ch.len_utf8();
            }

            // Greedy keyword or comment match.
            let mut node = &self.keywords.root;
            let mut found: Option<&TrieNode> = None;
            let mut end = start;
            let mut pos = start;
            while let Some(ch) = self.char_at(pos) {
                match node.children.get(&ch) {
                    Some(child) => {
                        pos += ch.len_utf8();
                        if child.keyword.is_some() {
                            found = Some(child);
                            end = pos;
                        }
                        node = child;
                    }
                    None => break,
                }
            }
            if let Some(found) = found {
                if let Some(comment_end) = &found.comment_end {
                    match self.input[end..].find(comment_end.as_str()) {
                        Some(i) => {
                            self.pos = end + i + comment_end.len();
                            continue;
                        }
                        None if comment_end == "\n" => {
                            // A line comment may end at end of input.
                            self.pos = self.input.len();
                            continue;
                        }
                        None => {
                            return Err(ParseError::new(
                                ErrorKind::Lexical,
                                "Comment: End missing.",
                                start,
                                self.input.len(),
                            ));
                        }
                    }
                }
                self.pos = end;
                self.kind = TokenKind::Keyword;
                self.tstart = start;
                self.tend = end;
                self.sval = &self.input[start..end];
                return Ok(self.kind);
            }

            // Number.
            let mut pos = start;
            while let Some(ch) = self.char_at(pos) {
                if !ch.is_ascii_digit() {
                    break;
                }
                pos += ch.len_utf8();
            }
            if pos > start {
                self.pos = pos;
                self.kind = TokenKind::Number;
                self.tstart = start;
                self.tend = pos;
                self.sval = &self.input[start..pos];
                self.nval = Some(self.sval.parse().map_err(|_| {
                    ParseError::new(ErrorKind::Lexical, "Number: Out of range.", start, pos)
                })?);
                return Ok(self.kind);
            }

            // Word: everything up to the next whitespace or digit.
            let mut pos = start;
            while let Some(ch) = self.char_at(pos) {
                if is_skipped(ch) || ch.is_ascii_digit() {
                    break;
                }
                pos += ch.len_utf8();
            }
            if pos > start {
                self.pos = pos;
                self.kind = TokenKind::Word;
                self.tstart = start;
                self.tend = pos;
                self.sval = &self.input[start..pos];
                return Ok(self.kind);
            }

            // End of input.
            self.pos = self.input.len();
            self.kind = TokenKind::Eof;
            self.tstart = self.input.len();
            self.tend = self.input.len();
            self.sval = "<EOF>";
            return Ok(self.kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn table(keywords: &[&str]) -> KeywordTable {
        let mut t = KeywordTable::new();
        for kw in keywords {
            t.add_keyword(kw);
        }
        t.add_comment("/*", "*/");
        t.add_comment("//", "\n");
        t
    }

    fn collect(input: &str, table: &KeywordTable) -> Vec<(TokenKind, String)> {
        let mut tt = Tokenizer::new(input, table);
        let mut out = vec![];
        loop {
            match tt.next_token().unwrap() {
                TokenKind::Eof => break,
                kind => out.push((kind, tt.string_value().to_owned())),
            }
        }
        out
    }

    #[test]
    fn longest_keyword_wins() {
        let t = table(&["R", "R2", "'"]);
        assert_eq!(
            collect("R2 R'", &t),
            vec![
                (TokenKind::Keyword, "R2".to_owned()),
                (TokenKind::Keyword, "R".to_owned()),
                (TokenKind::Keyword, "'".to_owned()),
            ]
        );
    }

    #[test]
    fn words_and_numbers() {
        let t = table(&["R"]);
        assert_eq!(
            collect("knurps 34 R", &t),
            vec![
                (TokenKind::Word, "knurps".to_owned()),
                (TokenKind::Number, "34".to_owned()),
                (TokenKind::Keyword, "R".to_owned()),
            ]
        );
    }

    #[test]
    fn comments_and_whitespace_are_skipped() {
        let t = table(&["R", "U"]);
        assert_eq!(
            collect("R /* twist * twist */ U\u{a0}// tail\nR", &t),
            vec![
                (TokenKind::Keyword, "R".to_owned()),
                (TokenKind::Keyword, "U".to_owned()),
                (TokenKind::Keyword, "R".to_owned()),
            ]
        );
        // A line comment may end at end of input.
        assert_eq!(collect("R // done", &t), vec![(TokenKind::Keyword, "R".to_owned())]);
    }

    #[test]
    fn unterminated_block_comment_is_a_lexical_error() {
        let t = table(&["R"]);
        let mut tt = Tokenizer::new("R /* open", &t);
        assert_eq!(tt.next_token().unwrap(), TokenKind::Keyword);
        let err = tt.next_token().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Lexical);
        assert_eq!(err.span(), 2..9);
    }

    #[test]
    fn push_back_replays_the_current_token() {
        let t = table(&["R"]);
        let mut tt = Tokenizer::new("R 3", &t);
        assert_eq!(tt.next_token().unwrap(), TokenKind::Keyword);
        tt.push_back();
        assert_eq!(tt.next_token().unwrap(), TokenKind::Keyword);
        assert_eq!(tt.next_token().unwrap(), TokenKind::Number);
        assert_eq!(tt.numeric_value(), Some(3));
        assert_eq!(tt.next_token().unwrap(), TokenKind::Eof);
        assert_eq!(tt.string_value(), "<EOF>");
    }

    #[test]
    fn middle_dot_is_an_ordinary_keyword() {
        let t = table(&["·", "."]);
        assert_eq!(
            collect("· .", &t),
            vec![
                (TokenKind::Keyword, "·".to_owned()),
                (TokenKind::Keyword, ".".to_owned()),
            ]
        );
    }
}
