//! Token scanner with speculative rescanning.
//!
//! The scanner exposes a single current token over the preprocessor's
//! stream, classified coarsely: each ASCII punctuation character is its own
//! token, runs of letters/digits merge into generic text, and Unicode
//! whitespace/punctuation are classified by table lookup over sorted range
//! lists. Context-sensitive sub-grammars (fences, autolinks, entities,
//! link destinations, doc tags...) are layered on top via `rescan`: a rule
//! may reinterpret the current token against a narrower grammar,
//! speculatively, with rollback handled inside the rule through
//! `Preprocessor::speculate`. This keeps each of the ~25 sub-grammars local
//! to its own parser module instead of threading them through one
//! monolithic lexer.

use std::borrow::Cow;

use crate::preprocess::{Checkpoint, Preprocessor};
use crate::range::Span;

/// Coarse and rescanned token kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input.
    End,
    /// A single logical line feed.
    Newline,
    /// A run of whitespace other than line feeds.
    Spaces,
    /// A run of non-special text characters.
    Text,
    /// A single punctuation character (ASCII or Unicode).
    Punct(char),

    // Kinds produced only by rescan rules.
    /// Backslash escape; the token value holds the decoded character.
    Escaped,
    /// Character or entity reference; the value holds the decoded text.
    EntityRef,
    /// Code fence of at least three identical marker characters.
    CodeFence { marker: char, len: u32 },
    /// Run of backticks usable as a code-span delimiter.
    BacktickRun(u32),
    /// Emphasis-capable delimiter run with its flanking classification.
    DelimiterRun {
        marker: char,
        len: u32,
        can_open: bool,
        can_close: bool,
    },
    /// `<uri>` or `<addr@host>` autolink body (angle brackets included).
    AutolinkUri { email: bool },
    /// Raw inline HTML construct.
    HtmlTag,
    /// Link destination (`<...>` or bare form).
    LinkDestination,
    /// Link title in quotes or parentheses.
    LinkTitle,
    /// `[label]` link label, brackets included.
    LinkLabel,
    /// Documentation tag name (`@returns`, `{@link`), value holds the name.
    TagName,
}

/// The scanner's current token.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Span in working-buffer coordinates.
    pub span: Span,
    /// Column of the token start (tab stops applied).
    pub column: u32,
    /// Decoded value for escapes, entity references and tag names.
    pub value: Option<String>,
}

impl Token {
    fn end_token(pos: u32, column: u32) -> Self {
        Self {
            kind: TokenKind::End,
            span: Span::empty_at(pos),
            column,
            value: None,
        }
    }
}

/// One consumed line, with any pending partial tab re-expanded to spaces.
#[derive(Debug, PartialEq)]
pub struct ScannedLine<'a> {
    /// Line text; owned when partial-tab spaces were prepended.
    pub text: Cow<'a, str>,
    /// Working-buffer offset where the consumed text begins.
    pub pos: u32,
    /// Number of synthesized leading spaces (from a split tab).
    pub expanded: u32,
}

/// Tokenizer over a preprocessed stream.
pub struct Scanner<'a> {
    pre: Preprocessor<'a>,
    token: Token,
    /// Columns left over from a tab consumed past its useful width.
    partial_tab: u32,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            pre: Preprocessor::new(text),
            token: Token::end_token(0, 0),
            partial_tab: 0,
        }
    }

    /// The current token.
    #[inline]
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// The underlying preprocessor, for rescan rules.
    #[inline]
    pub fn pre(&mut self) -> &mut Preprocessor<'a> {
        &mut self.pre
    }

    /// Whole working buffer.
    #[inline]
    pub fn text(&self) -> &'a str {
        self.pre.text()
    }

    #[inline]
    pub fn is_eof(&mut self) -> bool {
        self.pre.is_eof()
    }

    /// Advance to and classify the next token.
    pub fn scan(&mut self) -> &Token {
        let start = self.pre.pos();
        let column = self.pre.column();
        let kind = match self.pre.read() {
            None => TokenKind::End,
            Some('\n') => TokenKind::Newline,
            Some(c) if is_inline_whitespace(c) => {
                while self.pre.peek().is_some_and(is_inline_whitespace) {
                    self.pre.read();
                }
                TokenKind::Spaces
            }
            Some(c) if c.is_ascii_punctuation() || is_unicode_punctuation(c) => {
                TokenKind::Punct(c)
            }
            Some(_) => {
                while self.pre.peek().is_some_and(is_text_char) {
                    self.pre.read();
                }
                TokenKind::Text
            }
        };
        self.token = Token {
            kind,
            span: Span::new(start, self.pre.pos()),
            column,
            value: None,
        };
        &self.token
    }

    /// Reinterpret the current token against a narrower sub-grammar.
    ///
    /// The rule sees the scanner repositioned to the token's start and may
    /// consume further characters. On a match the produced token replaces
    /// the current one; on `None` the current token is left unchanged.
    /// Rollback on failure is the rule's own responsibility (via
    /// `Preprocessor::speculate`); callers needing full rollback of a match
    /// wrap the call in their own speculate.
    pub fn rescan(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Option<Token>,
    ) -> bool {
        let current = self.token.span;
        self.pre.set_pos(current.start);
        match rule(self) {
            Some(token) => {
                debug_assert_eq!(
                    token.span.start, current.start,
                    "rescan rule must keep the token start"
                );
                debug_assert_eq!(
                    token.span.end,
                    self.pre.pos(),
                    "rescan rule must leave the cursor at the token end"
                );
                self.token = token;
                true
            }
            None => {
                // The rule restored the cursor to the token start; resync to
                // the unchanged token's end.
                self.pre.set_pos(current.end);
                false
            }
        }
    }

    /// Build a token ending at the current cursor position.
    ///
    /// Helper for rescan rules.
    pub fn make_token(&self, kind: TokenKind, start: u32, column: u32) -> Token {
        Token {
            kind,
            span: Span::new(start, self.pre.pos()),
            column,
            value: None,
        }
    }

    /// Consume up to (but excluding) the next line terminator.
    ///
    /// A pending partial tab is re-expanded into leading spaces first.
    pub fn scan_line(&mut self) -> ScannedLine<'a> {
        let start = self.pre.pos();
        while self.pre.peek().is_some_and(|c| c != '\n') {
            self.pre.read();
        }
        let end = self.pre.pos();
        debug_assert!(
            self.pre.peek().is_none_or(|c| c == '\n'),
            "scan_line must stop at a line boundary"
        );
        let slice = &self.pre.text()[start as usize..end as usize];
        let expanded = std::mem::take(&mut self.partial_tab);
        let text = if expanded > 0 {
            let mut s = String::with_capacity(slice.len() + expanded as usize);
            for _ in 0..expanded {
                s.push(' ');
            }
            s.push_str(slice);
            Cow::Owned(s)
        } else {
            Cow::Borrowed(slice)
        };
        ScannedLine {
            text,
            pos: start,
            expanded,
        }
    }

    /// Consume the line terminator after `scan_line`, if any.
    pub fn consume_newline(&mut self) -> bool {
        if self.pre.peek() == Some('\n') {
            self.pre.read();
            true
        } else {
            false
        }
    }

    /// Consume whitespace columns up to `target_column`, splitting a tab
    /// that straddles the target into a pending partial remainder.
    ///
    /// Returns the column actually reached (less than the target when a
    /// non-space character intervenes).
    pub fn consume_indent(&mut self, target_column: u32) -> u32 {
        while self.logical_column() < target_column {
            if self.partial_tab > 0 {
                self.partial_tab -= 1;
                continue;
            }
            match self.pre.peek() {
                Some(' ') => {
                    self.pre.read();
                }
                Some('\t') => {
                    self.pre.read();
                    let col = self.pre.column();
                    if col > target_column {
                        self.partial_tab = col - target_column;
                    }
                }
                _ => break,
            }
        }
        self.logical_column().min(target_column)
    }

    /// Column of the cursor with pending partial-tab spaces subtracted.
    ///
    /// Container prefixes measure indentation against this, so a tab split
    /// across a container boundary counts its leftover columns as content.
    #[inline]
    pub fn logical_column(&self) -> u32 {
        self.pre.column() - self.partial_tab
    }

    /// Columns of whitespace ahead of the cursor on this line.
    pub fn peek_indent(&mut self) -> u32 {
        let base = self.pre.column();
        self.pre
            .speculate(true, |p| {
                while matches!(p.peek(), Some(' ' | '\t')) {
                    p.read();
                }
                Some(p.column() - base)
            })
            .unwrap_or(0)
        + self.partial_tab
    }

    /// Whether the rest of the current line is blank.
    pub fn rest_is_blank(&mut self) -> bool {
        self.pre
            .speculate(true, |p| {
                loop {
                    match p.peek() {
                        None | Some('\n') => return Some(true),
                        Some(' ' | '\t') => {
                            p.read();
                        }
                        Some(_) => return Some(false),
                    }
                }
            })
            .unwrap_or(true)
    }

    /// Discard whitespace (and any pending partial tab) up to the first
    /// non-space character or line end.
    pub fn skip_line_leading_ws(&mut self) {
        self.partial_tab = 0;
        while matches!(self.pre.peek(), Some(' ' | '\t')) {
            self.pre.read();
        }
    }

    /// Capture cursor state including the pending partial tab.
    pub fn checkpoint(&self) -> ScannerCheckpoint {
        ScannerCheckpoint {
            pre: self.pre.checkpoint(),
            partial_tab: self.partial_tab,
        }
    }

    /// Restore a previously captured scanner state.
    ///
    /// The current token is not restored; callers rescan after restoring.
    pub fn restore(&mut self, cp: ScannerCheckpoint) {
        self.pre.restore(cp.pre);
        self.partial_tab = cp.partial_tab;
    }
}

/// Scanner state capture: preprocessor checkpoint plus partial-tab columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScannerCheckpoint {
    pre: Checkpoint,
    partial_tab: u32,
}

/// Whitespace other than line feeds (tab included; Unicode per table).
#[inline]
pub fn is_inline_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t') || (c != '\n' && is_unicode_whitespace(c))
}

fn is_text_char(c: char) -> bool {
    c != '\n'
        && !is_inline_whitespace(c)
        && !c.is_ascii_punctuation()
        && !is_unicode_punctuation(c)
}

/// Sorted, inclusive ranges of Unicode whitespace (Zs plus line tabulation
/// relatives).
const WHITESPACE_RANGES: &[(u32, u32)] = &[
    (0x0009, 0x000D),
    (0x0020, 0x0020),
    (0x00A0, 0x00A0),
    (0x1680, 0x1680),
    (0x2000, 0x200A),
    (0x2028, 0x2029),
    (0x202F, 0x202F),
    (0x205F, 0x205F),
    (0x3000, 0x3000),
];

/// Sorted, inclusive ranges covering the Unicode punctuation categories
/// (Pc, Pd, Pe, Pf, Pi, Po, Ps) plus the symbol blocks CommonMark's
/// flanking rules treat as punctuation.
const PUNCTUATION_RANGES: &[(u32, u32)] = &[
    (0x0021, 0x002F),
    (0x003A, 0x0040),
    (0x005B, 0x0060),
    (0x007B, 0x007E),
    (0x00A1, 0x00A9),
    (0x00AB, 0x00AC),
    (0x00AE, 0x00B1),
    (0x00B4, 0x00B4),
    (0x00B6, 0x00B8),
    (0x00BB, 0x00BB),
    (0x00BF, 0x00BF),
    (0x00D7, 0x00D7),
    (0x00F7, 0x00F7),
    (0x2010, 0x2027),
    (0x2030, 0x205E),
    (0x2190, 0x2BFF),
    (0x2E00, 0x2E7F),
    (0x3001, 0x3003),
    (0x3008, 0x3011),
    (0x3014, 0x301F),
    (0x3030, 0x3030),
    (0xFD3E, 0xFD3F),
    (0xFE45, 0xFE46),
];

fn in_sorted_ranges(c: char, ranges: &[(u32, u32)]) -> bool {
    let cp = c as u32;
    ranges
        .binary_search_by(|&(lo, hi)| {
            if cp < lo {
                std::cmp::Ordering::Greater
            } else if cp > hi {
                std::cmp::Ordering::Less
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .is_ok()
}

/// Unicode whitespace per the scanner's range table.
#[inline]
pub fn is_unicode_whitespace(c: char) -> bool {
    c.is_ascii() && matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
        || !c.is_ascii() && in_sorted_ranges(c, WHITESPACE_RANGES)
}

/// Unicode punctuation per the scanner's range table.
#[inline]
pub fn is_unicode_punctuation(c: char) -> bool {
    if c.is_ascii() {
        c.is_ascii_punctuation()
    } else {
        in_sorted_ranges(c, PUNCTUATION_RANGES)
    }
}
