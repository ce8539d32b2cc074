//! Character preprocessor: normalizing code-point reader with rollback.
//!
//! Normalizes raw source into a logical stream (NUL to U+FFFD, every line
//! terminator to a single LF) while tracking zero-based line/column
//! positions, with tabs advancing the column to the next multiple of 4.
//! `speculate` is the single rollback primitive every speculative operation
//! in the parser builds on; the `peek*` family is expressed in terms of it.

use crate::source_map::Mapper;

/// Tab stop width used for column accounting.
pub const TAB_SIZE: u32 = 4;

/// Immutable capture of reader state.
///
/// Restoring a checkpoint is indistinguishable from never having advanced.
/// Cheap to copy and equality-comparable so repeated captures deduplicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    pub pos: u32,
    pub line: u32,
    pub column: u32,
}

/// Normalizing code-point reader over a text buffer.
pub struct Preprocessor<'a> {
    text: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    /// Furthest offset ever read; repositioning beyond it is a bug.
    furthest: usize,
    /// Raw offsets of line starts seen so far, always beginning with 0.
    line_starts: Vec<u32>,
}

impl<'a> Preprocessor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            line: 0,
            column: 0,
            furthest: 0,
            line_starts: vec![0],
        }
    }

    /// Current byte offset into the underlying buffer.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos as u32
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    #[inline]
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Read the next logical code point, or `None` at end of input.
    ///
    /// NUL becomes U+FFFD; CR, CRLF, NEL, LS and PS all become a single LF.
    pub fn read(&mut self) -> Option<char> {
        let rest = &self.text[self.pos..];
        let raw = rest.chars().next()?;
        let mut width = raw.len_utf8();
        let logical = match raw {
            '\0' => '\u{FFFD}',
            '\r' => {
                if rest.as_bytes().get(1) == Some(&b'\n') {
                    width = 2;
                }
                '\n'
            }
            '\u{0085}' | '\u{2028}' | '\u{2029}' => '\n',
            c => c,
        };
        self.pos += width;
        if self.pos > self.furthest {
            self.furthest = self.pos;
        }
        if logical == '\n' {
            self.line += 1;
            self.column = 0;
            self.record_line_start(self.pos as u32);
        } else if raw == '\t' {
            self.column = (self.column / TAB_SIZE + 1) * TAB_SIZE;
        } else {
            self.column += 1;
        }
        Some(logical)
    }

    fn record_line_start(&mut self, pos: u32) {
        // Forward reading is monotonic, so a new line start is always past
        // the last recorded one; re-reads after a restore hit this branch.
        if *self.line_starts.last().unwrap() < pos {
            self.line_starts.push(pos);
        }
    }

    /// Capture the current state.
    #[inline]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos as u32,
            line: self.line,
            column: self.column,
        }
    }

    /// Restore a previously captured state.
    #[inline]
    pub fn restore(&mut self, cp: Checkpoint) {
        debug_assert!(cp.pos as usize <= self.furthest);
        self.pos = cp.pos as usize;
        self.line = cp.line;
        self.column = cp.column;
    }

    /// Run `f` speculatively. The pre-call state is restored either
    /// unconditionally (`restore_always`) or only when `f` yields no result.
    pub fn speculate<T>(
        &mut self,
        restore_always: bool,
        f: impl FnOnce(&mut Self) -> Option<T>,
    ) -> Option<T> {
        let cp = self.checkpoint();
        let result = f(self);
        if restore_always || result.is_none() {
            self.restore(cp);
        }
        result
    }

    /// Reposition the cursor to a byte offset at or before the furthest
    /// point ever read.
    ///
    /// Snaps backward off char boundaries and off the LF of a CRLF pair.
    /// Line/column are recomputed by binary search only when the line
    /// actually changed; otherwise the column is adjusted incrementally,
    /// except that tabs in the skipped-over text force a full recompute.
    ///
    /// # Panics
    /// Panics if `pos` lies beyond the furthest offset read, since the
    /// line-start index is only built by monotonic forward reading.
    pub fn set_pos(&mut self, pos: u32) {
        let mut pos = pos as usize;
        assert!(
            pos <= self.furthest,
            "cannot reposition to {pos}: beyond furthest read offset {}",
            self.furthest
        );
        while pos > 0 && !self.text.is_char_boundary(pos) {
            pos -= 1;
        }
        if pos > 0
            && pos < self.text.len()
            && self.text.as_bytes()[pos] == b'\n'
            && self.text.as_bytes()[pos - 1] == b'\r'
        {
            pos -= 1;
        }
        let line = self.line_of(pos as u32);
        if line == self.line && pos >= self.pos {
            let between = &self.text[self.pos..pos];
            if between.as_bytes().contains(&b'\t') {
                self.column = self.column_at(line, pos);
            } else {
                self.column += between.chars().count() as u32;
            }
        } else {
            self.line = line;
            self.column = self.column_at(line, pos);
        }
        self.pos = pos;
    }

    /// Line number of a raw offset, from the recorded line starts.
    fn line_of(&self, pos: u32) -> u32 {
        match self.line_starts.binary_search(&pos) {
            Ok(i) => i as u32,
            Err(i) => (i - 1) as u32,
        }
    }

    /// Column of `pos` recomputed from its line start, honoring tab stops.
    fn column_at(&self, line: u32, pos: usize) -> u32 {
        let start = self.line_starts[line as usize] as usize;
        let mut column = 0u32;
        for c in self.text[start..pos].chars() {
            if c == '\t' {
                column = (column / TAB_SIZE + 1) * TAB_SIZE;
            } else {
                column += 1;
            }
        }
        column
    }

    // Pure lookaheads, all expressed via `speculate` + `read`.

    /// Peek the next logical code point without advancing.
    #[inline]
    pub fn peek(&mut self) -> Option<char> {
        self.speculate(true, |p| p.read())
    }

    /// Count consecutive upcoming code points satisfying `pred`.
    pub fn peek_count(&mut self, mut pred: impl FnMut(char) -> bool) -> u32 {
        self.speculate(true, |p| {
            let mut count = 0u32;
            while let Some(c) = p.peek() {
                if !pred(c) {
                    break;
                }
                p.read();
                count += 1;
            }
            Some(count)
        })
        .unwrap_or(0)
    }

    /// Like `peek_count`, but yields `None` when fewer than `min` match.
    pub fn peek_min_count(
        &mut self,
        min: u32,
        pred: impl FnMut(char) -> bool,
    ) -> Option<u32> {
        let count = self.peek_count(pred);
        (count >= min).then_some(count)
    }

}

/// Normalize a raw buffer into a logical working buffer, composing the
/// normalization shifts with the caller's source mapping segments into a
/// single working-offset → original-source mapper.
pub fn normalize(raw: &str, source_map: &Mapper) -> (String, Mapper) {
    let mut out = String::with_capacity(raw.len());
    let mut map = Mapper::default();
    let mut pre = Preprocessor::new(raw);
    loop {
        let raw_pos = pre.pos();
        let Some(c) = pre.read() else { break };
        map.push(out.len() as u32, source_map.to_source(raw_pos));
        out.push(c);
    }
    (out, map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_map::MappingSegment;

    #[test]
    fn test_read_plain() {
        let mut p = Preprocessor::new("ab");
        assert_eq!(p.read(), Some('a'));
        assert_eq!(p.read(), Some('b'));
        assert_eq!(p.read(), None);
        assert_eq!(p.read(), None);
    }

    #[test]
    fn test_line_ending_normalization() {
        let mut p = Preprocessor::new("a\r\nb\rc\nd\u{2028}e");
        let mut got = String::new();
        while let Some(c) = p.read() {
            got.push(c);
        }
        assert_eq!(got, "a\nb\nc\nd\ne");
        assert_eq!(p.line(), 4);
    }

    #[test]
    fn test_nul_replacement() {
        let mut p = Preprocessor::new("a\0b");
        assert_eq!(p.read(), Some('a'));
        assert_eq!(p.read(), Some('\u{FFFD}'));
        assert_eq!(p.read(), Some('b'));
    }

    #[test]
    fn test_tab_columns() {
        let mut p = Preprocessor::new("a\tb\tc");
        p.read(); // a -> col 1
        assert_eq!(p.column(), 1);
        p.read(); // tab -> col 4
        assert_eq!(p.column(), 4);
        p.read(); // b -> col 5
        p.read(); // tab -> col 8
        assert_eq!(p.column(), 8);
    }

    #[test]
    fn test_line_column_tracking() {
        let mut p = Preprocessor::new("ab\ncd");
        p.read();
        p.read();
        assert_eq!((p.line(), p.column()), (0, 2));
        p.read(); // newline
        assert_eq!((p.line(), p.column()), (1, 0));
        p.read();
        assert_eq!((p.line(), p.column()), (1, 1));
    }

    #[test]
    fn test_speculate_restores_on_none() {
        let mut p = Preprocessor::new("abc");
        let r: Option<()> = p.speculate(false, |p| {
            p.read();
            p.read();
            None
        });
        assert!(r.is_none());
        assert_eq!(p.pos(), 0);
        assert_eq!(p.read(), Some('a'));
    }

    #[test]
    fn test_speculate_keeps_on_some() {
        let mut p = Preprocessor::new("abc");
        let r = p.speculate(false, |p| {
            p.read();
            p.read().map(|c| c)
        });
        assert_eq!(r, Some('b'));
        assert_eq!(p.read(), Some('c'));
    }

    #[test]
    fn test_speculate_restore_always() {
        let mut p = Preprocessor::new("abc");
        let r = p.speculate(true, |p| p.read());
        assert_eq!(r, Some('a'));
        assert_eq!(p.pos(), 0);
    }

    #[test]
    fn test_checkpoint_equality() {
        let mut p = Preprocessor::new("abc");
        let a = p.checkpoint();
        let b = p.checkpoint();
        assert_eq!(a, b);
        p.read();
        assert_ne!(p.checkpoint(), a);
        p.restore(a);
        assert_eq!(p.checkpoint(), a);
    }

    #[test]
    fn test_peek_family() {
        let mut p = Preprocessor::new("aaab");
        assert_eq!(p.peek(), Some('a'));
        assert_eq!(p.pos(), 0);
        assert_eq!(p.peek_count(|c| c == 'a'), 3);
        assert_eq!(p.peek_min_count(2, |c| c == 'a'), Some(3));
        assert_eq!(p.peek_min_count(4, |c| c == 'a'), None);
        assert_eq!(p.pos(), 0);
    }

    #[test]
    fn test_set_pos_same_line_forward() {
        let mut p = Preprocessor::new("hello world");
        while p.read().is_some() {}
        p.set_pos(0);
        assert_eq!((p.line(), p.column()), (0, 0));
        p.set_pos(6);
        assert_eq!((p.line(), p.column()), (0, 6));
    }

    #[test]
    fn test_set_pos_across_lines() {
        let mut p = Preprocessor::new("ab\ncde\nf");
        while p.read().is_some() {}
        p.set_pos(4);
        assert_eq!((p.line(), p.column()), (1, 1));
        assert_eq!(p.read(), Some('d'));
        p.set_pos(7);
        assert_eq!((p.line(), p.column()), (2, 0));
    }

    #[test]
    fn test_set_pos_snaps_inside_crlf() {
        let mut p = Preprocessor::new("a\r\nb");
        while p.read().is_some() {}
        // Offset 2 is the LF of the CRLF pair; snaps back to the CR.
        p.set_pos(2);
        assert_eq!(p.pos(), 1);
        assert_eq!(p.read(), Some('\n'));
    }

    #[test]
    fn test_set_pos_snaps_char_boundary() {
        let mut p = Preprocessor::new("é!");
        while p.read().is_some() {}
        p.set_pos(1); // inside the two-byte é
        assert_eq!(p.pos(), 0);
        assert_eq!(p.read(), Some('é'));
    }

    #[test]
    fn test_set_pos_recomputes_after_tab() {
        let mut p = Preprocessor::new("a\tbc");
        while p.read().is_some() {}
        p.set_pos(0);
        p.set_pos(3); // skips over the tab on the same line
        assert_eq!(p.column(), 5);
    }

    #[test]
    fn test_set_pos_to_end_of_input() {
        let mut p = Preprocessor::new("abc");
        while p.read().is_some() {}
        p.set_pos(3);
        assert_eq!(p.pos(), 3);
        assert!(p.is_eof());
    }

    #[test]
    #[should_panic]
    fn test_set_pos_beyond_furthest_is_fatal() {
        let mut p = Preprocessor::new("abcdef");
        p.read();
        p.set_pos(5);
    }

    #[test]
    fn test_normalize_identity_map() {
        let (text, map) = normalize("a\r\nb\0c", &Mapper::identity());
        assert_eq!(text, "a\nb\u{FFFD}c");
        // 'b' is at working offset 2, raw offset 3.
        assert_eq!(map.to_source(2), 3);
        // 'c' follows the 3-byte replacement char.
        assert_eq!(map.to_source(6), 5);
    }

    #[test]
    fn test_normalize_composes_user_segments() {
        // Working buffer "ab\ncd" where each line comes from a distinct
        // source fragment (leading comment markers stripped).
        let user = Mapper::new(vec![
            MappingSegment::new(0, 4),
            MappingSegment::new(3, 20),
        ]);
        let (text, map) = normalize("ab\ncd", &user);
        assert_eq!(text, "ab\ncd");
        assert_eq!(map.to_source(0), 4);
        assert_eq!(map.to_source(1), 5);
        assert_eq!(map.to_source(3), 20);
        assert_eq!(map.to_source(4), 21);
        assert_eq!(map.to_pos(21), 4);
    }
}
