//! Lazily built offset ↔ (line, column) index over a fixed text buffer.
//!
//! Independent of the live parse: tooling uses it to turn node spans into
//! editor coordinates. Out-of-range inputs clamp instead of failing.

use std::cell::OnceCell;

use memchr::memchr_iter;

/// Zero-based line/column pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

/// Offset ↔ (line, column) index over a fixed string.
///
/// Line starts are computed on first use and cached; offset → line is a
/// binary search, line → offset a direct index.
pub struct LineMap<'a> {
    text: &'a str,
    starts: OnceCell<Vec<u32>>,
}

impl<'a> LineMap<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            starts: OnceCell::new(),
        }
    }

    fn line_starts(&self) -> &[u32] {
        self.starts.get_or_init(|| {
            let mut starts = Vec::with_capacity(self.text.len() / 32 + 1);
            starts.push(0);
            for nl in memchr_iter(b'\n', self.text.as_bytes()) {
                starts.push((nl + 1) as u32);
            }
            starts
        })
    }

    /// Number of lines (at least 1, even for an empty buffer).
    pub fn line_count(&self) -> u32 {
        self.line_starts().len() as u32
    }

    /// Translate a byte offset to line/column, clamping past-the-end offsets.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let offset = offset.min(self.text.len() as u32);
        let starts = self.line_starts();
        let line = match starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        LineCol {
            line: line as u32,
            column: offset - starts[line],
        }
    }

    /// Byte offset of the start of `line`, clamping past-the-end lines.
    pub fn line_start(&self, line: u32) -> u32 {
        let starts = self.line_starts();
        let line = (line as usize).min(starts.len() - 1);
        starts[line]
    }

    /// Translate a line/column pair back to a byte offset, clamping the
    /// column to the line's length.
    pub fn offset(&self, pos: LineCol) -> u32 {
        let starts = self.line_starts();
        let line = (pos.line as usize).min(starts.len() - 1);
        let start = starts[line];
        let end = starts
            .get(line + 1)
            .map(|&s| s.saturating_sub(1))
            .unwrap_or(self.text.len() as u32);
        (start + pos.column).min(end)
    }
}
