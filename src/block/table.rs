//! GFM table row grammar.
//!
//! A table starts when a delimiter row follows a one-line paragraph whose
//! cell count matches. Row splitting is shared between the header (re-read
//! from the paragraph buffer) and body rows.

use crate::tree::Alignment;

/// Parse a delimiter row such as `| :--- | :---: |`.
///
/// Returns one alignment per column, or `None` when the line is not a
/// delimiter row.
pub(crate) fn parse_delimiter_row(line: &str) -> Option<Vec<Alignment>> {
    if !line.contains('|') {
        return None;
    }
    let mut alignments = Vec::new();
    for cell in split_row(line) {
        let text = cell.text.trim_matches(|c| c == ' ' || c == '\t');
        let (left, rest) = match text.strip_prefix(':') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (right, dashes) = match rest.strip_suffix(':') {
            Some(dashes) => (true, dashes),
            None => (false, rest),
        };
        if dashes.is_empty() || !dashes.bytes().all(|b| b == b'-') {
            return None;
        }
        alignments.push(match (left, right) {
            (true, true) => Alignment::Center,
            (true, false) => Alignment::Left,
            (false, true) => Alignment::Right,
            (false, false) => Alignment::None,
        });
    }
    if alignments.is_empty() {
        return None;
    }
    Some(alignments)
}

/// One raw cell of a table row.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RawCell<'a> {
    pub text: &'a str,
    /// Byte offset of the trimmed text within the row line.
    pub offset: usize,
}

/// Split a row on unescaped pipes, dropping the optional leading and
/// trailing delimiters and trimming each cell.
pub(crate) fn split_row(line: &str) -> Vec<RawCell<'_>> {
    let trimmed_start = line.len() - line.trim_start_matches([' ', '\t']).len();
    let body = line.trim_matches(|c| c == ' ' || c == '\t');
    let mut base = trimmed_start;
    let mut body = body;
    if let Some(stripped) = body.strip_prefix('|') {
        base += 1;
        body = stripped;
    }
    if body.ends_with('|') && !ends_with_escape(&body[..body.len() - 1]) {
        body = &body[..body.len() - 1];
    }

    let mut cells = Vec::new();
    let mut cell_start = 0usize;
    let bytes = body.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'|' => {
                cells.push(trim_cell(body, cell_start, i, base));
                i += 1;
                cell_start = i;
            }
            _ => i += 1,
        }
    }
    cells.push(trim_cell(body, cell_start.min(body.len()), body.len(), base));
    cells
}

fn ends_with_escape(text: &str) -> bool {
    let backslashes = text.len() - text.trim_end_matches('\\').len();
    backslashes % 2 == 1
}

fn trim_cell(body: &str, start: usize, end: usize, base: usize) -> RawCell<'_> {
    let raw = &body[start..end];
    let lead = raw.len() - raw.trim_start_matches([' ', '\t']).len();
    let text = raw.trim_matches(|c| c == ' ' || c == '\t');
    RawCell {
        text,
        offset: base + start + lead,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<&str> {
        split_row(line).into_iter().map(|c| c.text).collect()
    }

    #[test]
    fn test_delimiter_row() {
        assert_eq!(
            parse_delimiter_row("| :--- | :---: | ---: | --- |"),
            Some(vec![
                Alignment::Left,
                Alignment::Center,
                Alignment::Right,
                Alignment::None
            ])
        );
        assert_eq!(parse_delimiter_row("---|---"), Some(vec![Alignment::None; 2]));
        assert_eq!(parse_delimiter_row("---"), None);
        assert_eq!(parse_delimiter_row("| a | b |"), None);
    }

    #[test]
    fn test_split_row_basic() {
        assert_eq!(texts("| a | b |"), vec!["a", "b"]);
        assert_eq!(texts("a | b"), vec!["a", "b"]);
        assert_eq!(texts("| lone |"), vec!["lone"]);
    }

    #[test]
    fn test_split_row_escaped_pipe() {
        assert_eq!(texts("| a \\| b | c |"), vec!["a \\| b", "c"]);
    }

    #[test]
    fn test_split_row_offsets() {
        let cells = split_row("| ab | cd |");
        assert_eq!(cells[0].offset, 2);
        assert_eq!(cells[1].offset, 7);
        assert_eq!(&"| ab | cd |"[2..4], "ab");
        assert_eq!(&"| ab | cd |"[7..9], "cd");
    }

    #[test]
    fn test_split_row_empty_cells() {
        assert_eq!(texts("| | x |"), vec!["", "x"]);
    }
}
