//! Canonical-form serializer.
//!
//! Walks a document back to Markdown text in a normalized shape: ATX
//! headings, `---` breaks, fence lengths derived from content, reference
//! links by their normalized label. Parsing the output again yields the
//! same tree, which is what tooling that rewrites doc comments relies on.

use crate::tree::{Document, ListMarker, NodeId, NodeKind};

/// Serialize a document to canonical Markdown.
pub fn emit(doc: &Document) -> String {
    let mut e = Emitter {
        doc,
        out: String::new(),
        prefix: String::new(),
        in_table: false,
    };
    e.blocks(doc.root(), false);
    e.out
}

struct Emitter<'a> {
    doc: &'a Document,
    out: String,
    /// Line prefix for the current container nesting (`> `, item indent).
    prefix: String,
    /// Escape `|` in runs while inside a table cell.
    in_table: bool,
}

impl Emitter<'_> {
    /// Emit the block children of `parent`, each starting on its own
    /// prefixed line. `tight` suppresses the blank separator lines.
    fn blocks(&mut self, parent: NodeId, tight: bool) {
        let mut first = true;
        for child in self.doc.children(parent) {
            if !first && !tight {
                self.blank_line();
            }
            self.line_start();
            self.block(child, tight);
            first = false;
        }
    }

    /// Like `blocks`, but the first block continues the already-started
    /// line (after a list marker or `> `).
    fn blocks_continuing(&mut self, parent: NodeId, tight: bool) {
        let mut first = true;
        for child in self.doc.children(parent) {
            if first {
                first = false;
            } else {
                if !tight {
                    self.blank_line();
                }
                self.line_start();
            }
            self.block(child, tight);
        }
        if first {
            // Empty container: close the marker line.
            self.out.push('\n');
        }
    }

    fn line_start(&mut self) {
        self.out.push_str(&self.prefix);
    }

    fn blank_line(&mut self) {
        let trimmed = self.prefix.trim_end().to_string();
        self.out.push_str(&trimmed);
        self.out.push('\n');
    }

    fn block(&mut self, id: NodeId, tight: bool) {
        match self.doc.kind(id) {
            NodeKind::Paragraph => {
                self.inlines(id);
                self.out.push('\n');
            }
            NodeKind::Heading { level } => {
                for _ in 0..*level {
                    self.out.push('#');
                }
                self.out.push(' ');
                self.inlines(id);
                self.out.push('\n');
            }
            NodeKind::ThematicBreak => self.out.push_str("---\n"),
            NodeKind::CodeBlock {
                fenced: true,
                info,
                literal,
            } => {
                let fence = "`".repeat(longest_run(literal, '`').max(2) + 1);
                self.out.push_str(&fence);
                if let Some(info) = info {
                    self.out.push_str(info);
                }
                self.out.push('\n');
                for line in literal.lines() {
                    self.line_start();
                    self.out.push_str(line);
                    self.out.push('\n');
                }
                self.line_start();
                self.out.push_str(&fence);
                self.out.push('\n');
            }
            NodeKind::CodeBlock { literal, .. } => {
                let mut first = true;
                for line in literal.lines() {
                    if !first {
                        self.line_start();
                    }
                    self.out.push_str("    ");
                    self.out.push_str(line);
                    self.out.push('\n');
                    first = false;
                }
            }
            NodeKind::HtmlBlock { literal } => {
                let mut first = true;
                for line in literal.lines() {
                    if !first {
                        self.line_start();
                    }
                    self.out.push_str(line);
                    self.out.push('\n');
                    first = false;
                }
            }
            NodeKind::BlockQuote => {
                self.out.push_str("> ");
                let saved = self.prefix.len();
                self.prefix.push_str("> ");
                self.blocks_continuing(id, false);
                self.prefix.truncate(saved);
            }
            NodeKind::List(data) => self.list(id, data.marker, data.tight),
            NodeKind::Table { .. } => self.table(id),
            NodeKind::BlockTag { name } => {
                self.out.push('@');
                self.out.push_str(name);
                if self.doc.first_child(id).is_some() {
                    self.out.push(' ');
                    self.blocks_continuing(id, false);
                } else {
                    self.out.push('\n');
                }
            }
            NodeKind::ListItem { .. } | NodeKind::TableRow { .. } | NodeKind::TableCell => {
                // Emitted by their list/table parents.
                self.blocks(id, tight);
            }
            _ => self.inline_node(id),
        }
    }

    fn list(&mut self, id: NodeId, marker: ListMarker, tight: bool) {
        let mut number = match marker {
            ListMarker::Ordered { start, .. } => start,
            ListMarker::Bullet(_) => 0,
        };
        let mut first = true;
        for item in self.doc.children(id) {
            if !first {
                if !tight {
                    self.blank_line();
                }
                self.line_start();
            }
            let head = match marker {
                ListMarker::Bullet(c) => format!("{c} "),
                ListMarker::Ordered { delim, .. } => format!("{number}{delim} "),
            };
            self.out.push_str(&head);
            if let NodeKind::ListItem {
                task: Some(checked),
            } = self.doc.kind(item)
            {
                self.out.push_str(if *checked { "[x] " } else { "[ ] " });
            }
            let saved = self.prefix.len();
            for _ in 0..head.len() {
                self.prefix.push(' ');
            }
            self.blocks_continuing(item, tight);
            self.prefix.truncate(saved);
            number += 1;
            first = false;
        }
    }

    fn table(&mut self, id: NodeId) {
        let NodeKind::Table { alignments } = self.doc.kind(id) else {
            return;
        };
        self.in_table = true;
        let mut rows = self.doc.children(id);
        if let Some(header) = rows.next() {
            self.table_row(header);
            self.line_start();
            self.out.push('|');
            for align in alignments {
                use crate::tree::Alignment;
                self.out.push_str(match align {
                    Alignment::None => " --- |",
                    Alignment::Left => " :-- |",
                    Alignment::Center => " :-: |",
                    Alignment::Right => " --: |",
                });
            }
            self.out.push('\n');
        }
        for row in rows {
            self.line_start();
            self.table_row(row);
        }
        self.in_table = false;
    }

    fn table_row(&mut self, row: NodeId) {
        self.out.push('|');
        for cell in self.doc.children(row) {
            self.out.push(' ');
            self.inlines(cell);
            self.out.push_str(" |");
        }
        self.out.push('\n');
    }

    fn inlines(&mut self, parent: NodeId) {
        for child in self.doc.children(parent) {
            self.inline_node(child);
        }
    }

    fn inline_node(&mut self, id: NodeId) {
        match self.doc.kind(id) {
            NodeKind::Run { text } => self.escaped_run(text),
            NodeKind::Code { literal } => {
                let fence = "`".repeat(longest_run(literal, '`') + 1);
                let pad = literal.starts_with([' ', '`']) || literal.ends_with([' ', '`']);
                self.out.push_str(&fence);
                if pad {
                    self.out.push(' ');
                }
                self.out.push_str(literal);
                if pad {
                    self.out.push(' ');
                }
                self.out.push_str(&fence);
            }
            NodeKind::Em => self.wrapped(id, "*"),
            NodeKind::Strong => self.wrapped(id, "**"),
            NodeKind::Strikethrough => self.wrapped(id, "~~"),
            NodeKind::Link(data) => {
                self.out.push('[');
                self.inlines(id);
                self.out.push(']');
                self.link_suffix(data);
            }
            NodeKind::Image(data) => {
                self.out.push_str("![");
                self.inlines(id);
                self.out.push(']');
                self.link_suffix(data);
            }
            NodeKind::Autolink { uri, email: _ } => {
                if uri.starts_with("www.") {
                    self.out.push_str(uri);
                } else {
                    self.out.push('<');
                    self.out.push_str(uri);
                    self.out.push('>');
                }
            }
            NodeKind::HtmlInline { literal } => self.out.push_str(literal),
            NodeKind::SoftBreak => {
                self.out.push('\n');
                self.line_start();
            }
            NodeKind::HardBreak => {
                self.out.push_str("\\\n");
                self.line_start();
            }
            NodeKind::InlineTag { name, content } => {
                self.out.push_str("{@");
                self.out.push_str(name);
                if !content.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(content);
                }
                self.out.push('}');
            }
            _ => self.block(id, false),
        }
    }

    fn wrapped(&mut self, id: NodeId, delim: &str) {
        self.out.push_str(delim);
        self.inlines(id);
        self.out.push_str(delim);
    }

    fn link_suffix(&mut self, data: &crate::tree::LinkData) {
        match (&data.destination, &data.label) {
            (Some(dest), _) => {
                self.out.push('(');
                if dest.is_empty() || dest.contains([' ', '\t', '\n', '(', ')']) {
                    self.out.push('<');
                    for c in dest.chars() {
                        if matches!(c, '<' | '>') {
                            self.out.push('\\');
                        }
                        self.out.push(c);
                    }
                    self.out.push('>');
                } else {
                    self.out.push_str(dest);
                }
                if let Some(title) = &data.title {
                    self.out.push_str(" \"");
                    for c in title.chars() {
                        if matches!(c, '"' | '\\') {
                            self.out.push('\\');
                        }
                        self.out.push(c);
                    }
                    self.out.push('"');
                }
                self.out.push(')');
            }
            (None, Some(label)) => {
                self.out.push('[');
                self.out.push_str(label);
                self.out.push(']');
            }
            (None, None) => {}
        }
    }

    /// Write run text with the characters that could change the reparse
    /// backslash-escaped.
    fn escaped_run(&mut self, text: &str) {
        for c in text.chars() {
            let escape = matches!(
                c,
                '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>' | '&' | '~' | '{' | '}' | '#'
                    | '@'
            ) || (self.in_table && c == '|');
            if escape {
                self.out.push('\\');
            }
            self.out.push(c);
        }
    }
}

/// Length of the longest run of `c` in `text`.
fn longest_run(text: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_longest_run() {
        assert_eq!(longest_run("a``b```c", '`'), 3);
        assert_eq!(longest_run("abc", '`'), 0);
    }

    #[test]
    fn test_heading_and_paragraph() {
        let out = emit(&parse("Title\n=====\n\nBody"));
        assert_eq!(out, "# Title\n\nBody\n");
    }

    #[test]
    fn test_escapes_specials() {
        let out = emit(&parse("a \\* b"));
        assert_eq!(out, "a \\* b\n");
    }

    #[test]
    fn test_tight_list() {
        let out = emit(&parse("- a\n- b"));
        assert_eq!(out, "- a\n- b\n");
    }

    #[test]
    fn test_loose_list_keeps_blank() {
        let out = emit(&parse("- a\n\n- b"));
        assert_eq!(out, "- a\n\n- b\n");
    }

    #[test]
    fn test_block_quote_nesting() {
        let out = emit(&parse("> a\n>\n> b"));
        assert_eq!(out, "> a\n>\n> b\n");
    }
}
