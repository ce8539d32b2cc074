//! Link and image bracket stack.
//!
//! `[` and `![` enter the tree as literal runs paired with a stack frame;
//! `]` tries the inline, full, collapsed and shortcut forms in that order.
//! A match wraps the nodes after the opener into a Link/Image node and
//! deactivates enclosing link openers, so links never nest.

use crate::link_ref::normalize_label;
use crate::link_syntax::{rescan_link_destination, rescan_link_label, rescan_link_title};
use crate::preprocess::Preprocessor;
use crate::range::Span;
use crate::scanner::{Token, TokenKind};
use crate::tree::{LinkData, NodeId, NodeKind};

use super::InlineParser;

pub(super) struct Bracket {
    /// The literal `[` / `![` run in the tree.
    pub(super) node: NodeId,
    pub(super) image: bool,
    pub(super) active: bool,
    /// Another bracket opened after this one (suppresses the shortcut form).
    pub(super) bracket_after: bool,
    /// Delimiter stack height when the bracket was pushed.
    pub(super) delim_bottom: usize,
    /// Content offset of the `[` (or `!`).
    pub(super) text_pos: u32,
    /// Content offset just after the `[`.
    pub(super) content_start: u32,
}

impl InlineParser<'_, '_, '_> {
    pub(super) fn open_bracket(&mut self, image: bool, start: u32, end: u32) {
        self.flush_run();
        let text = if image { "![" } else { "[" };
        let span = Span::new(self.to_working(start), self.to_working(end));
        let node = self.append_node(
            NodeKind::Run {
                text: text.to_string(),
            },
            span,
        );
        if let Some(last) = self.brackets.last_mut() {
            last.bracket_after = true;
        }
        self.brackets.push(Bracket {
            node,
            image,
            active: true,
            bracket_after: false,
            delim_bottom: self.delims.len(),
            text_pos: start,
            content_start: end,
        });
    }

    pub(super) fn close_bracket(&mut self, token: &Token) {
        self.flush_run();
        let Some(b) = self.brackets.pop() else {
            self.append_token_text(token);
            return;
        };
        if !b.active {
            self.append_token_text(token);
            return;
        }
        let close_pos = token.span.start;
        let raw_content =
            &self.scanner.text()[b.content_start as usize..close_pos as usize];

        let mut inline_data = None;
        if self.scanner.pre().peek() == Some('(') {
            if let Some((destination, title)) = self.parse_inline_suffix() {
                inline_data = Some(LinkData::inline(destination, title));
            }
        }
        let mut matched_label = None;
        if inline_data.is_none() {
            if self.scanner.pre().peek() == Some('[') {
                matched_label = self.parse_reference_suffix(raw_content);
            } else if !b.bracket_after {
                // Shortcut form.
                let label = normalize_label(raw_content);
                if !label.is_empty() && self.doc.link_refs.lookup(&label).is_some() {
                    matched_label = Some(label);
                }
            }
        }

        let data = match (inline_data, matched_label) {
            (Some(data), _) => data,
            (None, Some(label)) => LinkData::reference(label),
            (None, None) => {
                // The opener stays a literal run; so does this bracket.
                self.append_token_text(token);
                return;
            }
        };

        let end_pos = self.scanner.pre().pos();
        let kind = if b.image {
            NodeKind::Image(data)
        } else {
            NodeKind::Link(data)
        };
        let span = Span::new(self.to_working(b.text_pos), self.to_working(end_pos));
        self.process_delimiters(b.delim_bottom);

        let link = self.doc.new_node(kind, span);
        self.doc.insert_before(b.node, link);
        self.doc.detach(b.node);
        while let Some(n) = self.doc.next_sibling(link) {
            self.doc.detach(n);
            self.doc.append_child(link, n);
        }
        if !b.image {
            for br in &mut self.brackets {
                if !br.image {
                    br.active = false;
                }
            }
        }
    }

    /// Parse `(destination "title")` after a closing bracket.
    fn parse_inline_suffix(&mut self) -> Option<(String, Option<String>)> {
        let cp = self.scanner.checkpoint();
        if self.scanner.pre().read() != Some('(') {
            self.scanner.restore(cp);
            return None;
        }
        skip_ws(self.scanner.pre());
        let destination = if self.scanner.pre().peek() == Some(')') {
            String::new()
        } else {
            if self.scanner.scan().kind == TokenKind::End
                || !self.scanner.rescan(rescan_link_destination)
            {
                self.scanner.restore(cp);
                return None;
            }
            self.scanner.token().value.clone().unwrap_or_default()
        };
        let before = self.scanner.pre().pos();
        skip_ws(self.scanner.pre());
        let spaced = self.scanner.pre().pos() > before;
        let title = if spaced && matches!(self.scanner.pre().peek(), Some('"' | '\'' | '(')) {
            if self.scanner.scan().kind == TokenKind::End
                || !self.scanner.rescan(rescan_link_title)
            {
                self.scanner.restore(cp);
                return None;
            }
            let title = self.scanner.token().value.clone();
            skip_ws(self.scanner.pre());
            title
        } else {
            None
        };
        if self.scanner.pre().peek() != Some(')') {
            self.scanner.restore(cp);
            return None;
        }
        self.scanner.pre().read();
        Some((destination, title))
    }

    /// Parse a `[label]` suffix (full form) or `[]` (collapsed form).
    ///
    /// Returns the normalized label only when it is defined; an undefined
    /// label leaves the cursor untouched and the bracket unmatched.
    fn parse_reference_suffix(&mut self, raw_content: &str) -> Option<String> {
        let cp = self.scanner.checkpoint();
        if self.scanner.scan().kind == TokenKind::End
            || !self.scanner.rescan(rescan_link_label)
        {
            self.scanner.restore(cp);
            return None;
        }
        let raw = self.scanner.token().value.clone().unwrap_or_default();
        let label = if raw.trim().is_empty() {
            normalize_label(raw_content)
        } else {
            normalize_label(&raw)
        };
        if !label.is_empty() && self.doc.link_refs.lookup(&label).is_some() {
            Some(label)
        } else {
            self.scanner.restore(cp);
            None
        }
    }
}

/// Skip spaces, tabs and line feeds between inline-link components.
///
/// Paragraph buffers never contain blank lines, so newlines need no cap.
fn skip_ws(p: &mut Preprocessor<'_>) {
    while matches!(p.peek(), Some(' ' | '\t' | '\n')) {
        p.read();
    }
}
