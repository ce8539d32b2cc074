//! Phase 2: inline structure.
//!
//! Each deferred task from the block phase gets one scanner pass over its
//! content buffer. Plain text accumulates in a pending run; special
//! characters either resolve immediately (escapes, entities, code spans,
//! autolinks, raw HTML, inline tags) or push a frame onto the delimiter or
//! bracket stack for deferred matching. Emphasis is resolved when a
//! bracket closes over its sub-range and once more at the end of the task.

mod autolink;
mod bracket;
mod code_span;
mod delimiter;
mod html;

use smallvec::SmallVec;

use crate::Options;
use crate::diag::DiagnosticId;
use crate::limits::MAX_TAG_NAME_LEN;
use crate::link_syntax::decode_entity_at;
use crate::range::Span;
use crate::scanner::{Scanner, Token, TokenKind};
use crate::tree::{Document, NodeId, NodeKind};

use crate::block::InlineTask;
use bracket::Bracket;
use delimiter::Delimiter;

/// Run phase 2 over every task produced by the block phase.
pub(crate) fn process(doc: &mut Document, tasks: &[InlineTask], options: &Options) {
    for task in tasks {
        InlineParser::new(doc, task, options).run();
    }
}

pub(super) struct InlineParser<'d, 't, 'o> {
    pub(super) doc: &'d mut Document,
    pub(super) task: &'t InlineTask,
    pub(super) options: &'o Options,
    pub(super) scanner: Scanner<'t>,
    pub(super) delims: SmallVec<[Delimiter; 16]>,
    pub(super) brackets: SmallVec<[Bracket; 8]>,
    /// Pending literal text and its content-coordinate extent.
    run: String,
    run_start: u32,
    run_end: u32,
}

impl<'d, 't, 'o> InlineParser<'d, 't, 'o> {
    fn new(doc: &'d mut Document, task: &'t InlineTask, options: &'o Options) -> Self {
        Self {
            doc,
            task,
            options,
            scanner: Scanner::new(&task.content),
            delims: SmallVec::new(),
            brackets: SmallVec::new(),
            run: String::new(),
            run_start: 0,
            run_end: 0,
        }
    }

    fn run(&mut self) {
        loop {
            let token = self.scanner.scan().clone();
            match token.kind {
                TokenKind::End => break,
                TokenKind::Newline => self.handle_newline(&token),
                TokenKind::Spaces => self.append_token_text(&token),
                TokenKind::Text => self.handle_text(&token),
                TokenKind::Punct(c) => self.handle_punct(c, &token),
                _ => self.append_token_text(&token),
            }
        }
        self.flush_run();
        self.process_delimiters(0);
        self.merge_runs(self.task.node);
    }

    /// Content offset to working-buffer offset.
    #[inline]
    pub(super) fn to_working(&self, pos: u32) -> u32 {
        self.task.to_working(pos)
    }

    fn handle_text(&mut self, token: &Token) {
        let slice = &self.scanner.text()[token.span.start as usize..token.span.end as usize];
        if self.options.autolinks
            && matches!(slice, "www" | "http" | "https" | "ftp")
            && self.try_extended_url(token)
        {
            return;
        }
        self.append_token_text(token);
    }

    fn handle_punct(&mut self, c: char, token: &Token) {
        match c {
            '\\' => self.handle_escape(token),
            '`' => self.code_span(token),
            '*' | '_' => self.handle_delimiter_run(c, token),
            '~' if self.options.strikethrough => self.handle_delimiter_run(c, token),
            '[' => self.open_bracket(false, token.span.start, token.span.end),
            '!' if self.scanner.pre().peek() == Some('[') => {
                self.scanner.pre().read();
                let end = self.scanner.pre().pos();
                self.open_bracket(true, token.span.start, end);
            }
            ']' => self.close_bracket(token),
            '<' => self.handle_angle(token),
            '&' => self.handle_entity(token),
            '{' if self.options.doc_tags => {
                if !self.handle_inline_tag(token) {
                    self.append_token_text(token);
                }
            }
            '@' if self.options.autolinks => {
                if !self.try_extended_email(token) {
                    self.append_token_text(token);
                }
            }
            _ => self.append_token_text(token),
        }
    }

    fn handle_escape(&mut self, token: &Token) {
        match self.scanner.pre().peek() {
            Some('\n') => {
                self.scanner.pre().read();
                let end = self.scanner.pre().pos();
                self.trim_trailing_spaces();
                self.flush_run();
                self.append_node(
                    NodeKind::HardBreak,
                    Span::new(self.to_working(token.span.start), self.to_working(end)),
                );
            }
            Some(c) if c.is_ascii_punctuation() => {
                self.scanner.pre().read();
                let end = self.scanner.pre().pos();
                let mut buf = [0u8; 4];
                self.append_lit(c.encode_utf8(&mut buf), token.span.start, end);
            }
            _ => self.append_token_text(token),
        }
    }

    fn handle_newline(&mut self, token: &Token) {
        let trailing = self.run.len() - self.run.trim_end_matches(' ').len();
        let hard = trailing >= 2;
        self.trim_trailing_spaces();
        self.flush_run();
        let kind = if hard {
            NodeKind::HardBreak
        } else {
            NodeKind::SoftBreak
        };
        self.append_node(
            kind,
            Span::new(
                self.to_working(token.span.start),
                self.to_working(token.span.end),
            ),
        );
    }

    fn handle_entity(&mut self, token: &Token) {
        let rest = &self.scanner.text()[token.span.start as usize..];
        match decode_entity_at(rest) {
            Some((decoded, len)) => {
                // The `&` itself is already consumed.
                for _ in 1..len {
                    self.scanner.pre().read();
                }
                let end = self.scanner.pre().pos();
                self.append_lit(&decoded, token.span.start, end);
            }
            None => self.append_token_text(token),
        }
    }

    fn handle_angle(&mut self, token: &Token) {
        if self.scanner.rescan(autolink::rescan_autolink) {
            let t = self.scanner.token().clone();
            let TokenKind::AutolinkUri { email } = t.kind else {
                return;
            };
            self.flush_run();
            self.append_node(
                NodeKind::Autolink {
                    uri: t.value.unwrap_or_default(),
                    email,
                },
                Span::new(self.to_working(t.span.start), self.to_working(t.span.end)),
            );
            return;
        }
        if self.options.allow_html && self.scanner.rescan(html::rescan_html_inline) {
            let t = self.scanner.token().clone();
            self.flush_run();
            self.append_node(
                NodeKind::HtmlInline {
                    literal: t.value.unwrap_or_default(),
                },
                Span::new(self.to_working(t.span.start), self.to_working(t.span.end)),
            );
            return;
        }
        self.append_token_text(token);
    }

    /// Parse a `{@name content}` inline tag; false leaves the `{` literal.
    fn handle_inline_tag(&mut self, token: &Token) -> bool {
        if self.scanner.pre().peek() != Some('@') {
            return false;
        }
        let cp = self.scanner.checkpoint();
        self.scanner.pre().read();
        let mut name = String::new();
        while let Some(c) = self.scanner.pre().peek() {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                self.scanner.pre().read();
                name.push(c);
            } else {
                break;
            }
        }
        if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
            self.scanner.restore(cp);
            return false;
        }
        if name.len() as u32 > MAX_TAG_NAME_LEN {
            let end = self.scanner.pre().pos();
            let span = Span::new(self.to_working(token.span.start), self.to_working(end));
            self.doc.diagnostics.report(
                DiagnosticId::MalformedTagName,
                format!("tag name `@{name}` exceeds {MAX_TAG_NAME_LEN} characters"),
                span,
            );
            self.scanner.restore(cp);
            return false;
        }
        if matches!(self.scanner.pre().peek(), Some(' ' | '\t')) {
            self.scanner.pre().read();
        }
        let mut content = String::new();
        let mut depth = 0u32;
        loop {
            match self.scanner.pre().read() {
                None => {
                    let end = self.scanner.pre().pos();
                    let span =
                        Span::new(self.to_working(token.span.start), self.to_working(end));
                    self.doc.diagnostics.report(
                        DiagnosticId::UnterminatedInlineTag,
                        format!("`{{@{name}` tag is never closed"),
                        span,
                    );
                    self.scanner.restore(cp);
                    return false;
                }
                Some('}') if depth == 0 => break,
                Some('}') => {
                    depth -= 1;
                    content.push('}');
                }
                Some('{') => {
                    depth += 1;
                    content.push('{');
                }
                Some(c) => content.push(c),
            }
        }
        let end = self.scanner.pre().pos();
        self.flush_run();
        self.append_node(
            NodeKind::InlineTag { name, content },
            Span::new(self.to_working(token.span.start), self.to_working(end)),
        );
        true
    }

    // --- pending run ------------------------------------------------------

    pub(super) fn append_token_text(&mut self, token: &Token) {
        let slice = &self.scanner.text()[token.span.start as usize..token.span.end as usize];
        if self.run.is_empty() {
            self.run_start = token.span.start;
        }
        self.run.push_str(slice);
        self.run_end = token.span.end;
    }

    pub(super) fn append_lit(&mut self, text: &str, start: u32, end: u32) {
        if self.run.is_empty() {
            self.run_start = start;
        }
        self.run.push_str(text);
        self.run_end = end;
    }

    fn trim_trailing_spaces(&mut self) {
        let trailing = self.run.len() - self.run.trim_end_matches(' ').len();
        if trailing > 0 {
            self.run.truncate(self.run.len() - trailing);
            self.run_end -= trailing as u32;
        }
    }

    /// Byte length of the pending run and its content end offset.
    pub(super) fn run_state(&self) -> (usize, u32) {
        (self.run.len(), self.run_end)
    }

    /// Drop `bytes` from the end of the pending run, if it ends with `tail`.
    pub(super) fn steal_run_tail(&mut self, tail: &str) -> bool {
        if !self.run.ends_with(tail) {
            return false;
        }
        self.run.truncate(self.run.len() - tail.len());
        self.run_end -= tail.len() as u32;
        true
    }

    pub(super) fn flush_run(&mut self) {
        if self.run.is_empty() {
            return;
        }
        let span = Span::new(self.to_working(self.run_start), self.to_working(self.run_end));
        let text = std::mem::take(&mut self.run);
        let node = self.doc.new_node(NodeKind::Run { text }, span);
        self.doc.append_child(self.task.node, node);
    }

    pub(super) fn append_node(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let node = self.doc.new_node(kind, span);
        self.doc.append_child(self.task.node, node);
        node
    }

    /// Merge adjacent literal runs left over from unmatched delimiters and
    /// brackets.
    fn merge_runs(&mut self, parent: NodeId) {
        let mut child = self.doc.first_child(parent);
        while let Some(c) = child {
            let mut next = self.doc.next_sibling(c);
            while let Some(n) = next {
                let both_runs = matches!(self.doc.kind(c), NodeKind::Run { .. })
                    && matches!(self.doc.kind(n), NodeKind::Run { .. });
                if !both_runs {
                    break;
                }
                let (n_text, n_span) = {
                    let node = self.doc.node(n);
                    let NodeKind::Run { text } = &node.kind else {
                        break;
                    };
                    (text.clone(), node.span)
                };
                self.doc.detach(n);
                let merged = self.doc.node_mut(c);
                if let NodeKind::Run { text } = &mut merged.kind {
                    text.push_str(&n_text);
                }
                merged.span = merged.span.cover(n_span);
                next = self.doc.next_sibling(c);
            }
            if self.doc.first_child(c).is_some() {
                self.merge_runs(c);
            }
            child = self.doc.next_sibling(c);
        }
    }
}
