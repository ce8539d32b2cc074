//! The per-line block machine.
//!
//! Each line runs three phases over the open-block chain: continuation of
//! already-open blocks, starts of new ones, then text acceptance (or lazy
//! paragraph continuation when nothing else claimed the line). Closing a
//! block finalizes it: paragraphs shed leading reference definitions,
//! code blocks freeze their literal, lists settle tight/loose.

use smallvec::{SmallVec, smallvec};

use crate::Options;
use crate::diag::DiagnosticId;
use crate::range::Span;
use crate::scanner::{ScannedLine, Scanner};
use crate::source_map::Mapper;
use crate::tree::{Document, NodeId, NodeKind};

use super::{Continue, InlineTask, OpenBlock, OpenData, Started, refs, table};

pub(crate) struct BlockParser<'a, 'o> {
    pub(super) scanner: Scanner<'a>,
    pub(super) doc: Document,
    pub(super) open: SmallVec<[OpenBlock; 8]>,
    pub(super) tasks: Vec<InlineTask>,
    pub(super) options: &'o Options,
    /// Per-node "last line was blank" flags, for tight/loose lists.
    blank_flags: Vec<bool>,
    /// Index of the first open block that failed continuation this line.
    pub(super) first_unmatched: usize,
    /// Whether this line's unmatched tail has been closed by a start.
    pub(super) tail_closed: bool,
}

impl<'a, 'o> BlockParser<'a, 'o> {
    /// Run phase 1 over a working buffer.
    pub(crate) fn parse(text: &'a str, options: &'o Options) -> (Document, Vec<InlineTask>) {
        let doc = Document::empty();
        let root = doc.root();
        let parser = Self {
            scanner: Scanner::new(text),
            doc,
            open: smallvec![OpenBlock::new(root, OpenData::Document, 0, 0)],
            tasks: Vec::new(),
            options,
            blank_flags: Vec::new(),
            first_unmatched: 1,
            tail_closed: false,
        };
        parser.run(text.len() as u32)
    }

    fn run(mut self, len: u32) -> (Document, Vec<InlineTask>) {
        if !self.scanner.is_eof() {
            loop {
                self.process_line();
                if !self.scanner.consume_newline() || self.scanner.is_eof() {
                    break;
                }
            }
        }
        self.close_through(1);
        let root = self.doc.root();
        self.doc.node_mut(root).span = Span::new(0, len);
        (self.doc, self.tasks)
    }

    fn process_line(&mut self) {
        // Phase A: give each open block a chance to continue.
        let mut matched = 1;
        while matched < self.open.len() {
            match self.try_continue(matched) {
                Continue::Matched => matched += 1,
                Continue::Unmatched => break,
                Continue::Finished => {
                    let _ = self.scanner.scan_line();
                    self.open[matched].end_pos = self.scanner.pre().pos();
                    self.close_through(matched);
                    return;
                }
            }
        }
        self.first_unmatched = matched;
        self.tail_closed = false;

        // Phase B: try block starts at the deepest surviving block.
        let mut blank = self.scanner.rest_is_blank();
        let mut consumed_line = false;
        loop {
            let deepest = if self.tail_closed {
                self.open.len() - 1
            } else {
                self.first_unmatched - 1
            };
            if matches!(
                self.open[deepest].data,
                OpenData::FencedCode { .. }
                    | OpenData::IndentedCode
                    | OpenData::HtmlBlock { .. }
                    | OpenData::Table { .. }
            ) {
                break;
            }
            blank = self.scanner.rest_is_blank();
            if blank {
                break;
            }
            match self.try_starts() {
                Some(Started::Container) => continue,
                Some(Started::Leaf) => break,
                Some(Started::ConsumedLine) => {
                    consumed_line = true;
                    break;
                }
                None => break,
            }
        }

        // Phase C: lazy continuation, then text acceptance.
        let tip_is_para = matches!(self.open.last().map(|o| o.data), Some(OpenData::Paragraph));
        if !self.tail_closed && !blank && tip_is_para && self.first_unmatched < self.open.len() {
            self.accept_line();
            return;
        }
        if !self.tail_closed {
            let keep = self.first_unmatched;
            self.close_through(keep);
            self.tail_closed = true;
        }
        if consumed_line {
            self.mark_blank_line(false);
            return;
        }
        self.mark_blank_line(blank);

        match self.open.last().map(|o| o.data) {
            Some(OpenData::Paragraph | OpenData::FencedCode { .. } | OpenData::IndentedCode) => {
                self.accept_line();
            }
            Some(OpenData::HtmlBlock { kind }) => {
                let idx = self.open.len() - 1;
                let line = self.scanner.scan_line();
                let end = self.scanner.pre().pos();
                let ends = kind.line_ends_block(&line.text);
                self.push_content(idx, &line, end);
                if ends {
                    self.close_through(idx);
                }
            }
            Some(OpenData::Table { .. }) => self.accept_table_row(),
            _ => {
                if blank {
                    let _ = self.scanner.scan_line();
                } else {
                    // Paragraph text at list level ends the list: a list
                    // holds only items.
                    while matches!(self.open.last().map(|o| o.data), Some(OpenData::List)) {
                        let keep = self.open.len() - 1;
                        self.close_through(keep);
                    }
                    self.open_paragraph();
                    self.accept_line();
                }
            }
        }
    }

    // --- continuation -----------------------------------------------------

    fn try_continue(&mut self, i: usize) -> Continue {
        match self.open[i].data {
            OpenData::Document | OpenData::List => Continue::Matched,
            OpenData::BlockQuote => self.continue_block_quote(),
            OpenData::ListItem { content_col } => self.continue_list_item(i, content_col),
            OpenData::BlockTag => self.continue_block_tag(),
            OpenData::Paragraph => {
                if self.scanner.rest_is_blank() {
                    Continue::Unmatched
                } else {
                    Continue::Matched
                }
            }
            OpenData::FencedCode { marker, len, indent } => {
                self.continue_fenced(marker, len, indent)
            }
            OpenData::IndentedCode => self.continue_indented(),
            OpenData::HtmlBlock { kind } => {
                if kind.blank_terminated() && self.scanner.rest_is_blank() {
                    Continue::Unmatched
                } else {
                    Continue::Matched
                }
            }
            OpenData::Table { .. } => {
                if self.scanner.rest_is_blank() {
                    Continue::Unmatched
                } else {
                    Continue::Matched
                }
            }
        }
    }

    fn continue_block_quote(&mut self) -> Continue {
        let (indent, next) = self.peek_after_indent();
        if indent > 3 || next != Some('>') {
            return Continue::Unmatched;
        }
        let col = self.scanner.logical_column() + indent;
        self.scanner.consume_indent(col);
        self.scanner.pre().read();
        // One column of following whitespace belongs to the marker.
        if matches!(self.scanner.pre().peek(), Some(' ' | '\t')) {
            let col = self.scanner.logical_column();
            self.scanner.consume_indent(col + 1);
        }
        Continue::Matched
    }

    fn continue_list_item(&mut self, i: usize, content_col: u32) -> Continue {
        if self.scanner.rest_is_blank() {
            if self.doc.first_child(self.open[i].node).is_none() {
                // A blank line after an empty item closes it.
                return Continue::Unmatched;
            }
            let col = self.scanner.logical_column() + self.scanner.peek_indent();
            self.scanner.consume_indent(col);
            return Continue::Matched;
        }
        if self.scanner.logical_column() + self.scanner.peek_indent() >= content_col {
            self.scanner.consume_indent(content_col);
            Continue::Matched
        } else {
            Continue::Unmatched
        }
    }

    fn continue_block_tag(&mut self) -> Continue {
        let (indent, next) = self.peek_after_indent();
        if indent <= 3 && next == Some('@') && self.peek_tag_start() {
            Continue::Unmatched
        } else {
            Continue::Matched
        }
    }

    fn continue_fenced(&mut self, marker: char, len: u32, indent: u32) -> Continue {
        let (line_indent, next) = self.peek_after_indent();
        if line_indent <= 3 && next == Some(marker) {
            let closes = self
                .scanner
                .pre()
                .speculate(true, |p| {
                    while matches!(p.peek(), Some(' ' | '\t')) {
                        p.read();
                    }
                    let run = p.peek_min_count(len, |c| c == marker)?;
                    for _ in 0..run {
                        p.read();
                    }
                    loop {
                        match p.peek() {
                            None | Some('\n') => return Some(()),
                            Some(' ' | '\t') => {
                                p.read();
                            }
                            Some(_) => return None,
                        }
                    }
                })
                .is_some();
            if closes {
                return Continue::Finished;
            }
        }
        // Remove up to the opening fence's indentation.
        let target = self.scanner.logical_column() + line_indent.min(indent);
        self.scanner.consume_indent(target);
        Continue::Matched
    }

    fn continue_indented(&mut self) -> Continue {
        if self.scanner.peek_indent() >= 4 {
            let col = self.scanner.logical_column();
            self.scanner.consume_indent(col + 4);
            Continue::Matched
        } else if self.scanner.rest_is_blank() {
            let col = self.scanner.logical_column() + self.scanner.peek_indent();
            self.scanner.consume_indent(col);
            Continue::Matched
        } else {
            Continue::Unmatched
        }
    }

    // --- shared helpers ---------------------------------------------------

    /// Whitespace columns ahead plus the first character after them.
    pub(super) fn peek_after_indent(&mut self) -> (u32, Option<char>) {
        let indent = self.scanner.peek_indent();
        let next = self.scanner.pre().speculate(true, |p| {
            while matches!(p.peek(), Some(' ' | '\t')) {
                p.read();
            }
            p.peek()
        });
        (indent, next)
    }

    /// Whether the text after leading whitespace opens a block tag.
    pub(super) fn peek_tag_start(&mut self) -> bool {
        self.scanner
            .pre()
            .speculate(true, |p| {
                while matches!(p.peek(), Some(' ' | '\t')) {
                    p.read();
                }
                if p.read()? != '@' {
                    return None;
                }
                p.peek().filter(|c| c.is_ascii_alphabetic()).map(|_| ())
            })
            .is_some()
    }

    /// Remainder of the current line after leading whitespace.
    pub(super) fn line_rest_after_indent(&mut self) -> &'a str {
        let range = self.scanner.pre().speculate(true, |p| {
            while matches!(p.peek(), Some(' ' | '\t')) {
                p.read();
            }
            let start = p.pos();
            while p.peek().is_some_and(|c| c != '\n') {
                p.read();
            }
            Some((start, p.pos()))
        });
        let (start, end) = range.unwrap_or((0, 0));
        &self.scanner.text()[start as usize..end as usize]
    }

    /// Close the unmatched tail (and a matched trailing paragraph, which
    /// any successful start interrupts); returns the new parent.
    pub(super) fn begin_start(&mut self) -> NodeId {
        if !self.tail_closed {
            let mut keep = self.first_unmatched;
            if keep == self.open.len()
                && keep > 1
                && matches!(self.open[keep - 1].data, OpenData::Paragraph)
            {
                keep -= 1;
            }
            self.close_through(keep);
            self.tail_closed = true;
        }
        self.open.last().map(|o| o.node).unwrap_or_else(|| self.doc.root())
    }

    pub(super) fn push_open(&mut self, node: NodeId, data: OpenData, start: u32) {
        let line = self.scanner.pre().line();
        self.open.push(OpenBlock::new(node, data, start, line));
    }

    pub(super) fn open_paragraph(&mut self) {
        self.scanner.skip_line_leading_ws();
        let start = self.scanner.pre().pos();
        let parent = self.open.last().map(|o| o.node).unwrap_or_else(|| self.doc.root());
        let node = self.doc.new_node(NodeKind::Paragraph, Span::empty_at(start));
        self.doc.append_child(parent, node);
        self.push_open(node, OpenData::Paragraph, start);
    }

    // --- text acceptance --------------------------------------------------

    pub(super) fn accept_line(&mut self) {
        let idx = self.open.len() - 1;
        if matches!(self.open[idx].data, OpenData::Paragraph) {
            self.scanner.skip_line_leading_ws();
        }
        let line = self.scanner.scan_line();
        let end = self.scanner.pre().pos();
        self.push_content(idx, &line, end);
    }

    fn push_content(&mut self, idx: usize, line: &ScannedLine<'_>, end_pos: u32) {
        let ob = &mut self.open[idx];
        let at = ob.content.len() as u32;
        if line.expanded > 0 {
            // Synthesized spaces map to the tab they were split from.
            ob.map.push(at, line.pos.saturating_sub(1));
            for _ in 0..line.expanded {
                ob.content.push(' ');
            }
        }
        ob.map.push(ob.content.len() as u32, line.pos);
        ob.content.push_str(&line.text[line.expanded as usize..]);
        ob.content.push('\n');
        ob.end_pos = end_pos;
    }

    fn accept_table_row(&mut self) {
        let idx = self.open.len() - 1;
        let OpenData::Table { columns } = self.open[idx].data else {
            return;
        };
        let node = self.open[idx].node;
        let line = self.scanner.scan_line();
        let end = self.scanner.pre().pos();
        self.open[idx].end_pos = end;

        let row = self
            .doc
            .new_node(NodeKind::TableRow { header: false }, Span::new(line.pos, end));
        self.doc.append_child(node, row);
        let cells: Vec<(String, u32)> = table::split_row(&line.text)
            .into_iter()
            .map(|c| (c.text.to_string(), c.offset as u32))
            .collect();
        for i in 0..columns {
            let (text, offset) = match cells.get(i) {
                Some((text, offset)) => (text.as_str(), *offset),
                None => ("", end.saturating_sub(line.pos)),
            };
            let start = line.pos + offset.saturating_sub(line.expanded);
            let span = Span::new(start, start + text.len() as u32);
            let cell = self.doc.new_node(NodeKind::TableCell, span);
            self.doc.append_child(row, cell);
            if !text.is_empty() {
                let mut map = Mapper::default();
                map.push(0, start);
                self.tasks.push(InlineTask {
                    node: cell,
                    content: text.to_string(),
                    map,
                    base: 0,
                });
            }
        }
    }

    // --- blank-line bookkeeping -------------------------------------------

    fn mark_blank_line(&mut self, blank: bool) {
        let line_no = self.scanner.pre().line();
        let (top_node, top_data, top_line) = {
            let top = self.open.last().expect("document block stays open");
            (top.node, top.data, top.opened_line)
        };
        if blank {
            // The block that just closed before this blank line ends blank.
            if let Some(last) = self.doc.last_child(top_node) {
                self.set_blank_flag(last, true);
            }
        }
        let exempt = match top_data {
            OpenData::BlockQuote | OpenData::FencedCode { .. } => true,
            OpenData::ListItem { .. } => {
                self.doc.first_child(top_node).is_none() && top_line == line_no
            }
            _ => false,
        };
        let value = blank && !exempt;
        let nodes: Vec<NodeId> = self.open.iter().map(|o| o.node).collect();
        for n in nodes {
            self.set_blank_flag(n, value);
        }
    }

    fn set_blank_flag(&mut self, id: NodeId, value: bool) {
        let i = id.index();
        if self.blank_flags.len() <= i {
            self.blank_flags.resize(i + 1, false);
        }
        self.blank_flags[i] = value;
    }

    fn blank_flag(&self, id: NodeId) -> bool {
        self.blank_flags.get(id.index()).copied().unwrap_or(false)
    }

    fn ends_with_blank_line(&self, mut id: NodeId) -> bool {
        loop {
            if self.blank_flag(id) {
                return true;
            }
            match self.doc.kind(id) {
                NodeKind::List(_) | NodeKind::ListItem { .. } => match self.doc.last_child(id) {
                    Some(last) => id = last,
                    None => return false,
                },
                _ => return false,
            }
        }
    }

    // --- closing ----------------------------------------------------------

    pub(super) fn close_through(&mut self, keep: usize) {
        while self.open.len() > keep {
            self.close_deepest();
        }
    }

    fn close_deepest(&mut self) {
        let ob = self.open.pop().expect("document block stays open");
        let node = ob.node;
        let end = ob.end_pos.max(self.doc.span(node).start);
        self.doc.node_mut(node).span.end = end;
        match ob.data {
            OpenData::Paragraph => self.finish_paragraph(ob),
            OpenData::FencedCode { .. } => self.finish_code(ob, true),
            OpenData::IndentedCode => self.finish_code(ob, false),
            OpenData::HtmlBlock { .. } => self.finish_html(ob),
            OpenData::List => self.finish_list(node),
            OpenData::BlockTag => self.finish_block_tag(node),
            OpenData::Document
            | OpenData::BlockQuote
            | OpenData::ListItem { .. }
            | OpenData::Table { .. } => {}
        }
        let child_end = self.doc.span(node).end;
        if let Some(parent) = self.open.last_mut() {
            if child_end > parent.end_pos {
                parent.end_pos = child_end;
            }
        }
    }

    fn finish_paragraph(&mut self, mut ob: OpenBlock) {
        let node = ob.node;
        while ob.content.ends_with('\n') {
            ob.content.pop();
        }
        let consumed = match ob.stripped {
            Some(c) => (c as usize).min(ob.content.len()),
            None => refs::strip_definitions(
                &ob.content,
                &mut self.doc.link_refs,
                &mut self.doc.diagnostics,
                &ob.map,
            ) as usize,
        };
        let rest = ob.content[consumed..].trim_end_matches([' ', '\t']);
        if rest.is_empty() {
            // Nothing but reference definitions.
            self.doc.detach(node);
            return;
        }
        if consumed > 0 {
            self.doc.node_mut(node).span.start = ob.map.to_source(consumed as u32);
        }
        self.tasks.push(InlineTask {
            node,
            content: rest.to_string(),
            map: ob.map,
            base: consumed as u32,
        });
    }

    /// Promote the deepest open block (a paragraph) into a setext heading
    /// whose underline ends at `end`.
    pub(super) fn finish_setext(&mut self, level: u8, end: u32) {
        let mut ob = self.open.pop().expect("setext promotes an open paragraph");
        let node = ob.node;
        while ob.content.ends_with('\n') {
            ob.content.pop();
        }
        let consumed = ob.stripped.map_or(0, |c| (c as usize).min(ob.content.len()));
        let rest = ob.content[consumed..].trim_end_matches([' ', '\t', '\n']);
        {
            let n = self.doc.node_mut(node);
            n.kind = NodeKind::Heading { level };
            n.span.end = end;
        }
        if consumed > 0 {
            self.doc.node_mut(node).span.start = ob.map.to_source(consumed as u32);
        }
        self.tasks.push(InlineTask {
            node,
            content: rest.to_string(),
            map: ob.map,
            base: consumed as u32,
        });
        if let Some(parent) = self.open.last_mut() {
            if end > parent.end_pos {
                parent.end_pos = end;
            }
        }
    }

    fn finish_code(&mut self, ob: OpenBlock, fenced: bool) {
        let mut literal = ob.content;
        if !fenced {
            // Trailing blank lines are not part of the literal.
            while let Some(stripped) = literal.strip_suffix('\n') {
                let start = stripped.rfind('\n').map_or(0, |i| i + 1);
                if stripped[start..]
                    .trim_matches(|c| c == ' ' || c == '\t')
                    .is_empty()
                {
                    literal.truncate(start);
                } else {
                    break;
                }
            }
        }
        if let NodeKind::CodeBlock {
            literal: l, info, ..
        } = &mut self.doc.node_mut(ob.node).kind
        {
            *l = literal;
            *info = ob.info;
        }
    }

    fn finish_html(&mut self, ob: OpenBlock) {
        if let NodeKind::HtmlBlock { literal } = &mut self.doc.node_mut(ob.node).kind {
            *literal = ob.content;
        }
    }

    fn finish_list(&mut self, list: NodeId) {
        let mut tight = true;
        let mut item = self.doc.first_child(list);
        'items: while let Some(it) = item {
            let next = self.doc.next_sibling(it);
            if self.ends_with_blank_line(it) && next.is_some() {
                tight = false;
                break;
            }
            let mut sub = self.doc.first_child(it);
            while let Some(s) = sub {
                let sub_next = self.doc.next_sibling(s);
                if self.ends_with_blank_line(s) && (next.is_some() || sub_next.is_some()) {
                    tight = false;
                    break 'items;
                }
                sub = sub_next;
            }
            item = next;
        }
        if let NodeKind::List(data) = &mut self.doc.node_mut(list).kind {
            data.tight = tight;
        }
    }

    fn finish_block_tag(&mut self, node: NodeId) {
        let deprecated = matches!(
            self.doc.kind(node),
            NodeKind::BlockTag { name } if name == "deprecated"
        );
        if deprecated && self.doc.first_child(node).is_none() {
            let span = self.doc.span(node);
            self.doc.diagnostics.report(
                DiagnosticId::DeprecatedWithoutReason,
                "`@deprecated` has no explanation",
                span,
            );
        }
    }
}
