//! Block start rules.
//!
//! Run at the deepest surviving block after continuation, in precedence
//! order: doc tags, block quotes, ATX headings, setext underlines, code
//! fences, HTML blocks, tables, thematic breaks, list items, indented
//! code. Container starts loop for further nesting on the same line; leaf
//! starts end the loop.

use crate::diag::DiagnosticId;
use crate::limits::{MAX_BLOCK_NESTING, MAX_LIST_MARKER_DIGITS, MAX_TAG_NAME_LEN};
use crate::link_syntax::decode_escapes_and_entities;
use crate::range::Span;
use crate::source_map::Mapper;
use crate::tree::{ListData, ListMarker, NodeKind};

use super::parser::BlockParser;
use super::{InlineTask, OpenData, Started, html_block, refs, table};

impl BlockParser<'_, '_> {
    pub(super) fn try_starts(&mut self) -> Option<Started> {
        if self.open.len() >= MAX_BLOCK_NESTING {
            return None;
        }
        let tip_is_para =
            matches!(self.open.last().map(|o| o.data), Some(OpenData::Paragraph));
        let maybe_lazy = !self.tail_closed && tip_is_para;
        // Whether this line would otherwise continue a matched paragraph;
        // setext underlines, tables and the interrupt rules key off it.
        let cont_is_para = maybe_lazy && self.first_unmatched == self.open.len();

        let (indent, next) = self.peek_after_indent();
        let next = next.filter(|&c| c != '\n')?;
        if indent >= 4 {
            if maybe_lazy {
                return None;
            }
            return Some(self.start_indented_code());
        }

        if self.options.doc_tags && next == '@' && self.peek_tag_start() {
            return self.start_block_tag();
        }
        if next == '>' {
            return Some(self.start_block_quote(indent));
        }
        if next == '#' {
            if let Some(s) = self.start_atx(indent) {
                return Some(s);
            }
        }
        if cont_is_para && matches!(next, '=' | '-') {
            if let Some(s) = self.start_setext(indent) {
                return Some(s);
            }
        }
        if matches!(next, '`' | '~') {
            if let Some(s) = self.start_fence(indent) {
                return Some(s);
            }
        }
        if self.options.allow_html && next == '<' {
            if let Some(s) = self.start_html_block(cont_is_para) {
                return Some(s);
            }
        }
        if self.options.tables && cont_is_para {
            if let Some(s) = self.start_table(indent) {
                return Some(s);
            }
        }
        if matches!(next, '-' | '_' | '*') {
            if let Some(s) = self.start_thematic(indent) {
                return Some(s);
            }
        }
        if matches!(next, '-' | '+' | '*') || next.is_ascii_digit() {
            if let Some(s) = self.start_list_item(indent, cont_is_para) {
                return Some(s);
            }
        }
        None
    }

    fn start_indented_code(&mut self) -> Started {
        let parent = self.begin_start();
        let target = self.scanner.logical_column() + 4;
        self.scanner.consume_indent(target);
        let pos = self.scanner.pre().pos();
        let node = self.doc.new_node(
            NodeKind::CodeBlock {
                fenced: false,
                info: None,
                literal: String::new(),
            },
            Span::empty_at(pos),
        );
        self.doc.append_child(parent, node);
        self.push_open(node, OpenData::IndentedCode, pos);
        Started::Leaf
    }

    fn start_block_quote(&mut self, indent: u32) -> Started {
        let parent = self.begin_start();
        let target = self.scanner.logical_column() + indent;
        self.scanner.consume_indent(target);
        let pos = self.scanner.pre().pos();
        self.scanner.pre().read();
        // One column of whitespace after `>` belongs to the marker.
        if matches!(self.scanner.pre().peek(), Some(' ' | '\t')) {
            let col = self.scanner.logical_column();
            self.scanner.consume_indent(col + 1);
        }
        let node = self.doc.new_node(NodeKind::BlockQuote, Span::empty_at(pos));
        self.doc.append_child(parent, node);
        self.push_open(node, OpenData::BlockQuote, pos);
        Started::Container
    }

    fn start_atx(&mut self, indent: u32) -> Option<Started> {
        let level = self.scanner.pre().speculate(true, |p| {
            while matches!(p.peek(), Some(' ' | '\t')) {
                p.read();
            }
            let mut level = 0u8;
            while p.peek() == Some('#') {
                p.read();
                level += 1;
                if level > 6 {
                    return None;
                }
            }
            if level == 0 {
                return None;
            }
            match p.peek() {
                None | Some('\n' | ' ' | '\t') => Some(level),
                Some(_) => None,
            }
        })?;
        let parent = self.begin_start();
        let target = self.scanner.logical_column() + indent;
        self.scanner.consume_indent(target);
        let start = self.scanner.pre().pos();
        for _ in 0..level {
            self.scanner.pre().read();
        }
        self.scanner.skip_line_leading_ws();
        let content_pos = self.scanner.pre().pos();
        let line = self.scanner.scan_line();
        let end = self.scanner.pre().pos();
        let content = strip_atx_closing(&line.text);

        let node = self
            .doc
            .new_node(NodeKind::Heading { level }, Span::new(start, end));
        self.doc.append_child(parent, node);
        if let Some(p) = self.open.last_mut() {
            if end > p.end_pos {
                p.end_pos = end;
            }
        }
        if !content.is_empty() {
            let mut map = Mapper::default();
            map.push(0, content_pos);
            self.tasks.push(InlineTask {
                node,
                content: content.to_string(),
                map,
                base: 0,
            });
        }
        Some(Started::ConsumedLine)
    }

    fn start_setext(&mut self, indent: u32) -> Option<Started> {
        let level = self.scanner.pre().speculate(true, |p| {
            while matches!(p.peek(), Some(' ' | '\t')) {
                p.read();
            }
            let marker = p.peek().filter(|&c| c == '=' || c == '-')?;
            while p.peek() == Some(marker) {
                p.read();
            }
            loop {
                match p.peek() {
                    None | Some('\n') => return Some(if marker == '=' { 1u8 } else { 2 }),
                    Some(' ' | '\t') => {
                        p.read();
                    }
                    Some(_) => return None,
                }
            }
        })?;
        // The underline only promotes a paragraph that still has visible
        // content after its leading reference definitions.
        if self.open.last()?.stripped.is_none() {
            let ob = self.open.last_mut()?;
            let consumed = refs::strip_definitions(
                &ob.content,
                &mut self.doc.link_refs,
                &mut self.doc.diagnostics,
                &ob.map,
            );
            ob.stripped = Some(consumed);
        }
        let ob = self.open.last()?;
        let consumed = (ob.stripped.unwrap_or(0) as usize).min(ob.content.len());
        if ob.content[consumed..].trim().is_empty() {
            return None;
        }
        let target = self.scanner.logical_column() + indent;
        self.scanner.consume_indent(target);
        let _ = self.scanner.scan_line();
        let end = self.scanner.pre().pos();
        self.finish_setext(level, end);
        Some(Started::ConsumedLine)
    }

    fn start_fence(&mut self, indent: u32) -> Option<Started> {
        let (marker, len) = self.scanner.pre().speculate(true, |p| {
            while matches!(p.peek(), Some(' ' | '\t')) {
                p.read();
            }
            let marker = p.peek().filter(|&c| c == '`' || c == '~')?;
            let len = p.peek_min_count(3, |c| c == marker)?;
            for _ in 0..len {
                p.read();
            }
            if marker == '`' {
                // The info string of a backtick fence cannot contain
                // backticks (it would be ambiguous with a code span).
                loop {
                    match p.peek() {
                        None | Some('\n') => break,
                        Some('`') => return None,
                        Some(_) => {
                            p.read();
                        }
                    }
                }
            }
            Some((marker, len))
        })?;
        let parent = self.begin_start();
        let target = self.scanner.logical_column() + indent;
        self.scanner.consume_indent(target);
        let start = self.scanner.pre().pos();
        for _ in 0..len {
            self.scanner.pre().read();
        }
        let info_line = self.scanner.scan_line();
        let end = self.scanner.pre().pos();
        let info_raw = info_line.text.trim_matches(|c| c == ' ' || c == '\t');
        let info = (!info_raw.is_empty()).then(|| decode_escapes_and_entities(info_raw));

        let node = self.doc.new_node(
            NodeKind::CodeBlock {
                fenced: true,
                info: None,
                literal: String::new(),
            },
            Span::new(start, end),
        );
        self.doc.append_child(parent, node);
        self.push_open(node, OpenData::FencedCode { marker, len, indent }, end);
        if let Some(ob) = self.open.last_mut() {
            ob.info = info;
        }
        Some(Started::ConsumedLine)
    }

    fn start_html_block(&mut self, cont_is_para: bool) -> Option<Started> {
        let rest = self.line_rest_after_indent();
        let kind = html_block::classify(rest, cont_is_para)?;
        let parent = self.begin_start();
        let pos = self.scanner.pre().pos();
        let node = self.doc.new_node(
            NodeKind::HtmlBlock {
                literal: String::new(),
            },
            Span::empty_at(pos),
        );
        self.doc.append_child(parent, node);
        self.push_open(node, OpenData::HtmlBlock { kind }, pos);
        Some(Started::Leaf)
    }

    fn start_table(&mut self, indent: u32) -> Option<Started> {
        let rest = self.line_rest_after_indent();
        let alignments = table::parse_delimiter_row(rest)?;
        {
            let ob = self.open.last()?;
            let header = ob.content.strip_suffix('\n').unwrap_or(&ob.content);
            if header.contains('\n') {
                // Only a one-line paragraph can become a table header.
                return None;
            }
            if table::split_row(header).len() != alignments.len() {
                return None;
            }
        }
        let ob = self.open.pop()?;
        let node = ob.node;
        let columns = alignments.len();
        self.doc.node_mut(node).kind = NodeKind::Table { alignments };

        let header = ob.content.strip_suffix('\n').unwrap_or(&ob.content);
        let row_span = Span::new(ob.map.to_source(0), ob.map.to_source(header.len() as u32));
        let row = self
            .doc
            .new_node(NodeKind::TableRow { header: true }, row_span);
        self.doc.append_child(node, row);
        let cells: Vec<(String, u32)> = table::split_row(header)
            .into_iter()
            .map(|c| (c.text.to_string(), c.offset as u32))
            .collect();
        for (text, off) in cells {
            let span = Span::new(
                ob.map.to_source(off),
                ob.map.to_source(off + text.len() as u32),
            );
            let cell = self.doc.new_node(NodeKind::TableCell, span);
            self.doc.append_child(row, cell);
            if !text.is_empty() {
                self.tasks.push(InlineTask {
                    node: cell,
                    content: text,
                    map: ob.map.clone(),
                    base: off,
                });
            }
        }

        // Consume the delimiter row itself.
        let target = self.scanner.logical_column() + indent;
        self.scanner.consume_indent(target);
        let _ = self.scanner.scan_line();
        let end = self.scanner.pre().pos();
        self.push_open(node, OpenData::Table { columns }, end);
        Some(Started::ConsumedLine)
    }

    fn start_thematic(&mut self, indent: u32) -> Option<Started> {
        self.scanner.pre().speculate(true, |p| {
            while matches!(p.peek(), Some(' ' | '\t')) {
                p.read();
            }
            let marker = p.peek().filter(|&c| matches!(c, '-' | '_' | '*'))?;
            let mut count = 0u32;
            loop {
                match p.peek() {
                    Some(c) if c == marker => {
                        p.read();
                        count += 1;
                    }
                    Some(' ' | '\t') => {
                        p.read();
                    }
                    None | Some('\n') => break,
                    Some(_) => return None,
                }
            }
            (count >= 3).then_some(())
        })?;
        let parent = self.begin_start();
        let target = self.scanner.logical_column() + indent;
        self.scanner.consume_indent(target);
        let start = self.scanner.pre().pos();
        let _ = self.scanner.scan_line();
        let end = self.scanner.pre().pos();
        let node = self
            .doc
            .new_node(NodeKind::ThematicBreak, Span::new(start, end));
        self.doc.append_child(parent, node);
        if let Some(p) = self.open.last_mut() {
            if end > p.end_pos {
                p.end_pos = end;
            }
        }
        Some(Started::ConsumedLine)
    }

    fn start_list_item(&mut self, indent: u32, cont_is_para: bool) -> Option<Started> {
        let cp = self.scanner.checkpoint();
        let target = self.scanner.logical_column() + indent;
        self.scanner.consume_indent(target);
        let marker_pos = self.scanner.pre().pos();
        let Some(marker) = self.parse_list_marker() else {
            self.scanner.restore(cp);
            return None;
        };
        let rest_blank = self.scanner.rest_is_blank();
        if cont_is_para {
            // Only a non-empty item (and, for ordered lists, one starting
            // at 1) interrupts a paragraph.
            let ok = !rest_blank
                && match marker {
                    ListMarker::Ordered { start, .. } => start == 1,
                    ListMarker::Bullet(_) => true,
                };
            if !ok {
                self.scanner.restore(cp);
                return None;
            }
        }
        let marker_end_col = self.scanner.logical_column();
        let spaces_after = self.scanner.peek_indent();
        let content_col = if rest_blank || spaces_after == 0 || spaces_after > 4 {
            marker_end_col + 1
        } else {
            marker_end_col + spaces_after
        };
        self.scanner.consume_indent(content_col);

        let _ = self.begin_start();
        let mut reuse = None;
        if let Some(top) = self.open.last() {
            if matches!(top.data, OpenData::List) {
                if let NodeKind::List(data) = self.doc.kind(top.node) {
                    if markers_match(data.marker, marker) {
                        reuse = Some(top.node);
                    }
                }
                if reuse.is_none() {
                    // A different marker ends the list and starts a new one.
                    let keep = self.open.len() - 1;
                    self.close_through(keep);
                }
            }
        }
        let list_node = match reuse {
            Some(n) => n,
            None => {
                let parent = self.open.last().map(|o| o.node)?;
                let node = self.doc.new_node(
                    NodeKind::List(ListData { marker, tight: true }),
                    Span::empty_at(marker_pos),
                );
                self.doc.append_child(parent, node);
                self.push_open(node, OpenData::List, marker_pos);
                node
            }
        };

        let task = if self.options.task_lists && !rest_blank {
            self.parse_task_checkbox()
        } else {
            None
        };
        let item = self
            .doc
            .new_node(NodeKind::ListItem { task }, Span::empty_at(marker_pos));
        self.doc.append_child(list_node, item);
        self.push_open(item, OpenData::ListItem { content_col }, marker_pos);
        Some(Started::Container)
    }

    fn parse_list_marker(&mut self) -> Option<ListMarker> {
        let p = self.scanner.pre();
        match p.peek()? {
            c @ ('-' | '+' | '*') => {
                p.read();
                match p.peek() {
                    None | Some('\n' | ' ' | '\t') => Some(ListMarker::Bullet(c)),
                    Some(_) => None,
                }
            }
            c if c.is_ascii_digit() => {
                let mut digits = 0u32;
                let mut start = 0u32;
                while let Some(d) = p.peek().and_then(|c| c.to_digit(10)) {
                    p.read();
                    digits += 1;
                    if digits > MAX_LIST_MARKER_DIGITS {
                        return None;
                    }
                    start = start * 10 + d;
                }
                let delim = p.peek().filter(|&c| c == '.' || c == ')')?;
                p.read();
                match p.peek() {
                    None | Some('\n' | ' ' | '\t') => {
                        Some(ListMarker::Ordered { start, delim })
                    }
                    Some(_) => None,
                }
            }
            _ => None,
        }
    }

    /// Consume a `[ ]` / `[x]` checkbox at the start of an item's content.
    fn parse_task_checkbox(&mut self) -> Option<bool> {
        self.scanner.pre().speculate(false, |p| {
            if p.read()? != '[' {
                return None;
            }
            let checked = match p.read()? {
                ' ' => false,
                'x' | 'X' => true,
                _ => return None,
            };
            if p.read()? != ']' {
                return None;
            }
            match p.peek() {
                Some(' ' | '\t') => {
                    p.read();
                    Some(checked)
                }
                None | Some('\n') => Some(checked),
                Some(_) => None,
            }
        })
    }

    fn start_block_tag(&mut self) -> Option<Started> {
        let cp = self.scanner.checkpoint();
        self.scanner.skip_line_leading_ws();
        let pos = self.scanner.pre().pos();
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
        if name.len() as u32 > MAX_TAG_NAME_LEN {
            let end = self.scanner.pre().pos();
            self.doc.diagnostics.report(
                DiagnosticId::MalformedTagName,
                format!("tag name `@{name}` exceeds {MAX_TAG_NAME_LEN} characters"),
                Span::new(pos, end),
            );
            self.scanner.restore(cp);
            return None;
        }
        let parent = self.begin_start();
        let node = self
            .doc
            .new_node(NodeKind::BlockTag { name }, Span::empty_at(pos));
        self.doc.append_child(parent, node);
        self.push_open(node, OpenData::BlockTag, pos);
        Some(Started::Container)
    }
}

fn markers_match(a: ListMarker, b: ListMarker) -> bool {
    match (a, b) {
        (ListMarker::Bullet(x), ListMarker::Bullet(y)) => x == y,
        (ListMarker::Ordered { delim: x, .. }, ListMarker::Ordered { delim: y, .. }) => x == y,
        _ => false,
    }
}

/// Remove an optional closing `#` run (and surrounding whitespace) from an
/// ATX heading's content.
fn strip_atx_closing(text: &str) -> &str {
    let t = text.trim_end_matches([' ', '\t']);
    let stripped = t.trim_end_matches('#');
    if stripped.len() == t.len() {
        return t;
    }
    if stripped.is_empty() || stripped.ends_with([' ', '\t']) {
        stripped.trim_end_matches([' ', '\t'])
    } else {
        // The closing run is not preceded by whitespace; it is content.
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_atx_closing() {
        assert_eq!(strip_atx_closing("foo ###"), "foo");
        assert_eq!(strip_atx_closing("foo ### "), "foo");
        assert_eq!(strip_atx_closing("###"), "");
        assert_eq!(strip_atx_closing("foo###"), "foo###");
        assert_eq!(strip_atx_closing("foo #"), "foo");
        assert_eq!(strip_atx_closing("foo \\###"), "foo \\###");
    }

    #[test]
    fn test_markers_match() {
        assert!(markers_match(ListMarker::Bullet('-'), ListMarker::Bullet('-')));
        assert!(!markers_match(ListMarker::Bullet('-'), ListMarker::Bullet('*')));
        assert!(markers_match(
            ListMarker::Ordered { start: 1, delim: '.' },
            ListMarker::Ordered { start: 7, delim: '.' },
        ));
        assert!(!markers_match(
            ListMarker::Ordered { start: 1, delim: '.' },
            ListMarker::Ordered { start: 1, delim: ')' },
        ));
        assert!(!markers_match(
            ListMarker::Bullet('-'),
            ListMarker::Ordered { start: 1, delim: '.' },
        ));
    }
}
