//! Emphasis and strikethrough delimiter stack.
//!
//! Delimiter runs enter the tree as literal runs paired with a stack
//! frame recording flanking and length. Matching happens bottom-up per
//! bracket sub-range and once at the end of the task, with the
//! openers-bottom table keyed by marker and run length mod 3 to keep
//! pathological inputs linear.

use crate::limits::MAX_DELIMITER_FRAMES;
use crate::range::Span;
use crate::scanner::{Token, is_unicode_punctuation, is_unicode_whitespace};
use crate::tree::{NodeId, NodeKind};

use super::InlineParser;

pub(super) struct Delimiter {
    pub(super) node: NodeId,
    pub(super) marker: char,
    /// Remaining unconsumed delimiter characters.
    pub(super) count: u32,
    /// Original run length, for the multiple-of-three rule.
    pub(super) orig_count: u32,
    pub(super) can_open: bool,
    pub(super) can_close: bool,
    /// Content-coordinate extent of the remaining run.
    pub(super) start: u32,
    pub(super) end: u32,
    pub(super) alive: bool,
}

fn marker_index(marker: char) -> usize {
    match marker {
        '*' => 0,
        '_' => 1,
        _ => 2,
    }
}

impl InlineParser<'_, '_, '_> {
    pub(super) fn handle_delimiter_run(&mut self, marker: char, token: &Token) {
        let start = token.span.start;
        let mut len = 1u32;
        while self.scanner.pre().peek() == Some(marker) {
            self.scanner.pre().read();
            len += 1;
        }
        let end = self.scanner.pre().pos();
        let content = self.scanner.text();
        let slice = &content[start as usize..end as usize];

        // Strikethrough runs of three or more never delimit.
        if marker == '~' && len > 2 {
            self.append_lit(slice, start, end);
            return;
        }

        let before = content[..start as usize].chars().next_back();
        let after = content[end as usize..].chars().next();
        let ws_before = before.is_none_or(is_unicode_whitespace);
        let punct_before = before.is_some_and(is_unicode_punctuation);
        let ws_after = after.is_none_or(is_unicode_whitespace);
        let punct_after = after.is_some_and(is_unicode_punctuation);
        let left = !ws_after && (!punct_after || ws_before || punct_before);
        let right = !ws_before && (!punct_before || ws_after || punct_after);
        let (can_open, can_close) = match marker {
            // Underscores cannot open or close intraword emphasis.
            '_' => (left && (!right || punct_before), right && (!left || punct_after)),
            _ => (left, right),
        };

        if (!can_open && !can_close) || self.delims.len() >= MAX_DELIMITER_FRAMES {
            self.append_lit(slice, start, end);
            return;
        }
        self.flush_run();
        let span = Span::new(self.to_working(start), self.to_working(end));
        let node = self.append_node(
            NodeKind::Run {
                text: slice.to_string(),
            },
            span,
        );
        self.delims.push(Delimiter {
            node,
            marker,
            count: len,
            orig_count: len,
            can_open,
            can_close,
            start,
            end,
            alive: true,
        });
    }

    /// Resolve delimiters above `bottom` into Em/Strong/Strikethrough nodes.
    pub(super) fn process_delimiters(&mut self, bottom: usize) {
        let mut openers_bottom = [[bottom; 3]; 3];
        let mut i = bottom;
        while i < self.delims.len() {
            if !self.delims[i].alive || !self.delims[i].can_close {
                i += 1;
                continue;
            }
            let marker = self.delims[i].marker;
            let mi = marker_index(marker);
            let bi = (self.delims[i].orig_count % 3) as usize;
            let floor = openers_bottom[mi][bi];

            let mut opener = None;
            let mut j = i;
            while j > floor {
                j -= 1;
                let d = &self.delims[j];
                if !d.alive || d.marker != marker || !d.can_open {
                    continue;
                }
                if marker == '~' {
                    // Strikethrough runs pair only with equal lengths.
                    if d.orig_count == self.delims[i].orig_count {
                        opener = Some(j);
                        break;
                    }
                    continue;
                }
                let c = &self.delims[i];
                let adjacent_rule = (d.can_close || c.can_open)
                    && (d.orig_count + c.orig_count) % 3 == 0
                    && !(d.orig_count % 3 == 0 && c.orig_count % 3 == 0);
                if adjacent_rule {
                    continue;
                }
                opener = Some(j);
                break;
            }

            match opener {
                Some(j) => {
                    let used = if marker == '~' {
                        self.delims[i].count
                    } else {
                        // An odd matchable width resolves its single
                        // emphasis innermost: `***x***` nests as strong
                        // around em.
                        let width = self.delims[j].count.min(self.delims[i].count);
                        if width % 2 == 1 { 1 } else { 2 }
                    };
                    self.match_pair(j, i, used);
                    for k in j + 1..i {
                        self.delims[k].alive = false;
                    }
                    if self.delims[j].count == 0 {
                        self.delims[j].alive = false;
                    }
                    if self.delims[i].count == 0 {
                        self.delims[i].alive = false;
                        i += 1;
                    }
                }
                None => {
                    openers_bottom[mi][bi] = i;
                    if !self.delims[i].can_open {
                        self.delims[i].alive = false;
                    }
                    i += 1;
                }
            }
        }
        self.delims.truncate(bottom);
    }

    fn match_pair(&mut self, oi: usize, ci: usize, used: u32) {
        let opener_node = self.delims[oi].node;
        let closer_node = self.delims[ci].node;
        self.delims[oi].count -= used;
        self.delims[oi].end -= used;
        self.delims[ci].count -= used;
        self.delims[ci].start += used;

        let span = Span::new(
            self.to_working(self.delims[oi].end),
            self.to_working(self.delims[ci].start),
        );
        let kind = if self.delims[oi].marker == '~' {
            NodeKind::Strikethrough
        } else if used == 2 {
            NodeKind::Strong
        } else {
            NodeKind::Em
        };
        let emph = self.doc.new_node(kind, span);
        // The closer node is always somewhere after the opener node.
        if let Some(after_opener) = self.doc.next_sibling(opener_node) {
            self.doc.insert_before(after_opener, emph);
        } else {
            self.doc.append_child(self.task.node, emph);
        }
        while let Some(n) = self.doc.next_sibling(emph) {
            if n == closer_node {
                break;
            }
            self.doc.detach(n);
            self.doc.append_child(emph, n);
        }
        self.sync_delim_node(oi);
        self.sync_delim_node(ci);
    }

    /// Re-render a delimiter's literal run after characters were consumed.
    fn sync_delim_node(&mut self, i: usize) {
        let d = &self.delims[i];
        let (node, marker, count) = (d.node, d.marker, d.count);
        if count == 0 {
            self.doc.detach(node);
            return;
        }
        let span = Span::new(self.to_working(d.start), self.to_working(d.end));
        let n = self.doc.node_mut(node);
        if let NodeKind::Run { text } = &mut n.kind {
            *text = marker.to_string().repeat(count as usize);
        }
        n.span = span;
    }
}
