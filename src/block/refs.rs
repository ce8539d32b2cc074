//! Reference definition stripping.
//!
//! Paragraph content may begin with `[label]: destination "title"` lines;
//! closing the paragraph peels them off one by one, registering each in the
//! document's reference map. Only a leading run of complete definitions is
//! taken; the first line that fails to parse ends the run.

use crate::diag::{DiagnosticId, Diagnostics};
use crate::link_ref::{LinkRefDef, LinkRefStore, normalize_label};
use crate::link_syntax::{rescan_link_destination, rescan_link_label, rescan_link_title};
use crate::preprocess::Preprocessor;
use crate::range::Span;
use crate::scanner::{Scanner, TokenKind};
use crate::source_map::Mapper;

/// Strip leading reference definitions from a paragraph content buffer.
///
/// Returns the byte offset where the remaining content starts. Duplicate
/// labels are reported (first definition wins) with spans in working-buffer
/// coordinates via `map`.
pub(crate) fn strip_definitions(
    content: &str,
    refs: &mut LinkRefStore,
    diags: &mut Diagnostics,
    map: &Mapper,
) -> u32 {
    let mut s = Scanner::new(content);
    let mut consumed = 0u32;
    loop {
        let cp = s.pre().checkpoint();
        match parse_definition(&mut s, refs, diags, map) {
            Some(end) => consumed = end,
            None => {
                s.pre().restore(cp);
                break;
            }
        }
    }
    consumed
}

fn parse_definition(
    s: &mut Scanner<'_>,
    refs: &mut LinkRefStore,
    diags: &mut Diagnostics,
    map: &Mapper,
) -> Option<u32> {
    let mut spaces = 0;
    while spaces < 3 && s.pre().peek() == Some(' ') {
        s.pre().read();
        spaces += 1;
    }

    if s.scan().kind != TokenKind::Punct('[') {
        return None;
    }
    if !s.rescan(rescan_link_label) {
        return None;
    }
    let label_span = s.token().span;
    let raw_label = s.token().value.clone().unwrap_or_default();
    let label = normalize_label(&raw_label);
    if label.is_empty() {
        return None;
    }

    if s.pre().peek() != Some(':') {
        return None;
    }
    s.pre().read();
    skip_ws(s.pre(), 1)?;

    if s.scan().kind == TokenKind::End {
        return None;
    }
    if !s.rescan(rescan_link_destination) {
        return None;
    }
    if s.token().span.is_empty() {
        return None;
    }
    let destination = s.token().value.clone().unwrap_or_default();

    // The title is optional, and only taken when the rest of its line is
    // blank; otherwise the definition ends after the destination.
    let after_dest = s.pre().checkpoint();
    let title = try_title(s);
    if title.is_none() {
        s.pre().restore(after_dest);
    }
    if !at_line_end(s.pre()) {
        return None;
    }
    consume_line_end(s.pre());

    if !refs.insert(label, LinkRefDef { destination, title }) {
        diags.report(
            DiagnosticId::DuplicateLinkRef,
            format!("link reference `[{raw_label}]` is already defined"),
            Span::new(map.to_source(label_span.start), map.to_source(label_span.end)),
        );
    }
    Some(s.pre().pos())
}

fn try_title(s: &mut Scanner<'_>) -> Option<String> {
    let before = s.pre().pos();
    skip_ws(s.pre(), 1)?;
    if s.pre().pos() == before {
        return None;
    }
    if s.scan().kind == TokenKind::End {
        return None;
    }
    if !s.rescan(rescan_link_title) {
        return None;
    }
    let title = s.token().value.clone().unwrap_or_default();
    at_line_end(s.pre()).then_some(title)
}

/// Skip spaces, tabs and up to `max_newlines` line feeds.
fn skip_ws(p: &mut Preprocessor<'_>, max_newlines: u32) -> Option<()> {
    let mut newlines = 0;
    loop {
        match p.peek() {
            Some(' ' | '\t') => {
                p.read();
            }
            Some('\n') => {
                newlines += 1;
                if newlines > max_newlines {
                    return None;
                }
                p.read();
            }
            _ => return Some(()),
        }
    }
}

fn at_line_end(p: &mut Preprocessor<'_>) -> bool {
    p.speculate(true, |p| {
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
    .is_some()
}

fn consume_line_end(p: &mut Preprocessor<'_>) {
    while matches!(p.peek(), Some(' ' | '\t')) {
        p.read();
    }
    if p.peek() == Some('\n') {
        p.read();
    }
}
