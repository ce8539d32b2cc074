//! Rescan rules for link components.
//!
//! Destinations, titles and labels share one grammar between the two places
//! that need them: reference definitions stripped from paragraph starts in
//! phase 1, and inline links resolved from the bracket stack in phase 2.
//! Each rule follows the scanner's rescan contract: reposition is done by
//! the caller, rollback on failure is done here via `speculate`.

use crate::limits::{MAX_LINK_LABEL_LEN, MAX_LINK_PAREN_DEPTH};
use crate::range::Span;
use crate::scanner::{Scanner, Token, TokenKind};

/// Rescan a link destination: `<...>` form or bare form.
///
/// The token value holds the destination with backslash escapes and entity
/// references decoded. A bare destination may be empty; callers that require
/// a non-empty one (reference definitions) check the span length.
pub(crate) fn rescan_link_destination(s: &mut Scanner<'_>) -> Option<Token> {
    let start = s.token().span.start;
    let column = s.token().column;
    let value = s.pre().speculate(false, |p| {
        if p.peek() == Some('<') {
            p.read();
            let mut raw = String::new();
            loop {
                match p.read()? {
                    '>' => break,
                    '\n' | '<' => return None,
                    '\\' => match p.peek() {
                        Some(c) if c.is_ascii_punctuation() => {
                            p.read();
                            raw.push('\\');
                            raw.push(c);
                        }
                        _ => raw.push('\\'),
                    },
                    c => raw.push(c),
                }
            }
            Some(raw)
        } else {
            let mut raw = String::new();
            let mut depth = 0u32;
            while let Some(c) = p.peek() {
                match c {
                    c if c.is_ascii_whitespace() || c.is_ascii_control() => break,
                    '(' => {
                        depth += 1;
                        if depth > MAX_LINK_PAREN_DEPTH {
                            return None;
                        }
                        p.read();
                        raw.push(c);
                    }
                    ')' => {
                        if depth == 0 {
                            break;
                        }
                        depth -= 1;
                        p.read();
                        raw.push(c);
                    }
                    '\\' => {
                        p.read();
                        raw.push('\\');
                        if let Some(next) = p.peek() {
                            if next.is_ascii_punctuation() {
                                p.read();
                                raw.push(next);
                            }
                        }
                    }
                    c => {
                        p.read();
                        raw.push(c);
                    }
                }
            }
            if depth != 0 {
                return None;
            }
            Some(raw)
        }
    })?;
    Some(Token {
        kind: TokenKind::LinkDestination,
        span: Span::new(start, s.pre().pos()),
        column,
        value: Some(decode_escapes_and_entities(&value)),
    })
}

/// Rescan a link title delimited by `"`, `'` or parentheses.
///
/// Titles may span lines but not blank lines. The value holds the decoded
/// title text without its delimiters.
pub(crate) fn rescan_link_title(s: &mut Scanner<'_>) -> Option<Token> {
    let start = s.token().span.start;
    let column = s.token().column;
    let value = s.pre().speculate(false, |p| {
        let opener = p.read()?;
        let closer = match opener {
            '"' => '"',
            '\'' => '\'',
            '(' => ')',
            _ => return None,
        };
        let mut raw = String::new();
        let mut last_was_newline = false;
        loop {
            let c = p.read()?;
            if c == closer {
                break;
            }
            match c {
                // An unescaped opener inside a paren-delimited title.
                '(' if closer == ')' => return None,
                '\n' if last_was_newline => return None,
                '\\' => {
                    raw.push('\\');
                    if let Some(next) = p.peek() {
                        if next.is_ascii_punctuation() {
                            p.read();
                            raw.push(next);
                        }
                    }
                }
                c => raw.push(c),
            }
            last_was_newline = c == '\n';
        }
        Some(raw)
    })?;
    Some(Token {
        kind: TokenKind::LinkTitle,
        span: Span::new(start, s.pre().pos()),
        column,
        value: Some(decode_escapes_and_entities(&value)),
    })
}

/// Rescan a `[label]` link label, brackets included.
///
/// The value holds the raw text between the brackets, which may be empty
/// (the collapsed reference form). Labels are capped at 999 code points and
/// may not contain unescaped brackets or blank lines.
pub(crate) fn rescan_link_label(s: &mut Scanner<'_>) -> Option<Token> {
    let start = s.token().span.start;
    let column = s.token().column;
    let value = s.pre().speculate(false, |p| {
        if p.read()? != '[' {
            return None;
        }
        let mut raw = String::new();
        let mut count = 0u32;
        let mut last_was_newline = false;
        loop {
            let c = p.read()?;
            match c {
                ']' => break,
                '[' => return None,
                '\n' if last_was_newline => return None,
                '\\' => {
                    raw.push('\\');
                    count += 1;
                    if matches!(p.peek(), Some('[' | ']' | '\\')) {
                        raw.push(p.read().unwrap_or('\\'));
                        count += 1;
                    }
                }
                c => {
                    raw.push(c);
                    count += 1;
                }
            }
            if count > MAX_LINK_LABEL_LEN {
                return None;
            }
            last_was_newline = c == '\n';
        }
        Some(raw)
    })?;
    Some(Token {
        kind: TokenKind::LinkLabel,
        span: Span::new(start, s.pre().pos()),
        column,
        value: Some(value),
    })
}

/// Decode backslash escapes of ASCII punctuation and entity references.
pub(crate) fn decode_escapes_and_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.peek().copied() {
                Some((_, next)) if next.is_ascii_punctuation() => {
                    chars.next();
                    out.push(next);
                }
                _ => out.push('\\'),
            },
            '&' => {
                if let Some((decoded, len)) = decode_entity_at(&raw[i..]) {
                    out.push_str(&decoded);
                    for _ in 0..len.saturating_sub(1) {
                        chars.next();
                    }
                } else {
                    out.push('&');
                }
            }
            c => out.push(c),
        }
    }
    out
}

/// Try to decode one entity reference at the start of `text`.
///
/// Returns the decoded text and the consumed length in chars.
pub(crate) fn decode_entity_at(text: &str) -> Option<(String, usize)> {
    debug_assert!(text.starts_with('&'));
    // Entities are bounded: the longest named entity is 32 chars.
    let end = text
        .char_indices()
        .skip(1)
        .take(40)
        .find(|&(_, c)| c == ';')
        .map(|(i, _)| i)?;
    let candidate = &text[..=end];
    let decoded = html_escape::decode_html_entities(candidate);
    if decoded == candidate {
        return None;
    }
    let mut decoded = decoded.into_owned();
    // The replacement character stands in for a decoded NUL.
    if decoded.contains('\0') {
        decoded = decoded.replace('\0', "\u{FFFD}");
    }
    Some((decoded, candidate.chars().count()))
}
