//! Raw inline HTML.
//!
//! The tag grammar is shared with the block-level classifier; this module
//! only adds the comment, processing-instruction, declaration and CDATA
//! forms and packages the match as a rescan rule.

use crate::block::{scan_closing_tag, scan_open_tag};
use crate::scanner::{Scanner, Token, TokenKind};

/// Rescan rule for a raw inline HTML construct starting at `<`.
///
/// The token value holds the verbatim source of the construct.
pub(super) fn rescan_html_inline(s: &mut Scanner<'_>) -> Option<Token> {
    let start = s.token().span.start;
    let column = s.token().column;
    let text = &s.text()[start as usize..];
    let len = html_construct_len(text)?;

    let end = start + len as u32;
    while s.pre().pos() < end {
        s.pre().read();
    }
    let mut token = s.make_token(TokenKind::HtmlTag, start, column);
    token.value = Some(text[..len].to_string());
    Some(token)
}

/// Length of the HTML construct at the start of `text`, which begins
/// with `<`.
fn html_construct_len(text: &str) -> Option<usize> {
    if let Some(rest) = text.strip_prefix("<!--") {
        return rest.find("-->").map(|i| 4 + i + 3);
    }
    if let Some(rest) = text.strip_prefix("<![CDATA[") {
        return rest.find("]]>").map(|i| 9 + i + 3);
    }
    if let Some(rest) = text.strip_prefix("<?") {
        return rest.find("?>").map(|i| 2 + i + 2);
    }
    if let Some(rest) = text.strip_prefix("<!") {
        if rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return rest.find('>').map(|i| 2 + i + 1);
        }
        return None;
    }
    if text.starts_with("</") {
        return scan_closing_tag(text);
    }
    scan_open_tag(text)
}
