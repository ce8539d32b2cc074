//! HTML block classification.
//!
//! The seven start conditions are checked against the remainder of the
//! line; kinds 1-5 carry their own textual end condition, kinds 6 and 7
//! run until a blank line. The raw tag matchers at the bottom are shared
//! with the inline phase.

/// Which of the seven HTML block kinds a line opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HtmlBlockKind {
    /// `<pre>`, `<script>`, `<style>` or `<textarea>`; ends on the closing tag.
    RawText,
    /// `<!--` comment; ends on `-->`.
    Comment,
    /// `<?` processing instruction; ends on `?>`.
    ProcessingInstruction,
    /// `<!` declaration; ends on `>`.
    Declaration,
    /// `<![CDATA[` section; ends on `]]>`.
    Cdata,
    /// Known block-level tag; ends on a blank line.
    BlockTag,
    /// Any complete tag alone on its line; ends on a blank line.
    Complete,
}

impl HtmlBlockKind {
    /// Kinds 6 and 7 are terminated by a blank line instead of a marker.
    pub(crate) fn blank_terminated(self) -> bool {
        matches!(self, HtmlBlockKind::BlockTag | HtmlBlockKind::Complete)
    }

    /// Whether `line` satisfies this kind's textual end condition.
    pub(crate) fn line_ends_block(self, line: &str) -> bool {
        match self {
            HtmlBlockKind::RawText => {
                let lower = line.to_ascii_lowercase();
                RAW_TEXT_TAGS
                    .iter()
                    .any(|tag| lower.contains(&format!("</{tag}>")))
            }
            HtmlBlockKind::Comment => line.contains("-->"),
            HtmlBlockKind::ProcessingInstruction => line.contains("?>"),
            HtmlBlockKind::Declaration => line.contains('>'),
            HtmlBlockKind::Cdata => line.contains("]]>"),
            HtmlBlockKind::BlockTag | HtmlBlockKind::Complete => false,
        }
    }
}

const RAW_TEXT_TAGS: [&str; 4] = ["pre", "script", "style", "textarea"];

/// Tag names that open a kind-6 block (the HTML block-level elements).
const BLOCK_TAGS: [&str; 62] = [
    "address", "article", "aside", "base", "basefont", "blockquote", "body",
    "caption", "center", "col", "colgroup", "dd", "details", "dialog", "dir",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form",
    "frame", "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header",
    "hr", "html", "iframe", "legend", "li", "link", "main", "menu", "menuitem",
    "nav", "noframes", "ol", "optgroup", "option", "p", "param", "section",
    "source", "summary", "table", "tbody", "td", "tfoot", "th", "thead",
    "title", "tr", "track", "ul",
];

/// Classify the line remainder (starting at `<`) as an HTML block opener.
///
/// Kind 7 never interrupts a paragraph.
pub(crate) fn classify(line: &str, interrupts_paragraph: bool) -> Option<HtmlBlockKind> {
    let rest = line.strip_prefix('<')?;

    if rest.starts_with("!--") {
        return Some(HtmlBlockKind::Comment);
    }
    if rest.starts_with('?') {
        return Some(HtmlBlockKind::ProcessingInstruction);
    }
    if rest.starts_with("![CDATA[") {
        return Some(HtmlBlockKind::Cdata);
    }
    if let Some(after) = rest.strip_prefix('!') {
        if after.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            return Some(HtmlBlockKind::Declaration);
        }
        return None;
    }

    let (closing, after_slash) = match rest.strip_prefix('/') {
        Some(r) => (true, r),
        None => (false, rest),
    };
    let name_len = tag_name_len(after_slash)?;
    let name = after_slash[..name_len].to_ascii_lowercase();
    let after_name = &after_slash[name_len..];

    if !closing && RAW_TEXT_TAGS.contains(&name.as_str()) {
        let ok = after_name.is_empty()
            || after_name.starts_with('>')
            || after_name.starts_with(|c: char| c == ' ' || c == '\t');
        if ok {
            return Some(HtmlBlockKind::RawText);
        }
    }
    if BLOCK_TAGS.contains(&name.as_str()) {
        let ok = after_name.is_empty()
            || after_name.starts_with('>')
            || after_name.starts_with("/>")
            || after_name.starts_with(|c: char| c == ' ' || c == '\t');
        if ok {
            return Some(HtmlBlockKind::BlockTag);
        }
    }

    // Kind 7: a single complete open or closing tag with nothing else
    // (other than whitespace) on the line.
    if !interrupts_paragraph && !RAW_TEXT_TAGS.contains(&name.as_str()) {
        let tag_len = if closing {
            scan_closing_tag(line)
        } else {
            scan_open_tag(line)
        };
        if let Some(len) = tag_len {
            if line[len..].chars().all(|c| c == ' ' || c == '\t') {
                return Some(HtmlBlockKind::Complete);
            }
        }
    }
    None
}

fn tag_name_len(text: &str) -> Option<usize> {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() => {}
        _ => return None,
    }
    for (i, c) in chars {
        if !(c.is_ascii_alphanumeric() || c == '-') {
            return Some(i);
        }
    }
    Some(text.len())
}

/// Match a complete open tag at the start of `text`; returns its length.
///
/// Open tags allow attributes with optional single-quoted, double-quoted or
/// unquoted values, and an optional trailing `/`. Newlines count as
/// whitespace, so inline tags may span lines.
pub(crate) fn scan_open_tag(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'<') {
        return None;
    }
    let mut i = 1 + tag_name_len(&text[1..])?;
    loop {
        let ws = skip_html_ws(&text[i..]);
        let rest = &text[i + ws..];
        if rest.starts_with("/>") {
            return Some(i + ws + 2);
        }
        if rest.starts_with('>') {
            return Some(i + ws + 1);
        }
        // An attribute requires at least one unit of whitespace before it.
        if ws == 0 {
            return None;
        }
        i += ws + attribute_len(rest)?;
    }
}

/// Match a complete closing tag at the start of `text`; returns its length.
pub(crate) fn scan_closing_tag(text: &str) -> Option<usize> {
    let rest = text.strip_prefix("</")?;
    let name_len = tag_name_len(rest)?;
    let after = &rest[name_len..];
    let ws = skip_html_ws(after);
    if after[ws..].starts_with('>') {
        Some(2 + name_len + ws + 1)
    } else {
        None
    }
}

fn skip_html_ws(text: &str) -> usize {
    text.find(|c: char| !matches!(c, ' ' | '\t' | '\n'))
        .unwrap_or(text.len())
}

fn attribute_len(text: &str) -> Option<usize> {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return None,
    }
    let mut name_end = text.len();
    for (i, c) in chars {
        if !(c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-')) {
            name_end = i;
            break;
        }
    }
    let ws = skip_html_ws(&text[name_end..]);
    let rest = &text[name_end + ws..];
    if !rest.starts_with('=') {
        return Some(name_end);
    }
    let ws2 = skip_html_ws(&rest[1..]);
    let value = &rest[1 + ws2..];
    let value_len = attribute_value_len(value)?;
    Some(name_end + ws + 1 + ws2 + value_len)
}

fn attribute_value_len(text: &str) -> Option<usize> {
    let mut chars = text.chars();
    match chars.next()? {
        q @ ('"' | '\'') => {
            let close = text[1..].find(q)?;
            Some(1 + close + 1)
        }
        c if unquoted_value_char(c) => {
            let end = text
                .find(|c: char| !unquoted_value_char(c))
                .unwrap_or(text.len());
            Some(end)
        }
        _ => None,
    }
}

fn unquoted_value_char(c: char) -> bool {
    !matches!(c, ' ' | '\t' | '\n' | '"' | '\'' | '=' | '<' | '>' | '`')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_kinds() {
        assert_eq!(classify("<script>", false), Some(HtmlBlockKind::RawText));
        assert_eq!(classify("<pre lang=x>", false), Some(HtmlBlockKind::RawText));
        assert_eq!(classify("<!-- note", false), Some(HtmlBlockKind::Comment));
        assert_eq!(
            classify("<?php echo 1", false),
            Some(HtmlBlockKind::ProcessingInstruction)
        );
        assert_eq!(classify("<!DOCTYPE html>", false), Some(HtmlBlockKind::Declaration));
        assert_eq!(classify("<![CDATA[x", false), Some(HtmlBlockKind::Cdata));
        assert_eq!(classify("<div class=a>", false), Some(HtmlBlockKind::BlockTag));
        assert_eq!(classify("</table>", false), Some(HtmlBlockKind::BlockTag));
        assert_eq!(classify("<custom-tag a=1>", false), Some(HtmlBlockKind::Complete));
    }

    #[test]
    fn test_kind_seven_never_interrupts_paragraph() {
        assert_eq!(classify("<custom-tag>", true), None);
        // A known block tag still interrupts.
        assert_eq!(classify("<div>", true), Some(HtmlBlockKind::BlockTag));
    }

    #[test]
    fn test_kind_seven_requires_lone_tag() {
        assert_eq!(classify("<custom-tag> trailing", false), None);
    }

    #[test]
    fn test_end_conditions() {
        assert!(HtmlBlockKind::RawText.line_ends_block("x</script> y"));
        assert!(HtmlBlockKind::Comment.line_ends_block("done --> after"));
        assert!(HtmlBlockKind::Cdata.line_ends_block("]]>"));
        assert!(!HtmlBlockKind::BlockTag.line_ends_block("<div>"));
    }

    #[test]
    fn test_scan_open_tag() {
        assert_eq!(scan_open_tag("<a href=\"x\">t"), Some(12));
        assert_eq!(scan_open_tag("<br/>"), Some(5));
        assert_eq!(scan_open_tag("<a foo=bar baz>"), Some(15));
        assert_eq!(scan_open_tag("<a foo>"), Some(7));
        assert_eq!(scan_open_tag("<1bad>"), None);
        assert_eq!(scan_open_tag("<a foo=>"), None);
    }

    #[test]
    fn test_scan_closing_tag() {
        assert_eq!(scan_closing_tag("</div>"), Some(6));
        assert_eq!(scan_closing_tag("</div attr>"), None);
    }
}
