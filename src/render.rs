//! HTML output.
//!
//! A buffer-reusing writer plus a tree walk. Tight lists unwrap their
//! paragraphs, image alt text flattens to plain text, and raw HTML is
//! passed through with optional disallowed-tag filtering.

use crate::Options;
use crate::escape;
use crate::tree::{Alignment, Document, LinkData, NodeId, NodeKind};

/// HTML output writer with a pre-allocated, reusable buffer.
///
/// # Example
/// ```
/// use docmark::HtmlWriter;
///
/// let mut writer = HtmlWriter::with_capacity_for(1000);
/// writer.write_str("<p>");
/// writer.write_escaped_text("Hello <World>");
/// writer.write_str("</p>");
/// assert_eq!(writer.as_str(), "<p>Hello &lt;World&gt;</p>");
/// ```
#[derive(Default)]
pub struct HtmlWriter {
    out: String,
}

impl HtmlWriter {
    #[inline]
    pub fn new() -> Self {
        Self {
            out: String::with_capacity(1024),
        }
    }

    /// Create with pre-allocated capacity based on expected input size.
    ///
    /// Typical HTML is ~1.25x input size; we reserve extra for safety.
    #[inline]
    pub fn with_capacity_for(input_len: usize) -> Self {
        Self {
            out: String::with_capacity(input_len + input_len / 4),
        }
    }

    /// Write a string without escaping.
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.out.push_str(s);
    }

    /// Write a single character without escaping.
    #[inline]
    pub fn write_char(&mut self, c: char) {
        self.out.push(c);
    }

    /// Write text with HTML escaping (for text content).
    #[inline]
    pub fn write_escaped_text(&mut self, text: &str) {
        escape::escape_text_into(&mut self.out, text);
    }

    /// Write an attribute value with HTML escaping.
    #[inline]
    pub fn write_escaped_attr(&mut self, attr: &str) {
        escape::escape_attr_into(&mut self.out, attr);
    }

    /// Write a link destination, percent-encoded then HTML-escaped.
    #[inline]
    pub fn write_escaped_href(&mut self, url: &str) {
        escape::escape_href_into(&mut self.out, url);
    }

    /// Write raw HTML, escaping the `<` of disallowed tags when `filter`.
    pub fn write_raw_html(&mut self, html: &str, filter: bool) {
        if filter {
            filter_tags_into(&mut self.out, html);
        } else {
            self.out.push_str(html);
        }
    }

    /// End the current line unless the output already does.
    #[inline]
    fn fresh_line(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.out.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Clear output for reuse (keeps capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.out.clear();
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.out
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.out
    }
}

/// Render a parsed document to HTML.
pub fn render_html(doc: &Document, options: &Options) -> String {
    let mut writer = HtmlWriter::new();
    render_html_into(doc, options, &mut writer);
    writer.into_string()
}

/// Render into an existing writer, reusing its buffer.
pub fn render_html_into(doc: &Document, options: &Options, writer: &mut HtmlWriter) {
    let mut r = Renderer {
        doc,
        options,
        out: writer,
    };
    r.blocks(doc.root(), false);
}

/// Raw-HTML tags whose `<` is escaped under the tag filter.
const DISALLOWED_TAGS: [&str; 9] = [
    "title",
    "textarea",
    "style",
    "xmp",
    "iframe",
    "noembed",
    "noframes",
    "script",
    "plaintext",
];

/// Escape the `<` of disallowed opening and closing tags; everything else
/// passes through verbatim.
fn filter_tags_into(out: &mut String, html: &str) {
    let bytes = html.as_bytes();
    let mut rest = 0;
    let mut i = 0;
    while let Some(off) = memchr::memchr(b'<', &bytes[i..]) {
        let lt = i + off;
        let mut name_start = lt + 1;
        if bytes.get(name_start) == Some(&b'/') {
            name_start += 1;
        }
        let name_end = bytes[name_start..]
            .iter()
            .position(|b| !b.is_ascii_alphabetic())
            .map_or(bytes.len(), |n| name_start + n);
        let name = &html[name_start..name_end];
        let delimited = matches!(
            bytes.get(name_end),
            None | Some(b' ' | b'\t' | b'\n' | b'>' | b'/')
        );
        if delimited && DISALLOWED_TAGS.iter().any(|t| name.eq_ignore_ascii_case(t)) {
            out.push_str(&html[rest..lt]);
            out.push_str("&lt;");
            rest = lt + 1;
        }
        i = lt + 1;
    }
    out.push_str(&html[rest..]);
}

struct Renderer<'a> {
    doc: &'a Document,
    options: &'a Options,
    out: &'a mut HtmlWriter,
}

impl Renderer<'_> {
    /// Render the block children of `parent`. In tight mode paragraphs
    /// contribute bare inline content.
    fn blocks(&mut self, parent: NodeId, tight: bool) {
        for child in self.doc.children(parent) {
            self.block(child, tight);
        }
    }

    fn block(&mut self, id: NodeId, tight: bool) {
        match self.doc.kind(id) {
            NodeKind::Paragraph => {
                if tight {
                    self.inlines(id);
                } else {
                    self.out.write_str("<p>");
                    self.inlines(id);
                    self.out.write_str("</p>\n");
                }
            }
            NodeKind::Heading { level } => {
                self.out.fresh_line();
                self.out.write_str("<h");
                self.out.write_char((b'0' + *level) as char);
                self.out.write_str(">");
                self.inlines(id);
                self.out.write_str("</h");
                self.out.write_char((b'0' + *level) as char);
                self.out.write_str(">\n");
            }
            NodeKind::ThematicBreak => {
                self.out.fresh_line();
                self.out.write_str("<hr />\n");
            }
            NodeKind::CodeBlock { info, literal, .. } => {
                self.out.fresh_line();
                match info.as_deref().and_then(|i| i.split_whitespace().next()) {
                    Some(lang) => {
                        self.out.write_str("<pre><code class=\"language-");
                        self.out.write_escaped_attr(lang);
                        self.out.write_str("\">");
                    }
                    None => self.out.write_str("<pre><code>"),
                }
                self.out.write_escaped_text(literal);
                self.out.write_str("</code></pre>\n");
            }
            NodeKind::HtmlBlock { literal } => {
                self.out.fresh_line();
                self.out.write_raw_html(literal, self.options.tag_filter);
                self.out.fresh_line();
            }
            NodeKind::BlockQuote => {
                self.out.fresh_line();
                self.out.write_str("<blockquote>\n");
                self.blocks(id, false);
                self.out.write_str("</blockquote>\n");
            }
            NodeKind::List(data) => {
                self.out.fresh_line();
                let close = match data.marker {
                    crate::tree::ListMarker::Bullet(_) => {
                        self.out.write_str("<ul>\n");
                        "</ul>\n"
                    }
                    crate::tree::ListMarker::Ordered { start, .. } => {
                        if start == 1 {
                            self.out.write_str("<ol>\n");
                        } else {
                            self.out.write_str("<ol start=\"");
                            self.out.write_str(&start.to_string());
                            self.out.write_str("\">\n");
                        }
                        "</ol>\n"
                    }
                };
                for item in self.doc.children(id) {
                    self.list_item(item, data.tight);
                }
                self.out.write_str(close);
            }
            NodeKind::ListItem { .. } => self.list_item(id, tight),
            NodeKind::Table { alignments } => self.table(id, alignments),
            NodeKind::BlockTag { name } => {
                self.out.fresh_line();
                self.out.write_str("<section data-tag=\"");
                self.out.write_escaped_attr(name);
                self.out.write_str("\">\n");
                self.blocks(id, false);
                self.out.write_str("</section>\n");
            }
            // Stray inline nodes (post-parse edits) render in place.
            _ => self.inline(id, false),
        }
    }

    fn list_item(&mut self, id: NodeId, tight: bool) {
        self.out.write_str("<li>");
        if let NodeKind::ListItem { task: Some(checked) } = self.doc.kind(id) {
            if *checked {
                self.out
                    .write_str("<input type=\"checkbox\" disabled=\"\" checked=\"\" /> ");
            } else {
                self.out.write_str("<input type=\"checkbox\" disabled=\"\" /> ");
            }
        }
        let mut prev_was_tight_para = false;
        for child in self.doc.children(id) {
            let is_para = matches!(self.doc.kind(child), NodeKind::Paragraph);
            if tight && is_para {
                if prev_was_tight_para {
                    // Only reachable through post-parse edits; tight lists
                    // never hold adjacent paragraphs.
                    self.out.write_str("\n");
                }
                self.inlines(child);
                prev_was_tight_para = true;
            } else {
                self.out.fresh_line();
                self.block(child, tight);
                prev_was_tight_para = false;
            }
        }
        self.out.write_str("</li>\n");
    }

    fn table(&mut self, id: NodeId, alignments: &[Alignment]) {
        self.out.fresh_line();
        self.out.write_str("<table>\n");
        let mut in_body = false;
        for row in self.doc.children(id) {
            let NodeKind::TableRow { header } = self.doc.kind(row) else {
                continue;
            };
            if *header {
                self.out.write_str("<thead>\n");
            } else if !in_body {
                self.out.write_str("<tbody>\n");
                in_body = true;
            }
            self.out.write_str("<tr>\n");
            let tag = if *header { "th" } else { "td" };
            for (i, cell) in self.doc.children(row).enumerate() {
                self.out.write_str("<");
                self.out.write_str(tag);
                match alignments.get(i).copied().unwrap_or_default() {
                    Alignment::None => {}
                    Alignment::Left => self.out.write_str(" align=\"left\""),
                    Alignment::Center => self.out.write_str(" align=\"center\""),
                    Alignment::Right => self.out.write_str(" align=\"right\""),
                }
                self.out.write_str(">");
                self.inlines(cell);
                self.out.write_str("</");
                self.out.write_str(tag);
                self.out.write_str(">\n");
            }
            self.out.write_str("</tr>\n");
            if *header {
                self.out.write_str("</thead>\n");
            }
        }
        if in_body {
            self.out.write_str("</tbody>\n");
        }
        self.out.write_str("</table>\n");
    }

    fn inlines(&mut self, parent: NodeId) {
        for child in self.doc.children(parent) {
            self.inline(child, false);
        }
    }

    fn inline(&mut self, id: NodeId, plain: bool) {
        match self.doc.kind(id) {
            NodeKind::Run { text } => {
                if plain {
                    self.out.write_escaped_attr(text);
                } else {
                    self.out.write_escaped_text(text);
                }
            }
            NodeKind::Code { literal } => {
                if plain {
                    self.out.write_escaped_attr(literal);
                } else {
                    self.out.write_str("<code>");
                    self.out.write_escaped_text(literal);
                    self.out.write_str("</code>");
                }
            }
            NodeKind::Em => self.wrap(id, "<em>", "</em>", plain),
            NodeKind::Strong => self.wrap(id, "<strong>", "</strong>", plain),
            NodeKind::Strikethrough => self.wrap(id, "<del>", "</del>", plain),
            NodeKind::Link(data) => {
                if plain {
                    self.inline_children(id, true);
                    return;
                }
                match self.link_target(id, data) {
                    Some((dest, title)) => {
                        self.out.write_str("<a href=\"");
                        self.out.write_escaped_href(&dest);
                        self.out.write_str("\"");
                        if let Some(title) = title {
                            self.out.write_str(" title=\"");
                            self.out.write_escaped_attr(&title);
                            self.out.write_str("\"");
                        }
                        self.out.write_str(">");
                        self.inline_children(id, false);
                        self.out.write_str("</a>");
                    }
                    // A reference whose definition was edited away renders
                    // as its content.
                    None => self.inline_children(id, false),
                }
            }
            NodeKind::Image(data) => match self.link_target(id, data) {
                Some((dest, title)) => {
                    if plain {
                        self.inline_children(id, true);
                        return;
                    }
                    self.out.write_str("<img src=\"");
                    self.out.write_escaped_href(&dest);
                    self.out.write_str("\" alt=\"");
                    self.inline_children(id, true);
                    self.out.write_str("\"");
                    if let Some(title) = title {
                        self.out.write_str(" title=\"");
                        self.out.write_escaped_attr(&title);
                        self.out.write_str("\"");
                    }
                    self.out.write_str(" />");
                }
                None => self.inline_children(id, plain),
            },
            NodeKind::Autolink { uri, email } => {
                if plain {
                    self.out.write_escaped_attr(uri);
                    return;
                }
                self.out.write_str("<a href=\"");
                if *email {
                    self.out.write_str("mailto:");
                } else if uri.starts_with("www.") {
                    self.out.write_str("http://");
                }
                self.out.write_escaped_href(uri);
                self.out.write_str("\">");
                self.out.write_escaped_text(uri);
                self.out.write_str("</a>");
            }
            NodeKind::HtmlInline { literal } => {
                if plain {
                    self.out.write_escaped_attr(literal);
                } else {
                    self.out.write_raw_html(literal, self.options.tag_filter);
                }
            }
            NodeKind::SoftBreak => self.out.write_str(if plain { " " } else { "\n" }),
            NodeKind::HardBreak => self.out.write_str(if plain { " " } else { "<br />\n" }),
            NodeKind::InlineTag { name, content } => {
                if plain {
                    self.out.write_escaped_attr(content);
                    return;
                }
                self.out.write_str("<code data-tag=\"");
                self.out.write_escaped_attr(name);
                self.out.write_str("\">");
                self.out.write_escaped_text(content);
                self.out.write_str("</code>");
            }
            // Stray block nodes inside inline content (post-parse edits).
            _ => self.block(id, false),
        }
    }

    fn wrap(&mut self, id: NodeId, open: &str, close: &str, plain: bool) {
        if !plain {
            self.out.write_str(open);
        }
        self.inline_children(id, plain);
        if !plain {
            self.out.write_str(close);
        }
    }

    fn inline_children(&mut self, parent: NodeId, plain: bool) {
        for child in self.doc.children(parent) {
            self.inline(child, plain);
        }
    }

    /// Destination and title of a link/image, resolving reference forms.
    fn link_target(&self, id: NodeId, data: &LinkData) -> Option<(String, Option<String>)> {
        if let Some(dest) = &data.destination {
            return Some((dest.clone(), data.title.clone()));
        }
        let def = self.doc.resolve_reference(id)?;
        Some((def.destination.clone(), def.title.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::to_html;

    #[test]
    fn test_filter_tags() {
        let mut out = String::new();
        filter_tags_into(&mut out, "<em>x</em> <script>y</script>");
        assert_eq!(out, "<em>x</em> &lt;script>y&lt;/script>");
    }

    #[test]
    fn test_filter_tags_case_and_attrs() {
        let mut out = String::new();
        filter_tags_into(&mut out, "<TITLE a=\"1\">");
        assert_eq!(out, "&lt;TITLE a=\"1\">");
        out.clear();
        filter_tags_into(&mut out, "<titlefoo>");
        assert_eq!(out, "<titlefoo>");
    }

    #[test]
    fn test_tight_list() {
        let html = to_html("- foo\n- bar");
        assert!(html.contains("<li>foo</li>"));
        assert!(!html.contains("<li><p>"));
    }

    #[test]
    fn test_loose_list() {
        let html = to_html("- foo\n\n- bar");
        assert!(html.contains("<li>\n<p>foo</p>\n</li>"));
    }

    #[test]
    fn test_ordered_start() {
        let html = to_html("3. a\n4. b");
        assert!(html.contains("<ol start=\"3\">"));
    }

    #[test]
    fn test_image_alt_is_plain() {
        let html = to_html("![foo *bar*](/url)");
        assert!(html.contains("alt=\"foo bar\""), "{html}");
        assert!(!html.contains("<em>"));
    }

    #[test]
    fn test_block_tag_section() {
        let html = to_html("@param x the value");
        assert!(html.contains("<section data-tag=\"param\">"), "{html}");
        assert!(html.contains("the value"));
    }

    #[test]
    fn test_task_items() {
        let html = to_html("- [x] done\n- [ ] todo");
        assert!(html.contains("checked=\"\""), "{html}");
        assert!(html.matches("<input").count() == 2);
    }
}
