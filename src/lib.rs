//! docmark: position-tracked Markdown parser for documentation comments
//!
//! Parses CommonMark plus the GFM extensions (tables, strikethrough, task
//! lists, extended autolinks) plus documentation tags (block `@tag` sections
//! and inline `{@tag ...}` references) into a mutable syntax tree whose
//! spans point back into the original source, even when the input was
//! reassembled from doc-comment fragments.
//!
//! # Design Principles
//! - Two phases: block structure first, inline structure over the collected
//!   leaf buffers afterwards
//! - Total grammar: malformed input degrades to literal text, findings go to
//!   a diagnostics log, nothing aborts
//! - Every node carries a source span; position mapping composes through
//!   preprocessing and content extraction
//!
//! # Example
//! ```
//! let html = docmark::to_html("# Hello\n\nWorld");
//! assert!(html.contains("<h1>Hello</h1>"));
//! assert!(html.contains("<p>World</p>"));
//! ```

pub mod diag;
pub mod emit;
pub mod escape;
pub mod line_map;
pub mod link_ref;
pub mod range;
pub mod render;
pub mod source_map;
pub mod tree;

mod block;
mod inline;
mod limits;
mod link_syntax;
mod preprocess;
mod scanner;

// Re-export primary types
pub use diag::{Diagnostic, DiagnosticId, Diagnostics};
pub use line_map::{LineCol, LineMap};
pub use link_ref::{LinkRefDef, LinkRefStore};
pub use range::Span;
pub use render::HtmlWriter;
pub use source_map::{Mapper, MappingSegment};
pub use tree::{Document, NodeId, NodeKind};

/// Parsing/rendering options.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Allow raw inline and block HTML.
    pub allow_html: bool,
    /// `~~text~~` strikethrough.
    pub strikethrough: bool,
    /// Extended bare-URL, `www.` and email autolinks.
    pub autolinks: bool,
    /// `[ ]` / `[x]` task-list item markers.
    pub task_lists: bool,
    /// Pipe tables with a delimiter row.
    pub tables: bool,
    /// Escape disallowed raw-HTML tags in the rendered output.
    pub tag_filter: bool,
    /// `@tag` block tags and `{@tag ...}` inline tags.
    pub doc_tags: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            allow_html: true,
            strikethrough: true,
            autolinks: true,
            task_lists: true,
            tables: true,
            tag_filter: true,
            doc_tags: true,
        }
    }
}

/// Parse a document with default options.
///
/// This is the primary API for simple use cases.
///
/// # Example
/// ```
/// let doc = docmark::parse("*hi*");
/// assert!(doc.diagnostics().is_empty());
/// ```
pub fn parse(input: &str) -> Document {
    parse_with_options(input, &Options::default())
}

/// Parse a document with options.
pub fn parse_with_options(input: &str, options: &Options) -> Document {
    parse_mapped(input, &Mapper::identity(), options)
}

/// Parse a document whose text was reassembled from source fragments.
///
/// `source_map` translates offsets in `input` to offsets in the original
/// source (per-line doc-comment fragments, say); every span in the returned
/// tree and every diagnostic is expressed in those original coordinates.
pub fn parse_mapped(input: &str, source_map: &Mapper, options: &Options) -> Document {
    let (working, map) = preprocess::normalize(input, source_map);
    let (mut doc, tasks) = block::BlockParser::parse(&working, options);
    inline::process(&mut doc, &tasks, options);
    finalize_spans(&mut doc, &map);
    doc
}

/// Convert input to HTML with default options.
///
/// # Example
/// ```
/// let html = docmark::to_html("- a\n- b");
/// assert!(html.contains("<li>a</li>"));
/// ```
pub fn to_html(input: &str) -> String {
    to_html_with_options(input, &Options::default())
}

/// Convert input to HTML with options.
pub fn to_html_with_options(input: &str, options: &Options) -> String {
    let doc = parse_with_options(input, options);
    render::render_html(&doc, options)
}

/// Rewrite every span from working-buffer coordinates to original source
/// coordinates.
fn finalize_spans(doc: &mut Document, map: &Mapper) {
    if map.is_identity() {
        return;
    }
    let mut stack = vec![doc.root()];
    while let Some(id) = stack.pop() {
        let span = doc.span(id);
        doc.node_mut(id).span =
            Span::new(map.to_source(span.start), map.to_source(span.end));
        let mut child = doc.first_child(id);
        while let Some(c) = child {
            stack.push(c);
            child = doc.next_sibling(c);
        }
    }
    for d in doc.diagnostics.entries_mut() {
        d.span = Span::new(map.to_source(d.span.start), map.to_source(d.span.end));
    }
}
