use docmark::to_html;

#[test]
fn atx_headings() {
    assert_eq!(to_html("# one"), "<h1>one</h1>\n");
    assert_eq!(to_html("###### six"), "<h6>six</h6>\n");
    // Seven hashes is a paragraph.
    assert_eq!(to_html("####### seven"), "<p>####### seven</p>\n");
}

#[test]
fn atx_closing_sequence() {
    assert_eq!(to_html("## foo ##"), "<h2>foo</h2>\n");
    assert_eq!(to_html("# foo#"), "<h1>foo#</h1>\n");
}

#[test]
fn setext_headings() {
    assert_eq!(to_html("Title\n====="), "<h1>Title</h1>\n");
    assert_eq!(to_html("Title\n-----"), "<h2>Title</h2>\n");
    assert_eq!(to_html("multi\nline\n==="), "<h1>multi\nline</h1>\n");
}

#[test]
fn thematic_breaks() {
    assert_eq!(to_html("---"), "<hr />\n");
    assert_eq!(to_html("***"), "<hr />\n");
    assert_eq!(to_html("_ _ _"), "<hr />\n");
    // An interrupted paragraph followed by dashes is a setext heading.
    assert_eq!(to_html("foo\n---"), "<h2>foo</h2>\n");
}

#[test]
fn fenced_code_blocks() {
    assert_eq!(
        to_html("```rust\nfn main() {}\n```"),
        "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>\n"
    );
    assert_eq!(to_html("```\n<b>\n```"), "<pre><code>&lt;b&gt;\n</code></pre>\n");
}

#[test]
fn fenced_code_unterminated_runs_to_end() {
    assert_eq!(to_html("```\nabc"), "<pre><code>abc\n</code></pre>\n");
}

#[test]
fn indented_code_blocks() {
    assert_eq!(to_html("    code"), "<pre><code>code\n</code></pre>\n");
    // Blank lines around indented code are trimmed.
    assert_eq!(
        to_html("    a\n\n    b"),
        "<pre><code>a\n\nb\n</code></pre>\n"
    );
}

#[test]
fn indented_code_cannot_interrupt_paragraph() {
    assert_eq!(to_html("para\n    still para"), "<p>para\nstill para</p>\n");
}

#[test]
fn block_quotes() {
    assert_eq!(to_html("> hi"), "<blockquote>\n<p>hi</p>\n</blockquote>\n");
    assert_eq!(
        to_html("> a\n> b"),
        "<blockquote>\n<p>a\nb</p>\n</blockquote>\n"
    );
}

#[test]
fn block_quote_lazy_continuation() {
    assert_eq!(
        to_html("> a\nb"),
        "<blockquote>\n<p>a\nb</p>\n</blockquote>\n"
    );
}

#[test]
fn nested_block_quotes() {
    assert_eq!(
        to_html("> > deep"),
        "<blockquote>\n<blockquote>\n<p>deep</p>\n</blockquote>\n</blockquote>\n"
    );
}

#[test]
fn html_block_passthrough() {
    assert_eq!(to_html("<div>\nraw\n</div>"), "<div>\nraw\n</div>\n");
}

#[test]
fn tab_expansion_in_indentation() {
    // A tab advances to the next multiple of four columns.
    assert_eq!(to_html("\tcode"), "<pre><code>code\n</code></pre>\n");
    assert_eq!(to_html("  - a\n\t- b"), to_html("  - a\n    - b"));
}

#[test]
fn hard_breaks() {
    assert_eq!(to_html("a  \nb"), "<p>a<br />\nb</p>\n");
    assert_eq!(to_html("a\\\nb"), "<p>a<br />\nb</p>\n");
    assert_eq!(to_html("a\nb"), "<p>a\nb</p>\n");
}
