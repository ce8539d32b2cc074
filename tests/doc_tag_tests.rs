use docmark::{DiagnosticId, NodeKind, Options, parse, to_html, to_html_with_options};

#[test]
fn block_tag_with_text() {
    let doc = parse("@param name the parameter");
    let tag = doc.first_child(doc.root()).unwrap();
    let NodeKind::BlockTag { name } = doc.kind(tag) else {
        panic!("expected block tag, got {:?}", doc.kind(tag));
    };
    assert_eq!(name, "param");
    let para = doc.first_child(tag).unwrap();
    assert!(matches!(doc.kind(para), NodeKind::Paragraph));
}

#[test]
fn block_tag_continuation_lines() {
    let doc = parse("@returns the value,\nwrapped in an option");
    let tag = doc.first_child(doc.root()).unwrap();
    assert!(matches!(doc.kind(tag), NodeKind::BlockTag { .. }));
    assert!(doc.next_sibling(tag).is_none());
}

#[test]
fn consecutive_tags_are_separate_blocks() {
    let doc = parse("@param a first\n@param b second");
    let first = doc.first_child(doc.root()).unwrap();
    let second = doc.next_sibling(first).unwrap();
    assert!(matches!(doc.kind(first), NodeKind::BlockTag { .. }));
    assert!(matches!(doc.kind(second), NodeKind::BlockTag { .. }));
}

#[test]
fn block_tag_renders_as_section() {
    let html = to_html("@deprecated use the new API");
    assert_eq!(
        html,
        "<section data-tag=\"deprecated\">\n<p>use the new API</p>\n</section>\n"
    );
}

#[test]
fn deprecated_without_reason_is_reported() {
    let doc = parse("@deprecated");
    assert_eq!(doc.diagnostics().len(), 1);
    assert_eq!(
        doc.diagnostics().entries()[0].id,
        DiagnosticId::DeprecatedWithoutReason
    );
}

#[test]
fn deprecated_with_reason_is_clean() {
    let doc = parse("@deprecated use the new API");
    assert!(doc.diagnostics().is_empty());
}

#[test]
fn inline_tag() {
    let doc = parse("see {@link Target} for details");
    let para = doc.first_child(doc.root()).unwrap();
    let mut kinds = doc.children(para).map(|c| doc.kind(c).clone());
    assert!(matches!(kinds.next(), Some(NodeKind::Run { .. })));
    let Some(NodeKind::InlineTag { name, content }) = kinds.next() else {
        panic!("expected inline tag");
    };
    assert_eq!(name, "link");
    assert_eq!(content, "Target");
}

#[test]
fn inline_tag_with_nested_braces() {
    let doc = parse("{@code {a: 1}}");
    let para = doc.first_child(doc.root()).unwrap();
    let inline = doc.first_child(para).unwrap();
    let NodeKind::InlineTag { content, .. } = doc.kind(inline) else {
        panic!("expected inline tag");
    };
    assert_eq!(content, "{a: 1}");
}

#[test]
fn unterminated_inline_tag_is_literal_and_reported() {
    let doc = parse("see {@link Target");
    assert_eq!(doc.diagnostics().len(), 1);
    assert_eq!(
        doc.diagnostics().entries()[0].id,
        DiagnosticId::UnterminatedInlineTag
    );
    assert_eq!(to_html("see {@link Target"), "<p>see {@link Target</p>\n");
}

#[test]
fn brace_without_tag_is_literal() {
    assert_eq!(to_html("{not a tag}"), "<p>{not a tag}</p>\n");
    assert_eq!(to_html("{@} empty"), "<p>{@} empty</p>\n");
}

#[test]
fn inline_tag_renders_as_code() {
    assert_eq!(
        to_html("{@link Target}"),
        "<p><code data-tag=\"link\">Target</code></p>\n"
    );
}

#[test]
fn doc_tags_disabled() {
    let options = Options {
        doc_tags: false,
        ..Options::default()
    };
    assert_eq!(
        to_html_with_options("@param x", &options),
        "<p>@param x</p>\n"
    );
    assert_eq!(
        to_html_with_options("{@link X}", &options),
        "<p>{@link X}</p>\n"
    );
}

#[test]
fn email_is_not_a_block_tag() {
    // `@` mid-paragraph never starts a tag.
    let html = to_html("mail me\nuser@example.com");
    assert!(html.contains("mailto:"), "{html}");
}
