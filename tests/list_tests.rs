use docmark::{NodeKind, parse, to_html};

#[test]
fn tight_bullet_list() {
    assert_eq!(
        to_html("- a\n- b"),
        "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n"
    );
}

#[test]
fn tight_list_tree_shape() {
    let doc = parse("- a\n- b\n");
    let list = doc.first_child(doc.root()).unwrap();
    let NodeKind::List(data) = doc.kind(list) else {
        panic!("expected list");
    };
    assert!(data.tight);
    assert_eq!(doc.children(list).count(), 2);
}

#[test]
fn loose_list_from_blank_between_items() {
    let doc = parse("- a\n\n- b");
    let list = doc.first_child(doc.root()).unwrap();
    let NodeKind::List(data) = doc.kind(list) else {
        panic!("expected list");
    };
    assert!(!data.tight);
}

#[test]
fn loose_list_from_blank_inside_item() {
    let doc = parse("- a\n\n  still a\n- b");
    let NodeKind::List(data) = doc.kind(doc.first_child(doc.root()).unwrap()) else {
        panic!("expected list");
    };
    assert!(!data.tight);
}

#[test]
fn trailing_blank_does_not_loosen() {
    let doc = parse("- a\n- b\n\npara");
    let NodeKind::List(data) = doc.kind(doc.first_child(doc.root()).unwrap()) else {
        panic!("expected list");
    };
    assert!(data.tight);
}

#[test]
fn ordered_list_start_and_delim() {
    assert_eq!(
        to_html("3. a\n4. b"),
        "<ol start=\"3\">\n<li>a</li>\n<li>b</li>\n</ol>\n"
    );
    assert_eq!(to_html("1) a"), "<ol>\n<li>a</li>\n</ol>\n");
}

#[test]
fn marker_change_splits_lists() {
    let doc = parse("- a\n+ b");
    let first = doc.first_child(doc.root()).unwrap();
    let second = doc.next_sibling(first).unwrap();
    assert!(matches!(doc.kind(first), NodeKind::List(_)));
    assert!(matches!(doc.kind(second), NodeKind::List(_)));
}

#[test]
fn nested_lists() {
    assert_eq!(
        to_html("- a\n  - b"),
        "<ul>\n<li>a\n<ul>\n<li>b</li>\n</ul>\n</li>\n</ul>\n"
    );
}

#[test]
fn list_interrupts_paragraph_only_when_unambiguous() {
    // A bullet interrupts.
    let html = to_html("para\n- item");
    assert!(html.contains("<ul>"));
    // An ordered marker not starting at 1 does not.
    let html = to_html("para\n2. item");
    assert!(!html.contains("<ol>"), "{html}");
}

#[test]
fn empty_item_cannot_interrupt() {
    let html = to_html("para\n-");
    assert!(!html.contains("<ul>"), "{html}");
}

#[test]
fn item_content_column_governs_nesting() {
    // Content indented to the item's content column stays in the item.
    let html = to_html("- a\n  b");
    assert!(html.contains("<li>a\nb</li>"), "{html}");
    // Less indented text falls out of the list.
    let html = to_html("- a\n\nb");
    assert!(html.contains("</ul>\n<p>b</p>"), "{html}");
}

#[test]
fn large_indent_after_marker_is_code_start() {
    // Five spaces after the marker: content starts one past the marker and
    // the rest is indented code.
    let html = to_html("-     code");
    assert!(html.contains("<pre><code>code"), "{html}");
}

#[test]
fn block_quote_in_list_item() {
    assert_eq!(
        to_html("- > q"),
        "<ul>\n<li>\n<blockquote>\n<p>q</p>\n</blockquote>\n</li>\n</ul>\n"
    );
}

#[test]
fn unindented_text_after_blank_ends_list() {
    assert_eq!(to_html("- a\n\nb"), "<ul>\n<li>a</li>\n</ul>\n<p>b</p>\n");
}
