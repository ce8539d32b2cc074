use docmark::{parse, to_html};

#[test]
fn inline_links() {
    assert_eq!(
        to_html("[text](/url)"),
        "<p><a href=\"/url\">text</a></p>\n"
    );
    assert_eq!(
        to_html("[text](/url \"title\")"),
        "<p><a href=\"/url\" title=\"title\">text</a></p>\n"
    );
    assert_eq!(to_html("[a]()"), "<p><a href=\"\">a</a></p>\n");
}

#[test]
fn angle_destinations() {
    assert_eq!(
        to_html("[a](</my url>)"),
        "<p><a href=\"/my%20url\">a</a></p>\n"
    );
}

#[test]
fn reference_links() {
    assert_eq!(
        to_html("[ref]\n\n[ref]: /url \"t\""),
        "<p><a href=\"/url\" title=\"t\">ref</a></p>\n"
    );
    assert_eq!(
        to_html("[text][ref]\n\n[ref]: /url"),
        "<p><a href=\"/url\">text</a></p>\n"
    );
    assert_eq!(
        to_html("[ref][]\n\n[ref]: /url"),
        "<p><a href=\"/url\">ref</a></p>\n"
    );
}

#[test]
fn label_normalization() {
    // Case-folded and internal whitespace collapsed.
    assert_eq!(
        to_html("[Foo Bar]\n\n[foo  bar]: /url"),
        "<p><a href=\"/url\">Foo Bar</a></p>\n"
    );
}

#[test]
fn undefined_reference_is_literal() {
    assert_eq!(to_html("[nope]"), "<p>[nope]</p>\n");
    assert_eq!(to_html("[a][nope]"), "<p>[a][nope]</p>\n");
}

#[test]
fn unterminated_bracket_is_literal() {
    assert_eq!(to_html("[a"), "<p>[a</p>\n");
}

#[test]
fn definition_first_wins() {
    assert_eq!(
        to_html("[ref]\n\n[ref]: /first\n\n[ref]: /second"),
        "<p><a href=\"/first\">ref</a></p>\n"
    );
    let doc = parse("[ref]: /first\n\n[ref]: /second");
    assert_eq!(doc.diagnostics().len(), 1);
}

#[test]
fn definition_paragraph_disappears() {
    assert_eq!(to_html("[ref]: /url"), "");
    assert_eq!(
        to_html("[ref]: /url\ntrailing text"),
        "<p>trailing text</p>\n"
    );
}

#[test]
fn no_nested_links() {
    let html = to_html("[a [b](/b) c](/a)");
    // The inner link wins; the outer brackets stay literal.
    assert_eq!(html, "<p>[a <a href=\"/b\">b</a> c](/a)</p>\n");
}

#[test]
fn images() {
    assert_eq!(
        to_html("![alt](/img.png)"),
        "<p><img src=\"/img.png\" alt=\"alt\" /></p>\n"
    );
    assert_eq!(
        to_html("![alt](/img.png \"t\")"),
        "<p><img src=\"/img.png\" alt=\"alt\" title=\"t\" /></p>\n"
    );
}

#[test]
fn image_inside_link_allowed() {
    assert_eq!(
        to_html("[![alt](/img)](/dest)"),
        "<p><a href=\"/dest\"><img src=\"/img\" alt=\"alt\" /></a></p>\n"
    );
}

#[test]
fn emphasis_resolves_inside_link_text() {
    assert_eq!(
        to_html("[*em* text](/url)"),
        "<p><a href=\"/url\"><em>em</em> text</a></p>\n"
    );
}

#[test]
fn link_title_over_multiple_spaces() {
    assert_eq!(
        to_html("[a](/url    \"t\")"),
        "<p><a href=\"/url\" title=\"t\">a</a></p>\n"
    );
}

#[test]
fn destination_escapes_decoded() {
    assert_eq!(
        to_html("[a](/u\\(rl\\))"),
        "<p><a href=\"/u(rl)\">a</a></p>\n"
    );
}

#[test]
fn consecutive_definitions_then_text() {
    // Definition parsing speculates past each line end, including the
    // last byte of the input.
    assert_eq!(to_html("[a]: /1\n[b]: /2\nbody"), "<p>body</p>\n");
    assert_eq!(
        to_html("[a]: /1\n[b]: /2\n[a] and [b]"),
        "<p><a href=\"/1\">a</a> and <a href=\"/2\">b</a></p>\n"
    );
}

#[test]
fn definition_at_end_of_input() {
    assert_eq!(to_html("[a]: /1"), "");
}
