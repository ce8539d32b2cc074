use docmark::{Options, to_html, to_html_with_options};

#[test]
fn strict_uri_autolink() {
    assert_eq!(
        to_html("<https://example.com>"),
        "<p><a href=\"https://example.com\">https://example.com</a></p>\n"
    );
}

#[test]
fn strict_email_autolink() {
    assert_eq!(
        to_html("<user@example.com>"),
        "<p><a href=\"mailto:user@example.com\">user@example.com</a></p>\n"
    );
}

#[test]
fn angle_with_spaces_is_not_autolink() {
    // Raw HTML is off so the open-tag grammar cannot claim the bracketed
    // text either.
    let options = Options {
        allow_html: false,
        ..Options::default()
    };
    assert_eq!(
        to_html_with_options("<not a link>", &options),
        "<p>&lt;not a link&gt;</p>\n"
    );
}

#[test]
fn line_initial_tag_with_attributes_is_html_block() {
    assert_eq!(to_html("<not a link>"), "<not a link>\n");
}

#[test]
fn www_autolink() {
    assert_eq!(
        to_html("www.github.com"),
        "<p><a href=\"http://www.github.com\">www.github.com</a></p>\n"
    );
}

#[test]
fn url_autolink() {
    assert_eq!(
        to_html("visit https://github.com/rust-lang now"),
        "<p>visit <a href=\"https://github.com/rust-lang\">https://github.com/rust-lang</a> now</p>\n"
    );
}

#[test]
fn trailing_punctuation_trimmed() {
    assert_eq!(
        to_html("www.example.com/a."),
        "<p><a href=\"http://www.example.com/a\">www.example.com/a</a>.</p>\n"
    );
}

#[test]
fn unbalanced_paren_trimmed() {
    let html = to_html("(see www.example.com/a_(b))");
    assert!(html.contains("href=\"http://www.example.com/a_(b)\""), "{html}");
    assert!(html.ends_with(")</p>\n"), "{html}");
}

#[test]
fn bare_domain_is_not_linked() {
    assert_eq!(to_html("example.com"), "<p>example.com</p>\n");
    // A scheme-less single word never triggers.
    assert_eq!(to_html("http is a protocol"), "<p>http is a protocol</p>\n");
}

#[test]
fn underscore_in_last_labels_blocks_link() {
    let html = to_html("www.exa_mple.com");
    assert!(!html.contains("<a"), "{html}");
}

#[test]
fn bare_email_autolink() {
    assert_eq!(
        to_html("mail user.name+tag@example.com today"),
        "<p>mail <a href=\"mailto:user.name+tag@example.com\">user.name+tag@example.com</a> today</p>\n"
    );
}

#[test]
fn email_trailing_dot_trimmed() {
    assert_eq!(
        to_html("a@b.com."),
        "<p><a href=\"mailto:a@b.com\">a@b.com</a>.</p>\n"
    );
}

#[test]
fn no_boundary_no_autolink() {
    let html = to_html("xwww.example.com");
    assert!(!html.contains("<a"), "{html}");
}

#[test]
fn autolinks_disabled() {
    let options = Options {
        autolinks: false,
        ..Options::default()
    };
    assert_eq!(
        to_html_with_options("www.example.com", &options),
        "<p>www.example.com</p>\n"
    );
    // Strict angle autolinks stay on.
    assert!(to_html_with_options("<https://x.dev>", &options).contains("<a"));
}
