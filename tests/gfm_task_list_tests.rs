use docmark::{NodeKind, Options, parse, to_html, to_html_with_options};

#[test]
fn basic_task_items() {
    let html = to_html("- [ ] todo\n- [x] done");
    assert_eq!(
        html,
        "<ul>\n<li><input type=\"checkbox\" disabled=\"\" /> todo</li>\n\
         <li><input type=\"checkbox\" disabled=\"\" checked=\"\" /> done</li>\n</ul>\n"
    );
}

#[test]
fn uppercase_x_checks() {
    let doc = parse("- [X] done");
    let list = doc.first_child(doc.root()).unwrap();
    let item = doc.first_child(list).unwrap();
    assert_eq!(doc.kind(item), &NodeKind::ListItem { task: Some(true) });
}

#[test]
fn checkbox_requires_following_space() {
    let html = to_html("- [x]done");
    assert!(!html.contains("<input"), "{html}");
    assert!(html.contains("[x]done"));
}

#[test]
fn checkbox_only_at_item_start() {
    let html = to_html("- foo [x] bar");
    assert!(!html.contains("<input"));
}

#[test]
fn ordered_task_items() {
    let html = to_html("1. [ ] a\n2. [x] b");
    assert_eq!(html.matches("<input").count(), 2);
}

#[test]
fn task_lists_disabled() {
    let options = Options {
        task_lists: false,
        ..Options::default()
    };
    let html = to_html_with_options("- [x] done", &options);
    assert!(!html.contains("<input"));
    assert!(html.contains("[x] done"));
}

#[test]
fn mixed_task_and_plain_items() {
    let doc = parse("- [ ] a\n- b");
    let list = doc.first_child(doc.root()).unwrap();
    let first = doc.first_child(list).unwrap();
    let second = doc.next_sibling(first).unwrap();
    assert_eq!(doc.kind(first), &NodeKind::ListItem { task: Some(false) });
    assert_eq!(doc.kind(second), &NodeKind::ListItem { task: None });
}
