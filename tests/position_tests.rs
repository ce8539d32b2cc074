use docmark::{
    LineCol, LineMap, Mapper, MappingSegment, NodeId, NodeKind, Options, Span, parse,
    parse_mapped,
};

/// Every node's span must lie within its parent's span.
fn assert_spans_nested(doc: &docmark::Document, id: NodeId) {
    let span = doc.span(id);
    for child in doc.children(id) {
        let child_span = doc.span(child);
        assert!(
            span.encloses(child_span),
            "child {child_span:?} outside parent {span:?} ({:?})",
            doc.kind(child)
        );
        assert_spans_nested(doc, child);
    }
}

#[test]
fn spans_nest() {
    let input = "# Head\n\npara with *em* and [l](/u)\n\n- item\n  continued\n\n> quote\n";
    let doc = parse(input);
    assert_spans_nested(&doc, doc.root());
}

#[test]
fn root_span_covers_input() {
    let input = "a\n\nb\n";
    let doc = parse(input);
    assert_eq!(doc.span(doc.root()), Span::new(0, input.len() as u32));
}

#[test]
fn heading_span() {
    let doc = parse("## abc\n");
    let heading = doc.first_child(doc.root()).unwrap();
    assert_eq!(doc.span(heading), Span::new(0, 6));
    let run = doc.first_child(heading).unwrap();
    assert_eq!(doc.span(run), Span::new(3, 6));
}

#[test]
fn inline_spans_inside_block_quote() {
    let doc = parse("> *em*\n");
    let quote = doc.first_child(doc.root()).unwrap();
    let para = doc.first_child(quote).unwrap();
    let em = doc.first_child(para).unwrap();
    assert!(matches!(doc.kind(em), NodeKind::Em));
    assert_eq!(doc.span(em), Span::new(2, 6));
    let run = doc.first_child(em).unwrap();
    assert_eq!(doc.span(run), Span::new(3, 5));
}

#[test]
fn mapped_fragments_report_source_offsets() {
    // "line one\nline two" assembled from two comment fragments at source
    // offsets 10 and 40.
    let map = Mapper::new(vec![
        MappingSegment::new(0, 10),
        MappingSegment::new(9, 40),
    ]);
    let doc = parse_mapped("line one\nline two", &map, &Options::default());
    let para = doc.first_child(doc.root()).unwrap();
    let span = doc.span(para);
    assert_eq!(span.start, 10);
    assert_eq!(span.end, 48);
}

#[test]
fn mapper_round_trip() {
    let map = Mapper::new(vec![
        MappingSegment::new(0, 100),
        MappingSegment::new(5, 210),
        MappingSegment::new(12, 315),
    ]);
    for pos in 0..40u32 {
        let source = map.to_source(pos);
        assert_eq!(map.to_pos(source), pos, "pos {pos}");
    }
}

#[test]
fn line_map_round_trip() {
    let text = "alpha\nbeta\n\ngamma";
    let map = LineMap::new(text);
    assert_eq!(map.line_count(), 4);
    for offset in 0..=text.len() as u32 {
        let lc = map.line_col(offset);
        assert_eq!(map.offset(lc), offset);
    }
    assert_eq!(map.line_col(6), LineCol { line: 1, column: 0 });
}

#[test]
fn diagnostics_spans_are_source_coordinates() {
    let map = Mapper::new(vec![MappingSegment::new(0, 1000)]);
    let doc = parse_mapped("{@link broken", &map, &Options::default());
    assert_eq!(doc.diagnostics().len(), 1);
    assert!(doc.diagnostics().entries()[0].span.start >= 1000);
}

#[test]
fn tab_positions_stay_byte_accurate() {
    // The tab occupies one byte even though it spans four columns.
    let doc = parse("\tcode\n");
    let code = doc.first_child(doc.root()).unwrap();
    assert!(matches!(doc.kind(code), NodeKind::CodeBlock { .. }));
    // The block ends at the `e`, before the final newline.
    assert_eq!(doc.span(code).end, 5);
}
