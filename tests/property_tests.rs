use docmark::{Mapper, MappingSegment, parse, to_html};
use proptest::prelude::*;

proptest! {
    /// Parsing and rendering never panic, whatever the input.
    #[test]
    fn parse_never_panics(input in "\\PC{0,400}") {
        let doc = parse(&input);
        let _ = to_html(&input);
        prop_assert!(doc.span(doc.root()).start == 0);
    }

    /// Inputs heavy on delimiter runs stay linear enough to finish and
    /// produce nesting-consistent trees.
    #[test]
    fn delimiter_runs_terminate(runs in prop::collection::vec((1u8..4, prop::bool::ANY), 0..120)) {
        let mut input = String::new();
        for (len, star) in runs {
            let marker = if star { '*' } else { '_' };
            for _ in 0..len {
                input.push(marker);
            }
            input.push('a');
        }
        let _ = to_html(&input);
    }

    /// Mapper translation round-trips through every segment.
    #[test]
    fn mapper_round_trips(gaps in prop::collection::vec((1u32..50, 1u32..50), 1..20), probe in 0u32..2000) {
        let mut segments = vec![MappingSegment::new(0, 0)];
        let (mut pos, mut source) = (0u32, 0u32);
        for (len, gap) in gaps {
            pos += len;
            source += len + gap;
            segments.push(MappingSegment::new(pos, source));
        }
        let map = Mapper::new(segments);
        prop_assert_eq!(map.to_pos(map.to_source(probe)), probe);
    }

    /// Child spans stay inside their parents for arbitrary block soup.
    #[test]
    fn spans_always_nest(input in "(#{1,3} \\w{1,8}\n|> \\w{1,8}\n|- \\w{1,8}\n|\\w{1,12}\n|\n){0,30}") {
        let doc = parse(&input);
        let mut stack = vec![doc.root()];
        while let Some(id) = stack.pop() {
            let span = doc.span(id);
            for child in doc.children(id) {
                prop_assert!(span.encloses(doc.span(child)));
                stack.push(child);
            }
        }
    }
}
