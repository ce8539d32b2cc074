//! Backtick code spans.

use crate::limits::MAX_CODE_SPAN_BACKTICKS;
use crate::range::Span;
use crate::scanner::Token;
use crate::tree::NodeKind;

use super::InlineParser;

impl InlineParser<'_, '_, '_> {
    /// Resolve a backtick run into a code span, or leave it literal when no
    /// closing run of the same length follows.
    pub(super) fn code_span(&mut self, token: &Token) {
        let start = token.span.start;
        let mut open_len = 1u32;
        while self.scanner.pre().peek() == Some('`') {
            self.scanner.pre().read();
            open_len += 1;
        }
        let open_end = self.scanner.pre().pos();
        let text = self.scanner.text();

        if open_len > MAX_CODE_SPAN_BACKTICKS {
            self.append_lit(&text[start as usize..open_end as usize], start, open_end);
            return;
        }

        // Find the next backtick run of exactly the opening length.
        let bytes = text.as_bytes();
        let mut i = open_end as usize;
        let closer = loop {
            match memchr::memchr(b'`', &bytes[i..]) {
                None => break None,
                Some(off) => {
                    let run_start = i + off;
                    let mut run_end = run_start;
                    while run_end < bytes.len() && bytes[run_end] == b'`' {
                        run_end += 1;
                    }
                    if (run_end - run_start) as u32 == open_len {
                        break Some((run_start, run_end));
                    }
                    i = run_end;
                }
            }
        };
        let Some((content_end, span_end)) = closer else {
            self.append_lit(&text[start as usize..open_end as usize], start, open_end);
            return;
        };

        while (self.scanner.pre().pos() as usize) < span_end {
            self.scanner.pre().read();
        }

        let mut literal = text[open_end as usize..content_end].replace('\n', " ");
        let padded = literal.len() >= 2
            && literal.starts_with(' ')
            && literal.ends_with(' ')
            && !literal.bytes().all(|b| b == b' ');
        if padded {
            literal = literal[1..literal.len() - 1].to_string();
        }

        self.flush_run();
        let span = Span::new(self.to_working(start), self.to_working(span_end as u32));
        self.append_node(NodeKind::Code { literal }, span);
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use crate::tree::NodeKind;

    fn first_inline(input: &str) -> NodeKind {
        let doc = parse(input);
        let para = doc.first_child(doc.root()).unwrap();
        let inline = doc.first_child(para).unwrap();
        doc.kind(inline).clone()
    }

    #[test]
    fn test_simple_code_span() {
        let NodeKind::Code { literal } = first_inline("`foo`") else {
            panic!("expected code span");
        };
        assert_eq!(literal, "foo");
    }

    #[test]
    fn test_padding_stripped_once() {
        let NodeKind::Code { literal } = first_inline("` `` `") else {
            panic!("expected code span");
        };
        assert_eq!(literal, "``");
    }

    #[test]
    fn test_all_space_content_kept() {
        let NodeKind::Code { literal } = first_inline("`  `") else {
            panic!("expected code span");
        };
        assert_eq!(literal, "  ");
    }

    #[test]
    fn test_newline_becomes_space() {
        let NodeKind::Code { literal } = first_inline("`a\nb`") else {
            panic!("expected code span");
        };
        assert_eq!(literal, "a b");
    }

    #[test]
    fn test_unbalanced_run_is_literal() {
        let NodeKind::Run { text } = first_inline("``foo`") else {
            panic!("expected literal run");
        };
        assert_eq!(text, "``foo`");
    }

    #[test]
    fn test_mismatched_inner_run() {
        let NodeKind::Code { literal } = first_inline("`` `foo` ``") else {
            panic!("expected code span");
        };
        assert_eq!(literal, "`foo`");
    }
}
