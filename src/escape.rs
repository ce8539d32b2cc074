//! HTML escaping utilities.
//!
//! Fast-path optimized: scans for the first escapable character, then
//! bulk-copies the clean segments between escapes.

/// Lookup table for escapable characters in text content.
///
/// `"` is escaped as `&quot;` too, matching the conformance corpus.
const TEXT_ESCAPE_TABLE: [bool; 256] = {
    let mut table = [false; 256];
    table[b'<' as usize] = true;
    table[b'>' as usize] = true;
    table[b'&' as usize] = true;
    table[b'"' as usize] = true;
    table
};

/// Characters percent-encoded when writing link destinations.
const URL_ESCAPE_TABLE: [bool; 256] = {
    let mut table = [false; 256];
    table[b'"' as usize] = true;
    table[b'<' as usize] = true;
    table[b'>' as usize] = true;
    table[b'`' as usize] = true;
    table[b'[' as usize] = true;
    table[b']' as usize] = true;
    table[b'\\' as usize] = true;
    table[b' ' as usize] = true;
    table[b'^' as usize] = true;
    table[b'{' as usize] = true;
    table[b'}' as usize] = true;
    table[b'|' as usize] = true;
    let mut i = 0;
    while i < 0x20 {
        table[i] = true;
        i += 1;
    }
    table[0x7f] = true;
    table
};

fn find_escapable(bytes: &[u8], table: &[bool; 256]) -> Option<usize> {
    bytes.iter().position(|&b| table[b as usize])
}

/// Escape HTML text content into the output buffer.
pub fn escape_text_into(out: &mut String, input: &str) {
    let mut rest = input;
    while let Some(idx) = find_escapable(rest.as_bytes(), &TEXT_ESCAPE_TABLE) {
        out.push_str(&rest[..idx]);
        match rest.as_bytes()[idx] {
            b'<' => out.push_str("&lt;"),
            b'>' => out.push_str("&gt;"),
            b'&' => out.push_str("&amp;"),
            b'"' => out.push_str("&quot;"),
            _ => unreachable!(),
        }
        rest = &rest[idx + 1..];
    }
    out.push_str(rest);
}

/// Escape an HTML attribute value into the output buffer.
///
/// Same set as text content; single quotes never delimit our attributes.
#[inline]
pub fn escape_attr_into(out: &mut String, input: &str) {
    escape_text_into(out, input);
}

/// Percent-encode a link destination, then HTML-escape the result.
///
/// Already-encoded sequences pass through untouched, so encoding is
/// idempotent for typical URLs.
pub fn escape_href_into(out: &mut String, input: &str) {
    for &b in input.as_bytes() {
        if b < 0x80 && URL_ESCAPE_TABLE[b as usize] {
            push_percent(out, b);
        } else {
            match b {
                b'&' => out.push_str("&amp;"),
                b'\'' => out.push_str("&#x27;"),
                _ if b < 0x80 => out.push(b as char),
                // Non-ASCII bytes of the UTF-8 encoding are percent-encoded.
                _ => push_percent(out, b),
            }
        }
    }
}

fn push_percent(out: &mut String, b: u8) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    out.push('%');
    out.push(HEX[(b >> 4) as usize] as char);
    out.push(HEX[(b & 0xf) as usize] as char);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(input: &str) -> String {
        let mut out = String::new();
        escape_text_into(&mut out, input);
        out
    }

    fn href(input: &str) -> String {
        let mut out = String::new();
        escape_href_into(&mut out, input);
        out
    }

    #[test]
    fn test_escape_text_basic() {
        assert_eq!(text("a<b>c"), "a&lt;b&gt;c");
        assert_eq!(text("a&b"), "a&amp;b");
        assert_eq!(text("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn test_escape_text_clean_passthrough() {
        assert_eq!(text("nothing to do here"), "nothing to do here");
    }

    #[test]
    fn test_escape_href() {
        assert_eq!(href("/url?a=1&b=2"), "/url?a=1&amp;b=2");
        assert_eq!(href("/a b"), "/a%20b");
        assert_eq!(href("/ö"), "/%C3%B6");
        // Existing percent escapes pass through.
        assert_eq!(href("/a%20b"), "/a%20b");
    }
}
