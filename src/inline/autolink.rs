//! Autolinks: the `<scheme:...>` / `<addr@host>` forms plus the extended
//! bare-URL and bare-email forms.

use crate::range::Span;
use crate::scanner::{Scanner, Token, TokenKind, is_unicode_whitespace};
use crate::tree::NodeKind;

use super::InlineParser;

/// Rescan rule for `<uri>` and `<email>` autolinks.
///
/// The token value holds the text between the angle brackets.
pub(super) fn rescan_autolink(s: &mut Scanner<'_>) -> Option<Token> {
    let start = s.token().span.start;
    let column = s.token().column;
    let (inner, email) = s.pre().speculate(false, |p| {
        if p.read()? != '<' {
            return None;
        }
        let mut inner = String::new();
        loop {
            match p.read()? {
                '>' => break,
                c if c == '<' || is_unicode_whitespace(c) => return None,
                c => inner.push(c),
            }
        }
        if is_email_address(&inner) {
            Some((inner, true))
        } else if is_absolute_uri(&inner) {
            Some((inner, false))
        } else {
            None
        }
    })?;
    let mut token = s.make_token(TokenKind::AutolinkUri { email }, start, column);
    token.value = Some(inner);
    Some(token)
}

/// `scheme:rest` with a 2-32 character scheme.
fn is_absolute_uri(text: &str) -> bool {
    let Some(colon) = text.find(':') else {
        return false;
    };
    let scheme = &text[..colon];
    let len = scheme.chars().count();
    if !(2..=32).contains(&len) {
        return false;
    }
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme[1..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

fn is_email_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '.' | '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '/' | '=' | '?' | '^'
                | '_' | '`' | '{' | '|' | '}' | '~' | '-'
        )
}

/// The CommonMark autolink email shape: local@label(.label)*.
fn is_email_address(text: &str) -> bool {
    let Some(at) = text.find('@') else {
        return false;
    };
    let (local, domain) = (&text[..at], &text[at + 1..]);
    if local.is_empty() || !local.chars().all(is_email_local_char) {
        return false;
    }
    !domain.is_empty() && domain.split('.').all(is_domain_label)
}

fn is_domain_label(label: &str) -> bool {
    if label.is_empty() || label.chars().count() > 63 {
        return false;
    }
    let ends_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    ends_ok(label.chars().next())
        && ends_ok(label.chars().next_back())
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

impl InlineParser<'_, '_, '_> {
    /// Extended bare-URL autolink at a `www` / `http` / `https` / `ftp`
    /// text token. Consumes the URL and emits the node when it matches.
    pub(super) fn try_extended_url(&mut self, token: &Token) -> bool {
        let start = token.span.start as usize;
        let content = self.scanner.text();
        let before = content[..start].chars().next_back();
        let boundary =
            before.is_none_or(|c| is_unicode_whitespace(c) || matches!(c, '*' | '_' | '~' | '('));
        if !boundary {
            return false;
        }
        let rest = &content[start..];
        let prefix_len = ["www.", "http://", "https://", "ftp://"]
            .iter()
            .find(|p| rest.starts_with(*p))
            .map(|p| p.len());
        let Some(prefix_len) = prefix_len else {
            return false;
        };

        let body_end = rest
            .find(|c: char| is_unicode_whitespace(c) || c == '<')
            .unwrap_or(rest.len());
        let trimmed = trim_url_end(&rest[..body_end]);
        if trimmed.len() <= prefix_len {
            return false;
        }
        // The `www.` prefix counts towards the domain; a scheme does not.
        let domain_start = if trimmed.starts_with("www.") { 0 } else { prefix_len };
        let domain_end = trimmed[prefix_len..]
            .find(['/', '?', '#'])
            .map_or(trimmed.len(), |i| prefix_len + i);
        if !is_autolink_domain(&trimmed[domain_start..domain_end]) {
            return false;
        }

        let end = (start + trimmed.len()) as u32;
        while self.scanner.pre().pos() < end {
            self.scanner.pre().read();
        }
        self.flush_run();
        self.append_node(
            NodeKind::Autolink {
                uri: trimmed.to_string(),
                email: false,
            },
            Span::new(self.to_working(start as u32), self.to_working(end)),
        );
        true
    }

    /// Extended bare-email autolink at an `@`; the local part is stolen
    /// back from the pending run.
    pub(super) fn try_extended_email(&mut self, token: &Token) -> bool {
        let at = token.span.start as usize;
        let content = self.scanner.text();
        let local_start = content[..at]
            .rfind(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-')))
            .map_or(0, |i| i + content[i..].chars().next().map_or(1, char::len_utf8));
        let local = &content[local_start..at];
        if local.is_empty() {
            return false;
        }
        let (_, run_end) = self.run_state();
        if run_end as usize != at {
            // The characters before `@` are not plain pending text.
            return false;
        }

        let domain_len = {
            let rest = &content[at + 1..];
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
                .unwrap_or(rest.len());
            end
        };
        let domain = &content[at + 1..at + 1 + domain_len];
        let domain = domain.trim_end_matches(['.', '_', '-']);
        if !domain.contains('.') || !is_extended_email_domain(domain) {
            return false;
        }
        if !self.steal_run_tail(local) {
            return false;
        }

        let end = (at + 1 + domain.len()) as u32;
        while self.scanner.pre().pos() < end {
            self.scanner.pre().read();
        }
        self.flush_run();
        let uri = format!("{local}@{domain}");
        self.append_node(
            NodeKind::Autolink { uri, email: true },
            Span::new(self.to_working(local_start as u32), self.to_working(end)),
        );
        true
    }
}

/// GFM domain shape for extended autolinks: dotted labels of alphanumerics,
/// `-` and `_`, with no underscore in the last two labels.
fn is_autolink_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return false;
    }
    let valid = |l: &str| {
        l.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    };
    if !labels.iter().all(|l| valid(l)) {
        return false;
    }
    labels
        .iter()
        .rev()
        .take(2)
        .all(|l| !l.contains('_'))
}

fn is_extended_email_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| {
            !l.is_empty()
                && l.chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        })
        && domain
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric())
}

/// Strip trailing punctuation, unbalanced `)` and trailing entity-like
/// references from an extended autolink.
fn trim_url_end(url: &str) -> &str {
    let mut url = url;
    loop {
        let Some(last) = url.chars().next_back() else {
            return url;
        };
        match last {
            '?' | '!' | '.' | ',' | ':' | '*' | '_' | '~' | '\'' | '"' => {
                url = &url[..url.len() - last.len_utf8()];
            }
            ')' => {
                let opens = url.bytes().filter(|&b| b == b'(').count();
                let closes = url.bytes().filter(|&b| b == b')').count();
                if closes > opens {
                    url = &url[..url.len() - 1];
                } else {
                    return url;
                }
            }
            ';' => {
                // Strip a trailing entity-like `&name;`; a bare semicolon
                // stays part of the URL.
                let body = &url[..url.len() - 1];
                match body.rfind('&') {
                    Some(amp)
                        if !body[amp + 1..].is_empty()
                            && body[amp + 1..].chars().all(|c| c.is_ascii_alphanumeric()) =>
                    {
                        url = &url[..amp];
                    }
                    _ => return url,
                }
            }
            _ => return url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_uri() {
        assert!(is_absolute_uri("https://example.com"));
        assert!(is_absolute_uri("mailto:x@y"));
        assert!(!is_absolute_uri("h:oops"));
        assert!(!is_absolute_uri("no-colon"));
    }

    #[test]
    fn test_email_address() {
        assert!(is_email_address("foo@bar.example.com"));
        assert!(is_email_address("foo+special@Bz.qa"));
        assert!(!is_email_address("foo@bar-.com"));
        assert!(!is_email_address("@bar.com"));
    }

    #[test]
    fn test_trim_url_end() {
        assert_eq!(trim_url_end("www.example.com/a."), "www.example.com/a");
        assert_eq!(trim_url_end("www.example.com/a.,:"), "www.example.com/a");
        assert_eq!(trim_url_end("www.example.com/a)"), "www.example.com/a");
        assert_eq!(trim_url_end("www.example.com/a_(b)"), "www.example.com/a_(b)");
        assert_eq!(trim_url_end("www.example.com/a&amp;"), "www.example.com/a");
        assert_eq!(trim_url_end("www.example.com/a&b;"), "www.example.com/a");
        assert_eq!(trim_url_end("www.example.com/a;"), "www.example.com/a;");
    }

    #[test]
    fn test_autolink_domain() {
        assert!(is_autolink_domain("www.example.com"));
        assert!(!is_autolink_domain("example"));
        assert!(is_autolink_domain("a-b.c"));
        assert!(!is_autolink_domain("a.b_c.d"));
        assert!(is_autolink_domain("a_b.c.d"));
    }
}
