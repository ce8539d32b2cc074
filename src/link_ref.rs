//! Link reference definitions.
//!
//! Built once per document during the block phase from `[label]: dest "t"`
//! lines; consulted read-only by phase-2 link and image resolution.

use rustc_hash::FxBuildHasher as FastHashBuilder;
use std::collections::HashMap;

/// A link reference definition (destination + optional title).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRefDef {
    pub destination: String,
    pub title: Option<String>,
}

/// Store of link reference definitions, keyed by normalized label.
#[derive(Debug, Default)]
pub struct LinkRefStore {
    defs: Vec<LinkRefDef>,
    by_label: HashMap<String, usize, FastHashBuilder>,
}

impl LinkRefStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition under an already-normalized label.
    ///
    /// First definition wins; returns false when the label was taken.
    pub fn insert(&mut self, label: String, def: LinkRefDef) -> bool {
        if self.by_label.contains_key(&label) {
            return false;
        }
        let idx = self.defs.len();
        self.defs.push(def);
        self.by_label.insert(label, idx);
        true
    }

    /// Index of a definition by normalized label.
    pub fn get_index(&self, label: &str) -> Option<usize> {
        self.by_label.get(label).copied()
    }

    pub fn get(&self, idx: usize) -> Option<&LinkRefDef> {
        self.defs.get(idx)
    }

    /// Look a definition up by normalized label.
    pub fn lookup(&self, label: &str) -> Option<&LinkRefDef> {
        self.get_index(label).and_then(|i| self.get(i))
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }
}

/// Normalize a link label: decode entities, process backslash escapes,
/// collapse internal whitespace to single spaces, trim, and case-fold.
pub fn normalize_label(label: &str) -> String {
    let decoded = html_escape::decode_html_entities(label);

    let mut unescaped = String::with_capacity(decoded.len());
    let mut chars = decoded.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) if is_label_escapable(next) => unescaped.push(next),
                Some(next) => {
                    unescaped.push('\\');
                    unescaped.push(next);
                }
                None => unescaped.push('\\'),
            }
        } else {
            unescaped.push(c);
        }
    }

    let mut out = String::with_capacity(unescaped.len());
    let mut last_was_space = true;
    for ch in unescaped.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
            continue;
        }
        last_was_space = false;
        // Unicode case folding: ß folds to "ss", which to_lowercase misses.
        if ch == 'ß' || ch == 'ẞ' {
            out.push_str("ss");
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

#[inline]
fn is_label_escapable(c: char) -> bool {
    matches!(c, '[' | ']' | '\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_case_fold_and_collapse() {
        assert_eq!(normalize_label("Foo Bar"), "foo bar");
        assert_eq!(normalize_label("foo  \t bar"), "foo bar");
        assert_eq!(normalize_label("  Foo  "), "foo");
    }

    #[test]
    fn test_normalize_sharp_s() {
        assert_eq!(normalize_label("Straße"), "strasse");
    }

    #[test]
    fn test_normalize_escapes_and_entities() {
        assert_eq!(normalize_label("a\\]b"), "a]b");
        assert_eq!(normalize_label("a&amp;b"), "a&b");
    }

    #[test]
    fn test_first_definition_wins() {
        let mut store = LinkRefStore::new();
        assert!(store.insert(
            "foo".into(),
            LinkRefDef {
                destination: "/first".into(),
                title: None
            }
        ));
        assert!(!store.insert(
            "foo".into(),
            LinkRefDef {
                destination: "/second".into(),
                title: None
            }
        ));
        assert_eq!(store.lookup("foo").unwrap().destination, "/first");
    }

    #[test]
    fn test_lookup_through_normalization() {
        let mut store = LinkRefStore::new();
        store.insert(
            normalize_label("foo  bar"),
            LinkRefDef {
                destination: "/url".into(),
                title: Some("t".into()),
            },
        );
        assert!(store.lookup(&normalize_label("Foo Bar")).is_some());
        assert!(store.lookup(&normalize_label("foobar")).is_none());
    }
}
