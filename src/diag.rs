//! Diagnostics sink.
//!
//! Semantic and style findings (a tag without its required text, a
//! duplicated reference definition...) are reported here and never abort
//! parsing. The log is append-only; nothing in the parser reads it back.

use crate::range::Span;

/// Stable identifier for a diagnostic message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticId {
    /// `@deprecated` block tag with no explanation following it.
    DeprecatedWithoutReason,
    /// Inline tag opened with `{@` but never closed with `}`.
    UnterminatedInlineTag,
    /// A `[label]: ...` definition repeats an already-defined label.
    DuplicateLinkRef,
    /// Tag name is malformed, e.g. longer than the supported maximum.
    MalformedTagName,
}

impl DiagnosticId {
    /// Stable string form, for tooling output.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticId::DeprecatedWithoutReason => "deprecated-without-reason",
            DiagnosticId::UnterminatedInlineTag => "unterminated-inline-tag",
            DiagnosticId::DuplicateLinkRef => "duplicate-link-ref",
            DiagnosticId::MalformedTagName => "malformed-tag-name",
        }
    }
}

/// One reported finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub id: DiagnosticId,
    pub message: String,
    /// Source-coordinate span the finding refers to.
    pub span: Span,
}

/// Append-only diagnostics log.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, id: DiagnosticId, message: impl Into<String>, span: Span) {
        self.entries.push(Diagnostic {
            id,
            message: message.into(),
            span,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Mutable access for the final span-coordinate rewrite.
    pub(crate) fn entries_mut(&mut self) -> &mut [Diagnostic] {
        &mut self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_appends() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());
        diags.report(
            DiagnosticId::DeprecatedWithoutReason,
            "@deprecated tag has no explanation",
            Span::new(3, 14),
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.entries()[0].id, DiagnosticId::DeprecatedWithoutReason);
        assert_eq!(diags.entries()[0].span, Span::new(3, 14));
    }

    #[test]
    fn test_id_strings_are_stable() {
        assert_eq!(
            DiagnosticId::UnterminatedInlineTag.as_str(),
            "unterminated-inline-tag"
        );
    }
}
