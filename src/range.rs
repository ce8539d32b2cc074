//! Compact span representation for node positions.
//!
//! Uses `u32` offsets to save memory (8 bytes vs 16 for a usize pair).
//! Supports sources up to 4GB. Spans always refer to *original source*
//! coordinates unless a function says otherwise.

/// Half-open byte span `[start, end)` into a source buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
#[repr(C)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

const _: () = assert!(std::mem::size_of::<Span>() == 8);

impl Span {
    /// Create a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create a span from usize offsets.
    ///
    /// # Panics
    /// Panics in debug mode if values exceed `u32::MAX`.
    #[inline]
    pub fn from_usize(start: usize, end: usize) -> Self {
        debug_assert!(start <= u32::MAX as usize);
        debug_assert!(end <= u32::MAX as usize);
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    /// Create an empty span at a position.
    #[inline]
    pub const fn empty_at(pos: u32) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// The text this span refers to.
    ///
    /// # Panics
    /// Panics if the span does not lie on char boundaries of `input`.
    #[inline]
    pub fn slice<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start as usize..self.end as usize]
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if the span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub const fn start_usize(&self) -> usize {
        self.start as usize
    }

    #[inline]
    pub const fn end_usize(&self) -> usize {
        self.end as usize
    }

    /// Check if this span contains a position.
    #[inline]
    pub const fn contains(&self, pos: u32) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Check if `other` lies entirely within this span.
    ///
    /// Used to verify the child-within-parent invariant after parsing.
    #[inline]
    pub const fn encloses(&self, other: Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    pub fn cover(&self, other: Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Extend the end of this span.
    #[inline]
    pub fn extend_to(&mut self, new_end: u32) {
        debug_assert!(new_end >= self.end);
        self.end = new_end;
    }
}

impl From<std::ops::Range<u32>> for Span {
    #[inline]
    fn from(r: std::ops::Range<u32>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl From<std::ops::Range<usize>> for Span {
    #[inline]
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::from_usize(r.start, r.end)
    }
}

impl From<Span> for std::ops::Range<usize> {
    #[inline]
    fn from(r: Span) -> Self {
        r.start_usize()..r.end_usize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_size() {
        assert_eq!(std::mem::size_of::<Span>(), 8);
    }

    #[test]
    fn test_span_new() {
        let s = Span::new(10, 20);
        assert_eq!(s.start, 10);
        assert_eq!(s.end, 20);
        assert_eq!(s.len(), 10);
        assert!(!s.is_empty());
    }

    #[test]
    fn test_span_empty() {
        let s = Span::empty_at(5);
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn test_span_slice() {
        let input = "Hello, World!";
        assert_eq!(Span::new(0, 5).slice(input), "Hello");
        assert_eq!(Span::new(7, 12).slice(input), "World");
    }

    #[test]
    fn test_span_contains() {
        let s = Span::new(10, 20);
        assert!(!s.contains(9));
        assert!(s.contains(10));
        assert!(s.contains(19));
        assert!(!s.contains(20));
    }

    #[test]
    fn test_span_encloses() {
        let outer = Span::new(0, 100);
        assert!(outer.encloses(Span::new(0, 100)));
        assert!(outer.encloses(Span::new(10, 20)));
        assert!(!outer.encloses(Span::new(10, 101)));
    }

    #[test]
    fn test_span_cover() {
        let a = Span::new(10, 20);
        let b = Span::new(15, 40);
        assert_eq!(a.cover(b), Span::new(10, 40));
    }

    #[test]
    fn test_span_extend() {
        let mut s = Span::new(10, 20);
        s.extend_to(30);
        assert_eq!(s.end, 30);
    }
}
