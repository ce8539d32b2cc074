//! Position mapping between a working buffer and original source.
//!
//! Doc comments are usually reassembled from per-line fragments with the
//! leading comment markers stripped, so the buffer handed to the parser is
//! not contiguous in the original file. A sorted list of mapping segments
//! defines a piecewise-linear, monotonic translation between the two
//! coordinate systems. No segments means identity.

use std::cell::Cell;

/// One mapping segment: working-buffer offset `pos` corresponds to
/// original-source offset `source_pos`, and the correspondence continues
/// linearly until the next segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MappingSegment {
    pub pos: u32,
    pub source_pos: u32,
}

impl MappingSegment {
    #[inline]
    pub const fn new(pos: u32, source_pos: u32) -> Self {
        Self { pos, source_pos }
    }
}

/// Translates working-buffer offsets to/from original-source offsets.
///
/// Translation is O(log n) with a fast path that reuses the last-resolved
/// segment index, which is the common case during a single forward scan.
#[derive(Clone, Debug, Default)]
pub struct Mapper {
    segments: Vec<MappingSegment>,
    /// Index of the segment that resolved the previous query.
    hint: Cell<usize>,
}

impl Mapper {
    /// Create a mapper from a sorted segment list.
    ///
    /// # Panics
    /// Panics if the list is non-empty and does not start at `pos = 0`, or
    /// if segments are not strictly increasing in both fields.
    pub fn new(segments: Vec<MappingSegment>) -> Self {
        if let Some(first) = segments.first() {
            assert!(first.pos == 0, "first mapping segment must start at pos 0");
        }
        for pair in segments.windows(2) {
            assert!(
                pair[0].pos < pair[1].pos && pair[0].source_pos < pair[1].source_pos,
                "mapping segments must be strictly increasing in both fields"
            );
        }
        Self {
            segments,
            hint: Cell::new(0),
        }
    }

    /// Identity mapper.
    #[inline]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Whether any segments are present.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a segment while building a mapper incrementally.
    ///
    /// Collapses the push when it would extend the previous segment linearly.
    pub fn push(&mut self, pos: u32, source_pos: u32) {
        if let Some(last) = self.segments.last() {
            debug_assert!(pos >= last.pos && source_pos >= last.source_pos);
            // Same linear offset as the previous segment: redundant.
            if pos.wrapping_sub(last.pos) == source_pos.wrapping_sub(last.source_pos) {
                return;
            }
        } else {
            debug_assert!(pos == 0, "first mapping segment must start at pos 0");
        }
        self.segments.push(MappingSegment::new(pos, source_pos));
    }

    /// Translate a working-buffer offset to an original-source offset.
    pub fn to_source(&self, pos: u32) -> u32 {
        if self.segments.is_empty() {
            return pos;
        }
        let idx = self.locate(pos, |seg| seg.pos);
        let seg = self.segments[idx];
        seg.source_pos + (pos - seg.pos)
    }

    /// Translate an original-source offset back to a working-buffer offset.
    pub fn to_pos(&self, source_pos: u32) -> u32 {
        if self.segments.is_empty() {
            return source_pos;
        }
        let idx = self.locate(source_pos, |seg| seg.source_pos);
        let seg = self.segments[idx];
        debug_assert!(
            source_pos >= seg.source_pos,
            "source offset {source_pos} precedes all mapped ranges"
        );
        seg.pos + (source_pos - seg.source_pos)
    }

    /// Find the segment governing `value` under the given key extractor.
    fn locate(&self, value: u32, key: impl Fn(&MappingSegment) -> u32) -> usize {
        let hint = self.hint.get();
        // Fast path: same segment as last query, or the next one.
        if hint < self.segments.len() && key(&self.segments[hint]) <= value {
            let next_start = self
                .segments
                .get(hint + 1)
                .map(|s| key(s))
                .unwrap_or(u32::MAX);
            if value < next_start {
                return hint;
            }
            if hint + 2 >= self.segments.len()
                || value < key(&self.segments[hint + 2])
            {
                self.hint.set(hint + 1);
                return hint + 1;
            }
        }
        let idx = match self
            .segments
            .binary_search_by(|seg| key(seg).cmp(&value))
        {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        self.hint.set(idx);
        idx
    }
}
