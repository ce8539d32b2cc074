//! Phase 1: block structure.
//!
//! One pass over the input, line by line: first each open block gets a
//! chance to continue, then start rules may open new blocks at the first
//! ancestor where continuation stopped, then the remainder of the line is
//! handed to the deepest open block (or becomes a lazy paragraph
//! continuation). Inline-bearing blocks accumulate their raw content in a
//! working buffer paired with an offset mapper; the inline phase runs over
//! those buffers after the whole block tree is closed.

mod html_block;
mod parser;
mod refs;
mod starts;
mod table;

pub(crate) use html_block::{scan_closing_tag, scan_open_tag};
pub(crate) use parser::BlockParser;

use crate::source_map::Mapper;
use crate::tree::NodeId;
use html_block::HtmlBlockKind;

/// Outcome of a block's per-line continuation check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Continue {
    /// The block's marker (if any) matched; deeper blocks get their turn.
    Matched,
    /// The marker did not match; the block is a candidate for closing.
    Unmatched,
    /// The line closes the block itself (a closing code fence).
    Finished,
}

/// Outcome of a successful block start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Started {
    /// A container opened; further starts may nest inside it on this line.
    Container,
    /// A leaf that accepts lines opened; the line remainder is its content.
    Leaf,
    /// A leaf opened and consumed the whole line.
    ConsumedLine,
}

/// Parse-time data for one open block.
///
/// Everything the continuation machine needs that does not belong in the
/// tree: fence geometry, list-item content columns, HTML block kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OpenData {
    Document,
    BlockQuote,
    List,
    ListItem {
        /// Absolute column where item content begins.
        content_col: u32,
    },
    BlockTag,
    Paragraph,
    FencedCode {
        marker: char,
        len: u32,
        /// Indentation of the opening fence, removed from each line.
        indent: u32,
    },
    IndentedCode,
    HtmlBlock {
        kind: HtmlBlockKind,
    },
    Table {
        columns: usize,
    },
}

/// One entry of the open-block chain.
pub(crate) struct OpenBlock {
    pub(crate) node: NodeId,
    pub(crate) data: OpenData,
    /// Accumulated raw content for leaf blocks, one `\n` per line.
    pub(crate) content: String,
    /// Content offset to working-buffer offset mapping.
    pub(crate) map: Mapper,
    /// Working-buffer offset of the end of the block's last line.
    pub(crate) end_pos: u32,
    /// Line number the block was opened on, for empty-item bookkeeping.
    pub(crate) opened_line: u32,
    /// Decoded info string of a fenced code block.
    pub(crate) info: Option<String>,
    /// Bytes of leading reference definitions already stripped (and
    /// registered) from a paragraph's content buffer.
    pub(crate) stripped: Option<u32>,
}

impl OpenBlock {
    pub(crate) fn new(node: NodeId, data: OpenData, start: u32, line: u32) -> Self {
        Self {
            node,
            data,
            content: String::new(),
            map: Mapper::default(),
            end_pos: start,
            opened_line: line,
            info: None,
            stripped: None,
        }
    }
}

/// A deferred inline-parsing job produced by closing an inline-bearing
/// block: the raw content buffer plus the mapping back to the working
/// buffer. `base` offsets content positions when a prefix of the buffer
/// (reference definitions) was stripped after the mapping was built.
pub(crate) struct InlineTask {
    pub(crate) node: NodeId,
    pub(crate) content: String,
    pub(crate) map: Mapper,
    pub(crate) base: u32,
}

impl InlineTask {
    /// Working-buffer offset of a content offset.
    #[inline]
    pub(crate) fn to_working(&self, content_pos: u32) -> u32 {
        self.map.to_source(content_pos + self.base)
    }
}
