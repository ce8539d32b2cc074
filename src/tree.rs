//! Mutable syntax tree stored in an arena.
//!
//! Nodes are addressed by stable `NodeId` handles; each node stores parent
//! and sibling handles instead of owning references, so structural edits are
//! O(1) and the parent/child/sibling graph carries no ownership cycles.
//! Every mutation bumps a document-wide generation counter, which reference
//! links use to invalidate their cached resolutions after post-parse edits.

use std::cell::Cell;

use crate::diag::Diagnostics;
use crate::link_ref::{LinkRefDef, LinkRefStore};
use crate::range::Span;

/// Stable handle to a node in the document arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// List marker classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListMarker {
    /// `-`, `+` or `*` bullet.
    Bullet(char),
    /// Ordered marker with its start number and `.` or `)` delimiter.
    Ordered { start: u32, delim: char },
}

/// List-level data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListData {
    pub marker: ListMarker,
    pub tight: bool,
}

/// Table column alignment from the delimiter row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

/// Link/image payload.
///
/// Inline-form links carry a destination; reference-form links carry the
/// normalized label and resolve lazily against the document's reference
/// map, caching the result tagged with the generation that produced it.
#[derive(Clone, Debug, Default)]
pub struct LinkData {
    pub destination: Option<String>,
    pub title: Option<String>,
    /// Normalized reference label, for reference-form links.
    pub label: Option<String>,
    /// Cached `(generation, store index)` resolution.
    resolved: Cell<Option<(u64, Option<u32>)>>,
}

impl PartialEq for LinkData {
    fn eq(&self, other: &Self) -> bool {
        self.destination == other.destination
            && self.title == other.title
            && self.label == other.label
    }
}

impl LinkData {
    pub fn inline(destination: String, title: Option<String>) -> Self {
        Self {
            destination: Some(destination),
            title,
            label: None,
            resolved: Cell::new(None),
        }
    }

    pub fn reference(label: String) -> Self {
        Self {
            destination: None,
            title: None,
            label: Some(label),
            resolved: Cell::new(None),
        }
    }
}

/// Closed set of node kinds.
///
/// Capabilities ("can contain blocks", "holds inline content") are free
/// functions over the kind rather than mixin types.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading {
        level: u8,
    },
    ThematicBreak,
    BlockQuote,
    CodeBlock {
        fenced: bool,
        info: Option<String>,
        literal: String,
    },
    HtmlBlock {
        literal: String,
    },
    List(ListData),
    ListItem {
        /// `Some(checked)` for task-list items.
        task: Option<bool>,
    },
    Table {
        alignments: Vec<Alignment>,
    },
    TableRow {
        header: bool,
    },
    TableCell,
    /// Block documentation tag such as `@param` or `@deprecated`.
    BlockTag {
        name: String,
    },

    // Inline kinds, produced only during phase 2.
    Run {
        text: String,
    },
    Code {
        literal: String,
    },
    Em,
    Strong,
    Strikethrough,
    Link(LinkData),
    Image(LinkData),
    Autolink {
        uri: String,
        email: bool,
    },
    HtmlInline {
        literal: String,
    },
    SoftBreak,
    HardBreak,
    /// Inline documentation tag such as `{@link Target text}`.
    InlineTag {
        name: String,
        content: String,
    },
}

impl NodeKind {
    /// Can this block contain other blocks?
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Document
                | NodeKind::BlockQuote
                | NodeKind::List(_)
                | NodeKind::ListItem { .. }
                | NodeKind::BlockTag { .. }
                | NodeKind::Table { .. }
                | NodeKind::TableRow { .. }
        )
    }

    /// Does this block hold raw text parsed by the inline phase?
    pub fn has_inline_content(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph | NodeKind::Heading { .. } | NodeKind::TableCell
        )
    }

    /// Is this an inline (phase 2) node?
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Run { .. }
                | NodeKind::Code { .. }
                | NodeKind::Em
                | NodeKind::Strong
                | NodeKind::Strikethrough
                | NodeKind::Link(_)
                | NodeKind::Image(_)
                | NodeKind::Autolink { .. }
                | NodeKind::HtmlInline { .. }
                | NodeKind::SoftBreak
                | NodeKind::HardBreak
                | NodeKind::InlineTag { .. }
        )
    }
}

/// One node in the arena.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    parent: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
}

/// A parsed document: node arena, link-reference map and diagnostics log.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    generation: u64,
    pub(crate) link_refs: LinkRefStore,
    pub(crate) diagnostics: Diagnostics,
}

impl Document {
    pub(crate) fn empty() -> Self {
        let root = Node {
            kind: NodeKind::Document,
            span: Span::default(),
            parent: None,
            prev: None,
            next: None,
            first_child: None,
            last_child: None,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            generation: 0,
            link_refs: LinkRefStore::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Mutable node access. Counts as a mutation.
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.generation += 1;
        &mut self.nodes[id.index()]
    }

    /// Monotonically increasing mutation counter.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    #[inline]
    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[inline]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next
    }

    #[inline]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev
    }

    #[inline]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    #[inline]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Allocate a detached node.
    pub fn new_node(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.generation += 1;
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
            prev: None,
            next: None,
            first_child: None,
            last_child: None,
        });
        id
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child.index()].parent.is_none());
        self.generation += 1;
        let prev = self.nodes[parent.index()].last_child;
        {
            let node = &mut self.nodes[child.index()];
            node.parent = Some(parent);
            node.prev = prev;
            node.next = None;
        }
        match prev {
            Some(prev) => self.nodes[prev.index()].next = Some(child),
            None => self.nodes[parent.index()].first_child = Some(child),
        }
        self.nodes[parent.index()].last_child = Some(child);
    }

    /// Insert a detached node immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, new: NodeId) {
        debug_assert!(self.nodes[new.index()].parent.is_none());
        self.generation += 1;
        let parent = self.nodes[sibling.index()]
            .parent
            .expect("cannot insert before the root");
        let prev = self.nodes[sibling.index()].prev;
        {
            let node = &mut self.nodes[new.index()];
            node.parent = Some(parent);
            node.prev = prev;
            node.next = Some(sibling);
        }
        self.nodes[sibling.index()].prev = Some(new);
        match prev {
            Some(prev) => self.nodes[prev.index()].next = Some(new),
            None => self.nodes[parent.index()].first_child = Some(new),
        }
    }

    /// Unlink a node (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        self.generation += 1;
        let (parent, prev, next) = {
            let node = &mut self.nodes[id.index()];
            let links = (node.parent, node.prev, node.next);
            node.parent = None;
            node.prev = None;
            node.next = None;
            links
        };
        match prev {
            Some(prev) => self.nodes[prev.index()].next = next,
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.index()].first_child = next;
                }
            }
        }
        match next {
            Some(next) => self.nodes[next.index()].prev = prev,
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.index()].last_child = prev;
                }
            }
        }
    }

    /// The link-reference map built during phase 1.
    #[inline]
    pub fn link_refs(&self) -> &LinkRefStore {
        &self.link_refs
    }

    /// The append-only diagnostics log.
    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Resolve a reference-form link or image against the reference map.
    ///
    /// The resolution is cached on the node, tagged with the generation that
    /// produced it; any document mutation invalidates the cache.
    pub fn resolve_reference(&self, id: NodeId) -> Option<&LinkRefDef> {
        let (NodeKind::Link(data) | NodeKind::Image(data)) = &self.node(id).kind else {
            return None;
        };
        if data.destination.is_some() {
            return None;
        }
        let label = data.label.as_deref()?;
        if let Some((generation, index)) = data.resolved.get() {
            if generation == self.generation {
                return index.and_then(|i| self.link_refs.get(i as usize));
            }
        }
        let index = self.link_refs.get_index(label);
        data.resolved
            .set(Some((self.generation, index.map(|i| i as u32))));
        index.and_then(|i| self.link_refs.get(i))
    }
}

/// Iterator over the children of a node.
pub struct ChildIter<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.doc.node(id).next;
        Some(id)
    }
}
