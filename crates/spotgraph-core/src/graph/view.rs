//! Borrowed, read-only views over vertex and edge records.
//!
//! A view is obtained from a validated handle and borrows the graph, so the
//! record it reads cannot be freed or reused while the view is alive.

use super::store::Graph;
use super::types::VertexAttrs;
use crate::error::Result;
use crate::handle::{EdgeHandle, VertexHandle};
use crate::idmap::PersistentId;
use crate::pool::layout::{self, edge, vertex};
use crate::pool::{RecordPool, SlotIndex, NO_SLOT};

/// Read-only view of one vertex.
#[derive(Clone, Copy)]
pub struct VertexView<'g> {
    graph: &'g Graph,
    handle: VertexHandle,
    id: PersistentId,
    record: &'g [u8],
}

impl<'g> VertexView<'g> {
    pub(crate) fn new(
        graph: &'g Graph,
        handle: VertexHandle,
        id: PersistentId,
        record: &'g [u8],
    ) -> Self {
        Self {
            graph,
            handle,
            id,
            record,
        }
    }

    /// Handle of this vertex.
    #[must_use]
    pub fn handle(&self) -> VertexHandle {
        self.handle
    }

    /// Persistent id of this vertex.
    #[must_use]
    pub fn id(&self) -> PersistentId {
        self.id
    }

    /// X coordinate.
    #[must_use]
    pub fn x(&self) -> f64 {
        layout::read_f64(self.record, vertex::X)
    }

    /// Y coordinate.
    #[must_use]
    pub fn y(&self) -> f64 {
        layout::read_f64(self.record, vertex::Y)
    }

    /// Z coordinate.
    #[must_use]
    pub fn z(&self) -> f64 {
        layout::read_f64(self.record, vertex::Z)
    }

    /// Position as `[x, y, z]`.
    #[must_use]
    pub fn position(&self) -> [f64; 3] {
        [self.x(), self.y(), self.z()]
    }

    /// Time-point index.
    #[must_use]
    pub fn time(&self) -> i32 {
        layout::read_i32(self.record, vertex::TIME)
    }

    /// Radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        layout::read_f64(self.record, vertex::RADIUS)
    }

    /// All attributes at once.
    #[must_use]
    pub fn attrs(&self) -> VertexAttrs {
        VertexAttrs::new(self.time(), self.position(), self.radius())
    }

    /// Outgoing edges, most recently added first.
    #[must_use]
    pub fn outgoing(&self) -> Adjacency<'g> {
        Adjacency::new(
            self.graph.edge_pool(),
            layout::read_u32(self.record, vertex::FIRST_OUT),
            Direction::Outgoing,
        )
    }

    /// Incoming edges, most recently added first.
    #[must_use]
    pub fn incoming(&self) -> Adjacency<'g> {
        Adjacency::new(
            self.graph.edge_pool(),
            layout::read_u32(self.record, vertex::FIRST_IN),
            Direction::Incoming,
        )
    }

    /// Incoming then outgoing edges.
    pub fn edges(&self) -> impl Iterator<Item = EdgeHandle> + 'g {
        self.incoming().chain(self.outgoing())
    }

    /// Views of the incident edges.
    pub fn edge_views(&self) -> impl Iterator<Item = EdgeView<'g>> + 'g {
        let graph = self.graph;
        self.edges().filter_map(move |e| graph.edge(e).ok())
    }

    /// Vertices at the other end of each incident edge.
    ///
    /// A vertex joined by parallel edges is yielded once per edge.
    pub fn neighbors(&self) -> impl Iterator<Item = VertexView<'g>> + 'g {
        let graph = self.graph;
        let handle = self.handle;
        self.edge_views().filter_map(move |e| {
            let other = if e.source() == handle {
                e.target()
            } else {
                e.source()
            };
            graph.vertex(other).ok()
        })
    }

    /// Number of incident edges.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.incoming().count() + self.outgoing().count()
    }

    /// Returns true if the vertex has at least one incident edge.
    #[must_use]
    pub fn has_edges(&self) -> bool {
        layout::read_u32(self.record, vertex::FIRST_IN) != NO_SLOT
            || layout::read_u32(self.record, vertex::FIRST_OUT) != NO_SLOT
    }
}

impl std::fmt::Debug for VertexView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexView")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("attrs", &self.attrs())
            .finish()
    }
}

/// Read-only view of one edge.
#[derive(Clone, Copy)]
pub struct EdgeView<'g> {
    graph: &'g Graph,
    handle: EdgeHandle,
    id: PersistentId,
    source: VertexHandle,
    target: VertexHandle,
}

impl<'g> EdgeView<'g> {
    pub(crate) fn new(
        graph: &'g Graph,
        handle: EdgeHandle,
        id: PersistentId,
        source: VertexHandle,
        target: VertexHandle,
    ) -> Self {
        Self {
            graph,
            handle,
            id,
            source,
            target,
        }
    }

    /// Handle of this edge.
    #[must_use]
    pub fn handle(&self) -> EdgeHandle {
        self.handle
    }

    /// Persistent id of this edge.
    #[must_use]
    pub fn id(&self) -> PersistentId {
        self.id
    }

    /// Source vertex handle.
    #[must_use]
    pub fn source(&self) -> VertexHandle {
        self.source
    }

    /// Target vertex handle.
    #[must_use]
    pub fn target(&self) -> VertexHandle {
        self.target
    }

    /// View of the source vertex.
    pub fn source_view(&self) -> Result<VertexView<'g>> {
        self.graph.vertex(self.source)
    }

    /// View of the target vertex.
    pub fn target_view(&self) -> Result<VertexView<'g>> {
        self.graph.vertex(self.target)
    }
}

impl std::fmt::Debug for EdgeView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeView")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Outgoing,
    Incoming,
}

/// Iterator over one index-linked adjacency list.
///
/// Order is most-recently-spliced first; it carries no other meaning.
pub struct Adjacency<'g> {
    edges: &'g RecordPool,
    next: Option<SlotIndex>,
    direction: Direction,
}

impl<'g> Adjacency<'g> {
    fn new(edges: &'g RecordPool, head: u32, direction: Direction) -> Self {
        Self {
            edges,
            next: SlotIndex::from_link(head),
            direction,
        }
    }
}

impl Iterator for Adjacency<'_> {
    type Item = EdgeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.next?;
        let record = self.edges.record(slot).ok()?;
        let link = match self.direction {
            Direction::Outgoing => edge::NEXT_OUT,
            Direction::Incoming => edge::NEXT_IN,
        };
        self.next = SlotIndex::from_link(layout::read_u32(record, link));
        let generation = self.edges.generation(slot)?;
        Some(EdgeHandle::new(slot, generation))
    }
}
