//! Mutation notifications.
//!
//! Every structural or attribute mutation produces one [`GraphEvent`]. Events
//! are dispatched synchronously, after the graph reached its new state and
//! before the mutating call returns. Listeners only get a shared `&Graph`, so
//! they cannot mutate from inside a callback.

use super::store::Graph;
use super::types::{AttributeValue, VertexAttrs};
use crate::handle::{EdgeHandle, VertexHandle};
use crate::idmap::PersistentId;

/// A single graph mutation, carrying the delta listeners need.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// A vertex was added.
    VertexAdded {
        /// Handle of the new vertex.
        vertex: VertexHandle,
        /// Its persistent id.
        id: PersistentId,
    },
    /// A vertex was removed. The handle is already stale.
    VertexRemoved {
        /// Former handle.
        vertex: VertexHandle,
        /// Persistent id it carried.
        id: PersistentId,
        /// Its attributes at removal time.
        attrs: VertexAttrs,
    },
    /// An edge was added.
    EdgeAdded {
        /// Handle of the new edge.
        edge: EdgeHandle,
        /// Its persistent id.
        id: PersistentId,
        /// Source vertex.
        source: VertexHandle,
        /// Target vertex.
        target: VertexHandle,
    },
    /// An edge was removed. The edge handle is already stale; endpoints are live.
    EdgeRemoved {
        /// Former handle.
        edge: EdgeHandle,
        /// Persistent id it carried.
        id: PersistentId,
        /// Source vertex.
        source: VertexHandle,
        /// Target vertex.
        target: VertexHandle,
        /// Persistent id of the source.
        source_id: PersistentId,
        /// Persistent id of the target.
        target_id: PersistentId,
    },
    /// A vertex attribute changed.
    VertexAttributeChanged {
        /// The vertex.
        vertex: VertexHandle,
        /// Its persistent id.
        id: PersistentId,
        /// Value before the change.
        old: AttributeValue,
        /// Value after the change.
        new: AttributeValue,
    },
}

/// Receives graph mutation events.
pub trait GraphListener {
    /// Called once per mutation, with the graph already in its new state.
    fn on_event(&mut self, graph: &Graph, event: &GraphEvent);
}

impl GraphListener for () {
    fn on_event(&mut self, _graph: &Graph, _event: &GraphEvent) {}
}

impl<L: GraphListener + ?Sized> GraphListener for &mut L {
    fn on_event(&mut self, graph: &Graph, event: &GraphEvent) {
        (**self).on_event(graph, event);
    }
}

impl<L: GraphListener + ?Sized> GraphListener for Box<L> {
    fn on_event(&mut self, graph: &Graph, event: &GraphEvent) {
        (**self).on_event(graph, event);
    }
}

impl<A: GraphListener, B: GraphListener> GraphListener for (A, B) {
    fn on_event(&mut self, graph: &Graph, event: &GraphEvent) {
        self.0.on_event(graph, event);
        self.1.on_event(graph, event);
    }
}

/// Adapts a closure into a [`GraphListener`].
pub struct FnListener<F>(pub F);

impl<F: FnMut(&Graph, &GraphEvent)> GraphListener for FnListener<F> {
    fn on_event(&mut self, graph: &Graph, event: &GraphEvent) {
        (self.0)(graph, event);
    }
}

/// Identifies a registered listener for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type BoxedListener = Box<dyn GraphListener + Send + Sync>;

/// Externally registered listeners, in registration order.
#[derive(Default)]
pub(crate) struct ListenerSet {
    next_id: u64,
    entries: Vec<(ListenerId, BoxedListener)>,
}

impl ListenerSet {
    pub(crate) fn add(&mut self, listener: BoxedListener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        before != self.entries.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<(ListenerId, BoxedListener)> {
        std::mem::take(&mut self.entries)
    }

    pub(crate) fn restore(&mut self, entries: Vec<(ListenerId, BoxedListener)>) {
        debug_assert!(self.entries.is_empty());
        self.entries = entries;
    }
}
