//! Pool-backed spatio-temporal graph.
//!
//! Vertices and edges live in two [`RecordPool`]s. Adjacency is stored inline
//! in the records as doubly index-linked lists, so splicing an edge in or out
//! is O(1) and needs no side allocation.
//!
//! Every mutator validates its inputs before touching the pools, the id bimap
//! or the time buckets. Listeners are notified after the new state is in
//! place: first the observer passed by the caller (the model's journal and
//! feature tracker), then the externally registered listeners in
//! registration order.

use std::collections::BTreeMap;

use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

use super::listener::{GraphEvent, GraphListener, ListenerId, ListenerSet};
use super::types::{AttributeValue, VertexAttrs, VertexField};
use super::view::{Adjacency, EdgeView, VertexView};
use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::handle::{EdgeHandle, ElementKind, VertexHandle};
use crate::idmap::{GraphIdBimap, PersistentId};
use crate::pool::layout::{self, edge, vertex};
use crate::pool::{RecordPool, SlotIndex, NO_SLOT};

type TimeBucket = IndexSet<SlotIndex, FxBuildHasher>;

/// Mutable graph of spots (vertices) and links (edges) over time points.
pub struct Graph {
    vertices: RecordPool,
    edges: RecordPool,
    ids: GraphIdBimap,
    /// Time index -> vertices at that time point.
    time_buckets: BTreeMap<i32, TimeBucket>,
    listeners: ListenerSet,
}

impl Graph {
    /// Creates an empty graph with default pool chunk sizes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&PoolConfig::default())
    }

    /// Creates an empty graph with the given pool chunk sizes.
    #[must_use]
    pub fn with_config(config: &PoolConfig) -> Self {
        Self {
            vertices: RecordPool::new(ElementKind::Vertex, vertex::SIZE, config.vertex_chunk),
            edges: RecordPool::new(ElementKind::Edge, edge::SIZE, config.edge_chunk),
            ids: GraphIdBimap::new(),
            time_buckets: BTreeMap::new(),
            listeners: ListenerSet::default(),
        }
    }

    // ── Mutation ───────────────────────────────────────────────────────

    /// Adds a vertex and assigns it the next persistent id.
    pub fn add_vertex(&mut self, attrs: VertexAttrs) -> Result<VertexHandle> {
        self.add_vertex_observed(attrs, &mut ())
    }

    /// Removes a vertex, returning its attributes.
    ///
    /// # Errors
    ///
    /// Returns `Error::IllegalGraphState` if the vertex still has incident edges.
    pub fn remove_vertex(&mut self, v: VertexHandle) -> Result<VertexAttrs> {
        self.remove_vertex_observed(v, &mut ())
    }

    /// Adds an edge from `source` to `target`.
    ///
    /// # Errors
    ///
    /// Returns `Error::SelfLoop` if both endpoints are the same vertex.
    pub fn add_edge(&mut self, source: VertexHandle, target: VertexHandle) -> Result<EdgeHandle> {
        self.add_edge_observed(source, target, &mut ())
    }

    /// Removes an edge.
    pub fn remove_edge(&mut self, e: EdgeHandle) -> Result<()> {
        self.remove_edge_observed(e, &mut ())
    }

    /// Moves a vertex to a new position.
    pub fn set_position(&mut self, v: VertexHandle, position: [f64; 3]) -> Result<()> {
        self.set_attribute(v, AttributeValue::Position(position), &mut ())
            .map(|_| ())
    }

    /// Changes a vertex radius.
    pub fn set_radius(&mut self, v: VertexHandle, radius: f64) -> Result<()> {
        self.set_attribute(v, AttributeValue::Radius(radius), &mut ())
            .map(|_| ())
    }

    pub(crate) fn add_vertex_observed(
        &mut self,
        attrs: VertexAttrs,
        observer: &mut impl GraphListener,
    ) -> Result<VertexHandle> {
        self.insert_vertex(None, attrs, observer)
    }

    /// Re-creates a vertex under a known id (undo replay, project load).
    pub(crate) fn add_vertex_with_id(
        &mut self,
        id: PersistentId,
        attrs: VertexAttrs,
        observer: &mut impl GraphListener,
    ) -> Result<VertexHandle> {
        self.insert_vertex(Some(id), attrs, observer)
    }

    fn insert_vertex(
        &mut self,
        id: Option<PersistentId>,
        attrs: VertexAttrs,
        observer: &mut impl GraphListener,
    ) -> Result<VertexHandle> {
        if let Some(id) = id {
            if self.ids.vertices().contains(id) {
                return Err(Error::IdCollision {
                    kind: ElementKind::Vertex,
                    id,
                });
            }
        }

        let (slot, generation) = self.vertices.allocate()?;
        let bound = match id {
            Some(id) => self.ids.vertices_mut().bind(slot, id).map(|()| id),
            None => self.ids.vertices_mut().assign(slot),
        };
        let id = match bound {
            Ok(id) => id,
            Err(err) => {
                self.vertices.free(slot)?;
                return Err(err);
            }
        };

        let record = self.vertices.record_mut(slot)?;
        layout::write_u32(record, vertex::FIRST_IN, NO_SLOT);
        layout::write_u32(record, vertex::FIRST_OUT, NO_SLOT);
        for (offset, value) in vertex::POSITION.iter().zip(attrs.position) {
            layout::write_f64(record, *offset, value);
        }
        layout::write_i32(record, vertex::TIME, attrs.time);
        layout::write_f64(record, vertex::RADIUS, attrs.radius);
        self.time_buckets.entry(attrs.time).or_default().insert(slot);

        let vertex = VertexHandle::new(slot, generation);
        self.notify(observer, &GraphEvent::VertexAdded { vertex, id });
        Ok(vertex)
    }

    pub(crate) fn remove_vertex_observed(
        &mut self,
        v: VertexHandle,
        observer: &mut impl GraphListener,
    ) -> Result<VertexAttrs> {
        let view = self.vertex(v)?;
        if view.has_edges() {
            return Err(Error::IllegalGraphState(format!(
                "vertex {} still has {} incident edges",
                view.id(),
                view.degree()
            )));
        }
        let attrs = view.attrs();

        let id = self.ids.vertices_mut().release(v.slot())?;
        self.vertices.free(v.slot())?;
        if let Some(bucket) = self.time_buckets.get_mut(&attrs.time) {
            bucket.swap_remove(&v.slot());
            if bucket.is_empty() {
                self.time_buckets.remove(&attrs.time);
            }
        }

        self.notify(
            observer,
            &GraphEvent::VertexRemoved {
                vertex: v,
                id,
                attrs,
            },
        );
        Ok(attrs)
    }

    pub(crate) fn add_edge_observed(
        &mut self,
        source: VertexHandle,
        target: VertexHandle,
        observer: &mut impl GraphListener,
    ) -> Result<EdgeHandle> {
        self.insert_edge(None, source, target, observer)
    }

    /// Re-creates an edge under a known id (undo replay, project load).
    pub(crate) fn add_edge_with_id(
        &mut self,
        id: PersistentId,
        source: VertexHandle,
        target: VertexHandle,
        observer: &mut impl GraphListener,
    ) -> Result<EdgeHandle> {
        self.insert_edge(Some(id), source, target, observer)
    }

    fn insert_edge(
        &mut self,
        id: Option<PersistentId>,
        source: VertexHandle,
        target: VertexHandle,
        observer: &mut impl GraphListener,
    ) -> Result<EdgeHandle> {
        self.check_vertex(source)?;
        self.check_vertex(target)?;
        if source.slot() == target.slot() {
            return Err(Error::SelfLoop(self.vertex_id_at(source.slot())?));
        }
        if let Some(id) = id {
            if self.ids.edges().contains(id) {
                return Err(Error::IdCollision {
                    kind: ElementKind::Edge,
                    id,
                });
            }
        }

        let (slot, generation) = self.edges.allocate()?;
        let bound = match id {
            Some(id) => self.ids.edges_mut().bind(slot, id).map(|()| id),
            None => self.ids.edges_mut().assign(slot),
        };
        let id = match bound {
            Ok(id) => id,
            Err(err) => {
                self.edges.free(slot)?;
                return Err(err);
            }
        };

        let raw = slot.as_u32();
        let out_head = layout::read_u32(self.vertices.record(source.slot())?, vertex::FIRST_OUT);
        let in_head = layout::read_u32(self.vertices.record(target.slot())?, vertex::FIRST_IN);

        let record = self.edges.record_mut(slot)?;
        layout::write_u32(record, edge::SOURCE, source.slot().as_u32());
        layout::write_u32(record, edge::TARGET, target.slot().as_u32());
        layout::write_u32(record, edge::NEXT_OUT, out_head);
        layout::write_u32(record, edge::PREV_OUT, NO_SLOT);
        layout::write_u32(record, edge::NEXT_IN, in_head);
        layout::write_u32(record, edge::PREV_IN, NO_SLOT);

        if let Some(head) = SlotIndex::from_link(out_head) {
            layout::write_u32(self.edges.record_mut(head)?, edge::PREV_OUT, raw);
        }
        if let Some(head) = SlotIndex::from_link(in_head) {
            layout::write_u32(self.edges.record_mut(head)?, edge::PREV_IN, raw);
        }
        layout::write_u32(self.vertices.record_mut(source.slot())?, vertex::FIRST_OUT, raw);
        layout::write_u32(self.vertices.record_mut(target.slot())?, vertex::FIRST_IN, raw);

        let edge = EdgeHandle::new(slot, generation);
        self.notify(
            observer,
            &GraphEvent::EdgeAdded {
                edge,
                id,
                source,
                target,
            },
        );
        Ok(edge)
    }

    pub(crate) fn remove_edge_observed(
        &mut self,
        e: EdgeHandle,
        observer: &mut impl GraphListener,
    ) -> Result<()> {
        self.check_edge(e)?;
        let record = self.edges.record(e.slot())?;
        let source_slot = SlotIndex::new(layout::read_u32(record, edge::SOURCE));
        let target_slot = SlotIndex::new(layout::read_u32(record, edge::TARGET));
        let next_out = layout::read_u32(record, edge::NEXT_OUT);
        let prev_out = layout::read_u32(record, edge::PREV_OUT);
        let next_in = layout::read_u32(record, edge::NEXT_IN);
        let prev_in = layout::read_u32(record, edge::PREV_IN);

        let source = self.vertex_handle_at(source_slot)?;
        let target = self.vertex_handle_at(target_slot)?;
        let source_id = self.vertex_id_at(source_slot)?;
        let target_id = self.vertex_id_at(target_slot)?;

        match SlotIndex::from_link(prev_out) {
            Some(prev) => layout::write_u32(self.edges.record_mut(prev)?, edge::NEXT_OUT, next_out),
            None => layout::write_u32(
                self.vertices.record_mut(source_slot)?,
                vertex::FIRST_OUT,
                next_out,
            ),
        }
        if let Some(next) = SlotIndex::from_link(next_out) {
            layout::write_u32(self.edges.record_mut(next)?, edge::PREV_OUT, prev_out);
        }
        match SlotIndex::from_link(prev_in) {
            Some(prev) => layout::write_u32(self.edges.record_mut(prev)?, edge::NEXT_IN, next_in),
            None => layout::write_u32(
                self.vertices.record_mut(target_slot)?,
                vertex::FIRST_IN,
                next_in,
            ),
        }
        if let Some(next) = SlotIndex::from_link(next_in) {
            layout::write_u32(self.edges.record_mut(next)?, edge::PREV_IN, prev_in);
        }

        let id = self.ids.edges_mut().release(e.slot())?;
        self.edges.free(e.slot())?;

        self.notify(
            observer,
            &GraphEvent::EdgeRemoved {
                edge: e,
                id,
                source,
                target,
                source_id,
                target_id,
            },
        );
        Ok(())
    }

    /// Writes one attribute, returning the previous value.
    pub(crate) fn set_attribute(
        &mut self,
        v: VertexHandle,
        value: AttributeValue,
        observer: &mut impl GraphListener,
    ) -> Result<AttributeValue> {
        let view = self.vertex(v)?;
        let id = view.id();
        let old = AttributeValue::of(value.field(), &view.attrs());

        let record = self.vertices.record_mut(v.slot())?;
        match value {
            AttributeValue::Position(position) => {
                for (offset, coordinate) in vertex::POSITION.iter().zip(position) {
                    layout::write_f64(record, *offset, coordinate);
                }
            }
            AttributeValue::Radius(radius) => layout::write_f64(record, vertex::RADIUS, radius),
        }

        self.notify(
            observer,
            &GraphEvent::VertexAttributeChanged {
                vertex: v,
                id,
                old,
                new: value,
            },
        );
        Ok(old)
    }

    fn notify(&mut self, observer: &mut impl GraphListener, event: &GraphEvent) {
        observer.on_event(self, event);
        if self.listeners.is_empty() {
            return;
        }
        let mut entries = self.listeners.take();
        for (_, listener) in &mut entries {
            listener.on_event(self, event);
        }
        self.listeners.restore(entries);
    }

    // ── Listeners ──────────────────────────────────────────────────────

    /// Registers a listener notified after every mutation.
    pub fn add_listener(&mut self, listener: Box<dyn GraphListener + Send + Sync>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let removed = self.listeners.remove(id);
        if !removed {
            tracing::warn!(?id, "listener was not registered");
        }
        removed
    }

    /// Number of registered external listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ── Reads ──────────────────────────────────────────────────────────

    /// View of a live vertex.
    pub fn vertex(&self, v: VertexHandle) -> Result<VertexView<'_>> {
        self.check_vertex(v)?;
        let id = self.vertex_id_at(v.slot())?;
        Ok(VertexView::new(self, v, id, self.vertices.record(v.slot())?))
    }

    /// View of a live edge.
    pub fn edge(&self, e: EdgeHandle) -> Result<EdgeView<'_>> {
        self.check_edge(e)?;
        let id = self.edge_id_at(e.slot())?;
        let record = self.edges.record(e.slot())?;
        let source = self.vertex_handle_at(SlotIndex::new(layout::read_u32(record, edge::SOURCE)))?;
        let target = self.vertex_handle_at(SlotIndex::new(layout::read_u32(record, edge::TARGET)))?;
        Ok(EdgeView::new(self, e, id, source, target))
    }

    /// Persistent id of a live vertex.
    pub fn vertex_id(&self, v: VertexHandle) -> Result<PersistentId> {
        self.check_vertex(v)?;
        self.vertex_id_at(v.slot())
    }

    /// Persistent id of a live edge.
    pub fn edge_id(&self, e: EdgeHandle) -> Result<PersistentId> {
        self.check_edge(e)?;
        self.edge_id_at(e.slot())
    }

    /// Handle of the vertex carrying `id`, if it is live.
    #[must_use]
    pub fn vertex_by_id(&self, id: PersistentId) -> Option<VertexHandle> {
        let slot = self.ids.vertices().slot_of(id)?;
        self.vertex_handle_at(slot).ok()
    }

    /// Handle of the edge carrying `id`, if it is live.
    #[must_use]
    pub fn edge_by_id(&self, id: PersistentId) -> Option<EdgeHandle> {
        let slot = self.ids.edges().slot_of(id)?;
        let generation = self.edges.generation(slot)?;
        self.edges
            .is_allocated(slot)
            .then_some(EdgeHandle::new(slot, generation))
    }

    /// Number of live vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.allocated_count()
    }

    /// Number of live edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.allocated_count()
    }

    /// All live vertices in slot order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexHandle> + '_ {
        self.vertices
            .iter_allocated()
            .map(|(slot, generation)| VertexHandle::new(slot, generation))
    }

    /// All live edges in slot order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeHandle> + '_ {
        self.edges
            .iter_allocated()
            .map(|(slot, generation)| EdgeHandle::new(slot, generation))
    }

    /// Vertices belonging to time point `time`.
    pub fn vertices_at(&self, time: i32) -> impl Iterator<Item = VertexHandle> + '_ {
        self.time_buckets
            .get(&time)
            .into_iter()
            .flat_map(|bucket| bucket.iter())
            .filter_map(|&slot| self.vertex_handle_at(slot).ok())
    }

    /// Time points holding at least one vertex, ascending.
    pub fn timepoints(&self) -> impl Iterator<Item = i32> + '_ {
        self.time_buckets.keys().copied()
    }

    /// Outgoing edges of `v`.
    pub fn outgoing_edges(&self, v: VertexHandle) -> Result<Adjacency<'_>> {
        Ok(self.vertex(v)?.outgoing())
    }

    /// Incoming edges of `v`.
    pub fn incoming_edges(&self, v: VertexHandle) -> Result<Adjacency<'_>> {
        Ok(self.vertex(v)?.incoming())
    }

    /// Appends every edge incident to `v` to `out`.
    pub fn collect_incident_edges(&self, v: VertexHandle, out: &mut Vec<EdgeHandle>) -> Result<()> {
        out.extend(self.vertex(v)?.edges());
        Ok(())
    }

    /// The slot ↔ persistent-id maps.
    #[must_use]
    pub fn ids(&self) -> &GraphIdBimap {
        &self.ids
    }

    /// Raises the next fresh ids (used when loading a project).
    pub(crate) fn reserve_ids(&mut self, next_vertex: u64, next_edge: u64) {
        self.ids.vertices_mut().reserve_until(next_vertex);
        self.ids.edges_mut().reserve_until(next_edge);
    }

    /// Reads one vertex attribute.
    pub fn attribute(&self, v: VertexHandle, field: VertexField) -> Result<AttributeValue> {
        Ok(AttributeValue::of(field, &self.vertex(v)?.attrs()))
    }

    pub(crate) fn edge_pool(&self) -> &RecordPool {
        &self.edges
    }

    fn check_vertex(&self, v: VertexHandle) -> Result<()> {
        self.vertices.check(v.slot(), v.generation())
    }

    fn check_edge(&self, e: EdgeHandle) -> Result<()> {
        self.edges.check(e.slot(), e.generation())
    }

    fn vertex_handle_at(&self, slot: SlotIndex) -> Result<VertexHandle> {
        match self.vertices.generation(slot) {
            Some(generation) if self.vertices.is_allocated(slot) => {
                Ok(VertexHandle::new(slot, generation))
            }
            _ => Err(Error::IllegalGraphState(format!(
                "vertex slot {slot} is not allocated"
            ))),
        }
    }

    fn vertex_id_at(&self, slot: SlotIndex) -> Result<PersistentId> {
        self.ids.vertices().id_of(slot).ok_or_else(|| {
            Error::IllegalGraphState(format!("vertex slot {slot} has no persistent id"))
        })
    }

    fn edge_id_at(&self, slot: SlotIndex) -> Result<PersistentId> {
        self.ids.edges().id_of(slot).ok_or_else(|| {
            Error::IllegalGraphState(format!("edge slot {slot} has no persistent id"))
        })
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("vertices", &self.vertex_count())
            .field("edges", &self.edge_count())
            .field("timepoints", &self.time_buckets.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
