//! Flyweight handles over pooled records.
//!
//! A [`Handle`] is a `(slot, generation)` pair naming one record in a
//! [`RecordPool`](crate::pool::RecordPool). Handles are `Copy`, carry no
//! ownership and may be freely duplicated; every access through the graph
//! checks the generation, so a handle whose slot has been freed and reused
//! is reported as stale instead of silently reading the new occupant.
//!
//! Per-consumer [`RefPool`]s recycle the handle buffers used while walking
//! adjacency, so hot paths such as dirty marking do not allocate.

mod ref_pool;


pub use ref_pool::{PooledRefs, RefPool};

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::pool::SlotIndex;

/// The two record kinds stored by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementKind {
    /// Vertex (spot) records.
    Vertex,
    /// Edge (link) records.
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Vertex => f.write_str("vertex"),
            ElementKind::Edge => f.write_str("edge"),
        }
    }
}

/// Type-level marker tying a handle to one record kind.
pub trait Element: Send + Sync + 'static {
    /// Runtime kind for this marker.
    const KIND: ElementKind;
}

/// Marker for vertex handles.
#[derive(Debug)]
pub enum VertexElement {}

/// Marker for edge handles.
#[derive(Debug)]
pub enum EdgeElement {}

impl Element for VertexElement {
    const KIND: ElementKind = ElementKind::Vertex;
}

impl Element for EdgeElement {
    const KIND: ElementKind = ElementKind::Edge;
}

/// Generation-checked index handle into a record pool.
pub struct Handle<K> {
    slot: SlotIndex,
    generation: u32,
    _kind: PhantomData<fn() -> K>,
}

/// Handle to a vertex record.
pub type VertexHandle = Handle<VertexElement>;

/// Handle to an edge record.
pub type EdgeHandle = Handle<EdgeElement>;

impl<K: Element> Handle<K> {
    pub(crate) const fn new(slot: SlotIndex, generation: u32) -> Self {
        Self {
            slot,
            generation,
            _kind: PhantomData,
        }
    }

    /// Returns the pool slot this handle points at.
    #[must_use]
    pub fn slot(self) -> SlotIndex {
        self.slot
    }

    /// Returns the slot generation captured when the handle was created.
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Returns the record kind of this handle.
    #[must_use]
    pub fn kind(self) -> ElementKind {
        K::KIND
    }
}

// Manual impls: derives would require the marker type itself to implement them.
impl<K> Clone for Handle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Handle<K> {}

impl<K> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot && self.generation == other.generation
    }
}

impl<K> Eq for Handle<K> {}

impl<K> PartialOrd for Handle<K> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Handle<K> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.slot, self.generation).cmp(&(other.slot, other.generation))
    }
}

impl<K> Hash for Handle<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slot.hash(state);
        self.generation.hash(state);
    }
}

impl<K: Element> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &K::KIND)
            .field("slot", &self.slot.as_u32())
            .field("generation", &self.generation)
            .finish()
    }
}

impl<K: Element> fmt::Display for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}#{}",
            K::KIND,
            self.slot.as_u32(),
            self.generation
        )
    }
}
