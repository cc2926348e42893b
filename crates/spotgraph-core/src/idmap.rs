//! Stable identities for pooled records.
//!
//! Slot indices are an in-memory layout detail: they are recycled as soon as
//! a record is freed. Everything that must outlive a slot (undo edits, feature
//! values, project files) refers to records through a [`PersistentId`]
//! instead. An [`IdBimap`] keeps the injective slot ↔ id mapping for one
//! record kind.
//!
//! Fresh ids are handed out monotonically and never reused for another
//! logical element. Re-binding an id (when undo restores a removed vertex, or
//! when a project is loaded) is allowed only while that id is not bound to
//! any live slot.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::handle::ElementKind;
use crate::pool::SlotIndex;

/// Stable identifier of a vertex or edge, independent of its pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersistentId(u64);

impl PersistentId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PersistentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Injective slot ↔ persistent-id mapping for one record kind.
#[derive(Debug)]
pub struct IdBimap {
    kind: ElementKind,
    slot_to_id: Vec<Option<PersistentId>>,
    id_to_slot: FxHashMap<PersistentId, SlotIndex>,
    next_id: u64,
}

impl IdBimap {
    /// Creates an empty bimap.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            slot_to_id: Vec::new(),
            id_to_slot: FxHashMap::default(),
            next_id: 0,
        }
    }

    /// Assigns the next fresh id to `slot`.
    pub fn assign(&mut self, slot: SlotIndex) -> Result<PersistentId> {
        let id = PersistentId(self.next_id);
        self.bind(slot, id)?;
        Ok(id)
    }

    /// Binds an existing id to `slot`.
    ///
    /// Fails with [`Error::IdCollision`] if the id is bound to a live slot,
    /// or [`Error::IllegalGraphState`] if the slot already carries an id.
    pub fn bind(&mut self, slot: SlotIndex, id: PersistentId) -> Result<()> {
        if self.id_to_slot.contains_key(&id) {
            return Err(Error::IdCollision {
                kind: self.kind,
                id,
            });
        }
        let index = slot.as_usize();
        if index >= self.slot_to_id.len() {
            self.slot_to_id.resize(index + 1, None);
        }
        if let Some(existing) = self.slot_to_id[index] {
            return Err(Error::IllegalGraphState(format!(
                "{} slot {} already bound to id {}",
                self.kind, slot, existing
            )));
        }
        self.slot_to_id[index] = Some(id);
        self.id_to_slot.insert(id, slot);
        self.next_id = self.next_id.max(id.0 + 1);
        Ok(())
    }

    /// Unbinds `slot`, returning the id it carried.
    pub fn release(&mut self, slot: SlotIndex) -> Result<PersistentId> {
        let id = self
            .slot_to_id
            .get_mut(slot.as_usize())
            .and_then(Option::take)
            .ok_or_else(|| {
                Error::IllegalGraphState(format!("{} slot {} has no id", self.kind, slot))
            })?;
        self.id_to_slot.remove(&id);
        Ok(id)
    }

    /// Id bound to `slot`.
    #[must_use]
    pub fn id_of(&self, slot: SlotIndex) -> Option<PersistentId> {
        self.slot_to_id.get(slot.as_usize()).copied().flatten()
    }

    /// Slot bound to `id`.
    #[must_use]
    pub fn slot_of(&self, id: PersistentId) -> Option<SlotIndex> {
        self.id_to_slot.get(&id).copied()
    }

    /// Returns true if `id` is bound to a live slot.
    #[must_use]
    pub fn contains(&self, id: PersistentId) -> bool {
        self.id_to_slot.contains_key(&id)
    }

    /// Number of bound ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.id_to_slot.len()
    }

    /// Returns true if no id is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_to_slot.is_empty()
    }

    /// The id the next [`assign`](Self::assign) will hand out.
    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Raises the next fresh id, e.g. to honour ids retired in an earlier session.
    ///
    /// Never lowers it.
    pub fn reserve_until(&mut self, next_id: u64) {
        self.next_id = self.next_id.max(next_id);
    }

    /// All bound ids in ascending order.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<PersistentId> {
        let mut ids: Vec<PersistentId> = self.id_to_slot.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// The vertex and edge bimaps of one graph.
#[derive(Debug)]
pub struct GraphIdBimap {
    vertices: IdBimap,
    edges: IdBimap,
}

impl GraphIdBimap {
    /// Creates empty bimaps for both record kinds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertices: IdBimap::new(ElementKind::Vertex),
            edges: IdBimap::new(ElementKind::Edge),
        }
    }

    /// Vertex bimap.
    #[must_use]
    pub fn vertices(&self) -> &IdBimap {
        &self.vertices
    }

    /// Edge bimap.
    #[must_use]
    pub fn edges(&self) -> &IdBimap {
        &self.edges
    }

    /// Bimap for the given kind.
    #[must_use]
    pub fn of(&self, kind: ElementKind) -> &IdBimap {
        match kind {
            ElementKind::Vertex => &self.vertices,
            ElementKind::Edge => &self.edges,
        }
    }

    pub(crate) fn vertices_mut(&mut self) -> &mut IdBimap {
        &mut self.vertices
    }

    pub(crate) fn edges_mut(&mut self) -> &mut IdBimap {
        &mut self.edges
    }
}

impl Default for GraphIdBimap {
    fn default() -> Self {
        Self::new()
    }
}
