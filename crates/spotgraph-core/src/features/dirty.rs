//! Dirty sets: ids whose stored feature value is out of date.

use std::io::{Read, Write};

use roaring::RoaringTreemap;

use super::definition::DependencyScope;
use crate::error::Result;
use crate::idmap::PersistentId;

/// Out-of-date ids of one feature and element kind.
///
/// Ids are *self-dirty* when the element itself changed and *neighbor-dirty*
/// when an adjacent element changed. Whether neighbor-dirty ids need
/// recomputing depends on the feature's [`DependencyScope`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirtySet {
    self_dirty: RoaringTreemap,
    neighbor_dirty: RoaringTreemap,
}

impl DirtySet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an element changed.
    pub fn mark_self(&mut self, id: PersistentId) {
        self.self_dirty.insert(id.as_u64());
    }

    /// Marks an element whose neighbor changed.
    pub fn mark_neighbor(&mut self, id: PersistentId) {
        self.neighbor_dirty.insert(id.as_u64());
    }

    /// Forgets an id entirely (the element was removed).
    pub fn remove(&mut self, id: PersistentId) {
        self.self_dirty.remove(id.as_u64());
        self.neighbor_dirty.remove(id.as_u64());
    }

    /// Returns true if the element itself changed.
    #[must_use]
    pub fn is_self_dirty(&self, id: PersistentId) -> bool {
        self.self_dirty.contains(id.as_u64())
    }

    /// Returns true if a neighbor of the element changed.
    #[must_use]
    pub fn is_neighbor_dirty(&self, id: PersistentId) -> bool {
        self.neighbor_dirty.contains(id.as_u64())
    }

    /// Ids a feature with `scope` must recompute.
    #[must_use]
    pub fn pending(&self, scope: DependencyScope) -> RoaringTreemap {
        if scope.includes_neighbors() {
            &self.self_dirty | &self.neighbor_dirty
        } else {
            self.self_dirty.clone()
        }
    }

    /// Clears recomputed ids.
    ///
    /// Neighbor marks are cleared too: a fresh value reflects current neighbors.
    pub fn clear(&mut self, ids: &RoaringTreemap) {
        self.self_dirty -= ids;
        self.neighbor_dirty -= ids;
    }

    /// Returns true if nothing is dirty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.self_dirty.is_empty() && self.neighbor_dirty.is_empty()
    }

    /// Writes both sets in the portable roaring format.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        self.self_dirty.serialize_into(&mut writer)?;
        self.neighbor_dirty.serialize_into(&mut writer)?;
        Ok(())
    }

    /// Reads sets written by [`write_to`](Self::write_to).
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let self_dirty = RoaringTreemap::deserialize_from(&mut reader)?;
        let neighbor_dirty = RoaringTreemap::deserialize_from(&mut reader)?;
        Ok(Self {
            self_dirty,
            neighbor_dirty,
        })
    }

    /// All ids that are self- or neighbor-dirty.
    pub fn ids(&self) -> impl Iterator<Item = PersistentId> + '_ {
        (&self.self_dirty | &self.neighbor_dirty)
            .into_iter()
            .map(PersistentId::new)
    }
}
