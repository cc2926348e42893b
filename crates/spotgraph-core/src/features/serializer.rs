//! Feature payload serializers.

use std::io::{Read, Write};

use super::value::{FeatureMap, FeatureMaps, FeatureValue};
use crate::error::Result;
use crate::idmap::PersistentId;

/// Writes and reads the value maps of one feature.
///
/// Payloads are keyed by persistent id, never by slot.
pub trait FeatureSerializer: Send + Sync {
    /// Writes `maps` to `writer`.
    fn serialize(&self, maps: &FeatureMaps, writer: &mut dyn Write) -> Result<()>;

    /// Reads maps previously written by [`serialize`](Self::serialize).
    fn deserialize(&self, reader: &mut dyn Read) -> Result<FeatureMaps>;
}

/// Serializes value maps with bincode, entries sorted by id.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeFeatureSerializer;

type Entries = Vec<(PersistentId, FeatureValue)>;

fn sorted_entries(map: &FeatureMap) -> Entries {
    let mut entries: Entries = map.iter().map(|(id, value)| (*id, *value)).collect();
    entries.sort_unstable_by_key(|(id, _)| *id);
    entries
}

impl FeatureSerializer for BincodeFeatureSerializer {
    fn serialize(&self, maps: &FeatureMaps, writer: &mut dyn Write) -> Result<()> {
        bincode::serialize_into(
            writer,
            &(sorted_entries(&maps.vertices), sorted_entries(&maps.edges)),
        )?;
        Ok(())
    }

    fn deserialize(&self, reader: &mut dyn Read) -> Result<FeatureMaps> {
        let (vertices, edges): (Entries, Entries) = bincode::deserialize_from(reader)?;
        Ok(FeatureMaps {
            vertices: vertices.into_iter().collect(),
            edges: edges.into_iter().collect(),
        })
    }
}
