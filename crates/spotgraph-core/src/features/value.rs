//! Feature values and per-feature value maps.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::handle::ElementKind;
use crate::idmap::PersistentId;

/// A computed feature value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FeatureValue {
    /// Real-valued feature.
    Real(f64),
    /// Integer-valued feature.
    Integer(i64),
}

impl FeatureValue {
    /// Value as `f64`, converting integers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            FeatureValue::Real(value) => value,
            FeatureValue::Integer(value) => value as f64,
        }
    }

    /// Integer value, if this is an integer feature.
    #[must_use]
    pub fn as_i64(self) -> Option<i64> {
        match self {
            FeatureValue::Integer(value) => Some(value),
            FeatureValue::Real(_) => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Real(value) => write!(f, "{value}"),
            FeatureValue::Integer(value) => write!(f, "{value}"),
        }
    }
}

/// Sparse persistent-id -> value map.
pub type FeatureMap = FxHashMap<PersistentId, FeatureValue>;

/// Vertex and edge value maps of one feature.
///
/// Entries may be stale; the dirty sets track which ones are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMaps {
    /// Values keyed by vertex id.
    pub vertices: FeatureMap,
    /// Values keyed by edge id.
    pub edges: FeatureMap,
}

impl FeatureMaps {
    /// Map for one element kind.
    #[must_use]
    pub fn of(&self, kind: ElementKind) -> &FeatureMap {
        match kind {
            ElementKind::Vertex => &self.vertices,
            ElementKind::Edge => &self.edges,
        }
    }

    /// Total number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len() + self.edges.len()
    }

    /// Returns true if no value is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }
}
