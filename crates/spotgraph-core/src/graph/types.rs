//! Vertex attribute types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::handle::ElementKind;

/// The attributes stored in a vertex record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexAttrs {
    /// Spatial coordinates (x, y, z).
    pub position: [f64; 3],
    /// Time-point index the vertex belongs to.
    pub time: i32,
    /// Radius of the tracked object.
    pub radius: f64,
}

impl VertexAttrs {
    /// Creates vertex attributes.
    #[must_use]
    pub fn new(time: i32, position: [f64; 3], radius: f64) -> Self {
        Self {
            position,
            time,
            radius,
        }
    }
}

/// Mutable vertex fields reported by attribute-change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexField {
    /// The x, y, z coordinates.
    Position,
    /// The radius.
    Radius,
}

impl fmt::Display for VertexField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexField::Position => f.write_str("position"),
            VertexField::Radius => f.write_str("radius"),
        }
    }
}

/// A value of one mutable attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Vertex position.
    Position([f64; 3]),
    /// Vertex radius.
    Radius(f64),
}

impl AttributeValue {
    /// The field this value belongs to.
    #[must_use]
    pub fn field(&self) -> VertexField {
        match self {
            AttributeValue::Position(_) => VertexField::Position,
            AttributeValue::Radius(_) => VertexField::Radius,
        }
    }

    /// The element kind carrying this attribute.
    #[must_use]
    pub fn element_kind(&self) -> ElementKind {
        ElementKind::Vertex
    }

    /// Reads the matching field out of a full attribute set.
    #[must_use]
    pub fn of(field: VertexField, attrs: &VertexAttrs) -> Self {
        match field {
            VertexField::Position => AttributeValue::Position(attrs.position),
            VertexField::Radius => AttributeValue::Radius(attrs.radius),
        }
    }
}
