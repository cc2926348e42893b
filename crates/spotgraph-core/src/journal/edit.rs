//! Reversible edit records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::{AttributeValue, Graph, GraphEvent, GraphListener, VertexAttrs};
use crate::handle::{ElementKind, VertexHandle};
use crate::idmap::PersistentId;

/// One reversible graph mutation, keyed by persistent ids so it survives
/// slot reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UndoEdit {
    /// A vertex was created.
    AddVertex {
        /// Id of the vertex.
        id: PersistentId,
        /// Attributes it was created with.
        attrs: VertexAttrs,
    },
    /// A vertex was deleted.
    RemoveVertex {
        /// Id of the vertex.
        id: PersistentId,
        /// Attributes it had.
        attrs: VertexAttrs,
    },
    /// An edge was created.
    AddEdge {
        /// Id of the edge.
        id: PersistentId,
        /// Id of the source vertex.
        source: PersistentId,
        /// Id of the target vertex.
        target: PersistentId,
    },
    /// An edge was deleted.
    RemoveEdge {
        /// Id of the edge.
        id: PersistentId,
        /// Id of the source vertex.
        source: PersistentId,
        /// Id of the target vertex.
        target: PersistentId,
    },
    /// An attribute changed from `old` to `new`.
    SetAttribute {
        /// Kind of the element carrying the attribute.
        kind: ElementKind,
        /// Id of the element.
        id: PersistentId,
        /// Value before the change.
        old: AttributeValue,
        /// Value after the change.
        new: AttributeValue,
    },
}

impl UndoEdit {
    /// Builds the edit describing `event`.
    pub(crate) fn from_event(graph: &Graph, event: &GraphEvent) -> Result<Self> {
        Ok(match *event {
            GraphEvent::VertexAdded { vertex, id } => UndoEdit::AddVertex {
                id,
                attrs: graph.vertex(vertex)?.attrs(),
            },
            GraphEvent::VertexRemoved { id, attrs, .. } => UndoEdit::RemoveVertex { id, attrs },
            GraphEvent::EdgeAdded {
                id, source, target, ..
            } => UndoEdit::AddEdge {
                id,
                source: graph.vertex_id(source)?,
                target: graph.vertex_id(target)?,
            },
            GraphEvent::EdgeRemoved {
                id,
                source_id,
                target_id,
                ..
            } => UndoEdit::RemoveEdge {
                id,
                source: source_id,
                target: target_id,
            },
            GraphEvent::VertexAttributeChanged { id, old, new, .. } => UndoEdit::SetAttribute {
                kind: new.element_kind(),
                id,
                old,
                new,
            },
        })
    }

    /// The edit that reverts this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self.clone() {
            UndoEdit::AddVertex { id, attrs } => UndoEdit::RemoveVertex { id, attrs },
            UndoEdit::RemoveVertex { id, attrs } => UndoEdit::AddVertex { id, attrs },
            UndoEdit::AddEdge { id, source, target } => UndoEdit::RemoveEdge { id, source, target },
            UndoEdit::RemoveEdge { id, source, target } => UndoEdit::AddEdge { id, source, target },
            UndoEdit::SetAttribute { kind, id, old, new } => UndoEdit::SetAttribute {
                kind,
                id,
                old: new,
                new: old,
            },
        }
    }

    /// Performs the edit on `graph`.
    ///
    /// # Errors
    ///
    /// Returns `Error::JournalCorrupted` if the edit references elements that
    /// do not exist, or cannot be applied to the current graph.
    pub(crate) fn apply(&self, graph: &mut Graph, observer: &mut impl GraphListener) -> Result<()> {
        let applied = match *self {
            UndoEdit::AddVertex { id, attrs } => graph
                .add_vertex_with_id(id, attrs, observer)
                .map(|_| ()),
            UndoEdit::RemoveVertex { id, .. } => {
                let v = self.resolve_vertex(graph, id)?;
                graph.remove_vertex_observed(v, observer).map(|_| ())
            }
            UndoEdit::AddEdge { id, source, target } => {
                let source = self.resolve_vertex(graph, source)?;
                let target = self.resolve_vertex(graph, target)?;
                graph
                    .add_edge_with_id(id, source, target, observer)
                    .map(|_| ())
            }
            UndoEdit::RemoveEdge { id, .. } => {
                let e = graph.edge_by_id(id).ok_or_else(|| self.missing(ElementKind::Edge, id))?;
                graph.remove_edge_observed(e, observer)
            }
            UndoEdit::SetAttribute {
                kind: ElementKind::Vertex,
                id,
                new,
                ..
            } => {
                let v = self.resolve_vertex(graph, id)?;
                graph.set_attribute(v, new, observer).map(|_| ())
            }
            UndoEdit::SetAttribute {
                kind: ElementKind::Edge,
                ..
            } => {
                return Err(Error::JournalCorrupted(format!(
                    "cannot replay {self}: edges carry no attributes"
                )))
            }
        };
        applied.map_err(|err| match err {
            Error::JournalCorrupted(_) => err,
            other => Error::JournalCorrupted(format!("cannot replay {self}: {other}")),
        })
    }

    fn resolve_vertex(&self, graph: &Graph, id: PersistentId) -> Result<VertexHandle> {
        graph
            .vertex_by_id(id)
            .ok_or_else(|| self.missing(ElementKind::Vertex, id))
    }

    fn missing(&self, kind: ElementKind, id: PersistentId) -> Error {
        Error::JournalCorrupted(format!("cannot replay {self}: {kind} {id} does not exist"))
    }
}

impl fmt::Display for UndoEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndoEdit::AddVertex { id, .. } => write!(f, "add vertex {id}"),
            UndoEdit::RemoveVertex { id, .. } => write!(f, "remove vertex {id}"),
            UndoEdit::AddEdge { id, source, target } => {
                write!(f, "add edge {id} ({source} -> {target})")
            }
            UndoEdit::RemoveEdge { id, source, target } => {
                write!(f, "remove edge {id} ({source} -> {target})")
            }
            UndoEdit::SetAttribute { kind, id, new, .. } => {
                write!(f, "set {} of {kind} {id}", new.field())
            }
        }
    }
}
