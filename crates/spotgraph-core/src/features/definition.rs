//! Feature specifications: what to compute and what it depends on.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::value::FeatureValue;
use crate::error::Result;
use crate::graph::{EdgeView, VertexView};
use crate::handle::ElementKind;

/// Which changes invalidate a feature value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyScope {
    /// Only changes to the element itself.
    SelfOnly,
    /// Changes to the element or to adjacent elements.
    SelfAndNeighbors,
}

impl DependencyScope {
    /// Returns true if neighbor changes invalidate the value.
    #[must_use]
    pub fn includes_neighbors(self) -> bool {
        matches!(self, DependencyScope::SelfAndNeighbors)
    }
}

/// Per-vertex computation.
pub type VertexComputer = Arc<dyn Fn(&VertexView<'_>) -> Result<FeatureValue> + Send + Sync>;

/// Per-edge computation.
pub type EdgeComputer = Arc<dyn Fn(&EdgeView<'_>) -> Result<FeatureValue> + Send + Sync>;

/// A feature: its key, and a computation plus dependency scope per element kind.
///
/// [`new`](Self::new) gives both kinds the same scope; override one with
/// [`with_vertex_scope`](Self::with_vertex_scope) or
/// [`with_edge_scope`](Self::with_edge_scope).
///
/// # Example
///
/// ```rust
/// use spotgraph_core::features::{DependencyScope, FeatureSpec, FeatureValue};
///
/// let spec = FeatureSpec::new("Spot radius", DependencyScope::SelfOnly)
///     .with_vertex(|v| Ok(FeatureValue::Real(v.radius())));
/// assert_eq!(spec.key(), "Spot radius");
/// ```
#[derive(Clone)]
pub struct FeatureSpec {
    key: String,
    vertex_scope: DependencyScope,
    edge_scope: DependencyScope,
    vertex: Option<VertexComputer>,
    edge: Option<EdgeComputer>,
}

impl FeatureSpec {
    /// Creates a specification that computes nothing yet.
    #[must_use]
    pub fn new(key: impl Into<String>, scope: DependencyScope) -> Self {
        Self {
            key: key.into(),
            vertex_scope: scope,
            edge_scope: scope,
            vertex: None,
            edge: None,
        }
    }

    /// Sets the per-vertex computation.
    #[must_use]
    pub fn with_vertex(
        mut self,
        compute: impl Fn(&VertexView<'_>) -> Result<FeatureValue> + Send + Sync + 'static,
    ) -> Self {
        self.vertex = Some(Arc::new(compute));
        self
    }

    /// Sets the per-edge computation.
    #[must_use]
    pub fn with_edge(
        mut self,
        compute: impl Fn(&EdgeView<'_>) -> Result<FeatureValue> + Send + Sync + 'static,
    ) -> Self {
        self.edge = Some(Arc::new(compute));
        self
    }

    /// Sets the dependency scope of vertex values.
    #[must_use]
    pub fn with_vertex_scope(mut self, scope: DependencyScope) -> Self {
        self.vertex_scope = scope;
        self
    }

    /// Sets the dependency scope of edge values.
    #[must_use]
    pub fn with_edge_scope(mut self, scope: DependencyScope) -> Self {
        self.edge_scope = scope;
        self
    }

    /// Feature key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Dependency scope of the values of `kind`.
    #[must_use]
    pub fn scope(&self, kind: ElementKind) -> DependencyScope {
        match kind {
            ElementKind::Vertex => self.vertex_scope,
            ElementKind::Edge => self.edge_scope,
        }
    }

    /// Per-vertex computation, if any.
    #[must_use]
    pub fn vertex_computer(&self) -> Option<&VertexComputer> {
        self.vertex.as_ref()
    }

    /// Per-edge computation, if any.
    #[must_use]
    pub fn edge_computer(&self) -> Option<&EdgeComputer> {
        self.edge.as_ref()
    }

    /// Returns true if the feature has values for `kind`.
    #[must_use]
    pub fn computes(&self, kind: ElementKind) -> bool {
        match kind {
            ElementKind::Vertex => self.vertex.is_some(),
            ElementKind::Edge => self.edge.is_some(),
        }
    }
}

impl fmt::Debug for FeatureSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureSpec")
            .field("key", &self.key)
            .field("vertex_scope", &self.vertex_scope)
            .field("edge_scope", &self.edge_scope)
            .field("vertices", &self.vertex.is_some())
            .field("edges", &self.edge.is_some())
            .finish()
    }
}
