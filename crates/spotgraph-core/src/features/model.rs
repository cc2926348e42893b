//! Declared feature values, dirty tracking and incremental recompute.

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;

use super::definition::{DependencyScope, FeatureSpec};
use super::dirty::DirtySet;
use super::registry::FeatureRegistry;
use super::value::{FeatureMaps, FeatureValue};
use crate::error::{Error, Result};
use crate::graph::{Graph, GraphEvent, GraphListener};
use crate::handle::{EdgeElement, ElementKind, RefPool};
use crate::idmap::PersistentId;

/// Values and dirty sets of one declared feature.
#[derive(Debug, Clone)]
pub(crate) struct FeatureState {
    pub(crate) values: FeatureMaps,
    pub(crate) vertex_dirty: DirtySet,
    pub(crate) edge_dirty: DirtySet,
    /// Scope of vertex values, `None` if the feature has none.
    vertices: Option<DependencyScope>,
    /// Scope of edge values, `None` if the feature has none.
    edges: Option<DependencyScope>,
}

impl FeatureState {
    fn for_spec(spec: &FeatureSpec) -> Self {
        let scope = |kind| spec.computes(kind).then(|| spec.scope(kind));
        Self {
            values: FeatureMaps::default(),
            vertex_dirty: DirtySet::default(),
            edge_dirty: DirtySet::default(),
            vertices: scope(ElementKind::Vertex),
            edges: scope(ElementKind::Edge),
        }
    }

    fn tracked_vertices(&mut self) -> Option<&mut DirtySet> {
        self.vertices.is_some().then_some(&mut self.vertex_dirty)
    }

    fn tracked_edges(&mut self) -> Option<&mut DirtySet> {
        self.edges.is_some().then_some(&mut self.edge_dirty)
    }

    /// Vertex dirty set, if vertex values depend on adjacent elements.
    fn neighbor_tracked_vertices(&mut self) -> Option<&mut DirtySet> {
        self.vertices
            .is_some_and(DependencyScope::includes_neighbors)
            .then_some(&mut self.vertex_dirty)
    }

    /// Edge dirty set, if edge values depend on their endpoints.
    fn neighbor_tracked_edges(&mut self) -> Option<&mut DirtySet> {
        self.edges
            .is_some_and(DependencyScope::includes_neighbors)
            .then_some(&mut self.edge_dirty)
    }
}

/// Ids that the next compute of a feature will evaluate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingChanges {
    /// Vertex ids.
    pub vertices: Vec<PersistentId>,
    /// Edge ids.
    pub edges: Vec<PersistentId>,
}

impl PendingChanges {
    /// Returns true if nothing needs recomputing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }

    /// Total number of pending ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len() + self.edges.len()
    }
}

/// Values produced by one [`FeatureModel::compute`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputeOutcome {
    /// Recomputed vertex values.
    pub vertices: BTreeMap<PersistentId, FeatureValue>,
    /// Recomputed edge values.
    pub edges: BTreeMap<PersistentId, FeatureValue>,
}

impl ComputeOutcome {
    /// Returns true if nothing was recomputed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }

    /// Number of recomputed values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len() + self.edges.len()
    }
}

/// Per-document feature cache.
///
/// Observes the graph as a [`GraphListener`] and keeps, for every declared
/// feature, sparse value maps plus the dirty sets that tell which values are
/// stale. Dirty propagation:
///
/// | mutation          | marks                                                      |
/// |-------------------|------------------------------------------------------------|
/// | vertex added      | vertex self-dirty                                          |
/// | vertex attribute  | vertex self-dirty, adjacent vertices and incident edges neighbor-dirty |
/// | edge added        | edge self-dirty, endpoints neighbor-dirty                  |
/// | edge removed      | edge forgotten, endpoints neighbor-dirty                   |
/// | vertex removed    | vertex forgotten                                           |
///
/// Neighbor marks are only recorded for element kinds whose
/// [`DependencyScope`] includes neighbors.
pub struct FeatureModel {
    registry: Arc<FeatureRegistry>,
    states: IndexMap<String, FeatureState>,
    edge_refs: RefPool<EdgeElement>,
}

impl FeatureModel {
    /// Creates a feature model with nothing declared.
    #[must_use]
    pub fn new(registry: Arc<FeatureRegistry>) -> Self {
        Self {
            registry,
            states: IndexMap::new(),
            edge_refs: RefPool::with_defaults(),
        }
    }

    /// The registry features are resolved against.
    #[must_use]
    pub fn registry(&self) -> &Arc<FeatureRegistry> {
        &self.registry
    }

    /// Declares a feature, marking every live element dirty.
    ///
    /// Returns false if it was already declared.
    ///
    /// # Errors
    ///
    /// Returns `Error::FeatureNotRegistered` for an unknown key.
    pub fn declare(&mut self, key: &str, graph: &Graph) -> Result<bool> {
        if self.states.contains_key(key) {
            return Ok(false);
        }
        let spec = self.registry.get(key)?.spec();
        let mut state = FeatureState::for_spec(spec);
        if let Some(dirty) = state.tracked_vertices() {
            for v in graph.vertices() {
                dirty.mark_self(graph.vertex_id(v)?);
            }
        }
        if let Some(dirty) = state.tracked_edges() {
            for e in graph.edges() {
                dirty.mark_self(graph.edge_id(e)?);
            }
        }
        tracing::debug!(key, "feature declared");
        self.states.insert(key.to_string(), state);
        Ok(true)
    }

    /// Returns true if `key` has been declared.
    #[must_use]
    pub fn is_declared(&self, key: &str) -> bool {
        self.states.contains_key(key)
    }

    /// Declared keys in declaration order.
    pub fn declared_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.keys().map(String::as_str)
    }

    /// Recomputes the stale values of a feature, declaring it first if needed.
    ///
    /// Evaluates exactly the self-dirty ids, plus the neighbor-dirty ids when
    /// the feature depends on neighbors. Nothing is stored unless every
    /// evaluation succeeds.
    ///
    /// # Errors
    ///
    /// Returns `Error::FeatureNotRegistered` for an unknown key, or the first
    /// error raised by a computation.
    pub fn compute(&mut self, key: &str, graph: &Graph) -> Result<ComputeOutcome> {
        self.declare(key, graph)?;
        let spec = self.registry.get(key)?.spec();
        let state = self.state(key)?;

        let vertex_ids = state
            .vertex_dirty
            .pending(spec.scope(ElementKind::Vertex));
        let edge_ids = state.edge_dirty.pending(spec.scope(ElementKind::Edge));
        let mut outcome = ComputeOutcome::default();

        if let Some(compute) = spec.vertex_computer() {
            for raw in &vertex_ids {
                let id = PersistentId::new(raw);
                let v = graph.vertex_by_id(id).ok_or_else(|| stale(ElementKind::Vertex, id))?;
                outcome.vertices.insert(id, compute(&graph.vertex(v)?)?);
            }
        }
        if let Some(compute) = spec.edge_computer() {
            for raw in &edge_ids {
                let id = PersistentId::new(raw);
                let e = graph.edge_by_id(id).ok_or_else(|| stale(ElementKind::Edge, id))?;
                outcome.edges.insert(id, compute(&graph.edge(e)?)?);
            }
        }

        let state = self.state_mut(key)?;
        state.values.vertices.extend(outcome.vertices.iter().map(|(id, v)| (*id, *v)));
        state.values.edges.extend(outcome.edges.iter().map(|(id, v)| (*id, *v)));
        state.vertex_dirty.clear(&vertex_ids);
        state.edge_dirty.clear(&edge_ids);

        tracing::info!(
            key,
            vertices = outcome.vertices.len(),
            edges = outcome.edges.len(),
            "feature computed"
        );
        Ok(outcome)
    }

    /// Ids the next [`compute`](Self::compute) of `key` will evaluate.
    ///
    /// # Errors
    ///
    /// Returns `Error::FeatureNotRegistered` for an unknown key and
    /// `Error::FeatureNotDeclared` if the feature was never declared.
    pub fn dirty(&self, key: &str) -> Result<PendingChanges> {
        let spec = self.registry.get(key)?.spec();
        let state = self.state(key)?;
        let collect = |dirty: &DirtySet, kind: ElementKind| {
            dirty
                .pending(spec.scope(kind))
                .into_iter()
                .map(PersistentId::new)
                .collect::<Vec<_>>()
        };
        Ok(PendingChanges {
            vertices: collect(&state.vertex_dirty, ElementKind::Vertex),
            edges: collect(&state.edge_dirty, ElementKind::Edge),
        })
    }

    /// Stored (possibly stale) values of a feature.
    ///
    /// # Errors
    ///
    /// Returns `Error::FeatureNotDeclared` if the feature was never declared.
    pub fn values(&self, key: &str) -> Result<&FeatureMaps> {
        Ok(&self.state(key)?.values)
    }

    /// Stored value of one element, if any.
    pub fn value(
        &self,
        key: &str,
        kind: ElementKind,
        id: PersistentId,
    ) -> Result<Option<FeatureValue>> {
        Ok(self.values(key)?.of(kind).get(&id).copied())
    }

    pub(crate) fn state(&self, key: &str) -> Result<&FeatureState> {
        self.states
            .get(key)
            .ok_or_else(|| Error::FeatureNotDeclared(key.to_string()))
    }

    fn state_mut(&mut self, key: &str) -> Result<&mut FeatureState> {
        self.states
            .get_mut(key)
            .ok_or_else(|| Error::FeatureNotDeclared(key.to_string()))
    }

    /// Installs a feature read from a project stream, replacing any prior state.
    pub(crate) fn restore(
        &mut self,
        key: &str,
        values: FeatureMaps,
        vertex_dirty: DirtySet,
        edge_dirty: DirtySet,
    ) -> Result<()> {
        let spec = self.registry.get(key)?.spec();
        let mut state = FeatureState::for_spec(spec);
        state.values = values;
        state.vertex_dirty = vertex_dirty;
        state.edge_dirty = edge_dirty;
        self.states.insert(key.to_string(), state);
        Ok(())
    }

    fn on_vertex_changed(&mut self, graph: &Graph, event: &GraphEvent) {
        let GraphEvent::VertexAttributeChanged { vertex, id, .. } = *event else {
            return;
        };
        let mut incident = self.edge_refs.acquire();
        if let Err(err) = graph.collect_incident_edges(vertex, &mut incident) {
            tracing::warn!(error = %err, "cannot collect incident edges of changed vertex");
        }
        let adjacent: Vec<PersistentId> = graph
            .vertex(vertex)
            .map(|view| view.neighbors().map(|n| n.id()).collect())
            .unwrap_or_default();
        for state in self.states.values_mut() {
            if let Some(dirty) = state.tracked_vertices() {
                dirty.mark_self(id);
            }
            if let Some(dirty) = state.neighbor_tracked_vertices() {
                for neighbor in &adjacent {
                    dirty.mark_neighbor(*neighbor);
                }
            }
            if let Some(dirty) = state.neighbor_tracked_edges() {
                for e in incident.iter() {
                    if let Ok(edge_id) = graph.edge_id(*e) {
                        dirty.mark_neighbor(edge_id);
                    }
                }
            }
        }
    }
}

fn stale(kind: ElementKind, id: PersistentId) -> Error {
    Error::IllegalGraphState(format!("dirty {kind} {id} is not in the graph"))
}

impl GraphListener for FeatureModel {
    fn on_event(&mut self, graph: &Graph, event: &GraphEvent) {
        match *event {
            GraphEvent::VertexAdded { id, .. } => {
                for state in self.states.values_mut() {
                    if let Some(dirty) = state.tracked_vertices() {
                        dirty.mark_self(id);
                    }
                }
            }
            GraphEvent::VertexRemoved { id, .. } => {
                for state in self.states.values_mut() {
                    state.values.vertices.remove(&id);
                    state.vertex_dirty.remove(id);
                }
            }
            GraphEvent::EdgeAdded {
                id, source, target, ..
            } => {
                let endpoints = [graph.vertex_id(source), graph.vertex_id(target)];
                for state in self.states.values_mut() {
                    if let Some(dirty) = state.tracked_edges() {
                        dirty.mark_self(id);
                    }
                    if let Some(dirty) = state.neighbor_tracked_vertices() {
                        for endpoint in endpoints.iter().flatten() {
                            dirty.mark_neighbor(*endpoint);
                        }
                    }
                }
            }
            GraphEvent::EdgeRemoved {
                id,
                source_id,
                target_id,
                ..
            } => {
                for state in self.states.values_mut() {
                    state.values.edges.remove(&id);
                    state.edge_dirty.remove(id);
                    if let Some(dirty) = state.neighbor_tracked_vertices() {
                        dirty.mark_neighbor(source_id);
                        dirty.mark_neighbor(target_id);
                    }
                }
            }
            GraphEvent::VertexAttributeChanged { .. } => self.on_vertex_changed(graph, event),
        }
    }
}

impl std::fmt::Debug for FeatureModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureModel")
            .field("registered", &self.registry.len())
            .field("declared", &self.states.keys().collect::<Vec<_>>())
            .finish()
    }
}
