//! Per-document model: the graph wired to its undo journal and feature cache.
//!
//! [`Model`] is the entry point for mutating callers. Every mutation goes
//! through the graph with the journal and the feature model as observers, so
//! both see each change exactly once, and each public mutation is recorded as
//! its own undo step.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::features::{ComputeOutcome, FeatureModel, FeatureRegistry, PendingChanges};
use crate::graph::{AttributeValue, Graph, GraphListener, ListenerId, VertexAttrs};
use crate::handle::{EdgeElement, EdgeHandle, RefPool, VertexHandle};
use crate::journal::UndoJournal;

/// A model shared between threads; one writer at a time.
pub type SharedModel = Arc<RwLock<Model>>;

/// Graph, undo journal and feature cache of one document.
pub struct Model {
    graph: Graph,
    journal: UndoJournal,
    features: FeatureModel,
    edge_refs: RefPool<EdgeElement>,
    config: EngineConfig,
}

impl Model {
    /// Creates an empty model with default configuration.
    #[must_use]
    pub fn new(registry: Arc<FeatureRegistry>) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    /// Creates an empty model.
    #[must_use]
    pub fn with_config(registry: Arc<FeatureRegistry>, config: EngineConfig) -> Self {
        Self {
            graph: Graph::with_config(&config.pool),
            journal: UndoJournal::with_config(&config.undo),
            features: FeatureModel::new(registry),
            edge_refs: RefPool::with_defaults(),
            config,
        }
    }

    /// Wraps the model for sharing across threads.
    #[must_use]
    pub fn into_shared(self) -> SharedModel {
        Arc::new(RwLock::new(self))
    }

    /// Read access to the graph.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The undo journal.
    #[must_use]
    pub fn journal(&self) -> &UndoJournal {
        &self.journal
    }

    /// The feature cache.
    #[must_use]
    pub fn features(&self) -> &FeatureModel {
        &self.features
    }

    /// The feature registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<FeatureRegistry> {
        self.features.registry()
    }

    /// Configuration the model was built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Mutation ───────────────────────────────────────────────────────

    /// Adds a spot.
    pub fn add_vertex(&mut self, attrs: VertexAttrs) -> Result<VertexHandle> {
        let v = self
            .graph
            .add_vertex_observed(attrs, &mut (&mut self.journal, &mut self.features))?;
        self.journal.end_step();
        Ok(v)
    }

    /// Removes a spot that has no links.
    ///
    /// # Errors
    ///
    /// Returns `Error::IllegalGraphState` if the spot still has links.
    pub fn remove_vertex(&mut self, v: VertexHandle) -> Result<VertexAttrs> {
        let attrs = self
            .graph
            .remove_vertex_observed(v, &mut (&mut self.journal, &mut self.features))?;
        self.journal.end_step();
        Ok(attrs)
    }

    /// Removes a spot together with its links, as one undo step.
    pub fn remove_vertex_cascade(&mut self, v: VertexHandle) -> Result<VertexAttrs> {
        self.compound(|model| {
            let mut incident = model.edge_refs.acquire();
            model.graph.collect_incident_edges(v, &mut incident)?;
            for e in incident.iter() {
                model
                    .graph
                    .remove_edge_observed(*e, &mut (&mut model.journal, &mut model.features))?;
            }
            model
                .graph
                .remove_vertex_observed(v, &mut (&mut model.journal, &mut model.features))
        })
    }

    /// Links two spots.
    pub fn add_edge(&mut self, source: VertexHandle, target: VertexHandle) -> Result<EdgeHandle> {
        let e = self
            .graph
            .add_edge_observed(source, target, &mut (&mut self.journal, &mut self.features))?;
        self.journal.end_step();
        Ok(e)
    }

    /// Removes a link.
    pub fn remove_edge(&mut self, e: EdgeHandle) -> Result<()> {
        self.graph
            .remove_edge_observed(e, &mut (&mut self.journal, &mut self.features))?;
        self.journal.end_step();
        Ok(())
    }

    /// Moves a spot to `position`.
    pub fn set_position(&mut self, v: VertexHandle, position: [f64; 3]) -> Result<()> {
        self.set_attribute(v, AttributeValue::Position(position))
    }

    /// Changes the radius of a spot.
    pub fn set_radius(&mut self, v: VertexHandle, radius: f64) -> Result<()> {
        self.set_attribute(v, AttributeValue::Radius(radius))
    }

    /// Shifts a spot by `delta` along dimension `dim` (0 = x, 1 = y, 2 = z).
    ///
    /// # Errors
    ///
    /// Returns `Error::IllegalGraphState` for a dimension above 2.
    pub fn move_vertex(&mut self, v: VertexHandle, dim: usize, delta: f64) -> Result<()> {
        let mut position = self.graph.vertex(v)?.position();
        let coordinate = position.get_mut(dim).ok_or_else(|| {
            Error::IllegalGraphState(format!("dimension {dim} is out of range (0..3)"))
        })?;
        *coordinate += delta;
        self.set_position(v, position)
    }

    fn set_attribute(&mut self, v: VertexHandle, value: AttributeValue) -> Result<()> {
        self.graph
            .set_attribute(v, value, &mut (&mut self.journal, &mut self.features))?;
        self.journal.end_step();
        Ok(())
    }

    /// Runs `edit` as one undo step.
    ///
    /// Steps nest; only the outermost one sets the undo point. Undo and redo
    /// are rejected while a step is open.
    pub fn compound<T>(&mut self, edit: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.journal.begin_compound();
        let result = edit(self);
        self.journal.end_compound();
        result
    }

    // ── Undo ───────────────────────────────────────────────────────────

    /// Reverts the last undo step. Returns false if there is none.
    pub fn undo(&mut self) -> Result<bool> {
        self.journal.undo(&mut self.graph, &mut self.features)
    }

    /// Re-applies the last undone step. Returns false if there is none.
    pub fn redo(&mut self) -> Result<bool> {
        self.journal.redo(&mut self.graph, &mut self.features)
    }

    /// Ends the current undo step at the latest edit.
    pub fn set_undo_point(&mut self) {
        self.journal.set_undo_point();
    }

    // ── Features ───────────────────────────────────────────────────────

    /// Declares a feature, marking every element dirty.
    pub fn declare_feature(&mut self, key: &str) -> Result<bool> {
        self.features.declare(key, &self.graph)
    }

    /// Recomputes the stale values of a feature.
    pub fn compute(&mut self, key: &str) -> Result<ComputeOutcome> {
        self.features.compute(key, &self.graph)
    }

    /// Ids the next compute of `key` will evaluate.
    pub fn dirty(&self, key: &str) -> Result<PendingChanges> {
        self.features.dirty(key)
    }

    // ── Listeners ──────────────────────────────────────────────────────

    /// Registers an external listener on the graph.
    pub fn add_listener(&mut self, listener: Box<dyn GraphListener + Send + Sync>) -> ListenerId {
        self.graph.add_listener(listener)
    }

    /// Unregisters an external listener.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.graph.remove_listener(id)
    }

    pub(crate) fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub(crate) fn features_mut(&mut self) -> &mut FeatureModel {
        &mut self.features
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("graph", &self.graph)
            .field("journal", &self.journal.len())
            .field("features", &self.features)
            .finish()
    }
}
