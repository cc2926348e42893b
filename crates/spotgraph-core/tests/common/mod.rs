//! Shared helpers for integration tests: random edit scripts and graph snapshots.

#![allow(dead_code)]

use std::sync::Arc;

use proptest::{
    collection::vec,
    prelude::{prop_oneof, Strategy},
    test_runner::{Config as ProptestConfig, FileFailurePersistence},
};
use spotgraph_core::features::{DependencyScope, FeatureRegistry, FeatureSpec, FeatureValue};
use spotgraph_core::{Model, PersistentId, VertexAttrs};

pub const RADIUS: &str = "Spot radius";

const PROP_CASES: u32 = 96;
const PROP_MAX_SHRINK_ITERS: u32 = 1024;

pub fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: PROP_CASES,
        max_shrink_iters: PROP_MAX_SHRINK_ITERS,
        failure_persistence: Some(Box::new(FileFailurePersistence::WithSource(
            "graph-property-regressions",
        ))),
        ..ProptestConfig::default()
    }
}

/// Built-in features plus a serializable self-only radius feature.
pub fn registry() -> Arc<FeatureRegistry> {
    let mut registry = FeatureRegistry::with_builtins();
    registry
        .register_serializable(
            FeatureSpec::new(RADIUS, DependencyScope::SelfOnly)
                .with_vertex(|v| Ok(FeatureValue::Real(v.radius()))),
        )
        .expect("radius feature registers");
    Arc::new(registry)
}

/// One edit. Indices pick among the live elements at the time it is applied.
#[derive(Debug, Clone)]
pub enum Op {
    AddVertex { time: i32, x: f64 },
    AddEdge { source: usize, target: usize },
    RemoveVertex { index: usize },
    RemoveEdge { index: usize },
    SetRadius { index: usize, radius: f64 },
    Move { index: usize, dim: usize, delta: f64 },
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..20i32, -100.0..100.0f64).prop_map(|(time, x)| Op::AddVertex { time, x }),
        3 => (0..64usize, 0..64usize).prop_map(|(source, target)| Op::AddEdge { source, target }),
        1 => (0..64usize).prop_map(|index| Op::RemoveVertex { index }),
        1 => (0..64usize).prop_map(|index| Op::RemoveEdge { index }),
        1 => (0..64usize, 0.1..10.0f64).prop_map(|(index, radius)| Op::SetRadius { index, radius }),
        2 => (0..64usize, 0..3usize, -5.0..5.0f64)
            .prop_map(|(index, dim, delta)| Op::Move { index, dim, delta }),
    ]
}

pub fn script_strategy(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    vec(op_strategy(), 1..max_len)
}

/// Applies `op` as one undo step. Returns false if it did not apply.
pub fn apply(model: &mut Model, op: &Op) -> bool {
    let vertices: Vec<_> = model.graph().vertices().collect();
    let edges: Vec<_> = model.graph().edges().collect();
    let pick_vertex = |index: usize| (!vertices.is_empty()).then(|| vertices[index % vertices.len()]);

    match *op {
        Op::AddVertex { time, x } => {
            let attrs = VertexAttrs::new(time, [x, f64::from(time), 0.0], 1.0);
            model.add_vertex(attrs).expect("add vertex");
        }
        Op::AddEdge { source, target } => {
            let (Some(source), Some(target)) = (pick_vertex(source), pick_vertex(target)) else {
                return false;
            };
            if source == target {
                return false;
            }
            model.add_edge(source, target).expect("add edge");
        }
        Op::RemoveVertex { index } => {
            let Some(v) = pick_vertex(index) else {
                return false;
            };
            model.remove_vertex_cascade(v).expect("remove vertex");
        }
        Op::RemoveEdge { index } => {
            if edges.is_empty() {
                return false;
            }
            model
                .remove_edge(edges[index % edges.len()])
                .expect("remove edge");
        }
        Op::SetRadius { index, radius } => {
            let Some(v) = pick_vertex(index) else {
                return false;
            };
            model.set_radius(v, radius).expect("set radius");
        }
        Op::Move { index, dim, delta } => {
            let Some(v) = pick_vertex(index) else {
                return false;
            };
            model.move_vertex(v, dim, delta).expect("move vertex");
        }
    }
    true
}

/// Layout-independent view of a graph: everything keyed by persistent id.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub vertices: Vec<(PersistentId, VertexAttrs)>,
    pub edges: Vec<(PersistentId, PersistentId, PersistentId)>,
    /// Outgoing edge ids per vertex, sorted.
    pub outgoing: Vec<(PersistentId, Vec<PersistentId>)>,
}

pub fn snapshot(model: &Model) -> Snapshot {
    let graph = model.graph();
    let mut vertices = Vec::new();
    let mut outgoing = Vec::new();
    for v in graph.vertices() {
        let view = graph.vertex(v).expect("live vertex");
        vertices.push((view.id(), view.attrs()));
        let mut out: Vec<_> = view
            .outgoing()
            .map(|e| graph.edge_id(e).expect("live edge"))
            .collect();
        out.sort_unstable();
        outgoing.push((view.id(), out));
    }
    let mut edges: Vec<_> = graph
        .edges()
        .map(|e| {
            let view = graph.edge(e).expect("live edge");
            (
                view.id(),
                graph.vertex_id(view.source()).expect("live source"),
                graph.vertex_id(view.target()).expect("live target"),
            )
        })
        .collect();
    vertices.sort_by_key(|(id, _)| *id);
    outgoing.sort_by_key(|(id, _)| *id);
    edges.sort_unstable();
    Snapshot {
        vertices,
        edges,
        outgoing,
    }
}
