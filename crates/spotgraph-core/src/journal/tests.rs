//! Tests for the undo/redo journal.

use super::{JournalState, UndoEdit, UndoJournal};
use crate::error::Error;
use crate::graph::{AttributeValue, Graph, VertexAttrs};
use crate::handle::{ElementKind, VertexHandle};
use crate::idmap::PersistentId;

fn spot(time: i32, x: f64) -> VertexAttrs {
    VertexAttrs::new(time, [x, 0.0, 0.0], 1.0)
}

/// Adds a vertex as one undo step.
fn add(graph: &mut Graph, journal: &mut UndoJournal, attrs: VertexAttrs) -> VertexHandle {
    let v = graph.add_vertex_observed(attrs, journal).unwrap();
    journal.end_step();
    v
}

fn snapshot(graph: &Graph) -> Vec<(PersistentId, VertexAttrs)> {
    let mut out: Vec<_> = graph
        .vertices()
        .map(|v| {
            let view = graph.vertex(v).unwrap();
            (view.id(), view.attrs())
        })
        .collect();
    out.sort_by_key(|(id, _)| *id);
    out
}

#[test]
fn test_records_edits_from_events() {
    let mut graph = Graph::new();
    let mut journal = UndoJournal::new(10);

    let a = add(&mut graph, &mut journal, spot(0, 1.0));
    let b = add(&mut graph, &mut journal, spot(1, 2.0));
    graph.add_edge_observed(a, b, &mut journal).unwrap();
    graph
        .set_attribute(a, AttributeValue::Radius(5.0), &mut journal)
        .unwrap();

    let edits: Vec<_> = journal.applied().cloned().collect();
    assert_eq!(edits.len(), 4);
    assert_eq!(
        edits[2],
        UndoEdit::AddEdge {
            id: PersistentId::new(0),
            source: PersistentId::new(0),
            target: PersistentId::new(1)
        }
    );
    assert_eq!(
        edits[3],
        UndoEdit::SetAttribute {
            kind: ElementKind::Vertex,
            id: PersistentId::new(0),
            old: AttributeValue::Radius(1.0),
            new: AttributeValue::Radius(5.0)
        }
    );
}

#[test]
fn test_undo_at_start_is_noop() {
    let mut graph = Graph::new();
    let mut journal = UndoJournal::default();
    assert!(!journal.undo(&mut graph, &mut ()).unwrap());
    assert!(!journal.redo(&mut graph, &mut ()).unwrap());
    assert_eq!(journal.state(), JournalState::Recording);
}

#[test]
fn test_undo_redo_restores_same_ids() {
    let mut graph = Graph::new();
    let mut journal = UndoJournal::default();
    let a = add(&mut graph, &mut journal, spot(0, 1.0));
    add(&mut graph, &mut journal, spot(1, 2.0));
    graph.remove_vertex_observed(a, &mut journal).unwrap();
    journal.end_step();
    let after = snapshot(&graph);

    assert!(journal.undo(&mut graph, &mut ()).unwrap());
    assert_eq!(graph.vertex_count(), 2);
    assert!(graph.vertex_by_id(PersistentId::new(0)).is_some());

    assert!(journal.redo(&mut graph, &mut ()).unwrap());
    assert_eq!(snapshot(&graph), after);
    assert!(!journal.can_redo());
}

#[test]
fn test_undo_then_redo_is_noop() {
    let mut graph = Graph::new();
    let mut journal = UndoJournal::default();
    let a = add(&mut graph, &mut journal, spot(0, 1.0));
    let b = add(&mut graph, &mut journal, spot(1, 2.0));
    graph.add_edge_observed(a, b, &mut journal).unwrap();
    journal.end_step();
    graph
        .set_attribute(b, AttributeValue::Position([7.0, 8.0, 9.0]), &mut journal)
        .unwrap();
    journal.end_step();
    let before = snapshot(&graph);

    journal.undo(&mut graph, &mut ()).unwrap();
    assert_eq!(
        graph.vertex(b).unwrap().position(),
        [2.0, 0.0, 0.0]
    );
    journal.redo(&mut graph, &mut ()).unwrap();
    assert_eq!(snapshot(&graph), before);
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_new_edit_truncates_redo_tail() {
    let mut graph = Graph::new();
    let mut journal = UndoJournal::default();
    add(&mut graph, &mut journal, spot(0, 1.0));
    add(&mut graph, &mut journal, spot(1, 2.0));

    journal.undo(&mut graph, &mut ()).unwrap();
    assert!(journal.can_redo());

    add(&mut graph, &mut journal, spot(2, 3.0));
    assert!(!journal.can_redo());
    assert_eq!(journal.len(), 2);
    assert!(!journal.redo(&mut graph, &mut ()).unwrap());
}

#[test]
fn test_capacity_evicts_oldest() {
    let mut graph = Graph::new();
    let mut journal = UndoJournal::new(3);
    for t in 0..5 {
        add(&mut graph, &mut journal, spot(t, 0.0));
    }
    assert_eq!(journal.len(), 3);
    assert_eq!(journal.evicted(), 2);

    while journal.undo(&mut graph, &mut ()).unwrap() {}
    // The two evicted additions can no longer be undone.
    assert_eq!(graph.vertex_count(), 2);
}

#[test]
fn test_compound_step_undone_at_once() {
    let mut graph = Graph::new();
    let mut journal = UndoJournal::default();
    let a = add(&mut graph, &mut journal, spot(0, 1.0));

    journal.begin_compound();
    let b = graph.add_vertex_observed(spot(1, 2.0), &mut journal).unwrap();
    journal.end_step();
    graph.add_edge_observed(a, b, &mut journal).unwrap();
    journal.end_step();
    journal.end_compound();

    assert!(journal.undo(&mut graph, &mut ()).unwrap());
    assert_eq!(graph.vertex_count(), 1);
    assert_eq!(graph.edge_count(), 0);

    assert!(journal.redo(&mut graph, &mut ()).unwrap());
    assert_eq!(graph.vertex_count(), 2);
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_undo_inside_compound_rejected() {
    let mut graph = Graph::new();
    let mut journal = UndoJournal::default();
    add(&mut graph, &mut journal, spot(0, 1.0));
    journal.begin_compound();
    let err = journal.undo(&mut graph, &mut ()).unwrap_err();
    assert!(matches!(err, Error::IllegalGraphState(_)));
}

#[test]
fn test_replay_of_missing_element_is_corruption() {
    let mut graph = Graph::new();
    let mut journal = UndoJournal::default();
    let v = add(&mut graph, &mut journal, spot(0, 1.0));

    // Removed behind the journal's back.
    graph.remove_vertex(v).unwrap();
    let err = journal.undo(&mut graph, &mut ()).unwrap_err();
    assert!(matches!(err, Error::JournalCorrupted(_)));
    assert_eq!(journal.state(), JournalState::Recording);
}

#[test]
fn test_failed_replay_poisons_journal() {
    let mut graph = Graph::new();
    let mut journal = UndoJournal::default();
    add(&mut graph, &mut journal, spot(0, 1.0));
    let second = add(&mut graph, &mut journal, spot(1, 2.0));

    graph.remove_vertex(second).unwrap();
    assert!(journal.undo(&mut graph, &mut ()).is_err());

    // The first step is still intact, but the history can no longer be trusted.
    let err = journal.undo(&mut graph, &mut ()).unwrap_err();
    assert!(matches!(err, Error::JournalCorrupted(_)));
    let err = journal.redo(&mut graph, &mut ()).unwrap_err();
    assert!(matches!(err, Error::JournalCorrupted(_)));
    assert_eq!(graph.vertex_count(), 1);

    journal.clear();
    assert!(!journal.undo(&mut graph, &mut ()).unwrap());
}

#[test]
fn test_inverse_swaps_attribute_values() {
    let edit = UndoEdit::SetAttribute {
        kind: ElementKind::Vertex,
        id: PersistentId::new(3),
        old: AttributeValue::Radius(1.0),
        new: AttributeValue::Radius(2.0),
    };
    assert_eq!(edit.inverse().inverse(), edit);
    assert_eq!(edit.to_string(), "set radius of vertex 3");
}
