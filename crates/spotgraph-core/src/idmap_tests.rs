//! Tests for the identity bimap.

use crate::error::Error;
use crate::handle::ElementKind;
use crate::idmap::{GraphIdBimap, IdBimap, PersistentId};
use crate::pool::SlotIndex;

fn slot(raw: u32) -> SlotIndex {
    SlotIndex::new(raw)
}

#[test]
fn test_assign_is_monotonic() {
    let mut map = IdBimap::new(ElementKind::Vertex);
    let a = map.assign(slot(0)).unwrap();
    let b = map.assign(slot(1)).unwrap();
    assert_eq!(a, PersistentId::new(0));
    assert_eq!(b, PersistentId::new(1));
    assert_eq!(map.slot_of(b), Some(slot(1)));
    assert_eq!(map.id_of(slot(0)), Some(a));
}

#[test]
fn test_recycled_slot_gets_new_id() {
    let mut map = IdBimap::new(ElementKind::Vertex);
    let first = map.assign(slot(0)).unwrap();
    assert_eq!(map.release(slot(0)).unwrap(), first);

    let second = map.assign(slot(0)).unwrap();
    assert_ne!(first, second);
    assert_eq!(map.slot_of(first), None);
    assert_eq!(map.slot_of(second), Some(slot(0)));
}

#[test]
fn test_bind_rejects_live_id() {
    let mut map = IdBimap::new(ElementKind::Edge);
    let id = map.assign(slot(3)).unwrap();

    let err = map.bind(slot(4), id).unwrap_err();
    assert!(matches!(err, Error::IdCollision { kind: ElementKind::Edge, .. }));
    assert_eq!(map.len(), 1);
}

#[test]
fn test_bind_rejects_bound_slot() {
    let mut map = IdBimap::new(ElementKind::Vertex);
    map.assign(slot(0)).unwrap();
    let err = map.bind(slot(0), PersistentId::new(50)).unwrap_err();
    assert!(matches!(err, Error::IllegalGraphState(_)));
}

#[test]
fn test_rebind_released_id_elsewhere() {
    let mut map = IdBimap::new(ElementKind::Vertex);
    let id = map.assign(slot(0)).unwrap();
    map.release(slot(0)).unwrap();

    map.bind(slot(5), id).unwrap();
    assert_eq!(map.slot_of(id), Some(slot(5)));
    assert_eq!(map.id_of(slot(0)), None);
}

#[test]
fn test_bind_advances_next_id() {
    let mut map = IdBimap::new(ElementKind::Vertex);
    map.bind(slot(0), PersistentId::new(10)).unwrap();
    assert_eq!(map.next_id(), 11);
    assert_eq!(map.assign(slot(1)).unwrap(), PersistentId::new(11));

    map.reserve_until(5);
    assert_eq!(map.next_id(), 12);
    map.reserve_until(20);
    assert_eq!(map.assign(slot(2)).unwrap(), PersistentId::new(20));
}

#[test]
fn test_release_unbound_slot_fails() {
    let mut map = IdBimap::new(ElementKind::Vertex);
    assert!(map.release(slot(0)).is_err());
}

#[test]
fn test_graph_bimap_kinds_are_independent() {
    let mut ids = GraphIdBimap::new();
    ids.vertices_mut().assign(slot(0)).unwrap();
    ids.edges_mut().assign(slot(0)).unwrap();
    ids.edges_mut().assign(slot(1)).unwrap();

    assert_eq!(ids.of(ElementKind::Vertex).len(), 1);
    assert_eq!(ids.of(ElementKind::Edge).len(), 2);
    assert_eq!(
        ids.edges().sorted_ids(),
        vec![PersistentId::new(0), PersistentId::new(1)]
    );
}
