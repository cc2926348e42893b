//! Tests for project save and load.

use std::io::{Read, Write};
use std::sync::Arc;

use super::{open, read, save, write, Section};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::features::builtin::{self, LINK_COUNT, POSITION_X};
use crate::features::{
    DependencyScope, FeatureMaps, FeatureRegistry, FeatureSerializer, FeatureSpec, FeatureValue,
};
use crate::graph::VertexAttrs;
use crate::handle::ElementKind;
use crate::idmap::PersistentId;
use crate::model::Model;

const RADIUS: &str = "Spot radius";
const PHANTOM: &str = "Phantom";
const BROKEN: &str = "Broken";

/// Claims a value for a vertex id that never exists.
struct PhantomIds;

impl FeatureSerializer for PhantomIds {
    fn serialize(&self, _maps: &FeatureMaps, _writer: &mut dyn Write) -> Result<()> {
        Ok(())
    }

    fn deserialize(&self, _reader: &mut dyn Read) -> Result<FeatureMaps> {
        let mut maps = FeatureMaps::default();
        maps.vertices
            .insert(PersistentId::new(999), FeatureValue::Integer(1));
        Ok(maps)
    }
}

struct FailingSerializer;

impl FeatureSerializer for FailingSerializer {
    fn serialize(&self, _maps: &FeatureMaps, _writer: &mut dyn Write) -> Result<()> {
        Err(Error::Corrupted("refusing to write".to_string()))
    }

    fn deserialize(&self, _reader: &mut dyn Read) -> Result<FeatureMaps> {
        Err(Error::Corrupted("refusing to read".to_string()))
    }
}

fn radius_spec() -> FeatureSpec {
    FeatureSpec::new(RADIUS, DependencyScope::SelfOnly)
        .with_vertex(|v| Ok(FeatureValue::Real(v.radius())))
}

fn constant_spec(key: &str) -> FeatureSpec {
    FeatureSpec::new(key, DependencyScope::SelfOnly).with_vertex(|_| Ok(FeatureValue::Integer(1)))
}

fn full_registry() -> Arc<FeatureRegistry> {
    let mut registry = FeatureRegistry::with_builtins();
    registry.register_serializable(radius_spec()).unwrap();
    registry
        .register(constant_spec(PHANTOM), Some(Arc::new(PhantomIds)))
        .unwrap();
    registry
        .register(constant_spec(BROKEN), Some(Arc::new(FailingSerializer)))
        .unwrap();
    Arc::new(registry)
}

/// Three spots linked 0 → 1 → 2.
fn sample_model(registry: Arc<FeatureRegistry>) -> Model {
    let mut model = Model::new(registry);
    let spots: Vec<_> = (0..3)
        .map(|t| {
            model
                .add_vertex(VertexAttrs::new(t, [f64::from(t) * 2.0, 1.0, -1.0], 0.5))
                .unwrap()
        })
        .collect();
    model.add_edge(spots[0], spots[1]).unwrap();
    model.add_edge(spots[1], spots[2]).unwrap();
    model
}

fn to_bytes(model: &Model, keys: &[&str]) -> Vec<u8> {
    let mut bytes = Vec::new();
    write(model, keys, &mut bytes).unwrap();
    bytes
}

fn section_of(err: &Error) -> Option<Section> {
    match err {
        Error::Persistence { section, .. } | Error::UnknownPersistentId { section, .. } => {
            Some(*section)
        }
        _ => None,
    }
}

#[test]
fn test_round_trip_preserves_graph() {
    let registry = full_registry();
    let model = sample_model(Arc::clone(&registry));

    let bytes = to_bytes(&model, &[]);
    let reloaded = read(bytes.as_slice(), registry, EngineConfig::default()).unwrap();

    let graph = reloaded.graph();
    assert_eq!(graph.vertex_count(), 3);
    assert_eq!(graph.edge_count(), 2);
    for raw in 0..3 {
        let id = PersistentId::new(raw);
        let before = model.graph().vertex(model.graph().vertex_by_id(id).unwrap());
        let after = graph.vertex(graph.vertex_by_id(id).unwrap());
        assert_eq!(before.unwrap().attrs(), after.unwrap().attrs());
    }

    let middle = graph.vertex(graph.vertex_by_id(PersistentId::new(1)).unwrap()).unwrap();
    assert_eq!(middle.degree(), 2);
    let link = graph.edge(graph.edge_by_id(PersistentId::new(1)).unwrap()).unwrap();
    assert_eq!(graph.vertex_id(link.source()).unwrap(), PersistentId::new(1));
    assert_eq!(graph.vertex_id(link.target()).unwrap(), PersistentId::new(2));

    // Loading is not an undoable edit.
    assert!(!reloaded.journal().can_undo());
}

#[test]
fn test_retired_ids_stay_retired() {
    let registry = full_registry();
    let mut model = sample_model(Arc::clone(&registry));
    let last = model.graph().vertex_by_id(PersistentId::new(2)).unwrap();
    model.remove_vertex_cascade(last).unwrap();

    let bytes = to_bytes(&model, &[]);
    let mut reloaded = read(bytes.as_slice(), registry, EngineConfig::default()).unwrap();
    assert_eq!(reloaded.graph().vertex_count(), 2);

    let fresh = reloaded
        .add_vertex(VertexAttrs::new(5, [0.0; 3], 1.0))
        .unwrap();
    assert_eq!(reloaded.graph().vertex_id(fresh).unwrap(), PersistentId::new(3));
}

#[test]
fn test_round_trip_preserves_features_and_dirty_state() {
    let registry = full_registry();
    let mut model = sample_model(Arc::clone(&registry));
    model.compute(POSITION_X).unwrap();
    model.compute(LINK_COUNT).unwrap();
    let first = model.graph().vertex_by_id(PersistentId::new(0)).unwrap();
    model.set_position(first, [7.0, 1.0, -1.0]).unwrap();

    let bytes = to_bytes(&model, &[POSITION_X, LINK_COUNT]);
    let mut reloaded = read(bytes.as_slice(), registry, EngineConfig::default()).unwrap();

    assert_eq!(
        reloaded.features().values(POSITION_X).unwrap(),
        model.features().values(POSITION_X).unwrap()
    );
    assert_eq!(
        reloaded.dirty(POSITION_X).unwrap(),
        model.dirty(POSITION_X).unwrap()
    );
    // Link counts are neighbor-scoped, so the linked spot is pending too.
    assert_eq!(
        reloaded.dirty(LINK_COUNT).unwrap().vertices,
        vec![PersistentId::new(0), PersistentId::new(1)]
    );

    let outcome = reloaded.compute(POSITION_X).unwrap();
    assert_eq!(
        outcome.vertices.keys().copied().collect::<Vec<_>>(),
        vec![PersistentId::new(0)]
    );
    assert_eq!(
        reloaded
            .features()
            .value(POSITION_X, ElementKind::Edge, PersistentId::new(0))
            .unwrap(),
        Some(FeatureValue::Real(7.0))
    );
}

#[test]
fn test_unsaved_feature_is_not_declared_after_load() {
    let registry = full_registry();
    let mut model = sample_model(Arc::clone(&registry));
    model.compute(POSITION_X).unwrap();
    model.compute(RADIUS).unwrap();

    let bytes = to_bytes(&model, &[POSITION_X]);
    let reloaded = read(bytes.as_slice(), registry, EngineConfig::default()).unwrap();
    assert!(reloaded.features().is_declared(POSITION_X));
    assert!(!reloaded.features().is_declared(RADIUS));
}

#[test]
fn test_write_without_serializer_writes_nothing() {
    let mut registry = FeatureRegistry::with_builtins();
    registry.register(radius_spec(), None).unwrap();
    let mut model = sample_model(Arc::new(registry));
    model.compute(RADIUS).unwrap();

    let mut bytes = Vec::new();
    let err = write(&model, &[POSITION_X, RADIUS], &mut bytes).unwrap_err();
    assert!(matches!(err, Error::MissingSerializer(key) if key == RADIUS));
    assert!(bytes.is_empty());
}

#[test]
fn test_write_undeclared_feature_fails() {
    let model = sample_model(full_registry());
    let mut bytes = Vec::new();
    let err = write(&model, &[RADIUS], &mut bytes).unwrap_err();
    assert!(matches!(err, Error::FeatureNotDeclared(_)));
    assert!(bytes.is_empty());
}

#[test]
fn test_failing_serializer_writes_nothing() {
    let mut model = sample_model(full_registry());
    model.compute(BROKEN).unwrap();

    let mut bytes = Vec::new();
    let err = write(&model, &[BROKEN], &mut bytes).unwrap_err();
    assert_eq!(section_of(&err), Some(Section::FeaturePayload));
    assert!(bytes.is_empty());
}

#[test]
fn test_bad_magic_is_header_error() {
    let err = read(&b"NOPE\x01\x00\x00\x00"[..], full_registry(), EngineConfig::default())
        .unwrap_err();
    assert_eq!(section_of(&err), Some(Section::Header));
    assert!(err.to_string().contains("corrupted"));
}

#[test]
fn test_truncated_stream_names_section() {
    let registry = full_registry();
    let mut model = sample_model(Arc::clone(&registry));
    model.compute(POSITION_X).unwrap();
    let bytes = to_bytes(&model, &[POSITION_X]);

    let err = read(&bytes[..10], Arc::clone(&registry), EngineConfig::default()).unwrap_err();
    assert_eq!(section_of(&err), Some(Section::Graph));

    let err = read(&bytes[..bytes.len() - 3], registry, EngineConfig::default()).unwrap_err();
    assert_eq!(section_of(&err), Some(Section::FeaturePayload));
}

#[test]
fn test_unregistered_key_fails_in_key_section() {
    let registry = full_registry();
    let mut model = sample_model(Arc::clone(&registry));
    model.compute(RADIUS).unwrap();
    let bytes = to_bytes(&model, &[RADIUS]);

    let builtins = Arc::new(FeatureRegistry::with_builtins());
    let err = read(bytes.as_slice(), builtins, EngineConfig::default()).unwrap_err();
    assert_eq!(section_of(&err), Some(Section::FeatureKeys));
    let Error::Persistence { source, .. } = err else {
        panic!("expected a persistence error");
    };
    assert!(matches!(*source, Error::FeatureNotRegistered(key) if key == RADIUS));
}

#[test]
fn test_key_without_deserializer_fails() {
    let registry = full_registry();
    let mut model = sample_model(Arc::clone(&registry));
    model.compute(RADIUS).unwrap();
    let bytes = to_bytes(&model, &[RADIUS]);

    let mut reader_side = FeatureRegistry::with_builtins();
    reader_side.register(radius_spec(), None).unwrap();
    let err = read(bytes.as_slice(), Arc::new(reader_side), EngineConfig::default())
        .unwrap_err();
    let Error::Persistence { section, source } = err else {
        panic!("expected a persistence error");
    };
    assert_eq!(section, Section::FeatureKeys);
    assert!(matches!(*source, Error::MissingSerializer(_)));
}

#[test]
fn test_payload_with_unknown_id_fails() {
    let registry = full_registry();
    let mut model = sample_model(Arc::clone(&registry));
    model.compute(PHANTOM).unwrap();
    let bytes = to_bytes(&model, &[PHANTOM]);

    let err = read(bytes.as_slice(), registry, EngineConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownPersistentId {
            section: Section::FeaturePayload,
            kind: ElementKind::Vertex,
            id,
        } if id == PersistentId::new(999)
    ));
}

#[test]
fn test_save_and_open_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracks.sgp");
    let registry = full_registry();
    let mut model = sample_model(Arc::clone(&registry));
    model.compute(builtin::LINK_COUNT).unwrap();

    save(&path, &model, &[LINK_COUNT]).unwrap();
    assert!(!dir.path().join("tracks.sgp.tmp").exists());

    let reloaded = open(&path, registry, EngineConfig::default()).unwrap();
    assert_eq!(reloaded.graph().edge_count(), 2);
    assert_eq!(
        reloaded
            .features()
            .value(LINK_COUNT, ElementKind::Vertex, PersistentId::new(1))
            .unwrap(),
        Some(FeatureValue::Integer(2))
    );
}

#[test]
fn test_failed_save_leaves_no_temporary_file() {
    let dir = tempfile::tempdir().unwrap();
    // A non-empty directory cannot be replaced by a file.
    let path = dir.path().join("tracks.sgp");
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("keep"), b"x").unwrap();
    let mut model = sample_model(full_registry());
    model.compute(LINK_COUNT).unwrap();

    let err = save(&path, &model, &[LINK_COUNT]).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(!dir.path().join("tracks.sgp.tmp").exists());
    assert!(path.join("keep").exists());
}

#[test]
fn test_open_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = open(
        dir.path().join("absent.sgp"),
        full_registry(),
        EngineConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
