//! Project save and load.
//!
//! A project stream holds the graph keyed by persistent id, then the selected
//! feature keys, then one payload per key with its values and pending dirty
//! state. Slots never appear in the stream, so a reloaded graph may lay out
//! its records differently while keeping every id.
//!
//! Reading rebuilds the graph and its id maps before any feature payload is
//! resolved. Every read failure is reported with the [`Section`] it occurred
//! in.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use spotgraph_core::config::EngineConfig;
//! use spotgraph_core::features::{builtin, FeatureRegistry};
//! use spotgraph_core::graph::VertexAttrs;
//! use spotgraph_core::{persistence, Model};
//!
//! let registry = Arc::new(FeatureRegistry::with_builtins());
//! let mut model = Model::new(Arc::clone(&registry));
//! model.add_vertex(VertexAttrs::new(0, [1.0, 2.0, 3.0], 0.5)).unwrap();
//! model.compute(builtin::POSITION_X).unwrap();
//!
//! let mut bytes = Vec::new();
//! persistence::write(&model, &[builtin::POSITION_X], &mut bytes).unwrap();
//!
//! let reloaded = persistence::read(bytes.as_slice(), registry, EngineConfig::default()).unwrap();
//! assert_eq!(reloaded.graph().vertex_count(), 1);
//! assert!(reloaded.dirty(builtin::POSITION_X).unwrap().is_empty());
//! ```

mod format;

#[cfg(test)]
mod tests;

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexSet;

use self::format::{EdgeEntry, GraphSection};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::features::{DirtySet, FeatureRegistry, FeatureSerializer};
use crate::graph::Graph;
use crate::handle::{ElementKind, VertexHandle};
use crate::idmap::PersistentId;
use crate::model::Model;

pub use format::Section;

/// Writes `model` and the features named in `keys` to `writer`.
///
/// The whole stream is assembled in memory first; nothing reaches `writer`
/// unless every section encodes.
///
/// # Errors
///
/// - `Error::FeatureNotRegistered` or `Error::MissingSerializer` if a key
///   cannot be serialized. Every key is checked for these before any
///   declaration.
/// - `Error::FeatureNotDeclared` if a key was never declared on the model.
/// - `Error::Persistence` if a section fails to encode or the write fails.
pub fn write<W: Write>(model: &Model, keys: &[&str], mut writer: W) -> Result<()> {
    let keys: IndexSet<&str> = keys.iter().copied().collect();
    let registry = model.registry();
    let serializers = keys
        .iter()
        .map(|key| registry.serializer(key))
        .collect::<Result<Vec<_>>>()?;
    for key in &keys {
        model.features().state(key)?;
    }

    let mut buf = Vec::new();
    format::write_header(&mut buf).map_err(|err| Error::in_section(Section::Header, err))?;

    encode_graph(model.graph())
        .and_then(|section| Ok(bincode::serialize(&section)?))
        .and_then(|bytes| format::write_blob(&mut buf, &bytes))
        .map_err(|err| Error::in_section(Section::Graph, err))?;

    let names: Vec<&str> = keys.iter().copied().collect();
    bincode::serialize(&names)
        .map_err(Error::from)
        .and_then(|bytes| format::write_blob(&mut buf, &bytes))
        .map_err(|err| Error::in_section(Section::FeatureKeys, err))?;

    for (key, serializer) in keys.iter().zip(&serializers) {
        encode_payload(model, key, *serializer)
            .and_then(|bytes| format::write_blob(&mut buf, &bytes))
            .map_err(|err| Error::in_section(Section::FeaturePayload, err))?;
    }

    writer.write_all(&buf)?;
    writer.flush()?;
    tracing::info!(
        vertices = model.graph().vertex_count(),
        edges = model.graph().edge_count(),
        features = keys.len(),
        bytes = buf.len(),
        "project written"
    );
    Ok(())
}

/// Reads a project stream into a new model.
///
/// # Errors
///
/// Returns `Error::Persistence` naming the failing section, wrapping the
/// cause (`Error::Corrupted`, `Error::FeatureNotRegistered`,
/// `Error::MissingSerializer`, `Error::IdCollision`, I/O and decoding
/// errors), or `Error::UnknownPersistentId` when a feature payload or edge
/// refers to an id that is not in the rebuilt graph.
pub fn read<R: Read>(
    mut reader: R,
    registry: Arc<FeatureRegistry>,
    config: EngineConfig,
) -> Result<Model> {
    in_section(Section::Header, format::read_header(&mut reader))?;

    let mut model = Model::with_config(Arc::clone(&registry), config);
    let graph = in_section(Section::Graph, decode_graph_section(&mut reader))?;
    in_section(Section::Graph, rebuild_graph(model.graph_mut(), graph))?;

    let keys = in_section(Section::FeatureKeys, read_keys(&mut reader, &registry))?;
    for (key, serializer) in &keys {
        in_section(
            Section::FeaturePayload,
            restore_payload(&mut model, &mut reader, key, *serializer),
        )?;
    }

    tracing::info!(
        vertices = model.graph().vertex_count(),
        edges = model.graph().edge_count(),
        features = keys.len(),
        "project read"
    );
    Ok(model)
}

/// Saves a project to `path`, replacing it only once the full stream is on disk.
///
/// # Errors
///
/// See [`write`]; also returns `Error::Io` if the file cannot be written.
/// The temporary file is removed again when writing or renaming fails.
pub fn save(path: impl AsRef<Path>, model: &Model, keys: &[&str]) -> Result<()> {
    let path = path.as_ref();
    let mut buf = Vec::new();
    write(model, keys, &mut buf)?;

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);
    let written =
        std::fs::write(&temp_path, &buf).and_then(|()| std::fs::rename(&temp_path, path));
    if let Err(err) = written {
        match std::fs::remove_file(&temp_path) {
            Err(cleanup) if cleanup.kind() != std::io::ErrorKind::NotFound => tracing::warn!(
                path = %temp_path.display(),
                error = %cleanup,
                "cannot remove temporary project file"
            ),
            _ => {}
        }
        return Err(err.into());
    }
    tracing::debug!(path = %path.display(), "project saved");
    Ok(())
}

/// Opens a project saved with [`save`].
///
/// # Errors
///
/// See [`read`]; also returns `Error::Io` if the file cannot be opened.
pub fn open(
    path: impl AsRef<Path>,
    registry: Arc<FeatureRegistry>,
    config: EngineConfig,
) -> Result<Model> {
    let file = std::fs::File::open(path.as_ref())?;
    read(std::io::BufReader::new(file), registry, config)
}

// ── Writing ────────────────────────────────────────────────────────────

fn encode_graph(graph: &Graph) -> Result<GraphSection> {
    let ids = graph.ids();

    let mut vertices = Vec::with_capacity(graph.vertex_count());
    for id in ids.vertices().sorted_ids() {
        let v = graph
            .vertex_by_id(id)
            .ok_or_else(|| Error::IllegalGraphState(format!("vertex id {id} has no slot")))?;
        vertices.push((id, graph.vertex(v)?.attrs()));
    }

    let mut edges = Vec::with_capacity(graph.edge_count());
    for id in ids.edges().sorted_ids() {
        let e = graph
            .edge_by_id(id)
            .ok_or_else(|| Error::IllegalGraphState(format!("edge id {id} has no slot")))?;
        let edge = graph.edge(e)?;
        edges.push(EdgeEntry {
            id,
            source: graph.vertex_id(edge.source())?,
            target: graph.vertex_id(edge.target())?,
        });
    }

    Ok(GraphSection {
        next_vertex_id: ids.vertices().next_id(),
        next_edge_id: ids.edges().next_id(),
        vertices,
        edges,
    })
}

fn encode_payload(model: &Model, key: &str, serializer: &dyn FeatureSerializer) -> Result<Vec<u8>> {
    let state = model.features().state(key)?;
    let mut bytes = Vec::new();
    serializer.serialize(&state.values, &mut bytes)?;
    state.vertex_dirty.write_to(&mut bytes)?;
    state.edge_dirty.write_to(&mut bytes)?;
    Ok(bytes)
}

// ── Reading ────────────────────────────────────────────────────────────

/// Wraps an error with `section` unless it already names one.
fn in_section<T>(section: Section, result: Result<T>) -> Result<T> {
    result.map_err(|err| match err {
        Error::Persistence { .. } | Error::UnknownPersistentId { .. } => err,
        err => Error::in_section(section, err),
    })
}

fn decode_graph_section(reader: &mut impl Read) -> Result<GraphSection> {
    let bytes = format::read_blob(reader)?;
    Ok(bincode::deserialize(&bytes)?)
}

fn rebuild_graph(graph: &mut Graph, section: GraphSection) -> Result<()> {
    for (id, attrs) in section.vertices {
        graph.add_vertex_with_id(id, attrs, &mut ())?;
    }
    for edge in &section.edges {
        let source = resolve_vertex(graph, edge.source)?;
        let target = resolve_vertex(graph, edge.target)?;
        graph.add_edge_with_id(edge.id, source, target, &mut ())?;
    }
    graph.reserve_ids(section.next_vertex_id, section.next_edge_id);
    tracing::debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "graph section rebuilt"
    );
    Ok(())
}

fn resolve_vertex(graph: &Graph, id: PersistentId) -> Result<VertexHandle> {
    graph
        .vertex_by_id(id)
        .ok_or(Error::UnknownPersistentId {
            section: Section::Graph,
            kind: ElementKind::Vertex,
            id,
        })
}

/// Reads the key list and resolves every key before any payload is touched.
fn read_keys<'r>(
    reader: &mut impl Read,
    registry: &'r FeatureRegistry,
) -> Result<Vec<(String, &'r dyn FeatureSerializer)>> {
    let bytes = format::read_blob(reader)?;
    let keys: Vec<String> = bincode::deserialize(&bytes)?;
    keys.into_iter()
        .map(|key| {
            let serializer = registry.serializer(&key)?;
            Ok((key, serializer))
        })
        .collect()
}

fn restore_payload(
    model: &mut Model,
    reader: &mut impl Read,
    key: &str,
    serializer: &dyn FeatureSerializer,
) -> Result<()> {
    let bytes = format::read_blob(reader)?;
    let mut cursor = bytes.as_slice();
    let values = serializer.deserialize(&mut cursor)?;
    let vertex_dirty = DirtySet::read_from(&mut cursor)?;
    let edge_dirty = DirtySet::read_from(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(Error::Corrupted(format!(
            "{} trailing bytes in payload of feature '{key}'",
            cursor.len()
        )));
    }

    let graph = model.graph();
    check_ids(
        graph,
        ElementKind::Vertex,
        values.vertices.keys().copied().chain(vertex_dirty.ids()),
    )?;
    check_ids(
        graph,
        ElementKind::Edge,
        values.edges.keys().copied().chain(edge_dirty.ids()),
    )?;

    tracing::debug!(
        key,
        values = values.len(),
        dirty = vertex_dirty.ids().count() + edge_dirty.ids().count(),
        "feature payload restored"
    );
    model
        .features_mut()
        .restore(key, values, vertex_dirty, edge_dirty)
}

fn check_ids(
    graph: &Graph,
    kind: ElementKind,
    ids: impl IntoIterator<Item = PersistentId>,
) -> Result<()> {
    let known = graph.ids().of(kind);
    match ids.into_iter().find(|id| !known.contains(*id)) {
        Some(id) => Err(Error::UnknownPersistentId {
            section: Section::FeaturePayload,
            kind,
            id,
        }),
        None => Ok(()),
    }
}
