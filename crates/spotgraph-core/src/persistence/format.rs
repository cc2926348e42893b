//! Project stream layout.
//!
//! ```text
//! header          MAGIC (4 bytes) | FORMAT_VERSION (u32 LE)
//! graph           blob: bincode GraphSection
//! feature keys    blob: bincode Vec<String>
//! feature payload one blob per key, in key order:
//!                 serializer payload | vertex DirtySet | edge DirtySet
//! ```
//!
//! A blob is a `u64` little-endian byte length followed by the bytes, so a
//! payload that reads short or long is detected at its own boundary.

use std::fmt;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::VertexAttrs;
use crate::idmap::PersistentId;

/// Stream magic.
pub(crate) const MAGIC: &[u8; 4] = b"SGPJ";

/// Current stream version.
pub(crate) const FORMAT_VERSION: u32 = 1;

/// Section of a project stream, reported with read and write failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Magic and version.
    Header,
    /// Vertices, edges and id counters.
    Graph,
    /// Names of the saved features.
    FeatureKeys,
    /// Values and dirty state of one feature.
    FeaturePayload,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Header => "header",
            Section::Graph => "graph",
            Section::FeatureKeys => "feature keys",
            Section::FeaturePayload => "feature payload",
        };
        f.write_str(name)
    }
}

/// Graph section as stored: elements keyed by persistent id, sorted by id.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct GraphSection {
    pub next_vertex_id: u64,
    pub next_edge_id: u64,
    pub vertices: Vec<(PersistentId, VertexAttrs)>,
    pub edges: Vec<EdgeEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub(crate) struct EdgeEntry {
    pub id: PersistentId,
    pub source: PersistentId,
    pub target: PersistentId,
}

pub(crate) fn write_header(writer: &mut impl Write) -> Result<()> {
    writer.write_all(MAGIC)?;
    writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
    Ok(())
}

pub(crate) fn read_header(reader: &mut impl Read) -> Result<()> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(Error::Corrupted(format!(
            "bad magic {magic:02x?}, expected {MAGIC:02x?}"
        )));
    }
    let mut version = [0u8; 4];
    reader.read_exact(&mut version)?;
    let version = u32::from_le_bytes(version);
    if version != FORMAT_VERSION {
        return Err(Error::Corrupted(format!(
            "unsupported format version {version} (expected {FORMAT_VERSION})"
        )));
    }
    Ok(())
}

pub(crate) fn write_blob(writer: &mut impl Write, bytes: &[u8]) -> Result<()> {
    writer.write_all(&(bytes.len() as u64).to_le_bytes())?;
    writer.write_all(bytes)?;
    Ok(())
}

pub(crate) fn read_blob(reader: &mut impl Read) -> Result<Vec<u8>> {
    let mut len = [0u8; 8];
    reader.read_exact(&mut len)?;
    let len = u64::from_le_bytes(len);

    let mut bytes = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut bytes)?;
    if bytes.len() as u64 != len {
        return Err(Error::Corrupted(format!(
            "blob truncated: expected {len} bytes, found {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}
