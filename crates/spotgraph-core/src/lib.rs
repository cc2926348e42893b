//! # `spotgraph` Core
//!
//! In-process storage engine for very large, mutable spatio-temporal graphs:
//! spots (vertices) tracked over time points and the links (edges) between
//! them.
//!
//! ## Features
//!
//! - **Pooled records**: fixed-size vertex and edge records in chunked pools
//!   with free-list reuse and generation-checked handles
//! - **Stable ids**: persistent ids independent of pool layout, kept across
//!   slot reuse and save/reload
//! - **Undo/redo**: a bounded journal of reversible edits grouped into steps
//! - **Incremental features**: per-feature dirty tracking so recompute only
//!   touches what changed, including across saved sessions
//! - **Persistence**: a sectioned binary project stream keyed by persistent id
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use spotgraph_core::features::{builtin, FeatureRegistry};
//! use spotgraph_core::graph::VertexAttrs;
//! use spotgraph_core::Model;
//!
//! fn main() -> spotgraph_core::Result<()> {
//!     let mut model = Model::new(Arc::new(FeatureRegistry::with_builtins()));
//!
//!     let a = model.add_vertex(VertexAttrs::new(0, [1.0, 2.0, 0.0], 0.5))?;
//!     let b = model.add_vertex(VertexAttrs::new(1, [1.5, 2.1, 0.0], 0.5))?;
//!     model.add_edge(a, b)?;
//!
//!     let computed = model.compute(builtin::POSITION_X)?;
//!     assert_eq!(computed.vertices.len(), 2);
//!
//!     model.move_vertex(b, 0, 3.0)?;
//!     let recomputed = model.compute(builtin::POSITION_X)?;
//!     assert_eq!(recomputed.vertices.len(), 1);
//!
//!     model.undo()?;
//!     assert_eq!(model.graph().vertex(b)?.x(), 1.5);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
// Clippy lints configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(
    test,
    allow(
        clippy::float_cmp,
        clippy::doc_markdown,
        clippy::uninlined_format_args,
        clippy::cast_lossless
    )
)]

pub mod config;
#[cfg(test)]
mod config_tests;
pub mod error;
pub mod features;
pub mod graph;
pub mod handle;
pub mod idmap;
#[cfg(test)]
mod idmap_tests;
pub mod journal;
pub mod model;
pub mod persistence;
pub mod pool;

pub use config::{ConfigError, EngineConfig, LoggingConfig, PoolConfig, UndoConfig};
pub use error::{Error, Result};
pub use features::{FeatureRegistry, FeatureSpec, FeatureValue};
pub use graph::{Graph, GraphEvent, GraphListener, VertexAttrs};
pub use handle::{EdgeHandle, ElementKind, VertexHandle};
pub use idmap::PersistentId;
pub use journal::UndoJournal;
pub use model::{Model, SharedModel};
