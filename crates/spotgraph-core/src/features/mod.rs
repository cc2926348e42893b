//! Feature cache with incremental, dependency-aware recompute.
//!
//! A feature is a per-vertex and/or per-edge value computed from the graph.
//! Features are registered once in a [`FeatureRegistry`] and declared on a
//! document's [`FeatureModel`], which then tracks dirty ids from graph
//! mutation events so that [`FeatureModel::compute`] only evaluates what
//! changed since the last computation.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use spotgraph_core::features::{builtin, FeatureModel, FeatureRegistry};
//! use spotgraph_core::graph::{Graph, VertexAttrs};
//!
//! let registry = Arc::new(FeatureRegistry::with_builtins());
//! let mut features = FeatureModel::new(registry);
//! let mut graph = Graph::new();
//! graph.add_vertex(VertexAttrs::new(0, [4.0, 0.0, 0.0], 1.0)).unwrap();
//!
//! let first = features.compute(builtin::POSITION_X, &graph).unwrap();
//! assert_eq!(first.len(), 1);
//! assert!(features.compute(builtin::POSITION_X, &graph).unwrap().is_empty());
//! ```

pub mod builtin;
mod definition;
mod dirty;
mod model;
mod registry;
mod serializer;
mod value;


pub use definition::{DependencyScope, EdgeComputer, FeatureSpec, VertexComputer};
pub use dirty::DirtySet;
pub use model::{ComputeOutcome, FeatureModel, PendingChanges};
pub use registry::{FeatureRegistry, RegisteredFeature};
pub use serializer::{BincodeFeatureSerializer, FeatureSerializer};
pub use value::{FeatureMap, FeatureMaps, FeatureValue};
