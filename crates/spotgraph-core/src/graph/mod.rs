//! Spatio-temporal graph over pooled records.
//!
//! Provides the [`Graph`] store, read-only record views, and the listener
//! interface through which the undo journal, the feature tracker and external
//! collaborators observe mutations.
//!
//! # Example
//!
//! ```rust
//! use spotgraph_core::graph::{Graph, VertexAttrs};
//!
//! let mut graph = Graph::new();
//! let a = graph.add_vertex(VertexAttrs::new(0, [1.0, 2.0, 3.0], 0.5)).unwrap();
//! let b = graph.add_vertex(VertexAttrs::new(1, [1.5, 2.0, 3.0], 0.5)).unwrap();
//! let link = graph.add_edge(a, b).unwrap();
//!
//! assert_eq!(graph.edge(link).unwrap().target(), b);
//! assert_eq!(graph.vertices_at(1).collect::<Vec<_>>(), vec![b]);
//! ```

mod listener;
mod store;
mod types;
mod view;


pub use listener::{FnListener, GraphEvent, GraphListener, ListenerId};
pub use store::Graph;
pub use types::{AttributeValue, VertexAttrs, VertexField};
pub use view::{Adjacency, EdgeView, VertexView};
