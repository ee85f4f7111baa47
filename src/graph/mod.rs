//! Graph data model: vertices, edges, the adjacency-indexed facade,
//! bipartite specialization, and matrix views.
//!
//! The facade owns every vertex and edge record; callers receive copies.
//! Derived structural properties are computed lazily and cached against the
//! facade's monotonic version counter.

mod adjacency;
mod bipartite;
mod error;
#[allow(clippy::module_inception)]
mod graph;
mod matrix;
mod subgraph;
mod types;

pub use bipartite::{is_bipartite, Bipartite};
pub use error::{GraphError, GraphResult};
pub use graph::Graph;
pub use matrix::{AdjacencyMatrix, DegreeMatrix, WeightMatrix};
pub use subgraph::{contains, induced_subgraph, spanning_subgraph, spanning_supergraph};
pub use types::{Edge, GraphProperty, PropertyValue, Vertex};
