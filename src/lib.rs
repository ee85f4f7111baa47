//! Plegma: graphs and a concurrent DAG job engine
//!
//! `plegma` (πλέγμα, Greek for "mesh") is an in-process library with two
//! coupled cores: a typed graph data model and a DAG-driven concurrent job
//! engine. The engine *is* a directed acyclic graph: its topology,
//! acyclicity check, and neighbourhood queries come from the graph model.
//!
//! # Features
//!
//! - **Typed graphs**: directed, undirected, and bipartite graphs over any
//!   hashable key type, with multigraph and loop support
//! - **Cached properties**: simplicity, regularity, acyclicity,
//!   connectivity, and friends, invalidated by a version counter
//! - **Algorithm suite**: traversal, topological sort, SCC, spanning
//!   trees, shortest paths, max-flow, matchings, colouring
//! - **Concurrent execution**: precedence-respecting job scheduling with
//!   retry, timeout, cancellation, pause/resume, and status introspection
//! - **Workflows**: named tasks wired together by typed parameter
//!   references resolved at execution time
//!
//! # Quick start
//!
//! ```no_run
//! use plegma::exec::{ExecGraph, Runner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), plegma::ExecError> {
//!     let eg: ExecGraph<String> = ExecGraph::new("pipeline");
//!     eg.add_job("fetch".into(), Runner::from_fn(|| async { Ok(()) }))?;
//!     eg.add_job("build".into(), Runner::from_fn(|| async { Ok(()) }))?;
//!     eg.add_job("test".into(), Runner::from_fn(|| async { Ok(()) }))?;
//!     eg.add_dependency(&"fetch".into(), &"build".into())?;
//!     eg.add_dependency(&"build".into(), &"test".into())?;
//!
//!     eg.start()?;
//!     eg.wait().await?;
//!     println!("final state: {}", eg.status());
//!     Ok(())
//! }
//! ```
//!
//! # Module organization
//!
//! Each module hides a design decision that is likely to change:
//!
//! - [`core`]: numeric/key capabilities and the indexed priority queue
//!   (hides how decrease-key stays O(log n))
//! - [`graph`]: the data model (hides the adjacency representation and the
//!   property cache)
//! - [`algo`]: the algorithm suite (hides algorithm selection, e.g.
//!   Dijkstra vs Bellman-Ford)
//! - [`exec`]: the engine (hides the scheduling loop and its signalling)
//! - [`workflow`]: parameter wiring on top of [`exec`]

pub mod algo;
pub mod core;
pub mod exec;
pub mod graph;
pub mod workflow;

// Re-export commonly used types for convenience
pub use crate::core::{Key, PriorityQueue, SynthesizeKey, Weight};

pub use graph::{
    is_bipartite, AdjacencyMatrix, Bipartite, DegreeMatrix, Edge, Graph, GraphError,
    GraphProperty, GraphResult, PropertyValue, Vertex, WeightMatrix,
};

pub use algo::{
    all_shortest_paths, bfs, bfs_directed, connected, dfs, dfs_directed, edge_colouring,
    max_flow, max_flow_edmonds_karp, max_matching, max_matching_general,
    min_weight_spanning_forest, min_weight_spanning_tree, min_weight_spanning_tree_kruskal,
    perfect_matching, shortest_path, shortest_paths, strongly_connected_components,
    topological_sort, vertex_colouring, Control, Direction, Path,
};

pub use exec::{BoxError, ExecError, ExecGraph, JobInfo, Runner, State};

pub use workflow::{GeneralTask, Parameter, Task, Workflow, WorkflowError, WorkflowInfo};

/// Prelude module for convenient glob imports
///
/// # Example
///
/// ```
/// use plegma::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{Control, Direction};
    pub use crate::core::Weight;
    pub use crate::exec::{ExecGraph, Runner, State};
    pub use crate::graph::{Bipartite, Edge, Graph, GraphProperty, Vertex};
    pub use crate::workflow::{GeneralTask, Parameter, Workflow};
}
