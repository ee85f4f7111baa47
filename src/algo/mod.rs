//! Algorithm suite over the facade's read-only surface.
//!
//! Nothing in here mutates a graph. Each algorithm takes `&Graph` (or
//! `&Bipartite`) and reads entities, adjacency, and cached properties.

mod colouring;
mod flow;
mod matching;
mod path;
mod traverse;
mod tree;

pub use colouring::{edge_colouring, vertex_colouring};
pub use flow::{max_flow, max_flow_edmonds_karp};
pub use matching::{max_matching, max_matching_general, perfect_matching};
pub use path::{all_shortest_paths, shortest_path, shortest_paths, Path};
pub use traverse::{
    bfs, bfs_directed, connected, dfs, dfs_directed, strongly_connected_components,
    topological_sort, Control, Direction,
};
pub use tree::{
    min_weight_spanning_forest, min_weight_spanning_tree, min_weight_spanning_tree_kruskal,
};
