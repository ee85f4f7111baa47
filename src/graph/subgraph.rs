//! Subgraph construction and inclusion checks, all expressed as
//! clone-then-edit over the facade.

use super::error::GraphResult;
use super::graph::Graph;
use super::types::Edge;
use crate::core::{Key, Weight};

/// Whether `g1` includes `g2` as a subgraph: same orientation kind, every
/// vertex present, and every endpoint pair joined.
pub fn contains<K: Key, V: Clone, W: Weight>(
    g1: &Graph<K, V, W>,
    g2: &Graph<K, V, W>,
) -> GraphResult<bool> {
    if g1.is_directed() != g2.is_directed() {
        return Ok(false);
    }
    for v in g2.all_vertexes() {
        match g1.get_vertex(&v.key) {
            Ok(_) => {}
            Err(e) if e.is_not_exists() => return Ok(false),
            Err(e) => return Err(e),
        }
    }
    for e in g2.all_edges() {
        match g1.get_edge(&e.head, &e.tail) {
            Ok(_) => {}
            Err(err) if err.is_not_exists() => return Ok(false),
            Err(err) => return Err(err),
        }
    }
    Ok(true)
}

/// A spanning subgraph of `g` without the listed endpoint pairs.
pub fn spanning_subgraph<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    edges: &[(K, K)],
) -> GraphResult<Graph<K, V, W>> {
    let mut ng = g.clone();
    for (v1, v2) in edges {
        ng.remove_edge(v1, v2)?;
    }
    Ok(ng)
}

/// A spanning supergraph of `g` with the listed edges added.
pub fn spanning_supergraph<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    edges: &[Edge<K, W>],
) -> GraphResult<Graph<K, V, W>> {
    let mut ng = g.clone();
    for e in edges {
        ng.add_edge(e.clone())?;
    }
    Ok(ng)
}

/// The induced subgraph of `g` without the listed vertices.
pub fn induced_subgraph<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    vertexes: &[K],
) -> GraphResult<Graph<K, V, W>> {
    let mut ng = g.clone();
    for v in vertexes {
        ng.remove_vertex(v)?;
    }
    Ok(ng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::Vertex;

    fn path_graph() -> Graph<i64, (), i64> {
        let mut g = Graph::new_undirected("t");
        for v in 1..=3 {
            g.add_vertex(Vertex::new(v, ())).unwrap();
        }
        g.add_edge(Edge::new(100, 1, 2, 1)).unwrap();
        g.add_edge(Edge::new(101, 2, 3, 1)).unwrap();
        g
    }

    #[test]
    fn inclusion() {
        let g = path_graph();
        let sub = induced_subgraph(&g, &[3]).unwrap();
        assert!(contains(&g, &sub).unwrap());
        assert!(!contains(&sub, &g).unwrap());
    }

    #[test]
    fn spanning_subgraph_keeps_vertices() {
        let g = path_graph();
        let sg = spanning_subgraph(&g, &[(1, 2)]).unwrap();
        assert_eq!(sg.order(), 3);
        assert_eq!(sg.size(), 1);
    }

    #[test]
    fn induced_subgraph_drops_incident_edges() {
        let g = path_graph();
        let ig = induced_subgraph(&g, &[2]).unwrap();
        assert_eq!(ig.order(), 2);
        assert_eq!(ig.size(), 0);
    }
}
