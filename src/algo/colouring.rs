//! Backtracking vertex and edge colouring.
//!
//! Palettes below the trivial lower bound are rejected up front: a vertex
//! colouring needs at least the maximum degree, an edge colouring at least
//! the maximum degree plus one.

use std::collections::HashMap;

use crate::core::{Key, Weight};
use crate::graph::{Graph, GraphError, GraphResult};

/// A feasible vertex colouring with colours `1..=colours`, keyed by vertex.
pub fn vertex_colouring<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    colours: usize,
) -> GraphResult<HashMap<K, usize>> {
    if g.order() == 0 {
        return Ok(HashMap::new());
    }
    if colours < g.max_degree() {
        return Err(GraphError::NoColouring);
    }
    if g.has_loop() {
        return Err(GraphError::NoColouring);
    }

    let order: Vec<K> = g.all_vertexes().into_iter().map(|v| v.key).collect();
    let mut assigned = HashMap::new();
    if colour_vertex(g, &order, 0, colours, &mut assigned)? {
        Ok(assigned)
    } else {
        Err(GraphError::NoColouring)
    }
}

fn colour_vertex<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    order: &[K],
    i: usize,
    colours: usize,
    assigned: &mut HashMap<K, usize>,
) -> GraphResult<bool> {
    let v = match order.get(i) {
        Some(v) => v,
        None => return Ok(true),
    };
    let neighbours = g.neighbours(v)?;
    for c in 1..=colours {
        let safe = neighbours.iter().all(|n| assigned.get(&n.key) != Some(&c));
        if safe {
            assigned.insert(v.clone(), c);
            if colour_vertex(g, order, i + 1, colours, assigned)? {
                return Ok(true);
            }
            assigned.remove(v);
        }
    }
    Ok(false)
}

/// A feasible edge colouring with colours `1..=colours`, keyed by edge.
pub fn edge_colouring<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    colours: usize,
) -> GraphResult<HashMap<K, usize>> {
    if g.size() == 0 {
        return Ok(HashMap::new());
    }
    if colours < g.max_degree() + 1 {
        return Err(GraphError::NoColouring);
    }

    let order: Vec<K> = g.all_edges().into_iter().map(|e| e.key).collect();
    let mut assigned = HashMap::new();
    if colour_edge(g, &order, 0, colours, &mut assigned)? {
        Ok(assigned)
    } else {
        Err(GraphError::NoColouring)
    }
}

fn colour_edge<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    order: &[K],
    i: usize,
    colours: usize,
    assigned: &mut HashMap<K, usize>,
) -> GraphResult<bool> {
    let e = match order.get(i) {
        Some(e) => e,
        None => return Ok(true),
    };
    let adjacent = g.neighbour_edges_by_key(e)?;
    for c in 1..=colours {
        let safe = adjacent.iter().all(|a| assigned.get(&a.key) != Some(&c));
        if safe {
            assigned.insert(e.clone(), c);
            if colour_edge(g, order, i + 1, colours, assigned)? {
                return Ok(true);
            }
            assigned.remove(e);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Vertex};

    fn cycle(n: i64) -> Graph<i64, (), i64> {
        let mut g = Graph::new_undirected("t");
        for v in 0..n {
            g.add_vertex(Vertex::new(v, ())).unwrap();
        }
        for v in 0..n {
            g.add_edge(Edge::new(1000 + v, v, (v + 1) % n, 1)).unwrap();
        }
        g
    }

    fn check_vertex_colouring(g: &Graph<i64, (), i64>, colouring: &HashMap<i64, usize>) {
        for e in g.all_edges() {
            assert_ne!(colouring[&e.head], colouring[&e.tail]);
        }
    }

    #[test]
    fn even_cycle_takes_two_colours() {
        let g = cycle(4);
        let colouring = vertex_colouring(&g, 2).unwrap();
        check_vertex_colouring(&g, &colouring);
    }

    #[test]
    fn odd_cycle_needs_three() {
        let g = cycle(5);
        assert_eq!(vertex_colouring(&g, 2).unwrap_err(), GraphError::NoColouring);
        let colouring = vertex_colouring(&g, 3).unwrap();
        check_vertex_colouring(&g, &colouring);
    }

    #[test]
    fn palette_below_degree_bound_rejected() {
        let mut g: Graph<i64, (), i64> = Graph::new_undirected("t");
        for v in 0..4 {
            g.add_vertex(Vertex::new(v, ())).unwrap();
        }
        // star: centre 0 with degree 3
        for v in 1..4 {
            g.add_edge(Edge::new(1000 + v, 0, v, 1)).unwrap();
        }
        assert_eq!(vertex_colouring(&g, 2).unwrap_err(), GraphError::NoColouring);
        assert!(vertex_colouring(&g, 3).is_ok());
    }

    #[test]
    fn edge_colouring_keeps_incident_edges_distinct() {
        let g = cycle(4);
        let colouring = edge_colouring(&g, 3).unwrap();
        for e in g.all_edges() {
            for n in g.neighbour_edges_by_key(&e.key).unwrap() {
                assert_ne!(colouring[&e.key], colouring[&n.key]);
            }
        }
        assert_eq!(edge_colouring(&g, 2).unwrap_err(), GraphError::NoColouring);
    }
}
