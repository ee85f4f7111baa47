//! Traversal: BFS, DFS, reachability, topological sort, and strongly
//! connected components.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::{Key, Weight};
use crate::graph::{Graph, GraphError, GraphResult, Vertex};

/// Returned by a visitor to continue or cut the walk early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Break,
}

/// Which arcs a directed walk follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
}

fn step_neighbours<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    v: &K,
    direction: Direction,
) -> GraphResult<Vec<Vertex<K, V>>> {
    if g.is_directed() {
        match direction {
            Direction::Out => g.out_neighbours(v),
            Direction::In => g.in_neighbours(v),
        }
    } else {
        g.neighbours(v)
    }
}

fn walk<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    start: &K,
    direction: Direction,
    depth_first: bool,
    mut visitor: impl FnMut(&Vertex<K, V>) -> Control,
) -> GraphResult<()> {
    let start_v = g.get_vertex(start)?;
    let mut visited: HashSet<K> = HashSet::new();
    let mut pending: VecDeque<Vertex<K, V>> = VecDeque::from([start_v]);

    while let Some(v) = if depth_first {
        pending.pop_back()
    } else {
        pending.pop_front()
    } {
        if !visited.insert(v.key.clone()) {
            continue;
        }
        if visitor(&v) == Control::Break {
            return Ok(());
        }
        for n in step_neighbours(g, &v.key, direction)? {
            if !visited.contains(&n.key) {
                pending.push_back(n);
            }
        }
    }
    Ok(())
}

/// Breadth-first walk from `start`. For directed graphs out-edges are
/// followed; the walk covers one component only.
pub fn bfs<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    start: &K,
    visitor: impl FnMut(&Vertex<K, V>) -> Control,
) -> GraphResult<()> {
    walk(g, start, Direction::Out, false, visitor)
}

/// Breadth-first walk over a directed graph following the chosen direction.
pub fn bfs_directed<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    start: &K,
    direction: Direction,
    visitor: impl FnMut(&Vertex<K, V>) -> Control,
) -> GraphResult<()> {
    if !g.is_directed() {
        return Err(GraphError::NotDigraph);
    }
    walk(g, start, direction, false, visitor)
}

/// Depth-first walk from `start`.
pub fn dfs<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    start: &K,
    visitor: impl FnMut(&Vertex<K, V>) -> Control,
) -> GraphResult<()> {
    walk(g, start, Direction::Out, true, visitor)
}

/// Depth-first walk over a directed graph following the chosen direction.
pub fn dfs_directed<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    start: &K,
    direction: Direction,
    visitor: impl FnMut(&Vertex<K, V>) -> Control,
) -> GraphResult<()> {
    if !g.is_directed() {
        return Err(GraphError::NotDigraph);
    }
    walk(g, start, direction, true, visitor)
}

/// Whether `end` is reachable from `start` (directed path for digraphs).
pub fn connected<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    start: &K,
    end: &K,
) -> GraphResult<bool> {
    let mut found = false;
    dfs(g, start, |v| {
        if v.key == *end {
            found = true;
            Control::Break
        } else {
            Control::Continue
        }
    })?;
    Ok(found)
}

/// Kahn's algorithm. Fails with [`GraphError::NotDAG`] on a cycle.
pub fn topological_sort<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
) -> GraphResult<Vec<Vertex<K, V>>> {
    if !g.is_directed() {
        return Err(GraphError::NotDigraph);
    }
    let mut in_degree: HashMap<K, usize> = HashMap::new();
    for v in g.all_vertexes() {
        in_degree.insert(v.key.clone(), g.in_degree(&v.key)?);
    }

    let mut order = Vec::with_capacity(in_degree.len());
    while !in_degree.is_empty() {
        let ready: Vec<K> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(k, _)| k.clone())
            .collect();
        if ready.is_empty() {
            return Err(GraphError::NotDAG);
        }
        for k in ready {
            order.push(g.get_vertex(&k)?);
            for n in g.out_neighbours(&k)? {
                if let Some(d) = in_degree.get_mut(&n.key) {
                    *d = d.saturating_sub(1);
                }
            }
            in_degree.remove(&k);
        }
    }
    Ok(order)
}

/// Tarjan's algorithm with a recursion-free driver; returns the vertex set
/// of every strongly connected component.
pub fn strongly_connected_components<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
) -> GraphResult<Vec<Vec<K>>> {
    if !g.is_directed() {
        return Err(GraphError::NotDigraph);
    }
    Ok(g.adjacency().strongly_connected_components())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;

    fn digraph(edges: &[(i64, i64)]) -> Graph<i64, (), i64> {
        let mut g = Graph::new_digraph("t");
        let mut vs: Vec<i64> = edges.iter().flat_map(|&(h, t)| [h, t]).collect();
        vs.sort();
        vs.dedup();
        for v in vs {
            g.add_vertex(Vertex::new(v, ())).unwrap();
        }
        for (i, &(h, t)) in edges.iter().enumerate() {
            g.add_edge(Edge::new(1000 + i as i64, h, t, 1)).unwrap();
        }
        g
    }

    #[test]
    fn bfs_visits_component_in_level_order() {
        let g = digraph(&[(1, 2), (1, 3), (2, 4), (3, 4)]);
        let mut seen = Vec::new();
        bfs(&g, &1, |v| {
            seen.push(v.key);
            Control::Continue
        })
        .unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], 1);
        assert_eq!(seen[3], 4);
    }

    #[test]
    fn walk_of_missing_start_fails() {
        let g = digraph(&[(1, 2)]);
        assert!(bfs(&g, &9, |_| Control::Continue).unwrap_err().is_not_exists());
    }

    #[test]
    fn visitor_break_cuts_walk() {
        let g = digraph(&[(1, 2), (2, 3), (3, 4)]);
        let mut count = 0;
        dfs(&g, &1, |_| {
            count += 1;
            if count == 2 {
                Control::Break
            } else {
                Control::Continue
            }
        })
        .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn reverse_direction_walk() {
        let g = digraph(&[(1, 2), (2, 3)]);
        let mut seen = Vec::new();
        bfs_directed(&g, &3, Direction::In, |v| {
            seen.push(v.key);
            Control::Continue
        })
        .unwrap();
        assert_eq!(seen, vec![3, 2, 1]);
    }

    #[test]
    fn reachability() {
        let g = digraph(&[(1, 2), (2, 3)]);
        assert!(connected(&g, &1, &3).unwrap());
        assert!(!connected(&g, &3, &1).unwrap());
    }

    #[test]
    fn topological_order_respects_arcs() {
        let g = digraph(&[(1, 2), (1, 3), (2, 4), (3, 4)]);
        let order: Vec<i64> = topological_sort(&g).unwrap().into_iter().map(|v| v.key).collect();
        let pos = |k: i64| order.iter().position(|&v| v == k).unwrap();
        assert!(pos(1) < pos(2));
        assert!(pos(1) < pos(3));
        assert!(pos(2) < pos(4));
        assert!(pos(3) < pos(4));
    }

    #[test]
    fn cyclic_graph_has_no_topological_order() {
        let g = digraph(&[(1, 2), (2, 3), (3, 1)]);
        assert_eq!(topological_sort(&g).unwrap_err(), GraphError::NotDAG);
    }

    #[test]
    fn scc_on_two_cycles() {
        let g = digraph(&[(1, 2), (2, 1), (2, 3), (3, 4), (4, 3)]);
        let mut comps = strongly_connected_components(&g).unwrap();
        comps.iter_mut().for_each(|c| c.sort());
        comps.sort();
        assert_eq!(comps, vec![vec![1, 2], vec![3, 4]]);
    }
}
