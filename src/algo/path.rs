//! Shortest paths: Dijkstra with the indexed priority queue, Bellman-Ford
//! for negative weights, Floyd-Warshall for all pairs.
//!
//! The single-source entry points consult the facade's cached
//! negative-weight property to pick the algorithm, so Dijkstra is never
//! silently run on a graph with negative weights.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::{Key, PriorityQueue, Weight};
use crate::graph::{Edge, Graph, GraphError, GraphResult, WeightMatrix};

/// A path from `source` to `target`: the edge keys in order and the summed
/// weight. An unreachable target carries the weight type's maximum sentinel
/// and no edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path<K, W> {
    pub source: K,
    pub target: K,
    pub edges: Vec<K>,
    pub weight: W,
}

/// The shortest path between two vertices. Negative weights are allowed;
/// a reachable negative cycle fails with
/// [`GraphError::HasNegativeCycle`].
pub fn shortest_path<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    source: &K,
    target: &K,
) -> GraphResult<Path<K, W>> {
    if !g.contains_vertex(target) {
        return Err(GraphError::VertexNotExists);
    }
    let mut paths = if g.has_negative_weight() {
        bellman_ford(g, source, Some(target))?
    } else {
        dijkstra(g, source, Some(target))?
    };
    let found = paths
        .drain(..)
        .find(|p| p.target == *target)
        .ok_or(GraphError::VertexNotExists);
    found
}

/// Shortest paths from `source` to every other vertex.
pub fn shortest_paths<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    source: &K,
) -> GraphResult<Vec<Path<K, W>>> {
    if g.has_negative_weight() {
        bellman_ford(g, source, None)
    } else {
        dijkstra(g, source, None)
    }
}

/// The minimum-weight edge between two endpoints, honouring direction for
/// digraphs.
fn min_weight_edge<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    u: &K,
    v: &K,
) -> Option<Edge<K, W>> {
    let candidates = g.get_edge(u, v).ok()?;
    candidates
        .into_iter()
        .filter(|e| !g.is_directed() || (e.head == *u && e.tail == *v))
        .min_by(|a, b| {
            a.weight
                .partial_cmp(&b.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

fn dijkstra<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    source: &K,
    target: Option<&K>,
) -> GraphResult<Vec<Path<K, W>>> {
    if !g.contains_vertex(source) {
        return Err(GraphError::VertexNotExists);
    }
    let maxw = W::max_value();
    let vertexes = g.all_vertexes();

    let mut queue: PriorityQueue<K, (), W> = PriorityQueue::new(|a: &W, b: &W| a < b);
    for v in &vertexes {
        let d = if v.key == *source { W::zero() } else { maxw };
        queue.push(v.key.clone(), (), d);
    }

    // predecessor vertex and the edge taken into each settled vertex
    let mut trace: HashMap<K, (K, K)> = HashMap::new();
    let mut dist: HashMap<K, W> = HashMap::new();
    let mut visited: HashSet<K> = HashSet::new();

    while let Some((u, _, du)) = queue.pop() {
        visited.insert(u.clone());
        dist.insert(u.clone(), du);
        if target == Some(&u) {
            break;
        }
        if du == maxw {
            continue; // unreachable frontier
        }
        let arcs = if g.is_directed() {
            g.out_edges(&u)?
        } else {
            g.incident_edges(&u)?
        };
        for e in arcs {
            let v = if e.head == u { e.tail.clone() } else { e.head.clone() };
            if v == u || visited.contains(&v) {
                continue;
            }
            if e.weight < maxw {
                let candidate = du + e.weight;
                if queue.priority(&v).map(|&p| candidate < p).unwrap_or(false) {
                    queue.update(&v, candidate);
                    trace.insert(v.clone(), (u.clone(), e.key.clone()));
                }
            }
        }
    }

    Ok(build_paths(source, &trace, &dist, &vertexes, target, maxw))
}

fn bellman_ford<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    source: &K,
    target: Option<&K>,
) -> GraphResult<Vec<Path<K, W>>> {
    if !g.contains_vertex(source) {
        return Err(GraphError::VertexNotExists);
    }
    let maxw = W::max_value();
    let vertexes = g.all_vertexes();
    let edges = g.all_edges();

    let mut dist: HashMap<K, W> = vertexes
        .iter()
        .map(|v| {
            let d = if v.key == *source { W::zero() } else { maxw };
            (v.key.clone(), d)
        })
        .collect();
    let mut trace: HashMap<K, (K, K)> = HashMap::new();

    let relax = |dist: &mut HashMap<K, W>,
                 trace: &mut HashMap<K, (K, K)>,
                 from: &K,
                 to: &K,
                 e: &Edge<K, W>| {
        let du = dist[from];
        if du < maxw && e.weight < maxw {
            let candidate = du + e.weight;
            if candidate < dist[to] {
                dist.insert(to.clone(), candidate);
                trace.insert(to.clone(), (from.clone(), e.key.clone()));
            }
        }
    };

    for _ in 1..vertexes.len().max(1) {
        for e in &edges {
            relax(&mut dist, &mut trace, &e.head, &e.tail, e);
            if !g.is_directed() {
                relax(&mut dist, &mut trace, &e.tail, &e.head, e);
            }
        }
    }

    let improves = |from: &K, to: &K, w: W| {
        let du = dist[from];
        du < maxw && w < maxw && du + w < dist[to]
    };
    for e in &edges {
        if improves(&e.head, &e.tail, e.weight)
            || (!g.is_directed() && improves(&e.tail, &e.head, e.weight))
        {
            return Err(GraphError::HasNegativeCycle);
        }
    }

    Ok(build_paths(source, &trace, &dist, &vertexes, target, maxw))
}

fn build_paths<K: Key, V: Clone, W: Weight>(
    source: &K,
    trace: &HashMap<K, (K, K)>,
    dist: &HashMap<K, W>,
    vertexes: &[crate::graph::Vertex<K, V>],
    target: Option<&K>,
    maxw: W,
) -> Vec<Path<K, W>> {
    let mut paths = Vec::new();
    for v in vertexes {
        if v.key == *source {
            continue;
        }
        if let Some(t) = target {
            if v.key != *t {
                continue;
            }
        }
        let weight = dist.get(&v.key).copied().unwrap_or(maxw);
        let mut edges = Vec::new();
        if weight < maxw {
            let mut cur = &v.key;
            while let Some((prev, edge)) = trace.get(cur) {
                edges.push(edge.clone());
                cur = prev;
            }
            edges.reverse();
        }
        paths.push(Path {
            source: source.clone(),
            target: v.key.clone(),
            edges,
            weight,
        });
    }
    paths
}

/// All-pairs shortest paths via Floyd-Warshall over the weight matrix.
/// Unreachable pairs carry the maximum sentinel. Requires a simple graph
/// (the weight matrix does).
pub fn all_shortest_paths<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
) -> GraphResult<Vec<Path<K, W>>> {
    let wm = WeightMatrix::new(g)?;
    let maxw = W::max_value();
    let mut d = wm.weights(maxw);
    let cols = wm.columns().to_vec();
    let n = cols.len();

    // prev[i][j]: the second-to-last vertex index on the best i -> j path
    let mut prev = vec![vec![0usize; n]; n];
    for (i, row) in d.iter().enumerate() {
        for (j, &w) in row.iter().enumerate() {
            if w < maxw {
                prev[i][j] = i;
            }
        }
        prev[i][i] = i;
    }

    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                if d[i][k] < maxw && d[k][j] < maxw {
                    let through = d[i][k] + d[k][j];
                    if through < d[i][j] {
                        d[i][j] = through;
                        prev[i][j] = prev[k][j];
                    }
                }
            }
        }
    }

    let mut paths = Vec::new();
    for i in 0..n {
        let start = if g.is_directed() { 0 } else { i + 1 };
        for j in start..n {
            if i == j {
                continue;
            }
            let mut edges = Vec::new();
            if d[i][j] < maxw {
                let mut t = j;
                let mut h = prev[i][j];
                loop {
                    if let Some(e) = min_weight_edge(g, &cols[h], &cols[t]) {
                        edges.push(e.key);
                    }
                    if h == i {
                        break;
                    }
                    t = h;
                    h = prev[i][h];
                }
                edges.reverse();
            }
            paths.push(Path {
                source: cols[i].clone(),
                target: cols[j].clone(),
                edges,
                weight: d[i][j],
            });
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Vertex;

    fn weighted(directed: bool, edges: &[(i64, i64, i64)]) -> Graph<i64, (), i64> {
        let mut g = Graph::new(directed, "t");
        let mut vs: Vec<i64> = edges.iter().flat_map(|&(h, t, _)| [h, t]).collect();
        vs.sort();
        vs.dedup();
        for v in vs {
            g.add_vertex(Vertex::new(v, ())).unwrap();
        }
        for (i, &(h, t, w)) in edges.iter().enumerate() {
            g.add_edge(Edge::new(1000 + i as i64, h, t, w)).unwrap();
        }
        g
    }

    #[test]
    fn dijkstra_on_positive_weights() {
        let g = weighted(
            false,
            &[(1, 2, 7), (1, 3, 9), (1, 6, 14), (2, 3, 10), (2, 4, 15), (3, 4, 11), (3, 6, 2), (4, 5, 6), (5, 6, 9)],
        );
        let p = shortest_path(&g, &1, &5).unwrap();
        assert_eq!(p.weight, 20); // 1-3-6-5
        assert_eq!(p.edges.len(), 3);
    }

    #[test]
    fn unreachable_target_is_max_sentinel() {
        let g = weighted(true, &[(1, 2, 1), (3, 4, 1)]);
        let p = shortest_path(&g, &1, &4).unwrap();
        assert_eq!(p.weight, i64::MAX);
        assert!(p.edges.is_empty());
    }

    #[test]
    fn negative_edge_without_cycle_uses_bellman_ford() {
        let g = weighted(true, &[(1, 2, 4), (1, 3, 5), (2, 4, -3), (3, 4, 2)]);
        assert!(g.has_negative_weight());
        let p = shortest_path(&g, &1, &4).unwrap();
        assert_eq!(p.weight, 1); // 1 -> 2 -> 4
        assert_eq!(p.edges.len(), 2);
    }

    #[test]
    fn negative_cycle_detected() {
        let g = weighted(true, &[(1, 2, 1), (2, 3, -5), (3, 1, 1), (3, 4, 10)]);
        assert_eq!(
            shortest_path(&g, &1, &4).unwrap_err(),
            GraphError::HasNegativeCycle
        );
    }

    #[test]
    fn single_source_covers_all_targets() {
        let g = weighted(false, &[(1, 2, 1), (2, 3, 2), (1, 3, 5)]);
        let paths = shortest_paths(&g, &1).unwrap();
        assert_eq!(paths.len(), 2);
        let to3 = paths.iter().find(|p| p.target == 3).unwrap();
        assert_eq!(to3.weight, 3); // 1-2-3 beats the direct 5
    }

    #[test]
    fn floyd_warshall_all_pairs() {
        let g = weighted(true, &[(1, 2, 3), (2, 3, 1), (1, 3, 10)]);
        let paths = all_shortest_paths(&g).unwrap();
        let p13 = paths
            .iter()
            .find(|p| p.source == 1 && p.target == 3)
            .unwrap();
        assert_eq!(p13.weight, 4);
        assert_eq!(p13.edges.len(), 2);
        let p31 = paths
            .iter()
            .find(|p| p.source == 3 && p.target == 1)
            .unwrap();
        assert_eq!(p31.weight, i64::MAX);
    }
}
