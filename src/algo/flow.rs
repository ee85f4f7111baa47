//! Maximum flow over directed graphs: Dinic by default, Edmonds-Karp as an
//! alternative. Edge weights are read as arc capacities.

use std::collections::{HashMap, VecDeque};

use crate::core::{Key, Weight};
use crate::graph::{Graph, GraphError, GraphResult};

struct Residual<W> {
    /// Arcs in pairs: arc `i` and its reverse `i ^ 1`.
    arcs: Vec<(usize, W)>,
    adj: Vec<Vec<usize>>,
    source: usize,
    sink: usize,
}

fn build_residual<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    source: &K,
    sink: &K,
) -> GraphResult<Residual<W>> {
    if !g.is_directed() {
        return Err(GraphError::NotDigraph);
    }
    let keys: Vec<K> = g.all_vertexes().into_iter().map(|v| v.key).collect();
    let idx: HashMap<&K, usize> = keys.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let s = *idx.get(source).ok_or(GraphError::VertexNotExists)?;
    let t = *idx.get(sink).ok_or(GraphError::VertexNotExists)?;

    let mut arcs = Vec::new();
    let mut adj = vec![Vec::new(); keys.len()];
    for e in g.all_edges() {
        let (u, v) = (idx[&e.head], idx[&e.tail]);
        adj[u].push(arcs.len());
        arcs.push((v, e.weight));
        adj[v].push(arcs.len());
        arcs.push((u, W::zero()));
    }
    Ok(Residual {
        arcs,
        adj,
        source: s,
        sink: t,
    })
}

/// BFS labels every vertex with its level in the residual network; returns
/// false when the sink is unreachable.
fn assign_levels<W: Weight>(r: &Residual<W>, level: &mut [i64]) -> bool {
    level.fill(-1);
    level[r.source] = 0;
    let mut queue = VecDeque::from([r.source]);
    while let Some(u) = queue.pop_front() {
        for &i in &r.adj[u] {
            let (to, cap) = r.arcs[i];
            if cap > W::zero() && level[to] < 0 {
                level[to] = level[u] + 1;
                queue.push_back(to);
            }
        }
    }
    level[r.sink] >= 0
}

/// Augments along the level graph; the per-vertex `iter` pointers skip arcs
/// that are already exhausted so each arc is scanned once per phase.
fn push_flow<W: Weight>(
    r: &mut Residual<W>,
    u: usize,
    limit: W,
    level: &[i64],
    iter: &mut [usize],
) -> W {
    if u == r.sink {
        return limit;
    }
    while iter[u] < r.adj[u].len() {
        let i = r.adj[u][iter[u]];
        let (to, cap) = r.arcs[i];
        if cap > W::zero() && level[to] == level[u] + 1 {
            let narrowed = if cap < limit { cap } else { limit };
            let pushed = push_flow(r, to, narrowed, level, iter);
            if pushed > W::zero() {
                r.arcs[i].1 = r.arcs[i].1 - pushed;
                r.arcs[i ^ 1].1 = r.arcs[i ^ 1].1 + pushed;
                return pushed;
            }
        }
        iter[u] += 1;
    }
    W::zero()
}

/// Maximum flow from `source` to `sink` via Dinic's algorithm.
pub fn max_flow<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    source: &K,
    sink: &K,
) -> GraphResult<W> {
    let mut r = build_residual(g, source, sink)?;
    if r.source == r.sink {
        return Ok(W::zero());
    }
    let n = r.adj.len();
    let s = r.source;
    let mut level = vec![-1i64; n];
    let mut total = W::zero();

    while assign_levels(&r, &mut level) {
        let mut iter = vec![0usize; n];
        loop {
            let pushed = push_flow(&mut r, s, W::max_value(), &level, &mut iter);
            if pushed == W::zero() {
                break;
            }
            total = total + pushed;
        }
    }
    Ok(total)
}

/// Maximum flow via Edmonds-Karp (BFS augmenting paths).
pub fn max_flow_edmonds_karp<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    source: &K,
    sink: &K,
) -> GraphResult<W> {
    let mut r = build_residual(g, source, sink)?;
    if r.source == r.sink {
        return Ok(W::zero());
    }
    let n = r.adj.len();
    let mut total = W::zero();

    loop {
        // shortest augmenting path by arc index
        let mut parent_arc = vec![usize::MAX; n];
        let mut visited = vec![false; n];
        visited[r.source] = true;
        let mut queue = VecDeque::from([r.source]);
        while let Some(u) = queue.pop_front() {
            if u == r.sink {
                break;
            }
            for &i in &r.adj[u] {
                let (to, cap) = r.arcs[i];
                if cap > W::zero() && !visited[to] {
                    visited[to] = true;
                    parent_arc[to] = i;
                    queue.push_back(to);
                }
            }
        }
        if !visited[r.sink] {
            return Ok(total);
        }

        // bottleneck along the path
        let mut bottleneck = W::max_value();
        let mut v = r.sink;
        while v != r.source {
            let i = parent_arc[v];
            let (_, cap) = r.arcs[i];
            if cap < bottleneck {
                bottleneck = cap;
            }
            v = r.arcs[i ^ 1].0;
        }

        let mut v = r.sink;
        while v != r.source {
            let i = parent_arc[v];
            r.arcs[i].1 = r.arcs[i].1 - bottleneck;
            r.arcs[i ^ 1].1 = r.arcs[i ^ 1].1 + bottleneck;
            v = r.arcs[i ^ 1].0;
        }
        total = total + bottleneck;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Vertex};

    fn network(edges: &[(i64, i64, i64)]) -> Graph<i64, (), i64> {
        let mut g = Graph::new_digraph("t");
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

    fn classic() -> Graph<i64, (), i64> {
        // CLRS figure: max flow 23 from 1 to 6
        network(&[
            (1, 2, 16),
            (1, 3, 13),
            (2, 3, 10),
            (3, 2, 4),
            (2, 4, 12),
            (4, 3, 9),
            (3, 5, 14),
            (5, 4, 7),
            (4, 6, 20),
            (5, 6, 4),
        ])
    }

    #[test]
    fn dinic_classic_network() {
        let g = classic();
        assert_eq!(max_flow(&g, &1, &6).unwrap(), 23);
    }

    #[test]
    fn edmonds_karp_agrees() {
        let g = classic();
        assert_eq!(max_flow_edmonds_karp(&g, &1, &6).unwrap(), 23);
    }

    #[test]
    fn disconnected_sink_has_zero_flow() {
        let g = network(&[(1, 2, 5), (3, 4, 5)]);
        assert_eq!(max_flow(&g, &1, &4).unwrap(), 0);
    }

    #[test]
    fn undirected_graph_rejected() {
        let mut g: Graph<i64, (), i64> = Graph::new_undirected("t");
        g.add_vertex(Vertex::new(1, ())).unwrap();
        g.add_vertex(Vertex::new(2, ())).unwrap();
        g.add_edge(Edge::new(100, 1, 2, 1)).unwrap();
        assert_eq!(max_flow(&g, &1, &2).unwrap_err(), GraphError::NotDigraph);
    }

    #[test]
    fn missing_endpoint_rejected() {
        let g = network(&[(1, 2, 5)]);
        assert!(max_flow(&g, &1, &9).unwrap_err().is_not_exists());
    }
}
