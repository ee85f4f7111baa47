//! Minimum spanning trees and forests.

use std::collections::{HashMap, HashSet};

use crate::core::{Key, PriorityQueue, Weight};
use crate::graph::{Edge, Graph, GraphError, GraphResult};

/// Prim's algorithm with the indexed priority queue.
///
/// Fails with [`GraphError::EmptyGraph`] on an empty graph and
/// [`GraphError::NotConnected`] when the graph has more than one component.
/// A single vertex yields an empty edge set of weight zero.
pub fn min_weight_spanning_tree<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
) -> GraphResult<(Vec<Edge<K, W>>, W)> {
    let vertexes = g.all_vertexes();
    if vertexes.is_empty() {
        return Err(GraphError::EmptyGraph);
    }
    let maxw = W::max_value();
    let mut cost: PriorityQueue<K, (), W> = PriorityQueue::new(|a: &W, b: &W| a < b);
    for v in &vertexes {
        cost.push(v.key.clone(), (), maxw);
    }
    cost.update(&vertexes[0].key, W::zero());

    let mut best_edge: HashMap<K, Edge<K, W>> = HashMap::new();
    let mut in_tree: HashSet<K> = HashSet::new();
    let mut edges = Vec::with_capacity(vertexes.len().saturating_sub(1));
    let mut total = W::zero();

    while let Some((u, _, c)) = cost.pop() {
        if c == maxw {
            return Err(GraphError::NotConnected);
        }
        if let Some(e) = best_edge.remove(&u) {
            edges.push(e);
            total = total + c;
        }
        in_tree.insert(u.clone());
        relax_frontier(g, &u, &in_tree, &mut cost, &mut best_edge)?;
    }
    Ok((edges, total))
}

fn relax_frontier<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
    u: &K,
    in_tree: &HashSet<K>,
    cost: &mut PriorityQueue<K, (), W>,
    best_edge: &mut HashMap<K, Edge<K, W>>,
) -> GraphResult<()> {
    for e in g.incident_edges(u)? {
        let v = if e.head == *u {
            e.tail.clone()
        } else {
            e.head.clone()
        };
        if v == *u || in_tree.contains(&v) {
            continue;
        }
        if let Some(&p) = cost.priority(&v) {
            if e.weight < p {
                cost.update(&v, e.weight);
                best_edge.insert(v, e);
            }
        }
    }
    Ok(())
}

/// Kruskal's algorithm with union-find.
pub fn min_weight_spanning_tree_kruskal<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
) -> GraphResult<(Vec<Edge<K, W>>, W)> {
    let vertexes = g.all_vertexes();
    if vertexes.is_empty() {
        return Err(GraphError::EmptyGraph);
    }
    let mut sets = DisjointSet::new(vertexes.iter().map(|v| v.key.clone()));

    let mut all_edges = g.all_edges();
    all_edges.sort_by(|a, b| {
        a.weight
            .partial_cmp(&b.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut edges = Vec::with_capacity(vertexes.len().saturating_sub(1));
    let mut total = W::zero();
    let mut it = all_edges.into_iter();
    while edges.len() != vertexes.len() - 1 {
        let e = it.next().ok_or(GraphError::NotConnected)?;
        if e.head == e.tail {
            continue;
        }
        if sets.union(&e.head, &e.tail) {
            total = total + e.weight;
            edges.push(e);
        }
    }
    Ok((edges, total))
}

/// One minimum spanning tree per connected component: each entry is the
/// component's vertex keys, tree edges, and tree weight.
pub fn min_weight_spanning_forest<K: Key, V: Clone, W: Weight>(
    g: &Graph<K, V, W>,
) -> GraphResult<Vec<(Vec<K>, Vec<Edge<K, W>>, W)>> {
    let vertexes = g.all_vertexes();
    if vertexes.is_empty() {
        return Err(GraphError::EmptyGraph);
    }
    let maxw = W::max_value();
    let mut cost: PriorityQueue<K, (), W> = PriorityQueue::new(|a: &W, b: &W| a < b);
    for v in &vertexes {
        cost.push(v.key.clone(), (), maxw);
    }
    cost.update(&vertexes[0].key, W::zero());

    let mut best_edge: HashMap<K, Edge<K, W>> = HashMap::new();
    let mut in_tree: HashSet<K> = HashSet::new();
    let mut forest: Vec<(Vec<K>, Vec<Edge<K, W>>, W)> = Vec::new();
    let mut tree: Vec<K> = Vec::new();
    let mut branch: Vec<Edge<K, W>> = Vec::new();
    let mut weight = W::zero();

    while let Some((u, _, c)) = cost.pop() {
        let c = if c == maxw {
            // the popped vertex starts a fresh component
            if !tree.is_empty() {
                forest.push((
                    std::mem::take(&mut tree),
                    std::mem::take(&mut branch),
                    weight,
                ));
            }
            weight = W::zero();
            W::zero()
        } else {
            c
        };
        if let Some(e) = best_edge.remove(&u) {
            branch.push(e);
            weight = weight + c;
        }
        tree.push(u.clone());
        in_tree.insert(u.clone());
        relax_frontier(g, &u, &in_tree, &mut cost, &mut best_edge)?;
    }
    if !tree.is_empty() {
        forest.push((tree, branch, weight));
    }
    Ok(forest)
}

struct DisjointSet<K> {
    parent: HashMap<K, K>,
    rank: HashMap<K, usize>,
}

impl<K: Key> DisjointSet<K> {
    fn new(keys: impl Iterator<Item = K>) -> Self {
        let parent: HashMap<K, K> = keys.map(|k| (k.clone(), k)).collect();
        let rank = parent.keys().map(|k| (k.clone(), 0)).collect();
        Self { parent, rank }
    }

    fn find(&mut self, k: &K) -> K {
        let mut root = k.clone();
        while self.parent[&root] != root {
            root = self.parent[&root].clone();
        }
        // path compression
        let mut cur = k.clone();
        while cur != root {
            let next = self.parent[&cur].clone();
            self.parent.insert(cur, root.clone());
            cur = next;
        }
        root
    }

    /// Merges the two sets; returns false when already joined.
    fn union(&mut self, a: &K, b: &K) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        let (ka, kb) = (self.rank[&ra], self.rank[&rb]);
        if ka < kb {
            self.parent.insert(ra, rb);
        } else if ka > kb {
            self.parent.insert(rb, ra);
        } else {
            self.parent.insert(rb, ra.clone());
            if let Some(r) = self.rank.get_mut(&ra) {
                *r += 1;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Vertex;

    fn weighted(edges: &[(i64, i64, i64)]) -> Graph<i64, (), i64> {
        let mut g = Graph::new_undirected("t");
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

    fn prim_example() -> Graph<i64, (), i64> {
        weighted(&[
            (1, 2, 10),
            (1, 3, 4),
            (2, 3, 2),
            (2, 4, 8),
            (2, 5, 6),
            (3, 4, 15),
            (3, 5, 6),
            (4, 5, 1),
            (4, 6, 5),
            (5, 6, 12),
        ])
    }

    #[test]
    fn prim_total_weight() {
        let g = prim_example();
        let (edges, total) = min_weight_spanning_tree(&g).unwrap();
        assert_eq!(edges.len(), 5);
        assert_eq!(total, 22);
    }

    #[test]
    fn kruskal_agrees_with_prim() {
        let g = prim_example();
        let (edges, total) = min_weight_spanning_tree_kruskal(&g).unwrap();
        assert_eq!(edges.len(), 5);
        assert_eq!(total, 22);
    }

    #[test]
    fn empty_graph_fails() {
        let g: Graph<i64, (), i64> = Graph::new_undirected("t");
        assert_eq!(
            min_weight_spanning_tree(&g).unwrap_err(),
            GraphError::EmptyGraph
        );
    }

    #[test]
    fn single_vertex_tree_is_empty() {
        let mut g: Graph<i64, (), i64> = Graph::new_undirected("t");
        g.add_vertex(Vertex::new(1, ())).unwrap();
        let (edges, total) = min_weight_spanning_tree(&g).unwrap();
        assert!(edges.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn disconnected_graph_has_no_tree_but_a_forest() {
        let g = weighted(&[(1, 2, 3), (3, 4, 7)]);
        assert_eq!(
            min_weight_spanning_tree(&g).unwrap_err(),
            GraphError::NotConnected
        );

        let forest = min_weight_spanning_forest(&g).unwrap();
        assert_eq!(forest.len(), 2);
        let weights: i64 = forest.iter().map(|(_, _, w)| *w).sum();
        assert_eq!(weights, 10);
        for (keys, edges, _) in forest {
            assert_eq!(keys.len(), 2);
            assert_eq!(edges.len(), 1);
        }
    }
}
