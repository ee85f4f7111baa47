//! Matchings: Hopcroft-Karp for bipartite graphs; the general-graph
//! variant remains a placeholder surface.

use std::collections::{HashMap, VecDeque};

use crate::core::{Key, Weight};
use crate::graph::{Bipartite, Edge, Graph, GraphError, GraphResult};

const INF: usize = usize::MAX;

struct HopcroftKarp<'a, K, V, W> {
    bg: &'a Bipartite<K, V, W>,
    pair_left: HashMap<K, Option<K>>,
    pair_right: HashMap<K, Option<K>>,
    dist: HashMap<K, usize>,
    dist_nil: usize,
}

impl<K: Key, V: Clone, W: Weight> HopcroftKarp<'_, K, V, W> {
    fn new(bg: &Bipartite<K, V, W>) -> HopcroftKarp<'_, K, V, W> {
        HopcroftKarp {
            bg,
            pair_left: bg.part_keys(true).iter().map(|k| (k.clone(), None)).collect(),
            pair_right: bg
                .part_keys(false)
                .iter()
                .map(|k| (k.clone(), None))
                .collect(),
            dist: HashMap::new(),
            dist_nil: INF,
        }
    }

    /// Alternating BFS from every unmatched left vertex assigns levels;
    /// returns whether an augmenting path exists.
    fn layer(&mut self) -> GraphResult<bool> {
        self.dist.clear();
        self.dist_nil = INF;
        let mut queue = VecDeque::new();
        for (u, m) in &self.pair_left {
            if m.is_none() {
                self.dist.insert(u.clone(), 0);
                queue.push_back(u.clone());
            }
        }
        while let Some(u) = queue.pop_front() {
            let du = self.dist.get(&u).copied().unwrap_or(INF);
            if du >= self.dist_nil {
                continue;
            }
            for v in self.bg.neighbours(&u)? {
                match self.pair_right.get(&v.key).cloned() {
                    Some(None) => {
                        if self.dist_nil == INF {
                            self.dist_nil = du + 1;
                        }
                    }
                    Some(Some(u2)) => {
                        if self.dist.get(&u2).copied().unwrap_or(INF) == INF {
                            self.dist.insert(u2.clone(), du + 1);
                            queue.push_back(u2);
                        }
                    }
                    None => {}
                }
            }
        }
        Ok(self.dist_nil != INF)
    }

    /// DFS from an unmatched left vertex along the level structure,
    /// flipping matched edges on success.
    fn augment(&mut self, u: &K) -> GraphResult<bool> {
        let du = self.dist.get(u).copied().unwrap_or(INF);
        for v in self.bg.neighbours(u)? {
            match self.pair_right.get(&v.key).cloned() {
                Some(None) => {
                    if self.dist_nil == du + 1 {
                        self.pair_right.insert(v.key.clone(), Some(u.clone()));
                        self.pair_left.insert(u.clone(), Some(v.key));
                        return Ok(true);
                    }
                }
                Some(Some(u2)) => {
                    if self.dist.get(&u2).copied().unwrap_or(INF) == du + 1
                        && self.augment(&u2)?
                    {
                        self.pair_right.insert(v.key.clone(), Some(u.clone()));
                        self.pair_left.insert(u.clone(), Some(v.key));
                        return Ok(true);
                    }
                }
                None => {}
            }
        }
        self.dist.insert(u.clone(), INF);
        Ok(false)
    }

    fn run(mut self) -> GraphResult<Vec<(K, K)>> {
        while self.layer()? {
            let free: Vec<K> = self
                .pair_left
                .iter()
                .filter(|(_, m)| m.is_none())
                .map(|(k, _)| k.clone())
                .collect();
            for u in free {
                if self.pair_left.get(&u).map(|m| m.is_none()).unwrap_or(false) {
                    self.augment(&u)?;
                }
            }
        }
        Ok(self
            .pair_left
            .into_iter()
            .filter_map(|(u, m)| m.map(|v| (u, v)))
            .collect())
    }
}

/// Maximum matching of a bipartite graph via Hopcroft-Karp; returns one
/// edge per matched pair.
pub fn max_matching<K: Key, V: Clone, W: Weight>(
    bg: &Bipartite<K, V, W>,
) -> GraphResult<Vec<Edge<K, W>>> {
    let pairs = HopcroftKarp::new(bg).run()?;
    pairs
        .into_iter()
        .map(|(u, v)| {
            bg.get_edge(&u, &v)?
                .into_iter()
                .min_by(|a, b| {
                    a.weight
                        .partial_cmp(&b.weight)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .ok_or(GraphError::EdgeNotExists)
        })
        .collect()
}

/// A maximum matching that saturates every vertex; fails with
/// [`GraphError::MatchNotExists`] otherwise.
pub fn perfect_matching<K: Key, V: Clone, W: Weight>(
    bg: &Bipartite<K, V, W>,
) -> GraphResult<Vec<Edge<K, W>>> {
    let matching = max_matching(bg)?;
    if matching.len() * 2 != bg.order() {
        return Err(GraphError::MatchNotExists);
    }
    Ok(matching)
}

/// Matching on general graphs is a placeholder surface.
pub fn max_matching_general<K: Key, V: Clone, W: Weight>(
    _g: &Graph<K, V, W>,
) -> GraphResult<Vec<Edge<K, W>>> {
    Err(GraphError::NotImplemented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Vertex;

    fn bipartite(left: &[i64], right: &[i64], edges: &[(i64, i64)]) -> Bipartite<i64, (), i64> {
        let mut bg = Bipartite::new(false, "t");
        for &v in left {
            bg.add_vertex_to(Vertex::new(v, ()), true).unwrap();
        }
        for &v in right {
            bg.add_vertex_to(Vertex::new(v, ()), false).unwrap();
        }
        for (i, &(h, t)) in edges.iter().enumerate() {
            bg.add_edge(Edge::new(1000 + i as i64, h, t, 1)).unwrap();
        }
        bg
    }

    #[test]
    fn maximum_matching_size() {
        let bg = bipartite(
            &[1, 2, 3],
            &[4, 5, 6],
            &[(1, 4), (1, 5), (2, 4), (3, 6)],
        );
        let m = max_matching(&bg).unwrap();
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn augmenting_path_is_found() {
        // greedy would match 1-4 and strand 2; hopcroft-karp reassigns
        let bg = bipartite(&[1, 2], &[4, 5], &[(1, 4), (1, 5), (2, 4)]);
        let m = max_matching(&bg).unwrap();
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn perfect_matching_saturates() {
        let bg = bipartite(&[1, 2], &[3, 4], &[(1, 3), (2, 4)]);
        assert_eq!(perfect_matching(&bg).unwrap().len(), 2);
    }

    #[test]
    fn imperfect_matching_detected() {
        let bg = bipartite(&[1, 2], &[3, 4], &[(1, 3), (2, 3)]);
        assert_eq!(
            perfect_matching(&bg).unwrap_err(),
            GraphError::MatchNotExists
        );
    }

    #[test]
    fn general_matching_is_placeholder() {
        let g: Graph<i64, (), i64> = Graph::new_undirected("t");
        assert_eq!(
            max_matching_general(&g).unwrap_err(),
            GraphError::NotImplemented
        );
    }
}
